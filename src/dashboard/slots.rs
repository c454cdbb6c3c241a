//! Numeric display slots and the display updater.

use std::str::FromStr;

use crate::models::{display_number, Reading};

// ---

/// A named latest-value display on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    HeartRate,
    BloodPressure,
    Oxygen,
    Temperature,
    Sugar,
}

const SLOT_COUNT: usize = 5;

impl Slot {
    // ---
    pub const ALL: [Slot; SLOT_COUNT] = [
        Slot::HeartRate,
        Slot::BloodPressure,
        Slot::Oxygen,
        Slot::Temperature,
        Slot::Sugar,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn caption(self) -> &'static str {
        match self {
            Slot::HeartRate => "HR",
            Slot::BloodPressure => "BP",
            Slot::Oxygen => "SpO2",
            Slot::Temperature => "Temp",
            Slot::Sugar => "Sugar",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Slot::HeartRate => "bpm",
            Slot::BloodPressure => "mmHg",
            Slot::Oxygen => "%",
            Slot::Temperature => "°C",
            Slot::Sugar => "mg/dL",
        }
    }

    /// The text this slot shows for a reading.
    pub fn text_for(self, reading: &Reading) -> String {
        // ---
        match self {
            Slot::HeartRate => display_number(reading.heart_rate),
            Slot::BloodPressure => reading.blood_pressure(),
            Slot::Oxygen => display_number(reading.oxygen_level),
            Slot::Temperature => display_number(reading.temperature),
            Slot::Sugar => display_number(reading.sugar_level),
        }
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "hr" | "heart_rate" => Ok(Slot::HeartRate),
            "bp" | "blood_pressure" => Ok(Slot::BloodPressure),
            "spo2" | "oxygen" | "oxygen_level" => Ok(Slot::Oxygen),
            "temp" | "temperature" => Ok(Slot::Temperature),
            "sugar" | "sugar_level" => Ok(Slot::Sugar),
            other => Err(format!("unknown display slot '{other}'")),
        }
    }
}

/// The slot table, resolved once when the dashboard is built.
///
/// A slot that is not part of the layout stays `None` and every write to it
/// is skipped.
#[derive(Debug, Clone, Default)]
pub struct DisplaySlots {
    texts: [Option<String>; SLOT_COUNT],
}

impl DisplaySlots {
    // ---
    pub fn new(attached: &[Slot]) -> Self {
        // ---
        let mut slots = Self::default();
        for slot in attached {
            slots.texts[slot.index()] = Some(String::new());
        }
        slots
    }

    /// Write every vital of `reading` into its slot. Missing slots are skipped.
    pub fn apply(&mut self, reading: &Reading) {
        // ---
        for slot in Slot::ALL {
            if let Some(text) = self.texts[slot.index()].as_mut() {
                *text = slot.text_for(reading);
            }
        }
    }

    /// Current text of a slot, `None` when the slot is not attached.
    pub fn text(&self, slot: Slot) -> Option<&str> {
        self.texts[slot.index()].as_deref()
    }

    /// Attached slots with their text, in display order.
    pub fn attached(&self) -> Vec<(Slot, String)> {
        Slot::ALL
            .iter()
            .filter_map(|&slot| self.text(slot).map(|t| (slot, t.to_string())))
            .collect()
    }
}
