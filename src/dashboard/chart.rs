//! Rolling chart window of heart-rate and sugar-level points.

use std::collections::VecDeque;

// ---

pub const DEFAULT_CHART_WINDOW: usize = 20;

/// One chart entry: a time label and the two plotted series values.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub heart_rate: f64,
    pub sugar_level: f64,
}

/// Bounded FIFO of chart points, oldest first.
///
/// `seed` appends without trimming (history load). `push` appends and then
/// evicts from the front until the window is back within `capacity`.
#[derive(Debug, Clone)]
pub struct ChartWindow {
    capacity: usize,
    points: VecDeque<ChartPoint>,
}

impl ChartWindow {
    // ---
    pub fn new(capacity: usize) -> Self {
        // ---
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn seed(&mut self, point: ChartPoint) {
        self.points.push_back(point);
    }

    /// Append a live point and return how many old points were evicted.
    ///
    /// Once the window is within capacity this evicts at most one point per
    /// call. An oversized seeded window is cut down on the first push.
    pub fn push(&mut self, point: ChartPoint) -> usize {
        // ---
        self.points.push_back(point);
        let mut evicted = 0;
        while self.points.len() > self.capacity {
            self.points.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn oldest(&self) -> Option<&ChartPoint> {
        self.points.front()
    }

    pub fn newest(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    pub fn to_vec(&self) -> Vec<ChartPoint> {
        self.points.iter().cloned().collect()
    }
}

impl Default for ChartWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn point(n: usize) -> ChartPoint {
        ChartPoint {
            label: format!("m{n}"),
            heart_rate: 60.0 + n as f64,
            sugar_level: 90.0 + n as f64,
        }
    }

    fn labels(window: &ChartWindow) -> Vec<String> {
        window.to_vec().into_iter().map(|p| p.label).collect()
    }

    #[test]
    fn test_push_never_exceeds_capacity() {
        // ---
        let mut window = ChartWindow::default();
        for n in 1..=100 {
            window.push(point(n));
            assert!(window.len() <= DEFAULT_CHART_WINDOW);
        }
        assert_eq!(window.len(), DEFAULT_CHART_WINDOW);
    }

    #[test]
    fn test_fifo_eviction() {
        // ---
        let mut window = ChartWindow::default();
        for n in 1..=20 {
            assert_eq!(window.push(point(n)), 0);
        }
        assert_eq!(window.oldest().unwrap().label, "m1");

        for k in 1..=7 {
            assert_eq!(window.push(point(20 + k)), 1);
            assert_eq!(window.oldest().unwrap().label, format!("m{}", k + 1));
        }
        assert_eq!(window.newest().unwrap().label, "m27");
    }

    #[test]
    fn test_seed_does_not_trim() {
        // ---
        let mut window = ChartWindow::new(3);
        for n in 1..=5 {
            window.seed(point(n));
        }
        assert_eq!(window.len(), 5);

        // first live point restores the bound
        assert_eq!(window.push(point(6)), 3);
        assert_eq!(labels(&window), vec!["m4", "m5", "m6"]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        // ---
        let mut window = ChartWindow::new(0);
        window.push(point(1));
        window.push(point(2));
        assert_eq!(window.len(), 1);
        assert_eq!(labels(&window), vec!["m2"]);
    }
}
