//! Incremental decoder for the `text/event-stream` wire format.
//!
//! Bytes arrive in arbitrary chunks; complete lines are parsed as they become
//! available and an event is emitted at every blank line. A line or an event
//! that outgrows its limit is an error and ends decoding.

use thiserror::Error;

// ---

/// Longest line accepted, newline excluded.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Largest `data` payload accepted for one event.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type, `message` unless the server sent an `event:` field.
    pub event: String,
    pub data: String,
}

impl SseEvent {
    /// Whether an `onmessage`-style handler would see this event.
    pub fn is_message(&self) -> bool {
        self.event == "message"
    }
}

/// The server sent more than the decoder is willing to buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseOverflow {
    #[error("line longer than {0} bytes")]
    Line(usize),

    #[error("event data larger than {0} bytes")]
    Event(usize),
}

#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    data_bytes: usize,
    max_line: usize,
    max_event: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limits(MAX_LINE_BYTES, MAX_EVENT_BYTES)
    }
}

impl SseDecoder {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_line: usize, max_event: usize) -> Self {
        Self {
            buffer: Vec::new(),
            event: None,
            data: Vec::new(),
            data_bytes: 0,
            max_line,
            max_event,
        }
    }

    /// Feed a chunk and return the events it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, SseOverflow> {
        // ---
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.len() > self.max_line {
                return Err(SseOverflow::Line(self.max_line));
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line)? {
                events.push(event);
            }
        }

        // the tail may still gain a CR before its newline
        if self.buffer.len() > self.max_line + 1 {
            return Err(SseOverflow::Line(self.max_line));
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Result<Option<SseEvent>, SseOverflow> {
        // ---
        if line.is_empty() {
            return Ok(self.dispatch());
        }
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                // joined with a newline between lines
                self.data_bytes += value.len() + usize::from(!self.data.is_empty());
                if self.data_bytes > self.max_event {
                    return Err(SseOverflow::Event(self.max_event));
                }
                self.data.push(value.to_string());
            }
            "event" => self.event = Some(value.to_string()),
            // id and retry only matter for reconnecting, unknown fields are ignored
            _ => {}
        }
        Ok(None)
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        // ---
        let event = self.event.take();
        self.data_bytes = 0;
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}
