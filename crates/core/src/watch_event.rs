//! Progress events surfaced to the caller while a task is watched.

use serde::Serialize;

/// Event kind used for advisory errors raised by either producer.
pub const EVENT_KIND_WARNING: &str = "warning";

/// Which producer an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// The socket push channel.
    Stream,
    /// The interval status query.
    Poll,
    /// The watch machinery itself (warnings).
    System,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Stream => "stream",
            EventSource::Poll => "poll",
            EventSource::System => "system",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress observation.
///
/// Events are transient; they are handed to the observer once and never
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchEvent {
    pub source: EventSource,
    /// Status or message type label, e.g. `task_output` or `warning`.
    pub kind: String,
    /// Human-readable detail, possibly empty.
    pub text: String,
    /// Unstructured payload passed through from the producer.
    pub raw: serde_json::Value,
}

impl WatchEvent {
    pub fn new(source: EventSource, kind: impl Into<String>) -> Self {
        Self {
            source,
            kind: kind.into(),
            text: String::new(),
            raw: serde_json::Value::Null,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    /// A `system/warning` event carrying an error description.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(EventSource::System, EVENT_KIND_WARNING).with_text(text)
    }

    pub fn is_warning(&self) -> bool {
        self.source == EventSource::System && self.kind == EVENT_KIND_WARNING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_is_a_system_event() {
        let ev = WatchEvent::warning("socket closed");
        assert_eq!(ev.source, EventSource::System);
        assert_eq!(ev.kind, "warning");
        assert_eq!(ev.text, "socket closed");
        assert!(ev.is_warning());
    }

    #[test]
    fn stream_event_is_not_a_warning() {
        let ev = WatchEvent::new(EventSource::Stream, "warning");
        assert!(!ev.is_warning());
    }

    #[test]
    fn source_serializes_lowercase() {
        let ev = WatchEvent::new(EventSource::Poll, "task_start")
            .with_raw(serde_json::json!({"status": "task_start"}));
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["source"], "poll");
        assert_eq!(json["raw"]["status"], "task_start");
    }
}
