use chrono::{DateTime, Utc};

/// A domain event emitted by an SCM aggregate.
///
/// Events are immutable facts. The facade logs their names when it chains
/// a transition into the audit ledger.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "rfq.response.accepted").
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
