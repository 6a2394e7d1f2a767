//! Module events
//!
//! Events carry string attributes so hosts can index them without knowing
//! the module's types. The keeper only keeps events from committed work.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CreatePool,
    DepositWithinBatch,
    WithdrawWithinBatch,
    SwapWithinBatch,
    DepositToPool,
    WithdrawFromPool,
    SwapTransacted,
    SwapCancelled,
    BatchExecuted,
    BatchFailed,
    PoolHalted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::CreatePool => "create_pool",
            EventKind::DepositWithinBatch => "deposit_within_batch",
            EventKind::WithdrawWithinBatch => "withdraw_within_batch",
            EventKind::SwapWithinBatch => "swap_within_batch",
            EventKind::DepositToPool => "deposit_to_pool",
            EventKind::WithdrawFromPool => "withdraw_from_pool",
            EventKind::SwapTransacted => "swap_transacted",
            EventKind::SwapCancelled => "swap_cancelled",
            EventKind::BatchExecuted => "batch_executed",
            EventKind::BatchFailed => "batch_failed",
            EventKind::PoolHalted => "pool_halted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, attributes: Vec::new() }
    }

    /// Append an attribute
    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// First value of an attribute
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (key, value) in &self.attributes {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_attributes() {
        let event = Event::new(EventKind::SwapTransacted).attr("pool_id", 1).attr("msg_index", 3);
        assert_eq!(event.get("msg_index"), Some("3"));
        assert_eq!(event.get("missing"), None);
        assert_eq!(event.to_string(), "swap_transacted pool_id=1 msg_index=3");
    }
}
