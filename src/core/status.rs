//! Status workflows for status-bearing records
//!
//! The engine accepts any requested transition and leaves correctness to the
//! backend. A workflow only tells callers which actions to offer, so the UI
//! can disable buttons for transitions that make no sense.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Allowed status transitions, keyed by current status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusWorkflow {
    transitions: IndexMap<String, Vec<String>>,
}

impl StatusWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `from -> to`
    pub fn allow(mut self, from: &str, to: &str) -> Self {
        let targets = self.transitions.entry(from.to_string()).or_default();
        if !targets.iter().any(|t| t == to) {
            targets.push(to.to_string());
        }
        self
    }

    /// Recurring invoice: `active <-> paused`, `active/paused -> completed`
    pub fn recurring_invoice() -> Self {
        Self::new()
            .allow("active", "paused")
            .allow("paused", "active")
            .allow("active", "completed")
            .allow("paused", "completed")
    }

    /// Support ticket: `open -> in-progress -> resolved -> closed`
    pub fn support_ticket() -> Self {
        Self::new()
            .allow("open", "in-progress")
            .allow("in-progress", "resolved")
            .allow("resolved", "closed")
    }

    /// Statuses reachable from `from`
    pub fn next_statuses(&self, from: &str) -> &[String] {
        self.transitions.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.next_statuses(from).iter().any(|s| s == to)
    }

    /// Whether no further transition exists from `status`
    pub fn is_terminal(&self, status: &str) -> bool {
        self.next_statuses(status).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurring_invoice_workflow() {
        let wf = StatusWorkflow::recurring_invoice();
        assert!(wf.can_transition("active", "paused"));
        assert!(wf.can_transition("paused", "active"));
        assert!(wf.can_transition("paused", "completed"));
        assert!(!wf.can_transition("completed", "active"));
        assert!(wf.is_terminal("completed"));
    }

    #[test]
    fn test_support_ticket_workflow() {
        let wf = StatusWorkflow::support_ticket();
        assert_eq!(wf.next_statuses("open"), ["in-progress".to_string()]);
        assert!(!wf.can_transition("open", "closed"));
        assert!(wf.is_terminal("closed"));
    }

    #[test]
    fn test_allow_is_idempotent() {
        let wf = StatusWorkflow::new().allow("a", "b").allow("a", "b");
        assert_eq!(wf.next_statuses("a").len(), 1);
    }

    #[test]
    fn test_yaml_shape() {
        let wf: StatusWorkflow = serde_yaml::from_str("open: [closed]\nclosed: []\n").unwrap();
        assert!(wf.can_transition("open", "closed"));
        assert!(wf.is_terminal("closed"));
    }
}
