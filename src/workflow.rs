//! Status workflow
//!
//! The dashboards only offer certain status changes as buttons:
//!
//! ```text
//! requests:   Pending ──► Approved
//!                     └─► Rejected
//!
//! complaints: Open ──► In Progress ──► Resolved
//!                 └──────────────────►
//! ```
//!
//! The record store itself accepts any status string. These checks belong
//! to the front-end that decides which changes to offer.

use crate::storage::CollectionKind;
use thiserror::Error;

pub const PENDING: &str = "Pending";
pub const APPROVED: &str = "Approved";
pub const REJECTED: &str = "Rejected";
pub const OPEN: &str = "Open";
pub const IN_PROGRESS: &str = "In Progress";
pub const RESOLVED: &str = "Resolved";

/// Status change outside the conventional workflow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} cannot move from '{from}' to '{to}'")]
pub struct TransitionError {
    pub kind: CollectionKind,
    pub from: String,
    pub to: String,
}

/// Statuses reachable from `current`
pub fn next_statuses(kind: CollectionKind, current: &str) -> &'static [&'static str] {
    match (kind, current) {
        (CollectionKind::Requests, PENDING) => &[APPROVED, REJECTED],
        (CollectionKind::Complaints, OPEN) => &[IN_PROGRESS, RESOLVED],
        (CollectionKind::Complaints, IN_PROGRESS) => &[RESOLVED],
        _ => &[],
    }
}

/// Whether no further change is offered from `status`
pub fn is_terminal(kind: CollectionKind, status: &str) -> bool {
    next_statuses(kind, status).is_empty()
}

pub fn check_transition(kind: CollectionKind, from: &str, to: &str) -> Result<(), TransitionError> {
    if next_statuses(kind, from).iter().any(|s| *s == to) {
        Ok(())
    } else {
        Err(TransitionError {
            kind,
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_transitions() {
        let kind = CollectionKind::Requests;
        assert!(check_transition(kind, PENDING, APPROVED).is_ok());
        assert!(check_transition(kind, PENDING, REJECTED).is_ok());
        assert!(check_transition(kind, APPROVED, REJECTED).is_err());
        assert!(check_transition(kind, PENDING, RESOLVED).is_err());
        assert!(is_terminal(kind, APPROVED));
        assert!(!is_terminal(kind, PENDING));
    }

    #[test]
    fn test_complaint_transitions() {
        let kind = CollectionKind::Complaints;
        assert!(check_transition(kind, OPEN, IN_PROGRESS).is_ok());
        assert!(check_transition(kind, OPEN, RESOLVED).is_ok());
        assert!(check_transition(kind, IN_PROGRESS, RESOLVED).is_ok());
        assert!(check_transition(kind, IN_PROGRESS, OPEN).is_err());
        assert!(check_transition(kind, RESOLVED, OPEN).is_err());
        assert!(is_terminal(kind, RESOLVED));
    }

    #[test]
    fn test_unknown_status_has_no_transitions() {
        assert!(next_statuses(CollectionKind::Requests, "Escalated").is_empty());
        assert!(next_statuses(CollectionKind::Requests, OPEN).is_empty());
    }

    #[test]
    fn test_transition_error_display() {
        let err = check_transition(CollectionKind::Complaints, RESOLVED, OPEN).unwrap_err();
        assert_eq!(err.to_string(), "complaints cannot move from 'Resolved' to 'Open'");
    }
}
