//! Domain error types

use thiserror::Error;

use super::DomainId;

/// Errors raised by lookups and validated mutations on the model
///
/// Validation happens before anything is inserted, so a returned error
/// always means the model was left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Paper \"{name}\" not found")]
    PaperNotFound { name: String },

    #[error("Milestone \"{reference}\" not found")]
    MilestoneNotFound { reference: String },

    #[error("Task \"{reference}\" not found")]
    TaskNotFound { reference: String },

    #[error("\"{reference}\" matches several ids: {}", format_candidates(.candidates))]
    AmbiguousId { reference: String, candidates: Vec<DomainId> },

    #[error("Paper \"{name}\" already exists")]
    DuplicatePaper { name: String },

    #[error("Paper name must not be empty")]
    EmptyName,

    #[error("Description must not be empty")]
    EmptyDescription,

    #[error("Priority {value} is out of range 1-5")]
    InvalidPriority { value: u8 },
}

fn format_candidates(candidates: &[DomainId]) -> String {
    candidates.iter().map(DomainId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DomainError::PaperNotFound { name: "X".to_string() };
        assert_eq!(err.to_string(), "Paper \"X\" not found");

        let err = DomainError::InvalidPriority { value: 9 };
        assert!(err.to_string().contains("1-5"));
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = DomainError::AmbiguousId {
            reference: "ab".to_string(),
            candidates: vec![DomainId::from("task-ab01"), DomainId::from("task-ab02")],
        };
        assert_eq!(
            err.to_string(),
            "\"ab\" matches several ids: task-ab01, task-ab02"
        );
    }
}
