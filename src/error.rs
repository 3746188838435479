//! Error types for planning runs.
//!
//! Every fatal condition names the course codes involved so a human
//! planner can act on it. Recoverable data-quality gaps (unknown course
//! codes, unmapped offering patterns) are not errors; they surface as
//! [`PlanWarning`](crate::models::PlanWarning)s on the resulting plan.

use thiserror::Error;

use crate::models::Term;
use crate::validation::ValidationError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Fatal planning failure.
#[derive(Error, Debug)]
pub enum PlanError {
    /// A requirement, course, or program is malformed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Several integrity problems found in one input.
    #[error("invalid input: {}", join(.0))]
    InvalidInput(Vec<ValidationError>),

    /// JSON input could not be decoded.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The prerequisite graph of the required courses has a cycle.
    #[error("prerequisite cycle among courses: {}", .courses.join(" -> "))]
    CycleDetected {
        /// Courses on the cycle, in edge order, first course repeated last.
        courses: Vec<String>,
    },

    /// Courses remain but none can be placed in any reachable term.
    #[error("scheduling deadlock at {term}: cannot place {}", .remaining.join(", "))]
    SchedulingDeadlock {
        /// Term at which progress stopped.
        term: Term,
        /// Courses left unscheduled.
        remaining: Vec<String>,
    },

    /// A required course is deactivated and can never be scheduled.
    #[error("required course is deactivated: {}", .courses.join(", "))]
    DeactivatedCourseRequired {
        /// The deactivated courses.
        courses: Vec<String>,
    },

    /// Required-course expansion did not reach a fixed point.
    #[error("required-course expansion exceeded {rounds} rounds; still pending: {}", .pending.join(", "))]
    ExpansionLimitExceeded {
        /// Rounds executed.
        rounds: usize,
        /// Courses discovered but not yet processed.
        pending: Vec<String>,
    },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_messages_name_courses() {
        let cycle = PlanError::CycleDetected {
            courses: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(cycle.to_string(), "prerequisite cycle among courses: A -> B -> A");

        let dead = PlanError::DeactivatedCourseRequired {
            courses: vec!["C".into()],
        };
        assert!(dead.to_string().contains('C'));

        let stuck = PlanError::SchedulingDeadlock {
            term: Term::fall(2027),
            remaining: vec!["X 1".into(), "Y 2".into()],
        };
        assert_eq!(
            stuck.to_string(),
            "scheduling deadlock at Fall 2027: cannot place X 1, Y 2"
        );
    }

    #[test]
    fn test_invalid_input_joins_errors() {
        let err = PlanError::InvalidInput(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "courses[1]", "duplicate A"),
            ValidationError::new(ValidationErrorKind::InvalidCredits, "courses[2]", "negative"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("duplicate A"));
        assert!(msg.contains("negative"));
    }
}
