//! Input validation for planning runs.
//!
//! Checks structural integrity of catalog courses, programs, and student
//! state before planning. Detects:
//! - Duplicate course codes
//! - Negative or inverted credit ranges
//! - Composite requirements (AND / OR / CREDITS_FROM / CHOOSE_N) without children
//! - A zero credit cap or negative GPA
//!
//! A course whose prerequisite tree mentions itself is only logged; the
//! dependency graph drops self-edges.
//!
//! Trees built by [`crate::parser`] are already structurally valid; these
//! checks matter for inputs assembled through constructors.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::models::{Course, Program, RequirementNode, StudentState};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Location of the offending value (e.g. `requisite.requirements[1]`).
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// `type` tag is not one of the requirement kinds.
    UnknownType,
    /// A required field is absent or has the wrong JSON shape.
    MissingField,
    /// A composite requirement has no children.
    EmptyChildren,
    /// A numeric field could not be read as a number.
    NotANumber,
    /// A field has a value outside its vocabulary or range.
    InvalidValue,
    /// Two entities share the same code.
    DuplicateId,
    /// Credit values are negative or min exceeds max.
    InvalidCredits,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validates a course list.
///
/// Checks:
/// 1. No duplicate codes (after normalisation)
/// 2. Credits non-negative and `min_credits <= max_credits`
/// 3. Requirement trees have no empty composites or negative thresholds
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_courses(courses: &[Course]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut codes = HashSet::new();

    for (i, course) in courses.iter().enumerate() {
        let path = format!("courses[{i}]");
        let code = crate::models::normalize_code(&course.code);

        if code.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                &path,
                "course has an empty code",
            ));
        } else if !codes.insert(code.clone()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                &path,
                format!("duplicate course code: {code}"),
            ));
        }

        if course.min_credits < 0.0 || course.max_credits < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCredits,
                &path,
                format!("course '{code}' has negative credits"),
            ));
        } else if course.min_credits > course.max_credits {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCredits,
                &path,
                format!(
                    "course '{code}' has min_credits {} above max_credits {}",
                    course.min_credits, course.max_credits
                ),
            ));
        }

        validate_requirement(
            &course.raw_requisite,
            &format!("{path}.requisite"),
            &mut errors,
        );

        if course.raw_requisite.course_codes().contains(&code) {
            warn!(course = %code, %path, "course lists itself as a prerequisite; edge ignored");
        }
    }

    finish(errors)
}

/// Validates a program's requirement structure.
pub fn validate_program(program: &Program) -> ValidationResult {
    let mut errors = Vec::new();

    if program.root_requisite.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyChildren,
            "requisite",
            format!("program '{}' has no requirements", program.code),
        ));
    }
    for (i, req) in program.root_requisite.iter().enumerate() {
        validate_requirement(req, &format!("requisite[{i}]"), &mut errors);
    }
    if program.total_credits_required < 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCredits,
            "credits",
            "program credit total is negative",
        ));
    }

    finish(errors)
}

/// Validates the student state used for a run.
pub fn validate_state(state: &StudentState) -> ValidationResult {
    let mut errors = Vec::new();

    if state.credits_per_semester == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidValue,
            "credits_per_semester",
            "credits per semester must be a positive integer",
        ));
    }
    if !state.gpa.is_finite() || state.gpa < 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidValue,
            "gpa",
            format!("GPA must be a non-negative number, got {}", state.gpa),
        ));
    }

    finish(errors)
}

/// Walks a tree and records structural problems.
pub fn validate_requirement(node: &RequirementNode, path: &str, errors: &mut Vec<ValidationError>) {
    if node.kind().is_composite() && node.children().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyChildren,
            path,
            format!("{} requirement has no children", node.kind()),
        ));
    }

    match node {
        RequirementNode::CreditsFrom {
            credits_required, ..
        } if !credits_required.is_finite() || *credits_required < 0.0 => {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidValue,
                path,
                format!("credits_required must be non-negative, got {credits_required}"),
            ));
        }
        RequirementNode::Gpa { minimum } if !minimum.is_finite() => {
            errors.push(ValidationError::new(
                ValidationErrorKind::NotANumber,
                path,
                "GPA minimum is not a finite number",
            ));
        }
        RequirementNode::Course { code, .. } if code.trim().is_empty() => {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                path,
                "COURSE requirement has an empty code",
            ));
        }
        _ => {}
    }

    for (i, child) in node.children().iter().enumerate() {
        validate_requirement(child, &format!("{path}.requirements[{i}]"), errors);
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Season;

    fn sample_courses() -> Vec<Course> {
        vec![
            Course::new("CS 1400").with_credits(4.0),
            Course::new("CS 1410")
                .with_credits(4.0)
                .with_prerequisite("CS 1400"),
            Course::new("CS 2420").with_prerequisite("CS 1410"),
        ]
    }

    #[test]
    fn test_valid_courses() {
        assert!(validate_courses(&sample_courses()).is_ok());
    }

    #[test]
    fn test_duplicate_code() {
        let courses = vec![Course::new("CS 1400"), Course::new("cs  1400")];
        let errors = validate_courses(&courses).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.path == "courses[1]"));
    }

    #[test]
    fn test_invalid_credits() {
        let courses = vec![
            Course::new("A 1").with_credit_range(4.0, 3.0),
            Course::new("B 1").with_credits(-1.0),
        ];
        let errors = validate_courses(&courses).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidCredits)
                .count(),
            2
        );
    }

    #[test]
    fn test_empty_composite() {
        let courses = vec![Course::new("A 1").with_requisite(RequirementNode::and(vec![
            RequirementNode::course("B 1"),
            RequirementNode::or(vec![]),
        ]))];
        let errors = validate_courses(&courses).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::EmptyChildren);
        assert_eq!(errors[0].path, "courses[0].requisite.requirements[1]");
    }

    #[test]
    fn test_self_reference_is_not_fatal() {
        let courses = vec![Course::new("A 1").with_requisite(RequirementNode::or(vec![
            RequirementNode::course("A 1"),
            RequirementNode::permission("Instructor"),
        ]))];
        assert!(validate_courses(&courses).is_ok());
    }

    #[test]
    fn test_program_checks() {
        let empty = Program::new("P");
        assert!(validate_program(&empty).is_err());

        let bad = Program::new("P").with_requirement(RequirementNode::credits_from(-3.0, vec![
            RequirementNode::course("A 1"),
        ]));
        let errors = validate_program(&bad).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidValue);

        let ok = Program::new("P").with_course("A 1");
        assert!(validate_program(&ok).is_ok());
    }

    #[test]
    fn test_state_checks() {
        let state = StudentState::new(Season::Fall, 2025).with_credit_cap(0).with_gpa(-1.0);
        let errors = validate_state(&state).unwrap_err();
        assert_eq!(errors.len(), 2);

        assert!(validate_state(&StudentState::new(Season::Fall, 2025)).is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let courses = vec![
            Course::new("A 1").with_credits(-2.0),
            Course::new("A 1").with_requisite(RequirementNode::choose_n(1, vec![])),
        ];
        let errors = validate_courses(&courses).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_error_display() {
        let e = ValidationError::new(ValidationErrorKind::NotANumber, "requisite.gpa", "bad");
        assert_eq!(e.to_string(), "requisite.gpa: bad");
        assert_eq!(e.kind.to_string(), "NotANumber");
    }
}
