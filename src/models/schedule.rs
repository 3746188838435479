//! Schedule (solution) model.
//!
//! A schedule is an ordered list of terms, each holding the courses placed
//! in it and their combined credit hours. A planning run also reports
//! recovered data-quality problems as warnings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Term;

/// A complete semester plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Planned terms in chronological order.
    pub terms: Vec<ScheduledTerm>,
}

/// The courses placed in one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTerm {
    /// The semester.
    pub term: Term,
    /// Course codes, in code order.
    pub courses: Vec<String>,
    /// Sum of `min_credits` over `courses`.
    pub total_credits: f64,
}

impl ScheduledTerm {
    pub fn new(term: Term, courses: Vec<String>, total_credits: f64) -> Self {
        Self {
            term,
            courses,
            total_credits,
        }
    }

    #[inline]
    pub fn is_spring(&self) -> bool {
        self.term.is_spring()
    }

    #[inline]
    pub fn year(&self) -> i32 {
        self.term.year
    }

    pub fn contains(&self, code: &str) -> bool {
        self.courses.iter().any(|c| c == code)
    }
}

/// A recovered problem found while planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWarning {
    /// Type of problem.
    pub kind: WarningKind,
    /// Course the warning is about.
    pub course: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of planning warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A referenced course is not in the catalog; treated as satisfied.
    UnknownCourse,
    /// A course has an unrecognised offering pattern; treated as always offered.
    UnmappedPattern,
    /// A course alone exceeds the per-term credit cap.
    CreditCapExceeded,
}

impl PlanWarning {
    /// A course code that the catalog does not know.
    pub fn unknown_course(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UnknownCourse,
            course: code.into(),
            message: message.into(),
        }
    }

    /// A course whose offering pattern is outside the known vocabulary.
    pub fn unmapped_pattern(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UnmappedPattern,
            course: code.into(),
            message: message.into(),
        }
    }

    /// A course bigger than the per-term cap, placed alone.
    pub fn credit_cap_exceeded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::CreditCapExceeded,
            course: code.into(),
            message: message.into(),
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a term.
    pub fn add_term(&mut self, term: ScheduledTerm) {
        self.terms.push(term);
    }

    /// Number of planned terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Whether nothing was scheduled.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Index of the term holding a course.
    pub fn term_index_of(&self, code: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.contains(code))
    }

    /// The term holding a course.
    pub fn term_of(&self, code: &str) -> Option<Term> {
        self.term_index_of(code).map(|i| self.terms[i].term)
    }

    /// Course → term index, for every scheduled course.
    pub fn positions(&self) -> HashMap<&str, usize> {
        self.terms
            .iter()
            .enumerate()
            .flat_map(|(i, t)| t.courses.iter().map(move |c| (c.as_str(), i)))
            .collect()
    }

    /// Every scheduled course, term by term.
    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .flat_map(|t| t.courses.iter().map(String::as_str))
    }

    /// Number of scheduled courses.
    pub fn course_count(&self) -> usize {
        self.terms.iter().map(|t| t.courses.len()).sum()
    }

    /// Credit hours across all terms.
    pub fn total_credits(&self) -> f64 {
        self.terms.iter().map(|t| t.total_credits).sum()
    }

    /// Heaviest term load.
    pub fn max_term_credits(&self) -> f64 {
        self.terms
            .iter()
            .map(|t| t.total_credits)
            .fold(0.0, f64::max)
    }

    /// Last planned term.
    pub fn last_term(&self) -> Option<Term> {
        self.terms.last().map(|t| t.term)
    }
}
