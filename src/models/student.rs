//! Student academic state.
//!
//! The state a planning run simplifies requirements against: completed
//! courses, placement tiers, GPA, standing, the per-term credit cap, and
//! the first term to plan.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{normalize_code, normalize_subject, PlacementLevel, Season, StandingLevel, Term};
use crate::catalog::Catalog;

/// Enrollment class implied by the per-term credit cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrollment {
    /// Fewer than 12 credits per term.
    PartTime,
    /// 12 to 20 credits per term.
    FullTime,
    /// More than 20 credits per term.
    Overloaded,
}

impl Enrollment {
    pub fn classify(credits_per_semester: u32) -> Self {
        match credits_per_semester {
            0..=11 => Self::PartTime,
            12..=20 => Self::FullTime,
            _ => Self::Overloaded,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PartTime => "part-time",
            Self::FullTime => "full-time",
            Self::Overloaded => "overloaded",
        }
    }
}

/// A student's current academic state for one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentState {
    /// Codes of completed courses.
    #[serde(default)]
    pub completed_courses: BTreeSet<String>,
    /// Highest placement tier per subject.
    #[serde(default)]
    pub placements: BTreeMap<String, PlacementLevel>,
    /// Cumulative GPA.
    #[serde(default)]
    pub gpa: f64,
    /// Academic standing.
    #[serde(default)]
    pub level: StandingLevel,
    /// Credit cap per term.
    pub credits_per_semester: u32,
    /// Year of the first planned term.
    pub start_year: i32,
    /// Season of the first planned term.
    pub start_term: Season,
}

impl StudentState {
    /// A freshman with nothing completed and a 15-credit cap.
    pub fn new(start_term: Season, start_year: i32) -> Self {
        Self {
            completed_courses: BTreeSet::new(),
            placements: BTreeMap::new(),
            gpa: 0.0,
            level: StandingLevel::Freshman,
            credits_per_semester: 15,
            start_year,
            start_term,
        }
    }

    /// Marks a course completed.
    pub fn with_completed(mut self, code: impl AsRef<str>) -> Self {
        self.completed_courses.insert(normalize_code(code.as_ref()));
        self
    }

    /// Records a placement; a subject keeps its highest-ranked tier.
    pub fn with_placement(
        mut self,
        subject: impl AsRef<str>,
        level: impl Into<PlacementLevel>,
    ) -> Self {
        let level = level.into();
        let subject = normalize_subject(subject.as_ref());
        match self.placements.get(&subject) {
            Some(existing) if existing.rank() >= level.rank() => {}
            _ => {
                self.placements.insert(subject, level);
            }
        }
        self
    }

    /// Sets the GPA.
    pub fn with_gpa(mut self, gpa: f64) -> Self {
        self.gpa = gpa;
        self
    }

    /// Sets the standing.
    pub fn with_level(mut self, level: StandingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the per-term credit cap.
    pub fn with_credit_cap(mut self, credits_per_semester: u32) -> Self {
        self.credits_per_semester = credits_per_semester;
        self
    }

    /// Derives standing from the credit hours of completed catalog courses.
    pub fn with_level_from_catalog<C: Catalog + ?Sized>(mut self, catalog: &C) -> Self {
        self.level = StandingLevel::from_credits(self.completed_credits(catalog));
        self
    }

    /// Whether a course (any spelling of its code) is completed.
    pub fn has_completed(&self, code: &str) -> bool {
        self.completed_courses.contains(code)
            || self.completed_courses.contains(&normalize_code(code))
    }

    /// Rank of the student's placement in a subject, if any.
    pub fn placement_rank(&self, subject: &str) -> Option<u32> {
        self.placements
            .get(&normalize_subject(subject))
            .map(PlacementLevel::rank)
    }

    /// Sum of `min_credits` over completed courses known to the catalog.
    pub fn completed_credits<C: Catalog + ?Sized>(&self, catalog: &C) -> f64 {
        self.completed_courses
            .iter()
            .filter_map(|code| match catalog.get_course(code) {
                Some(course) => Some(course.min_credits),
                None => {
                    tracing::warn!(course = %code, "completed course not in catalog; not counted toward standing");
                    None
                }
            })
            .sum()
    }

    /// First term to plan.
    pub fn first_term(&self) -> Term {
        Term::new(self.start_term, self.start_year)
    }

    pub fn enrollment(&self) -> Enrollment {
        Enrollment::classify(self.credits_per_semester)
    }
}
