//! Read-only course catalog lookup.
//!
//! The engine only ever asks the catalog for a course by code. A missing
//! course is not an error: callers treat the referencing requirement as
//! satisfied and report a warning.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{PlanError, Result};
use crate::models::{normalize_code, Course};
use crate::validation::validate_courses;

/// Course lookup by code.
///
/// Implementations must be safe for concurrent read-only access, so that
/// independent planning runs can share one catalog.
pub trait Catalog: Send + Sync {
    /// Looks up a course by code. `None` means not found.
    fn get_course(&self, code: &str) -> Option<&Course>;

    /// Whether the catalog knows a course.
    fn contains(&self, code: &str) -> bool {
        self.get_course(code).is_some()
    }
}

/// A catalog held in memory, keyed by canonical course code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Course>", into = "Vec<Course>")]
pub struct InMemoryCatalog {
    courses: BTreeMap<String, Course>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog after checking the course list for integrity
    /// problems (duplicate codes, bad credit values, empty composites).
    pub fn from_courses(courses: Vec<Course>) -> Result<Self> {
        validate_courses(&courses).map_err(PlanError::InvalidInput)?;
        Ok(courses.into_iter().collect())
    }

    /// Parses and validates a JSON array of courses.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let courses: Vec<Course> = serde_json::from_str(json)?;
        Self::from_courses(courses)
    }

    /// Adds a course, replacing any course with the same code.
    pub fn insert(&mut self, mut course: Course) -> Option<Course> {
        course.code = normalize_code(&course.code);
        self.courses.insert(course.code.clone(), course)
    }

    /// Adds a course (builder form).
    pub fn with_course(mut self, course: Course) -> Self {
        self.insert(course);
        self
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Courses in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    /// Course codes in order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.courses.keys().map(String::as_str)
    }
}

impl Catalog for InMemoryCatalog {
    fn get_course(&self, code: &str) -> Option<&Course> {
        self.courses
            .get(code)
            .or_else(|| self.courses.get(&normalize_code(code)))
    }
}

impl Catalog for HashMap<String, Course> {
    fn get_course(&self, code: &str) -> Option<&Course> {
        self.get(code)
    }
}

impl FromIterator<Course> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Course>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for course in iter {
            catalog.insert(course);
        }
        catalog
    }
}

impl From<Vec<Course>> for InMemoryCatalog {
    fn from(courses: Vec<Course>) -> Self {
        courses.into_iter().collect()
    }
}

impl From<InMemoryCatalog> for Vec<Course> {
    fn from(catalog: InMemoryCatalog) -> Self {
        catalog.courses.into_values().collect()
    }
}
