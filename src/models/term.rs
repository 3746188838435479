//! Academic terms.
//!
//! Only fall and spring semesters are planned. The term clock advances
//! spring → fall of the same year, and fall → spring of the next year.
//!
//! # Ordering
//! Terms order chronologically: by year, then spring before fall.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semester within an academic year.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    #[default]
    Fall,
}

impl Season {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Fall => "fall",
        }
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Ok(Self::Spring),
            "fall" => Ok(Self::Fall),
            other => Err(format!("unsupported term '{other}' (only fall and spring)")),
        }
    }
}

/// One fall or spring semester of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    /// Calendar year the semester runs in.
    pub year: i32,
    /// Fall or spring.
    pub season: Season,
}

impl Term {
    pub fn new(season: Season, year: i32) -> Self {
        Self { year, season }
    }

    pub fn fall(year: i32) -> Self {
        Self::new(Season::Fall, year)
    }

    pub fn spring(year: i32) -> Self {
        Self::new(Season::Spring, year)
    }

    #[inline]
    pub fn is_spring(&self) -> bool {
        self.season == Season::Spring
    }

    /// The following term (summer is skipped).
    pub fn next(self) -> Self {
        match self.season {
            Season::Spring => Self::fall(self.year),
            Season::Fall => Self::spring(self.year + 1),
        }
    }

    /// Iterator over this term and every term after it.
    pub fn iter_from(self) -> impl Iterator<Item = Term> {
        std::iter::successors(Some(self), |t| Some(t.next()))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.season {
            Season::Spring => "Spring",
            Season::Fall => "Fall",
        };
        write!(f, "{name} {}", self.year)
    }
}
