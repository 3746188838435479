//! Course model and offering patterns.
//!
//! A course is the unit the planner schedules. Besides credit hours it
//! carries its raw (unsimplified) prerequisite tree, which is the
//! authoritative source for dependency edges, and an offering pattern that
//! says in which terms it is historically taught.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RequirementNode, Term};

/// Canonical course code: trimmed, inner whitespace collapsed, upper-case.
///
/// ```
/// use u_courseplan::models::normalize_code;
/// assert_eq!(normalize_code("  cs   2400 "), "CS 2400");
/// ```
pub fn normalize_code(code: &str) -> String {
    code.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn deserialize_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(|code| normalize_code(&code))
}

fn deserialize_requisite<'de, D>(deserializer: D) -> Result<RequirementNode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    crate::parser::parse_requisite(&value).map_err(serde::de::Error::custom)
}

/// Which terms a course is offered in.
///
/// Unknown pattern strings are preserved in [`OfferingPattern::Unmapped`]
/// and treated as always offered; the planner reports them as warnings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OfferingPattern {
    Summer,
    FallAndSpring,
    Fall,
    Spring,
    FallEven,
    FallOdd,
    SpringEven,
    SpringOdd,
    SummerEven,
    SummerOdd,
    Irregular,
    Arranged,
    Deactivated,
    /// Pattern text outside the known vocabulary (empty when absent).
    Unmapped(String),
}

impl OfferingPattern {
    /// Parses pattern text case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "summer" => Self::Summer,
            "fall_and_spring" => Self::FallAndSpring,
            "fall" => Self::Fall,
            "spring" => Self::Spring,
            "fall_even" => Self::FallEven,
            "fall_odd" => Self::FallOdd,
            "spring_even" => Self::SpringEven,
            "spring_odd" => Self::SpringOdd,
            "summer_even" => Self::SummerEven,
            "summer_odd" => Self::SummerOdd,
            "irregular" => Self::Irregular,
            "arranged" => Self::Arranged,
            "deactivated" => Self::Deactivated,
            _ => Self::Unmapped(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Summer => "summer",
            Self::FallAndSpring => "fall_and_spring",
            Self::Fall => "fall",
            Self::Spring => "spring",
            Self::FallEven => "fall_even",
            Self::FallOdd => "fall_odd",
            Self::SpringEven => "spring_even",
            Self::SpringOdd => "spring_odd",
            Self::SummerEven => "summer_even",
            Self::SummerOdd => "summer_odd",
            Self::Irregular => "irregular",
            Self::Arranged => "arranged",
            Self::Deactivated => "deactivated",
            Self::Unmapped(raw) => raw,
        }
    }

    /// Whether the course may be scheduled in the given fall/spring term.
    ///
    /// Summer patterns are never allowed because summer terms are not
    /// planned. Parity patterns match on the calendar year of the term.
    pub fn allowed(&self, is_spring: bool, year: i32) -> bool {
        let even = year.rem_euclid(2) == 0;
        match self {
            Self::Summer | Self::SummerEven | Self::SummerOdd | Self::Deactivated => false,
            Self::FallAndSpring | Self::Irregular | Self::Arranged | Self::Unmapped(_) => true,
            Self::Fall => !is_spring,
            Self::Spring => is_spring,
            Self::FallEven => !is_spring && even,
            Self::FallOdd => !is_spring && !even,
            Self::SpringEven => is_spring && even,
            Self::SpringOdd => is_spring && !even,
        }
    }

    /// Shorthand for [`allowed`](Self::allowed) on a [`Term`].
    pub fn allows(&self, term: Term) -> bool {
        self.allowed(term.is_spring(), term.year)
    }

    /// Whether some fall or spring term can ever match.
    pub fn is_ever_offered(&self) -> bool {
        !matches!(
            self,
            Self::Summer | Self::SummerEven | Self::SummerOdd | Self::Deactivated
        )
    }

    pub fn is_unmapped(&self) -> bool {
        matches!(self, Self::Unmapped(_))
    }
}

impl Default for OfferingPattern {
    fn default() -> Self {
        Self::Unmapped(String::new())
    }
}

impl From<String> for OfferingPattern {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for OfferingPattern {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<OfferingPattern> for String {
    fn from(pattern: OfferingPattern) -> Self {
        pattern.as_str().to_string()
    }
}

impl fmt::Display for OfferingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Canonical course code (unique key).
    #[serde(deserialize_with = "deserialize_code")]
    pub code: String,
    /// Course title.
    #[serde(default)]
    pub name: String,
    /// Minimum credit hours (used for all credit arithmetic).
    pub min_credits: f64,
    /// Maximum credit hours (variable-credit courses).
    pub max_credits: f64,
    /// Terms the course is offered in.
    #[serde(default, rename = "pattern")]
    pub offering_pattern: OfferingPattern,
    /// Raw prerequisite tree, never simplified.
    #[serde(default, rename = "requisite", deserialize_with = "deserialize_requisite")]
    pub raw_requisite: RequirementNode,
    /// Foundational-requirement labels (bricks) this course counts toward.
    #[serde(default, alias = "bricks")]
    pub tags: Vec<String>,
}

impl Course {
    /// Creates a three-credit course offered every fall and spring with no
    /// prerequisites.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self {
            code: normalize_code(code.as_ref()),
            name: String::new(),
            min_credits: 3.0,
            max_credits: 3.0,
            offering_pattern: OfferingPattern::FallAndSpring,
            raw_requisite: RequirementNode::None,
            tags: Vec::new(),
        }
    }

    /// Sets the course title.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a fixed credit value (min = max).
    pub fn with_credits(mut self, credits: f64) -> Self {
        self.min_credits = credits;
        self.max_credits = credits;
        self
    }

    /// Sets a variable credit range.
    pub fn with_credit_range(mut self, min: f64, max: f64) -> Self {
        self.min_credits = min;
        self.max_credits = max;
        self
    }

    /// Sets the offering pattern.
    pub fn with_pattern(mut self, pattern: impl Into<OfferingPattern>) -> Self {
        self.offering_pattern = pattern.into();
        self
    }

    /// Sets the raw prerequisite tree.
    pub fn with_requisite(mut self, requisite: RequirementNode) -> Self {
        self.raw_requisite = requisite;
        self
    }

    /// Adds a prerequisite course (AND-combined with any existing tree).
    pub fn with_prerequisite(mut self, code: impl AsRef<str>) -> Self {
        let leaf = RequirementNode::course(code);
        self.raw_requisite = match std::mem::take(&mut self.raw_requisite) {
            RequirementNode::None => leaf,
            RequirementNode::And { mut children } => {
                children.push(leaf);
                RequirementNode::And { children }
            }
            other => RequirementNode::and(vec![other, leaf]),
        };
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether the course has any prerequisite structure.
    pub fn has_requisite(&self) -> bool {
        !self.raw_requisite.is_none()
    }
}
