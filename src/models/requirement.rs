//! Requirement tree model.
//!
//! A requirement tree describes what must be true before a course (or a
//! program milestone) becomes eligible. Leaves reference courses, standing,
//! placements, GPA floors, permissions, or free text; interior nodes combine
//! children with AND / OR, or set a threshold over the courses reachable
//! beneath them (CREDITS_FROM, CHOOSE_N).
//!
//! Trees are immutable values. Simplification (see [`crate::simplify`])
//! always builds new nodes.
//!
//! # Wire vocabulary
//!
//! Nodes serialize as internally tagged objects using the catalog vocabulary:
//!
//! ```json
//! { "type": "AND", "requirements": [
//!     { "type": "COURSE", "course": "CS 2400", "timing": "COMPLETED" },
//!     { "type": "GPA", "gpa": 2.5 }
//! ] }
//! ```
//!
//! Deserialization goes through [`crate::parser::parse_requirement`], so a
//! tree loaded with serde is always validated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::parser;
use crate::validation::ValidationError;

/// When a referenced course has to be taken relative to the requiring course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Timing {
    /// Must be finished in an earlier term.
    #[default]
    Completed,
    /// Must be taken in the same term.
    Concurrent,
    /// Same term or earlier.
    ConcurrentOrCompleted,
}

impl Timing {
    /// Whether the relation can be met by taking both courses in one term.
    pub fn allows_same_term(self) -> bool {
        !matches!(self, Self::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Concurrent => "CONCURRENT",
            Self::ConcurrentOrCompleted => "CONCURRENT_OR_COMPLETED",
        }
    }
}

impl FromStr for Timing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" => Ok(Self::Completed),
            "CONCURRENT" => Ok(Self::Concurrent),
            "CONCURRENT_OR_COMPLETED" => Ok(Self::ConcurrentOrCompleted),
            other => Err(format!("unknown timing '{other}'")),
        }
    }
}

/// Academic standing, ordered freshman < sophomore < junior < senior.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StandingLevel {
    #[default]
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

impl StandingLevel {
    /// Standing implied by earned credit hours.
    ///
    /// More than 90 credits is senior, more than 60 junior, more than 30
    /// sophomore; anything else is freshman.
    pub fn from_credits(credits: f64) -> Self {
        if credits > 90.0 {
            Self::Senior
        } else if credits > 60.0 {
            Self::Junior
        } else if credits > 30.0 {
            Self::Sophomore
        } else {
            Self::Freshman
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freshman => "freshman",
            Self::Sophomore => "sophomore",
            Self::Junior => "junior",
            Self::Senior => "senior",
        }
    }
}

impl FromStr for StandingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "freshman" => Ok(Self::Freshman),
            "sophomore" => Ok(Self::Sophomore),
            "junior" => Ok(Self::Junior),
            "senior" => Ok(Self::Senior),
            other => Err(format!("unknown standing level '{other}'")),
        }
    }
}

impl fmt::Display for StandingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placement-exam tier within one subject.
///
/// Stored in canonical (trimmed, upper-case) text. Tiers compare by
/// [`rank`](Self::rank): the integer value of a numeric tier, 0 for any
/// non-numeric tier such as `"DV"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlacementLevel(String);

impl PlacementLevel {
    pub fn new(level: impl AsRef<str>) -> Self {
        Self(level.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rank(&self) -> u32 {
        self.0.parse().unwrap_or(0)
    }
}

impl From<String> for PlacementLevel {
    fn from(level: String) -> Self {
        Self::new(level)
    }
}

impl From<&str> for PlacementLevel {
    fn from(level: &str) -> Self {
        Self::new(level)
    }
}

impl From<PlacementLevel> for String {
    fn from(level: PlacementLevel) -> Self {
        level.0
    }
}

impl From<u32> for PlacementLevel {
    fn from(rank: u32) -> Self {
        Self(rank.to_string())
    }
}

impl fmt::Display for PlacementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a placement subject (trimmed, lower-case).
pub fn normalize_subject(subject: &str) -> String {
    subject.trim().to_lowercase()
}

/// The eleven requirement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    None,
    Course,
    Level,
    Placement,
    Permission,
    Gpa,
    Other,
    And,
    Or,
    CreditsFrom,
    ChooseN,
}

impl RequirementKind {
    pub const ALL: [RequirementKind; 11] = [
        Self::None,
        Self::Course,
        Self::Level,
        Self::Placement,
        Self::Permission,
        Self::Gpa,
        Self::Other,
        Self::And,
        Self::Or,
        Self::CreditsFrom,
        Self::ChooseN,
    ];

    /// Type tag used on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Course => "COURSE",
            Self::Level => "LEVEL",
            Self::Placement => "PLACEMENT",
            Self::Permission => "PERMISSION",
            Self::Gpa => "GPA",
            Self::Other => "OTHER",
            Self::And => "AND",
            Self::Or => "OR",
            Self::CreditsFrom => "CREDITS_FROM",
            Self::ChooseN => "CHOOSE_N",
        }
    }

    /// Kinds that own a child list, which must be non-empty.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::CreditsFrom | Self::ChooseN)
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A node of a requirement tree.
///
/// Closed sum type: every algorithm over trees matches exhaustively, so a new
/// kind cannot be silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    try_from = "serde_json::Value"
)]
pub enum RequirementNode {
    /// No requirement (also the result of a satisfied requirement).
    #[default]
    None,

    /// A course, referenced by canonical code.
    Course {
        #[serde(rename = "course")]
        code: String,
        timing: Timing,
    },

    /// Minimum academic standing.
    Level { level: StandingLevel },

    /// Minimum placement tier in a subject.
    Placement {
        subject: String,
        level: PlacementLevel,
    },

    /// Instructor or department sign-off. Never verified automatically.
    Permission { authority: String },

    /// GPA floor.
    Gpa {
        #[serde(rename = "gpa")]
        minimum: f64,
    },

    /// Free-text requirement outside the structured vocabulary.
    Other {
        #[serde(rename = "other")]
        description: String,
    },

    /// Every child must hold.
    And {
        #[serde(rename = "requirements")]
        children: Vec<RequirementNode>,
    },

    /// At least one child must hold.
    Or {
        #[serde(rename = "requirements")]
        children: Vec<RequirementNode>,
    },

    /// Holds once completed courses anywhere below sum to `credits_required`.
    ///
    /// `credited` lists completed courses already subtracted from the
    /// threshold by an earlier simplification.
    CreditsFrom {
        credits_required: f64,
        #[serde(rename = "requirements")]
        children: Vec<RequirementNode>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        credited: BTreeSet<String>,
    },

    /// Holds once `n` distinct courses anywhere below are completed.
    ///
    /// `credited` has the same meaning as for [`RequirementNode::CreditsFrom`].
    ChooseN {
        #[serde(rename = "choose")]
        n: u32,
        #[serde(rename = "requirements")]
        children: Vec<RequirementNode>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        credited: BTreeSet<String>,
    },
}

impl RequirementNode {
    /// A course that must be completed beforehand.
    pub fn course(code: impl AsRef<str>) -> Self {
        Self::Course {
            code: super::normalize_code(code.as_ref()),
            timing: Timing::Completed,
        }
    }

    /// A course reference with explicit timing.
    pub fn course_with_timing(code: impl AsRef<str>, timing: Timing) -> Self {
        Self::Course {
            code: super::normalize_code(code.as_ref()),
            timing,
        }
    }

    pub fn level(level: StandingLevel) -> Self {
        Self::Level { level }
    }

    pub fn placement(subject: impl AsRef<str>, level: impl Into<PlacementLevel>) -> Self {
        Self::Placement {
            subject: normalize_subject(subject.as_ref()),
            level: level.into(),
        }
    }

    pub fn permission(authority: impl Into<String>) -> Self {
        Self::Permission {
            authority: authority.into(),
        }
    }

    pub fn gpa(minimum: f64) -> Self {
        Self::Gpa { minimum }
    }

    pub fn other(description: impl Into<String>) -> Self {
        Self::Other {
            description: description.into(),
        }
    }

    pub fn and(children: Vec<RequirementNode>) -> Self {
        Self::And { children }
    }

    pub fn or(children: Vec<RequirementNode>) -> Self {
        Self::Or { children }
    }

    pub fn credits_from(credits_required: f64, children: Vec<RequirementNode>) -> Self {
        Self::CreditsFrom {
            credits_required,
            children,
            credited: BTreeSet::new(),
        }
    }

    pub fn choose_n(n: u32, children: Vec<RequirementNode>) -> Self {
        Self::ChooseN {
            n,
            children,
            credited: BTreeSet::new(),
        }
    }

    /// AND-combines a requirement list: empty → NONE, one element → itself.
    pub fn all_of(mut requirements: Vec<RequirementNode>) -> Self {
        match requirements.len() {
            0 => Self::None,
            1 => requirements.remove(0),
            _ => Self::And {
                children: requirements,
            },
        }
    }

    pub fn kind(&self) -> RequirementKind {
        match self {
            Self::None => RequirementKind::None,
            Self::Course { .. } => RequirementKind::Course,
            Self::Level { .. } => RequirementKind::Level,
            Self::Placement { .. } => RequirementKind::Placement,
            Self::Permission { .. } => RequirementKind::Permission,
            Self::Gpa { .. } => RequirementKind::Gpa,
            Self::Other { .. } => RequirementKind::Other,
            Self::And { .. } => RequirementKind::And,
            Self::Or { .. } => RequirementKind::Or,
            Self::CreditsFrom { .. } => RequirementKind::CreditsFrom,
            Self::ChooseN { .. } => RequirementKind::ChooseN,
        }
    }

    /// Whether this is the NONE node.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Child list of a composite node (empty slice for leaves).
    pub fn children(&self) -> &[RequirementNode] {
        match self {
            Self::And { children }
            | Self::Or { children }
            | Self::CreditsFrom { children, .. }
            | Self::ChooseN { children, .. } => children,
            Self::None
            | Self::Course { .. }
            | Self::Level { .. }
            | Self::Placement { .. }
            | Self::Permission { .. }
            | Self::Gpa { .. }
            | Self::Other { .. } => &[],
        }
    }

    /// Visits every COURSE leaf anywhere in the tree, depth first, in order.
    pub fn for_each_course<'a>(&'a self, f: &mut impl FnMut(&'a str, Timing)) {
        match self {
            Self::Course { code, timing } => f(code, *timing),
            _ => {
                for child in self.children() {
                    child.for_each_course(f);
                }
            }
        }
    }

    /// Every course code referenced anywhere in the tree.
    pub fn course_codes(&self) -> BTreeSet<String> {
        let mut codes = BTreeSet::new();
        self.for_each_course(&mut |code, _| {
            codes.insert(code.to_string());
        });
        codes
    }

    /// Number of nodes in the tree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Self::node_count).sum::<usize>()
    }
}

impl TryFrom<serde_json::Value> for RequirementNode {
    type Error = ValidationError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        parser::parse_requirement(&value)
    }
}

/// Collects course codes from a list of trees.
pub fn course_codes_in(requirements: &[RequirementNode]) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();
    for req in requirements {
        req.for_each_course(&mut |code, _| {
            codes.insert(code.to_string());
        });
    }
    codes
}
