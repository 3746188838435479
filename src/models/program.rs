//! Degree program model.

use serde::{Deserialize, Serialize};

use super::{course_codes_in, RequirementNode};
use std::collections::BTreeSet;

/// A degree program: metadata plus a root requirement list.
///
/// The root list is implicitly AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Program code (e.g. "BS7241").
    pub code: String,
    /// Program title.
    #[serde(default, alias = "program_name")]
    pub name: String,
    /// Program type (e.g. "Major", "Minor").
    #[serde(default)]
    pub program_type: String,
    /// Catalog year the requirements are taken from.
    #[serde(default)]
    pub catalog_year: Option<i32>,
    /// Total credit hours for the degree.
    #[serde(default, alias = "credits")]
    pub total_credits_required: f64,
    /// Top-level requirements, AND-combined.
    #[serde(rename = "requisite", deserialize_with = "deserialize_root")]
    pub root_requisite: Vec<RequirementNode>,
}

fn deserialize_root<'de, D>(deserializer: D) -> Result<Vec<RequirementNode>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    crate::parser::parse_root_requisite(&value).map_err(serde::de::Error::custom)
}

impl Program {
    /// Creates a program with no requirements.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            program_type: String::new(),
            catalog_year: None,
            total_credits_required: 0.0,
            root_requisite: Vec::new(),
        }
    }

    /// Sets the program title.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the degree credit total.
    pub fn with_total_credits(mut self, credits: f64) -> Self {
        self.total_credits_required = credits;
        self
    }

    /// Appends a top-level requirement.
    pub fn with_requirement(mut self, requirement: RequirementNode) -> Self {
        self.root_requisite.push(requirement);
        self
    }

    /// Appends a required course.
    pub fn with_course(self, code: impl AsRef<str>) -> Self {
        self.with_requirement(RequirementNode::course(code))
    }

    /// Root list as one AND node.
    pub fn root(&self) -> RequirementNode {
        RequirementNode::all_of(self.root_requisite.clone())
    }

    /// Every course code mentioned anywhere in the program requirements.
    pub fn course_codes(&self) -> BTreeSet<String> {
        course_codes_in(&self.root_requisite)
    }
}
