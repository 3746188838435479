//! Foundational-requirement (brick) tally.
//!
//! Accumulates credit hours per bucket from the tags of a course set. This
//! is a report only; scheduling never consults it.
//!
//! # Tag format
//!
//! | Tag | Bucket |
//! |-----|--------|
//! | `Writing Seminar (FWS)` | `FWS` |
//! | `FQR` | `FQR` |
//! | `Quantitative reasoning` | *(skipped)* |

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;

/// Credit progress within one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TagBucket {
    /// Credit hours accumulated.
    pub current: f64,
    /// Credit hours the bucket needs (0 for buckets outside the requirement table).
    pub required: f64,
}

impl TagBucket {
    pub fn is_satisfied(&self) -> bool {
        self.current >= self.required
    }

    /// Credit hours still missing.
    pub fn shortfall(&self) -> f64 {
        (self.required - self.current).max(0.0)
    }
}

/// Bucket totals for a set of courses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagTally {
    /// Bucket code → progress.
    pub buckets: BTreeMap<String, TagBucket>,
    /// Tags no bucket code could be read from.
    pub unparsed: Vec<String>,
}

impl TagTally {
    /// Tallies the tags of `courses` (each course counted once) against the
    /// bucket table.
    ///
    /// Every bucket in `requirements` is reported, even with nothing earned.
    /// Courses unknown to the catalog contribute nothing.
    pub fn calculate<'c, C: Catalog + ?Sized>(
        catalog: &C,
        courses: impl IntoIterator<Item = &'c str>,
        requirements: &BTreeMap<String, f64>,
    ) -> Self {
        let mut tally = Self {
            buckets: requirements
                .iter()
                .map(|(code, required)| {
                    (
                        code.clone(),
                        TagBucket {
                            current: 0.0,
                            required: *required,
                        },
                    )
                })
                .collect(),
            unparsed: Vec::new(),
        };

        let unique: BTreeSet<&str> = courses.into_iter().collect();
        for code in unique {
            let Some(course) = catalog.get_course(code) else {
                continue;
            };
            for tag in &course.tags {
                match bucket_code(tag) {
                    Some(bucket) => {
                        tally
                            .buckets
                            .entry(bucket)
                            .or_insert(TagBucket {
                                current: 0.0,
                                required: 0.0,
                            })
                            .current += course.min_credits;
                    }
                    None => {
                        debug!(course = %code, tag = %tag, "tag has no bucket code; skipped");
                        tally.unparsed.push(tag.clone());
                    }
                }
            }
        }
        tally
    }

    /// Buckets still short of their requirement, in code order.
    pub fn unsatisfied(&self) -> impl Iterator<Item = (&str, &TagBucket)> {
        self.buckets
            .iter()
            .filter(|(_, bucket)| !bucket.is_satisfied())
            .map(|(code, bucket)| (code.as_str(), bucket))
    }

    /// Whether every bucket is met.
    pub fn all_satisfied(&self) -> bool {
        self.buckets.values().all(TagBucket::is_satisfied)
    }
}

fn bucket_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\(([A-Z]+)\)").ok())
        .as_ref()
}

/// Bucket code of a tag: the upper-case code in parentheses, or the tag
/// itself when it is a bare upper-case code.
pub fn bucket_code(tag: &str) -> Option<String> {
    let tag = tag.trim();
    if let Some(caps) = bucket_pattern().and_then(|re| re.captures(tag)) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(tag.to_string());
    }
    None
}
