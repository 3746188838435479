//! Required-course expansion.
//!
//! Starting from the courses a program requires unconditionally, repeatedly
//! pulls in every course named by the (simplified) prerequisite trees of
//! courses already in the set, until a round adds nothing new.
//!
//! # Algorithm
//! 1. Partition the root list: COURSE leaves (through nested ANDs) seed the
//!    required set; OR / CHOOSE_N / CREDITS_FROM are set aside as choices.
//! 2. Each round processes every not-yet-processed course: its raw
//!    prerequisite tree is simplified against the student state and every
//!    course code left anywhere in the result joins the required set.
//! 3. Stop when a round adds no codes. Each course is processed once, so
//!    the loop ends within catalog-size rounds; a configurable bound guards
//!    against bad catalog data.
//!
//! Course codes the catalog does not know are dropped with a warning.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{PlanError, Result};
use crate::models::{PlanWarning, RequirementNode, StudentState};
use crate::simplify::Simplifier;

/// Default bound on expansion rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 256;

/// Result of expanding a program's requirements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// Every course that may need scheduling, completed ones included.
    pub required: BTreeSet<String>,
    /// Top-level choice requirements, unexpanded and unsimplified.
    pub choices: Vec<RequirementNode>,
    /// Unknown course codes met along the way.
    pub warnings: Vec<PlanWarning>,
    /// Rounds run before reaching the fixed point.
    pub rounds: usize,
}

/// Expands a program's root requirement list into a required-course set.
pub struct Expander<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    simplifier: Simplifier<'a, C>,
    max_rounds: usize,
}

impl<'a, C: Catalog + ?Sized> Expander<'a, C> {
    pub fn new(catalog: &'a C, state: &'a StudentState) -> Self {
        Self {
            catalog,
            simplifier: Simplifier::new(catalog, state),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Sets the round bound.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Runs the expansion.
    ///
    /// # Errors
    /// [`PlanError::ExpansionLimitExceeded`] if the fixed point is not reached
    /// within the round bound.
    pub fn expand(&self, roots: &[RequirementNode]) -> Result<Expansion> {
        let mut direct = Vec::new();
        let mut choices = Vec::new();
        for root in roots {
            partition(root, &mut direct, &mut choices);
        }

        let mut unknown = BTreeSet::new();
        let mut required = BTreeSet::new();
        for code in direct {
            self.admit(code, &mut required, &mut unknown);
        }

        let mut processed: BTreeSet<String> = BTreeSet::new();
        let mut rounds = 0;
        loop {
            let pending: Vec<String> = required.difference(&processed).cloned().collect();
            if pending.is_empty() {
                break;
            }
            if rounds >= self.max_rounds {
                return Err(PlanError::ExpansionLimitExceeded {
                    rounds,
                    pending,
                });
            }
            rounds += 1;

            let before = required.len();
            for code in pending {
                if let Some(course) = self.catalog.get_course(&code) {
                    let open = self.simplifier.simplify(&course.raw_requisite);
                    for found in open.course_codes() {
                        self.admit(found, &mut required, &mut unknown);
                    }
                }
                processed.insert(code);
            }
            debug!(
                round = rounds,
                added = required.len() - before,
                total = required.len(),
                "expansion round"
            );
        }

        let warnings = unknown
            .into_iter()
            .map(|code| {
                let message = format!("course {code} is not in the catalog; dropped from the plan");
                PlanWarning::unknown_course(code, message)
            })
            .collect();

        Ok(Expansion {
            required,
            choices,
            warnings,
            rounds,
        })
    }

    fn admit(&self, code: String, required: &mut BTreeSet<String>, unknown: &mut BTreeSet<String>) {
        if required.contains(&code) || unknown.contains(&code) {
            return;
        }
        if self.catalog.contains(&code) {
            required.insert(code);
        } else {
            warn!(course = %code, "required course not in catalog; dropped");
            unknown.insert(code);
        }
    }
}

/// Splits a root requirement into direct course codes and choices.
fn partition(node: &RequirementNode, direct: &mut Vec<String>, choices: &mut Vec<RequirementNode>) {
    match node {
        RequirementNode::Course { code, .. } => direct.push(code.clone()),
        RequirementNode::And { children } => {
            for child in children {
                partition(child, direct, choices);
            }
        }
        RequirementNode::Or { .. }
        | RequirementNode::CreditsFrom { .. }
        | RequirementNode::ChooseN { .. } => choices.push(node.clone()),
        RequirementNode::None
        | RequirementNode::Level { .. }
        | RequirementNode::Placement { .. }
        | RequirementNode::Permission { .. }
        | RequirementNode::Gpa { .. }
        | RequirementNode::Other { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::models::{Course, Season, WarningKind};

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_course(Course::new("CS 1400").with_requisite(RequirementNode::placement("math", "2")))
            .with_course(Course::new("CS 1410").with_prerequisite("CS 1400"))
            .with_course(
                Course::new("CS 2420")
                    .with_prerequisite("CS 1410")
                    .with_prerequisite("MATH 1210"),
            )
            .with_course(Course::new("MATH 1210").with_prerequisite("MATH 1050"))
            .with_course(Course::new("MATH 1050"))
            .with_course(Course::new("CS 3005").with_requisite(RequirementNode::or(vec![
                RequirementNode::course("CS 2420"),
                RequirementNode::course("CS 2450"),
            ])))
            .with_course(Course::new("CS 2450"))
            .with_course(Course::new("ENGL 1010"))
    }

    #[test]
    fn test_transitive_closure() {
        let catalog = catalog();
        let state = StudentState::new(Season::Fall, 2025);
        let expansion = Expander::new(&catalog, &state)
            .expand(&[RequirementNode::course("CS 2420")])
            .unwrap();

        let required: Vec<&str> = expansion.required.iter().map(String::as_str).collect();
        assert_eq!(
            required,
            vec!["CS 1400", "CS 1410", "CS 2420", "MATH 1050", "MATH 1210"]
        );
        assert!(expansion.choices.is_empty());
        assert!(expansion.warnings.is_empty());
    }

    #[test]
    fn test_or_branches_all_pulled_in() {
        let catalog = catalog();
        let state = StudentState::new(Season::Fall, 2025);
        let expansion = Expander::new(&catalog, &state)
            .expand(&[RequirementNode::course("CS 3005")])
            .unwrap();
        assert!(expansion.required.contains("CS 2450"));
        assert!(expansion.required.contains("CS 2420"));
    }

    #[test]
    fn test_completed_prereqs_not_expanded() {
        let catalog = catalog();
        let state = StudentState::new(Season::Fall, 2025).with_completed("MATH 1210");
        let expansion = Expander::new(&catalog, &state)
            .expand(&[RequirementNode::course("CS 2420")])
            .unwrap();
        assert!(!expansion.required.contains("MATH 1210"));
        assert!(!expansion.required.contains("MATH 1050"));
        assert!(expansion.required.contains("CS 1400"));
    }

    #[test]
    fn test_partition_choices() {
        let catalog = catalog();
        let state = StudentState::new(Season::Fall, 2025);
        let roots = vec![
            RequirementNode::and(vec![
                RequirementNode::course("ENGL 1010"),
                RequirementNode::and(vec![RequirementNode::course("MATH 1050")]),
            ]),
            RequirementNode::or(vec![
                RequirementNode::course("CS 2450"),
                RequirementNode::course("CS 1400"),
            ]),
            RequirementNode::choose_n(1, vec![RequirementNode::course("CS 1410")]),
            RequirementNode::gpa(2.0),
        ];
        let expansion = Expander::new(&catalog, &state).expand(&roots).unwrap();

        assert_eq!(expansion.required.len(), 2);
        assert_eq!(expansion.choices.len(), 2);
    }

    #[test]
    fn test_unknown_course_dropped_with_warning() {
        let catalog = catalog();
        let state = StudentState::new(Season::Fall, 2025);
        let expansion = Expander::new(&catalog, &state)
            .expand(&[
                RequirementNode::course("ENGL 1010"),
                RequirementNode::course("HIST 9999"),
            ])
            .unwrap();

        assert!(!expansion.required.contains("HIST 9999"));
        assert_eq!(expansion.warnings.len(), 1);
        assert_eq!(expansion.warnings[0].kind, WarningKind::UnknownCourse);
        assert_eq!(expansion.warnings[0].course, "HIST 9999");
    }

    #[test]
    fn test_round_limit() {
        let catalog = catalog();
        let state = StudentState::new(Season::Fall, 2025);
        let err = Expander::new(&catalog, &state)
            .with_max_rounds(1)
            .expand(&[RequirementNode::course("CS 2420")])
            .unwrap_err();
        match err {
            PlanError::ExpansionLimitExceeded { rounds, pending } => {
                assert_eq!(rounds, 1);
                assert!(pending.contains(&"CS 1410".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mutual_prereqs_terminate() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("A 1").with_prerequisite("B 1"))
            .with_course(Course::new("B 1").with_prerequisite("A 1"));
        let state = StudentState::new(Season::Fall, 2025);
        let expansion = Expander::new(&catalog, &state)
            .expand(&[RequirementNode::course("A 1")])
            .unwrap();
        assert_eq!(expansion.required.len(), 2);
        assert_eq!(expansion.rounds, 2);
    }
}
