//! Requirement simplification.
//!
//! Reduces a requirement tree against a student's current state, collapsing
//! satisfied branches to [`RequirementNode::None`]. The input tree is never
//! modified; a new tree is returned.
//!
//! # Rules
//!
//! | Node | Result |
//! |------|--------|
//! | NONE | itself |
//! | COURSE | NONE if completed or unknown to the catalog, else itself |
//! | GPA | NONE iff `state.gpa >= minimum` |
//! | PLACEMENT | NONE iff a same-subject placement has rank >= required rank |
//! | LEVEL | NONE iff standing >= required |
//! | PERMISSION | itself (never assumed granted) |
//! | OTHER | NONE (unverifiable) |
//! | AND | satisfied children dropped; NONE when none remain |
//! | OR | NONE if any child is satisfied, else OR of simplified children |
//! | CREDITS_FROM | threshold reduced by completed credits below; children untouched |
//! | CHOOSE_N | count reduced by completed courses below; children untouched |
//!
//! Simplification is idempotent: threshold nodes remember which completed
//! courses they already subtracted, so a second pass changes nothing.

use std::collections::BTreeSet;

use tracing::warn;

use crate::catalog::Catalog;
use crate::models::{RequirementNode, StudentState};

/// Simplifies requirement trees against one student state.
///
/// Holds only shared references; a simplifier can be reused for any number
/// of trees and shared across threads.
#[derive(Debug)]
pub struct Simplifier<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    state: &'a StudentState,
}

impl<'a, C: Catalog + ?Sized> Clone for Simplifier<'a, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, C: Catalog + ?Sized> Copy for Simplifier<'a, C> {}

impl<'a, C: Catalog + ?Sized> Simplifier<'a, C> {
    pub fn new(catalog: &'a C, state: &'a StudentState) -> Self {
        Self { catalog, state }
    }

    /// Simplifies one tree.
    pub fn simplify(&self, node: &RequirementNode) -> RequirementNode {
        match node {
            RequirementNode::None => RequirementNode::None,

            RequirementNode::Course { code, .. } => {
                if self.state.has_completed(code) {
                    RequirementNode::None
                } else if !self.catalog.contains(code) {
                    warn!(course = %code, "course not in catalog; treating requirement as satisfied");
                    RequirementNode::None
                } else {
                    node.clone()
                }
            }

            RequirementNode::Gpa { minimum } => satisfied_if(self.state.gpa >= *minimum, node),

            RequirementNode::Placement { subject, level } => satisfied_if(
                self.state
                    .placement_rank(subject)
                    .is_some_and(|rank| rank >= level.rank()),
                node,
            ),

            RequirementNode::Level { level } => satisfied_if(self.state.level >= *level, node),

            RequirementNode::Permission { .. } => node.clone(),

            RequirementNode::Other { .. } => RequirementNode::None,

            RequirementNode::And { children } => {
                let remaining: Vec<RequirementNode> = children
                    .iter()
                    .map(|child| self.simplify(child))
                    .filter(|child| !child.is_none())
                    .collect();
                if remaining.is_empty() {
                    RequirementNode::None
                } else {
                    RequirementNode::And {
                        children: remaining,
                    }
                }
            }

            RequirementNode::Or { children } => {
                let mut simplified = Vec::with_capacity(children.len());
                for child in children {
                    let child = self.simplify(child);
                    if child.is_none() {
                        return RequirementNode::None;
                    }
                    simplified.push(child);
                }
                RequirementNode::Or {
                    children: simplified,
                }
            }

            RequirementNode::CreditsFrom {
                credits_required,
                children,
                credited,
            } => {
                let newly = self.newly_completed(children, credited);
                let earned: f64 = newly.iter().map(|code| self.credits_of(code)).sum();
                if earned >= *credits_required {
                    return RequirementNode::None;
                }
                RequirementNode::CreditsFrom {
                    credits_required: credits_required - earned,
                    children: children.clone(),
                    credited: credited.union(&newly).cloned().collect(),
                }
            }

            RequirementNode::ChooseN {
                n,
                children,
                credited,
            } => {
                let newly = self.newly_completed(children, credited);
                let count = u32::try_from(newly.len()).unwrap_or(u32::MAX);
                if count >= *n {
                    return RequirementNode::None;
                }
                RequirementNode::ChooseN {
                    n: n - count,
                    children: children.clone(),
                    credited: credited.union(&newly).cloned().collect(),
                }
            }
        }
    }

    /// Simplifies a list, dropping entries that became NONE.
    pub fn simplify_all(&self, nodes: &[RequirementNode]) -> Vec<RequirementNode> {
        nodes
            .iter()
            .map(|node| self.simplify(node))
            .filter(|node| !node.is_none())
            .collect()
    }

    /// Whether a tree is fully satisfied by the current state.
    pub fn is_satisfied(&self, node: &RequirementNode) -> bool {
        self.simplify(node).is_none()
    }

    /// Completed courses reachable under `children` that the node has not
    /// yet credited.
    fn newly_completed(
        &self,
        children: &[RequirementNode],
        credited: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let mut newly = BTreeSet::new();
        for child in children {
            child.for_each_course(&mut |code, _| {
                if !credited.contains(code) && self.state.has_completed(code) {
                    newly.insert(code.to_string());
                }
            });
        }
        newly
    }

    fn credits_of(&self, code: &str) -> f64 {
        match self.catalog.get_course(code) {
            Some(course) => course.min_credits,
            None => {
                warn!(course = %code, "completed course not in catalog; contributes no credits");
                0.0
            }
        }
    }
}

fn satisfied_if(satisfied: bool, node: &RequirementNode) -> RequirementNode {
    if satisfied {
        RequirementNode::None
    } else {
        node.clone()
    }
}

/// One-shot form of [`Simplifier::simplify`].
pub fn simplify<C: Catalog + ?Sized>(
    node: &RequirementNode,
    catalog: &C,
    state: &StudentState,
) -> RequirementNode {
    Simplifier::new(catalog, state).simplify(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::models::{Course, Season, StandingLevel};

    fn catalog() -> InMemoryCatalog {
        ["D 1", "E 1", "F 1", "G 1"]
            .into_iter()
            .map(|code| Course::new(code).with_credits(3.0))
            .chain([Course::new("H 1").with_credits(4.0)])
            .collect()
    }

    fn state() -> StudentState {
        StudentState::new(Season::Fall, 2025)
    }

    #[test]
    fn test_course_leaf() {
        let catalog = catalog();
        let state = state().with_completed("D 1");
        let s = Simplifier::new(&catalog, &state);

        assert!(s.simplify(&RequirementNode::course("D 1")).is_none());
        assert_eq!(
            s.simplify(&RequirementNode::course("E 1")),
            RequirementNode::course("E 1")
        );
        // Unknown courses cannot block scheduling.
        assert!(s.simplify(&RequirementNode::course("ZZZ 999")).is_none());
    }

    #[test]
    fn test_scalar_leaves() {
        let catalog = catalog();
        let state = state()
            .with_gpa(3.0)
            .with_level(StandingLevel::Junior)
            .with_placement("math", "2");
        let s = Simplifier::new(&catalog, &state);

        assert!(s.is_satisfied(&RequirementNode::gpa(3.0)));
        assert!(!s.is_satisfied(&RequirementNode::gpa(3.1)));
        assert!(s.is_satisfied(&RequirementNode::level(StandingLevel::Sophomore)));
        assert!(s.is_satisfied(&RequirementNode::level(StandingLevel::Junior)));
        assert!(!s.is_satisfied(&RequirementNode::level(StandingLevel::Senior)));
        assert!(s.is_satisfied(&RequirementNode::placement("Math", "2")));
        assert!(!s.is_satisfied(&RequirementNode::placement("math", "3")));
        assert!(!s.is_satisfied(&RequirementNode::placement("english", "1")));
        assert!(s.is_satisfied(&RequirementNode::other("Audition")));
        assert!(s.is_satisfied(&RequirementNode::None));
    }

    #[test]
    fn test_permission_never_granted() {
        let catalog = catalog();
        let state = state().with_gpa(4.0).with_level(StandingLevel::Senior);
        let node = RequirementNode::permission("Department");
        assert_eq!(simplify(&node, &catalog, &state), node);
    }

    #[test]
    fn test_and_drops_satisfied_children() {
        let catalog = catalog();
        let state = state().with_completed("D 1");
        let node = RequirementNode::and(vec![
            RequirementNode::course("D 1"),
            RequirementNode::course("E 1"),
            RequirementNode::permission("Instructor"),
        ]);
        assert_eq!(
            simplify(&node, &catalog, &state),
            RequirementNode::and(vec![
                RequirementNode::course("E 1"),
                RequirementNode::permission("Instructor"),
            ])
        );
    }

    #[test]
    fn test_or_keeps_every_open_branch() {
        let catalog = catalog();
        let open = RequirementNode::or(vec![
            RequirementNode::course("E 1"),
            RequirementNode::and(vec![RequirementNode::course("F 1"), RequirementNode::gpa(2.0)]),
        ]);

        let fresh = state();
        assert_eq!(
            simplify(&open, &catalog, &fresh),
            RequirementNode::or(vec![
                RequirementNode::course("E 1"),
                RequirementNode::and(vec![
                    RequirementNode::course("F 1"),
                    RequirementNode::gpa(2.0)
                ]),
            ])
        );

        let done = state().with_completed("F 1").with_gpa(2.5);
        assert!(simplify(&open, &catalog, &done).is_none());
    }

    #[test]
    fn test_credits_from_reduces_threshold() {
        let catalog = catalog();
        let state = state().with_completed("D 1");
        let children = vec![
            RequirementNode::course("D 1"),
            RequirementNode::course("E 1"),
            RequirementNode::course("F 1"),
        ];
        let node = RequirementNode::credits_from(6.0, children.clone());

        let once = simplify(&node, &catalog, &state);
        match &once {
            RequirementNode::CreditsFrom {
                credits_required,
                children: kept,
                ..
            } => {
                assert_eq!(*credits_required, 3.0);
                assert_eq!(kept, &children);
            }
            other => panic!("unexpected node {other:?}"),
        }
        assert_eq!(simplify(&once, &catalog, &state), once);

        let more = state.clone().with_completed("E 1");
        assert!(simplify(&once, &catalog, &more).is_none());
    }

    #[test]
    fn test_credits_from_counts_nested_courses() {
        let catalog = catalog();
        let state = state().with_completed("H 1").with_completed("G 1");
        let node = RequirementNode::credits_from(
            7.0,
            vec![
                RequirementNode::or(vec![
                    RequirementNode::course("H 1"),
                    RequirementNode::course("D 1"),
                ]),
                RequirementNode::and(vec![RequirementNode::course("G 1")]),
            ],
        );
        assert!(simplify(&node, &catalog, &state).is_none());
    }

    #[test]
    fn test_choose_n() {
        let catalog = catalog();
        let state = state().with_completed("E 1");
        let node = RequirementNode::choose_n(
            2,
            vec![
                RequirementNode::course("D 1"),
                RequirementNode::course("E 1"),
                RequirementNode::course("E 1"),
                RequirementNode::course("F 1"),
            ],
        );

        let once = simplify(&node, &catalog, &state);
        assert!(matches!(once, RequirementNode::ChooseN { n: 1, .. }));
        assert_eq!(once.children(), node.children());
        assert_eq!(simplify(&once, &catalog, &state), once);

        let both = state.with_completed("F 1");
        assert!(simplify(&node, &catalog, &both).is_none());
        assert!(simplify(&once, &catalog, &both).is_none());
    }

    #[test]
    fn test_simplify_all_drops_satisfied() {
        let catalog = catalog();
        let state = state().with_completed("D 1");
        let out = Simplifier::new(&catalog, &state).simplify_all(&[
            RequirementNode::course("D 1"),
            RequirementNode::course("E 1"),
            RequirementNode::other("x"),
        ]);
        assert_eq!(out, vec![RequirementNode::course("E 1")]);
    }

    #[test]
    fn test_input_tree_untouched() {
        let catalog = catalog();
        let state = state().with_completed("D 1");
        let node = RequirementNode::and(vec![RequirementNode::course("D 1")]);
        let before = node.clone();
        let _ = simplify(&node, &catalog, &state);
        assert_eq!(node, before);
    }
}
