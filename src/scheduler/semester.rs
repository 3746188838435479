//! Term-aware semester scheduler.
//!
//! # Algorithm
//!
//! 1. Drop completed courses; fail if any remaining course is deactivated.
//! 2. In-degree = number of strict prerequisites left; in-degree 0 courses
//!    are *available*.
//! 3. For each term from the student's first term:
//!    - keep available courses whose offering pattern allows the term, in
//!      code order;
//!    - under [`ConcurrencyPolicy::SameTerm`] graphs, drop courses whose
//!      concurrent partners are neither scheduled nor placed this term;
//!    - under [`CreditPolicy::Capped`], take courses while the term stays
//!      within the cap, withdrawing any course the cut separates from a
//!      concurrent partner and refilling;
//!    - place the selection, then release dependents whose in-degree hits 0.
//! 4. Advance fall → spring (next year) or spring → fall (same year).
//!
//! Terms that place nothing are skipped. Running out of available courses,
//! or `max_idle_terms` consecutive empty terms, is a scheduling deadlock.
//!
//! # Complexity
//! O(T · n log n) where T = planned terms, n = required courses.
//!
//! [`ConcurrencyPolicy::SameTerm`]: crate::config::ConcurrencyPolicy::SameTerm

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::{CreditPolicy, PlannerConfig};
use crate::error::{PlanError, Result};
use crate::graph::DependencyGraph;
use crate::models::{
    OfferingPattern, PlanWarning, Schedule, ScheduledTerm, StudentState, Term,
};

/// Schedule plus the warnings raised while building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleOutput {
    pub schedule: Schedule,
    pub warnings: Vec<PlanWarning>,
}

/// Places required courses into fall and spring terms.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use u_courseplan::catalog::InMemoryCatalog;
/// use u_courseplan::config::ConcurrencyPolicy;
/// use u_courseplan::graph::DependencyGraph;
/// use u_courseplan::models::{Course, Season, StudentState, Term};
/// use u_courseplan::scheduler::SemesterScheduler;
///
/// let catalog = InMemoryCatalog::new()
///     .with_course(Course::new("A 1").with_pattern("fall"))
///     .with_course(Course::new("B 1").with_pattern("spring").with_prerequisite("A 1"));
/// let required: BTreeSet<String> = ["A 1", "B 1"].iter().map(|c| c.to_string()).collect();
/// let graph = DependencyGraph::build(&catalog, &required, ConcurrencyPolicy::Conservative);
/// let state = StudentState::new(Season::Fall, 2025);
///
/// let output = SemesterScheduler::new(&catalog).schedule(&graph, &state).unwrap();
/// assert_eq!(output.schedule.term_of("B 1"), Some(Term::spring(2026)));
/// ```
#[derive(Debug)]
pub struct SemesterScheduler<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    credit_policy: CreditPolicy,
    max_idle_terms: usize,
}

impl<'a, C: Catalog + ?Sized> SemesterScheduler<'a, C> {
    /// Creates a scheduler with default policies.
    pub fn new(catalog: &'a C) -> Self {
        let defaults = PlannerConfig::default();
        Self {
            catalog,
            credit_policy: defaults.credit_policy,
            max_idle_terms: defaults.max_idle_terms,
        }
    }

    /// Takes the scheduling policies from a planner configuration.
    pub fn with_config(mut self, config: &PlannerConfig) -> Self {
        self.credit_policy = config.credit_policy;
        self.max_idle_terms = config.max_idle_terms;
        self
    }

    /// Sets the credit-cap policy.
    pub fn with_credit_policy(mut self, policy: CreditPolicy) -> Self {
        self.credit_policy = policy;
        self
    }

    /// Sets how many consecutive empty terms are tolerated.
    pub fn with_max_idle_terms(mut self, terms: usize) -> Self {
        self.max_idle_terms = terms;
        self
    }

    /// Schedules every uncompleted course of the graph.
    ///
    /// # Errors
    /// - [`PlanError::DeactivatedCourseRequired`] if a remaining course is deactivated
    /// - [`PlanError::SchedulingDeadlock`] if courses remain that no reachable term can take
    pub fn schedule(&self, graph: &DependencyGraph, state: &StudentState) -> Result<ScheduleOutput> {
        let mut remaining: BTreeSet<String> = graph
            .nodes()
            .filter(|code| !state.has_completed(code))
            .map(str::to_string)
            .collect();
        check_deactivated(self.catalog, remaining.iter().map(String::as_str))?;

        let graph = graph.subgraph(&remaining);
        let mut in_degree: BTreeMap<String, usize> = graph
            .in_degrees()
            .into_iter()
            .map(|(code, degree)| (code.to_string(), degree))
            .collect();
        let mut available: BTreeSet<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(code, _)| code.clone())
            .collect();

        let cap = f64::from(state.credits_per_semester);
        let mut output = ScheduleOutput::default();
        let mut scheduled: BTreeSet<String> = BTreeSet::new();
        let mut term = state.first_term();
        let mut idle = 0;

        while !remaining.is_empty() {
            if available.is_empty() {
                return Err(deadlock(term, &remaining));
            }

            let offered: Vec<&str> = available
                .iter()
                .map(String::as_str)
                .filter(|code| self.pattern_of(code).allows(term))
                .collect();
            let mut selection = concurrency_filter(&graph, &scheduled, offered);
            if self.credit_policy == CreditPolicy::Capped {
                selection = self.fill_capped(&graph, &scheduled, selection, cap);
                if let [code] = selection.as_slice() {
                    let credits = self.credits_of(code);
                    if credits > cap {
                        warn!(course = %code, credits, cap, %term, "course exceeds credit cap; placed alone");
                        output.warnings.push(PlanWarning::credit_cap_exceeded(
                            *code,
                            format!("{code} carries {credits} credits, above the {cap}-credit cap; placed alone in {term}"),
                        ));
                    }
                }
            }

            if selection.is_empty() {
                idle += 1;
                debug!(%term, idle, "no course can be placed");
                if idle >= self.max_idle_terms {
                    return Err(deadlock(term, &remaining));
                }
                term = term.next();
                continue;
            }
            idle = 0;

            let courses: Vec<String> = selection.iter().map(|c| c.to_string()).collect();
            let total_credits: f64 = courses.iter().map(|c| self.credits_of(c)).sum();
            debug!(%term, courses = ?courses, total_credits, "term scheduled");
            if total_credits > cap {
                warn!(%term, total_credits, cap, "term exceeds credit cap");
            }

            for code in &courses {
                available.remove(code);
                remaining.remove(code);
                scheduled.insert(code.clone());
                for dependent in graph.dependents(code) {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            available.insert(dependent.to_string());
                        }
                    }
                }
            }
            output
                .schedule
                .add_term(ScheduledTerm::new(term, courses, total_credits));
            term = term.next();
        }

        info!(
            terms = output.schedule.term_count(),
            courses = output.schedule.course_count(),
            "schedule complete"
        );
        Ok(output)
    }

    /// Cuts `candidates` to the cap without splitting concurrent partners.
    ///
    /// Courses the cut strands from a partner are withdrawn and the fill is
    /// repeated over what is left, until every course taken keeps its
    /// partners.
    fn fill_capped<'s>(
        &self,
        graph: &DependencyGraph,
        scheduled: &BTreeSet<String>,
        mut candidates: Vec<&'s str>,
        cap: f64,
    ) -> Vec<&'s str> {
        loop {
            let taken = self.apply_cap(&candidates, cap);
            let kept = concurrency_filter(graph, scheduled, taken.clone());
            if kept.len() == taken.len() {
                return kept;
            }
            let stranded: BTreeSet<&str> = taken
                .into_iter()
                .filter(|code| !kept.contains(code))
                .collect();
            candidates.retain(|code| !stranded.contains(code));
            candidates = concurrency_filter(graph, scheduled, candidates);
        }
    }

    /// Takes courses in code order while the term total stays within `cap`.
    ///
    /// A course larger than the cap is placed alone, and only when nothing
    /// else has been taken this term.
    fn apply_cap<'s>(&self, candidates: &[&'s str], cap: f64) -> Vec<&'s str> {
        let mut taken = Vec::new();
        let mut total = 0.0;
        for &code in candidates {
            let credits = self.credits_of(code);
            if credits > cap {
                if taken.is_empty() {
                    return vec![code];
                }
                continue;
            }
            if total + credits <= cap {
                total += credits;
                taken.push(code);
            }
        }
        taken
    }

    fn pattern_of(&self, code: &str) -> OfferingPattern {
        self.catalog
            .get_course(code)
            .map(|course| course.offering_pattern.clone())
            .unwrap_or(OfferingPattern::FallAndSpring)
    }

    fn credits_of(&self, code: &str) -> f64 {
        self.catalog
            .get_course(code)
            .map_or(0.0, |course| course.min_credits)
    }
}

/// Drops courses whose concurrent partners are neither already scheduled nor
/// in the selection, until the selection is stable.
fn concurrency_filter<'s>(
    graph: &DependencyGraph,
    scheduled: &BTreeSet<String>,
    mut selection: Vec<&'s str>,
) -> Vec<&'s str> {
    loop {
        let before = selection.len();
        let current: BTreeSet<&str> = selection.iter().copied().collect();
        selection.retain(|code| {
            graph
                .concurrent_with(code)
                .all(|partner| scheduled.contains(partner) || current.contains(partner))
        });
        if selection.len() == before {
            return selection;
        }
    }
}

/// Fails if any of `codes` is a deactivated catalog course.
pub fn check_deactivated<'c, C: Catalog + ?Sized>(
    catalog: &C,
    codes: impl IntoIterator<Item = &'c str>,
) -> Result<()> {
    let deactivated: Vec<String> = codes
        .into_iter()
        .filter(|code| {
            catalog
                .get_course(code)
                .is_some_and(|course| course.offering_pattern == OfferingPattern::Deactivated)
        })
        .map(str::to_string)
        .collect();
    if deactivated.is_empty() {
        Ok(())
    } else {
        Err(PlanError::DeactivatedCourseRequired {
            courses: deactivated,
        })
    }
}

fn deadlock(term: Term, remaining: &BTreeSet<String>) -> PlanError {
    PlanError::SchedulingDeadlock {
        term,
        remaining: remaining.iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::config::ConcurrencyPolicy;
    use crate::models::{Course, RequirementNode, Season, Timing, WarningKind};

    fn required(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn run(
        catalog: &InMemoryCatalog,
        codes: &[&str],
        state: &StudentState,
    ) -> Result<ScheduleOutput> {
        let graph = DependencyGraph::build(catalog, &required(codes), ConcurrencyPolicy::Conservative);
        SemesterScheduler::new(catalog).schedule(&graph, state)
    }

    #[test]
    fn test_fall_then_spring() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("A").with_pattern("fall"))
            .with_course(Course::new("B").with_pattern("spring").with_prerequisite("A"));
        let out = run(&catalog, &["A", "B"], &StudentState::new(Season::Fall, 2025)).unwrap();

        let terms = &out.schedule.terms;
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].term, Term::fall(2025));
        assert_eq!(terms[0].courses, vec!["A"]);
        assert_eq!(terms[1].term, Term::spring(2026));
        assert_eq!(terms[1].courses, vec!["B"]);
        assert_eq!(terms[1].total_credits, 3.0);
    }

    #[test]
    fn test_waits_for_offering() {
        let catalog = InMemoryCatalog::new().with_course(Course::new("A").with_pattern("fall"));
        let out = run(&catalog, &["A"], &StudentState::new(Season::Spring, 2026)).unwrap();
        assert_eq!(out.schedule.term_of("A"), Some(Term::fall(2026)));
        assert_eq!(out.schedule.term_count(), 1);
    }

    #[test]
    fn test_parity_patterns() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("E").with_pattern("fall_even"))
            .with_course(Course::new("O").with_pattern("spring_odd"));
        let out = run(&catalog, &["E", "O"], &StudentState::new(Season::Fall, 2025)).unwrap();
        assert_eq!(out.schedule.term_of("E"), Some(Term::fall(2026)));
        assert_eq!(out.schedule.term_of("O"), Some(Term::spring(2027)));
    }

    #[test]
    fn test_completed_courses_removed() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("A"))
            .with_course(Course::new("B").with_prerequisite("A"));
        let state = StudentState::new(Season::Fall, 2025).with_completed("A");
        let out = run(&catalog, &["A", "B"], &state).unwrap();
        assert_eq!(out.schedule.term_of("A"), None);
        assert_eq!(out.schedule.term_of("B"), Some(Term::fall(2025)));
    }

    #[test]
    fn test_deactivated_is_fatal() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("A"))
            .with_course(Course::new("C").with_pattern("deactivated"));
        let err = run(&catalog, &["A", "C"], &StudentState::new(Season::Fall, 2025)).unwrap_err();
        match err {
            PlanError::DeactivatedCourseRequired { courses } => assert_eq!(courses, vec!["C"]),
            other => panic!("unexpected error: {other}"),
        }

        let done = StudentState::new(Season::Fall, 2025).with_completed("C");
        assert!(run(&catalog, &["A", "C"], &done).is_ok());
    }

    #[test]
    fn test_summer_only_deadlocks() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("A"))
            .with_course(Course::new("S").with_pattern("summer"));
        let err = run(&catalog, &["A", "S"], &StudentState::new(Season::Fall, 2025)).unwrap_err();
        match err {
            PlanError::SchedulingDeadlock { remaining, .. } => assert_eq!(remaining, vec!["S"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_deadlocks_without_check() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("A").with_prerequisite("B"))
            .with_course(Course::new("B").with_prerequisite("A"));
        let err = run(&catalog, &["A", "B"], &StudentState::new(Season::Fall, 2025)).unwrap_err();
        match err {
            PlanError::SchedulingDeadlock { term, remaining } => {
                assert_eq!(term, Term::fall(2025));
                assert_eq!(remaining, vec!["A", "B"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_uncapped_places_everything_available() {
        let catalog: InMemoryCatalog = (0..8).map(|i| Course::new(format!("G {i}"))).collect();
        let codes: Vec<String> = (0..8).map(|i| format!("G {i}")).collect();
        let refs: Vec<&str> = codes.iter().map(String::as_str).collect();
        let state = StudentState::new(Season::Fall, 2025).with_credit_cap(12);
        let out = run(&catalog, &refs, &state).unwrap();
        assert_eq!(out.schedule.term_count(), 1);
        assert_eq!(out.schedule.terms[0].total_credits, 24.0);
    }

    #[test]
    fn test_capped_spreads_load() {
        let catalog: InMemoryCatalog = (0..8).map(|i| Course::new(format!("G {i}"))).collect();
        let graph = DependencyGraph::build(
            &catalog,
            &(0..8).map(|i| format!("G {i}")).collect(),
            ConcurrencyPolicy::Conservative,
        );
        let state = StudentState::new(Season::Fall, 2025).with_credit_cap(12);
        let out = SemesterScheduler::new(&catalog)
            .with_credit_policy(CreditPolicy::Capped)
            .schedule(&graph, &state)
            .unwrap();
        assert_eq!(out.schedule.term_count(), 2);
        assert_eq!(out.schedule.terms[0].courses, vec!["G 0", "G 1", "G 2", "G 3"]);
        assert!(out.schedule.max_term_credits() <= 12.0);
    }

    #[test]
    fn test_oversized_course_placed_alone() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("A"))
            .with_course(Course::new("BIG").with_credits(16.0));
        let graph =
            DependencyGraph::build(&catalog, &required(&["A", "BIG"]), ConcurrencyPolicy::Conservative);
        let state = StudentState::new(Season::Fall, 2025).with_credit_cap(12);
        let out = SemesterScheduler::new(&catalog)
            .with_credit_policy(CreditPolicy::Capped)
            .schedule(&graph, &state)
            .unwrap();

        assert_eq!(out.schedule.terms[0].courses, vec!["A"]);
        assert_eq!(out.schedule.terms[1].courses, vec!["BIG"]);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::CreditCapExceeded);
    }

    #[test]
    fn test_same_term_concurrency() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("LEC").with_pattern("spring"))
            .with_course(Course::new("LAB").with_requisite(RequirementNode::course_with_timing(
                "LEC",
                Timing::Concurrent,
            )));
        let codes = required(&["LAB", "LEC"]);
        let state = StudentState::new(Season::Fall, 2025);

        let graph = DependencyGraph::build(&catalog, &codes, ConcurrencyPolicy::SameTerm);
        let out = SemesterScheduler::new(&catalog).schedule(&graph, &state).unwrap();
        // LAB waits for its lecture partner, then both go together.
        assert_eq!(out.schedule.term_of("LAB"), Some(Term::spring(2026)));
        assert_eq!(out.schedule.term_of("LEC"), Some(Term::spring(2026)));

        let graph = DependencyGraph::build(&catalog, &codes, ConcurrencyPolicy::Conservative);
        let out = SemesterScheduler::new(&catalog).schedule(&graph, &state).unwrap();
        assert_eq!(out.schedule.term_of("LAB"), Some(Term::fall(2026)));
    }

    #[test]
    fn test_capped_keeps_concurrent_partners_together() {
        let catalog = InMemoryCatalog::new()
            .with_course(Course::new("LEC").with_credits(4.0))
            .with_course(
                Course::new("LAB")
                    .with_credits(1.0)
                    .with_requisite(RequirementNode::course_with_timing("LEC", Timing::Concurrent)),
            );
        let graph =
            DependencyGraph::build(&catalog, &required(&["LAB", "LEC"]), ConcurrencyPolicy::SameTerm);
        let state = StudentState::new(Season::Fall, 2025).with_credit_cap(4);
        let out = SemesterScheduler::new(&catalog)
            .with_credit_policy(CreditPolicy::Capped)
            .schedule(&graph, &state)
            .unwrap();

        assert_eq!(out.schedule.term_of("LEC"), Some(Term::fall(2025)));
        assert_eq!(out.schedule.term_of("LAB"), Some(Term::spring(2026)));
        assert!(out.schedule.max_term_credits() <= 4.0);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_idle_limit() {
        let catalog = InMemoryCatalog::new().with_course(Course::new("E").with_pattern("fall_even"));
        let graph = DependencyGraph::build(&catalog, &required(&["E"]), ConcurrencyPolicy::Conservative);
        let state = StudentState::new(Season::Fall, 2025);

        // Fall 2025 and Spring 2026 are empty; Fall 2026 works.
        assert!(SemesterScheduler::new(&catalog)
            .with_max_idle_terms(3)
            .schedule(&graph, &state)
            .is_ok());
        assert!(matches!(
            SemesterScheduler::new(&catalog)
                .with_max_idle_terms(2)
                .schedule(&graph, &state),
            Err(PlanError::SchedulingDeadlock { .. })
        ));
    }
}
