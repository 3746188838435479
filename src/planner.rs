//! End-to-end degree planning.
//!
//! [`Planner::plan`] runs the whole pipeline for one student:
//!
//! 1. validate the student state and program
//! 2. expand the program into a required-course set
//! 3. reject deactivated required courses
//! 4. build the dependency graph over courses still to take and reject cycles
//! 5. schedule terms
//! 6. tally foundational buckets and simplify open choices for reporting
//!
//! A planner holds only a shared catalog reference and its configuration,
//! so independent runs for different students can share one catalog.

use serde::Serialize;
use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::PlannerConfig;
use crate::error::{PlanError, Result};
use crate::expand::Expander;
use crate::graph::DependencyGraph;
use crate::models::{PlanWarning, Program, RequirementNode, Schedule, StudentState};
use crate::scheduler::{check_deactivated, SemesterScheduler, TagTally};
use crate::simplify::Simplifier;
use crate::validation::{validate_program, validate_state};

/// Output of a planning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    /// Every course the program may need, completed ones included.
    pub required: BTreeSet<String>,
    /// Top-level choice requirements still open for the student.
    pub outstanding_choices: Vec<RequirementNode>,
    /// The semester plan.
    pub schedule: Schedule,
    /// Longest prerequisite chain among courses still to take.
    pub longest_chain: Vec<String>,
    /// Foundational-bucket progress over required and completed courses.
    pub tally: TagTally,
    /// Recovered data-quality problems.
    pub warnings: Vec<PlanWarning>,
}

impl Plan {
    /// Courses the plan actually schedules.
    pub fn scheduled_courses(&self) -> impl Iterator<Item = &str> {
        self.schedule.courses()
    }
}

/// Plans semesters for students against one catalog.
///
/// # Example
///
/// ```
/// use u_courseplan::catalog::InMemoryCatalog;
/// use u_courseplan::models::{Course, Program, Season, StudentState, Term};
/// use u_courseplan::planner::Planner;
///
/// let catalog = InMemoryCatalog::new()
///     .with_course(Course::new("CS 1400").with_pattern("fall"))
///     .with_course(Course::new("CS 1410").with_pattern("spring").with_prerequisite("CS 1400"));
/// let program = Program::new("BS7241").with_course("CS 1410");
/// let state = StudentState::new(Season::Fall, 2025);
///
/// let plan = Planner::new(&catalog).plan(&program, &state).unwrap();
/// assert_eq!(plan.schedule.term_of("CS 1400"), Some(Term::fall(2025)));
/// assert_eq!(plan.schedule.term_of("CS 1410"), Some(Term::spring(2026)));
/// ```
#[derive(Debug)]
pub struct Planner<'c, C: Catalog + ?Sized> {
    catalog: &'c C,
    config: PlannerConfig,
}

impl<'c, C: Catalog + ?Sized> Planner<'c, C> {
    /// Creates a planner with the default configuration.
    pub fn new(catalog: &'c C) -> Self {
        Self {
            catalog,
            config: PlannerConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans one student's remaining semesters.
    ///
    /// # Errors
    /// - [`PlanError::InvalidInput`] for an invalid state or program
    /// - [`PlanError::ExpansionLimitExceeded`] if expansion does not settle
    /// - [`PlanError::DeactivatedCourseRequired`] if a required course is deactivated
    /// - [`PlanError::CycleDetected`] if required courses require each other
    /// - [`PlanError::SchedulingDeadlock`] if a course can never be placed
    pub fn plan(&self, program: &Program, state: &StudentState) -> Result<Plan> {
        validate_state(state).map_err(PlanError::InvalidInput)?;
        validate_program(program).map_err(PlanError::InvalidInput)?;

        info!(
            program = %program.code,
            enrollment = state.enrollment().as_str(),
            credits_per_semester = state.credits_per_semester,
            first_term = %state.first_term(),
            "planning run started"
        );

        let expansion = Expander::new(self.catalog, state)
            .with_max_rounds(self.config.max_expansion_rounds)
            .expand(&program.root_requisite)?;
        let required = expansion.required;
        let remaining: BTreeSet<String> = required
            .iter()
            .filter(|code| !state.has_completed(code))
            .cloned()
            .collect();

        check_deactivated(self.catalog, remaining.iter().map(String::as_str))?;

        let graph = DependencyGraph::build(self.catalog, &remaining, self.config.concurrency);
        graph.ensure_acyclic()?;

        let mut warnings = expansion.warnings;
        warnings.extend(self.unmapped_patterns(&remaining));

        let scheduled = SemesterScheduler::new(self.catalog)
            .with_config(&self.config)
            .schedule(&graph, state)?;
        warnings.extend(scheduled.warnings);

        let outstanding_choices =
            Simplifier::new(self.catalog, state).simplify_all(&expansion.choices);
        let longest_chain = graph.longest_chain();
        let tally = TagTally::calculate(
            self.catalog,
            required
                .iter()
                .chain(state.completed_courses.iter())
                .map(String::as_str),
            &self.config.tag_requirements,
        );

        info!(
            program = %program.code,
            required = required.len(),
            terms = scheduled.schedule.term_count(),
            longest_chain = longest_chain.len(),
            open_choices = outstanding_choices.len(),
            warnings = warnings.len(),
            "planning run finished"
        );

        Ok(Plan {
            required,
            outstanding_choices,
            schedule: scheduled.schedule,
            longest_chain,
            tally,
            warnings,
        })
    }

    fn unmapped_patterns(&self, codes: &BTreeSet<String>) -> Vec<PlanWarning> {
        codes
            .iter()
            .filter_map(|code| {
                let course = self.catalog.get_course(code)?;
                if !course.offering_pattern.is_unmapped() {
                    return None;
                }
                let raw = course.offering_pattern.as_str();
                warn!(course = %code, pattern = raw, "unmapped offering pattern; assuming every term");
                let message = if raw.is_empty() {
                    format!("{code} has no offering pattern; assumed offered every term")
                } else {
                    format!("{code} has unknown offering pattern '{raw}'; assumed offered every term")
                };
                Some(PlanWarning::unmapped_pattern(code.as_str(), message))
            })
            .collect()
    }
}
