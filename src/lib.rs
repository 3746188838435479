//! Degree-plan engine.
//!
//! Given a program's requirement structure, a course catalog, and a
//! student's academic state, works out which courses must be taken and
//! places them into fall and spring terms that respect prerequisite order,
//! offering patterns, and (optionally) a per-term credit cap.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Course`, `Program`, `StudentState`,
//!   `RequirementNode`, `Term`, `Schedule`
//! - **`parser`**: Untyped JSON → validated requirement trees, courses, programs
//! - **`validation`**: Input integrity checks (duplicate codes, credit ranges, empty composites)
//! - **`catalog`**: Read-only course lookup
//! - **`simplify`**: Requirement reduction against a student state
//! - **`expand`**: Fixed-point required-course expansion
//! - **`graph`**: Prerequisite graph, cycle detection, longest chain
//! - **`scheduler`**: Term-by-term scheduling and the tag tally
//! - **`planner`**: The end-to-end pipeline
//! - **`config`**: Planner options
//!
//! # Example
//!
//! ```
//! use u_courseplan::{InMemoryCatalog, Planner};
//! use u_courseplan::models::{Course, Program, Season, StudentState};
//!
//! let catalog = InMemoryCatalog::new()
//!     .with_course(Course::new("MATH 1050"))
//!     .with_course(Course::new("MATH 1210").with_prerequisite("MATH 1050"));
//! let program = Program::new("BS").with_course("MATH 1210");
//! let state = StudentState::new(Season::Fall, 2025);
//!
//! let plan = Planner::new(&catalog).plan(&program, &state).unwrap();
//! assert_eq!(plan.schedule.term_count(), 2);
//! ```
//!
//! # Logging
//!
//! Events are emitted through `tracing`; the library never installs a
//! subscriber.

pub mod catalog;
pub mod config;
pub mod error;
pub mod expand;
pub mod graph;
pub mod models;
pub mod parser;
pub mod planner;
pub mod scheduler;
pub mod simplify;
pub mod validation;

pub use catalog::{Catalog, InMemoryCatalog};
pub use config::{ConcurrencyPolicy, CreditPolicy, PlannerConfig};
pub use error::{PlanError, Result};
pub use planner::{Plan, Planner};
