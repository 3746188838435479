//! Degree-planning domain models.
//!
//! Provides the data types a planning run consumes and produces. Inputs
//! (`Course`, `Program`, `StudentState`) are immutable for the duration of a
//! run; `Schedule` is derived.
//!
//! # Domain Mappings
//!
//! | u-courseplan | Scheduling analogue |
//! |--------------|---------------------|
//! | Course | Activity |
//! | RequirementNode (COURSE leaf) | Precedence constraint |
//! | OfferingPattern | Resource calendar |
//! | Term | Time bucket |
//! | Schedule | Assignment list |

mod course;
mod program;
mod requirement;
mod schedule;
mod student;
mod term;

pub use course::{normalize_code, Course, OfferingPattern};
pub use program::Program;
pub use requirement::{
    course_codes_in, normalize_subject, PlacementLevel, RequirementKind, RequirementNode,
    StandingLevel, Timing,
};
pub use schedule::{PlanWarning, Schedule, ScheduledTerm, WarningKind};
pub use student::{Enrollment, StudentState};
pub use term::{Season, Term};
