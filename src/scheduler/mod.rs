//! Semester scheduling and tag reporting.
//!
//! Places the required courses into fall and spring terms, honouring
//! prerequisite order, offering patterns, and (optionally) the per-term
//! credit cap. A separate tally reports foundational-bucket progress.
//!
//! # Algorithm
//!
//! `SemesterScheduler` layers the prerequisite graph topologically (Kahn),
//! filtering each layer by the offering pattern of the current term. It
//! produces one deterministic plan, scheduling every course as early as
//! its prerequisites and pattern allow; it does not search for a shorter
//! or better-balanced plan.
//!
//! # Tally
//!
//! `TagTally` sums the credit hours of course tags into buckets such as
//! `FWS` or `FQR`.
//!
//! # References
//!
//! - Kahn (1962), "Topological sorting of large networks"

mod semester;
mod tally;

pub use semester::{check_deactivated, ScheduleOutput, SemesterScheduler};
pub use tally::{bucket_code, TagBucket, TagTally};
