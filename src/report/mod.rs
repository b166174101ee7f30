//! Progress report construction
//!
//! Folds a flat statement stream into a parent/child activity tree, matches
//! the current LMS assignment against it, and derives a gradebook score.

pub mod aggregate;
pub mod grade;
pub mod matcher;

pub use aggregate::{aggregate_statements, Activity, ActivityStatus};
pub use grade::calculate_grade;
pub use matcher::{HeuristicMatcher, MatchStrategy};
