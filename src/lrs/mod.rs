//! Learning Record Store access
//!
//! Queries an xAPI LRS for a learner's statements and parses them into the
//! crate's [`Statement`] type.

pub mod client;
pub mod statement;

pub use client::LrsClient;
pub use statement::{object_name, parent_activity_id, verb_name, Statement};
