//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings, datetimes in MongoDB's own format.
//! - Field names are snake_case, matching the index definitions.

pub mod admin;
pub mod ballot;
pub mod candidate;
pub mod category;
pub mod committee;
pub mod election;
pub mod voter;
