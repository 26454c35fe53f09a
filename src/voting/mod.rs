//! The vote-casting and tallying core.
//!
//! Everything that decides whether a ballot may be written, writes it, or
//! counts ballots lives here. The HTTP layer in [`crate::api`] only
//! authenticates callers and translates results.

pub mod casting;
pub mod eligibility;
pub mod maintenance;
pub mod store;
pub mod tally;
pub mod token;

#[cfg(test)]
pub(crate) mod memory;
