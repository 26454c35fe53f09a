//! Types shared between the database and API representations.

pub mod committee;
pub mod election;
pub mod voter;
