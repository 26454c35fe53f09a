//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Field names are camelCase.
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod committee;
pub mod election;
pub mod results;
pub mod vote;
pub mod voter;

/// A human-readable message, the body of every non-data response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
