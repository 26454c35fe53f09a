use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;
use crate::voting::token::VoterToken;

/// A cast ballot. Immutable once inserted.
///
/// Holds the voter's token rather than their ID, so the ballot cannot be
/// joined back to the voter roll without the token secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "_id")]
    pub id: Id,
    /// Foreign key election ID.
    pub election_id: Id,
    /// Foreign key candidate ID.
    pub candidate_id: Id,
    /// Unique within the election.
    pub voter_token: VoterToken,
    pub cast_at_epoch_millis: i64,
}

impl Ballot {
    /// Create a new ballot, not yet inserted.
    pub fn new(
        election_id: Id,
        candidate_id: Id,
        voter_token: VoterToken,
        cast_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Id::new(),
            election_id,
            candidate_id,
            voter_token,
            cast_at_epoch_millis: cast_at.timestamp_millis(),
        }
    }
}
