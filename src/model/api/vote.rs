use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A ballot submission, as sent by the voting UI.
///
/// `voter_id` is only a claim; it must match the caller's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub election_id: Id,
    pub candidate_id: Id,
    pub voter_id: String,
}
