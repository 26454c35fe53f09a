use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A candidate standing in exactly one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    /// Foreign key election ID.
    pub election_id: Id,
    pub name: String,
    /// Name of the running mate, for paired tickets.
    pub running_mate: Option<String>,
    /// Position on the ballot paper; positive and unique within the election.
    pub order_number: i32,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub photo_url: Option<String>,
}
