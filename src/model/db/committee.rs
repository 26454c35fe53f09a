use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{common::committee::CommitteeMember, mongodb::Id};

/// The people overseeing one or more elections, who sign their
/// recapitulations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub election_ids: HashSet<Id>,
    /// In signing order.
    #[serde(default)]
    pub members: Vec<CommitteeMember>,
}

impl Committee {
    pub fn new(name: String, election_ids: HashSet<Id>, members: Vec<CommitteeMember>) -> Self {
        Self {
            id: Id::new(),
            name,
            election_ids,
            members,
        }
    }
}
