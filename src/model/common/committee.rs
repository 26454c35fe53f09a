use serde::{Deserialize, Serialize};

/// A position on an election committee.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitteeRole {
    Chair,
    Member,
}

/// One person who signs an election's recapitulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub name: String,
    pub role: CommitteeRole,
}

impl CommitteeMember {
    pub fn new(name: impl Into<String>, role: CommitteeRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}
