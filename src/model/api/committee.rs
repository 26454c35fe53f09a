use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{common::committee::CommitteeMember, db::committee::Committee, mongodb::Id};

/// A new election committee.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeSpec {
    pub name: String,
    #[serde(default)]
    pub election_ids: HashSet<Id>,
    #[serde(default)]
    pub members: Vec<CommitteeMember>,
}

impl CommitteeSpec {
    /// Reject committees that could not sign anything legibly.
    pub fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Committee name must not be empty".to_string());
        }
        if self.members.iter().any(|member| member.name.trim().is_empty()) {
            return Err("Committee members must have a name".to_string());
        }
        Ok(())
    }
}

impl From<CommitteeSpec> for Committee {
    fn from(spec: CommitteeSpec) -> Self {
        Committee::new(spec.name, spec.election_ids, spec.members)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeDescription {
    pub id: Id,
    pub name: String,
    pub election_ids: HashSet<Id>,
    pub members: Vec<CommitteeMember>,
}

impl From<Committee> for CommitteeDescription {
    fn from(committee: Committee) -> Self {
        Self {
            id: committee.id,
            name: committee.name,
            election_ids: committee.election_ids,
            members: committee.members,
        }
    }
}
