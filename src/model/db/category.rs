use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A group of voters, and the elections its members may vote in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub allowed_elections: HashSet<Id>,
}

impl Category {
    pub fn new(name: String, allowed_elections: HashSet<Id>) -> Self {
        Self {
            id: Id::new(),
            name,
            allowed_elections,
        }
    }

    /// May members of this category vote in the given election?
    pub fn allows(&self, election_id: Id) -> bool {
        self.allowed_elections.contains(&election_id)
    }
}
