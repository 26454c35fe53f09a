use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{auth::password, common::voter::Gender, mongodb::Id};

/// A voter's identifier, either assigned by an admin or generated in the
/// form `XX-NNNNNN`.
pub type VoterId = String;

/// A voter, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    pub name: String,
    /// Voters without a category are eligible for nothing.
    pub category_id: Option<Id>,
    /// Salted argon2 hash; the plaintext is never stored.
    pub password_hash: String,
    pub gender: Option<Gender>,
    /// Denormalised "has voted" flags, keyed by election ID.
    ///
    /// Only a cache of ballot existence: written solely by vote casting and
    /// reconciliation, and never consulted to decide whether a vote is allowed.
    #[serde(default)]
    pub has_voted: HashMap<Id, bool>,
}

impl Voter {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, candidate: T) -> bool {
        password::verify(&self.password_hash, candidate)
    }

    /// Has this voter's flag been set for the given election?
    pub fn has_voted_in(&self, election_id: Id) -> bool {
        self.has_voted.get(&election_id).copied().unwrap_or(false)
    }
}
