use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{
    auth::password,
    common::voter::Gender,
    db::voter::{Voter, VoterId},
    mongodb::Id,
};

/// Letters used in generated voter IDs. Easily confused letters are left out.
const ID_LETTERS: &[u8] = b"ABCDEFGHJKMNPQRTUVWXY";

/// Characters used in generated passwords. No `0`/`O` or `1`/`I` lookalikes.
const PASSWORD_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const PASSWORD_LENGTH: usize = 5;

/// Generate a voter ID of the form `XX-NNNNNN`.
pub fn generate_voter_id(rng: &mut impl Rng) -> VoterId {
    let letters: String = (0..2)
        .map(|_| ID_LETTERS[rng.gen_range(0..ID_LETTERS.len())] as char)
        .collect();
    let digits: u32 = rng.gen_range(0..1_000_000);
    format!("{letters}-{digits:06}")
}

/// Generate a short password that survives being read off a printed card.
pub fn generate_password(rng: &mut impl Rng) -> String {
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_CHARS[rng.gen_range(0..PASSWORD_CHARS.len())] as char)
        .collect()
}

/// A new voter, as specified by an admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterSpec {
    /// Generated if absent.
    pub id: Option<VoterId>,
    pub name: String,
    pub category_id: Option<Id>,
    pub gender: Option<Gender>,
    /// Generated if absent.
    pub password: Option<String>,
}

impl VoterSpec {
    /// Hash the password and build the voter, with the given ID unless one
    /// was specified.
    pub fn into_voter(
        self,
        generated_id: VoterId,
        password: &str,
    ) -> Result<Voter, argon2::Error> {
        Ok(Voter {
            id: self.id.unwrap_or(generated_id),
            name: self.name,
            category_id: self.category_id,
            password_hash: password::hash(password)?,
            gender: self.gender,
            has_voted: HashMap::new(),
        })
    }
}

/// A newly created voter, with the only copy of their plaintext password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterCard {
    pub voter_id: VoterId,
    pub name: String,
    pub password: String,
}
