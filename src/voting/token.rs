//! Voter tokens: the stand-in for a voter's identity on their ballots.

use std::fmt::{self, Display, Formatter};

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Bytes of the HMAC kept in a token. 128 bits puts the birthday bound far
/// beyond any realistic voter roll.
pub const TOKEN_BYTES: usize = 16;

/// Length of an encoded token: `TOKEN_BYTES` in unpadded base32.
pub const TOKEN_LENGTH: usize = 26;

/// A deterministic, alphanumeric token derived from a voter ID.
///
/// The same voter ID and secret always give the same token, across calls
/// and restarts. Without the secret, a token cannot be linked back to a
/// voter even by enumerating every possible ID.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterToken(String);

impl VoterToken {
    /// Derive the token for `voter_id` under the given secret.
    pub fn derive(secret: &[u8], voter_id: &str) -> Self {
        let mut hmac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        hmac.update(voter_id.as_bytes());
        let digest = hmac.finalize().into_bytes();
        Self(BASE32_NOPAD.encode(&digest[..TOKEN_BYTES]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VoterToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<VoterToken> for Bson {
    fn from(token: VoterToken) -> Self {
        Bson::String(token.0)
    }
}
