use serde::{Deserialize, Serialize};

/// Raw voter credentials, received from a voter. Never stored.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterCredentials {
    pub voter_id: String,
    pub password: String,
}

/// Raw admin credentials, received from a user. Never stored.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}
