use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    auth::password,
    mongodb::{Coll, Id},
};

/// An admin user, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    pub username: String,
    pub password_hash: String,
}

impl Admin {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, candidate: T) -> bool {
        password::verify(&self.password_hash, candidate)
    }
}

/// Insert the configured bootstrap admin if there are no admins at all.
pub async fn ensure_admin_exists(admins: &Coll<Admin>, config: &Config) -> Result<()> {
    if admins.count_documents(None, None).await? > 0 {
        return Ok(());
    }

    let password_hash = password::hash(config.initial_admin_password())?;
    let admin = Admin {
        id: Id::new(),
        username: config.initial_admin_username().to_string(),
        password_hash,
    };
    admins.insert_one(&admin, None).await?;
    warn!(
        "No admins found; created bootstrap admin '{}'. Change its password!",
        admin.username
    );
    Ok(())
}
