//! Sessions and credentials.

pub mod password;
mod token;
mod user;

pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
pub use user::{Rights, User};
