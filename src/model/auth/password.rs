//! Salted one-way password hashing, shared by admins and voters.

use argon2::{Config, Error as Argon2Error};
use rand::Rng;

/// Hash a password with a fresh random salt.
pub fn hash<T: AsRef<[u8]>>(password: T) -> Result<String, Argon2Error> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(password.as_ref(), &salt, &Config::default())
}

/// Check a password against an encoded hash. Malformed hashes never match.
pub fn verify<T: AsRef<[u8]>>(encoded: &str, password: T) -> bool {
    argon2::verify_encoded(encoded, password.as_ref()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted() {
        let first = hash("hunter22").unwrap();
        let second = hash("hunter22").unwrap();
        assert_ne!(first, second);
        assert!(verify(&first, "hunter22"));
        assert!(verify(&second, "hunter22"));
    }

    #[test]
    fn wrong_or_malformed_never_verifies() {
        let encoded = hash("hunter22").unwrap();
        assert!(!verify(&encoded, "hunter23"));
        assert!(!verify("hunter22", "hunter22"));
    }
}
