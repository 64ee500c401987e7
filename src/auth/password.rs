//! Credential Service
//! Mission: Salted password hashing and verification with bcrypt

use anyhow::{Context, Result};
use bcrypt::{hash, verify};

/// bcrypt hasher with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password; every call uses a fresh salt
    pub fn hash(&self, password: &str) -> Result<String> {
        hash(password, self.cost).context("Failed to hash password")
    }

    /// Check a plaintext password against a stored hash.
    /// A malformed stored hash is an error, a mismatch is `Ok(false)`.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        verify(password, password_hash).context("Failed to verify password")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hashed = hasher.hash("pw1").unwrap();

        assert_ne!(hashed, "pw1");
        assert!(hasher.verify("pw1", &hashed).unwrap());
        assert!(!hasher.verify("pw2", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(4);
        let first = hasher.hash("same-password").unwrap();
        let second = hasher.hash("same-password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same-password", &second).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let hasher = PasswordHasher::new(4);
        assert!(hasher.verify("pw1", "not-a-bcrypt-hash").is_err());
    }
}
