use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// One-way adaptive password hashing (Argon2id).
///
/// Produces PHC-format digests carrying algorithm, parameters and salt, so
/// stored digests stay verifiable across parameter upgrades.
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    /// * `HashingFailed` - the hashing operation itself failed (resource
    ///   exhaustion; there is no caller-recoverable case)
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// A mismatch is `Ok(false)`, never an error; the comparison is done by
    /// the hash library, not by string equality.
    ///
    /// # Errors
    /// * `InvalidDigest` - the stored digest is not a parseable PHC string
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| PasswordError::InvalidDigest(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();

        let digest = hasher.hash("my_secure_password").unwrap();
        assert!(digest.starts_with("$argon2"));

        assert!(hasher.verify("my_secure_password", &digest).unwrap());
        assert!(!hasher.verify("wrong_password", &digest).unwrap());
    }

    #[test]
    fn test_same_password_different_digests() {
        let hasher = PasswordHasher::new();

        let first = hasher.hash("password").unwrap();
        let second = hasher.hash("password").unwrap();

        // Fresh salt per hash.
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_invalid_digest() {
        let hasher = PasswordHasher::new();
        assert!(matches!(
            hasher.verify("password", "not_a_digest"),
            Err(PasswordError::InvalidDigest(_))
        ));
    }
}
