use crate::error::{AccountError, Result};
use argon2::password_hash::{self, rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};

/// Argon2id password hashing
///
/// Each call salts independently, so two hashes of one password differ and
/// both verify. Stored values are PHC strings (`$argon2id$v=19$...`).
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Argon2id v1.3 with the crate defaults: 19 MiB, t=2, p=1
    pub fn new() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| {
                tracing::error!(error = %e, "password hashing failed");
                AccountError::Hashing(e.to_string())
            })
    }

    /// `Ok(false)` on mismatch; a stored value that is not a PHC string is an
    /// error, not a mismatch.
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool> {
        let stored = PasswordHash::new(stored)
            .map_err(|e| AccountError::Hashing(format!("stored value is not a PHC string: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AccountError::Hashing(e.to_string())),
        }
    }
}
