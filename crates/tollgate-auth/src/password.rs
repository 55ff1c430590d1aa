//! Password hashing with Argon2id

use argon2::password_hash::{Error as PasswordHashError, SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hasher bound to one set of Argon2id parameters.
///
/// Verification always uses the parameters embedded in the stored hash,
/// so hashes written under older settings keep working; `needs_rehash`
/// reports them so they can be upgraded after a successful login.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Create a hasher with the given cost parameters
    pub fn new(params: PasswordParams) -> Result<Self, AuthError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| AuthError::PasswordHash(format!("invalid parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        // Hash of a value nobody knows, verified in place of a real hash
        // when the account does not exist.
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(salt.as_str().as_bytes(), &salt)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
            .to_string();

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password with a fresh random salt, returning a PHC string
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Check a plaintext password against a stored PHC hash
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        verify_with(&self.argon2, password, stored_hash)
    }

    /// Run `verify` on the blocking thread pool
    pub async fn verify_blocking(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let hasher = self.clone();
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::PasswordHash(format!("verification task failed: {}", e)))?
    }

    /// Run `hash` on the blocking thread pool
    pub async fn hash_blocking(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::PasswordHash(format!("hashing task failed: {}", e)))?
    }

    /// Burn one verification's worth of work against the dummy hash
    pub async fn verify_dummy(&self, password: &str) -> Result<bool, AuthError> {
        let dummy = self.dummy_hash.clone();
        self.verify_blocking(password, &dummy).await
    }

    /// Whether a stored hash was produced with a different algorithm or cost
    pub fn needs_rehash(&self, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return true;
        };

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        if parsed.version != Some(Version::V0x13.into()) {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(stored) => {
                let current = self.argon2.params();
                stored.m_cost() != current.m_cost()
                    || stored.t_cost() != current.t_cost()
                    || stored.p_cost() != current.p_cost()
            }
            Err(_) => true,
        }
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

fn verify_with(argon2: &Argon2<'_>, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::PasswordHash(format!("malformed stored hash: {}", e)))?;

    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => {
            debug!("Password verification failed: {}", e);
            Err(AuthError::PasswordHash(e.to_string()))
        }
    }
}

/// Hash a password with the default Argon2id parameters
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    verify_with(&Argon2::default(), password, stored_hash)
}
