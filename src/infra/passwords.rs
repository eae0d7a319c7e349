//! Argon2 password hashing, run off the async executor.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand_core::OsRng;

use super::error::InfraError;

pub async fn hash_password(password: &str) -> Result<String, InfraError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|err| InfraError::hashing(format!("hash task failed: {err}")))?
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
pub async fn verify_password(hash: &str, candidate: &str) -> Result<bool, InfraError> {
    let hash = hash.to_owned();
    let candidate = candidate.to_owned();
    tokio::task::spawn_blocking(move || verify_blocking(&hash, &candidate))
        .await
        .map_err(|err| InfraError::hashing(format!("verify task failed: {err}")))?
}

fn hash_blocking(password: &str) -> Result<String, InfraError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| InfraError::hashing(format!("argon2 hash failed: {err}")))?
        .to_string();
    Ok(hash)
}

fn verify_blocking(hash: &str, candidate: &str) -> Result<bool, InfraError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| InfraError::hashing(format!("stored hash unreadable: {err}")))?;
    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}
