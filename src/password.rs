use anyhow::Context;
use argon2::{password_hash::{rand_core::OsRng, SaltString}, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::{distributions::Alphanumeric, Rng};
use secrecy::{ExposeSecret, SecretString};

use crate::telemetry::spawn_blocking_with_tracing;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const TEMPORARY_PASSWORD_LENGTH: usize = 16;

pub fn validate_password_strength(password: &SecretString) -> Result<(), String>{
    let password = password.expose_secret();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!("password must be at least {} characters", MIN_PASSWORD_LENGTH));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) || !password.chars().any(|c| c.is_alphabetic()) {
        return Err("password must contain letters and digits".into());
    }
    Ok(())
}

pub fn compute_password_hash(password: SecretString) -> Result<SecretString, anyhow::Error>{
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
                            .hash_password(password.expose_secret().as_bytes(), &salt)
                            .map_err(|_| anyhow::anyhow!("Failed to compute password hash"))?
                            .to_string();

    Ok(SecretString::from(password_hash))
}

/// Hashes on the blocking pool
pub async fn hash_password(password: SecretString) -> Result<SecretString, anyhow::Error>{
    spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed due to threadpool error")?
}

pub async fn verify_password(password: SecretString, hashed_password: String) -> Result<bool, anyhow::Error>{
    spawn_blocking_with_tracing(move ||{
        let hashed_password = PasswordHash::new(hashed_password.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to parse PasswordHash from stored hashed password"))?;

        Ok(Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &hashed_password)
            .is_ok())
    })
    .await
    .context("Failed due to threadpool error")?
}

// One-time password handed to newly created staff accounts
pub fn generate_temporary_password() -> SecretString{
    let mut rng = rand::thread_rng();
    let mut password: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LENGTH - 1)
        .map(char::from)
        .collect();
    password.push(char::from(b'0' + rng.gen_range(0..10)));

    SecretString::from(password)
}
