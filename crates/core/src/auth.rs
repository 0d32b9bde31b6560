use albar_const::limits::VERIFICATION_CODE_LENGTH;
use albar_types::error::{Error, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a plaintext password with Argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored hash
///
/// Returns `Ok(false)` on mismatch; errors only on a malformed stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| Error::internal(format!("Malformed password hash: {e}")))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Generate a 6-digit decimal email verification code
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..VERIFICATION_CODE_LENGTH).map(|_| char::from(b'0' + rng.random_range(0..10))).collect()
}

/// Generate a password-recovery token
///
/// Returns a 32-byte random value as a 64-character hex string.
pub fn generate_reset_token() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Generate a temporary password for invited accounts
///
/// Returns an 8-byte random value as a 16-character hex string.
pub fn generate_temp_password() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    hex::encode(bytes)
}
