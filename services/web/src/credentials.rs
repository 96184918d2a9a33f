//! services/web/src/credentials.rs
//!
//! Password hashing and credential verification. Hashing uses argon2 with a
//! fresh random salt per password; verification recomputes against the
//! stored hash string, which carries its own salt and parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use feedback_core::domain::{NewUser, User};
use feedback_core::forms::RegisterForm;
use feedback_core::ports::{DatabaseService, PortError, PortResult};

/// Hashes a plaintext password with a freshly generated salt.
pub fn hash_password(plaintext: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)?
        .to_string())
}

/// Turns a validated registration form into an unpersisted user record,
/// with the hash stored in place of the plaintext.
pub fn register(form: RegisterForm) -> Result<NewUser, argon2::password_hash::Error> {
    let password_hash = hash_password(&form.password)?;
    Ok(NewUser {
        username: form.username,
        password_hash,
        email: form.email,
        first_name: form.first_name,
        last_name: form.last_name,
    })
}

/// Looks up the user by username and verifies the supplied password
/// against the stored hash. Returns the user on a match and `None`
/// otherwise; a missing user and a wrong password are indistinguishable
/// to the caller.
pub async fn authenticate(
    db: &dyn DatabaseService,
    username: &str,
    password: &str,
) -> PortResult<Option<User>> {
    let creds = match db.get_user_credentials(username).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    let parsed_hash =
        PasswordHash::new(&creds.password_hash).map_err(|e| PortError::Unexpected(e.to_string()))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        db.get_user(username).await.map(Some)
    } else {
        Ok(None)
    }
}
