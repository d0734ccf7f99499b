//! Argon2id password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::LawdeskError;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, LawdeskError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LawdeskError::PasswordHash(e.to_string()))
}

/// `false` for a mismatch and for a stored hash that does not parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn validate_password_strength(password: &str) -> Result<(), LawdeskError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LawdeskError::validation(format!(
            "كلمة المرور يجب أن تكون {MIN_PASSWORD_LEN} أحرف على الأقل"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("lawyer123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("lawyer123", &hash));
        assert!(!verify_password("lawyer124", &hash));
    }

    #[test]
    fn plain_text_stored_value_never_verifies() {
        assert!(!verify_password("admin123", "admin123"));
    }

    #[test]
    fn short_password_rejected() {
        assert!(validate_password_strength("12345").is_err());
        assert!(validate_password_strength("123456").is_ok());
    }
}
