/// Password hashing and registration password rules
///
/// Hashes use Argon2id with explicit parameters:
///
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash, PHC string with embedded salt and parameters
///
/// Registration additionally checks strength (8+ characters, upper and lower
/// case, a digit and a special character) and that the confirmation matches.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{check_new_password, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// check_new_password("Tr1cky!pass", "Tr1cky!pass")?;
///
/// let hash = hash_password("Tr1cky!pass")?;
/// assert!(verify_password("Tr1cky!pass", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Why a new password was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordRule {
    #[error("Password must be at least 8 characters long")]
    TooShort,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one digit")]
    MissingDigit,

    #[error("Password must contain at least one special character")]
    MissingSpecial,

    #[error("The two password fields didn't match")]
    Mismatch,
}

impl PasswordRule {
    /// Form field the failure belongs to
    pub fn field(&self) -> &'static str {
        match self {
            PasswordRule::Mismatch => "password_confirmation",
            _ => "password",
        }
    }
}

/// Hashes a password with Argon2id and a random 16-byte salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC hash
///
/// `Ok(false)` means a wrong password; `Err` means the stored hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash("Hash has no output".to_string()));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks strength rules in order and reports the first failure
pub fn validate_password_strength(password: &str) -> Result<(), PasswordRule> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordRule::TooShort);
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(PasswordRule::MissingUppercase);
    }

    if !password.chars().any(char::is_lowercase) {
        return Err(PasswordRule::MissingLowercase);
    }

    if !password.chars().any(char::is_numeric) {
        return Err(PasswordRule::MissingDigit);
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(PasswordRule::MissingSpecial);
    }

    Ok(())
}

/// Strength rules plus the confirmation match required at registration
pub fn check_new_password(password: &str, confirmation: &str) -> Result<(), PasswordRule> {
    if password != confirmation {
        return Err(PasswordRule::Mismatch);
    }

    validate_password_strength(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        assert!(matches!(
            verify_password("password", "$argon2id$invalid"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_strength_rules() {
        assert_eq!(validate_password_strength("MyP@ssw0rd!"), Ok(()));
        assert_eq!(validate_password_strength("Sh0rt!"), Err(PasswordRule::TooShort));
        assert_eq!(validate_password_strength("lowercase1!"), Err(PasswordRule::MissingUppercase));
        assert_eq!(validate_password_strength("UPPERCASE1!"), Err(PasswordRule::MissingLowercase));
        assert_eq!(validate_password_strength("NoDigits!"), Err(PasswordRule::MissingDigit));
        assert_eq!(validate_password_strength("NoSpecial123"), Err(PasswordRule::MissingSpecial));
    }

    #[test]
    fn test_confirmation_must_match() {
        let err = check_new_password("MyP@ssw0rd!", "MyP@ssw0rd?").unwrap_err();

        assert_eq!(err, PasswordRule::Mismatch);
        assert_eq!(err.field(), "password_confirmation");
        assert_eq!(PasswordRule::TooShort.field(), "password");
    }
}
