use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use tandem_shared::errors::{AppError, ErrorCode};

/// Accounts are restricted to an adolescent age band.
pub const MIN_AGE: i32 = 13;
pub const MAX_AGE: i32 = 19;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// `local@domain.tld` shape: restricted local part, dotted domain, 2+ letter TLD.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::new(ErrorCode::InvalidEmail, "invalid email address");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || !local.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return Err(invalid());
    }

    if domain.contains('@')
        || !domain.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
    {
        return Err(invalid());
    }

    // The TLD must be at least two ASCII letters.
    let (head, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if head.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.len() < 3 || username.len() > 50 {
        return Err(AppError::new(
            ErrorCode::InvalidUsername,
            "username must be between 3 and 50 characters",
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::new(
            ErrorCode::InvalidUsername,
            "username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one number"));
    }
    Ok(())
}

/// Ages arrive as form strings; non-numeric input is rejected outright.
pub fn validate_age(age: &str) -> Result<i32, AppError> {
    let age: i32 = age
        .trim()
        .parse()
        .map_err(|_| AppError::new(ErrorCode::InvalidAge, "age must be a number"))?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(AppError::new(
            ErrorCode::InvalidAge,
            format!("age must be between {MIN_AGE} and {MAX_AGE}"),
        ));
    }
    Ok(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(result: Result<(), AppError>) -> Option<ErrorCode> {
        result.err().and_then(|e| e.error_code())
    }

    #[test]
    fn accepts_plain_and_plussed_emails() {
        assert!(validate_email("anna@example.com").is_ok());
        assert!(validate_email("anna.k+rooms@mail.example.co").is_ok());
        assert!(validate_email("a_b-c%d@sub.example.de").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in [
            "",
            "plain",
            "@example.com",
            "anna@",
            "anna@example",
            "anna@example.c",
            "anna@.com",
            "anna@exa mple.com",
            "an na@example.com",
            "anna@@example.com",
        ] {
            assert_eq!(code(validate_email(bad)), Some(ErrorCode::InvalidEmail), "{bad:?}");
        }
    }

    #[test]
    fn username_length_and_charset() {
        assert!(validate_username("anna_k").is_ok());
        assert!(validate_username("abc").is_ok());
        assert_eq!(code(validate_username("ab")), Some(ErrorCode::InvalidUsername));
        assert_eq!(code(validate_username(&"x".repeat(51))), Some(ErrorCode::InvalidUsername));
        assert_eq!(code(validate_username("anna-k")), Some(ErrorCode::InvalidUsername));
        assert_eq!(code(validate_username("анна")), Some(ErrorCode::InvalidUsername));
    }

    #[test]
    fn password_requires_mixed_case_and_digit() {
        assert!(validate_password("Secret123").is_ok());
        assert_eq!(code(validate_password("Sh0rt")), Some(ErrorCode::PasswordTooWeak));
        assert_eq!(code(validate_password("alllower1")), Some(ErrorCode::PasswordTooWeak));
        assert_eq!(code(validate_password("ALLUPPER1")), Some(ErrorCode::PasswordTooWeak));
        assert_eq!(code(validate_password("NoDigitsHere")), Some(ErrorCode::PasswordTooWeak));
    }

    #[test]
    fn age_band_is_inclusive_13_to_19() {
        assert_eq!(validate_age("15").unwrap(), 15);
        assert_eq!(validate_age("13").unwrap(), 13);
        assert_eq!(validate_age("19").unwrap(), 19);
        for bad in ["12", "20", "abc", "", "15.5"] {
            assert!(validate_age(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("Secret123").unwrap();
        assert!(verify_password("Secret123", &hash).unwrap());
        assert!(!verify_password("Secret124", &hash).unwrap());
    }
}
