use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use tandem_shared::errors::AppError;
use tandem_shared::types::auth::{AccessToken, Claims, UserRole};

pub fn create_access_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    ttl_secs: i64,
) -> Result<AccessToken, AppError> {
    let claims = Claims::new(user_id, role, ttl_secs);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))?;
    Ok(AccessToken::new(token, ttl_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn issued_token_decodes_with_the_same_secret() {
        let user_id = Uuid::now_v7();
        let token = create_access_token(user_id, UserRole::User, "test-secret", 600).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 600);

        let decoded = decode::<Claims>(
            &token.access_token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, user_id);
        assert!(!decoded.claims.is_expired());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_access_token(Uuid::now_v7(), UserRole::User, "test-secret", 600).unwrap();
        let result = decode::<Claims>(
            &token.access_token,
            &DecodingKey::from_secret(b"other-secret"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }
}
