use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decodes an access token issued by the HR identity service.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("refresh tokens cannot authorize requests".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::models::{Claims, TokenType};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    pub fn token(role: u8, employee_id: Option<u64>, token_type: TokenType, secret: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;
        let claims = Claims {
            user_id: 7,
            sub: "jane".to_string(),
            role,
            exp: now + 900,
            jti: Uuid::new_v4().to_string(),
            token_type,
            employee_id,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::token;
    use super::*;

    #[test]
    fn accepts_access_tokens() {
        let claims = verify_token(&token(3, Some(1001), TokenType::Access, "s3cret"), "s3cret")
            .unwrap();

        assert_eq!(claims.employee_id, Some(1001));
        assert_eq!(claims.role, 3);
    }

    #[test]
    fn rejects_refresh_tokens_and_wrong_secret() {
        assert!(verify_token(&token(3, None, TokenType::Refresh, "s3cret"), "s3cret").is_err());
        assert!(verify_token(&token(3, None, TokenType::Access, "s3cret"), "other").is_err());
    }
}
