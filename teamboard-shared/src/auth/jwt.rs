/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the user id as `sub`. Access tokens
/// authenticate API calls; refresh tokens can only be exchanged for a new
/// access token.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 24 hours for access tokens, 30 days for refresh tokens
/// - **Validation**: signature, expiry, not-before and issuer
/// - **Secret**: at least 32 bytes; the API refuses to start with less
///
/// # Example
///
/// ```
/// use teamboard_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, TokenType::Access);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated_claims = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated_claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `iss` claim
pub const ISSUER: &str = "teamboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Right signature, wrong kind of token
    #[error("Expected {expected} token")]
    WrongType { expected: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// - `sub`: user id
/// - `iss`: always [`ISSUER`]
/// - `iat` / `nbf` / `exp`: Unix timestamps
/// - `token_type`: access or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub token_type: TokenType,
}

impl Claims {
    /// Claims expiring after the token type's default lifetime
    pub fn new(user_id: Uuid, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, token_type, token_type.default_expiration())
    }

    /// Claims with a custom lifetime; a negative duration yields an already
    /// expired token, which tests rely on
    pub fn with_expiration(user_id: Uuid, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Seconds until `exp`, `None` once expired
    pub fn expires_in_seconds(&self) -> Option<i64> {
        let remaining = self.exp - Utc::now().timestamp();
        (remaining > 0).then_some(remaining)
    }
}

/// Signs `claims` with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, expiry, not-before and issuer and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected: expected.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

/// Access and refresh token issued together at sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Issues a fresh access/refresh pair for a user
pub fn issue_token_pair(user_id: Uuid, secret: &str) -> Result<TokenPair, JwtError> {
    let access = Claims::new(user_id, TokenType::Access);
    let refresh = Claims::new(user_id, TokenType::Refresh);

    Ok(TokenPair {
        access_token: create_token(&access, secret)?,
        refresh_token: create_token(&refresh, secret)?,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    })
}

/// Exchanges a valid refresh token for a new access token
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, secret)?;
    let access_claims = Claims::new(refresh_claims.sub, TokenType::Access);

    create_token(&access_claims, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_type_expiration() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::hours(24));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(30));
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.token_type, TokenType::Access);
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_token(&token, "another-secret-key-also-32-bytes-long").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            TokenType::Access,
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());
        assert!(claims.expires_in_seconds().is_none());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let access = create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), SECRET).unwrap();
        let refresh = create_token(&Claims::new(Uuid::new_v4(), TokenType::Refresh), SECRET).unwrap();

        assert!(validate_access_token(&access, SECRET).is_ok());
        assert!(validate_refresh_token(&refresh, SECRET).is_ok());
        assert!(matches!(
            validate_access_token(&refresh, SECRET),
            Err(JwtError::WrongType { expected: "access" })
        ));
        assert!(validate_refresh_token(&access, SECRET).is_err());
    }

    #[test]
    fn test_issue_pair_and_refresh() {
        let user_id = Uuid::new_v4();
        let pair = issue_token_pair(user_id, SECRET).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 86_400);

        let access = refresh_access_token(&pair.refresh_token, SECRET).unwrap();
        let claims = validate_access_token(&access, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);

        assert!(refresh_access_token(&pair.access_token, SECRET).is_err());
    }
}
