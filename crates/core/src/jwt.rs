use albar_const::duration::ACCESS_TOKEN_TTL_SECONDS;
use albar_types::{
    entities::User,
    error::{Error, Result},
};
use bon::bon;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims for API bearer tokens
///
/// Carries the authenticated user's identity and role with a fixed 2-hour
/// expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user ID (Snowflake ID as string)
    pub sub: String,
    /// Account role at issue time (user/admin/guest)
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[bon]
impl AccessClaims {
    /// Create new access claims
    ///
    /// # Arguments
    /// * `user_id` - User ID (Snowflake ID)
    /// * `role` - Role string embedded in the token
    /// * `ttl_seconds` - Time to live in seconds
    #[builder(on(String, into))]
    pub fn new(user_id: i64, role: String, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_seconds);
        Self { sub: user_id.to_string(), role, iat: now.timestamp(), exp: exp.timestamp() }
    }

    /// The user ID carried in the token
    pub fn user_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| Error::auth("Token inválido"))
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    /// Get expiration time as DateTime
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Bearer token signing and verification over the configured HMAC secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// Create a new token service from the signing secret
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a bearer token for the user (fixed 2-hour expiry)
    pub fn sign(&self, user: &User) -> Result<String> {
        let claims = AccessClaims::builder()
            .user_id(user.id)
            .role(user.role.to_string())
            .ttl_seconds(ACCESS_TOKEN_TTL_SECONDS)
            .build();
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a bearer token and extract its claims
    ///
    /// Signature, expiry and shape failures all collapse into one
    /// authentication error; the caller cannot distinguish them.
    pub fn verify(&self, token: &str) -> Result<AccessClaims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AccessClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::auth("Token inválido o expirado"))
    }
}
