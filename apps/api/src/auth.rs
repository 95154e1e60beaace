//! Session authentication module.
//!
//! Handles password hashing, session token issue/validation, and the axum
//! extractors that guard back-office routes.
//!
//! ```text
//! POST /api/auth/login ──► verify argon2 hash ──► JWT (HS256) + open shift
//!
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//!   Session        any employee of the restaurant
//!   AdminSession   role == admin, else 403
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;
use mesa_core::{Employee, Role};

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee id)
    pub sub: String,

    /// Tenant the employee belongs to
    pub restaurant_id: String,

    pub role: Role,

    /// Display name
    pub name: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Session token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager { secret, lifetime_secs }
    }

    /// Issues a session token for an employee.
    pub fn issue(&self, employee: &Employee) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: employee.id.clone(),
            restaurant_id: employee.restaurant_id.clone(),
            role: employee.role,
            name: employee.name.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validates and decodes a token.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::Unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// =============================================================================
// Extractors
// =============================================================================

/// Any authenticated employee.
#[derive(Debug, Clone)]
pub struct Session(pub Claims);

/// An authenticated employee with the admin role.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("Missing bearer token".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthenticated("Malformed authorization header".to_string()))?;

        Ok(Session(state.jwt.validate(token)?))
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;

        if claims.role != Role::Admin {
            return Err(ApiError::Forbidden("Admin role required".to_string()));
        }
        Ok(AdminSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(role: Role) -> Employee {
        Employee {
            id: "emp-1".to_string(),
            restaurant_id: "la-parrilla".to_string(),
            name: "Ana".to_string(),
            email: "ana@parrilla.com".to_string(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let token = manager.issue(&employee(Role::Cajero)).unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "emp-1");
        assert_eq!(claims.restaurant_id, "la-parrilla");
        assert_eq!(claims.role, Role::Cajero);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtManager::new("one".to_string(), 3600);
        let checker = JwtManager::new("two".to_string(), 3600);
        let token = issuer.issue(&employee(Role::Admin)).unwrap();

        assert!(matches!(checker.validate(&token), Err(ApiError::Unauthenticated(_))));
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("secreto123").unwrap();
        assert!(verify_password("secreto123", &hash));
        assert!(!verify_password("otra-clave", &hash));
        assert!(!verify_password("secreto123", "not-a-phc-string"));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
