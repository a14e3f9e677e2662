//! Authentication middleware and bearer token signing

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Fixed HS256 header, `{"alg":"HS256","typ":"JWT"}`
const JWT_HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

/// Claims carried by seller tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (seller ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    #[serde(default)]
    pub email: Option<String>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn signature(message: &str, secret: &str) -> Result<Vec<u8>, AuthError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Issue a token for a seller
pub fn sign_jwt(
    seller_id: &str,
    email: Option<&str>,
    ttl: Duration,
    secret: &str,
) -> Result<String, AuthError> {
    let iat = now_secs();
    let claims = JwtClaims {
        sub: seller_id.to_string(),
        exp: iat + ttl.as_secs(),
        iat,
        email: email.map(String::from),
    };
    let payload = serde_json::to_vec(&claims).map_err(|_| AuthError::InvalidToken)?;
    let message = format!("{}.{}", JWT_HEADER, URL_SAFE_NO_PAD.encode(payload));
    let signature = URL_SAFE_NO_PAD.encode(signature(&message, secret)?);
    Ok(format!("{}.{}", message, signature))
}

/// Verify a JWT token and extract claims
pub fn verify_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let header_b64 = parts[0];
    let payload_b64 = parts[1];
    let signature_b64 = parts[2];

    // Verify signature (HMAC-SHA256)
    let message = format!("{}.{}", header_b64, payload_b64);
    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());
    mac.verify_slice(&provided_signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    let claims: JwtClaims =
        serde_json::from_slice(&payload_json).map_err(|_| AuthError::InvalidToken)?;

    if claims.exp < now_secs() {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Extract JWT from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Authenticated seller, placed in request extensions by `require_auth`
#[derive(Debug, Clone)]
pub struct AuthenticatedSeller {
    pub seller_id: String,
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidFormat)?;

    let claims = verify_jwt(token, &state.config.jwt_secret)?;

    let seller = AuthenticatedSeller {
        seller_id: claims.sub,
    };

    request.extensions_mut().insert(seller);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let token = sign_jwt("seller1", Some("a@b.c"), Duration::from_secs(60), "secret").unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "seller1");
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign_jwt("seller1", None, Duration::from_secs(60), "secret").unwrap();
        assert!(matches!(verify_jwt(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = sign_jwt("seller1", None, Duration::from_secs(60), "secret").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = JwtClaims {
            sub: "seller2".to_string(),
            exp: u64::MAX,
            iat: 0,
            email: None,
        };
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert!(matches!(verify_jwt(&tampered, "secret"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let iat = now_secs() - 120;
        let claims = JwtClaims {
            sub: "seller1".to_string(),
            exp: iat + 60,
            iat,
            email: None,
        };
        let message = format!(
            "{}.{}",
            JWT_HEADER,
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap())
        );
        let token = format!(
            "{}.{}",
            message,
            URL_SAFE_NO_PAD.encode(signature(&message, "secret").unwrap())
        );
        assert!(matches!(verify_jwt(&token, "secret"), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(verify_jwt("abc", "s"), Err(AuthError::InvalidToken)));
        assert!(matches!(verify_jwt("a.b.c", "s"), Err(AuthError::InvalidToken)));
        assert_eq!(extract_bearer_token("Bearer xyz"), Some("xyz"));
        assert_eq!(extract_bearer_token("Basic xyz"), None);
    }
}
