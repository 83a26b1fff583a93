//! Admin authentication: credential check and the signed session cookie.
//!
//! Sessions are not persisted server-side. The cookie value is a signed
//! claims token: `base64url(payload).base64url(hmac_sha256(secret, payload))`
//! where the payload is the JSON-encoded [`AdminSession`]. Logout only
//! clears the cookie; outstanding tokens stay structurally valid until they
//! expire or the signing secret changes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::AppState;

use super::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Session cookie name
pub const SESSION_COOKIE: &str = "admin-session";

/// Sessions expire after 7 days
const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Claims carried by the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub username: String,
    /// Unix seconds at issue time
    pub timestamp: i64,
    pub role: String,
}

impl AdminSession {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            timestamp: Utc::now().timestamp(),
            role: "admin".to_string(),
        }
    }

    /// A session is valid while it carries the admin role and is younger
    /// than the 7-day expiry.
    pub fn is_valid(&self) -> bool {
        self.role == "admin" && Utc::now().timestamp() - self.timestamp < SESSION_MAX_AGE_SECS
    }
}

/// Encode and sign a session into a cookie value.
pub fn encode_session(session: &AdminSession, secret: &str) -> String {
    let payload = B64.encode(serde_json::to_vec(session).expect("session claims serialize"));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(payload.as_bytes());
    let signature = B64.encode(mac.finalize().into_bytes());
    format!("{}.{}", payload, signature)
}

/// Decode a cookie value back into session claims. Returns `None` on any
/// structural or signature failure.
pub fn decode_session(token: &str, secret: &str) -> Option<AdminSession> {
    let (payload, signature) = token.split_once('.')?;

    let expected = B64.decode(signature).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected).ok()?;

    let claims = B64.decode(payload).ok()?;
    serde_json::from_slice(&claims).ok()
}

/// Cookie-based auth check. Fails closed: missing cookie, bad signature,
/// wrong role, or an expired timestamp all yield `false`.
pub fn check_admin_auth(jar: &CookieJar, secret: &str) -> bool {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(cookie.value(), secret))
        .map(|session| session.is_valid())
        .unwrap_or(false)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    a.len() == b.len() && a.ct_eq(b).into()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminUser {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: AdminUser,
}

/// Login endpoint. Issues the signed session cookie on success.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let auth = &state.config.auth;

    let username_ok = constant_time_eq(&request.username, &auth.admin_username);
    let password_ok = constant_time_eq(&request.password, &auth.admin_password);
    if !username_ok || !password_ok {
        tracing::warn!(username = %request.username, "Failed admin login attempt");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let session = AdminSession::new(&request.username);
    let token = encode_session(&session, &auth.session_secret);

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(SESSION_MAX_AGE_SECS))
        .build();

    tracing::info!(username = %request.username, "Admin logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user: AdminUser {
                username: request.username,
                role: "admin".to_string(),
            },
        }),
    ))
}

/// Logout endpoint. Clears the cookie unconditionally and always succeeds.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Json(serde_json::json!({ "success": true })))
}

/// Middleware guarding the admin API routes
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if !check_admin_auth(&jar, &state.config.auth.session_secret) {
        return Err(ApiError::unauthorized("Admin session required"));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_session_round_trip() {
        let session = AdminSession::new("admin");
        let token = encode_session(&session, SECRET);
        let decoded = decode_session(&token, SECRET).unwrap();
        assert_eq!(decoded.username, "admin");
        assert_eq!(decoded.role, "admin");
        assert!(decoded.is_valid());
    }

    #[test]
    fn test_expired_session_is_invalid() {
        let session = AdminSession {
            username: "admin".to_string(),
            timestamp: Utc::now().timestamp() - SESSION_MAX_AGE_SECS - 1,
            role: "admin".to_string(),
        };
        let token = encode_session(&session, SECRET);
        let decoded = decode_session(&token, SECRET).unwrap();
        assert!(!decoded.is_valid());
    }

    #[test]
    fn test_non_admin_role_is_invalid() {
        let session = AdminSession {
            username: "admin".to_string(),
            timestamp: Utc::now().timestamp(),
            role: "viewer".to_string(),
        };
        assert!(!session.is_valid());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = encode_session(&AdminSession::new("admin"), SECRET);
        assert!(decode_session(&token, "other-secret").is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = encode_session(&AdminSession::new("admin"), SECRET);
        let (payload, signature) = token.split_once('.').unwrap();
        let forged = AdminSession {
            username: "intruder".to_string(),
            timestamp: Utc::now().timestamp(),
            role: "admin".to_string(),
        };
        let forged_payload = B64.encode(serde_json::to_vec(&forged).unwrap());
        assert_ne!(payload, forged_payload);
        assert!(decode_session(&format!("{}.{}", forged_payload, signature), SECRET).is_none());
    }

    #[test]
    fn test_garbage_tokens_rejected() {
        assert!(decode_session("", SECRET).is_none());
        assert!(decode_session("no-dot-here", SECRET).is_none());
        assert!(decode_session("a.b", SECRET).is_none());
        assert!(decode_session("%%%.%%%", SECRET).is_none());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret2"));
    }
}
