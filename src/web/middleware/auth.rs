use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use cookie::{time::Duration, Cookie, SameSite};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::services::identity_service::{AuthError, SessionTokens};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const PKCE_COOKIE: &str = "pkce_verifier";

#[derive(Clone, Debug, Serialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
}

/// Set on every request by [`identify`]; `None` for anonymous visitors.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

impl CurrentUser {
    pub fn email(&self) -> Option<String> {
        self.0.as_ref().map(|u| u.email.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token carries no email")]
    MissingEmail,
}

#[derive(Deserialize)]
struct JwtHeader {
    alg: String,
}

#[derive(Deserialize)]
struct JwtClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

#[derive(Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Verifies an HS256 access token and turns its claims into a user.
pub fn verify_access_token(
    token: &str,
    secret: &str,
    now: i64,
) -> Result<AuthenticatedUser, TokenError> {
    let mut parts = token.split('.');
    let (Some(header_part), Some(payload_part), Some(sig_part), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let header: JwtHeader = decode_segment(header_part)?;
    if header.alg != "HS256" {
        return Err(TokenError::UnsupportedAlgorithm(header.alg));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::Malformed)?;
    mac.update(header_part.as_bytes());
    mac.update(b".");
    mac.update(payload_part.as_bytes());
    let signature = URL_SAFE_NO_PAD.decode(sig_part).map_err(|_| TokenError::Malformed)?;
    mac.verify_slice(&signature).map_err(|_| TokenError::BadSignature)?;

    let claims: JwtClaims = decode_segment(payload_part)?;
    if claims.exp <= now {
        return Err(TokenError::Expired);
    }
    let email = claims
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or(TokenError::MissingEmail)?;
    let full_name = claims
        .user_metadata
        .and_then(|m| m.full_name.or(m.name))
        .filter(|n| !n.trim().is_empty());

    Ok(AuthenticatedUser {
        id: claims.sub,
        email,
        full_name,
    })
}

/// Mints an HS256 token for `claims`, in the same format the auth service issues.
pub fn sign_access_token(claims: &serde_json::Value, secret: &str) -> Result<String, TokenError> {
    let header_part = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload_part = URL_SAFE_NO_PAD.encode(claims.to_string());
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::Malformed)?;
    mac.update(header_part.as_bytes());
    mac.update(b".");
    mac.update(payload_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}.{}", header_part, payload_part, sig_part))
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

pub fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new(), secure);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

pub fn session_cookies(tokens: SessionTokens, secure: bool) -> Vec<Cookie<'static>> {
    vec![
        session_cookie(ACCESS_COOKIE, tokens.access_token, secure),
        session_cookie(REFRESH_COOKIE, tokens.refresh_token, secure),
    ]
}

pub fn cleared_session_cookies(secure: bool) -> Vec<Cookie<'static>> {
    vec![
        expired_cookie(ACCESS_COOKIE, secure),
        expired_cookie(REFRESH_COOKIE, secure),
    ]
}

pub fn with_cookies(mut response: Response, cookies: Vec<Cookie<'static>>) -> Response {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Cannot encode {} cookie: {}", cookie.name(), e),
        }
    }
    response
}

/// What the refresh cookie did for this request.
enum Refresh {
    None,
    Renewed(SessionTokens),
    Dropped,
}

async fn refresh_user(
    state: &AppState,
    refresh_token: &str,
    now: i64,
) -> (Option<AuthenticatedUser>, Refresh) {
    let tokens = match state.identity.refresh_session(refresh_token).await {
        Ok(tokens) => tokens,
        Err(AuthError::Unavailable(e)) => {
            warn!("Auth service unreachable, session not refreshed: {}", e);
            return (None, Refresh::None);
        }
        Err(e) => {
            warn!("Session refresh failed: {:?}", e);
            return (None, Refresh::Dropped);
        }
    };
    match verify_access_token(&tokens.access_token, &state.config.auth.jwt_secret, now) {
        Ok(user) => {
            info!(email = %user.email, "session refreshed");
            (Some(user), Refresh::Renewed(tokens))
        }
        Err(e) => {
            warn!("Refreshed access token rejected: {}", e);
            (None, Refresh::Dropped)
        }
    }
}

/// Resolves the session cookies into a [`CurrentUser`] without rejecting anyone.
///
/// A missing or expired access token is renewed once from the refresh cookie.
/// A refresh the auth service turns down clears both cookies.
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let now = Utc::now().timestamp();
    let user = cookie_value(request.headers(), ACCESS_COOKIE).and_then(|token| {
        verify_access_token(&token, &state.config.auth.jwt_secret, now)
            .map_err(|e| debug!("Ignoring access token: {}", e))
            .ok()
    });

    let (user, refresh) = match (user, cookie_value(request.headers(), REFRESH_COOKIE)) {
        (Some(user), _) => (Some(user), Refresh::None),
        (None, Some(refresh_token)) => refresh_user(&state, &refresh_token, now).await,
        (None, None) => (None, Refresh::None),
    };

    request.extensions_mut().insert(CurrentUser(user));
    let response = next.run(request).await;

    // Login and logout set their own session cookies; those win.
    let handler_set_session = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(ACCESS_COOKIE));
    if handler_set_session {
        return response;
    }

    let secure = state.config.cookie_secure;
    match refresh {
        Refresh::None => response,
        Refresh::Renewed(tokens) => with_cookies(response, session_cookies(tokens, secure)),
        Refresh::Dropped => with_cookies(response, cleared_session_cookies(secure)),
    }
}

/// Lets signed-in users through with an [`AuthenticatedUser`] extension.
/// Everyone else goes to `/login`.
pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .and_then(|current| current.0.clone());

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn claims(exp: i64) -> serde_json::Value {
        json!({
            "sub": "7f1c0d3e-user",
            "email": "Anu@Example.com",
            "exp": exp,
            "user_metadata": { "full_name": "Anu R" }
        })
    }

    #[test]
    fn session_cookies_are_http_only_and_lax() {
        let rendered = session_cookie(ACCESS_COOKIE, "tok".into(), false).to_string();
        assert!(rendered.starts_with("access_token=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(!rendered.contains("Secure"));

        let cleared: Vec<String> = cleared_session_cookies(true)
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert!(cleared[1].starts_with("refresh_token="));
        assert!(cleared.iter().all(|c| c.contains("Max-Age=0") && c.contains("Secure")));
    }

    #[test]
    fn accepts_valid_token() {
        let token = sign_access_token(&claims(2_000), SECRET).unwrap();
        let user = verify_access_token(&token, SECRET, 1_000).unwrap();
        assert_eq!(user.id, "7f1c0d3e-user");
        assert_eq!(user.email, "anu@example.com");
        assert_eq!(user.full_name.as_deref(), Some("Anu R"));
    }

    #[test]
    fn rejects_wrong_secret_and_tampering() {
        let token = sign_access_token(&claims(2_000), SECRET).unwrap();
        assert_eq!(
            verify_access_token(&token, "another-secret", 1_000).unwrap_err(),
            TokenError::BadSignature
        );

        let forged_payload = URL_SAFE_NO_PAD.encode(
            json!({ "sub": "x", "email": "admin@ezhumi.com", "exp": 2_000 }).to_string(),
        );
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_payload;
        assert_eq!(
            verify_access_token(&parts.join("."), SECRET, 1_000).unwrap_err(),
            TokenError::BadSignature
        );
    }

    #[test]
    fn rejects_expired_and_garbage() {
        let token = sign_access_token(&claims(1_000), SECRET).unwrap();
        assert_eq!(verify_access_token(&token, SECRET, 1_000).unwrap_err(), TokenError::Expired);
        assert_eq!(verify_access_token("abc", SECRET, 0).unwrap_err(), TokenError::Malformed);
        assert_eq!(verify_access_token("a.b.c.d", SECRET, 0).unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn rejects_tokens_without_email() {
        let token = sign_access_token(&json!({ "sub": "x", "exp": 2_000 }), SECRET).unwrap();
        assert_eq!(
            verify_access_token(&token, SECRET, 1_000).unwrap_err(),
            TokenError::MissingEmail
        );
    }

    #[test]
    fn reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; access_token=abc.def.ghi".parse().unwrap());
        assert_eq!(cookie_value(&headers, ACCESS_COOKIE).as_deref(), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), None);
    }
}
