use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, warn};

use crate::config::AuthSettings;

pub const GENERIC_AUTH_ERROR: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("Unsupported sign-in provider.")]
    UnknownProvider,
    #[error("{0}")]
    Rejected(String),
    #[error("Something went wrong. Please try again.")]
    Unavailable(#[from] reqwest::Error),
    #[error("Something went wrong. Please try again.")]
    Misconfigured(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "google" => Some(OAuthProvider::Google),
            "github" => Some(OAuthProvider::Github),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Deserialize, Default)]
struct ProviderErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

/// PKCE verifier and its S256 challenge.
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let verifier = general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        let challenge = pkce_challenge(&verifier);
        Self { verifier, challenge }
    }
}

pub fn pkce_challenge(verifier: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Client for the GoTrue-compatible auth service.
pub struct IdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityProvider {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let url = format!("{}/token?grant_type=password", self.base_url);
        let body = json!({ "email": email, "password": password });
        self.token_request(&url, &body).await
    }

    pub fn oauth_authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.base_url),
            &[
                ("provider", provider.as_str()),
                ("redirect_to", redirect_to),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "s256"),
            ],
        )
        .map_err(|e| AuthError::Misconfigured(e.to_string()))?;
        Ok(url.to_string())
    }

    pub async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<SessionTokens, AuthError> {
        let url = format!("{}/token?grant_type=pkce", self.base_url);
        let body = json!({ "auth_code": auth_code, "code_verifier": code_verifier });
        self.token_request(&url, &body).await
    }

    /// Trades a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        let url = format!("{}/token?grant_type=refresh_token", self.base_url);
        let body = json!({ "refresh_token": refresh_token });
        self.token_request(&url, &body).await
    }

    /// Revokes the session upstream. Cookies are cleared regardless.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!("Auth service logout returned {}", resp.status());
            return Err(AuthError::Rejected(GENERIC_AUTH_ERROR.to_string()));
        }
        Ok(())
    }

    async fn token_request(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<SessionTokens, AuthError> {
        let resp = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Request to auth service failed: {}", e);
                AuthError::Unavailable(e)
            })?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            warn!("Auth service rejected token request: {}", status);
            return Err(AuthError::Rejected(provider_message(&text)));
        }

        serde_json::from_str::<SessionTokens>(&text).map_err(|e| {
            error!("Cannot parse auth service response: {}", e);
            AuthError::Misconfigured(e.to_string())
        })
    }
}

fn provider_message(body: &str) -> String {
    let parsed: ProviderErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_AUTH_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(url: &str) -> IdentityProvider {
        IdentityProvider::new(&AuthSettings {
            url: url.to_string(),
            api_key: "anon".to_string(),
            jwt_secret: "secret".to_string(),
        })
    }

    #[test]
    fn authorize_url_carries_provider_and_callback() {
        let url = provider("https://auth.ezhumi.test/auth/v1/")
            .oauth_authorize_url(
                OAuthProvider::Github,
                "http://127.0.0.1:3000/auth/callback",
                "abc",
            )
            .unwrap();
        assert!(url.starts_with("https://auth.ezhumi.test/auth/v1/authorize?"));
        assert!(url.contains("provider=github"));
        assert!(url.contains("redirect_to=http%3A%2F%2F127.0.0.1%3A3000%2Fauth%2Fcallback"));
        assert!(url.contains("code_challenge=abc"));
    }

    #[test]
    fn provider_names() {
        assert_eq!(OAuthProvider::parse("Google"), Some(OAuthProvider::Google));
        assert_eq!(OAuthProvider::parse("github"), Some(OAuthProvider::Github));
        assert_eq!(OAuthProvider::parse("myspace"), None);
    }

    #[test]
    fn pkce_challenge_matches_rfc7636_vector() {
        assert_eq!(
            pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
        let pair = PkcePair::generate();
        assert_eq!(pair.challenge, pkce_challenge(&pair.verifier));
        assert_eq!(pair.verifier.len(), 43);
    }

    #[test]
    fn provider_error_messages() {
        let rejected =
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(provider_message(rejected), "Invalid login credentials");
        assert_eq!(provider_message(r#"{"msg":"Email not confirmed"}"#), "Email not confirmed");
        assert_eq!(provider_message("<html>502</html>"), GENERIC_AUTH_ERROR);
    }

    #[tokio::test]
    async fn empty_credentials_never_leave_the_process() {
        let err = provider("http://127.0.0.1:9")
            .sign_in_with_password(" ", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingFields));
        assert_eq!(err.to_string(), "Please fill in all fields.");
    }

    #[tokio::test]
    async fn blank_refresh_token_is_not_sent() {
        let err = provider("http://127.0.0.1:9")
            .refresh_session("  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingFields));
    }

    #[tokio::test]
    async fn unreachable_provider_is_generic_error() {
        let err = provider("http://127.0.0.1:9")
            .sign_in_with_password("a@b.co", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));
        assert_eq!(err.to_string(), GENERIC_AUTH_ERROR);
    }
}
