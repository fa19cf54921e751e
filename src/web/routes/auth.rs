use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use cookie::time::Duration;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::services::identity_service::{AuthError, OAuthProvider, PkcePair, SessionTokens};
use crate::state::AppState;
use crate::web::middleware::auth::{
    cleared_session_cookies, cookie_value, expired_cookie, session_cookie, session_cookies,
    with_cookies, AuthenticatedUser, CurrentUser, ACCESS_COOKIE, PKCE_COOKIE,
};
use crate::web::{render_html, render_html_with_status, PageChrome};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub chrome: PageChrome,
    pub email: String,
    pub error: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error_description: Option<String>,
}

fn signed_in_response(tokens: SessionTokens, secure: bool) -> Response {
    let mut cookies = session_cookies(tokens, secure);
    cookies.push(expired_cookie(PKCE_COOKIE, secure));
    with_cookies(Redirect::to("/").into_response(), cookies)
}

fn login_failed(status: StatusCode, email: String, err: &AuthError) -> Response {
    render_html_with_status(
        status,
        &LoginTemplate {
            chrome: PageChrome::new(None),
            email,
            error: err.to_string(),
        },
    )
}

fn auth_error_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::MissingFields | AuthError::UnknownProvider => StatusCode::BAD_REQUEST,
        AuthError::Rejected(_) => StatusCode::UNAUTHORIZED,
        AuthError::Unavailable(_) | AuthError::Misconfigured(_) => StatusCode::BAD_GATEWAY,
    }
}

pub async fn login_page(Extension(current): Extension<CurrentUser>) -> Response {
    if current.0.is_some() {
        return Redirect::to("/").into_response();
    }
    render_html(&LoginTemplate {
        chrome: PageChrome::new(None),
        email: String::new(),
        error: String::new(),
    })
}

pub async fn login_handler(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    info!(email = %form.email.trim(), "login attempt");

    match state
        .identity
        .sign_in_with_password(&form.email, &form.password)
        .await
    {
        Ok(tokens) => {
            info!(email = %form.email.trim(), "login succeeded");
            signed_in_response(tokens, state.config.cookie_secure)
        }
        Err(e) => {
            warn!(email = %form.email.trim(), "login failed: {:?}", e);
            login_failed(auth_error_status(&e), form.email, &e)
        }
    }
}

pub async fn oauth_start_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Response {
    let Some(provider) = OAuthProvider::parse(&provider) else {
        return login_failed(StatusCode::BAD_REQUEST, String::new(), &AuthError::UnknownProvider);
    };

    let pkce = PkcePair::generate();
    let redirect_to = format!("{}/auth/callback", state.config.public_url.trim_end_matches('/'));
    let url = match state
        .identity
        .oauth_authorize_url(provider, &redirect_to, &pkce.challenge)
    {
        Ok(url) => url,
        Err(e) => {
            error!("Cannot build authorize URL: {:?}", e);
            return login_failed(auth_error_status(&e), String::new(), &e);
        }
    };

    let mut verifier = session_cookie(PKCE_COOKIE, pkce.verifier, state.config.cookie_secure);
    verifier.set_max_age(Duration::minutes(10));
    with_cookies(Redirect::to(&url).into_response(), vec![verifier])
}

pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(description) = query.error_description {
        warn!("OAuth provider returned an error: {}", description);
        return login_failed(
            StatusCode::UNAUTHORIZED,
            String::new(),
            &AuthError::Rejected(description),
        );
    }

    let (Some(code), Some(verifier)) = (query.code, cookie_value(&headers, PKCE_COOKIE)) else {
        warn!("OAuth callback without code or verifier");
        return Redirect::to("/login").into_response();
    };

    match state.identity.exchange_code(&code, &verifier).await {
        Ok(tokens) => signed_in_response(tokens, state.config.cookie_secure),
        Err(e) => {
            warn!("OAuth code exchange failed: {:?}", e);
            login_failed(auth_error_status(&e), String::new(), &e)
        }
    }
}

pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_value(&headers, ACCESS_COOKIE) {
        if let Err(e) = state.identity.sign_out(&token).await {
            warn!("Upstream sign-out failed: {:?}", e);
        }
    }

    let secure = state.config.cookie_secure;
    with_cookies(Redirect::to("/login").into_response(), cleared_session_cookies(secure))
}

pub async fn me_handler(
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<AuthenticatedUser>, AppError> {
    current.0.map(Json).ok_or(AppError::Unauthorized)
}
