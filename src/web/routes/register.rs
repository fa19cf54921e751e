use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::Participant;
use crate::services::dashboard_service;
use crate::services::otp_service::RegistrationStage;
use crate::services::registration_service::{self, RegistrationError, SubmitOutcome};
use crate::services::validation_service::{RegistrationForm, MAX_EXTRA_PARTICIPANTS};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{render_html, render_html_with_status, PageChrome, SelectOption};

pub const CONFIRMATION_FAILED_NOTICE: &str =
    "We could not send your confirmation. Please contact us directly.";

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub chrome: PageChrome,
    pub form: RegistrationForm,
    pub count_options: Vec<SelectOption>,
    pub show_otp: bool,
    pub error: String,
    pub notice: String,
}

impl RegisterTemplate {
    fn new(user: &AuthenticatedUser, form: RegistrationForm) -> Self {
        let current = if form.participant_count.trim().is_empty() {
            "0".to_string()
        } else {
            form.participant_count.trim().to_string()
        };
        Self {
            chrome: PageChrome::new(Some(user.email.clone())),
            count_options: SelectOption::list(
                (0..=MAX_EXTRA_PARTICIPANTS).map(|n| n.to_string()),
                &current,
            ),
            form,
            show_otp: false,
            error: String::new(),
            notice: String::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "register_success.html")]
pub struct RegisterSuccessTemplate {
    pub chrome: PageChrome,
    pub registration_id: String,
    pub team_name: String,
    pub team_lead_name: String,
    pub team_lead_email: String,
    pub team_lead_phone: String,
    pub college_name: String,
    pub participant_count: i64,
    pub participants: Vec<Participant>,
    pub registered_at: String,
    pub notice: String,
}

#[derive(Deserialize)]
pub struct SuccessQuery {
    notice: Option<String>,
}

pub async fn register_page(Extension(user): Extension<AuthenticatedUser>) -> Response {
    render_html(&RegisterTemplate::new(&user, RegistrationForm::default()))
}

pub async fn register_submit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Form(form): Form<RegistrationForm>,
) -> Response {
    handle_submit(state, user, form).await
}

pub async fn resend_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Form(mut form): Form<RegistrationForm>,
) -> Response {
    form.action = "resend".to_string();
    handle_submit(state, user, form).await
}

async fn handle_submit(
    state: AppState,
    user: AuthenticatedUser,
    mut form: RegistrationForm,
) -> Response {
    let result = registration_service::submit_registration(
        &state.pool,
        &state.otp,
        &state.notifier,
        &form,
        &user.email,
    )
    .await;

    match result {
        Ok(SubmitOutcome::CodeSent) => {
            info!(user = %user.email, "verification code sent");
            let lead_email = form.team_lead_email.trim().to_lowercase();
            form.otp.clear();
            form.action.clear();
            let mut template = RegisterTemplate::new(&user, form);
            template.show_otp = true;
            template.notice = format!("A verification code has been sent to {}.", lead_email);
            render_html(&template)
        }
        Ok(SubmitOutcome::Registered {
            registration_id,
            confirmation_sent,
        }) => {
            let target = if confirmation_sent {
                format!("/register/success/{}", registration_id)
            } else {
                format!("/register/success/{}?notice=confirmation_failed", registration_id)
            };
            Redirect::to(&target).into_response()
        }
        Err(e) => {
            warn!(user = %user.email, "registration rejected: {}", e);
            let status = e.status_code();
            let stage = state.otp.stage(&form.team_lead_email, Utc::now());
            let show_otp = !matches!(e, RegistrationError::Validation(_))
                && stage == RegistrationStage::CodeSent;
            form.otp.clear();
            form.action.clear();
            let mut template = RegisterTemplate::new(&user, form);
            template.show_otp = show_otp;
            template.error = e.to_string();
            render_html_with_status(status, &template)
        }
    }
}

pub async fn register_success_page(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(registration_id): Path<String>,
    Query(query): Query<SuccessQuery>,
) -> Response {
    let view = registration_service::load_success_view(&state.pool, &registration_id, &user.email);
    let view = match view.await {
        Ok(v) => v,
        Err(e) => {
            warn!("Success page load failed for {}: {}", registration_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(view) = view else {
        return Redirect::to("/register").into_response();
    };

    let registered_at = dashboard_service::parse_created_at(&view.registered_at)
        .map(|dt| {
            dt.with_timezone(&state.config.event_offset)
                .format("%d %b %Y, %H:%M")
                .to_string()
        })
        .unwrap_or(view.registered_at);
    let notice = match query.notice.as_deref() {
        Some("confirmation_failed") => CONFIRMATION_FAILED_NOTICE.to_string(),
        _ => String::new(),
    };

    render_html(&RegisterSuccessTemplate {
        chrome: PageChrome::new(Some(user.email)),
        registration_id: view.registration_id,
        team_name: view.team_name,
        team_lead_name: view.team_lead_name,
        team_lead_email: view.team_lead_email,
        team_lead_phone: view.team_lead_phone,
        college_name: view.college_name,
        participant_count: view.participant_count,
        participants: view.participants,
        registered_at,
        notice,
    })
}
