use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::registrations_repo;
use crate::models::{Participant, TeamRegistrationRow};
use crate::services::notification_service::{ConfirmationNotice, Notifier};
use crate::services::otp_service::{OtpError, OtpStore, RegistrationStage};
use crate::services::participants_service;
use crate::services::validation_service::{
    self, RegistrationForm, ValidRegistration, ValidationError,
};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid OTP. Please check and try again.")]
    InvalidOtp,

    #[error("Your code has expired. Please request a new one.")]
    OtpExpired,

    #[error("Failed to send OTP. Please try again.")]
    OtpDeliveryFailed,

    #[error("Database connection failed. Please check your internet connection and try again.")]
    ConnectionFailed,

    #[error("This email is already registered for the hackathon.")]
    AlreadyRegistered,

    #[error("This team name is already taken. Please choose another.")]
    TeamNameTaken,

    #[error("A registration with these details already exists.")]
    Duplicate,

    #[error("Permission denied. Please contact support.")]
    PermissionDenied,

    #[error("Table does not exist. Please contact support.")]
    MissingTable,

    #[error("Database error ({code}: {message})")]
    Database { code: String, message: String },
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistrationError::Validation(_)
            | RegistrationError::InvalidOtp
            | RegistrationError::OtpExpired => StatusCode::UNPROCESSABLE_ENTITY,
            RegistrationError::AlreadyRegistered
            | RegistrationError::TeamNameTaken
            | RegistrationError::Duplicate => StatusCode::CONFLICT,
            RegistrationError::OtpDeliveryFailed | RegistrationError::ConnectionFailed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            RegistrationError::PermissionDenied
            | RegistrationError::MissingTable
            | RegistrationError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OtpError> for RegistrationError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::Expired => RegistrationError::OtpExpired,
            OtpError::NotIssued | OtpError::Mismatch => RegistrationError::InvalidOtp,
        }
    }
}

/// Maps a backend failure on insert to the message the team lead sees.
///
/// Understands both Postgres SQLSTATEs and SQLite result codes/messages.
pub fn classify_insert_error(code: Option<&str>, message: &str) -> RegistrationError {
    let lower = message.to_lowercase();
    let unique = matches!(code, Some("23505") | Some("2067") | Some("1555"))
        || lower.contains("unique constraint")
        || lower.contains("duplicate key");

    if unique {
        if lower.contains("team_lead_email") {
            return RegistrationError::AlreadyRegistered;
        }
        if lower.contains("team_name") {
            return RegistrationError::TeamNameTaken;
        }
        return RegistrationError::Duplicate;
    }

    // 8 = SQLITE_READONLY, 23 = SQLITE_AUTH
    let denied = matches!(code, Some("42501") | Some("8") | Some("23"));
    if denied || lower.contains("permission denied") {
        return RegistrationError::PermissionDenied;
    }
    let missing_relation = lower.starts_with("relation ") && lower.contains("does not exist");
    if code == Some("42P01") || lower.contains("no such table") || missing_relation {
        return RegistrationError::MissingTable;
    }

    RegistrationError::Database {
        code: code.unwrap_or("Unknown").to_string(),
        message: if message.is_empty() {
            "Unknown error".to_string()
        } else {
            message.to_string()
        },
    }
}

fn from_insert_error(err: sqlx::Error) -> RegistrationError {
    match err.as_database_error() {
        Some(db_err) => {
            let code = db_err.code();
            classify_insert_error(code.as_deref(), db_err.message())
        }
        None => {
            warn!("Insert failed before reaching the database: {}", err);
            RegistrationError::ConnectionFailed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A code went out; the form is shown again with the code field.
    CodeSent,
    Registered {
        registration_id: String,
        confirmation_sent: bool,
    },
}

/// Runs one submit of the registration form through validation, the code gate and persistence.
pub async fn submit_registration(
    pool: &SqlitePool,
    otp: &OtpStore,
    notifier: &Notifier,
    form: &RegistrationForm,
    registered_by: &str,
) -> Result<SubmitOutcome, RegistrationError> {
    let valid = validation_service::validate_registration(form)?;
    let now = Utc::now();
    let email = valid.team_lead_email.as_str();

    if form.action == "resend" {
        send_code(otp, notifier, &valid).await?;
        return Ok(SubmitOutcome::CodeSent);
    }

    // A typed code is checked even when its challenge has lapsed, so expiry is reported.
    let has_code = !form.otp.trim().is_empty();
    if !has_code && otp.stage(email, now) == RegistrationStage::Collecting {
        send_code(otp, notifier, &valid).await?;
        return Ok(SubmitOutcome::CodeSent);
    }
    match otp.verify(email, &form.otp, now) {
        Ok(_) => {}
        Err(OtpError::NotIssued) if has_code => {
            send_code(otp, notifier, &valid).await?;
            return Ok(SubmitOutcome::CodeSent);
        }
        Err(e) => return Err(e.into()),
    }

    let registration_id = persist_registration(pool, &valid, registered_by, now).await?;
    otp.discard(&valid.team_lead_email);
    info!(registration_id = %registration_id, team_name = %valid.team_name, "registration stored");

    let notice = ConfirmationNotice {
        registration_id: registration_id.clone(),
        team_name: valid.team_name.clone(),
        team_lead_name: valid.team_lead_name.clone(),
        team_lead_email: valid.team_lead_email.clone(),
        college_name: valid.college_name.clone(),
        participant_count: valid.team_size(),
    };
    let confirmation_sent = match notifier.send_confirmation(&notice).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Confirmation for {} not sent: {}", registration_id, e);
            false
        }
    };

    Ok(SubmitOutcome::Registered {
        registration_id,
        confirmation_sent,
    })
}

/// Issues (or re-issues) a code for the lead email and hands it to the notifier.
pub async fn send_code(
    otp: &OtpStore,
    notifier: &Notifier,
    valid: &ValidRegistration,
) -> Result<(), RegistrationError> {
    let code = otp.issue(&valid.team_lead_email);
    if let Err(e) = notifier
        .send_otp(&valid.team_lead_email, &valid.team_lead_phone, &code)
        .await
    {
        warn!("OTP delivery to {} failed: {}", valid.team_lead_email, e);
        otp.discard(&valid.team_lead_email);
        return Err(RegistrationError::OtpDeliveryFailed);
    }
    Ok(())
}

/// Probe, then a single insert. Uniqueness is left to the table constraints.
pub async fn persist_registration(
    pool: &SqlitePool,
    valid: &ValidRegistration,
    registered_by: &str,
    now: DateTime<Utc>,
) -> Result<String, RegistrationError> {
    if let Err(e) = registrations_repo::ping(pool).await {
        warn!("Connectivity probe failed: {}", e);
        return Err(RegistrationError::ConnectionFailed);
    }

    let participants_json = serde_json::to_string(&valid.participants).map_err(|e| {
        RegistrationError::Database {
            code: "serialize".to_string(),
            message: e.to_string(),
        }
    })?;
    let id = Uuid::new_v4().to_string();
    let created_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let registered_by = registered_by.trim().to_lowercase();

    registrations_repo::insert_registration(
        pool,
        registrations_repo::NewTeamRegistration {
            id: &id,
            team_name: &valid.team_name,
            team_lead_name: &valid.team_lead_name,
            team_lead_email: &valid.team_lead_email,
            team_lead_phone: &valid.team_lead_phone,
            college_name: &valid.college_name,
            participant_count: valid.team_size(),
            participants_json: &participants_json,
            registered_by: Some(&registered_by).filter(|s| !s.is_empty()).map(|s| s.as_str()),
            created_at: &created_at,
        },
    )
    .await
    .map_err(from_insert_error)
}

pub struct RegistrationSuccessView {
    pub registration_id: String,
    pub team_name: String,
    pub team_lead_name: String,
    pub team_lead_email: String,
    pub team_lead_phone: String,
    pub college_name: String,
    pub participant_count: i64,
    pub participants: Vec<Participant>,
    pub registered_at: String,
}

/// Loads a just-created registration for its submitter. Someone else's id reads as missing.
pub async fn load_success_view(
    pool: &SqlitePool,
    registration_id: &str,
    viewer_email: &str,
) -> sqlx::Result<Option<RegistrationSuccessView>> {
    let Some(row) = registrations_repo::load_registration(pool, registration_id).await? else {
        return Ok(None);
    };
    if !owned_by(&row, viewer_email) {
        return Ok(None);
    }

    let participants = participants_service::canonical_participants(row.participants.as_deref());
    Ok(Some(RegistrationSuccessView {
        registration_id: row.id,
        team_name: row.team_name,
        team_lead_name: row.team_lead_name,
        team_lead_email: row.team_lead_email,
        team_lead_phone: row.team_lead_phone,
        college_name: row.college_name,
        participant_count: row.participant_count,
        participants,
        registered_at: row.created_at,
    }))
}

fn owned_by(row: &TeamRegistrationRow, viewer_email: &str) -> bool {
    let viewer = viewer_email.trim().to_lowercase();
    match row.registered_by.as_deref() {
        Some(owner) => owner == viewer,
        None => row.team_lead_email.eq_ignore_ascii_case(&viewer),
    }
}
