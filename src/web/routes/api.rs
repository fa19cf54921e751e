use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::database::registrations_repo;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendOtpBody {
    email: String,
    phone: String,
    otp: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmationBody {
    team_name: String,
    team_lead_name: String,
    team_lead_email: String,
    college_name: String,
    participant_count: Option<i64>,
    registration_id: Option<String>,
}

/// Acknowledges an OTP hand-off. The code itself is never logged or echoed.
pub async fn send_otp_handler(Json(body): Json<SendOtpBody>) -> Result<Json<Value>, AppError> {
    if body.email.trim().is_empty() || body.phone.trim().is_empty() || body.otp.trim().is_empty() {
        return Err(AppError::MalformedPayload(
            "Email, phone, and OTP are required".to_string(),
        ));
    }

    info!(email = %body.email.trim(), phone = %body.phone.trim(), "otp send request received");
    Ok(Json(json!({
        "success": true,
        "message": "OTP sent successfully",
    })))
}

pub async fn send_confirmation_email_handler(Json(body): Json<ConfirmationBody>) -> Json<Value> {
    info!(
        team_name = %body.team_name,
        team_lead_name = %body.team_lead_name,
        team_lead_email = %body.team_lead_email,
        college_name = %body.college_name,
        participant_count = ?body.participant_count,
        registration_id = ?body.registration_id,
        "registration data received"
    );

    Json(json!({
        "success": true,
        "message": "Registration completed successfully",
        "registrationId": body.registration_id,
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match registrations_repo::ping(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            warn!("Health probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "db_unreachable" })),
            )
        }
    }
}
