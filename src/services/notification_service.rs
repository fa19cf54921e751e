use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::NotifierSettings;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("email relay unreachable: {0}")]
    Connect(#[from] reqwest::Error),
    #[error("email relay returned {0}")]
    Status(u16),
    #[error("email relay misconfigured: {0}")]
    Misconfigured(String),
}

/// Summary of a stored registration, sent to the organizers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationNotice {
    pub registration_id: String,
    pub team_name: String,
    pub team_lead_name: String,
    pub team_lead_email: String,
    pub college_name: String,
    pub participant_count: i64,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    to: &'a str,
    subject: String,
    html: String,
}

pub enum Notifier {
    /// Acknowledges and logs; nothing leaves the process.
    Log,
    Relay {
        client: reqwest::Client,
        url: String,
        api_key: String,
        destination: String,
    },
}

impl Notifier {
    pub fn from_settings(settings: &NotifierSettings) -> Self {
        match settings.kind.trim().to_lowercase().as_str() {
            "relay" => match (&settings.relay_url, &settings.relay_api_key) {
                (Some(url), Some(api_key)) => Notifier::Relay {
                    client: reqwest::Client::new(),
                    url: url.clone(),
                    api_key: api_key.clone(),
                    destination: settings.contact_email.clone(),
                },
                _ => {
                    warn!(
                        "NOTIFIER=relay without EMAIL_RELAY_URL/EMAIL_RELAY_API_KEY, \
                         falling back to log"
                    );
                    Notifier::Log
                }
            },
            "log" => Notifier::Log,
            other => {
                warn!("Unknown NOTIFIER '{}', falling back to log", other);
                Notifier::Log
            }
        }
    }

    pub fn is_relay(&self) -> bool {
        matches!(self, Notifier::Relay { .. })
    }

    pub async fn send_otp(&self, email: &str, phone: &str, code: &str) -> Result<(), NotifyError> {
        match self {
            Notifier::Log => {
                info!(email = %email, phone = %phone, otp = %code, "otp issued (log notifier)");
                Ok(())
            }
            Notifier::Relay { .. } => {
                let message = RelayMessage {
                    to: email,
                    subject: "Ezhumi Hackathon - OTP Verification".to_string(),
                    html: otp_html(code),
                };
                self.post(&message).await
            }
        }
    }

    pub async fn send_confirmation(&self, notice: &ConfirmationNotice) -> Result<(), NotifyError> {
        match self {
            Notifier::Log => {
                info!(
                    registration_id = %notice.registration_id,
                    team_name = %notice.team_name,
                    team_lead_email = %notice.team_lead_email,
                    college_name = %notice.college_name,
                    participant_count = notice.participant_count,
                    "registration received (log notifier)"
                );
                Ok(())
            }
            Notifier::Relay { destination, .. } => {
                let message = RelayMessage {
                    to: destination,
                    subject: format!("New team registration: {}", notice.team_name),
                    html: confirmation_html(notice),
                };
                self.post(&message).await
            }
        }
    }

    async fn post(&self, message: &RelayMessage<'_>) -> Result<(), NotifyError> {
        let Notifier::Relay {
            client,
            url,
            api_key,
            ..
        } = self
        else {
            return Ok(());
        };

        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| NotifyError::Misconfigured(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = client.post(url).headers(headers).json(message).send().await?;
        if !resp.status().is_success() {
            warn!("Email relay non-OK: {}", resp.status());
            return Err(NotifyError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}

fn otp_html(code: &str) -> String {
    format!(
        "<h2>OTP Verification</h2>\
         <p>Your verification code is: <strong>{}</strong></p>\
         <p>This code is valid for 5 minutes.</p>",
        code
    )
}

fn confirmation_html(notice: &ConfirmationNotice) -> String {
    format!(
        "<h2>New registration</h2>\
         <table>\
         <tr><td>Registration ID</td><td>{}</td></tr>\
         <tr><td>Team</td><td>{}</td></tr>\
         <tr><td>Team lead</td><td>{} &lt;{}&gt;</td></tr>\
         <tr><td>College</td><td>{}</td></tr>\
         <tr><td>Members</td><td>{}</td></tr>\
         </table>",
        escape_html(&notice.registration_id),
        escape_html(&notice.team_name),
        escape_html(&notice.team_lead_name),
        escape_html(&notice.team_lead_email),
        escape_html(&notice.college_name),
        notice.participant_count
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: &str, url: Option<&str>) -> NotifierSettings {
        NotifierSettings {
            kind: kind.to_string(),
            relay_url: url.map(str::to_string),
            relay_api_key: url.map(|_| "key".to_string()),
            contact_email: "hello@ezhumi.com".to_string(),
        }
    }

    #[test]
    fn relay_needs_url_and_key() {
        let relay = settings("relay", Some("http://relay.local/send"));
        assert!(Notifier::from_settings(&relay).is_relay());
        assert!(!Notifier::from_settings(&settings("relay", None)).is_relay());
        assert!(!Notifier::from_settings(&settings("carrier-pigeon", None)).is_relay());
    }

    #[tokio::test]
    async fn log_notifier_always_acknowledges() {
        let notifier = Notifier::Log;
        notifier.send_otp("a@b.co", "9876543210", "482913").await.unwrap();
        notifier
            .send_confirmation(&ConfirmationNotice {
                registration_id: "r1".into(),
                team_name: "Green Sprout".into(),
                team_lead_name: "Anu".into(),
                team_lead_email: "a@b.co".into(),
                college_name: "REC".into(),
                participant_count: 2,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unreachable_relay_is_an_error() {
        let notifier = Notifier::from_settings(&settings("relay", Some("http://127.0.0.1:9/send")));
        let err = notifier.send_otp("a@b.co", "9876543210", "482913").await.unwrap_err();
        assert!(matches!(err, NotifyError::Connect(_)));
    }

    #[test]
    fn confirmation_html_escapes_team_name() {
        let html = confirmation_html(&ConfirmationNotice {
            registration_id: "r1".into(),
            team_name: "<script>".into(),
            team_lead_name: "Anu".into(),
            team_lead_email: "a@b.co".into(),
            college_name: "REC".into(),
            participant_count: 1,
        });
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
