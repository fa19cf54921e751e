use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::models::Participant;

pub const MAX_EXTRA_PARTICIPANTS: usize = 3;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]?[0-9\s()-]{10,}$").expect("phone pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Raw registration form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub team_name: String,
    pub college_name: String,
    pub team_lead_name: String,
    pub team_lead_phone: String,
    pub team_lead_email: String,
    pub participant_count: String,
    pub participant_1_name: String,
    pub participant_1_contact: String,
    pub participant_1_email: String,
    pub participant_2_name: String,
    pub participant_2_contact: String,
    pub participant_2_email: String,
    pub participant_3_name: String,
    pub participant_3_contact: String,
    pub participant_3_email: String,
    pub otp: String,
    pub action: String, // submit|resend
}

impl RegistrationForm {
    /// `(name, contact, email)` for each of the three participant slots.
    pub fn participant_slots(&self) -> [(&str, &str, &str); MAX_EXTRA_PARTICIPANTS] {
        [
            (
                self.participant_1_name.as_str(),
                self.participant_1_contact.as_str(),
                self.participant_1_email.as_str(),
            ),
            (
                self.participant_2_name.as_str(),
                self.participant_2_contact.as_str(),
                self.participant_2_email.as_str(),
            ),
            (
                self.participant_3_name.as_str(),
                self.participant_3_contact.as_str(),
                self.participant_3_email.as_str(),
            ),
        ]
    }

    /// Declared number of extra members, if it parses at all.
    pub fn declared_participants(&self) -> Option<usize> {
        let raw = self.participant_count.trim();
        if raw.is_empty() {
            return Some(0);
        }
        raw.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub team_name: String,
    pub college_name: String,
    pub team_lead_name: String,
    pub team_lead_phone: String,
    pub team_lead_email: String,
    pub participants: Vec<Participant>,
}

impl ValidRegistration {
    /// Team lead included.
    pub fn team_size(&self) -> i64 {
        self.participants.len() as i64 + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields.")]
    MissingRequired,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter a valid phone number.")]
    InvalidPhone,
    #[error("Participant count must be between 0 and 3.")]
    InvalidParticipantCount,
    #[error("Please fill in all fields for participant {0}.")]
    ParticipantFieldsRequired(usize),
    #[error("Please enter a valid email for participant {0}.")]
    ParticipantInvalidEmail(usize),
    #[error("Please enter a valid phone number for participant {0}.")]
    ParticipantInvalidPhone(usize),
}

/// Checks the whole form before anything touches the network. First failure wins.
pub fn validate_registration(
    form: &RegistrationForm,
) -> Result<ValidRegistration, ValidationError> {
    let team_name = form.team_name.trim();
    let college_name = form.college_name.trim();
    let lead_name = form.team_lead_name.trim();
    let lead_phone = form.team_lead_phone.trim();
    let lead_email = form.team_lead_email.trim();

    if [team_name, college_name, lead_name, lead_phone, lead_email]
        .iter()
        .any(|s| s.is_empty())
    {
        return Err(ValidationError::MissingRequired);
    }
    if !is_valid_email(lead_email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !is_valid_phone(lead_phone) {
        return Err(ValidationError::InvalidPhone);
    }

    let declared = form
        .declared_participants()
        .filter(|n| *n <= MAX_EXTRA_PARTICIPANTS)
        .ok_or(ValidationError::InvalidParticipantCount)?;

    let mut participants = Vec::with_capacity(declared);
    let slots = form.participant_slots().into_iter().take(declared);
    for (idx, (name, contact, email)) in slots.enumerate() {
        let number = idx + 1;
        let (name, contact, email) = (name.trim(), contact.trim(), email.trim());
        if name.is_empty() || contact.is_empty() || email.is_empty() {
            return Err(ValidationError::ParticipantFieldsRequired(number));
        }
        if !is_valid_email(email) {
            return Err(ValidationError::ParticipantInvalidEmail(number));
        }
        if !is_valid_phone(contact) {
            return Err(ValidationError::ParticipantInvalidPhone(number));
        }
        participants.push(Participant {
            name: name.to_string(),
            contact: contact.to_string(),
            email: email.to_string(),
        });
    }

    Ok(ValidRegistration {
        team_name: team_name.to_string(),
        college_name: college_name.to_string(),
        team_lead_name: lead_name.to_string(),
        team_lead_phone: lead_phone.to_string(),
        team_lead_email: lead_email.to_lowercase(),
        participants,
    })
}
