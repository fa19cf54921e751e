use serde_json::Value;
use tracing::warn;

use crate::models::Participant;

pub const NOT_AVAILABLE: &str = "N/A";

const NAME_KEYS: &[&str] = &["name", "participant_name", "memberName"];
const EMAIL_KEYS: &[&str] = &["email", "participant_email", "memberEmail"];
const PHONE_KEYS: &[&str] = &["phone", "participant_phone", "memberPhone", "contact"];

/// Participant as shown on the dashboard and in exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Turns whatever is stored in `participants` into a list of raw entries.
///
/// Accepts a JSON-encoded string, an array, or an object keyed by index.
/// Anything else (or a string that does not parse) yields an empty list.
pub fn normalize_participants(raw: &Value) -> Vec<Value> {
    match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
            Ok(_) => vec![],
            Err(e) => {
                warn!("Failed to parse participants field: {}", e);
                vec![]
            }
        },
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        _ => vec![],
    }
}

/// Decodes the TEXT column into a JSON value for [`normalize_participants`].
///
/// Text that is not JSON at all is kept as a string so the normalizer logs it.
pub fn decode_participants_column(raw: Option<&str>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn is_valid_participant(entry: &Value) -> bool {
    first_present(entry, NAME_KEYS).is_some()
        || first_present(entry, EMAIL_KEYS).is_some()
        || first_present(entry, PHONE_KEYS).is_some()
}

pub fn to_view(entry: &Value) -> ParticipantView {
    ParticipantView {
        name: first_present(entry, NAME_KEYS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        email: first_present(entry, EMAIL_KEYS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        phone: first_present(entry, PHONE_KEYS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

/// Valid participants of a stored row, in display shape.
pub fn participant_views(column: Option<&str>) -> Vec<ParticipantView> {
    normalize_participants(&decode_participants_column(column))
        .iter()
        .filter(|p| is_valid_participant(p))
        .map(to_view)
        .collect()
}

/// Valid participants of a stored row, in the shape new rows are written with.
pub fn canonical_participants(column: Option<&str>) -> Vec<Participant> {
    normalize_participants(&decode_participants_column(column))
        .iter()
        .filter(|p| is_valid_participant(p))
        .map(|entry| Participant {
            name: first_present(entry, NAME_KEYS).unwrap_or_default(),
            contact: first_present(entry, PHONE_KEYS).unwrap_or_default(),
            email: first_present(entry, EMAIL_KEYS).unwrap_or_default(),
        })
        .collect()
}

// First alias holding a non-empty string or a non-zero number.
fn first_present(entry: &Value, keys: &[&str]) -> Option<String> {
    let obj = entry.as_object()?;
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}
