use std::{collections::BTreeSet, env, fmt::Display, str::FromStr};

use chrono::{FixedOffset, Offset, Utc};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Externally reachable base URL, used for OAuth redirects.
    pub public_url: String,
    pub auth: AuthSettings,
    pub admin_emails: AdminAllowList,
    pub otp_ttl_secs: i64,
    /// Offset used whenever the dashboard talks about "today" or a calendar date.
    pub event_offset: FixedOffset,
    pub notifier: NotifierSettings,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub url: String,
    pub api_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub kind: String, // log|relay
    pub relay_url: Option<String>,
    pub relay_api_key: Option<String>,
    pub contact_email: String,
}

impl Config {
    pub fn load() -> Self {
        let offset_minutes: i32 = try_load("EVENT_UTC_OFFSET_MINUTES", "330");

        Self {
            host: try_load("HOST", "127.0.0.1"),
            port: try_load("PORT", "3000"),
            database_url: require("DATABASE_URL"),
            public_url: try_load("PUBLIC_URL", "http://127.0.0.1:3000"),
            auth: AuthSettings {
                url: try_load("AUTH_URL", "http://auth.localhost:8080/auth/v1"),
                api_key: var("AUTH_API_KEY").unwrap_or_default(),
                jwt_secret: require("AUTH_JWT_SECRET"),
            },
            admin_emails: AdminAllowList::parse(&var("ADMIN_EMAILS").unwrap_or_default()),
            otp_ttl_secs: try_load("OTP_TTL_SECS", "300"),
            event_offset: offset_from_minutes(offset_minutes),
            notifier: NotifierSettings {
                kind: try_load("NOTIFIER", "log"),
                relay_url: var("EMAIL_RELAY_URL").ok(),
                relay_api_key: var("EMAIL_RELAY_API_KEY").ok(),
                contact_email: try_load("CONTACT_EMAIL", "hello@ezhumi.com"),
            },
            cookie_secure: try_load("COOKIE_SECURE", "false"),
        }
    }

    /// Defaults for a server running on this machine with the log notifier.
    pub fn local(database_url: &str, jwt_secret: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: database_url.to_string(),
            public_url: "http://127.0.0.1:3000".to_string(),
            auth: AuthSettings {
                url: "http://auth.localhost:8080/auth/v1".to_string(),
                api_key: String::new(),
                jwt_secret: jwt_secret.to_string(),
            },
            admin_emails: AdminAllowList::default(),
            otp_ttl_secs: 300,
            event_offset: offset_from_minutes(330),
            notifier: NotifierSettings {
                kind: "log".to_string(),
                relay_url: None,
                relay_api_key: None,
                contact_email: "hello@ezhumi.com".to_string(),
            },
            cookie_secure: false,
        }
    }
}

/// Email addresses allowed into the admin dashboard, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: BTreeSet<String>,
}

impl AdminAllowList {
    pub fn parse(raw: &str) -> Self {
        let emails = raw
            .split([',', ';', '\n'])
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { emails }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| {
        warn!("EVENT_UTC_OFFSET_MINUTES={minutes} out of range, using UTC");
        Utc.fix()
    })
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn require(key: &str) -> String {
    env::var(key)
        .map_err(|_| {
            warn!("Required environment variable {key} is missing");
        })
        .expect("Environment misconfigured!")
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_case_insensitive() {
        let list = AdminAllowList::parse(" Office.EDC@rajalakshmi.edu.in, 2218@REC.edu.in ,,");
        assert_eq!(list.len(), 2);
        assert!(list.contains("office.edc@rajalakshmi.edu.in"));
        assert!(list.contains("2218@rec.EDU.in"));
        assert!(!list.contains("someone@else.com"));
    }

    #[test]
    fn empty_allow_list_admits_nobody() {
        let list = AdminAllowList::parse("");
        assert!(list.is_empty());
        assert!(!list.contains(""));
    }

    #[test]
    fn local_config_uses_india_offset() {
        let config = Config::local("sqlite::memory:", "secret");
        assert_eq!(config.event_offset.local_minus_utc(), 330 * 60);
        assert_eq!(config.notifier.kind, "log");
    }
}
