use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::identity_service::IdentityProvider;
use crate::services::notification_service::Notifier;
use crate::services::otp_service::OtpStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub otp: Arc<OtpStore>,
    pub notifier: Arc<Notifier>,
    pub identity: Arc<IdentityProvider>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let otp = OtpStore::new(config.otp_ttl_secs);
        let notifier = Notifier::from_settings(&config.notifier);
        let identity = IdentityProvider::new(&config.auth);
        Self {
            pool,
            config: Arc::new(config),
            otp: Arc::new(otp),
            notifier: Arc::new(notifier),
            identity: Arc::new(identity),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
