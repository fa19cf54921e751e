use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use ezhumi_portal::config::Config;
use ezhumi_portal::database;
use ezhumi_portal::state::AppState;
use ezhumi_portal::web;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Logging
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // 2. Config + database
    let config = Config::load();
    info!("Connecting to database: {}", config.database_url);
    let pool = database::connect(&config.database_url)
        .await
        .expect("Cannot connect to database");

    if config.admin_emails.is_empty() {
        warn!("ADMIN_EMAILS is empty, nobody can open the dashboard");
    } else {
        info!("{} admin account(s) configured", config.admin_emails.len());
    }

    let host = config.host.clone();
    let port = config.port;
    let state = AppState::new(pool, config);
    if state.notifier.is_relay() {
        info!("Notifications go through the email relay");
    } else {
        warn!("NOTIFIER=log: verification codes are only written to the log");
    }
    let app = web::app(state);

    // 3. Bind (with fallback port)
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!(
                "Cannot bind {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Cannot bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().expect("Listener has no local address");
    println!("🚀 Ezhumi portal running on http://{}", bound_addr);
    println!("📍 Register at http://{}/register", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
