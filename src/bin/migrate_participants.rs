use dotenvy::dotenv;
use std::env;
use tracing_subscriber::{fmt, EnvFilter};

use ezhumi_portal::database;
use ezhumi_portal::services::migration_service;

#[tokio::main]
async fn main() {
    dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = database::connect(&db_url)
        .await
        .expect("Cannot connect to database");

    let dry_run = env::var("MIGRATE_DRY_RUN")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    match migration_service::migrate_participants(&pool, dry_run).await {
        Ok(report) => {
            println!(
                "participants migration{}: candidates={}, rewritten={}, unchanged={}, failed={}",
                if dry_run { " (dry run)" } else { "" },
                report.candidates,
                report.rewritten,
                report.unchanged,
                report.failed
            );
        }
        Err(e) => {
            eprintln!("participants migration failed: {}", e);
            std::process::exit(1);
        }
    }
}
