use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::registrations_repo;
use crate::services::participants_service;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub candidates: usize,
    pub rewritten: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Canonical participants text and team size for a stored column value.
pub fn canonicalize_column(column: Option<&str>) -> Result<(String, i64), serde_json::Error> {
    let participants = participants_service::canonical_participants(column);
    let json = serde_json::to_string(&participants)?;
    Ok((json, participants.len() as i64 + 1))
}

/// Rewrites every legacy `participants` value into the canonical shape.
///
/// With `dry_run` the rows are only counted.
pub async fn migrate_participants(
    pool: &SqlitePool,
    dry_run: bool,
) -> sqlx::Result<MigrationReport> {
    let rows = registrations_repo::list_registrations(pool).await?;
    let mut report = MigrationReport {
        candidates: rows.len(),
        ..MigrationReport::default()
    };

    for row in rows {
        let (json, count) = match canonicalize_column(row.participants.as_deref()) {
            Ok(v) => v,
            Err(e) => {
                warn!(registration_id = %row.id, "cannot serialize participants: {}", e);
                report.failed += 1;
                continue;
            }
        };

        if row.participants.as_deref() == Some(json.as_str()) && row.participant_count == count {
            report.unchanged += 1;
            continue;
        }

        if dry_run {
            info!(
                registration_id = %row.id,
                participant_count = count,
                "would rewrite participants"
            );
            report.rewritten += 1;
            continue;
        }

        match registrations_repo::update_participants(pool, &row.id, &json, count).await {
            Ok(1) => report.rewritten += 1,
            Ok(n) => {
                warn!(registration_id = %row.id, "update touched {} rows", n);
                report.failed += 1;
            }
            Err(e) => {
                warn!(registration_id = %row.id, "update failed: {}", e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
