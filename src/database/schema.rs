use sqlx::SqlitePool;

pub const SQL_CREATE_TEAM_REGISTRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS team_registrations (
    id TEXT PRIMARY KEY NOT NULL,
    team_name TEXT NOT NULL,
    team_lead_name TEXT NOT NULL,
    team_lead_email TEXT NOT NULL,
    team_lead_phone TEXT NOT NULL,
    college_name TEXT NOT NULL,
    participant_count INTEGER NOT NULL DEFAULT 1,
    participants TEXT NOT NULL DEFAULT '[]',
    registered_by TEXT,
    created_at TEXT NOT NULL,
    CONSTRAINT unique_team_name UNIQUE (team_name),
    CONSTRAINT unique_team_lead_email UNIQUE (team_lead_email)
)
"#;

pub const SQL_CREATE_CREATED_AT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_team_registrations_created_at
ON team_registrations (created_at)
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(SQL_CREATE_TEAM_REGISTRATIONS)
        .execute(pool)
        .await?;
    sqlx::query(SQL_CREATE_CREATED_AT_INDEX)
        .execute(pool)
        .await?;
    Ok(())
}
