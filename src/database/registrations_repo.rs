use sqlx::SqlitePool;

use crate::models::TeamRegistrationRow;

pub const SQL_PING: &str = "SELECT 1";

const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO team_registrations (
  id,
  team_name,
  team_lead_name,
  team_lead_email,
  team_lead_phone,
  college_name,
  participant_count,
  participants,
  registered_by,
  created_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
RETURNING id
"#;

pub const SQL_LIST_REGISTRATIONS: &str = r#"
SELECT
    id,
    team_name,
    team_lead_name,
    team_lead_email,
    team_lead_phone,
    college_name,
    participant_count,
    participants,
    registered_by,
    created_at
FROM team_registrations
ORDER BY created_at DESC
"#;

pub const SQL_LOAD_REGISTRATION: &str = r#"
SELECT
    id,
    team_name,
    team_lead_name,
    team_lead_email,
    team_lead_phone,
    college_name,
    participant_count,
    participants,
    registered_by,
    created_at
FROM team_registrations
WHERE id = ?1
LIMIT 1
"#;

const SQL_UPDATE_PARTICIPANTS: &str = r#"
UPDATE team_registrations
SET participants = ?2,
    participant_count = ?3
WHERE id = ?1
"#;

pub struct NewTeamRegistration<'a> {
    pub id: &'a str,
    pub team_name: &'a str,
    pub team_lead_name: &'a str,
    pub team_lead_email: &'a str,
    pub team_lead_phone: &'a str,
    pub college_name: &'a str,
    pub participant_count: i64,
    pub participants_json: &'a str,
    pub registered_by: Option<&'a str>,
    pub created_at: &'a str,
}

/// Cheapest round trip to the store; used before any write.
pub async fn ping(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(SQL_PING).execute(pool).await?;
    Ok(())
}

pub async fn insert_registration(
    pool: &SqlitePool,
    reg: NewTeamRegistration<'_>,
) -> sqlx::Result<String> {
    let (id,): (String,) = sqlx::query_as(SQL_INSERT_REGISTRATION)
        .bind(reg.id)
        .bind(reg.team_name)
        .bind(reg.team_lead_name)
        .bind(reg.team_lead_email)
        .bind(reg.team_lead_phone)
        .bind(reg.college_name)
        .bind(reg.participant_count)
        .bind(reg.participants_json)
        .bind(reg.registered_by)
        .bind(reg.created_at)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

pub async fn list_registrations(pool: &SqlitePool) -> sqlx::Result<Vec<TeamRegistrationRow>> {
    sqlx::query_as::<_, TeamRegistrationRow>(SQL_LIST_REGISTRATIONS)
        .fetch_all(pool)
        .await
}

pub async fn load_registration(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<TeamRegistrationRow>> {
    sqlx::query_as::<_, TeamRegistrationRow>(SQL_LOAD_REGISTRATION)
        .bind(registration_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_participants(
    pool: &SqlitePool,
    registration_id: &str,
    participants_json: &str,
    participant_count: i64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_PARTICIPANTS)
        .bind(registration_id)
        .bind(participants_json)
        .bind(participant_count)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn sample<'a>(
        id: &'a str,
        team: &'a str,
        email: &'a str,
        created_at: &'a str,
    ) -> NewTeamRegistration<'a> {
        NewTeamRegistration {
            id,
            team_name: team,
            team_lead_name: "Lead",
            team_lead_email: email,
            team_lead_phone: "9876543210",
            college_name: "REC",
            participant_count: 1,
            participants_json: "[]",
            registered_by: Some(email),
            created_at,
        }
    }

    #[tokio::test]
    async fn insert_returns_id_and_lists_newest_first() {
        let pool = database::connect_in_memory().await.unwrap();
        ping(&pool).await.unwrap();

        let first = insert_registration(
            &pool,
            sample("r1", "Alpha", "a@b.co", "2024-01-01T10:00:00Z"),
        )
        .await
        .unwrap();
        insert_registration(&pool, sample("r2", "Beta", "c@d.co", "2024-01-05T10:00:00Z"))
            .await
            .unwrap();
        assert_eq!(first, "r1");

        let rows = list_registrations(&pool).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1"]);

        let loaded = load_registration(&pool, "r1").await.unwrap().unwrap();
        assert_eq!(loaded.team_name, "Alpha");
        assert!(load_registration(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_lead_email_is_enforced_by_the_table() {
        let pool = database::connect_in_memory().await.unwrap();
        insert_registration(&pool, sample("r1", "Alpha", "a@b.co", "2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        let err = insert_registration(&pool, sample("r2", "Beta", "a@b.co", "2024-01-02T10:00:00Z"))
            .await
            .unwrap_err();
        let db_err = err.as_database_error().unwrap();
        assert!(db_err.is_unique_violation());
        assert!(db_err.message().contains("team_lead_email"));
        assert_eq!(list_registrations(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_participants_rewrites_column() {
        let pool = database::connect_in_memory().await.unwrap();
        insert_registration(&pool, sample("r1", "Alpha", "a@b.co", "2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        let n = update_participants(&pool, "r1", r#"[{"name":"X","contact":"","email":""}]"#, 2)
            .await
            .unwrap();
        assert_eq!(n, 1);
        let row = load_registration(&pool, "r1").await.unwrap().unwrap();
        assert_eq!(row.participant_count, 2);
        assert!(row.participants.unwrap().contains("\"X\""));
    }
}
