use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::registrations_repo;
use crate::models::TeamRegistrationRow;
use crate::services::participants_service::{self, ParticipantView, NOT_AVAILABLE};

/// Dashboard query string. Everything is optional and parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub q: Option<String>,
    pub college: Option<String>,
    pub min_size: Option<String>,
    pub max_size: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFilter {
    pub search: Option<String>,
    pub college: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn non_empty(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl DashboardFilter {
    pub fn from_query(query: &DashboardQuery) -> Self {
        Self {
            search: non_empty(&query.q).map(|s| s.to_lowercase()),
            college: non_empty(&query.college).map(|s| s.to_lowercase()),
            min_size: non_empty(&query.min_size).and_then(|s| s.parse().ok()),
            max_size: non_empty(&query.max_size).and_then(|s| s.parse().ok()),
            date_from: non_empty(&query.date_from)
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            date_to: non_empty(&query.date_to)
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        }
    }

    pub fn is_active(&self) -> bool {
        *self != DashboardFilter::default()
    }

    pub fn matches(&self, reg: &RegistrationView) -> bool {
        if let Some(search) = &self.search {
            let hit = reg.team_name.to_lowercase().contains(search)
                || reg.team_lead_name.to_lowercase().contains(search)
                || reg.college_name.to_lowercase().contains(search);
            if !hit {
                return false;
            }
        }
        if let Some(college) = &self.college {
            if !reg.college_name.to_lowercase().contains(college) {
                return false;
            }
        }
        if self.min_size.is_some_and(|min| reg.team_size < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| reg.team_size > max) {
            return false;
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(created) = reg.created_date else {
                return false;
            };
            if self.date_from.is_some_and(|from| created < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| created > to) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationView {
    pub id: String,
    pub short_id: String,
    pub team_name: String,
    pub team_lead_name: String,
    pub team_lead_email: String,
    pub team_lead_phone: String,
    pub college_name: String,
    pub participants: Vec<ParticipantView>,
    /// Valid participants plus the lead.
    pub team_size: i64,
    pub created_at: String,
    pub created_label: String,
    pub created_date: Option<NaiveDate>,
}

impl RegistrationView {
    pub fn from_row(row: TeamRegistrationRow, offset: &FixedOffset) -> Self {
        let participants = participants_service::participant_views(row.participants.as_deref());
        let team_size = participants.len() as i64 + 1;
        let created = parse_created_at(&row.created_at).map(|dt| dt.with_timezone(offset));

        Self {
            short_id: row.id.chars().take(8).collect(),
            id: row.id,
            team_name: row.team_name,
            team_lead_name: row.team_lead_name,
            team_lead_email: row.team_lead_email,
            team_lead_phone: row.team_lead_phone,
            college_name: row.college_name,
            participants,
            team_size,
            created_label: created
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            created_date: created.map(|dt| dt.date_naive()),
            created_at: row.created_at,
        }
    }

    /// First two members for the table cell.
    pub fn participants_preview(&self) -> &[ParticipantView] {
        let end = self.participants.len().min(2);
        &self.participants[..end]
    }
}

/// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS` (taken as UTC).
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_teams: usize,
    pub total_participants: i64,
    pub average_team_size: f64,
    pub registered_today: usize,
}

impl DashboardStats {
    pub fn average_label(&self) -> String {
        let avg = self.average_team_size;
        if avg.fract() == 0.0 {
            format!("{}", avg as i64)
        } else {
            format!("{:.1}", avg)
        }
    }
}

pub fn compute_stats(registrations: &[RegistrationView], today: NaiveDate) -> DashboardStats {
    let total_teams = registrations.len();
    let total_participants: i64 = registrations.iter().map(|r| r.team_size).sum();
    let average_team_size = if total_teams > 0 {
        (total_participants as f64 / total_teams as f64 * 10.0).round() / 10.0
    } else {
        0.0
    };
    let registered_today = registrations
        .iter()
        .filter(|r| r.created_date == Some(today))
        .count();

    DashboardStats {
        total_teams,
        total_participants,
        average_team_size,
        registered_today,
    }
}

/// Filter values echoed back into the form.
#[derive(Debug, Clone, Default)]
pub struct AppliedDashboardFilters {
    pub q: String,
    pub college: String,
    pub min_size: String,
    pub max_size: String,
    pub date_from: String,
    pub date_to: String,
}

impl AppliedDashboardFilters {
    fn from_query(query: &DashboardQuery) -> Self {
        Self {
            q: non_empty(&query.q).unwrap_or_default(),
            college: non_empty(&query.college).unwrap_or_default(),
            min_size: non_empty(&query.min_size).unwrap_or_default(),
            max_size: non_empty(&query.max_size).unwrap_or_default(),
            date_from: non_empty(&query.date_from).unwrap_or_default(),
            date_to: non_empty(&query.date_to).unwrap_or_default(),
        }
    }
}

pub struct DashboardPage {
    pub registrations: Vec<RegistrationView>,
    pub total_count: usize,
    pub stats: DashboardStats,
    pub colleges: Vec<String>,
    pub filters: AppliedDashboardFilters,
    pub has_active_filters: bool,
}

pub fn unique_colleges(registrations: &[RegistrationView]) -> Vec<String> {
    let mut colleges: Vec<String> = Vec::new();
    for reg in registrations {
        if !colleges.contains(&reg.college_name) {
            colleges.push(reg.college_name.clone());
        }
    }
    colleges
}

pub fn today_in(offset: &FixedOffset, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(offset).date_naive()
}

pub async fn load_registration_views(
    pool: &SqlitePool,
    offset: &FixedOffset,
) -> sqlx::Result<Vec<RegistrationView>> {
    let rows = registrations_repo::list_registrations(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| RegistrationView::from_row(row, offset))
        .collect())
}

pub async fn load_registration_view(
    pool: &SqlitePool,
    registration_id: &str,
    offset: &FixedOffset,
) -> sqlx::Result<Option<RegistrationView>> {
    Ok(registrations_repo::load_registration(pool, registration_id)
        .await?
        .map(|row| RegistrationView::from_row(row, offset)))
}

/// Registrations matching the query, newest first.
pub async fn load_filtered(
    pool: &SqlitePool,
    query: &DashboardQuery,
    offset: &FixedOffset,
) -> sqlx::Result<Vec<RegistrationView>> {
    let filter = DashboardFilter::from_query(query);
    let all = load_registration_views(pool, offset).await?;
    Ok(all.into_iter().filter(|r| filter.matches(r)).collect())
}

pub async fn build_dashboard_page(
    pool: &SqlitePool,
    query: &DashboardQuery,
    offset: &FixedOffset,
    now: DateTime<Utc>,
) -> sqlx::Result<DashboardPage> {
    let filter = DashboardFilter::from_query(query);
    let all = load_registration_views(pool, offset).await?;
    let total_count = all.len();
    let colleges = unique_colleges(&all);

    let registrations: Vec<RegistrationView> =
        all.into_iter().filter(|r| filter.matches(r)).collect();
    let stats = compute_stats(&registrations, today_in(offset, now));

    Ok(DashboardPage {
        registrations,
        total_count,
        stats,
        colleges,
        filters: AppliedDashboardFilters::from_query(query),
        has_active_filters: filter.is_active(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::database::registrations_repo::NewTeamRegistration;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn row(
        id: &str,
        team: &str,
        college: &str,
        participants: &str,
        created_at: &str,
    ) -> TeamRegistrationRow {
        TeamRegistrationRow {
            id: id.to_string(),
            team_name: team.to_string(),
            team_lead_name: "Lead".to_string(),
            team_lead_email: format!("{}@example.com", id),
            team_lead_phone: "9876543210".to_string(),
            college_name: college.to_string(),
            participant_count: 0,
            participants: Some(participants.to_string()),
            registered_by: None,
            created_at: created_at.to_string(),
        }
    }

    fn filter_of(pairs: &[(&str, &str)]) -> DashboardFilter {
        DashboardFilter::from_query(&query(pairs))
    }

    fn query(pairs: &[(&str, &str)]) -> DashboardQuery {
        let mut q = DashboardQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "q" => q.q = v,
                "college" => q.college = v,
                "min_size" => q.min_size = v,
                "max_size" => q.max_size = v,
                "date_from" => q.date_from = v,
                "date_to" => q.date_to = v,
                _ => unreachable!(),
            }
        }
        q
    }

    #[test]
    fn team_size_counts_only_valid_participants() {
        let participants = r#"[{"name":"X"},{"name":""},{"year":"2"}]"#;
        let view = RegistrationView::from_row(
            row("r1", "A", "REC", participants, "2024-01-01T10:00:00Z"),
            &ist(),
        );
        assert_eq!(view.team_size, 2);
        assert_eq!(view.participants.len() as i64 + 1, view.team_size);
    }

    #[test]
    fn date_range_is_inclusive_by_calendar_day() {
        let views: Vec<_> = [
            row("r1", "A", "REC", "[]", "2024-01-01T06:00:00Z"),
            row("r2", "B", "REC", "[]", "2024-01-05T06:00:00Z"),
        ]
        .into_iter()
        .map(|r| RegistrationView::from_row(r, &ist()))
        .collect();

        let filter = filter_of(&[("date_from", "2024-01-02"), ("date_to", "2024-01-10")]);
        let kept: Vec<&str> = views
            .iter()
            .filter(|v| filter.matches(v))
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(kept, vec!["r2"]);

        let same_day = filter_of(&[("date_from", "2024-01-05"), ("date_to", "2024-01-05")]);
        assert!(same_day.matches(&views[1]));
    }

    #[test]
    fn calendar_day_follows_event_offset() {
        // 20:00 UTC on the 1st is already the 2nd in IST
        let view =
            RegistrationView::from_row(row("r1", "A", "REC", "[]", "2024-01-01T20:00:00Z"), &ist());
        assert_eq!(view.created_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(view.created_label, "2024-01-02 01:30");
    }

    #[test]
    fn search_college_and_size_filters_combine() {
        let views: Vec<_> = [
            row(
                "r1",
                "Green Sprout",
                "Rajalakshmi Engineering College",
                r#"[{"name":"a"},{"name":"b"}]"#,
                "2024-01-01T06:00:00Z",
            ),
            row("r2", "Soil Sense", "Anna University", "[]", "2024-01-01T06:00:00Z"),
            row(
                "r3",
                "Agri Bots",
                "rajalakshmi institute",
                r#"[{"name":"a"}]"#,
                "2024-01-01T06:00:00Z",
            ),
        ]
        .into_iter()
        .map(|r| RegistrationView::from_row(r, &ist()))
        .collect();

        let ids = |f: &DashboardFilter| -> Vec<String> {
            views.iter().filter(|v| f.matches(v)).map(|v| v.id.clone()).collect()
        };

        assert_eq!(ids(&filter_of(&[("q", "SPROUT")])), vec!["r1"]);
        assert_eq!(ids(&filter_of(&[("q", "lead")])).len(), 3);
        assert_eq!(ids(&filter_of(&[("college", "rajalakshmi")])), vec!["r1", "r3"]);
        assert_eq!(
            ids(&filter_of(&[("college", "rajalakshmi"), ("max_size", "2")])),
            vec!["r3"]
        );
        assert_eq!(ids(&filter_of(&[("min_size", "3")])), vec!["r1"]);
        // junk values are ignored
        assert_eq!(ids(&filter_of(&[("min_size", "lots"), ("date_from", "soon")])).len(), 3);
    }

    #[test]
    fn stats_over_filtered_set() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let views: Vec<_> = [
            row("r1", "A", "REC", r#"[{"name":"a"},{"name":"b"}]"#, "2024-01-05T06:00:00Z"),
            row("r2", "B", "REC", "[]", "2024-01-04T06:00:00Z"),
            row("r3", "C", "REC", r#"[{"name":"a"}]"#, "2024-01-05T01:00:00Z"),
        ]
        .into_iter()
        .map(|r| RegistrationView::from_row(r, &ist()))
        .collect();

        let stats = compute_stats(&views, today);
        assert_eq!(stats.total_teams, 3);
        assert_eq!(stats.total_participants, 6);
        assert_eq!(stats.average_team_size, 2.0);
        assert_eq!(stats.average_label(), "2");
        assert_eq!(stats.registered_today, 2);

        let stats = compute_stats(&views[..2], today);
        assert_eq!(stats.average_team_size, 2.0);
        let stats = compute_stats(&views[1..], today);
        assert_eq!(stats.average_label(), "1.5");

        assert_eq!(compute_stats(&[], today), DashboardStats::default());
    }

    #[test]
    fn parses_sqlite_timestamps() {
        assert!(parse_created_at("2024-01-05 10:00:00").is_some());
        assert!(parse_created_at("2024-01-05T10:00:00.123+05:30").is_some());
        assert!(parse_created_at("yesterday").is_none());
    }

    #[test]
    fn colleges_keep_first_appearance_order() {
        let views: Vec<_> = [
            row("r1", "A", "REC", "[]", "2024-01-01T06:00:00Z"),
            row("r2", "B", "Anna University", "[]", "2024-01-01T06:00:00Z"),
            row("r3", "C", "REC", "[]", "2024-01-01T06:00:00Z"),
        ]
        .into_iter()
        .map(|r| RegistrationView::from_row(r, &ist()))
        .collect();
        assert_eq!(unique_colleges(&views), vec!["REC", "Anna University"]);
    }

    #[tokio::test]
    async fn dashboard_page_reads_and_filters_store() {
        let pool = database::connect_in_memory().await.unwrap();
        for (id, team, created_at) in [
            ("r1", "Alpha", "2024-01-01T06:00:00Z"),
            ("r2", "Beta", "2024-01-05T06:00:00Z"),
        ] {
            let email = format!("{}@example.com", id);
            registrations_repo::insert_registration(
                &pool,
                NewTeamRegistration {
                    id,
                    team_name: team,
                    team_lead_name: "Lead",
                    team_lead_email: &email,
                    team_lead_phone: "9876543210",
                    college_name: "REC",
                    participant_count: 1,
                    participants_json: r#"{"0":{"memberName":"M"}}"#,
                    registered_by: None,
                    created_at,
                },
            )
            .await
            .unwrap();
        }

        let now = DateTime::parse_from_rfc3339("2024-01-05T12:00:00Z").unwrap().with_timezone(&Utc);
        let page = build_dashboard_page(&pool, &query(&[("date_from", "2024-01-02")]), &ist(), now)
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.registrations.len(), 1);
        assert_eq!(page.registrations[0].team_name, "Beta");
        assert_eq!(page.stats.total_participants, 2);
        assert_eq!(page.stats.registered_today, 1);
        assert!(page.has_active_filters);
        assert_eq!(page.filters.date_from, "2024-01-02");

        let one = load_registration_view(&pool, "r1", &ist()).await.unwrap().unwrap();
        assert_eq!(one.participants[0].name, "M");
        assert_eq!(one.participants[0].email, NOT_AVAILABLE);
    }
}
