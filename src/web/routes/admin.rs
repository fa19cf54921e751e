use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::error::AppError;

use crate::services::dashboard_service::{
    self, AppliedDashboardFilters, DashboardQuery, DashboardStats, RegistrationView,
};
use crate::services::export_service;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{render_html, render_html_with_status, PageChrome, SelectOption};

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub chrome: PageChrome,
    pub registrations: Vec<RegistrationView>,
    pub total_count: usize,
    pub stats: DashboardStats,
    pub colleges: Vec<SelectOption>,
    pub filters: AppliedDashboardFilters,
    pub has_active_filters: bool,
    pub quick_filters: Vec<QuickFilter>,
    pub export_href: String,
}

/// Preset filter link shown above the table.
pub struct QuickFilter {
    pub label: &'static str,
    pub href: String,
}

#[derive(Template)]
#[template(path = "admin_registration.html")]
pub struct AdminRegistrationTemplate {
    pub chrome: PageChrome,
    pub registration: RegistrationView,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub chrome: PageChrome,
    pub message: String,
}

fn not_found(user: &AuthenticatedUser) -> Response {
    render_html_with_status(
        StatusCode::NOT_FOUND,
        &ErrorTemplate {
            chrome: PageChrome::new(Some(user.email.clone())),
            message: "Registration not found.".to_string(),
        },
    )
}

fn csv_response(body: String, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(export_service::CSV_CONTENT_TYPE),
    );
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => error!("Cannot encode content disposition {}: {}", disposition, e),
    }
    response
}

fn filter_href(path: &str, filters: &AppliedDashboardFilters) -> String {
    let pairs = [
        ("q", &filters.q),
        ("college", &filters.college),
        ("min_size", &filters.min_size),
        ("max_size", &filters.max_size),
        ("date_from", &filters.date_from),
        ("date_to", &filters.date_to),
    ];
    let query: Vec<(&str, &str)> = pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (*k, v.as_str()))
        .collect();
    if query.is_empty() {
        return path.to_string();
    }
    let base = format!("http://localhost{}", path);
    match reqwest::Url::parse_with_params(&base, &query) {
        Ok(url) => format!("{}?{}", path, url.query().unwrap_or_default()),
        Err(_) => path.to_string(),
    }
}

fn export_href(filters: &AppliedDashboardFilters) -> String {
    filter_href("/admin/export.csv", filters)
}

/// Solo, small-team and today presets layered over the filters already applied.
fn quick_filters(filters: &AppliedDashboardFilters, today: NaiveDate) -> Vec<QuickFilter> {
    let sized = |min: &str, max: &str| AppliedDashboardFilters {
        min_size: min.to_string(),
        max_size: max.to_string(),
        ..filters.clone()
    };
    let today_only = AppliedDashboardFilters {
        date_from: today.format("%Y-%m-%d").to_string(),
        date_to: String::new(),
        ..filters.clone()
    };

    vec![
        QuickFilter {
            label: "Solo Teams",
            href: filter_href("/admin", &sized("1", "1")),
        },
        QuickFilter {
            label: "Small Teams (2-4)",
            href: filter_href("/admin", &sized("2", "4")),
        },
        QuickFilter {
            label: "Today Only",
            href: filter_href("/admin", &today_only),
        },
    ]
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let now = Utc::now();
    let offset = state.config.event_offset;
    let page = match dashboard_service::build_dashboard_page(&state.pool, &query, &offset, now)
    .await
    {
        Ok(page) => page,
        Err(e) => {
            warn!("Dashboard load failed: {}", e);
            return render_html_with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorTemplate {
                    chrome: PageChrome::new(Some(user.email)),
                    message: format!("Failed to load registrations: {}", e),
                },
            );
        }
    };

    info!(
        admin = %user.email,
        shown = page.registrations.len(),
        total = page.total_count,
        "dashboard rendered"
    );

    let template = AdminDashboardTemplate {
        chrome: PageChrome::new(Some(user.email)),
        colleges: SelectOption::list(page.colleges, &page.filters.college),
        quick_filters: quick_filters(&page.filters, dashboard_service::today_in(&offset, now)),
        export_href: export_href(&page.filters),
        registrations: page.registrations,
        total_count: page.total_count,
        stats: page.stats,
        filters: page.filters,
        has_active_filters: page.has_active_filters,
    };
    render_html(&template)
}

pub async fn registration_detail_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(registration_id): Path<String>,
) -> Response {
    let offset = state.config.event_offset;
    match dashboard_service::load_registration_view(&state.pool, &registration_id, &offset).await {
        Ok(Some(registration)) => render_html(&AdminRegistrationTemplate {
            chrome: PageChrome::new(Some(user.email)),
            registration,
        }),
        Ok(None) => not_found(&user),
        Err(e) => {
            warn!("Registration load failed for {}: {}", registration_id, e);
            AppError::Database(e).into_response()
        }
    }
}

pub async fn export_csv_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let offset = state.config.event_offset;
    let registrations = match dashboard_service::load_filtered(&state.pool, &query, &offset).await {
        Ok(r) => r,
        Err(e) => {
            warn!("Export load failed: {}", e);
            return AppError::Database(e).into_response();
        }
    };

    info!(admin = %user.email, rows = registrations.len(), "registrations exported");
    let today = dashboard_service::today_in(&offset, Utc::now());
    let filename = export_service::list_export_filename(today);
    csv_response(export_service::registrations_csv(&registrations), &filename)
}

pub async fn registration_export_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(registration_id): Path<String>,
) -> Response {
    let offset = state.config.event_offset;
    match dashboard_service::load_registration_view(&state.pool, &registration_id, &offset).await {
        Ok(Some(registration)) => {
            info!(admin = %user.email, registration_id = %registration_id, "registration exported");
            let filename = export_service::detail_export_filename(&registration.team_name);
            csv_response(export_service::registration_detail_csv(&registration), &filename)
        }
        Ok(None) => AppError::NotFound.into_response(),
        Err(e) => {
            warn!("Registration export failed for {}: {}", registration_id, e);
            AppError::Database(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_link_keeps_active_filters_only() {
        let filters = AppliedDashboardFilters {
            q: "green sprout".into(),
            college: String::new(),
            min_size: "2".into(),
            ..AppliedDashboardFilters::default()
        };
        assert_eq!(export_href(&filters), "/admin/export.csv?q=green+sprout&min_size=2");
        assert_eq!(export_href(&AppliedDashboardFilters::default()), "/admin/export.csv");
    }

    #[test]
    fn quick_filters_keep_search_and_override_ranges() {
        let filters = AppliedDashboardFilters {
            q: "sprout".into(),
            min_size: "3".into(),
            date_to: "2024-01-31".into(),
            ..AppliedDashboardFilters::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let links = quick_filters(&filters, today);

        let labels: Vec<&str> = links.iter().map(|l| l.label).collect();
        assert_eq!(labels, ["Solo Teams", "Small Teams (2-4)", "Today Only"]);
        assert_eq!(
            links[0].href,
            "/admin?q=sprout&min_size=1&max_size=1&date_to=2024-01-31"
        );
        assert_eq!(
            links[1].href,
            "/admin?q=sprout&min_size=2&max_size=4&date_to=2024-01-31"
        );
        assert_eq!(links[2].href, "/admin?q=sprout&min_size=3&date_from=2024-01-05");
    }

    #[test]
    fn csv_response_headers() {
        let response = csv_response("\"a\"".into(), "ezhumi-team-x-details.csv");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            export_service::CSV_CONTENT_TYPE
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ezhumi-team-x-details.csv\""
        );
    }
}
