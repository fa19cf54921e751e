pub mod middleware;
pub mod routes;

use askama::Template;
use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::AppError;
use crate::state::AppState;
use crate::web::middleware::{admin as admin_middleware, auth as auth_middleware};
use crate::web::routes::{admin, api, auth, home, register};

pub const BUILD_ID: &str = env!("EZHUMI_BUILD_ID");

/// Header and footer data every page template carries.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub user_email: Option<String>,
    pub build_id: &'static str,
}

impl PageChrome {
    pub fn new(user_email: Option<String>) -> Self {
        Self {
            user_email,
            build_id: BUILD_ID,
        }
    }
}

/// One `<option>` of a `<select>`.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn list<I, S>(values: I, current: &str) -> Vec<SelectOption>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values
            .into_iter()
            .map(|v| {
                let value = v.into();
                let selected = value == current;
                SelectOption { value, selected }
            })
            .collect()
    }
}

pub fn render_html<T: Template>(template: &T) -> Response {
    render_html_with_status(StatusCode::OK, template)
}

pub fn render_html_with_status<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => AppError::Template(e).into_response(),
    }
}

pub fn app(state: AppState) -> Router {
    let signed_in_routes = Router::new()
        .route(
            "/register",
            get(register::register_page).post(register::register_submit),
        )
        .route("/register/resend-code", post(register::resend_code_handler))
        .route(
            "/register/success/:registration_id",
            get(register::register_success_page),
        )
        .route_layer(axum_middleware::from_fn(auth_middleware::require_auth));

    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard_handler))
        .route("/admin/export.csv", get(admin::export_csv_handler))
        .route(
            "/admin/registrations/:registration_id",
            get(admin::registration_detail_handler),
        )
        .route(
            "/admin/registrations/:registration_id/export.csv",
            get(admin::registration_export_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admin_middleware::require_admin,
        ));

    Router::new()
        // Public routes
        .route("/", get(home::home_page))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route("/auth/oauth/:provider", get(auth::oauth_start_handler))
        .route("/auth/callback", get(auth::oauth_callback_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/api/me", get(auth::me_handler))
        .route("/api/send-otp", post(api::send_otp_handler))
        .route(
            "/api/send-confirmation-email",
            post(api::send_confirmation_email_handler),
        )
        .route("/health", get(api::health_handler))
        .merge(signed_in_routes)
        .merge(admin_routes)
        // Static files
        .nest_service("/assets", get_service(ServeDir::new("assets")))
        // Layers
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::identify,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
