use askama::Template;
use axum::{extract::State, response::Response, Extension};

use crate::services::content_service::{self, Faq, Highlight, Milestone, Theme};
use crate::state::AppState;
use crate::web::middleware::auth::CurrentUser;
use crate::web::{render_html, PageChrome};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: PageChrome,
    pub event_name: &'static str,
    pub tagline: &'static str,
    pub about: &'static [&'static str],
    pub highlights: &'static [Highlight],
    pub themes: &'static [Theme],
    pub timeline: &'static [Milestone],
    pub faqs: &'static [Faq],
    pub contact_email: String,
}

pub async fn home_page(
    Extension(current): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> Response {
    let template = HomeTemplate {
        chrome: PageChrome::new(current.email()),
        event_name: content_service::EVENT_NAME,
        tagline: content_service::TAGLINE,
        about: content_service::ABOUT,
        highlights: content_service::HIGHLIGHTS,
        themes: content_service::THEMES,
        timeline: content_service::TIMELINE,
        faqs: content_service::FAQS,
        contact_email: state.config.notifier.contact_email.clone(),
    };
    render_html(&template)
}
