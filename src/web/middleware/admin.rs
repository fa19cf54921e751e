use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use crate::state::AppState;
use crate::web::middleware::auth::CurrentUser;

/// Dashboard gate: anonymous visitors go to `/login`, signed-in non-admins to `/`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .and_then(|current| current.0.clone());

    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };
    if !state.config.admin_emails.contains(&user.email) {
        warn!(email = %user.email, path = %request.uri().path(), "admin access denied");
        return Redirect::to("/").into_response();
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}
