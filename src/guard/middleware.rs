use super::{
    decision::{evaluate, Decision},
    routes::{is_excluded, RouteTable},
};
use crate::session::cookies::RequestCookies;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect as RedirectResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// axum middleware applying the guard to every non-excluded request.
///
/// Redirects are `307 Temporary Redirect` and carry no body.
pub async fn route_guard(
    State(table): State<Arc<RouteTable>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if is_excluded(&path) {
        return next.run(request).await;
    }

    let cookies = RequestCookies::from_headers(request.headers());
    match evaluate(&path, &cookies, &table) {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(target) => {
            let location = target.location();
            debug!(path = %path, location = %location, "guard redirect");
            RedirectResponse::temporary(&location).into_response()
        }
    }
}
