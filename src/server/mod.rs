//! Edge server: guards page navigations, serves the session endpoints, and
//! forwards everything else to the page renderer.

use crate::guard::route_guard;
use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

mod handlers;
mod state;
mod upstream;

pub use handlers::session::{error_response, LoginForm};
pub use state::AppState;
pub use upstream::Upstream;

const REQUEST_ID: &str = "x-request-id";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let guard = from_fn_with_state(Arc::clone(&state.routes), route_guard);

    Router::new()
        .route("/api/session", get(handlers::session::current))
        .route("/api/session/login", post(handlers::session::login))
        .route("/api/session/logout", post(handlers::session::logout))
        .fallback(handlers::forward)
        .layer(guard)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
        .route("/health", get(handlers::health).options(handlers::health))
        .with_state(state)
}

/// Serve until ctrl-c.
/// # Errors
/// Returns an error if the server fails to start
pub async fn new(port: u16, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let path = request.uri().path();
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = path,
        request_id
    )
}
