use crate::server::AppState;
use axum::{extract::Request, extract::State, response::Response};

// axum fallback: every page navigation that passed the guard
pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    state.upstream.forward(request).await
}
