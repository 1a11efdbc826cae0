//! Session endpoints for the pages: who am I, sign in, sign out.
//!
//! Each request gets its own [`SessionContext`] over a response cookie jar, so
//! whatever the auth operations store is sent back as `Set-Cookie` headers.

use crate::{
    api::{ApiError, ErrorKind},
    auth::{self, post_login_destination, Credentials},
    server::AppState,
    session::{ResponseCookieJar, SessionContext, UserProfile},
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(Serialize)]
struct LoginReply<'a> {
    user: &'a UserProfile,
    redirect: String,
}

fn with_cookies(ctx: &SessionContext<ResponseCookieJar>, mut response: Response) -> Response {
    ctx.credentials().jar().write_headers(response.headers_mut());
    response
}

/// Status and JSON body for a failed auth operation.
#[must_use]
pub fn error_response(err: &ApiError) -> Response {
    let status = match err.kind {
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Network | ErrorKind::Unknown => StatusCode::BAD_GATEWAY,
    };
    let body = json!({
        "kind": err.kind,
        "message": err.user_message(),
        "field_errors": err.field_errors,
    });
    (status, Json(body)).into_response()
}

/// Profile stored in the session cookies; `204` when anonymous.
pub async fn current(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = state.session(&headers);
    match ctx.current_user() {
        Some(user) if ctx.is_authenticated() => Json(user).into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<LoginForm>,
) -> Response {
    let ctx = state.session(&headers);
    let credentials = Credentials::new(form.email, form.password);

    match auth::login(&ctx, &credentials).await {
        Ok(session) => {
            let redirect =
                post_login_destination(form.redirect.as_deref(), &session.user, &state.routes);
            let reply = Json(LoginReply {
                user: &session.user,
                redirect,
            });
            with_cookies(&ctx, reply.into_response())
        }
        Err(err) => error_response(&err),
    }
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = state.session(&headers);
    auth::logout(&ctx).await;
    with_cookies(&ctx, StatusCode::NO_CONTENT.into_response())
}
