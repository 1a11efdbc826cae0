//! Client wrappers for the storefront auth endpoints. Passwords and tokens are
//! only exposed while building a request body and are never logged.

use super::types::{
    AuthSession, Credentials, EmailPayload, GoogleLoginPayload, LoginPayload, LoginResponse,
    RegisterPayload, Registration, ResetPasswordPayload, TokenPayload,
};
use crate::{
    api::{ApiClient, ApiError},
    session::{CookieJar, SessionContext, UserProfile},
};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Basic email format check; the API does the real validation.
fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

fn checked_email(email: &str) -> Result<&str, ApiError> {
    let email = email.trim();
    if valid_email(email) {
        Ok(email)
    } else {
        Err(ApiError::invalid_field("email", INVALID_EMAIL))
    }
}

fn required<'a>(field: &str, value: &'a str, message: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ApiError::invalid_field(field, message))
    } else {
        Ok(value)
    }
}

/// Store the token triple and arm the client.
fn establish<J: CookieJar>(ctx: &SessionContext<J>, response: LoginResponse) -> AuthSession {
    let session = AuthSession::from(response);
    ctx.credentials().set_auth(
        &session.access_token,
        session.refresh_token.as_ref(),
        &session.user,
    );
    ctx.api().set_auth_token(&session.access_token);
    info!(
        user_id = %session.user.id,
        email_verified = session.user.email_verified,
        "Session established"
    );
    session
}

/// Sign in with email and password.
///
/// Succeeds for unverified accounts too; check [`AuthSession::requires_verification`].
///
/// # Errors
///
/// `Unauthorized` for bad credentials, `Forbidden` for inactive accounts,
/// `Network` when the API is unreachable.
#[instrument(skip_all)]
pub async fn login<J: CookieJar>(
    ctx: &SessionContext<J>,
    credentials: &Credentials,
) -> Result<AuthSession, ApiError> {
    let payload = LoginPayload::from(credentials);
    checked_email(payload.email)?;
    let response: LoginResponse = ctx.api().post("/auth/login", &payload).await?;
    Ok(establish(ctx, response))
}

/// Sign in with a Google identity token obtained by the page.
///
/// # Errors
///
/// Same as [`login`].
#[instrument(skip_all)]
pub async fn google_login<J: CookieJar>(
    ctx: &SessionContext<J>,
    id_token: &SecretString,
) -> Result<AuthSession, ApiError> {
    let token = required("token", id_token.expose_secret(), "Google sign-in failed.")?;
    let response: LoginResponse = ctx
        .api()
        .post("/auth/google-login", &GoogleLoginPayload { token })
        .await?;
    Ok(establish(ctx, response))
}

/// Sign out. The remote call is best-effort; local state is always cleared.
#[instrument(skip_all)]
pub async fn logout<J: CookieJar>(ctx: &SessionContext<J>) {
    // Attach the stored token even if this context was never bootstrapped.
    ctx.initialize_auth();

    match ctx.api().post_ack("/auth/logout", &json!({})).await {
        Ok(_) => {}
        // The token is already dead on the server side.
        Err(err) if err.is_unauthorized() => debug!("Remote session already expired: {err}"),
        Err(err) => {
            warn!(kind = %err.kind, "Remote logout failed, clearing local session anyway: {err}");
        }
    }

    ctx.api().clear_auth_token();
    ctx.credentials().clear_auth();
    ctx.checkout().clear();
    info!("Session cleared");
}

/// Create an account. The user signs in separately afterwards.
///
/// # Errors
///
/// `Validation` for a malformed email or missing password (checked locally) or
/// for remote field errors such as a duplicate email.
#[instrument(skip_all)]
pub async fn register(api: &ApiClient, registration: &Registration) -> Result<UserProfile, ApiError> {
    let email = checked_email(&registration.email)?;
    let password = registration.password.expose_secret();
    if password.is_empty() {
        return Err(ApiError::invalid_field("password", "Enter a password."));
    }
    let payload = RegisterPayload {
        email,
        password,
        full_name: registration.full_name.trim(),
    };
    api.post("/auth/register", &payload).await
}

/// Fetch the live profile for the armed token.
///
/// # Errors
///
/// `Unauthorized` when the token is missing, expired, or revoked.
#[instrument(skip_all)]
pub async fn fetch_me(api: &ApiClient) -> Result<UserProfile, ApiError> {
    api.get("/auth/me").await
}

/// Submit the token from a verification link.
///
/// # Errors
///
/// `Validation` for an empty token or one the API rejects.
#[instrument(skip_all)]
pub async fn verify_email(api: &ApiClient, token: &str) -> Result<String, ApiError> {
    let token = required("token", token, "The verification link is incomplete.")?;
    api.post_ack("/auth/verify-email", &TokenPayload { token })
        .await
}

/// Ask for a new verification email.
///
/// # Errors
///
/// `Validation` for a malformed email, otherwise whatever the API reports.
#[instrument(skip_all)]
pub async fn resend_verification(api: &ApiClient, email: &str) -> Result<String, ApiError> {
    let email = checked_email(email)?;
    api.post_ack("/auth/resend-verification", &EmailPayload { email })
        .await
}

/// Start password recovery; the API emails a reset link.
///
/// # Errors
///
/// `Validation` for a malformed email, otherwise whatever the API reports.
#[instrument(skip_all)]
pub async fn recover_password(api: &ApiClient, email: &str) -> Result<String, ApiError> {
    let email = checked_email(email)?;
    api.post_ack("/auth/forgot-password", &EmailPayload { email })
        .await
}

/// Complete password recovery with the token from the reset link.
///
/// # Errors
///
/// `Validation` for an empty token or password, or a token the API rejects.
#[instrument(skip_all)]
pub async fn reset_password(
    api: &ApiClient,
    token: &str,
    new_password: &SecretString,
) -> Result<String, ApiError> {
    let token = required("token", token, "The reset link is incomplete.")?;
    let new_password = new_password.expose_secret();
    if new_password.is_empty() {
        return Err(ApiError::invalid_field("new_password", "Enter a new password."));
    }
    api.post_ack(
        "/auth/reset-password",
        &ResetPasswordPayload {
            token,
            new_password,
        },
    )
    .await
}
