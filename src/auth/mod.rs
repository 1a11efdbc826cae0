//! Auth operations against the remote `/auth/*` endpoints.
//!
//! Each operation is one remote call. Only `login`, `google_login`, and
//! `logout` touch local state: the first two store the token triple and arm the
//! API client, logout clears everything regardless of the remote outcome.
//! Nothing here retries, and a 401 is terminal: no refresh-token rotation
//! exists, so the caller must sign in again.
//!
//! Flow overview: login returns the session even when the email is not yet
//! verified; the caller sends such users to the verification step via
//! [`post_login_destination`]. Registration, verification, and recovery leave
//! local state untouched and surface errors for display.

mod client;
mod redirect;
mod types;

pub use client::{
    fetch_me, google_login, login, logout, recover_password, register, resend_verification,
    reset_password, verify_email,
};
pub use redirect::{post_login_destination, VERIFY_EMAIL_PATH};
pub use types::{AuthSession, Credentials, Registration};
