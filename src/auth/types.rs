use crate::session::UserProfile;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Email/password sign-in input.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: SecretString,
    pub full_name: String,
}

/// Established session returned by login.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub user: UserProfile,
}

impl AuthSession {
    /// Unverified accounts sign in fine but belong on the verification step.
    #[must_use]
    pub fn requires_verification(&self) -> bool {
        !self.user.email_verified
    }
}

#[derive(Deserialize)]
pub(super) struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

impl From<LoginResponse> for AuthSession {
    fn from(response: LoginResponse) -> Self {
        Self {
            access_token: SecretString::from(response.access_token),
            refresh_token: response
                .refresh_token
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
            user: response.user,
        }
    }
}

// Wire payloads borrow exposed secrets only for the duration of one call.

#[derive(Serialize)]
pub(super) struct LoginPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Credentials> for LoginPayload<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            email: credentials.email.trim(),
            password: credentials.password.expose_secret(),
        }
    }
}

#[derive(Serialize)]
pub(super) struct GoogleLoginPayload<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
pub(super) struct RegisterPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

#[derive(Serialize)]
pub(super) struct EmailPayload<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub(super) struct TokenPayload<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
pub(super) struct ResetPasswordPayload<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}
