//! Credential store: the sole reader/writer of persisted auth state.
//!
//! Three cookies make up a session: the bearer token, the refresh token, and a
//! JSON snapshot of the user profile taken at login. The snapshot is never a
//! live source of truth, and a corrupt snapshot reads as absent so callers fall
//! back to anonymous.

use super::cookies::CookieJar;
use secrecy::{ExposeSecret, SecretString};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const USER_DATA_COOKIE: &str = "user_data";

const CREDENTIAL_COOKIES: [&str; 3] = [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, USER_DATA_COOKIE];

/// Profile snapshot returned by the API at login.
///
/// Missing flags deserialize as `false`. `is_admin` gates navigation only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(de::Error::custom(format!("invalid user id: {other}"))),
    }
}

/// Snapshot of the stored session.
///
/// `user` is only populated when `access_token` is.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<UserProfile>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_admin)
    }
}

pub struct CredentialStore<J> {
    jar: Arc<J>,
}

impl<J> Clone for CredentialStore<J> {
    fn clone(&self) -> Self {
        Self {
            jar: Arc::clone(&self.jar),
        }
    }
}

impl<J: CookieJar> CredentialStore<J> {
    #[must_use]
    pub fn new(jar: Arc<J>) -> Self {
        Self { jar }
    }

    #[must_use]
    pub fn jar(&self) -> &Arc<J> {
        &self.jar
    }

    /// Overwrite the stored session in one jar write.
    ///
    /// A missing refresh token removes any previous one.
    pub fn set_auth(
        &self,
        access_token: &SecretString,
        refresh_token: Option<&SecretString>,
        user: &UserProfile,
    ) {
        let user_json = match serde_json::to_string(user) {
            Ok(json) => Some(json),
            Err(err) => {
                error!("Failed to encode user profile, storing tokens only: {err}");
                None
            }
        };

        let mut set = vec![(ACCESS_TOKEN_COOKIE, access_token.expose_secret())];
        let mut remove = Vec::new();

        match refresh_token {
            Some(token) => set.push((REFRESH_TOKEN_COOKIE, token.expose_secret())),
            None => remove.push(REFRESH_TOKEN_COOKIE),
        }
        match user_json.as_deref() {
            Some(json) => set.push((USER_DATA_COOKIE, json)),
            None => remove.push(USER_DATA_COOKIE),
        }

        self.jar.apply(&set, &remove);
    }

    #[must_use]
    pub fn get_access_token(&self) -> Option<SecretString> {
        self.jar
            .get(ACCESS_TOKEN_COOKIE)
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
    }

    /// Stored for a future rotation flow; nothing reads it today.
    #[must_use]
    pub fn get_refresh_token(&self) -> Option<SecretString> {
        self.jar
            .get(REFRESH_TOKEN_COOKIE)
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
    }

    #[must_use]
    pub fn get_user(&self) -> Option<UserProfile> {
        let raw = self.jar.get(USER_DATA_COOKIE)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                debug!("Ignoring unreadable user_data cookie: {err}");
                None
            }
        }
    }

    /// Token presence only; signature and expiry are the API's concern.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get_access_token().is_some()
    }

    #[must_use]
    pub fn session(&self) -> Session {
        let access_token = self.get_access_token();
        if access_token.is_none() {
            return Session::default();
        }
        Session {
            access_token,
            refresh_token: self.get_refresh_token(),
            user: self.get_user(),
        }
    }

    pub fn clear_auth(&self) {
        self.jar.remove_all(&CREDENTIAL_COOKIES);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::cookies::{MemoryCookieJar, RequestCookies};

    pub(crate) fn profile(is_admin: bool, email_verified: bool) -> UserProfile {
        UserProfile {
            id: "42".to_string(),
            email: "ana@example.com".to_string(),
            full_name: "Ana Souza".to_string(),
            is_active: true,
            is_admin,
            email_verified,
            created_at: Some("2024-03-01T12:00:00Z".to_string()),
            updated_at: None,
        }
    }

    fn store() -> CredentialStore<MemoryCookieJar> {
        CredentialStore::new(Arc::new(MemoryCookieJar::new()))
    }

    #[test]
    fn set_auth_round_trips() {
        let store = store();
        let user = profile(false, true);
        store.set_auth(
            &SecretString::from("access-1"),
            Some(&SecretString::from("refresh-1")),
            &user,
        );

        assert_eq!(
            store.get_access_token().map(|t| t.expose_secret().to_string()),
            Some("access-1".to_string())
        );
        assert_eq!(
            store.get_refresh_token().map(|t| t.expose_secret().to_string()),
            Some("refresh-1".to_string())
        );
        assert_eq!(store.get_user(), Some(user));
        assert!(store.is_authenticated());
    }

    #[test]
    fn set_auth_overwrites_previous_session() {
        let store = store();
        store.set_auth(
            &SecretString::from("old"),
            Some(&SecretString::from("old-refresh")),
            &profile(true, true),
        );
        let user = profile(false, false);
        store.set_auth(&SecretString::from("new"), None, &user);

        assert_eq!(
            store.get_access_token().map(|t| t.expose_secret().to_string()),
            Some("new".to_string())
        );
        assert!(store.get_refresh_token().is_none());
        assert_eq!(store.get_user(), Some(user));
    }

    #[test]
    fn clear_auth_is_idempotent() {
        let store = store();
        store.set_auth(&SecretString::from("t"), None, &profile(false, true));
        store.clear_auth();
        assert!(!store.is_authenticated());
        store.clear_auth();
        assert!(!store.is_authenticated());
        assert!(store.get_user().is_none());
        assert!(store.jar().is_empty());
    }

    #[test]
    fn clear_auth_without_session_is_noop() {
        let store = store();
        store.clear_auth();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn corrupt_user_data_reads_as_absent() {
        let jar = MemoryCookieJar::from(RequestCookies::parse(
            "access_token=abc; user_data=%7Bnot-json",
        ));
        let store = CredentialStore::new(Arc::new(jar));
        assert!(store.is_authenticated());
        assert!(store.get_user().is_none());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let jar = MemoryCookieJar::from(RequestCookies::parse("access_token="));
        let store = CredentialStore::new(Arc::new(jar));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn session_hides_user_without_token() {
        let user_json = serde_json::to_string(&profile(true, true)).unwrap_or_default();
        let jar = MemoryCookieJar::new();
        jar.set_all(&[(USER_DATA_COOKIE, &user_json)]);
        let store = CredentialStore::new(Arc::new(jar));

        let session = store.session();
        assert!(!session.is_authenticated());
        assert!(session.user.is_none());
        assert!(!session.is_admin());
    }

    #[test]
    fn profile_accepts_numeric_id_and_missing_flags() -> anyhow::Result<()> {
        let user: UserProfile = serde_json::from_str(r#"{"id": 7, "email": "a@b.co"}"#)?;
        assert_eq!(user.id, "7");
        assert!(!user.is_admin);
        assert!(!user.email_verified);
        assert!(!user.is_active);
        Ok(())
    }
}
