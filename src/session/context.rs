//! Per-load session context.
//!
//! A [`SessionContext`] is built once at the composition root (a page-tree
//! mount, a request handler) and passed down explicitly. It pairs the
//! credential store with the API client and bridges stored credentials into the
//! client's default `Authorization` header.

use super::{
    checkout::CheckoutSelection,
    cookies::CookieJar,
    credentials::{CredentialStore, UserProfile},
};
use crate::api::ApiClient;
use std::sync::Arc;
use tracing::debug;

pub struct SessionContext<J> {
    credentials: CredentialStore<J>,
    checkout: CheckoutSelection<J>,
    api: ApiClient,
}

impl<J> Clone for SessionContext<J> {
    fn clone(&self) -> Self {
        Self {
            credentials: self.credentials.clone(),
            checkout: self.checkout.clone(),
            api: self.api.clone(),
        }
    }
}

impl<J: CookieJar> SessionContext<J> {
    #[must_use]
    pub fn new(jar: Arc<J>, api: ApiClient) -> Self {
        Self {
            credentials: CredentialStore::new(Arc::clone(&jar)),
            checkout: CheckoutSelection::new(jar),
            api,
        }
    }

    /// Arm the API client from the stored token. Returns whether a token was found.
    ///
    /// Without a token this is a no-op; calling it again re-arms with the same value.
    pub fn initialize_auth(&self) -> bool {
        match self.credentials.get_access_token() {
            Some(token) => {
                self.api.set_auth_token(&token);
                debug!("API client armed from stored credentials");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.credentials.get_user()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore<J> {
        &self.credentials
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutSelection<J> {
        &self.checkout
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}
