use super::upstream::Upstream;
use crate::{
    api::ApiClient,
    guard::RouteTable,
    session::{CookiePolicy, ResponseCookieJar, SessionContext},
};
use axum::http::HeaderMap;
use std::sync::Arc;

/// Shared handler state. Cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub api: ApiClient,
    pub cookie_policy: CookiePolicy,
    pub upstream: Arc<Upstream>,
}

impl AppState {
    #[must_use]
    pub fn new(api: ApiClient, upstream: Upstream, cookie_policy: CookiePolicy) -> Self {
        Self {
            routes: Arc::new(RouteTable::default()),
            api,
            cookie_policy,
            upstream: Arc::new(upstream),
        }
    }

    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = Arc::new(routes);
        self
    }

    /// Session for one request: its own cookie jar and its own auth header slot.
    #[must_use]
    pub fn session(&self, headers: &HeaderMap) -> SessionContext<ResponseCookieJar> {
        let jar = ResponseCookieJar::from_headers(headers, self.cookie_policy.clone());
        SessionContext::new(Arc::new(jar), self.api.fork())
    }
}
