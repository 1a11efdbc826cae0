//! Route classification tables.

/// Prefixes that bypass the guard: API calls, static and framework assets.
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "/api",
    "/_next/static",
    "/_next/image",
    "/static",
    "/assets",
    "/favicon.ico",
    "/robots.txt",
    "/health",
];

const PROTECTED_ROUTES: &[&str] = &[
    "/cart",
    "/shipping-address",
    "/order-summary",
    "/order-confirmation",
    "/profile",
    "/orders",
];
const ADMIN_ROUTES: &[&str] = &["/admin"];
const AUTH_ONLY_ROUTES: &[&str] = &["/login", "/register"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    Admin,
    Protected,
    AuthOnly,
    Public,
}

/// The three prefix tables. Matching is case-sensitive `starts_with`.
#[derive(Clone, Debug)]
pub struct RouteTable {
    protected: Vec<String>,
    admin: Vec<String>,
    auth_only: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(PROTECTED_ROUTES, ADMIN_ROUTES, AUTH_ONLY_ROUTES)
    }
}

impl RouteTable {
    #[must_use]
    pub fn new(protected: &[&str], admin: &[&str], auth_only: &[&str]) -> Self {
        Self {
            protected: owned(protected),
            admin: owned(admin),
            auth_only: owned(auth_only),
        }
    }

    #[must_use]
    pub fn is_admin(&self, path: &str) -> bool {
        matches_any(&self.admin, path)
    }

    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        matches_any(&self.protected, path)
    }

    #[must_use]
    pub fn is_auth_only(&self, path: &str) -> bool {
        matches_any(&self.auth_only, path)
    }
}

fn owned(routes: &[&str]) -> Vec<String> {
    routes.iter().map(|route| (*route).to_string()).collect()
}

fn matches_any(routes: &[String], path: &str) -> bool {
    routes.iter().any(|route| path.starts_with(route.as_str()))
}

/// Classify `path`. Admin wins over protected, protected over auth-only.
#[must_use]
pub fn classify(path: &str, table: &RouteTable) -> RouteClass {
    if table.is_admin(path) {
        RouteClass::Admin
    } else if table.is_protected(path) {
        RouteClass::Protected
    } else if table.is_auth_only(path) {
        RouteClass::AuthOnly
    } else {
        RouteClass::Public
    }
}

/// Whether `path` skips the guard. Matches whole segments, so `/apiary` is a page.
#[must_use]
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}
