//! # Storefront (session lifecycle & route guard)
//!
//! `storefront` owns the client-side half of storefront authentication: the
//! cookie-backed credential store, the session bootstrap that arms the outbound
//! API client, the auth operations that wrap the remote `/auth/*` endpoints,
//! and the route guard evaluated before any page is served.
//!
//! ## Route classes
//!
//! Every navigation falls into one of four classes, decided by static
//! path-prefix tables and evaluated in this order:
//!
//! - **Admin** (`/admin`): requires a token and an `is_admin` claim.
//! - **Protected** (`/cart`, `/orders`, `/profile`, ...): requires a token.
//! - **Auth-only** (`/login`, `/register`): only reachable when anonymous.
//! - **Public**: everything else.
//!
//! The admin check reads the denormalized `user_data` cookie and is a
//! navigation convenience only. The remote API enforces authorization on every
//! admin endpoint.
//!
//! ## Credentials
//!
//! Access token, refresh token, and a profile snapshot live in cookies so the
//! guard can read them synchronously without an API round-trip. The refresh
//! token is stored but never rotated; a `401` from the API is terminal for the
//! current credential.

pub mod api;
pub mod auth;
pub mod cli;
pub mod guard;
pub mod server;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
