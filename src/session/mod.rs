//! Cookie-backed session state: the jar abstraction, the credential store that
//! persists tokens and the profile snapshot, the cached checkout selection, and
//! the per-load [`SessionContext`] that arms the outbound API client.
//!
//! Cookies are used instead of memory-only storage because the route guard
//! runs outside the page tree and must read the same values synchronously.
//! Nothing in this module validates tokens; presence is the only signal.

pub mod checkout;
pub mod context;
pub mod cookies;
pub mod credentials;

pub use checkout::CheckoutSelection;
pub use context::SessionContext;
pub use cookies::{
    CookieJar, CookiePolicy, MemoryCookieJar, RequestCookies, ResponseCookieJar,
    DEFAULT_MAX_AGE_SECONDS,
};
pub use credentials::{CredentialStore, Session, UserProfile};
