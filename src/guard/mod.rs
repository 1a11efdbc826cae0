//! Pre-render route guard.
//!
//! Every page navigation is classified against three static prefix tables and
//! the request cookies, then either allowed or redirected. Evaluation is pure
//! and synchronous: no network I/O, no failure path. Unreadable cookies degrade
//! to anonymous, non-admin.
//!
//! The admin check trusts the `user_data` cookie, which the browser controls.
//! It keeps non-admins out of admin pages as a navigation nicety; the API must
//! still authorize every admin request on its own.

mod decision;
mod middleware;
mod routes;

pub use decision::{admin_claim, evaluate, Decision, Redirect};
pub use middleware::route_guard;
pub use routes::{classify, is_excluded, RouteClass, RouteTable, EXCLUDED_PREFIXES};
