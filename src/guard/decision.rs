use super::routes::{classify, RouteClass, RouteTable};
use crate::session::{
    cookies::RequestCookies,
    credentials::{ACCESS_TOKEN_COOKIE, USER_DATA_COOKIE},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;

/// Bytes escaped when a path is carried in the `redirect` query parameter.
/// `/` stays readable and existing `%XX` escapes are kept as-is.
const REDIRECT_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'`');

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redirect {
    /// Send the visitor to sign in, then back to `return_to`.
    Login { return_to: String },
    Home,
}

impl Redirect {
    /// Value for the `Location` header.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::Login { return_to } => format!(
                "{LOGIN_PATH}?redirect={}",
                utf8_percent_encode(return_to, REDIRECT_VALUE)
            ),
            Self::Home => HOME_PATH.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Redirect),
}

#[derive(Deserialize)]
struct AdminClaim {
    #[serde(default)]
    is_admin: bool,
}

/// `is_admin` from the `user_data` cookie. Anything unreadable is `false`.
#[must_use]
pub fn admin_claim(cookies: &RequestCookies) -> bool {
    cookies
        .get(USER_DATA_COOKIE)
        .and_then(|raw| serde_json::from_str::<AdminClaim>(&raw).ok())
        .is_some_and(|claim| claim.is_admin)
}

/// Decide what to do with a navigation to `path`.
#[must_use]
pub fn evaluate(path: &str, cookies: &RequestCookies, table: &RouteTable) -> Decision {
    let authenticated = cookies.has(ACCESS_TOKEN_COOKIE);
    let login = || {
        Decision::Redirect(Redirect::Login {
            return_to: path.to_string(),
        })
    };

    match classify(path, table) {
        RouteClass::Admin if !authenticated => login(),
        RouteClass::Admin if !admin_claim(cookies) => Decision::Redirect(Redirect::Home),
        RouteClass::Protected if !authenticated => login(),
        RouteClass::AuthOnly if authenticated => Decision::Redirect(Redirect::Home),
        _ => Decision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::cookies::encode_value;

    const ADMIN_PATHS: &[&str] = &["/admin", "/admin/users", "/admin/orders/9", "/admin/products/new"];
    const PROTECTED_PATHS: &[&str] = &[
        "/cart",
        "/shipping-address",
        "/order-summary",
        "/order-confirmation/55",
        "/profile",
        "/orders",
        "/orders/12",
    ];

    fn cookies(token: Option<&str>, user_data: Option<&str>) -> RequestCookies {
        let mut parts = Vec::new();
        if let Some(token) = token {
            parts.push(format!("access_token={token}"));
        }
        if let Some(user_data) = user_data {
            parts.push(format!("user_data={}", encode_value(user_data)));
        }
        RequestCookies::parse(&parts.join("; "))
    }

    fn login(path: &str) -> Decision {
        Decision::Redirect(Redirect::Login {
            return_to: path.to_string(),
        })
    }

    #[test]
    fn admin_paths_without_token_go_to_login() {
        let table = RouteTable::default();
        for path in ADMIN_PATHS {
            assert_eq!(evaluate(path, &cookies(None, None), &table), login(path));
            // A forged admin claim without a token still goes to login.
            assert_eq!(
                evaluate(path, &cookies(None, Some(r#"{"is_admin":true}"#)), &table),
                login(path)
            );
        }
    }

    #[test]
    fn admin_paths_for_non_admin_go_home() {
        let table = RouteTable::default();
        let non_admin = cookies(Some("t"), Some(r#"{"id":1,"email":"a@b.co","is_admin":false}"#));
        let no_claim = cookies(Some("t"), None);
        for path in ADMIN_PATHS {
            assert_eq!(
                evaluate(path, &non_admin, &table),
                Decision::Redirect(Redirect::Home)
            );
            assert_eq!(
                evaluate(path, &no_claim, &table),
                Decision::Redirect(Redirect::Home)
            );
        }
    }

    #[test]
    fn admin_paths_for_admin_are_allowed() {
        let table = RouteTable::default();
        let admin = cookies(Some("t"), Some(r#"{"is_admin":true}"#));
        for path in ADMIN_PATHS {
            assert_eq!(evaluate(path, &admin, &table), Decision::Allow);
        }
        assert_eq!(evaluate("/admin/users", &admin, &table), Decision::Allow);
    }

    #[test]
    fn protected_paths_need_any_token() {
        let table = RouteTable::default();
        let user = cookies(Some("t"), Some(r#"{"is_admin":false}"#));
        let admin = cookies(Some("t"), Some(r#"{"is_admin":true}"#));
        for path in PROTECTED_PATHS {
            assert_eq!(evaluate(path, &cookies(None, None), &table), login(path));
            assert_eq!(evaluate(path, &user, &table), Decision::Allow);
            assert_eq!(evaluate(path, &admin, &table), Decision::Allow);
            assert_eq!(evaluate(path, &cookies(Some("t"), None), &table), Decision::Allow);
        }
    }

    #[test]
    fn auth_only_paths_bounce_signed_in_visitors() {
        let table = RouteTable::default();
        for path in ["/login", "/register"] {
            assert_eq!(evaluate(path, &cookies(None, None), &table), Decision::Allow);
            assert_eq!(
                evaluate(path, &cookies(Some("t"), None), &table),
                Decision::Redirect(Redirect::Home)
            );
            assert_eq!(
                evaluate(path, &cookies(Some("t"), Some(r#"{"is_admin":true}"#)), &table),
                Decision::Redirect(Redirect::Home)
            );
        }
    }

    #[test]
    fn public_paths_are_always_allowed() {
        let table = RouteTable::default();
        for path in ["/", "/products", "/products/7", "/about"] {
            assert_eq!(evaluate(path, &cookies(None, None), &table), Decision::Allow);
            assert_eq!(evaluate(path, &cookies(Some("t"), None), &table), Decision::Allow);
        }
    }

    #[test]
    fn empty_token_is_anonymous() {
        let table = RouteTable::default();
        assert_eq!(evaluate("/cart", &cookies(Some(""), None), &table), login("/cart"));
    }

    #[test]
    fn undecodable_token_is_anonymous() {
        let table = RouteTable::default();
        assert_eq!(evaluate("/cart", &cookies(Some("%FF"), None), &table), login("/cart"));
        assert_eq!(
            evaluate("/login", &cookies(Some("%FF%FE"), None), &table),
            Decision::Allow
        );
    }

    #[test]
    fn malformed_user_data_is_not_admin() {
        let table = RouteTable::default();
        for raw in ["%7Bnot-json", "%FF%FE", "true", "%5B%5D", "%7B%22is_admin%22%3A%22yes%22%7D"] {
            let jar = RequestCookies::parse(&format!("access_token=t; user_data={raw}"));
            assert!(!admin_claim(&jar), "{raw} must not grant admin");
            assert_eq!(
                evaluate("/admin/users", &jar, &table),
                Decision::Redirect(Redirect::Home)
            );
        }
    }

    #[test]
    fn login_location_carries_path_verbatim() {
        let redirect = Redirect::Login {
            return_to: "/admin/users".to_string(),
        };
        assert_eq!(redirect.location(), "/login?redirect=/admin/users");
        assert_eq!(Redirect::Home.location(), "/");

        let escaped = Redirect::Login {
            return_to: "/orders/a&b#c".to_string(),
        };
        assert_eq!(escaped.location(), "/login?redirect=/orders/a%26b%23c");
    }
}
