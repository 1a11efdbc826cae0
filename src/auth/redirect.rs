use crate::{guard::RouteTable, session::UserProfile};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub const VERIFY_EMAIL_PATH: &str = "/verify-email";

/// RFC 3986 unreserved bytes stay as-is.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Where to send a user right after a successful sign-in.
///
/// Unverified users always land on the verification page. Otherwise the
/// `redirect` carried from the guard is honored when it is a same-origin path
/// that does not point back at a sign-in page.
#[must_use]
pub fn post_login_destination(
    redirect: Option<&str>,
    user: &UserProfile,
    routes: &RouteTable,
) -> String {
    if !user.email_verified {
        return format!(
            "{VERIFY_EMAIL_PATH}?email={}",
            utf8_percent_encode(&user.email, QUERY_COMPONENT)
        );
    }

    redirect
        .map(str::trim)
        .filter(|target| is_local_path(target) && !routes.is_auth_only(target))
        .map_or_else(|| "/".to_string(), str::to_string)
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::credentials::tests::profile;

    #[test]
    fn verified_user_goes_to_redirect() {
        let routes = RouteTable::default();
        let user = profile(false, true);
        assert_eq!(
            post_login_destination(Some("/orders/12"), &user, &routes),
            "/orders/12"
        );
        assert_eq!(
            post_login_destination(Some("/admin/users"), &user, &routes),
            "/admin/users"
        );
    }

    #[test]
    fn missing_or_unsafe_redirect_goes_home() {
        let routes = RouteTable::default();
        let user = profile(false, true);
        for target in [
            None,
            Some(""),
            Some("https://evil.example.com"),
            Some("//evil.example.com/cart"),
            Some("/\\evil.example.com"),
            Some("cart"),
            Some("/login"),
            Some("/register?next=/cart"),
        ] {
            assert_eq!(post_login_destination(target, &user, &routes), "/", "{target:?}");
        }
    }

    #[test]
    fn unverified_user_goes_to_verification() {
        let routes = RouteTable::default();
        let user = profile(false, false);
        assert_eq!(
            post_login_destination(Some("/cart"), &user, &routes),
            "/verify-email?email=ana%40example.com"
        );
    }
}
