//! Cookie storage primitives.
//!
//! [`CookieJar`] is the only storage seam the credential store sees. Two
//! implementations exist: [`MemoryCookieJar`] for an in-process session (a
//! browser profile, a CLI, tests) and [`ResponseCookieJar`] for server-side
//! handlers, which reads the inbound `Cookie` header and renders `Set-Cookie`
//! headers for whatever was written. Values are percent-encoded on write; a
//! value that does not decode reads as absent.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError, RwLock},
};
use tracing::warn;

/// Bytes outside the RFC 6265 cookie-octet range, plus `%` so decoding is unambiguous.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// Default cookie lifetime: seven days.
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Percent-encode a cookie value.
#[must_use]
pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, COOKIE_VALUE).to_string()
}

/// Decode a raw cookie value, returning `None` for invalid UTF-8.
#[must_use]
pub fn decode_value(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Synchronous key/value storage with cookie semantics.
///
/// `apply` is the single write primitive: every set and removal in one call is
/// committed under one lock, so readers never observe a partial write.
pub trait CookieJar: Send + Sync {
    /// Decoded value of `name`, if present and decodable.
    fn get(&self, name: &str) -> Option<String>;

    /// Write `set` and delete `remove` in one step.
    fn apply(&self, set: &[(&str, &str)], remove: &[&str]);

    fn set_all(&self, entries: &[(&str, &str)]) {
        self.apply(entries, &[]);
    }

    /// Removing a missing cookie is a no-op.
    fn remove_all(&self, names: &[&str]) {
        self.apply(&[], names);
    }
}

/// Cookies sent by the browser on one request, still percent-encoded.
#[derive(Clone, Debug, Default)]
pub struct RequestCookies {
    values: HashMap<String, String>,
}

impl RequestCookies {
    /// Collect every `Cookie` header; HTTP/2 clients may send several.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Self::default();
        for value in headers.get_all(COOKIE) {
            if let Ok(value) = value.to_str() {
                cookies.extend_from(value);
            }
        }
        cookies
    }

    /// Parse a single `Cookie` header value. Malformed pairs are skipped.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut cookies = Self::default();
        cookies.extend_from(header);
        cookies
    }

    fn extend_from(&mut self, header: &str) {
        for pair in header.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            // Browsers send the most specific cookie first.
            self.values
                .entry(key.to_string())
                .or_insert_with(|| value.trim().trim_matches('"').to_string());
        }
    }

    /// Raw, still-encoded value.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.raw(name).and_then(decode_value)
    }

    /// Present with a non-empty value that decodes, the same test the
    /// credential store applies through [`CookieJar::get`].
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_empty())
    }
}

/// In-process jar. Clones of the owning `Arc` share state.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<RequestCookies> for MemoryCookieJar {
    fn from(cookies: RequestCookies) -> Self {
        Self {
            values: RwLock::new(cookies.values),
        }
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(name).and_then(|raw| decode_value(raw))
    }

    fn apply(&self, set: &[(&str, &str)], remove: &[&str]) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        for name in remove {
            values.remove(*name);
        }
        for (name, value) in set {
            values.insert((*name).to_string(), encode_value(value));
        }
    }
}

/// Attributes applied to every `Set-Cookie` header a [`ResponseCookieJar`] renders.
#[derive(Clone, Debug)]
pub struct CookiePolicy {
    max_age_seconds: u64,
    secure: bool,
    http_only: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
            secure: false,
            http_only: false,
        }
    }
}

impl CookiePolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_age_seconds(mut self, seconds: u64) -> Self {
        self.max_age_seconds = seconds;
        self
    }

    /// Only mark cookies secure when the storefront is served over HTTPS.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Page scripts read these cookies, so `HttpOnly` is off unless requested.
    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    fn render(&self, name: &str, value: Option<&str>) -> String {
        let (value, max_age) = match value {
            Some(value) => (value, self.max_age_seconds),
            None => ("", 0),
        };
        let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax; Max-Age={max_age}");
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[derive(Debug, Default)]
struct ResponseState {
    values: HashMap<String, String>,
    // Latest write per name, in first-write order. `None` renders a removal.
    pending: Vec<(String, Option<String>)>,
}

impl ResponseState {
    fn record(&mut self, name: &str, value: Option<String>) {
        if let Some(entry) = self.pending.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value;
        } else {
            self.pending.push((name.to_string(), value));
        }
    }
}

/// Jar for one request/response exchange.
///
/// Reads see the request cookies overlaid with anything written during the
/// exchange; writes are rendered by [`ResponseCookieJar::write_headers`].
#[derive(Debug)]
pub struct ResponseCookieJar {
    policy: CookiePolicy,
    state: Mutex<ResponseState>,
}

impl ResponseCookieJar {
    #[must_use]
    pub fn new(cookies: RequestCookies, policy: CookiePolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(ResponseState {
                values: cookies.values,
                pending: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap, policy: CookiePolicy) -> Self {
        Self::new(RequestCookies::from_headers(headers), policy)
    }

    /// Rendered `Set-Cookie` values for every write, in order.
    #[must_use]
    pub fn set_cookie_values(&self) -> Vec<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .pending
            .iter()
            .map(|(name, value)| self.policy.render(name, value.as_deref()))
            .collect()
    }

    /// Append a `Set-Cookie` header per write to `headers`.
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        for cookie in self.set_cookie_values() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(err) => warn!("Dropping unrenderable cookie: {err}"),
            }
        }
    }
}

impl CookieJar for ResponseCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.values.get(name).and_then(|raw| decode_value(raw))
    }

    fn apply(&self, set: &[(&str, &str)], remove: &[&str]) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for name in remove {
            state.values.remove(*name);
            state.record(name, None);
        }
        for (name, value) in set {
            let encoded = encode_value(value);
            state.values.insert((*name).to_string(), encoded.clone());
            state.record(name, Some(encoded));
        }
    }
}
