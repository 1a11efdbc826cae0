//! Reverse proxy to the page renderer.

use crate::APP_USER_AGENT;
use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::{redirect::Policy, Client};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, warn};
use url::Url;

/// Largest request body forwarded upstream.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Clone, Debug)]
pub struct Upstream {
    http: Client,
    base_url: Arc<str>,
}

impl Upstream {
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .with_context(|| format!("Invalid upstream URL: {base_url}"))?;
        // Upstream redirects are handed to the browser untouched.
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            http,
            base_url: Arc::from(parsed.as_str().trim_end_matches('/')),
        })
    }

    fn target(&self, request: &Request) -> String {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map_or("/", |value| value.as_str());
        format!("{}{path_and_query}", self.base_url)
    }

    /// Forward method, path, query, end-to-end headers, and body.
    /// Any upstream failure becomes `502 Bad Gateway`.
    pub async fn forward(&self, request: Request) -> Response {
        let target = self.target(&request);
        let (parts, body) = request.into_parts();

        let body = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Rejecting request body: {err}");
                return StatusCode::PAYLOAD_TOO_LARGE.into_response();
            }
        };

        let mut headers = end_to_end(&parts.headers);
        headers.remove(header::HOST);

        debug!(method = %parts.method, target = %target, "Forwarding to upstream");

        let response = match self
            .http
            .request(parts.method, &target)
            .headers(headers)
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("Upstream request failed: {err}");
                return StatusCode::BAD_GATEWAY.into_response();
            }
        };

        let status = response.status();
        let headers = end_to_end(response.headers());
        match response.bytes().await {
            Ok(bytes) => (status, headers, Body::from(bytes)).into_response(),
            Err(err) => {
                error!("Failed to read upstream response: {err}");
                StatusCode::BAD_GATEWAY.into_response()
            }
        }
    }
}

/// Copy of `headers` without hop-by-hop headers and `Content-Length`.
fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(name)
            || *name == header::CONTENT_LENGTH
            || name.as_str() == "keep-alive"
        {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn new_rejects_invalid_url() {
        assert!(Upstream::new("::not-a-url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn target_keeps_path_and_query() -> Result<()> {
        let upstream = Upstream::new("http://renderer:3000/", Duration::from_secs(1))?;
        let request = axum::http::Request::builder()
            .uri("/products/7?color=red")
            .body(Body::empty())?;
        assert_eq!(
            upstream.target(&request),
            "http://renderer:3000/products/7?color=red"
        );
        Ok(())
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=t"));
        headers.append(header::ACCEPT, HeaderValue::from_static("text/html"));

        let forwarded = end_to_end(&headers);
        assert_eq!(forwarded.len(), 2);
        assert!(forwarded.contains_key(header::COOKIE));
        assert!(forwarded.contains_key(header::ACCEPT));
    }
}
