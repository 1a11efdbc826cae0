//! HTTP boundary adapter for the storefront REST API.
//!
//! [`ApiClient`] owns the connection pool, the request timeout, and the
//! default `Authorization` header that the session bootstrap arms. Responses
//! arrive wrapped in `{success, status_code, message, data?}`; the client
//! unwraps that envelope and turns every failure into an [`ApiError`].
//! Timeouts are the transport's job and nothing here retries.

mod error;

pub use error::{ApiError, ErrorKind, FieldError};

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use tracing::debug;
use url::Url;

use crate::APP_USER_AGENT;

/// Default request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

const fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct EnvelopeStatus {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    status_code: Option<u16>,
}

/// Shared API client. Clones share the pool *and* the default header.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    authorization: Arc<RwLock<Option<SecretString>>>,
}

impl ApiClient {
    /// Build a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .with_context(|| format!("Invalid API base URL: {base_url}"))?;
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build API HTTP client")?;

        Ok(Self {
            http,
            base_url: Arc::from(parsed.as_str().trim_end_matches('/')),
            authorization: Arc::new(RwLock::new(None)),
        })
    }

    /// Same pool and base URL, independent (empty) `Authorization` slot.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: Arc::clone(&self.base_url),
            authorization: Arc::new(RwLock::new(None)),
        }
    }

    /// Arm the default `Authorization: Bearer` header. Re-arming is harmless.
    pub fn set_auth_token(&self, token: &SecretString) {
        let mut slot = self
            .authorization
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(token.clone());
    }

    pub fn clear_auth_token(&self) {
        let mut slot = self
            .authorization
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    #[must_use]
    pub fn has_auth_token(&self) -> bool {
        self.authorization
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> Option<SecretString> {
        self.authorization
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim().trim_start_matches('/'))
    }

    /// GET and return the envelope's `data`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, error statuses, a
    /// `success: false` envelope, or a missing `data` field.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.http.request(Method::GET, self.url(path));
        self.send(builder).await?.require_data()
    }

    /// POST a JSON body and return the envelope's `data`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.request(Method::POST, self.url(path)).json(body);
        self.send(builder).await?.require_data()
    }

    /// POST a JSON body where only the outcome matters; returns the envelope message.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, error statuses, or a
    /// `success: false` envelope.
    pub async fn post_ack<B>(&self, path: &str, body: &B) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.http.request(Method::POST, self.url(path)).json(body);
        let envelope: ApiEnvelope<serde_json::Value> = self.send(builder).await?;
        Ok(envelope.message)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let builder = match self.bearer() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::from_transport(&err))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(&err))?;

        debug!(status, bytes = body.len(), "API response");

        if !(200..300).contains(&status) {
            return Err(ApiError::from_response(status, &body));
        }

        // An empty 2xx body (e.g. 204) is an envelope-less success.
        if body.is_empty() {
            return Ok(ApiEnvelope {
                success: true,
                status_code: Some(status),
                message: String::new(),
                data: None,
            });
        }

        let marker: EnvelopeStatus =
            serde_json::from_slice(&body).map_err(|err| ApiError::malformed(status, err))?;
        if !marker.success {
            return Err(ApiError::from_response(
                marker.status_code.unwrap_or(status),
                &body,
            ));
        }

        serde_json::from_slice(&body).map_err(|err| ApiError::malformed(status, err))
    }
}

impl<T> ApiEnvelope<T> {
    fn require_data(self) -> Result<T, ApiError> {
        let status = self.status_code.unwrap_or(200);
        self.data
            .ok_or_else(|| ApiError::malformed(status, "response carried no data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Product {
        sku: String,
    }

    #[test]
    fn new_rejects_invalid_url() {
        assert!(ApiClient::new("not a url", DEFAULT_TIMEOUT).is_err());
    }

    #[test]
    fn url_joins_without_double_slashes() -> Result<()> {
        let client = ApiClient::new("https://api.example.com/api/v1/", DEFAULT_TIMEOUT)?;
        assert_eq!(
            client.url("/auth/login"),
            "https://api.example.com/api/v1/auth/login"
        );
        assert_eq!(client.url("auth/me"), "https://api.example.com/api/v1/auth/me");
        Ok(())
    }

    #[test]
    fn clones_share_the_header_but_forks_do_not() -> Result<()> {
        let client = ApiClient::new("https://api.example.com", DEFAULT_TIMEOUT)?;
        let clone = client.clone();
        let fork = client.fork();

        client.set_auth_token(&SecretString::from("t"));
        assert!(clone.has_auth_token());
        assert!(!fork.has_auth_token());

        clone.clear_auth_token();
        assert!(!client.has_auth_token());
        Ok(())
    }

    #[tokio::test]
    async fn get_unwraps_data_and_sends_bearer() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/1"))
            .and(header("Authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "status_code": 200,
                "message": "ok",
                "data": { "sku": "SKU-1" }
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT)?;
        client.set_auth_token(&SecretString::from("token-1"));
        let product: Product = client.get("/products/1").await?;
        assert_eq!(product.sku, "SKU-1");
        Ok(())
    }

    #[tokio::test]
    async fn unsuccessful_envelope_uses_its_status_code() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "status_code": 403,
                "message": "Account disabled"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT)?;
        let result: Result<Product, ApiError> = client.post("/auth/login", &json!({})).await;
        let err = result.err().context("expected an error")?;
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert_eq!(err.status, Some(403));
        assert_eq!(err.message, "Account disabled");
        Ok(())
    }

    #[tokio::test]
    async fn missing_data_is_unknown() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "status_code": 200,
                "message": "ok"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT)?;
        let result: Result<Product, ApiError> = client.get("/auth/me").await;
        assert_eq!(
            result.err().map(|err| err.kind),
            Some(ErrorKind::Unknown)
        );
        Ok(())
    }

    #[tokio::test]
    async fn post_ack_accepts_empty_body() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT)?;
        let message = client.post_ack("/auth/logout", &json!({})).await?;
        assert!(message.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() -> Result<()> {
        let port = match TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener.local_addr()?.port(),
            Err(_) => {
                eprintln!("Skipping test: cannot bind localhost");
                return Ok(());
            }
        };
        // The listener is dropped, so nothing accepts on this port.
        let client = ApiClient::new(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
        )?;
        let result: Result<Product, ApiError> = client.get("/auth/me").await;
        assert_eq!(
            result.err().map(|err| err.kind),
            Some(ErrorKind::Network)
        );
        Ok(())
    }
}
