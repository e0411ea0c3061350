//! Generic HTTP request helper shared by the REST client and the handshake.
//!
//! Every call accepts exactly one status code (200) and decodes the body as
//! JSON. Failures keep the raw status and body so they can be diagnosed.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::ApiError;

/// Content type of JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP client carrying the durable user token.
pub struct HttpClient {
    client: reqwest::Client,
    user_token: RwLock<Option<String>>,
}

impl HttpClient {
    /// Create a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_token: RwLock::new(None),
        })
    }

    /// Store the durable user token used by authenticated calls.
    pub fn set_user_token(&self, token: String) {
        *self.user_token.write() = Some(token);
    }

    /// The durable user token, if logged in.
    pub fn user_token(&self) -> Option<String> {
        self.user_token.read().clone()
    }

    /// Perform a request and decode the JSON response.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let ApiRequest {
            method,
            url,
            with_auth,
            query,
            body,
        } = request;

        let mut builder = self.client.request(method.clone(), &url);
        if with_auth {
            let token = self.user_token().ok_or(ApiError::NotLoggedIn)?;
            builder = builder.bearer_auth(token);
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(body);
        }

        debug!(%method, %url, with_auth, ?query, "performing request");
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), body = %text, "got response");

        if status != StatusCode::OK {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| ApiError::Decode { source, body: text })
    }
}

/// Description of one HTTP call.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    url: String,
    with_auth: bool,
    query: Vec<(&'static str, String)>,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// A request with an arbitrary method.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            with_auth: false,
            query: Vec::new(),
            body: None,
        }
    }

    /// A `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// A `POST` request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Send the user token as bearer authorization.
    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.with_auth = true;
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(body).map_err(ApiError::Encode)?);
        Ok(self)
    }

    /// Query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(&'static str, String)] {
        &self.query
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
