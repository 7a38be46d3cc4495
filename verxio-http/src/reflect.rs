//! An [`EarnPool`] implementation that talks to a _remote_ reflect earn-pool
//! service over HTTP.
//!
//! The [`ReflectClient`] handles the `/deposit` and `/withdraw` endpoints of
//! the reflect service and implements the [`EarnPool`] trait so it can be
//! injected wherever the checkout expects an earn-pool delegate.
//!
//! ## Error Handling
//!
//! A failed action surfaces as [`EarnPoolError`]: when the service answers
//! an error status with a JSON `{error}` body, the pool's own message is
//! forwarded verbatim; transport and decode failures keep the underlying
//! error as their source.

use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use reqwest::Client;
use serde::Deserialize;
use url::Url;
use verxio::earn::{DepositRequest, EarnPool, EarnReceipt, WithdrawRequest};
use verxio::error::EarnPoolError;

/// Errors constructing a [`ReflectClient`].
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum ReflectClientError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Error body the reflect service returns for a failed action.
#[derive(Debug, Deserialize)]
struct PoolErrorBody {
    error: String,
}

/// A client for communicating with a remote reflect earn-pool service.
///
/// Handles the `/deposit` and `/withdraw` endpoints via JSON HTTP.
#[derive(Clone, Debug)]
pub struct ReflectClient {
    /// Base URL of the service (e.g. `https://api.reflect.money/earn/`)
    base_url: Url,
    /// Full URL for `POST /deposit` requests
    deposit_url: Url,
    /// Full URL for `POST /withdraw` requests
    withdraw_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional custom headers sent with each request
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl ReflectClient {
    /// Returns the base URL used by this client.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the computed `./deposit` URL relative to [`ReflectClient::base_url`].
    pub const fn deposit_url(&self) -> &Url {
        &self.deposit_url
    }

    /// Returns the computed `./withdraw` URL relative to [`ReflectClient::base_url`].
    pub const fn withdraw_url(&self) -> &Url {
        &self.withdraw_url
    }

    /// Returns any custom headers configured on the client.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    pub const fn timeout(&self) -> &Option<Duration> {
        &self.timeout
    }

    /// Constructs a new [`ReflectClient`] from a base URL.
    ///
    /// This sets up the `./deposit` and `./withdraw` endpoint URLs relative
    /// to the base.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectClientError`] if URL construction fails.
    pub fn try_new(base_url: Url) -> Result<Self, ReflectClientError> {
        let client = Client::new();
        let deposit_url = base_url
            .join("./deposit")
            .map_err(|e| ReflectClientError::UrlParse {
                context: "Failed to construct ./deposit URL",
                source: e,
            })?;
        let withdraw_url = base_url
            .join("./withdraw")
            .map_err(|e| ReflectClientError::UrlParse {
                context: "Failed to construct ./withdraw URL",
                source: e,
            })?;
        Ok(Self {
            client,
            base_url,
            deposit_url,
            withdraw_url,
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends a `POST /deposit` request to the reflect service.
    ///
    /// # Errors
    ///
    /// Returns [`EarnPoolError`] if the pool rejects the deposit or the
    /// request fails.
    pub async fn deposit(&self, request: &DepositRequest) -> Result<EarnReceipt, EarnPoolError> {
        self.post_json(&self.deposit_url, "deposit", request).await
    }

    /// Sends a `POST /withdraw` request to the reflect service.
    ///
    /// # Errors
    ///
    /// Returns [`EarnPoolError`] if the pool rejects the withdrawal or the
    /// request fails.
    pub async fn withdraw(&self, request: &WithdrawRequest) -> Result<EarnReceipt, EarnPoolError> {
        self.post_json(&self.withdraw_url, "withdraw", request).await
    }

    /// Generic POST helper that handles JSON serialization, error mapping,
    /// and timeout application.
    ///
    /// `context` names the earn action for error messages (e.g. `"deposit"`).
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, EarnPoolError>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.post(url.clone()).json(payload);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let response = req.send().await.map_err(|e| EarnPoolError::Transport {
            context,
            source: Box::new(e),
        })?;

        let status = response.status();
        if status == StatusCode::OK {
            response
                .json::<R>()
                .await
                .map_err(|e| EarnPoolError::InvalidResponse {
                    context,
                    source: Box::new(e),
                })
        } else {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<PoolErrorBody>(&body) {
                Ok(body) => Err(EarnPoolError::pool(body.error)),
                Err(_) => {
                    tracing::warn!(%status, context, "reflect service returned an opaque error");
                    Err(EarnPoolError::HttpStatus {
                        context,
                        status: status.as_u16(),
                    })
                }
            }
        }
    }
}

#[async_trait]
impl EarnPool for ReflectClient {
    /// Forwards a deposit to the reflect service.
    async fn deposit(&self, request: &DepositRequest) -> Result<EarnReceipt, EarnPoolError> {
        Self::deposit(self, request).await
    }

    /// Forwards a withdrawal to the reflect service.
    async fn withdraw(&self, request: &WithdrawRequest) -> Result<EarnReceipt, EarnPoolError> {
        Self::withdraw(self, request).await
    }
}

/// Converts a string URL into a [`ReflectClient`], parsing the URL and calling `try_new`.
impl TryFrom<&str> for ReflectClient {
    type Error = ReflectClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Normalize: strip trailing slashes and add a single trailing slash
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| ReflectClientError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        Self::try_new(url)
    }
}

/// Converts a String URL into a [`ReflectClient`].
impl TryFrom<String> for ReflectClient {
    type Error = ReflectClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}
