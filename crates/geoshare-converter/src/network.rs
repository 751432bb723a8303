//! The network capability the state machine depends on.
//!
//! Both operations are single outbound requests. Dropping the returned
//! future abandons the request.

use std::future::Future;
use std::time::Duration;

use geoshare_core::AppConfig;
use reqwest::{redirect, Client, StatusCode, Url};

use crate::error::NetworkError;

pub trait Network {
    /// Resolves a short link by reading the `Location` of its `302` response.
    fn head_lookup(&self, url: &Url) -> impl Future<Output = Result<Url, NetworkError>>;

    /// Fetches a page body, following redirects.
    fn fetch_body(&self, url: &Url) -> impl Future<Output = Result<String, NetworkError>>;
}

impl<T: Network + ?Sized> Network for &T {
    fn head_lookup(&self, url: &Url) -> impl Future<Output = Result<Url, NetworkError>> {
        (**self).head_lookup(url)
    }

    fn fetch_body(&self, url: &Url) -> impl Future<Output = Result<String, NetworkError>> {
        (**self).fetch_body(url)
    }
}

/// [`Network`] over HTTP.
///
/// Holds two clients: one that never follows redirects (the first `Location`
/// is the answer) and one that follows them transparently.
pub struct HttpNetwork {
    unshorten: Client,
    fetch: Client,
}

impl HttpNetwork {
    /// Creates clients with the given timeouts and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Http`] if a `reqwest::Client` cannot be built.
    pub fn new(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, NetworkError> {
        let unshorten = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .redirect(redirect::Policy::none())
            .user_agent(user_agent)
            .build()?;
        let fetch = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { unshorten, fetch })
    }

    /// # Errors
    ///
    /// Returns [`NetworkError::Http`] if a `reqwest::Client` cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, NetworkError> {
        Self::new(
            config.connect_timeout_secs,
            config.read_timeout_secs,
            &config.user_agent,
        )
    }
}

impl Network for HttpNetwork {
    async fn head_lookup(&self, url: &Url) -> Result<Url, NetworkError> {
        let response = self.unshorten.head(url.clone()).send().await?;
        let status = response.status();

        if status != StatusCode::FOUND {
            return Err(NetworkError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .ok_or_else(|| NetworkError::MissingLocation {
                url: url.to_string(),
            })?;
        let location = location
            .to_str()
            .map_err(|_| NetworkError::MalformedRedirect {
                location: String::from_utf8_lossy(location.as_bytes()).into_owned(),
                url: url.to_string(),
            })?;

        // A relative Location resolves against the short link itself.
        url.join(location)
            .map_err(|_| NetworkError::MalformedRedirect {
                location: location.to_owned(),
                url: url.to_string(),
            })
    }

    async fn fetch_body(&self, url: &Url) -> Result<String, NetworkError> {
        let response = self
            .fetch
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;
        let status = response.status();

        if status != StatusCode::OK {
            return Err(NetworkError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
