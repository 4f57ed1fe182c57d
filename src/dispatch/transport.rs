//! Sending prepared requests over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{DispatchError, PreparedRequest};
use crate::config::RequestConfig;
use crate::provider::RequestType;

/// Abstraction over the network so the action pipeline can be tested offline.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response body decoded as UTF-8.
    async fn send(&self, request: PreparedRequest) -> Result<String, DispatchError>;
}

/// `reqwest`-backed transport with a bounded per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &RequestConfig) -> Result<Self, DispatchError> {
        let user_agent = format!("{}/{}", config.user_agent, env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(DispatchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<String, DispatchError> {
        let url = reqwest::Url::parse(&request.url).map_err(|e| DispatchError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;
        let headers = header_map(&request)?;
        let method = match request.method {
            RequestType::Get => reqwest::Method::GET,
            RequestType::Post => reqwest::Method::POST,
        };

        log::debug!(
            "{} {} ({} header(s), {} body bytes)",
            request.method.as_str(),
            url,
            headers.len(),
            request.body.as_ref().map_or(0, Vec::len)
        );

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(DispatchError::Transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(DispatchError::Transport)?;
        log::debug!("Response status {} ({} bytes)", status, bytes.len());
        if !status.is_success() {
            log::warn!("Provider responded with HTTP {}", status);
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn header_map(request: &PreparedRequest) -> Result<HeaderMap, DispatchError> {
    let mut headers = HeaderMap::new();
    for (key, value) in request.headers.iter() {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            DispatchError::InvalidHeader {
                name: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| DispatchError::InvalidHeader {
            name: key.to_string(),
            reason: e.to_string(),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
