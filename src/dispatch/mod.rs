//! Request dispatch for providers.
//!
//! Requests are built as pure data by [`request::prepare`] and then sent
//! through a [`Transport`]; [`dispatch`] ties the two together and races the
//! send against a [`CancelToken`].

pub mod cancel;
pub mod request;
pub mod transport;

pub use cancel::CancelToken;
pub use request::{BOUNDARY, PreparedRequest, prepare};
pub use transport::{HttpTransport, Transport};

use thiserror::Error;

use crate::provider::{OrderedMap, Provider};

/// Errors that abort a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Request cancelled")]
    Cancelled,
}

/// Builds and sends the request for `provider`, returning the response body.
///
/// An empty body is treated as a failure so nothing downstream runs on it.
pub async fn dispatch(
    transport: &dyn Transport,
    provider: &Provider,
    arguments: &OrderedMap,
    headers: &OrderedMap,
    payload: Option<&[u8]>,
    cancel: &CancelToken,
) -> Result<String, DispatchError> {
    if cancel.is_cancelled() {
        return Err(DispatchError::Cancelled);
    }

    let request = prepare(provider, arguments, headers, payload);
    let body = tokio::select! {
        result = transport.send(request) => result?,
        _ = cancel.cancelled() => {
            log::info!("Request to '{}' cancelled", provider.name);
            return Err(DispatchError::Cancelled);
        }
    };

    if body.is_empty() {
        return Err(DispatchError::EmptyResponse);
    }
    Ok(body)
}
