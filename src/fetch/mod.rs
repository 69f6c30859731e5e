//! HTTP transport: the [`HttpClient`] seam, a timeout-configured base client,
//! header-injecting wrappers and a JSON GET helper.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{EtlError, Result};

/// Issues a GET and decodes the JSON body.
///
/// `204 No Content` yields `Ok(None)`. Any other non-success status is an
/// [`EtlError::Status`].
pub async fn get_json<C, T>(client: &C, url: Url) -> Result<Option<T>>
where
    C: HttpClient,
    T: DeserializeOwned,
{
    let endpoint = url.path().to_string();
    let resp = client.get(url).await?;
    let status = resp.status();

    if status == StatusCode::NO_CONTENT {
        warn!(endpoint, "No content returned");
        return Ok(None);
    }
    if !status.is_success() {
        return Err(EtlError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }

    let body = resp.bytes().await?;
    debug!(endpoint, bytes = body.len(), "Response received");
    Ok(Some(serde_json::from_slice(&body)?))
}
