use crate::error::{EtlError, Result};
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects a fixed header into every request.
///
/// The flight API authenticates with two headers (`app_id` and `app_key`) and
/// negotiates its payload through `ResourceVersion`, so wrappers are stacked:
/// `ApiKey<ApiKey<ApiKey<BasicClient>>>`. Name and value are validated once at
/// construction.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| EtlError::InvalidHeader(format!("name '{header_name}': {e}")))?;
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| EtlError::InvalidHeader(format!("value for '{header_name}': {e}")))?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_rejects_invalid_header_name() {
        let client = BasicClient::new(5).unwrap();
        assert!(ApiKey::new(client, "bad header", "x").is_err());
    }

    #[tokio::test]
    async fn test_stacked_headers_reach_the_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .match_header("app_id", "my-id")
            .match_header("app_key", "my-key")
            .with_status(200)
            .create_async()
            .await;

        let client = ApiKey::new(
            ApiKey::new(BasicClient::new(5).unwrap(), "app_id", "my-id").unwrap(),
            "app_key",
            "my-key",
        )
        .unwrap();
        let url = format!("{}/ping", server.url()).parse().unwrap();
        let resp = client.get(url).await.unwrap();

        assert_eq!(resp.status().as_u16(), 200);
        mock.assert_async().await;
    }
}
