use super::client::HttpClient;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Plain `reqwest` client with request and connect timeouts applied.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
