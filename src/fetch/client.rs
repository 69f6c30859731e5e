use async_trait::async_trait;
use reqwest::{Method, Request, Response, Url};

/// Transport seam for every outbound call to the flight API.
///
/// Wrappers such as [`ApiKey`](super::auth::ApiKey) decorate a request and
/// delegate to an inner client, so headers can be layered without the
/// fetcher knowing about them.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;

    async fn get(&self, url: Url) -> reqwest::Result<Response> {
        self.execute(Request::new(Method::GET, url)).await
    }
}
