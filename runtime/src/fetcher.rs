//! 基于 reqwest 的请求实现

use std::time::Duration;

use ptgen::error::{Error, Result};
use ptgen::{FetchRequest, Fetcher, Response};

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn fetch_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Fetch(format!("request to {url} timed out"))
    } else {
        Error::Fetch(format!("{url}: {err}"))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Response> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| fetch_error(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(&request.url, e))?;

        tracing::debug!(url = %request.url, status, bytes = body.len(), "fetched");
        Ok(Response { status, body })
    }
}
