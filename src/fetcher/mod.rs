//! Page retrieval for the two upstream resources.
//!
//! The network side is behind [`HttpGet`] so the parsers and the refresh loop
//! can run against canned pages. Header construction (user agent rotation)
//! happens here; request execution belongs to the implementation.

pub mod catalog;
pub mod extract;
pub mod listings;

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use tracing::debug;

use crate::config::USER_AGENTS;
use crate::error::{AppError, Result};

pub use catalog::{fetch_catalog, parse_catalog};
pub use listings::{fetch_listings, parse_listings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal GET capability the fetchers need.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;
}

/// Production [`HttpGet`] backed by a shared reqwest client.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpGet for ReqwestClient {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Pick one of the fixed browser user agents at random.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// GET `url` with a rotated user agent and return the body of a 2xx response.
/// Any other status becomes [`AppError::Fetch`] carrying the body verbatim.
pub async fn fetch_page(source: &dyn HttpGet, url: &str, resource: &'static str) -> Result<String> {
    let headers = [(USER_AGENT.as_str().to_string(), random_user_agent().to_string())];
    let resp = source.get(url, &headers).await?;
    debug!(resource, status = resp.status, bytes = resp.body.len(), "Fetched {url}");

    if !resp.is_success() {
        return Err(AppError::Fetch {
            resource,
            status: resp.status,
            body: resp.body,
        });
    }
    Ok(resp.body)
}
