//! JSON-over-HTTP binding of [`PathfinderApi`] for the routing backend.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::Coordinate,
    error::{ApiError, ApiException},
    protocol::{
        AddObstacleRequest, AddObstacleResponse, ClearObstaclesResponse, FindPathRequest,
        FindPathResponse, GeocodeRequest, GeocodeResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::PathfinderApi;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct HttpPathfinderApi {
    http: Client,
    base_url: Url,
}

impl HttpPathfinderApi {
    pub fn new(config: HttpApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path `{path}`"))
    }

    async fn post_json<B, T>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "http: POST");
        let mut request = self.http.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&raw)
                .map(|body| body.detail)
                .unwrap_or_else(|_| {
                    if raw.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    } else {
                        raw
                    }
                });
            return Err(ApiException::new(status.as_u16(), detail).into());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("invalid response body from {url}"))
    }
}

/// Ensures the base URL ends in `/` so relative endpoint joins keep any path
/// prefix the backend is mounted under.
fn normalize_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).with_context(|| format!("invalid api base url `{raw}`"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("api base url must use http or https, got `{other}`"),
    }
}

#[async_trait]
impl PathfinderApi for HttpPathfinderApi {
    async fn geocode(&self, query: &str) -> Result<Coordinate> {
        let response: GeocodeResponse = self
            .post_json(
                "geocode",
                Some(&GeocodeRequest {
                    location: query.to_string(),
                }),
            )
            .await?;
        Ok(response.into())
    }

    async fn find_path(&self, start: Coordinate, end: Coordinate) -> Result<FindPathResponse> {
        self.post_json("find_path", Some(&FindPathRequest { start, end }))
            .await
    }

    async fn add_obstacle(&self, coordinate: Coordinate) -> Result<AddObstacleResponse> {
        self.post_json("add_obstacle", Some(&AddObstacleRequest::from(coordinate)))
            .await
    }

    async fn clear_obstacles(&self) -> Result<ClearObstaclesResponse> {
        self.post_json::<(), _>("clear_obstacles", None).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
