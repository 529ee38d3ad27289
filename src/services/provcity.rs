//! Indonesian province and city lookups, proxied from an upstream directory.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::error::ApiError;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Province {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct City {
    pub id: String,
    pub province_id: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("'{0}' is not a valid region id")]
    InvalidId(String),
    #[error("region directory unavailable: {0}")]
    Upstream(String),
}

impl From<RegionError> for ApiError {
    fn from(err: RegionError) -> Self {
        match err {
            RegionError::NotFound(_) => ApiError::not_found(err.to_string()),
            RegionError::InvalidId(_) => ApiError::bad_request(err.to_string()),
            RegionError::Upstream(_) => ApiError::error(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

impl From<reqwest::Error> for RegionError {
    fn from(err: reqwest::Error) -> Self {
        RegionError::Upstream(err.to_string())
    }
}

/// Region ids are numeric strings such as `"32"` or `"3273"`.
pub fn validate_id(id: &str) -> Result<(), RegionError> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(RegionError::InvalidId(id.to_string()))
    }
}

#[async_trait]
pub trait RegionDirectory: Send + Sync {
    async fn provinces(&self) -> Result<Vec<Province>, RegionError>;
    async fn cities(&self, province_id: &str) -> Result<Vec<City>, RegionError>;
    async fn province(&self, id: &str) -> Result<Province, RegionError>;
    async fn city(&self, id: &str) -> Result<City, RegionError>;
}

/// Client for the public emsifa region API.
#[derive(Debug, Clone)]
pub struct EmsifaClient {
    http: reqwest::Client,
    base_url: String,
}

impl EmsifaClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, RegionError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("fetching {}", url);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegionError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            warn!(%status, "region directory answered {} with an error", url);
            return Err(RegionError::Upstream(format!("upstream returned {status}")));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RegionDirectory for EmsifaClient {
    async fn provinces(&self) -> Result<Vec<Province>, RegionError> {
        self.get("provinces.json", "provinces").await
    }

    async fn cities(&self, province_id: &str) -> Result<Vec<City>, RegionError> {
        validate_id(province_id)?;
        self.get(&format!("regencies/{province_id}.json"), "province")
            .await
    }

    async fn province(&self, id: &str) -> Result<Province, RegionError> {
        validate_id(id)?;
        self.get(&format!("province/{id}.json"), "province").await
    }

    async fn city(&self, id: &str) -> Result<City, RegionError> {
        validate_id(id)?;
        self.get(&format!("regency/{id}.json"), "city").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_digits() {
        assert!(validate_id("32").is_ok());
        assert!(validate_id("3273").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc").is_err());
        assert!(validate_id("32a").is_err());
    }

    #[test]
    fn errors_map_to_http_statuses() {
        let not_found: ApiError = RegionError::NotFound("city".into()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.messages(), &["city not found".to_string()]);

        let upstream: ApiError = RegionError::Upstream("timeout".into()).into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = EmsifaClient::new("https://regions.test/api/").unwrap();
        assert_eq!(client.base_url, "https://regions.test/api");
    }
}
