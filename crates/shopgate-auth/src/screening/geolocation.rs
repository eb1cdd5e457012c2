//! Geolocation lookup for network addresses.

use std::sync::Arc;

use serde::Deserialize;

use shopgate_core::error::{AppError, ErrorKind};
use shopgate_core::result::AppResult;
use shopgate_resilience::OperationGuard;

/// Resolved location of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl std::fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        if parts.is_empty() {
            write!(f, "unknown")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
}

/// Client for the ip-api style geolocation endpoint.
#[derive(Debug, Clone)]
pub struct GeolocationClient {
    http: reqwest::Client,
    base_url: String,
    guard: Arc<OperationGuard>,
}

impl GeolocationClient {
    pub fn new(http: reqwest::Client, base_url: String, guard: Arc<OperationGuard>) -> Self {
        Self {
            http,
            base_url,
            guard,
        }
    }

    /// Look up an address. `None` means the service had no data for
    /// it, which is a valid answer, not a failure.
    pub async fn lookup(&self, address: &str) -> AppResult<Option<GeoLocation>> {
        self.guard
            .run_optional(|| async {
                let url = format!("{}/{}", self.base_url.trim_end_matches('/'), address);
                let response = self.http.get(&url).send().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Dependency, "Geolocation request failed", e)
                })?;
                if !response.status().is_success() {
                    return Err(AppError::dependency(format!(
                        "Geolocation service returned {}",
                        response.status()
                    )));
                }
                let body: GeoResponse = response.json().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Dependency, "Malformed geolocation reply", e)
                })?;
                if body.status != "success" {
                    return Ok(None);
                }
                Ok(Some(GeoLocation {
                    country: body.country,
                    region: body.region_name,
                    city: body.city,
                }))
            })
            .await
    }
}
