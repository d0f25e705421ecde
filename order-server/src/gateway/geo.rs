//! Delivery route planning seam.
//!
//! [`RoutePlanner`] talks to an external geocoding + route service
//! over HTTP; [`FixedDistance`] is the stub used in development and
//! tests. The lifecycle only ever sees a distance in the service's
//! own distance-units, or a planning failure.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Route service unreachable: {0}")]
    Unreachable(String),

    #[error("Route planning failed: {0}")]
    Planning(String),
}

#[async_trait]
pub trait GeoDistanceService: Send + Sync {
    /// Planned driving distance between two structured addresses.
    async fn distance_between(&self, origin: &str, destination: &str) -> Result<u32, GeoError>;
}

// =============================================================================
// HTTP route planner
// =============================================================================

/// HTTP adapter for a geocoding + lite-route-planning service.
///
/// Two calls per lookup: each address is geocoded to a coordinate,
/// then a driving route is planned between the two coordinates and
/// the first route's distance is returned.
pub struct RoutePlanner {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RoutePlanner {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Geocode a structured address into a "lat,lng" coordinate.
    async fn coordinate(&self, address: &str) -> Result<String, GeoError> {
        let url = format!("{}/geocoding/v3", self.base_url);
        let body: serde_json::Value = self
            .http
            .get(&url)
            .query(&[
                ("address", address),
                ("output", "json"),
                ("ak", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GeoError::Unreachable(e.to_string()))?
            .json()
            .await
            .map_err(|e| GeoError::Planning(format!("invalid geocoding response: {}", e)))?;

        let location = &body["result"]["location"];
        match (location["lat"].as_f64(), location["lng"].as_f64()) {
            (Some(lat), Some(lng)) => Ok(format!("{},{}", lat, lng)),
            _ => Err(GeoError::Planning(format!(
                "address could not be geocoded: {}",
                address
            ))),
        }
    }
}

#[async_trait]
impl GeoDistanceService for RoutePlanner {
    async fn distance_between(&self, origin: &str, destination: &str) -> Result<u32, GeoError> {
        let origin_coord = self.coordinate(origin).await?;
        let destination_coord = self.coordinate(destination).await?;

        let url = format!("{}/directionlite/v1/driving", self.base_url);
        let body: serde_json::Value = self
            .http
            .get(&url)
            .query(&[
                ("origin", origin_coord.as_str()),
                ("destination", destination_coord.as_str()),
                ("ak", self.api_key.as_str()),
                ("steps_info", "0"),
            ])
            .send()
            .await
            .map_err(|e| GeoError::Unreachable(e.to_string()))?
            .json()
            .await
            .map_err(|e| GeoError::Planning(format!("invalid route response: {}", e)))?;

        if body["status"].as_i64() != Some(0) {
            return Err(GeoError::Planning(format!(
                "route service status {}",
                body["status"]
            )));
        }

        // First planned route's distance.
        body["result"]["routes"][0]["distance"]
            .as_u64()
            .map(|d| d as u32)
            .ok_or_else(|| GeoError::Planning("no route in response".to_string()))
    }
}

// =============================================================================
// Fixed-distance stub
// =============================================================================

/// Stub returning a constant distance, for development and tests.
pub struct FixedDistance(pub u32);

#[async_trait]
impl GeoDistanceService for FixedDistance {
    async fn distance_between(&self, _origin: &str, _destination: &str) -> Result<u32, GeoError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_distance_returns_constant() {
        let geo = FixedDistance(1200);
        let d = geo
            .distance_between("1 North Street", "2 South Street")
            .await
            .unwrap();
        assert_eq!(d, 1200);
    }
}
