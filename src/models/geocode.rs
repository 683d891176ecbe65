// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Forward geocoding response (only the parts we read)
#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub features: Vec<GeocodingFeature>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodingFeature {
    pub geometry: GeocodingGeometry,
}

/// GeoJSON point, `[longitude, latitude]`
#[derive(Debug, Deserialize)]
pub struct GeocodingGeometry {
    pub coordinates: Vec<f64>,
}

impl GeocodingResponse {
    /// Coordinates of the best (first) match
    pub fn first_coordinates(&self) -> Option<Coordinates> {
        let feature = self.features.first()?;
        match feature.geometry.coordinates.as_slice() {
            [longitude, latitude, ..] => Some(Coordinates {
                latitude: *latitude,
                longitude: *longitude,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_feature_is_lon_lat() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"geometry":{"type":"Point","coordinates":[10.38,55.40]}},
            {"geometry":{"type":"Point","coordinates":[1.0,2.0]}}
        ]}"#;
        let response: GeocodingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.first_coordinates(),
            Some(Coordinates {
                latitude: 55.40,
                longitude: 10.38
            })
        );
    }

    #[test]
    fn test_no_features() {
        let response: GeocodingResponse = serde_json::from_str(r#"{"features":[]}"#).unwrap();
        assert_eq!(response.first_coordinates(), None);

        let response: GeocodingResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.first_coordinates(), None);
    }
}
