use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, TravelTime};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeRequest {
    pub location: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub lat: f64,
    pub lng: f64,
}

impl From<GeocodeResponse> for Coordinate {
    fn from(value: GeocodeResponse) -> Self {
        Coordinate::new(value.lat, value.lng)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindPathRequest {
    pub start: Coordinate,
    pub end: Coordinate,
}

/// One algorithm's entry in a path response. Failed entries arrive as a bare
/// `{"error": "..."}` object, so every other field defaults. Metrics stay
/// optional so a missing value is never read as zero cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmResultPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default)]
    pub travel_time: TravelTime,
    #[serde(default)]
    pub path: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw algorithm-name keyed mapping; unknown names are filtered by the client.
pub type PathsPayload = BTreeMap<String, AlgorithmResultPayload>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindPathResponse {
    pub paths: PathsPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddObstacleRequest {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinate> for AddObstacleRequest {
    fn from(value: Coordinate) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

/// Recomputed paths piggybacked on obstacle responses. The server reports a
/// whole-table failure (e.g. no route left after blocking roads) in place of
/// the mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdatedPaths {
    Failed(UpdatedPathsFailure),
    Table(PathsPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatedPathsFailure {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddObstacleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_paths: Option<UpdatedPaths>,
}

/// Any recomputed paths the server attaches are not decoded; the client
/// schedules its own recomputation after a clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearObstaclesResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updated_paths_distinguishes_failure_from_table() {
        let failed: UpdatedPaths =
            serde_json::from_str(r#"{"error": "Could not find path"}"#).expect("failure");
        assert_eq!(
            failed,
            UpdatedPaths::Failed(UpdatedPathsFailure {
                error: "Could not find path".to_string()
            })
        );

        let table: UpdatedPaths = serde_json::from_str(
            r#"{"parallel_astar": {"error": "timeout"}, "sequential_astar": {"time": 0.5, "distance": 2.0}}"#,
        )
        .expect("table");
        let UpdatedPaths::Table(paths) = table else {
            panic!("expected table");
        };
        assert_eq!(paths["parallel_astar"].error.as_deref(), Some("timeout"));
        assert_eq!(paths["sequential_astar"].time, Some(0.5));
        assert_eq!(paths["parallel_astar"].time, None);
    }

    #[test]
    fn add_obstacle_response_tolerates_missing_optional_fields() {
        let response: AddObstacleResponse =
            serde_json::from_str(r#"{"success": false, "obstacle_placed": false}"#)
                .expect("decode");
        assert!(!response.success);
        assert_eq!(response.updated_paths, None);
    }
}
