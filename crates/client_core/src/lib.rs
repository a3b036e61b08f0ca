use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::Coordinate,
    protocol::{AddObstacleResponse, ClearObstaclesResponse, FindPathResponse},
};

pub mod error;
pub mod format;
mod map_router;
pub mod obstacles;
pub mod paths;
mod session;
pub mod transport;
pub mod viewport;

pub use error::{Operation, PreconditionError, SessionError};
pub use map_router::{route_click, ClickRoute, MapClickOutcome};
pub use obstacles::{Obstacle, ObstacleLedger};
pub use paths::{AlgorithmResult, AlgorithmRow, PathMetrics, PathResultTable};
pub use session::{
    ClearOutcome, LocationSlot, ObstacleOutcome, ObstacleRecompute, PathfinderSession,
    PathsOutcome, Selection, SessionEvent, SessionPolicy, SessionSnapshot, Slot,
    DEFAULT_RECOMPUTE_DELAY,
};
pub use transport::{HttpApiConfig, HttpPathfinderApi};
pub use viewport::{CameraCommand, ViewportConfig, ViewportController, ViewportPhase};

/// Backend operations the session depends on. Implementations own transport
/// concerns; the session only sees decoded payloads or an error.
#[async_trait]
pub trait PathfinderApi: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Coordinate>;
    async fn find_path(&self, start: Coordinate, end: Coordinate) -> Result<FindPathResponse>;
    async fn add_obstacle(&self, coordinate: Coordinate) -> Result<AddObstacleResponse>;
    async fn clear_obstacles(&self) -> Result<ClearObstaclesResponse>;
}

pub struct MissingPathfinderApi;

#[async_trait]
impl PathfinderApi for MissingPathfinderApi {
    async fn geocode(&self, query: &str) -> Result<Coordinate> {
        Err(anyhow!("routing backend unavailable; cannot geocode `{query}`"))
    }

    async fn find_path(&self, start: Coordinate, end: Coordinate) -> Result<FindPathResponse> {
        Err(anyhow!(
            "routing backend unavailable; cannot route {start} -> {end}"
        ))
    }

    async fn add_obstacle(&self, coordinate: Coordinate) -> Result<AddObstacleResponse> {
        Err(anyhow!(
            "routing backend unavailable; cannot place obstacle at {coordinate}"
        ))
    }

    async fn clear_obstacles(&self) -> Result<ClearObstaclesResponse> {
        Err(anyhow!("routing backend unavailable; cannot clear obstacles"))
    }
}
