use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(ObstacleId);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Path points travel as `[lat, lng]` pairs.
    pub fn from_pair([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }

    pub fn to_pair(self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected `lat,lng`, got `{0}`")]
pub struct ParseCoordinateError(pub String);

impl FromStr for Coordinate {
    type Err = ParseCoordinateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordinateError(raw.to_string());
        let (lat, lng) = raw.split_once(',').ok_or_else(err)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| err())?;
        let lng = lng.trim().parse::<f64>().map_err(|_| err())?;
        let coordinate = Coordinate::new(lat, lng);
        if !coordinate.is_finite() {
            return Err(err());
        }
        Ok(coordinate)
    }
}

/// Server-side path computation strategies, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmId {
    ParallelDijkstra,
    ParallelAstar,
    ParallelBellmanFord,
    SequentialDijkstra,
    SequentialAstar,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 5] = [
        AlgorithmId::ParallelDijkstra,
        AlgorithmId::ParallelAstar,
        AlgorithmId::ParallelBellmanFord,
        AlgorithmId::SequentialDijkstra,
        AlgorithmId::SequentialAstar,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AlgorithmId::ParallelDijkstra => "parallel_dijkstra",
            AlgorithmId::ParallelAstar => "parallel_astar",
            AlgorithmId::ParallelBellmanFord => "parallel_bellman_ford",
            AlgorithmId::SequentialDijkstra => "sequential_dijkstra",
            AlgorithmId::SequentialAstar => "sequential_astar",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Wire identifier with every underscore rendered as a space.
    pub fn display_name(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = UnknownAlgorithm;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        AlgorithmId::ALL
            .into_iter()
            .find(|id| id.as_str() == raw)
            .ok_or_else(|| UnknownAlgorithm(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown algorithm identifier `{0}`")]
pub struct UnknownAlgorithm(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTime {
    pub hours: u32,
    pub minutes: u32,
}
