//! Per-algorithm result table and the comparison metrics derived from it.
//!
//! The table is keyed by the fixed [`AlgorithmId::ALL`] enumeration. Every
//! aggregate walks entries in that order, which makes the fastest-algorithm
//! tie-break deterministic: the first entry holding the minimum time wins.

use shared::{
    domain::{AlgorithmId, Coordinate, TravelTime},
    protocol::{AlgorithmResultPayload, PathsPayload},
};
use tracing::warn;

const INVALID_METRICS_ERROR: &str = "server reported missing, non-finite or negative metrics";

#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmResult {
    pub distance_km: f64,
    pub time_secs: f64,
    pub travel_time: TravelTime,
    pub path: Vec<Coordinate>,
    pub error: Option<String>,
}

impl AlgorithmResult {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

impl From<AlgorithmResultPayload> for AlgorithmResult {
    fn from(payload: AlgorithmResultPayload) -> Self {
        let usable = |value: Option<f64>| value.is_some_and(|v| v.is_finite() && v >= 0.0);
        let metrics_ok = usable(payload.time) && usable(payload.distance);
        let error = match payload.error {
            Some(err) => Some(err),
            None if !metrics_ok => Some(INVALID_METRICS_ERROR.to_string()),
            None => None,
        };
        Self {
            distance_km: payload.distance.unwrap_or_default(),
            time_secs: payload.time.unwrap_or_default(),
            travel_time: TravelTime {
                hours: payload.travel_time.hours,
                minutes: payload.travel_time.minutes.min(59),
            },
            path: payload.path.into_iter().map(Coordinate::from_pair).collect(),
            error,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResultTable {
    entries: [Option<AlgorithmResult>; 5],
}

impl PathResultTable {
    /// Builds a full replacement table from a response mapping. Keys outside
    /// the known enumeration are dropped; keys missing from the response stay
    /// absent.
    pub fn from_payload(paths: PathsPayload) -> Self {
        let mut table = Self::default();
        for (name, payload) in paths {
            match name.parse::<AlgorithmId>() {
                Ok(id) => table.entries[id.index()] = Some(payload.into()),
                Err(err) => warn!(algorithm = %name, "paths: dropping entry: {err}"),
            }
        }
        table
    }

    pub fn get(&self, id: AlgorithmId) -> Option<&AlgorithmResult> {
        self.entries[id.index()].as_ref()
    }

    /// Computed entries (valid or failed) in table order.
    pub fn iter(&self) -> impl Iterator<Item = (AlgorithmId, &AlgorithmResult)> + '_ {
        AlgorithmId::ALL
            .into_iter()
            .filter_map(move |id| self.get(id).map(|result| (id, result)))
    }

    pub fn valid(&self) -> impl Iterator<Item = (AlgorithmId, &AlgorithmResult)> + '_ {
        self.iter().filter(|(_, result)| result.is_valid())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    pub fn computed_count(&self) -> usize {
        self.iter().count()
    }

    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    pub fn failed_count(&self) -> usize {
        self.computed_count() - self.valid_count()
    }

    pub fn fastest(&self) -> Option<AlgorithmId> {
        self.valid()
            .fold(None::<(AlgorithmId, f64)>, |best, (id, result)| match best {
                Some((_, best_time)) if best_time <= result.time_secs => best,
                _ => Some((id, result.time_secs)),
            })
            .map(|(id, _)| id)
    }

    /// Aggregates over valid entries; `None` when there are none.
    pub fn metrics(&self) -> Option<PathMetrics> {
        let fastest = self.fastest()?;
        let fastest_time = self.get(fastest)?.time_secs;
        let slowest_time = self
            .valid()
            .map(|(_, result)| result.time_secs)
            .fold(fastest_time, f64::max);
        Some(PathMetrics {
            fastest,
            fastest_time,
            slowest_time,
            valid_count: self.valid_count(),
            failed_count: self.failed_count(),
        })
    }

    /// One row per valid entry, for the comparison panel.
    pub fn rows(&self) -> Vec<AlgorithmRow> {
        let Some(metrics) = self.metrics() else {
            return Vec::new();
        };
        self.valid()
            .map(|(id, result)| AlgorithmRow {
                id,
                time_secs: result.time_secs,
                distance_km: result.distance_km,
                travel_time: result.travel_time,
                is_fastest: id == metrics.fastest,
                speedup: metrics.speedup_of(result.time_secs),
                efficiency_pct: metrics.efficiency_of(result.time_secs),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathMetrics {
    pub fastest: AlgorithmId,
    pub fastest_time: f64,
    pub slowest_time: f64,
    pub valid_count: usize,
    pub failed_count: usize,
}

impl PathMetrics {
    /// How many times faster than the slowest valid entry.
    pub fn speedup_of(&self, time_secs: f64) -> Option<f64> {
        ratio(self.slowest_time, time_secs)
    }

    /// Time as a percentage of the fastest valid entry's time.
    pub fn efficiency_of(&self, time_secs: f64) -> Option<f64> {
        ratio(time_secs, self.fastest_time).map(|r| r * 100.0)
    }

    pub fn max_speedup(&self) -> Option<f64> {
        ratio(self.slowest_time, self.fastest_time)
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmRow {
    pub id: AlgorithmId,
    pub time_secs: f64,
    pub distance_km: f64,
    pub travel_time: TravelTime,
    pub is_fastest: bool,
    pub speedup: Option<f64>,
    pub efficiency_pct: Option<f64>,
}

#[cfg(test)]
#[path = "tests/paths_tests.rs"]
mod tests;
