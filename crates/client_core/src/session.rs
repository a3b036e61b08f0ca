//! Session store: the single owner of planning state.
//!
//! All mutation goes through [`PathfinderSession`] actions. Each action builds
//! its next state under the session lock and releases the lock before any
//! backend call, so observers only ever see whole updates.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{AlgorithmId, Coordinate},
    protocol::{PathsPayload, UpdatedPaths},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::{Operation, PreconditionError, SessionError},
    obstacles::{Obstacle, ObstacleLedger},
    paths::{AlgorithmResult, AlgorithmRow, PathMetrics, PathResultTable},
    viewport::{CameraCommand, ViewportConfig, ViewportController},
    MissingPathfinderApi, PathfinderApi,
};

pub const DEFAULT_RECOMPUTE_DELAY: Duration = Duration::from_millis(500);
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Every applied table re-selects its fastest entry, replacing any manual
    /// selection.
    pub reselect_fastest_on_new_results: bool,
    /// Wait before the recomputation that follows a successful obstacle clear.
    pub recompute_delay: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            reselect_fastest_on_new_results: true,
            recompute_delay: DEFAULT_RECOMPUTE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Start,
    End,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSlot {
    pub coordinate: Option<Coordinate>,
    /// Display text only.
    pub label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected: Option<AlgorithmId>,
    pub fastest: Option<AlgorithmId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathsOutcome {
    Applied {
        fastest: Option<AlgorithmId>,
        valid: usize,
        failed: usize,
    },
    /// The response no longer matched current state and was dropped.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleRecompute {
    NotIncluded,
    Paths(PathsOutcome),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleOutcome {
    /// `None` when the acknowledgment arrived after a reset.
    pub obstacle: Option<Obstacle>,
    pub recompute: ObstacleRecompute,
}

#[derive(Debug)]
pub struct ClearOutcome {
    pub removed: usize,
    pub recompute: Option<JoinHandle<Result<PathsOutcome, SessionError>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LocationChanged {
        slot: Slot,
        coordinate: Option<Coordinate>,
    },
    CalculatingChanged(bool),
    PathsUpdated {
        fastest: Option<AlgorithmId>,
        selected: Option<AlgorithmId>,
        valid: usize,
        failed: usize,
    },
    SelectionChanged(Option<AlgorithmId>),
    ObstaclesChanged {
        count: usize,
    },
    ObstacleModeChanged(bool),
    Reset,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub start: LocationSlot,
    pub end: LocationSlot,
    pub paths: PathResultTable,
    pub selection: Selection,
    pub obstacles: Vec<Obstacle>,
    pub obstacle_mode: bool,
    pub calculating: bool,
    pub has_auto_zoomed: bool,
}

impl SessionSnapshot {
    pub fn slot(&self, slot: Slot) -> &LocationSlot {
        match slot {
            Slot::Start => &self.start,
            Slot::End => &self.end,
        }
    }

    pub fn metrics(&self) -> Option<PathMetrics> {
        self.paths.metrics()
    }

    pub fn rows(&self) -> Vec<AlgorithmRow> {
        self.paths.rows()
    }

    /// The entry the travel card shows: the selection when it is valid,
    /// otherwise the fastest entry.
    pub fn active_result(&self) -> Option<(AlgorithmId, &AlgorithmResult)> {
        let valid = |id: AlgorithmId| {
            self.paths
                .get(id)
                .filter(|result| result.is_valid())
                .map(|result| (id, result))
        };
        self.selection
            .selected
            .and_then(valid)
            .or_else(|| self.selection.fastest.and_then(valid))
    }
}

/// Slot coordinates captured when a table-producing request is issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LocationTag {
    start: Option<Coordinate>,
    end: Option<Coordinate>,
}

pub(crate) struct SessionState {
    pub(crate) start: LocationSlot,
    pub(crate) end: LocationSlot,
    paths: PathResultTable,
    selection: Selection,
    obstacles: ObstacleLedger,
    pub(crate) obstacle_mode: bool,
    viewport: ViewportController,
    reset_generation: u64,
    issued_table_seq: u64,
    applied_table_seq: u64,
}

impl SessionState {
    fn new(viewport: ViewportConfig) -> Self {
        Self {
            start: LocationSlot::default(),
            end: LocationSlot::default(),
            paths: PathResultTable::default(),
            selection: Selection::default(),
            obstacles: ObstacleLedger::default(),
            obstacle_mode: false,
            viewport: ViewportController::new(viewport),
            reset_generation: 0,
            issued_table_seq: 0,
            applied_table_seq: 0,
        }
    }

    fn tag(&self) -> LocationTag {
        LocationTag {
            start: self.start.coordinate,
            end: self.end.coordinate,
        }
    }

    fn route_pair(&self) -> Result<(Coordinate, Coordinate), PreconditionError> {
        match (self.start.coordinate, self.end.coordinate) {
            (Some(start), Some(end)) => Ok((start, end)),
            (None, Some(_)) => Err(PreconditionError::MissingStart),
            (Some(_), None) => Err(PreconditionError::MissingEnd),
            (None, None) => Err(PreconditionError::MissingBoth),
        }
    }

    pub(crate) fn assign(&mut self, slot: Slot, coordinate: Option<Coordinate>, label: String) {
        let target = match slot {
            Slot::Start => &mut self.start,
            Slot::End => &mut self.end,
        };
        target.coordinate = coordinate;
        target.label = label;
        self.viewport.observe(self.start.coordinate, self.end.coordinate);
    }

    fn next_table_seq(&mut self) -> u64 {
        self.issued_table_seq += 1;
        self.issued_table_seq
    }

    /// Replaces the whole table if the response still belongs to the current
    /// slot pair and nothing newer has been applied since it was issued.
    fn apply_table(
        &mut self,
        seq: u64,
        tag: LocationTag,
        paths: PathsPayload,
        reselect_fastest: bool,
    ) -> PathsOutcome {
        if tag != self.tag() {
            debug!(seq, "paths: dropping response for a previous location pair");
            return PathsOutcome::Discarded;
        }
        if seq <= self.applied_table_seq {
            debug!(
                seq,
                applied = self.applied_table_seq,
                "paths: dropping response superseded by a newer table"
            );
            return PathsOutcome::Discarded;
        }

        let table = PathResultTable::from_payload(paths);
        let fastest = table.fastest();
        self.selection.fastest = fastest;
        if reselect_fastest {
            self.selection.selected = fastest;
        }
        let outcome = PathsOutcome::Applied {
            fastest,
            valid: table.valid_count(),
            failed: table.failed_count(),
        };
        self.paths = table;
        self.applied_table_seq = seq;
        outcome
    }

    fn reset(&mut self) {
        self.start = LocationSlot::default();
        self.end = LocationSlot::default();
        self.paths = PathResultTable::default();
        self.selection = Selection::default();
        self.obstacles.clear();
        self.viewport.observe(None, None);
        self.reset_generation += 1;
    }

    fn snapshot(&self, calculating: bool) -> SessionSnapshot {
        SessionSnapshot {
            start: self.start.clone(),
            end: self.end.clone(),
            paths: self.paths.clone(),
            selection: self.selection,
            obstacles: self.obstacles.to_vec(),
            obstacle_mode: self.obstacle_mode,
            calculating,
            has_auto_zoomed: self.viewport.has_auto_zoomed(),
        }
    }
}

/// Holds the single path-request slot. Releasing it, including when the
/// request future is dropped mid-flight, publishes `CalculatingChanged(false)`.
struct InFlightGuard<'a>(&'a PathfinderSession);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.path_request_in_flight.store(false, Ordering::Release);
        self.0.emit(SessionEvent::CalculatingChanged(false));
    }
}

pub struct PathfinderSession {
    api: Arc<dyn PathfinderApi>,
    policy: SessionPolicy,
    pub(crate) inner: Mutex<SessionState>,
    path_request_in_flight: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl PathfinderSession {
    pub fn new(api: Arc<dyn PathfinderApi>) -> Arc<Self> {
        Self::new_with_config(api, SessionPolicy::default(), ViewportConfig::default())
    }

    pub fn offline() -> Arc<Self> {
        Self::new(Arc::new(MissingPathfinderApi))
    }

    pub fn new_with_config(
        api: Arc<dyn PathfinderApi>,
        policy: SessionPolicy,
        viewport: ViewportConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            api,
            policy,
            inner: Mutex::new(SessionState::new(viewport)),
            path_request_in_flight: AtomicBool::new(false),
            events,
        })
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_calculating(&self) -> bool {
        self.path_request_in_flight.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let calculating = self.is_calculating();
        self.inner.lock().await.snapshot(calculating)
    }

    pub async fn next_camera_command(&self) -> Option<CameraCommand> {
        self.inner.lock().await.viewport.next_command()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Logs the failure, publishes its user message and hands it back.
    pub(crate) fn report(&self, err: SessionError) -> SessionError {
        match &err {
            SessionError::Transport { operation, message } => {
                warn!(%operation, "session: {message}");
            }
            other => info!("session: rejected action: {other}"),
        }
        self.emit(SessionEvent::Error(err.user_message()));
        err
    }

    fn try_begin_path_request(&self) -> Option<InFlightGuard<'_>> {
        self.path_request_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self))
    }

    fn publish_paths(&self, outcome: PathsOutcome, selected: Option<AlgorithmId>) {
        if let PathsOutcome::Applied {
            fastest,
            valid,
            failed,
        } = outcome
        {
            info!(
                fastest = ?fastest,
                valid,
                failed,
                "paths: table replaced"
            );
            self.emit(SessionEvent::PathsUpdated {
                fastest,
                selected,
                valid,
                failed,
            });
        }
    }

    pub async fn set_location(
        &self,
        slot: Slot,
        coordinate: Coordinate,
        label: Option<String>,
    ) -> Result<(), SessionError> {
        ensure_finite(coordinate).map_err(|err| self.report(err.into()))?;
        self.inner
            .lock()
            .await
            .assign(slot, Some(coordinate), label.unwrap_or_default());
        self.emit(SessionEvent::LocationChanged {
            slot,
            coordinate: Some(coordinate),
        });
        Ok(())
    }

    pub async fn clear_location(&self, slot: Slot) {
        self.inner.lock().await.assign(slot, None, String::new());
        self.emit(SessionEvent::LocationChanged {
            slot,
            coordinate: None,
        });
    }

    /// Resolves `query` through the backend and places it in `slot`, keeping
    /// the query as the slot label. The slot is untouched on failure.
    pub async fn geocode_location(
        &self,
        slot: Slot,
        query: &str,
    ) -> Result<Coordinate, SessionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(self.report(PreconditionError::EmptyQuery.into()));
        }

        let coordinate = self
            .api
            .geocode(query)
            .await
            .map_err(|err| self.report(SessionError::transport(Operation::Geocode, err)))?;
        if !coordinate.is_finite() {
            return Err(self.report(SessionError::transport(
                Operation::Geocode,
                "geocoder returned a non-finite coordinate",
            )));
        }

        info!(?slot, %coordinate, query, "geocode: location resolved");
        self.set_location(slot, coordinate, Some(query.to_string()))
            .await?;
        Ok(coordinate)
    }

    pub async fn submit_path_request(&self) -> Result<PathsOutcome, SessionError> {
        let (start, end, tag, seq, in_flight) = {
            let mut guard = self.inner.lock().await;
            let (start, end) = guard
                .route_pair()
                .map_err(|err| self.report(err.into()))?;
            let Some(in_flight) = self.try_begin_path_request() else {
                return Err(self.report(SessionError::ConcurrentRequest));
            };
            (start, end, guard.tag(), guard.next_table_seq(), in_flight)
        };
        self.emit(SessionEvent::CalculatingChanged(true));
        info!(%start, %end, seq, "paths: requesting computation");

        let response = self.api.find_path(start, end).await;
        let result = match response {
            Ok(response) => {
                let mut guard = self.inner.lock().await;
                let outcome = guard.apply_table(
                    seq,
                    tag,
                    response.paths,
                    self.policy.reselect_fastest_on_new_results,
                );
                Ok((outcome, guard.selection.selected))
            }
            Err(err) => Err(SessionError::transport(Operation::FindPath, err)),
        };
        drop(in_flight);

        match result {
            Ok((outcome, selected)) => {
                self.publish_paths(outcome, selected);
                Ok(outcome)
            }
            Err(err) => Err(self.report(err)),
        }
    }

    /// Places an obstacle once the backend acknowledges it. Recomputed paths
    /// carried by the acknowledgment replace the table; without them the
    /// table is left as is.
    pub async fn add_obstacle(
        &self,
        coordinate: Coordinate,
    ) -> Result<ObstacleOutcome, SessionError> {
        ensure_finite(coordinate).map_err(|err| self.report(err.into()))?;
        let (tag, seq, generation) = {
            let mut guard = self.inner.lock().await;
            (guard.tag(), guard.next_table_seq(), guard.reset_generation)
        };
        info!(%coordinate, "obstacles: placing");

        let response = self
            .api
            .add_obstacle(coordinate)
            .await
            .map_err(|err| self.report(SessionError::transport(Operation::AddObstacle, err)))?;
        if !response.success {
            return Err(self.report(SessionError::declined(Operation::AddObstacle)));
        }

        let (obstacle, recompute, count, selected) = {
            let mut guard = self.inner.lock().await;
            if guard.reset_generation != generation {
                debug!(%coordinate, "obstacles: acknowledgment arrived after reset");
                return Ok(ObstacleOutcome {
                    obstacle: None,
                    recompute: ObstacleRecompute::NotIncluded,
                });
            }
            let obstacle = guard.obstacles.record(coordinate);
            let recompute = match response.updated_paths {
                None => ObstacleRecompute::NotIncluded,
                Some(UpdatedPaths::Table(paths)) => ObstacleRecompute::Paths(guard.apply_table(
                    seq,
                    tag,
                    paths,
                    self.policy.reselect_fastest_on_new_results,
                )),
                Some(UpdatedPaths::Failed(failure)) => ObstacleRecompute::Failed(failure.error),
            };
            (
                obstacle,
                recompute,
                guard.obstacles.len(),
                guard.selection.selected,
            )
        };

        info!(obstacle_id = %obstacle.id, count, "obstacles: placed");
        self.emit(SessionEvent::ObstaclesChanged { count });
        match &recompute {
            ObstacleRecompute::Paths(outcome) => self.publish_paths(*outcome, selected),
            ObstacleRecompute::Failed(message) => {
                let _ = self.report(SessionError::transport(Operation::FindPath, message));
            }
            ObstacleRecompute::NotIncluded => {}
        }

        Ok(ObstacleOutcome {
            obstacle: Some(obstacle),
            recompute,
        })
    }

    /// Clears obstacles on the backend, then locally. With both slots set a
    /// single recomputation is scheduled after the policy delay.
    pub async fn clear_obstacles(self: &Arc<Self>) -> Result<ClearOutcome, SessionError> {
        info!("obstacles: clearing");
        let response = self
            .api
            .clear_obstacles()
            .await
            .map_err(|err| self.report(SessionError::transport(Operation::ClearObstacles, err)))?;
        if !response.success {
            return Err(self.report(SessionError::declined(Operation::ClearObstacles)));
        }

        let (removed, has_route) = {
            let mut guard = self.inner.lock().await;
            (guard.obstacles.clear(), guard.route_pair().is_ok())
        };
        info!(removed, "obstacles: cleared");
        self.emit(SessionEvent::ObstaclesChanged { count: 0 });

        Ok(ClearOutcome {
            removed,
            recompute: has_route.then(|| self.schedule_recompute()),
        })
    }

    fn schedule_recompute(self: &Arc<Self>) -> JoinHandle<Result<PathsOutcome, SessionError>> {
        let session = Arc::clone(self);
        let delay = self.policy.recompute_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if session.inner.lock().await.route_pair().is_err() {
                debug!("obstacles: route cleared before recomputation; skipping");
                return Ok(PathsOutcome::Discarded);
            }
            let result = session.submit_path_request().await;
            if let Err(err) = &result {
                warn!("obstacles: recomputation after clear failed: {err}");
            }
            result
        })
    }

    /// Manual selection. Selecting the current selection again clears it.
    pub async fn select_algorithm(&self, algorithm: Option<AlgorithmId>) -> Option<AlgorithmId> {
        let selected = {
            let mut guard = self.inner.lock().await;
            let next = match algorithm {
                Some(id) if guard.selection.selected == Some(id) => None,
                other => other,
            };
            guard.selection.selected = next;
            next
        };
        self.emit(SessionEvent::SelectionChanged(selected));
        selected
    }

    pub async fn set_obstacle_mode(&self, enabled: bool) {
        self.inner.lock().await.obstacle_mode = enabled;
        self.emit(SessionEvent::ObstacleModeChanged(enabled));
    }

    /// Returns locations, table, obstacles and selection to their empty state.
    /// Backend obstacles are not cleared, and an outstanding path request keeps
    /// its in-flight slot until it returns.
    pub async fn reset(&self) {
        self.inner.lock().await.reset();
        info!("session: reset");
        self.emit(SessionEvent::Reset);
    }
}

pub(crate) fn ensure_finite(coordinate: Coordinate) -> Result<(), PreconditionError> {
    if coordinate.is_finite() {
        Ok(())
    } else {
        Err(PreconditionError::NonFiniteCoordinate {
            lat: coordinate.lat.to_string(),
            lng: coordinate.lng.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
