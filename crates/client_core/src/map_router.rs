//! Map click routing between obstacle placement and start/end selection.

use shared::domain::Coordinate;

use crate::{
    error::SessionError,
    session::{ensure_finite, ObstacleOutcome, PathfinderSession, SessionEvent, Slot},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickRoute {
    PlaceObstacle(Coordinate),
    SetStart(Coordinate),
    SetEnd(Coordinate),
    /// Both slots were already set: start moves to the click, end is unset.
    RestartAt(Coordinate),
}

pub fn route_click(
    obstacle_mode: bool,
    start: Option<Coordinate>,
    end: Option<Coordinate>,
    clicked: Coordinate,
) -> ClickRoute {
    if obstacle_mode {
        return ClickRoute::PlaceObstacle(clicked);
    }
    match (start, end) {
        (None, _) => ClickRoute::SetStart(clicked),
        (Some(_), None) => ClickRoute::SetEnd(clicked),
        (Some(_), Some(_)) => ClickRoute::RestartAt(clicked),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapClickOutcome {
    Obstacle(ObstacleOutcome),
    Location { slot: Slot, coordinate: Coordinate },
    Restarted { start: Coordinate },
}

impl PathfinderSession {
    /// Applies a map click. Location routes are decided and applied under one
    /// lock so back-to-back clicks see each other's placement.
    pub async fn handle_map_click(
        &self,
        coordinate: Coordinate,
    ) -> Result<MapClickOutcome, SessionError> {
        ensure_finite(coordinate).map_err(|err| self.report(err.into()))?;

        let route = {
            let mut guard = self.inner.lock().await;
            let route = route_click(
                guard.obstacle_mode,
                guard.start.coordinate,
                guard.end.coordinate,
                coordinate,
            );
            match route {
                ClickRoute::PlaceObstacle(_) => {}
                ClickRoute::SetStart(point) => guard.assign(Slot::Start, Some(point), String::new()),
                ClickRoute::SetEnd(point) => guard.assign(Slot::End, Some(point), String::new()),
                ClickRoute::RestartAt(point) => {
                    guard.assign(Slot::Start, Some(point), String::new());
                    guard.assign(Slot::End, None, String::new());
                }
            }
            route
        };

        match route {
            ClickRoute::PlaceObstacle(point) => {
                self.add_obstacle(point).await.map(MapClickOutcome::Obstacle)
            }
            ClickRoute::SetStart(point) | ClickRoute::SetEnd(point) => {
                let slot = if matches!(route, ClickRoute::SetStart(_)) {
                    Slot::Start
                } else {
                    Slot::End
                };
                self.emit(SessionEvent::LocationChanged {
                    slot,
                    coordinate: Some(point),
                });
                Ok(MapClickOutcome::Location {
                    slot,
                    coordinate: point,
                })
            }
            ClickRoute::RestartAt(point) => {
                self.emit(SessionEvent::LocationChanged {
                    slot: Slot::Start,
                    coordinate: Some(point),
                });
                self.emit(SessionEvent::LocationChanged {
                    slot: Slot::End,
                    coordinate: None,
                });
                Ok(MapClickOutcome::Restarted { start: point })
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/map_router_tests.rs"]
mod tests;
