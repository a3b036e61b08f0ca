//! One-shot camera positioning for the start/end markers.
//!
//! The controller tracks the last observed slot coordinates. A change moves it
//! to a pending phase; polling a pending phase yields exactly one camera
//! command and settles it. Settled stays quiet until a tracked coordinate
//! changes again, so manual pan and zoom are left alone.

use shared::domain::Coordinate;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    pub default_center: Coordinate,
    pub default_zoom: u8,
    pub single_point_zoom: u8,
    pub fit_padding_px: u32,
    pub max_fit_zoom: u8,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            default_center: Coordinate::new(13.0827, 80.2707),
            default_zoom: 12,
            single_point_zoom: 14,
            fit_padding_px: 20,
            max_fit_zoom: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    CenterOn {
        center: Coordinate,
        zoom: u8,
    },
    FitBounds {
        south_west: Coordinate,
        north_east: Coordinate,
        padding_px: u32,
        max_zoom: u8,
    },
    ResetView {
        center: Coordinate,
        zoom: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportPhase {
    Idle,
    PendingSingle,
    PendingPair,
    Settled,
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    config: ViewportConfig,
    phase: ViewportPhase,
    start: Option<Coordinate>,
    end: Option<Coordinate>,
    reset_pending: bool,
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            phase: ViewportPhase::Idle,
            start: None,
            end: None,
            reset_pending: false,
        }
    }

    pub fn phase(&self) -> ViewportPhase {
        self.phase
    }

    pub fn has_auto_zoomed(&self) -> bool {
        self.phase == ViewportPhase::Settled
    }

    /// Feeds the current slot coordinates. Returns whether anything changed.
    pub fn observe(&mut self, start: Option<Coordinate>, end: Option<Coordinate>) -> bool {
        if self.start == start && self.end == end {
            return false;
        }
        self.start = start;
        self.end = end;
        self.phase = match (start, end) {
            (None, None) => ViewportPhase::Idle,
            (Some(_), Some(_)) => ViewportPhase::PendingPair,
            _ => ViewportPhase::PendingSingle,
        };
        // Only reachable from a state where at least one slot was set.
        self.reset_pending = self.phase == ViewportPhase::Idle;
        true
    }

    pub fn next_command(&mut self) -> Option<CameraCommand> {
        match self.phase {
            ViewportPhase::Idle => {
                if !std::mem::take(&mut self.reset_pending) {
                    return None;
                }
                Some(CameraCommand::ResetView {
                    center: self.config.default_center,
                    zoom: self.config.default_zoom,
                })
            }
            ViewportPhase::PendingSingle => {
                let center = self.start.or(self.end)?;
                self.phase = ViewportPhase::Settled;
                Some(CameraCommand::CenterOn {
                    center,
                    zoom: self.config.single_point_zoom,
                })
            }
            ViewportPhase::PendingPair => {
                let (a, b) = self.start.zip(self.end)?;
                self.phase = ViewportPhase::Settled;
                Some(CameraCommand::FitBounds {
                    south_west: Coordinate::new(a.lat.min(b.lat), a.lng.min(b.lng)),
                    north_east: Coordinate::new(a.lat.max(b.lat), a.lng.max(b.lng)),
                    padding_px: self.config.fit_padding_px,
                    max_zoom: self.config.max_fit_zoom,
                })
            }
            ViewportPhase::Settled => None,
        }
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

#[cfg(test)]
#[path = "tests/viewport_tests.rs"]
mod tests;
