//! Session-level error taxonomy and the user-facing messages derived from it.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Geocode,
    FindPath,
    AddObstacle,
    ClearObstacles,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Geocode => "geocode",
            Operation::FindPath => "find_path",
            Operation::AddObstacle => "add_obstacle",
            Operation::ClearObstacles => "clear_obstacles",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("start location is not set")]
    MissingStart,
    #[error("end location is not set")]
    MissingEnd,
    #[error("start and end locations are not set")]
    MissingBoth,
    #[error("location query is empty")]
    EmptyQuery,
    #[error("coordinate ({lat}, {lng}) is not a finite lat/lng pair")]
    NonFiniteCoordinate { lat: String, lng: String },
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error("a path computation is already in flight")]
    ConcurrentRequest,
    #[error("{operation} failed: {message}")]
    Transport { operation: Operation, message: String },
}

impl SessionError {
    pub fn transport(operation: Operation, err: impl fmt::Display) -> Self {
        Self::Transport {
            operation,
            message: format!("{err:#}"),
        }
    }

    pub fn declined(operation: Operation) -> Self {
        Self::Transport {
            operation,
            message: "server did not acknowledge the request".to_string(),
        }
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Precondition(PreconditionError::EmptyQuery) => {
                "Enter a location to search for.".to_string()
            }
            SessionError::Precondition(PreconditionError::NonFiniteCoordinate { .. }) => {
                "That point is not a valid map location.".to_string()
            }
            SessionError::Precondition(_) => {
                "Please set both start and end locations".to_string()
            }
            SessionError::ConcurrentRequest => {
                "A path calculation is already running; please wait for it to finish.".to_string()
            }
            SessionError::Transport { operation, .. } => match operation {
                Operation::Geocode => {
                    "Location not found. Please try a different search term.".to_string()
                }
                Operation::FindPath => "Failed to calculate path. Please try again.".to_string(),
                Operation::AddObstacle => "Failed to add obstacle. Please try again.".to_string(),
                Operation::ClearObstacles => {
                    "Failed to clear obstacles. Please try again.".to_string()
                }
            },
        }
    }
}
