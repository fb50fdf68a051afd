//! Planning errors.
//!
//! Not finding a path is an expected outcome and gets its own variants, kept
//! apart from a request the planner should never have been given.

use std::time::Duration;

use derive_more::Display;
use thiserror::Error;

use crate::cost_model::CostModelError;
use crate::grid::Cell;
use crate::grid::GridDimensions;
use crate::grid::GridError;
use crate::grid::WorldPoint;
use crate::motion_model::MotionModel;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),
    #[error("No path found after {iterations} iterations")]
    NoPathFound { iterations: usize },
    #[error("Search budget exceeded: {0}")]
    BudgetExceeded(Budget),
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl PlanError {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlanError::BudgetExceeded(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidRequest {
    #[error("start {0} is outside the {1} grid")]
    StartOutOfBounds(Cell, GridDimensions),
    #[error("goal {0} is outside the {1} grid")]
    GoalOutOfBounds(Cell, GridDimensions),
    #[error("start {0} is in collision")]
    StartOccupied(Cell),
    #[error("goal {0} is in collision")]
    GoalOccupied(Cell),
    #[error("world point {0} is off the map")]
    OffMap(WorldPoint),
}

/// The limit a search ran into.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Budget {
    #[display("{limit} iterations")]
    Iterations { limit: usize },
    #[display("{limit:?} planning time")]
    Time { limit: Duration },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no {model} neighbourhood initialized for width {width}")]
    MissingNeighbourhood { width: u32, model: MotionModel },
    #[error(
        "neighbourhood is for {table_model} with width {table_width}, search needs {model} with width {width}"
    )]
    StaleNeighbourhood {
        width: u32,
        model: MotionModel,
        table_width: u32,
        table_model: MotionModel,
    },
    #[error("search graph is {graph} but the costmap is {costmap}")]
    GraphSizeMismatch {
        graph: GridDimensions,
        costmap: GridDimensions,
    },
    #[error("search graph was not reset since the last search")]
    GraphNotReset,
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    CostModel(#[from] CostModelError),
    #[error("tolerance must be finite and non-negative, got {0}")]
    Tolerance(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PlanError::BudgetExceeded(Budget::Iterations { limit: 10 });
        assert_eq!(format!("{err}"), "Search budget exceeded: 10 iterations");
        assert!(err.is_retryable());

        let err = PlanError::from(InvalidRequest::GoalOccupied(Cell::new(1, 2)));
        assert_eq!(format!("{err}"), "Invalid request: goal (1,2) is in collision");
        assert!(!err.is_retryable());

        let err = PlanError::from(ConfigError::from(GridError::AngleQuantization(4)));
        assert_eq!(
            format!("{err}"),
            "Configuration error: Node2D only supports a single angle bin, got 4"
        );
    }
}
