use std::time::Duration;

use crate::cost_model::CostModel;
use crate::error::ConfigError;
use crate::motion_model::MotionModel;

pub const DEFAULT_MAX_ITERATIONS: usize = 1_000_000;
pub const DEFAULT_MAX_ON_APPROACH_ITERATIONS: usize = 1_000;

/// Limits on a single search, checked once per expansion.
///
/// `None` means unbounded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchBudget {
    /// Expansions of settled nodes. Stale frontier entries don't count.
    pub max_iterations: Option<usize>,
    pub max_planning_time: Option<Duration>,
}

impl SearchBudget {
    pub fn unbounded() -> Self {
        Self {
            max_iterations: None,
            max_planning_time: None,
        }
    }
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
    pub fn with_max_planning_time(mut self, max_planning_time: Duration) -> Self {
        self.max_planning_time = Some(max_planning_time);
        self
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            max_planning_time: None,
        }
    }
}

/// Planner-wide settings. Requests may override the motion model, unknown
/// traversal and budget.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    pub cost_model: CostModel,
    /// Distance to the goal, in map units, that still counts as arriving.
    pub tolerance: f64,
    /// Expansions allowed after first settling a node within tolerance.
    pub max_on_approach_iterations: usize,
    pub motion_model: MotionModel,
    pub traverse_unknown: bool,
    pub budget: SearchBudget,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cost_model: CostModel::default(),
            tolerance: 0.0,
            max_on_approach_iterations: DEFAULT_MAX_ON_APPROACH_ITERATIONS,
            motion_model: MotionModel::default(),
            traverse_unknown: true,
            budget: SearchBudget::default(),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cost_model.validate()?;
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        Ok(())
    }

    /// Goal tolerance in cells for a map of the given resolution.
    pub fn tolerance_in_cells(&self, resolution: f64) -> f32 {
        if self.tolerance <= 0.0 || resolution <= 0.0 {
            return 0.0;
        }
        (self.tolerance / resolution) as f32
    }
}
