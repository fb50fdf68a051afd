//! Step costs and the distance heuristic.
//!
//! A step costs `neutral_cost * (distance + multiplier * cell_cost / 252)`,
//! where `distance` is 1 for cardinal moves and `√2` for diagonals. The
//! heuristic is `neutral_cost * euclidean_distance`, which never exceeds the
//! cost of any path since each step pays at least `neutral_cost` per unit of
//! length.

use thiserror::Error;

use crate::costmap::MAX_NON_OBSTACLE;
use crate::float_cost::FloatCost;
use crate::grid::Cell;

pub const DEFAULT_NEUTRAL_COST: f32 = 50.0;
pub const DEFAULT_COST_TRAVEL_MULTIPLIER: f32 = 2.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CostModelError {
    #[error("neutral_cost must be finite and positive, got {0}")]
    NeutralCost(f32),
    #[error("cost_travel_multiplier must be finite and non-negative, got {0}")]
    TravelMultiplier(f32),
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostModel {
    /// Cost of moving one cell through free space.
    pub neutral_cost: f32,
    /// How much costmap cost weighs against distance.
    pub cost_travel_multiplier: f32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            neutral_cost: DEFAULT_NEUTRAL_COST,
            cost_travel_multiplier: DEFAULT_COST_TRAVEL_MULTIPLIER,
        }
    }
}

impl CostModel {
    pub fn new(neutral_cost: f32, cost_travel_multiplier: f32) -> Result<Self, CostModelError> {
        let model = Self {
            neutral_cost,
            cost_travel_multiplier,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), CostModelError> {
        if !(self.neutral_cost.is_finite() && self.neutral_cost > 0.0) {
            return Err(CostModelError::NeutralCost(self.neutral_cost));
        }
        if !(self.cost_travel_multiplier.is_finite() && self.cost_travel_multiplier >= 0.0) {
            return Err(CostModelError::TravelMultiplier(
                self.cost_travel_multiplier,
            ));
        }
        Ok(())
    }

    /// Cost of stepping `travel_distance` cells into a cell of `cell_cost`.
    #[inline(always)]
    #[must_use]
    pub fn traversal_cost(&self, travel_distance: f32, cell_cost: u8) -> FloatCost {
        debug_assert!(travel_distance >= 1.0);
        let normalized_cost = cell_cost as f32 / MAX_NON_OBSTACLE as f32;
        FloatCost::new(
            self.neutral_cost * (travel_distance + self.cost_travel_multiplier * normalized_cost),
        )
    }

    #[inline(always)]
    #[must_use]
    pub fn heuristic_cost(&self, from: &Cell, goal: &Cell) -> FloatCost {
        FloatCost::new(self.neutral_cost * from.euclidean_distance(goal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_positive_and_monotonic() {
        let m = CostModel::default();
        let mut last = FloatCost::new(0.0);
        for cost in [0u8, 1, 50, 128, 252, 255] {
            let c = m.traversal_cost(1.0, cost);
            assert!(c > last);
            last = c;
        }
        assert_eq!(m.traversal_cost(1.0, 0), FloatCost::new(50.0));
        assert_eq!(m.traversal_cost(1.0, 252), FloatCost::new(150.0));
        assert!(m.traversal_cost(std::f32::consts::SQRT_2, 0) > m.traversal_cost(1.0, 0));
    }

    #[test]
    fn heuristic_is_scaled_euclidean() {
        let m = CostModel::new(10.0, 0.0).unwrap();
        let h = m.heuristic_cost(&Cell::new(1, 1), &Cell::new(4, 5));
        assert!((h.value() - 50.0).abs() < 1e-4);
        assert_eq!(
            m.heuristic_cost(&Cell::new(2, 2), &Cell::new(2, 2)),
            FloatCost::new(0.0)
        );
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            CostModel::new(0.0, 1.0),
            Err(CostModelError::NeutralCost(0.0))
        );
        assert!(CostModel::new(f32::NAN, 1.0).is_err());
        assert_eq!(
            CostModel::new(1.0, -1.0),
            Err(CostModelError::TravelMultiplier(-1.0))
        );
        assert!(CostModel::new(1.0, 0.0).is_ok());
    }
}
