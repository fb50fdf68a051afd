//! Grid connectivity and its precomputed neighbour offsets.

use derive_more::Display;
use smallvec::SmallVec;
use thiserror::Error;

pub const MAX_NEIGHBOURS: usize = 8;

#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionModel {
    /// 4-connected, cardinal moves only.
    #[default]
    #[display("von-neumann")]
    VonNeumann,
    /// 8-connected, cardinal and diagonal moves.
    #[display("moore")]
    Moore,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown motion model '{0}', expected one of: 4, 8, von-neumann, moore")]
pub struct MotionModelParseError(String);

impl std::str::FromStr for MotionModel {
    type Err = MotionModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "4" | "von-neumann" | "von_neumann" | "vonneumann" => Ok(MotionModel::VonNeumann),
            "8" | "moore" => Ok(MotionModel::Moore),
            _ => Err(MotionModelParseError(s.to_string())),
        }
    }
}

/// One move of the motion model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NeighbourOffset {
    pub dx: i8,
    pub dy: i8,
    /// Change in linear index, `dx + dy * width`.
    pub delta: i64,
    /// Length of the move in cells.
    pub distance: f32,
}

impl NeighbourOffset {
    fn new(dx: i8, dy: i8, width: u32) -> Self {
        let distance = if dx != 0 && dy != 0 {
            std::f32::consts::SQRT_2
        } else {
            1.0
        };
        Self {
            dx,
            dy,
            delta: dx as i64 + dy as i64 * width as i64,
            distance,
        }
    }
}

/// Neighbour offsets for a motion model on a grid of a given width.
///
/// The order is fixed per model and decides which of several equally good
/// parents wins, so searches are reproducible.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighbourTable {
    width: u32,
    model: MotionModel,
    offsets: SmallVec<[NeighbourOffset; MAX_NEIGHBOURS]>,
}

impl NeighbourTable {
    pub fn new(width: u32, model: MotionModel) -> Self {
        #[rustfmt::skip]
        let moves: &[(i8, i8)] = match model {
            MotionModel::VonNeumann => &[
                (-1,  0), ( 1,  0), ( 0, -1), ( 0,  1),
            ],
            MotionModel::Moore => &[
                (-1,  0), ( 1,  0), ( 0, -1), ( 0,  1),
                (-1, -1), ( 1, -1), (-1,  1), ( 1,  1),
            ],
        };

        Self {
            width,
            model,
            offsets: moves
                .iter()
                .map(|&(dx, dy)| NeighbourOffset::new(dx, dy, width))
                .collect(),
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[inline(always)]
    pub fn model(&self) -> MotionModel {
        self.model
    }
    #[inline(always)]
    pub fn offsets(&self) -> &[NeighbourOffset] {
        &self.offsets
    }

    pub fn is_initialized_for(&self, width: u32, model: MotionModel) -> bool {
        self.width == width && self.model == model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn von_neumann_offsets() {
        let t = NeighbourTable::new(10, MotionModel::VonNeumann);
        let deltas: Vec<i64> = t.offsets().iter().map(|o| o.delta).collect();
        assert_eq!(deltas, vec![-1, 1, -10, 10]);
        assert!(t.offsets().iter().all(|o| o.distance == 1.0));
    }

    #[test]
    fn moore_offsets() {
        let t = NeighbourTable::new(10, MotionModel::Moore);
        let deltas: Vec<i64> = t.offsets().iter().map(|o| o.delta).collect();
        assert_eq!(deltas, vec![-1, 1, -10, 10, -11, -9, 9, 11]);
        assert_eq!(
            t.offsets()
                .iter()
                .filter(|o| o.distance > 1.0)
                .count(),
            4
        );
        assert_eq!(t.offsets().len(), MAX_NEIGHBOURS);
    }

    #[test]
    fn initialized_for() {
        let t = NeighbourTable::new(10, MotionModel::Moore);
        assert!(t.is_initialized_for(10, MotionModel::Moore));
        assert!(!t.is_initialized_for(11, MotionModel::Moore));
        assert!(!t.is_initialized_for(10, MotionModel::VonNeumann));
    }

    #[test]
    fn parse() {
        assert_eq!("4".parse::<MotionModel>(), Ok(MotionModel::VonNeumann));
        assert_eq!("Moore".parse::<MotionModel>(), Ok(MotionModel::Moore));
        assert!("hex".parse::<MotionModel>().is_err());
    }
}
