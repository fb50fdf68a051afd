use derive_more::Display;

use crate::costmap::Costmap2D;
use crate::costmap::INSCRIBED_INFLATED_OBSTACLE;
use crate::costmap::NO_INFORMATION;
use crate::grid::NodeIndex;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Occupancy {
    #[display("free")]
    Free,
    #[display("occupied")]
    Occupied,
    #[display("unknown")]
    Unknown,
}

/// Answers whether a cell can be occupied by the robot.
///
/// Implementations must not change while a search runs.
pub trait CollisionChecker {
    fn occupancy(&self, index: NodeIndex) -> Occupancy;

    /// Whether the cell must not be entered.
    #[inline(always)]
    fn in_collision(&self, index: NodeIndex, traverse_unknown: bool) -> bool {
        match self.occupancy(index) {
            Occupancy::Free => false,
            Occupancy::Occupied => true,
            Occupancy::Unknown => !traverse_unknown,
        }
    }
}

/// Point-robot checker over a [`Costmap2D`].
///
/// Anything at or above the inscribed cost collides.
#[derive(Copy, Clone, Debug)]
pub struct GridCollisionChecker<'a> {
    costmap: &'a Costmap2D,
}

impl<'a> GridCollisionChecker<'a> {
    pub fn new(costmap: &'a Costmap2D) -> Self {
        Self { costmap }
    }

    pub fn costmap(&self) -> &'a Costmap2D {
        self.costmap
    }
}

impl CollisionChecker for GridCollisionChecker<'_> {
    #[inline(always)]
    fn occupancy(&self, index: NodeIndex) -> Occupancy {
        match self.costmap.cost_at(index) {
            NO_INFORMATION => Occupancy::Unknown,
            c if c >= INSCRIBED_INFLATED_OBSTACLE => Occupancy::Occupied,
            _ => Occupancy::Free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    #[test]
    fn occupancy_from_costs() {
        let costmap = Costmap2D::try_from(".9@#?").unwrap();
        let checker = GridCollisionChecker::new(&costmap);
        let at = |x| {
            checker.occupancy(costmap.dimensions().index(&Cell::new(x, 0)).unwrap())
        };

        assert_eq!(at(0), Occupancy::Free);
        assert_eq!(at(1), Occupancy::Free);
        assert_eq!(at(2), Occupancy::Occupied);
        assert_eq!(at(3), Occupancy::Occupied);
        assert_eq!(at(4), Occupancy::Unknown);
    }

    #[test]
    fn unknown_depends_on_traversal() {
        let costmap = Costmap2D::try_from("?").unwrap();
        let checker = GridCollisionChecker::new(&costmap);
        let i = NodeIndex::new(0).unwrap();

        assert!(checker.in_collision(i, false));
        assert!(!checker.in_collision(i, true));
    }
}
