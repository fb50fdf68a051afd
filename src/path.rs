use crate::cost::Cost;
use crate::costmap::Costmap2D;
use crate::float_cost::FloatCost;
use crate::grid::Cell;
use crate::grid::WorldPoint;

/// Cells shown by `Display` before eliding.
const MAX_CELLS_DISPLAYED: usize = 20;

/// A planned route, start first.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub cells: Vec<Cell>,
    /// Cell centres in the map frame, filled in by [`Path::locate`].
    pub poses: Vec<WorldPoint>,
    pub cost: FloatCost,
    /// Expansions the search took.
    pub iterations: usize,
    /// Whether the path ends on the goal, rather than on a cell within
    /// tolerance of it.
    pub reached_goal: bool,
}

impl Path {
    pub fn new(cells: Vec<Cell>, cost: FloatCost, iterations: usize, reached_goal: bool) -> Self {
        Self {
            cells,
            poses: vec![],
            cost,
            iterations,
            reached_goal,
        }
    }

    /// Computes the world poses of the cells on `costmap`.
    pub fn locate(&mut self, costmap: &Costmap2D) {
        self.poses = self.cells.iter().map(|c| costmap.map_to_world(c)).collect();
    }

    #[inline(always)]
    pub fn start(&self) -> Option<Cell> {
        self.cells.first().copied()
    }
    #[inline(always)]
    pub fn end(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    /// Number of moves.
    #[inline(always)]
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// Runs sanity checks
    pub fn seems_valid(&self) -> bool {
        let adjacent = self.cells.windows(2).all(|w| {
            let (a, b) = (w[0], w[1]);
            a != b && a.x.abs_diff(b.x) <= 1 && a.y.abs_diff(b.y) <= 1
        });
        let poses = self.poses.is_empty() || self.poses.len() == self.cells.len();
        adjacent && poses && self.cost.valid() && self.cost.is_finite()
    }

    /// Length in map units, following the poses.
    pub fn length(&self) -> f64 {
        self.poses
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (Some(start), Some(end)) = (self.start(), self.end()) else {
            return write!(f, "Path()");
        };
        write!(f, "Path({}, {start}:[", self.cost)?;
        let inner = &self.cells[1..self.cells.len().saturating_sub(1).max(1)];
        for (i, c) in inner.iter().take(MAX_CELLS_DISPLAYED).enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{c}")?;
        }
        if inner.len() > MAX_CELLS_DISPLAYED {
            write!(f, ",...")?;
        }
        write!(f, "]:{end}")?;
        if !self.reached_goal {
            write!(f, " (near goal)")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(cs: &[(u32, u32)]) -> Vec<Cell> {
        cs.iter().map(|&c| Cell::from(c)).collect()
    }

    #[test]
    fn display() {
        let p = Path::new(cells(&[(0, 0), (1, 0), (1, 1)]), FloatCost::new(2.0), 3, true);
        assert_eq!(format!("{p}"), "Path(2.000, (0,0):[(1,0)]:(1,1))");

        let p = Path::new(cells(&[(0, 0)]), FloatCost::new(0.0), 1, false);
        assert_eq!(format!("{p}"), "Path(0.000, (0,0):[]:(0,0) (near goal))");

        let p = Path::new(vec![], FloatCost::new(0.0), 0, false);
        assert_eq!(format!("{p}"), "Path()");
    }

    #[test]
    fn validity() {
        let p = Path::new(cells(&[(0, 0), (1, 1), (1, 2)]), FloatCost::new(2.0), 3, true);
        assert!(p.seems_valid());
        assert_eq!(p.steps(), 2);

        let jump = Path::new(cells(&[(0, 0), (2, 0)]), FloatCost::new(2.0), 3, true);
        assert!(!jump.seems_valid());
        let stutter = Path::new(cells(&[(0, 0), (0, 0)]), FloatCost::new(2.0), 3, true);
        assert!(!stutter.seems_valid());
    }

    #[test]
    fn poses_are_cell_centres() {
        let mut costmap = Costmap2D::new_free(4, 4).unwrap();
        costmap.set_resolution(0.5).unwrap();
        costmap.set_origin(WorldPoint::new(1.0, -1.0));

        let mut p = Path::new(cells(&[(0, 0), (1, 0), (2, 0)]), FloatCost::new(2.0), 3, true);
        p.locate(&costmap);
        assert_eq!(
            p.poses,
            vec![
                WorldPoint::new(1.25, -0.75),
                WorldPoint::new(1.75, -0.75),
                WorldPoint::new(2.25, -0.75),
            ]
        );
        assert!((p.length() - 1.0).abs() < 1e-9);
        assert!(p.seems_valid());
    }
}
