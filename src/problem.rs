use std::collections::HashSet;

use thiserror::Error;

use crate::costmap::Costmap2D;
use crate::costmap::CostmapParseError;
use crate::costmap::FREE_SPACE;
use crate::costmap::INSCRIBED_INFLATED_OBSTACLE;
use crate::costmap::LETHAL_OBSTACLE;
use crate::costmap::MAX_NON_OBSTACLE;
use crate::costmap::char_to_cost;
use crate::costmap::cost_to_char;
use crate::costmap::text_rows;
use crate::grid::Cell;
use crate::path::Path;
use crate::planner::PlanRequest;

const RANDOM_CELL_MAX_TRIES: usize = 1_000;

/// A costmap with a start and a goal.
///
/// Text maps mark them with `S` and `G`, both standing on free cells.
#[derive(Clone, Debug, PartialEq)]
pub struct GridProblem {
    pub costmap: Costmap2D,
    pub start: Cell,
    pub goal: Cell,
}

#[derive(Debug, Error)]
pub enum GridProblemParseError {
    #[error("Invalid map: {0}")]
    Costmap(#[from] CostmapParseError),
    #[error("No start ('S') found")]
    MissingStart,
    #[error("No goal ('G') found")]
    MissingGoal,
    #[error("Second start found at ({x},{y})")]
    DuplicateStart { x: usize, y: usize },
    #[error("Second goal found at ({x},{y})")]
    DuplicateGoal { x: usize, y: usize },
    #[error("I/O error when loading '{p}': {e}")]
    IOError {
        p: std::path::PathBuf,
        e: std::io::Error,
    },
}

impl GridProblem {
    pub fn new(costmap: Costmap2D, start: Cell, goal: Cell) -> Self {
        Self {
            costmap,
            start,
            goal,
        }
    }

    pub fn request(&self) -> PlanRequest {
        PlanRequest::new(self.start, self.goal)
    }

    /// A random costmap where each cell is lethal with probability
    /// `lethal_ratio` and otherwise takes a random non-lethal cost, with a
    /// random free start and goal.
    pub fn random<R: rand::Rng>(
        r: &mut R,
        width: u32,
        height: u32,
        lethal_ratio: f64,
    ) -> Option<Self> {
        let mut costmap = Costmap2D::new_free(width, height).ok()?;
        let lethal_ratio = lethal_ratio.clamp(0.0, 1.0);
        for y in 0..height {
            for x in 0..width {
                let cost = if r.random_bool(lethal_ratio) {
                    LETHAL_OBSTACLE
                } else if r.random_bool(0.5) {
                    FREE_SPACE
                } else {
                    r.random_range(1..=MAX_NON_OBSTACLE)
                };
                costmap.set_cost(&Cell::new(x, y), cost);
            }
        }
        let mut problem = Self::new(costmap, Cell::default(), Cell::default());
        problem.randomize(r)?;
        Some(problem)
    }

    /// Picks a new random start and goal among the free cells.
    ///
    /// Returns `None` and leaves the problem untouched if it keeps landing
    /// on obstacles.
    pub fn randomize<R: rand::Rng>(&mut self, r: &mut R) -> Option<()> {
        let start = self.random_free_cell(r)?;
        let goal = self.random_free_cell(r)?;
        self.start = start;
        self.goal = goal;
        Some(())
    }

    fn random_free_cell<R: rand::Rng>(&self, r: &mut R) -> Option<Cell> {
        for _tries in 0..RANDOM_CELL_MAX_TRIES {
            let cell = Cell::new(
                r.random_range(0..self.costmap.width()),
                r.random_range(0..self.costmap.height()),
            );
            if self
                .costmap
                .cost(&cell)
                .is_some_and(|c| c < INSCRIBED_INFLATED_OBSTACLE)
            {
                return Some(cell);
            }
        }
        None
    }

    /// Draws the map with the start, the goal and `path` on it.
    pub fn render(&self, path: Option<&Path>) -> String {
        let on_path: HashSet<Cell> = path
            .map(|p| p.cells.iter().copied().collect())
            .unwrap_or_default();
        let mut out = String::new();
        for y in 0..self.costmap.height() {
            for x in 0..self.costmap.width() {
                let cell = Cell::new(x, y);
                let ch = if cell == self.start {
                    'S'
                } else if cell == self.goal {
                    'G'
                } else if on_path.contains(&cell) {
                    '*'
                } else {
                    self.costmap.cost(&cell).map_or(' ', cost_to_char)
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

impl std::fmt::Display for GridProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(
            f,
            "GridProblem({}, {} -> {}):",
            self.costmap.dimensions(),
            self.start,
            self.goal
        )?;
        write!(f, "{}", self.render(None))
    }
}

impl std::convert::TryFrom<&str> for GridProblem {
    type Error = GridProblemParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let rows = text_rows(s)?;
        let mut costmap = Costmap2D::new_free(rows[0].len() as u32, rows.len() as u32)
            .map_err(CostmapParseError::from)?;
        let mut start = None;
        let mut goal = None;

        for (y, row) in rows.iter().enumerate() {
            for (x, &ch) in row.iter().enumerate() {
                let cell = Cell::new(x as u32, y as u32);
                let cost = match ch {
                    'S' => {
                        if start.replace(cell).is_some() {
                            return Err(GridProblemParseError::DuplicateStart { x, y });
                        }
                        FREE_SPACE
                    }
                    'G' => {
                        if goal.replace(cell).is_some() {
                            return Err(GridProblemParseError::DuplicateGoal { x, y });
                        }
                        FREE_SPACE
                    }
                    ch => char_to_cost(ch).ok_or(CostmapParseError::InvalidCharacter { ch, x, y })?,
                };
                costmap.set_cost(&cell, cost);
            }
        }

        Ok(Self {
            costmap,
            start: start.ok_or(GridProblemParseError::MissingStart)?,
            goal: goal.ok_or(GridProblemParseError::MissingGoal)?,
        })
    }
}

impl std::convert::TryFrom<&std::path::Path> for GridProblem {
    type Error = GridProblemParseError;

    fn try_from(p: &std::path::Path) -> Result<Self, Self::Error> {
        let s = std::fs::read_to_string(p).map_err(|e| GridProblemParseError::IOError {
            p: p.to_path_buf(),
            e,
        })?;
        GridProblem::try_from(s.as_str())
    }
}
