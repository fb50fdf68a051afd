//! The planning surface: costmap and request in, path out.
//!
//! A [`Planner2D`] keeps one [`AStar2D`] alive across requests. Planning on a
//! map of the same size only resets the graph; a new size reallocates it, and
//! a new width or motion model recomputes the neighbour offsets.

use log::debug;
use log::info;

use crate::collision::CollisionChecker;
use crate::collision::GridCollisionChecker;
use crate::config::PlannerConfig;
use crate::config::SearchBudget;
use crate::costmap::Costmap2D;
use crate::error::InvalidRequest;
use crate::error::PlanError;
use crate::grid::Cell;
use crate::grid::WorldPoint;
use crate::motion_model::MotionModel;
use crate::path::Path;
use crate::search::AStar2D;
use crate::search::SearchQuery;

/// A start or goal, either as a cell or as a point in the map frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Endpoint {
    Cell(Cell),
    World(WorldPoint),
}

impl From<Cell> for Endpoint {
    fn from(c: Cell) -> Self {
        Endpoint::Cell(c)
    }
}
impl From<WorldPoint> for Endpoint {
    fn from(p: WorldPoint) -> Self {
        Endpoint::World(p)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Endpoint::Cell(c) => write!(f, "{c}"),
            Endpoint::World(p) => write!(f, "{p}m"),
        }
    }
}

/// A single planning request. Unset options fall back to the
/// [`PlannerConfig`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlanRequest {
    pub start: Endpoint,
    pub goal: Endpoint,
    pub motion_model: Option<MotionModel>,
    pub traverse_unknown: Option<bool>,
    pub budget: Option<SearchBudget>,
}

impl PlanRequest {
    pub fn new(start: impl Into<Endpoint>, goal: impl Into<Endpoint>) -> Self {
        Self {
            start: start.into(),
            goal: goal.into(),
            motion_model: None,
            traverse_unknown: None,
            budget: None,
        }
    }
    pub fn with_motion_model(mut self, motion_model: MotionModel) -> Self {
        self.motion_model = Some(motion_model);
        self
    }
    pub fn with_traverse_unknown(mut self, traverse_unknown: bool) -> Self {
        self.traverse_unknown = Some(traverse_unknown);
        self
    }
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = Some(budget);
        self
    }
}

#[derive(Debug, Default)]
pub struct Planner2D {
    config: PlannerConfig,
    /// Created on the first request, sized for its costmap.
    astar: Option<AStar2D>,
}

impl Planner2D {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            astar: None,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
    pub fn set_config(&mut self, config: PlannerConfig) {
        self.config = config;
    }

    /// The search state of the last request, if any.
    pub fn astar(&self) -> Option<&AStar2D> {
        self.astar.as_ref()
    }

    pub fn plan(&mut self, costmap: &Costmap2D, request: &PlanRequest) -> Result<Path, PlanError> {
        self.config.validate()?;
        debug!("Planning {} -> {} on {costmap:?}", request.start, request.goal);

        let start = resolve(costmap, &request.start)?;
        let goal = resolve(costmap, &request.goal)?;
        let dimensions = costmap.dimensions();
        if !dimensions.contains(&start) {
            return Err(InvalidRequest::StartOutOfBounds(start, dimensions).into());
        }
        if !dimensions.contains(&goal) {
            return Err(InvalidRequest::GoalOutOfBounds(goal, dimensions).into());
        }

        let motion_model = request.motion_model.unwrap_or(self.config.motion_model);
        let traverse_unknown = request
            .traverse_unknown
            .unwrap_or(self.config.traverse_unknown);
        let budget = request.budget.unwrap_or(self.config.budget);

        if let Some(astar) = self.astar.as_mut() {
            if astar.graph_mut().resize(dimensions) {
                debug!("Resized search graph to {dimensions}");
            }
        }
        let astar = self.astar.get_or_insert_with(|| AStar2D::new(dimensions));
        let graph = astar.graph_mut();
        graph.init_neighbourhood(motion_model);
        graph.reset(costmap)?;

        let checker = GridCollisionChecker::new(costmap);
        // Bounds were checked above.
        if let Some(i) = graph.node_index(&start) {
            if checker.in_collision(i, traverse_unknown) {
                return Err(InvalidRequest::StartOccupied(start).into());
            }
        }
        if let Some(i) = graph.node_index(&goal) {
            if checker.in_collision(i, traverse_unknown) {
                return Err(InvalidRequest::GoalOccupied(goal).into());
            }
        }

        let query = SearchQuery::new(start, goal)
            .with_motion_model(motion_model)
            .with_traverse_unknown(traverse_unknown)
            .with_budget(budget)
            .with_tolerance(
                self.config.tolerance_in_cells(costmap.resolution()),
                self.config.max_on_approach_iterations,
            );
        let mut path = astar.search(&query, &self.config.cost_model, &checker)?;
        path.locate(costmap);
        info!(
            "Planned {} steps from {start} to {} (cost {}, {} iterations)",
            path.steps(),
            path.end().unwrap_or(goal),
            path.cost,
            path.iterations
        );
        Ok(path)
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, out: W) -> std::io::Result<()> {
        match &self.astar {
            Some(astar) => astar.write_memory_stats(out),
            None => Ok(()),
        }
    }
}

fn resolve(costmap: &Costmap2D, endpoint: &Endpoint) -> Result<Cell, InvalidRequest> {
    match endpoint {
        Endpoint::Cell(c) => Ok(*c),
        Endpoint::World(p) => costmap.world_to_map(p).ok_or(InvalidRequest::OffMap(*p)),
    }
}
