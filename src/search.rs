use std::time::Instant;

use log::debug;
use log::trace;
use log::warn;
use num_traits::Zero;

use crate::collision::CollisionChecker;
use crate::config::DEFAULT_MAX_ON_APPROACH_ITERATIONS;
use crate::config::SearchBudget;
use crate::cost_model::CostModel;
use crate::data_structures::frontier::AStarRank;
use crate::data_structures::frontier::Frontier;
use crate::data_structures::frontier::FrontierEntry;
use crate::error::Budget;
use crate::error::InvalidRequest;
use crate::error::PlanError;
use crate::float_cost::FloatCost;
use crate::graph::Neighbours;
use crate::graph::SearchGraph;
use crate::grid::Cell;
use crate::grid::GridDimensions;
use crate::grid::NodeIndex;
use crate::motion_model::MotionModel;
use crate::motion_model::NeighbourTable;
use crate::node::Node2D;
use crate::path::Path;

/// What to search for, in grid terms.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub start: Cell,
    pub goal: Cell,
    pub motion_model: MotionModel,
    pub traverse_unknown: bool,
    pub budget: SearchBudget,
    /// Distance to the goal, in cells, at which the search may settle for a
    /// nearby cell. `0` only accepts the goal.
    pub tolerance: f32,
    pub max_on_approach_iterations: usize,
}

impl SearchQuery {
    pub fn new(start: Cell, goal: Cell) -> Self {
        Self {
            start,
            goal,
            motion_model: MotionModel::default(),
            traverse_unknown: true,
            budget: SearchBudget::unbounded(),
            tolerance: 0.0,
            max_on_approach_iterations: DEFAULT_MAX_ON_APPROACH_ITERATIONS,
        }
    }
    pub fn with_motion_model(mut self, motion_model: MotionModel) -> Self {
        self.motion_model = motion_model;
        self
    }
    pub fn with_traverse_unknown(mut self, traverse_unknown: bool) -> Self {
        self.traverse_unknown = traverse_unknown;
        self
    }
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }
    pub fn with_tolerance(mut self, tolerance: f32, max_on_approach_iterations: usize) -> Self {
        self.tolerance = tolerance;
        self.max_on_approach_iterations = max_on_approach_iterations;
        self
    }
}

/// Best settled node within goal tolerance, by heuristic.
#[derive(Copy, Clone, Debug)]
struct Approach {
    node: NodeIndex,
    h: FloatCost,
    iterations: usize,
}

/// A* over a [`SearchGraph`].
///
/// Owns the graph and the open list so both keep their memory between
/// searches. Callers prepare the graph (size, neighbourhood and
/// [`SearchGraph::reset`]) before each [`AStar2D::search`].
#[derive(Debug)]
pub struct AStar2D {
    graph: SearchGraph,
    frontier: Frontier<FloatCost>,
    /// Scratch space for expansions.
    neighbours: Neighbours,
}

impl AStar2D {
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            graph: SearchGraph::new(dimensions),
            frontier: Frontier::new(),
            neighbours: Neighbours::new(),
        }
    }

    #[inline(always)]
    pub fn graph(&self) -> &SearchGraph {
        &self.graph
    }
    #[inline(always)]
    pub fn graph_mut(&mut self) -> &mut SearchGraph {
        &mut self.graph
    }

    /// Searches for the cheapest path from `query.start` to `query.goal`.
    ///
    /// Only the start is assumed free; the goal is found by expansion and
    /// stays unreachable if it is in collision.
    ///
    /// The graph must be reset between searches.
    pub fn search<CC>(
        &mut self,
        query: &SearchQuery,
        cost_model: &CostModel,
        collision_checker: &CC,
    ) -> Result<Path, PlanError>
    where
        CC: CollisionChecker + ?Sized,
    {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Search");

        // The table is tiny, and owning it leaves the graph free to mutate.
        let table = self.graph.neighbourhood(query.motion_model)?.clone();
        let dimensions = self.graph.dimensions();
        let start = self
            .graph
            .node_index(&query.start)
            .ok_or(InvalidRequest::StartOutOfBounds(query.start, dimensions))?;
        let goal = self
            .graph
            .node_index(&query.goal)
            .ok_or(InvalidRequest::GoalOutOfBounds(query.goal, dimensions))?;
        self.graph.start_search()?;
        debug!(
            "A* {} -> {} on {dimensions} ({}, traverse_unknown={})",
            query.start, query.goal, query.motion_model, query.traverse_unknown
        );

        let tolerance = FloatCost::new(cost_model.neutral_cost * query.tolerance.max(0.0));
        let mut approach: Option<Approach> = None;
        let mut iterations = 0usize;
        let started = Instant::now();

        // Seed
        self.frontier.clear();
        self.graph[start].set_accumulated_cost(FloatCost::zero());
        self.graph[start].queued();
        let h = cost_model.heuristic_cost(&query.start, &query.goal);
        self.frontier.push(start, AStarRank::new(FloatCost::zero(), h));

        while let Some(FrontierEntry { rank, node, .. }) = self.frontier.pop() {
            if self.graph[node].was_visited() {
                // Superseded by a cheaper entry that was already expanded.
                trace!("Discarding stale {node} ({})", rank.f());
                continue;
            }

            if let Some(budget) = self.exhausted_budget(&query.budget, iterations, started) {
                return self.give_up(budget, approach, iterations);
            }
            iterations += 1;

            #[cfg(feature = "coz_profile")]
            coz::scope!("Settle");

            self.graph[node].visited();

            if node == goal {
                #[cfg(feature = "coz_profile")]
                coz::progress!("GoalFound");
                return Ok(self.path(node, iterations, true));
            }

            if rank.h() <= tolerance && query.tolerance > 0.0 {
                let closer = approach.is_none_or(|a| rank.h() < a.h);
                if closer {
                    approach = Some(Approach {
                        node,
                        h: rank.h(),
                        iterations: approach.map_or(0, |a| a.iterations),
                    });
                }
            }
            if let Some(a) = approach.as_mut() {
                if a.iterations >= query.max_on_approach_iterations {
                    debug!("Settling for {} near the goal", self.graph.cell(a.node));
                    return Ok(self.path(a.node, iterations, false));
                }
                a.iterations += 1;
            }

            self.expand(node, query, cost_model, collision_checker, &table);
        }

        if let Some(a) = approach {
            debug!("Goal unreachable, settling for {}", self.graph.cell(a.node));
            return Ok(self.path(a.node, iterations, false));
        }
        debug!("No path after {iterations} iterations");
        Err(PlanError::NoPathFound { iterations })
    }

    /// Relaxes every unsettled neighbour of `node`.
    #[inline(always)]
    fn expand<CC>(
        &mut self,
        node: NodeIndex,
        query: &SearchQuery,
        cost_model: &CostModel,
        collision_checker: &CC,
        table: &NeighbourTable,
    ) where
        CC: CollisionChecker + ?Sized,
    {
        self.neighbours.clear();
        self.graph.get_neighbours(
            node,
            table,
            collision_checker,
            query.traverse_unknown,
            |n: &Node2D| !n.was_visited(),
            &mut self.neighbours,
        );

        let g = self.graph[node].accumulated_cost();
        for n in &self.neighbours {
            #[cfg(feature = "coz_profile")]
            coz::scope!("ReachNode");

            let step = self.graph[node].traversal_cost(&self.graph[n.index], n.distance, cost_model);
            let new_g = g + step;
            let neighbour = &mut self.graph[n.index];
            // Undiscovered nodes are at infinity.
            if new_g < neighbour.accumulated_cost() {
                neighbour.reach(node, new_g);
                neighbour.queued();
                let h = cost_model.heuristic_cost(&self.graph.cell(n.index), &query.goal);
                self.frontier.push(n.index, AStarRank::new(new_g, h));
            }
        }
    }

    fn exhausted_budget(
        &self,
        budget: &SearchBudget,
        iterations: usize,
        started: Instant,
    ) -> Option<Budget> {
        if let Some(limit) = budget.max_iterations {
            if iterations >= limit {
                return Some(Budget::Iterations { limit });
            }
        }
        if let Some(limit) = budget.max_planning_time {
            if started.elapsed() >= limit {
                return Some(Budget::Time { limit });
            }
        }
        None
    }

    fn give_up(
        &self,
        budget: Budget,
        approach: Option<Approach>,
        iterations: usize,
    ) -> Result<Path, PlanError> {
        if let Some(a) = approach {
            debug!("Out of {budget}, settling for {}", self.graph.cell(a.node));
            return Ok(self.path(a.node, iterations, false));
        }
        warn!("Search ran out of {budget} after {iterations} iterations");
        Err(PlanError::BudgetExceeded(budget))
    }

    fn path(&self, end: NodeIndex, iterations: usize, reached_goal: bool) -> Path {
        #[cfg(feature = "coz_profile")]
        coz::scope!("PathReconstruction");

        let cells = self
            .graph
            .backtrace(end)
            .into_iter()
            .map(|i| self.graph.cell(i))
            .collect();
        let path = Path::new(
            cells,
            self.graph[end].accumulated_cost(),
            iterations,
            reached_goal,
        );
        debug!("Found {path} in {iterations} iterations");
        path
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use std::mem::size_of;
        use thousands::Separable;

        writeln!(out, "AStar2D Stats:")?;
        let s = size_of::<Node2D>();
        let l = self.graph.len();
        let c = self.graph.capacity();
        writeln!(
            out,
            "  - |Nodes|:    {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Nodes|*:   {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        let s = size_of::<FrontierEntry<FloatCost>>();
        let l = self.frontier.len();
        let c = self.frontier.capacity();
        writeln!(
            out,
            "  - |Open|:     {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Open|*:    {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;
        writeln!(
            out,
            "  - Pushed:     {}",
            self.frontier.pushed().separate_with_commas()
        )?;

        Ok(())
    }
}
