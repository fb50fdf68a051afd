use smallvec::SmallVec;

use crate::collision::CollisionChecker;
use crate::costmap::Costmap2D;
use crate::error::ConfigError;
use crate::grid::Cell;
use crate::grid::GridDimensions;
use crate::grid::NodeIndex;
use crate::motion_model::MAX_NEIGHBOURS;
use crate::motion_model::MotionModel;
use crate::motion_model::NeighbourTable;
use crate::node::Node2D;

/// A neighbour produced by expanding a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbour {
    pub index: NodeIndex,
    /// Length of the move in cells.
    pub distance: f32,
}

pub type Neighbours = SmallVec<[Neighbour; MAX_NEIGHBOURS]>;

/// All the Search Nodes of a grid, one per cell.
///
/// The nodes are allocated once per grid size and recycled with
/// [`SearchGraph::reset`], so replanning on the same map does not allocate.
/// Parent links are indices into this arena.
#[derive(Clone)]
pub struct SearchGraph {
    dimensions: GridDimensions,
    nodes: Vec<Node2D>,
    neighbourhood: Option<NeighbourTable>,
    /// Set by a search, cleared by [`SearchGraph::reset`].
    searched: bool,
}

impl SearchGraph {
    pub fn new(dimensions: GridDimensions) -> Self {
        let mut graph = Self {
            dimensions,
            nodes: vec![],
            neighbourhood: None,
            searched: false,
        };
        graph.allocate();
        graph
    }

    fn allocate(&mut self) {
        self.searched = false;
        self.nodes.clear();
        self.nodes.reserve_exact(self.dimensions.len());
        for i in 0..self.dimensions.len() {
            // `GridDimensions` guarantees every cell has an index.
            if let Some(index) = NodeIndex::from_usize(i) {
                self.nodes.push(Node2D::new(0, index));
            }
        }
        debug_assert_eq!(self.nodes.len(), self.dimensions.len());
    }

    /// Re-sizes the arena for a new grid, reallocating only on change.
    ///
    /// A new width invalidates the neighbourhood.
    pub fn resize(&mut self, dimensions: GridDimensions) -> bool {
        if dimensions == self.dimensions {
            return false;
        }
        if dimensions.width() != self.dimensions.width() {
            self.neighbourhood = None;
        }
        self.dimensions = dimensions;
        self.allocate();
        true
    }

    #[inline(always)]
    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Reserved memory, in nodes.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Prepares every node for a new search over `costmap`.
    pub fn reset(&mut self, costmap: &Costmap2D) -> Result<(), ConfigError> {
        if costmap.dimensions() != self.dimensions {
            return Err(ConfigError::GraphSizeMismatch {
                graph: self.dimensions,
                costmap: costmap.dimensions(),
            });
        }
        for (node, cost) in self.nodes.iter_mut().zip(costmap.data()) {
            node.reset(*cost);
        }
        self.searched = false;
        Ok(())
    }

    /// Whether a search ran since the last [`SearchGraph::reset`].
    #[inline(always)]
    pub fn needs_reset(&self) -> bool {
        self.searched
    }

    /// Claims the graph for a search.
    pub(crate) fn start_search(&mut self) -> Result<(), ConfigError> {
        if self.searched {
            return Err(ConfigError::GraphNotReset);
        }
        self.searched = true;
        Ok(())
    }

    /// (Re)computes neighbour offsets for the current width.
    pub fn init_neighbourhood(&mut self, model: MotionModel) {
        let width = self.dimensions.width();
        if !self.has_neighbourhood(model) {
            self.neighbourhood = Some(NeighbourTable::new(width, model));
        }
    }

    pub fn has_neighbourhood(&self, model: MotionModel) -> bool {
        self.neighbourhood
            .as_ref()
            .is_some_and(|t| t.is_initialized_for(self.dimensions.width(), model))
    }

    /// The neighbourhood, if it matches the grid and the requested model.
    pub fn neighbourhood(&self, model: MotionModel) -> Result<&NeighbourTable, ConfigError> {
        let width = self.dimensions.width();
        match &self.neighbourhood {
            Some(t) if t.is_initialized_for(width, model) => Ok(t),
            Some(t) => Err(ConfigError::StaleNeighbourhood {
                width,
                model,
                table_width: t.width(),
                table_model: t.model(),
            }),
            None => Err(ConfigError::MissingNeighbourhood { width, model }),
        }
    }

    #[inline(always)]
    pub fn node_index(&self, cell: &Cell) -> Option<NodeIndex> {
        self.dimensions.index(cell)
    }
    #[inline(always)]
    pub fn cell(&self, index: NodeIndex) -> Cell {
        self.dimensions.cell(index)
    }

    /// Expands `node` into its valid neighbours.
    ///
    /// Offsets are tried in table order. A candidate is dropped when it falls
    /// off the grid, is in collision, or `is_candidate` rejects it.
    pub fn get_neighbours<CC, F>(
        &self,
        node: NodeIndex,
        table: &NeighbourTable,
        collision_checker: &CC,
        traverse_unknown: bool,
        mut is_candidate: F,
        neighbours: &mut Neighbours,
    ) where
        CC: CollisionChecker + ?Sized,
        F: FnMut(&Node2D) -> bool,
    {
        #[cfg(feature = "coz_profile")]
        coz::scope!("NodeExpansion");

        debug_assert_eq!(table.width(), self.dimensions.width());
        let cell = self.cell(node);
        let (max_x, max_y) = (self.dimensions.width(), self.dimensions.height());

        for offset in table.offsets() {
            // Checking coordinates rather than the linear index stops moves
            // from wrapping onto the next row.
            let x = cell.x.checked_add_signed(offset.dx as i32);
            let y = cell.y.checked_add_signed(offset.dy as i32);
            let (Some(x), Some(y)) = (x, y) else {
                continue;
            };
            if x >= max_x || y >= max_y {
                continue;
            }

            let index = node.get() as i64 + offset.delta;
            debug_assert_eq!(index, (x + y * max_x) as i64);
            let Some(index) = NodeIndex::new(index as u32) else {
                continue;
            };

            let neighbour = &self[index];
            if !neighbour.is_node_valid(traverse_unknown, collision_checker) {
                continue;
            }
            if is_candidate(neighbour) {
                neighbours.push(Neighbour {
                    index,
                    distance: offset.distance,
                });
            }
        }
    }

    /// Follows parents from `node` back to the root, returning the path
    /// root first.
    pub fn backtrace(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self[current].parent() {
            debug_assert!(path.len() <= self.len(), "Parent links form a cycle");
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }
}

impl std::ops::Index<NodeIndex> for SearchGraph {
    type Output = Node2D;

    #[inline(always)]
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.as_usize()]
    }
}

impl std::ops::IndexMut<NodeIndex> for SearchGraph {
    #[inline(always)]
    fn index_mut(&mut self, index: NodeIndex) -> &mut Node2D {
        &mut self.nodes[index.as_usize()]
    }
}

impl std::fmt::Debug for SearchGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "SearchGraph{{{} ({} nodes), {:?}, searched: {}}}",
            self.dimensions,
            self.len(),
            self.neighbourhood.as_ref().map(|t| t.model()),
            self.searched
        )
    }
}
