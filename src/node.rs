use crate::collision::CollisionChecker;
use crate::cost_model::CostModel;
use crate::float_cost::FloatCost;
use crate::grid::NodeIndex;

/// Search state of a single cell.
///
/// Nodes live in a [`crate::graph::SearchGraph`] and link to their parent by
/// index into it.
#[derive(Clone, Debug, PartialEq)]
pub struct Node2D {
    pub(crate) parent: Option<NodeIndex>,
    cell_cost: u8,
    accumulated_cost: FloatCost,
    index: NodeIndex,
    was_visited: bool,
    is_queued: bool,
}

impl Node2D {
    pub fn new(cell_cost: u8, index: NodeIndex) -> Self {
        Self {
            parent: None,
            cell_cost,
            accumulated_cost: FloatCost::infinity(),
            index,
            was_visited: false,
            is_queued: false,
        }
    }

    /// Forgets everything about the last search.
    #[inline(always)]
    pub fn reset(&mut self, cell_cost: u8) {
        self.parent = None;
        self.cell_cost = cell_cost;
        self.accumulated_cost = FloatCost::infinity();
        self.was_visited = false;
        self.is_queued = false;
    }

    #[inline(always)]
    pub fn index(&self) -> NodeIndex {
        self.index
    }
    #[inline(always)]
    pub fn cell_cost(&self) -> u8 {
        self.cell_cost
    }
    #[inline(always)]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    #[inline(always)]
    pub fn accumulated_cost(&self) -> FloatCost {
        self.accumulated_cost
    }
    #[inline(always)]
    pub fn set_accumulated_cost(&mut self, cost: FloatCost) {
        self.accumulated_cost = cost;
    }

    /// Gives this node a cheaper path through `parent`.
    #[inline(always)]
    pub fn reach(&mut self, parent: NodeIndex, g: FloatCost) {
        debug_assert!(!self.was_visited, "settled nodes can't improve");
        debug_assert!(g < self.accumulated_cost);
        debug_assert_ne!(parent, self.index);
        self.parent = Some(parent);
        self.accumulated_cost = g;
    }

    #[inline(always)]
    pub fn was_visited(&self) -> bool {
        self.was_visited
    }
    /// Settles the node, taking it out of the queue.
    #[inline(always)]
    pub fn visited(&mut self) {
        self.was_visited = true;
        self.is_queued = false;
    }

    #[inline(always)]
    pub fn is_queued(&self) -> bool {
        self.is_queued
    }
    #[inline(always)]
    pub fn queued(&mut self) {
        self.is_queued = true;
    }

    /// Whether the node was seen at all in this search.
    #[inline(always)]
    pub fn was_discovered(&self) -> bool {
        self.was_visited || self.is_queued
    }

    #[inline(always)]
    pub fn is_node_valid<CC: CollisionChecker + ?Sized>(
        &self,
        traverse_unknown: bool,
        collision_checker: &CC,
    ) -> bool {
        !collision_checker.in_collision(self.index, traverse_unknown)
    }

    /// Cost of moving from this node into an adjacent `child`, which lies
    /// `travel_distance` cells away.
    #[inline(always)]
    pub fn traversal_cost(
        &self,
        child: &Node2D,
        travel_distance: f32,
        cost_model: &CostModel,
    ) -> FloatCost {
        debug_assert_ne!(self.index, child.index);
        cost_model.traversal_cost(travel_distance, child.cell_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::GridCollisionChecker;
    use crate::costmap::Costmap2D;

    fn index(i: u32) -> NodeIndex {
        NodeIndex::new(i).unwrap()
    }

    #[test]
    fn reset_is_idempotent() {
        let mut n = Node2D::new(10, index(3));
        n.reach(index(2), FloatCost::new(4.0));
        n.queued();
        n.visited();
        assert!(n.was_visited());
        assert!(!n.is_queued());

        for cost in [0u8, 77, 77, 254] {
            n.reset(cost);
            assert_eq!(n.cell_cost(), cost);
            assert!(!n.was_visited());
            assert!(!n.is_queued());
            assert_eq!(n.accumulated_cost(), FloatCost::infinity());
            assert_eq!(n.parent(), None);
            assert_eq!(n.index(), index(3));
        }
    }

    #[test]
    fn visiting_clears_queued() {
        let mut n = Node2D::new(0, index(0));
        assert!(!n.was_discovered());
        n.queued();
        assert!(n.is_queued());
        assert!(n.was_discovered());
        n.visited();
        assert!(!n.is_queued());
        assert!(n.was_visited());
    }

    #[test]
    fn validity() {
        let costmap = Costmap2D::try_from(".#?").unwrap();
        let checker = GridCollisionChecker::new(&costmap);
        let nodes: Vec<Node2D> = (0..3)
            .map(|i| Node2D::new(costmap.cost_at(index(i)), index(i)))
            .collect();

        assert!(nodes[0].is_node_valid(false, &checker));
        assert!(!nodes[1].is_node_valid(false, &checker));
        assert!(!nodes[1].is_node_valid(true, &checker));
        assert!(!nodes[2].is_node_valid(false, &checker));
        assert!(nodes[2].is_node_valid(true, &checker));
    }

    #[test]
    fn traversal_cost_follows_the_child() {
        let m = CostModel::default();
        let centre = Node2D::new(200, index(4));
        let free = Node2D::new(0, index(5));
        let expensive = Node2D::new(200, index(7));

        let straight = centre.traversal_cost(&free, 1.0, &m);
        assert_eq!(straight, FloatCost::new(m.neutral_cost));
        assert!(centre.traversal_cost(&free, std::f32::consts::SQRT_2, &m) > straight);
        assert!(centre.traversal_cost(&expensive, 1.0, &m) > straight);
        // The parent's own cost doesn't matter.
        assert_eq!(free.traversal_cost(&centre, 1.0, &m), centre.traversal_cost(&expensive, 1.0, &m));
    }
}
