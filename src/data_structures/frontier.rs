use std::cmp::min;

use crate::cost::Cost;
use crate::grid::NodeIndex;

/// The ranking tuple for A*
///
/// We prefer better f-values, and tie break for lower h, which favours nodes
/// closer to the goal among equally promising ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AStarRank<C: Cost> {
    f: C,
    h: C,
}

impl<C> AStarRank<C>
where
    C: Cost,
{
    #[inline(always)]
    pub fn new(g: C, h: C) -> Self {
        Self {
            f: g.saturating_add(&h),
            h,
        }
    }
    #[inline(always)]
    pub fn f(&self) -> C {
        self.f
    }
    #[inline(always)]
    pub fn h(&self) -> C {
        self.h
    }
}

/// An entry in the open list.
///
/// The same node may be pushed several times as cheaper paths show up; only
/// the best entry matters and the rest go stale once the node is settled.
#[derive(Copy, Clone, Debug)]
pub struct FrontierEntry<C: Cost> {
    pub rank: AStarRank<C>,
    /// Insertion order, the last tie-breaker. Makes equal ranks pop
    /// first-in-first-out.
    pub seq: u32,
    pub node: NodeIndex,
}

impl<C: Cost> FrontierEntry<C> {
    #[inline(always)]
    fn key(&self) -> (AStarRank<C>, u32) {
        (self.rank, self.seq)
    }
}

impl<C: Cost> PartialEq for FrontierEntry<C> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl<C: Cost> Eq for FrontierEntry<C> {}

impl<C: Cost> PartialOrd for FrontierEntry<C> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<C: Cost> Ord for FrontierEntry<C> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

// A d-ary heap laid out in an array.
//
// ```text
//                 0
//     1      2        3      4
//  5 6 7 8 9 10 11 12 ...
// ```
//
//   - Up:         `(i-1)//A`
//   - First child: `(A*i) + 1`
//   - Last child:  `A(i+1)`
const HEAP_ARITY: usize = 4usize;
#[inline(always)]
#[must_use]
fn up(i: usize) -> usize {
    (i - 1) / HEAP_ARITY
}
#[inline(always)]
#[must_use]
fn down_left(i: usize) -> usize {
    (HEAP_ARITY * i) + 1
}

/// Open list of the search: a min-heap without decrease-key.
///
/// Cleared between searches without giving its memory back.
#[derive(Debug)]
pub struct Frontier<C: Cost> {
    heap: Vec<FrontierEntry<C>>,
    next_seq: u32,
}

impl<C: Cost> Frontier<C> {
    pub fn new() -> Self {
        Self {
            heap: vec![],
            next_seq: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }
    /// Entries pushed since the last [`Frontier::clear`].
    pub fn pushed(&self) -> u32 {
        self.next_seq
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }

    pub fn push(&mut self, node: NodeIndex, rank: AStarRank<C>) {
        self.verify_heap();

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(FrontierEntry { rank, seq, node });
        self.sift_up(self.heap.len() - 1);

        self.verify_heap();
    }

    pub fn pop(&mut self) -> Option<FrontierEntry<C>> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Pop");

        self.verify_heap();
        if self.heap.len() <= 1 {
            return self.heap.pop();
        }

        // Move the last entry to the root and let it sink.
        let top = self.heap.swap_remove(0);
        self.sift_down(0);

        self.verify_heap();
        Some(top)
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_heap(&self) {
        // All good... (hopefully)
    }

    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_heap(&self) {
        for i in 1..self.heap.len() {
            let p = up(i);
            debug_assert!(
                self.heap[p] <= self.heap[i],
                "Entry[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.heap[p],
                self.heap[i],
                self.heap.len(),
            );
        }
    }

    /// Returns the entry's new position.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        debug_assert!(pos < self.heap.len());

        while pos > 0 {
            let parent = up(pos);
            if self.heap[parent] <= self.heap[pos] {
                break;
            }
            self.heap.swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Returns the entry's new position.
    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.heap.len();
        debug_assert!(pos < len);

        loop {
            let first = down_left(pos);
            if first >= len {
                break;
            }
            let last = min(first + HEAP_ARITY, len);
            let mut best = first;
            for child in (first + 1)..last {
                if self.heap[child] < self.heap[best] {
                    best = child;
                }
            }

            if self.heap[pos] <= self.heap[best] {
                break;
            }
            self.heap.swap(pos, best);
            pos = best;
        }
        pos
    }
}

impl<C: Cost> Default for Frontier<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Cost for u32 {}

    fn node(i: u32) -> NodeIndex {
        NodeIndex::new(i).unwrap()
    }

    #[test]
    fn ranking() {
        let c0 = 0u32;
        let c1 = 1u32;
        let c2 = 2u32;

        let g = c2;
        assert!(AStarRank::new(g, c0) < AStarRank::new(g, c1));
        assert!(AStarRank::new(g, c1) == AStarRank::new(g, c1));

        // Same f-value, needs tie-breaking on h
        let low = AStarRank::new(c2, c0);
        let high = AStarRank::new(c0, c2);
        assert!(low < high);
        assert_eq!(low.f(), high.f());
        assert_eq!(low.h(), c0);
    }

    #[test]
    fn pops_in_order() {
        let mut frontier = Frontier::<u32>::new();
        let ranks = [9u32, 3, 7, 1, 8, 2, 6, 4, 5, 0, 11, 10];
        for (i, f) in ranks.iter().enumerate() {
            frontier.push(node(i as u32), AStarRank::new(*f, 0));
        }
        assert_eq!(frontier.len(), ranks.len());

        let popped: Vec<u32> = std::iter::from_fn(|| frontier.pop())
            .map(|e| e.rank.f())
            .collect();
        assert_eq!(popped, (0..12).collect::<Vec<_>>());
        assert!(frontier.is_empty());
    }

    #[test]
    fn ties_are_fifo() {
        let mut frontier = Frontier::<u32>::new();
        for i in 0..20 {
            frontier.push(node(i), AStarRank::new(5, 1));
        }
        frontier.push(node(99), AStarRank::new(4, 2));

        // Same f, lower h wins.
        assert_eq!(frontier.pop().unwrap().node, node(0));
        let rest: Vec<u32> = std::iter::from_fn(|| frontier.pop())
            .map(|e| e.node.get())
            .collect();
        let mut expected: Vec<u32> = (1..20).collect();
        expected.push(99);
        assert_eq!(rest, expected);
    }

    #[test]
    fn clear_keeps_memory() {
        let mut frontier = Frontier::<u32>::new();
        for i in 0..100 {
            frontier.push(node(i), AStarRank::new(i, 0));
        }
        let capacity = frontier.capacity();
        frontier.clear();
        assert!(frontier.is_empty());
        assert_eq!(frontier.pushed(), 0);
        assert_eq!(frontier.capacity(), capacity);
    }
}
