//! Cell coordinates and their dense linear index.
//!
//! Every cell in a `width × height` grid maps to `x + y * width`. The index is
//! what the search graph, the costmap and the neighbour offsets share.

use derive_more::Display;
use nonmax::NonMaxU32;
use thiserror::Error;

pub(crate) type CoordIntrinsic = u32;

/// A cell in the grid.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[display("({x},{y})")]
pub struct Cell {
    pub x: CoordIntrinsic,
    pub y: CoordIntrinsic,
}

impl Cell {
    #[inline(always)]
    pub const fn new(x: CoordIntrinsic, y: CoordIntrinsic) -> Self {
        Self { x, y }
    }

    /// Straight-line distance in cells.
    #[inline(always)]
    #[must_use]
    pub fn euclidean_distance(&self, other: &Cell) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        dx.hypot(dy)
    }
}

impl From<(CoordIntrinsic, CoordIntrinsic)> for Cell {
    fn from((x, y): (CoordIntrinsic, CoordIntrinsic)) -> Self {
        Self { x, y }
    }
}

/// A point in the map frame (metres).
#[derive(Copy, Clone, Debug, Default, Display, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[display("({x:.3},{y:.3})")]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Linear index of a cell, `x + y * width`.
///
/// Backed by a [`NonMaxU32`] so `Option<NodeIndex>` (parent links) costs
/// nothing extra.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("#{_0}")]
pub struct NodeIndex(NonMaxU32);

impl NodeIndex {
    #[inline(always)]
    pub fn new(i: u32) -> Option<Self> {
        NonMaxU32::new(i).map(Self)
    }
    #[inline(always)]
    pub fn from_usize(i: usize) -> Option<Self> {
        u32::try_from(i).ok().and_then(Self::new)
    }
    #[inline(always)]
    pub fn get(&self) -> u32 {
        self.0.get()
    }
    #[inline(always)]
    pub fn as_usize(&self) -> usize {
        self.0.get() as usize
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Node2D only supports a single angle bin, got {0}")]
    AngleQuantization(u32),
    #[error("Invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Resolution must be finite and positive, got {0}")]
    InvalidResolution(f64),
}

/// `x + y * width`
///
/// ```
/// use gridplan::grid::get_index;
/// assert_eq!(get_index(0, 0, 5), 0);
/// assert_eq!(get_index(4, 0, 5), 4);
/// assert_eq!(get_index(0, 1, 5), 5);
/// assert_eq!(get_index(3, 2, 5), 13);
/// ```
#[inline(always)]
#[must_use]
pub fn get_index(x: CoordIntrinsic, y: CoordIntrinsic, width: u32) -> u32 {
    x + y * width
}

/// Inverse of [`get_index`].
///
/// 2D nodes carry no heading, so anything other than one angle bin is a
/// configuration mistake by the caller.
#[inline(always)]
pub fn get_coords(index: u32, width: u32, angle_bins: u32) -> Result<Cell, GridError> {
    if angle_bins != 1 {
        return Err(GridError::AngleQuantization(angle_bins));
    }
    if width == 0 {
        return Err(GridError::InvalidDimensions { width, height: 0 });
    }
    Ok(Cell::new(index % width, index / width))
}

/// Size of a grid.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("{width}x{height}")]
pub struct GridDimensions {
    width: u32,
    height: u32,
}

impl GridDimensions {
    /// Both sides must be non-zero and every cell must have a [`NodeIndex`].
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        let cells = (width as u64) * (height as u64);
        if width == 0 || height == 0 || cells >= u32::MAX as u64 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }
    /// Number of cells.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn contains(&self, cell: &Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// The index of an in-bounds cell.
    #[inline(always)]
    pub fn index(&self, cell: &Cell) -> Option<NodeIndex> {
        if !self.contains(cell) {
            return None;
        }
        NodeIndex::new(get_index(cell.x, cell.y, self.width))
    }

    #[inline(always)]
    pub fn cell(&self, index: NodeIndex) -> Cell {
        debug_assert!(index.as_usize() < self.len());
        let i = index.get();
        Cell::new(i % self.width, i / self.width)
    }
}
