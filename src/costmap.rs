//! A read-only snapshot of a 2D costmap.
//!
//! Costs are bytes with the usual reserved values on top:
//!
//! | Value      | Meaning                         |
//! |------------|---------------------------------|
//! | `0`        | Free space                      |
//! | `1..=252`  | Increasingly expensive space    |
//! | `253`      | Inscribed (robot would collide) |
//! | `254`      | Lethal obstacle                 |
//! | `255`      | No information                  |

use thiserror::Error;

use crate::grid::Cell;
use crate::grid::GridDimensions;
use crate::grid::GridError;
use crate::grid::NodeIndex;
use crate::grid::WorldPoint;

pub const FREE_SPACE: u8 = 0;
pub const MAX_NON_OBSTACLE: u8 = 252;
pub const INSCRIBED_INFLATED_OBSTACLE: u8 = 253;
pub const LETHAL_OBSTACLE: u8 = 254;
pub const NO_INFORMATION: u8 = 255;

const MAX_ELEMENTS_DISPLAYED: usize = 40;
/// Cost step of a digit in text maps.
const DIGIT_COST_STEP: u8 = 25;

// Trinary thresholds for occupancy images, as map_server does it.
const OCCUPIED_THRESHOLD: f64 = 0.65;
const FREE_THRESHOLD: f64 = 0.196;

#[derive(Clone, PartialEq)]
pub struct Costmap2D {
    dimensions: GridDimensions,
    /// Metres per cell.
    resolution: f64,
    /// World position of the lower-left corner of cell `(0,0)`.
    origin: WorldPoint,
    data: Vec<u8>,
}

impl Costmap2D {
    pub fn new(
        width: u32,
        height: u32,
        resolution: f64,
        origin: WorldPoint,
        default_cost: u8,
    ) -> Result<Self, GridError> {
        let dimensions = GridDimensions::new(width, height)?;
        check_resolution(resolution)?;
        Ok(Self {
            dimensions,
            resolution,
            origin,
            data: vec![default_cost; dimensions.len()],
        })
    }

    /// A unit-resolution costmap at the origin with all cells free.
    pub fn new_free(width: u32, height: u32) -> Result<Self, GridError> {
        Self::new(width, height, 1.0, WorldPoint::default(), FREE_SPACE)
    }

    #[inline(always)]
    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.dimensions.width()
    }
    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.dimensions.height()
    }
    #[inline(always)]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }
    #[inline(always)]
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    pub fn set_resolution(&mut self, resolution: f64) -> Result<(), GridError> {
        check_resolution(resolution)?;
        self.resolution = resolution;
        Ok(())
    }
    pub fn set_origin(&mut self, origin: WorldPoint) {
        self.origin = origin;
    }

    /// Cost of an in-bounds cell.
    #[inline(always)]
    pub fn cost(&self, cell: &Cell) -> Option<u8> {
        let i = self.dimensions.index(cell)?;
        Some(self.data[i.as_usize()])
    }

    #[inline(always)]
    pub fn cost_at(&self, index: NodeIndex) -> u8 {
        self.data[index.as_usize()]
    }

    /// Returns whether the cell was in bounds.
    pub fn set_cost(&mut self, cell: &Cell, cost: u8) -> bool {
        match self.dimensions.index(cell) {
            Some(i) => {
                self.data[i.as_usize()] = cost;
                true
            }
            None => false,
        }
    }

    /// All costs in index order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn world_to_map(&self, p: &WorldPoint) -> Option<Cell> {
        if p.x < self.origin.x || p.y < self.origin.y {
            return None;
        }
        let mx = ((p.x - self.origin.x) / self.resolution).floor();
        let my = ((p.y - self.origin.y) / self.resolution).floor();
        if !mx.is_finite() || !my.is_finite() {
            return None;
        }
        let cell = Cell::new(mx as u32, my as u32);
        self.dimensions.contains(&cell).then_some(cell)
    }

    /// Centre of a cell in world coordinates.
    pub fn map_to_world(&self, cell: &Cell) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + (cell.x as f64 + 0.5) * self.resolution,
            self.origin.y + (cell.y as f64 + 0.5) * self.resolution,
        )
    }
}

fn check_resolution(resolution: f64) -> Result<(), GridError> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(())
    } else {
        Err(GridError::InvalidResolution(resolution))
    }
}

pub(crate) fn cost_to_char(cost: u8) -> char {
    match cost {
        FREE_SPACE => '.',
        NO_INFORMATION => '?',
        LETHAL_OBSTACLE => '#',
        INSCRIBED_INFLATED_OBSTACLE => '@',
        c => char::from(b'0' + (c / DIGIT_COST_STEP).min(9)),
    }
}

impl std::fmt::Display for Costmap2D {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Costmap2D({}):", self.dimensions)?;
        let width = self.width() as usize;
        for row in self.data.chunks(width).take(MAX_ELEMENTS_DISPLAYED) {
            for cost in row.iter().take(MAX_ELEMENTS_DISPLAYED) {
                write!(f, "{}", cost_to_char(*cost))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Costmap2D {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Costmap2D({}, res={}, origin={})",
            self.dimensions, self.resolution, self.origin
        )
    }
}

#[derive(Debug, Error)]
pub enum CostmapParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Invalid character '{ch}' found at ({x},{y})")]
    InvalidCharacter { ch: char, x: usize, y: usize },
    #[error("Row {y} has {found} cells, expected {expected}")]
    RaggedRow {
        y: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid dimensions: {0}")]
    Dimensions(#[from] GridError),
    #[error("I/O error when loading '{p}': {e}")]
    IOError {
        p: std::path::PathBuf,
        e: std::io::Error,
    },
    #[error("Image error when loading '{p}': {e}")]
    ImageError {
        p: std::path::PathBuf,
        e: image::ImageError,
    },
}

/// Cost encoded by a text-map character, if any.
pub(crate) fn char_to_cost(ch: char) -> Option<u8> {
    match ch {
        ' ' | '.' => Some(FREE_SPACE),
        '#' | '█' => Some(LETHAL_OBSTACLE),
        '@' => Some(INSCRIBED_INFLATED_OBSTACLE),
        '?' => Some(NO_INFORMATION),
        '0'..='9' => Some((ch as u8 - b'0') * DIGIT_COST_STEP),
        _ => None,
    }
}

/// Splits a text map into rows of characters, top row first, checking it is
/// rectangular.
pub(crate) fn text_rows(s: &str) -> Result<Vec<Vec<char>>, CostmapParseError> {
    let rows: Vec<Vec<char>> = s
        .lines()
        .map(|l| l.trim_end_matches('\r').chars().collect())
        .collect();
    // Trailing blank lines (from `indoc!`) are not part of the map.
    let len = rows.iter().rposition(|r| !r.is_empty()).map_or(0, |i| i + 1);
    let rows = rows[..len].to_vec();

    if rows.is_empty() {
        return Err(CostmapParseError::EmptyInput);
    }
    let expected = rows[0].len();
    for (y, row) in rows.iter().enumerate() {
        if row.len() != expected {
            return Err(CostmapParseError::RaggedRow {
                y,
                expected,
                found: row.len(),
            });
        }
    }
    Ok(rows)
}

impl std::convert::TryFrom<&str> for Costmap2D {
    type Error = CostmapParseError;

    /// Parses a text map.
    ///
    /// Rows are read top to bottom as increasing `y`, so the map reads the
    /// same way it is printed.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let rows = text_rows(s)?;
        let mut costmap = Costmap2D::new_free(rows[0].len() as u32, rows.len() as u32)?;

        for (y, row) in rows.iter().enumerate() {
            for (x, &ch) in row.iter().enumerate() {
                let cost =
                    char_to_cost(ch).ok_or(CostmapParseError::InvalidCharacter { ch, x, y })?;
                costmap.set_cost(&Cell::new(x as u32, y as u32), cost);
            }
        }

        Ok(costmap)
    }
}

/// Maps a grayscale pixel to a trinary cost.
fn pixel_to_cost(px: u8) -> u8 {
    let occupancy = (u8::MAX - px) as f64 / u8::MAX as f64;
    if occupancy > OCCUPIED_THRESHOLD {
        LETHAL_OBSTACLE
    } else if occupancy < FREE_THRESHOLD {
        FREE_SPACE
    } else {
        NO_INFORMATION
    }
}

impl std::convert::TryFrom<&std::path::Path> for Costmap2D {
    type Error = CostmapParseError;

    /// Loads an occupancy image (dark is occupied, light is free, grey is
    /// unknown).
    fn try_from(p: &std::path::Path) -> Result<Self, Self::Error> {
        use image::ImageReader;

        let img = ImageReader::open(p)
            .map_err(|e| CostmapParseError::IOError {
                p: p.to_path_buf(),
                e,
            })?
            .decode()
            .map_err(|e| CostmapParseError::ImageError {
                p: p.to_path_buf(),
                e,
            })?
            .into_luma8();

        let mut costmap = Costmap2D::new_free(img.width(), img.height())?;
        for (x, y, px) in img.enumerate_pixels() {
            costmap.set_cost(&Cell::new(x, y), pixel_to_cost(px.0[0]));
        }

        Ok(costmap)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn parse_text() {
        let costmap = Costmap2D::try_from(indoc! {"
            .#?
            @4.
        "})
        .unwrap();
        assert_eq!(costmap.width(), 3);
        assert_eq!(costmap.height(), 2);
        assert_eq!(costmap.cost(&Cell::new(0, 0)), Some(FREE_SPACE));
        assert_eq!(costmap.cost(&Cell::new(1, 0)), Some(LETHAL_OBSTACLE));
        assert_eq!(costmap.cost(&Cell::new(2, 0)), Some(NO_INFORMATION));
        assert_eq!(
            costmap.cost(&Cell::new(0, 1)),
            Some(INSCRIBED_INFLATED_OBSTACLE)
        );
        assert_eq!(costmap.cost(&Cell::new(1, 1)), Some(100));
        assert_eq!(costmap.cost(&Cell::new(3, 1)), None);
    }

    #[test]
    fn parse_text_errors() {
        assert!(matches!(
            Costmap2D::try_from(""),
            Err(CostmapParseError::EmptyInput)
        ));
        assert!(matches!(
            Costmap2D::try_from("..\n.x\n"),
            Err(CostmapParseError::InvalidCharacter { ch: 'x', x: 1, y: 1 })
        ));
        assert!(matches!(
            Costmap2D::try_from("...\n..\n"),
            Err(CostmapParseError::RaggedRow {
                y: 1,
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            Costmap2D::try_from("\n...\n"),
            Err(CostmapParseError::RaggedRow {
                y: 1,
                expected: 0,
                found: 3
            })
        ));
        assert!(matches!(
            Costmap2D::try_from("\n\n"),
            Err(CostmapParseError::EmptyInput)
        ));
    }

    #[test]
    fn display_round_trips() {
        let text = "..#\n?@9\n";
        let costmap = Costmap2D::try_from(text).unwrap();
        assert_eq!(format!("{costmap}"), format!("Costmap2D(3x2):\n{text}"));
    }

    #[test]
    fn world_transforms() {
        let costmap = Costmap2D::new(10, 4, 0.05, WorldPoint::new(-1.0, 2.0), FREE_SPACE).unwrap();
        assert_eq!(
            costmap.world_to_map(&WorldPoint::new(-1.0, 2.0)),
            Some(Cell::new(0, 0))
        );
        assert_eq!(
            costmap.world_to_map(&WorldPoint::new(-0.51, 2.19)),
            Some(Cell::new(9, 3))
        );
        assert_eq!(costmap.world_to_map(&WorldPoint::new(-0.49, 2.0)), None);
        assert_eq!(costmap.world_to_map(&WorldPoint::new(-1.01, 2.0)), None);
        assert_eq!(costmap.world_to_map(&WorldPoint::new(-1.0, 2.2)), None);

        let centre = costmap.map_to_world(&Cell::new(3, 1));
        assert!((centre.x - -0.825).abs() < 1e-9);
        assert!((centre.y - 2.075).abs() < 1e-9);
        assert_eq!(costmap.world_to_map(&centre), Some(Cell::new(3, 1)));
    }

    #[test]
    fn resolution_must_be_positive() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Costmap2D::new(5, 5, bad, WorldPoint::default(), FREE_SPACE),
                Err(GridError::InvalidResolution(_))
            ));
        }

        let mut costmap = Costmap2D::new_free(5, 5).unwrap();
        assert!(matches!(
            costmap.set_resolution(-1.0),
            Err(GridError::InvalidResolution(r)) if r == -1.0
        ));
        assert_eq!(costmap.resolution(), 1.0);
        assert_eq!(costmap.world_to_map(&WorldPoint::new(5.0, 5.0)), None);
        assert_eq!(
            costmap.world_to_map(&WorldPoint::new(4.5, 0.5)),
            Some(Cell::new(4, 0))
        );
    }

    #[test]
    fn trinary_pixels() {
        assert_eq!(pixel_to_cost(0), LETHAL_OBSTACLE);
        assert_eq!(pixel_to_cost(255), FREE_SPACE);
        assert_eq!(pixel_to_cost(205), NO_INFORMATION);
    }

    #[test]
    fn load_png() {
        let dir = std::env::temp_dir().join("gridplan-costmap-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("map.png");

        let mut img = image::GrayImage::from_pixel(3, 2, image::Luma([255u8]));
        img.put_pixel(1, 0, image::Luma([0u8]));
        img.put_pixel(2, 1, image::Luma([205u8]));
        img.save(&path).unwrap();

        let costmap = Costmap2D::try_from(path.as_path()).unwrap();
        assert_eq!(costmap.width(), 3);
        assert_eq!(costmap.height(), 2);
        assert_eq!(costmap.cost(&Cell::new(0, 0)), Some(FREE_SPACE));
        assert_eq!(costmap.cost(&Cell::new(1, 0)), Some(LETHAL_OBSTACLE));
        assert_eq!(costmap.cost(&Cell::new(2, 1)), Some(NO_INFORMATION));

        assert!(matches!(
            Costmap2D::try_from(dir.join("missing.png").as_path()),
            Err(CostmapParseError::IOError { .. })
        ));
    }
}
