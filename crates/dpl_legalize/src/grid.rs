//! Row-by-site occupancy grid.
//!
//! The core area is divided into `row_count` rows of `row_site_count` sites.
//! Each [`Pixel`] records which cell (if any) occupies it, whether a row
//! exists there, and which group owns it. Grid positions of a movable
//! standard cell always refer to its padded footprint: the leftmost pixel is
//! `pad_left` sites to the left of the cell origin.

use crate::data::{Cell, CellKind, Design, Orientation, Power};
use crate::ids::{CellId, GroupId};
use dpl_common::{DplResult, InternalError, Rect};
use dpl_config::LegalizerConfig;
use std::collections::HashMap;

/// A position on the grid, in sites (x) and rows (y).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GridPt {
    /// Site index.
    pub x: i64,
    /// Row index.
    pub y: i64,
}

impl GridPt {
    /// Creates a grid point.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for GridPt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// One site of one row.
#[derive(Debug, Clone, Default)]
pub struct Pixel {
    /// Occupying cell. A lookup key only; the design owns the cell.
    pub cell: Option<CellId>,
    /// `false` where no row exists or a region boundary cuts the site.
    pub is_valid: bool,
    /// Group owning this site; only its members may occupy it.
    pub group: Option<GroupId>,
    /// Fraction of the site covered by group regions.
    pub util: f64,
}

/// The pixel matrix plus the row geometry needed to convert between DBU and
/// grid coordinates.
#[derive(Debug)]
pub struct Grid {
    core: Rect,
    site_width: i64,
    row_height: i64,
    pad_left: i64,
    pad_right: i64,
    row_count: i64,
    row_site_count: i64,
    parity_row: i64,
    parity_orient: Orientation,
    pixels: Vec<Pixel>,
}

impl Grid {
    /// Allocates the grid for `design` and marks the sites covered by its
    /// rows as valid.
    ///
    /// Row parity is anchored on the lowest declared row; every other row
    /// alternates between that orientation and its vertical mirror.
    pub fn new(design: &Design, config: &LegalizerConfig) -> Self {
        let site_width = config.technology.site_width;
        let row_height = config.technology.row_height;
        let core = design.core;
        let row_count = (core.height() / row_height).max(0);
        let row_site_count = (core.width() / site_width).max(0);

        let mut grid = Self {
            core,
            site_width,
            row_height,
            pad_left: i64::from(config.padding.left),
            pad_right: i64::from(config.padding.right),
            row_count,
            row_site_count,
            parity_row: 0,
            parity_orient: Orientation::R0,
            pixels: vec![Pixel::default(); (row_count * row_site_count) as usize],
        };

        if let Some(lowest) = design
            .rows
            .iter()
            .min_by_key(|row| (row.origin.y, row.origin.x))
        {
            grid.parity_row = grid.grid_y(lowest.origin.y);
            grid.parity_orient = match lowest.orient {
                Orientation::MX | Orientation::R180 => Orientation::MX,
                Orientation::R0 | Orientation::MY => Orientation::R0,
            };
        }

        for row in &design.rows {
            let y = grid.grid_y(row.origin.y);
            if y < 0 || y >= row_count {
                continue;
            }
            let x_start = grid.grid_end_x(row.origin.x).max(0);
            let x_end = (grid.grid_x(row.origin.x) + row.site_count).min(row_site_count);
            for x in x_start..x_end {
                if let Some(pixel) = grid.pixel_mut(x, y) {
                    pixel.is_valid = true;
                }
            }
        }
        grid
    }

    /// Marks every pixel under a fixed cell as occupied by it.
    ///
    /// Footprints are clipped to the grid. Overlapping fixed cells simply
    /// overwrite one another; they never move, so the occupant only matters
    /// for "is this site taken".
    pub fn stamp_fixed(&mut self, design: &Design) {
        for cell in design.cells.iter().filter(|c| c.fixed) {
            let x_start = self.grid_x(cell.x).max(0);
            let x_end = self.grid_end_x(cell.x + cell.width).min(self.row_site_count);
            let y_start = self.grid_y(cell.y).max(0);
            let y_end = self.grid_end_y(cell.y + cell.height).min(self.row_count);
            for y in y_start..y_end {
                for x in x_start..x_end {
                    if let Some(pixel) = self.pixel_mut(x, y) {
                        pixel.cell = Some(cell.id);
                    }
                }
            }
        }
    }

    /// Stamps group regions into the grid.
    ///
    /// A site fully covered by the union of a group's rectangles becomes
    /// owned by that group. A site only partially covered becomes invalid so
    /// no cell can straddle the region boundary. Overlapping rectangles of
    /// one group count their shared area once.
    pub fn stamp_groups(&mut self, design: &Design) {
        let site_area = self.site_width * self.row_height;
        for group in &design.groups {
            let mut pieces: HashMap<(i64, i64), Vec<Rect>> = HashMap::new();
            for rect in &group.rects {
                let x_start = self.grid_x(rect.xl).max(0);
                let x_end = self.grid_end_x(rect.xh).min(self.row_site_count);
                let y_start = self.grid_y(rect.yl).max(0);
                let y_end = self.grid_end_y(rect.yh).min(self.row_count);
                for y in y_start..y_end {
                    for x in x_start..x_end {
                        if let Some(piece) = clip(&self.site_rect(x, y), rect) {
                            pieces.entry((x, y)).or_default().push(piece);
                        }
                    }
                }
            }

            for ((x, y), rects) in pieces {
                let covered = union_area(&rects);
                let Some(pixel) = self.pixel_mut(x, y) else {
                    continue;
                };
                if covered >= site_area {
                    pixel.util = 1.0;
                    if pixel.is_valid {
                        pixel.group = Some(group.id);
                    }
                } else {
                    pixel.util = covered as f64 / site_area as f64;
                    pixel.is_valid = false;
                }
            }
        }
    }

    /// Commits `cell` at grid position `pt` (its padded lower-left pixel).
    ///
    /// Sets the cell's position, orientation, and `placed` flag. Painting
    /// over an occupied or out-of-grid pixel is an invariant violation and
    /// returns an error without modifying anything.
    pub fn paint(&mut self, cell: &mut Cell, pt: GridPt) -> DplResult<()> {
        let width = self.padded_width(cell);
        let height = self.grid_height(cell);
        if pt.x < 0
            || pt.y < 0
            || pt.x + width > self.row_site_count
            || pt.y + height > self.row_count
        {
            return Err(InternalError::new(format!(
                "cannot paint cell {} at {pt}: footprint leaves the {}x{} grid",
                cell.id, self.row_site_count, self.row_count
            )));
        }
        for y in pt.y..pt.y + height {
            for x in pt.x..pt.x + width {
                if let Some(other) = self.pixel(x, y).and_then(|p| p.cell) {
                    return Err(InternalError::new(format!(
                        "cannot paint cell {} at {pt}: site [{x}, {y}] is occupied by cell {other}",
                        cell.id
                    )));
                }
            }
        }
        for y in pt.y..pt.y + height {
            for x in pt.x..pt.x + width {
                if let Some(pixel) = self.pixel_mut(x, y) {
                    pixel.cell = Some(cell.id);
                }
            }
        }

        cell.x = self.dbu_x(pt.x + self.pad_left_of(cell));
        cell.y = self.dbu_y(pt.y);
        cell.placed = true;
        cell.orient = self.orientation_for(cell, pt.y);
        Ok(())
    }

    /// Releases the pixels of a placed movable cell.
    ///
    /// Fixed and unplaced cells are left untouched. Erasing also drops the
    /// cell's hold flag.
    pub fn erase(&mut self, cell: &mut Cell) {
        if cell.fixed || !cell.placed {
            return;
        }
        let origin = self.cell_grid_origin(cell);
        let width = self.padded_width(cell);
        let height = self.grid_height(cell);
        for y in origin.y..origin.y + height {
            for x in origin.x..origin.x + width {
                if let Some(pixel) = self.pixel_mut(x, y) {
                    if pixel.cell == Some(cell.id) {
                        pixel.cell = None;
                    }
                }
            }
        }
        cell.placed = false;
        cell.hold = false;
    }

    /// Orientation a cell takes when its bottom edge sits on row `y`.
    ///
    /// Single-row cells follow the row. Taller cells are mirrored when that
    /// puts their top supply pin on the top row's rail.
    pub fn orientation_for(&self, cell: &Cell, y: i64) -> Orientation {
        let orient = self.row_orient(y);
        let height = self.grid_height(cell);
        if height <= 1 || cell.top_power == Power::Unknown {
            return orient;
        }
        let rail = self.row_top_power(y + height - 1);
        if top_power_in(cell, orient, height) == rail {
            orient
        } else {
            orient.flipped_vertically()
        }
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: i64, y: i64) -> Option<&Pixel> {
        if x < 0 || y < 0 || x >= self.row_site_count || y >= self.row_count {
            return None;
        }
        self.pixels.get((y * self.row_site_count + x) as usize)
    }

    pub(crate) fn pixel_mut(&mut self, x: i64, y: i64) -> Option<&mut Pixel> {
        if x < 0 || y < 0 || x >= self.row_site_count || y >= self.row_count {
            return None;
        }
        self.pixels.get_mut((y * self.row_site_count + x) as usize)
    }

    /// Returns `true` if a `width` x `height` footprint at `pt` would leave
    /// exactly one empty site between itself and an occupied site in any
    /// covered row. Sites occupied by `owner` count as empty.
    pub fn leaves_one_site_gap(&self, pt: GridPt, width: i64, height: i64, owner: CellId) -> bool {
        let taken = |x: i64, y: i64| {
            self.pixel(x, y)
                .and_then(|p| p.cell)
                .is_some_and(|c| c != owner)
        };
        let free = |x: i64, y: i64| {
            self.pixel(x, y)
                .is_some_and(|p| p.cell.is_none() || p.cell == Some(owner))
        };
        (pt.y..pt.y + height).any(|y| {
            (free(pt.x - 1, y) && taken(pt.x - 2, y))
                || (free(pt.x + width, y) && taken(pt.x + width + 1, y))
        })
    }

    /// Iterates over all pixels with their coordinates.
    pub fn pixels(&self) -> impl Iterator<Item = (GridPt, &Pixel)> + '_ {
        let width = self.row_site_count.max(1);
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, p)| (GridPt::new(i as i64 % width, i as i64 / width), p))
    }

    /// Orientation of row `y`.
    pub fn row_orient(&self, y: i64) -> Orientation {
        if (y - self.parity_row).rem_euclid(2) == 0 {
            self.parity_orient
        } else {
            self.parity_orient.flipped_vertically()
        }
    }

    /// Supply rail along the top edge of row `y`.
    pub fn row_top_power(&self, y: i64) -> Power {
        match self.row_orient(y) {
            Orientation::R0 | Orientation::MY => Power::Vdd,
            Orientation::MX | Orientation::R180 => Power::Vss,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    /// Number of sites per row.
    pub fn row_site_count(&self) -> i64 {
        self.row_site_count
    }

    /// Site width in DBU.
    pub fn site_width(&self) -> i64 {
        self.site_width
    }

    /// Row height in DBU.
    pub fn row_height(&self) -> i64 {
        self.row_height
    }

    /// Core area the grid covers.
    pub fn core(&self) -> Rect {
        self.core
    }

    /// Site index containing DBU x.
    pub fn grid_x(&self, x: i64) -> i64 {
        (x - self.core.xl).div_euclid(self.site_width)
    }

    /// First site index at or right of DBU x.
    pub fn grid_end_x(&self, x: i64) -> i64 {
        ceil_div(x - self.core.xl, self.site_width)
    }

    /// Row index containing DBU y.
    pub fn grid_y(&self, y: i64) -> i64 {
        (y - self.core.yl).div_euclid(self.row_height)
    }

    /// First row index at or above DBU y.
    pub fn grid_end_y(&self, y: i64) -> i64 {
        ceil_div(y - self.core.yl, self.row_height)
    }

    /// DBU x of the left edge of site `x`.
    pub fn dbu_x(&self, x: i64) -> i64 {
        self.core.xl + x * self.site_width
    }

    /// DBU y of the bottom edge of row `y`.
    pub fn dbu_y(&self, y: i64) -> i64 {
        self.core.yl + y * self.row_height
    }

    /// DBU rectangle of the site at `(x, y)`.
    pub fn site_rect(&self, x: i64, y: i64) -> Rect {
        Rect::new(
            self.dbu_x(x),
            self.dbu_y(y),
            self.dbu_x(x + 1),
            self.dbu_y(y + 1),
        )
    }

    /// Left padding of `cell` in sites. Only movable standard cells are padded.
    pub fn pad_left_of(&self, cell: &Cell) -> i64 {
        if is_padded(cell) {
            self.pad_left
        } else {
            0
        }
    }

    /// Width of `cell` in sites, padding included.
    pub fn padded_width(&self, cell: &Cell) -> i64 {
        let pads = if is_padded(cell) {
            self.pad_left + self.pad_right
        } else {
            0
        };
        ceil_div(cell.width, self.site_width) + pads
    }

    /// Height of `cell` in rows, at least one.
    pub fn grid_height(&self, cell: &Cell) -> i64 {
        ceil_div(cell.height, self.row_height).max(1)
    }

    /// Grid position of a cell's padded footprint at its current origin.
    pub fn cell_grid_origin(&self, cell: &Cell) -> GridPt {
        GridPt::new(
            self.grid_x(cell.x) - self.pad_left_of(cell),
            self.grid_y(cell.y),
        )
    }

    /// Returns `true` if the padded footprint fits inside the grid at all.
    pub fn cell_fits(&self, cell: &Cell) -> bool {
        self.padded_width(cell) <= self.row_site_count && self.grid_height(cell) <= self.row_count
    }
}

/// Top supply of a cell of `height` rows placed in `orient`.
///
/// Mirroring swaps the top and bottom rails of an odd-height cell. An
/// even-height cell has the same supply on both edges.
pub(crate) fn top_power_in(cell: &Cell, orient: Orientation, height: i64) -> Power {
    if orient.is_vertically_flipped() && height % 2 == 1 {
        cell.top_power.opposite()
    } else {
        cell.top_power
    }
}

fn is_padded(cell: &Cell) -> bool {
    cell.kind == CellKind::Standard && !cell.fixed
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -((-a).div_euclid(b))
}

/// Intersection of two rectangles, if their interiors meet.
fn clip(a: &Rect, b: &Rect) -> Option<Rect> {
    a.overlaps(b).then(|| {
        Rect::new(
            a.xl.max(b.xl),
            a.yl.max(b.yl),
            a.xh.min(b.xh),
            a.yh.min(b.yh),
        )
    })
}

/// Area of the union of `rects`, swept over vertical strips between their
/// distinct x edges.
fn union_area(rects: &[Rect]) -> i64 {
    let mut xs: Vec<i64> = rects.iter().flat_map(|r| [r.xl, r.xh]).collect();
    xs.sort_unstable();
    xs.dedup();
    xs.windows(2)
        .map(|strip| {
            let (xl, xh) = (strip[0], strip[1]);
            let mut spans: Vec<(i64, i64)> = rects
                .iter()
                .filter(|r| r.xl <= xl && r.xh >= xh)
                .map(|r| (r.yl, r.yh))
                .collect();
            spans.sort_unstable();
            let mut height = 0;
            let mut reach = i64::MIN;
            for (lo, hi) in spans {
                let lo = lo.max(reach);
                if hi > lo {
                    height += hi - lo;
                }
                reach = reach.max(hi);
            }
            height * (xh - xl)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Group, Row};
    use dpl_common::Point;

    fn config() -> LegalizerConfig {
        LegalizerConfig::new(10, 100)
    }

    fn design_with_rows(sites: i64, rows: i64) -> Design {
        let mut design = Design::new(Rect::new(0, 0, sites * 10, rows * 100));
        for r in 0..rows {
            design.add_row(Row {
                origin: Point::new(0, r * 100),
                site_count: sites,
                orient: if r % 2 == 0 {
                    Orientation::R0
                } else {
                    Orientation::MX
                },
            });
        }
        design
    }

    fn movable(design: &mut Design, name: &str, width: i64, height: i64) -> CellId {
        let ident = design.intern(name);
        design.add_cell(Cell::new(ident, width, height, 0, 0))
    }

    #[test]
    fn rows_mark_valid_sites() {
        let mut design = Design::new(Rect::new(0, 0, 100, 300));
        design.add_row(Row {
            origin: Point::new(20, 100),
            site_count: 5,
            orient: Orientation::R0,
        });
        let grid = Grid::new(&design, &config());
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.row_site_count(), 10);
        assert!(!grid.pixel(1, 1).unwrap().is_valid);
        assert!(grid.pixel(2, 1).unwrap().is_valid);
        assert!(grid.pixel(6, 1).unwrap().is_valid);
        assert!(!grid.pixel(7, 1).unwrap().is_valid);
        assert!(!grid.pixel(3, 0).unwrap().is_valid);
        assert!(grid.pixel(10, 1).is_none());
    }

    #[test]
    fn row_parity_alternates_from_lowest_row() {
        let mut design = Design::new(Rect::new(0, 0, 100, 400));
        design.add_row(Row {
            origin: Point::new(0, 100),
            site_count: 10,
            orient: Orientation::MX,
        });
        let grid = Grid::new(&design, &config());
        assert_eq!(grid.row_orient(1), Orientation::MX);
        assert_eq!(grid.row_orient(0), Orientation::R0);
        assert_eq!(grid.row_orient(2), Orientation::R0);
        assert_eq!(grid.row_top_power(1), Power::Vss);
        assert_eq!(grid.row_top_power(2), Power::Vdd);
    }

    #[test]
    fn stamp_fixed_clips_to_grid() {
        let mut design = design_with_rows(10, 2);
        let ident = design.intern("blk");
        let blk = design.add_cell(Cell::new(ident, 50, 300, 80, -50).into_fixed(CellKind::Block));
        let mut grid = Grid::new(&design, &config());
        grid.stamp_fixed(&design);
        assert_eq!(grid.pixel(8, 0).unwrap().cell, Some(blk));
        assert_eq!(grid.pixel(9, 1).unwrap().cell, Some(blk));
        assert_eq!(grid.pixel(7, 0).unwrap().cell, None);
    }

    #[test]
    fn stamp_groups_owns_full_and_invalidates_partial_sites() {
        let mut design = design_with_rows(10, 2);
        let name = design.intern("g");
        let gid = design.add_group(Group::new(name, vec![Rect::new(15, 0, 50, 100)]));
        let mut grid = Grid::new(&design, &config());
        grid.stamp_groups(&design);

        let partial = grid.pixel(1, 0).unwrap();
        assert!(!partial.is_valid);
        assert!((partial.util - 0.5).abs() < 1e-9);
        for x in 2..5 {
            let pixel = grid.pixel(x, 0).unwrap();
            assert!(pixel.is_valid);
            assert_eq!(pixel.group, Some(gid));
        }
        assert_eq!(grid.pixel(5, 0).unwrap().group, None);
        assert_eq!(grid.pixel(2, 1).unwrap().group, None);
    }

    #[test]
    fn abutting_rects_cover_a_shared_site() {
        let mut design = design_with_rows(10, 1);
        let name = design.intern("g");
        let gid = design.add_group(Group::new(
            name,
            vec![Rect::new(0, 0, 25, 100), Rect::new(25, 0, 60, 100)],
        ));
        let mut grid = Grid::new(&design, &config());
        grid.stamp_groups(&design);
        let shared = grid.pixel(2, 0).unwrap();
        assert!(shared.is_valid);
        assert_eq!(shared.group, Some(gid));
    }

    #[test]
    fn overlapping_rects_count_shared_area_once() {
        let mut design = design_with_rows(10, 1);
        let name = design.intern("g");
        let gid = design.add_group(Group::new(
            name,
            vec![Rect::new(0, 0, 15, 100), Rect::new(5, 0, 15, 100)],
        ));
        let mut grid = Grid::new(&design, &config());
        grid.stamp_groups(&design);
        assert_eq!(grid.pixel(0, 0).unwrap().group, Some(gid));
        let edge = grid.pixel(1, 0).unwrap();
        assert!(!edge.is_valid);
        assert_eq!(edge.group, None);
        assert!((edge.util - 0.5).abs() < 1e-9);
    }

    #[test]
    fn union_area_merges_overlaps() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        assert_eq!(union_area(&[a, b]), 175);
        assert_eq!(union_area(&[a, a]), 100);
        assert_eq!(union_area(&[]), 0);
        assert_eq!(clip(&a, &b), Some(Rect::new(5, 5, 10, 10)));
        assert_eq!(clip(&a, &Rect::new(10, 0, 20, 10)), None);
    }

    #[test]
    fn paint_sets_position_and_erase_clears() {
        let mut design = design_with_rows(10, 2);
        let id = movable(&mut design, "a", 20, 100);
        let mut grid = Grid::new(&design, &config());
        let cell = design.cell_mut(id);
        grid.paint(cell, GridPt::new(3, 1)).unwrap();
        assert_eq!((cell.x, cell.y), (30, 100));
        assert!(cell.placed);
        assert_eq!(cell.orient, Orientation::MX);
        assert_eq!(grid.pixel(3, 1).unwrap().cell, Some(id));
        assert_eq!(grid.pixel(4, 1).unwrap().cell, Some(id));

        cell.hold = true;
        grid.erase(cell);
        assert!(!cell.placed);
        assert!(!cell.hold);
        assert_eq!(grid.pixel(3, 1).unwrap().cell, None);
    }

    #[test]
    fn paint_over_occupied_site_is_fatal() {
        let mut design = design_with_rows(10, 1);
        let a = movable(&mut design, "a", 20, 100);
        let b = movable(&mut design, "b", 20, 100);
        let mut grid = Grid::new(&design, &config());
        grid.paint(design.cell_mut(a), GridPt::new(0, 0)).unwrap();
        let err = grid.paint(design.cell_mut(b), GridPt::new(1, 0)).unwrap_err();
        assert!(err.message.contains("occupied"));
        assert!(!design.cell(b).placed);
        assert_eq!(grid.pixel(2, 0).unwrap().cell, None);
    }

    #[test]
    fn paint_outside_grid_is_fatal() {
        let mut design = design_with_rows(10, 1);
        let a = movable(&mut design, "a", 20, 100);
        let mut grid = Grid::new(&design, &config());
        assert!(grid.paint(design.cell_mut(a), GridPt::new(9, 0)).is_err());
        assert!(grid.paint(design.cell_mut(a), GridPt::new(0, 1)).is_err());
    }

    #[test]
    fn erase_ignores_fixed_cells() {
        let mut design = design_with_rows(10, 1);
        let ident = design.intern("f");
        let f = design.add_cell(Cell::new(ident, 20, 100, 0, 0).into_fixed(CellKind::Standard));
        let mut grid = Grid::new(&design, &config());
        grid.stamp_fixed(&design);
        grid.erase(design.cell_mut(f));
        assert_eq!(grid.pixel(0, 0).unwrap().cell, Some(f));
    }

    #[test]
    fn padding_widens_footprint() {
        let mut design = design_with_rows(10, 1);
        let a = movable(&mut design, "a", 20, 100);
        let mut config = config();
        config.padding.left = 1;
        config.padding.right = 1;
        let mut grid = Grid::new(&design, &config);
        assert_eq!(grid.padded_width(design.cell(a)), 4);
        grid.paint(design.cell_mut(a), GridPt::new(2, 0)).unwrap();
        assert_eq!(design.cell(a).x, 30);
        for x in 2..6 {
            assert_eq!(grid.pixel(x, 0).unwrap().cell, Some(a));
        }
        assert_eq!(grid.cell_grid_origin(design.cell(a)), GridPt::new(2, 0));
    }

    #[test]
    fn multi_row_odd_height_mirrors_to_match_rail() {
        let mut design = design_with_rows(10, 4);
        let a = movable(&mut design, "tall", 20, 300);
        design.cell_mut(a).top_power = Power::Vss;
        let grid = Grid::new(&design, &config());
        // Rows 0..3: top row 2 is R0 with VDD on top, so the cell mirrors.
        assert_eq!(grid.orientation_for(design.cell(a), 0), Orientation::MX);
        // Rows 1..4: top row 3 is MX with VSS on top, so R0 fits as is.
        assert_eq!(grid.orientation_for(design.cell(a), 1), Orientation::R0);
        design.cell_mut(a).top_power = Power::Vdd;
        assert_eq!(grid.orientation_for(design.cell(a), 0), Orientation::R0);
    }

    #[test]
    fn one_site_gap_detection() {
        let mut design = design_with_rows(10, 1);
        let a = movable(&mut design, "a", 20, 100);
        let b = movable(&mut design, "b", 20, 100);
        let mut grid = Grid::new(&design, &config());
        grid.paint(design.cell_mut(a), GridPt::new(0, 0)).unwrap();
        // Sites 0-1 taken; a slot at 3 leaves site 2 alone.
        assert!(grid.leaves_one_site_gap(GridPt::new(3, 0), 2, 1, b));
        assert!(!grid.leaves_one_site_gap(GridPt::new(2, 0), 2, 1, b));
        assert!(!grid.leaves_one_site_gap(GridPt::new(4, 0), 2, 1, b));
        // A cell never gaps against itself.
        assert!(!grid.leaves_one_site_gap(GridPt::new(3, 0), 2, 1, a));
    }

    #[test]
    fn coordinate_conversions_are_core_relative() {
        let mut design = Design::new(Rect::new(100, 50, 300, 450));
        design.add_row(Row {
            origin: Point::new(100, 50),
            site_count: 20,
            orient: Orientation::R0,
        });
        let grid = Grid::new(&design, &config());
        assert_eq!(grid.grid_x(125), 2);
        assert_eq!(grid.grid_end_x(125), 3);
        assert_eq!(grid.grid_x(95), -1);
        assert_eq!(grid.grid_y(149), 0);
        assert_eq!(grid.grid_end_y(151), 2);
        assert_eq!(grid.dbu_x(2), 120);
        assert_eq!(grid.dbu_y(3), 350);
    }
}
