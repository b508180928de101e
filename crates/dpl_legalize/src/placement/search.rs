//! Nearest-legal-slot search.
//!
//! `map_move` clamps a target into the core (and the cell's group), tries the
//! exact spot with a bin search, then expands Manhattan rings of
//! `(bin, row)` offsets around it. The first ring that yields any candidate
//! wins, and within that ring the candidate nearest in DBU is taken. Later
//! rings are never examined, so the result is not always the globally
//! nearest slot.

use super::Legalizer;
use crate::data::{Cell, Power};
use crate::grid::GridPt;
use crate::ids::CellId;
use dpl_common::{DplResult, Point};

/// Inclusive grid bounds of a search window.
#[derive(Clone, Copy, Debug)]
struct Window {
    x_min: i64,
    x_max: i64,
    y_min: i64,
    y_max: i64,
}

impl<'a> Legalizer<'a> {
    /// Legalizes a cell near its original position.
    ///
    /// Returns `Ok(false)` and leaves the cell untouched when no legal slot
    /// exists inside the search window.
    pub fn map_move(&mut self, id: CellId) -> DplResult<bool> {
        let target = self.legal_grid_pt(id);
        self.map_move_to(id, target)
    }

    /// Legalizes a cell near an explicit grid target.
    pub fn map_move_to(&mut self, id: CellId, target: GridPt) -> DplResult<bool> {
        match self.search_nearest_site(id, target) {
            Some(pt) => {
                self.paint(id, pt)?;
                tracing::trace!(cell = %id, %target, %pt, "map move");
                Ok(true)
            }
            None => {
                tracing::debug!(cell = %id, %target, "map move found no slot");
                Ok(false)
            }
        }
    }

    /// Search target for a cell's original position.
    pub fn legal_grid_pt(&self, id: CellId) -> GridPt {
        let cell = self.design.cell(id);
        self.legal_grid_pt_at(id, Point::new(cell.init_x, cell.init_y))
    }

    /// Search target for placing a cell's origin at `origin`.
    ///
    /// The padded footprint is clamped into the core and snapped to the
    /// nearest site and row. A target that lands on a fixed block is moved
    /// to the nearest edge of that block.
    pub fn legal_grid_pt_at(&self, id: CellId, origin: Point) -> GridPt {
        let cell = self.design.cell(id);
        let pad = self.grid.pad_left_of(cell) * self.grid.site_width();
        let pt = self.clamp_to_grid(cell, Point::new(origin.x - pad, origin.y));

        let blocker = self
            .grid
            .pixel(pt.x, pt.y)
            .and_then(|p| p.cell)
            .filter(|&other| {
                let other = self.design.cell(other);
                other.fixed && other.is_block()
            });
        match blocker {
            Some(block) => self.nearest_block_edge(cell, pt, block),
            None => pt,
        }
    }

    /// Snaps a padded DBU origin to the nearest grid position from which
    /// the footprint stays inside the grid.
    fn clamp_to_grid(&self, cell: &Cell, origin: Point) -> GridPt {
        let core = self.grid.core();
        let site_width = self.grid.site_width();
        let row_height = self.grid.row_height();
        let max_x = (self.grid.row_site_count() - self.grid.padded_width(cell)).max(0);
        let max_y = (self.grid.row_count() - self.grid.grid_height(cell)).max(0);

        let x = round_div(origin.x - core.xl, site_width).clamp(0, max_x);
        let y = round_div(origin.y - core.yl, row_height).clamp(0, max_y);
        GridPt::new(x, y)
    }

    /// Moves `pt` just outside `block`, to the side reachable with the
    /// shortest move that keeps the footprint on the grid.
    fn nearest_block_edge(&self, cell: &Cell, pt: GridPt, block: CellId) -> GridPt {
        let block = self.design.cell(block);
        let x_lo = self.grid.grid_x(block.x);
        let x_hi = self.grid.grid_end_x(block.x + block.width);
        let y_lo = self.grid.grid_y(block.y);
        let y_hi = self.grid.grid_end_y(block.y + block.height);
        let width = self.grid.padded_width(cell);
        let height = self.grid.grid_height(cell);
        let max_x = self.grid.row_site_count() - width;
        let max_y = self.grid.row_count() - height;
        let site_width = self.grid.site_width();
        let row_height = self.grid.row_height();

        [
            GridPt::new(x_lo - width, pt.y),
            GridPt::new(x_hi, pt.y),
            GridPt::new(pt.x, y_lo - height),
            GridPt::new(pt.x, y_hi),
        ]
        .into_iter()
        .filter(|c| (0..=max_x).contains(&c.x) && (0..=max_y).contains(&c.y))
        .min_by_key(|c| (c.x - pt.x).abs() * site_width + (c.y - pt.y).abs() * row_height)
        .unwrap_or(pt)
    }

    /// Finds the nearest legal position for a cell around `target`.
    ///
    /// Returns the padded lower-left grid position, or `None` once the
    /// search window is exhausted.
    pub fn search_nearest_site(&self, id: CellId, target: GridPt) -> Option<GridPt> {
        let cell = self.design.cell(id);
        let window = self.search_bounds(cell, target)?;
        let x = target.x.clamp(window.x_min, window.x_max);
        let y = target.y.clamp(window.y_min, window.y_max);

        if let Some(pt) = self.bin_search(target.x, cell, x, y) {
            return Some(pt);
        }

        let bin_width = i64::from(self.config.search.bin_width);
        let max_bins = self.window_sites / bin_width;
        let max_ring = self.window_rows + max_bins;
        let site_width = self.grid.site_width();
        let row_height = self.grid.row_height();

        for ring in 1..=max_ring {
            let mut best: Option<(i64, GridPt)> = None;
            for dy in -ring..=ring {
                if dy.abs() > self.window_rows {
                    continue;
                }
                let bin_y = target.y + dy;
                if bin_y < window.y_min || bin_y > window.y_max {
                    continue;
                }
                let rest = ring - dy.abs();
                if rest > max_bins {
                    continue;
                }
                let offsets: &[i64] = if rest == 0 { &[0] } else { &[-rest, rest] };
                for &dx in offsets {
                    let bin_x = (target.x + dx * bin_width).clamp(window.x_min, window.x_max);
                    if let Some(pt) = self.bin_search(target.x, cell, bin_x, bin_y) {
                        let dist = (target.x - pt.x).abs() * site_width
                            + (target.y - pt.y).abs() * row_height;
                        if best.map_or(true, |(d, _)| dist < d) {
                            best = Some((dist, pt));
                        }
                    }
                }
            }
            if let Some((_, pt)) = best {
                return Some(pt);
            }
        }
        None
    }

    /// Search window around `target`, intersected with the cell's group
    /// bounding box and the grid.
    fn search_bounds(&self, cell: &Cell, target: GridPt) -> Option<Window> {
        let mut window = Window {
            x_min: target.x - self.window_sites,
            x_max: target.x + self.window_sites,
            y_min: target.y - self.window_rows,
            y_max: target.y + self.window_rows,
        };
        if let Some(bbox) = cell.group.and_then(|g| self.design.group(g).bbox()) {
            window.x_min = window.x_min.max(self.grid.grid_end_x(bbox.xl));
            window.x_max = window.x_max.min(self.grid.grid_x(bbox.xh));
            window.y_min = window.y_min.max(self.grid.grid_end_y(bbox.yl));
            window.y_max = window.y_max.min(self.grid.grid_y(bbox.yh));
        }
        window.x_min = window.x_min.max(0);
        window.x_max = window.x_max.min(self.grid.row_site_count());
        window.y_min = window.y_min.max(0);
        window.y_max = window.y_max.min(self.grid.row_count());
        (window.x_min <= window.x_max && window.y_min <= window.y_max).then_some(window)
    }

    /// Scans one bin of `bin_width` sites in row `bin_y`, starting from the
    /// end nearest to `x`, for the first position where the cell fits.
    pub(crate) fn bin_search(&self, x: i64, cell: &Cell, bin_x: i64, bin_y: i64) -> Option<GridPt> {
        let height = self.grid.grid_height(cell);
        if bin_y < 0 || bin_y + height > self.grid.row_count() {
            return None;
        }
        if !self.power_compatible(cell, bin_y) {
            return None;
        }

        let bin_width = i64::from(self.config.search.bin_width);
        let fits = |i: i64| self.check_pixels(cell, GridPt::new(i, bin_y));
        let found = if x > bin_x {
            (bin_x..bin_x + bin_width).rev().find(|&i| fits(i))
        } else {
            (bin_x..bin_x + bin_width).find(|&i| fits(i))
        };
        found.map(|i| GridPt::new(i, bin_y))
    }

    /// Even-height cells have the same supply on both edges, so mirroring
    /// cannot fix a mismatch with the top row's rail.
    pub(crate) fn power_compatible(&self, cell: &Cell, y: i64) -> bool {
        let height = self.grid.grid_height(cell);
        if height < 2 || height % 2 == 1 || cell.top_power == Power::Unknown {
            return true;
        }
        cell.top_power == self.grid.row_top_power(y + height - 1)
    }

    /// Returns `true` if every pixel under the padded footprint at `pt` is
    /// empty, valid, and owned by the cell's group (or by no group for a
    /// cell outside any group).
    pub(crate) fn check_pixels(&self, cell: &Cell, pt: GridPt) -> bool {
        let width = self.grid.padded_width(cell);
        let height = self.grid.grid_height(cell);
        if pt.x < 0
            || pt.y < 0
            || pt.x + width > self.grid.row_site_count()
            || pt.y + height > self.grid.row_count()
        {
            return false;
        }
        for y in pt.y..pt.y + height {
            for x in pt.x..pt.x + width {
                let Some(pixel) = self.grid.pixel(x, y) else {
                    return false;
                };
                if pixel.cell.is_some() || !pixel.is_valid || pixel.group != cell.group {
                    return false;
                }
            }
        }
        !(self.config.search.disallow_one_site_gaps
            && self.grid.leaves_one_site_gap(pt, width, height, cell.id))
    }
}

/// Division rounded to the nearest integer, halves away from zero.
fn round_div(a: i64, b: i64) -> i64 {
    if a >= 0 {
        (a + b / 2) / b
    } else {
        -((-a + b / 2) / b)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::data::Group;
    use dpl_common::Rect;
    use dpl_diagnostics::DiagnosticSink;

    #[test]
    fn exact_spot_is_taken_when_free() {
        let mut design = rows_design(20, 2);
        let a = add_movable(&mut design, "a", 20, 100, 50, 100);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        assert!(lg.map_move(a).unwrap());
        let cell = lg.design().cell(a);
        assert_eq!((cell.x, cell.y), (50, 100));
    }

    #[test]
    fn target_is_clamped_into_core() {
        let mut design = rows_design(20, 2);
        let a = add_movable(&mut design, "a", 30, 100, 190, 500);
        let sink = DiagnosticSink::new();
        let lg = Legalizer::new(design, &config(), &sink);
        assert_eq!(lg.legal_grid_pt(a), GridPt::new(17, 1));
    }

    #[test]
    fn target_on_block_moves_to_nearest_edge() {
        let mut design = rows_design(20, 1);
        add_fixed(&mut design, "blk", 50, 100, 50, 0);
        let a = add_movable(&mut design, "a", 20, 100, 60, 0);
        let sink = DiagnosticSink::new();
        let lg = Legalizer::new(design, &config(), &sink);
        // Site 6 is one site into a block spanning sites 5..10; the left
        // edge is closest, so the cell ends flush against it.
        assert_eq!(lg.legal_grid_pt(a), GridPt::new(3, 0));
    }

    #[test]
    fn occupied_target_finds_neighbor_slot() {
        let mut design = rows_design(20, 2);
        let a = add_movable(&mut design, "a", 20, 100, 50, 0);
        let b = add_movable(&mut design, "b", 20, 100, 50, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        assert!(lg.map_move(a).unwrap());
        assert!(lg.map_move(b).unwrap());
        let b_cell = lg.design().cell(b);
        assert_eq!(b_cell.y, 0);
        assert_eq!(b_cell.x, 70);
    }

    #[test]
    fn ring_search_reaches_other_rows() {
        let mut design = rows_design(4, 2);
        let a = add_movable(&mut design, "a", 40, 100, 0, 0);
        let b = add_movable(&mut design, "b", 40, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        assert!(lg.map_move(a).unwrap());
        assert!(lg.map_move(b).unwrap());
        assert_eq!(lg.design().cell(b).y, 100);
    }

    #[test]
    fn full_core_fails_without_touching_cell() {
        let mut design = rows_design(4, 1);
        let a = add_movable(&mut design, "a", 40, 100, 0, 0);
        let b = add_movable(&mut design, "b", 20, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        assert!(lg.map_move(a).unwrap());
        assert!(!lg.map_move(b).unwrap());
        let cell = lg.design().cell(b);
        assert!(!cell.placed);
        assert_eq!((cell.x, cell.y), (0, 0));
    }

    #[test]
    fn group_cells_stay_in_group_pixels() {
        let mut design = rows_design(20, 1);
        let a = add_movable(&mut design, "a", 20, 100, 0, 0);
        let name = design.intern("g");
        let mut group = Group::new(name, vec![Rect::new(100, 0, 160, 100)]);
        group.cells.push(a);
        design.add_group(group);
        let free = add_movable(&mut design, "free", 20, 100, 110, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);

        assert!(lg.map_move(a).unwrap());
        assert_eq!(lg.design().cell(a).x, 100);
        assert!(lg.map_move(free).unwrap());
        let x = lg.design().cell(free).x;
        assert!(x + 20 <= 100 || x >= 160);
    }

    #[test]
    fn even_height_cell_rejects_mismatched_rail() {
        let mut design = rows_design(10, 4);
        let a = add_movable(&mut design, "a", 20, 200, 0, 0);
        design.cell_mut(a).top_power = Power::Vss;
        let sink = DiagnosticSink::new();
        let lg = Legalizer::new(design, &config(), &sink);
        let cell = lg.design().cell(a);
        // Rows 0..2 end at row 1 (MX, VSS on top): accepted.
        assert!(lg.bin_search(0, cell, 0, 0).is_some());
        // Rows 1..3 end at row 2 (R0, VDD on top): rejected.
        assert!(lg.bin_search(0, cell, 0, 1).is_none());
        assert!(!lg.power_compatible(cell, 1));
    }

    #[test]
    fn bin_search_scans_toward_target() {
        let mut design = rows_design(30, 1);
        let a = add_movable(&mut design, "a", 10, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let lg = Legalizer::new(design, &config(), &sink);
        let cell = lg.design().cell(a);
        // Bin left of the target scans right-to-left.
        assert_eq!(lg.bin_search(25, cell, 10, 0), Some(GridPt::new(19, 0)));
        // Bin at or right of the target scans left-to-right.
        assert_eq!(lg.bin_search(5, cell, 10, 0), Some(GridPt::new(10, 0)));
    }

    #[test]
    fn one_site_gap_rule_skips_gapped_slot() {
        let mut design = rows_design(20, 1);
        let a = add_movable(&mut design, "a", 20, 100, 0, 0);
        let b = add_movable(&mut design, "b", 20, 100, 30, 0);
        let mut cfg = config();
        cfg.search.disallow_one_site_gaps = true;
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &cfg, &sink);
        assert!(lg.map_move(a).unwrap());
        assert!(lg.map_move(b).unwrap());
        assert_eq!(lg.design().cell(b).x, 40);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_div(14, 10), 1);
        assert_eq!(round_div(15, 10), 2);
        assert_eq!(round_div(-15, 10), -2);
    }
}
