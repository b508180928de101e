//! Displacement refinement.
//!
//! Every move here is accepted only if it strictly reduces displacement
//! from the original positions, so refinement never makes a placement worse.

use super::Legalizer;
use crate::data::Cell;
use crate::ids::{CellId, GroupId};
use dpl_common::{DplResult, Point};
use std::cmp::Reverse;

impl<'a> Legalizer<'a> {
    /// Re-searches from a cell's original target and moves it there if
    /// that strictly reduces its displacement.
    ///
    /// With `max_displacement_rows` set, candidates farther than that many
    /// rows (or the same distance horizontally) from the target are
    /// rejected. Held, fixed, and unplaced cells never move.
    pub fn refine_move(&mut self, id: CellId) -> DplResult<bool> {
        let cell = self.design.cell(id);
        if cell.fixed || cell.hold || !cell.placed {
            return Ok(false);
        }
        let target = self.legal_grid_pt(id);
        let Some(pt) = self.search_nearest_site(id, target) else {
            return Ok(false);
        };

        if let Some(rows) = self.config.refine.max_displacement_rows {
            let limit = i64::from(rows);
            let dx = (pt.x - target.x).abs() * self.grid.site_width();
            if (pt.y - target.y).abs() > limit || dx > limit * self.grid.row_height() {
                return Ok(false);
            }
        }

        let cell = self.design.cell(id);
        let new_origin = Point::new(
            self.grid.dbu_x(pt.x + self.grid.pad_left_of(cell)),
            self.grid.dbu_y(pt.y),
        );
        if dist_change(cell, new_origin) >= 0 {
            return Ok(false);
        }
        self.erase(id);
        self.paint(id, pt)?;
        tracing::trace!(cell = %id, %pt, "refine move");
        Ok(true)
    }

    /// Exchanges the positions of two movable cells if that strictly
    /// reduces their combined displacement.
    ///
    /// Both cells must be placed, unheld, of the same kind and size, in the
    /// same group, and carry the same top supply, so each footprint fits
    /// exactly where the other one was.
    pub fn swap_cells(&mut self, a: CellId, b: CellId) -> DplResult<bool> {
        if a == b {
            return Ok(false);
        }
        let cell_a = self.design.cell(a);
        let cell_b = self.design.cell(b);
        if !swappable(cell_a, cell_b) {
            return Ok(false);
        }
        let origin_a = Point::new(cell_a.x, cell_a.y);
        let origin_b = Point::new(cell_b.x, cell_b.y);
        if dist_change(cell_a, origin_b) + dist_change(cell_b, origin_a) >= 0 {
            return Ok(false);
        }

        let pt_a = self.grid.cell_grid_origin(cell_a);
        let pt_b = self.grid.cell_grid_origin(cell_b);
        self.erase(a);
        self.erase(b);
        self.paint(a, pt_b)?;
        self.paint(b, pt_a)?;
        tracing::trace!(a = %a, b = %b, "swap");
        Ok(true)
    }

    /// Applies [`Legalizer::refine_move`] to the most displaced free cells.
    ///
    /// Movable, unheld, placed cells outside any group are ranked by current
    /// displacement; the top `refine.percent` of them are re-searched.
    /// Returns the number of cells moved.
    pub fn refine(&mut self) -> DplResult<usize> {
        let _span = tracing::info_span!("refine").entered();
        let candidates: Vec<CellId> = self
            .design
            .cells
            .iter()
            .filter(|c| !c.fixed && !c.hold && c.placed && !c.in_group())
            .map(|c| c.id)
            .collect();
        let moved = self.refine_top(candidates, self.config.refine.percent)?;
        tracing::debug!(moved, "refine");
        Ok(moved)
    }

    /// Applies [`Legalizer::refine_move`] to the most displaced members of
    /// one group, the top `refine.group_percent` of them.
    pub fn group_refine(&mut self, group: GroupId) -> DplResult<usize> {
        let candidates: Vec<CellId> = self
            .design
            .group(group)
            .cells
            .iter()
            .copied()
            .filter(|&id| {
                let cell = self.design.cell(id);
                !cell.fixed && !cell.hold && cell.placed
            })
            .collect();
        self.refine_top(candidates, self.config.refine.group_percent)
    }

    fn refine_top(&mut self, mut candidates: Vec<CellId>, percent: f64) -> DplResult<usize> {
        candidates.sort_by_key(|&id| (Reverse(self.design.cell(id).displacement()), id));
        let count = ((candidates.len() as f64 * percent).ceil() as usize).min(candidates.len());
        let mut moved = 0;
        for id in candidates.into_iter().take(count) {
            if self.refine_move(id)? {
                moved += 1;
            }
        }
        Ok(moved)
    }
}

/// Change in a cell's displacement if its origin moved to `to`.
pub(crate) fn dist_change(cell: &Cell, to: Point) -> i64 {
    let init = Point::new(cell.init_x, cell.init_y);
    to.manhattan(init) - cell.displacement()
}

fn swappable(a: &Cell, b: &Cell) -> bool {
    !a.fixed
        && !b.fixed
        && !a.hold
        && !b.hold
        && a.placed
        && b.placed
        && a.kind == b.kind
        && a.width == b.width
        && a.height == b.height
        && a.group == b.group
        && a.top_power == b.top_power
}
