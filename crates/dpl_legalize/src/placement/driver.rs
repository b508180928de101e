//! Global placement of free cells.

use super::Legalizer;
use crate::ids::CellId;
use dpl_common::DplResult;
use std::cmp::Reverse;
use std::collections::BTreeSet;

impl<'a> Legalizer<'a> {
    /// Legalizes every unplaced movable cell outside the groups.
    ///
    /// Multi-row cells go first, then single-row cells; within each tier
    /// cells are ordered by descending area with the cell id breaking ties.
    /// A cell that `map_move` cannot place falls back to `shift_move`.
    /// Cells whose footprint cannot fit the core are reported and skipped.
    pub fn place(&mut self) -> DplResult<()> {
        let _span = tracing::info_span!("place").entered();
        let row_height = self.grid.row_height();

        let mut pending: Vec<CellId> = Vec::new();
        let mut unfit: Vec<CellId> = Vec::new();
        for cell in &self.design.cells {
            if cell.fixed || cell.placed || cell.in_group() {
                continue;
            }
            if self.grid.cell_fits(cell) {
                pending.push(cell.id);
            } else {
                self.warn(
                    201,
                    cell.id,
                    format!(
                        "cell '{}' ({} x {}) does not fit in the core rows",
                        self.design.cell_name(cell.id),
                        cell.width,
                        cell.height
                    ),
                );
                unfit.push(cell.id);
            }
        }
        self.failures.extend(unfit);

        pending.sort_by_key(|&id| (Reverse(self.design.cell(id).area()), id));
        for multi_row in [true, false] {
            for &id in &pending {
                if self.design.cell(id).is_multi_row(row_height) != multi_row {
                    continue;
                }
                if !self.map_move(id)? && !self.shift_move(id)? {
                    self.failures.insert(id);
                }
            }
        }
        tracing::debug!(cells = pending.len(), failures = self.failures.len(), "place");
        Ok(())
    }

    /// Makes room for a stuck cell by ripping up its neighborhood.
    ///
    /// Every movable, unheld cell of the same kind (group member or free)
    /// inside a window of `shift.boundary_margin` footprints around the
    /// stuck cell's target is erased. The stuck cell is legalized first,
    /// then each erased neighbor is re-legalized at its own target. Every
    /// cell left unplaced is reported; nothing here is fatal.
    pub fn shift_move(&mut self, id: CellId) -> DplResult<bool> {
        let target = self.legal_grid_pt(id);
        let cell = self.design.cell(id);
        let margin = i64::from(self.config.shift.boundary_margin);
        let margin_width = self.grid.padded_width(cell) * margin;
        let in_group = cell.in_group();

        let x_start = (target.x - margin_width).max(0);
        let x_end = (target.x + margin_width).min(self.grid.row_site_count());
        let y_start = (target.y - margin).max(0);
        let y_end = (target.y + margin).min(self.grid.row_count());

        let mut neighbors = BTreeSet::new();
        for y in y_start..y_end {
            for x in x_start..x_end {
                let Some(other) = self.grid.pixel(x, y).and_then(|p| p.cell) else {
                    continue;
                };
                let other_cell = self.design.cell(other);
                if other != id
                    && !other_cell.fixed
                    && !other_cell.hold
                    && other_cell.in_group() == in_group
                {
                    neighbors.insert(other);
                }
            }
        }
        tracing::debug!(cell = %id, %target, neighbors = neighbors.len(), "shift move");

        for &other in &neighbors {
            self.erase(other);
        }

        let placed = self.map_move(id)?;
        if !placed {
            self.warn(
                202,
                id,
                format!("cannot legalize cell '{}'", self.design.cell_name(id)),
            );
        }
        for other in neighbors {
            if !self.map_move(other)? {
                self.warn(
                    202,
                    other,
                    format!(
                        "cannot legalize cell '{}' after shifting its neighborhood",
                        self.design.cell_name(other)
                    ),
                );
                self.failures.insert(other);
            }
        }
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use dpl_diagnostics::DiagnosticSink;

    #[test]
    fn multi_row_cells_are_placed_first() {
        let mut design = rows_design(4, 2);
        let small = add_movable(&mut design, "small", 20, 100, 0, 0);
        let tall = add_movable(&mut design, "tall", 20, 200, 0, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        lg.place().unwrap();
        let tall = lg.design().cell(tall);
        let small = lg.design().cell(small);
        assert_eq!((tall.x, tall.y), (0, 0));
        assert!(small.placed);
        assert_eq!(small.x, 20);
    }

    #[test]
    fn larger_cells_win_contested_spots() {
        let mut design = rows_design(10, 1);
        let small = add_movable(&mut design, "small", 20, 100, 0, 0);
        let big = add_movable(&mut design, "big", 40, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        lg.place().unwrap();
        assert_eq!(lg.design().cell(big).x, 0);
        assert_eq!(lg.design().cell(small).x, 40);
    }

    #[test]
    fn oversized_cell_is_reported_and_skipped() {
        let mut design = rows_design(5, 1);
        let wide = add_movable(&mut design, "wide", 80, 100, 0, 0);
        let ok = add_movable(&mut design, "ok", 20, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        lg.place().unwrap();
        assert_eq!(sink.count_code(201), 1);
        assert!(!lg.design().cell(wide).placed);
        assert!(lg.design().cell(ok).placed);
        assert_eq!(lg.failures().collect::<Vec<_>>(), vec![wide]);
    }

    #[test]
    fn shift_move_reports_displaced_neighbor() {
        let mut design = rows_design(4, 1);
        let a = add_movable(&mut design, "a", 40, 100, 0, 0);
        let b = add_movable(&mut design, "b", 20, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        lg.place().unwrap();
        // `a` fills the row; shifting for `b` rips `a` up and it cannot
        // come back.
        assert!(lg.design().cell(b).placed);
        assert!(!lg.design().cell(a).placed);
        assert_eq!(sink.count_code(202), 1);
        assert_eq!(lg.failures().collect::<Vec<_>>(), vec![a]);
        assert!(!sink.has_errors());
    }

    #[test]
    fn shift_move_repacks_neighborhood() {
        let mut design = rows_design(6, 1);
        let a = add_movable(&mut design, "a", 20, 100, 20, 0);
        let b = add_movable(&mut design, "b", 40, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        // `a` splits the row into two 2-site gaps, too narrow for `b`.
        assert!(lg.map_move(a).unwrap());
        assert!(!lg.map_move(b).unwrap());
        assert!(lg.shift_move(b).unwrap());
        assert_eq!(lg.design().cell(b).x, 0);
        assert_eq!(lg.design().cell(a).x, 40);
        assert_eq!(sink.warning_count(), 0);
    }
}
