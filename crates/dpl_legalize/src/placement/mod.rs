//! The legalization context and its phases.
//!
//! A [`Legalizer`] owns the design and the occupancy grid for one run. Its
//! phases are split across submodules:
//!
//! - `search`: diamond search, bin search, and `map_move`
//! - `groups`: region pre-placement, two-tier group placement, brick fallbacks
//! - `driver`: global placement of free cells and `shift_move`
//! - `refine`: displacement-reducing re-search and pairwise swaps
//! - `anneal`: seeded random swap sampling within a group

mod anneal;
mod driver;
mod groups;
mod refine;
mod search;

use crate::data::Design;
use crate::grid::{Grid, GridPt};
use crate::ids::CellId;
use crate::stats::{self, LegalizeReport};
use dpl_common::{DplResult, Point};
use dpl_config::LegalizerConfig;
use dpl_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Location};
use std::collections::BTreeSet;

/// One legalization run over a design.
///
/// Construction builds the grid and stamps fixed cells and group regions.
/// Phases then mutate the design and the grid together, keeping every
/// pixel's occupant consistent with the cell positions.
pub struct Legalizer<'a> {
    design: Design,
    grid: Grid,
    config: LegalizerConfig,
    sink: &'a DiagnosticSink,
    window_rows: i64,
    window_sites: i64,
    design_util: f64,
    failures: BTreeSet<CellId>,
}

impl<'a> Legalizer<'a> {
    /// Builds the grid for `design` and stamps its obstacles and regions.
    ///
    /// The search window doubles when the design is densely packed or has
    /// fixed cells. `config` must already have passed
    /// [`dpl_config::validate_config`]; [`crate::legalize`] checks it.
    pub fn new(design: Design, config: &LegalizerConfig, sink: &'a DiagnosticSink) -> Self {
        let mut grid = Grid::new(&design, config);
        grid.stamp_fixed(&design);
        grid.stamp_groups(&design);

        let design_util = design_utilization(&design, &grid);
        let dense = design_util > config.search.high_utilization || design.fixed_count() > 0;
        let scale = if dense { 2 } else { 1 };
        let window_rows = i64::from(config.search.window_rows) * scale;
        let window_sites = i64::from(config.search.window_sites) * scale;
        tracing::debug!(
            rows = grid.row_count(),
            sites = grid.row_site_count(),
            utilization = design_util,
            window_rows,
            window_sites,
            "grid built"
        );

        Self {
            design,
            grid,
            config: config.clone(),
            sink,
            window_rows,
            window_sites,
            design_util,
            failures: BTreeSet::new(),
        }
    }

    /// Runs every phase: groups, free cells, then refinement.
    pub fn run(&mut self) -> DplResult<()> {
        self.place_groups()?;
        self.place()?;
        if self.config.refine.enabled {
            self.refine()?;
        }
        Ok(())
    }

    /// The design in its current state.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// The occupancy grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Movable area over free row area, measured after fixed stamping.
    pub fn design_utilization(&self) -> f64 {
        self.design_util
    }

    /// Search window half-extent as `(rows, sites)`.
    pub fn search_window(&self) -> (i64, i64) {
        (self.window_rows, self.window_sites)
    }

    /// Cells that failed to legalize and are still unplaced.
    pub fn failures(&self) -> impl Iterator<Item = CellId> + '_ {
        self.failures
            .iter()
            .copied()
            .filter(|&id| !self.design.cell(id).placed)
    }

    /// Summarizes the run. `hpwl_before` is the wirelength of the original
    /// placement.
    pub fn report(&self, hpwl_before: i64) -> LegalizeReport {
        stats::collect_report(
            &self.design,
            self.grid.row_height(),
            self.design_util,
            hpwl_before,
        )
    }

    /// Consumes the run and returns the legalized design.
    pub fn into_design(self) -> Design {
        self.design
    }

    fn paint(&mut self, id: CellId, pt: GridPt) -> DplResult<()> {
        self.grid.paint(&mut self.design.cells[id.index()], pt)
    }

    fn erase(&mut self, id: CellId) {
        self.grid.erase(&mut self.design.cells[id.index()]);
    }

    fn warn(&self, number: u16, id: CellId, message: String) {
        let cell = self.design.cell(id);
        let location = Location::at(
            self.design.cell_name(id),
            Point::new(cell.init_x, cell.init_y),
        );
        self.sink.emit(Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, number),
            message,
            location,
        ));
    }
}

/// Movable cell area divided by the row area left free of fixed cells.
fn design_utilization(design: &Design, grid: &Grid) -> f64 {
    let site_area = grid.site_width() * grid.row_height();
    let (valid, blocked) = grid
        .pixels()
        .filter(|(_, p)| p.is_valid)
        .fold((0i64, 0i64), |(valid, blocked), (_, p)| {
            (valid + 1, blocked + i64::from(p.cell.is_some()))
        });
    let free_area = (valid - blocked) * site_area;
    let movable_area: i64 = design
        .cells
        .iter()
        .filter(|c| !c.fixed)
        .map(|c| c.area())
        .sum();
    if free_area > 0 {
        movable_area as f64 / free_area as f64
    } else if movable_area > 0 {
        f64::INFINITY
    } else {
        0.0
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn window_doubles_with_fixed_cells() {
        let mut design = rows_design(20, 2);
        add_movable(&mut design, "a", 20, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let lg = Legalizer::new(design, &config(), &sink);
        assert_eq!(lg.search_window(), (100, 300));

        let mut design = rows_design(20, 2);
        add_movable(&mut design, "a", 20, 100, 0, 0);
        add_fixed(&mut design, "blk", 20, 100, 100, 0);
        let lg = Legalizer::new(design, &config(), &sink);
        assert_eq!(lg.search_window(), (200, 600));
    }

    #[test]
    fn window_doubles_when_dense() {
        let mut design = rows_design(10, 1);
        add_movable(&mut design, "a", 70, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let lg = Legalizer::new(design, &config(), &sink);
        assert!((lg.design_utilization() - 0.7).abs() < 1e-9);
        assert_eq!(lg.search_window(), (200, 600));
    }

    #[test]
    fn utilization_excludes_fixed_area() {
        let mut design = rows_design(10, 2);
        add_fixed(&mut design, "blk", 50, 200, 0, 0);
        add_movable(&mut design, "a", 50, 100, 0, 0);
        let sink = DiagnosticSink::new();
        let lg = Legalizer::new(design, &config(), &sink);
        assert!((lg.design_utilization() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn run_places_every_cell_and_reports() {
        let mut design = rows_design(20, 2);
        add_movable(&mut design, "a", 30, 100, 12, 40);
        add_movable(&mut design, "b", 30, 100, 18, 60);
        let sink = DiagnosticSink::new();
        let mut lg = Legalizer::new(design, &config(), &sink);
        lg.run().unwrap();
        assert!(lg.design().cells.iter().all(|c| c.placed));
        assert_eq!(lg.failures().count(), 0);
        let report = lg.report(0);
        assert_eq!(report.movable_count, 2);
        assert_eq!(report.unplaced_count, 0);
        assert!(!sink.has_errors());
    }
}
