//! Post-placement legality checks.
//!
//! [`check_placement`] is read-only: it rebuilds an occupancy grid from the
//! design as it stands and classifies every remaining violation. Each
//! non-empty class is reported as one `E101` error.

use crate::data::{Cell, Design, Power};
use crate::grid::{Grid, GridPt};
use crate::ids::CellId;
use dpl_common::Point;
use dpl_config::LegalizerConfig;
use dpl_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Label, Location};
use std::collections::BTreeSet;

/// Most cells labelled on a single verification diagnostic.
const MAX_LABELS: usize = 10;

/// Violations found by [`check_placement`], grouped by class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Movable cells that were never placed.
    pub unplaced: Vec<CellId>,
    /// Placed cells whose origin is off the site or row pitch.
    pub misaligned: Vec<CellId>,
    /// Placed cells that leave the core or sit on sites with no row.
    pub outside_rows: Vec<CellId>,
    /// Overlapping pairs, smaller id first. Fixed pairs are not reported.
    pub overlaps: Vec<(CellId, CellId)>,
    /// Group members outside their group, or free cells inside a group.
    pub region_violations: Vec<CellId>,
    /// Even-height cells whose top supply disagrees with the rail.
    pub power_mismatches: Vec<CellId>,
    /// Cells leaving a single empty site beside a neighbor.
    pub one_site_gaps: Vec<CellId>,
}

impl CheckReport {
    /// Total violations across all classes.
    pub fn failure_count(&self) -> usize {
        self.unplaced.len()
            + self.misaligned.len()
            + self.outside_rows.len()
            + self.overlaps.len()
            + self.region_violations.len()
            + self.power_mismatches.len()
            + self.one_site_gaps.len()
    }

    /// Returns `true` if no violation was found.
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Verifies the placement in `design` and reports each violation class.
pub fn check_placement(
    design: &Design,
    config: &LegalizerConfig,
    sink: &DiagnosticSink,
) -> CheckReport {
    let _span = tracing::info_span!("check_placement").entered();
    let mut grid = Grid::new(design, config);
    let mut report = CheckReport::default();

    let placed: Vec<&Cell> = design
        .cells
        .iter()
        .filter(|c| !c.fixed && c.placed)
        .collect();
    report.unplaced = design
        .cells
        .iter()
        .filter(|c| !c.fixed && !c.placed)
        .map(|c| c.id)
        .collect();

    let core = grid.core();
    for cell in &placed {
        if (cell.x - core.xl) % grid.site_width() != 0
            || (cell.y - core.yl) % grid.row_height() != 0
        {
            report.misaligned.push(cell.id);
        }
        let on_rows = footprint(&grid, cell).all(|pt| is_row_site(&grid, pt));
        if !core.contains(&cell.rect()) || !on_rows {
            report.outside_rows.push(cell.id);
        }
    }

    grid.stamp_fixed(design);
    let mut overlaps = BTreeSet::new();
    for cell in &placed {
        for pt in footprint(&grid, cell) {
            let Some(pixel) = grid.pixel_mut(pt.x, pt.y) else {
                continue;
            };
            match pixel.cell {
                Some(other) if other != cell.id => {
                    overlaps.insert((other.min(cell.id), other.max(cell.id)));
                }
                _ => pixel.cell = Some(cell.id),
            }
        }
    }
    report.overlaps = overlaps.into_iter().collect();

    if config.search.disallow_one_site_gaps {
        for cell in &placed {
            let origin = grid.cell_grid_origin(cell);
            let width = grid.padded_width(cell);
            let height = grid.grid_height(cell);
            if grid.leaves_one_site_gap(origin, width, height, cell.id) {
                report.one_site_gaps.push(cell.id);
            }
        }
    }

    for cell in &placed {
        let height = grid.grid_height(cell);
        if height >= 2 && height % 2 == 0 && cell.top_power != Power::Unknown {
            let top_row = grid.grid_y(cell.y) + height - 1;
            if cell.top_power != grid.row_top_power(top_row) {
                report.power_mismatches.push(cell.id);
            }
        }
    }

    grid.stamp_groups(design);
    for cell in &placed {
        let violates = footprint(&grid, cell).any(|pt| match grid.pixel(pt.x, pt.y) {
            Some(pixel) => match cell.group {
                Some(group) => pixel.group != Some(group),
                None => pixel.group.is_some() || pixel.util > 0.0,
            },
            None => cell.in_group(),
        });
        if violates {
            report.region_violations.push(cell.id);
        }
    }

    emit_class(sink, design, "unplaced cells", &report.unplaced);
    emit_class(sink, design, "cells off the site grid", &report.misaligned);
    emit_class(sink, design, "cells outside the rows", &report.outside_rows);
    if !report.overlaps.is_empty() {
        let mut diag = verification_error(report.overlaps.len(), "overlapping cell pairs");
        for &(a, b) in report.overlaps.iter().take(MAX_LABELS) {
            diag = diag.with_label(Label::primary(
                cell_location(design, a),
                format!("overlaps '{}'", design.cell_name(b)),
            ));
        }
        sink.emit(diag);
    }
    emit_class(sink, design, "group region violations", &report.region_violations);
    emit_class(sink, design, "power rail mismatches", &report.power_mismatches);
    emit_class(sink, design, "one-site gaps", &report.one_site_gaps);

    tracing::debug!(failures = report.failure_count(), "check placement");
    report
}

/// Padded footprint of a cell at its current position, clipped to the grid.
fn footprint(grid: &Grid, cell: &Cell) -> impl Iterator<Item = GridPt> {
    let origin = grid.cell_grid_origin(cell);
    let width = grid.padded_width(cell);
    let height = grid.grid_height(cell);
    (origin.y..origin.y + height).flat_map(move |y| {
        (origin.x..origin.x + width).map(move |x| GridPt::new(x, y))
    })
}

fn is_row_site(grid: &Grid, pt: GridPt) -> bool {
    grid.pixel(pt.x, pt.y).is_some_and(|p| p.is_valid)
}

fn verification_error(count: usize, class: &str) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::new(Category::Error, 101),
        format!("placement check failed: {count} {class}"),
        Location::NONE,
    )
}

fn emit_class(sink: &DiagnosticSink, design: &Design, class: &str, cells: &[CellId]) {
    if cells.is_empty() {
        return;
    }
    let mut diag = verification_error(cells.len(), class);
    for &id in cells.iter().take(MAX_LABELS) {
        diag = diag.with_label(Label::primary(cell_location(design, id), class));
    }
    if cells.len() > MAX_LABELS {
        diag = diag.with_note(format!("{} more not shown", cells.len() - MAX_LABELS));
    }
    sink.emit(diag);
}

fn cell_location(design: &Design, id: CellId) -> Location {
    let cell = design.cell(id);
    Location::at(design.cell_name(id), Point::new(cell.x, cell.y))
}
