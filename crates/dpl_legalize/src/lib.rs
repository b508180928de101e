//! Detailed placement legalization for row-based standard-cell designs.
//!
//! This crate takes a globally placed [`Design`] (cells at approximate,
//! possibly overlapping positions) and moves every movable cell to a legal
//! site: aligned to the site and row grid, free of overlaps, on a
//! supply-compatible row, and inside its placement group's region, while
//! keeping each cell as close as possible to where it started.
//!
//! # Pipeline
//!
//! 1. **Grid**: build the site/row occupancy grid, stamp fixed cells and
//!    group regions
//! 2. **Groups**: pre-place group members into their regions, legalize
//!    them tier by tier, fall back to brick placement, refine and anneal
//! 3. **Place**: legalize free cells by diamond search, ripping up
//!    neighborhoods with `shift_move` when a cell is stuck
//! 4. **Refine**: re-search the most displaced cells for closer sites
//! 5. **Report**: displacement and wirelength statistics
//!
//! [`check_placement`] verifies the result independently.
//!
//! # Usage
//!
//! ```ignore
//! use dpl_legalize::{check_placement, import_design, legalize};
//!
//! let design = import_design(&record, &config, &sink);
//! let (design, report) = legalize(design, &config, &sink)?;
//! assert!(check_placement(&design, &config, &sink).is_clean());
//! println!("{report}");
//! ```

#![warn(missing_docs)]

pub mod check;
pub mod convert;
pub mod data;
pub mod grid;
pub mod ids;
pub mod placement;
pub mod records;
pub mod stats;

pub use check::{check_placement, CheckReport};
pub use convert::{export_placements, import_design};
pub use data::{Cell, CellKind, Design, Group, Net, NetPin, Orientation, Power, PowerPin, Row};
pub use grid::{Grid, GridPt, Pixel};
pub use ids::{CellId, GroupId, NetId};
pub use placement::Legalizer;
pub use records::{
    CellRecord, CellStatus, DesignRecord, GroupRecord, NetRecord, PinRecord, PlacementRecord,
    RowRecord,
};
pub use stats::LegalizeReport;

use dpl_common::{DplResult, InternalError};
use dpl_config::LegalizerConfig;
use dpl_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Location};
use stats::Positions;

/// Runs the complete legalization pipeline on a design.
///
/// Cells that cannot be legalized are reported as warnings and left
/// unplaced; the run still succeeds. An error is returned when `config`
/// fails validation or an internal invariant breaks. A summary note is
/// emitted at the end.
pub fn legalize(
    design: Design,
    config: &LegalizerConfig,
    sink: &DiagnosticSink,
) -> DplResult<(Design, LegalizeReport)> {
    let _span = tracing::info_span!("legalize").entered();
    dpl_config::validate_config(config)
        .map_err(|e| InternalError::new(format!("invalid configuration: {e}")))?;
    let hpwl_before = stats::total_hpwl(&design, Positions::Initial);

    let mut legalizer = Legalizer::new(design, config, sink);
    legalizer.run()?;
    let report = legalizer.report(hpwl_before);

    sink.emit(Diagnostic::note(
        DiagnosticCode::new(Category::Note, 301),
        format!(
            "legalized {} of {} movable cells; displacement avg {:.1} max {}; {} warnings",
            report.movable_count - report.unplaced_count,
            report.movable_count,
            report.displacement_avg,
            report.displacement_max,
            sink.warning_count()
        ),
        Location::NONE,
    ));
    tracing::info!(
        unplaced = report.unplaced_count,
        displacement = report.displacement_sum,
        hpwl = report.hpwl_after,
        "legalization done"
    );
    Ok((legalizer.into_design(), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpl_common::{Point, Rect};

    fn two_row_design() -> Design {
        let mut design = Design::new(Rect::new(0, 0, 200, 200));
        for (y, orient) in [(0, Orientation::R0), (100, Orientation::MX)] {
            design.add_row(Row {
                origin: Point::new(0, y),
                site_count: 20,
                orient,
            });
        }
        for (name, x, y) in [("a", 13, 10), ("b", 17, 30), ("c", 44, 160)] {
            let ident = design.intern(name);
            design.add_cell(Cell::new(ident, 30, 100, x, y));
        }
        design
    }

    #[test]
    fn legalize_produces_a_clean_placement() {
        let config = LegalizerConfig::new(10, 100);
        let sink = DiagnosticSink::new();
        let (design, report) = legalize(two_row_design(), &config, &sink).unwrap();
        assert_eq!(report.unplaced_count, 0);
        assert!(design.cells.iter().all(|c| c.placed));
        assert!(check_placement(&design, &config, &sink).is_clean());
        assert_eq!(sink.count_code(301), 1);
        assert!(!sink.has_errors());
    }

    #[test]
    fn legalize_is_deterministic() {
        let config = LegalizerConfig::new(10, 100);
        let sink = DiagnosticSink::new();
        let (_, first) = legalize(two_row_design(), &config, &sink).unwrap();
        let (_, second) = legalize(two_row_design(), &config, &sink).unwrap();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.displacement_sum, second.displacement_sum);
    }

    #[test]
    fn legalize_rejects_invalid_config() {
        let sink = DiagnosticSink::new();
        let mut config = LegalizerConfig::new(10, 100);
        config.search.bin_width = 0;
        let err = legalize(two_row_design(), &config, &sink).unwrap_err();
        assert!(err.message.contains("bin_width"));

        let config = LegalizerConfig::new(0, 100);
        let err = legalize(two_row_design(), &config, &sink).unwrap_err();
        assert!(err.message.contains("site_width"));
    }

    #[test]
    fn design_serde_roundtrip_keeps_names() {
        let design = two_row_design();
        let json = serde_json::to_string(&design).unwrap();
        let mut back: Design = serde_json::from_str(&json).unwrap();
        back.rebuild_indices();
        let b = back.find_cell("b").unwrap();
        assert_eq!(back.cell(b).init_x, 17);
        assert_eq!(back.cell_name(b), "b");
    }
}
