//! Placement quality statistics.
//!
//! Wirelength is measured as half-perimeter bounding-box length (HPWL) over
//! every net, with each pin at its cell origin plus the pin offset.

use crate::data::Design;
use dpl_common::ContentHash;
use serde::Serialize;
use std::fmt;

/// Which cell origins to measure pins against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positions {
    /// The positions the design arrived with.
    Initial,
    /// The positions after legalization.
    Current,
}

/// Summary of one legalization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegalizeReport {
    /// Total cells in the design.
    pub cell_count: usize,
    /// Fixed cells, including blocks.
    pub fixed_count: usize,
    /// Movable cells.
    pub movable_count: usize,
    /// Movable cells taller than one row.
    pub multi_row_count: usize,
    /// Placement groups.
    pub group_count: usize,
    /// Movable cells left unplaced.
    pub unplaced_count: usize,
    /// Movable area over free row area.
    pub design_utilization: f64,
    /// Summed displacement of movable cells, in DBU.
    pub displacement_sum: i64,
    /// Mean displacement per movable cell, in DBU.
    pub displacement_avg: f64,
    /// Largest single displacement, in DBU.
    pub displacement_max: i64,
    /// HPWL at the original positions.
    pub hpwl_before: i64,
    /// HPWL at the legalized positions.
    pub hpwl_after: i64,
    /// Hash of every movable cell's final position and orientation.
    pub fingerprint: ContentHash,
}

impl LegalizeReport {
    /// Relative HPWL change in percent; zero when there was no wirelength.
    pub fn hpwl_delta_percent(&self) -> f64 {
        if self.hpwl_before == 0 {
            return 0.0;
        }
        (self.hpwl_after - self.hpwl_before) as f64 / self.hpwl_before as f64 * 100.0
    }
}

impl fmt::Display for LegalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "cells:         {} ({} fixed, {} movable, {} multi-row)",
            self.cell_count, self.fixed_count, self.movable_count, self.multi_row_count
        )?;
        writeln!(f, "groups:        {}", self.group_count)?;
        writeln!(f, "utilization:   {:.1}%", self.design_utilization * 100.0)?;
        writeln!(
            f,
            "displacement:  sum {} avg {:.1} max {}",
            self.displacement_sum, self.displacement_avg, self.displacement_max
        )?;
        writeln!(
            f,
            "hpwl:          {} -> {} ({:+.2}%)",
            self.hpwl_before,
            self.hpwl_after,
            self.hpwl_delta_percent()
        )?;
        writeln!(f, "unplaced:      {}", self.unplaced_count)?;
        write!(f, "fingerprint:   {}", self.fingerprint)
    }
}

/// Gathers statistics for a design after legalization.
pub fn collect_report(
    design: &Design,
    row_height: i64,
    design_util: f64,
    hpwl_before: i64,
) -> LegalizeReport {
    let mut movable_count = 0;
    let mut multi_row_count = 0;
    let mut unplaced_count = 0;
    let mut displacement_sum = 0;
    let mut displacement_max = 0;
    for cell in design.cells.iter().filter(|c| !c.fixed) {
        movable_count += 1;
        if cell.is_multi_row(row_height) {
            multi_row_count += 1;
        }
        if !cell.placed {
            unplaced_count += 1;
        }
        let displacement = cell.displacement();
        displacement_sum += displacement;
        displacement_max = displacement_max.max(displacement);
    }
    let displacement_avg = if movable_count > 0 {
        displacement_sum as f64 / movable_count as f64
    } else {
        0.0
    };

    LegalizeReport {
        cell_count: design.cell_count(),
        fixed_count: design.fixed_count(),
        movable_count,
        multi_row_count,
        group_count: design.groups.len(),
        unplaced_count,
        design_utilization: design_util,
        displacement_sum,
        displacement_avg,
        displacement_max,
        hpwl_before,
        hpwl_after: total_hpwl(design, Positions::Current),
        fingerprint: placement_fingerprint(design),
    }
}

/// Total HPWL over all nets.
pub fn total_hpwl(design: &Design, positions: Positions) -> i64 {
    design
        .nets
        .iter()
        .map(|net| {
            let mut min_x = i64::MAX;
            let mut max_x = i64::MIN;
            let mut min_y = i64::MAX;
            let mut max_y = i64::MIN;
            for pin in &net.pins {
                let cell = design.cell(pin.cell);
                let (x, y) = match positions {
                    Positions::Initial => (cell.init_x, cell.init_y),
                    Positions::Current => (cell.x, cell.y),
                };
                min_x = min_x.min(x + pin.dx);
                max_x = max_x.max(x + pin.dx);
                min_y = min_y.min(y + pin.dy);
                max_y = max_y.max(y + pin.dy);
            }
            if min_x == i64::MAX {
                0
            } else {
                max_x - min_x + max_y - min_y
            }
        })
        .sum()
}

/// Fingerprint of the movable placement.
///
/// Each movable cell contributes its id, origin, orientation, and whether it
/// was placed, so two runs agree exactly when they produce the same layout.
pub fn placement_fingerprint(design: &Design) -> ContentHash {
    ContentHash::from_words(design.cells.iter().filter(|c| !c.fixed).flat_map(|c| {
        [
            i64::from(c.id.as_raw()),
            c.x,
            c.y,
            c.orient as i64,
            i64::from(c.placed),
        ]
    }))
}
