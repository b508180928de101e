//! Conversion between name-keyed records and the arena [`Design`].
//!
//! Import resolves every name reference to an arena ID and derives each
//! cell's top supply from its power pins. Problems in the input are reported
//! as warnings and the offending item is kept or skipped on a best-effort
//! basis: cells outside the core are still legalized, misaligned rows are
//! still used, and unknown group or cell references are dropped.

use crate::data::{Cell, Design, Group, Net, NetPin, Power, PowerPin, Row};
use crate::ids::{CellId, GroupId, NetId};
use crate::records::{CellRecord, CellStatus, DesignRecord, PlacementRecord};
use dpl_common::Point;
use dpl_config::LegalizerConfig;
use dpl_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Location};
use std::collections::HashMap;

/// Builds a [`Design`] from its record form.
///
/// Fixed instances become obstacles. Every other instance is movable and
/// starts unplaced, with its recorded position as the legalization target.
pub fn import_design(
    record: &DesignRecord,
    config: &LegalizerConfig,
    sink: &DiagnosticSink,
) -> Design {
    let mut design = Design::new(record.core);
    let site_width = config.technology.site_width;
    let row_height = config.technology.row_height;

    for row in &record.rows {
        if (row.x - record.core.xl) % site_width != 0 || (row.y - record.core.yl) % row_height != 0
        {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 205),
                format!(
                    "row '{}' at ({}, {}) is off the {site_width} x {row_height} site grid",
                    row.name, row.x, row.y
                ),
                Location::at(row.name.clone(), Point::new(row.x, row.y)),
            ));
        }
        design.add_row(Row {
            origin: Point::new(row.x, row.y),
            site_count: row.site_count,
            orient: row.orient,
        });
    }

    let mut group_ids: HashMap<&str, GroupId> = HashMap::new();
    let mut members: Vec<Vec<CellId>> = vec![Vec::new(); record.groups.len()];
    for (index, group) in record.groups.iter().enumerate() {
        if group.rects.is_empty() {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 207),
                format!("group '{}' has no region rectangles", group.name),
                Location::object(group.name.clone()),
            ));
        }
        group_ids.insert(&group.name, GroupId::from_raw(index as u32));
    }

    for record_cell in &record.cells {
        let imported = import_cell(&design, record_cell, config);
        let id = design.add_cell(imported);
        let cell = design.cell(id);
        if !cell.fixed && !record.core.contains(&cell.init_rect()) {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 204),
                format!("cell '{}' lies outside the core area", record_cell.name),
                Location::at(record_cell.name.clone(), Point::new(cell.x, cell.y)),
            ));
        }
        if !cell.fixed && cell.is_multi_row(row_height) && cell.top_power == Power::Unknown {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 206),
                format!(
                    "multi-row cell '{}' has no pin on '{}' or '{}'; rail alignment is unchecked",
                    record_cell.name, config.power.power_net, config.power.ground_net
                ),
                Location::object(record_cell.name.clone()),
            ));
        }

        let Some(group_name) = &record_cell.group else {
            continue;
        };
        match group_ids.get(group_name.as_str()) {
            Some(group) if !cell.fixed => members[group.index()].push(id),
            Some(_) => {}
            None => sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 207),
                format!(
                    "cell '{}' refers to unknown group '{group_name}'",
                    record_cell.name
                ),
                Location::object(record_cell.name.clone()),
            )),
        }
    }

    for (group, cells) in record.groups.iter().zip(members) {
        let mut imported = Group::new(design.intern(&group.name), group.rects.clone());
        imported.cells = cells;
        design.add_group(imported);
    }

    for net in &record.nets {
        let pins = net
            .pins
            .iter()
            .filter_map(|pin| {
                design.find_cell(&pin.cell).map(|cell| NetPin {
                    cell,
                    dx: pin.dx,
                    dy: pin.dy,
                })
            })
            .collect();
        let name = design.intern(&net.name);
        design.add_net(Net {
            id: NetId::from_raw(0),
            name,
            pins,
        });
    }

    tracing::debug!(
        rows = design.rows.len(),
        cells = design.cell_count(),
        fixed = design.fixed_count(),
        groups = design.groups.len(),
        nets = design.nets.len(),
        "imported design"
    );
    design
}

fn import_cell(design: &Design, record: &CellRecord, config: &LegalizerConfig) -> Cell {
    let mut cell = Cell::new(
        design.intern(&record.name),
        record.width,
        record.height,
        record.x,
        record.y,
    );
    cell.orient = record.orient;
    cell.kind = record.kind;
    cell.power_pins = record.power_pins.clone();
    cell.top_power = top_power(
        &record.power_pins,
        &config.power.power_net,
        &config.power.ground_net,
    );
    if record.status == CellStatus::Fixed {
        cell = cell.into_fixed(record.kind);
    }
    cell
}

/// Supply of the topmost recognized power pin, in R0.
pub fn top_power(pins: &[PowerPin], power_net: &str, ground_net: &str) -> Power {
    pins.iter()
        .filter_map(|pin| {
            let power = if pin.net == power_net {
                Power::Vdd
            } else if pin.net == ground_net {
                Power::Vss
            } else {
                return None;
            };
            Some((pin.y, power))
        })
        .max_by_key(|&(y, _)| y)
        .map_or(Power::Unknown, |(_, power)| power)
}

/// Exports the final position of every movable cell.
pub fn export_placements(design: &Design) -> Vec<PlacementRecord> {
    design
        .cells
        .iter()
        .filter(|c| !c.fixed)
        .map(|c| PlacementRecord {
            name: design.cell_name(c.id).to_string(),
            x: c.x,
            y: c.y,
            orient: c.orient,
            placed: c.placed,
        })
        .collect()
}
