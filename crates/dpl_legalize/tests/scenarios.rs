//! End-to-end legalization scenarios through the public API.

use dpl_common::{Point, Rect};
use dpl_config::LegalizerConfig;
use dpl_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use dpl_legalize::{
    check_placement, export_placements, import_design, legalize, Cell, CellId, CellKind,
    Design, DesignRecord, Group, GridPt, Legalizer, Orientation, Power, Row,
};

fn config() -> LegalizerConfig {
    LegalizerConfig::new(10, 100)
}

/// `rows` rows of `sites` sites, alternating R0 and MX from the bottom.
fn core_with_rows(sites: i64, rows: i64) -> Design {
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

fn add_cell(design: &mut Design, name: &str, width: i64, height: i64, x: i64, y: i64) -> CellId {
    let ident = design.intern(name);
    design.add_cell(Cell::new(ident, width, height, x, y))
}

fn add_block(design: &mut Design, name: &str, width: i64, height: i64, x: i64, y: i64) -> CellId {
    let ident = design.intern(name);
    design.add_cell(Cell::new(ident, width, height, x, y).into_fixed(CellKind::Block))
}

fn assert_legal(design: &Design, config: &LegalizerConfig) {
    let sink = DiagnosticSink::new();
    let report = check_placement(design, config, &sink);
    assert!(report.is_clean(), "placement is not legal: {report:?}");
}

#[test]
fn cell_on_obstacle_moves_to_nearest_side() {
    let mut design = core_with_rows(10, 1);
    add_block(&mut design, "blk", 20, 100, 30, 0);
    let a = add_cell(&mut design, "a", 20, 100, 30, 0);
    let sink = DiagnosticSink::new();
    let (design, report) = legalize(design, &config(), &sink).unwrap();
    let a = design.cell(a);
    assert!(a.placed);
    assert!(a.x == 10 || a.x == 50, "unexpected x {}", a.x);
    assert_eq!(a.y, 0);
    assert_eq!(report.displacement_max, 20);
    assert_legal(&design, &config());
}

#[test]
fn group_member_is_pulled_into_its_region() {
    let mut design = core_with_rows(20, 2);
    let member = add_cell(&mut design, "member", 20, 100, 0, 0);
    let intruder = add_cell(&mut design, "intruder", 20, 100, 120, 100);
    let name = design.intern("fence");
    let mut group = Group::new(name, vec![Rect::new(100, 0, 200, 200)]);
    group.cells.push(member);
    design.add_group(group);

    let sink = DiagnosticSink::new();
    let (design, _) = legalize(design, &config(), &sink).unwrap();
    let member = design.cell(member);
    assert!(member.placed && member.x >= 100);
    let intruder = design.cell(intruder);
    assert!(intruder.placed && intruder.x + intruder.width <= 100);
    assert_legal(&design, &config());
}

#[test]
fn swapping_crossed_cells_removes_displacement() {
    let mut design = core_with_rows(20, 1);
    let a = add_cell(&mut design, "a", 20, 100, 100, 0);
    let b = add_cell(&mut design, "b", 20, 100, 0, 0);
    let sink = DiagnosticSink::new();
    let mut legalizer = Legalizer::new(design, &config(), &sink);
    assert!(legalizer.map_move_to(a, GridPt::new(0, 0)).unwrap());
    assert!(legalizer.map_move_to(b, GridPt::new(10, 0)).unwrap());
    assert!(legalizer.swap_cells(a, b).unwrap());

    let design = legalizer.into_design();
    assert_eq!(design.cell(a).displacement(), 0);
    assert_eq!(design.cell(b).displacement(), 0);
}

#[test]
fn even_height_cell_lands_on_matching_rail() {
    let mut design = core_with_rows(10, 4);
    let tall = add_cell(&mut design, "tall", 20, 200, 0, 100);
    design.cell_mut(tall).top_power = Power::Vss;
    let sink = DiagnosticSink::new();
    let (design, _) = legalize(design, &config(), &sink).unwrap();
    let tall = design.cell(tall);
    assert!(tall.placed);
    // Rows 1 and 3 are MX, which carry the ground rail on top.
    assert!(tall.y == 0 || tall.y == 200, "unexpected y {}", tall.y);
    assert_legal(&design, &config());
}

#[test]
fn legal_input_is_left_in_place() {
    let mut design = core_with_rows(20, 2);
    add_cell(&mut design, "a", 30, 100, 0, 0);
    add_cell(&mut design, "b", 40, 100, 30, 0);
    add_cell(&mut design, "c", 20, 100, 150, 100);
    add_block(&mut design, "blk", 40, 100, 100, 0);
    let sink = DiagnosticSink::new();
    let (design, report) = legalize(design, &config(), &sink).unwrap();
    assert_eq!(report.displacement_sum, 0);
    assert_eq!(report.hpwl_after, report.hpwl_before);
    assert_legal(&design, &config());
    assert_eq!(sink.warning_count(), 0);
}

#[test]
fn crowded_design_is_fully_legalized() {
    let mut design = core_with_rows(20, 3);
    let starts = [
        (12, 30),
        (18, 40),
        (25, 10),
        (33, 170),
        (40, 120),
        (95, 90),
        (101, 110),
        (104, 220),
        (150, 20),
        (151, 260),
    ];
    for (i, (x, y)) in starts.into_iter().enumerate() {
        add_cell(&mut design, &format!("u{i}"), 30, 100, x, y);
    }
    add_cell(&mut design, "tall", 20, 200, 60, 50);
    let sink = DiagnosticSink::new();
    let (design, report) = legalize(design, &config(), &sink).unwrap();
    assert_eq!(report.unplaced_count, 0);
    assert_legal(&design, &config());
    for cell in &design.cells {
        assert_eq!(cell.x % 10, 0);
        assert_eq!(cell.y % 100, 0);
    }
}

#[test]
fn refinement_never_increases_displacement() {
    let build = || {
        let mut design = core_with_rows(30, 2);
        for (i, x) in [0, 5, 10, 15, 20, 25, 30, 35].into_iter().enumerate() {
            add_cell(&mut design, &format!("u{i}"), 40, 100, x, 0);
        }
        design
    };
    let sink = DiagnosticSink::new();
    let mut without = config();
    without.refine.enabled = false;
    let (_, plain) = legalize(build(), &without, &sink).unwrap();
    let mut with = config();
    with.refine.percent = 1.0;
    let (design, refined) = legalize(build(), &with, &sink).unwrap();
    assert!(refined.displacement_sum <= plain.displacement_sum);
    assert_legal(&design, &with);
}

#[test]
fn oversized_cell_is_reported_and_left_unplaced() {
    let mut design = core_with_rows(5, 1);
    let wide = add_cell(&mut design, "wide", 80, 100, 0, 0);
    add_cell(&mut design, "ok", 20, 100, 0, 0);
    let sink = DiagnosticSink::new();
    let (design, report) = legalize(design, &config(), &sink).unwrap();
    assert!(!design.cell(wide).placed);
    assert_eq!(report.unplaced_count, 1);
    assert_eq!(sink.count_code(201), 1);
    let check_sink = DiagnosticSink::new();
    let check = check_placement(&design, &config(), &check_sink);
    assert_eq!(check.unplaced, vec![wide]);
    assert_eq!(check_sink.count_code(101), 1);
}

#[test]
fn records_round_trip_through_legalization() {
    let json = r#"{
        "core": {"xl": 0, "yl": 0, "xh": 200, "yh": 200},
        "rows": [
            {"name": "r0", "x": 0, "y": 0, "site_count": 20, "orient": "R0"},
            {"name": "r1", "x": 0, "y": 100, "site_count": 20, "orient": "MX"}
        ],
        "cells": [
            {"name": "u1", "width": 30, "height": 100, "x": 14, "y": 20},
            {"name": "u2", "width": 30, "height": 100, "x": 16, "y": 30},
            {"name": "m1", "width": 100, "height": 100, "x": 100, "y": 0,
             "kind": "Block", "status": "fixed"}
        ],
        "nets": [
            {"name": "n1", "pins": [{"cell": "u1"}, {"cell": "u2", "dx": 10}]}
        ]
    }"#;
    let record: DesignRecord = serde_json::from_str(json).unwrap();
    let sink = DiagnosticSink::new();
    let design = import_design(&record, &config(), &sink);
    let (design, report) = legalize(design, &config(), &sink).unwrap();
    assert_eq!(report.fixed_count, 1);
    assert_eq!(report.unplaced_count, 0);

    let placements = export_placements(&design);
    assert_eq!(placements.len(), 2);
    assert!(placements.iter().all(|p| p.placed && p.x % 10 == 0));
    let u1 = placements.iter().find(|p| p.name == "u1").unwrap();
    assert_eq!((u1.x, u1.y), (10, 0));
    assert_eq!(u1.orient, Orientation::R0);
    assert_legal(&design, &config());
}

#[test]
fn run_diagnostics_render_as_a_report() {
    let mut design = core_with_rows(5, 1);
    add_cell(&mut design, "wide", 80, 100, 0, 0);
    add_cell(&mut design, "ok", 20, 100, 0, 0);
    let sink = DiagnosticSink::new();
    let (design, _) = legalize(design, &config(), &sink).unwrap();
    check_placement(&design, &config(), &sink);

    let text = TerminalRenderer::new(false).render_all(&sink.take_all());
    assert!(text.contains("warning[W201]"));
    assert!(text.contains("note[N301]: legalized 1 of 2 movable cells"));
    assert!(text.contains("error[E101]: placement check failed: 1 unplaced cells"));
    assert!(text.ends_with("1 error(s), 1 warning(s)\n"));
}

#[test]
fn member_stays_inside_overlapping_region_rects() {
    let mut design = core_with_rows(10, 1);
    let member = add_cell(&mut design, "member", 10, 100, 10, 0);
    let name = design.intern("fence");
    let mut group = Group::new(
        name,
        vec![Rect::new(0, 0, 15, 100), Rect::new(5, 0, 15, 100)],
    );
    group.cells.push(member);
    design.add_group(group);

    let sink = DiagnosticSink::new();
    let (design, _) = legalize(design, &config(), &sink).unwrap();
    let member = design.cell(member);
    assert!(member.placed);
    assert_eq!(member.x, 0);
    assert_legal(&design, &config());
}

#[test]
fn regionless_group_member_is_reported() {
    let mut design = core_with_rows(10, 1);
    let member = add_cell(&mut design, "member", 20, 100, 0, 0);
    let name = design.intern("empty");
    let mut group = Group::new(name, Vec::new());
    group.cells.push(member);
    design.add_group(group);

    let sink = DiagnosticSink::new();
    let (design, report) = legalize(design, &config(), &sink).unwrap();
    assert!(!design.cell(member).placed);
    assert_eq!(report.unplaced_count, 1);
    assert_eq!(sink.count_code(203), 1);
}
