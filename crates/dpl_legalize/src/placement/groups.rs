//! Group (fence region) placement.
//!
//! Groups are placed before any free cell so they get first claim on their
//! territory:
//!
//! 1. every member is assigned the region rectangle holding its original
//!    footprint, and each group's utilization is measured;
//! 2. members outside all of their rectangles are pulled in and held;
//! 3. free cells overlapping a region are pushed out and held;
//! 4. the remaining members are placed multi-row first, then single-row;
//!    if any member fails, the whole group is erased and brick-placed;
//! 5. a few passes of group refinement and random swaps follow.

use super::Legalizer;
use crate::data::Cell;
use crate::ids::{CellId, GroupId};
use dpl_common::{DplResult, Point, Rect};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Utilization above which a failed group is brick-placed from the edges of
/// its bounding box instead of per-region corners.
const BRICK_EDGE_UTILIZATION: f64 = 0.95;

/// A refinement pass that moves fewer cells than this ends a group's loop.
const MIN_REFINE_MOVES: usize = 10;

/// A swap pass that commits fewer swaps than this ends a group's loop.
const MIN_SWAPS: usize = 100;

impl<'a> Legalizer<'a> {
    /// Places every group: region assignment, pre-placement, two-tier
    /// placement with brick fallback, then group refinement.
    pub fn place_groups(&mut self) -> DplResult<()> {
        if self.design.groups.is_empty() {
            return Ok(());
        }
        let _span =
            tracing::info_span!("place_groups", groups = self.design.groups.len()).entered();

        self.assign_cell_regions();
        self.pre_place_groups()?;
        self.pre_place()?;
        for group in self.group_ids() {
            self.place_group(group)?;
        }

        if self.config.refine.enabled {
            for group in self.group_ids() {
                self.refine_group_passes(group)?;
            }
        }
        Ok(())
    }

    /// Alternates group refinement and random swaps on one group until a
    /// pass moves too few cells or `refine.group_passes` is reached. Each
    /// swap round starts from a fresh generator seeded with `anneal.seed`.
    fn refine_group_passes(&mut self, group: GroupId) -> DplResult<()> {
        for pass in 0..self.config.refine.group_passes {
            let refined = self.group_refine(group)?;
            let mut rng = StdRng::seed_from_u64(self.config.anneal.seed);
            let swapped = self.anneal(group, &mut rng)?;
            tracing::debug!(group = %group, pass, refined, swapped, "group refinement pass");
            if refined < MIN_REFINE_MOVES || swapped < MIN_SWAPS {
                break;
            }
        }
        Ok(())
    }

    /// Assigns each member the rectangle that contains its original
    /// footprint (else the group's first rectangle) and records each group's
    /// utilization: member area over the area of the sites it owns.
    pub fn assign_cell_regions(&mut self) {
        let site_area = self.grid.site_width() * self.grid.row_height();
        let mut owned = vec![0i64; self.design.groups.len()];
        for (_, pixel) in self.grid.pixels() {
            if let (true, Some(group)) = (pixel.is_valid, pixel.group) {
                owned[group.index()] += site_area;
            }
        }

        for group in self.group_ids() {
            let members = self.design.group(group).cells.clone();
            let rects = self.design.group(group).rects.clone();
            let mut cell_area = 0;
            for id in members {
                let cell = self.design.cell_mut(id);
                cell_area += cell.area();
                let init = cell.init_rect();
                cell.region = rects
                    .iter()
                    .position(|r| r.contains(&init))
                    .or_else(|| (!rects.is_empty()).then_some(0));
            }
            let site_area = owned[group.index()];
            let util = if site_area > 0 {
                cell_area as f64 / site_area as f64
            } else if cell_area > 0 {
                f64::INFINITY
            } else {
                0.0
            };
            self.design.group_mut(group).util = util;
            tracing::debug!(group = %group, util, "group utilization");
        }
    }

    /// Pulls members whose original footprint lies outside every region
    /// rectangle to the closest point of the nearest rectangle, legalizes
    /// them there, and holds them.
    pub fn pre_place_groups(&mut self) -> DplResult<()> {
        for group in self.group_ids() {
            let rects = self.design.group(group).rects.clone();
            if rects.is_empty() {
                continue;
            }
            for id in self.design.group(group).cells.clone() {
                let cell = self.design.cell(id);
                if cell.fixed || cell.placed {
                    continue;
                }
                let init = cell.init_rect();
                if rects.iter().any(|r| r.contains(&init)) {
                    continue;
                }
                let origin = init.ll();
                let Some(rect) = rects.iter().min_by_key(|r| dist_to_rect(r, origin)) else {
                    continue;
                };
                let pt = nearest_pt_inside(cell, rect);
                let target = self.legal_grid_pt_at(id, pt);
                if self.map_move_to(id, target)? {
                    self.design.cell_mut(id).hold = true;
                }
            }
        }
        Ok(())
    }

    /// Pushes free cells whose original footprint overlaps a group region to
    /// the nearest point clear of the overlapped rectangles, legalizes them
    /// there, and holds them.
    pub fn pre_place(&mut self) -> DplResult<()> {
        let region_rects: Vec<Rect> = self
            .design
            .groups
            .iter()
            .flat_map(|g| g.rects.iter().copied())
            .collect();
        if region_rects.is_empty() {
            return Ok(());
        }

        for index in 0..self.design.cells.len() {
            let cell = &self.design.cells[index];
            if cell.fixed || cell.placed || cell.in_group() {
                continue;
            }
            let init = cell.init_rect();
            let overlapped: Vec<Rect> = region_rects
                .iter()
                .copied()
                .filter(|r| r.overlaps(&init))
                .collect();
            if overlapped.is_empty() {
                continue;
            }
            let pt = nearest_pt_outside(cell, &overlapped);
            let id = cell.id;
            let target = self.legal_grid_pt_at(id, pt);
            if self.map_move_to(id, target)? {
                self.design.cell_mut(id).hold = true;
            }
        }
        Ok(())
    }

    /// Two-tier placement of one group, falling back to brick placement
    /// when any member cannot be placed.
    fn place_group(&mut self, group: GroupId) -> DplResult<()> {
        let row_height = self.grid.row_height();
        let mut members = self.design.group(group).cells.clone();
        members.sort_by_key(|&id| (std::cmp::Reverse(self.design.cell(id).area()), id));

        let mut success = true;
        for multi_row in [true, false] {
            for &id in &members {
                let cell = self.design.cell(id);
                if cell.fixed || cell.placed || cell.is_multi_row(row_height) != multi_row {
                    continue;
                }
                if !self.map_move(id)? {
                    success = false;
                }
            }
            if !success {
                break;
            }
        }
        if success {
            return Ok(());
        }

        tracing::debug!(group = %group, "group placement failed, falling back to brick placement");
        for &id in &members {
            self.erase(id);
        }
        if self.design.group(group).util > BRICK_EDGE_UTILIZATION {
            self.brick_place_edges(group)?;
        } else {
            self.brick_place_regions(group)?;
        }
        Ok(())
    }

    /// Brick placement anchored on the group's bounding box: members are
    /// placed in order of distance to the nearest bounding-box corner,
    /// outermost first.
    pub fn brick_place_edges(&mut self, group: GroupId) -> DplResult<bool> {
        let Some(bbox) = self.design.group(group).bbox() else {
            self.strand_members(group);
            return Ok(false);
        };
        let mut members: Vec<CellId> = self
            .design
            .group(group)
            .cells
            .iter()
            .copied()
            .filter(|&id| {
                let cell = self.design.cell(id);
                !cell.fixed && !cell.placed
            })
            .collect();
        members.sort_by_key(|&id| (rect_dist(self.design.cell(id), &bbox), id));

        let mut all_placed = true;
        for id in members {
            let corner = rect_corner(self.design.cell(id), &bbox);
            all_placed &= self.brick_move(id, corner)?;
        }
        Ok(all_placed)
    }

    /// Brick placement anchored on each member's own region rectangle.
    /// Held members are left where they are.
    pub fn brick_place_regions(&mut self, group: GroupId) -> DplResult<bool> {
        let rects = self.design.group(group).rects.clone();
        if rects.is_empty() {
            self.strand_members(group);
            return Ok(false);
        }
        let region_of = |cell: &Cell| rects[cell.region.unwrap_or(0).min(rects.len() - 1)];

        let mut members: Vec<CellId> = self
            .design
            .group(group)
            .cells
            .iter()
            .copied()
            .filter(|&id| {
                let cell = self.design.cell(id);
                !cell.fixed && !cell.placed && !cell.hold
            })
            .collect();
        members.sort_by_key(|&id| {
            let cell = self.design.cell(id);
            (rect_dist(cell, &region_of(cell)), id)
        });

        let mut all_placed = true;
        for id in members {
            let cell = self.design.cell(id);
            let corner = rect_corner(cell, &region_of(cell));
            all_placed &= self.brick_move(id, corner)?;
        }
        Ok(all_placed)
    }

    fn brick_move(&mut self, id: CellId, corner: Point) -> DplResult<bool> {
        let target = self.legal_grid_pt_at(id, corner);
        if self.map_move_to(id, target)? {
            return Ok(true);
        }
        self.warn(
            203,
            id,
            format!(
                "brick placement could not place '{}' in group '{}'",
                self.design.cell_name(id),
                self.design
                    .cell(id)
                    .group
                    .map_or("", |g| self.design.group_name(g)),
            ),
        );
        self.failures.insert(id);
        Ok(false)
    }

    /// Reports every unplaced member of a group that has no region to
    /// place it in.
    fn strand_members(&mut self, group: GroupId) {
        let stranded: Vec<CellId> = self
            .design
            .group(group)
            .cells
            .iter()
            .copied()
            .filter(|&id| {
                let cell = self.design.cell(id);
                !cell.fixed && !cell.placed
            })
            .collect();
        for id in stranded {
            self.warn(
                203,
                id,
                format!(
                    "group '{}' has no region to place '{}' in",
                    self.design.group_name(group),
                    self.design.cell_name(id),
                ),
            );
            self.failures.insert(id);
        }
    }

    fn group_ids(&self) -> Vec<GroupId> {
        self.design.groups.iter().map(|g| g.id).collect()
    }
}

/// Rectilinear distance from a point to a rectangle; zero inside it.
fn dist_to_rect(rect: &Rect, pt: Point) -> i64 {
    let dx = (rect.xl - pt.x).max(pt.x - rect.xh).max(0);
    let dy = (rect.yl - pt.y).max(pt.y - rect.yh).max(0);
    dx + dy
}

/// Closest origin to the cell's original one that keeps its footprint
/// inside `rect`, or at the rectangle's low corner if it is too small.
fn nearest_pt_inside(cell: &Cell, rect: &Rect) -> Point {
    let x_max = (rect.xh - cell.width).max(rect.xl);
    let y_max = (rect.yh - cell.height).max(rect.yl);
    Point::new(
        cell.init_x.clamp(rect.xl, x_max),
        cell.init_y.clamp(rect.yl, y_max),
    )
}

/// Closest origin to the cell's original one whose footprint clears all of
/// `rects`. Each rectangle offers four push-out candidates; when none
/// clears everything the cheapest single push-out is used.
fn nearest_pt_outside(cell: &Cell, rects: &[Rect]) -> Point {
    let origin = Point::new(cell.init_x, cell.init_y);
    let candidates: Vec<Point> = rects
        .iter()
        .flat_map(|r| {
            [
                Point::new(r.xl - cell.width, origin.y),
                Point::new(r.xh, origin.y),
                Point::new(origin.x, r.yl - cell.height),
                Point::new(origin.x, r.yh),
            ]
        })
        .collect();
    let clears = |pt: &Point| {
        let footprint = Rect::from_origin(*pt, cell.width, cell.height);
        rects.iter().all(|r| !r.overlaps(&footprint))
    };
    candidates
        .iter()
        .copied()
        .filter(clears)
        .min_by_key(|pt| pt.manhattan(origin))
        .or_else(|| candidates.iter().copied().min_by_key(|pt| pt.manhattan(origin)))
        .unwrap_or(origin)
}

/// Corner of `rect` on the side of its center where the cell started,
/// expressed as a cell origin that keeps the footprint inside.
fn rect_corner(cell: &Cell, rect: &Rect) -> Point {
    let center = rect.center();
    let x = if cell.init_x + cell.width / 2 > center.x {
        (rect.xh - cell.width).max(rect.xl)
    } else {
        rect.xl
    };
    let y = if cell.init_y + cell.height / 2 > center.y {
        (rect.yh - cell.height).max(rect.yl)
    } else {
        rect.yl
    };
    Point::new(x, y)
}

/// Distance from the cell's original origin to its [`rect_corner`].
fn rect_dist(cell: &Cell, rect: &Rect) -> i64 {
    rect_corner(cell, rect).manhattan(Point::new(cell.init_x, cell.init_y))
}
