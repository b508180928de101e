//! Core legalizer data structures.
//!
//! Defines the design arena the legalizer mutates: cells (with current and
//! original positions), rows, placement groups with their region rectangles,
//! and nets (kept only for wirelength statistics). Pixels never own cells;
//! they refer to them by [`CellId`], and groups list their members by id.

use crate::ids::{CellId, GroupId, NetId};
use dpl_common::{Ident, Interner, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placement orientation of a cell or row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Unrotated.
    #[default]
    R0,
    /// Mirrored about the x axis (flipped vertically).
    MX,
    /// Mirrored about the y axis.
    MY,
    /// Rotated by 180 degrees.
    R180,
}

impl Orientation {
    /// Returns the orientation mirrored about the x axis.
    pub fn flipped_vertically(self) -> Self {
        match self {
            Orientation::R0 => Orientation::MX,
            Orientation::MX => Orientation::R0,
            Orientation::MY => Orientation::R180,
            Orientation::R180 => Orientation::MY,
        }
    }

    /// Returns `true` if the cell's top and bottom edges are swapped.
    pub fn is_vertically_flipped(self) -> bool {
        matches!(self, Orientation::MX | Orientation::R180)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Orientation::R0 => "R0",
            Orientation::MX => "MX",
            Orientation::MY => "MY",
            Orientation::R180 => "R180",
        };
        write!(f, "{name}")
    }
}

/// Supply net running along a row or cell edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Power {
    /// The power net.
    Vdd,
    /// The ground net.
    Vss,
    /// No recognizable supply pin; never conflicts with a rail.
    #[default]
    Unknown,
}

impl Power {
    /// Returns the other supply, or `Unknown` for `Unknown`.
    pub fn opposite(self) -> Self {
        match self {
            Power::Vdd => Power::Vss,
            Power::Vss => Power::Vdd,
            Power::Unknown => Power::Unknown,
        }
    }
}

/// Distinguishes standard cells from macros and placement blockages.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum CellKind {
    /// A row-based standard cell.
    #[default]
    Standard,
    /// A macro or obstacle. Overlapping fixed blocks are tolerated.
    Block,
}

/// A supply pin of a cell, as seen in R0 orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerPin {
    /// Name of the net the pin connects to.
    pub net: String,
    /// Vertical offset of the pin center above the cell origin.
    pub y: i64,
}

/// A placeable instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// Arena index of this cell.
    pub id: CellId,
    /// Interned instance name.
    pub name: Ident,
    /// Standard cell or block.
    pub kind: CellKind,
    /// Width in DBU, after any orientation swap.
    pub width: i64,
    /// Height in DBU, after any orientation swap.
    pub height: i64,
    /// Current origin x.
    pub x: i64,
    /// Current origin y.
    pub y: i64,
    /// Current orientation.
    pub orient: Orientation,
    /// Fixed cells are obstacles and never move.
    pub fixed: bool,
    /// Set while the cell occupies grid pixels.
    pub placed: bool,
    /// Excludes the cell from refinement and swaps.
    pub hold: bool,
    /// Placement group the cell is confined to.
    pub group: Option<GroupId>,
    /// Index of the assigned rectangle within the cell's group.
    pub region: Option<usize>,
    /// Origin x before legalization.
    pub init_x: i64,
    /// Origin y before legalization.
    pub init_y: i64,
    /// Supply net on the cell's top edge in R0.
    pub top_power: Power,
    /// Supply pins used to derive [`Cell::top_power`].
    pub power_pins: Vec<PowerPin>,
}

impl Cell {
    /// Creates a movable, unplaced standard cell whose original position is
    /// `(x, y)`.
    pub fn new(name: Ident, width: i64, height: i64, x: i64, y: i64) -> Self {
        Self {
            id: CellId::from_raw(0),
            name,
            kind: CellKind::Standard,
            width,
            height,
            x,
            y,
            orient: Orientation::R0,
            fixed: false,
            placed: false,
            hold: false,
            group: None,
            region: None,
            init_x: x,
            init_y: y,
            top_power: Power::Unknown,
            power_pins: Vec::new(),
        }
    }

    /// Marks the cell as a fixed obstacle of the given kind.
    pub fn into_fixed(mut self, kind: CellKind) -> Self {
        self.fixed = true;
        self.kind = kind;
        self
    }

    /// Area in square DBU.
    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    /// Footprint at the current position.
    pub fn rect(&self) -> Rect {
        Rect::from_origin(Point::new(self.x, self.y), self.width, self.height)
    }

    /// Footprint at the original position.
    pub fn init_rect(&self) -> Rect {
        Rect::from_origin(Point::new(self.init_x, self.init_y), self.width, self.height)
    }

    /// Rectilinear distance between the current and original origins.
    pub fn displacement(&self) -> i64 {
        Point::new(self.x, self.y).manhattan(Point::new(self.init_x, self.init_y))
    }

    /// Returns `true` if the cell belongs to a placement group.
    pub fn in_group(&self) -> bool {
        self.group.is_some()
    }

    /// Returns `true` for blocks.
    pub fn is_block(&self) -> bool {
        self.kind == CellKind::Block
    }

    /// Returns `true` if the cell spans more than one row.
    pub fn is_multi_row(&self, row_height: i64) -> bool {
        self.height > row_height
    }
}

/// A placement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Lower-left corner in DBU.
    pub origin: Point,
    /// Number of sites in the row.
    pub site_count: i64,
    /// Row orientation as declared upstream.
    pub orient: Orientation,
}

/// A named placement group (fence region).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Arena index of this group.
    pub id: GroupId,
    /// Interned group name.
    pub name: Ident,
    /// Member cells.
    pub cells: Vec<CellId>,
    /// Region rectangles; members must end inside their union.
    pub rects: Vec<Rect>,
    /// Member area over owned site area, filled in before group placement.
    pub util: f64,
}

impl Group {
    /// Creates an empty group with the given regions.
    pub fn new(name: Ident, rects: Vec<Rect>) -> Self {
        Self {
            id: GroupId::from_raw(0),
            name,
            cells: Vec::new(),
            rects,
            util: 0.0,
        }
    }

    /// Bounding box of all region rectangles.
    pub fn bbox(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|a, b| a.merge(&b))
    }
}

/// A pin of a net: an offset from a cell origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetPin {
    /// Cell carrying the pin.
    pub cell: CellId,
    /// Horizontal offset from the cell origin.
    pub dx: i64,
    /// Vertical offset from the cell origin.
    pub dy: i64,
}

/// A signal net, used for half-perimeter wirelength statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// Arena index of this net.
    pub id: NetId,
    /// Interned net name.
    pub name: Ident,
    /// Connected pins.
    pub pins: Vec<NetPin>,
}

/// The design handed to the legalizer.
///
/// Owns every cell, row, group, and net, plus the interner their names live
/// in. Cells, groups, and nets are addressed by their ids.
#[derive(Debug, Serialize, Deserialize)]
pub struct Design {
    /// Core area in DBU.
    pub core: Rect,
    /// Placement rows.
    pub rows: Vec<Row>,
    /// All cells, indexed by [`CellId`].
    pub cells: Vec<Cell>,
    /// All groups, indexed by [`GroupId`].
    pub groups: Vec<Group>,
    /// All nets, indexed by [`NetId`].
    pub nets: Vec<Net>,
    /// Names of cells, groups, and nets.
    pub names: Interner,
    /// Auxiliary index: cell name to ID (rebuilt on deserialization).
    #[serde(skip)]
    cell_by_name: HashMap<Ident, CellId>,
}

impl Design {
    /// Creates an empty design with the given core area.
    pub fn new(core: Rect) -> Self {
        Self {
            core,
            rows: Vec::new(),
            cells: Vec::new(),
            groups: Vec::new(),
            nets: Vec::new(),
            names: Interner::new(),
            cell_by_name: HashMap::new(),
        }
    }

    /// Interns a name in this design's interner.
    pub fn intern(&self, name: &str) -> Ident {
        self.names.get_or_intern(name)
    }

    /// Adds a row.
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Adds a cell and returns its ID.
    pub fn add_cell(&mut self, mut cell: Cell) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        cell.id = id;
        self.cell_by_name.insert(cell.name, id);
        self.cells.push(cell);
        id
    }

    /// Adds a group and returns its ID.
    ///
    /// Every cell listed in `group.cells` is attached to the new group.
    pub fn add_group(&mut self, mut group: Group) -> GroupId {
        let id = GroupId::from_raw(self.groups.len() as u32);
        group.id = id;
        for &cell in &group.cells {
            self.cells[cell.index()].group = Some(id);
        }
        self.groups.push(group);
        id
    }

    /// Adds a net and returns its ID.
    pub fn add_net(&mut self, mut net: Net) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        net.id = id;
        self.nets.push(net);
        id
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    /// Returns a mutable reference to the cell with the given ID.
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    /// Returns the group with the given ID.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.index()]
    }

    /// Returns a mutable reference to the group with the given ID.
    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id.index()]
    }

    /// Looks up a cell by instance name.
    pub fn find_cell(&self, name: &str) -> Option<CellId> {
        let ident = self.names.get(name)?;
        self.cell_by_name.get(&ident).copied()
    }

    /// Resolves the instance name of a cell.
    pub fn cell_name(&self, id: CellId) -> &str {
        self.names.resolve(self.cell(id).name)
    }

    /// Resolves the name of a group.
    pub fn group_name(&self, id: GroupId) -> &str {
        self.names.resolve(self.group(id).name)
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns the number of fixed cells.
    pub fn fixed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.fixed).count()
    }

    /// Iterates over the IDs of all movable cells.
    pub fn movable_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().filter(|c| !c.fixed).map(|c| c.id)
    }

    /// Rebuilds auxiliary indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.cell_by_name.clear();
        for cell in &self.cells {
            self.cell_by_name.insert(cell.name, cell.id);
        }
    }
}
