//! Plain serializable records for moving designs in and out of the legalizer.
//!
//! Records refer to each other by name. [`crate::convert`] turns a
//! [`DesignRecord`] into an arena [`Design`](crate::data::Design) and the
//! legalized cells back into [`PlacementRecord`]s.

use crate::data::{CellKind, Orientation, PowerPin};
use dpl_common::Rect;
use serde::{Deserialize, Serialize};

/// A whole design as read from a placement database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignRecord {
    /// Core area in DBU.
    pub core: Rect,
    /// Placement rows.
    #[serde(default)]
    pub rows: Vec<RowRecord>,
    /// Cell instances.
    #[serde(default)]
    pub cells: Vec<CellRecord>,
    /// Placement groups and their regions.
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    /// Nets, used only for wirelength statistics.
    #[serde(default)]
    pub nets: Vec<NetRecord>,
}

/// A placement row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowRecord {
    /// Row name, used in diagnostics.
    #[serde(default)]
    pub name: String,
    /// Lower-left x in DBU.
    pub x: i64,
    /// Lower-left y in DBU.
    pub y: i64,
    /// Number of sites.
    pub site_count: i64,
    /// Row orientation.
    #[serde(default)]
    pub orient: Orientation,
}

/// Placement status of an instance in the input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    /// No position assigned; the recorded coordinates are still the target.
    Unplaced,
    /// Globally placed, free to move.
    #[default]
    Placed,
    /// Locked in place; an obstacle for every other cell.
    Fixed,
}

/// A cell instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellRecord {
    /// Instance name.
    pub name: String,
    /// Width in DBU, after orientation.
    pub width: i64,
    /// Height in DBU, after orientation.
    pub height: i64,
    /// Origin x in DBU.
    pub x: i64,
    /// Origin y in DBU.
    pub y: i64,
    /// Orientation in the input.
    #[serde(default)]
    pub orient: Orientation,
    /// Standard cell or block.
    #[serde(default)]
    pub kind: CellKind,
    /// Placement status.
    #[serde(default)]
    pub status: CellStatus,
    /// Name of the group this instance belongs to.
    #[serde(default)]
    pub group: Option<String>,
    /// Supply pins with their offset from the cell bottom in R0.
    #[serde(default)]
    pub power_pins: Vec<PowerPin>,
}

/// A placement group and its region rectangles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group name.
    pub name: String,
    /// Region rectangles in DBU.
    #[serde(default)]
    pub rects: Vec<Rect>,
}

/// A net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetRecord {
    /// Net name.
    pub name: String,
    /// Connected pins.
    #[serde(default)]
    pub pins: Vec<PinRecord>,
}

/// A net pin, located relative to its cell's origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRecord {
    /// Instance name.
    pub cell: String,
    /// Horizontal offset in DBU.
    #[serde(default)]
    pub dx: i64,
    /// Vertical offset in DBU.
    #[serde(default)]
    pub dy: i64,
}

/// The legalized position of one movable instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Instance name.
    pub name: String,
    /// Origin x in DBU.
    pub x: i64,
    /// Origin y in DBU.
    pub y: i64,
    /// Final orientation.
    pub orient: Orientation,
    /// `false` if the legalizer could not find a legal site.
    pub placed: bool,
}
