//! Configuration types deserialized from `dpl.toml`.

use serde::Deserialize;

/// The top-level legalizer configuration.
///
/// Only `[technology]` is required; every other table falls back to the
/// defaults documented on its fields.
#[derive(Debug, Clone, Deserialize)]
pub struct LegalizerConfig {
    /// Site and row dimensions.
    pub technology: TechnologyConfig,
    /// Extra sites reserved on either side of every standard cell.
    #[serde(default)]
    pub padding: PaddingConfig,
    /// Supply net names used to derive cell rail orientation.
    #[serde(default)]
    pub power: PowerConfig,
    /// Nearest-site search window.
    #[serde(default)]
    pub search: SearchConfig,
    /// Displacement refinement.
    #[serde(default)]
    pub refine: RefineConfig,
    /// Random pairwise swap pass over group cells.
    #[serde(default)]
    pub anneal: AnnealConfig,
    /// Neighborhood rip-up for stuck cells.
    #[serde(default)]
    pub shift: ShiftConfig,
}

impl LegalizerConfig {
    /// Creates a configuration with default settings for the given grid.
    pub fn new(site_width: i64, row_height: i64) -> Self {
        Self {
            technology: TechnologyConfig {
                site_width,
                row_height,
            },
            padding: PaddingConfig::default(),
            power: PowerConfig::default(),
            search: SearchConfig::default(),
            refine: RefineConfig::default(),
            anneal: AnnealConfig::default(),
            shift: ShiftConfig::default(),
        }
    }
}

/// Placement grid pitch, in DBU.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct TechnologyConfig {
    /// Width of one placement site.
    pub site_width: i64,
    /// Height of one placement row.
    pub row_height: i64,
}

/// Cell padding, in sites.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaddingConfig {
    /// Sites kept free to the left of each standard cell.
    pub left: u32,
    /// Sites kept free to the right of each standard cell.
    pub right: u32,
}

/// Names of the supply nets.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PowerConfig {
    /// Power net name (default `VDD`).
    pub power_net: String,
    /// Ground net name (default `VSS`).
    pub ground_net: String,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            power_net: "VDD".to_string(),
            ground_net: "VSS".to_string(),
        }
    }
}

/// Diamond search limits.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Rows searched above and below the target (default 100).
    pub window_rows: u32,
    /// Sites searched left and right of the target (default 300).
    pub window_sites: u32,
    /// Width of one bin-search scan window, in sites (default 10).
    pub bin_width: u32,
    /// Design utilization above which the window doubles (default 0.6).
    pub high_utilization: f64,
    /// Reject slots that leave a single empty site next to a neighbor.
    pub disallow_one_site_gaps: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_rows: 100,
            window_sites: 300,
            bin_width: 10,
            high_utilization: 0.6,
            disallow_one_site_gaps: false,
        }
    }
}

/// Displacement refinement settings.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefineConfig {
    /// Run the final refinement pass over free cells (default true).
    pub enabled: bool,
    /// Fraction of free cells, by descending displacement, to re-search (default 0.02).
    pub percent: f64,
    /// Fraction of each group's cells to re-search per pass (default 0.05).
    pub group_percent: f64,
    /// Reject refined positions farther than this many rows from the target.
    pub max_displacement_rows: Option<u32>,
    /// Maximum refine + swap passes per group (default 3).
    pub group_passes: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            percent: 0.02,
            group_percent: 0.05,
            max_displacement_rows: None,
            group_passes: 3,
        }
    }
}

/// Random pairwise swap settings.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnnealConfig {
    /// PRNG seed (default 777).
    pub seed: u64,
    /// Swap attempts per group cell (default 100).
    pub swaps_per_cell: u32,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            seed: 777,
            swaps_per_cell: 100,
        }
    }
}

/// Shift move neighborhood.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShiftConfig {
    /// Rows ripped up above and below a stuck cell; the horizontal margin is
    /// this many cell widths (default 3).
    pub boundary_margin: u32,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self { boundary_margin: 3 }
    }
}
