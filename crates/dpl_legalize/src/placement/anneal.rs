//! Random pairwise swap sampling within a group.
//!
//! Despite the traditional name this is not simulated annealing: there is
//! no temperature and no uphill acceptance. A fixed number of random member
//! pairs is drawn and each pair is swapped only if the swap reduces the
//! pair's combined displacement.

use super::Legalizer;
use crate::ids::{CellId, GroupId};
use dpl_common::DplResult;
use rand::Rng;

impl<'a> Legalizer<'a> {
    /// Draws `anneal.swaps_per_cell` random member pairs per group member
    /// and commits each improving swap. Returns the number of swaps made.
    ///
    /// The caller owns the generator, so a seeded generator makes the
    /// sequence of proposals reproducible.
    pub fn anneal(&mut self, group: GroupId, rng: &mut impl Rng) -> DplResult<usize> {
        let members = self.design.group(group).cells.clone();
        if members.len() < 2 {
            return Ok(0);
        }
        let iterations = members.len() * self.config.anneal.swaps_per_cell as usize;
        let mut swapped = 0;
        for _ in 0..iterations {
            let (a, b) = select_swap_pair(rng, &members);
            if self.swap_cells(a, b)? {
                swapped += 1;
            }
        }
        tracing::debug!(group = %group, iterations, swapped, "random swaps");
        Ok(swapped)
    }
}

/// Picks two members uniformly at random. They may be the same cell, in
/// which case the swap is simply rejected.
fn select_swap_pair(rng: &mut impl Rng, members: &[CellId]) -> (CellId, CellId) {
    let a = rng.gen_range(0..members.len());
    let b = rng.gen_range(0..members.len());
    (members[a], members[b])
}
