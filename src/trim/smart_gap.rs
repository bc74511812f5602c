//! Data-driven gap threshold for the smart-gap family of modes.
//!
//! Column gappyness values (rounded to four decimals) are binned and the bins
//! are walked from the gappiest down. Among the bins covering the first half
//! of the columns, the one holding the most columns marks where the
//! distribution jumps, and its gappyness becomes the threshold.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::model::Alignment;

use super::site::{gappyness, round4, GapSymbols};

const SCALE: f64 = 10_000.0;

/// Threshold used when the distribution has no usable jump.
pub const NO_JUMP_THRESHOLD: f64 = 1.0;

/// Histogram of rounded gappyness, keyed in units of 1e-4.
fn distribution(values: &[f64]) -> BTreeMap<u32, usize> {
    let mut bins = BTreeMap::new();
    for &g in values {
        *bins.entry((round4(g) * SCALE).round() as u32).or_insert(0) += 1;
    }
    bins
}

/// Derives the threshold from per-column gappyness values.
pub fn threshold_from_gappyness(values: &[f64]) -> f64 {
    let bins = distribution(values);
    if bins.len() <= 1 {
        return NO_JUMP_THRESHOLD;
    }

    let total = values.len() as f64;
    let mut covered = 0.0;
    let mut best: Option<(u32, usize)> = None;

    // Ungapped columns never define the threshold.
    for (&key, &count) in bins.iter().rev().filter(|(key, _)| **key > 0) {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
        covered += count as f64 / total;
        if covered >= 0.5 {
            break;
        }
    }

    best.map_or(NO_JUMP_THRESHOLD, |(key, _)| key as f64 / SCALE)
}

/// Derives the smart-gap threshold of an alignment.
pub fn threshold(alignment: &Alignment, gaps: &GapSymbols) -> f64 {
    let values: Vec<f64> = (0..alignment.alignment_length())
        .into_par_iter()
        .map(|pos| gappyness(alignment.column(pos), gaps))
        .collect();

    let t = threshold_from_gappyness(&values);
    log::debug!("Smart-gap threshold from {} columns: {}", values.len(), t);
    t
}
