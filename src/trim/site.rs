//! Per-column features: character tally, site classification and gappyness.
//!
//! All functions here are pure and work on a single column, so they can be
//! evaluated for different columns in any order (or in parallel).

use std::collections::HashMap;
use std::fmt;

use crate::model::SequenceType;

/// Occurrence count of each symbol in one column.
///
/// No symbol is excluded or normalized: `a` and `A` are distinct, and gap
/// symbols are counted like residues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterTally {
    counts: HashMap<u8, usize>,
}

impl CharacterTally {
    /// Counts the symbols of a column.
    pub fn from_column<I>(column: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut counts = HashMap::new();
        for symbol in column {
            *counts.entry(symbol).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Number of times `symbol` occurs.
    pub fn count(&self, symbol: u8) -> usize {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Number of distinct symbols.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts, i.e. the number of entries in the column.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of distinct symbols seen in at least two entries.
    fn shared_symbols(&self) -> usize {
        self.counts.values().filter(|&&c| c >= 2).count()
    }
}

/// Phylogenetic classification of a column.
///
/// The two flags cannot both be set: a constant column has a single distinct
/// symbol, a parsimony-informative one has at least two shared symbols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteClassification {
    pub parsimony_informative: bool,
    pub constant_site: bool,
    /// Distinct symbols shared by at least two entries.
    shared_symbols: usize,
    distinct_symbols: usize,
}

impl SiteClassification {
    /// Builds a classification from the two flags only.
    ///
    /// Columns built this way that are neither informative nor constant
    /// fall into [`SiteCategory::Other`].
    pub const fn new(parsimony_informative: bool, constant_site: bool) -> Self {
        Self {
            parsimony_informative,
            constant_site,
            shared_symbols: 0,
            distinct_symbols: 0,
        }
    }

    /// True when the column is parsimony-informative or constant.
    pub fn is_informative_or_constant(&self) -> bool {
        self.parsimony_informative || self.constant_site
    }

    /// Reporting category of the column.
    pub fn category(&self) -> SiteCategory {
        if self.parsimony_informative {
            SiteCategory::ParsimonyInformative
        } else if self.constant_site {
            SiteCategory::Constant
        } else if self.shared_symbols == 1 && self.distinct_symbols > 1 {
            SiteCategory::Singleton
        } else {
            SiteCategory::Other
        }
    }
}

/// Classifies a column from its tally.
pub fn classify(tally: &CharacterTally) -> SiteClassification {
    let shared_symbols = tally.shared_symbols();
    let distinct_symbols = tally.distinct();

    let parsimony_informative = shared_symbols >= 2;
    let constant_site = distinct_symbols == 1 && shared_symbols == 1;

    SiteClassification {
        parsimony_informative,
        constant_site,
        shared_symbols,
        distinct_symbols,
    }
}

/// Category used for counters and decision log labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiteCategory {
    ParsimonyInformative,
    Constant,
    /// Variable, but only one symbol is shared by two or more entries
    Singleton,
    Other,
}

impl SiteCategory {
    pub const ALL: [SiteCategory; 4] = [
        SiteCategory::ParsimonyInformative,
        SiteCategory::Constant,
        SiteCategory::Singleton,
        SiteCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SiteCategory::ParsimonyInformative => "parsimony-informative",
            SiteCategory::Constant => "constant",
            SiteCategory::Singleton => "singleton",
            SiteCategory::Other => "other",
        }
    }
}

impl fmt::Display for SiteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set of symbols counted as gaps when computing gappyness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapSymbols {
    table: [bool; 256],
}

impl GapSymbols {
    /// Default amino-acid gap symbols.
    pub const AMINO_ACID: &'static [u8] = b"-?*Xx";
    /// Default nucleotide gap symbols (amino-acid set plus `N`/`n`).
    pub const NUCLEOTIDE: &'static [u8] = b"-?*XxNn";

    pub fn new(symbols: &[u8]) -> Self {
        let mut table = [false; 256];
        for &s in symbols {
            table[s as usize] = true;
        }
        Self { table }
    }

    /// Default gap symbols for a sequence type.
    pub fn for_sequence_type(sequence_type: SequenceType) -> Self {
        match sequence_type {
            SequenceType::Nucleotide => Self::new(Self::NUCLEOTIDE),
            SequenceType::AminoAcid => Self::new(Self::AMINO_ACID),
        }
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.table[symbol as usize]
    }

    /// The symbols of the set, in byte order.
    pub fn symbols(&self) -> Vec<u8> {
        (0..=255u8).filter(|&b| self.contains(b)).collect()
    }
}

/// Fraction of entries in a column whose symbol is a gap symbol.
///
/// Returns 0.0 for an empty column.
pub fn gappyness<I>(column: I, gaps: &GapSymbols) -> f64
where
    I: IntoIterator<Item = u8>,
{
    let mut total = 0usize;
    let mut gapped = 0usize;
    for symbol in column {
        total += 1;
        if gaps.contains(symbol) {
            gapped += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        gapped as f64 / total as f64
    }
}

const SCALE: f64 = 10_000.0;

/// Rounds a non-negative value to four decimal places.
///
/// Rounding follows the exact binary value, with exact ties going to even
/// (`0.03125` gives `0.0312`, `0.40005` gives `0.4001` because it is stored
/// slightly above the tie).
pub(crate) fn round4(value: f64) -> f64 {
    let scaled = value * SCALE;
    // Exact error of the multiplication above
    let residual = value.mul_add(SCALE, -scaled);
    let floor = scaled.floor();

    let rounded = if scaled - floor == 0.5 {
        if residual > 0.0 {
            floor + 1.0
        } else if residual < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / SCALE
}
