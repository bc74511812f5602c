//! Column trimming engine.
//!
//! A run goes through two phases:
//! 1. every column is tallied, classified and measured for gappyness
//!    (independent per column, computed in parallel);
//! 2. a single sequential pass decides keep/trim for each column in position
//!    order and writes it into the keep or trim output.
//!
//! Submodules:
//! - `site`: character tally, site classification, gappyness
//! - `mode`: trimming modes and the decision function
//! - `accumulator`: output arenas, counters, per-column processing
//! - `decision_log`: per-column decision log sink
//! - `smart_gap`: data-driven threshold for the smart-gap modes

pub mod accumulator;
pub mod decision_log;
pub mod mode;
pub mod site;
pub mod smart_gap;

use std::fmt;

use rayon::prelude::*;
use thiserror::Error;

use crate::model::{Alignment, AlignmentError};

pub use accumulator::{apply_decision, process_column, ClassificationCounters, ColumnFeatures, TrimOutput};
pub use decision_log::{Decision, DecisionLog, Recorder, WriterLog};
pub use mode::{decide, TrimmingMode};
pub use site::{classify, gappyness, CharacterTally, GapSymbols, SiteCategory, SiteClassification};

/// Errors raised by the trimming engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrimError {
    #[error(transparent)]
    InvalidAlignment(#[from] AlignmentError),

    #[error(
        "Unknown trimming mode '{0}' (expected one of: gappy, smart-gap, kpi, kpi-gappy, \
         kpi-smart-gap, kpic, kpic-gappy, kpic-smart-gap)"
    )]
    UnknownMode(String),

    #[error("Invalid gap threshold {0}: must be between 0 and 1")]
    InvalidThreshold(f64),
}

/// Validated mode and gap threshold of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimParams {
    mode: TrimmingMode,
    threshold: f64,
}

impl TrimParams {
    /// Checks the threshold lies in `[0, 1]`. Out-of-range values are
    /// rejected, not clamped.
    pub fn new(mode: TrimmingMode, threshold: f64) -> Result<Self, TrimError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(TrimError::InvalidThreshold(threshold));
        }
        Ok(Self { mode, threshold })
    }

    pub fn mode(&self) -> TrimmingMode {
        self.mode
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Column counts of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimSummary {
    pub mode: TrimmingMode,
    pub threshold: f64,
    pub columns: usize,
    pub kept: usize,
    pub trimmed: usize,
    pub counters: ClassificationCounters,
}

impl TrimSummary {
    /// Share of input columns that were trimmed, in percent.
    pub fn percent_trimmed(&self) -> f64 {
        if self.columns == 0 {
            0.0
        } else {
            self.trimmed as f64 * 100.0 / self.columns as f64
        }
    }
}

impl fmt::Display for TrimSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Gap threshold: {}", self.threshold)?;
        writeln!(f, "Number of columns kept: {}", self.kept)?;
        writeln!(f, "Number of columns trimmed: {}", self.trimmed)?;
        writeln!(f, "Percentage of alignment trimmed: {:.3}%", self.percent_trimmed())?;
        write!(f, "Kept columns by category:")?;
        for (category, count) in self.counters.iter() {
            write!(f, "\n  {}: {}", category, count)?;
        }
        Ok(())
    }
}

/// Result of [`Trimmer::run`].
#[derive(Debug, Clone)]
pub struct TrimResult {
    pub kept: Alignment,
    /// Present when the run was asked for the complement
    pub trimmed: Option<Alignment>,
    pub summary: TrimSummary,
    /// Non-fatal problems, e.g. a failing decision log
    pub warnings: Vec<String>,
}

/// Runs the trimming engine over whole alignments.
#[derive(Debug, Clone)]
pub struct Trimmer {
    params: TrimParams,
    gaps: GapSymbols,
    complement: bool,
}

impl Trimmer {
    pub fn new(params: TrimParams, gaps: GapSymbols) -> Self {
        Self {
            params,
            gaps,
            complement: false,
        }
    }

    /// Also collect the trimmed columns into a second alignment.
    pub fn with_complement(mut self, complement: bool) -> Self {
        self.complement = complement;
        self
    }

    /// Trims `alignment`, optionally logging every decision to `log`.
    pub fn run(
        &self,
        alignment: &Alignment,
        log: Option<&mut dyn DecisionLog>,
    ) -> Result<TrimResult, TrimError> {
        let mut output = TrimOutput::for_alignment(alignment, self.complement)?;
        let columns = alignment.alignment_length();

        log::debug!(
            "Classifying {} columns across {} sequences",
            columns,
            alignment.sequence_count()
        );
        let features: Vec<ColumnFeatures> = (0..columns)
            .into_par_iter()
            .map(|pos| ColumnFeatures::compute(alignment, pos, &self.gaps))
            .collect();

        let mut recorder = Recorder::new(log);
        for (pos, f) in features.iter().enumerate() {
            apply_decision(alignment, pos, f, &self.params, &mut output, &mut recorder);
        }
        let kept = output.keep.column_count();

        let warnings = recorder.into_warning().into_iter().collect();
        let summary = TrimSummary {
            mode: self.params.mode(),
            threshold: self.params.threshold(),
            columns,
            kept,
            trimmed: columns - kept,
            counters: output.counters,
        };

        Ok(TrimResult {
            kept: output.keep.finish(),
            trimmed: output.trim.map(|t| t.finish()),
            summary,
            warnings,
        })
    }
}
