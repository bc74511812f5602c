//! Accumulation of kept and trimmed columns.
//!
//! Output alignments are built in [`ColumnArena`]s: one preallocated row per
//! input sequence, written by absolute column position. Only positions that
//! were written end up in the finished alignment, in increasing order.

use std::collections::BTreeMap;

use crate::model::{Alignment, Sequence, SequenceType};

use super::decision_log::{Decision, Recorder};
use super::mode::decide;
use super::site::{classify, gappyness, CharacterTally, GapSymbols, SiteCategory, SiteClassification};
use super::{TrimError, TrimParams};

/// Features of one column, computed independently of every other column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnFeatures {
    pub classification: SiteClassification,
    pub gappyness: f64,
}

impl ColumnFeatures {
    /// Tallies, classifies and measures the column at `position`.
    pub fn compute(alignment: &Alignment, position: usize, gaps: &GapSymbols) -> Self {
        let tally = CharacterTally::from_column(alignment.column(position));
        Self {
            classification: classify(&tally),
            gappyness: gappyness(alignment.column(position), gaps),
        }
    }
}

/// Output alignment under construction.
#[derive(Debug, Clone)]
pub struct ColumnArena {
    ids: Vec<String>,
    rows: Vec<Vec<u8>>,
    filled: Vec<bool>,
    sequence_type: SequenceType,
}

impl ColumnArena {
    /// Creates an empty arena shaped after `alignment`.
    pub fn for_alignment(alignment: &Alignment) -> Self {
        let length = alignment.alignment_length();
        Self {
            ids: alignment.sequences.iter().map(|s| s.id.clone()).collect(),
            rows: vec![vec![0u8; length]; alignment.sequence_count()],
            filled: vec![false; length],
            sequence_type: alignment.sequence_type,
        }
    }

    /// Copies the column at `position` from `alignment` into the arena.
    ///
    /// # Panics
    ///
    /// Panics if the arena was not built from an alignment with the same
    /// sequences and length.
    pub fn write_column(&mut self, alignment: &Alignment, position: usize) {
        assert_eq!(
            self.rows.len(),
            alignment.sequence_count(),
            "output alignment does not match the input sequences"
        );
        for ((row, id), seq) in self.rows.iter_mut().zip(&self.ids).zip(&alignment.sequences) {
            debug_assert_eq!(id, &seq.id);
            assert_eq!(
                row.len(),
                seq.len(),
                "output alignment does not match the input sequences"
            );
            row[position] = seq.data[position];
        }
        self.filled[position] = true;
    }

    /// Number of columns written so far.
    pub fn column_count(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    /// Builds the final alignment from the written columns.
    pub fn finish(self) -> Alignment {
        let filled = self.filled;
        let sequences = self
            .ids
            .into_iter()
            .zip(self.rows)
            .map(|(id, row)| {
                let data: Vec<u8> = row
                    .into_iter()
                    .zip(&filled)
                    .filter_map(|(b, &f)| f.then_some(b))
                    .collect();
                Sequence::from_bytes(id, data)
            })
            .collect();

        Alignment {
            sequences,
            sequence_type: self.sequence_type,
        }
    }
}

/// Number of kept columns per site category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationCounters {
    counts: BTreeMap<SiteCategory, usize>,
}

impl ClassificationCounters {
    pub fn increment(&mut self, category: SiteCategory) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    pub fn get(&self, category: SiteCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Counts for every category, including zeros, in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (SiteCategory, usize)> + '_ {
        SiteCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Everything a trimming run writes to.
#[derive(Debug, Clone)]
pub struct TrimOutput {
    pub keep: ColumnArena,
    /// Absent when trimmed columns are simply discarded
    pub trim: Option<ColumnArena>,
    pub counters: ClassificationCounters,
}

impl TrimOutput {
    /// Creates the outputs for `alignment`, which must be a valid alignment.
    pub fn for_alignment(alignment: &Alignment, with_trim: bool) -> Result<Self, TrimError> {
        alignment.validate()?;
        Ok(Self {
            keep: ColumnArena::for_alignment(alignment),
            trim: with_trim.then(|| ColumnArena::for_alignment(alignment)),
            counters: ClassificationCounters::default(),
        })
    }
}

/// Routes one column into the keep or trim arena from precomputed features.
pub fn apply_decision(
    alignment: &Alignment,
    position: usize,
    features: &ColumnFeatures,
    params: &TrimParams,
    output: &mut TrimOutput,
    recorder: &mut Recorder<'_>,
) -> Decision {
    let decision = Decision::from_keep(decide(
        params.mode(),
        &features.classification,
        features.gappyness,
        params.threshold(),
    ));
    let category = features.classification.category();

    match decision {
        Decision::Keep => {
            output.keep.write_column(alignment, position);
            output.counters.increment(category);
            recorder.record(position, decision, category, features.gappyness);
        }
        Decision::Trim => {
            if let Some(trim) = output.trim.as_mut() {
                trim.write_column(alignment, position);
                recorder.record(position, decision, category, features.gappyness);
            }
        }
    }
    decision
}

/// Computes the features of one column and routes it.
///
/// Fails with [`TrimError::InvalidAlignment`] when the sequences do not all
/// have the same length.
pub fn process_column(
    alignment: &Alignment,
    position: usize,
    params: &TrimParams,
    gaps: &GapSymbols,
    output: &mut TrimOutput,
    recorder: &mut Recorder<'_>,
) -> Result<Decision, TrimError> {
    alignment.validate()?;
    let features = ColumnFeatures::compute(alignment, position, gaps);
    Ok(apply_decision(alignment, position, &features, params, output, recorder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlignmentError;
    use crate::trim::mode::TrimmingMode;

    fn alignment(rows: &[&str]) -> Alignment {
        Alignment::new(
            rows.iter()
                .enumerate()
                .map(|(i, r)| Sequence::new(format!("{}", i + 1), *r))
                .collect(),
        )
    }

    fn params(mode: TrimmingMode, threshold: f64) -> TrimParams {
        TrimParams::new(mode, threshold).unwrap()
    }

    #[test]
    fn test_constant_column_kept_by_kpic() {
        let aln = alignment(&["A", "A", "A", "A", "A"]);
        let gaps = GapSymbols::new(GapSymbols::NUCLEOTIDE);
        let mut output = TrimOutput::for_alignment(&aln, true).unwrap();
        let mut recorder = Recorder::disabled();

        let decision = process_column(
            &aln,
            0,
            &params(TrimmingMode::Kpic, 0.9),
            &gaps,
            &mut output,
            &mut recorder,
        )
        .unwrap();

        assert_eq!(decision, Decision::Keep);
        assert_eq!(output.counters.get(SiteCategory::Constant), 1);
        assert_eq!(output.keep.column_count(), 1);
        assert_eq!(output.trim.as_ref().unwrap().column_count(), 0);
    }

    #[test]
    fn test_constant_column_trimmed_by_kpi() {
        let aln = alignment(&["A", "A", "A", "A", "A"]);
        let gaps = GapSymbols::new(GapSymbols::NUCLEOTIDE);
        let mut output = TrimOutput::for_alignment(&aln, true).unwrap();
        let mut recorder = Recorder::disabled();

        let decision = process_column(
            &aln,
            0,
            &params(TrimmingMode::Kpi, 0.9),
            &gaps,
            &mut output,
            &mut recorder,
        )
        .unwrap();

        assert_eq!(decision, Decision::Trim);
        assert_eq!(output.counters.total(), 0);
        assert_eq!(output.keep.column_count(), 0);
        assert_eq!(output.trim.as_ref().unwrap().column_count(), 1);
    }

    #[test]
    fn test_gappy_informative_column_trimmed_by_kpi_gappy() {
        // {A:2, T:2, G:1} with gappyness 0.2 supplied directly
        let aln = alignment(&["A", "A", "T", "T", "G"]);
        let features = ColumnFeatures {
            classification: classify(&CharacterTally::from_column(aln.column(0))),
            gappyness: 0.2,
        };
        assert!(features.classification.parsimony_informative);

        let mut output = TrimOutput::for_alignment(&aln, true).unwrap();
        let decision = apply_decision(
            &aln,
            0,
            &features,
            &params(TrimmingMode::KpiGappy, 0.1),
            &mut output,
            &mut Recorder::disabled(),
        );
        assert_eq!(decision, Decision::Trim);
    }

    #[test]
    fn test_smart_gap_boundary() {
        // {A:3, -:2}: gappyness 0.4
        let aln = alignment(&["A", "A", "A", "-", "-"]);
        let gaps = GapSymbols::new(b"-");

        let mut output = TrimOutput::for_alignment(&aln, true).unwrap();
        let decision = process_column(
            &aln,
            0,
            &params(TrimmingMode::SmartGap, 0.4),
            &gaps,
            &mut output,
            &mut Recorder::disabled(),
        )
        .unwrap();
        assert_eq!(decision, Decision::Trim);

        let mut output = TrimOutput::for_alignment(&aln, true).unwrap();
        let decision = process_column(
            &aln,
            0,
            &params(TrimmingMode::SmartGap, 0.4001),
            &gaps,
            &mut output,
            &mut Recorder::disabled(),
        )
        .unwrap();
        assert_eq!(decision, Decision::Keep);
    }

    #[test]
    fn test_columns_partitioned_in_order() {
        let aln = alignment(&["AC-GTA", "AC-GAA", "TC-CAA", "TCAGTA"]);
        let gaps = GapSymbols::new(b"-");
        let p = params(TrimmingMode::Kpic, 0.9);
        let mut output = TrimOutput::for_alignment(&aln, true).unwrap();
        let mut log: Vec<String> = Vec::new();
        let mut recorder = Recorder::new(Some(&mut log));

        for pos in 0..aln.alignment_length() {
            process_column(&aln, pos, &p, &gaps, &mut output, &mut recorder).unwrap();
        }
        drop(recorder);

        let kept = output.keep.finish();
        let trimmed = output.trim.unwrap().finish();

        // col0 {A:2,T:2} pi, col1 constant, col2 {-:3,A:1} singleton,
        // col3 {G:3,C:1} singleton, col4 {T:2,A:2} pi, col5 constant
        assert_eq!(kept.get(0).unwrap().as_bytes(), b"ACTA");
        assert_eq!(kept.get(3).unwrap().as_bytes(), b"TCTA");
        assert_eq!(trimmed.get(0).unwrap().as_bytes(), b"-G");
        assert_eq!(trimmed.get(3).unwrap().as_bytes(), b"AG");
        assert_eq!(
            kept.alignment_length() + trimmed.alignment_length(),
            aln.alignment_length()
        );
        assert_eq!(kept.get(2).unwrap().id, "3");

        assert_eq!(output.counters.get(SiteCategory::ParsimonyInformative), 2);
        assert_eq!(output.counters.get(SiteCategory::Constant), 2);
        assert_eq!(output.counters.get(SiteCategory::Singleton), 0);

        assert_eq!(
            log,
            vec![
                "1 keep parsimony-informative 0.0",
                "2 keep constant 0.0",
                "3 trim singleton 0.75",
                "4 trim singleton 0.0",
                "5 keep parsimony-informative 0.0",
                "6 keep constant 0.0",
            ]
        );
    }

    #[test]
    fn test_trimmed_columns_discarded_without_trim_arena() {
        let aln = alignment(&["AC", "AG", "AT"]);
        let gaps = GapSymbols::new(b"-");
        let mut output = TrimOutput::for_alignment(&aln, false).unwrap();
        let mut log: Vec<String> = Vec::new();
        let mut recorder = Recorder::new(Some(&mut log));

        for pos in 0..2 {
            process_column(&aln, pos, &params(TrimmingMode::Kpic, 0.9), &gaps, &mut output, &mut recorder).unwrap();
        }
        drop(recorder);

        assert!(output.trim.is_none());
        assert_eq!(output.keep.column_count(), 1);
        // Trim decisions are not logged when there is nowhere to put the column
        assert_eq!(log, vec!["1 keep constant 0.0"]);
    }

    #[test]
    fn test_ragged_alignment_is_rejected() {
        let ragged = alignment(&["ACGT", "AC"]);
        let err = TrimOutput::for_alignment(&ragged, true).unwrap_err();
        assert!(matches!(
            err,
            TrimError::InvalidAlignment(AlignmentError::UnequalLengths { ref id, expected: 4, found: 2 }) if id == "2"
        ));

        // Outputs built for a valid alignment, column read from a ragged one
        let valid = alignment(&["ACGT", "ACGT"]);
        let mut output = TrimOutput::for_alignment(&valid, true).unwrap();
        let result = process_column(
            &ragged,
            3,
            &params(TrimmingMode::Gappy, 0.9),
            &GapSymbols::new(b"-"),
            &mut output,
            &mut Recorder::disabled(),
        );
        assert!(matches!(
            result,
            Err(TrimError::InvalidAlignment(AlignmentError::UnequalLengths { .. }))
        ));
        assert_eq!(output.keep.column_count(), 0);
    }

    #[test]
    fn test_empty_alignment_is_rejected() {
        assert_eq!(
            TrimOutput::for_alignment(&alignment(&[]), false).unwrap_err(),
            TrimError::InvalidAlignment(AlignmentError::Empty)
        );
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_mismatched_arena_panics() {
        let aln = alignment(&["AC", "AG", "AT"]);
        let other = alignment(&["AC", "AG"]);
        let mut arena = ColumnArena::for_alignment(&other);
        arena.write_column(&aln, 0);
    }
}
