//! Data model for alignments.
//!
//! This module contains the data structures shared by the readers, the
//! trimming engine and the writers:
//! - Sequences and alignments
//! - Sequence type (nucleotide / amino acid) inference
//! - Alignment validation

use std::fmt;

use thiserror::Error;

/// Represents a single sequence with its identifier and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The sequence identifier (from the header, without '>')
    pub id: String,
    /// The residues, one byte per column
    pub data: Vec<u8>,
}

impl Sequence {
    /// Creates a new sequence.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: data.into().into_bytes(),
        }
    }

    /// Creates a sequence from raw bytes, as produced by the parsers.
    pub fn from_bytes(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self { id: id.into(), data }
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the residues as text. Non-UTF-8 bytes are replaced.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Kind of residues stored in an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceType {
    Nucleotide,
    AminoAcid,
}

impl SequenceType {
    /// Infers the sequence type from residues.
    ///
    /// Gap-like symbols (`-`, `?`, `.`, `*`) are ignored. The alignment is
    /// considered nucleotide when at least 90% of the remaining symbols are
    /// one of `ACGTUN` (case-insensitive).
    pub fn infer<'a, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'a Sequence>,
    {
        let mut nucleotides = 0usize;
        let mut residues = 0usize;

        for seq in sequences {
            for &b in &seq.data {
                if matches!(b, b'-' | b'?' | b'.' | b'*') {
                    continue;
                }
                residues += 1;
                if matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'U' | b'N') {
                    nucleotides += 1;
                }
            }
        }

        if residues > 0 && nucleotides * 10 >= residues * 9 {
            SequenceType::Nucleotide
        } else {
            SequenceType::AminoAcid
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceType::Nucleotide => write!(f, "nucleotide"),
            SequenceType::AminoAcid => write!(f, "amino acid"),
        }
    }
}

/// Reasons an alignment cannot be trimmed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("Invalid alignment: no sequences")]
    Empty,

    #[error("Invalid alignment: sequences have no columns")]
    NoColumns,

    #[error(
        "Invalid alignment: sequence '{id}' has length {found}, expected {expected} \
         (all sequences must have the same length)"
    )]
    UnequalLengths {
        id: String,
        expected: usize,
        found: usize,
    },
}

/// Represents an alignment of multiple sequences.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// All sequences in the alignment, in input order
    pub sequences: Vec<Sequence>,
    /// Residue kind, inferred at construction
    pub sequence_type: SequenceType,
}

impl Alignment {
    /// Creates a new alignment from a vector of sequences.
    ///
    /// The sequence type is inferred from content; use
    /// [`Alignment::with_sequence_type`] to override it.
    pub fn new(sequences: Vec<Sequence>) -> Self {
        let sequence_type = SequenceType::infer(&sequences);
        Self {
            sequences,
            sequence_type,
        }
    }

    /// Overrides the inferred sequence type.
    pub fn with_sequence_type(mut self, sequence_type: SequenceType) -> Self {
        self.sequence_type = sequence_type;
        self
    }

    /// Checks that the alignment is non-empty and rectangular.
    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.is_empty() {
            return Err(AlignmentError::Empty);
        }
        let first = &self.sequences[0];
        let expected = first.len();

        if let Some(bad) = self.sequences.iter().find(|s| s.len() != expected) {
            return Err(AlignmentError::UnequalLengths {
                id: bad.id.clone(),
                expected,
                found: bad.len(),
            });
        }

        if first.is_empty() {
            return Err(AlignmentError::NoColumns);
        }

        Ok(())
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the alignment length (length of the first sequence).
    ///
    /// Only meaningful once [`Alignment::validate`] succeeded.
    pub fn alignment_length(&self) -> usize {
        self.sequences.first().map(Sequence::len).unwrap_or(0)
    }

    /// Returns the residues of one column, in sequence order.
    pub fn column(&self, pos: usize) -> impl Iterator<Item = u8> + '_ {
        self.sequences.iter().map(move |s| s.data[pos])
    }

    /// Gets a sequence by index.
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// Returns true if the alignment is empty.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_creation() {
        let seq = Sequence::new("seq1", "ACGT");
        assert_eq!(seq.id, "seq1");
        assert_eq!(seq.as_bytes(), b"ACGT");
        assert_eq!(seq.len(), 4);
    }

    #[test]
    fn test_alignment_valid() {
        let seqs = vec![Sequence::new("seq1", "ACGT"), Sequence::new("seq2", "TGCA")];
        let alignment = Alignment::new(seqs);
        assert!(alignment.validate().is_ok());
        assert_eq!(alignment.alignment_length(), 4);
    }

    #[test]
    fn test_alignment_unequal_lengths() {
        let seqs = vec![Sequence::new("seq1", "ACGT"), Sequence::new("seq2", "TG")];
        let alignment = Alignment::new(seqs);
        assert_eq!(
            alignment.validate(),
            Err(AlignmentError::UnequalLengths {
                id: "seq2".to_string(),
                expected: 4,
                found: 2,
            })
        );
    }

    #[test]
    fn test_alignment_empty() {
        assert_eq!(Alignment::new(Vec::new()).validate(), Err(AlignmentError::Empty));

        let seqs = vec![Sequence::new("seq1", ""), Sequence::new("seq2", "")];
        assert_eq!(Alignment::new(seqs).validate(), Err(AlignmentError::NoColumns));
    }

    #[test]
    fn test_column() {
        let seqs = vec![
            Sequence::new("seq1", "ACGT"),
            Sequence::new("seq2", "TGCA"),
            Sequence::new("seq3", "A-GT"),
        ];
        let alignment = Alignment::new(seqs);
        assert_eq!(alignment.column(1).collect::<Vec<_>>(), b"CG-".to_vec());
    }

    #[test]
    fn test_infer_sequence_type() {
        let nt = vec![Sequence::new("a", "ACGT--NN"), Sequence::new("b", "acgtu?TT")];
        assert_eq!(SequenceType::infer(&nt), SequenceType::Nucleotide);

        let aa = vec![Sequence::new("a", "MKVLHE--"), Sequence::new("b", "MRVLWE-Q")];
        assert_eq!(SequenceType::infer(&aa), SequenceType::AminoAcid);

        // Only gaps: nothing to go on, default to amino acid
        let gaps = vec![Sequence::new("a", "----")];
        assert_eq!(SequenceType::infer(&gaps), SequenceType::AminoAcid);
    }

    #[test]
    fn test_sequence_type_override() {
        let seqs = vec![Sequence::new("a", "ACGT")];
        let alignment = Alignment::new(seqs).with_sequence_type(SequenceType::AminoAcid);
        assert_eq!(alignment.sequence_type, SequenceType::AminoAcid);
    }
}
