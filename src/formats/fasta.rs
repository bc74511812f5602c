//! FASTA reader and writer.
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! The identifier is the first whitespace-delimited word of the header.
//! Sequences may span several lines.

use std::io::{self, Write};

use thiserror::Error;

use crate::model::{Alignment, Sequence};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Empty sequence identifier at line {0}")]
    EmptyIdentifier(usize),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Accumulates records while lines are fed in.
#[derive(Default)]
struct FastaBuilder {
    sequences: Vec<Sequence>,
    current_id: Option<String>,
    current_seq: Vec<u8>,
    // Alignments have uniform length: size the next buffer after the previous one
    prev_len: usize,
}

impl FastaBuilder {
    fn push_line(&mut self, line_number: usize, line: &str) -> FastaResult<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(header) = line.strip_prefix('>') {
            self.flush();
            let id = header.split_whitespace().next().unwrap_or("");
            if id.is_empty() {
                return Err(FastaError::EmptyIdentifier(line_number));
            }
            self.current_id = Some(id.to_string());
            self.current_seq = Vec::with_capacity(self.prev_len);
        } else {
            if self.current_id.is_none() {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            }
            self.current_seq
                .extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
        }
        Ok(())
    }

    fn flush(&mut self) {
        if let Some(id) = self.current_id.take() {
            self.prev_len = self.current_seq.len();
            let data = std::mem::take(&mut self.current_seq);
            self.sequences.push(Sequence::from_bytes(id, data));
        }
    }

    fn finish(mut self) -> FastaResult<Alignment> {
        self.flush();
        if self.sequences.is_empty() {
            return Err(FastaError::EmptyFile);
        }
        Ok(Alignment::new(self.sequences))
    }
}

/// Parses FASTA content from a string.
pub fn parse_fasta_str(content: &str) -> FastaResult<Alignment> {
    let mut builder = FastaBuilder::default();
    for (i, line) in content.lines().enumerate() {
        builder.push_line(i + 1, line)?;
    }
    builder.finish()
}

/// Writes one header line and one sequence line per record.
pub fn write_fasta<W: Write>(writer: &mut W, alignment: &Alignment) -> io::Result<()> {
    for seq in &alignment.sequences {
        writeln!(writer, ">{}", seq.id)?;
        writer.write_all(seq.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fasta() {
        let content = ">seq1\nACGT\n>seq2\nTGCA\n";
        let alignment = parse_fasta_str(content).unwrap();

        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.get(0).unwrap().id, "seq1");
        assert_eq!(alignment.get(0).unwrap().as_bytes(), b"ACGT");
        assert_eq!(alignment.get(1).unwrap().id, "seq2");
        assert_eq!(alignment.get(1).unwrap().as_bytes(), b"TGCA");
    }

    #[test]
    fn test_parse_multiline_sequence() {
        let content = ">seq1\nACGT\nTGCA\nAAAA\n";
        let alignment = parse_fasta_str(content).unwrap();
        assert_eq!(alignment.get(0).unwrap().as_bytes(), b"ACGTTGCAAAAA");
    }

    #[test]
    fn test_parse_with_description_and_blank_lines() {
        let content = ">seq1 This is a description\nAC GT\n\n>seq2\n\nTG-A\n";
        let alignment = parse_fasta_str(content).unwrap();
        assert_eq!(alignment.get(0).unwrap().id, "seq1");
        assert_eq!(alignment.get(0).unwrap().as_bytes(), b"ACGT");
        assert_eq!(alignment.get(1).unwrap().as_bytes(), b"TG-A");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_fasta_str(""), Err(FastaError::EmptyFile)));
        assert!(matches!(
            parse_fasta_str("ACGT\n>seq1\nTGCA\n"),
            Err(FastaError::SequenceWithoutHeader(1))
        ));
        assert!(matches!(
            parse_fasta_str(">seq1\nACGT\n> \nTGCA\n"),
            Err(FastaError::EmptyIdentifier(3))
        ));
    }

    #[test]
    fn test_case_preserved() {
        let alignment = parse_fasta_str(">seq1\nacgt\n").unwrap();
        assert_eq!(alignment.get(0).unwrap().as_bytes(), b"acgt");
    }

    #[test]
    fn test_write_fasta() {
        let alignment = Alignment::new(vec![
            Sequence::new("1", "A-C"),
            Sequence::new("2", ""),
        ]);
        let mut out = Vec::new();
        write_fasta(&mut out, &alignment).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">1\nA-C\n>2\n\n");
    }
}
