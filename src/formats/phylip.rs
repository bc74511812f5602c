//! PHYLIP reader and writer.
//!
//! The first line holds the number of sequences and the alignment length:
//!
//! ```text
//!  3 10
//! Seq1      ACGTACGTAC
//! Seq2      TGCATGCATG
//! Seq3      AAAACCCCGG
//! ```
//!
//! Input may be sequential (a sequence can continue on following lines) or
//! interleaved (blocks separated by blank lines, names only in the first
//! block). Names are either the strict 10-character field or a
//! whitespace-delimited word.
//!
//! Output is relaxed sequential: one `name sequence` line per record.

use std::io::{self, Write};

use thiserror::Error;

use crate::model::{Alignment, Sequence};

/// Errors that can occur during PHYLIP parsing.
#[derive(Error, Debug)]
pub enum PhylipError {
    #[error("Empty PHYLIP file")]
    EmptyFile,

    #[error("Invalid header: expected 'ntax nchar' (two integers), got '{0}'")]
    InvalidHeader(String),

    #[error("Invalid sequence count in header: '{0}'")]
    InvalidSequenceCount(String),

    #[error("Invalid sequence length in header: '{0}' is not a valid number")]
    InvalidSequenceLength(String),

    #[error("No sequence data found after header")]
    NoSequenceData,

    #[error("Expected {expected} sequences but found {found}")]
    SequenceCountMismatch { expected: usize, found: usize },

    #[error("Sequence '{name}' has length {found}, expected {expected}")]
    SequenceLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for PHYLIP operations.
pub type PhylipResult<T> = Result<T, PhylipError>;

fn is_sequence_char(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '-' | '.' | '*' | '?')
}

fn residues(s: &str) -> Option<Vec<u8>> {
    let data: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    (!data.is_empty() && data.iter().all(|&b| is_sequence_char(b as char))).then_some(data)
}

/// Splits a line starting a record into name and residues.
fn split_named_line(line: &str) -> (String, Vec<u8>) {
    // Relaxed: the name is the first word
    if let Some((name, rest)) = line.split_once(char::is_whitespace) {
        if let Some(data) = residues(rest) {
            return (name.to_string(), data);
        }
    }

    // Strict: a 10-character name glued to the residues
    if let (Some(name), Some(rest)) = (line.get(..10), line.get(10..)) {
        let name = name.trim();
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            if let Some(data) = residues(rest) {
                return (name.to_string(), data);
            }
        }
    }

    match line.split_once(char::is_whitespace) {
        Some((name, _)) => (name.to_string(), Vec::new()),
        None => (line.to_string(), Vec::new()),
    }
}

/// Parses PHYLIP content from a string.
pub fn parse_phylip_str(content: &str) -> PhylipResult<Alignment> {
    let mut lines = content.lines().map(str::trim).skip_while(|l| l.is_empty());

    let header = lines.next().ok_or(PhylipError::EmptyFile)?;
    let mut fields = header.split_whitespace();
    let (ntax, nchar) = match (fields.next(), fields.next()) {
        (Some(t), Some(c)) => (t, c),
        _ => return Err(PhylipError::InvalidHeader(header.to_string())),
    };
    let ntax: usize = ntax
        .parse()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| PhylipError::InvalidSequenceCount(ntax.to_string()))?;
    let nchar: usize = nchar
        .parse()
        .map_err(|_| PhylipError::InvalidSequenceLength(nchar.to_string()))?;

    let mut records: Vec<(String, Vec<u8>)> = Vec::with_capacity(ntax);
    let mut block_row = 0;
    let mut interleaved = false;

    for line in lines {
        if line.is_empty() {
            if records.len() == ntax {
                interleaved = true;
                block_row = 0;
            }
            continue;
        }

        if interleaved {
            // Continuation blocks may or may not repeat the names
            let data = match residues(line) {
                Some(data) => data,
                None => split_named_line(line).1,
            };
            if let Some((_, seq)) = records.get_mut(block_row % ntax) {
                seq.extend(data);
            }
            block_row += 1;
        } else {
            let current_full = records.last().map_or(true, |(_, seq)| seq.len() >= nchar);
            if records.len() < ntax && current_full {
                records.push(split_named_line(line));
            } else if let Some((_, seq)) = records.last_mut() {
                seq.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
            }
        }

        if records.len() == ntax && records.iter().all(|(_, seq)| seq.len() >= nchar) {
            break;
        }
    }

    if records.is_empty() {
        return Err(PhylipError::NoSequenceData);
    }
    if records.len() != ntax {
        return Err(PhylipError::SequenceCountMismatch {
            expected: ntax,
            found: records.len(),
        });
    }
    if let Some((name, seq)) = records.iter().find(|(_, seq)| seq.len() != nchar) {
        return Err(PhylipError::SequenceLengthMismatch {
            name: name.clone(),
            expected: nchar,
            found: seq.len(),
        });
    }

    Ok(Alignment::new(
        records
            .into_iter()
            .map(|(name, data)| Sequence::from_bytes(name, data))
            .collect(),
    ))
}

/// Writes relaxed sequential PHYLIP.
pub fn write_phylip<W: Write>(writer: &mut W, alignment: &Alignment) -> io::Result<()> {
    writeln!(
        writer,
        " {} {}",
        alignment.sequence_count(),
        alignment.alignment_length()
    )?;
    let width = alignment
        .sequences
        .iter()
        .map(|s| s.id.len())
        .max()
        .unwrap_or(0)
        .max(9);
    for seq in &alignment.sequences {
        write!(writer, "{:<width$} ", seq.id, width = width)?;
        writer.write_all(seq.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
