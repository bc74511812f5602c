//! NEXUS reader and writer.
//!
//! Only the DATA / CHARACTERS block is read:
//!
//! ```text
//! #NEXUS
//! BEGIN DATA;
//!   DIMENSIONS NTAX=3 NCHAR=10;
//!   FORMAT DATATYPE=DNA GAP=- MISSING=?;
//!   MATRIX
//!     seq1 ACGTACGTAC
//!     seq2 TGCATGCATG
//!     seq3 AAAACCCCGG
//!   ;
//! END;
//! ```
//!
//! Commands are case-insensitive, `[...]` comments are ignored anywhere,
//! taxon names may be quoted. INTERLEAVE and MATCHCHAR are honoured.

use std::collections::HashMap;
use std::io::{self, Write};

use thiserror::Error;

use crate::model::{Alignment, Sequence, SequenceType};

/// Errors that can occur during NEXUS parsing.
#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Not a NEXUS file (must start with #NEXUS)")]
    NotNexus,

    #[error("Empty NEXUS file")]
    EmptyFile,

    #[error("No DATA or CHARACTERS block found")]
    NoDataBlock,

    #[error("Missing NCHAR in DIMENSIONS command")]
    MissingDimensions,

    #[error("Missing MATRIX command")]
    MissingMatrix,

    #[error("Invalid DIMENSIONS value: {0}")]
    InvalidDimensions(String),

    #[error("Expected {expected} sequences (NTAX), found {found}")]
    SequenceCountMismatch { expected: usize, found: usize },

    #[error("Sequence '{name}' has length {found}, expected {expected} (NCHAR)")]
    SequenceLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate sequence name: '{0}'")]
    DuplicateName(String),
}

/// Result type for NEXUS operations.
pub type NexusResult<T> = Result<T, NexusError>;

/// Settings collected from DIMENSIONS and FORMAT.
#[derive(Debug, Default)]
struct MatrixLayout {
    ntax: Option<usize>,
    nchar: Option<usize>,
    interleave: bool,
    matchchar: Option<u8>,
}

/// Removes `[...]` comments outside of quoted names.
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut depth = 0usize;
    let mut in_quote = false;

    for c in content.chars() {
        match c {
            '\'' if depth == 0 => {
                in_quote = !in_quote;
                out.push(c);
            }
            '[' if !in_quote => depth += 1,
            ']' if !in_quote && depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Splits text into `;`-terminated commands, respecting quotes.
fn split_commands(content: &str) -> Vec<&str> {
    let mut commands = Vec::new();
    let mut start = 0;
    let mut in_quote = false;

    for (i, c) in content.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ';' if !in_quote => {
                commands.push(content[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let rest = content[start..].trim();
    if !rest.is_empty() {
        commands.push(rest);
    }
    commands
}

/// Whitespace-separated tokens; a single-quoted name is one token.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for c in text.chars() {
        if c == '\'' {
            in_quote = !in_quote;
            current.push(c);
        } else if c.is_whitespace() && !in_quote {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn unquote(token: &str) -> String {
    match token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => token.to_string(),
    }
}

/// Value of `KEY=value` in a command; the key is matched case-insensitively.
fn param<'a>(command: &'a str, key: &str) -> Option<&'a str> {
    command.split_whitespace().find_map(|word| {
        let (k, v) = word.split_once('=')?;
        (k.eq_ignore_ascii_case(key) && !v.is_empty()).then_some(v)
    })
}

fn parse_count(command: &str, key: &str) -> NexusResult<Option<usize>> {
    param(command, key)
        .map(|v| {
            v.parse()
                .map_err(|_| NexusError::InvalidDimensions(format!("{key}={v}")))
        })
        .transpose()
}

/// Parses NEXUS content from a string.
pub fn parse_nexus_str(content: &str) -> NexusResult<Alignment> {
    let content = strip_comments(content);
    let body = content.trim_start();
    if body.is_empty() {
        return Err(NexusError::EmptyFile);
    }
    let body = match body.get(..6) {
        Some(tag) if tag.eq_ignore_ascii_case("#NEXUS") => &body[6..],
        _ => return Err(NexusError::NotNexus),
    };

    let mut in_block = false;
    let mut seen_block = false;
    let mut layout = MatrixLayout::default();
    let mut matrix: Option<&str> = None;

    for command in split_commands(body) {
        let upper = command.to_ascii_uppercase();
        let keyword = upper.split_whitespace().next().unwrap_or("");

        if !in_block {
            let block = upper.split_whitespace().nth(1).unwrap_or("");
            if keyword == "BEGIN" && matches!(block, "DATA" | "CHARACTERS") {
                in_block = true;
                seen_block = true;
            }
            continue;
        }

        match keyword {
            "END" | "ENDBLOCK" => break,
            "DIMENSIONS" => {
                layout.ntax = parse_count(&upper, "NTAX")?.or(layout.ntax);
                layout.nchar = parse_count(&upper, "NCHAR")?.or(layout.nchar);
            }
            "FORMAT" => {
                layout.interleave = upper.split_whitespace().any(|w| w.starts_with("INTERLEAVE"))
                    && param(&upper, "INTERLEAVE").map_or(true, |v| v != "NO");
                // Read from the unmodified command so the match character keeps its case
                layout.matchchar = param(command, "MATCHCHAR").and_then(|v| v.bytes().next());
            }
            "MATRIX" => matrix = Some(command[6..].trim()),
            _ => {}
        }
    }

    if !seen_block {
        return Err(NexusError::NoDataBlock);
    }
    let matrix = matrix.ok_or(NexusError::MissingMatrix)?;
    let nchar = layout.nchar.ok_or(NexusError::MissingDimensions)?;

    let records = parse_matrix(matrix, &layout, nchar)?;
    Ok(Alignment::new(
        records
            .into_iter()
            .map(|(name, data)| Sequence::from_bytes(name, data))
            .collect(),
    ))
}

fn parse_matrix(matrix: &str, layout: &MatrixLayout, nchar: usize) -> NexusResult<Vec<(String, Vec<u8>)>> {
    let tokens = tokenize(matrix);
    let mut records: Vec<(String, Vec<u8>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        let name = unquote(&tokens[i]);
        i += 1;

        let slot = match index.get(&name) {
            Some(&slot) if layout.interleave => slot,
            Some(_) => return Err(NexusError::DuplicateName(name)),
            None => {
                index.insert(name.clone(), records.len());
                records.push((name, Vec::with_capacity(nchar)));
                records.len() - 1
            }
        };

        if layout.interleave {
            // One chunk per name per block
            if let Some(chunk) = tokens.get(i) {
                records[slot].1.extend(chunk.bytes());
                i += 1;
            }
        } else {
            while i < tokens.len() && records[slot].1.len() < nchar {
                records[slot].1.extend(tokens[i].bytes());
                i += 1;
            }
        }
    }

    if let Some(mc) = layout.matchchar {
        apply_matchchar(&mut records, mc);
    }

    if let Some(ntax) = layout.ntax {
        if ntax != records.len() {
            return Err(NexusError::SequenceCountMismatch {
                expected: ntax,
                found: records.len(),
            });
        }
    }
    if let Some((name, data)) = records.iter().find(|(_, d)| d.len() != nchar) {
        return Err(NexusError::SequenceLengthMismatch {
            name: name.clone(),
            expected: nchar,
            found: data.len(),
        });
    }

    Ok(records)
}

/// Replaces the match character with the residue of the first sequence.
fn apply_matchchar(records: &mut [(String, Vec<u8>)], matchchar: u8) {
    let Some(((_, first), rest)) = records.split_first_mut() else {
        return;
    };
    for (_, data) in rest {
        for (b, &reference) in data.iter_mut().zip(first.iter()) {
            if *b == matchchar {
                *b = reference;
            }
        }
    }
}

fn quote_if_needed(name: &str) -> String {
    let plain = !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | ';' | '[' | ']'));
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Writes a NEXUS file with a single DATA block.
pub fn write_nexus<W: Write>(writer: &mut W, alignment: &Alignment) -> io::Result<()> {
    let datatype = match alignment.sequence_type {
        SequenceType::Nucleotide => "DNA",
        SequenceType::AminoAcid => "PROTEIN",
    };
    let names: Vec<String> = alignment.sequences.iter().map(|s| quote_if_needed(&s.id)).collect();
    let width = names.iter().map(String::len).max().unwrap_or(0);

    writeln!(writer, "#NEXUS")?;
    writeln!(writer, "BEGIN DATA;")?;
    writeln!(
        writer,
        "  DIMENSIONS NTAX={} NCHAR={};",
        alignment.sequence_count(),
        alignment.alignment_length()
    )?;
    writeln!(writer, "  FORMAT DATATYPE={} GAP=- MISSING=?;", datatype)?;
    writeln!(writer, "  MATRIX")?;
    for (name, seq) in names.iter().zip(&alignment.sequences) {
        write!(writer, "    {:<width$} ", name, width = width)?;
        writer.write_all(seq.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writeln!(writer, "  ;")?;
    writeln!(writer, "END;")?;
    Ok(())
}
