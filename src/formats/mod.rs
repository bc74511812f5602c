//! Alignment readers and writers.
//!
//! Supported formats:
//! - FASTA
//! - PHYLIP (sequential and interleaved on input, relaxed sequential on output)
//! - NEXUS (DATA / CHARACTERS block)
//!
//! The format is always given by the caller; there is no detection.

pub mod fasta;
pub mod nexus;
pub mod phylip;

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::Alignment;

/// Alignment file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    Phylip,
    Nexus,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::Phylip => write!(f, "PHYLIP"),
            FileFormat::Nexus => write!(f, "NEXUS"),
        }
    }
}

/// Errors that can occur while reading an alignment.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("FASTA error: {0}")]
    FastaError(#[from] fasta::FastaError),

    #[error("PHYLIP error: {0}")]
    PhylipError(#[from] phylip::PhylipError),

    #[error("NEXUS error: {0}")]
    NexusError(#[from] nexus::NexusError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses in-memory content in the given format.
pub fn parse_str(content: &str, format: FileFormat) -> ParseResult<Alignment> {
    match format {
        FileFormat::Fasta => Ok(fasta::parse_fasta_str(content)?),
        FileFormat::Phylip => Ok(phylip::parse_phylip_str(content)?),
        FileFormat::Nexus => Ok(nexus::parse_nexus_str(content)?),
    }
}

/// Reads and parses an alignment file.
pub fn parse_file<P: AsRef<Path>>(path: P, format: FileFormat) -> ParseResult<Alignment> {
    let file = File::open(&path)?;
    let file_size = file.metadata()?.len() as usize;

    if file_size == 0 {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = BufReader::with_capacity(1024 * 1024, file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;

    parse_str(&content, format)
}

/// Writes an alignment in the given format.
pub fn write_alignment<W: Write>(writer: &mut W, alignment: &Alignment, format: FileFormat) -> io::Result<()> {
    match format {
        FileFormat::Fasta => fasta::write_fasta(writer, alignment),
        FileFormat::Phylip => phylip::write_phylip(writer, alignment),
        FileFormat::Nexus => nexus::write_nexus(writer, alignment),
    }
}

/// Writes an alignment to `path`, replacing any existing file.
pub fn write_file<P: AsRef<Path>>(path: P, alignment: &Alignment, format: FileFormat) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_alignment(&mut writer, alignment, format)?;
    writer.flush()
}
