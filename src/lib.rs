//! # msatrim - Multiple Sequence Alignment Trimmer
//!
//! Removes alignment columns that are too gappy or carry no phylogenetic
//! signal, keeping the rest in their original order.
//!
//! ## Architecture
//!
//! - `model`: sequences, alignments and sequence type inference
//! - `formats`: FASTA, PHYLIP and NEXUS readers and writers
//! - `trim`: site classification, trimming modes and the trimming engine
//! - `cli`: command-line arguments, run configuration and the file-to-file run

pub mod cli;
pub mod formats;
pub mod model;
pub mod trim;
