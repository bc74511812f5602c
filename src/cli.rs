//! Command-line arguments, run configuration and the file-to-file run.
//!
//! `Args` is what clap parses. `RunConfig::from_args` validates it (input
//! exists, output differs from input, threshold in range) and fills in the
//! defaults. `run` reads the alignment, trims it and writes the outputs.

use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use crate::formats::{self, FileFormat};
use crate::model::SequenceType;
use crate::trim::{self, DecisionLog, GapSymbols, TrimParams, TrimSummary, Trimmer, TrimmingMode, WriterLog};

/// Gap threshold for non smart-gap modes when none is given.
pub const DEFAULT_GAPS: f64 = 0.9;

/// File format argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// FASTA format
    Fasta,
    /// PHYLIP format
    Phylip,
    /// NEXUS format
    Nexus,
}

impl From<FormatArg> for FileFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => FileFormat::Fasta,
            FormatArg::Phylip => FileFormat::Phylip,
            FormatArg::Nexus => FileFormat::Nexus,
        }
    }
}

/// Sequence type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SequenceTypeArg {
    /// Nucleotides
    Nt,
    /// Amino acids
    Aa,
}

impl From<SequenceTypeArg> for SequenceType {
    fn from(arg: SequenceTypeArg) -> Self {
        match arg {
            SequenceTypeArg::Nt => SequenceType::Nucleotide,
            SequenceTypeArg::Aa => SequenceType::AminoAcid,
        }
    }
}

fn parse_mode(s: &str) -> Result<TrimmingMode, trim::TrimError> {
    s.parse()
}

/// msatrim - trim multiple sequence alignment columns
///
/// Columns are kept or trimmed by gappyness and by whether they are
/// parsimony-informative or constant, depending on the mode.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input alignment file
    pub input: PathBuf,

    /// Output file [default: <input>.msatrim]
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Trimming mode: gappy, smart-gap, kpi, kpi-gappy, kpi-smart-gap,
    /// kpic, kpic-gappy, kpic-smart-gap
    #[arg(short = 'm', long = "mode", default_value = "smart-gap", value_parser = parse_mode)]
    pub mode: TrimmingMode,

    /// Gap threshold between 0 and 1. Smart-gap modes derive it from the
    /// alignment when omitted; other modes default to 0.9
    #[arg(short = 'g', long = "gaps")]
    pub gaps: Option<f64>,

    /// Also write the trimmed columns to <output>.complement
    #[arg(short = 'c', long = "complementary")]
    pub complementary: bool,

    /// Write one line per column decision to <output>.log
    #[arg(short = 'l', long = "log")]
    pub log: bool,

    /// Input file format
    #[arg(long = "input-format", value_enum, default_value = "fasta")]
    pub input_format: FormatArg,

    /// Output file format [default: same as input]
    #[arg(long = "output-format", value_enum)]
    pub output_format: Option<FormatArg>,

    /// Sequence type (inferred from the alignment when omitted)
    #[arg(short = 's', long = "sequence-type", value_enum, ignore_case = true)]
    pub sequence_type: Option<SequenceTypeArg>,

    /// Characters counted as gaps, e.g. "-?" [default: -?*Xx, plus Nn for nucleotides]
    #[arg(long = "gap-characters")]
    pub gap_characters: Option<String>,

    /// Only report warnings and errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// Validated settings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_format: FileFormat,
    pub output_format: FileFormat,
    pub mode: TrimmingMode,
    pub gaps: Option<f64>,
    pub complement: bool,
    pub use_log: bool,
    pub sequence_type: Option<SequenceType>,
    pub gap_characters: Option<Vec<u8>>,
    pub quiet: bool,
}

/// `path` with `suffix` appended to its file name.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl RunConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        if !args.input.is_file() {
            bail!("Input file does not exist: {}", args.input.display());
        }

        let output = args
            .output
            .unwrap_or_else(|| with_suffix(&args.input, ".msatrim"));
        if output == args.input {
            bail!("Input and output files can't have the same name: {}", output.display());
        }

        if let Some(gaps) = args.gaps {
            TrimParams::new(args.mode, gaps)?;
        }

        let gap_characters = match args.gap_characters {
            Some(chars) if chars.is_empty() => bail!("--gap-characters must not be empty"),
            Some(chars) => Some(chars.into_bytes()),
            None => None,
        };

        let input_format = FileFormat::from(args.input_format);
        Ok(Self {
            input: args.input,
            output,
            input_format,
            output_format: args.output_format.map(FileFormat::from).unwrap_or(input_format),
            mode: args.mode,
            gaps: args.gaps,
            complement: args.complementary,
            use_log: args.log,
            sequence_type: args.sequence_type.map(SequenceType::from),
            gap_characters,
            quiet: args.quiet,
        })
    }

    pub fn complement_path(&self) -> PathBuf {
        with_suffix(&self.output, ".complement")
    }

    pub fn log_path(&self) -> PathBuf {
        with_suffix(&self.output, ".log")
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: TrimSummary,
    pub sequence_type: SequenceType,
    pub warnings: Vec<String>,
}

/// Opens the decision log; a failure only produces a warning.
fn open_decision_log(path: &Path, warnings: &mut Vec<String>) -> Option<WriterLog<BufWriter<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriterLog::new(BufWriter::new(file))),
        Err(err) => {
            let message = format!("Cannot create log file {}: {}", path.display(), err);
            log::warn!("{}", message);
            warnings.push(message);
            None
        }
    }
}

/// Reads, trims and writes according to `config`.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let mut alignment = formats::parse_file(&config.input, config.input_format)
        .with_context(|| format!("Failed to read {}", config.input.display()))?;
    if let Some(sequence_type) = config.sequence_type {
        alignment = alignment.with_sequence_type(sequence_type);
    }
    log::info!(
        "Read {} sequences of {} columns ({}) from {} ({})",
        alignment.sequence_count(),
        alignment.alignment_length(),
        alignment.sequence_type,
        config.input.display(),
        config.input_format
    );

    let gaps = match &config.gap_characters {
        Some(chars) => GapSymbols::new(chars),
        None => GapSymbols::for_sequence_type(alignment.sequence_type),
    };
    log::debug!("Gap symbols: {}", String::from_utf8_lossy(&gaps.symbols()));

    let threshold = match config.gaps {
        Some(g) => g,
        None if config.mode.is_smart_gap() => {
            alignment.validate()?;
            let t = trim::smart_gap::threshold(&alignment, &gaps);
            log::info!("Smart-gap threshold: {}", t);
            t
        }
        None => DEFAULT_GAPS,
    };

    let params = TrimParams::new(config.mode, threshold)?;
    let trimmer = Trimmer::new(params, gaps).with_complement(config.complement);

    let mut warnings = Vec::new();
    let mut decision_log = if config.use_log {
        open_decision_log(&config.log_path(), &mut warnings)
    } else {
        None
    };

    let result = trimmer.run(
        &alignment,
        decision_log.as_mut().map(|l| l as &mut dyn DecisionLog),
    )?;
    warnings.extend(result.warnings);

    if let Some(decision_log) = decision_log {
        if let Err(err) = decision_log.into_inner() {
            let message = format!("Failed to flush log file {}: {}", config.log_path().display(), err);
            log::warn!("{}", message);
            warnings.push(message);
        }
    }

    formats::write_file(&config.output, &result.kept, config.output_format)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;
    log::info!(
        "Wrote trimmed alignment to {} ({})",
        config.output.display(),
        config.output_format
    );

    if let Some(trimmed) = &result.trimmed {
        let path = config.complement_path();
        formats::write_file(&path, trimmed, config.output_format)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote complement alignment to {}", path.display());
    }

    Ok(RunReport {
        summary: result.summary,
        sequence_type: alignment.sequence_type,
        warnings,
    })
}
