// End-to-end runs through the file-based entry point.

use std::fs;
use std::path::Path;

use clap::Parser;
use msatrim::cli::{run, Args, RunConfig};
use msatrim::formats::{parse_file, FileFormat};
use msatrim::model::SequenceType;
use msatrim::trim::{SiteCategory, TrimmingMode};

// Columns: informative, constant, gappy singleton, singleton, informative, constant
const SAMPLE: &str = ">1\nAC-GTA\n>2\nAC-GAA\n>3\nTC-CAA\n>4\nTCAGTA\n";

fn write_sample(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("sample.fa");
    fs::write(&input, SAMPLE).unwrap();
    input
}

fn config(input: &Path, extra: &[&str]) -> RunConfig {
    let mut argv = vec!["msatrim".to_string(), input.display().to_string()];
    argv.extend(extra.iter().map(|s| s.to_string()));
    RunConfig::from_args(Args::parse_from(argv)).unwrap()
}

fn sequences(path: &Path, format: FileFormat) -> Vec<String> {
    parse_file(path, format)
        .unwrap()
        .sequences
        .iter()
        .map(|s| s.as_str().into_owned())
        .collect()
}

#[test]
fn test_default_smart_gap_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path());

    let config = config(&input, &[]);
    let report = run(&config).unwrap();

    assert_eq!(report.sequence_type, SequenceType::Nucleotide);
    assert_eq!(report.summary.mode, TrimmingMode::SmartGap);
    assert_eq!(report.summary.threshold, 0.75);
    assert_eq!(report.summary.kept, 5);
    assert_eq!(report.summary.trimmed, 1);
    assert!(report.warnings.is_empty());

    let output = dir.path().join("sample.fa.msatrim");
    assert_eq!(
        sequences(&output, FileFormat::Fasta),
        vec!["ACGTA", "ACGAA", "TCCAA", "TCGTA"]
    );
    assert!(!dir.path().join("sample.fa.msatrim.complement").exists());
    assert!(!dir.path().join("sample.fa.msatrim.log").exists());
}

#[test]
fn test_kpic_gappy_with_complement_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path());
    let output = dir.path().join("trimmed.fa");

    let config = config(
        &input,
        &["-m", "kpic-gappy", "-g", "0.5", "-c", "-l", "-o", output.to_str().unwrap()],
    );
    let report = run(&config).unwrap();

    assert_eq!(report.summary.kept, 4);
    assert_eq!(report.summary.counters.get(SiteCategory::ParsimonyInformative), 2);
    assert_eq!(report.summary.counters.get(SiteCategory::Constant), 2);

    assert_eq!(
        sequences(&output, FileFormat::Fasta),
        vec!["ACTA", "ACAA", "TCAA", "TCTA"]
    );
    assert_eq!(
        sequences(&config.complement_path(), FileFormat::Fasta),
        vec!["-G", "-G", "-C", "AG"]
    );

    let log = fs::read_to_string(config.log_path()).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
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
fn test_format_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path());
    let output = dir.path().join("trimmed.nex");

    let config = config(
        &input,
        &["-m", "kpi", "--output-format", "nexus", "-o", output.to_str().unwrap()],
    );
    run(&config).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("#NEXUS"));
    assert_eq!(sequences(&output, FileFormat::Nexus), vec!["AT", "AA", "TA", "TT"]);
}

#[test]
fn test_phylip_input_with_custom_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.phy");
    fs::write(&input, " 3 4\nA    ACN-\nB    ACN-\nC    ACGT\n").unwrap();

    // Only '-' counts as a gap: the N column is 0% gappy
    let config = config(
        &input,
        &["--input-format", "phylip", "-m", "gappy", "-g", "0.3", "--gap-characters", "-"],
    );
    let report = run(&config).unwrap();
    assert_eq!(report.summary.kept, 3);
    assert_eq!(config.output_format, FileFormat::Phylip);
    assert_eq!(sequences(&config.output, FileFormat::Phylip), vec!["ACN", "ACN", "ACG"]);
}

#[test]
fn test_unequal_lengths_fail() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ragged.fa");
    fs::write(&input, ">a\nACGT\n>b\nAC\n").unwrap();

    let err = run(&config(&input, &["-m", "gappy"])).unwrap_err();
    assert!(err.to_string().contains("sequence 'b' has length 2, expected 4"));
    assert!(!dir.path().join("ragged.fa.msatrim").exists());
}

#[test]
fn test_unwritable_log_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sample(dir.path());

    let config = config(&input, &["-m", "kpic", "-l"]);
    // A directory where the log file should go
    fs::create_dir(config.log_path()).unwrap();

    let report = run(&config).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Cannot create log file"));

    assert_eq!(report.summary.kept, 4);
    assert_eq!(
        sequences(&config.output, FileFormat::Fasta),
        vec!["ACTA", "ACAA", "TCAA", "TCTA"]
    );
}
