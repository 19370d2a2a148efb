//! `unionlist` subcommands: config-driven build, coverage lookup helpers and
//! annotation.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use unionlist_io::{
    load_coverage_signal, load_covered_pmids, load_source, load_union_list, ArtifactWriter,
};
use unionlist_recon::coverage::{build_coverage_signal, not_indexed_in};
use unionlist_recon::{
    annotate_union_list, build_union_list, PipelineConfig, ReconError, Source,
};

use crate::exit_codes::EXIT_COVERAGE_ORPHANS;
use crate::CliError;

fn run_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}

/// Directory a path lives in, `.` for bare file names.
fn dir_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn read_config(config_path: &Path) -> Result<PipelineConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::from(ReconError::Io(format!("cannot read config {}: {e}", config_path.display())))
    })?;
    Ok(PipelineConfig::from_toml(&config_str)?)
}

/// Serialize a summary, write it to `output_file` and/or stdout.
fn emit_json<T: Serialize>(
    summary: &T,
    json_output: bool,
    output_file: Option<&Path>,
) -> Result<(), CliError> {
    if !json_output && output_file.is_none() {
        return Ok(());
    }
    let json_str = serde_json::to_string_pretty(summary)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output_file {
        std::fs::write(path, &json_str).map_err(|e| {
            CliError::from(ReconError::Io(format!("cannot write {}: {e}", path.display())))
        })?;
        eprintln!("wrote {}", path.display());
    }
    if json_output {
        println!("{json_str}");
    }
    Ok(())
}

pub fn cmd_build(
    config_path: PathBuf,
    date: Option<NaiveDate>,
    out_dir: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let base_dir = dir_of(&config_path);
    let run_date = run_date(date);

    // Resolve file paths relative to the config file's directory
    let pubmed_config = config.source(Source::PubMed);
    let pubmed = load_source(&base_dir.join(&pubmed_config.file), &pubmed_config)?;
    let rw_config = config.source(Source::RetractionWatch);
    let retraction_watch = load_source(&base_dir.join(&rw_config.file), &rw_config)?;

    let run = build_union_list(pubmed, retraction_watch, run_date)?;

    let out_dir = out_dir.unwrap_or_else(|| base_dir.join(&config.out_dir));
    let mut writer = ArtifactWriter::new(&out_dir, run_date)?;
    for source in Source::ALL {
        writer.write_source_report(run.report(source))?;
    }
    writer.write_overview(&run.overview)?;
    let union_path = writer.write_union_list(&run.union)?;

    let summary = run.summary();
    emit_json(&summary, json_output, output_file.as_deref())?;

    // Human summary to stderr
    for row in &run.overview {
        eprintln!(
            "{}: {} rows, {} with DOI, {} without, {} duplicates removed",
            row.indexed_in,
            row.query_result,
            row.records_with_doi,
            row.records_without_doi,
            row.duplicate_doi_removed,
        );
    }
    eprintln!(
        "union list '{}': {} rows ({} in both, {} PubMed only, {} Retraction Watch only)",
        config.name,
        summary.union_rows,
        summary.indexed_by_both,
        summary.pubmed_only,
        summary.retraction_watch_only,
    );
    eprintln!("wrote {} artifact(s); union list at {}", writer.written().len(), union_path.display());

    Ok(())
}

pub fn cmd_not_indexed(
    union_list: PathBuf,
    source: Source,
    out_dir: Option<PathBuf>,
    date: Option<NaiveDate>,
) -> Result<(), CliError> {
    let union = load_union_list(&union_list)?;
    let rows = not_indexed_in(&union, source);

    let out_dir = out_dir.unwrap_or_else(|| dir_of(&union_list));
    let mut writer = ArtifactWriter::new(&out_dir, run_date(date))?;
    let path = writer.write_not_indexed(source, &rows)?;

    eprintln!(
        "{} of {} union-list rows not indexed in {source}; wrote {}",
        rows.len(),
        union.len(),
        path.display(),
    );
    Ok(())
}

pub fn cmd_coverage_signal(
    union_list: PathBuf,
    covered: PathBuf,
    out_dir: Option<PathBuf>,
    date: Option<NaiveDate>,
) -> Result<(), CliError> {
    let union = load_union_list(&union_list)?;
    let pmids = load_covered_pmids(&covered)?;
    let signal = build_coverage_signal(&union, &pmids, Source::PubMed);

    let out_dir = out_dir.unwrap_or_else(|| dir_of(&union_list));
    let mut writer = ArtifactWriter::new(&out_dir, run_date(date))?;
    let path = writer.write_coverage_signal(Source::PubMed, &signal)?;

    eprintln!(
        "{} covered PubMed ID(s) given, {} match rows PubMed does not index; wrote {}",
        pmids.len(),
        signal.len(),
        path.display(),
    );
    Ok(())
}

pub fn cmd_annotate(
    union_list: PathBuf,
    signal_path: PathBuf,
    out_dir: Option<PathBuf>,
    date: Option<NaiveDate>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let union = load_union_list(&union_list)?;
    let signal = load_coverage_signal(&signal_path)?;
    let run = annotate_union_list(union, signal, run_date(date))?;

    let out_dir = out_dir.unwrap_or_else(|| dir_of(&union_list));
    let mut writer = ArtifactWriter::new(&out_dir, run.meta.run_date)?;
    let annotated_path = writer.write_annotated(&run.annotated)?;
    writer.write_aggregate_results(&run.counts)?;

    emit_json(&run.summary(), json_output, output_file.as_deref())?;

    // Human summary to stderr
    for c in &run.counts {
        eprintln!(
            "{}: {} indexed, {} covered ({} covered but not indexed), {} not covered",
            c.source, c.indexed, c.covered, c.covered_not_indexed, c.not_covered,
        );
    }
    match run.pairwise_agreement {
        Some(pct) => eprintln!("pairwise agreement: {pct:.2}%"),
        None => eprintln!("pairwise agreement: n/a (no row covered by both)"),
    }
    eprintln!("wrote {}", annotated_path.display());

    if !run.orphans.is_empty() {
        return Err(CliError {
            code: EXIT_COVERAGE_ORPHANS,
            message: format!(
                "{} coverage signal row(s) match no union-list row",
                run.orphans.len()
            ),
            hint: None,
        }
        .with_hint("build the signal from the same union list (see `unionlist coverage-signal`)"));
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let pubmed = config.source(Source::PubMed);
    let rw = config.source(Source::RetractionWatch);
    eprintln!(
        "valid: pipeline '{}' (PubMed: {} [{}], Retraction Watch: {} [{}], out_dir: {})",
        config.name, pubmed.file, pubmed.encoding, rw.file, rw.encoding, config.out_dir,
    );
    Ok(())
}
