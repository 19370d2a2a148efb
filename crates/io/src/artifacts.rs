//! Dated CSV artifacts. A run never edits an earlier run's files; a second
//! run on the same date overwrites them.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use unionlist_recon::counts::{CoverageCounts, SourceOverview};
use unionlist_recon::engine::SourceReport;
use unionlist_recon::{AnnotatedRecord, CoverageSignal, FusedRecord, Record, ReconError, Source};

use crate::csv::write_table;
use crate::sources::{COVERED_IN_HEADER, UNION_LIST_HEADERS};

const RECORD_HEADERS: [&str; 9] = [
    "Row",
    "DOI",
    "Author",
    "Title",
    "Year",
    "Journal",
    "PubMedID",
    "Retraction_Notice_PubMedID",
    "Indexed_In",
];

const OVERVIEW_HEADERS: [&str; 6] = [
    "Indexed_In",
    "Query_result",
    "Records_withDOI",
    "Records_withoutDOI",
    "Duplicate_DOI_removed",
    "DOI_records_withPubMedID",
];

const RESULTS_HEADERS: [&str; 5] = [
    "Source",
    "Items_indexed_as_retracted",
    "Items_covered",
    "Items_covered_not_indexed",
    "Items_not_covered",
];

const SIGNAL_HEADERS: [&str; 3] = ["DOI", "PubMedID", COVERED_IN_HEADER];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    RecordsWithDoi(Source),
    RecordsNoDoi(Source),
    /// Dropped duplicate copies (survivors excluded).
    DuplicatedRecords(Source),
    /// Every member of every duplicate group, for manual audit.
    DuplicatedRecordsAll(Source),
    DataSourcesOverview,
    UnionList,
    NotIndexed(Source),
    CoveredNotIndexed(Source),
    UnionListWithCoverage,
    AggregateResults,
}

impl ArtifactKind {
    pub fn file_name(&self, date: NaiveDate) -> String {
        let date = date.format("%Y-%m-%d");
        match self {
            Self::RecordsWithDoi(s) => format!("{}_recordswithdoi_{date}.csv", s.slug()),
            Self::RecordsNoDoi(s) => format!("{}_recordsnodoi_{date}.csv", s.slug()),
            Self::DuplicatedRecords(s) => format!("{}_duplicatedrecords_{date}.csv", s.slug()),
            Self::DuplicatedRecordsAll(s) => {
                format!("{}_duplicatedrecords_all_{date}.csv", s.slug())
            }
            Self::DataSourcesOverview => format!("{date}_datasources_overview.csv"),
            Self::UnionList => format!("{date}_unionlist.csv"),
            Self::NotIndexed(s) => format!("{}_notindexed_{date}.csv", s.slug()),
            Self::CoveredNotIndexed(s) => format!("{}_coverednotindexed_{date}.csv", s.slug()),
            Self::UnionListWithCoverage => format!("{date}_unionlist_with_coverage.csv"),
            Self::AggregateResults => format!("{date}_aggregate_results.csv"),
        }
    }
}

/// Years are written as plain integers. An unparsed year is the one
/// exception and is written empty rather than as a made-up value.
fn year_cell(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_default()
}

fn record_row(r: &Record) -> Vec<String> {
    vec![
        r.row.to_string(),
        r.identifier.clone(),
        r.author.clone(),
        r.title.clone(),
        year_cell(r.year),
        r.journal.clone(),
        r.pmid.clone(),
        r.notice_pmid.clone(),
        r.source.label().to_string(),
    ]
}

fn fused_row(r: &FusedRecord) -> Vec<String> {
    vec![
        r.identifier.clone(),
        r.author.clone(),
        r.title.clone(),
        year_cell(r.year),
        r.journal.clone(),
        r.pmid.clone(),
        r.indexed_in.to_string(),
    ]
}

/// Records sorted by identifier, descending. Stable, so equal identifiers
/// keep file order.
fn by_identifier_desc(records: &[Record]) -> Vec<&Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by(|a, b| b.identifier.cmp(&a.identifier));
    sorted
}

/// Writes one run's artifacts into `out_dir`, all stamped with `run_date`.
#[derive(Debug)]
pub struct ArtifactWriter {
    out_dir: PathBuf,
    run_date: NaiveDate,
    written: Vec<PathBuf>,
}

impl ArtifactWriter {
    pub fn new(out_dir: &Path, run_date: NaiveDate) -> Result<Self, ReconError> {
        std::fs::create_dir_all(out_dir)
            .map_err(|e| ReconError::Io(format!("{}: {e}", out_dir.display())))?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            run_date,
            written: Vec::new(),
        })
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.out_dir.join(kind.file_name(self.run_date))
    }

    /// Paths written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write<I>(&mut self, kind: ArtifactKind, headers: &[&str], rows: I) -> Result<PathBuf, ReconError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let path = self.path(kind);
        write_table(&path, headers, rows)?;
        tracing::debug!(path = %path.display(), "artifact written");
        self.written.push(path.clone());
        Ok(path)
    }

    /// The four partition tables of one source.
    pub fn write_source_report(&mut self, report: &SourceReport) -> Result<(), ReconError> {
        let s = report.source;
        self.write(
            ArtifactKind::RecordsWithDoi(s),
            &RECORD_HEADERS,
            by_identifier_desc(&report.dedup.survivors).into_iter().map(record_row),
        )?;
        self.write(
            ArtifactKind::RecordsNoDoi(s),
            &RECORD_HEADERS,
            report.without_id.iter().map(record_row),
        )?;
        self.write(
            ArtifactKind::DuplicatedRecords(s),
            &RECORD_HEADERS,
            by_identifier_desc(&report.dedup.dropped_one_copy)
                .into_iter()
                .map(record_row),
        )?;
        self.write(
            ArtifactKind::DuplicatedRecordsAll(s),
            &RECORD_HEADERS,
            by_identifier_desc(&report.dedup.dropped_all)
                .into_iter()
                .map(record_row),
        )?;
        Ok(())
    }

    pub fn write_overview(&mut self, overview: &[SourceOverview]) -> Result<PathBuf, ReconError> {
        self.write(
            ArtifactKind::DataSourcesOverview,
            &OVERVIEW_HEADERS,
            overview.iter().map(|o| {
                vec![
                    o.indexed_in.clone(),
                    o.query_result.to_string(),
                    o.records_with_doi.to_string(),
                    o.records_without_doi.to_string(),
                    o.duplicate_doi_removed.to_string(),
                    o.doi_records_with_pmid.to_string(),
                ]
            }),
        )
    }

    pub fn write_union_list(&mut self, union: &[FusedRecord]) -> Result<PathBuf, ReconError> {
        self.write(ArtifactKind::UnionList, &UNION_LIST_HEADERS, union.iter().map(fused_row))
    }

    /// Rows `source` does not index, in union-list columns.
    pub fn write_not_indexed(
        &mut self,
        source: Source,
        rows: &[&FusedRecord],
    ) -> Result<PathBuf, ReconError> {
        self.write(
            ArtifactKind::NotIndexed(source),
            &UNION_LIST_HEADERS,
            rows.iter().map(|r| fused_row(r)),
        )
    }

    pub fn write_coverage_signal(
        &mut self,
        source: Source,
        signal: &[CoverageSignal],
    ) -> Result<PathBuf, ReconError> {
        self.write(
            ArtifactKind::CoveredNotIndexed(source),
            &SIGNAL_HEADERS,
            signal
                .iter()
                .map(|s| vec![s.identifier.clone(), s.pmid.clone(), s.covered_in.to_string()]),
        )
    }

    pub fn write_annotated(&mut self, annotated: &[AnnotatedRecord]) -> Result<PathBuf, ReconError> {
        let mut headers = UNION_LIST_HEADERS.to_vec();
        headers.push(COVERED_IN_HEADER);
        self.write(
            ArtifactKind::UnionListWithCoverage,
            &headers,
            annotated.iter().map(|a| {
                let mut row = fused_row(&a.record);
                row.push(a.covered_in.to_string());
                row
            }),
        )
    }

    pub fn write_aggregate_results(
        &mut self,
        counts: &[CoverageCounts],
    ) -> Result<PathBuf, ReconError> {
        self.write(
            ArtifactKind::AggregateResults,
            &RESULTS_HEADERS,
            counts.iter().map(|c| {
                vec![
                    c.source.label().to_string(),
                    c.indexed.to_string(),
                    c.covered.to_string(),
                    c.covered_not_indexed.to_string(),
                    c.not_covered.to_string(),
                ]
            }),
        )
    }
}
