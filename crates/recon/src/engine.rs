use chrono::NaiveDate;
use serde::Serialize;

use crate::counts::{
    coverage_counts, overview_total, pairwise_agreement, source_overview, CoverageCounts,
    SourceOverview,
};
use crate::coverage::{annotate_coverage, coverage_implies_indexing};
use crate::dedup::{deduplicate, reconcile_counts, DedupOutput};
use crate::error::ReconError;
use crate::fuse::{ensure_source, fuse};
use crate::model::{AnnotatedRecord, CoverageSignal, FusedRecord, Record, RunMeta, Source};
use crate::normalize::has_valid_identifier;
use crate::partition::partition;

/// One source after partitioning and deduplication.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: Source,
    /// Rows read from the source table.
    pub total: usize,
    pub without_id: Vec<Record>,
    pub dedup: DedupOutput,
}

/// Partition, deduplicate and self-check one source's records.
pub fn prepare_source(source: Source, records: Vec<Record>) -> Result<SourceReport, ReconError> {
    ensure_source(&records, source)?;
    let total = records.len();

    let parts = partition(source, records, has_valid_identifier)?;
    let dedup = deduplicate(parts.with_id, source.dedup_policy());
    reconcile_counts(source, total, parts.without_id.len(), &dedup)?;

    tracing::info!(
        source = %source,
        total,
        unique_identifiers = dedup.survivors.len(),
        without_identifier = parts.without_id.len(),
        duplicates_dropped = dedup.dropped_one_copy.len(),
        "source prepared"
    );

    Ok(SourceReport {
        source,
        total,
        without_id: parts.without_id,
        dedup,
    })
}

/// Everything one union-list build produces.
#[derive(Debug, Clone)]
pub struct UnionListRun {
    pub meta: RunMeta,
    pub pubmed: SourceReport,
    pub retraction_watch: SourceReport,
    /// One row per source followed by the `Total` row.
    pub overview: Vec<SourceOverview>,
    pub union: Vec<FusedRecord>,
}

/// Compact run description for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct UnionListSummary {
    pub meta: RunMeta,
    pub overview: Vec<SourceOverview>,
    pub union_rows: usize,
    pub indexed_by_both: usize,
    pub pubmed_only: usize,
    pub retraction_watch_only: usize,
}

impl UnionListRun {
    pub fn report(&self, source: Source) -> &SourceReport {
        match source {
            Source::PubMed => &self.pubmed,
            Source::RetractionWatch => &self.retraction_watch,
        }
    }

    pub fn summary(&self) -> UnionListSummary {
        let mut both = 0;
        let mut pubmed_only = 0;
        let mut retraction_watch_only = 0;
        for r in &self.union {
            match (
                r.indexed_in.contains(Source::PubMed),
                r.indexed_in.contains(Source::RetractionWatch),
            ) {
                (true, true) => both += 1,
                (true, false) => pubmed_only += 1,
                (false, true) => retraction_watch_only += 1,
                (false, false) => {}
            }
        }
        UnionListSummary {
            meta: self.meta.clone(),
            overview: self.overview.clone(),
            union_rows: self.union.len(),
            indexed_by_both: both,
            pubmed_only,
            retraction_watch_only,
        }
    }
}

/// Build the union list from both sources' raw records.
pub fn build_union_list(
    pubmed: Vec<Record>,
    retraction_watch: Vec<Record>,
    run_date: NaiveDate,
) -> Result<UnionListRun, ReconError> {
    let pubmed = prepare_source(Source::PubMed, pubmed)?;
    let retraction_watch = prepare_source(Source::RetractionWatch, retraction_watch)?;

    let union = fuse(
        pubmed.dedup.survivors.clone(),
        retraction_watch.dedup.survivors.clone(),
    )?;

    let mut overview = vec![source_overview(&pubmed), source_overview(&retraction_watch)];
    overview.push(overview_total(&overview));

    tracing::info!(rows = union.len(), "union list fused");

    Ok(UnionListRun {
        meta: RunMeta::new(run_date),
        pubmed,
        retraction_watch,
        overview,
        union,
    })
}

/// Output of the coverage pass over a union list.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageRun {
    pub meta: RunMeta,
    pub annotated: Vec<AnnotatedRecord>,
    pub orphans: Vec<CoverageSignal>,
    /// PubMed first, then Retraction Watch.
    pub counts: Vec<CoverageCounts>,
    pub pairwise_agreement: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageSummary {
    pub meta: RunMeta,
    pub rows: usize,
    pub orphans: usize,
    pub counts: Vec<CoverageCounts>,
    pub pairwise_agreement: Option<f64>,
}

impl CoverageRun {
    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary {
            meta: self.meta.clone(),
            rows: self.annotated.len(),
            orphans: self.orphans.len(),
            counts: self.counts.clone(),
            pairwise_agreement: self.pairwise_agreement,
        }
    }
}

/// Fold a PubMed covered-but-not-indexed signal into the union list and
/// tally the results.
pub fn annotate_union_list(
    union: Vec<FusedRecord>,
    signal: Vec<CoverageSignal>,
    run_date: NaiveDate,
) -> Result<CoverageRun, ReconError> {
    let output = annotate_coverage(union, signal, Source::PubMed)?;
    if !coverage_implies_indexing(&output.annotated) {
        tracing::error!("annotated row lost an indexing source from covered_in");
    }

    let counts = Source::ALL
        .into_iter()
        .map(|source| coverage_counts(&output.annotated, source))
        .collect();
    let agreement = pairwise_agreement(&output.annotated);

    tracing::info!(
        rows = output.annotated.len(),
        orphans = output.orphans.len(),
        pairwise_agreement = ?agreement,
        "coverage annotated"
    );

    Ok(CoverageRun {
        meta: RunMeta::new(run_date),
        annotated: output.annotated,
        orphans: output.orphans,
        counts,
        pairwise_agreement: agreement,
    })
}
