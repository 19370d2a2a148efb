use serde::Serialize;

use crate::engine::SourceReport;
use crate::model::{AnnotatedRecord, Source, SourceSet};

/// One row of the data-sources overview table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOverview {
    /// `"PubMed"`, `"Retraction Watch"` or `"Total"`.
    pub indexed_in: String,
    pub query_result: usize,
    pub records_with_doi: usize,
    pub records_without_doi: usize,
    pub duplicate_doi_removed: usize,
    pub doi_records_with_pmid: usize,
}

pub fn source_overview(report: &SourceReport) -> SourceOverview {
    SourceOverview {
        indexed_in: report.source.label().to_string(),
        query_result: report.total,
        records_with_doi: report.dedup.survivors.len(),
        records_without_doi: report.without_id.len(),
        duplicate_doi_removed: report.dedup.dropped_one_copy.len(),
        doi_records_with_pmid: report
            .dedup
            .survivors
            .iter()
            .filter(|r| !r.pmid.is_empty())
            .count(),
    }
}

/// Column sums over `rows`, labelled `Total`.
pub fn overview_total(rows: &[SourceOverview]) -> SourceOverview {
    rows.iter().fold(
        SourceOverview {
            indexed_in: "Total".to_string(),
            query_result: 0,
            records_with_doi: 0,
            records_without_doi: 0,
            duplicate_doi_removed: 0,
            doi_records_with_pmid: 0,
        },
        |mut acc, row| {
            acc.query_result += row.query_result;
            acc.records_with_doi += row.records_with_doi;
            acc.records_without_doi += row.records_without_doi;
            acc.duplicate_doi_removed += row.duplicate_doi_removed;
            acc.doi_records_with_pmid += row.doi_records_with_pmid;
            acc
        },
    )
}

/// Per-source indexing and coverage tallies over an annotated union list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageCounts {
    pub source: Source,
    pub indexed: usize,
    pub covered: usize,
    pub covered_not_indexed: usize,
    pub not_covered: usize,
}

pub fn coverage_counts(annotated: &[AnnotatedRecord], source: Source) -> CoverageCounts {
    let mut counts = CoverageCounts {
        source,
        indexed: 0,
        covered: 0,
        covered_not_indexed: 0,
        not_covered: 0,
    };

    for r in annotated {
        let indexed = r.record.indexed_in.contains(source);
        let covered = r.covered_in.contains(source);
        if indexed {
            counts.indexed += 1;
        }
        match (covered, indexed) {
            (true, true) => counts.covered += 1,
            (true, false) => {
                counts.covered += 1;
                counts.covered_not_indexed += 1;
            }
            (false, _) => counts.not_covered += 1,
        }
    }

    counts
}

/// Records indexed by both sources as a percentage of records covered by
/// both. `None` when no record is covered by both.
pub fn pairwise_agreement(annotated: &[AnnotatedRecord]) -> Option<f64> {
    let both = SourceSet::both();
    let both_cover = annotated
        .iter()
        .filter(|r| r.covered_in.is_superset(&both))
        .count();
    if both_cover == 0 {
        return None;
    }
    let both_index = annotated
        .iter()
        .filter(|r| r.record.indexed_in.is_superset(&both))
        .count();
    Some(both_index as f64 / both_cover as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FusedRecord;

    fn annotated(indexed_in: SourceSet, covered_in: SourceSet) -> AnnotatedRecord {
        AnnotatedRecord {
            record: FusedRecord {
                identifier: "10.1/x".into(),
                author: String::new(),
                title: String::new(),
                year: Some(2020),
                journal: String::new(),
                pmid: String::new(),
                indexed_in,
            },
            covered_in,
        }
    }

    fn sample() -> Vec<AnnotatedRecord> {
        let rw = SourceSet::only(Source::RetractionWatch);
        let pm = SourceSet::only(Source::PubMed);
        vec![
            annotated(SourceSet::both(), SourceSet::both()),
            annotated(rw.clone(), SourceSet::both()),
            annotated(rw.clone(), rw.clone()),
            annotated(pm.clone(), pm),
        ]
    }

    #[test]
    fn coverage_tallies_per_source() {
        let rows = sample();
        let pm = coverage_counts(&rows, Source::PubMed);
        assert_eq!(pm.indexed, 2);
        assert_eq!(pm.covered, 3);
        assert_eq!(pm.covered_not_indexed, 1);
        assert_eq!(pm.not_covered, 1);

        let rw = coverage_counts(&rows, Source::RetractionWatch);
        assert_eq!(rw.indexed, 3);
        assert_eq!(rw.covered, 3);
        assert_eq!(rw.covered_not_indexed, 0);
        assert_eq!(rw.not_covered, 1);
    }

    #[test]
    fn agreement_percentage() {
        let pct = pairwise_agreement(&sample()).unwrap();
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn agreement_undefined_without_joint_coverage() {
        let rw = SourceSet::only(Source::RetractionWatch);
        assert_eq!(pairwise_agreement(&[annotated(rw.clone(), rw)]), None);
        assert_eq!(pairwise_agreement(&[]), None);
    }

    #[test]
    fn total_row_sums_columns() {
        let a = SourceOverview {
            indexed_in: "PubMed".into(),
            query_result: 10,
            records_with_doi: 7,
            records_without_doi: 2,
            duplicate_doi_removed: 1,
            doi_records_with_pmid: 7,
        };
        let b = SourceOverview {
            indexed_in: "Retraction Watch".into(),
            query_result: 5,
            records_with_doi: 4,
            records_without_doi: 1,
            duplicate_doi_removed: 0,
            doi_records_with_pmid: 2,
        };
        let total = overview_total(&[a, b]);
        assert_eq!(total.indexed_in, "Total");
        assert_eq!(total.query_result, 15);
        assert_eq!(total.records_with_doi, 11);
        assert_eq!(total.records_without_doi, 3);
        assert_eq!(total.duplicate_doi_removed, 1);
        assert_eq!(total.doi_records_with_pmid, 9);
    }
}
