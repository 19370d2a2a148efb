//! Coverage pass: fold a covered-but-not-indexed signal into the union list.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ReconError;
use crate::join::{outer_join, Joined};
use crate::model::{AnnotatedRecord, CoverageSignal, FusedRecord, Source};
use crate::normalize::normalize_identifier;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageOutput {
    /// One row per union-list row, in union-list key order.
    pub annotated: Vec<AnnotatedRecord>,
    /// Signal rows with no union-list counterpart. Never expected; reported
    /// instead of dropped.
    pub orphans: Vec<CoverageSignal>,
}

/// Annotate every union-list row with `covered_in`.
///
/// A row matched by the signal is covered by its indexing sources, by
/// `covering`, and by whatever the signal itself lists. An unmatched row is
/// covered exactly where it is indexed.
///
/// Both sides are keyed on the normalized identifier, so a signal written
/// with a different case or a stray delimiter still finds its row.
pub fn annotate_coverage(
    mut fused: Vec<FusedRecord>,
    mut signal: Vec<CoverageSignal>,
    covering: Source,
) -> Result<CoverageOutput, ReconError> {
    for r in &mut fused {
        r.identifier = normalize_identifier(&r.identifier);
    }
    for s in &mut signal {
        s.identifier = normalize_identifier(&s.identifier);
    }

    let joined = outer_join(
        fused,
        signal,
        |r| r.identifier.as_str(),
        |s| s.identifier.as_str(),
    )?;

    let mut out = CoverageOutput::default();
    for (_, outcome) in joined {
        match outcome {
            Joined::Both(record, signal) => {
                let covered_in = record
                    .indexed_in
                    .union(&signal.covered_in)
                    .with(covering);
                out.annotated.push(AnnotatedRecord { record, covered_in });
            }
            Joined::LeftOnly(record) => {
                let covered_in = record.indexed_in.clone();
                out.annotated.push(AnnotatedRecord { record, covered_in });
            }
            Joined::RightOnly(signal) => {
                tracing::warn!(
                    identifier = %signal.identifier,
                    pmid = %signal.pmid,
                    "coverage signal row has no union list counterpart"
                );
                out.orphans.push(signal);
            }
        }
    }

    if !out.orphans.is_empty() {
        tracing::warn!(
            orphans = out.orphans.len(),
            "coverage signal is not a subset of the union list"
        );
    }

    Ok(out)
}

/// Union-list rows that `source` does not index: the query set for an
/// external coverage lookup.
pub fn not_indexed_in(union: &[FusedRecord], source: Source) -> Vec<&FusedRecord> {
    union
        .iter()
        .filter(|r| !r.indexed_in.contains(source))
        .collect()
}

/// Build signal rows from the accession IDs an external lookup reported as
/// present in `source`. Only rows `source` does not already index qualify.
pub fn build_coverage_signal(
    union: &[FusedRecord],
    covered_pmids: &HashSet<String>,
    source: Source,
) -> Vec<CoverageSignal> {
    not_indexed_in(union, source)
        .into_iter()
        .filter(|r| !r.pmid.is_empty() && covered_pmids.contains(&r.pmid))
        .map(|r| CoverageSignal {
            identifier: r.identifier.clone(),
            pmid: r.pmid.clone(),
            covered_in: r.indexed_in.clone().with(source),
        })
        .collect()
}

/// True when every row satisfies `covered_in ⊇ indexed_in`.
pub fn coverage_implies_indexing(annotated: &[AnnotatedRecord]) -> bool {
    annotated
        .iter()
        .all(|r| r.covered_in.is_superset(&r.record.indexed_in))
}
