use crate::error::ReconError;
use crate::join::{outer_join, Joined};
use crate::model::{FusedRecord, Record, Source, SourceSet};

pub(crate) fn ensure_source(records: &[Record], expected: Source) -> Result<(), ReconError> {
    if let Some(stray) = records.iter().find(|r| r.source != expected) {
        let found = records.iter().filter(|r| r.source == stray.source).count();
        return Err(ReconError::SourceMismatch {
            expected,
            actual: stray.source,
            found,
        });
    }
    Ok(())
}

fn fused_from(record: Record, indexed_in: SourceSet) -> FusedRecord {
    FusedRecord {
        identifier: record.identifier,
        author: record.author,
        title: record.title,
        year: record.year,
        journal: record.journal,
        pmid: record.pmid,
        indexed_in,
    }
}

/// Map one join outcome to its union-list row.
///
/// `Both` takes every field from the PubMed side in one piece; the
/// Retraction Watch record only contributes its label.
pub fn fuse_outcome(outcome: Joined<Record, Record>) -> FusedRecord {
    match outcome {
        Joined::Both(pubmed, _retraction_watch) => fused_from(pubmed, SourceSet::both()),
        Joined::LeftOnly(pubmed) => fused_from(pubmed, SourceSet::only(Source::PubMed)),
        Joined::RightOnly(retraction_watch) => {
            fused_from(retraction_watch, SourceSet::only(Source::RetractionWatch))
        }
    }
}

/// Outer-join the deduplicated sources on identifier into the union list.
///
/// Output is ordered by identifier and holds exactly one row per identifier
/// present in either input.
pub fn fuse(
    pubmed: Vec<Record>,
    retraction_watch: Vec<Record>,
) -> Result<Vec<FusedRecord>, ReconError> {
    ensure_source(&pubmed, Source::PubMed)?;
    ensure_source(&retraction_watch, Source::RetractionWatch)?;

    let joined = outer_join(
        pubmed,
        retraction_watch,
        |r| r.identifier.as_str(),
        |r| r.identifier.as_str(),
    )?;

    Ok(joined.into_iter().map(|(_, outcome)| fuse_outcome(outcome)).collect())
}
