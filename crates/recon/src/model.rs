use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::dedup::SourcePolicy;
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// One of the two bibliographic datasets being reconciled.
///
/// Declaration order is rendering order for label lists, so a record indexed
/// by both renders as `"Retraction Watch; PubMed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Source {
    /// Source B: the curated retraction database.
    #[serde(rename = "retraction_watch")]
    RetractionWatch,
    /// Source A: the literature index, authoritative for metadata.
    #[serde(rename = "pubmed")]
    PubMed,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::PubMed, Source::RetractionWatch];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PubMed => "PubMed",
            Self::RetractionWatch => "Retraction Watch",
        }
    }

    /// Stem used in artifact file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::PubMed => "pubmed",
            Self::RetractionWatch => "retraction_watch",
        }
    }

    /// Survivor rule inside a duplicate group. Fixed per source: a later
    /// PubMed duplicate carries the corrected date, the first Retraction
    /// Watch entry is the curated one.
    pub fn dedup_policy(&self) -> SourcePolicy {
        match self {
            Self::PubMed => SourcePolicy::KeepLast,
            Self::RetractionWatch => SourcePolicy::KeepFirst,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Source::ALL
            .into_iter()
            .find(|src| src.label().eq_ignore_ascii_case(trimmed) || src.slug() == trimmed)
            .ok_or_else(|| ReconError::UnknownLabel(trimmed.to_string()))
    }
}

/// Ordered, duplicate-free set of sources (`indexed_in`, `covered_in`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceSet(BTreeSet<Source>);

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only(source: Source) -> Self {
        Self(BTreeSet::from([source]))
    }

    pub fn both() -> Self {
        Self(Source::ALL.into_iter().collect())
    }

    pub fn insert(&mut self, source: Source) -> bool {
        self.0.insert(source)
    }

    pub fn with(mut self, source: Source) -> Self {
        self.0.insert(source);
        self
    }

    pub fn contains(&self, source: Source) -> bool {
        self.0.contains(&source)
    }

    pub fn union(&self, other: &SourceSet) -> SourceSet {
        Self(self.0.union(&other.0).copied().collect())
    }

    pub fn is_superset(&self, other: &SourceSet) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Source> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Source> for SourceSet {
    fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, source) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(source.label())?;
        }
        Ok(())
    }
}

impl FromStr for SourceSet {
    type Err = ReconError;

    /// Parse a `;`-separated label list. Order and repeats are irrelevant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Source::from_str)
            .collect()
    }
}

impl Serialize for SourceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single normalized row from one source's table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// 0-based position in the source file; the dedup tie-break order.
    pub row: usize,
    pub source: Source,
    /// Normalized DOI. May be empty or fail the validity test.
    pub identifier: String,
    /// PubMed ID of the retracted paper, `""` when absent.
    pub pmid: String,
    /// PubMed ID of the retraction notice, `""` when absent.
    pub notice_pmid: String,
    /// `None` only when the source date could not be parsed.
    pub year: Option<i32>,
    pub author: String,
    pub title: String,
    pub journal: String,
}

/// One union-list row: one record per identifier after fusion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedRecord {
    pub identifier: String,
    pub author: String,
    pub title: String,
    /// Integer year, or `None` when the source date could not be parsed.
    /// No placeholder year is substituted; artifacts carry an empty cell so
    /// the gap stays visible.
    pub year: Option<i32>,
    pub journal: String,
    pub pmid: String,
    pub indexed_in: SourceSet,
}

/// A union-list row known to be covered by a source that does not index it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSignal {
    pub identifier: String,
    pub pmid: String,
    pub covered_in: SourceSet,
}

/// Union-list row plus coverage. `covered_in` always contains `indexed_in`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRecord {
    pub record: FusedRecord,
    pub covered_in: SourceSet,
}

// ---------------------------------------------------------------------------
// Run metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    /// Date stamped on every artifact of this run.
    pub run_date: chrono::NaiveDate,
}

impl RunMeta {
    pub fn new(run_date: chrono::NaiveDate) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            run_date,
        }
    }
}
