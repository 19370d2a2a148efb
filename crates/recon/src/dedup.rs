use std::collections::HashMap;

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{Record, Source};

/// Which member of a duplicate group survives, by original row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePolicy {
    KeepFirst,
    KeepLast,
}

/// Result of collapsing duplicate identifiers within one source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupOutput {
    /// One record per identifier: group survivors plus singletons.
    pub survivors: Vec<Record>,
    /// Every group member except its survivor.
    pub dropped_one_copy: Vec<Record>,
    /// Every group member including its survivor, kept for manual audit.
    pub dropped_all: Vec<Record>,
    /// Number of identifiers that occurred more than once.
    pub group_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Singleton,
    Survivor,
    Dropped,
}

/// Group records by identifier and keep one per group per `policy`.
///
/// All three output lists preserve input order.
pub fn deduplicate(with_id: Vec<Record>, policy: SourcePolicy) -> DedupOutput {
    let mut fates = vec![Fate::Singleton; with_id.len()];
    let mut group_count = 0;

    {
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (pos, record) in with_id.iter().enumerate() {
            groups.entry(record.identifier.as_str()).or_default().push(pos);
        }

        for members in groups.values().filter(|m| m.len() > 1) {
            group_count += 1;
            let by_row = |&&pos: &&usize| with_id[pos].row;
            let survivor = match policy {
                SourcePolicy::KeepFirst => members.iter().min_by_key(by_row),
                SourcePolicy::KeepLast => members.iter().max_by_key(by_row),
            };
            for &pos in members {
                fates[pos] = if Some(&pos) == survivor {
                    Fate::Survivor
                } else {
                    Fate::Dropped
                };
            }
        }
    }

    let mut out = DedupOutput {
        group_count,
        ..DedupOutput::default()
    };
    for (record, fate) in with_id.into_iter().zip(fates) {
        match fate {
            Fate::Singleton => out.survivors.push(record),
            Fate::Survivor => {
                out.dropped_all.push(record.clone());
                out.survivors.push(record);
            }
            Fate::Dropped => {
                out.dropped_all.push(record.clone());
                out.dropped_one_copy.push(record);
            }
        }
    }
    out
}

/// Self-check after dedup: every input row is a survivor, lacks an
/// identifier, or was dropped as a duplicate copy; and the audit list holds
/// exactly the dropped copies plus one survivor per group.
pub fn reconcile_counts(
    source: Source,
    total: usize,
    without_id: usize,
    dedup: &DedupOutput,
) -> Result<(), ReconError> {
    let survivors = dedup.survivors.len();
    let dropped = dedup.dropped_one_copy.len();
    if survivors + without_id + dropped != total {
        return Err(ReconError::DedupMismatch {
            dataset: source,
            total,
            survivors,
            without_id,
            dropped,
        });
    }
    if dedup.dropped_all.len() != dropped + dedup.group_count {
        return Err(ReconError::DuplicateGroupMismatch {
            dataset: source,
            dropped_all: dedup.dropped_all.len(),
            dropped,
            group_count: dedup.group_count,
        });
    }
    Ok(())
}
