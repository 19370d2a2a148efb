use serde::Serialize;

use crate::error::ReconError;
use crate::model::{Record, Source};

/// One source's records split by identifier validity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Partitioned {
    pub with_id: Vec<Record>,
    pub without_id: Vec<Record>,
}

/// Split records on `is_valid(identifier)`. Failing identifiers are treated
/// as absent whatever they contain. Row order is kept on both sides.
pub fn partition<F>(
    source: Source,
    records: Vec<Record>,
    is_valid: F,
) -> Result<Partitioned, ReconError>
where
    F: Fn(&str) -> bool,
{
    let total = records.len();
    let (with_id, without_id): (Vec<Record>, Vec<Record>) =
        records.into_iter().partition(|r| is_valid(&r.identifier));

    if with_id.len() + without_id.len() != total {
        return Err(ReconError::PartitionMismatch {
            dataset: source,
            total,
            with_id: with_id.len(),
            without_id: without_id.len(),
        });
    }

    tracing::debug!(
        source = %source,
        total,
        with_id = with_id.len(),
        without_id = without_id.len(),
        "partitioned source records"
    );

    Ok(Partitioned {
        with_id,
        without_id,
    })
}
