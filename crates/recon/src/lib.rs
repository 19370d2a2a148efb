//! `unionlist-recon`: record linkage, deduplication and fusion engine for a
//! retraction union list.
//!
//! Pure engine crate: receives pre-loaded records, returns partitions, the
//! fused union list and coverage annotations. No CLI or IO dependencies.

pub mod config;
pub mod counts;
pub mod coverage;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod fuse;
pub mod join;
pub mod model;
pub mod normalize;
pub mod partition;

pub use config::{PipelineConfig, SourceConfig, YearFormat};
pub use engine::{annotate_union_list, build_union_list, prepare_source, CoverageRun, UnionListRun};
pub use error::{ErrorClass, ReconError};
pub use model::{AnnotatedRecord, CoverageSignal, FusedRecord, Record, Source, SourceSet};
