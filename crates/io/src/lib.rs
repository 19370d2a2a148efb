// File I/O operations

pub mod artifacts;
pub mod csv;
pub mod sources;

pub use artifacts::{ArtifactKind, ArtifactWriter};
pub use sources::{load_coverage_signal, load_covered_pmids, load_source, load_union_list};
