//! CLI Exit Code Registry
//!
//! Single source of truth for every `unionlist` exit code. Scripts driving the
//! batch stages branch on these, so they are part of the shell contract.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args)                                   |
//! | 3    | Integrity check failed (partition, dedup or join counts) |
//! | 4    | Schema drift (an expected column is missing)             |
//! | 5    | Input could not be read, decoded or parsed               |
//! | 6    | Invalid pipeline config                                  |
//! | 7    | Coverage signal has rows outside the union list          |
//!
//! New codes: add the constant, document its trigger, extend the table, and
//! map it in `CliError::from_recon` or the command that raises it.

use unionlist_recon::ErrorClass;

/// Command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Unspecified failure. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments. Raised by clap before any command runs.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// A cross-record count or uniqueness invariant failed. Nothing after the
/// failing stage was written.
pub const EXIT_INTEGRITY: u8 = 3;

/// A mapped column is absent from an input header.
pub const EXIT_SCHEMA_DRIFT: u8 = 4;

/// I/O, decoding or CSV parse failure.
pub const EXIT_INPUT: u8 = 5;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Annotated union list was written, but some signal rows matched nothing.
pub const EXIT_COVERAGE_ORPHANS: u8 = 7;

pub fn exit_code_for(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::Integrity => EXIT_INTEGRITY,
        ErrorClass::SchemaDrift => EXIT_SCHEMA_DRIFT,
        ErrorClass::Input => EXIT_INPUT,
        ErrorClass::Config => EXIT_INVALID_CONFIG,
    }
}
