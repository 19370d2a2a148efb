//! Per-value cleanup applied while loading source tables.
//!
//! Everything here is infallible: a malformed value degrades to a
//! best-effort residue (or `None` for years) instead of stopping the run.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use unicode_normalization::UnicodeNormalization;

/// Namespace marker every usable DOI starts with.
pub const DOI_PREFIX: &str = "10.";

/// Delimiter one source occasionally appends to a DOI.
pub const STRAY_DELIMITER: char = '|';

/// The one source-B date literal that needs rewriting before parsing.
pub const EXCEPTIONAL_DATE: &str = "1/1/1753 12:00:00 AM";
pub const EXCEPTIONAL_DATE_SUBSTITUTE: &str = "1/1/1753 00:00";

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Legacy single-byte code pages an identifier is pushed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodePage {
    /// ISO-8859-1: exactly U+0000..=U+00FF.
    Latin1,
    Windows1252,
}

impl CodePage {
    fn can_encode(self, c: char) -> bool {
        if c.is_ascii() {
            return true;
        }
        match self {
            Self::Latin1 => u32::from(c) <= 0xFF,
            Self::Windows1252 => {
                let mut buf = [0u8; 4];
                let (_, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
                !had_errors
            }
        }
    }
}

const CODE_PAGE_PASSES: [CodePage; 2] = [CodePage::Latin1, CodePage::Windows1252];

/// Canonicalize a raw DOI-like identifier.
///
/// Each code page pass decomposes (NFKD) and silently drops what the page
/// cannot represent, which removes zero-width joiners and other invisible
/// characters some exports embed. Then: lower-case, trim, and strip the
/// stray `|` delimiter with its surrounding whitespace.
///
/// ```
/// use unionlist_recon::normalize::normalize_identifier;
/// assert_eq!(normalize_identifier("10.\u{200b}1105/\u{200b}TPC.\u{200b}010357"), "10.1105/tpc.010357");
/// assert_eq!(normalize_identifier("10.1038/embor.2009.88 |"), "10.1038/embor.2009.88");
/// ```
pub fn normalize_identifier(raw: &str) -> String {
    let mut value: String = raw.to_string();
    for page in CODE_PAGE_PASSES {
        value = value.nfkd().filter(|c| page.can_encode(*c)).collect();
    }
    let lowered = value.to_lowercase();
    strip_stray_delimiter(lowered.trim())
}

fn strip_stray_delimiter(value: &str) -> String {
    if !value.contains(STRAY_DELIMITER) {
        return value.to_string();
    }
    value
        .split(STRAY_DELIMITER)
        .map(str::trim)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validity test for partitioning: a normalized identifier counts as present
/// only inside the DOI namespace.
pub fn has_valid_identifier(identifier: &str) -> bool {
    identifier.starts_with(DOI_PREFIX)
}

// ---------------------------------------------------------------------------
// Accessions
// ---------------------------------------------------------------------------

/// Normalize a numeric accession (PubMed ID). Absent, zero and `nan` become
/// `""`; float renderings like `"12345.0"` lose the fraction.
pub fn normalize_accession(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        return String::new();
    }
    let integral = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    match integral.parse::<u64>() {
        Ok(0) => String::new(),
        Ok(n) => n.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Years
// ---------------------------------------------------------------------------

/// Year prefix of a `YYYY:MM` field.
pub fn year_from_year_month(raw: &str) -> Option<i32> {
    raw.split(':').next()?.trim().parse().ok()
}

/// Year of a full calendar date such as `4/29/2020 0:00`.
pub fn year_from_calendar_date(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    let value = if trimmed == EXCEPTIONAL_DATE {
        EXCEPTIONAL_DATE_SUBSTITUTE
    } else {
        trimmed
    };

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.year())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|d| d.year())
        })
}
