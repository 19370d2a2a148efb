use serde::Deserialize;

use crate::error::ReconError;
use crate::model::Source;
use crate::normalize::{year_from_calendar_date, year_from_year_month};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: String,
    /// Artifact directory, relative to the config file.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    pub pubmed: SourceSection,
    pub retraction_watch: SourceSection,
}

fn default_out_dir() -> String {
    "out".to_string()
}

// ---------------------------------------------------------------------------
// Per-source section
// ---------------------------------------------------------------------------

/// A source table as written in TOML. Everything but `file` falls back to
/// the defaults of that source's export format.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    pub file: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub year_format: Option<YearFormat>,
    #[serde(default)]
    pub columns: ColumnOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnOverrides {
    pub identifier: Option<String>,
    pub pmid: Option<String>,
    pub notice_pmid: Option<String>,
    pub year: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub journal: Option<String>,
}

/// How a source writes its date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearFormat {
    /// `2016:05`
    YearMonth,
    /// `4/13/2016 0:00` and friends.
    CalendarDate,
}

impl YearFormat {
    pub fn parse_year(&self, raw: &str) -> Option<i32> {
        match self {
            Self::YearMonth => year_from_year_month(raw),
            Self::CalendarDate => year_from_calendar_date(raw),
        }
    }
}

/// Header names of the columns the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub identifier: String,
    pub pmid: String,
    pub notice_pmid: String,
    pub year: String,
    pub author: String,
    pub title: String,
    pub journal: String,
}

impl ColumnMapping {
    pub fn default_for(source: Source) -> Self {
        let (identifier, pmid, year) = match source {
            Source::PubMed => ("DOI", "PubMedID", "Year"),
            Source::RetractionWatch => {
                ("OriginalPaperDOI", "OriginalPaperPubMedID", "OriginalPaperDate")
            }
        };
        Self {
            identifier: identifier.into(),
            pmid: pmid.into(),
            notice_pmid: "RetractionPubMedID".into(),
            year: year.into(),
            author: "Author".into(),
            title: "Title".into(),
            journal: "Journal".into(),
        }
    }

    fn overridden(mut self, o: &ColumnOverrides) -> Self {
        let fields = [
            (&mut self.identifier, &o.identifier),
            (&mut self.pmid, &o.pmid),
            (&mut self.notice_pmid, &o.notice_pmid),
            (&mut self.year, &o.year),
            (&mut self.author, &o.author),
            (&mut self.title, &o.title),
            (&mut self.journal, &o.journal),
        ];
        for (slot, value) in fields {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        self
    }

    /// `(role, header)` pairs, in a fixed order.
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("identifier", self.identifier.as_str()),
            ("pmid", self.pmid.as_str()),
            ("notice_pmid", self.notice_pmid.as_str()),
            ("year", self.year.as_str()),
            ("author", self.author.as_str()),
            ("title", self.title.as_str()),
            ("journal", self.journal.as_str()),
        ]
    }
}

/// A source section with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub source: Source,
    pub file: String,
    /// WHATWG encoding label.
    pub encoding: String,
    pub year_format: YearFormat,
    pub columns: ColumnMapping,
}

impl SourceConfig {
    /// Defaults for `source`'s stock export, reading from `file`.
    pub fn default_for(source: Source, file: impl Into<String>) -> Self {
        let (encoding, year_format) = match source {
            Source::PubMed => ("utf-8", YearFormat::YearMonth),
            Source::RetractionWatch => ("latin1", YearFormat::CalendarDate),
        };
        Self {
            source,
            file: file.into(),
            encoding: encoding.into(),
            year_format,
            columns: ColumnMapping::default_for(source),
        }
    }
}

impl SourceSection {
    pub fn resolve(&self, source: Source) -> SourceConfig {
        let mut resolved = SourceConfig::default_for(source, self.file.clone());
        if let Some(encoding) = &self.encoding {
            resolved.encoding = encoding.clone();
        }
        if let Some(year_format) = self.year_format {
            resolved.year_format = year_format;
        }
        resolved.columns = resolved.columns.overridden(&self.columns);
        resolved
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn source(&self, source: Source) -> SourceConfig {
        match source {
            Source::PubMed => self.pubmed.resolve(source),
            Source::RetractionWatch => self.retraction_watch.resolve(source),
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.out_dir.trim().is_empty() {
            return Err(ReconError::ConfigValidation("out_dir must not be empty".into()));
        }

        for source in Source::ALL {
            let resolved = self.source(source);
            if resolved.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "[{}] file must not be empty",
                    source.slug()
                )));
            }
            if encoding_rs::Encoding::for_label(resolved.encoding.as_bytes()).is_none() {
                return Err(ReconError::UnknownEncoding(resolved.encoding));
            }

            let mut seen: Vec<&str> = Vec::new();
            for (role, header) in resolved.columns.entries() {
                if header.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "[{}.columns] {role} must not be empty",
                        source.slug()
                    )));
                }
                if seen.contains(&header) {
                    return Err(ReconError::ConfigValidation(format!(
                        "[{}.columns] column '{header}' is mapped twice",
                        source.slug()
                    )));
                }
                seen.push(header);
            }
        }

        if self.pubmed.file == self.retraction_watch.file {
            return Err(ReconError::ConfigValidation(
                "pubmed and retraction_watch point at the same file".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "retraction union list"

[pubmed]
file = "2025-04-13_pubmed.csv"

[retraction_watch]
file = "2025-04-13_retraction_watch.csv"
"#;

    #[test]
    fn parse_minimal_uses_export_defaults() {
        let config = PipelineConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "retraction union list");
        assert_eq!(config.out_dir, "out");

        let pm = config.source(Source::PubMed);
        assert_eq!(pm.encoding, "utf-8");
        assert_eq!(pm.year_format, YearFormat::YearMonth);
        assert_eq!(pm.columns.identifier, "DOI");

        let rw = config.source(Source::RetractionWatch);
        assert_eq!(rw.encoding, "latin1");
        assert_eq!(rw.year_format, YearFormat::CalendarDate);
        assert_eq!(rw.columns.identifier, "OriginalPaperDOI");
        assert_eq!(rw.columns.pmid, "OriginalPaperPubMedID");
        assert_eq!(rw.columns.year, "OriginalPaperDate");
        assert_eq!(rw.columns.notice_pmid, "RetractionPubMedID");
    }

    #[test]
    fn column_overrides_apply_per_field() {
        let input = r#"
name = "custom"
out_dir = "artifacts"

[pubmed]
file = "pm.csv"
encoding = "windows-1252"

[pubmed.columns]
identifier = "doi"
title = "ArticleTitle"

[retraction_watch]
file = "rw.csv"
year_format = "year_month"
"#;
        let config = PipelineConfig::from_toml(input).unwrap();
        assert_eq!(config.out_dir, "artifacts");
        let pm = config.source(Source::PubMed);
        assert_eq!(pm.encoding, "windows-1252");
        assert_eq!(pm.columns.identifier, "doi");
        assert_eq!(pm.columns.title, "ArticleTitle");
        assert_eq!(pm.columns.author, "Author");
        assert_eq!(
            config.source(Source::RetractionWatch).year_format,
            YearFormat::YearMonth
        );
    }

    #[test]
    fn rejects_unknown_encoding() {
        let input = MINIMAL.replace(
            "file = \"2025-04-13_pubmed.csv\"",
            "file = \"2025-04-13_pubmed.csv\"\nencoding = \"klingon\"",
        );
        let err = PipelineConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::UnknownEncoding(ref e) if e == "klingon"));
    }

    #[test]
    fn rejects_missing_source_section() {
        let input = r#"
name = "half"
[pubmed]
file = "pm.csv"
"#;
        assert!(matches!(
            PipelineConfig::from_toml(input),
            Err(ReconError::ConfigParse(_))
        ));
    }

    #[test]
    fn rejects_unknown_year_format() {
        let input = MINIMAL.replace(
            "file = \"2025-04-13_retraction_watch.csv\"",
            "file = \"2025-04-13_retraction_watch.csv\"\nyear_format = \"julian\"",
        );
        assert!(PipelineConfig::from_toml(&input).is_err());
    }

    #[test]
    fn rejects_column_mapped_twice() {
        let input = format!("{MINIMAL}\n[pubmed.columns]\npmid = \"DOI\"\n");
        let err = PipelineConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("mapped twice"));
    }

    #[test]
    fn rejects_same_file_for_both_sources() {
        let input = MINIMAL.replace("2025-04-13_retraction_watch.csv", "2025-04-13_pubmed.csv");
        assert!(matches!(
            PipelineConfig::from_toml(&input),
            Err(ReconError::ConfigValidation(_))
        ));
    }

    #[test]
    fn year_formats_parse() {
        assert_eq!(YearFormat::YearMonth.parse_year("2016:05"), Some(2016));
        assert_eq!(YearFormat::CalendarDate.parse_year("4/13/2016 0:00"), Some(2016));
        assert_eq!(YearFormat::CalendarDate.parse_year("garbage"), None);
    }
}
