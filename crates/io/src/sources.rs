//! Loaders for source tables and for the pipeline's own intermediate tables.

use std::collections::HashSet;
use std::path::Path;

use unionlist_recon::normalize::{normalize_accession, normalize_identifier};
use unionlist_recon::{CoverageSignal, FusedRecord, Record, ReconError, SourceConfig, SourceSet};

use crate::csv::{field, read_file_as_text, Table};

/// Columns of the union list and of every table derived from it.
pub const UNION_LIST_HEADERS: [&str; 7] =
    ["DOI", "Author", "Title", "Year", "Journal", "PubMedID", "Indexed_In"];

pub const COVERED_IN_HEADER: &str = "Covered_In";

/// Read one source table into normalized records.
///
/// Identifiers and accessions are normalized, the year is parsed with the
/// source's year format, and `row` records the position in the file.
pub fn load_source(path: &Path, config: &SourceConfig) -> Result<Vec<Record>, ReconError> {
    let table = Table::read(path, config.source.slug(), &config.encoding)?;
    let cols = &config.columns;

    let identifier_idx = table.column(&cols.identifier)?;
    let pmid_idx = table.column(&cols.pmid)?;
    let notice_idx = table.column(&cols.notice_pmid)?;
    let year_idx = table.column(&cols.year)?;
    let author_idx = table.column(&cols.author)?;
    let title_idx = table.column(&cols.title)?;
    let journal_idx = table.column(&cols.journal)?;

    let mut unparsed_years = 0usize;
    let records: Vec<Record> = table
        .rows
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let raw_year = field(record, year_idx);
            let year = config.year_format.parse_year(raw_year);
            if year.is_none() {
                unparsed_years += 1;
                tracing::warn!(
                    source = %config.source,
                    row,
                    value = raw_year,
                    "unparseable year"
                );
            }
            Record {
                row,
                source: config.source,
                identifier: normalize_identifier(field(record, identifier_idx)),
                pmid: normalize_accession(field(record, pmid_idx)),
                notice_pmid: normalize_accession(field(record, notice_idx)),
                year,
                author: field(record, author_idx).to_string(),
                title: field(record, title_idx).to_string(),
                journal: field(record, journal_idx).to_string(),
            }
        })
        .collect();

    tracing::info!(
        source = %config.source,
        path = %path.display(),
        rows = records.len(),
        unparsed_years,
        "source loaded"
    );

    Ok(records)
}

fn parse_year_cell(table: &Table, row: usize, raw: &str) -> Result<Option<i32>, ReconError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let integral = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    integral.parse().map(Some).map_err(|_| ReconError::Csv {
        path: table.name.clone(),
        message: format!("row {row}: Year '{trimmed}' is not an integer"),
    })
}

fn union_rows(table: &Table) -> Result<Vec<FusedRecord>, ReconError> {
    let idx = UNION_LIST_HEADERS
        .iter()
        .map(|h| table.column(h))
        .collect::<Result<Vec<_>, _>>()?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row, record)| -> Result<FusedRecord, ReconError> {
            Ok(FusedRecord {
                identifier: normalize_identifier(field(record, idx[0])),
                author: field(record, idx[1]).to_string(),
                title: field(record, idx[2]).to_string(),
                year: parse_year_cell(table, row, field(record, idx[3]))?,
                journal: field(record, idx[4]).to_string(),
                pmid: normalize_accession(field(record, idx[5])),
                indexed_in: field(record, idx[6]).parse()?,
            })
        })
        .collect()
}

/// Read a union list written by an earlier run.
pub fn load_union_list(path: &Path) -> Result<Vec<FusedRecord>, ReconError> {
    let table = Table::read(path, "union_list", "utf-8")?;
    let union = union_rows(&table)?;
    tracing::info!(path = %path.display(), rows = union.len(), "union list loaded");
    Ok(union)
}

/// Read a coverage-signal table: `DOI`, `PubMedID` and `Covered_In`, any
/// other columns ignored. DOIs are normalized like source identifiers, since
/// the table may come from an external lookup.
pub fn load_coverage_signal(path: &Path) -> Result<Vec<CoverageSignal>, ReconError> {
    let table = Table::read(path, "coverage_signal", "utf-8")?;
    let doi_idx = table.column("DOI")?;
    let pmid_idx = table.column("PubMedID")?;
    let covered_idx = table.column(COVERED_IN_HEADER)?;

    let signal = table
        .rows
        .iter()
        .map(|record| -> Result<CoverageSignal, ReconError> {
            let covered_in: SourceSet = field(record, covered_idx).parse()?;
            Ok(CoverageSignal {
                identifier: normalize_identifier(field(record, doi_idx)),
                pmid: normalize_accession(field(record, pmid_idx)),
                covered_in,
            })
        })
        .collect::<Result<Vec<_>, ReconError>>()?;

    tracing::info!(path = %path.display(), rows = signal.len(), "coverage signal loaded");
    Ok(signal)
}

/// Read the accession IDs an external lookup reported as covered: one per
/// line, blank lines and `#` comments skipped.
pub fn load_covered_pmids(path: &Path) -> Result<HashSet<String>, ReconError> {
    let text = read_file_as_text(path, "utf-8")?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_accession)
        .filter(|pmid| !pmid.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use unionlist_recon::Source;

    const PUBMED_CSV: &str = "\
,DOI,Author,Title,Journal,Year,PubMedID,RetractionPubMedID
0,10.1057/JPHP.2015.37,Smith J,Old,J Pub Health,1900:01,26511294,
1,,Doe A,No doi,Nature,2011:03,1234.0,5678
2,10.1057/jphp.2015.37 ,Smith J,Corrected,J Pub Health,2016:02,28202934,0
";

    const RW_HEADER: &str = "Record ID,Title,Author,Journal,OriginalPaperDate,OriginalPaperDOI,OriginalPaperPubMedID,RetractionPubMedID\n";

    #[test]
    fn loads_pubmed_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2025-04-13_pubmed.csv");
        fs::write(&path, PUBMED_CSV).unwrap();

        let config = SourceConfig::default_for(Source::PubMed, "2025-04-13_pubmed.csv");
        let records = load_source(&path, &config).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].identifier, "10.1057/jphp.2015.37");
        assert_eq!(records[0].year, Some(1900));
        assert_eq!(records[0].notice_pmid, "");
        assert_eq!(records[1].identifier, "");
        assert_eq!(records[1].pmid, "1234");
        assert_eq!(records[1].notice_pmid, "5678");
        assert_eq!(records[2].identifier, "10.1057/jphp.2015.37");
        assert_eq!(records[2].row, 2);
        assert_eq!(records[2].notice_pmid, "");
        assert!(records.iter().all(|r| r.source == Source::PubMed));
    }

    #[test]
    fn loads_latin1_retraction_watch_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rw.csv");
        let mut bytes = RW_HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"1,T\xe9l\xe9,M\xfcller,Cell,1/1/1753 12:00:00 AM,10.1038/embor.2009.88 |,,\n");
        bytes.extend_from_slice(b"2,Two,B,Sci,4/29/2020 0:00,10.1/B,31415.0,27182\n");
        fs::write(&path, bytes).unwrap();

        let config = SourceConfig::default_for(Source::RetractionWatch, "rw.csv");
        let records = load_source(&path, &config).unwrap();

        assert_eq!(records[0].identifier, "10.1038/embor.2009.88");
        assert_eq!(records[0].author, "Müller");
        assert_eq!(records[0].title, "Télé");
        assert_eq!(records[0].year, Some(1753));
        assert_eq!(records[0].pmid, "");
        assert_eq!(records[1].identifier, "10.1/b");
        assert_eq!(records[1].year, Some(2020));
        assert_eq!(records[1].pmid, "31415");
        assert_eq!(records[1].notice_pmid, "27182");
    }

    #[test]
    fn renamed_upstream_column_is_schema_drift() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rw.csv");
        fs::write(&path, RW_HEADER.replace("OriginalPaperDOI", "PaperDOI")).unwrap();

        let config = SourceConfig::default_for(Source::RetractionWatch, "rw.csv");
        let err = load_source(&path, &config).unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingColumn { ref column, .. } if column == "OriginalPaperDOI"
        ));
    }

    #[test]
    fn unparseable_year_is_kept_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rw.csv");
        fs::write(&path, format!("{RW_HEADER}1,T,A,J,someday,10.1/a,,\n")).unwrap();

        let config = SourceConfig::default_for(Source::RetractionWatch, "rw.csv");
        let records = load_source(&path, &config).unwrap();
        assert_eq!(records[0].year, None);
    }

    #[test]
    fn union_list_reads_label_sets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("union.csv");
        fs::write(
            &path,
            "DOI,Author,Title,Year,Journal,PubMedID,Indexed_In\n\
             10.1/a,A,T,2016,J,123.0,Retraction Watch; PubMed\n\
             10.1/b,B,U,,K,,Retraction Watch\n",
        )
        .unwrap();

        let union = load_union_list(&path).unwrap();
        assert_eq!(union.len(), 2);
        assert_eq!(union[0].indexed_in, SourceSet::both());
        assert_eq!(union[0].pmid, "123");
        assert_eq!(union[0].year, Some(2016));
        assert_eq!(union[1].year, None);
        assert_eq!(union[1].indexed_in, SourceSet::only(Source::RetractionWatch));
    }

    #[test]
    fn union_list_rejects_unknown_label() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("union.csv");
        fs::write(
            &path,
            "DOI,Author,Title,Year,Journal,PubMedID,Indexed_In\n10.1/a,A,T,2016,J,,Scopus\n",
        )
        .unwrap();
        assert!(matches!(load_union_list(&path), Err(ReconError::UnknownLabel(_))));
    }

    #[test]
    fn covered_pmids_skip_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pmids.txt");
        fs::write(&path, "# esearch results\n123\n\n 456 \n0\n").unwrap();

        let pmids = load_covered_pmids(&path).unwrap();
        assert_eq!(pmids.len(), 2);
        assert!(pmids.contains("123"));
        assert!(pmids.contains("456"));
    }

    #[test]
    fn coverage_signal_ignores_extra_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signal.csv");
        fs::write(
            &path,
            "DOI,Title,PubMedID,Covered_In\n10.1/a,x,22,Retraction Watch; PubMed\n",
        )
        .unwrap();

        let signal = load_coverage_signal(&path).unwrap();
        assert_eq!(signal.len(), 1);
        assert_eq!(signal[0].pmid, "22");
        assert_eq!(signal[0].covered_in, SourceSet::both());
    }

    #[test]
    fn identifiers_normalized_on_read_back() {
        let dir = tempdir().unwrap();
        let signal_path = dir.path().join("signal.csv");
        fs::write(
            &signal_path,
            "DOI,PubMedID,Covered_In\n10.1/ABC |,22,Retraction Watch; PubMed\n",
        )
        .unwrap();
        assert_eq!(load_coverage_signal(&signal_path).unwrap()[0].identifier, "10.1/abc");

        let union_path = dir.path().join("union.csv");
        fs::write(
            &union_path,
            "DOI,Author,Title,Year,Journal,PubMedID,Indexed_In\n 10.1/Abc ,A,T,2016,J,22,Retraction Watch\n",
        )
        .unwrap();
        assert_eq!(load_union_list(&union_path).unwrap()[0].identifier, "10.1/abc");
    }
}
