// CSV table read/write with code-page decoding

use std::io::Read;
use std::path::Path;

use encoding_rs::Encoding;
use unionlist_recon::ReconError;

fn io_error(path: &Path, e: impl std::fmt::Display) -> ReconError {
    ReconError::Io(format!("{}: {e}", path.display()))
}

fn csv_error(path: &Path, e: impl std::fmt::Display) -> ReconError {
    ReconError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Read a file and decode it to UTF-8 using a WHATWG encoding label
/// (`utf-8`, `latin1`, `windows-1252`, ...).
///
/// A file declared UTF-8 that does not decode as UTF-8 falls back to
/// Windows-1252, the usual encoding of spreadsheet-exported CSVs.
pub fn read_file_as_text(path: &Path, encoding_label: &str) -> Result<String, ReconError> {
    let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
        .ok_or_else(|| ReconError::UnknownEncoding(encoding_label.to_string()))?;

    let mut file = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| io_error(path, e))?;

    if encoding == encoding_rs::UTF_8 {
        return match String::from_utf8(bytes) {
            Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "file is not valid UTF-8, decoding as windows-1252"
                );
                let bytes = e.into_bytes();
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
                Ok(decoded.into_owned())
            }
        };
    }

    let (decoded, actual, had_errors) = encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(
            path = %path.display(),
            encoding = actual.name(),
            "malformed byte sequences replaced while decoding"
        );
    }
    Ok(decoded.into_owned())
}

/// A headed CSV table held in memory.
#[derive(Debug, Clone)]
pub struct Table {
    /// Name used in schema-drift errors.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<csv::StringRecord>,
}

impl Table {
    pub fn parse(name: &str, content: &str) -> Result<Table, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(Path::new(name), e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| csv_error(Path::new(name), e))?;

        Ok(Table {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn read(path: &Path, name: &str, encoding_label: &str) -> Result<Table, ReconError> {
        let content = read_file_as_text(path, encoding_label)?;
        Table::parse(name, &content).map_err(|e| match e {
            ReconError::Csv { message, .. } => csv_error(path, message),
            other => other,
        })
    }

    /// Index of `header`; a missing header is schema drift.
    pub fn column(&self, header: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| ReconError::MissingColumn {
                table: self.name.clone(),
                column: header.to_string(),
            })
    }

    /// Like [`Table::column`] but `None` when absent.
    pub fn optional_column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Field `idx` of `record`, `""` when the row is short.
pub fn field(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Write a headed table and flush it before returning.
pub fn write_table<I>(path: &Path, headers: &[&str], rows: I) -> Result<(), ReconError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    writer.write_record(headers).map_err(|e| csv_error(path, e))?;
    for row in rows {
        writer.write_record(&row).map_err(|e| csv_error(path, e))?;
    }

    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(())
}
