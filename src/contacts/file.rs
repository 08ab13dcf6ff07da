// Contact CSV files.
// Reads start URLs and writes UTF-8 (with BOM) contact exports.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

use super::model::ContactRow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column order of every file this tool writes.
pub const COLUMNS: [&str; 10] = [
    "name",
    "political_party",
    "position",
    "email",
    "phone",
    "contact_url",
    "address",
    "additional_info",
    "start_url",
    "last_updated",
];

/// Read contact rows from a CSV file with a header row.
/// Missing columns stay empty; unknown ones are kept in `extra`.
pub fn read_rows(path: &Path) -> Result<Vec<ContactRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let unknown: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !COLUMNS.contains(name))
        .map(|(i, name)| (i, name.to_string()))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: ContactRow = record.deserialize(Some(&headers))?;
        row.extra = unknown
            .iter()
            .map(|(i, name)| (name.clone(), record.get(*i).unwrap_or_default().to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Unknown columns across all rows, in first-seen order.
fn extra_columns(rows: &[ContactRow]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for (name, _) in rows.iter().flat_map(|row| &row.extra) {
        if !columns.contains(&name.as_str()) {
            columns.push(name);
        }
    }
    columns
}

/// Write contact rows, always including the header.
/// Extra input columns follow the fixed ones; rows without them leave the cells empty.
pub fn write_rows(path: &Path, rows: &[ContactRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);

    let extra = extra_columns(rows);
    writer.write_record(COLUMNS.iter().chain(&extra))?;
    for row in rows {
        let extra_values = extra
            .iter()
            .map(|column| row.extra_value(column).unwrap_or_default());
        writer.write_record(row.values().into_iter().chain(extra_values))?;
    }
    writer.flush()?;
    Ok(())
}

/// Unique, non-empty start URLs in first-seen order.
pub fn start_urls(rows: &[ContactRow]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for url in rows.iter().filter_map(|r| r.start_url.as_deref()) {
        let url = url.trim();
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}
