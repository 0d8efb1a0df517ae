use std::{fmt, path::Path};

use anyhow::Context;
use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::listing::{Field, Record};

const PREVIEW_ROWS: usize = 5;
const PREVIEW_WIDTH: usize = 24;


/// Writes `records` to `path` as CSV, header first, replacing whatever was there.
///
/// The header is written even when there are no records.
pub(crate) fn save(records: &[Record], path: &Path) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(Field::ALL.iter().map(|field| field.header()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Saved {} listings to {}", records.len(), path.display());
    Ok(())
}


/// A CSV file read back as plain strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Table {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}


impl Table {
    pub(crate) fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}


/// The first line of `cell`, cut to the preview width.
fn clip(cell: &str) -> String {
    let line = cell.lines().next().unwrap_or_default();
    let mut clipped: String = line.chars().take(PREVIEW_WIDTH).collect();
    if clipped.len() < cell.len() {
        clipped.push_str("...");
    }
    clipped
}


/// A short preview: the header, the first few rows with cells clipped, and the table size.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headers.join(" | "))?;
        for row in self.rows.iter().take(PREVIEW_ROWS) {
            let cells: Vec<_> = row.iter().map(|cell| clip(cell)).collect();
            writeln!(f, "{}", cells.join(" | "))?;
        }
        if self.rows.len() > PREVIEW_ROWS {
            writeln!(f, "...")?;
        }
        writeln!(f, "[{} rows x {} columns]", self.rows.len(), self.headers.len())
    }
}


pub(crate) fn load(path: &Path) -> anyhow::Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|row| row.map(|row| row.iter().map(String::from).collect::<Vec<_>>()))
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(Table { headers, rows })
}
