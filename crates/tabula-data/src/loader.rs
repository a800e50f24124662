//! CSV loading and saving of training tables.
//!
//! The header must name every layout column and the target column; extra
//! columns are ignored. Empty cells are left out of the record, which the
//! encoder then imputes (numeric) or rejects (categorical).

use crate::error::{DataError, Result};
use crate::table::{TargetEncoding, TrainingTable};
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use std::io::{Read, Write};
use std::path::Path;
use tabula_features::{ColumnKind, RawRecord, RawValue, TableLayout};

/// Load a training table from a CSV file.
///
/// # Arguments
/// * `path` - CSV file with a header row
/// * `layout` - Feature columns to read
/// * `target` - Target column name
/// * `encoding` - How target cells become numbers
pub fn read_csv(
    path: impl AsRef<Path>,
    layout: &TableLayout,
    target: &str,
    encoding: &TargetEncoding,
) -> Result<TrainingTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let table = from_reader(file, layout, target, encoding)?;
    tracing::info!(path = %path.display(), rows = table.len(), "loaded training table");
    Ok(table)
}

/// Load a training table from any CSV source.
pub fn from_reader<R: Read>(
    reader: R,
    layout: &TableLayout,
    target: &str,
    encoding: &TargetEncoding,
) -> Result<TrainingTable> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let header = reader.headers()?.clone();

    let position = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };
    let columns = layout
        .columns()
        .iter()
        .map(|c| Ok((c.name.as_str(), c.kind, position(&c.name)?)))
        .collect::<Result<Vec<_>>>()?;
    let target_at = position(target)?;

    let mut table = TrainingTable::new(layout.clone(), target);
    for row in reader.records() {
        let row = row?;
        let line = line_of(&row);

        let mut record = RawRecord::new();
        for &(name, kind, at) in &columns {
            let cell = row.get(at).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            let value = match kind {
                ColumnKind::Numeric => match cell.parse::<f64>() {
                    Ok(v) => RawValue::Number(v),
                    Err(_) => RawValue::Text(cell.to_string()),
                },
                ColumnKind::Categorical => RawValue::Text(cell.to_string()),
            };
            record.insert(name, value);
        }

        let cell = row.get(target_at).unwrap_or_default();
        let value = encoding.decode(cell).ok_or_else(|| match encoding {
            TargetEncoding::Labels { .. } => DataError::UnknownLabel(cell.to_string()),
            TargetEncoding::Numeric => DataError::Parse {
                line,
                message: format!("target {} is not a number: {:?}", target, cell),
            },
        })?;
        table.push(record, value);
    }

    if table.is_empty() {
        return Err(DataError::EmptyTable);
    }
    Ok(table)
}

/// Save a training table as CSV: layout columns, then the target.
pub fn write_csv(
    table: &TrainingTable,
    path: impl AsRef<Path>,
    encoding: &TargetEncoding,
) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    to_writer(table, file, encoding)?;
    tracing::info!(path = %path.display(), rows = table.len(), "wrote training table");
    Ok(())
}

/// Write a training table as CSV to any sink.
pub fn to_writer<W: Write>(table: &TrainingTable, writer: W, encoding: &TargetEncoding) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    let mut header: Vec<&str> = table
        .layout()
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    header.push(table.target());
    writer.write_record(&header)?;

    for (record, target) in table.rows() {
        let mut row: Vec<String> = table
            .layout()
            .columns()
            .iter()
            .map(|c| record.get(&c.name).map(ToString::to_string).unwrap_or_default())
            .collect();
        row.push(encoding.encode(target));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn line_of(row: &StringRecord) -> u64 {
    row.position().map(|p| p.line()).unwrap_or_default()
}
