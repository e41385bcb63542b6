//! Excel workbook parser (xlsx)

use std::borrow::Cow;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};

use crate::error::{PipelineError, Result};
use crate::model::{CellValue, Column, Table};

use super::{dedupe_names, is_missing_marker, Parser, UploadedFile};

/// Parser for Excel workbooks; reads the first sheet
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, file: &UploadedFile) -> Result<Table> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(file.content.as_slice()))
            .map_err(|e| PipelineError::parse(&file.name, format!("not a valid workbook: {}", e)))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::parse(&file.name, "no sheets found in workbook"))?;

        let range: Range<Data> = workbook.worksheet_range(&sheet_name).map_err(|e| {
            PipelineError::parse(&file.name, format!("failed to read sheet {}: {}", sheet_name, e))
        })?;

        Ok(parse_range(&range))
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("xlsx")
    }
}

/// First row is the header; an empty sheet becomes an empty table
fn parse_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    let names: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = cell_to_string(cell);
                if name.is_empty() { format!("Column{}", i + 1) } else { name }
            })
            .collect(),
        None => Vec::new(),
    };
    let columns: Vec<Column> = dedupe_names(names).into_iter().map(Column::new).collect();

    let mut table = Table::new(columns);

    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        table.add_row(cells);
    }

    table.infer_column_types();
    table
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if is_missing_marker(s) {
                CellValue::Null
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::Float(f) => {
            // Whole floats are integers written by a spreadsheet
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let s = format!("{}", dt);
            if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f") {
                CellValue::DateTime(datetime)
            } else if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f") {
                CellValue::DateTime(datetime)
            } else if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                CellValue::Date(date)
            } else {
                CellValue::String(Cow::Owned(s))
            }
        }
        Data::DateTimeIso(s) => {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                CellValue::DateTime(dt)
            } else if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(_) => CellValue::Null,
    }
}
