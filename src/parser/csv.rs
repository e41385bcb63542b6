//! CSV file parser

use std::borrow::Cow;

use crate::error::{PipelineError, Result};
use crate::model::{CellValue, Column, Table};

use super::{dedupe_names, is_missing_marker, Parser, UploadedFile};

/// Parser for CSV files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, file: &UploadedFile) -> Result<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file.content.as_slice());

        // Read headers
        let headers = csv_reader
            .headers()
            .map_err(|e| PipelineError::parse(&file.name, format!("failed to read CSV headers: {}", e)))?
            .clone();

        let names = headers.iter().map(|name| name.trim().to_string()).collect();
        let columns: Vec<Column> = dedupe_names(names).into_iter().map(Column::new).collect();

        let mut table = Table::new(columns);

        for (line_num, result) in csv_reader.records().enumerate() {
            // +2 for 1-indexing and header
            let record = result.map_err(|e| {
                PipelineError::parse(&file.name, format!("row {}: {}", line_num + 2, e))
            })?;

            let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
            table.add_row(cells);
        }

        table.infer_column_types();
        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("csv")
    }
}

/// Parse a string value into a CellValue with type inference
pub(crate) fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    if is_missing_marker(trimmed) {
        return CellValue::Null;
    }

    // Try parsing as boolean
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("yes") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("no") {
        return CellValue::Bool(false);
    }

    // Try parsing as integer
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    // Try parsing as float; "nan"/"inf" spellings stay text
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }

    // Try parsing as date
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return CellValue::Date(date);
    }

    // Try parsing as datetime (ISO 8601)
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return CellValue::DateTime(dt);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return CellValue::DateTime(dt);
    }

    // Default to string
    CellValue::String(Cow::Owned(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    fn parse(content: &str) -> Result<Table> {
        CsvParser.parse(&UploadedFile::new("data.csv", content.as_bytes().to_vec()))
    }

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), CellValue::Null);
        assert_eq!(parse_cell_value("null"), CellValue::Null);
        assert_eq!(parse_cell_value("NA"), CellValue::Null);
        assert_eq!(parse_cell_value("true"), CellValue::Bool(true));
        assert_eq!(parse_cell_value("false"), CellValue::Bool(false));
        assert_eq!(parse_cell_value("42"), CellValue::Int(42));
        assert_eq!(parse_cell_value("3.14"), CellValue::Float(3.14));
        assert_eq!(
            parse_cell_value("2024-02-29"),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(
            parse_cell_value("hello"),
            CellValue::String(Cow::Owned("hello".to_string()))
        );
        assert_eq!(parse_cell_value("nan"), CellValue::Null);
        assert_eq!(parse_cell_value("N/A"), CellValue::Null);
        assert_eq!(parse_cell_value("inf"), CellValue::from("inf"));
    }

    #[test]
    fn test_parse_table_with_missing_values() {
        let table = parse("id,score\n1,10\n2,\n3,30\n").unwrap();
        assert_eq!(table.column_names(), vec!["id", "score"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.columns[1].inferred_type, CellType::Int);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = parse("a,b,c\n1\n").unwrap();
        assert_eq!(
            table.rows[0].cells,
            vec![CellValue::Int(1), CellValue::Null, CellValue::Null]
        );
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let file = UploadedFile::new("bad.csv", vec![b'a', b',', b'b', b'\n', 0xff, 0xfe, b'\n']);
        assert!(matches!(CsvParser.parse(&file), Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn test_header_only() {
        let table = parse("a,b\n").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns[0].inferred_type, CellType::Null);
    }

    #[test]
    fn test_missing_markers_keep_column_numeric() {
        let table = parse("id,score\n1,10\n2,N/A\n3,30\n4,NaN\n5,None\n").unwrap();
        assert_eq!(table.columns[1].inferred_type, CellType::Int);
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.rows[3].cells[1], CellValue::Null);
        assert_eq!(table.rows[4].cells[1], CellValue::Null);
    }

    #[test]
    fn test_duplicate_headers_are_renamed() {
        let table = parse("a,b,a\n1,2,3\n").unwrap();
        assert_eq!(table.column_names(), vec!["a", "b", "a.1"]);
        assert_eq!(table.rows[0].cells[2], CellValue::Int(3));
    }
}
