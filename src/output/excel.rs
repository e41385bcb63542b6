//! Excel (.xlsx) export

use crate::error::Result;
use crate::model::Table;

use super::Exporter;

/// Single-sheet workbook export with a bold header row
pub struct ExcelOutput;

#[cfg(feature = "xlsx")]
impl Exporter for ExcelOutput {
    fn render(&self, table: &Table) -> Result<Vec<u8>> {
        use rust_xlsxwriter::{Format, Workbook};

        use crate::error::PipelineError;
        use crate::model::CellValue;

        let to_err = |e: rust_xlsxwriter::XlsxError| PipelineError::export("Excel", e);

        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();

        for (col, column) in table.columns.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, column.name.as_str(), &header)
                .map_err(to_err)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            let r = row_idx as u32 + 1;
            for (col, cell) in row.cells.iter().enumerate() {
                let c = col as u16;
                let written = match cell {
                    CellValue::Null => continue,
                    CellValue::Bool(b) => worksheet.write_boolean(r, c, *b),
                    CellValue::Int(i) => worksheet.write_number(r, c, *i as f64),
                    CellValue::Float(f) => worksheet.write_number(r, c, *f),
                    other => worksheet.write_string(r, c, other.display().as_ref()),
                };
                written.map_err(to_err)?;
            }
        }

        workbook.save_to_buffer().map_err(to_err)
    }
}

#[cfg(not(feature = "xlsx"))]
impl Exporter for ExcelOutput {
    fn render(&self, _table: &Table) -> Result<Vec<u8>> {
        Err(super::missing_xlsx())
    }
}
