//! Boxed table preview for the terminal

use crate::model::Table;

/// Render the header and the first `rows` rows as a box-drawn table
pub fn render_preview(table: &Table, rows: usize) -> String {
    let mut data: Vec<Vec<String>> = Vec::with_capacity(rows + 1);
    data.push(
        table
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.inferred_type))
            .collect(),
    );
    for row in table.rows.iter().take(rows) {
        data.push(row.cells.iter().map(|c| c.display().into_owned()).collect());
    }

    let mut output = build_table(&data);
    if table.row_count() > rows {
        output.push_str(&format!("... {} more rows\n", table.row_count() - rows));
    }
    output
}

/// Build a formatted table from data
fn build_table(data: &[Vec<String>]) -> String {
    if data.is_empty() || data[0].is_empty() {
        return String::new();
    }

    let col_count = data[0].len();

    let mut col_widths: Vec<usize> = vec![0; col_count];
    for row in data {
        for (i, cell) in row.iter().enumerate() {
            if i < col_widths.len() {
                col_widths[i] = col_widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    border(&mut output, &col_widths, '┌', '┬', '┐');

    // Header row
    if let Some(header) = data.first() {
        cells(&mut output, header, &col_widths);
    }

    border(&mut output, &col_widths, '├', '┼', '┤');

    for row in data.iter().skip(1) {
        cells(&mut output, row, &col_widths);
    }

    border(&mut output, &col_widths, '└', '┴', '┘');

    output
}

fn border(output: &mut String, col_widths: &[usize], left: char, mid: char, right: char) {
    output.push(left);
    for (i, width) in col_widths.iter().enumerate() {
        output.push_str(&"─".repeat(*width + 2));
        if i < col_widths.len() - 1 {
            output.push(mid);
        }
    }
    output.push(right);
    output.push('\n');
}

fn cells(output: &mut String, row: &[String], col_widths: &[usize]) {
    output.push('│');
    for (i, cell) in row.iter().enumerate() {
        let width = col_widths.get(i).copied().unwrap_or(0);
        output.push_str(&format!(" {:width$} │", cell, width = width));
    }
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Column};

    #[test]
    fn test_render_preview() {
        let mut table = Table::new(vec![Column::new("id"), Column::new("name")]);
        table.add_row(vec![CellValue::Int(1), "ann".into()]);
        table.add_row(vec![CellValue::Int(2), CellValue::Null]);
        table.add_row(vec![CellValue::Int(3), "cy".into()]);
        table.infer_column_types();

        let text = render_preview(&table, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "┌──────────┬───────────────┐");
        assert_eq!(lines[1], "│ id (int) │ name (string) │");
        assert_eq!(lines[3], "│ 1        │ ann           │");
        assert_eq!(lines[4], "│ 2        │ NULL          │");
        assert_eq!(lines[6], "... 1 more rows");
    }

    #[test]
    fn test_no_columns() {
        assert_eq!(render_preview(&Table::new(Vec::new()), 5), "");
    }
}


