//! Mean imputation for numeric columns

use crate::model::{CellValue, Table};

/// What a fill pass changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillReport {
    /// Names of columns that had at least one cell filled
    pub columns_filled: Vec<String>,
    /// Total number of cells replaced
    pub cells_filled: usize,
}

/// Mean of the non-null values of every numeric column.
///
/// Entries are `None` for non-numeric columns and for numeric columns
/// without any value.
pub fn column_means(table: &Table) -> Vec<Option<f64>> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            if !column.is_numeric() {
                return None;
            }
            let (sum, count) = table
                .column_values(idx)
                .filter_map(CellValue::as_f64)
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

/// Replace nulls in numeric columns with the column mean.
///
/// Non-numeric columns are untouched. Idempotent: after one pass no
/// numeric column holds a null the next pass could replace.
pub fn fill_missing(table: &mut Table) -> FillReport {
    let means = column_means(table);
    let mut report = FillReport::default();

    for (idx, mean) in means.iter().enumerate() {
        let Some(mean) = *mean else { continue };

        let mut filled = 0;
        for row in &mut table.rows {
            if let Some(cell) = row.cells.get_mut(idx) {
                if cell.is_null() {
                    *cell = CellValue::Float(mean);
                    filled += 1;
                }
            }
        }

        if filled > 0 {
            report.columns_filled.push(table.columns[idx].name.clone());
            report.cells_filled += filled;
        }
    }

    if report.cells_filled > 0 {
        table.infer_column_types();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellType, Column};

    fn scores() -> Table {
        let mut table = Table::new(vec![
            Column::new("id"),
            Column::new("score"),
            Column::new("label"),
            Column::new("empty"),
        ]);
        table.add_row(vec![1i64.into(), 10i64.into(), "a".into(), CellValue::Null]);
        table.add_row(vec![2i64.into(), CellValue::Null, CellValue::Null, CellValue::Null]);
        table.add_row(vec![3i64.into(), 30i64.into(), "c".into(), CellValue::Null]);
        table.infer_column_types();
        table
    }

    #[test]
    fn test_fill_with_mean() {
        let mut table = scores();
        let report = fill_missing(&mut table);

        let score: Vec<_> = table.column_values(1).cloned().collect();
        assert_eq!(score, vec![CellValue::Int(10), CellValue::Int(20), CellValue::Int(30)]);
        assert_eq!(report.cells_filled, 1);
        assert_eq!(report.columns_filled, vec!["score"]);
        assert_eq!(table.columns[1].inferred_type, CellType::Float);
    }

    #[test]
    fn test_non_numeric_and_all_null_columns_untouched() {
        let mut table = scores();
        fill_missing(&mut table);

        assert_eq!(table.rows[1].cells[2], CellValue::Null);
        assert!(table.column_values(3).all(CellValue::is_null));
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mut once = scores();
        fill_missing(&mut once);

        let mut twice = once.clone();
        let report = fill_missing(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(report, FillReport::default());
    }

    #[test]
    fn test_fractional_mean() {
        let mut table = Table::new(vec![Column::new("x")]);
        table.add_row(vec![CellValue::Int(1)]);
        table.add_row(vec![CellValue::Int(2)]);
        table.add_row(vec![CellValue::Null]);
        table.infer_column_types();

        fill_missing(&mut table);
        assert_eq!(table.rows[2].cells[0], CellValue::Float(1.5));
    }

    #[test]
    fn test_column_means() {
        let table = scores();
        assert_eq!(column_means(&table), vec![Some(2.0), Some(20.0), None, None]);
    }
}


