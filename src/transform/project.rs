//! Column projection

use crate::error::{PipelineError, Result};
use crate::model::Table;

/// Restrict the table to exactly `names`, in that order.
///
/// Row count is unchanged. An empty selection leaves a table with rows but
/// no columns.
pub fn project<S: AsRef<str>>(table: &mut Table, names: &[S]) -> Result<()> {
    let indices = names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            table
                .column_index(name)
                .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))
        })
        .collect::<Result<Vec<usize>>>()?;

    table.columns = indices.iter().map(|&i| table.columns[i].clone()).collect();
    for row in &mut table.rows {
        row.cells = indices.iter().map(|&i| row.cells[i].clone()).collect();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Column};

    fn abc() -> Table {
        let mut table = Table::new(vec![Column::new("a"), Column::new("b"), Column::new("c")]);
        table.add_row(vec![1i64.into(), 2i64.into(), 3i64.into()]);
        table.add_row(vec![4i64.into(), 5i64.into(), 6i64.into()]);
        table.infer_column_types();
        table
    }

    #[test]
    fn test_projection_follows_requested_order() {
        let mut table = abc();
        project(&mut table, &["c", "a"]).unwrap();

        assert_eq!(table.column_names(), vec!["c", "a"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1].cells, vec![CellValue::Int(6), CellValue::Int(4)]);
    }

    #[test]
    fn test_empty_selection() {
        let mut table = abc();
        project::<&str>(&mut table, &[]).unwrap();

        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 2);
        assert!(table.rows.iter().all(|r| r.cells.is_empty()));
    }

    #[test]
    fn test_unknown_column() {
        let mut table = abc();
        let before = table.clone();
        let err = project(&mut table, &["a", "zzz"]).unwrap_err();

        assert!(matches!(err, PipelineError::UnknownColumn(ref name) if name == "zzz"));
        assert_eq!(table, before);
    }

    #[test]
    fn test_full_selection_is_noop() {
        let mut table = abc();
        let before = table.clone();
        project(&mut table, &before.column_names()).unwrap();
        assert_eq!(table, before);
    }
}


