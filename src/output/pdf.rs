//! Single-page PDF table export

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{PipelineError, Result};
use crate::model::Table;

use super::Exporter;

// A4 in points
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 72.0;

const FONT_SIZE: f32 = 8.0;
// Average glyph advance relative to the font size (Helvetica)
const CHAR_WIDTH: f32 = 0.55;
const PAD_X: f32 = 6.0;
const PAD_TOP: f32 = 3.0;
const PAD_BOTTOM: f32 = 3.0;
const HEADER_PAD_BOTTOM: f32 = 6.0;
const GRID_WIDTH: f32 = 0.5;

type Rgb = (f32, f32, f32);
const TEAL: Rgb = (0.0, 0.502, 0.502);
const WHITESMOKE: Rgb = (0.961, 0.961, 0.961);
const BEIGE: Rgb = (0.961, 0.961, 0.863);
const GREY: Rgb = (0.502, 0.502, 0.502);
const BLACK: Rgb = (0.0, 0.0, 0.0);

/// PDF export: header plus the first `row_limit` rows on one page
pub struct PdfOutput {
    row_limit: usize,
}

impl PdfOutput {
    pub fn new() -> Self {
        Self { row_limit: 20 }
    }

    pub fn with_row_limit(row_limit: usize) -> Self {
        Self { row_limit }
    }
}

impl Default for PdfOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for PdfOutput {
    fn render(&self, table: &Table) -> Result<Vec<u8>> {
        let layout = TableLayout::new(table, self.row_limit);
        let content = Content {
            operations: layout.operations(),
        };
        let encoded = content
            .encode()
            .map_err(|e| PipelineError::export("PDF", e))?;
        build_document(encoded)
    }
}

/// Cell text and geometry of the rendered table. Row 0 is the header.
#[derive(Debug)]
pub(crate) struct TableLayout {
    pub(crate) rows: Vec<Vec<String>>,
    pub(crate) widths: Vec<f32>,
}

impl TableLayout {
    pub(crate) fn new(table: &Table, row_limit: usize) -> Self {
        let mut rows: Vec<Vec<String>> = Vec::with_capacity(row_limit + 1);
        rows.push(table.columns.iter().map(|c| pdf_text(&c.name)).collect());
        rows.extend(
            table
                .rows
                .iter()
                .take(row_limit)
                .map(|row| row.cells.iter().map(|c| pdf_text(&c.to_field())).collect()),
        );

        let mut widths: Vec<f32> = (0..table.column_count())
            .map(|col| {
                let chars = rows.iter().map(|r| r[col].chars().count()).max().unwrap_or(0);
                chars as f32 * FONT_SIZE * CHAR_WIDTH + 2.0 * PAD_X
            })
            .collect();

        let available = PAGE_WIDTH - 2.0 * MARGIN;
        let total: f32 = widths.iter().sum();
        if total > available {
            let scale = available / total;
            widths.iter_mut().for_each(|w| *w *= scale);
            for row in &mut rows {
                for (cell, width) in row.iter_mut().zip(&widths) {
                    let fits = ((width - 2.0 * PAD_X) / (FONT_SIZE * CHAR_WIDTH)).floor().max(1.0);
                    truncate_chars(cell, fits as usize);
                }
            }
        }

        Self { rows, widths }
    }

    fn row_height(index: usize) -> f32 {
        let bottom = if index == 0 { HEADER_PAD_BOTTOM } else { PAD_BOTTOM };
        PAD_TOP + FONT_SIZE + bottom
    }

    pub(crate) fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::new();
        if self.widths.is_empty() {
            return ops;
        }

        let table_width: f32 = self.widths.iter().sum();
        let left = (PAGE_WIDTH - table_width) / 2.0;
        let top = PAGE_HEIGHT - MARGIN;

        // Row boundaries from the top down
        let mut edges = vec![top];
        for index in 0..self.rows.len() {
            let last = edges[edges.len() - 1];
            edges.push(last - Self::row_height(index));
        }
        let bottom = edges[edges.len() - 1];

        // Backgrounds
        fill_rect(&mut ops, TEAL, left, edges[1], table_width, top - edges[1]);
        if self.rows.len() > 1 {
            fill_rect(&mut ops, BEIGE, left, bottom, table_width, edges[1] - bottom);
        }

        // Text
        for (index, row) in self.rows.iter().enumerate() {
            let (font, color) = if index == 0 { ("F2", WHITESMOKE) } else { ("F1", BLACK) };
            let pad_bottom = if index == 0 { HEADER_PAD_BOTTOM } else { PAD_BOTTOM };
            let baseline = edges[index + 1] + pad_bottom + FONT_SIZE * 0.2;

            let mut x = left;
            for (cell, width) in row.iter().zip(&self.widths) {
                if !cell.is_empty() {
                    ops.push(Operation::new("BT", vec![]));
                    ops.push(Operation::new("Tf", vec![font.into(), FONT_SIZE.into()]));
                    ops.push(color_op("rg", color));
                    ops.push(Operation::new("Td", vec![(x + PAD_X).into(), baseline.into()]));
                    ops.push(Operation::new("Tj", vec![Object::string_literal(cell.as_str())]));
                    ops.push(Operation::new("ET", vec![]));
                }
                x += width;
            }
        }

        // Grid
        ops.push(color_op("RG", GREY));
        ops.push(Operation::new("w", vec![GRID_WIDTH.into()]));
        for y in &edges {
            line(&mut ops, left, *y, left + table_width, *y);
        }
        let mut x = left;
        line(&mut ops, x, top, x, bottom);
        for width in &self.widths {
            x += width;
            line(&mut ops, x, top, x, bottom);
        }

        ops
    }
}

fn build_document(content: Vec<u8>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = font(&mut doc, "Helvetica");
    let bold = font(&mut doc, "Helvetica-Bold");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let kids: Vec<Object> = vec![page_id.into()];
    let media_box: Vec<Object> = vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PipelineError::export("PDF", e))?;
    Ok(bytes)
}

fn font(doc: &mut Document, base: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    })
}

fn color_op(operator: &str, (r, g, b): Rgb) -> Operation {
    Operation::new(operator, vec![r.into(), g.into(), b.into()])
}

fn fill_rect(ops: &mut Vec<Operation>, color: Rgb, x: f32, y: f32, width: f32, height: f32) {
    ops.push(color_op("rg", color));
    ops.push(Operation::new(
        "re",
        vec![x.into(), y.into(), width.into(), height.into()],
    ));
    ops.push(Operation::new("f", vec![]));
}

fn line(ops: &mut Vec<Operation>, x1: f32, y1: f32, x2: f32, y2: f32) {
    ops.push(Operation::new("m", vec![x1.into(), y1.into()]));
    ops.push(Operation::new("l", vec![x2.into(), y2.into()]));
    ops.push(Operation::new("S", vec![]));
}

/// Only printable ASCII is written; anything else prints as '?'
fn pdf_text(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Column};

    fn numbered(rows: i64) -> Table {
        let mut table = Table::new(vec![Column::new("n"), Column::new("label")]);
        for i in 0..rows {
            table.add_row(vec![CellValue::Int(i), format!("row {}", i).into()]);
        }
        table.infer_column_types();
        table
    }

    fn shown_text(bytes: &[u8]) -> Vec<Vec<u8>> {
        let doc = Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .map(|op| match &op.operands[0] {
                Object::String(bytes, _) => bytes.clone(),
                other => panic!("unexpected operand {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_truncates_to_twenty_rows() {
        let table = numbered(25);
        let layout = TableLayout::new(&table, 20);
        assert_eq!(layout.rows.len(), 21);
        assert_eq!(layout.rows[0], vec!["n", "label"]);
        assert_eq!(layout.rows[20][1], "row 19");

        let bytes = PdfOutput::new().render(&table).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let text = shown_text(&bytes);
        assert_eq!(text.len(), 21 * 2);
        assert_eq!(text[0], b"n".to_vec());
        assert_eq!(text[text.len() - 1], b"row 19".to_vec());
    }

    #[test]
    fn test_short_table_keeps_all_rows() {
        let table = numbered(3);
        let text = shown_text(&PdfOutput::new().render(&table).unwrap());
        assert_eq!(text.len(), 4 * 2);
    }

    #[test]
    fn test_nulls_render_as_blank_cells() {
        let mut table = Table::new(vec![Column::new("a"), Column::new("b")]);
        table.add_row(vec![CellValue::Int(1), CellValue::Null]);
        table.infer_column_types();

        let text = shown_text(&PdfOutput::new().render(&table).unwrap());
        assert_eq!(text, vec![b"a".to_vec(), b"b".to_vec(), b"1".to_vec()]);
    }

    #[test]
    fn test_wide_tables_fit_the_page() {
        let names: Vec<Column> = (0..30).map(|i| Column::new(format!("a_rather_long_column_{}", i))).collect();
        let table = Table::new(names);
        let layout = TableLayout::new(&table, 20);
        let total: f32 = layout.widths.iter().sum();
        assert!(total <= PAGE_WIDTH - 2.0 * MARGIN + 0.01);
    }

    #[test]
    fn test_zero_columns() {
        let table = Table::new(Vec::new());
        let bytes = PdfOutput::new().render(&table).unwrap();
        assert!(shown_text(&bytes).is_empty());
    }

    #[test]
    fn test_pdf_text() {
        assert_eq!(pdf_text("café"), "caf?");
        let mut s = "abcdef".to_string();
        truncate_chars(&mut s, 3);
        assert_eq!(s, "abc");
    }
}


