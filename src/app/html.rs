//! Server-rendered HTML page

use std::fmt::Write;

use anyhow::Result;

use crate::config::ExportFormat;
use crate::model::{CellValue, Table};

use super::view::{ChartView, FileView, PageView};
use super::{Notice, NoticeLevel};

/// Render the full page
pub fn render_page(page: &PageView) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "  <meta charset=\"UTF-8\">")?;
    writeln!(out, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(out, "  <title>File Converter &amp; Cleaner</title>")?;
    writeln!(out, "  <style>")?;
    writeln!(out, "{}", CSS_STYLES)?;
    writeln!(out, "  </style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;

    writeln!(out, "  <div class=\"header\">")?;
    writeln!(out, "    <h1>File Converter &amp; Cleaner</h1>")?;
    writeln!(
        out,
        "    <p>Upload CSV/Excel files, clean data, visualize charts, and download in CSV, Excel, or PDF format.</p>"
    )?;
    writeln!(out, "  </div>")?;

    write_notices(&mut out, &page.notices)?;

    // Upload
    writeln!(out, "  <div class=\"section\">")?;
    writeln!(out, "    <h2>Upload &amp; Process Files</h2>")?;
    writeln!(out, "    <form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">")?;
    writeln!(out, "      <input type=\"file\" name=\"files\" accept=\".csv,.xlsx\" multiple required>")?;
    writeln!(out, "      <button type=\"submit\">Upload</button>")?;
    writeln!(out, "    </form>")?;
    writeln!(out, "  </div>")?;

    for file in &page.files {
        write_file(&mut out, file, page.capabilities.charts, page.capabilities.xlsx_export)?;
    }

    // About
    writeln!(out, "  <div class=\"section about\">")?;
    writeln!(out, "    <h2>About</h2>")?;
    writeln!(out, "    <ul>")?;
    writeln!(out, "      <li>Upload and preview CSV or Excel files</li>")?;
    writeln!(out, "      <li>Fill missing numeric values with the column mean and choose columns</li>")?;
    writeln!(out, "      <li>Chart the first rows as a grouped bar chart</li>")?;
    writeln!(out, "      <li>Download the result as CSV, Excel, or PDF</li>")?;
    writeln!(out, "    </ul>")?;
    writeln!(
        out,
        "    <p class=\"caps\">Charts: {} &middot; Excel export: {}</p>",
        on_off(page.capabilities.charts),
        on_off(page.capabilities.xlsx_export)
    )?;
    writeln!(out, "  </div>")?;

    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;

    Ok(out)
}

fn write_file(out: &mut String, file: &FileView, charts: bool, xlsx: bool) -> Result<()> {
    let name = html_escape(&file.name);

    writeln!(out, "  <div class=\"section file\">")?;
    writeln!(out, "    <h2>Preview: {}</h2>", name)?;
    write_notices(out, &file.notices)?;

    if let Some(ref error) = file.error {
        writeln!(out, "    <div class=\"notice error\">{}</div>", html_escape(error))?;
    }

    if let Some(ref preview) = file.preview {
        write_table(out, preview)?;
    }

    writeln!(out, "    <form method=\"post\" action=\"/controls\" enctype=\"multipart/form-data\">")?;
    writeln!(out, "      <input type=\"hidden\" name=\"file\" value=\"{}\">", name)?;

    if file.preview.is_some() {
        writeln!(out, "      <input type=\"hidden\" name=\"controls\" value=\"1\">")?;
        writeln!(out, "      <label class=\"control\">")?;
        writeln!(
            out,
            "        <input type=\"checkbox\" name=\"fill_missing\" value=\"on\"{}> Fill missing values",
            checked(file.fill_missing)
        )?;
        writeln!(out, "      </label>")?;

        writeln!(out, "      <label class=\"control\">Select columns")?;
        writeln!(out, "        <select name=\"columns\" multiple size=\"{}\">", file.all_columns.len().clamp(2, 8))?;
        // Browsers submit selected options in document order, so chosen
        // columns come first in their chosen order
        let chosen = file
            .selected_columns
            .iter()
            .filter(|column| file.all_columns.contains(column))
            .map(|column| (column, " selected"));
        let rest = file
            .all_columns
            .iter()
            .filter(|column| !file.selected_columns.contains(column))
            .map(|column| (column, ""));
        for (column, selected) in chosen.chain(rest) {
            let column = html_escape(column);
            writeln!(out, "          <option value=\"{}\"{}>{}</option>", column, selected, column)?;
        }
        writeln!(out, "        </select>")?;
        writeln!(out, "      </label>")?;

        if charts && file.chart != ChartView::NoNumericColumns {
            writeln!(out, "      <label class=\"control\">")?;
            writeln!(
                out,
                "        <input type=\"checkbox\" name=\"show_chart\" value=\"on\"{}> Show chart",
                checked(file.show_chart)
            )?;
            writeln!(out, "      </label>")?;
        }

        writeln!(out, "      <fieldset class=\"control\">")?;
        writeln!(out, "        <legend>Convert {} to:</legend>", name)?;
        for format in ExportFormat::ALL {
            let disabled = if format == ExportFormat::Excel && !xlsx { " (unavailable)" } else { "" };
            writeln!(
                out,
                "        <label><input type=\"radio\" name=\"format\" value=\"{}\"{}> {}{}</label>",
                format.extension(),
                checked(file.format == format),
                format.label(),
                disabled
            )?;
        }
        writeln!(out, "      </fieldset>")?;

        writeln!(out, "      <button type=\"submit\">Apply</button>")?;
        writeln!(
            out,
            "      <button type=\"submit\" formaction=\"/export\">Download {} as {}</button>",
            name,
            file.format.label()
        )?;
    }
    writeln!(out, "      <button type=\"submit\" formaction=\"/remove\" class=\"secondary\">Remove</button>")?;
    writeln!(out, "    </form>")?;

    if let Some(ref filled) = file.filled_preview {
        writeln!(out, "    <h3>After filling missing values</h3>")?;
        write_table(out, filled)?;
    }

    if let Some(ref selected) = file.selected_preview {
        writeln!(out, "    <h3>Selected columns</h3>")?;
        write_table(out, selected)?;
    }

    match &file.chart {
        ChartView::Unavailable if file.preview.is_some() => {
            writeln!(
                out,
                "    <div class=\"notice warning\">Charting is not available. Chart visualization is disabled.</div>"
            )?;
        }
        ChartView::Svg(svg) => {
            writeln!(out, "    <div class=\"chart\">")?;
            writeln!(out, "{}", svg)?;
            writeln!(out, "    </div>")?;
        }
        ChartView::Failed(error) => {
            writeln!(out, "    <div class=\"notice error\">{}</div>", html_escape(error))?;
        }
        _ => {}
    }

    writeln!(out, "  </div>")?;
    Ok(())
}

fn write_notices(out: &mut String, notices: &[Notice]) -> Result<()> {
    for notice in notices {
        let class = match notice.level {
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        writeln!(out, "    <div class=\"notice {}\">{}</div>", class, html_escape(&notice.message))?;
    }
    Ok(())
}

fn write_table(out: &mut String, table: &Table) -> Result<()> {
    writeln!(out, "    <table>")?;

    writeln!(out, "      <tr>")?;
    for col in &table.columns {
        writeln!(out, "        <th>{}</th>", html_escape(&col.name))?;
    }
    writeln!(out, "      </tr>")?;

    for row in &table.rows {
        writeln!(out, "      <tr>")?;
        for cell in &row.cells {
            match cell {
                CellValue::Null => writeln!(out, "        <td class=\"null\">None</td>")?,
                _ => writeln!(out, "        <td>{}</td>", html_escape(cell.display()))?,
            }
        }
        writeln!(out, "      </tr>")?;
    }

    writeln!(out, "    </table>")?;
    Ok(())
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "available"
    } else {
        "not available"
    }
}

fn html_escape(s: impl AsRef<str>) -> String {
    s.as_ref()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const CSS_STYLES: &str = r#"
    :root {
      --bg-top: #003333;
      --bg-bottom: #001a1a;
      --fg: #f2f2f2;
      --accent: #e0ffff;
      --button: #00ced1;
      --button-end: #20b2aa;
      --green: #9ece6a;
      --red: #f7768e;
      --yellow: #e0af68;
      --border: rgba(255,255,255,0.15);
    }

    * { box-sizing: border-box; }

    body {
      font-family: 'Segoe UI', sans-serif;
      background: linear-gradient(to bottom right, var(--bg-top), var(--bg-bottom));
      color: var(--fg);
      min-height: 100vh;
      margin: 0;
      padding: 2rem;
      line-height: 1.5;
    }

    .header h1 {
      color: var(--accent);
      text-align: center;
      font-size: 2.4em;
      margin: 0.5rem 0;
    }

    .header p {
      text-align: center;
      opacity: 0.8;
    }

    .section {
      margin: 2rem auto;
      max-width: 1100px;
      padding: 1rem 1.5rem;
      border-radius: 10px;
      background: rgba(255,255,255,0.05);
    }

    .section h2 { color: var(--accent); }

    table {
      border-collapse: collapse;
      margin: 0.75rem 0;
      font-size: 0.9rem;
    }

    th, td {
      text-align: left;
      padding: 0.35rem 0.75rem;
      border: 1px solid var(--border);
    }

    th { background: rgba(255,255,255,0.08); }

    td.null { opacity: 0.5; font-style: italic; }

    .control {
      display: block;
      margin: 0.75rem 0;
      padding: 10px;
      border-radius: 10px;
      background-color: rgba(255,255,255,0.07);
      border: none;
    }

    button {
      background: linear-gradient(to right, var(--button), var(--button-end));
      color: #002b2b;
      border: none;
      border-radius: 10px;
      padding: 0.6em 1.3em;
      font-weight: bold;
      cursor: pointer;
      margin-right: 0.5rem;
    }

    button.secondary { background: rgba(255,255,255,0.2); color: var(--fg); }

    .notice {
      margin: 0.5rem 0;
      padding: 0.6rem 1rem;
      border-radius: 8px;
    }

    .notice.success { background: rgba(158, 206, 106, 0.15); color: var(--green); }
    .notice.warning { background: rgba(224, 175, 104, 0.15); color: var(--yellow); }
    .notice.error { background: rgba(247, 118, 142, 0.15); color: var(--red); }

    .chart { background: #fff; border-radius: 8px; padding: 0.5rem; overflow-x: auto; }

    .caps { opacity: 0.7; font-size: 0.875rem; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{update, Controls, Event, Session, Settings, View};
    use crate::capability::Capabilities;
    use crate::parser::UploadedFile;

    fn render(content: &[u8], name: &str, capabilities: Capabilities) -> String {
        let settings = Settings::default().with_capabilities(capabilities);
        let event = Event::Upload(vec![UploadedFile::new(name, content.to_vec())]);
        match update(Default::default(), event, &settings).0 {
            View::Page(page) => render_page(&page).unwrap(),
            View::Download(_) => panic!("expected page"),
        }
    }

    #[test]
    fn test_escapes_user_text() {
        let html = render(b"<b>,x\n1,2\n", "a&b.csv", Capabilities::none());
        assert!(html.contains("Preview: a&amp;b.csv"));
        assert!(html.contains("<th>&lt;b&gt;</th>"));
        assert!(!html.contains("<th><b></th>"));
    }

    #[test]
    fn test_controls_and_chart_warning() {
        let html = render(b"id,score\n1,\n", "data.csv", Capabilities::none());
        assert!(html.contains("name=\"fill_missing\""));
        assert!(html.contains("<option value=\"score\" selected>score</option>"));
        assert!(html.contains("Charting is not available"));
        assert!(!html.contains("name=\"show_chart\""));
        assert!(html.contains("<td class=\"null\">None</td>"));
        assert!(html.contains("Excel (unavailable)"));
    }

    #[test]
    fn test_selected_columns_render_in_chosen_order() {
        let settings = Settings::default().with_capabilities(Capabilities::none());
        let mut session = Session::default();
        let upload = Event::Upload(vec![UploadedFile::new("t.csv", b"a,b,c\n1,2,3\n".to_vec())]);
        crate::app::apply(&mut session, upload, &settings);
        let controls = Controls {
            columns: Some(vec!["c".to_string(), "a".to_string()]),
            ..Default::default()
        };
        let event = Event::SetControls { file: "t.csv".to_string(), controls };
        let html = match update(session, event, &settings).0 {
            View::Page(page) => render_page(&page).unwrap(),
            View::Download(_) => panic!("expected page"),
        };

        let c = html.find("<option value=\"c\" selected>").unwrap();
        let a = html.find("<option value=\"a\" selected>").unwrap();
        let b = html.find("<option value=\"b\">").unwrap();
        assert!(c < a && a < b);
    }

    #[test]
    fn test_chart_checkbox_only_with_numeric_columns() {
        let caps = Capabilities { charts: true, xlsx_export: true };
        assert!(render(b"n\n1\n", "a.csv", caps).contains("name=\"show_chart\""));
        assert!(!render(b"s\nx\n", "a.csv", caps).contains("name=\"show_chart\""));
    }

    #[test]
    fn test_failed_ingest_shows_error_without_controls() {
        let html = render(b"whatever", "notes.txt", Capabilities::none());
        assert!(html.contains("Unsupported file format: txt"));
        assert!(!html.contains("name=\"fill_missing\""));
        assert!(html.contains("formaction=\"/remove\""));
    }
}
