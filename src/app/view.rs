//! View models built from a session

use crate::capability::Capabilities;
use crate::chart::{render_bar_chart, ChartData};
use crate::config::ExportFormat;
use crate::model::Table;
use crate::transform::fill_missing;

use super::{FileState, Notice, Session, Settings};

/// Everything the page shows
#[derive(Debug)]
pub struct PageView {
    pub capabilities: Capabilities,
    pub notices: Vec<Notice>,
    pub files: Vec<FileView>,
}

/// What happens in the chart slot of a file card
#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    /// Charting is not available in this process
    Unavailable,
    /// The transformed table has no numeric column
    NoNumericColumns,
    /// Available but not requested
    Hidden,
    Svg(String),
    Failed(String),
}

/// One file card
#[derive(Debug)]
pub struct FileView {
    pub name: String,
    /// Ingest or transform failure
    pub error: Option<String>,
    pub notices: Vec<Notice>,
    /// First rows as uploaded
    pub preview: Option<Table>,
    /// First rows after filling, when filling is on
    pub filled_preview: Option<Table>,
    /// First rows after projection, when a subset of columns is selected
    pub selected_preview: Option<Table>,
    pub all_columns: Vec<String>,
    pub selected_columns: Vec<String>,
    pub fill_missing: bool,
    pub show_chart: bool,
    pub chart: ChartView,
    pub format: ExportFormat,
}

pub(crate) fn build_page(session: &Session, settings: &Settings) -> PageView {
    PageView {
        capabilities: settings.capabilities,
        notices: session.notices.clone(),
        files: session
            .files
            .values()
            .map(|state| build_file(state, settings))
            .collect(),
    }
}

fn build_file(state: &FileState, settings: &Settings) -> FileView {
    let controls = &state.controls;
    let mut view = FileView {
        name: state.upload.name.clone(),
        error: None,
        notices: state.notices.clone(),
        preview: None,
        filled_preview: None,
        selected_preview: None,
        all_columns: Vec::new(),
        selected_columns: Vec::new(),
        fill_missing: controls.fill_missing,
        show_chart: controls.show_chart,
        chart: ChartView::Hidden,
        format: controls.format,
    };

    let original = match &state.table {
        Ok(table) => table,
        Err(e) => {
            view.error = Some(e.clone());
            return view;
        }
    };

    view.preview = Some(original.head(settings.preview_rows));
    view.all_columns = original.column_names();
    view.selected_columns = controls
        .columns
        .clone()
        .unwrap_or_else(|| original.column_names());

    if controls.fill_missing {
        // Means come from the whole column, not the preview rows
        let mut filled = original.clone();
        fill_missing(&mut filled);
        view.filled_preview = Some(filled.head(settings.preview_rows));
    }

    let working = match state.working_table() {
        Some(Ok(table)) => table,
        Some(Err(e)) => {
            view.error = Some(e.to_string());
            return view;
        }
        None => return view,
    };

    if controls.columns.is_some() {
        view.selected_preview = Some(working.head(settings.preview_rows));
    }

    view.chart = chart_view(&working, controls.show_chart, settings);
    view
}

fn chart_view(working: &Table, requested: bool, settings: &Settings) -> ChartView {
    if !settings.capabilities.charts {
        return ChartView::Unavailable;
    }
    let Some(data) = ChartData::from_table(working, settings.chart_rows) else {
        return ChartView::NoNumericColumns;
    };
    if !requested {
        return ChartView::Hidden;
    }
    match render_bar_chart(&data) {
        Ok(svg) => ChartView::Svg(svg),
        Err(e) => ChartView::Failed(e.to_string()),
    }
}
