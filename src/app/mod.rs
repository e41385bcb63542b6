//! Session state and the event-driven update loop.
//!
//! Every user interaction is an [`Event`]. [`update`] applies it to the
//! caller's [`Session`] and returns what to show next together with the new
//! session. Nothing here knows about HTTP; the server only decodes events and
//! encodes views.

mod html;
mod view;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::capability::Capabilities;
use crate::config::{Config, ExportFormat};
use crate::error::Result;
use crate::model::Table;
use crate::output::{ExportArtifact, ExportFactory};
use crate::parser::{ParserFactory, UploadedFile};
use crate::transform::{self, TransformOptions};

pub use html::render_page;
pub use view::{ChartView, FileView, PageView};

/// Per-file user choices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controls {
    pub fill_missing: bool,
    /// Selected columns in order; `None` selects every column
    pub columns: Option<Vec<String>>,
    pub show_chart: bool,
    pub format: ExportFormat,
}

impl Controls {
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            fill_missing: self.fill_missing,
            columns: self.columns.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A message shown once on the next page render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// One uploaded file and everything the user chose for it
#[derive(Debug, Clone)]
pub struct FileState {
    pub upload: UploadedFile,
    /// Ingested table; `Err` holds the ingest failure shown on the file's card
    pub table: std::result::Result<Table, String>,
    pub controls: Controls,
    pub notices: Vec<Notice>,
}

impl FileState {
    /// The table after the file's transform steps, fill first
    pub fn working_table(&self) -> Option<Result<Table>> {
        let original = self.table.as_ref().ok()?;
        let mut working = original.clone();
        Some(transform::apply(&mut working, &self.controls.transform_options()).map(|_| working))
    }
}

/// Everything one browser session holds; lives only in memory
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Files keyed by name, in upload order
    pub files: IndexMap<String, FileState>,
    /// Page-level notices not tied to a file
    pub notices: Vec<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A user interaction
#[derive(Debug, Clone)]
pub enum Event {
    /// Show the page
    View,
    /// One or more files were uploaded
    Upload(Vec<UploadedFile>),
    /// The controls of one file changed
    SetControls { file: String, controls: Controls },
    /// Download button pressed; `format` overrides the stored choice
    Export { file: String, format: Option<ExportFormat> },
    /// Drop a file from the session
    Remove { file: String },
}

/// What the client should receive after an event
#[derive(Debug)]
pub enum View {
    Page(PageView),
    Download(ExportArtifact),
}

/// Fixed inputs of the update loop, derived once at startup
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub capabilities: Capabilities,
    pub preview_rows: usize,
    pub chart_rows: usize,
    pub pdf_rows: usize,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            capabilities: Capabilities::from_config(config),
            preview_rows: config.preview_rows,
            chart_rows: config.chart_row_limit,
            pdf_rows: config.pdf_row_limit,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Apply one event to a session without rendering.
///
/// Returns the export produced by an [`Event::Export`] that succeeded.
pub fn apply(session: &mut Session, event: Event, settings: &Settings) -> Option<ExportArtifact> {
    match event {
        Event::View => {}
        Event::Upload(files) => upload(session, files),
        Event::SetControls { file, controls } => match session.files.get_mut(&file) {
            Some(state) => set_controls(state, controls),
            None => session.notices.push(unknown_file(&file)),
        },
        Event::Export { file, format } => match session.files.get_mut(&file) {
            Some(state) => {
                if let Some(format) = format {
                    state.controls.format = format;
                }
                return export(state, settings);
            }
            None => session.notices.push(unknown_file(&file)),
        },
        Event::Remove { file } => {
            if session.files.shift_remove(&file).is_some() {
                info!(file = %file, "removed file from session");
            } else {
                session.notices.push(unknown_file(&file));
            }
        }
    }
    None
}

/// Apply one event and produce the next view and session.
///
/// Rendering a page consumes the notices it shows.
pub fn update(mut session: Session, event: Event, settings: &Settings) -> (View, Session) {
    if let Some(artifact) = apply(&mut session, event, settings) {
        return (View::Download(artifact), session);
    }

    let page = view::build_page(&session, settings);
    session.notices.clear();
    for state in session.files.values_mut() {
        state.notices.clear();
    }
    (View::Page(page), session)
}

fn unknown_file(name: &str) -> Notice {
    Notice::warning(format!("No file named '{}' in this session", name))
}

fn upload(session: &mut Session, files: Vec<UploadedFile>) {
    let parsers = ParserFactory::new();
    for upload in files {
        let (table, notice) = match parsers.parse(&upload) {
            Ok(table) => {
                let message = format!(
                    "Loaded {} rows and {} columns",
                    table.row_count(),
                    table.column_count()
                );
                (Ok(table), Some(Notice::success(message)))
            }
            Err(e) => {
                warn!(file = %upload.name, error = %e, "ingest failed");
                (Err(e.to_string()), None)
            }
        };

        let name = upload.name.clone();
        if session.files.contains_key(&name) {
            info!(file = %name, "replacing previously uploaded file");
        }
        session.files.insert(
            name,
            FileState {
                upload,
                table,
                controls: Controls::default(),
                notices: notice.into_iter().collect(),
            },
        );
    }
}

fn set_controls(state: &mut FileState, mut controls: Controls) {
    let Ok(table) = state.table.as_ref() else {
        state.controls = controls;
        return;
    };

    if let Some(selected) = controls.columns.take() {
        let (known, unknown): (Vec<String>, Vec<String>) =
            selected.into_iter().partition(|name| table.column_index(name).is_some());
        if !unknown.is_empty() {
            state
                .notices
                .push(Notice::warning(format!("Ignored unknown columns: {}", unknown.join(", "))));
        }
        // Selecting everything in the original order is the default
        controls.columns = (known != table.column_names()).then_some(known);
    }

    if controls.fill_missing && !state.controls.fill_missing {
        state.notices.push(Notice::success("Missing values filled"));
    }
    state.controls = controls;
}

fn export(state: &mut FileState, settings: &Settings) -> Option<ExportArtifact> {
    let working = match state.working_table() {
        Some(Ok(table)) => table,
        Some(Err(e)) => {
            state.notices.push(Notice::error(e.to_string()));
            return None;
        }
        None => {
            state
                .notices
                .push(Notice::error("This file could not be read, so it cannot be exported"));
            return None;
        }
    };

    let factory = ExportFactory::new(settings.capabilities).with_pdf_row_limit(settings.pdf_rows);
    match factory.export(&working, &state.upload.name, state.controls.format) {
        Ok(artifact) => {
            state.notices.push(Notice::success("File ready for download"));
            Some(artifact)
        }
        Err(e) => {
            state.notices.push(Notice::error(e.to_string()));
            None
        }
    }
}
