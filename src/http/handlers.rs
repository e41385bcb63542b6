//! HTTP handlers.
//!
//! Each handler decodes a request into an [`Event`], runs it against the
//! caller's session and encodes the resulting [`View`].

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::dto::HealthResponse;
use super::error::AppError;
use super::session::SessionId;
use super::state::AppState;
use crate::app::{render_page, Controls, Event, View};
use crate::config::ExportFormat;
use crate::output::ExportArtifact;
use crate::parser::UploadedFile;

/// Result type for handlers.
pub type HandlerResult = Result<Response, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: state.settings.capabilities.into(),
    })
}

// =============================================================================
// Page and events
// =============================================================================

/// GET /
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> HandlerResult {
    let session = RequestSession::resolve(&headers);
    let view = run(state, session.id, Vec::new(), Event::View).await?;
    session.respond(view)
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    let form = FormData::read(multipart?).await?;
    debug!(files = form.files.len(), "upload received");

    let session = RequestSession::resolve(&headers);
    let view = run(state, session.id, Vec::new(), Event::Upload(form.files)).await?;
    session.respond(view)
}

/// POST /controls
pub async fn controls(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    let form = FormData::read(multipart?).await?;
    let event = Event::SetControls {
        file: form.required("file")?.to_string(),
        controls: form.controls()?,
    };

    let session = RequestSession::resolve(&headers);
    let view = run(state, session.id, Vec::new(), event).await?;
    session.respond(view)
}

/// POST /export
///
/// When submitted from a file's controls form, the controls on the form are
/// applied before exporting.
pub async fn export(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    let form = FormData::read(multipart?).await?;
    let file = form.required("file")?.to_string();

    let mut setup = Vec::new();
    if form.has("controls") {
        setup.push(Event::SetControls {
            file: file.clone(),
            controls: form.controls()?,
        });
    }
    let event = Event::Export {
        file,
        format: form.format()?,
    };

    let session = RequestSession::resolve(&headers);
    let view = run(state, session.id, setup, event).await?;
    session.respond(view)
}

/// POST /remove
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    let form = FormData::read(multipart?).await?;
    let event = Event::Remove {
        file: form.required("file")?.to_string(),
    };

    let session = RequestSession::resolve(&headers);
    let view = run(state, session.id, Vec::new(), event).await?;
    session.respond(view)
}

// =============================================================================
// Helpers
// =============================================================================

/// Run events on the blocking pool; parsing, filling and exporting are CPU-bound
async fn run(
    state: AppState,
    id: SessionId,
    setup: Vec<Event>,
    event: Event,
) -> Result<View, AppError> {
    tokio::task::spawn_blocking(move || state.dispatch(id, setup, event))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))
}

/// The session a request belongs to, and whether it was just created
struct RequestSession {
    id: SessionId,
    fresh: bool,
}

impl RequestSession {
    fn resolve(headers: &HeaderMap) -> Self {
        match SessionId::from_headers(headers) {
            Some(id) => Self { id, fresh: false },
            None => Self {
                id: SessionId::generate(),
                fresh: true,
            },
        }
    }

    fn respond(self, view: View) -> HandlerResult {
        let mut response = match view {
            View::Page(page) => Html(render_page(&page)?).into_response(),
            View::Download(artifact) => download(artifact)?,
        };
        if self.fresh {
            response
                .headers_mut()
                .insert(header::SET_COOKIE, self.id.set_cookie());
        }
        Ok(response)
    }
}

fn download(artifact: ExportArtifact) -> HandlerResult {
    let disposition = HeaderValue::from_str(&content_disposition(&artifact.filename))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.mime_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name as an RFC 5987 `filename*` parameter
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    if filename.is_ascii() && !filename.contains(['"', '\\']) {
        return format!("attachment; filename=\"{}\"", fallback);
    }

    let mut encoded = String::with_capacity(filename.len() * 3);
    for byte in filename.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => encoded.push(byte as char),
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// Decoded multipart form: text fields in order, plus uploaded files
#[derive(Debug, Default)]
struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormData {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(base_name) {
                // Browsers send an empty file part when nothing was chosen
                Some(file_name) if file_name.is_empty() => {}
                Some(file_name) => {
                    let content = field.bytes().await?;
                    form.files.push(UploadedFile::new(file_name, content.to_vec()));
                }
                None => {
                    let value = field.text().await?;
                    form.fields.push((name, value));
                }
            }
        }
        Ok(form)
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn values(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    fn has(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    fn required(&self, name: &str) -> Result<&str, AppError> {
        self.value(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing form field '{}'", name)))
    }

    fn format(&self) -> Result<Option<ExportFormat>, AppError> {
        self.value("format")
            .filter(|value| !value.is_empty())
            .map(|value| value.parse().map_err(AppError::BadRequest))
            .transpose()
    }

    fn controls(&self) -> Result<Controls, AppError> {
        Ok(Controls {
            fill_missing: self.has("fill_missing"),
            columns: Some(self.values("columns")),
            show_chart: self.has("show_chart"),
            format: self.format()?.unwrap_or_default(),
        })
    }
}

/// Last path component of a client-supplied file name
fn base_name(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}
