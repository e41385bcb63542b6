//! Browser front end over the session update loop.
//!
//! ```text
//! request ──► handlers (decode multipart into an Event)
//!                 │
//!                 ▼
//!             spawn_blocking ─► AppState (lock session ─► app::update)
//!                 │
//!                 ▼
//!             View::Page ─► HTML    View::Download ─► attachment
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
pub mod state;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;

pub use router::create_router;
pub use state::AppState;

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(&config);
    let app = create_router(state.clone(), config.max_upload_bytes);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(
        address = %address,
        charts = state.settings.capabilities.charts,
        xlsx_export = state.settings.capabilities.xlsx_export,
        "datawash listening"
    );
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
