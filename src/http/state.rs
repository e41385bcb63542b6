//! Application state for the HTTP server.

use std::sync::Arc;

use crate::app::{self, Event, Settings, View};
use crate::config::Config;

use super::session::{SessionId, SessionStore};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// In-memory sessions, one per browser
    pub sessions: Arc<SessionStore>,
    /// Capabilities and limits fixed at startup
    pub settings: Settings,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new(config.max_sessions)),
            settings: Settings::from_config(config),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Apply `setup` events without rendering, then run `event`.
    ///
    /// Holds the session's lock throughout, so concurrent requests from one
    /// browser are serialized while other sessions proceed.
    pub fn dispatch(&self, id: SessionId, setup: Vec<Event>, event: Event) -> View {
        let handle = self.sessions.get(id);
        let mut session = handle.lock();
        for step in setup {
            app::apply(&mut session, step, &self.settings);
        }
        let (view, next) = app::update(std::mem::take(&mut *session), event, &self.settings);
        *session = next;
        view
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::parser::UploadedFile;

    fn page_files(view: View) -> Vec<String> {
        match view {
            View::Page(page) => page.files.into_iter().map(|f| f.name).collect(),
            View::Download(_) => panic!("expected a page"),
        }
    }

    #[test]
    fn test_requests_for_one_session_wait_for_each_other() {
        let state = AppState::new(&Config::default());
        let id = SessionId::generate();
        let upload = Event::Upload(vec![UploadedFile::new("a.csv", b"x\n1\n".to_vec())]);
        assert_eq!(page_files(state.dispatch(id, Vec::new(), upload)), vec!["a.csv"]);

        let handle = state.sessions.get(id);
        let guard = handle.lock();
        let worker = {
            let state = state.clone();
            thread::spawn(move || state.dispatch(id, Vec::new(), Event::View))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!worker.is_finished());

        // another browser is not held up
        let other = SessionId::generate();
        assert!(page_files(state.dispatch(other, Vec::new(), Event::View)).is_empty());

        drop(guard);
        assert_eq!(page_files(worker.join().unwrap()), vec!["a.csv"]);
        assert_eq!(handle.lock().files.len(), 1);
    }
}
