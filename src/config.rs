use crate::dispatcher::DEFAULT_MARKER;
use crate::history::DEFAULT_TAIL;
use std::path::PathBuf;

pub const DEFAULT_SESSION_NAME: &str = "Campfire";
/// Author recorded for submissions made while nobody is active.
pub const DEFAULT_PLACEHOLDER: &str = "anonymous";

/// Settings fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Shown in the banner and bound as `session_name`.
    pub session_name: String,
    /// Script run before the first prompt. Missing or failing is fatal.
    pub bootstrap: Option<PathBuf>,
    /// How many entries `/history` prints.
    pub history_window: usize,
    pub placeholder: String,
    pub marker: char,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_name: DEFAULT_SESSION_NAME.to_string(),
            bootstrap: None,
            history_window: DEFAULT_TAIL,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            marker: DEFAULT_MARKER,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = name.into();
        self
    }

    pub fn with_bootstrap(mut self, path: impl Into<PathBuf>) -> Self {
        self.bootstrap = Some(path.into());
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }
}
