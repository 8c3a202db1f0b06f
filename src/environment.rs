use crate::error::{ScriptError, SessionError};
use crate::history::SharedHistory;
use crate::registry::SharedRegistry;
use crate::script::lexer::split_into_tokens;
use crate::script::parser::{construct_expression, construct_program};
use crate::script::{Evaluator, Value};
use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Names bound in every fresh namespace.
pub const SESSION_NAME_VAR: &str = "session_name";
pub const JOINED_VAR: &str = "joined";
pub const HISTORY_VAR: &str = "history";

/// The single namespace every participant's code runs against.
///
/// Besides user bindings it always starts out with:
/// - `session_name`: the configured session name;
/// - `joined`: a live view of the participant registry;
/// - `history`: a live view of the history log.
///
/// The views share the session's registry and log, so joins and submissions
/// made later are visible through them without re-seeding.
pub struct SharedEnvironment {
    vars: HashMap<String, Value>,
    session_name: String,
    registry: SharedRegistry,
    history: SharedHistory,
}

impl SharedEnvironment {
    pub fn new(
        session_name: impl Into<String>,
        registry: SharedRegistry,
        history: SharedHistory,
    ) -> Self {
        let mut env = Self {
            vars: HashMap::new(),
            session_name: session_name.into(),
            registry,
            history,
        };
        env.seed();
        env
    }

    fn seed(&mut self) {
        self.set(SESSION_NAME_VAR, Value::str(self.session_name.as_str()));
        self.set(JOINED_VAR, Value::Players(self.registry.clone()));
        self.set(HISTORY_VAR, Value::History(self.history.clone()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Drop every binding and start over from the seeded names.
    pub fn reset(&mut self) {
        self.vars.clear();
        self.seed();
    }

    /// Run the startup script before the session loop begins.
    ///
    /// Unlike `/load`, any problem here is fatal to the session.
    pub fn bootstrap(&mut self, path: &Path, out: &mut dyn Write) -> Result<(), SessionError> {
        if !path.exists() {
            return Err(SessionError::BootstrapMissing {
                path: path.to_path_buf(),
            });
        }
        let source =
            fs::read_to_string(path).map_err(|source| SessionError::BootstrapUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        self.execute_block(&source, out)
            .map_err(|source| SessionError::BootstrapFailed {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), "bootstrap script executed");
        Ok(())
    }

    /// Run one participant submission.
    ///
    /// The text is first tried as a single expression whose value is returned
    /// for display. If it does not parse as one, it runs as a block of
    /// statements and yields nothing. `None` results are not returned either.
    pub fn execute_submission(
        &mut self,
        code: &str,
        out: &mut dyn Write,
    ) -> Result<Option<Value>, ScriptError> {
        let tokens = split_into_tokens(code)?;
        if let Ok(expr) = construct_expression(tokens.clone()) {
            let value = Evaluator::new(&mut self.vars, out).eval(&expr)?;
            return Ok((!value.is_none()).then_some(value));
        }
        let program = construct_program(tokens)?;
        Evaluator::new(&mut self.vars, out).run(&program)?;
        Ok(None)
    }

    /// Run `source` as a block of statements. Bindings made before a fault stay.
    pub fn execute_block(&mut self, source: &str, out: &mut dyn Write) -> Result<(), ScriptError> {
        let program = construct_program(split_into_tokens(source)?)?;
        Evaluator::new(&mut self.vars, out).run(&program)?;
        Ok(())
    }

    /// Run a script file as a block. `~` at the start of `path` is the home
    /// directory.
    pub fn execute_file(&mut self, path: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let path = expand_home(path);
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Cannot load '{}'", path.display()))?;
        self.execute_block(&source, out)
            .with_context(|| format!("Script '{}' failed", path.display()))?;
        tracing::debug!(path = %path.display(), "script loaded");
        Ok(())
    }
}

/// Replace a leading `~` with the user's home directory, when one is known.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}
