use crate::config::SessionConfig;
use crate::dispatcher::{Command, Input, Signal, unknown_command_notice};
use crate::environment::{SharedEnvironment, expand_home};
use crate::error::SessionError;
use crate::history::{HistoryLog, SharedHistory};
use crate::io_adapters::{EditorInput, InputSource, ReadOutcome, ReaderInput};
use crate::registry::{ParticipantRegistry, SharedRegistry};
use anyhow::Context;
use std::cell::Ref;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

/// Label shown in the prompt while nobody is active.
const NO_PLAYER: &str = "no-player";
const FAREWELL: &str = "Exiting. See you next time!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated,
}

/// One interactive run: the participants, their shared namespace and the log
/// of everything they submitted.
///
/// Faults in participant code never escape [`Session::handle_line`]; they are
/// printed as `Error: ...` and the session carries on. The only errors it
/// returns come from the input or output streams themselves.
///
/// ```
/// use campfire::{Session, SessionConfig};
///
/// let mut out = Vec::new();
/// let mut session = Session::new(SessionConfig::default(), &mut out).unwrap();
/// session.handle_line("/join Ada", &mut out).unwrap();
/// session.handle_line("6 * 7", &mut out).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "42\n");
/// ```
pub struct Session {
    config: SessionConfig,
    registry: SharedRegistry,
    history: SharedHistory,
    environment: SharedEnvironment,
    state: SessionState,
}

impl Session {
    /// Set up a session and run the bootstrap script, if configured.
    pub fn new(config: SessionConfig, out: &mut dyn Write) -> Result<Self, SessionError> {
        let registry = ParticipantRegistry::shared();
        let history = HistoryLog::shared();
        let mut environment =
            SharedEnvironment::new(config.session_name.as_str(), registry.clone(), history.clone());

        if let Some(path) = &config.bootstrap {
            environment.bootstrap(path, out).inspect_err(|err| {
                tracing::error!(path = %path.display(), error = %err, "bootstrap failed");
            })?;
        }

        tracing::info!(session = %config.session_name, "session started");
        Ok(Self {
            config,
            registry,
            history,
            environment,
            state: SessionState::Running,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> Ref<'_, ParticipantRegistry> {
        self.registry.borrow()
    }

    pub fn history(&self) -> Ref<'_, HistoryLog> {
        self.history.borrow()
    }

    pub fn environment(&self) -> &SharedEnvironment {
        &self.environment
    }

    pub fn banner(&self) -> String {
        format!(
            "Welcome to Campfire: {}!\nType {}help for commands. Everyone shares the same context, take turns!",
            self.config.session_name, self.config.marker
        )
    }

    /// `[Ada] >>> `, or `[no-player] >>> ` while nobody is active.
    pub fn prompt(&self) -> String {
        let registry = self.registry.borrow();
        format!("[{}] >>> ", registry.active().unwrap_or(NO_PLAYER))
    }

    /// Process one line of input and write whatever it reports to `out`.
    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> anyhow::Result<Signal> {
        let signal = match Input::parse(line, self.config.marker) {
            Input::Empty => Signal::Continue,
            Input::Command(command) => self.run_command(command, out)?,
            Input::Submission(code) => {
                self.submit(&code, out)?;
                Signal::Continue
            }
        };
        if signal == Signal::Terminate {
            self.state = SessionState::Terminated;
        }
        Ok(signal)
    }

    fn run_command(&mut self, command: Command, out: &mut dyn Write) -> anyhow::Result<Signal> {
        match command {
            Command::Join(name) => self.registry.borrow_mut().join(&name),
            Command::Switch(name) => self.registry.borrow_mut().set_active(&name),
            Command::Leave(name) => self.registry.borrow_mut().leave(&name),
            Command::Players => self.print_players(out)?,
            Command::History => self.print_history(out)?,
            Command::Load(path) => {
                if let Err(err) = self.environment.execute_file(&path, out) {
                    report(&err, out)?;
                }
            }
            Command::Save(path) => match self.save_history(&path) {
                Ok(destination) => {
                    writeln!(out, "History saved to {}", destination.display())?;
                }
                Err(err) => report(&err, out)?,
            },
            Command::Reset => {
                self.environment.reset();
                self.history.borrow_mut().clear();
                self.registry.borrow_mut().activate_first();
                tracing::debug!("context and history reset");
                writeln!(out, "Context and history cleared; players kept.")?;
            }
            Command::Help => writeln!(out, "{}", Command::help_text(self.config.marker))?,
            Command::Quit => return Ok(Signal::Terminate),
            Command::Unknown(name) => {
                tracing::debug!(command = %name, "unknown command");
                writeln!(out, "{}", unknown_command_notice(self.config.marker))?;
            }
        }
        Ok(Signal::Continue)
    }

    /// Record, count and execute a submission. The entry stays in the log
    /// even when execution fails.
    fn submit(&mut self, code: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let author = match self.registry.borrow().active() {
            Some(name) => name.to_string(),
            None => self.config.placeholder.clone(),
        };
        self.history.borrow_mut().record(author.as_str(), code);
        self.registry.borrow_mut().record_turn(&author);
        tracing::debug!(author = %author, code, "submission");

        match self.environment.execute_submission(code, out) {
            Ok(Some(value)) => writeln!(out, "{}", value)?,
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(author = %author, error = %err, "submission failed");
                writeln!(out, "Error: {}", err)?;
            }
        }
        Ok(())
    }

    fn print_players(&self, out: &mut dyn Write) -> io::Result<()> {
        let registry = self.registry.borrow();
        if registry.is_empty() {
            return writeln!(
                out,
                "No players have joined yet. Use {}join <name> to start.",
                self.config.marker
            );
        }
        for line in registry.describe() {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    fn print_history(&self, out: &mut dyn Write) -> io::Result<()> {
        let history = self.history.borrow();
        if history.is_empty() {
            return writeln!(out, "History is empty.");
        }
        for entry in history.tail(self.config.history_window) {
            writeln!(out, "{}", entry)?;
        }
        Ok(())
    }

    fn save_history(&self, path: &str) -> anyhow::Result<PathBuf> {
        let destination = expand_home(path);
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }
        fs::write(&destination, self.history.borrow().serialize())
            .with_context(|| format!("Cannot write history to '{}'", destination.display()))?;
        tracing::debug!(path = %destination.display(), "history saved");
        Ok(destination)
    }

    /// Print the banner, then read and handle lines until the session ends.
    pub fn run_with(
        &mut self,
        input: &mut dyn InputSource,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.banner())?;
        while self.state == SessionState::Running {
            match input.read_line(&self.prompt(), out)? {
                ReadOutcome::Line(line) => {
                    self.handle_line(&line, out)?;
                }
                ReadOutcome::Eof | ReadOutcome::Interrupted => {
                    writeln!(out)?;
                    writeln!(out, "{}", FAREWELL)?;
                    self.state = SessionState::Terminated;
                }
            }
            out.flush()?;
        }
        tracing::info!(
            session = %self.config.session_name,
            submissions = self.history.borrow().len(),
            "session ended"
        );
        Ok(())
    }

    /// Run against the process's standard streams. A terminal gets the line
    /// editor; anything else is read line by line.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut out = io::stdout();
        if io::stdin().is_terminal() {
            let mut input = EditorInput::new().context("Cannot initialise line editor")?;
            self.run_with(&mut input, &mut out)
        } else {
            let mut input = ReaderInput::new(io::stdin().lock());
            self.run_with(&mut input, &mut out)
        }
    }
}

fn report(err: &anyhow::Error, out: &mut dyn Write) -> io::Result<()> {
    tracing::debug!(error = %format!("{:#}", err), "command failed");
    writeln!(out, "Error: {:#}", err)
}
