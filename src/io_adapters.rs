use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, ErrorKind, Write};

/// Result of one blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line without its trailing newline.
    Line(String),
    /// End of input (Ctrl-D or a closed pipe).
    Eof,
    /// Ctrl-C while waiting for input.
    Interrupted,
}

/// Where the session reads participant input from.
///
/// Implementations show `prompt` in whatever way suits them; `out` is the
/// session output stream for sources that cannot draw their own prompt.
pub trait InputSource {
    fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> Result<ReadOutcome>;
}

/// Interactive terminal input with line editing and recall of earlier lines.
pub struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl InputSource for EditorInput {
    fn read_line(&mut self, prompt: &str, _out: &mut dyn Write) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

/// Line input from any buffered reader, e.g. piped stdin or a test fixture.
pub struct ReaderInput<R> {
    reader: R,
}

impl<R: BufRead> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for ReaderInput<R> {
    fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> Result<ReadOutcome> {
        write!(out, "{}", prompt)?;
        out.flush()?;

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(_) => Ok(ReadOutcome::Line(
                line.trim_end_matches(['\n', '\r']).to_string(),
            )),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(ReadOutcome::Interrupted),
            Err(err) => Err(err.into()),
        }
    }
}
