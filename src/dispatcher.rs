//! Classification of input lines into control commands and code submissions.

/// Prefix that marks a line as a control command unless configured otherwise.
pub const DEFAULT_MARKER: char = '/';

/// Notice printed for unrecognized or incomplete commands.
pub fn unknown_command_notice(marker: char) -> String {
    format!("Unknown command. Type {}help for options.", marker)
}

/// One classified line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line; nothing happens.
    Empty,
    Command(Command),
    /// Code to record and execute in the shared namespace.
    Submission(String),
}

/// Control command typed after the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join(String),
    Switch(String),
    Leave(String),
    Players,
    History,
    Load(String),
    Save(String),
    Reset,
    Help,
    Quit,
    /// Unrecognized command, or a recognized one missing its argument.
    Unknown(String),
}

/// Whether the session loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Terminate,
}

impl Input {
    /// Classify a raw line. Surrounding whitespace is ignored.
    pub fn parse(line: &str, marker: char) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Input::Empty;
        }
        match trimmed.strip_prefix(marker) {
            Some(body) => Input::Command(Command::parse(body)),
            None => Input::Submission(trimmed.to_string()),
        }
    }
}

impl Command {
    /// Parse the text following the marker.
    ///
    /// The command word is case-insensitive. Arguments are split on whitespace
    /// and joined back with single spaces, so `/join  Ada   Lovelace` joins
    /// "Ada Lovelace".
    pub fn parse(body: &str) -> Self {
        let mut parts = body.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.collect::<Vec<_>>().join(" ");

        match (name.as_str(), arg.is_empty()) {
            ("join", false) => Command::Join(arg),
            ("switch", false) => Command::Switch(arg),
            ("leave", false) => Command::Leave(arg),
            ("load", false) => Command::Load(arg),
            ("save", false) => Command::Save(arg),
            ("players", _) => Command::Players,
            ("history", _) => Command::History,
            ("reset", _) => Command::Reset,
            ("help", _) => Command::Help,
            ("quit", _) => Command::Quit,
            _ => Command::Unknown(name),
        }
    }

    /// Command reference shown by `/help`.
    pub fn help_text(marker: char) -> String {
        let m = marker;
        format!(
            "Commands (prefix with {m}):
  {m}join <name>      Add a player and set as active if first
  {m}switch <name>    Change the active player
  {m}leave <name>     Remove a player
  {m}players          Show joined players and turn counts
  {m}history          Show session history
  {m}load <path>      Execute a script file in the shared context
  {m}reset            Clear history and context (keeps players)
  {m}save <path>      Write history to a file
  {m}help             Show this help message
  {m}quit             Exit the session

Everything else is executed as code in the shared context."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn command(line: &str) -> Command {
        match Input::parse(line, DEFAULT_MARKER) {
            Input::Command(command) => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Input::parse("", DEFAULT_MARKER), Input::Empty);
        assert_eq!(Input::parse("   \t", DEFAULT_MARKER), Input::Empty);
    }

    #[test]
    fn test_parse_submission() {
        assert_eq!(
            Input::parse("  x = 1  ", DEFAULT_MARKER),
            Input::Submission("x = 1".to_string())
        );
    }

    #[test]
    fn test_division_is_not_a_command() {
        assert_eq!(
            Input::parse("10 / 2", DEFAULT_MARKER),
            Input::Submission("10 / 2".to_string())
        );
    }

    #[test]
    fn test_parse_join() {
        assert_eq!(command("/join Ada"), Command::Join("Ada".to_string()));
    }

    #[test]
    fn test_multi_word_names_are_space_joined() {
        assert_eq!(
            command("/join   Ada    Lovelace "),
            Command::Join("Ada Lovelace".to_string())
        );
        assert_eq!(
            command("/save out dir/log.txt"),
            Command::Save("out dir/log.txt".to_string())
        );
    }

    #[test]
    fn test_parse_switch_and_leave() {
        assert_eq!(command("/switch Grace"), Command::Switch("Grace".to_string()));
        assert_eq!(command("/leave Grace"), Command::Leave("Grace".to_string()));
    }

    #[test]
    fn test_missing_argument_is_unknown() {
        assert_eq!(command("/join"), Command::Unknown("join".to_string()));
        assert_eq!(command("/load   "), Command::Unknown("load".to_string()));
        assert_eq!(command("/save"), Command::Unknown("save".to_string()));
    }

    #[test]
    fn test_arguments_ignored_where_unused() {
        assert_eq!(command("/players all"), Command::Players);
        assert_eq!(command("/history 10"), Command::History);
        assert_eq!(command("/help me"), Command::Help);
        assert_eq!(command("/quit now"), Command::Quit);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(command("/JOIN Ada"), Command::Join("Ada".to_string()));
        assert_eq!(command("/Reset"), Command::Reset);
        assert_eq!(command("/QUIT"), Command::Quit);
    }

    #[test]
    fn test_argument_case_is_preserved() {
        assert_eq!(command("/Switch ADA"), Command::Switch("ADA".to_string()));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(command("/dance"), Command::Unknown("dance".to_string()));
        assert_eq!(command("/"), Command::Unknown(String::new()));
    }

    #[test]
    fn test_custom_marker() {
        assert_eq!(Input::parse("!players", '!'), Input::Command(Command::Players));
        assert_eq!(
            Input::parse("/players", '!'),
            Input::Submission("/players".to_string())
        );
    }

    #[test]
    fn test_help_text_lists_commands() {
        let help = Command::help_text(DEFAULT_MARKER);
        for name in [
            "join", "switch", "leave", "players", "history", "load", "reset", "save", "help",
            "quit",
        ] {
            assert!(help.contains(&format!("/{}", name)), "missing {}", name);
        }
        assert!(Command::help_text('!').contains("!join <name>"));
    }
}
