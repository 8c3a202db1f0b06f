use campfire::history::HistoryLog;
use campfire::io_adapters::ReaderInput;
use campfire::{Session, SessionConfig, SessionError, SessionState};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Cursor;

fn run_script(config: SessionConfig, lines: &[&str]) -> (Session, String) {
    let mut out = Vec::new();
    let mut session = Session::new(config, &mut out).unwrap();
    let mut input = ReaderInput::new(Cursor::new(lines.join("\n")));
    session.run_with(&mut input, &mut out).unwrap();
    (session, String::from_utf8(out).unwrap())
}

/// Output of each line, without banner, prompts and farewell.
fn responses(session: &mut Session, lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let mut out = Vec::new();
            session.handle_line(line, &mut out).unwrap();
            String::from_utf8(out).unwrap()
        })
        .collect()
}

#[test]
fn anonymous_submission_is_attributed_to_placeholder() {
    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    let out = responses(&mut session, &["2 + 2"]);

    assert_eq!(out, vec!["4\n"]);
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history.entries()[0].author, "anonymous");
    assert_eq!(history.entries()[0].code, "2 + 2");
}

#[test]
fn switching_turns_counts_per_participant() {
    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    let out = responses(
        &mut session,
        &[
            "/join Ada",
            "/join Grace",
            "/switch Grace",
            "y = 10",
            "/players",
            "y * 2",
        ],
    );

    assert_eq!(
        out,
        vec![
            "",
            "",
            "",
            "",
            "* Ada (0 turns)\n* Grace (1 turns) <- active\n",
            "20\n",
        ]
    );
}

#[test]
fn reset_clears_context_and_history_but_keeps_players() {
    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    responses(&mut session, &["/join A", "x = 1"]);

    let out = responses(&mut session, &["/reset", "/players", "/history", "x"]);
    assert_eq!(
        out,
        vec![
            "Context and history cleared; players kept.\n",
            "* A (1 turns) <- active\n",
            "History is empty.\n",
            "Error: name 'x' is not defined\n",
        ]
    );
}

#[test]
fn reset_gives_the_turn_back_to_the_first_player() {
    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    responses(&mut session, &["/join Ada", "/join Grace", "/switch Grace", "y = 1"]);
    assert_eq!(session.prompt(), "[Grace] >>> ");

    let out = responses(&mut session, &["/reset", "/players"]);
    assert_eq!(
        out,
        vec![
            "Context and history cleared; players kept.\n",
            "* Ada (0 turns) <- active\n* Grace (1 turns)\n",
        ]
    );
    assert_eq!(session.prompt(), "[Ada] >>> ");
}

#[test]
fn overly_nested_submission_is_reported_and_session_continues() {
    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    let nested = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));

    let out = responses(
        &mut session,
        &[
            &nested,
            "a = [0]; a[0] = a; b = [0]; b[0] = b",
            "a == b",
            "1 + 1",
        ],
    );
    assert_eq!(
        out,
        vec![
            "Error: too many nested parentheses or operators\n",
            "",
            "Error: maximum recursion depth exceeded in comparison\n",
            "2\n",
        ]
    );
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn leaving_active_player_hands_turn_to_first_member() {
    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    responses(
        &mut session,
        &["/join Ada", "/join Grace", "/join Linus", "/switch Linus", "/leave Linus"],
    );
    assert_eq!(session.prompt(), "[Ada] >>> ");

    responses(&mut session, &["/leave Ada", "/leave Grace"]);
    assert_eq!(session.prompt(), "[no-player] >>> ");
}

#[test]
fn joined_and_history_are_live_in_the_namespace() {
    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    let out = responses(
        &mut session,
        &[
            "/join Ada",
            "joined",
            "/join Grace",
            "len(joined)",
            "history[0].code",
            "history[-1].author",
        ],
    );

    assert_eq!(
        out,
        vec!["", "['Ada']\n", "", "2\n", "joined\n", "Ada\n"]
    );
}

#[test]
fn load_of_missing_file_is_reported_and_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere.cf");

    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    let out = responses(&mut session, &[&format!("/load {}", missing.display())]);

    assert!(out[0].starts_with("Error: Cannot load '"), "{}", out[0]);
    assert_eq!(session.state(), SessionState::Running);
    assert!(session.history().is_empty());
}

#[test]
fn load_with_syntax_error_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("broken.cf");
    fs::write(&script, "x = (1 +\n").unwrap();

    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    let out = responses(&mut session, &[&format!("/load {}", script.display())]);

    assert!(out[0].starts_with("Error: Script '"), "{}", out[0]);
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn saved_history_parses_back_to_the_same_entries() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("log.txt");

    let mut session = Session::new(SessionConfig::default(), &mut Vec::new()).unwrap();
    responses(
        &mut session,
        &["total = 0", "/join Ada", "total += 5", "/join Grace", "/switch Grace", "print(total)"],
    );
    let out = responses(&mut session, &[&format!("/save {}", target.display())]);
    assert_eq!(out, vec![format!("History saved to {}\n", target.display())]);

    let saved = fs::read_to_string(&target).unwrap();
    assert_eq!(
        HistoryLog::parse(&saved),
        vec![
            ("anonymous".to_string(), "total = 0".to_string()),
            ("Ada".to_string(), "total += 5".to_string()),
            ("Grace".to_string(), "print(total)".to_string()),
        ]
    );
}

#[test]
fn bootstrap_populates_namespace_before_first_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("warmup.cf");
    fs::write(&script, "# warm-up\ngoal = 'ship it'\nprint('ready')\n").unwrap();

    let config = SessionConfig::new()
        .with_session_name("Friday")
        .with_bootstrap(&script);
    let (session, out) = run_script(config, &["goal", "session_name"]);

    assert_eq!(
        out,
        "ready\n\
         Welcome to Campfire: Friday!\n\
         Type /help for commands. Everyone shares the same context, take turns!\n\
         [no-player] >>> ship it\n\
         [no-player] >>> Friday\n\
         [no-player] >>> \n\
         Exiting. See you next time!\n"
    );
    assert_eq!(session.history().len(), 2);
}

#[test]
fn missing_bootstrap_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::new().with_bootstrap(dir.path().join("absent.cf"));

    match Session::new(config, &mut Vec::new()) {
        Err(SessionError::BootstrapMissing { path }) => {
            assert!(path.ends_with("absent.cf"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("session started without its bootstrap script"),
    }
}

#[test]
fn failing_bootstrap_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("broken.cf");
    fs::write(&script, "ready = True\nboom()\n").unwrap();
    let config = SessionConfig::new().with_bootstrap(&script);

    let err = Session::new(config, &mut Vec::new()).err().unwrap();
    assert!(matches!(err, SessionError::BootstrapFailed { .. }));
    assert_eq!(
        format!("{:#}", anyhow::Error::from(err)),
        format!(
            "Bootstrap script '{}' failed: name 'boom' is not defined",
            script.display()
        )
    );
}

#[test]
fn custom_marker_and_placeholder() {
    let config = SessionConfig::new()
        .with_marker('!')
        .with_placeholder("guest");
    let mut session = Session::new(config, &mut Vec::new()).unwrap();

    let out = responses(&mut session, &["!players", "1 + 1", "!dance"]);
    assert_eq!(
        out,
        vec![
            "No players have joined yet. Use !join <name> to start.\n",
            "2\n",
            "Unknown command. Type !help for options.\n",
        ]
    );
    assert_eq!(session.history().entries()[0].author, "guest");
}

#[test]
fn end_of_input_says_goodbye() {
    let (session, out) = run_script(SessionConfig::default(), &[]);
    assert!(out.ends_with("[no-player] >>> \nExiting. See you next time!\n"));
    assert_eq!(session.state(), SessionState::Terminated);
}
