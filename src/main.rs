use argh::FromArgs;
use campfire::{Session, SessionConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(FromArgs)]
/// Collaborative REPL where everyone takes turns in one shared scripting context.
struct Args {
    #[argh(option, default = "String::from(campfire::config::DEFAULT_SESSION_NAME)")]
    /// name for the session; displayed in the welcome banner.
    session: String,

    #[argh(option)]
    /// optional script to run before the session starts.
    bootstrap: Option<PathBuf>,

    #[argh(option, default = "campfire::history::DEFAULT_TAIL")]
    /// number of entries /history shows.
    history_window: usize,

    #[argh(switch, short = 'v')]
    /// log debug events to stderr.
    verbose: bool,
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    init_tracing(args.verbose)?;

    let mut config = SessionConfig::new()
        .with_session_name(args.session)
        .with_history_window(args.history_window);
    if let Some(path) = args.bootstrap {
        config = config.with_bootstrap(path);
    }

    let mut session = Session::new(config, &mut std::io::stdout())?;
    session.run()
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
