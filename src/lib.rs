//! A turn-based REPL where several people share one live scripting namespace.
//!
//! Participants join under a name, take the active turn and submit snippets of a
//! small Python-flavoured language. Every submission runs against the same
//! namespace, is logged with its author and counts towards that author's turns.
//!
//! The main entry point is [`Session`], which reads lines from an
//! [`InputSource`](io_adapters::InputSource), routes control commands such as
//! `/join` or `/save` and executes everything else in the
//! [`SharedEnvironment`](environment::SharedEnvironment).

pub mod config;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod history;
pub mod io_adapters;
pub mod registry;
pub mod script;
mod session;

pub use config::SessionConfig;
pub use error::{RuntimeError, ScriptError, SessionError};
pub use session::{Session, SessionState};
