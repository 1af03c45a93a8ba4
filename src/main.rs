use clap::Parser;
use evote::config::{Config, StorageBackend};
use evote::console::Console;
use evote::storage::open_store;
use evote::VotingSession;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Menu-driven electronic voting system.
///
/// Settings are read from the environment (and `.env`); flags override them.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Storage backend, overrides EVOTE_STORAGE
    #[arg(short, long, value_enum)]
    storage: Option<StorageBackend>,

    /// SQLite database file, overrides EVOTE_DB_PATH
    #[arg(long, value_name = "FILE")]
    db_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "session aborted");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> evote::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(backend) = cli.storage {
        config.storage.backend = backend;
    }
    if let Some(path) = cli.db_path {
        config.storage.path = path;
    }

    evote::init(&config.logging)?;

    let store = open_store(&config.storage)?;
    let session = VotingSession::open(&config.election, store)?;

    let stdin = io::stdin();
    let mut console = Console::new(session, stdin.lock(), io::stdout());
    console.run()
}
