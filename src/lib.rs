//! Menu-driven electronic voting system
//!
//! Voter registration, one vote per voter sealed with a SHA-256 digest,
//! feedback collection and tie-aware results, over in-memory or SQLite
//! storage.

pub mod config;
pub mod console;
pub mod crypto;
pub mod errors;
pub mod session;
pub mod storage;
pub mod tally;
pub mod types;

// Re-export commonly used types
pub use errors::{Error, Result};
pub use session::VotingSession;

use config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so they never mix with menu output.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("evote={}", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    installed.map_err(|e| Error::config(format!("cannot install logger: {e}")))?;

    tracing::info!("🗳️  Voting system v{} initialized", VERSION);
    Ok(())
}
