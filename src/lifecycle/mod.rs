//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve hostname → Compute required agents → Check dependencies
//!         → all found: register
//!         → any missing: exit(1)
//!
//! Shutdown (shutdown.rs):
//!     Terminate request → notify stopping → soft timer (close server) ∥ hard timer
//!         → first to finish reports the reason
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful termination
//! ```
//!
//! # Design Decisions
//! - Fail fast: missing dependencies and unusable registration data are fatal
//! - Shutdown has a deadline: forced exit after the hard timer
//! - Completion is latched, so only one reason is ever reported

pub mod hostname;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{GracefulServer, Shutdown, ShutdownDeadlines, ShutdownReason, Terminator};
pub use startup::{Initializer, StartupError};

/// Log a fatal condition and exit with status 1.
pub fn exit_on_fatal(err: &dyn std::error::Error) -> ! {
    tracing::error!(error = %err, "Fatal error, exiting");
    eprintln!("{err}");
    std::process::exit(1)
}
