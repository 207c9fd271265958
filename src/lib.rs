//! # tender-sweep
//!
//! Unattended harvester for bill-of-quantities documents on tender-notice
//! portals that address records by sequential numeric identifiers.
//!
//! ## Design Philosophy
//!
//! tender-sweep is designed to be:
//! - **Unattended** - A sweep runs to a terminal state without supervision
//! - **Bounded** - Combined storage stays under a byte cap
//! - **Degradable** - Missing renderers or extraction engines disable a feature, never the sweep
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use tender_sweep::{Config, Harvester};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.sweep.window = 500;
//!
//!     let harvester = Harvester::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = harvester.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = harvester.run(&CancellationToken::new()).await;
//!     println!("{}: {} productive", report.outcome, report.productive);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archiving of raw captures
pub mod archive;
/// Document capture: attachment links and page rendering
pub mod capture;
/// Notice classification
pub mod classifier;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Table extraction
pub mod extraction;
/// Per-identifier pipeline and sweep controller
pub mod harvester;
/// Portal HTTP client
pub mod http;
/// Storage budget over the raw and clean tiers
pub mod storage;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use capture::{NoopRenderer, PageRenderer};
#[cfg(feature = "browser")]
pub use capture::ChromiumRenderer;
pub use config::{BudgetPolicy, Config};
pub use error::{CaptureError, Error, ExtractionError, Result};
pub use extraction::{ExtractionChain, NoOpExtractor, TableExtractor};
pub use harvester::Harvester;
pub use storage::{PruneReport, StorageBudget};
pub use types::{Event, IdOutcome, RecordId, SweepOutcome, SweepReport, SweepState};

use tokio_util::sync::CancellationToken;

/// Run a full sweep with graceful signal handling.
///
/// A termination signal cancels the sweep token; the identifier in flight
/// finishes and the sweep ends as [`SweepOutcome::AbortedByInterrupt`].
///
/// - **Unix:** listens for SIGTERM and SIGINT, falling back to Ctrl+C if registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use tender_sweep::{Config, Harvester, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let harvester = Harvester::new(Config::default())?;
///
///     // Run with automatic signal handling
///     let report = run_with_shutdown(&harvester).await;
///     println!("{}", report.outcome);
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(harvester: &Harvester) -> SweepReport {
    let token = CancellationToken::new();
    let signal_token = token.clone();
    let watcher = tokio::spawn(async move {
        wait_for_signal().await;
        signal_token.cancel();
    });

    let report = harvester.run(&token).await;
    watcher.abort();
    report
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in sandboxes; ctrl_c still works there
    let (Ok(mut sigterm), Ok(mut sigint)) =
        (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
    else {
        tracing::warn!("signal handlers unavailable, listening for Ctrl+C only");
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!(signal = "Ctrl+C", "stopping after the current identifier"),
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
        return;
    };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    tracing::info!(signal = name, "stopping after the current identifier");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(signal = "Ctrl+C", "stopping after the current identifier"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
