/*!
 * midsync - one-directional directory sync through a midpoint
 *
 * Two machines that never talk to each other exchange files through shared
 * intermediate storage (a USB stick, a network share):
 * - `request` records what the receiving side already has
 * - `respond` stages everything the receiver lacks next to the request,
 *   checkpointing progress so an interrupted run resumes cleanly
 * - CRC-32, size and modification-time comparison policies
 */

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod output;

// Re-export commonly used types
pub use config::{LogLevel, SyncConfig};
pub use core::{build_request, RequestSummary, RespondOutcome, RespondStats, Responder};
pub use error::{MidsyncError, Result};
pub use midsync_core_manifest::{Fingerprint, Policy, RequestManifest, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
