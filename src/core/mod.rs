/*!
 * Core synchronization engine: fingerprints, staleness and the
 * checkpointed respond loop
 */

pub mod checksum;
pub mod fingerprint;
pub mod lock;
pub mod metadata;
pub mod request;
pub mod respond;
pub mod stager;
pub mod staleness;
pub mod validation;
pub mod walk;

pub use fingerprint::fingerprint_file;
pub use request::{build_request, scan_directory, subject_name, RequestSummary};
pub use respond::{RespondEvent, RespondOutcome, RespondStats, Responder};
pub use stager::{LocalStager, Stager};
pub use staleness::needs_update;

/// Serialize a `Duration` as whole milliseconds
pub(crate) mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
