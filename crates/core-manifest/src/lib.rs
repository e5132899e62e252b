//! Core manifest data structures for midsync
//!
//! This crate defines the request manifest exchanged through the midpoint
//! directory: the only piece of state shared between the requesting and the
//! responding machine.
//!
//! # Key Concepts
//!
//! - **Request Manifest**: subject name, comparison policy, and one fingerprint
//!   per file the requester already has
//! - **Fingerprint**: modification time, size and optional CRC-32 of a file
//! - **Token**: `/`-separated relative path used as the entry key
//!
//! # Example
//!
//! ```no_run
//! use midsync_core_manifest::{Fingerprint, Policy, RequestManifest, Timestamp};
//! use std::path::Path;
//!
//! let mut request = RequestManifest::new("photos", Policy::new(true, false, true)).unwrap();
//! request
//!     .insert(
//!         "2024/img.jpg",
//!         Fingerprint { mtime: Timestamp::new(1_700_000_000, 0), size: 4096, crc32: Some(0xdeadbeef) },
//!     )
//!     .unwrap();
//! request.save(request.path_in(Path::new("/mnt/usb"))).unwrap();
//! ```

pub mod error;
pub mod request;
pub mod token;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use request::{Fingerprint, Policy, RequestManifest, Timestamp};
pub use token::{resolve_token, token_from_relative, validate_name, validate_token};

/// Schema version for request manifests
pub const REQUEST_SCHEMA_VERSION: &str = "midsync.request.v1";

/// File extension of request manifests inside the midpoint directory
pub const REQUEST_EXTENSION: &str = "midsync";
