//! Request manifest data structures and operations
//!
//! A request manifest is written by the side that wants updates. It names the
//! subject directory, the comparison policy, and the fingerprint of every file
//! the requester already has. The responding side reads it, pushes what is
//! missing or stale, and either deletes it (done) or rewrites it with the
//! progress made so far (interrupted).

use crate::error::{Error, Result};
use crate::token::{resolve_token, validate_name, validate_token};
use crate::{REQUEST_EXTENSION, REQUEST_SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Which fingerprint fields the staleness check consults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Never replace a file with a candidate whose mtime is older
    #[serde(default)]
    pub mtime: bool,

    /// Never replace a file with a candidate that is smaller
    #[serde(default)]
    pub size: bool,

    /// Decide "changed" by CRC-32 instead of modification time
    #[serde(default)]
    pub crc32: bool,
}

impl Policy {
    pub fn new(mtime: bool, size: bool, crc32: bool) -> Self {
        Self { mtime, size, crc32 }
    }
}

/// File modification time at full filesystem precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since the Unix epoch (negative before 1970)
    pub secs: i64,
    /// Sub-second part, always below 1_000_000_000
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }
}

/// Identity record for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Last modification time
    pub mtime: Timestamp,

    /// Size in bytes
    pub size: u64,

    /// CRC-32 of the content, present only when the policy asked for it
    #[serde(default, with = "crc32_hex")]
    pub crc32: Option<u32>,
}

/// Request manifest: what one side has, and how to compare against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestManifest {
    /// Schema version identifier
    pub schema: String,

    /// Subject name, taken from the requester's directory name
    pub name: String,

    /// Creation timestamp of the original request (UTC)
    pub created_utc: DateTime<Utc>,

    /// Comparison policy chosen by the requester
    pub policy: Policy,

    /// Known files keyed by path token
    pub entries: BTreeMap<String, Fingerprint>,
}

impl RequestManifest {
    /// Create an empty request for `name`
    pub fn new<S: Into<String>>(name: S, policy: Policy) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            schema: REQUEST_SCHEMA_VERSION.to_string(),
            name,
            created_utc: Utc::now(),
            policy,
            entries: BTreeMap::new(),
        })
    }

    /// Record (or replace) the fingerprint for `token`
    pub fn insert<S: Into<String>>(&mut self, token: S, fingerprint: Fingerprint) -> Result<()> {
        let token = token.into();
        validate_token(&token)?;
        self.entries.insert(token, fingerprint);
        Ok(())
    }

    /// Look up the fingerprint recorded for `token`
    pub fn get(&self, token: &str) -> Option<&Fingerprint> {
        self.entries.get(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of recorded file sizes
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|fp| fp.size).sum()
    }

    /// File name of this request inside the midpoint directory
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, REQUEST_EXTENSION)
    }

    /// Location of this request inside `midpoint`
    pub fn path_in(&self, midpoint: &Path) -> PathBuf {
        midpoint.join(self.file_name())
    }

    /// Root of the staging subtree inside `midpoint`
    pub fn staging_root(&self, midpoint: &Path) -> PathBuf {
        midpoint.join(&self.name)
    }

    /// Staging location of `token` inside `midpoint`
    pub fn staging_path(&self, midpoint: &Path, token: &str) -> Result<PathBuf> {
        resolve_token(&self.staging_root(midpoint), token)
    }

    /// Check schema version, subject name and every entry key
    pub fn validate(&self) -> Result<()> {
        if self.schema != REQUEST_SCHEMA_VERSION {
            return Err(Error::version_mismatch(REQUEST_SCHEMA_VERSION, self.schema.as_str()));
        }
        validate_name(&self.name)?;
        for (token, fingerprint) in &self.entries {
            validate_token(token)?;
            if fingerprint.mtime.nanos >= 1_000_000_000 {
                return Err(Error::invalid_token(
                    token.as_str(),
                    "modification time nanoseconds out of range",
                ));
            }
        }
        Ok(())
    }

    /// Serialize to a pretty JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: RequestManifest = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Save the request to `path`, replacing any previous content atomically
    ///
    /// The document is written to a temporary file in the same directory,
    /// flushed to disk and renamed over `path`. A reader sees either the old
    /// document, the new one, or (for a first write) nothing.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".midsync-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }

    /// Load and validate a request from `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::manifest_not_found(path));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

/// Serializes the optional checksum as an 8-digit lowercase hex string
mod crc32_hex {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(crc) => serializer.serialize_some(&format!("{:08x}", crc)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|hex| {
            if hex.len() != 8 {
                return Err(D::Error::custom(format!("crc32 '{}' is not 8 hex digits", hex)));
            }
            u32::from_str_radix(&hex, 16)
                .map_err(|e| D::Error::custom(format!("crc32 '{}': {}", hex, e)))
        })
        .transpose()
    }
}
