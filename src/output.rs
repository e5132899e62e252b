//! Structured output writer supporting JSON Lines and human-readable modes.

use std::path::Path;

use chrono::{DateTime, Utc};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use midsync_core_manifest::{Policy, RequestManifest};
use serde::Serialize;

use crate::core::{RequestSummary, RespondEvent, RespondOutcome, RespondStats};

/// Output mode for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Read-only summary of a request file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub name: String,
    pub schema: String,
    pub created_utc: DateTime<Utc>,
    pub policy: Policy,
    pub entries: usize,
    pub total_bytes: u64,
}

impl InspectReport {
    pub fn from_manifest(manifest: &RequestManifest) -> Self {
        Self {
            name: manifest.name.clone(),
            schema: manifest.schema.clone(),
            created_utc: manifest.created_utc,
            policy: manifest.policy,
            entries: manifest.len(),
            total_bytes: manifest.total_bytes(),
        }
    }
}

/// One JSON Lines record
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    RequestCreated(&'a RequestSummary),
    Copying { token: &'a str, bytes: u64 },
    WouldCopy { token: &'a str, bytes: u64 },
    Skipped { token: &'a str },
    RespondComplete { stats: &'a RespondStats },
    RespondIncomplete {
        request: String,
        error: String,
        stats: &'a RespondStats,
    },
    Inspect(&'a InspectReport),
    Error { error: String },
}

/// Structured output writer that supports both human-readable and JSON output
#[derive(Debug, Clone, Copy)]
pub struct OutputWriter {
    pub mode: OutputMode,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
        }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    fn emit(&self, record: &Record<'_>) {
        if let Ok(json) = serde_json::to_string(record) {
            println!("{}", json);
        }
    }

    pub fn request_created(&self, summary: &RequestSummary) {
        match self.mode {
            OutputMode::Json => self.emit(&Record::RequestCreated(summary)),
            OutputMode::Human => {
                println!(
                    "request file '{}' created.",
                    summary.manifest_path.display()
                );
                println!(
                    "  {} files recorded ({})",
                    summary.files,
                    format_bytes(summary.total_bytes)
                );
            }
        }
    }

    /// Per-file progress; skipped files are only reported in JSON mode
    pub fn respond_event(&self, event: &RespondEvent<'_>) {
        match (self.mode, event) {
            (OutputMode::Json, RespondEvent::Copying { token, bytes }) => {
                self.emit(&Record::Copying {
                    token: *token,
                    bytes: *bytes,
                })
            }
            (OutputMode::Json, RespondEvent::WouldCopy { token, bytes }) => {
                self.emit(&Record::WouldCopy {
                    token: *token,
                    bytes: *bytes,
                })
            }
            (OutputMode::Json, RespondEvent::Skipped { token }) => {
                self.emit(&Record::Skipped { token: *token })
            }
            (OutputMode::Human, RespondEvent::Copying { token, .. }) => {
                println!("copying '{}' ...", token)
            }
            (OutputMode::Human, RespondEvent::WouldCopy { token, bytes }) => {
                println!("would copy '{}' ({})", token, format_bytes(*bytes))
            }
            (OutputMode::Human, RespondEvent::Skipped { .. }) => {}
        }
    }

    pub fn respond_finished(&self, request_file: &Path, outcome: &RespondOutcome, dry_run: bool) {
        match (self.mode, outcome) {
            (OutputMode::Json, RespondOutcome::Complete(stats)) => {
                self.emit(&Record::RespondComplete { stats })
            }
            (OutputMode::Json, RespondOutcome::Incomplete { stats, error }) => {
                self.emit(&Record::RespondIncomplete {
                    request: request_file.display().to_string(),
                    error: sanitize_error(&error.to_string()),
                    stats,
                })
            }
            (OutputMode::Human, RespondOutcome::Complete(stats)) => {
                let verb = if dry_run { "would copy" } else { "copied" };
                println!(
                    "response complete: {} {} files ({}), {} up to date.",
                    verb,
                    stats.files_copied,
                    format_bytes(stats.bytes_copied),
                    stats.files_skipped
                );
            }
            (OutputMode::Human, RespondOutcome::Incomplete { error, .. }) => {
                eprintln!("Error: {}", sanitize_error(&error.to_string()));
                println!(
                    "response incomplete, request file '{}' updated.",
                    request_file.display()
                );
            }
        }
    }

    pub fn inspect(&self, report: &InspectReport) {
        match self.mode {
            OutputMode::Json => self.emit(&Record::Inspect(report)),
            OutputMode::Human => println!("{}", inspect_table(report)),
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        match self.mode {
            OutputMode::Json => {
                let record = Record::Error {
                    error: sanitize_error(msg),
                };
                if let Ok(json) = serde_json::to_string(&record) {
                    eprintln!("{}", json);
                }
            }
            OutputMode::Human => {
                eprintln!("Error: {}", sanitize_error(msg));
            }
        }
    }
}

fn inspect_table(report: &InspectReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let rows = [
        ("Name", report.name.clone()),
        ("Schema", report.schema.clone()),
        ("Created", report.created_utc.to_rfc3339()),
        ("Policy", describe_policy(&report.policy)),
        ("Entries", report.entries.to_string()),
        ("Total size", format_bytes(report.total_bytes)),
    ];
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key).fg(Color::Cyan), Cell::new(value)]);
    }
    table
}

/// Human form of a policy, e.g. `mtime+crc32`, or `exact mtime` when no flag is set
pub fn describe_policy(policy: &Policy) -> String {
    let flags: Vec<&str> = [
        (policy.mtime, "mtime"),
        (policy.size, "size"),
        (policy.crc32, "crc32"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect();

    if flags.is_empty() {
        "exact mtime".to_string()
    } else {
        flags.join("+")
    }
}

/// Format a byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Sanitize error messages by collapsing whitespace
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_error_mixed() {
        assert_eq!(
            sanitize_error("  error:\n  detail\t  info  \n"),
            "error: detail info"
        );
        assert_eq!(sanitize_error(""), "");
    }

    #[test]
    fn test_output_writer_modes() {
        assert!(OutputWriter::new(true).is_json());
        assert!(!OutputWriter::new(false).is_json());
    }

    #[test]
    fn test_describe_policy() {
        assert_eq!(describe_policy(&Policy::default()), "exact mtime");
        assert_eq!(describe_policy(&Policy::new(true, false, true)), "mtime+crc32");
        assert_eq!(describe_policy(&Policy::new(true, true, true)), "mtime+size+crc32");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_event_records_are_tagged() {
        let json = serde_json::to_string(&Record::Copying {
            token: "a/b.txt",
            bytes: 3,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"copying","token":"a/b.txt","bytes":3}"#);
    }

    #[test]
    fn test_inspect_report_from_manifest() {
        let mut manifest = RequestManifest::new("photos", Policy::new(false, true, false)).unwrap();
        manifest
            .insert(
                "a.txt",
                midsync_core_manifest::Fingerprint {
                    mtime: midsync_core_manifest::Timestamp::new(1, 0),
                    size: 40,
                    crc32: None,
                },
            )
            .unwrap();

        let report = InspectReport::from_manifest(&manifest);
        assert_eq!(report.name, "photos");
        assert_eq!(report.entries, 1);
        assert_eq!(report.total_bytes, 40);

        let rendered = inspect_table(&report).to_string();
        assert!(rendered.contains("photos"));
        assert!(rendered.contains("size"));
    }
}
