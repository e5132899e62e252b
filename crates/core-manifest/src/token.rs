//! Path tokens: the portable keys of a request manifest
//!
//! A token is a file path relative to a synced root, with `/` as the separator
//! on every platform. Tokens are produced from walked paths on one machine and
//! resolved under a staging root on another, so a token must never be able to
//! name anything outside that root.
//!
//! Segments are UTF-8 text. A literal `%` is written as `%25`, and on Unix
//! any byte that is not part of valid UTF-8 is written as `%XX` (uppercase
//! hex), so every file name round-trips through a token unchanged.

use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

/// Separator used inside tokens regardless of the host platform
pub const TOKEN_SEPARATOR: char = '/';

const ESCAPE: u8 = b'%';

/// Build a token from a path relative to the walked root
pub fn token_from_relative(relative: &Path) -> Result<String> {
    let mut segments = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(encode_segment(segment, relative)?),
            Component::CurDir => continue,
            _ => return Err(Error::invalid_path(relative)),
        }
    }

    if segments.is_empty() {
        return Err(Error::invalid_path(relative));
    }

    let token = segments.join("/");
    validate_token(&token)?;
    Ok(token)
}

/// Check that a token is a non-empty relative path made only of plain segments
pub fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::invalid_token(token, "empty token"));
    }
    if token.contains('\0') {
        return Err(Error::invalid_token(token, "contains NUL byte"));
    }

    for segment in token.split(TOKEN_SEPARATOR) {
        match segment {
            "" => return Err(Error::invalid_token(token, "empty or absolute segment")),
            "." => return Err(Error::invalid_token(token, "current directory component")),
            ".." => return Err(Error::invalid_token(token, "parent directory component")),
            _ => {}
        }
        let decoded = decode_segment(token, segment)?;
        if !is_single_normal_component(&decoded) {
            return Err(Error::invalid_token(
                token,
                format!("segment '{}' is not a plain file name on this platform", segment),
            ));
        }
    }

    Ok(())
}

/// Check that a subject name can be used as one directory level under the midpoint
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(TOKEN_SEPARATOR)
        || name.contains('\0')
        || !is_single_normal_component(OsStr::new(name))
    {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Resolve a validated token under `root`
pub fn resolve_token(root: &Path, token: &str) -> Result<PathBuf> {
    validate_token(token)?;
    let mut path = root.to_path_buf();
    for segment in token.split(TOKEN_SEPARATOR) {
        path.push(decode_segment(token, segment)?);
    }
    Ok(path)
}

fn push_escaped_str(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == ESCAPE as char {
            out.push_str("%25");
        } else {
            out.push(ch);
        }
    }
}

fn push_escaped_byte(out: &mut String, byte: u8) {
    out.push(ESCAPE as char);
    out.push_str(&format!("{:02X}", byte));
}

#[cfg(unix)]
fn encode_segment(segment: &OsStr, _relative: &Path) -> Result<String> {
    use std::os::unix::ffi::OsStrExt;

    let mut out = String::new();
    let mut rest = segment.as_bytes();

    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(text) => {
                push_escaped_str(&mut out, text);
                break;
            }
            Err(err) => {
                let (valid, tail) = rest.split_at(err.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    push_escaped_str(&mut out, text);
                }
                let invalid = err.error_len().unwrap_or(tail.len());
                for byte in &tail[..invalid] {
                    push_escaped_byte(&mut out, *byte);
                }
                rest = &tail[invalid..];
            }
        }
    }

    Ok(out)
}

#[cfg(not(unix))]
fn encode_segment(segment: &OsStr, relative: &Path) -> Result<String> {
    let text = segment.to_str().ok_or_else(|| Error::invalid_path(relative))?;
    let mut out = String::new();
    push_escaped_str(&mut out, text);
    Ok(out)
}

// Only `%25` and escapes of non-ASCII bytes are accepted, so an escape can
// never smuggle in a separator, a NUL or a dot segment.
fn decode_segment(token: &str, segment: &str) -> Result<OsString> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != ESCAPE {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let byte = bytes
            .get(i + 1..i + 3)
            .filter(|hex| hex.iter().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(b)))
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .filter(|byte| *byte == ESCAPE || *byte >= 0x80)
            .ok_or_else(|| Error::invalid_token(token, "malformed escape sequence"))?;
        out.push(byte);
        i += 3;
    }

    bytes_to_os_string(token, out)
}

#[cfg(unix)]
fn bytes_to_os_string(_token: &str, bytes: Vec<u8>) -> Result<OsString> {
    use std::os::unix::ffi::OsStringExt;
    Ok(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn bytes_to_os_string(token: &str, bytes: Vec<u8>) -> Result<OsString> {
    String::from_utf8(bytes)
        .map(OsString::from)
        .map_err(|_| Error::invalid_token(token, "file name is not representable on this platform"))
}

// Rejects backslashes and drive prefixes on Windows, which `Path` parses as
// separators or roots there but not on Unix.
fn is_single_normal_component(segment: &OsStr) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(s)), None) if s == segment
    )
}
