/*!
 * Streaming CRC-32 calculation for file fingerprints
 */

use crate::error::Result;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Streaming hasher that calculates CRC-32 (IEEE) incrementally
///
/// The accumulated value depends only on the bytes fed in, never on how they
/// were split across `update` calls.
pub struct StreamingCrc32 {
    hasher: crc32fast::Hasher,
}

impl StreamingCrc32 {
    /// Create a new streaming hasher
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Update the checksum with new data
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize and return the checksum
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for StreamingCrc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-32 of everything `reader` yields, read `chunk_size` bytes at a time
pub fn crc32_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<u32> {
    let mut hasher = StreamingCrc32::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

/// Calculate the CRC-32 of a file
pub fn calculate_crc32(path: &Path, chunk_size: usize) -> Result<u32> {
    let file = File::open(path)?;
    Ok(crc32_reader(file, chunk_size)?)
}
