//! Chunked byte-swap passthrough
//!
//! Copies a stream while reversing the bytes of every fixed-width element.
//! Work happens in chunks of [`BYTESWAP_CHUNK_SIZE`] bytes rounded down to a
//! whole number of elements; chunk boundaries are the only points at which
//! the caller regains control through the progress callback.

use std::io::{Read, Write};

use tracing::{debug, warn};

use crate::constants::BYTESWAP_CHUNK_SIZE;
use crate::{Error, Result};

/// Totals of one passthrough run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapSummary {
    /// Bytes copied verbatim before swapping started
    pub skipped: u64,
    /// Elements swapped
    pub elements: u64,
    /// Trailing bytes that did not form a whole element
    pub trailing: u64,
}

impl SwapSummary {
    /// Total bytes written
    pub fn bytes(&self, width: usize) -> u64 {
        self.skipped + self.elements * width as u64 + self.trailing
    }
}

fn fill(reader: &mut dyn Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io("Byteswap read failed", e)),
        }
    }
    Ok(filled)
}

/// Swap every `width`-byte element of `reader` into `writer`
///
/// The first `skip` bytes pass through unchanged. `on_chunk` receives the
/// running byte count after each chunk is written.
pub fn swap_stream(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    width: usize,
    skip: usize,
    on_chunk: &mut dyn FnMut(u64),
) -> Result<SwapSummary> {
    if !matches!(width, 2 | 4 | 8) {
        return Err(Error::invalid_format(
            width.to_string(),
            "byteswap element width must be 2, 4 or 8 bytes",
        ));
    }
    let mut summary = SwapSummary::default();

    if skip > 0 {
        let mut head = vec![0u8; skip];
        let got = fill(reader, &mut head)?;
        writer
            .write_all(&head[..got])
            .map_err(|e| Error::write_failure("Byteswap header write failed", e))?;
        summary.skipped = got as u64;
        if got < skip {
            on_chunk(summary.bytes(width));
            return Ok(summary);
        }
    }

    let chunk_size = (BYTESWAP_CHUNK_SIZE / width).max(1) * width;
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let got = fill(reader, &mut chunk)?;
        if got == 0 {
            break;
        }
        let whole = got / width * width;
        for element in chunk[..whole].chunks_exact_mut(width) {
            element.reverse();
        }
        writer
            .write_all(&chunk[..got])
            .map_err(|e| Error::write_failure("Byteswap chunk write failed", e))?;
        summary.elements += (whole / width) as u64;
        if got > whole {
            summary.trailing = (got - whole) as u64;
            warn!(
                "Stream ends with {} bytes that do not form a whole {}-byte element; copied unchanged",
                summary.trailing, width
            );
        }
        on_chunk(summary.bytes(width));
        if got < chunk_size {
            break;
        }
    }
    debug!(
        "Byteswap passthrough: {} elements of {} bytes, {} skipped, {} trailing",
        summary.elements, width, summary.skipped, summary.trailing
    );
    Ok(summary)
}
