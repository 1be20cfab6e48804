//! Chunked frame codec.
//!
//! Every message (request or response, both directions) is a UTF-8 JSON
//! payload carried in a self-delimiting frame:
//!
//! ```text
//! +------------------------+------------------------+-----------+-----+-----------+
//! | chunk size (4 B, BE)   | chunk count N (4 B, BE)| chunk 1   | ... | chunk N   |
//! +------------------------+------------------------+-----------+-----+-----------+
//! ```
//!
//! Chunks are written back-to-back with no delimiters; every chunk except
//! the last is exactly `chunk size` bytes, the last is between 1 and
//! `chunk size` bytes. An empty payload is a header with chunk count 0 and
//! no chunk bytes.
//!
//! The codec assumes TCP semantics: ordered, reliable delivery with
//! arbitrary fragmentation and coalescing of reads.

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, ErrorKind, Read, Write};

/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: u32 = 2048;

/// Frame header length: chunk size word + chunk count word.
pub const HEADER_LEN: usize = 8;

/// Read phase that was in progress when a stream ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    /// The 4-byte chunk size word.
    ChunkSize,
    /// The 4-byte chunk count word.
    ChunkCount,
    /// Chunk at this zero-based index.
    Chunk(u32),
}

impl std::fmt::Display for ReadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadPhase::ChunkSize => write!(f, "chunk size word"),
            ReadPhase::ChunkCount => write!(f, "chunk count word"),
            ReadPhase::Chunk(idx) => write!(f, "chunk {}", idx),
        }
    }
}

/// Framing errors
#[derive(Debug)]
pub enum FrameError {
    /// Peer closed the stream while bytes were still expected.
    Truncated(ReadPhase),
    /// Payload byte count was satisfied but the bytes are not valid
    /// UTF-8 JSON.
    Malformed(serde_json::Error),
    /// Value could not be serialized to JSON.
    Encode(serde_json::Error),
    /// Transport-level read or write failure.
    Io(io::Error),
    /// A chunk size of zero cannot delimit a payload.
    ZeroChunkSize,
    /// Payload needs more chunks than the 32-bit count word can express.
    PayloadTooLarge(usize),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Truncated(phase) => {
                write!(f, "stream ended while reading {}", phase)
            }
            FrameError::Malformed(e) => write!(f, "payload is not valid JSON: {}", e),
            FrameError::Encode(e) => write!(f, "failed to serialize payload: {}", e),
            FrameError::Io(e) => write!(f, "transport error: {}", e),
            FrameError::ZeroChunkSize => write!(f, "chunk size must be at least 1"),
            FrameError::PayloadTooLarge(len) => {
                write!(f, "payload of {} bytes exceeds the chunk count range", len)
            }
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Malformed(e) | FrameError::Encode(e) => Some(e),
            FrameError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        FrameError::Io(e)
    }
}

/// Write one frame: header, then `payload` split into chunks of at most
/// `chunk_size` bytes.
///
/// Blocks until every byte has been handed to the transport. Nothing is
/// written if the chunk size is zero or the payload needs more than
/// `u32::MAX` chunks.
pub fn write_frame<W: Write>(
    writer: &mut W,
    chunk_size: u32,
    payload: &[u8],
) -> Result<(), FrameError> {
    if chunk_size == 0 {
        return Err(FrameError::ZeroChunkSize);
    }

    let chunk_count = payload.len().div_ceil(chunk_size as usize);
    let chunk_count =
        u32::try_from(chunk_count).map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;

    writer.write_all(&chunk_size.to_be_bytes())?;
    writer.write_all(&chunk_count.to_be_bytes())?;

    for chunk in payload.chunks(chunk_size as usize) {
        writer.write_all(chunk)?;
    }
    writer.flush()?;

    Ok(())
}

/// Serialize `value` to JSON and write it as one frame.
pub fn write_value<W, T>(writer: &mut W, chunk_size: u32, value: &T) -> Result<(), FrameError>
where
    W: Write,
    T: ?Sized + Serialize,
{
    let payload = serde_json::to_vec(value).map_err(FrameError::Encode)?;
    write_frame(writer, chunk_size, &payload)
}

/// Read one frame and return the reassembled payload bytes.
///
/// Every chunk before the last is accumulated to exactly the declared
/// chunk size, across as many reads as the stream fragments it into. The
/// wire format does not carry the final chunk's exact length (it is
/// anywhere from 1 to `chunk size` bytes), so the last chunk is taken
/// from a single bounded read. A clean EOF during any phase is reported
/// as [`FrameError::Truncated`] naming that phase.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, FrameError> {
    let chunk_size = read_u32(reader, ReadPhase::ChunkSize)?;
    let chunk_count = read_u32(reader, ReadPhase::ChunkCount)?;

    if chunk_count == 0 {
        return Ok(Vec::new());
    }
    if chunk_size == 0 {
        // A header declaring chunks of zero bytes can never deliver them.
        return Err(FrameError::ZeroChunkSize);
    }

    let chunk_size = chunk_size as usize;
    let mut payload = BytesMut::new();

    for idx in 0..chunk_count {
        let start = payload.len();
        payload.resize(start + chunk_size, 0);

        if idx + 1 < chunk_count {
            // Interior chunk: exactly chunk_size bytes are still in flight.
            reader
                .read_exact(&mut payload[start..start + chunk_size])
                .map_err(|e| match e.kind() {
                    ErrorKind::UnexpectedEof => FrameError::Truncated(ReadPhase::Chunk(idx)),
                    _ => FrameError::Io(e),
                })?;
        } else {
            let n = read_once(reader, &mut payload[start..start + chunk_size])?;
            if n == 0 {
                return Err(FrameError::Truncated(ReadPhase::Chunk(idx)));
            }
            payload.truncate(start + n);
        }
    }

    Ok(payload.to_vec())
}

/// Read one frame and decode its payload as JSON.
pub fn read_value<R, T>(reader: &mut R) -> Result<T, FrameError>
where
    R: Read,
    T: DeserializeOwned,
{
    let payload = read_frame(reader)?;
    serde_json::from_slice(&payload).map_err(FrameError::Malformed)
}

/// Read a big-endian u32, mapping a short read to a truncation fault for
/// the given phase.
fn read_u32<R: Read>(reader: &mut R, phase: ReadPhase) -> Result<u32, FrameError> {
    let mut word = [0u8; 4];
    reader.read_exact(&mut word).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => FrameError::Truncated(phase),
        _ => FrameError::Io(e),
    })?;
    Ok(u32::from_be_bytes(word))
}

/// One read call, retried only on EINTR.
fn read_once<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FrameError> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }
}
