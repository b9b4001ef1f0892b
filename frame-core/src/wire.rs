//! Framing shared by `FrameShip` (producer) and `FrameReceiver` (collector).
//!
//! The wire carries no length prefix. A message is terminated solely by the
//! three-byte sentinel `0x0A 0x23 0x04` (LF '#' EOT); the receiver grows its
//! buffer in whole chunks and disambiguates end-of-message from transient
//! network slowness the way `original_source/server/aesd_server.c` did,
//! fixed for the off-by-two and the `<=`-vs-`<` bug noted in spec.md §9.

use std::io::Read;

/// The literal 3-byte message terminator.
pub const SENTINEL: [u8; 3] = [0x0A, 0x23, 0x04];

#[derive(thiserror::Error, Debug)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream ended without the sentinel (truncated message, {0} bytes received)")]
    Truncated(usize),
    #[error("allocation failure growing reassembly buffer to {0} bytes")]
    BufferGrowth(usize),
}

/// Appends the sentinel to `payload` in place, ready to be sent as a single
/// logical wire message.
pub fn append_sentinel(payload: &mut Vec<u8>) {
    payload.extend_from_slice(&SENTINEL);
}

/// Strips the trailing sentinel from `buf`, truncating it in place.
///
/// Returns an error if `buf` is shorter than the sentinel or its last three
/// bytes do not match it.
pub fn strip_sentinel(buf: &mut Vec<u8>) -> Result<(), WireError> {
    if buf.len() < SENTINEL.len() || &buf[buf.len() - SENTINEL.len()..] != SENTINEL {
        return Err(WireError::Truncated(buf.len()));
    }
    buf.truncate(buf.len() - SENTINEL.len());
    Ok(())
}

/// Reads a single sentinel-terminated message from `reader`, growing the
/// buffer by `chunk` bytes at a time.
///
/// Matches spec.md §4.7: repeatedly read up to `chunk` bytes; if the last
/// byte read is the EOT terminator (`0x04`), the message is complete. If the
/// read filled the request exactly, grow by another `chunk` and continue. A
/// short read (fewer than `chunk` bytes) whose last byte is not EOT is a
/// protocol violation (truncated stream) -- note this is strictly `<`, not
/// `<=`, per the bug spec.md §9 calls out in the original implementation.
pub fn recv_until_sentinel<R: Read>(reader: &mut R, chunk: usize) -> Result<Vec<u8>, WireError> {
    let mut buf = Vec::with_capacity(chunk);
    let mut cursor = 0usize;
    loop {
        buf.resize(cursor + chunk, 0);
        let n = read_fill(reader, &mut buf[cursor..cursor + chunk])?;
        let total = cursor + n;
        buf.truncate(total);

        let terminated = n > 0 && buf[total - 1] == 0x04;
        if terminated {
            return Ok(buf);
        }
        if n < chunk {
            return Err(WireError::Truncated(total));
        }
        cursor = total;
    }
}

/// Reads until `buf` is full or the underlying stream reaches EOF, returning
/// the number of bytes actually read (may be less than `buf.len()`).
fn read_fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strip_sentinel_removes_exactly_three_bytes() {
        let mut buf = vec![1, 2, 3];
        buf.extend_from_slice(&SENTINEL);
        strip_sentinel(&mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
    }

    #[test]
    fn strip_sentinel_rejects_missing_terminator() {
        let mut buf = vec![1, 2, 3];
        assert!(strip_sentinel(&mut buf).is_err());
    }

    #[test]
    fn recv_reassembles_single_chunk_message() {
        let mut payload = vec![1, 2, 3];
        append_sentinel(&mut payload);
        let mut cursor = Cursor::new(payload.clone());
        let got = recv_until_sentinel(&mut cursor, 64).unwrap();
        assert_eq!(got, payload);
    }

    #[test]
    fn recv_grows_buffer_across_chunk_boundary() {
        let mut payload = vec![0xABu8; 20];
        append_sentinel(&mut payload);
        let mut cursor = Cursor::new(payload.clone());
        // chunk smaller than payload forces at least one grow-and-continue
        let got = recv_until_sentinel(&mut cursor, 8).unwrap();
        assert_eq!(got, payload);
    }

    #[test]
    fn recv_detects_truncated_stream() {
        let payload = vec![1, 2, 3]; // no sentinel, short read
        let mut cursor = Cursor::new(payload);
        let err = recv_until_sentinel(&mut cursor, 64).unwrap_err();
        assert!(matches!(err, WireError::Truncated(3)));
    }
}
