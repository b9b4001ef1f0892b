//! `FrameReceiver`: reassembles one sentinel-terminated message per
//! connection and commits it to a numbered file under a shared write lock.
//! spec.md §4.7.

use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use frame_core::{wire, EncodedFrame, LocalStore};

/// One oversized raster worth, per spec.md §4.7.
pub const BUF_SIZE: usize = 925_696;

#[derive(thiserror::Error, Debug)]
pub enum ReceiverError {
    #[error(transparent)]
    Wire(#[from] wire::WireError),
    #[error(transparent)]
    Store(#[from] frame_core::StoreError),
}

/// The process-wide monotonic sequence counter and filesystem write lock,
/// shared across every `FrameReceiver` task. spec.md §5: "held only across
/// the open/write/close of one file".
pub struct SharedState {
    next_slot: AtomicU64,
    write_lock: Mutex<()>,
    store: LocalStore,
}

impl SharedState {
    pub fn new(store: LocalStore) -> Self {
        Self {
            next_slot: AtomicU64::new(0),
            write_lock: Mutex::new(()),
            store,
        }
    }
}

/// Reads one message from `stream`, strips the sentinel, and commits it to
/// the next sequence slot. Returns the committed path on success.
pub fn receive_one(stream: &mut TcpStream, shared: &Arc<SharedState>) -> Result<PathBuf, ReceiverError> {
    let mut buf = wire::recv_until_sentinel(stream, BUF_SIZE)?;
    wire::strip_sentinel(&mut buf)?;

    let encoded = EncodedFrame::from_bytes(buf);

    let _guard = shared.write_lock.lock();
    let slot = shared.next_slot.fetch_add(1, Ordering::AcqRel);
    shared.store.write(slot, &encoded)?;
    Ok(shared.store.path_for(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn shared_state() -> (Arc<SharedState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path()).unwrap();
        (Arc::new(SharedState::new(store)), tmp)
    }

    #[test]
    fn commits_byte_identical_payload() {
        let (shared, _tmp) = shared_state();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let payload = b"P6\n#hi\n2 2\n255\n\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0A\x0B\x0C".to_vec();
        let mut to_send = payload.clone();
        wire::append_sentinel(&mut to_send);

        let sender = std::thread::spawn(move || {
            let mut conn = std::net::TcpStream::connect(addr).unwrap();
            conn.write_all(&to_send).unwrap();
        });

        let (mut conn, _) = listener.accept().unwrap();
        let path = receive_one(&mut conn, &shared).unwrap();
        sender.join().unwrap();

        let mut committed = Vec::new();
        std::fs::File::open(&path).unwrap().read_to_end(&mut committed).unwrap();
        assert_eq!(committed, payload);
        assert!(!committed.windows(3).any(|w| w == wire::SENTINEL));
    }

    #[test]
    fn truncated_stream_is_protocol_violation() {
        let (shared, _tmp) = shared_state();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let sender = std::thread::spawn(move || {
            let mut conn = std::net::TcpStream::connect(addr).unwrap();
            conn.write_all(b"half a payload, no sentinel").unwrap();
            // closed without ever sending 0x04
        });

        let (mut conn, _) = listener.accept().unwrap();
        let result = receive_one(&mut conn, &shared);
        sender.join().unwrap();
        assert!(matches!(result, Err(ReceiverError::Wire(wire::WireError::Truncated(_)))));
    }

    #[test]
    fn sequence_numbers_are_dense_across_connections() {
        let (shared, _tmp) = shared_state();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        for _ in 0..3 {
            let mut to_send = b"P6\n#x\n1 1\n255\n\x00\x00\x00".to_vec();
            wire::append_sentinel(&mut to_send);
            let sender = std::thread::spawn(move || {
                let mut conn = std::net::TcpStream::connect(addr).unwrap();
                conn.write_all(&to_send).unwrap();
            });
            let (mut conn, _) = listener.accept().unwrap();
            receive_one(&mut conn, &shared).unwrap();
            sender.join().unwrap();
        }

        for slot in 0..3u64 {
            assert!(shared.store.path_for(slot).exists());
        }
    }
}
