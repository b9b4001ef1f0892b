//! Scenarios 4 and 5 from spec.md §8, driven through the real `AcceptLoop`
//! rather than the lower-level `receive_one` unit tests.

use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collector::accept_loop::AcceptLoop;
use collector::receiver::{SharedState, BUF_SIZE};
use frame_core::{wire, LocalStore};

fn start_collector() -> (AcceptLoop, Arc<AtomicBool>, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let store = LocalStore::new(tmp.path()).unwrap();
    let shared = Arc::new(SharedState::new(store));
    let stop = Arc::new(AtomicBool::new(false));
    let accept = AcceptLoop::bind("127.0.0.1:0", shared, stop.clone()).unwrap();
    (accept, stop, tmp)
}

#[test]
fn oversize_frame_grows_buffer_twice_and_commits_correctly() {
    let (accept, stop, tmp) = start_collector();
    let addr = accept.local_addr().unwrap();
    let accept_thread = std::thread::spawn(move || accept.run());

    let payload_len = 2 * BUF_SIZE + 17;
    let mut payload = vec![0x42u8; payload_len];
    // Ensure no accidental sentinel appears mid-payload.
    for (i, b) in payload.iter_mut().enumerate() {
        *b = (i % 200) as u8;
    }
    let mut to_send = payload.clone();
    wire::append_sentinel(&mut to_send);

    let mut conn = TcpStream::connect(addr).unwrap();
    conn.write_all(&to_send).unwrap();
    drop(conn);

    std::thread::sleep(Duration::from_millis(300));
    stop.store(true, Ordering::Release);
    accept_thread.join().unwrap();

    let committed = std::fs::read(tmp.path().join("images").join("cap_000000.ppm")).unwrap();
    assert_eq!(committed, payload);
}

#[test]
fn truncated_send_is_discarded_and_accept_loop_continues() {
    let (accept, stop, tmp) = start_collector();
    let addr = accept.local_addr().unwrap();
    let accept_thread = std::thread::spawn(move || accept.run());

    // Connection 1: half a payload, no sentinel, then close.
    let mut conn = TcpStream::connect(addr).unwrap();
    conn.write_all(b"not a complete frame").unwrap();
    drop(conn);
    std::thread::sleep(Duration::from_millis(200));

    // No file should have been committed for the truncated connection.
    assert!(!tmp.path().join("images").join("cap_000000.ppm").exists());

    // Connection 2: a well-formed message; accept loop must still be alive.
    let mut good = b"P6\n#ok\n1 1\n255\n\x00\x00\x00".to_vec();
    wire::append_sentinel(&mut good);
    let mut conn2 = TcpStream::connect(addr).unwrap();
    conn2.write_all(&good).unwrap();
    drop(conn2);

    std::thread::sleep(Duration::from_millis(200));
    stop.store(true, Ordering::Release);
    accept_thread.join().unwrap();

    assert!(tmp.path().join("images").join("cap_000000.ppm").exists());
}
