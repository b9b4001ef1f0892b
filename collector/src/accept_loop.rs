//! `AcceptLoop`: binds, listens, accepts connections, and reaps completed
//! receiver tasks. spec.md §4.8.
//!
//! The original's hand-rolled singly-linked list of thread handles
//! (`original_source/server/aesd_server.c`'s `SLIST`) is replaced with a
//! plain `Vec<ConnectionEntry>`, per spec.md §9's Design Notes ("a
//! thread-safe queue or task-set keyed by handle, with a completion
//! callback that marks-and-joins").

use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::receiver::{self, SharedState};

struct ConnectionEntry {
    handle: std::thread::JoinHandle<()>,
    done: Arc<AtomicBool>,
}

pub struct AcceptLoop {
    listener: TcpListener,
    shared: Arc<SharedState>,
    stop: Arc<AtomicBool>,
}

impl AcceptLoop {
    pub fn bind(addr: &str, shared: Arc<SharedState>, stop: Arc<AtomicBool>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        // Non-blocking accept lets the loop poll the stop flag between
        // connection attempts instead of blocking indefinitely in `accept`.
        listener.set_nonblocking(true)?;
        Ok(Self { listener, shared, stop })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until the stop flag is observed, then drains remaining
    /// connections and returns.
    pub fn run(&self) {
        let mut connections: Vec<ConnectionEntry> = Vec::new();

        while !self.stop.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::info!(%peer, "accepted connection");
                    connections.push(self.spawn_receiver(stream));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
            reap(&mut connections);
        }

        // Stop-signal drain: in-flight receivers are allowed to complete,
        // not cancelled (spec.md §5).
        for entry in connections {
            let _ = entry.handle.join();
        }
    }

    fn spawn_receiver(&self, mut stream: TcpStream) -> ConnectionEntry {
        let shared = self.shared.clone();
        let done = Arc::new(AtomicBool::new(false));
        let done_thread = done.clone();
        let handle = std::thread::spawn(move || {
            // The accept loop itself is non-blocking; each receiver thread
            // talks over a blocking socket, per spec.md §4.7's assumption.
            let _ = stream.set_nonblocking(false);
            match receiver::receive_one(&mut stream, &shared) {
                Ok(path) => tracing::info!(?path, "committed frame"),
                Err(e) => tracing::warn!(error = %e, "receiver failed, discarding connection"),
            }
            done_thread.store(true, Ordering::Release);
        });
        ConnectionEntry { handle, done }
    }
}

fn reap(connections: &mut Vec<ConnectionEntry>) {
    let mut i = 0;
    while i < connections.len() {
        if connections[i].done.load(Ordering::Acquire) {
            let entry = connections.swap_remove(i);
            let _ = entry.handle.join();
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_core::LocalStore;
    use std::io::Write;
    use std::net::TcpStream as StdTcpStream;

    #[test]
    fn accepts_and_commits_then_stops_on_signal() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path()).unwrap();
        let shared = Arc::new(SharedState::new(store));
        let stop = Arc::new(AtomicBool::new(false));

        let accept = AcceptLoop::bind("127.0.0.1:0", shared, stop.clone()).unwrap();
        let addr = accept.listener.local_addr().unwrap();

        let accept_thread = std::thread::spawn(move || accept.run());

        let mut payload = b"P6\n#x\n1 1\n255\n\x00\x00\x00".to_vec();
        frame_core::wire::append_sentinel(&mut payload);
        let mut conn = StdTcpStream::connect(addr).unwrap();
        conn.write_all(&payload).unwrap();
        drop(conn);

        std::thread::sleep(Duration::from_millis(200));
        stop.store(true, Ordering::Release);
        accept_thread.join().unwrap();

        assert!(tmp.path().join("images").join("cap_000000.ppm").exists());
    }
}
