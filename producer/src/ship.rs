//! `FrameShip`: LocalStore read -> sentinel append -> TCP send. spec.md
//! §4.6.

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Instant;

use frame_core::{wire, LocalStore};
use job_record::{JobRecord, JobRecordLog, ServiceId};
use rt_sequencer::{HandoffLock, Release, ReleaseTicket};

pub struct ShipHandles {
    pub store: Arc<LocalStore>,
    pub ticket: ReleaseTicket,
    pub handoff: HandoffLock<(u64, bool)>,
    pub collector_addr: String,
    pub period_ms: i64,
    pub run_start: Instant,
}

/// Runs the FrameShip service loop until the abort flag is observed.
pub fn run(h: ShipHandles) -> JobRecordLog {
    let mut jobs = JobRecordLog::new();
    let mut cycle = 0u64;

    loop {
        match h.ticket.wait() {
            Release::Abort => break,
            Release::Go => {}
        }

        let (slot, valid) = match h.handoff.acquire() {
            Ok(v) => v,
            Err(_) => break, // FrameCapture side has gone away
        };

        if !valid {
            tracing::warn!(slot, "skipping slot marked unavailable by FrameCapture");
            cycle += 1;
            continue;
        }

        let start_ms = h.run_start.elapsed().as_millis() as i64;
        match ship_one(&h.store, slot, &h.collector_addr) {
            Ok(()) => {
                let end_ms = h.run_start.elapsed().as_millis() as i64;
                jobs.push(JobRecord::new(ServiceId::S2, cycle, start_ms, end_ms, h.period_ms));
            }
            Err(e) => {
                // Connect/send failure: log and abandon the slot, do not
                // retry within this job (spec.md §4.6 step 5).
                tracing::warn!(slot, error = %e, "FrameShip failed, abandoning slot");
            }
        }

        cycle += 1;
    }

    jobs
}

#[derive(thiserror::Error, Debug)]
enum ShipError {
    #[error(transparent)]
    Store(#[from] frame_core::StoreError),
    #[error("connecting to collector at {addr}: {source}")]
    Connect { addr: String, source: std::io::Error },
    #[error("sending payload: {0}")]
    Send(#[from] std::io::Error),
}

fn ship_one(store: &LocalStore, slot: u64, collector_addr: &str) -> Result<(), ShipError> {
    let mut payload = store.read(slot).map_err(ShipError::Store)?;
    wire::append_sentinel(&mut payload);

    let mut stream = TcpStream::connect(collector_addr).map_err(|source| ShipError::Connect {
        addr: collector_addr.to_string(),
        source,
    })?;
    // A single logical message, sent once -- the original's accidental
    // double-send (spec.md §9) is not reproduced here.
    stream.write_all(&payload)?;
    stream.flush()?;
    // Drop closes the connection.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_core::EncodedFrame;
    use std::io::Read;
    use std::net::TcpListener;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn ships_stored_slot_with_sentinel_over_tcp() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::new(tmp.path()).unwrap());
        store.write(0, &EncodedFrame::from_bytes(b"P6\n#x\n1 1\n255\n\x00\x00\x00".to_vec())).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let abort = Arc::new(AtomicBool::new(false));
        let ticket = ReleaseTicket::new(abort.clone());
        let handoff: HandoffLock<(u64, bool)> = HandoffLock::new();

        let h = ShipHandles {
            store: store.clone(),
            ticket: ticket.clone(),
            handoff: handoff.clone(),
            collector_addr: addr.to_string(),
            period_ms: 1000,
            run_start: Instant::now(),
        };
        let worker = std::thread::spawn(move || run(h));

        ticket.post();
        handoff.release((0, true));

        let (mut conn, _) = listener.accept().unwrap();
        let mut got = Vec::new();
        conn.read_to_end(&mut got).unwrap();

        let mut expected = store.read(0).unwrap();
        wire::append_sentinel(&mut expected);
        assert_eq!(got, expected);

        use std::sync::atomic::Ordering;
        abort.store(true, Ordering::Release);
        ticket.post();
        handoff.release((0, true));
        let jobs = worker.join().unwrap();
        assert_eq!(jobs.records().len(), 1);
    }
}
