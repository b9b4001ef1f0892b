//! `FrameCapture`: FrameSource -> FrameAnnotator -> LocalStore, then release
//! of the HandoffLock. spec.md §4.4.

use std::sync::Arc;
use std::time::Instant;

use camera_source::FrameSource;
use frame_core::{AnnotationRecord, FrameAnnotator, LocalStore};
use job_record::{JobRecord, JobRecordLog, ServiceId};
use rt_sequencer::{HandoffLock, Release, ReleaseTicket};

#[derive(thiserror::Error, Debug)]
enum CaptureStepError {
    #[error(transparent)]
    Source(#[from] camera_source::SourceError),
    #[error(transparent)]
    Annotate(#[from] frame_core::AnnotatorError),
    #[error(transparent)]
    Store(#[from] frame_core::StoreError),
}

pub struct CaptureHandles<S: FrameSource> {
    pub source: S,
    pub annotator: FrameAnnotator,
    pub store: Arc<LocalStore>,
    pub ticket: ReleaseTicket,
    pub handoff: HandoffLock<(u64, bool)>,
    pub host: String,
    pub period_ms: i64,
    pub run_start: Instant,
}

/// Runs the FrameCapture service loop until the abort flag is observed.
/// Returns the service's own `JobRecordLog` (written only by this thread,
/// per spec.md §5).
pub fn run<S: FrameSource>(mut h: CaptureHandles<S>) -> JobRecordLog {
    let mut jobs = JobRecordLog::new();
    let mut slot = 0u64;
    let mut cycle = 0u64;

    loop {
        match h.ticket.wait() {
            Release::Abort => break,
            Release::Go => {}
        }

        let start_ms = h.run_start.elapsed().as_millis() as i64;
        let step = capture_one(&mut h.source, &h.annotator, &h.store, slot, &h.host);

        match step {
            Ok(()) => {
                h.handoff.release((slot, true));
                let end_ms = h.run_start.elapsed().as_millis() as i64;
                jobs.push(JobRecord::new(ServiceId::S1, cycle, start_ms, end_ms, h.period_ms));
            }
            Err(e) => {
                tracing::warn!(slot, error = %e, "FrameCapture failed, skipping slot");
                // Still release the handoff (with valid=false) so FrameShip
                // is never signalled a slot it would wait forever for.
                h.handoff.release((slot, false));
                // No JobRecord is emitted for a skipped slot, per spec.md §4.4.
            }
        }

        slot += 1;
        cycle += 1;
    }

    jobs
}

fn capture_one<S: FrameSource>(
    source: &mut S,
    annotator: &FrameAnnotator,
    store: &LocalStore,
    slot: u64,
    host: &str,
) -> Result<(), CaptureStepError> {
    let frame = source.next_frame()?;
    let record = AnnotationRecord::now(host);
    let encoded = annotator.annotate(&frame, &record)?;
    store.write(slot, &encoded)?;
    Ok(())
}
