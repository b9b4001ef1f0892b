//! Producer binary: camera -> annotate -> local store -> network ship,
//! paced by the realtime Sequencer. spec.md §2, §6.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use structopt::StructOpt;

use camera_source::TestCamera;
use frame_core::{FrameAnnotator, LocalStore};
use job_record::JobRecordLog;
use rt_sequencer::{sched, HandoffLock, Sequencer, SequencerConfig};

use producer::{capture, logging, ship};

#[derive(Debug, StructOpt)]
#[structopt(name = "producer")]
struct Opt {
    /// Camera device index to open.
    #[structopt(default_value = "0")]
    device_index: u32,

    /// Collector host:port to ship frames to.
    #[structopt(long, default_value = "127.0.0.1:9000")]
    collector: String,

    /// Master sequencer period in milliseconds (`P_seq`).
    #[structopt(long, default_value = "1000")]
    period_ms: u64,

    /// Total number of sequencer cycles to run before clean shutdown (`N`).
    #[structopt(long, default_value = "10")]
    cycles: u64,

    /// Working directory for `images/` and `record.csv`.
    #[structopt(long, default_value = ".")]
    workdir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let opt = Opt::from_args();

    let source = TestCamera::open(opt.device_index)
        .with_context(|| format!("opening camera device {}", opt.device_index))?;
    let annotator = FrameAnnotator::new().context("loading annotation font")?;
    let store = Arc::new(LocalStore::new(&opt.workdir).context("creating images directory")?);
    let host = gethostname::gethostname().to_string_lossy().into_owned();

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Release))
            .context("installing SIGINT/SIGTERM handler")?;
    }

    let config = SequencerConfig {
        period: Duration::from_millis(opt.period_ms),
        cycles: opt.cycles,
        divisor_s1: 1,
        divisor_s2: 1,
    };
    let period_ms = config.period.as_millis() as i64;
    let sequencer = Sequencer::new(config);
    let run_start = Instant::now();

    let handoff: HandoffLock<(u64, bool)> = HandoffLock::new();

    let capture_handles = capture::CaptureHandles {
        source,
        annotator,
        store: store.clone(),
        ticket: sequencer.ticket_s1(),
        handoff: handoff.clone(),
        host,
        period_ms,
        run_start,
    };
    let capture_thread = std::thread::Builder::new()
        .name("frame-capture".into())
        .spawn(move || {
            let _ = sched::promote_s1();
            capture::run(capture_handles)
        })
        .context("spawning FrameCapture thread")?;

    let ship_handles = ship::ShipHandles {
        store: store.clone(),
        ticket: sequencer.ticket_s2(),
        handoff,
        collector_addr: opt.collector.clone(),
        period_ms,
        run_start,
    };
    let ship_thread = std::thread::Builder::new()
        .name("frame-ship".into())
        .spawn(move || {
            let _ = sched::promote_s2();
            ship::run(ship_handles)
        })
        .context("spawning FrameShip thread")?;

    // The sequencer loop itself is the only blocking point on the main
    // thread (spec.md §5); a bounded run stops on its own, but SIGINT/SIGTERM
    // short-circuits it for interactive use.
    let abort = sequencer.abort_flag();
    let stop_watcher = {
        let stop = stop.clone();
        let abort = abort.clone();
        std::thread::spawn(move || {
            while !stop.load(Ordering::Acquire) && !abort.load(Ordering::Acquire) {
                std::thread::sleep(Duration::from_millis(50));
            }
            if stop.load(Ordering::Acquire) {
                abort.store(true, Ordering::Release);
            }
        })
    };

    let mut seq_jobs = JobRecordLog::new();
    sequencer.run(&mut seq_jobs).context("running sequencer")?;

    let _ = stop_watcher.join();
    let capture_jobs = capture_thread.join().expect("FrameCapture thread panicked");
    let ship_jobs = ship_thread.join().expect("FrameShip thread panicked");

    let mut combined = JobRecordLog::new();
    for log in [seq_jobs, capture_jobs, ship_jobs] {
        for record in log.records() {
            combined.push(record.clone());
        }
    }
    combined
        .write_csv(opt.workdir.join("record.csv"))
        .context("writing record.csv")?;

    Ok(())
}
