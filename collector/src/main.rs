//! Collector binary: accepts connections and commits received frames under
//! sequential filenames. spec.md §2, §6.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use structopt::StructOpt;

use collector::accept_loop::AcceptLoop;
use collector::receiver::SharedState;
use collector::{daemon, logging};
use frame_core::LocalStore;

#[derive(Debug, StructOpt)]
#[structopt(name = "collector")]
struct Opt {
    /// Run as a detached daemon.
    #[structopt(short = "d", long)]
    daemon: bool,

    /// Address to bind and listen on.
    #[structopt(long, default_value = "0.0.0.0")]
    bind: String,

    /// TCP port to listen on.
    #[structopt(long, default_value = "9000")]
    port: u16,

    /// Working directory for `images/`.
    #[structopt(long, default_value = ".")]
    workdir: std::path::PathBuf,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();

    if opt.daemon {
        daemon::daemonize().context("daemonizing")?;
    }

    logging::init();

    let store = LocalStore::new(&opt.workdir).context("creating images directory")?;
    let shared = Arc::new(SharedState::new(store));

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Release)).context("installing SIGINT/SIGTERM handler")?;
    }

    let addr = format!("{}:{}", opt.bind, opt.port);
    let accept = AcceptLoop::bind(&addr, shared, stop).with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "collector listening");
    accept.run();

    Ok(())
}
