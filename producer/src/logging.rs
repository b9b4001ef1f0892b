//! Logging init, following `env-tracing-logger`: a compact formatter with an
//! uptime timer, filtered by `RUST_LOG`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    let evt_fmt = fmt::format().with_timer(fmt::time::Uptime::default()).compact();
    let fmt_layer = fmt::layer().event_format(evt_fmt);

    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(EnvFilter::from_default_env())
        .try_init();
}
