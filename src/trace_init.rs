//! Optional JSON trace log.
//!
//! Only the `trace` feature compiles a subscriber in. Without it every
//! `tracing` macro in the workspace is stripped (`max_level_off`) and
//! [`init_tracing`] does nothing.

use std::path::Path;

/// File written under the caller's log directory.
pub const TRACE_FILE: &str = "suyan-trace.jsonl";

/// Environment variable overriding [`DEFAULT_FILTER`].
pub const FILTER_ENV: &str = "SUYAN_LOG";

pub const DEFAULT_FILTER: &str = "suyan_engine=debug,suyan_core=debug,suyan_session=debug";

#[cfg(feature = "trace")]
static INIT: std::sync::Once = std::sync::Once::new();

/// Install the JSON file subscriber once per process. Returns `true` only
/// for the call that installed it; a host that already set a global
/// subscriber keeps its own and gets `false`.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> bool {
    let mut installed = false;
    INIT.call_once(|| installed = install(log_dir));
    installed
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) -> bool {
    false
}

#[cfg(feature = "trace")]
fn install(log_dir: &Path) -> bool {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    if std::fs::create_dir_all(log_dir).is_err() {
        return false;
    }
    let filter =
        EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let appender = tracing_appender::rolling::never(log_dir, TRACE_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .with_target(true)
        // The journal flusher runs on its own named thread.
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .try_init()
        .is_ok();
    if installed {
        // Lives as long as the input-method process.
        std::mem::forget(guard);
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            dir = %log_dir.display(),
            "trace log started"
        );
    }
    installed
}
