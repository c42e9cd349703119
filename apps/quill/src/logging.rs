//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise `--verbose` picks debug output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "quill=info,quill_core=info,tower_http=info";
const VERBOSE_FILTER: &str = "quill=debug,quill_core=debug,tower_http=debug";

/// Build the filter used by [`init`].
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        })
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .try_init();
}
