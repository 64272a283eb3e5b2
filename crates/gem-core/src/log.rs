//! Diagnostic output for plugins.
//!
//! Plugins log through `tracing`. The host's console reads stderr, so the
//! subscriber writes there. Filter with `GEM_OCL_LOG` (env-filter syntax).

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GEM_OCL_LOG";

static INIT: OnceCell<()> = OnceCell::new();

/// Install the stderr subscriber. Safe to call from every plugin constructor;
/// only the first call in the process has an effect, and an already-installed
/// global subscriber is left alone.
pub fn init_logging() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
        if result.is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}
