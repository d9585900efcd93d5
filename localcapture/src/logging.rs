//! Logging setup

use crate::config::GlobalConfig;
use crate::error::{LocalCaptureError, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const DEBUG_FILTER: &str = "localcapture=debug,localcapture_core=debug";

/// Install a `tracing` subscriber writing to stderr
///
/// The filter comes from `config.log_filter`, then `RUST_LOG`, then a
/// default depending on `debug_logging`. Returns `Ok(false)` when a global
/// subscriber was already installed.
pub fn init_logging(config: &GlobalConfig) -> Result<bool> {
    let filter = build_filter(config)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug_logging)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("📝 Logging initialized");
    }
    Ok(installed)
}

fn build_filter(config: &GlobalConfig) -> Result<EnvFilter> {
    if let Some(directives) = &config.log_filter {
        return EnvFilter::try_new(directives).map_err(|e| LocalCaptureError::Logging {
            reason: format!("invalid filter '{}': {}", directives, e),
        });
    }
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.debug_logging {
            DEBUG_FILTER
        } else {
            DEFAULT_FILTER
        })
    }))
}
