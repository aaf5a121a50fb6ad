//! Merge rules: defaults at the bottom, later sources override earlier ones key by key.

use crate::client::SINGLE_RETRY;
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("default_client", SINGLE_RETRY)?
        .set_default("circuit_breaker.request_volume_threshold", 20_i64)?
        .set_default("circuit_breaker.error_threshold_percentage", 50_i64)?
        .set_default("circuit_breaker.rolling_window_ms", 10_000_i64)?
        .set_default("circuit_breaker.sleep_window_ms", 5_000_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stdout")
}
