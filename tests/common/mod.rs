//! Shared helpers for integration tests.

use page_excerpt::{ExtractConfig, RelevanceMode};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_test_writer()
            .compact()
            .try_init();
    });
}

/// Default config with the quality gate disabled, for small fixture pages
/// that a production gate would reject on size alone.
pub fn lenient_config() -> ExtractConfig {
    init_tracing();
    ExtractConfig {
        skip_quality_check: true,
        ..ExtractConfig::default()
    }
}

/// Lenient config in search relevance mode.
pub fn search_config() -> ExtractConfig {
    let mut config = lenient_config();
    config.ranker.relevance_mode = RelevanceMode::Search;
    config
}
