use std::collections::VecDeque;
use std::sync::Once;

use tracing::Level;

static INIT: Once = Once::new();

/// Tags every message with the stage it came from, e.g. `[funnel]`.
#[derive(Debug, Clone, Default)]
pub struct StageLogger {
    tags: VecDeque<String>,
}

impl StageLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, tag: &str) -> Self {
        let mut tags = self.tags.clone();
        tags.push_back(format!("[{}]", tag));
        Self { tags }
    }

    pub fn prefix(&self) -> String {
        self.tags.iter().map(|t| format!("{} ", t)).collect()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }
}

/// Install the fmt subscriber once. Later calls, or a subscriber set by
/// someone else, are left alone.
pub fn init_logging(verbose: bool) -> StageLogger {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
        });
    }
    StageLogger::new()
}
