use log::{info, warn};

/// Stage-level log sink used by the adapters wrapped around the core.
pub struct LogManager {
    target: &'static str,
}

impl LogManager {
    pub fn for_target(target: &'static str) -> Self {
        Self { target }
    }

    pub fn record(&self, message: &str) {
        info!(target: self.target, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(target: self.target, "{}", message);
    }
}
