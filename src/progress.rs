//! Progress reporting hook.
//!
//! The pipeline only ever adds to counters, so implementations are free to be
//! called from any worker at any time.

/// Receives additive progress counters from the pipeline.
pub trait Progress: Send + Sync {
    /// Files found by the directory walker.
    fn discovered(&self, _count: u64) {}
    /// Files turned into pages.
    fn processed(&self, _count: u64) {}
    /// Files skipped because they could not be decoded.
    fn skipped(&self, _count: u64) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Reports progress through the `log` facade at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn discovered(&self, count: u64) {
        log::debug!("Discovered {} file(s)", count);
    }

    fn processed(&self, count: u64) {
        log::debug!("Processed {} file(s)", count);
    }

    fn skipped(&self, count: u64) {
        log::debug!("Skipped {} file(s)", count);
    }
}
