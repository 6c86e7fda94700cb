//! Analyzer configuration.

use std::time::Duration;

use crate::base::constants::{DEFAULT_MAX_DEPTH, DEFAULT_RESOLUTION_TIMEOUT};

/// What to do when the same copybook is referenced more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// Resolve each name once per analysis run. Later references reuse the
    /// symbols of the first resolution; its diagnostics are reported once.
    #[default]
    Shared,
    /// Resolve every reference on its own, as if the text were pasted at
    /// each site.
    Independent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// How long a task waits for its fetch result before giving up.
    pub resolution_timeout: Duration,
    /// Maximum copybook nesting depth below the root document.
    pub max_depth: usize,
    pub dedup: DedupPolicy,
    /// Worker threads for the resolution pool; `None` lets rayon decide.
    pub worker_threads: Option<usize>,
    /// Treat `D` indicator lines as code instead of comments.
    pub debug_lines_as_code: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            resolution_timeout: DEFAULT_RESOLUTION_TIMEOUT,
            max_depth: DEFAULT_MAX_DEPTH,
            dedup: DedupPolicy::default(),
            worker_threads: None,
            debug_lines_as_code: false,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout = timeout;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_debug_lines_as_code(mut self, as_code: bool) -> Self {
        self.debug_lines_as_code = as_code;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.resolution_timeout, Duration::from_secs(10));
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.dedup, DedupPolicy::Shared);
        assert_eq!(config.worker_threads, None);
    }

    #[test]
    fn test_builders() {
        let config = AnalyzerConfig::new()
            .with_resolution_timeout(Duration::from_millis(50))
            .with_max_depth(3)
            .with_dedup(DedupPolicy::Independent)
            .with_worker_threads(2)
            .with_debug_lines_as_code(true);
        assert_eq!(config.resolution_timeout, Duration::from_millis(50));
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.dedup, DedupPolicy::Independent);
        assert_eq!(config.worker_threads, Some(2));
        assert!(config.debug_lines_as_code);
    }
}
