//! Builder-style configuration for the indexer (teacher idiom from
//! `robt::Config`'s `set_*(&mut self) -> &mut Self` methods).

/// Default shard threshold: below this many lines, a plain in-thread
/// sort beats the cost of handing off to `rayon`.
pub const SHARD_THRESHOLD_UNIT: usize = 1024;

/// Sizing knobs for building and sorting index files (§4.5, §2 ambient
/// "Config structs"). Configuration is only used while building an
/// index; nothing here is persisted alongside the published files.
#[derive(Clone, Copy, Debug)]
pub struct IndexerConfig {
    /// Above `shard_threshold` lines, sorting is parallelized across
    /// `rayon`/`num_cpus` shards; at or below it, a single-threaded
    /// sort is used instead.
    ///
    /// Default: `num_cpus::get() * SHARD_THRESHOLD_UNIT`.
    shard_threshold: usize,
}

impl Default for IndexerConfig {
    fn default() -> IndexerConfig {
        IndexerConfig {
            shard_threshold: num_cpus::get() * SHARD_THRESHOLD_UNIT,
        }
    }
}

impl IndexerConfig {
    /// Create a new configuration value, use the `set_*` methods to add
    /// more configuration.
    pub fn new() -> IndexerConfig {
        IndexerConfig::default()
    }

    /// Set the line-count threshold above which the external sort is
    /// sharded across `rayon`'s thread pool instead of sorted in-place.
    pub fn set_shard_threshold(&mut self, threshold: usize) -> &mut Self {
        self.shard_threshold = threshold;
        self
    }

    pub fn shard_threshold(&self) -> usize {
        self.shard_threshold
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
