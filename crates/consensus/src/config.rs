//! Consensus configuration.

use std::time::Duration;

/// Tunable consensus parameters. All defaults are safe for small clusters.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Epoch timer duration. On expiry the node casts a (possibly nil) vote
    /// and repeats the epoch.
    pub max_epoch_length: Duration,

    /// Bounded capacity of the incoming message queue and the finalized
    /// block channel.
    pub message_queue_size: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_epoch_length: Duration::from_secs(2),
            message_queue_size: 256,
        }
    }
}

impl ConsensusConfig {
    pub fn with_max_epoch_length(mut self, duration: Duration) -> Self {
        self.max_epoch_length = duration;
        self
    }

    pub fn with_message_queue_size(mut self, size: usize) -> Self {
        self.message_queue_size = size;
        self
    }
}
