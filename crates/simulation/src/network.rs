//! Simulated network with deterministic packet loss.

use kestrel_types::{ConsensusMessage, Network, NetworkMessage, ValidatorId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::warn;

/// Configuration for the simulated network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Messages are dropped with this probability (0.0 – 1.0).
    pub packet_loss_rate: f64,
    /// Seed for the loss decision stream; same seed, same drops.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            packet_loss_rate: 0.0,
            seed: 42,
        }
    }
}

/// Shared registry of node inboxes.
///
/// Each node registers its engine's message sender; a broadcast from one
/// node is delivered to every *other* node (engines self-deliver their own
/// messages through their loopback).
pub struct NetworkHub {
    peers: RwLock<HashMap<ValidatorId, mpsc::Sender<ConsensusMessage>>>,
    config: NetworkConfig,
    rng: Mutex<ChaCha8Rng>,
}

impl NetworkHub {
    pub fn new(config: NetworkConfig) -> Arc<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Arc::new(Self {
            peers: RwLock::new(HashMap::new()),
            config,
            rng: Mutex::new(rng),
        })
    }

    pub fn register(&self, id: ValidatorId, sender: mpsc::Sender<ConsensusMessage>) {
        self.peers
            .write()
            .expect("lock poisoned")
            .insert(id, sender);
    }

    /// A per-node [`Network`] handle bound to this hub.
    pub fn handle(self: &Arc<Self>, id: ValidatorId) -> SimulatedNetwork {
        SimulatedNetwork {
            id,
            hub: Arc::clone(self),
        }
    }

    fn should_drop(&self) -> bool {
        self.config.packet_loss_rate > 0.0
            && self.rng.lock().expect("lock poisoned").gen::<f64>() < self.config.packet_loss_rate
    }

    fn deliver(&self, from: &ValidatorId, message: &NetworkMessage) {
        let peers = self.peers.read().expect("lock poisoned");
        for (peer, sender) in peers.iter() {
            if peer == from {
                continue;
            }
            if self.should_drop() {
                continue;
            }
            if sender.try_send(message.content.clone()).is_err() {
                warn!(from = %from, to = %peer, "Dropping message: peer queue full or gone");
            }
        }
    }
}

/// One node's view of the hub.
pub struct SimulatedNetwork {
    id: ValidatorId,
    hub: Arc<NetworkHub>,
}

impl Network for SimulatedNetwork {
    fn id(&self) -> ValidatorId {
        self.id.clone()
    }

    fn broadcast(&self, message: NetworkMessage) {
        self.hub.deliver(&self.id, &message);
    }
}
