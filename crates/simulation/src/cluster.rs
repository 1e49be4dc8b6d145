//! Multi-node cluster wiring.

use crate::{NetworkConfig, NetworkHub};
use kestrel_chain::Chain;
use kestrel_consensus::{ConsensusConfig, Engine};
use kestrel_types::{Block, Validator, ValidatorId, ValidatorSet};
use std::sync::Arc;

/// A cluster of validators over per-node chains sharing one genesis.
///
/// Node ids are `v0..vN`, each with voting power 1; the proposer schedule
/// is therefore `v0, v1, …` by epoch. Engines are wired to the hub at
/// construction and launched by [`Cluster::start_all`] — registration
/// happens before any engine runs, so no startup broadcast is missed.
pub struct Cluster {
    engines: Vec<Engine>,
    hub: Arc<NetworkHub>,
}

impl Cluster {
    pub fn new(size: usize, consensus: ConsensusConfig, network: NetworkConfig) -> Self {
        let hub = NetworkHub::new(network);
        let validators = ValidatorSet::new(
            (0..size)
                .map(|i| Validator::new(format!("v{i}"), 1))
                .collect(),
        );

        let engines = (0..size)
            .map(|i| {
                let id = ValidatorId::new(format!("v{i}"));
                let chain = Arc::new(Chain::new("sim", Block::genesis("sim")));
                let engine = Engine::new(
                    chain,
                    Arc::new(hub.handle(id.clone())),
                    validators.clone(),
                    consensus.clone(),
                );
                hub.register(id, engine.message_sender());
                engine
            })
            .collect();

        Self { engines, hub }
    }

    pub fn hub(&self) -> &Arc<NetworkHub> {
        &self.hub
    }

    pub fn engine(&self, index: usize) -> &Engine {
        &self.engines[index]
    }

    pub fn engine_mut(&mut self, index: usize) -> &mut Engine {
        &mut self.engines[index]
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Launch every engine.
    pub fn start_all(&mut self) {
        for engine in &mut self.engines {
            engine.start();
        }
    }

    /// Launch a subset of engines, leaving the rest silent (e.g. a crashed
    /// proposer).
    pub fn start_only(&mut self, indices: &[usize]) {
        for &i in indices {
            self.engines[i].start();
        }
    }

    /// Request shutdown of every engine.
    pub fn stop_all(&self) {
        for engine in &self.engines {
            engine.stop();
        }
    }

    /// Wait for every engine's loop to exit.
    pub async fn wait_all(&mut self) {
        for engine in &mut self.engines {
            engine.wait().await;
        }
    }
}
