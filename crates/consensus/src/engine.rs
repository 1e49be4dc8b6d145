//! The public engine handle.

use crate::state::ConsensusState;
use crate::{ConsensusConfig, RotatingValidatorManager, ValidatorManager};
use kestrel_chain::Chain;
use kestrel_types::{Block, ConsensusMessage, ExtendedBlock, Network, ValidatorId, ValidatorSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// The consensus engine.
///
/// `Engine` is the handle: it owns the channel endpoints and the lifecycle
/// of the driving task, while all consensus state lives on that task (see
/// `state.rs`). Construct, take the finalized-block receiver, `start`, feed
/// messages with `add_message`, and `stop`/`wait` to shut down.
pub struct Engine {
    chain: Arc<Chain>,
    network: Arc<dyn Network>,
    validators: Arc<dyn ValidatorManager>,
    config: ConsensusConfig,

    incoming_tx: mpsc::Sender<ConsensusMessage>,
    incoming_rx: Option<mpsc::Receiver<ConsensusMessage>>,
    finalized_tx: mpsc::Sender<Block>,
    finalized_rx: Option<mpsc::Receiver<Block>>,

    tip: Arc<Mutex<ExtendedBlock>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Engine {
    /// Create an engine over the given chain, network, and validator set,
    /// with rotating proposer election.
    pub fn new(
        chain: Arc<Chain>,
        network: Arc<dyn Network>,
        validators: ValidatorSet,
        config: ConsensusConfig,
    ) -> Self {
        Self::with_validator_manager(
            chain,
            network,
            Arc::new(RotatingValidatorManager::new(validators)),
            config,
        )
    }

    /// Create an engine with a custom rotation policy.
    pub fn with_validator_manager(
        chain: Arc<Chain>,
        network: Arc<dyn Network>,
        validators: Arc<dyn ValidatorManager>,
        config: ConsensusConfig,
    ) -> Self {
        let (incoming_tx, incoming_rx) = mpsc::channel(config.message_queue_size);
        let (finalized_tx, finalized_rx) = mpsc::channel(config.message_queue_size);
        let tip = Arc::new(Mutex::new(chain.root()));
        Engine {
            chain,
            network,
            validators,
            config,
            incoming_tx,
            incoming_rx: Some(incoming_rx),
            finalized_tx,
            finalized_rx: Some(finalized_rx),
            tip,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Launch the main loop. Idempotent: a second call is a no-op.
    pub fn start(&mut self) {
        let Some(incoming) = self.incoming_rx.take() else {
            return;
        };
        let state = ConsensusState::new(
            self.chain.clone(),
            self.network.clone(),
            self.validators.clone(),
            self.config.clone(),
            incoming,
            self.incoming_tx.clone(),
            self.finalized_tx.clone(),
            self.cancel.clone(),
            self.tip.clone(),
        );
        self.task = Some(tokio::spawn(state.run()));
    }

    /// Request shutdown. Does not block; pair with [`Engine::wait`].
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Block until the main loop has exited.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Enqueue a message for the engine. Applies backpressure when the
    /// queue is full; errors (engine gone) are fire-and-forget.
    pub async fn add_message(&self, message: ConsensusMessage) {
        if self.incoming_tx.send(message).await.is_err() {
            warn!(validator = %self.id(), "Engine queue closed, message dropped");
        }
    }

    /// A sender feeding the engine's incoming queue, for network layers
    /// that deliver inbound messages directly.
    pub fn message_sender(&self) -> mpsc::Sender<ConsensusMessage> {
        self.incoming_tx.clone()
    }

    /// The stream of finalized blocks, in finalization order.
    ///
    /// Callable once. The engine publishes without blocking and drops
    /// finalizations no consumer is ready for — this is an observer, not a
    /// durable log.
    pub fn finalized_blocks(&mut self) -> mpsc::Receiver<Block> {
        self.finalized_rx
            .take()
            .expect("finalized_blocks may only be taken once")
    }

    /// The current fork-choice head.
    pub fn tip(&self) -> ExtendedBlock {
        self.tip.lock().expect("lock poisoned").clone()
    }

    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// This node's identity.
    pub fn id(&self) -> ValidatorId {
        self.network.id()
    }
}
