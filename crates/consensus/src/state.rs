//! The epoch state machine.
//!
//! [`ConsensusState`] owns every piece of consensus state and is driven by
//! exactly one task ([`ConsensusState::run`]). Handlers are synchronous and
//! run to completion; the loop suspends only at its select point. The
//! mutex-guarded `tip` is the sole observable shared with other threads.

use crate::{ConsensusConfig, ValidatorManager};
use kestrel_chain::Chain;
use kestrel_types::{
    Block, CommitCertificate, ConsensusMessage, ExtendedBlock, Hash, Network, NetworkMessage,
    Proposal, ValidatorId, Vote, VoteSet,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

pub(crate) struct ConsensusState {
    // ═══════════════════════════════════════════════════════════════════════
    // Collaborators
    // ═══════════════════════════════════════════════════════════════════════
    chain: Arc<Chain>,
    network: Arc<dyn Network>,
    validators: Arc<dyn ValidatorManager>,
    config: ConsensusConfig,

    /// This node's identity (same as the network identity).
    id: ValidatorId,

    // ═══════════════════════════════════════════════════════════════════════
    // Channels and lifecycle
    // ═══════════════════════════════════════════════════════════════════════
    incoming: mpsc::Receiver<ConsensusMessage>,
    /// Self-delivery back into `incoming` for our own proposals and votes.
    loopback: mpsc::Sender<ConsensusMessage>,
    /// Finalization observer channel. Non-blocking sends; not a durable log.
    finalized: mpsc::Sender<Block>,
    cancel: CancellationToken,
    stopped: bool,

    // ═══════════════════════════════════════════════════════════════════════
    // Consensus state
    // ═══════════════════════════════════════════════════════════════════════
    /// Current epoch, monotonically non-decreasing.
    epoch: u64,

    /// Deadline of the running epoch; refreshed by `enter_epoch`.
    epoch_deadline: Instant,

    /// Fork-choice head, shared with outside observers.
    tip: Arc<Mutex<ExtendedBlock>>,

    /// Highest block (by height) carrying a commit certificate.
    highest_cc_block: ExtendedBlock,

    /// Monotonically deepening. Starts at the chain root: genesis is final
    /// by construction and is never published.
    last_finalized_block: ExtendedBlock,

    /// Height of our most recent non-nil vote.
    last_vote_height: u64,

    /// Our own non-nil votes by height. Written, never read back yet: the
    /// hook for persisting consensus state across restarts.
    vote_log: HashMap<u64, Vote>,

    /// Vote accumulation per block hash.
    collected_votes: HashMap<Hash, VoteSet>,

    /// Latest vote seen from each validator; drives epoch advancement by
    /// quorum.
    epoch_votes: HashMap<ValidatorId, Vote>,
}

impl ConsensusState {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        chain: Arc<Chain>,
        network: Arc<dyn Network>,
        validators: Arc<dyn ValidatorManager>,
        config: ConsensusConfig,
        incoming: mpsc::Receiver<ConsensusMessage>,
        loopback: mpsc::Sender<ConsensusMessage>,
        finalized: mpsc::Sender<Block>,
        cancel: CancellationToken,
        tip: Arc<Mutex<ExtendedBlock>>,
    ) -> Self {
        let root = chain.root();
        let id = network.id();
        Self {
            chain,
            network,
            validators,
            config,
            id,
            incoming,
            loopback,
            finalized,
            cancel,
            stopped: false,
            epoch: 0,
            epoch_deadline: Instant::now(),
            tip,
            highest_cc_block: root.clone(),
            last_finalized_block: root,
            last_vote_height: 0,
            vote_log: HashMap::new(),
            collected_votes: HashMap::new(),
            epoch_votes: HashMap::new(),
        }
    }

    /// The main loop. Consumes `self`; runs until cancelled or the incoming
    /// channel closes.
    pub(crate) async fn run(mut self) {
        let cancel = self.cancel.clone();
        loop {
            self.enter_epoch();
            // One epoch: wait for messages until something ends it.
            loop {
                let deadline = self.epoch_deadline;
                tokio::select! {
                    _ = cancel.cancelled() => {
                        self.stopped = true;
                        debug!(validator = %self.id, "Engine stopped");
                        return;
                    }
                    maybe = self.incoming.recv() => {
                        let Some(message) = maybe else {
                            self.stopped = true;
                            return;
                        };
                        if self.process_message(message) {
                            break;
                        }
                    }
                    _ = time::sleep_until(deadline) => {
                        debug!(validator = %self.id, epoch = self.epoch, "Epoch timeout, repeating epoch");
                        self.vote();
                        break;
                    }
                }
            }
        }
    }

    /// Begin (or re-begin) the current epoch: reset the deadline and propose
    /// if we hold this epoch's proposer slot.
    fn enter_epoch(&mut self) {
        self.epoch_deadline = Instant::now() + self.config.max_epoch_length;
        if self.should_propose() {
            self.propose();
        }
    }

    fn should_propose(&self) -> bool {
        self.validators.proposer_for_epoch(self.epoch).id == self.id
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Message dispatch
    // ═══════════════════════════════════════════════════════════════════════

    /// Dispatch one message. Returns true if the epoch should end.
    fn process_message(&mut self, message: ConsensusMessage) -> bool {
        trace!(validator = %self.id, kind = message.type_name(), "Processing message");
        match message {
            ConsensusMessage::Proposal(proposal) => {
                self.handle_proposal(proposal);
                false
            }
            ConsensusMessage::Vote(vote) => self.handle_vote(vote),
            ConsensusMessage::Block(block) => {
                self.handle_block(block);
                false
            }
            ConsensusMessage::CommitCertificate(cc) => {
                self.handle_cc(cc);
                false
            }
        }
    }

    fn handle_proposal(&mut self, proposal: Proposal) {
        debug!(
            validator = %self.id,
            proposer = %proposal.proposer,
            block = ?proposal.block.hash(),
            "Received proposal"
        );

        let expected = &self.validators.proposer_for_epoch(self.epoch).id;
        if &proposal.proposer != expected {
            debug!(
                validator = %self.id,
                proposer = %proposal.proposer,
                expected = %expected,
                epoch = self.epoch,
                "Ignoring proposal from non-proposer"
            );
            return;
        }

        self.handle_block(proposal.block);
        if let Some(cc) = proposal.commit_certificate {
            self.handle_cc(cc);
        }
        self.vote();
    }

    fn handle_block(&mut self, block: Block) {
        if block.epoch() != self.epoch {
            debug!(
                validator = %self.id,
                block_epoch = block.epoch(),
                epoch = self.epoch,
                block = ?block.hash(),
                "Received block from another epoch"
            );
        }
        if let Err(e) = self.chain.add_block(block) {
            warn!(validator = %self.id, error = %e, "Failed to add block");
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Vote handling
    // ═══════════════════════════════════════════════════════════════════════

    /// Record a vote, check the epoch-advancement quorum, and aggregate
    /// per-block votes into a commit certificate at quorum.
    ///
    /// Returns true if a quorum of peers at a later (or equal) epoch
    /// justifies ending this one — the liveness escape hatch distinct from
    /// the timer path.
    fn handle_vote(&mut self, vote: Vote) -> bool {
        debug!(
            validator = %self.id,
            voter = %vote.voter,
            vote_epoch = vote.epoch,
            nil = vote.is_nil(),
            "Received vote"
        );

        self.epoch_votes.insert(vote.voter.clone(), vote.clone());

        let validators = self.validators.validator_set_for_epoch(self.epoch);
        let mut end_epoch = false;
        if vote.epoch >= self.epoch {
            let mut epoch_vote_set = VoteSet::new();
            for v in self.epoch_votes.values() {
                if v.epoch >= vote.epoch {
                    epoch_vote_set.add_vote(v.clone());
                }
            }
            if validators.has_majority(&epoch_vote_set) {
                let next_epoch = vote.epoch + 1;
                debug!(
                    validator = %self.id,
                    epoch = self.epoch,
                    next_epoch,
                    "Majority votes at or beyond our epoch, moving on"
                );
                self.epoch = next_epoch;
                end_epoch = true;
            }
        }

        let Some(header) = &vote.block else {
            trace!(validator = %self.id, voter = %vote.voter, "Nil vote recorded");
            return end_epoch;
        };
        let block_hash = header.hash;

        let mut block = match self.chain.find_block(&block_hash) {
            Ok(block) => block,
            Err(_) => {
                warn!(
                    validator = %self.id,
                    voter = %vote.voter,
                    block = ?block_hash,
                    "Vote references unknown block"
                );
                return end_epoch;
            }
        };

        let votes = self.collected_votes.entry(block_hash).or_default();
        votes.add_vote(vote);

        let validators = self.validators.validator_set_for_epoch(self.epoch);
        if validators.has_majority(votes) {
            let cc = CommitCertificate::new(block_hash, votes.clone());
            info!(
                validator = %self.id,
                block = ?block_hash,
                height = block.height(),
                votes = cc.votes.len(),
                "Quorum reached, forming commit certificate"
            );
            block.commit_certificate = Some(cc);
            self.chain.save_block(block.clone());
            self.process_cc_block(&block);
        }

        end_epoch
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Commit certificates and finalization
    // ═══════════════════════════════════════════════════════════════════════

    /// Attach an incoming certificate to its block and process it.
    fn handle_cc(&mut self, cc: CommitCertificate) {
        let mut block = match self.chain.find_block(&cc.block_hash) {
            Ok(block) => block,
            Err(_) => {
                error!(
                    validator = %self.id,
                    block = ?cc.block_hash,
                    "Commit certificate references unknown block"
                );
                return;
            }
        };

        block.commit_certificate = Some(cc);
        self.chain.save_block(block.clone());
        debug!(validator = %self.id, block = ?block.hash(), "Attached commit certificate");

        self.process_cc_block(&block);
    }

    /// A block just gained a commit certificate: track the highest certified
    /// block, apply the two-chain finalization rule, and advance the epoch
    /// if the certificate proves ours is stale.
    fn process_cc_block(&mut self, cc_block: &ExtendedBlock) {
        trace!(
            validator = %self.id,
            block = ?cc_block.hash(),
            height = cc_block.height(),
            "Processing certified block"
        );

        if cc_block.height() > self.highest_cc_block.height() {
            debug!(
                validator = %self.id,
                block = ?cc_block.hash(),
                height = cc_block.height(),
                "New highest certified block"
            );
            self.highest_cc_block = cc_block.clone();
        }

        match self.chain.find_block(&cc_block.parent()) {
            Ok(parent) => {
                // Two consecutive certified blocks finalize the older one.
                if parent.commit_certificate.is_some() {
                    self.finalize_block(&parent);
                }
            }
            Err(e) => {
                error!(
                    validator = %self.id,
                    error = %e,
                    block = ?cc_block.hash(),
                    "Failed to load parent of certified block"
                );
                return;
            }
        }

        if cc_block.epoch() >= self.epoch {
            debug!(
                validator = %self.id,
                block_epoch = cc_block.epoch(),
                epoch = self.epoch,
                "Advancing epoch from certified block"
            );
            self.epoch = cc_block.epoch() + 1;
            self.enter_epoch();
        }
    }

    fn finalize_block(&mut self, block: &ExtendedBlock) {
        if self.stopped {
            return;
        }
        // Already published.
        if block.hash() == self.last_finalized_block.hash() {
            return;
        }

        info!(
            validator = %self.id,
            block = ?block.hash(),
            height = block.height(),
            "Finalizing block"
        );
        self.last_finalized_block = block.clone();

        if self.finalized.try_send(block.block.clone()).is_err() {
            trace!(
                validator = %self.id,
                block = ?block.hash(),
                "Finalized block not published: no consumer ready"
            );
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Fork choice, voting, proposing
    // ═══════════════════════════════════════════════════════════════════════

    /// Refresh the tip: the deepest descendant of the highest certified
    /// block.
    fn set_tip(&mut self) -> ExtendedBlock {
        let tip = self
            .chain
            .find_deepest_descendant(&self.highest_cc_block.hash())
            .unwrap_or_else(|| self.highest_cc_block.clone());
        *self.tip.lock().expect("lock poisoned") = tip.clone();
        tip
    }

    fn get_tip(&self) -> ExtendedBlock {
        self.tip.lock().expect("lock poisoned").clone()
    }

    /// Cast our vote for this epoch.
    ///
    /// A non-nil vote requires the tip to have advanced past both the
    /// previous tip and our last voted height; anything else gets a
    /// nil-vote. Either way the vote is self-delivered and broadcast.
    fn vote(&mut self) {
        let previous_tip = self.get_tip();
        let tip = self.set_tip();

        let mut header = None;
        if previous_tip.hash() == tip.hash() || self.last_vote_height >= tip.height() {
            debug!(
                validator = %self.id,
                last_vote_height = self.last_vote_height,
                tip = ?tip.hash(),
                "Voting nil: tip unchanged or height already voted"
            );
        } else {
            header = Some(tip.header().clone());
            self.last_vote_height = tip.height();
        }

        let vote = Vote {
            block: header,
            voter: self.id.clone(),
            epoch: self.epoch,
        };
        if let Some(header) = &vote.block {
            self.vote_log.insert(header.height, vote.clone());
        }

        debug!(
            validator = %self.id,
            block = ?vote.block.as_ref().map(|h| h.hash),
            epoch = vote.epoch,
            "Casting vote"
        );

        self.deliver_to_self(ConsensusMessage::Vote(vote.clone()));
        self.network
            .broadcast(NetworkMessage::new(ConsensusMessage::Vote(vote)));
    }

    /// Produce this epoch's proposal: a block extending the tip, carrying a
    /// copy of the highest known commit certificate.
    fn propose(&mut self) {
        let tip = self.set_tip();

        let block = Block::new(
            self.chain.chain_id(),
            self.epoch,
            tip.height() + 1,
            tip.hash(),
            Vec::new(),
        );
        let proposal = Proposal {
            block,
            proposer: self.id.clone(),
            commit_certificate: self.highest_cc_block.commit_certificate.clone(),
        };

        info!(
            validator = %self.id,
            epoch = self.epoch,
            block = ?proposal.block.hash(),
            parent = ?tip.hash(),
            "Proposing block"
        );

        self.deliver_to_self(ConsensusMessage::Proposal(proposal.clone()));
        self.network
            .broadcast(NetworkMessage::new(ConsensusMessage::Proposal(proposal)));
    }

    /// Feed one of our own messages back through the dispatch path.
    ///
    /// Must not block: an awaited send from the loop into its own full queue
    /// would deadlock, so an over-full queue drops the message instead.
    fn deliver_to_self(&self, message: ConsensusMessage) {
        if self.loopback.try_send(message).is_err() {
            warn!(
                validator = %self.id,
                "Self-delivery dropped: incoming queue full"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RotatingValidatorManager;
    use kestrel_types::{Validator, ValidatorSet};
    use std::sync::Mutex as StdMutex;
    use tracing_test::traced_test;

    /// Network stub that records every broadcast.
    struct CaptureNetwork {
        id: ValidatorId,
        sent: StdMutex<Vec<NetworkMessage>>,
    }

    impl CaptureNetwork {
        fn new(id: &str) -> Self {
            Self {
                id: ValidatorId::from(id),
                sent: StdMutex::new(Vec::new()),
            }
        }
    }

    impl Network for CaptureNetwork {
        fn id(&self) -> ValidatorId {
            self.id.clone()
        }

        fn broadcast(&self, message: NetworkMessage) {
            self.sent.lock().unwrap().push(message);
        }
    }

    struct Harness {
        state: ConsensusState,
        network: Arc<CaptureNetwork>,
        chain: Arc<Chain>,
        finalized_rx: mpsc::Receiver<Block>,
    }

    /// Build a state machine for validator `id` over a fresh chain, without
    /// running the driving loop — handlers are exercised directly.
    fn harness(id: &str, validator_ids: &[&str]) -> Harness {
        let genesis = Block::genesis("test");
        let chain = Arc::new(Chain::new("test", genesis));
        let network = Arc::new(CaptureNetwork::new(id));
        let validators = ValidatorSet::new(
            validator_ids
                .iter()
                .map(|v| Validator::new(*v, 1))
                .collect(),
        );
        let manager = Arc::new(RotatingValidatorManager::new(validators));
        let config = ConsensusConfig::default();
        let (incoming_tx, incoming_rx) = mpsc::channel(config.message_queue_size);
        let (finalized_tx, finalized_rx) = mpsc::channel(config.message_queue_size);
        let tip = Arc::new(Mutex::new(chain.root()));

        let state = ConsensusState::new(
            chain.clone(),
            network.clone(),
            manager,
            config,
            incoming_rx,
            incoming_tx,
            finalized_tx,
            CancellationToken::new(),
            tip,
        );
        Harness {
            state,
            network,
            chain,
            finalized_rx,
        }
    }

    fn block_vote(voter: &str, block: &ExtendedBlock, epoch: u64) -> Vote {
        Vote {
            block: Some(block.header().clone()),
            voter: ValidatorId::from(voter),
            epoch,
        }
    }

    fn nil_vote(voter: &str, epoch: u64) -> Vote {
        Vote {
            block: None,
            voter: ValidatorId::from(voter),
            epoch,
        }
    }

    fn extend(chain: &Chain, parent: &ExtendedBlock, epoch: u64) -> ExtendedBlock {
        let block = Block::new(
            "test",
            epoch,
            parent.height() + 1,
            parent.hash(),
            Vec::new(),
        );
        chain.add_block(block).unwrap()
    }

    #[tokio::test]
    async fn quorum_forms_commit_certificate() {
        let mut h = harness("a", &["a", "b", "c"]);
        let b1 = extend(&h.chain, &h.chain.root(), 0);

        h.state.handle_vote(block_vote("a", &b1, 0));
        h.state.handle_vote(block_vote("b", &b1, 0));
        assert!(h
            .chain
            .find_block(&b1.hash())
            .unwrap()
            .commit_certificate
            .is_none());

        h.state.handle_vote(block_vote("c", &b1, 0));
        let stored = h.chain.find_block(&b1.hash()).unwrap();
        let cc = stored.commit_certificate.expect("CC should have formed");
        assert_eq!(cc.block_hash, b1.hash());
        assert_eq!(cc.votes.len(), 3);
        assert_eq!(h.state.highest_cc_block.hash(), b1.hash());
    }

    #[traced_test]
    #[tokio::test]
    async fn two_chain_rule_finalizes_parent() {
        let mut h = harness("a", &["a", "b", "c"]);
        let b1 = extend(&h.chain, &h.chain.root(), 0);
        let b2 = extend(&h.chain, &b1, 1);

        for voter in ["a", "b", "c"] {
            h.state.handle_vote(block_vote(voter, &b1, 0));
        }
        // B1 certified; genesis has no CC, so nothing finalizes yet.
        assert!(h.finalized_rx.try_recv().is_err());

        for voter in ["a", "b", "c"] {
            h.state.handle_vote(block_vote(voter, &b2, 1));
        }
        let finalized = h.finalized_rx.try_recv().expect("B1 should finalize");
        assert_eq!(finalized.hash(), b1.hash());
        assert_eq!(h.state.last_finalized_block.hash(), b1.hash());
    }

    #[tokio::test]
    async fn finalization_is_idempotent() {
        let mut h = harness("a", &["a", "b", "c"]);
        let b1 = extend(&h.chain, &h.chain.root(), 0);
        let stored = {
            let mut b = h.chain.find_block(&b1.hash()).unwrap();
            b.commit_certificate = Some(CommitCertificate::new(b1.hash(), VoteSet::new()));
            h.chain.save_block(b.clone());
            b
        };

        h.state.finalize_block(&stored);
        h.state.finalize_block(&stored);

        assert!(h.finalized_rx.try_recv().is_ok());
        assert!(h.finalized_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn epoch_advances_on_vote_quorum() {
        // The proposer for the epoch is silent; peers nil-vote at our
        // epoch and a quorum of them moves us forward.
        let mut h = harness("a", &["a", "b", "c"]);
        assert_eq!(h.state.epoch, 0);

        assert!(!h.state.handle_vote(nil_vote("a", 0)));
        assert!(!h.state.handle_vote(nil_vote("b", 0)));
        let end_epoch = h.state.handle_vote(nil_vote("c", 0));

        assert!(end_epoch);
        assert_eq!(h.state.epoch, 1);
    }

    #[tokio::test]
    async fn stale_epoch_votes_do_not_advance() {
        let mut h = harness("a", &["a", "b", "c"]);
        h.state.epoch = 5;

        for voter in ["a", "b", "c"] {
            assert!(!h.state.handle_vote(nil_vote(voter, 4)));
        }
        assert_eq!(h.state.epoch, 5);
    }

    #[tokio::test]
    async fn stale_proposer_is_ignored() {
        // Epoch 2's proposer is "c"; a proposal claiming "a" is dropped
        // without adding the block or voting.
        let mut h = harness("a", &["a", "b", "c"]);
        h.state.epoch = 2;

        let block = Block::new("test", 2, 1, h.chain.root_hash(), Vec::new());
        let hash = block.hash();
        h.state.handle_proposal(Proposal {
            block,
            proposer: ValidatorId::from("a"),
            commit_certificate: None,
        });

        assert!(h.chain.find_block(&hash).is_err());
        assert!(h.network.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn vote_before_block_is_dropped() {
        // The vote arrives before its block; it is dropped, not queued.
        let mut h = harness("a", &["a", "b", "c"]);
        let orphan = Block::new("test", 0, 1, h.chain.root_hash(), Vec::new());
        let vote = Vote {
            block: Some(orphan.header.clone()),
            voter: ValidatorId::from("b"),
            epoch: 0,
        };

        h.state.handle_vote(vote.clone());
        assert!(h.state.collected_votes.is_empty());

        // Once the block exists, later votes are accepted; the dropped vote
        // is not retried.
        h.chain.add_block(orphan.clone()).unwrap();
        h.state.handle_vote(vote);
        assert_eq!(h.state.collected_votes[&orphan.hash()].len(), 1);
    }

    #[tokio::test]
    async fn equivocating_voter_counts_once() {
        // Two different votes from one voter for the same block leave a
        // single (the second) entry in the vote set.
        let mut h = harness("a", &["a", "b", "c", "d"]);
        let b1 = extend(&h.chain, &h.chain.root(), 0);

        h.state.handle_vote(block_vote("b", &b1, 0));
        h.state.handle_vote(block_vote("b", &b1, 1));

        let votes = &h.state.collected_votes[&b1.hash()];
        assert_eq!(votes.len(), 1);
        assert_eq!(votes.get(&ValidatorId::from("b")).unwrap().epoch, 1);
    }

    #[tokio::test]
    async fn proposal_flow_votes_for_new_tip() {
        // Proposer "b" (epoch 1) extends genesis; we add the block, vote for
        // it, and record the height in the vote log.
        let mut h = harness("a", &["a", "b", "c"]);
        h.state.epoch = 1;

        let block = Block::new("test", 1, 1, h.chain.root_hash(), Vec::new());
        let hash = block.hash();
        h.state.handle_proposal(Proposal {
            block,
            proposer: ValidatorId::from("b"),
            commit_certificate: None,
        });

        assert!(h.chain.find_block(&hash).is_ok());
        assert_eq!(h.state.last_vote_height, 1);
        assert!(h.state.vote_log.contains_key(&1));

        let sent = h.network.sent.lock().unwrap();
        let vote = sent
            .iter()
            .find_map(|m| match &m.content {
                ConsensusMessage::Vote(v) => Some(v.clone()),
                _ => None,
            })
            .expect("a vote should have been broadcast");
        assert_eq!(vote.block.unwrap().hash, hash);
    }

    #[tokio::test]
    async fn repeated_vote_at_same_height_is_nil() {
        // At most one non-nil vote per height.
        let mut h = harness("a", &["a", "b", "c"]);
        let _b1 = extend(&h.chain, &h.chain.root(), 0);

        h.state.vote();
        assert_eq!(h.state.last_vote_height, 1);

        h.state.vote();
        let sent = h.network.sent.lock().unwrap();
        let votes: Vec<_> = sent
            .iter()
            .filter_map(|m| match &m.content {
                ConsensusMessage::Vote(v) => Some(v.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(votes.len(), 2);
        assert!(!votes[0].is_nil());
        assert!(votes[1].is_nil());
    }

    #[tokio::test]
    async fn fork_choice_takes_deepest_branch() {
        // From the highest certified block, the longer branch wins.
        let mut h = harness("a", &["a", "b", "c"]);
        let x = extend(&h.chain, &h.chain.root(), 0);
        for voter in ["a", "b", "c"] {
            h.state.handle_vote(block_vote(voter, &x, 0));
        }
        assert_eq!(h.state.highest_cc_block.hash(), x.hash());

        // Short branch off X.
        let _s1 = extend(&h.chain, &x, 1);
        // Longer branch off X.
        let l1 = extend(&h.chain, &x, 2);
        let l2 = extend(&h.chain, &l1, 3);

        let tip = h.state.set_tip();
        assert_eq!(tip.hash(), l2.hash());
        assert_eq!(h.state.get_tip().hash(), l2.hash());
    }

    #[tokio::test]
    async fn certified_block_from_future_epoch_advances_ours() {
        let mut h = harness("a", &["a", "b", "c"]);
        let b1 = extend(&h.chain, &h.chain.root(), 4);

        h.state.handle_cc(CommitCertificate::new(b1.hash(), VoteSet::new()));
        assert_eq!(h.state.epoch, 5);
        assert_eq!(h.state.highest_cc_block.hash(), b1.hash());
    }

    #[tokio::test]
    async fn cc_for_unknown_block_is_dropped() {
        let mut h = harness("a", &["a", "b", "c"]);
        let before = h.state.epoch;
        h.state.handle_cc(CommitCertificate::new(
            Hash::from_bytes(b"unknown"),
            VoteSet::new(),
        ));
        assert_eq!(h.state.epoch, before);
    }

    #[tokio::test]
    async fn proposer_self_delivers_proposal() {
        let mut h = harness("a", &["a", "b", "c"]);
        assert!(h.state.should_propose());
        h.state.propose();

        // Broadcast and loopback both carry the proposal.
        let sent = h.network.sent.lock().unwrap();
        assert!(matches!(
            sent[0].content,
            ConsensusMessage::Proposal(_)
        ));
        drop(sent);

        let looped = h.state.incoming.try_recv().expect("loopback delivery");
        assert!(matches!(looped, ConsensusMessage::Proposal(_)));
    }
}
