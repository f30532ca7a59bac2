//! # Summary
//!
//! ISIS total ordering on top of reliable broadcast.
//!
//! 1. Every node that receives a `Request` proposes a priority one above
//!    the highest it has seen, unicasts the proposal to the originator and
//!    queues the message as undeliverable.
//! 2. The originator collects proposals. Once every peer that is not
//!    currently failed has proposed, it broadcasts the largest proposal as
//!    the `Agreement`.
//! 3. On agreement every node moves the message to its agreed priority,
//!    marks it deliverable, and delivers from the front of its queue for as
//!    long as the front is deliverable.
//!
//! A message that never gets its agreement because its originator crashed
//! would block the queue forever, so once it is older than the liveness
//! bound and its originator is known to have failed, it is dropped.
//!
//! `Ordering` is the protocol state and does no I/O. `Agreement` is the
//! single task that owns it.
//!
//! The agreed and dropped identifier sets are never pruned: a request or
//! agreement can be relayed to us again at any time, and these sets are
//! what keeps it from being queued a second time.

use std::collections::HashMap as Map;
use std::collections::HashSet as Set;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::internal::{Rx, Tx};
use crate::message::{Delivery, Isis, Kind, Outgoing, Priority, Reliable};
use crate::queue::{Entry, Queue};
use crate::shared::{Detector, Mesh};
use crate::state::Payload;

/// Message the ordering layer wants multicast through the reliable layer.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Multicast<P: Payload> {
    pub kind: Kind,
    pub transaction: P,
    pub destination: Option<String>,
}

/// Proposals collected by the originator of a message.
struct Round {
    proposers: Set<String>,
    best: Priority,
}

impl Round {
    /// Every peer that has not failed has proposed.
    fn complete<D: Detector>(&self, nodes: &[String], failures: &D) -> bool {
        nodes.iter()
            .filter(|node| !failures.is_failed(node))
            .all(|node| self.proposers.contains(node))
    }
}

pub struct Ordering<P: Payload> {
    /// This node
    id: String,

    /// Full peer set, ourselves included
    nodes: Vec<String>,

    /// Highest sequence number proposed or agreed so far
    highest: u64,

    queue: Queue<P>,

    /// Open rounds for messages we originated
    rounds: Map<P::ID, (Round, P)>,

    /// Messages whose agreed priority is known
    agreed: Set<P::ID>,

    /// Messages dropped by the liveness bound
    abandoned: Set<P::ID>,

    liveness: Duration,
}

impl<P: Payload> Ordering<P> {
    pub fn new(id: String, nodes: Vec<String>, liveness: Duration) -> Self {
        Ordering {
            id,
            nodes,
            highest: 0,
            queue: Queue::new(),
            rounds: Map::default(),
            agreed: Set::default(),
            abandoned: Set::default(),
            liveness,
        }
    }

    pub fn highest(&self) -> u64 {
        self.highest
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Wraps an application message as a new request.
    pub fn submit(&self, transaction: P) -> Multicast<P> {
        Multicast {
            kind: Kind::Request,
            transaction,
            destination: None,
        }
    }

    /// Advances the protocol with a message from the reliable layer.
    pub fn receive<D: Detector>(&mut self, message: Isis<P>, failures: &D, now: Instant) -> Vec<Multicast<P>> {
        match message.kind {
        | Kind::Request => {
            self.respond_request(message.origin, message.transaction, now)
                .into_iter()
                .collect()
        }
        | Kind::Proposal(priority) => {
            if message.destination.as_deref() != Some(self.id.as_str()) {
                trace!("ignoring proposal from {} addressed elsewhere", message.origin);
                return Vec::new()
            }
            self.respond_proposal(message.origin, message.transaction, priority, failures)
                .into_iter()
                .collect()
        }
        | Kind::Agreement(priority) => {
            self.respond_agreement(message.origin, message.transaction, priority, now);
            Vec::new()
        }
        }
    }

    fn respond_request(&mut self, origin: String, transaction: P, now: Instant) -> Option<Multicast<P>> {
        let id = transaction.id();
        if self.agreed.contains(&id) || self.abandoned.contains(&id) || self.queue.contains(&id) {
            debug!("ignoring request for {:?}, already known", id);
            return None
        }

        self.highest += 1;
        let priority = Priority::new(self.highest, self.id.clone());
        debug!("proposing {:?} for {:?} from {}", priority, id, origin);

        self.queue.push(Entry {
            origin: origin.clone(),
            transaction: transaction.clone(),
            priority: priority.clone(),
            deliverable: false,
            created: now,
        });

        Some(Multicast {
            kind: Kind::Proposal(priority),
            transaction,
            destination: Some(origin),
        })
    }

    fn respond_proposal<D: Detector>(
        &mut self,
        proposer: String,
        transaction: P,
        priority: Priority,
        failures: &D,
    ) -> Option<Multicast<P>> {
        let id = transaction.id();
        if self.agreed.contains(&id) {
            trace!("late proposal for {:?} from {}", id, proposer);
            return None
        }

        let (round, _) = self.rounds
            .entry(id.clone())
            .or_insert_with(|| {
                let round = Round { proposers: Set::default(), best: priority.clone() };
                (round, transaction)
            });

        round.proposers.insert(proposer);
        if priority > round.best {
            round.best = priority;
        }

        if round.complete(&self.nodes, failures) {
            self.finalize(&id)
        } else {
            None
        }
    }

    fn respond_agreement(&mut self, origin: String, transaction: P, priority: Priority, now: Instant) {
        let id = transaction.id();
        if self.abandoned.contains(&id) {
            warn!("agreement for {:?} arrived after it was dropped", id);
            return
        }

        debug!("agreed on {:?} for {:?}", priority, id);
        self.highest = std::cmp::max(self.highest, priority.sequence);
        self.agreed.insert(id.clone());
        self.rounds.remove(&id);

        if !self.queue.agree(&id, priority.clone()) {
            debug!("agreement for {:?} arrived before its request", id);
            self.queue.push(Entry {
                origin,
                transaction,
                priority,
                deliverable: true,
                created: now,
            });
        }
    }

    /// Closes the round for `id` with the largest proposal.
    fn finalize(&mut self, id: &P::ID) -> Option<Multicast<P>> {
        let (round, transaction) = self.rounds.remove(id)?;
        self.agreed.insert(id.clone());
        debug!("sending agreement {:?} for {:?}", round.best, id);
        Some(Multicast {
            kind: Kind::Agreement(round.best),
            transaction,
            destination: None,
        })
    }

    /// Finalizes any open round that no longer waits on a live peer.
    pub fn reevaluate<D: Detector>(&mut self, failures: &D) -> Vec<Multicast<P>> {
        let complete = self.rounds
            .iter()
            .filter(|(_, (round, _))| round.complete(&self.nodes, failures))
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();
        complete.iter()
            .filter_map(|id| self.finalize(id))
            .collect()
    }

    /// Pops everything deliverable from the front of the queue.
    pub fn deliver<D: Detector>(&mut self, failures: &D, now: Instant) -> Vec<Delivery<P>> {
        let mut delivered = Vec::new();
        loop {
            let deliverable = match self.queue.front() {
            | None => break,
            | Some(front) if front.deliverable => true,
            | Some(front) => {
                let expired = now.saturating_duration_since(front.created) > self.liveness;
                if expired && failures.is_failed(&front.origin) { false } else { break }
            }
            };

            let entry = match self.queue.pop() {
            | Some(entry) => entry,
            | None => break,
            };

            if deliverable {
                delivered.push(Delivery {
                    origin: entry.origin,
                    transaction: entry.transaction,
                    priority: entry.priority,
                });
            } else {
                warn!(
                    "dropping {:?} from failed {} after {:?} without agreement",
                    entry.transaction.id(),
                    entry.origin,
                    self.liveness,
                );
                self.abandoned.insert(entry.transaction.id());
            }
        }
        delivered
    }
}

/// The agreement task: sole owner of the ordering state.
pub struct Agreement<P: Payload> {
    ordering: Ordering<P>,
    mesh: Mesh<P>,

    /// Application submissions
    submit_rx: Rx<P>,

    /// Deliveries from the reliable layer
    reliable_rx: Rx<Reliable<P>>,

    /// Newly failed peers
    failure_rx: Rx<String>,

    /// Reliable layer write side
    writer_tx: Tx<Outgoing<P>>,

    /// Totally ordered output
    delivery_tx: Tx<Delivery<P>>,

    sweep: Duration,
}

impl<P: Payload> Agreement<P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ordering: Ordering<P>,
        mesh: Mesh<P>,
        submit_rx: Rx<P>,
        reliable_rx: Rx<Reliable<P>>,
        failure_rx: Rx<String>,
        writer_tx: Tx<Outgoing<P>>,
        delivery_tx: Tx<Delivery<P>>,
        sweep: Duration,
    ) -> Self {
        Agreement {
            ordering,
            mesh,
            submit_rx,
            reliable_rx,
            failure_rx,
            writer_tx,
            delivery_tx,
            sweep,
        }
    }

    fn multicast(&self, multicast: Multicast<P>) {
        match Isis::encode(&multicast.kind, multicast.transaction, multicast.destination) {
        | Ok(outgoing) => self.writer_tx.send(outgoing),
        | Err(error) => error!("failed to encode {:?}: {}", multicast.kind, error),
        }
    }

    fn deliver(&mut self) {
        for delivery in self.ordering.deliver(&self.mesh, Instant::now()) {
            debug!("delivering {:?} at {:?}", delivery.transaction.id(), delivery.priority);
            self.delivery_tx.send(delivery);
        }
    }

    pub async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.sweep);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                Some(transaction) = self.submit_rx.recv() => {
                    let request = self.ordering.submit(transaction);
                    self.multicast(request);
                }
                Some(reliable) = self.reliable_rx.recv() => {
                    match Isis::decode(reliable) {
                    | Ok(message) => {
                        trace!("{} from {}: {:?}", message.id, message.origin, message.kind);
                        let replies = self.ordering.receive(message, &self.mesh, Instant::now());
                        for reply in replies {
                            self.multicast(reply);
                        }
                        self.deliver();
                        trace!(
                            "highest sequence {}, {} awaiting delivery",
                            self.ordering.highest(),
                            self.ordering.pending(),
                        );
                    }
                    | Err(error) => warn!("dropping malformed total-order message: {}", error),
                    }
                }
                Some(node) = self.failure_rx.recv() => {
                    info!("re-evaluating open rounds without {}", node);
                    for agreement in self.ordering.reevaluate(&self.mesh) {
                        self.multicast(agreement);
                    }
                    self.deliver();
                }
                _ = sweep.tick() => self.deliver(),
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use std::collections::HashSet as Set;
    use std::collections::VecDeque;
    use std::time::{Duration, Instant};

    use super::{Multicast, Ordering};
    use crate::message::tests::{note, Note};
    use crate::message::{Isis, Kind, Priority};

    const NODES: [&str; 3] = ["node1", "node2", "node3"];

    fn nodes(ids: &[&str]) -> Vec<Ordering<Note>> {
        let all = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();
        ids.iter()
            .map(|id| Ordering::new(id.to_string(), all.clone(), Duration::from_secs(10)))
            .collect()
    }

    fn isis(origin: &str, multicast: Multicast<Note>) -> Isis<Note> {
        Isis {
            origin: origin.to_string(),
            id: String::new(),
            transaction: multicast.transaction,
            destination: multicast.destination,
            kind: multicast.kind,
        }
    }

    /// Delivers every multicast to every node (unicasts only to the addressee),
    /// in FIFO order, until nothing is left in flight.
    fn settle(
        ids: &[&str],
        cluster: &mut [Ordering<Note>],
        failed: &Set<String>,
        mut in_flight: VecDeque<(String, Multicast<Note>)>,
        delivered: &mut [Vec<String>],
    ) {
        let now = Instant::now();
        while let Some((origin, multicast)) = in_flight.pop_front() {
            for (index, node) in cluster.iter_mut().enumerate() {
                if failed.contains(ids[index]) { continue }
                if let Some(destination) = &multicast.destination {
                    if destination != ids[index] { continue }
                }
                let message = isis(&origin, multicast.clone());
                for reply in node.receive(message, failed, now) {
                    in_flight.push_back((ids[index].to_string(), reply));
                }
                for delivery in node.deliver(failed, now) {
                    delivered[index].push(delivery.transaction.0);
                }
            }
        }
    }

    #[test]
    fn test_concurrent_requests_agree_on_order() {
        let mut cluster = nodes(&NODES);
        let failed = Set::<String>::new();
        let mut delivered = vec![Vec::new(); 3];

        let mut in_flight = VecDeque::new();
        in_flight.push_back(("node1".to_string(), cluster[0].submit(note("m1"))));
        in_flight.push_back(("node2".to_string(), cluster[1].submit(note("m2"))));
        in_flight.push_back(("node3".to_string(), cluster[2].submit(note("m3"))));
        in_flight.push_back(("node1".to_string(), cluster[0].submit(note("m4"))));

        settle(&NODES, &mut cluster, &failed, in_flight, &mut delivered);

        assert_eq!(delivered[0].len(), 4);
        assert_eq!(delivered[0], delivered[1]);
        assert_eq!(delivered[1], delivered[2]);
        for node in &cluster {
            assert_eq!(node.pending(), 0);
        }
    }

    #[test]
    fn test_delivery_follows_agreed_priority() {
        let mut node = nodes(&["node1", "node2"]).remove(0);
        let failed = Set::<String>::new();
        let now = Instant::now();

        for id in ["a", "b"] {
            let request = Isis {
                origin: "node2".to_string(),
                id: String::new(),
                transaction: note(id),
                destination: None,
                kind: Kind::Request,
            };
            assert_eq!(node.receive(request, &failed, now).len(), 1);
        }
        assert_eq!(node.highest(), 2);

        // `b` is agreed first but at a lower priority than `a` will get.
        let agree = |id: &str, sequence: u64| Isis {
            origin: "node2".to_string(),
            id: String::new(),
            transaction: note(id),
            destination: None,
            kind: Kind::Agreement(Priority::new(sequence, "node2")),
        };
        node.receive(agree("b", 3), &failed, now);
        assert!(node.deliver(&failed, now).is_empty(), "`a` still blocks at priority 1");

        node.receive(agree("a", 4), &failed, now);
        let order = node.deliver(&failed, now)
            .into_iter()
            .map(|delivery| delivery.transaction.0)
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(node.highest(), 4);
    }

    #[test]
    fn test_quorum_excludes_failed_peers() {
        let ids = ["node1", "node2", "node3", "node4"];
        let mut cluster = nodes(&ids);
        let failed = ["node4".to_string()].into_iter().collect::<Set<_>>();
        let mut delivered = vec![Vec::new(); 4];

        let mut in_flight = VecDeque::new();
        in_flight.push_back(("node2".to_string(), cluster[1].submit(note("m"))));
        settle(&ids, &mut cluster, &failed, in_flight, &mut delivered);

        for index in 0..3 {
            assert_eq!(delivered[index], vec!["m".to_string()]);
        }
        assert!(delivered[3].is_empty());
    }

    #[test]
    fn test_agreement_waits_for_every_live_peer() {
        let mut node = nodes(&NODES).remove(0);
        let now = Instant::now();
        let none = Set::<String>::new();

        let proposal = |from: &str, sequence: u64| Isis {
            origin: from.to_string(),
            id: String::new(),
            transaction: note("m"),
            destination: Some("node1".to_string()),
            kind: Kind::Proposal(Priority::new(sequence, from)),
        };

        assert!(node.receive(proposal("node1", 1), &none, now).is_empty());
        assert!(node.receive(proposal("node3", 5), &none, now).is_empty());

        // node2 is silent; once it is detected as failed the round closes.
        assert!(node.reevaluate(&none).is_empty());
        let failed = ["node2".to_string()].into_iter().collect::<Set<_>>();
        let agreements = node.reevaluate(&failed);
        assert_eq!(agreements.len(), 1);
        assert_eq!(agreements[0].kind, Kind::Agreement(Priority::new(5, "node3")));
        assert!(agreements[0].destination.is_none());

        // The round is closed for good.
        assert!(node.reevaluate(&failed).is_empty());
        assert!(node.receive(proposal("node2", 9), &none, now).is_empty());
    }

    #[test]
    fn test_tie_broken_by_node() {
        let mut node = nodes(&["node1", "node2"]).remove(0);
        let none = Set::<String>::new();
        let now = Instant::now();
        let proposal = |from: &str| Isis {
            origin: from.to_string(),
            id: String::new(),
            transaction: note("m"),
            destination: Some("node1".to_string()),
            kind: Kind::Proposal(Priority::new(3, from)),
        };
        node.receive(proposal("node2"), &none, now);
        let agreement = node.receive(proposal("node1"), &none, now);
        assert_eq!(agreement[0].kind, Kind::Agreement(Priority::new(3, "node2")));
    }

    #[test]
    fn test_proposals_for_others_ignored() {
        let mut node = nodes(&NODES).remove(1);
        let none = Set::<String>::new();
        let misaddressed = Isis {
            origin: "node2".to_string(),
            id: String::new(),
            transaction: note("m"),
            destination: Some("node1".to_string()),
            kind: Kind::Proposal(Priority::new(1, "node2")),
        };
        assert!(node.receive(misaddressed, &none, Instant::now()).is_empty());
        assert!(node.rounds.is_empty());
    }

    #[test]
    fn test_highest_is_monotonic() {
        let mut node = nodes(&NODES).remove(0);
        let none = Set::<String>::new();
        let now = Instant::now();
        let agree = |id: &str, sequence: u64| Isis {
            origin: "node2".to_string(),
            id: String::new(),
            transaction: note(id),
            destination: None,
            kind: Kind::Agreement(Priority::new(sequence, "node2")),
        };

        let mut last = node.highest();
        for (id, sequence) in [("a", 7), ("b", 3), ("c", 12), ("d", 1)] {
            node.receive(agree(id, sequence), &none, now);
            assert!(node.highest() >= last);
            assert!(node.highest() >= sequence);
            last = node.highest();
        }
        assert_eq!(node.highest(), 12);

        let request = Isis {
            origin: "node3".to_string(),
            id: String::new(),
            transaction: note("e"),
            destination: None,
            kind: Kind::Request,
        };
        let proposal = node.receive(request, &none, now);
        assert_eq!(proposal[0].kind, Kind::Proposal(Priority::new(13, "node1")));
        assert_eq!(proposal[0].destination.as_deref(), Some("node3"));
    }

    #[test]
    fn test_agreement_before_request() {
        let mut node = nodes(&NODES).remove(0);
        let none = Set::<String>::new();
        let now = Instant::now();
        let message = |kind: Kind| Isis {
            origin: "node2".to_string(),
            id: String::new(),
            transaction: note("m"),
            destination: None,
            kind,
        };

        node.receive(message(Kind::Agreement(Priority::new(2, "node3"))), &none, now);
        assert!(node.receive(message(Kind::Request), &none, now).is_empty());

        let delivered = node.deliver(&none, now);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].origin, "node2");
        assert_eq!(delivered[0].priority, Priority::new(2, "node3"));
        assert_eq!(node.pending(), 0);
    }

    #[test]
    fn test_stuck_message_from_failed_origin_dropped() {
        let mut node = nodes(&NODES).remove(0);
        let created = Instant::now();
        let request = |origin: &str, id: &str| Isis {
            origin: origin.to_string(),
            id: String::new(),
            transaction: note(id),
            destination: None,
            kind: Kind::Request,
        };
        let none = Set::<String>::new();
        let failed = ["node3".to_string()].into_iter().collect::<Set<_>>();

        // node3 crashes before agreeing on `lost`; `later` from node2 is agreed.
        node.receive(request("node3", "lost"), &none, created);
        node.receive(request("node2", "later"), &none, created);
        node.receive(Isis {
            origin: "node2".to_string(),
            id: String::new(),
            transaction: note("later"),
            destination: None,
            kind: Kind::Agreement(Priority::new(2, "node2")),
        }, &none, created);

        // Young messages block, whatever their origin.
        assert!(node.deliver(&failed, created + Duration::from_secs(5)).is_empty());

        // Old messages block while their origin is alive.
        assert!(node.deliver(&none, created + Duration::from_secs(11)).is_empty());

        let delivered = node.deliver(&failed, created + Duration::from_secs(11));
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].transaction, note("later"));
        assert_eq!(node.pending(), 0);

        // A straggling agreement for the dropped message is ignored.
        node.receive(Isis {
            origin: "node3".to_string(),
            id: String::new(),
            transaction: note("lost"),
            destination: None,
            kind: Kind::Agreement(Priority::new(1, "node1")),
        }, &none, created);
        assert!(node.deliver(&none, created).is_empty());
        assert_eq!(node.pending(), 0);
    }

    fn mesh() -> (crate::shared::Mesh<Note>, crate::internal::Rx<String>) {
        let text = "3\nnode1 127.0.0.1 1\nnode2 127.0.0.1 2\nnode3 127.0.0.1 3\n";
        let registry = crate::registry::Registry::parse("node1", text).unwrap();
        let (mesh, _, failures) = crate::shared::Mesh::new(registry);
        (mesh, failures)
    }

    fn reliable(origin: &str, id: &str, kind: Kind, destination: Option<&str>) -> crate::message::Reliable<Note> {
        let outgoing = Isis::encode(&kind, note(id), destination.map(str::to_string)).unwrap();
        crate::message::Reliable {
            origin: origin.to_string(),
            id: format!("{},{}", origin, id),
            payload: outgoing.payload,
            transaction: outgoing.transaction,
            destination: outgoing.destination,
        }
    }

    #[tokio::test]
    async fn test_sweep_skips_stuck_entry() {
        use crate::internal;

        let (mesh, failure_rx) = mesh();
        let (submit_rx, _submit_tx) = internal::new();
        let (reliable_rx, reliable_tx) = internal::new();
        let (_writer_rx, writer_tx) = internal::new();
        let (mut delivery_rx, delivery_tx) = internal::new();
        let nodes = mesh.registry().all().map(|peer| peer.id.clone()).collect();
        let ordering = Ordering::new("node1".to_string(), nodes, Duration::from_millis(300));
        let agreement = super::Agreement::new(
            ordering,
            mesh.clone(),
            submit_rx,
            reliable_rx,
            failure_rx,
            writer_tx,
            delivery_tx,
            Duration::from_millis(20),
        );
        tokio::spawn(agreement.run());

        // node3 is already known to have failed, but `lost` is still young.
        mesh.mark_failed("node3");
        reliable_tx.send(reliable("node3", "lost", Kind::Request, None));
        reliable_tx.send(reliable("node2", "later", Kind::Request, None));
        reliable_tx.send(reliable("node2", "later", Kind::Agreement(Priority::new(2, "node2")), None));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(delivery_rx.try_recv().is_none());

        // No further traffic: only the sweep can release `later`.
        let delivery = tokio::time::timeout(Duration::from_secs(2), delivery_rx.recv())
            .await
            .expect("sweep never delivered")
            .unwrap();
        assert_eq!(delivery.transaction, note("later"));
        assert_eq!(delivery.origin, "node2");
        assert!(delivery_rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_failure_closes_open_round() {
        use crate::internal;

        let (mesh, failure_rx) = mesh();
        let (submit_rx, submit_tx) = internal::new();
        let (reliable_rx, reliable_tx) = internal::new();
        let (mut writer_rx, writer_tx) = internal::new();
        let (_delivery_rx, delivery_tx) = internal::new();
        let nodes = mesh.registry().all().map(|peer| peer.id.clone()).collect();
        let ordering = Ordering::new("node1".to_string(), nodes, Duration::from_secs(10));
        let agreement = super::Agreement::new(
            ordering,
            mesh.clone(),
            submit_rx,
            reliable_rx,
            failure_rx,
            writer_tx,
            delivery_tx,
            Duration::from_secs(3600),
        );
        tokio::spawn(agreement.run());

        let kind = |outgoing: &crate::message::Outgoing<Note>| {
            bincode::deserialize::<Kind>(&outgoing.payload).unwrap()
        };
        let next = |writer_rx: &mut internal::Rx<crate::message::Outgoing<Note>>| {
            let outgoing = writer_rx.try_recv();
            outgoing.map(|outgoing| (kind(&outgoing), outgoing.destination))
        };

        submit_tx.send(note("m"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(next(&mut writer_rx), Some((Kind::Request, None)));

        // node3 never proposes.
        for (from, sequence) in [("node1", 1), ("node2", 4)] {
            reliable_tx.send(reliable(from, "m", Kind::Proposal(Priority::new(sequence, from)), Some("node1")));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(next(&mut writer_rx), None);

        mesh.mark_failed("node3");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(next(&mut writer_rx), Some((Kind::Agreement(Priority::new(4, "node2")), None)));
        assert_eq!(next(&mut writer_rx), None);
    }
}
