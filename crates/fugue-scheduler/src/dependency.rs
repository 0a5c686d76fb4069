//! Dependency graph for batch transactions
//!
//! Builds a directed graph whose edges are must-happen-before
//! relationships derived purely from read/write-set overlap. A cycle in
//! the graph is not an error: the cycle's members are folded into a
//! single conflict group that runs fully serially.

use crate::error::{SchedulerError, SchedulerResult};
use crate::rw_set::RwSet;
use fugue_types::{AccountId, ConflictKind, TxnId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// One labelled edge of the dependency graph.
///
/// `from` precedes `to` in submission order. A pair of transactions
/// produces one edge per shared account and conflict kind; edges are
/// never deduplicated so the audit trail stays complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Earlier transaction (submission order)
    pub from: TxnId,
    /// Later transaction
    pub to: TxnId,
    /// Conflict classification for this edge
    pub kind: ConflictKind,
    /// The shared account
    pub resource: AccountId,
}

/// Dependency graph over a batch's transactions
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// Transactions in submission order
    txns: Vec<TxnId>,
    /// Every labelled edge, in deterministic build order
    edges: Vec<DependencyEdge>,
    /// Forward adjacency: txn -> transactions that depend on it
    forward: BTreeMap<TxnId, BTreeSet<TxnId>>,
    /// Backward adjacency: txn -> transactions it depends on
    backward: BTreeMap<TxnId, BTreeSet<TxnId>>,
}

impl DependencyGraph {
    /// Build the graph from per-transaction read/write sets.
    ///
    /// For every ordered pair (A, B) with A before B in submission order,
    /// adds an edge A -> B per shared account where A writes what B reads
    /// (RAW), both write (WAW), or A reads what B writes (WAR). O(n²)
    /// pairwise comparison, acceptable at the documented batch sizes.
    ///
    /// Fails only on duplicate transaction ids.
    pub fn build(rw_sets: &[(TxnId, RwSet)]) -> SchedulerResult<Self> {
        let mut graph = Self::default();

        for (id, _) in rw_sets {
            if graph.forward.contains_key(id) {
                return Err(SchedulerError::DuplicateTransaction(id.clone()));
            }
            graph.txns.push(id.clone());
            graph.forward.insert(id.clone(), BTreeSet::new());
            graph.backward.insert(id.clone(), BTreeSet::new());
        }

        for i in 0..rw_sets.len() {
            for j in (i + 1)..rw_sets.len() {
                let (id_a, rw_a) = &rw_sets[i];
                let (id_b, rw_b) = &rw_sets[j];

                // B reads what A writes
                for account in rw_b.raw_overlap(rw_a) {
                    graph.add_edge(id_a, id_b, ConflictKind::Raw, account);
                }
                // both write; the tie is broken later by id, not by
                // submission order
                for account in rw_b.waw_overlap(rw_a) {
                    graph.add_edge(id_a, id_b, ConflictKind::Waw, account);
                }
                // A reads what B later writes
                for account in rw_b.war_overlap(rw_a) {
                    graph.add_edge(id_a, id_b, ConflictKind::War, account);
                }
            }
        }

        if graph.has_cycle() {
            tracing::debug!(
                transactions = graph.len(),
                edges = graph.edge_count(),
                "dependency cycle detected; affected transactions will serialize"
            );
        }

        Ok(graph)
    }

    fn add_edge(&mut self, from: &TxnId, to: &TxnId, kind: ConflictKind, resource: AccountId) {
        self.edges.push(DependencyEdge {
            from: from.clone(),
            to: to.clone(),
            kind,
            resource,
        });
        if let Some(set) = self.forward.get_mut(from) {
            set.insert(to.clone());
        }
        if let Some(set) = self.backward.get_mut(to) {
            set.insert(from.clone());
        }
    }

    /// Transactions in submission order
    pub fn transactions(&self) -> &[TxnId] {
        &self.txns
    }

    /// Every labelled edge
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Total number of edge records
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.txns.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    /// Transactions that depend on the given transaction
    pub fn dependents_of(&self, id: &TxnId) -> Vec<TxnId> {
        self.forward
            .get(id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Transactions the given transaction depends on
    pub fn dependencies_of(&self, id: &TxnId) -> Vec<TxnId> {
        self.backward
            .get(id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Detect a cycle via iterative depth-first search.
    ///
    /// A cycle forces its members into one serial conflict group; it is
    /// recorded in diagnostics, never surfaced as a failure.
    pub fn has_cycle(&self) -> bool {
        // 1 = in progress, 2 = done
        let mut color: BTreeMap<TxnId, u8> = BTreeMap::new();

        for start in &self.txns {
            if color.contains_key(start) {
                continue;
            }
            color.insert(start.clone(), 1);
            let mut stack: Vec<(TxnId, Vec<TxnId>, usize)> =
                vec![(start.clone(), self.dependents_of(start), 0)];

            while !stack.is_empty() {
                let step = {
                    let (node, children, idx) = stack.last_mut().expect("stack not empty");
                    if *idx < children.len() {
                        let child = children[*idx].clone();
                        *idx += 1;
                        Ok(child)
                    } else {
                        Err(node.clone())
                    }
                };
                match step {
                    Ok(child) => match color.get(&child).copied() {
                        Some(1) => return true,
                        Some(_) => {}
                        None => {
                            color.insert(child.clone(), 1);
                            let succ = self.dependents_of(&child);
                            stack.push((child, succ, 0));
                        }
                    },
                    Err(node) => {
                        color.insert(node, 2);
                        stack.pop();
                    }
                }
            }
        }

        false
    }

    /// Maximal sets of transitively conflicting transactions.
    ///
    /// Connected components of the undirected conflict graph: every
    /// member of a component must execute serially relative to the rest
    /// of its component, and a singleton component is fully independent.
    /// Members are sorted lexicographically and components are ordered by
    /// their smallest member, so the output is reproducible.
    pub fn conflict_components(&self) -> Vec<Vec<TxnId>> {
        let mut visited: BTreeSet<TxnId> = BTreeSet::new();
        let mut components = Vec::new();

        // forward.keys() iterates ids lexicographically, so each
        // component is discovered at its smallest member
        for start in self.forward.keys() {
            if visited.contains(start) {
                continue;
            }
            let mut members = BTreeSet::new();
            let mut queue = VecDeque::from([start.clone()]);
            visited.insert(start.clone());

            while let Some(node) = queue.pop_front() {
                for neighbor in self
                    .dependents_of(&node)
                    .into_iter()
                    .chain(self.dependencies_of(&node))
                {
                    if visited.insert(neighbor.clone()) {
                        queue.push_back(neighbor);
                    }
                }
                members.insert(node);
            }

            components.push(members.into_iter().collect());
        }

        components
    }
}
