//! Conflict detection and deterministic resolution

use crate::dependency::DependencyGraph;
use fugue_types::{Conflict, ResolutionMethod, ResolutionStrategy, TxnId};
use std::collections::BTreeSet;

/// Detects conflicting edges and computes a reproducible execution order.
///
/// Detection and resolution never fail: a batch with zero conflicts
/// yields an empty conflict list and all-singleton conflict groups.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Walk every graph edge and classify it as a [`Conflict`] record.
    ///
    /// One record per (pair, account, kind) with every field populated;
    /// `resolution` is the lexicographically smaller id of the pair.
    /// Output is sorted by (resource, pair, kind) so repeated runs over
    /// the same batch produce byte-identical lists.
    pub fn detect_conflicts(graph: &DependencyGraph) -> Vec<Conflict> {
        let mut conflicts: Vec<Conflict> = graph
            .edges()
            .iter()
            .map(|edge| {
                let resolution = if edge.from <= edge.to {
                    edge.from.clone()
                } else {
                    edge.to.clone()
                };
                Conflict {
                    transaction_1: edge.from.clone(),
                    transaction_2: edge.to.clone(),
                    kind: edge.kind,
                    resource: edge.resource.clone(),
                    resolution,
                }
            })
            .collect();

        conflicts.sort_by(|a, b| {
            (&a.resource, &a.transaction_1, &a.transaction_2, a.kind)
                .cmp(&(&b.resource, &b.transaction_1, &b.transaction_2, b.kind))
        });
        conflicts
    }

    /// Compute the batch's [`ResolutionStrategy`].
    ///
    /// Conflict groups are the graph's conflict components with members
    /// sorted lexicographically; `execution_order` is the
    /// lexicographically sorted list of every id that appears in at
    /// least one conflict. Nothing here depends on timestamps, thread
    /// ids, hash iteration order, or randomness.
    pub fn resolve_conflicts(
        conflicts: &[Conflict],
        graph: &DependencyGraph,
    ) -> ResolutionStrategy {
        let conflicted: BTreeSet<TxnId> = conflicts
            .iter()
            .flat_map(|c| [c.transaction_1.clone(), c.transaction_2.clone()])
            .collect();

        ResolutionStrategy {
            execution_order: conflicted.into_iter().collect(),
            conflict_groups: graph.conflict_components(),
            resolution_method: ResolutionMethod::Lexicographic,
        }
    }
}
