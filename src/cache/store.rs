//! Entity store and freshness bookkeeping for the connector cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::models::{
    CacheStats, Connector, ConnectorId, ProjectPoint, RelationType, Skeleton, SkeletonId,
    Treenode, TreenodeId,
};
use super::sorting::{SortIndex, SortMode};
use crate::error::CacheError;

/// `true` if data stamped at `timestamp` is still within `ttl`.
pub(crate) fn is_fresh(timestamp: Instant, ttl: Duration) -> bool {
    timestamp.elapsed() < ttl
}

/// One connector link derived from a detail response.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LinkUpdate {
    pub treenode_id: TreenodeId,
    pub connector_id: ConnectorId,
    pub relation: RelationType,
    pub coords: ProjectPoint,
    pub depth: f64,
}

/// A skeleton's fully parsed detail response, applied to the store as one
/// atomic update.
#[derive(Clone, Debug)]
pub(crate) struct SkeletonUpdate {
    pub skeleton_id: SkeletonId,
    pub max_length: f64,
    pub links: Vec<LinkUpdate>,
}

/// Mutable cache state: the three entity maps, the per-relation sort
/// indices, the active sort mode and the write generation.
#[derive(Debug, Default)]
pub(crate) struct CacheState {
    pub skeletons: HashMap<SkeletonId, Skeleton>,
    pub treenodes: HashMap<TreenodeId, Treenode>,
    pub connectors: HashMap<ConnectorId, Connector>,
    pub sorting: [SortIndex; 4],
    pub sort_mode: SortMode,
    /// Bumped by `clear`; fetches started under an older generation
    /// discard their writes when they complete.
    pub generation: u64,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipe all entities and sort indices. The configured sort mode
    /// survives; the generation is bumped so in-flight fetches are
    /// discarded.
    pub fn clear(&mut self) {
        self.skeletons.clear();
        self.treenodes.clear();
        self.connectors.clear();
        self.sorting = Default::default();
        self.generation += 1;
    }

    /// Whether the skeleton's arbor data is cached and within `ttl`.
    pub fn arbor_fresh(&self, skeleton_id: SkeletonId, ttl: Duration) -> bool {
        self.skeletons
            .get(&skeleton_id)
            .map(|skeleton| is_fresh(skeleton.arbor_fetched_at, ttl))
            .unwrap_or(false)
    }

    /// Whether the skeleton's name is cached and within `ttl`. A skeleton
    /// without a name is never name-fresh.
    pub fn name_fresh(&self, skeleton_id: SkeletonId, ttl: Duration) -> bool {
        self.skeletons
            .get(&skeleton_id)
            .map(|skeleton| {
                skeleton.name.is_some()
                    && skeleton
                        .name_fetched_at
                        .map(|fetched_at| is_fresh(fetched_at, ttl))
                        .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// Apply a parsed skeleton update.
    ///
    /// Overwrites the skeleton's treenode entries, accumulates connector
    /// associations, and dirties the sort index of every relation gaining
    /// a connector.
    pub fn apply_update(&mut self, update: SkeletonUpdate, fetched_at: Instant) {
        let skeleton = self
            .skeletons
            .entry(update.skeleton_id)
            .or_insert_with(|| Skeleton {
                name: None,
                name_fetched_at: None,
                arbor_fetched_at: fetched_at,
                max_length: 0.0,
            });
        skeleton.arbor_fetched_at = fetched_at;
        skeleton.max_length = update.max_length;

        for link in update.links {
            let connector = self
                .connectors
                .entry(link.connector_id)
                .or_insert_with(|| Connector::new(link.coords));
            // last write wins for the coordinate; connectors don't move in
            // practice
            connector.coords = link.coords;
            connector.partners_mut(link.relation).insert(link.treenode_id);

            self.sorting[link.relation.index()].insert(link.connector_id);

            self.treenodes.insert(
                link.treenode_id,
                Treenode {
                    skeleton_id: update.skeleton_id,
                    depth: link.depth,
                },
            );
        }
    }

    /// Record a freshly fetched neuron name. A no-op if the skeleton is
    /// not cached (it may have been cleared while the name was in flight).
    pub fn set_name(&mut self, skeleton_id: SkeletonId, name: String, fetched_at: Instant) {
        if let Some(skeleton) = self.skeletons.get_mut(&skeleton_id) {
            skeleton.name = Some(name);
            skeleton.name_fetched_at = Some(fetched_at);
        }
    }

    /// Minimum depth of the connector on any selected skeleton under the
    /// given relation, absolute or normalized by the skeleton's maximum
    /// length. +infinity when no selected skeleton qualifies.
    pub fn min_depth(
        &self,
        connector_id: ConnectorId,
        relation: RelationType,
        selected: &[SkeletonId],
        proportional: bool,
    ) -> Result<f64, CacheError> {
        let connector = self
            .connectors
            .get(&connector_id)
            .ok_or(CacheError::UnknownConnector(connector_id))?;

        let mut min_depth = f64::INFINITY;
        for &treenode_id in connector.partners(relation) {
            let treenode = self
                .treenodes
                .get(&treenode_id)
                .ok_or(CacheError::UnknownTreenode(treenode_id))?;
            if !selected.contains(&treenode.skeleton_id) {
                continue;
            }
            let depth = if proportional {
                let skeleton = self
                    .skeletons
                    .get(&treenode.skeleton_id)
                    .ok_or(CacheError::UnknownSkeleton(treenode.skeleton_id))?;
                treenode.depth / skeleton.max_length
            } else {
                treenode.depth
            };
            min_depth = min_depth.min(depth);
        }

        Ok(min_depth)
    }

    /// Alphabetically first name among the selected skeletons touching the
    /// connector under the relation, or `None` when no qualifying skeleton
    /// has a name.
    pub fn first_skeleton_name(
        &self,
        connector_id: ConnectorId,
        relation: RelationType,
        selected: &[SkeletonId],
    ) -> Result<Option<String>, CacheError> {
        let mut names = self.qualifying_names(connector_id, relation, selected)?;
        names.sort();
        Ok(names.into_iter().next())
    }

    /// Sorted, duplicate-free names of the selected skeletons touching the
    /// connector under the relation.
    pub fn selected_skeleton_names(
        &self,
        connector_id: ConnectorId,
        relation: RelationType,
        selected: &[SkeletonId],
    ) -> Result<Vec<String>, CacheError> {
        let mut names = self.qualifying_names(connector_id, relation, selected)?;
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn qualifying_names(
        &self,
        connector_id: ConnectorId,
        relation: RelationType,
        selected: &[SkeletonId],
    ) -> Result<Vec<String>, CacheError> {
        let connector = self
            .connectors
            .get(&connector_id)
            .ok_or(CacheError::UnknownConnector(connector_id))?;

        let mut names = Vec::new();
        for &treenode_id in connector.partners(relation) {
            let treenode = self
                .treenodes
                .get(&treenode_id)
                .ok_or(CacheError::UnknownTreenode(treenode_id))?;
            if !selected.contains(&treenode.skeleton_id) {
                continue;
            }
            let skeleton = self
                .skeletons
                .get(&treenode.skeleton_id)
                .ok_or(CacheError::UnknownSkeleton(treenode.skeleton_id))?;
            if let Some(name) = &skeleton.name {
                names.push(name.clone());
            }
        }
        Ok(names)
    }

    /// Entity counts, for monitoring.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            skeletons: self.skeletons.len(),
            treenodes: self.treenodes.len(),
            connectors: self.connectors.len(),
        }
    }
}
