//! Connector viewer cache: freshness-gated fetching, entity bookkeeping
//! and lazily re-sorted per-relation connector orderings.
//!
//! Known limitations, all resolved by [`ConnectorViewerCache::clear`] or
//! [`ConnectorViewerCache::refresh`]:
//! - does not pick up a treenode and connector losing their association
//! - does not pick up a treenode's depth on a skeleton changing

mod models;
mod sorting;
mod store;

pub use models::{
    CacheStats, Connector, ConnectorId, ConnectorListing, ProjectPoint, RelationType, Skeleton,
    SkeletonId, Treenode, TreenodeId,
};
pub use sorting::SortMode;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::arbor::Arbor;
use crate::client::{CatmaidClient, CompactSkeletonDetail, SkeletonApi};
use crate::config::{CacheSettings, DEFAULT_CACHE_TIMEOUT_SECS};
use crate::error::CacheError;
use crate::selection::SkeletonSource;
use store::{CacheState, LinkUpdate, SkeletonUpdate};

/// Cache of connector data for the currently selected skeletons.
///
/// One instance owns its entity store and sort indices exclusively. All
/// mutation happens on fetch completion under an internal lock; the lock
/// is never held across a fetch await, so independent skeleton fetches
/// proceed concurrently.
pub struct ConnectorViewerCache {
    api: Arc<dyn SkeletonApi>,
    source: Arc<dyn SkeletonSource>,
    cache_timeout: Duration,
    state: Mutex<CacheState>,
}

impl ConnectorViewerCache {
    /// Create a cache over the given transport and selection source, with
    /// the default five-minute cache timeout.
    pub fn new(api: Arc<dyn SkeletonApi>, source: Arc<dyn SkeletonSource>) -> Self {
        Self {
            api,
            source,
            cache_timeout: Duration::from_secs(DEFAULT_CACHE_TIMEOUT_SECS),
            state: Mutex::new(CacheState::new()),
        }
    }

    /// Create a cache talking to a CATMAID server described by `settings`.
    pub fn from_settings(settings: &CacheSettings, source: Arc<dyn SkeletonSource>) -> Self {
        Self::new(Arc::new(CatmaidClient::from_settings(settings)), source)
            .with_cache_timeout(settings.cache_timeout())
    }

    /// Override the cache timeout.
    pub fn with_cache_timeout(mut self, cache_timeout: Duration) -> Self {
        self.cache_timeout = cache_timeout;
        self
    }

    /// The active sort mode.
    pub async fn sort_mode(&self) -> SortMode {
        self.state.lock().await.sort_mode
    }

    /// Switch the active sort mode.
    ///
    /// Existing indices are not cleared; an index sorted under another
    /// mode is detected and re-sorted on the next [`Self::connector_order`]
    /// call for its relation type.
    pub async fn set_sort_mode(&self, mode: SortMode) {
        self.state.lock().await.sort_mode = mode;
    }

    /// Drop every cached entity and ordering. The configured sort mode
    /// survives. Fetches already in flight are discarded when they
    /// complete.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.clear();
        info!("cleared connector cache");
    }

    /// Clear, then re-fetch all currently selected skeletons, bypassing
    /// the cache timeout.
    pub async fn refresh(&self) -> Result<(), CacheError> {
        self.clear().await;
        self.ensure_fresh().await
    }

    /// Ensure every currently selected skeleton has fresh cached data,
    /// fetching stale ones concurrently.
    pub async fn ensure_fresh(&self) -> Result<(), CacheError> {
        let selected = self.source.selected_skeletons();
        try_join_all(
            selected
                .into_iter()
                .map(|skeleton_id| self.ensure_fresh_skeleton(skeleton_id)),
        )
        .await?;
        Ok(())
    }

    /// Ensure one skeleton's cached data is fresh.
    ///
    /// A stale skeleton triggers a compact detail fetch whose parsed
    /// update is applied atomically, followed by a name fetch gated by the
    /// name's own timestamp. Concurrent calls for the same skeleton may
    /// fetch twice; the writes are idempotent.
    pub async fn ensure_fresh_skeleton(&self, skeleton_id: SkeletonId) -> Result<(), CacheError> {
        let generation = {
            let state = self.state.lock().await;
            if state.arbor_fresh(skeleton_id, self.cache_timeout) {
                debug!(skeleton_id, "arbor cache hit");
                return Ok(());
            }
            state.generation
        };

        debug!(skeleton_id, "fetching compact skeleton detail");
        let detail = self
            .api
            .compact_detail(skeleton_id)
            .await
            .map_err(CacheError::Api)?;
        let update = parse_detail(skeleton_id, &detail)?;
        let fetched_at = Instant::now();

        {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                warn!(
                    skeleton_id,
                    "discarding skeleton detail fetched before a cache clear"
                );
                return Ok(());
            }
            state.apply_update(update, fetched_at);
        }

        self.ensure_fresh_skeleton_name(skeleton_id, generation)
            .await
    }

    /// Ensure the skeleton's name is fresh. Only called after the arbor
    /// step so the skeleton entry exists unless the cache was cleared in
    /// the meantime.
    async fn ensure_fresh_skeleton_name(
        &self,
        skeleton_id: SkeletonId,
        generation: u64,
    ) -> Result<(), CacheError> {
        {
            let state = self.state.lock().await;
            if state.generation != generation {
                return Ok(());
            }
            if state.name_fresh(skeleton_id, self.cache_timeout) {
                debug!(skeleton_id, "name cache hit");
                return Ok(());
            }
        }

        debug!(skeleton_id, "fetching neuron name");
        let name = self
            .api
            .neuron_name(skeleton_id)
            .await
            .map_err(CacheError::Api)?;
        let fetched_at = Instant::now();

        let mut state = self.state.lock().await;
        if state.generation != generation {
            warn!(
                skeleton_id,
                "discarding neuron name fetched before a cache clear"
            );
            return Ok(());
        }
        state.set_name(skeleton_id, name, fetched_at);
        Ok(())
    }

    /// Freshness-gated, lazily re-sorted connector ordering for one
    /// relation type, projected into display records.
    pub async fn connector_order(
        &self,
        relation: RelationType,
    ) -> Result<Vec<ConnectorListing>, CacheError> {
        self.ensure_fresh().await?;
        let selected = self.source.selected_skeletons();

        let mut state = self.state.lock().await;
        let order = sorting::resolve_order(&mut state, relation, &selected)?;

        let mut listings = Vec::with_capacity(order.len());
        for connector_id in order {
            let coords = state
                .connectors
                .get(&connector_id)
                .ok_or(CacheError::UnknownConnector(connector_id))?
                .coords;
            let skeleton_names =
                state.selected_skeleton_names(connector_id, relation, &selected)?;
            listings.push(ConnectorListing {
                connector_id,
                coords,
                skeleton_names,
            });
        }
        Ok(listings)
    }

    /// Minimum depth of a cached connector among the currently selected
    /// skeletons under `relation`, optionally normalized by each
    /// skeleton's maximum length.
    ///
    /// Querying a connector that is not in the cache is a contract
    /// violation and fails with [`CacheError::UnknownConnector`].
    pub async fn min_depth(
        &self,
        connector_id: ConnectorId,
        relation: RelationType,
        proportional: bool,
    ) -> Result<f64, CacheError> {
        let selected = self.source.selected_skeletons();
        let state = self.state.lock().await;
        state.min_depth(connector_id, relation, &selected, proportional)
    }

    /// Alphabetically first name among the currently selected skeletons
    /// touching a cached connector under `relation`.
    pub async fn first_skeleton_name(
        &self,
        connector_id: ConnectorId,
        relation: RelationType,
    ) -> Result<Option<String>, CacheError> {
        let selected = self.source.selected_skeletons();
        let state = self.state.lock().await;
        state.first_skeleton_name(connector_id, relation, &selected)
    }

    /// Entity counts, for monitoring.
    pub async fn stats(&self) -> CacheStats {
        self.state.lock().await.stats()
    }
}

/// Parse a compact detail response into an atomic store update. Fails
/// without side effects on malformed content.
fn parse_detail(
    skeleton_id: SkeletonId,
    detail: &CompactSkeletonDetail,
) -> Result<SkeletonUpdate, CacheError> {
    let arbor = Arbor::from_rows(
        detail
            .treenodes
            .iter()
            .map(|row| (row.id(), row.parent_id(), row.position())),
    )
    .map_err(|e| CacheError::MalformedResponse {
        skeleton_id,
        reason: e.to_string(),
    })?;
    let distances = arbor.root_distances();

    let mut links = Vec::with_capacity(detail.connector_links.len());
    for row in &detail.connector_links {
        let relation = RelationType::from_code(row.relation_code()).ok_or_else(|| {
            CacheError::MalformedResponse {
                skeleton_id,
                reason: format!("unknown relation code {}", row.relation_code()),
            }
        })?;
        let coords = row.coords();
        if !coords.is_finite() {
            return Err(CacheError::MalformedResponse {
                skeleton_id,
                reason: format!("non-finite coordinates for connector {}", row.connector_id()),
            });
        }
        let depth = distances.get(row.treenode_id()).ok_or_else(|| {
            CacheError::MalformedResponse {
                skeleton_id,
                reason: format!(
                    "connector link references treenode {} outside the skeleton",
                    row.treenode_id()
                ),
            }
        })?;
        links.push(LinkUpdate {
            treenode_id: row.treenode_id(),
            connector_id: row.connector_id(),
            relation,
            coords,
            depth,
        });
    }

    Ok(SkeletonUpdate {
        skeleton_id,
        max_length: distances.max(),
        links,
    })
}
