//! Remote access to the per-skeleton CATMAID endpoints.

mod catmaid;
mod models;

pub use catmaid::CatmaidClient;
pub use models::{CompactSkeletonDetail, ConnectorLinkRow, NeuronNameResponse, TreenodeRow};

use anyhow::Result;
use async_trait::async_trait;

use crate::cache::SkeletonId;

/// Transport for the two per-skeleton endpoints the cache consumes.
///
/// Implementations must be safe to call concurrently; the cache issues one
/// independent request per stale skeleton.
#[async_trait]
pub trait SkeletonApi: Send + Sync {
    /// Fetch compact skeleton detail, including connector links.
    async fn compact_detail(&self, skeleton_id: SkeletonId) -> Result<CompactSkeletonDetail>;

    /// Fetch the skeleton's neuron name.
    async fn neuron_name(&self, skeleton_id: SkeletonId) -> Result<String>;
}
