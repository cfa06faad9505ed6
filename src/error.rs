//! Error types for connector cache operations.

use thiserror::Error;

use crate::cache::{ConnectorId, SkeletonId, TreenodeId};

/// Errors produced by connector cache operations.
///
/// Transport failures leave previously cached state untouched; the next
/// access re-triggers the fetch via the normal staleness check. The
/// `Unknown*` variants signal a contract violation by the caller (looking
/// up an entity that was never fetched), not a recoverable condition.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The skeleton API rejected or failed a request.
    #[error("skeleton API request failed: {0}")]
    Api(anyhow::Error),

    /// A successful response could not be interpreted.
    #[error("malformed response for skeleton {skeleton_id}: {reason}")]
    MalformedResponse {
        skeleton_id: SkeletonId,
        reason: String,
    },

    /// A connector ID was queried that is not present in the cache.
    #[error("connector {0} is not present in the cache")]
    UnknownConnector(ConnectorId),

    /// A connector referenced a treenode that is not present in the cache.
    #[error("treenode {0} is not present in the cache")]
    UnknownTreenode(TreenodeId),

    /// A treenode referenced a skeleton that is not present in the cache.
    #[error("skeleton {0} is not present in the cache")]
    UnknownSkeleton(SkeletonId),
}
