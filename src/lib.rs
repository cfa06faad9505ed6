//! CATMAID Connector Viewer Cache
//!
//! Client-side cache backing a connector visualization widget: fetches
//! per-skeleton morphology data from a CATMAID server, derives connector
//! associations and depth metrics, and serves deterministic, lazily
//! re-sorted connector orderings per relation type.

pub mod arbor;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod selection;

// Re-export commonly used types for convenience
pub use cache::{
    CacheStats, ConnectorId, ConnectorListing, ConnectorViewerCache, ProjectPoint, RelationType,
    SkeletonId, SortMode, TreenodeId,
};
pub use client::{CatmaidClient, CompactSkeletonDetail, SkeletonApi};
pub use config::{CacheSettings, FileConfig};
pub use error::CacheError;
pub use selection::{BasicSkeletonSource, SkeletonSource};
