//! Shared test helpers: a mock skeleton API with call counting and
//! compact-detail fixture builders.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use catmaid_connector_cache::client::{ConnectorLinkRow, TreenodeRow};
use catmaid_connector_cache::{
    CompactSkeletonDetail, ConnectorId, SkeletonApi, SkeletonId, TreenodeId,
};

/// Mock skeleton API serving canned responses and counting calls.
pub struct MockSkeletonApi {
    details: Mutex<HashMap<SkeletonId, CompactSkeletonDetail>>,
    names: Mutex<HashMap<SkeletonId, String>>,
    call_counts: Mutex<HashMap<String, usize>>,
}

impl MockSkeletonApi {
    pub fn new() -> Self {
        Self {
            details: Mutex::new(HashMap::new()),
            names: Mutex::new(HashMap::new()),
            call_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_skeleton(&self, skeleton_id: SkeletonId, detail: CompactSkeletonDetail, name: &str) {
        self.details.lock().unwrap().insert(skeleton_id, detail);
        self.names
            .lock()
            .unwrap()
            .insert(skeleton_id, name.to_string());
    }

    pub fn get_call_count(&self, method: &str) -> usize {
        *self.call_counts.lock().unwrap().get(method).unwrap_or(&0)
    }

    fn increment_call(&self, method: &str) {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;
    }
}

#[async_trait]
impl SkeletonApi for MockSkeletonApi {
    async fn compact_detail(&self, skeleton_id: SkeletonId) -> Result<CompactSkeletonDetail> {
        self.increment_call("compact_detail");
        self.details
            .lock()
            .unwrap()
            .get(&skeleton_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Skeleton not found: {}", skeleton_id))
    }

    async fn neuron_name(&self, skeleton_id: SkeletonId) -> Result<String> {
        self.increment_call("neuron_name");
        self.names
            .lock()
            .unwrap()
            .get(&skeleton_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Neuron name not found: {}", skeleton_id))
    }
}

/// Build a compact detail fixture for a chain skeleton along the x axis.
///
/// The first treenode is the root; each subsequent treenode hangs off the
/// previous one, so every treenode's depth equals its x position. Link
/// coordinates are derived from the connector ID so shared connectors stay
/// consistent across skeletons.
pub fn chain_detail(
    treenodes: &[(TreenodeId, f64)],
    links: &[(TreenodeId, ConnectorId, i64)],
) -> CompactSkeletonDetail {
    let rows: Vec<TreenodeRow> = treenodes
        .iter()
        .enumerate()
        .map(|(i, &(id, x))| {
            let parent = if i == 0 { None } else { Some(treenodes[i - 1].0) };
            TreenodeRow(id, parent, Some(1), x, 0.0, 0.0, -1.0, Some(5))
        })
        .collect();
    let link_rows: Vec<ConnectorLinkRow> = links
        .iter()
        .map(|&(treenode_id, connector_id, code)| {
            ConnectorLinkRow(
                treenode_id,
                connector_id,
                code,
                connector_id as f64,
                0.0,
                0.0,
            )
        })
        .collect();

    CompactSkeletonDetail {
        treenodes: rows,
        connector_links: link_rows,
    }
}
