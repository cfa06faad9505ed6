//! Typed views over the skeleton endpoint responses.
//!
//! The compact detail endpoint returns positional JSON arrays; rows are
//! deserialized as tuples.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::cache::{ConnectorId, ProjectPoint, TreenodeId};

/// One treenode row of a compact detail response:
/// `[id, parent_id, user_id, x, y, z, radius, confidence]`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct TreenodeRow(
    pub TreenodeId,
    pub Option<TreenodeId>,
    pub Option<i64>,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub Option<i64>,
);

impl TreenodeRow {
    pub fn id(&self) -> TreenodeId {
        self.0
    }

    pub fn parent_id(&self) -> Option<TreenodeId> {
        self.1
    }

    pub fn position(&self) -> ProjectPoint {
        ProjectPoint::new(self.3, self.4, self.5)
    }
}

/// One connector link row of a compact detail response:
/// `[treenode_id, connector_id, relation_code, x, y, z]`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ConnectorLinkRow(
    pub TreenodeId,
    pub ConnectorId,
    pub i64,
    pub f64,
    pub f64,
    pub f64,
);

impl ConnectorLinkRow {
    pub fn treenode_id(&self) -> TreenodeId {
        self.0
    }

    pub fn connector_id(&self) -> ConnectorId {
        self.1
    }

    pub fn relation_code(&self) -> i64 {
        self.2
    }

    pub fn coords(&self) -> ProjectPoint {
        ProjectPoint::new(self.3, self.4, self.5)
    }
}

/// Parsed compact skeleton detail response.
#[derive(Clone, Debug, Default)]
pub struct CompactSkeletonDetail {
    pub treenodes: Vec<TreenodeRow>,
    pub connector_links: Vec<ConnectorLinkRow>,
}

impl CompactSkeletonDetail {
    /// Extract the treenode and connector sections from a raw response.
    ///
    /// The endpoint returns `[treenodes, connectors, tags, ...]`; trailing
    /// sections are ignored.
    pub fn from_response(json: &serde_json::Value) -> Result<Self> {
        let sections = json
            .as_array()
            .ok_or_else(|| anyhow!("expected a JSON array response"))?;

        let treenodes = sections
            .first()
            .ok_or_else(|| anyhow!("response is missing the treenode section"))?;
        let treenodes: Vec<TreenodeRow> =
            serde_json::from_value(treenodes.clone()).context("failed to parse treenode rows")?;

        let connector_links = sections
            .get(1)
            .ok_or_else(|| anyhow!("response is missing the connector section"))?;
        let connector_links: Vec<ConnectorLinkRow> = serde_json::from_value(connector_links.clone())
            .context("failed to parse connector link rows")?;

        Ok(Self {
            treenodes,
            connector_links,
        })
    }
}

/// Response of the neuron name endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct NeuronNameResponse {
    pub neuronname: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_compact_detail() {
        let response = json!([
            [
                [101, null, 1, 0.0, 0.0, 0.0, -1.0, 5],
                [102, 101, 1, 10.0, 0.0, 0.0, -1.0, 5]
            ],
            [
                [102, 501, 0, 10.0, 1.0, 0.0],
                [102, 502, -1, 10.0, 2.0, 0.0]
            ],
            {}
        ]);

        let detail = CompactSkeletonDetail::from_response(&response).unwrap();
        assert_eq!(detail.treenodes.len(), 2);
        assert_eq!(detail.connector_links.len(), 2);

        assert_eq!(detail.treenodes[0].id(), 101);
        assert_eq!(detail.treenodes[0].parent_id(), None);
        assert_eq!(detail.treenodes[1].parent_id(), Some(101));
        assert_eq!(
            detail.treenodes[1].position(),
            ProjectPoint::new(10.0, 0.0, 0.0)
        );

        assert_eq!(detail.connector_links[0].treenode_id(), 102);
        assert_eq!(detail.connector_links[0].connector_id(), 501);
        assert_eq!(detail.connector_links[0].relation_code(), 0);
        assert_eq!(detail.connector_links[1].relation_code(), -1);
        assert_eq!(
            detail.connector_links[1].coords(),
            ProjectPoint::new(10.0, 2.0, 0.0)
        );
    }

    #[test]
    fn test_parse_rejects_non_array_response() {
        let response = json!({"detail": "not found"});
        let result = CompactSkeletonDetail::from_response(&response);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_missing_connector_section() {
        let response = json!([[[101, null, 1, 0.0, 0.0, 0.0, -1.0, 5]]]);
        let result = CompactSkeletonDetail::from_response(&response);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("connector section"));
    }

    #[test]
    fn test_parse_rejects_short_treenode_rows() {
        let response = json!([[[101, null, 1]], []]);
        let result = CompactSkeletonDetail::from_response(&response);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_neuron_name_response() {
        let parsed: NeuronNameResponse =
            serde_json::from_value(json!({"neuronname": "golden neuron"})).unwrap();
        assert_eq!(parsed.neuronname, "golden neuron");
    }
}
