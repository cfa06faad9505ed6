//! Per-relation sort indices and connector ordering strategies.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::models::{ConnectorId, RelationType, SkeletonId};
use super::store::CacheState;
use crate::error::CacheError;

/// Connector ordering strategy.
///
/// Modes are compared by variant when deciding whether a sort index can be
/// reused, so switching modes lazily invalidates indices without touching
/// their dirty flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Ascending connector ID.
    ConnectorId,
    /// Leave the accumulated order as-is. Not guaranteed to preserve a
    /// previous mode's order once a re-sort has happened.
    Unsorted,
    /// Minimum depth of the connector on any selected skeleton.
    Depth,
    /// Like `Depth`, normalized by each skeleton's maximum length.
    #[default]
    DepthProportion,
    /// Alphabetically first name among the selected skeletons, compared
    /// case-insensitively. Connectors without a qualifying name sort last.
    SkeletonName,
}

/// Lazily sorted index of the connectors known for one relation type.
///
/// Holds every connector that has at least one treenode under the relation
/// across all fetched skeletons, regardless of the current selection.
#[derive(Clone, Debug, Default)]
pub struct SortIndex {
    /// Mode the current order was produced with.
    mode: Option<SortMode>,
    /// Known connector IDs, in last-sorted order with unsorted additions
    /// at the tail.
    order: Vec<ConnectorId>,
    /// Membership set for `order`.
    members: HashSet<ConnectorId>,
    /// Whether `order` reflects a completed sort.
    sorted: bool,
}

impl SortIndex {
    /// Add a connector if unknown, dirtying the index.
    pub fn insert(&mut self, connector_id: ConnectorId) {
        if self.members.insert(connector_id) {
            self.order.push(connector_id);
            self.sorted = false;
        }
    }

    /// Whether the stored order can be reused for the given mode.
    pub fn is_valid_for(&self, mode: SortMode) -> bool {
        self.sorted && self.mode == Some(mode)
    }

    pub fn contains(&self, connector_id: ConnectorId) -> bool {
        self.members.contains(&connector_id)
    }

    pub fn order(&self) -> &[ConnectorId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Resolve the connector order for a relation type: reuse the stored order
/// when the index is clean and was produced with the active mode,
/// otherwise re-sort, store the result and record the mode.
pub(crate) fn resolve_order(
    state: &mut CacheState,
    relation: RelationType,
    selected: &[SkeletonId],
) -> Result<Vec<ConnectorId>, CacheError> {
    let mode = state.sort_mode;
    let index = &state.sorting[relation.index()];
    if index.is_valid_for(mode) {
        return Ok(index.order().to_vec());
    }

    // take the order out so the entity maps stay borrowable while sorting
    let mut order = std::mem::take(&mut state.sorting[relation.index()].order);
    let result = sort_connectors(state, relation, selected, mode, &mut order);

    // put the IDs back even on failure; the index stays dirty then
    let index = &mut state.sorting[relation.index()];
    index.order = order;
    result?;
    index.sorted = true;
    index.mode = Some(mode);
    Ok(index.order.clone())
}

fn sort_connectors(
    state: &CacheState,
    relation: RelationType,
    selected: &[SkeletonId],
    mode: SortMode,
    order: &mut Vec<ConnectorId>,
) -> Result<(), CacheError> {
    match mode {
        SortMode::Unsorted => {}
        SortMode::ConnectorId => order.sort_unstable(),
        SortMode::Depth | SortMode::DepthProportion => {
            let proportional = mode == SortMode::DepthProportion;
            let mut keyed = Vec::with_capacity(order.len());
            for &connector_id in order.iter() {
                let depth = state.min_depth(connector_id, relation, selected, proportional)?;
                keyed.push((depth, connector_id));
            }
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            order.clear();
            order.extend(keyed.into_iter().map(|(_, connector_id)| connector_id));
        }
        SortMode::SkeletonName => {
            let mut keyed = Vec::with_capacity(order.len());
            for &connector_id in order.iter() {
                let name = state
                    .first_skeleton_name(connector_id, relation, selected)?
                    .map(|name| name.to_lowercase());
                keyed.push((name, connector_id));
            }
            keyed.sort_by(|a, b| compare_name_keys(&a.0, &b.0));
            order.clear();
            order.extend(keyed.into_iter().map(|(_, connector_id)| connector_id));
        }
    }
    Ok(())
}

/// Connectors with a name sort before connectors without one.
fn compare_name_keys(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
