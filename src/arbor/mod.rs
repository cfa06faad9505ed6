//! Minimal arbor (skeleton tree) representation.
//!
//! Rebuilt from the treenode rows of a compact skeleton response; computes
//! the root-to-node geodesic distances used for connector depth sorting.

use std::collections::HashMap;

use thiserror::Error;

use crate::cache::{ProjectPoint, TreenodeId};

/// Errors building an arbor from treenode rows.
#[derive(Debug, Error)]
pub enum ArborError {
    #[error("skeleton has no root treenode")]
    NoRoot,

    #[error("skeleton has multiple root treenodes ({0} and {1})")]
    MultipleRoots(TreenodeId, TreenodeId),

    #[error("duplicate treenode {0}")]
    DuplicateTreenode(TreenodeId),

    #[error("treenode {child} references unknown parent {parent}")]
    UnknownParent {
        child: TreenodeId,
        parent: TreenodeId,
    },

    #[error("treenode {0} is not connected to the root")]
    Disconnected(TreenodeId),
}

/// Tree structure of a skeleton with node positions.
#[derive(Clone, Debug)]
pub struct Arbor {
    root: TreenodeId,
    children: HashMap<TreenodeId, Vec<TreenodeId>>,
    positions: HashMap<TreenodeId, ProjectPoint>,
}

impl Arbor {
    /// Build an arbor from `(treenode, parent, position)` triples.
    ///
    /// Requires exactly one root (a treenode without a parent), no
    /// duplicate treenodes, and every node reachable from the root.
    pub fn from_rows(
        rows: impl IntoIterator<Item = (TreenodeId, Option<TreenodeId>, ProjectPoint)>,
    ) -> Result<Arbor, ArborError> {
        let mut root = None;
        let mut parents: HashMap<TreenodeId, Option<TreenodeId>> = HashMap::new();
        let mut children: HashMap<TreenodeId, Vec<TreenodeId>> = HashMap::new();
        let mut positions: HashMap<TreenodeId, ProjectPoint> = HashMap::new();

        for (id, parent, position) in rows {
            if parents.insert(id, parent).is_some() {
                return Err(ArborError::DuplicateTreenode(id));
            }
            positions.insert(id, position);
            match parent {
                Some(parent) => children.entry(parent).or_default().push(id),
                None => match root {
                    Some(existing) => return Err(ArborError::MultipleRoots(existing, id)),
                    None => root = Some(id),
                },
            }
        }

        let root = root.ok_or(ArborError::NoRoot)?;

        for (&child, parent) in &parents {
            if let Some(parent) = parent {
                if !parents.contains_key(parent) {
                    return Err(ArborError::UnknownParent {
                        child,
                        parent: *parent,
                    });
                }
            }
        }

        let arbor = Arbor {
            root,
            children,
            positions,
        };

        // every node must be reachable from the root
        let reachable = arbor.count_reachable();
        if reachable != parents.len() {
            let unreachable = arbor
                .find_unreachable(&parents)
                .unwrap_or(root);
            return Err(ArborError::Disconnected(unreachable));
        }

        Ok(arbor)
    }

    pub fn root(&self) -> TreenodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Distance from the root to every node, summing Euclidean edge
    /// lengths along the tree, together with the maximum such distance.
    pub fn root_distances(&self) -> RootDistances {
        let mut distances = HashMap::with_capacity(self.positions.len());
        distances.insert(self.root, 0.0);
        let mut max: f64 = 0.0;

        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let node_distance = distances[&node];
            let node_position = &self.positions[&node];
            for &child in self.children.get(&node).into_iter().flatten() {
                let distance = node_distance + self.positions[&child].distance_to(node_position);
                max = max.max(distance);
                distances.insert(child, distance);
                stack.push(child);
            }
        }

        RootDistances { distances, max }
    }

    fn count_reachable(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            count += 1;
            if let Some(children) = self.children.get(&node) {
                stack.extend(children.iter().copied());
            }
        }
        count
    }

    fn find_unreachable(
        &self,
        parents: &HashMap<TreenodeId, Option<TreenodeId>>,
    ) -> Option<TreenodeId> {
        let reachable = {
            let mut set = std::collections::HashSet::new();
            let mut stack = vec![self.root];
            while let Some(node) = stack.pop() {
                if set.insert(node) {
                    if let Some(children) = self.children.get(&node) {
                        stack.extend(children.iter().copied());
                    }
                }
            }
            set
        };
        parents.keys().find(|id| !reachable.contains(id)).copied()
    }
}

/// Root-to-node geodesic distances for an arbor.
#[derive(Clone, Debug)]
pub struct RootDistances {
    distances: HashMap<TreenodeId, f64>,
    max: f64,
}

impl RootDistances {
    /// Distance of the given treenode from the root, if it is in the arbor.
    pub fn get(&self, treenode_id: TreenodeId) -> Option<f64> {
        self.distances.get(&treenode_id).copied()
    }

    /// Maximum root-to-node distance across the arbor.
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64) -> ProjectPoint {
        ProjectPoint::new(x, 0.0, 0.0)
    }

    #[test]
    fn test_single_node_arbor() {
        let arbor = Arbor::from_rows([(1, None, point(0.0))]).unwrap();
        assert_eq!(arbor.root(), 1);
        assert_eq!(arbor.len(), 1);

        let distances = arbor.root_distances();
        assert_eq!(distances.get(1), Some(0.0));
        assert_eq!(distances.max(), 0.0);
    }

    #[test]
    fn test_chain_distances() {
        // 1 -(5)- 2 -(5)- 3
        let arbor = Arbor::from_rows([
            (1, None, point(0.0)),
            (2, Some(1), point(5.0)),
            (3, Some(2), point(10.0)),
        ])
        .unwrap();

        let distances = arbor.root_distances();
        assert_eq!(distances.get(1), Some(0.0));
        assert_eq!(distances.get(2), Some(5.0));
        assert_eq!(distances.get(3), Some(10.0));
        assert_eq!(distances.max(), 10.0);
    }

    #[test]
    fn test_branching_max_distance() {
        // Y shape: branches of length 4 and 7 off the node at distance 3
        let arbor = Arbor::from_rows([
            (1, None, point(0.0)),
            (2, Some(1), point(3.0)),
            (3, Some(2), point(7.0)),
            (4, Some(2), ProjectPoint::new(3.0, 7.0, 0.0)),
        ])
        .unwrap();

        let distances = arbor.root_distances();
        assert_eq!(distances.get(3), Some(7.0));
        assert_eq!(distances.get(4), Some(10.0));
        assert_eq!(distances.max(), 10.0);
    }

    #[test]
    fn test_euclidean_edges_not_axis_aligned() {
        let arbor = Arbor::from_rows([
            (1, None, ProjectPoint::new(0.0, 0.0, 0.0)),
            (2, Some(1), ProjectPoint::new(3.0, 4.0, 0.0)),
        ])
        .unwrap();

        assert_eq!(arbor.root_distances().get(2), Some(5.0));
    }

    #[test]
    fn test_missing_root_rejected() {
        let result = Arbor::from_rows([(1, Some(2), point(0.0)), (2, Some(1), point(1.0))]);
        assert!(matches!(result, Err(ArborError::NoRoot)));
    }

    #[test]
    fn test_empty_rows_rejected() {
        let result = Arbor::from_rows([]);
        assert!(matches!(result, Err(ArborError::NoRoot)));
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let result = Arbor::from_rows([(1, None, point(0.0)), (2, None, point(1.0))]);
        assert!(matches!(result, Err(ArborError::MultipleRoots(1, 2))));
    }

    #[test]
    fn test_duplicate_treenode_rejected() {
        let result = Arbor::from_rows([
            (1, None, point(0.0)),
            (2, Some(1), point(1.0)),
            (2, Some(1), point(2.0)),
        ]);
        assert!(matches!(result, Err(ArborError::DuplicateTreenode(2))));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let result = Arbor::from_rows([(1, None, point(0.0)), (2, Some(9), point(1.0))]);
        assert!(matches!(
            result,
            Err(ArborError::UnknownParent { child: 2, parent: 9 })
        ));
    }

    #[test]
    fn test_disconnected_cycle_rejected() {
        // 3 and 4 form a cycle unreachable from the root
        let result = Arbor::from_rows([
            (1, None, point(0.0)),
            (2, Some(1), point(1.0)),
            (3, Some(4), point(2.0)),
            (4, Some(3), point(3.0)),
        ]);
        assert!(matches!(result, Err(ArborError::Disconnected(_))));
    }
}
