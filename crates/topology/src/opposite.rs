//! Opposite tables built by hashing canonical vertex keys.
//!
//! The same pairing pass serves triangle edges, tetrahedron faces and the
//! edges of an extracted boundary mesh: each corner is mapped to a sorted
//! vertex tuple, the first corner seen for a key waits in a map and the
//! second one is linked to it.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use compact_mesh_config::NonManifoldPolicy;

use crate::components::ComponentLabels;
use crate::error::MeshError;
use crate::types::CornerId;

/// Mate of every corner; `None` marks a free (boundary) corner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OppositeTable {
    mates: Vec<Option<CornerId>>,
}

impl OppositeTable {
    pub fn new(len: usize) -> Self {
        Self {
            mates: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.mates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mates.is_empty()
    }

    /// Mate of `corner`, `None` if free or out of range
    pub fn get(&self, corner: CornerId) -> Option<CornerId> {
        self.mates.get(corner.index()).copied().flatten()
    }

    /// In range and without a mate
    pub fn is_free(&self, corner: CornerId) -> bool {
        matches!(self.mates.get(corner.index()), Some(None))
    }

    pub fn as_slice(&self) -> &[Option<CornerId>] {
        &self.mates
    }

    /// Corners without a mate, in index order
    pub fn free_corners(&self) -> impl Iterator<Item = CornerId> + '_ {
        self.mates
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_none())
            .map(|(i, _)| CornerId::from_index(i))
    }

    pub fn free_count(&self) -> usize {
        self.mates.iter().filter(|m| m.is_none()).count()
    }

    pub(crate) fn link(&mut self, a: CornerId, b: CornerId) {
        self.mates[a.index()] = Some(b);
        self.mates[b.index()] = Some(a);
    }

    pub(crate) fn set(&mut self, corner: CornerId, mate: Option<CornerId>) {
        if let Some(slot) = self.mates.get_mut(corner.index()) {
            *slot = mate;
        }
    }

    /// Swap the mates of two corners and re-point their mates at them
    pub(crate) fn swap_mates(&mut self, a: CornerId, b: CornerId) {
        let mate_a = self.get(a);
        let mate_b = self.get(b);
        self.set(a, mate_b);
        self.set(b, mate_a);
        if let Some(m) = mate_a {
            self.set(m, Some(b));
        }
        if let Some(m) = mate_b {
            self.set(m, Some(a));
        }
    }

    /// First corner whose mate does not point back at it
    pub fn first_broken_link(&self) -> Option<(CornerId, CornerId, Option<CornerId>)> {
        self.mates.iter().enumerate().find_map(|(i, mate)| {
            let corner = CornerId::from_index(i);
            let mate = (*mate)?;
            let back = self.get(mate);
            (back != Some(corner)).then_some((corner, mate, back))
        })
    }
}

/// Staged level 1 tables: opposites plus vertex component labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    pub opposites: OppositeTable,
    pub components: ComponentLabels,
    /// Policy used when pairing
    pub non_manifold: NonManifoldPolicy,
}

/// Link corners that share a canonical key.
///
/// `key_of` returns `None` for corners that take no part (invalidated
/// slots). Keys seen more than twice are paired two at a time in visiting
/// order, or rejected, depending on `policy`.
pub(crate) fn pair_by_key<K, F>(
    corner_count: usize,
    key_of: F,
    policy: NonManifoldPolicy,
) -> Result<OppositeTable, MeshError>
where
    K: Hash + Eq + Debug,
    F: Fn(CornerId) -> Option<K>,
{
    let mut table = OppositeTable::new(corner_count);
    let mut waiting: HashMap<K, CornerId> = HashMap::with_capacity(corner_count / 2);
    let mut paired: HashSet<K> = HashSet::with_capacity(corner_count / 2);
    let mut over_shared = 0usize;

    for i in 0..corner_count {
        let corner = CornerId::from_index(i);
        let Some(key) = key_of(corner) else {
            continue;
        };

        if let Some(first) = waiting.remove(&key) {
            table.link(first, corner);
            paired.insert(key);
            continue;
        }

        if paired.contains(&key) {
            match policy {
                NonManifoldPolicy::Reject => {
                    return Err(MeshError::NonManifold {
                        key: format!("{:?}", key),
                        corner,
                    });
                }
                NonManifoldPolicy::PairInOrder => over_shared += 1,
            }
        }
        waiting.insert(key, corner);
    }

    if over_shared > 0 {
        tracing::warn!(
            "pair_by_key: {} corners reuse an already paired key; paired in visiting order",
            over_shared
        );
    }
    tracing::debug!(
        "pair_by_key: {} corners, {} free",
        corner_count,
        table.free_count()
    );

    Ok(table)
}

/// Sorted pair used as an undirected edge key
pub(crate) fn sorted_pair<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Sorted triple used as an unoriented face key
pub(crate) fn sorted_triple<T: Ord>(mut key: [T; 3]) -> [T; 3] {
    key.sort_unstable();
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_of(keys: &[u32]) -> impl Fn(CornerId) -> Option<u32> + '_ {
        move |c| keys.get(c.index()).copied()
    }

    #[test]
    fn test_pairs_matching_keys() {
        let keys = [7, 3, 7, 5, 3];
        let table = pair_by_key(5, keys_of(&keys), NonManifoldPolicy::PairInOrder).unwrap();
        assert_eq!(table.get(CornerId(0)), Some(CornerId(2)));
        assert_eq!(table.get(CornerId(2)), Some(CornerId(0)));
        assert_eq!(table.get(CornerId(1)), Some(CornerId(4)));
        assert!(table.is_free(CornerId(3)));
        assert_eq!(table.free_corners().collect::<Vec<_>>(), vec![CornerId(3)]);
        assert!(table.first_broken_link().is_none());
    }

    #[test]
    fn test_over_shared_keys_pair_in_order() {
        let keys = [1, 1, 1, 1, 1];
        let table = pair_by_key(5, keys_of(&keys), NonManifoldPolicy::PairInOrder).unwrap();
        assert_eq!(table.get(CornerId(0)), Some(CornerId(1)));
        assert_eq!(table.get(CornerId(2)), Some(CornerId(3)));
        assert!(table.is_free(CornerId(4)));
    }

    #[test]
    fn test_over_shared_keys_rejected() {
        let keys = [1, 1, 1];
        let result = pair_by_key(3, keys_of(&keys), NonManifoldPolicy::Reject);
        match result {
            Err(MeshError::NonManifold { key, corner }) => {
                assert_eq!(key, "1");
                assert_eq!(corner, CornerId(2));
            }
            other => panic!("expected non-manifold error, got {:?}", other),
        }
    }

    #[test]
    fn test_swap_mates_repoints() {
        let mut table = OppositeTable::new(6);
        table.link(CornerId(1), CornerId(4));
        table.link(CornerId(2), CornerId(5));
        table.swap_mates(CornerId(1), CornerId(2));
        assert_eq!(table.get(CornerId(1)), Some(CornerId(5)));
        assert_eq!(table.get(CornerId(5)), Some(CornerId(1)));
        assert_eq!(table.get(CornerId(2)), Some(CornerId(4)));
        assert_eq!(table.get(CornerId(4)), Some(CornerId(2)));
        assert!(table.first_broken_link().is_none());
    }

    #[test]
    fn test_broken_link_detected() {
        let mut table = OppositeTable::new(3);
        table.link(CornerId(0), CornerId(1));
        table.set(CornerId(1), Some(CornerId(2)));
        assert_eq!(
            table.first_broken_link(),
            Some((CornerId(0), CornerId(1), Some(CornerId(2))))
        );
    }

    #[test]
    fn test_sorted_keys() {
        assert_eq!(sorted_pair(5, 2), (2, 5));
        assert_eq!(sorted_triple([9, 1, 4]), [1, 4, 9]);
    }
}
