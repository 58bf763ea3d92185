//! Connected component labeling by union-find over element vertices.
//!
//! Unions always attach the larger root under the smaller one, so every
//! component is represented by its smallest member vertex. Labels are then
//! renumbered densely in the order roots are first reached while scanning
//! vertices `0..n`.

use crate::types::{ComponentId, VertexId};

/// Dense component label per vertex
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentLabels {
    labels: Vec<Option<ComponentId>>,
    representatives: Vec<Option<VertexId>>,
    count: usize,
}

impl ComponentLabels {
    /// Label the vertices for which `is_member` holds.
    ///
    /// Every element unions its member vertices. Non-members stay unlabeled;
    /// a member vertex used by no element forms a component of its own.
    pub fn label<I, E>(vertex_count: usize, is_member: impl Fn(VertexId) -> bool, elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[VertexId]>,
    {
        let mut parent: Vec<Option<u32>> = (0..vertex_count)
            .map(|i| is_member(VertexId::from_index(i)).then_some(i as u32))
            .collect();

        let mut roots = Vec::with_capacity(4);
        for element in elements {
            roots.clear();
            roots.extend(
                element
                    .as_ref()
                    .iter()
                    .filter_map(|v| find_root(&mut parent, v.0)),
            );
            let Some(&smallest) = roots.iter().min() else {
                continue;
            };
            for &root in &roots {
                if root != smallest {
                    parent[root as usize] = Some(smallest);
                }
            }
        }

        let mut dense: Vec<Option<ComponentId>> = vec![None; vertex_count];
        let mut labels = vec![None; vertex_count];
        let mut representatives = vec![None; vertex_count];
        let mut count = 0u32;
        for v in 0..vertex_count {
            let Some(root) = find_root(&mut parent, v as u32) else {
                continue;
            };
            let label = *dense[root as usize].get_or_insert_with(|| {
                let label = ComponentId(count);
                count += 1;
                label
            });
            labels[v] = Some(label);
            representatives[v] = Some(VertexId(root));
        }

        Self {
            labels,
            representatives,
            count: count as usize,
        }
    }

    /// Component of a vertex, `None` for non-members
    pub fn get(&self, vertex: VertexId) -> Option<ComponentId> {
        self.labels.get(vertex.index()).copied().flatten()
    }

    /// Smallest vertex of the component containing `vertex`
    pub fn representative(&self, vertex: VertexId) -> Option<VertexId> {
        self.representatives.get(vertex.index()).copied().flatten()
    }

    /// Number of components
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<ComponentId>] {
        &self.labels
    }

    /// Vertices labeled with `component`
    pub fn members(&self, component: ComponentId) -> Vec<VertexId> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == Some(component))
            .map(|(i, _)| VertexId::from_index(i))
            .collect()
    }
}

/// Root of `vertex` with path compression; `None` for non-members
fn find_root(parent: &mut [Option<u32>], vertex: u32) -> Option<u32> {
    let mut root = vertex;
    loop {
        match parent.get(root as usize).copied().flatten() {
            Some(p) if p == root => break,
            Some(p) => root = p,
            None => return None,
        }
    }

    let mut current = vertex;
    while current != root {
        let Some(next) = parent[current as usize] else {
            break;
        };
        parent[current as usize] = Some(root);
        current = next;
    }
    Some(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(_: VertexId) -> bool {
        true
    }

    fn tri(a: u32, b: u32, c: u32) -> [VertexId; 3] {
        [VertexId(a), VertexId(b), VertexId(c)]
    }

    #[test]
    fn test_two_components() {
        let labels = ComponentLabels::label(6, all, [tri(0, 1, 2), tri(3, 4, 5)]);
        assert_eq!(labels.count(), 2);
        assert_eq!(labels.get(VertexId(2)), Some(ComponentId(0)));
        assert_eq!(labels.get(VertexId(5)), Some(ComponentId(1)));
        assert_eq!(
            labels.members(ComponentId(1)),
            vec![VertexId(3), VertexId(4), VertexId(5)]
        );
    }

    #[test]
    fn test_numbering_follows_vertex_order() {
        // The second element touches vertex 0, so its component is found first.
        let labels = ComponentLabels::label(6, all, [tri(3, 4, 5), tri(0, 1, 2)]);
        assert_eq!(labels.get(VertexId(0)), Some(ComponentId(0)));
        assert_eq!(labels.get(VertexId(3)), Some(ComponentId(1)));
    }

    #[test]
    fn test_chained_unions_merge() {
        let labels = ComponentLabels::label(
            7,
            all,
            [tri(5, 6, 4), tri(2, 3, 4), tri(0, 1, 2)],
        );
        assert_eq!(labels.count(), 1);
        for v in 0..7 {
            assert_eq!(labels.representative(VertexId(v)), Some(VertexId(0)));
        }
    }

    #[test]
    fn test_representative_is_idempotent() {
        let labels = ComponentLabels::label(8, all, [tri(7, 3, 5), tri(1, 2, 6)]);
        for v in 0..8 {
            let root = labels.representative(VertexId(v)).unwrap();
            assert_eq!(labels.representative(root), Some(root));
            assert_eq!(labels.get(root), labels.get(VertexId(v)));
        }
        // Vertices 0 and 4 are isolated and form their own components.
        assert_eq!(labels.count(), 4);
    }

    #[test]
    fn test_non_members_unlabeled() {
        let labels = ComponentLabels::label(4, |v| v.0 != 3, [tri(0, 1, 3)]);
        assert_eq!(labels.get(VertexId(3)), None);
        assert_eq!(labels.count(), 2);
        assert_eq!(labels.get(VertexId(2)), Some(ComponentId(1)));
    }
}
