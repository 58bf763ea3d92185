//! Topology query methods for VolumeMesh.
//!
//! Vertex queries flood across the faces around the vertex; edge queries
//! walk the ring of tetrahedra around the edge with `radial(mate(he))`.
//! Without an opposite table every query falls back to a scan, and the
//! `*_scan` variants always scan.

use std::collections::{BTreeSet, HashSet};

use compact_mesh_config::BuildLevel;

use super::{HalfEdge, VolumeMesh, face_corners};
use crate::error::QueryError;
use crate::opposite::{OppositeTable, sorted_pair, sorted_triple};
use crate::traits::{CornerMesh, HasOpposite, HasVertexIndex};
use crate::types::{CornerId, ElementId, VertexId};

impl VolumeMesh {
    // ========================================================================
    // Linear Scans (Level 0)
    // ========================================================================

    /// R_00 by scan: vertices sharing a tetrahedron with `vertex`, sorted
    pub fn vertex_star_scan(&self, vertex: VertexId) -> Result<Vec<VertexId>, QueryError> {
        self.require_vertex(vertex)?;
        let mut star = BTreeSet::new();
        for element in self.tetras_where(|vertices| vertices.contains(&vertex)) {
            star.extend(self.others(element, &[vertex]));
        }
        Ok(star.into_iter().collect())
    }

    /// R_03 by scan: tetrahedra incident to `vertex`, sorted
    pub fn vertex_tetras_scan(&self, vertex: VertexId) -> Result<Vec<ElementId>, QueryError> {
        self.require_vertex(vertex)?;
        Ok(self
            .tetras_where(|vertices| vertices.contains(&vertex))
            .collect())
    }

    /// R_10 by scan: vertices sharing a tetrahedron with edge `a-b`, sorted
    pub fn edge_star_scan(&self, a: VertexId, b: VertexId) -> Result<Vec<VertexId>, QueryError> {
        let tetras = self.edge_tetras_scan(a, b)?;
        let star: BTreeSet<VertexId> = tetras
            .into_iter()
            .flat_map(|t| self.others(t, &[a, b]))
            .collect();
        Ok(star.into_iter().collect())
    }

    /// R_13 by scan: tetrahedra containing edge `a-b`, sorted
    pub fn edge_tetras_scan(&self, a: VertexId, b: VertexId) -> Result<Vec<ElementId>, QueryError> {
        self.require_edge_vertices(a, b)?;
        let tetras: Vec<ElementId> = self
            .tetras_where(|vertices| vertices.contains(&a) && vertices.contains(&b))
            .collect();
        if tetras.is_empty() {
            return Err(not_an_edge(a, b));
        }
        Ok(tetras)
    }

    /// R_33 by scan: the tetrahedron across each face of `element`,
    /// `None` on the boundary
    pub fn tetra_neighbors_scan(
        &self,
        element: ElementId,
    ) -> Result<Vec<Option<ElementId>>, QueryError> {
        self.require_element(element)?;
        Ok(self
            .element_corners(element)
            .map(|h| {
                let key = self.face_vertices(h).map(sorted_triple)?;
                self.half_faces_with_key(key)
                    .find(|&other| self.element_of(other) != element)
                    .map(|other| self.element_of(other))
            })
            .collect())
    }

    fn tetras_where(
        &self,
        keep: impl Fn(&[VertexId; 4]) -> bool,
    ) -> impl Iterator<Item = ElementId> {
        (0..self.tetra_count())
            .map(ElementId::from_index)
            .filter(move |&t| self.tetra_vertices(t).is_some_and(|vertices| keep(&vertices)))
    }

    fn tetra_vertices(&self, element: ElementId) -> Option<[VertexId; 4]> {
        let vertices = self.element_vertices(element)?;
        vertices.try_into().ok()
    }

    /// Vertices of `element` other than `skip`
    fn others(&self, element: ElementId, skip: &[VertexId]) -> Vec<VertexId> {
        self.tetra_vertices(element)
            .into_iter()
            .flatten()
            .filter(|v| !skip.contains(v))
            .collect()
    }

    fn half_faces_with_key(&self, key: [VertexId; 3]) -> impl Iterator<Item = CornerId> + '_ {
        (0..self.corners.len())
            .map(CornerId::from_index)
            .filter(move |&h| self.face_vertices(h).map(sorted_triple) == Some(key))
    }

    // ========================================================================
    // Topology Queries
    // ========================================================================

    /// R_00: vertices sharing a tetrahedron with `vertex`, sorted
    pub fn vertex_star(&self, vertex: VertexId) -> Result<Vec<VertexId>, QueryError> {
        self.require_vertex(vertex)?;
        let Some(opposites) = self.opposites() else {
            return self.vertex_star_scan(vertex);
        };
        let Some(seed) = self.vertex_seed(vertex) else {
            return Ok(Vec::new());
        };
        let (star, _) = self.flood_vertex(opposites, vertex, seed);
        Ok(star.into_iter().collect())
    }

    /// R_03: tetrahedra incident to `vertex`, sorted
    pub fn vertex_tetras(&self, vertex: VertexId) -> Result<Vec<ElementId>, QueryError> {
        self.require_vertex(vertex)?;
        let Some(opposites) = self.opposites() else {
            return self.vertex_tetras_scan(vertex);
        };
        let Some(seed) = self.vertex_seed(vertex) else {
            return Ok(Vec::new());
        };
        let (_, tetras) = self.flood_vertex(opposites, vertex, seed);
        Ok(tetras.into_iter().collect())
    }

    /// R_10: vertices sharing a tetrahedron with edge `a-b`, sorted
    ///
    /// Walks the ring of tetrahedra around the edge, then the other way if
    /// the ring is open. Non-manifold edges give a partial result.
    pub fn edge_star(&self, a: VertexId, b: VertexId) -> Result<Vec<VertexId>, QueryError> {
        self.require_edge_vertices(a, b)?;
        let Some(opposites) = self.opposites() else {
            return self.edge_star_scan(a, b);
        };
        let start = self.edge_half_edge(a, b)?;
        let mut star = BTreeSet::new();
        self.edge_ring(opposites, start, |he| {
            star.extend(self.corner_vertex(he.face()));
        });
        Ok(star.into_iter().collect())
    }

    /// R_13: tetrahedra containing edge `a-b`, sorted
    pub fn edge_tetras(&self, a: VertexId, b: VertexId) -> Result<Vec<ElementId>, QueryError> {
        self.require_edge_vertices(a, b)?;
        let Some(opposites) = self.opposites() else {
            return self.edge_tetras_scan(a, b);
        };
        let start = self.edge_half_edge(a, b)?;
        let mut tetras = BTreeSet::new();
        self.edge_ring(opposites, start, |he| {
            tetras.insert(he.element());
        });
        Ok(tetras.into_iter().collect())
    }

    /// R_33: the tetrahedron across each face of `element`, `None` on the boundary
    pub fn tetra_neighbors(
        &self,
        element: ElementId,
    ) -> Result<Vec<Option<ElementId>>, QueryError> {
        self.require_element(element)?;
        let Some(opposites) = self.opposites() else {
            return self.tetra_neighbors_scan(element);
        };
        Ok(self
            .element_corners(element)
            .map(|h| opposites.get(h).map(|o| self.element_of(o)))
            .collect())
    }

    /// A half-edge on edge `a-b`
    ///
    /// Uses the edge map (level 2) when present, which prefers half-edges on
    /// boundary faces; otherwise scans for a tetrahedron holding both vertices.
    pub fn edge_half_edge(&self, a: VertexId, b: VertexId) -> Result<HalfEdge, QueryError> {
        self.require_edge_vertices(a, b)?;
        let found = match &self.index {
            Some(index) => index.edges.get(&sorted_pair(a, b)).copied(),
            None => self
                .tetras_where(|vertices| vertices.contains(&a) && vertices.contains(&b))
                .find_map(|t| {
                    self.element_corners(t)
                        .filter(|&h| !matches!(self.corner_vertex(h), Some(v) if v == a || v == b))
                        .find_map(|h| self.edge_on_face(h, a, b))
                }),
        };
        found.ok_or_else(|| not_an_edge(a, b))
    }

    /// A half-face spanning the vertices `a`, `b` and `c`
    ///
    /// Uses the face map (level 2) when present, which prefers boundary
    /// half-faces.
    pub fn face_corner(&self, a: VertexId, b: VertexId, c: VertexId) -> Result<CornerId, QueryError> {
        for v in [a, b, c] {
            self.require_vertex(v)?;
        }
        let key = sorted_triple([a, b, c]);
        let found = match &self.index {
            Some(index) => index.faces.get(&key).copied(),
            None => self.half_faces_with_key(key).next(),
        };
        found.ok_or_else(|| {
            tracing::warn!("VolumeMesh: {:?} do not span a face", key);
            QueryError::NotAFace(key)
        })
    }

    /// Half-edge across the face of `he` in the neighbouring tetrahedron
    ///
    /// Starts at the destination of `he`, so the result runs along the same
    /// edge in reverse. `None` on boundary faces or before level 1.
    pub fn radial(&self, he: HalfEdge) -> Option<HalfEdge> {
        self.radial_in(self.opposites()?, he)
    }

    /// Whether half-face `h` lies on the boundary (level 1)
    pub fn is_boundary_corner(&self, h: CornerId) -> Result<bool, QueryError> {
        self.require_corner(h)?;
        let opposites = self
            .opposites()
            .ok_or(QueryError::MissingLevel(BuildLevel::Adjacency))?;
        Ok(opposites.is_free(h))
    }

    /// Whether `vertex` lies on the boundary (level 2)
    pub fn is_boundary_vertex(&self, vertex: VertexId) -> Result<bool, QueryError> {
        self.require_vertex(vertex)?;
        let (Some(opposites), Some(_)) = (self.opposites(), self.index.as_ref()) else {
            return Err(QueryError::MissingLevel(BuildLevel::VertexIndex));
        };
        Ok(self
            .vertex_corner(vertex)
            .is_some_and(|h| opposites.is_free(h)))
    }

    fn require_edge_vertices(&self, a: VertexId, b: VertexId) -> Result<(), QueryError> {
        self.require_vertex(a)?;
        self.require_vertex(b)?;
        if a == b {
            return Err(not_an_edge(a, b));
        }
        Ok(())
    }

    fn vertex_seed(&self, vertex: VertexId) -> Option<ElementId> {
        match self.index {
            Some(_) => self.vertex_corner(vertex).map(|h| self.element_of(h)),
            None => self
                .tetras_where(|vertices| vertices.contains(&vertex))
                .next(),
        }
    }

    /// Visit every tetrahedron reachable from `seed` through faces
    /// containing `vertex`
    fn flood_vertex(
        &self,
        opposites: &OppositeTable,
        vertex: VertexId,
        seed: ElementId,
    ) -> (BTreeSet<VertexId>, BTreeSet<ElementId>) {
        let mut star = BTreeSet::new();
        let mut tetras = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![seed];

        while let Some(t) = stack.pop() {
            if !visited.insert(t) {
                continue;
            }
            tetras.insert(t);
            for h in self.element_corners(t) {
                let Some(w) = self.corner_vertex(h) else {
                    continue;
                };
                // The face opposite `h` contains `vertex` unless `h` is its corner.
                if w == vertex {
                    continue;
                }
                star.insert(w);
                if let Some(o) = opposites.get(h) {
                    stack.push(self.element_of(o));
                }
            }
        }
        (star, tetras)
    }

    fn radial_in(&self, opposites: &OppositeTable, he: HalfEdge) -> Option<HalfEdge> {
        let across = opposites.get(he.face())?;
        let (from, to) = self.half_edge_vertices(he)?;
        self.edge_on_face(across, to, from)
    }

    /// Half-edge on face `h` running `x -> y`, or `y -> x` if the face is
    /// wound the other way
    fn edge_on_face(&self, h: CornerId, x: VertexId, y: VertexId) -> Option<HalfEdge> {
        let mut reversed = None;
        for origin in face_corners(h) {
            let he = HalfEdge::new(h, origin)?;
            match self.half_edge_vertices(he) {
                Some((p, q)) if p == x && q == y => return Some(he),
                Some((p, q)) if p == y && q == x => reversed = Some(he),
                _ => {}
            }
        }
        reversed
    }

    /// Walk the tetrahedra around the edge of `start`.
    ///
    /// Visits one half-edge per tetrahedron, on the face through which the
    /// walk entered it. An open ring is walked from both ends.
    fn edge_ring(&self, opposites: &OppositeTable, start: HalfEdge, mut visit: impl FnMut(HalfEdge)) {
        if !self.ring_walk(opposites, start, &mut visit) {
            self.ring_walk(opposites, start.mate(), &mut visit);
        }
    }

    /// Returns true if the walk came back to the face of `start`
    fn ring_walk(
        &self,
        opposites: &OppositeTable,
        start: HalfEdge,
        visit: &mut impl FnMut(HalfEdge),
    ) -> bool {
        let mut run = start;
        for _ in 0..=opposites.len() {
            visit(run);
            let Some(following) = self.radial_in(opposites, run.mate()) else {
                return false;
            };
            if following.face() == start.face() {
                return true;
            }
            run = following;
        }
        false
    }
}

fn not_an_edge(a: VertexId, b: VertexId) -> QueryError {
    tracing::warn!("VolumeMesh: {:?} and {:?} do not span an edge", a, b);
    QueryError::NotAnEdge(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MeshData;
    use crate::fixtures;
    use compact_mesh_config::BuildConfig;

    fn build(data: &MeshData, level: BuildLevel) -> VolumeMesh {
        VolumeMesh::from_data(data, &BuildConfig::with_level(level).without_legalize()).unwrap()
    }

    fn ids(raw: &[u32]) -> Vec<VertexId> {
        raw.iter().map(|&v| VertexId(v)).collect()
    }

    fn tetras(raw: &[u32]) -> Vec<ElementId> {
        raw.iter().map(|&t| ElementId(t)).collect()
    }

    #[test]
    fn test_single_tetra_relations() {
        let mesh = build(&fixtures::single_tetra(), BuildLevel::Boundary);
        assert_eq!(mesh.vertex_star(VertexId(0)).unwrap(), ids(&[1, 2, 3]));
        assert_eq!(mesh.vertex_tetras(VertexId(2)).unwrap(), tetras(&[0]));
        assert_eq!(
            mesh.edge_star(VertexId(0), VertexId(1)).unwrap(),
            ids(&[2, 3])
        );
        assert_eq!(mesh.edge_tetras(VertexId(3), VertexId(1)).unwrap(), tetras(&[0]));
        assert_eq!(mesh.tetra_neighbors(ElementId(0)).unwrap(), vec![None; 4]);
        assert!(mesh.is_boundary_vertex(VertexId(0)).unwrap());
    }

    #[test]
    fn test_two_tetras_relations() {
        let mesh = build(&fixtures::two_tetras(), BuildLevel::Boundary);
        assert_eq!(mesh.vertex_star(VertexId(0)).unwrap(), ids(&[1, 2, 3]));
        assert_eq!(mesh.vertex_star(VertexId(1)).unwrap(), ids(&[0, 2, 3, 4]));
        assert_eq!(mesh.vertex_tetras(VertexId(2)).unwrap(), tetras(&[0, 1]));
        assert_eq!(
            mesh.edge_star(VertexId(1), VertexId(2)).unwrap(),
            ids(&[0, 3, 4])
        );
        assert_eq!(mesh.edge_tetras(VertexId(1), VertexId(4)).unwrap(), tetras(&[1]));
        assert_eq!(
            mesh.tetra_neighbors(ElementId(0)).unwrap(),
            vec![Some(ElementId(1)), None, None, None]
        );
        assert_eq!(
            mesh.tetra_neighbors(ElementId(1)).unwrap(),
            vec![None, None, None, Some(ElementId(0))]
        );
    }

    #[test]
    fn test_walks_match_scans() {
        for count in 1..=4 {
            let data = fixtures::axis_ring(count);
            let scanned = build(&data, BuildLevel::Raw);
            for level in [BuildLevel::Adjacency, BuildLevel::VertexIndex] {
                let mesh = build(&data, level);
                for v in 0..6 {
                    let v = VertexId(v);
                    assert_eq!(mesh.vertex_star(v), scanned.vertex_star(v));
                    assert_eq!(mesh.vertex_tetras(v), scanned.vertex_tetras(v));
                }
                for (a, b) in [(0, 1), (0, 2), (1, 3), (2, 3)] {
                    let (a, b) = (VertexId(a), VertexId(b));
                    assert_eq!(mesh.edge_star(a, b), scanned.edge_star(a, b));
                    assert_eq!(mesh.edge_tetras(a, b), scanned.edge_tetras(a, b));
                }
                for t in 0..count as u32 {
                    assert_eq!(
                        mesh.tetra_neighbors(ElementId(t)),
                        mesh.tetra_neighbors_scan(ElementId(t))
                    );
                }
            }
        }
    }

    #[test]
    fn test_closed_ring_around_axis() {
        let mesh = build(&fixtures::axis_ring(4), BuildLevel::VertexIndex);
        assert_eq!(
            mesh.edge_star(VertexId(0), VertexId(1)).unwrap(),
            ids(&[2, 3, 4, 5])
        );
        assert_eq!(
            mesh.edge_tetras(VertexId(1), VertexId(0)).unwrap(),
            tetras(&[0, 1, 2, 3])
        );
        let free = (0..4)
            .filter(|&h| mesh.is_boundary_corner(CornerId(h)).unwrap())
            .count();
        assert_eq!(free, 2);
        assert!(mesh.is_boundary_vertex(VertexId(0)).unwrap());
    }

    #[test]
    fn test_open_ring_walks_both_ways() {
        let mesh = build(&fixtures::axis_ring(3), BuildLevel::Adjacency);
        assert_eq!(
            mesh.edge_star(VertexId(0), VertexId(1)).unwrap(),
            ids(&[2, 3, 4, 5])
        );
        assert_eq!(
            mesh.edge_tetras(VertexId(0), VertexId(1)).unwrap(),
            tetras(&[0, 1, 2])
        );
    }

    #[test]
    fn test_radial_crosses_shared_face() {
        let mesh = build(&fixtures::two_tetras(), BuildLevel::Adjacency);
        let he = mesh.edge_on_face(CornerId(0), VertexId(1), VertexId(2)).unwrap();
        let across = mesh.radial(he).unwrap();
        assert_eq!(across.element(), ElementId(1));
        assert_eq!(across.face(), CornerId(7));
        assert_eq!(
            mesh.half_edge_vertices(across),
            Some((VertexId(2), VertexId(1)))
        );
        let free = HalfEdge::new(CornerId(1), CornerId(2)).unwrap();
        assert_eq!(mesh.radial(free), None);
    }

    #[test]
    fn test_lookups() {
        let mesh = build(&fixtures::two_tetras(), BuildLevel::VertexIndex);
        let raw = build(&fixtures::two_tetras(), BuildLevel::Raw);
        for m in [&mesh, &raw] {
            let he = m.edge_half_edge(VertexId(4), VertexId(2)).unwrap();
            let (x, y) = m.half_edge_vertices(he).unwrap();
            assert_eq!(sorted_pair(x, y), (VertexId(2), VertexId(4)));

            let h = m.face_corner(VertexId(3), VertexId(1), VertexId(2)).unwrap();
            assert_eq!(
                m.face_vertices(h).map(sorted_triple),
                Some([VertexId(1), VertexId(2), VertexId(3)])
            );
        }
        assert!(!mesh.is_boundary_corner(CornerId(0)).unwrap());
    }

    #[test]
    fn test_invalid_queries() {
        let mesh = build(&fixtures::two_tetras(), BuildLevel::Adjacency);
        assert_eq!(
            mesh.edge_star(VertexId(0), VertexId(4)),
            Err(QueryError::NotAnEdge(VertexId(0), VertexId(4)))
        );
        assert_eq!(
            mesh.edge_tetras_scan(VertexId(0), VertexId(4)),
            Err(QueryError::NotAnEdge(VertexId(0), VertexId(4)))
        );
        assert_eq!(
            mesh.edge_star(VertexId(2), VertexId(2)),
            Err(QueryError::NotAnEdge(VertexId(2), VertexId(2)))
        );
        assert_eq!(
            mesh.vertex_star(VertexId(9)),
            Err(QueryError::InvalidVertex(VertexId(9)))
        );
        assert!(matches!(
            mesh.face_corner(VertexId(0), VertexId(1), VertexId(4)),
            Err(QueryError::NotAFace(_))
        ));
        assert_eq!(
            mesh.is_boundary_vertex(VertexId(0)),
            Err(QueryError::MissingLevel(BuildLevel::VertexIndex))
        );
    }
}
