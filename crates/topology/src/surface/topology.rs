//! Topology query methods for SurfaceMesh.
//!
//! `R_ab` relations map a simplex of dimension `a` to the incident simplices
//! of dimension `b`. Each query walks the opposite table when it has been
//! built and falls back to a linear scan over all corners otherwise. The
//! `*_scan` variants always scan and serve as ground truth.

use std::collections::BTreeSet;

use compact_mesh_config::BuildLevel;

use super::{SurfaceMesh, next, prev};
use crate::error::QueryError;
use crate::opposite::{OppositeTable, sorted_pair};
use crate::traits::{CornerMesh, HasOpposite, HasVertexIndex};
use crate::types::{CornerId, ElementId, VertexId};

impl SurfaceMesh {
    // ========================================================================
    // Linear Scans (Level 0)
    // ========================================================================

    /// R_00 by scan: vertices sharing an edge with `vertex`, sorted
    pub fn vertex_star_scan(&self, vertex: VertexId) -> Result<Vec<VertexId>, QueryError> {
        self.require_vertex(vertex)?;
        let mut star = BTreeSet::new();
        for corner in self.corners_of_vertex(vertex) {
            star.extend(self.corner_vertex(next(corner)));
            star.extend(self.corner_vertex(prev(corner)));
        }
        Ok(star.into_iter().collect())
    }

    /// R_02 by scan: triangles incident to `vertex`, sorted
    pub fn vertex_triangles_scan(&self, vertex: VertexId) -> Result<Vec<ElementId>, QueryError> {
        self.require_vertex(vertex)?;
        let triangles: BTreeSet<ElementId> = self
            .corners_of_vertex(vertex)
            .map(|c| self.element_of(c))
            .collect();
        Ok(triangles.into_iter().collect())
    }

    /// R_10 by scan: vertices facing the edge of `corner`
    pub fn edge_star_scan(&self, corner: CornerId) -> Result<Vec<VertexId>, QueryError> {
        self.require_corner(corner)?;
        let mut star: Vec<VertexId> = self.corner_vertex(prev(corner)).into_iter().collect();
        for other in self.corners_on_edge_of(corner) {
            star.extend(self.corner_vertex(prev(other)));
        }
        Ok(star)
    }

    /// R_12 by scan: triangles containing the edge of `corner`
    pub fn edge_triangles_scan(&self, corner: CornerId) -> Result<Vec<ElementId>, QueryError> {
        self.require_corner(corner)?;
        let mut triangles = vec![self.element_of(corner)];
        triangles.extend(self.corners_on_edge_of(corner).map(|c| self.element_of(c)));
        Ok(triangles)
    }

    /// R_22 by scan: the triangle across each edge of `element`, `None` on the rim
    pub fn triangle_neighbors_scan(
        &self,
        element: ElementId,
    ) -> Result<Vec<Option<ElementId>>, QueryError> {
        self.require_element(element)?;
        Ok(self
            .element_corners(element)
            .map(|c| self.corners_on_edge_of(c).next().map(|o| self.element_of(o)))
            .collect())
    }

    fn corners_of_vertex(&self, vertex: VertexId) -> impl Iterator<Item = CornerId> + '_ {
        (0..self.corners.len())
            .map(CornerId::from_index)
            .filter(move |&c| self.corner_vertex(c) == Some(vertex))
    }

    /// Corners of other triangles on the same undirected edge as `corner`
    fn corners_on_edge_of(&self, corner: CornerId) -> impl Iterator<Item = CornerId> + '_ {
        let key = self.edge_key(corner);
        let element = self.element_of(corner);
        (0..self.corners.len())
            .map(CornerId::from_index)
            .filter(move |&c| self.element_of(c) != element && key.is_some() && self.edge_key(c) == key)
    }

    fn edge_key(&self, corner: CornerId) -> Option<(VertexId, VertexId)> {
        let (a, b) = self.corner_edge(corner)?;
        Some(sorted_pair(a, b))
    }

    // ========================================================================
    // Topology Queries
    // ========================================================================

    /// R_00: vertices sharing an edge with `vertex`
    ///
    /// Walks the one-ring from the vertex's fan start (level 2) or from the
    /// first corner found by scan (level 1). The result is partial for
    /// non-manifold vertices.
    pub fn vertex_star(&self, vertex: VertexId) -> Result<Vec<VertexId>, QueryError> {
        self.require_vertex(vertex)?;
        let Some(opposites) = self.opposites() else {
            return self.vertex_star_scan(vertex);
        };
        let Some(start) = self.fan_seed(vertex) else {
            return Ok(Vec::new());
        };

        let mut star = Vec::new();
        let mut rotation = self.rotate_forward(opposites, start, |h| {
            star.extend(self.corner_vertex(next(h)));
        });
        if rotation == Rotation::Rim {
            star.extend(self.corner_vertex(prev(start)));
            rotation = self.rotate_backward(opposites, start, |h| {
                star.extend(self.corner_vertex(prev(h)));
            });
        }
        if rotation == Rotation::Unoriented {
            tracing::debug!("vertex_star: fan of {:?} is not consistently wound, scanning", vertex);
            return self.vertex_star_scan(vertex);
        }
        Ok(star)
    }

    /// R_02: triangles incident to `vertex`, in rotation order
    pub fn vertex_triangles(&self, vertex: VertexId) -> Result<Vec<ElementId>, QueryError> {
        self.require_vertex(vertex)?;
        let Some(opposites) = self.opposites() else {
            return self.vertex_triangles_scan(vertex);
        };
        let Some(start) = self.fan_seed(vertex) else {
            return Ok(Vec::new());
        };

        let mut triangles = Vec::new();
        let mut rotation =
            self.rotate_forward(opposites, start, |h| triangles.push(self.element_of(h)));
        if rotation == Rotation::Rim {
            rotation =
                self.rotate_backward(opposites, start, |h| triangles.push(self.element_of(h)));
        }
        if rotation == Rotation::Unoriented {
            tracing::debug!(
                "vertex_triangles: fan of {:?} is not consistently wound, scanning",
                vertex
            );
            return self.vertex_triangles_scan(vertex);
        }
        Ok(triangles)
    }

    /// R_10: vertices facing the edge of `corner` (one per incident triangle)
    pub fn edge_star(&self, corner: CornerId) -> Result<Vec<VertexId>, QueryError> {
        self.require_corner(corner)?;
        let Some(opposites) = self.opposites() else {
            return self.edge_star_scan(corner);
        };
        let mut star: Vec<VertexId> = self.corner_vertex(prev(corner)).into_iter().collect();
        if let Some(o) = opposites.get(corner) {
            star.extend(self.corner_vertex(prev(o)));
        }
        Ok(star)
    }

    /// R_12: triangles containing the edge of `corner`
    pub fn edge_triangles(&self, corner: CornerId) -> Result<Vec<ElementId>, QueryError> {
        self.require_corner(corner)?;
        let Some(opposites) = self.opposites() else {
            return self.edge_triangles_scan(corner);
        };
        let mut triangles = vec![self.element_of(corner)];
        triangles.extend(opposites.get(corner).map(|o| self.element_of(o)));
        Ok(triangles)
    }

    /// R_22: the triangle across each edge of `element`, `None` on the rim
    pub fn triangle_neighbors(
        &self,
        element: ElementId,
    ) -> Result<Vec<Option<ElementId>>, QueryError> {
        self.require_element(element)?;
        let Some(opposites) = self.opposites() else {
            return self.triangle_neighbors_scan(element);
        };
        Ok(self
            .element_corners(element)
            .map(|c| opposites.get(c).map(|o| self.element_of(o)))
            .collect())
    }

    /// A corner on the edge between `a` and `b`
    ///
    /// Uses the edge map (level 2) when present, which prefers the rim corner.
    pub fn edge_corner(&self, a: VertexId, b: VertexId) -> Result<CornerId, QueryError> {
        self.require_vertex(a)?;
        self.require_vertex(b)?;
        let key = sorted_pair(a, b);
        let found = match &self.index {
            Some(index) => index.edges.get(&key).copied(),
            None => (0..self.corners.len())
                .map(CornerId::from_index)
                .find(|&c| self.edge_key(c) == Some(key)),
        };
        found.ok_or_else(|| {
            tracing::warn!("SurfaceMesh: {:?} and {:?} do not span an edge", a, b);
            QueryError::NotAnEdge(a, b)
        })
    }

    /// Whether the edge of `corner` lies on the rim (level 1)
    pub fn is_boundary_corner(&self, corner: CornerId) -> Result<bool, QueryError> {
        self.require_corner(corner)?;
        let opposites = self
            .opposites()
            .ok_or(QueryError::MissingLevel(BuildLevel::Adjacency))?;
        Ok(opposites.is_free(corner))
    }

    /// Whether `vertex` lies on the rim (level 2)
    ///
    /// Isolated vertices are not on the rim.
    pub fn is_boundary_vertex(&self, vertex: VertexId) -> Result<bool, QueryError> {
        self.require_vertex(vertex)?;
        let (Some(opposites), Some(_)) = (self.opposites(), self.index.as_ref()) else {
            return Err(QueryError::MissingLevel(BuildLevel::VertexIndex));
        };
        Ok(self
            .vertex_corner(vertex)
            .is_some_and(|c| opposites.is_free(prev(c))))
    }

    fn fan_seed(&self, vertex: VertexId) -> Option<CornerId> {
        match self.index {
            Some(_) => self.vertex_corner(vertex),
            None => self.corners_of_vertex(vertex).next(),
        }
    }

    /// Rotate around `V(start)` by `h = next(O(h))`, visiting `start` first
    fn rotate_forward(
        &self,
        opposites: &OppositeTable,
        start: CornerId,
        mut visit: impl FnMut(CornerId),
    ) -> Rotation {
        let mut h = start;
        for _ in 0..=opposites.len() {
            visit(h);
            let Some(o) = opposites.get(h) else {
                return Rotation::Rim;
            };
            if !self.orient_check(h, o) {
                return Rotation::Unoriented;
            }
            h = next(o);
            if h == start {
                return Rotation::Closed;
            }
        }
        Rotation::Unoriented
    }

    /// Rotate the other way by `h = O(prev(h))` until the rim, not visiting `start`
    fn rotate_backward(
        &self,
        opposites: &OppositeTable,
        start: CornerId,
        mut visit: impl FnMut(CornerId),
    ) -> Rotation {
        let mut h = start;
        for _ in 0..opposites.len() {
            let incoming = prev(h);
            let Some(o) = opposites.get(incoming) else {
                return Rotation::Rim;
            };
            if !self.orient_check(incoming, o) {
                return Rotation::Unoriented;
            }
            if o == start {
                return Rotation::Closed;
            }
            h = o;
            visit(h);
        }
        Rotation::Unoriented
    }
}

/// How a rotation around a vertex ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    /// Came back to the start corner
    Closed,
    /// Reached a free edge
    Rim,
    /// Crossed an edge whose two corners run the same way
    Unoriented,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MeshData;
    use crate::fixtures;
    use compact_mesh_config::BuildConfig;

    fn build(data: &MeshData, level: BuildLevel) -> SurfaceMesh {
        SurfaceMesh::from_data(data, &BuildConfig::with_level(level)).unwrap()
    }

    fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
        items.sort();
        items
    }

    #[test]
    fn test_star_round_trip_closed() {
        let data = fixtures::octahedron();
        let raw = build(&data, BuildLevel::Raw);
        for level in [BuildLevel::Adjacency, BuildLevel::VertexIndex] {
            let mesh = build(&data, level);
            for v in 0..6 {
                let v = VertexId(v);
                let walk = mesh.vertex_star(v).unwrap();
                assert_eq!(walk.len(), 4);
                assert_eq!(sorted(walk), raw.vertex_star_scan(v).unwrap());
                assert_eq!(
                    sorted(mesh.vertex_triangles(v).unwrap()),
                    raw.vertex_triangles_scan(v).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_star_round_trip_open() {
        let data = fixtures::open_fan();
        let raw = build(&data, BuildLevel::Raw);
        for level in [BuildLevel::Adjacency, BuildLevel::VertexIndex] {
            let mesh = build(&data, level);
            for v in 0..5 {
                let v = VertexId(v);
                assert_eq!(
                    sorted(mesh.vertex_star(v).unwrap()),
                    raw.vertex_star_scan(v).unwrap()
                );
                assert_eq!(
                    sorted(mesh.vertex_triangles(v).unwrap()),
                    raw.vertex_triangles_scan(v).unwrap()
                );
            }
        }
        let raw_center = raw.vertex_star_scan(VertexId(0)).unwrap();
        assert_eq!(
            raw_center,
            vec![VertexId(1), VertexId(2), VertexId(3), VertexId(4)]
        );
    }

    /// A lone triangle, then an octahedron whose first triangle is flipped.
    /// Orientation starts from the lone triangle and never reaches the octahedron.
    fn unoriented_octahedron() -> MeshData {
        let octahedron = fixtures::octahedron();
        let mut positions = vec![[5.0, 5.0, 5.0], [6.0, 5.0, 5.0], [5.0, 6.0, 5.0]];
        positions.extend(octahedron.positions);
        let mut indices = vec![0, 1, 2];
        indices.extend(octahedron.indices.iter().map(|i| i + 3));
        indices.swap(3, 4);
        MeshData::new(positions, indices)
    }

    #[test]
    fn test_stars_on_unoriented_component_match_scan() {
        let data = unoriented_octahedron();
        let raw = build(&data, BuildLevel::Raw);
        for level in [BuildLevel::Adjacency, BuildLevel::VertexIndex] {
            let mesh = build(&data, level);
            assert!(mesh.check().is_err());
            for v in 0..9 {
                let v = VertexId(v);
                assert_eq!(
                    sorted(mesh.vertex_star(v).unwrap()),
                    raw.vertex_star_scan(v).unwrap()
                );
                assert_eq!(
                    sorted(mesh.vertex_triangles(v).unwrap()),
                    raw.vertex_triangles_scan(v).unwrap()
                );
            }
            assert_eq!(
                mesh.vertex_star(VertexId(3)).unwrap(),
                vec![VertexId(5), VertexId(6), VertexId(7), VertexId(8)]
            );
            assert_eq!(
                mesh.vertex_triangles(VertexId(3)).unwrap(),
                vec![ElementId(1), ElementId(4), ElementId(5), ElementId(8)]
            );
        }
    }

    #[test]
    fn test_fan_walk_order_from_rim() {
        let mesh = build(&fixtures::open_fan(), BuildLevel::VertexIndex);
        assert_eq!(
            mesh.vertex_star(VertexId(0)).unwrap(),
            vec![VertexId(3), VertexId(2), VertexId(1), VertexId(4)]
        );
        assert_eq!(
            mesh.vertex_triangles(VertexId(0)).unwrap(),
            vec![ElementId(2), ElementId(1), ElementId(0)]
        );
    }

    #[test]
    fn test_edge_queries() {
        let data = fixtures::two_triangles();
        for level in [BuildLevel::Raw, BuildLevel::Adjacency] {
            let mesh = build(&data, level);
            assert_eq!(
                mesh.edge_star(CornerId(0)).unwrap(),
                vec![VertexId(2), VertexId(3)]
            );
            assert_eq!(
                mesh.edge_triangles(CornerId(3)).unwrap(),
                vec![ElementId(1), ElementId(0)]
            );
            assert_eq!(mesh.edge_star(CornerId(1)).unwrap(), vec![VertexId(0)]);
            assert_eq!(
                mesh.triangle_neighbors(ElementId(0)).unwrap(),
                vec![Some(ElementId(1)), None, None]
            );
        }
    }

    #[test]
    fn test_triangle_neighbors_match_scan() {
        let mesh = build(&fixtures::octahedron(), BuildLevel::Adjacency);
        for t in 0..8 {
            let t = ElementId(t);
            let neighbors = mesh.triangle_neighbors(t).unwrap();
            assert!(neighbors.iter().all(Option::is_some));
            assert_eq!(neighbors, mesh.triangle_neighbors_scan(t).unwrap());
        }
    }

    #[test]
    fn test_invalid_arguments() {
        let mesh = build(&fixtures::two_triangles(), BuildLevel::Boundary);
        assert_eq!(
            mesh.vertex_star(VertexId(9)),
            Err(QueryError::InvalidVertex(VertexId(9)))
        );
        assert_eq!(
            mesh.edge_star(CornerId(6)),
            Err(QueryError::InvalidCorner(CornerId(6)))
        );
        assert_eq!(
            mesh.triangle_neighbors(ElementId(2)),
            Err(QueryError::InvalidElement(ElementId(2)))
        );
        assert_eq!(
            mesh.edge_corner(VertexId(2), VertexId(3)),
            Err(QueryError::NotAnEdge(VertexId(2), VertexId(3)))
        );
    }

    #[test]
    fn test_invalidated_vertex_rejected() {
        let mut mesh = build(&fixtures::two_triangles(), BuildLevel::Raw);
        assert!(mesh.invalidate_vertex(VertexId(3)));
        assert_eq!(
            mesh.vertex_star_scan(VertexId(3)),
            Err(QueryError::InvalidVertex(VertexId(3)))
        );
        assert!(mesh.edge_star(CornerId(5)).is_err());
    }

    #[test]
    fn test_boundary_predicates() {
        let fan = build(&fixtures::open_fan(), BuildLevel::VertexIndex);
        assert_eq!(fan.is_boundary_vertex(VertexId(0)), Ok(true));
        assert_eq!(fan.is_boundary_corner(CornerId(3)), Ok(false));
        assert_eq!(fan.is_boundary_corner(CornerId(0)), Ok(true));

        let closed = build(&fixtures::octahedron(), BuildLevel::VertexIndex);
        assert_eq!(closed.is_boundary_vertex(VertexId(4)), Ok(false));

        let raw = build(&fixtures::octahedron(), BuildLevel::Raw);
        assert_eq!(
            raw.is_boundary_vertex(VertexId(4)),
            Err(QueryError::MissingLevel(BuildLevel::VertexIndex))
        );
    }

    #[test]
    fn test_edge_corner_without_index() {
        let mesh = build(&fixtures::open_fan(), BuildLevel::Adjacency);
        let corner = mesh.edge_corner(VertexId(3), VertexId(0)).unwrap();
        assert_eq!(mesh.element_of(corner), ElementId(1));
    }
}
