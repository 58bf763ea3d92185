//! Compact half-face structure over tetrahedral meshes
//!
//! Corner `h` of tetrahedron `h / 4` doubles as a half-face: the triangle
//! formed by the other three corners, opposite `V(h)`. A half-edge is a
//! pair of distinct corners of one tetrahedron: the face it lies on and its
//! origin. Faces are wound so that a positively oriented tetrahedron has
//! outward normals.

mod boundary;
mod construction;
mod topology;
mod validation;

use std::collections::HashMap;

use compact_mesh_config::BuildLevel;

pub use boundary::{BoundarySurface, boundary_next, boundary_prev};

use crate::components::ComponentLabels;
use crate::constants::TETRA_CORNERS;
use crate::error::QueryError;
use crate::geometry::Geometry;
use crate::opposite::{Adjacency, OppositeTable};
use crate::traits::{CornerMesh, HasBoundary, HasOpposite, HasVertexIndex};
use crate::types::{ComponentId, CornerId, ElementId, VertexId};

/// Slots of the face opposite each slot, in winding order
const FACE_SLOTS: [[u32; 3]; 4] = [[1, 2, 3], [0, 3, 2], [3, 0, 1], [2, 1, 0]];

/// `NEXT_ON_FACE[origin][face]` is the slot following `origin` on the face
/// opposite `face`. Diagonal entries are never read.
const NEXT_ON_FACE: [[u32; 4]; 4] = [[0, 3, 1, 2], [2, 1, 3, 0], [3, 0, 2, 1], [1, 2, 0, 3]];

/// Half-edge inside one tetrahedron
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HalfEdge {
    face: CornerId,
    origin: CornerId,
}

impl HalfEdge {
    /// Half-edge leaving `origin` on the face opposite `face`
    ///
    /// `None` unless both corners belong to the same tetrahedron and differ.
    pub fn new(face: CornerId, origin: CornerId) -> Option<Self> {
        (face.0 / 4 == origin.0 / 4 && face != origin).then_some(Self { face, origin })
    }

    /// Half-face this half-edge lies on
    pub fn face(self) -> CornerId {
        self.face
    }

    pub fn origin(self) -> CornerId {
        self.origin
    }

    pub fn element(self) -> ElementId {
        ElementId(self.face.0 / 4)
    }

    pub fn destination(self) -> CornerId {
        self.next().origin
    }

    /// Next half-edge around the same face
    pub fn next(self) -> Self {
        let slot = NEXT_ON_FACE[(self.origin.0 & 3) as usize][(self.face.0 & 3) as usize];
        Self {
            face: self.face,
            origin: CornerId(self.base() | slot),
        }
    }

    /// Previous half-edge around the same face
    pub fn prev(self) -> Self {
        let slot = NEXT_ON_FACE[(self.face.0 & 3) as usize][(self.origin.0 & 3) as usize];
        Self {
            face: self.face,
            origin: CornerId(self.base() | slot),
        }
    }

    /// Reversed half-edge on the other face of this tetrahedron sharing the edge
    pub fn mate(self) -> Self {
        Self {
            face: self.prev().origin,
            origin: self.destination(),
        }
    }

    fn base(self) -> u32 {
        self.face.0 & !3
    }
}

/// Next half-face within the tetrahedron
pub fn next_face(h: CornerId) -> CornerId {
    CornerId((h.0 & !3) | ((h.0 + 1) & 3))
}

pub fn mid_face(h: CornerId) -> CornerId {
    CornerId((h.0 & !3) | ((h.0 + 2) & 3))
}

pub fn prev_face(h: CornerId) -> CornerId {
    CornerId((h.0 & !3) | ((h.0 + 3) & 3))
}

/// Corners spanning the half-face `h`, in winding order
pub fn face_corners(h: CornerId) -> [CornerId; 3] {
    let base = h.0 & !3;
    FACE_SLOTS[(h.0 & 3) as usize].map(|slot| CornerId(base | slot))
}

/// Level 2 tables for tetrahedral meshes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeIndex {
    /// Half-face containing each vertex; on the boundary, a free one
    pub vertex_corners: Vec<Option<CornerId>>,
    /// Map from sorted vertex pair to a half-edge on that edge
    pub edges: HashMap<(VertexId, VertexId), HalfEdge>,
    /// Map from sorted vertex triple to a half-face on that face
    pub faces: HashMap<[VertexId; 3], CornerId>,
}

/// Tetrahedral mesh with staged topology tables
#[derive(Debug, Clone, Default)]
pub struct VolumeMesh {
    pub(crate) geometry: Geometry,
    pub(crate) corners: Vec<Option<VertexId>>,
    pub(crate) adjacency: Option<Adjacency>,
    pub(crate) index: Option<VolumeIndex>,
    pub(crate) boundary: Option<BoundarySurface>,
}

impl VolumeMesh {
    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    /// Number of tetrahedra
    pub fn tetra_count(&self) -> usize {
        self.corners.len() / TETRA_CORNERS
    }

    /// Vertices of the half-face `h` in winding order
    pub fn face_vertices(&self, h: CornerId) -> Option<[VertexId; 3]> {
        if h.index() >= self.corners.len() {
            return None;
        }
        let [a, b, c] = face_corners(h);
        Some([
            self.corner_vertex(a)?,
            self.corner_vertex(b)?,
            self.corner_vertex(c)?,
        ])
    }

    /// Endpoints `(V(origin), V(destination))` of a half-edge
    pub fn half_edge_vertices(&self, he: HalfEdge) -> Option<(VertexId, VertexId)> {
        Some((
            self.corner_vertex(he.origin)?,
            self.corner_vertex(he.destination())?,
        ))
    }

    pub fn adjacency(&self) -> Option<&Adjacency> {
        self.adjacency.as_ref()
    }

    pub fn index(&self) -> Option<&VolumeIndex> {
        self.index.as_ref()
    }

    pub fn boundary(&self) -> Option<&BoundarySurface> {
        self.boundary.as_ref()
    }

    /// Component of a vertex (level 1)
    pub fn component(&self, vertex: VertexId) -> Option<ComponentId> {
        self.components().and_then(|c| c.get(vertex))
    }

    /// Number of connected components (level 1)
    pub fn component_count(&self) -> Option<usize> {
        self.components().map(ComponentLabels::count)
    }

    pub(crate) fn require_corner(&self, corner: CornerId) -> Result<(), QueryError> {
        if self.corner_valid(corner) {
            Ok(())
        } else {
            tracing::warn!("VolumeMesh: invalid corner {:?}", corner);
            Err(QueryError::InvalidCorner(corner))
        }
    }

    pub(crate) fn require_vertex(&self, vertex: VertexId) -> Result<(), QueryError> {
        if self.vertex_valid(vertex) {
            Ok(())
        } else {
            tracing::warn!("VolumeMesh: invalid vertex {:?}", vertex);
            Err(QueryError::InvalidVertex(vertex))
        }
    }

    pub(crate) fn require_element(&self, element: ElementId) -> Result<(), QueryError> {
        if self.element_valid(element) {
            Ok(())
        } else {
            tracing::warn!("VolumeMesh: invalid tetrahedron {:?}", element);
            Err(QueryError::InvalidElement(element))
        }
    }
}

impl CornerMesh for VolumeMesh {
    const ARITY: usize = TETRA_CORNERS;

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn corner_vertices(&self) -> &[Option<VertexId>] {
        &self.corners
    }

    fn level(&self) -> BuildLevel {
        match (&self.adjacency, &self.index, &self.boundary) {
            (Some(_), Some(_), Some(_)) => BuildLevel::Boundary,
            (Some(_), Some(_), None) => BuildLevel::VertexIndex,
            (Some(_), None, _) => BuildLevel::Adjacency,
            (None, _, _) => BuildLevel::Raw,
        }
    }
}

impl HasOpposite for VolumeMesh {
    fn opposites(&self) -> Option<&OppositeTable> {
        self.adjacency.as_ref().map(|a| &a.opposites)
    }

    fn components(&self) -> Option<&ComponentLabels> {
        self.adjacency.as_ref().map(|a| &a.components)
    }
}

impl HasVertexIndex for VolumeMesh {
    fn vertex_corners(&self) -> Option<&[Option<CornerId>]> {
        self.index.as_ref().map(|i| i.vertex_corners.as_slice())
    }
}

impl HasBoundary for VolumeMesh {
    fn boundary_sources(&self) -> Option<&[CornerId]> {
        self.boundary.as_ref().map(|b| b.sources())
    }

    fn boundary_component_count(&self) -> Option<usize> {
        self.boundary.as_ref().map(BoundarySurface::surface_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use compact_mesh_config::BuildConfig;

    fn all_half_edges() -> impl Iterator<Item = HalfEdge> {
        (0..4).flat_map(|f| (0..4).filter_map(move |o| HalfEdge::new(CornerId(4 + f), CornerId(4 + o))))
    }

    #[test]
    fn test_half_edge_rejects_invalid_pairs() {
        assert!(HalfEdge::new(CornerId(1), CornerId(1)).is_none());
        assert!(HalfEdge::new(CornerId(3), CornerId(4)).is_none());
        assert!(HalfEdge::new(CornerId(5), CornerId(7)).is_some());
        assert_eq!(all_half_edges().count(), 12);
    }

    #[test]
    fn test_face_cycles() {
        for he in all_half_edges() {
            assert_eq!(he.next().next().next(), he);
            assert_eq!(he.next().prev(), he);
            assert_eq!(he.prev().next(), he);
            assert_ne!(he.origin(), he.face());
            assert_ne!(he.next().origin(), he.face());
            assert_eq!(he.element(), ElementId(1));
        }
    }

    #[test]
    fn test_mate_is_involution() {
        for he in all_half_edges() {
            let mate = he.mate();
            assert_eq!(mate.mate(), he);
            assert_ne!(mate.face(), he.face());
            assert_eq!(mate.origin(), he.destination());
            assert_eq!(mate.destination(), he.origin());
        }
    }

    #[test]
    fn test_next_matches_face_winding() {
        for f in 0..4 {
            let face = CornerId(f);
            let [a, b, c] = face_corners(face);
            let he = HalfEdge::new(face, a).unwrap();
            assert_eq!(he.destination(), b);
            assert_eq!(he.next().destination(), c);
        }
    }

    #[test]
    fn test_face_arithmetic() {
        assert_eq!(next_face(CornerId(7)), CornerId(4));
        assert_eq!(mid_face(CornerId(5)), CornerId(7));
        assert_eq!(prev_face(CornerId(4)), CornerId(7));
        assert_eq!(face_corners(CornerId(6)), [CornerId(7), CornerId(4), CornerId(5)]);
    }

    #[test]
    fn test_face_vertices_outward_on_positive_tetra() {
        let mesh = VolumeMesh::from_data(
            &fixtures::single_tetra(),
            &BuildConfig::with_level(BuildLevel::Raw).without_legalize(),
        )
        .unwrap();
        let centroid = glam::DVec3::splat(0.25);
        for h in 0..4 {
            let face = mesh.face_vertices(CornerId(h)).unwrap();
            let normal = mesh.geometry().triangle_normal(face).unwrap();
            let on_face = mesh.geometry().position(face[0]).unwrap();
            assert!(normal.dot(on_face - centroid) > 0.0);
        }
        assert_eq!(mesh.face_vertices(CornerId(4)), None);
    }

    #[test]
    fn test_levels_are_cumulative() {
        let data = fixtures::axis_ring(4);
        for level in BuildLevel::ALL {
            let mesh = VolumeMesh::from_data(&data, &BuildConfig::with_level(level)).unwrap();
            assert_eq!(mesh.level(), level);
            assert_eq!(mesh.tetra_count(), 4);
            assert_eq!(mesh.corner_count(), 16);
            assert!(mesh.check().is_ok());
        }
    }
}
