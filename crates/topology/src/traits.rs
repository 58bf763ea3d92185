//! Capability traits for the staged topology levels.
//!
//! Each level's tables are optional on a mesh; a trait method returns
//! `None` until the matching build step has run.

use compact_mesh_config::BuildLevel;

use crate::components::ComponentLabels;
use crate::geometry::Geometry;
use crate::opposite::OppositeTable;
use crate::types::{CornerId, ElementId, VertexId};

/// Level 0: geometry plus the corner to vertex table
pub trait CornerMesh {
    /// Corners per element
    const ARITY: usize;

    fn geometry(&self) -> &Geometry;

    fn corner_vertices(&self) -> &[Option<VertexId>];

    /// Highest level whose tables are present
    fn level(&self) -> BuildLevel;

    fn vertex_count(&self) -> usize {
        self.geometry().len()
    }

    fn element_count(&self) -> usize {
        self.corner_vertices().len() / Self::ARITY
    }

    fn corner_count(&self) -> usize {
        self.corner_vertices().len()
    }

    /// Vertex of a corner, `None` if out of range or invalidated
    fn corner_vertex(&self, corner: CornerId) -> Option<VertexId> {
        self.corner_vertices().get(corner.index()).copied().flatten()
    }

    fn element_of(&self, corner: CornerId) -> ElementId {
        ElementId::from_index(corner.index() / Self::ARITY)
    }

    fn element_corners(&self, element: ElementId) -> impl Iterator<Item = CornerId> {
        let base = element.index() * Self::ARITY;
        (base..base + Self::ARITY).map(CornerId::from_index)
    }

    /// Vertices of an element if all of its corners are set
    fn element_vertices(&self, element: ElementId) -> Option<Vec<VertexId>> {
        self.element_corners(element)
            .map(|c| self.corner_vertex(c))
            .collect()
    }

    fn vertex_valid(&self, vertex: VertexId) -> bool {
        self.geometry().is_valid(vertex)
    }

    fn corner_valid(&self, corner: CornerId) -> bool {
        self.corner_vertex(corner)
            .is_some_and(|v| self.vertex_valid(v))
    }

    fn element_valid(&self, element: ElementId) -> bool {
        element.index() < self.element_count()
            && self.element_corners(element).all(|c| self.corner_valid(c))
    }
}

/// Level 1: opposite table and vertex components
pub trait HasOpposite: CornerMesh {
    fn opposites(&self) -> Option<&OppositeTable>;

    fn components(&self) -> Option<&ComponentLabels>;

    fn opposite(&self, corner: CornerId) -> Option<CornerId> {
        self.opposites().and_then(|table| table.get(corner))
    }
}

/// Level 2: representative corner per vertex
pub trait HasVertexIndex: HasOpposite {
    fn vertex_corners(&self) -> Option<&[Option<CornerId>]>;

    fn vertex_corner(&self, vertex: VertexId) -> Option<CornerId> {
        self.vertex_corners()
            .and_then(|table| table.get(vertex.index()).copied().flatten())
    }
}

/// Level 3: extracted boundary mesh
pub trait HasBoundary: HasVertexIndex {
    /// Free corner each boundary element was built from
    fn boundary_sources(&self) -> Option<&[CornerId]>;

    /// Boundary curves (surfaces) or boundary surfaces (volumes)
    fn boundary_component_count(&self) -> Option<usize>;
}
