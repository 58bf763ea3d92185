//! Compact half-edge structure over triangle meshes
//!
//! Corners are half-edges: corner `c` of triangle `c / 3` runs from `V(c)`
//! to `V(next(c))`. Adjacency, vertex indices and boundary curves are
//! staged tables built on top of the raw corner array.

mod boundary;
mod construction;
mod topology;
mod validation;

use std::collections::HashMap;

use compact_mesh_config::BuildLevel;

pub use boundary::BoundaryCurves;

use crate::components::ComponentLabels;
use crate::constants::TRIANGLE_CORNERS;
use crate::error::QueryError;
use crate::geometry::Geometry;
use crate::opposite::{Adjacency, OppositeTable};
use crate::traits::{CornerMesh, HasBoundary, HasOpposite, HasVertexIndex};
use crate::types::{ComponentId, CornerId, ElementId, VertexId};

/// Level 2 tables for triangle meshes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceIndex {
    /// Representative outgoing corner per vertex; on the rim, the fan start
    pub vertex_corners: Vec<Option<CornerId>>,
    /// Map from sorted vertex pair to a corner on that edge
    pub edges: HashMap<(VertexId, VertexId), CornerId>,
}

/// Triangle mesh with staged topology tables
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    pub(crate) geometry: Geometry,
    pub(crate) corners: Vec<Option<VertexId>>,
    pub(crate) adjacency: Option<Adjacency>,
    pub(crate) index: Option<SurfaceIndex>,
    pub(crate) boundary: Option<BoundaryCurves>,
}

/// Next corner within the triangle
pub fn next(corner: CornerId) -> CornerId {
    let c = corner.0;
    CornerId(3 * (c / 3) + (c + 1) % 3)
}

/// Previous corner within the triangle
pub fn prev(corner: CornerId) -> CornerId {
    let c = corner.0;
    CornerId(3 * (c / 3) + (c + 2) % 3)
}

impl SurfaceMesh {
    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.corners.len() / TRIANGLE_CORNERS
    }

    /// Outgoing edge of a corner as `(V(c), V(next(c)))`
    pub fn corner_edge(&self, corner: CornerId) -> Option<(VertexId, VertexId)> {
        Some((self.corner_vertex(corner)?, self.corner_vertex(next(corner))?))
    }

    pub fn adjacency(&self) -> Option<&Adjacency> {
        self.adjacency.as_ref()
    }

    pub fn index(&self) -> Option<&SurfaceIndex> {
        self.index.as_ref()
    }

    pub fn boundary(&self) -> Option<&BoundaryCurves> {
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
            tracing::warn!("SurfaceMesh: invalid corner {:?}", corner);
            Err(QueryError::InvalidCorner(corner))
        }
    }

    pub(crate) fn require_vertex(&self, vertex: VertexId) -> Result<(), QueryError> {
        if self.vertex_valid(vertex) {
            Ok(())
        } else {
            tracing::warn!("SurfaceMesh: invalid vertex {:?}", vertex);
            Err(QueryError::InvalidVertex(vertex))
        }
    }

    pub(crate) fn require_element(&self, element: ElementId) -> Result<(), QueryError> {
        if self.element_valid(element) {
            Ok(())
        } else {
            tracing::warn!("SurfaceMesh: invalid triangle {:?}", element);
            Err(QueryError::InvalidElement(element))
        }
    }
}

impl CornerMesh for SurfaceMesh {
    const ARITY: usize = TRIANGLE_CORNERS;

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

impl HasOpposite for SurfaceMesh {
    fn opposites(&self) -> Option<&OppositeTable> {
        self.adjacency.as_ref().map(|a| &a.opposites)
    }

    fn components(&self) -> Option<&ComponentLabels> {
        self.adjacency.as_ref().map(|a| &a.components)
    }
}

impl HasVertexIndex for SurfaceMesh {
    fn vertex_corners(&self) -> Option<&[Option<CornerId>]> {
        self.index.as_ref().map(|i| i.vertex_corners.as_slice())
    }
}

impl HasBoundary for SurfaceMesh {
    fn boundary_sources(&self) -> Option<&[CornerId]> {
        self.boundary.as_ref().map(|b| b.segments())
    }

    fn boundary_component_count(&self) -> Option<usize> {
        self.boundary.as_ref().map(BoundaryCurves::curve_count)
    }
}
