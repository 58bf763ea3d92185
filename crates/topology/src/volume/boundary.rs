//! Boundary surface extraction for VolumeMesh (level 3).
//!
//! Every free half-face becomes a boundary triangle with the half-face's
//! winding. The triangles get their own corner space: boundary corner `c`
//! belongs to triangle `c / 3`, and its opposite is the corner across the
//! edge facing it.

use compact_mesh_config::{BuildLevel, NonManifoldPolicy};

use super::VolumeMesh;
use crate::components::ComponentLabels;
use crate::error::MeshError;
use crate::opposite::{OppositeTable, pair_by_key, sorted_pair};
use crate::types::{ComponentId, CornerId, VertexId};

/// Next corner within a boundary triangle
pub fn boundary_next(corner: CornerId) -> CornerId {
    let c = corner.0;
    CornerId(3 * (c / 3) + (c + 1) % 3)
}

/// Previous corner within a boundary triangle
pub fn boundary_prev(corner: CornerId) -> CornerId {
    let c = corner.0;
    CornerId(3 * (c / 3) + (c + 2) % 3)
}

/// Triangulated boundary of a tetrahedral mesh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundarySurface {
    /// Free half-face each triangle was built from
    sources: Vec<CornerId>,
    /// Vertex of each boundary corner
    vertices: Vec<VertexId>,
    opposites: OppositeTable,
    /// Boundary surface of each boundary vertex
    labels: ComponentLabels,
}

impl BoundarySurface {
    /// Number of boundary triangles
    pub fn triangle_count(&self) -> usize {
        self.sources.len()
    }

    pub fn corner_count(&self) -> usize {
        self.vertices.len()
    }

    /// Half-faces the triangles were built from, in triangle order
    pub fn sources(&self) -> &[CornerId] {
        &self.sources
    }

    pub fn source(&self, triangle: usize) -> Option<CornerId> {
        self.sources.get(triangle).copied()
    }

    /// Mesh vertex of a boundary corner
    pub fn vertex(&self, corner: CornerId) -> Option<VertexId> {
        self.vertices.get(corner.index()).copied()
    }

    /// Opposite boundary corner across the edge facing `corner`
    pub fn opposite(&self, corner: CornerId) -> Option<CornerId> {
        self.opposites.get(corner)
    }

    pub fn opposites(&self) -> &OppositeTable {
        &self.opposites
    }

    pub fn triangle_vertices(&self, triangle: usize) -> Option<[VertexId; 3]> {
        let chunk = self.vertices.get(3 * triangle..3 * triangle + 3)?;
        Some([chunk[0], chunk[1], chunk[2]])
    }

    pub fn triangles(&self) -> impl Iterator<Item = [VertexId; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Boundary surface containing a boundary vertex
    pub fn surface_of(&self, vertex: VertexId) -> Option<ComponentId> {
        self.labels.get(vertex)
    }

    /// Number of connected boundary surfaces
    pub fn surface_count(&self) -> usize {
        self.labels.count()
    }

    pub fn labels(&self) -> &ComponentLabels {
        &self.labels
    }

    /// Whether boundary corner `c` and its opposite `t` see their shared
    /// edge in reverse
    pub fn orient_check(&self, c: CornerId, t: CornerId) -> bool {
        let v = |x: CornerId| self.vertex(x);
        v(boundary_prev(c)) == v(boundary_next(t)) && v(boundary_prev(t)) == v(boundary_next(c))
    }

    /// Sorted endpoints of the edge facing boundary corner `corner`
    fn edge_key(vertices: &[VertexId], corner: CornerId) -> Option<(VertexId, VertexId)> {
        let a = *vertices.get(boundary_next(corner).index())?;
        let b = *vertices.get(boundary_prev(corner).index())?;
        Some(sorted_pair(a, b))
    }
}

impl VolumeMesh {
    /// Level 3: boundary triangles, their opposites and surface labels
    ///
    /// Boundary edges are always paired in visiting order. Tetrahedra that
    /// touch only along an edge put that edge on more than two boundary
    /// triangles, which a valid volume mesh may do.
    pub fn build_boundary(&mut self) -> Result<(), MeshError> {
        if self.index.is_none() {
            return Err(MeshError::MissingLevel {
                required: BuildLevel::VertexIndex,
                operation: "build_boundary",
            });
        }
        let adjacency = self.adjacency.as_ref().ok_or(MeshError::MissingLevel {
            required: BuildLevel::Adjacency,
            operation: "build_boundary",
        })?;

        let mut sources = Vec::new();
        let mut vertices = Vec::new();
        for h in adjacency.opposites.free_corners() {
            if let Some(face) = self.face_vertices(h) {
                sources.push(h);
                vertices.extend(face);
            }
        }

        let opposites = pair_by_key(
            vertices.len(),
            |c| BoundarySurface::edge_key(&vertices, c),
            NonManifoldPolicy::PairInOrder,
        )?;

        let mut on_boundary = vec![false; self.geometry.len()];
        for v in &vertices {
            if let Some(flag) = on_boundary.get_mut(v.index()) {
                *flag = true;
            }
        }
        let labels = ComponentLabels::label(
            self.geometry.len(),
            |v| on_boundary[v.index()],
            vertices.chunks_exact(3),
        );

        tracing::debug!(
            "build_boundary: {} triangles, {} open edges, {} surfaces",
            sources.len(),
            opposites.free_count(),
            labels.count()
        );

        self.boundary = Some(BoundarySurface {
            sources,
            vertices,
            opposites,
            labels,
        });
        Ok(())
    }

    /// Number of boundary triangles (level 3)
    pub fn boundary_triangle_count(&self) -> Option<usize> {
        self.boundary.as_ref().map(BoundarySurface::triangle_count)
    }

    /// Number of connected boundary surfaces (level 3)
    pub fn boundary_surface_count(&self) -> Option<usize> {
        self.boundary.as_ref().map(BoundarySurface::surface_count)
    }
}
