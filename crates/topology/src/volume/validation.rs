//! Validation methods for VolumeMesh.

use super::VolumeMesh;
use crate::error::CheckError;
use crate::opposite::{sorted_pair, sorted_triple};
use crate::types::{CornerId, VertexId};
use crate::validation;

impl VolumeMesh {
    /// Check the invariants of every built level.
    ///
    /// Validates that:
    /// 1. Corner vertices are in range
    /// 2. Opposite half-faces form an involution with reversed windings
    /// 3. Component labels are dense and shared within each tetrahedron
    /// 4. Vertex half-faces contain their vertex and map entries match their keys
    /// 5. Boundary triangles are exactly the free half-faces, and their own
    ///    opposites are consistent
    ///
    /// Stops at the first violation.
    pub fn check(&self) -> Result<(), CheckError> {
        let result = self.check_levels();
        if let Err(err) = &result {
            tracing::warn!("VolumeMesh::check: {}", err);
        }
        result
    }

    fn check_levels(&self) -> Result<(), CheckError> {
        validation::check_corners(self)?;
        validation::check_opposites(self, |c, t| self.orient_check(c, t))?;
        validation::check_components(self)?;
        validation::check_vertex_corners(self, |v, h| {
            self.face_vertices(h).is_some_and(|face| face.contains(&v))
        })?;

        if let Some(index) = &self.index {
            for (&(a, b), &he) in &index.edges {
                let key = self.half_edge_vertices(he).map(|(x, y)| sorted_pair(x, y));
                if key != Some((a, b)) {
                    return Err(CheckError::EdgeMapMismatch {
                        a,
                        b,
                        corner: he.face(),
                    });
                }
            }
            for (&key, &corner) in &index.faces {
                if self.face_vertices(corner).map(sorted_triple) != Some(key) {
                    return Err(CheckError::FaceMapMismatch { key, corner });
                }
            }
        }

        validation::check_boundary_sources(self)?;
        if let Some(boundary) = &self.boundary {
            for c in 0..boundary.corner_count() {
                let corner = CornerId::from_index(c);
                if let Some(vertex) = boundary.vertex(corner) {
                    if !self.geometry.is_valid(vertex) {
                        return Err(CheckError::BoundaryVertexOutOfRange { corner, vertex });
                    }
                }
            }
            if let Some((corner, opposite, back)) = boundary.opposites().first_broken_link() {
                return Err(CheckError::BoundaryInvolution {
                    corner,
                    opposite,
                    back,
                });
            }
            for c in 0..boundary.corner_count() {
                let corner = CornerId::from_index(c);
                if let Some(opposite) = boundary.opposite(corner) {
                    if !boundary.orient_check(corner, opposite) {
                        return Err(CheckError::BoundaryOrientation {
                            first: corner,
                            second: opposite,
                        });
                    }
                }
            }
            let labels = boundary.labels();
            for (i, label) in labels.as_slice().iter().enumerate() {
                if let Some(label) = *label {
                    if label.index() >= labels.count() {
                        return Err(CheckError::BoundaryComponentOutOfRange {
                            vertex: VertexId::from_index(i),
                            component: label,
                            count: labels.count(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
