//! Validation methods for SurfaceMesh.

use super::{SurfaceMesh, next};
use crate::error::CheckError;
use crate::opposite::sorted_pair;
use crate::traits::CornerMesh;
use crate::validation;

impl SurfaceMesh {
    /// Check the invariants of every built level.
    ///
    /// Validates that:
    /// 1. Corner vertices are in range
    /// 2. Opposites form an involution between reversed edges
    /// 3. Component labels are dense and shared within each triangle
    /// 4. Vertex corners start at their vertex and edge map entries match their key
    /// 5. Boundary segments are exactly the free corners and chain end to start
    ///
    /// Stops at the first violation.
    pub fn check(&self) -> Result<(), CheckError> {
        let result = self.check_levels();
        if let Err(err) = &result {
            tracing::warn!("SurfaceMesh::check: {}", err);
        }
        result
    }

    fn check_levels(&self) -> Result<(), CheckError> {
        validation::check_corners(self)?;
        validation::check_opposites(self, |h, o| self.orient_check(h, o))?;
        validation::check_components(self)?;
        validation::check_vertex_corners(self, |v, c| self.corner_vertex(c) == Some(v))?;

        if let Some(index) = &self.index {
            for (&(a, b), &corner) in &index.edges {
                let key = self.corner_edge(corner).map(|(x, y)| sorted_pair(x, y));
                if key != Some((a, b)) {
                    return Err(CheckError::EdgeMapMismatch { a, b, corner });
                }
            }
        }

        validation::check_boundary_sources(self)?;
        if let Some(boundary) = &self.boundary {
            for &corner in boundary.segments() {
                let Some(following) = boundary.next_corner(corner) else {
                    continue;
                };
                if self.corner_vertex(next(corner)) != self.corner_vertex(following) {
                    return Err(CheckError::BrokenCurve {
                        corner,
                        next: following,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::geometry::Geometry;
    use crate::types::{CornerId, VertexId};
    use compact_mesh_config::{BuildConfig, BuildLevel};

    fn build() -> SurfaceMesh {
        SurfaceMesh::from_data(&fixtures::open_fan(), &BuildConfig::default()).unwrap()
    }

    #[test]
    fn test_valid_meshes_pass() {
        assert!(build().check().is_ok());
        for data in [fixtures::octahedron(), fixtures::disjoint_triangles()] {
            let mesh = SurfaceMesh::from_data(&data, &BuildConfig::default()).unwrap();
            assert!(mesh.check().is_ok());
        }
    }

    #[test]
    fn test_vertex_out_of_range() {
        let geometry = Geometry::from_positions(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let mesh = SurfaceMesh::from_raw(
            geometry,
            vec![Some(VertexId(0)), Some(VertexId(1)), Some(VertexId(7))],
        );
        assert_eq!(
            mesh.check(),
            Err(CheckError::VertexOutOfRange {
                corner: CornerId(2),
                vertex: VertexId(7)
            })
        );
    }

    #[test]
    fn test_invalidated_vertex_detected() {
        let mut mesh = SurfaceMesh::from_data(
            &fixtures::two_triangles(),
            &BuildConfig::with_level(BuildLevel::Raw),
        )
        .unwrap();
        assert!(mesh.check().is_ok());
        assert!(mesh.invalidate_vertex(VertexId(3)));
        assert_eq!(
            mesh.check(),
            Err(CheckError::InvalidatedVertex {
                corner: CornerId(5),
                vertex: VertexId(3)
            })
        );
    }

    #[test]
    fn test_broken_involution_detected() {
        let mut mesh = build();
        if let Some(adjacency) = mesh.adjacency.as_mut() {
            adjacency.opposites.set(CornerId(3), Some(CornerId(5)));
        }
        assert!(matches!(
            mesh.check(),
            Err(CheckError::BrokenInvolution { .. })
        ));
    }

    #[test]
    fn test_vertex_corner_mismatch_detected() {
        let mut mesh = build();
        if let Some(index) = mesh.index.as_mut() {
            index.vertex_corners[0] = Some(CornerId(1));
        }
        assert_eq!(
            mesh.check(),
            Err(CheckError::VertexCornerMismatch {
                vertex: VertexId(0),
                corner: CornerId(1)
            })
        );
    }

    #[test]
    fn test_edge_map_mismatch_detected() {
        let mut mesh = SurfaceMesh::from_data(
            &fixtures::two_triangles(),
            &BuildConfig::with_level(BuildLevel::VertexIndex),
        )
        .unwrap();
        if let Some(index) = mesh.index.as_mut() {
            index.edges.insert((VertexId(0), VertexId(1)), CornerId(1));
        }
        assert!(matches!(
            mesh.check(),
            Err(CheckError::EdgeMapMismatch { corner: CornerId(1), .. })
        ));
    }
}
