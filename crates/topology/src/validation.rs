//! Structural checks shared by surface and volume meshes.
//!
//! Every check is fail-fast and reports the first violation it finds.

use std::collections::HashSet;

use crate::error::CheckError;
use crate::traits::{CornerMesh, HasBoundary, HasOpposite, HasVertexIndex};
use crate::types::{CornerId, ElementId, VertexId};

/// Corner table size, vertex ranges and vertex slot validity
pub fn check_corners<M: CornerMesh>(mesh: &M) -> Result<(), CheckError> {
    let corners = mesh.corner_vertices();
    if corners.len() % M::ARITY != 0 {
        return Err(CheckError::SizeMismatch {
            table: "corners",
            expected: mesh.element_count() * M::ARITY,
            actual: corners.len(),
        });
    }
    for (i, vertex) in corners.iter().enumerate() {
        if let Some(vertex) = *vertex {
            let corner = CornerId::from_index(i);
            if vertex.index() >= mesh.vertex_count() {
                return Err(CheckError::VertexOutOfRange { corner, vertex });
            }
            if !mesh.vertex_valid(vertex) {
                return Err(CheckError::InvalidatedVertex { corner, vertex });
            }
        }
    }
    Ok(())
}

/// Opposite table size, range, involution and winding consistency
pub fn check_opposites<M: HasOpposite>(
    mesh: &M,
    consistent: impl Fn(CornerId, CornerId) -> bool,
) -> Result<(), CheckError> {
    let Some(table) = mesh.opposites() else {
        return Ok(());
    };
    if table.len() != mesh.corner_count() {
        return Err(CheckError::SizeMismatch {
            table: "opposites",
            expected: mesh.corner_count(),
            actual: table.len(),
        });
    }
    for (i, mate) in table.as_slice().iter().enumerate() {
        if let Some(mate) = *mate {
            if mate.index() >= table.len() {
                return Err(CheckError::OppositeOutOfRange {
                    corner: CornerId::from_index(i),
                    opposite: mate,
                });
            }
        }
    }
    if let Some((corner, opposite, back)) = table.first_broken_link() {
        return Err(CheckError::BrokenInvolution {
            corner,
            opposite,
            back,
        });
    }
    for (i, mate) in table.as_slice().iter().enumerate() {
        let corner = CornerId::from_index(i);
        if let Some(mate) = *mate {
            if !consistent(corner, mate) {
                return Err(CheckError::InconsistentOrientation {
                    first: mesh.element_of(corner),
                    second: mesh.element_of(mate),
                });
            }
        }
    }
    Ok(())
}

/// Component labels are in range and shared by all vertices of an element
pub fn check_components<M: HasOpposite>(mesh: &M) -> Result<(), CheckError> {
    let Some(components) = mesh.components() else {
        return Ok(());
    };
    if components.len() != mesh.vertex_count() {
        return Err(CheckError::SizeMismatch {
            table: "components",
            expected: mesh.vertex_count(),
            actual: components.len(),
        });
    }
    for (i, label) in components.as_slice().iter().enumerate() {
        if let Some(label) = *label {
            if label.index() >= components.count() {
                return Err(CheckError::ComponentOutOfRange {
                    vertex: VertexId::from_index(i),
                    component: label,
                    count: components.count(),
                });
            }
        }
    }
    for e in 0..mesh.element_count() {
        let element = ElementId::from_index(e);
        let Some(vertices) = mesh.element_vertices(element) else {
            continue;
        };
        let first = components.get(vertices[0]);
        if let Some(other) = vertices[1..]
            .iter()
            .map(|&v| components.get(v))
            .find(|&label| label != first)
        {
            return Err(CheckError::SplitComponent {
                element,
                first,
                second: other,
            });
        }
    }
    Ok(())
}

/// Every used vertex has a representative corner that touches it
pub fn check_vertex_corners<M: HasVertexIndex>(
    mesh: &M,
    touches: impl Fn(VertexId, CornerId) -> bool,
) -> Result<(), CheckError> {
    let Some(table) = mesh.vertex_corners() else {
        return Ok(());
    };
    if table.len() != mesh.vertex_count() {
        return Err(CheckError::SizeMismatch {
            table: "vertex corners",
            expected: mesh.vertex_count(),
            actual: table.len(),
        });
    }
    for (i, corner) in table.iter().enumerate() {
        let vertex = VertexId::from_index(i);
        if let Some(corner) = *corner {
            if !touches(vertex, corner) {
                return Err(CheckError::VertexCornerMismatch { vertex, corner });
            }
        }
    }
    for vertex in mesh.corner_vertices().iter().flatten() {
        if mesh.vertex_corner(*vertex).is_none() {
            return Err(CheckError::MissingVertexCorner { vertex: *vertex });
        }
    }
    Ok(())
}

/// Boundary elements were built from exactly the free corners
pub fn check_boundary_sources<M: HasBoundary>(mesh: &M) -> Result<(), CheckError> {
    let (Some(sources), Some(opposites)) = (mesh.boundary_sources(), mesh.opposites()) else {
        return Ok(());
    };
    let sources: HashSet<CornerId> = sources.iter().copied().collect();
    for corner in &sources {
        if !opposites.is_free(*corner) {
            return Err(CheckError::StaleBoundaryElement { corner: *corner });
        }
    }
    for corner in opposites.free_corners() {
        if mesh.corner_vertex(corner).is_some() && !sources.contains(&corner) {
            return Err(CheckError::MissingBoundaryElement { corner });
        }
    }
    Ok(())
}
