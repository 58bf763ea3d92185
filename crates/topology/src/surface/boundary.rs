//! Boundary curve extraction for SurfaceMesh (level 3).
//!
//! Every free half-edge becomes a boundary segment. Segments are chained by
//! rotating around their end vertex until the next free half-edge, and each
//! chain is one boundary curve.

use compact_mesh_config::BuildLevel;

use super::{SurfaceMesh, next};
use crate::components::ComponentLabels;
use crate::error::{MeshError, QueryError};
use crate::opposite::OppositeTable;
use crate::traits::HasOpposite;
use crate::types::{ComponentId, CornerId, VertexId};

/// Boundary segments and curves of a triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryCurves {
    /// Free corners, in index order
    segments: Vec<CornerId>,
    /// Segment index of each corner, `None` for paired corners
    segment_of_corner: Vec<Option<u32>>,
    /// Following segment along the curve
    next_segment: Vec<Option<u32>>,
    /// Curve of each segment
    curve_of_segment: Vec<ComponentId>,
    /// First segment found on each curve
    curve_starts: Vec<CornerId>,
    /// Boundary component of each rim vertex
    vertex_labels: ComponentLabels,
}

impl BoundaryCurves {
    /// Free corners the segments were built from
    pub fn segments(&self) -> &[CornerId] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of boundary curves
    pub fn curve_count(&self) -> usize {
        self.curve_starts.len()
    }

    /// Representative corner of a curve
    pub fn curve_start(&self, curve: ComponentId) -> Option<CornerId> {
        self.curve_starts.get(curve.index()).copied()
    }

    /// Curve containing the free corner `corner`
    pub fn curve_of_corner(&self, corner: CornerId) -> Option<ComponentId> {
        let segment = self.segment_of_corner.get(corner.index()).copied().flatten()?;
        self.curve_of_segment.get(segment as usize).copied()
    }

    /// Next free corner along the boundary
    pub fn next_corner(&self, corner: CornerId) -> Option<CornerId> {
        let segment = self.segment_of_corner.get(corner.index()).copied().flatten()?;
        let following = self.next_segment.get(segment as usize).copied().flatten()?;
        self.segments.get(following as usize).copied()
    }

    /// Boundary component of a rim vertex
    pub fn vertex_component(&self, vertex: VertexId) -> Option<ComponentId> {
        self.vertex_labels.get(vertex)
    }

    /// Number of boundary components by vertex connectivity
    ///
    /// Differs from `curve_count` only when curves touch at a pinched vertex.
    pub fn vertex_component_count(&self) -> usize {
        self.vertex_labels.count()
    }
}

impl SurfaceMesh {
    /// Level 3: boundary segments, curves and rim vertex labels
    pub fn build_boundary(&mut self) -> Result<(), MeshError> {
        if self.index.is_none() {
            return Err(MeshError::MissingLevel {
                required: BuildLevel::VertexIndex,
                operation: "build_boundary",
            });
        }
        let opposites = self.opposites().ok_or(MeshError::MissingLevel {
            required: BuildLevel::Adjacency,
            operation: "build_boundary",
        })?;

        let segments: Vec<CornerId> = opposites
            .free_corners()
            .filter(|&c| self.corner_edge(c).is_some())
            .collect();
        let mut segment_of_corner = vec![None; self.corners.len()];
        for (i, corner) in segments.iter().enumerate() {
            segment_of_corner[corner.index()] = Some(i as u32);
        }

        let next_segment: Vec<Option<u32>> = segments
            .iter()
            .map(|&c| rim_successor(opposites, c).and_then(|n| segment_of_corner[n.index()]))
            .collect();

        let mut curve_of_segment: Vec<Option<ComponentId>> = vec![None; segments.len()];
        let mut curve_starts = Vec::new();
        for start in 0..segments.len() {
            if curve_of_segment[start].is_some() {
                continue;
            }
            let curve = ComponentId(curve_starts.len() as u32);
            curve_starts.push(segments[start]);
            let mut current = start;
            loop {
                curve_of_segment[current] = Some(curve);
                match next_segment[current] {
                    Some(n) if curve_of_segment[n as usize].is_none() => current = n as usize,
                    _ => break,
                }
            }
        }

        let mut on_rim = vec![false; self.geometry.len()];
        let edges: Vec<[VertexId; 2]> = segments
            .iter()
            .filter_map(|&c| self.corner_edge(c))
            .map(|(a, b)| [a, b])
            .collect();
        for v in edges.iter().flatten() {
            if let Some(flag) = on_rim.get_mut(v.index()) {
                *flag = true;
            }
        }
        let vertex_labels = ComponentLabels::label(self.geometry.len(), |v| on_rim[v.index()], &edges);

        tracing::debug!(
            "build_boundary: {} segments on {} curves",
            segments.len(),
            curve_starts.len()
        );

        self.boundary = Some(BoundaryCurves {
            segments,
            segment_of_corner,
            next_segment,
            curve_of_segment: curve_of_segment.into_iter().flatten().collect(),
            curve_starts,
            vertex_labels,
        });
        Ok(())
    }

    /// All free corners of one curve, in walking order
    pub fn curve_corners(&self, curve: ComponentId) -> Result<Vec<CornerId>, QueryError> {
        let boundary = self
            .boundary
            .as_ref()
            .ok_or(QueryError::MissingLevel(BuildLevel::Boundary))?;
        let Some(start) = boundary.curve_start(curve) else {
            tracing::warn!("SurfaceMesh: no boundary curve {:?}", curve);
            return Ok(Vec::new());
        };

        let mut corners = vec![start];
        let mut current = start;
        while let Some(following) = boundary.next_corner(current) {
            if following == start || corners.len() > boundary.segment_count() {
                break;
            }
            corners.push(following);
            current = following;
        }
        Ok(corners)
    }
}

/// Next free half-edge after `corner`, found by rotating around its end vertex
fn rim_successor(opposites: &OppositeTable, corner: CornerId) -> Option<CornerId> {
    let mut h = next(corner);
    for _ in 0..opposites.len() {
        match opposites.get(h) {
            Some(o) => h = next(o),
            None => return Some(h),
        }
    }
    None
}
