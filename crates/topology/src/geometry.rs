//! Geometry store shared by surface and volume meshes.
//!
//! Vertex slots are `Option<Vertex>`: an invalidated slot stays in place so
//! that vertex indices remain dense.

use compact_mesh_config::LegalizeConfig;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::constants::NORMAL_EPSILON;
use crate::types::{GpuVertex, Vertex, VertexId};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }

    /// Length of the longest axis
    pub fn max_extent(&self) -> f64 {
        self.extent().max_element()
    }
}

/// Per-vertex scalar function `evaluate(x, y, z) -> value`
pub trait ScalarField {
    fn evaluate(&self, x: f64, y: f64, z: f64) -> f64;
}

impl<F> ScalarField for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn evaluate(&self, x: f64, y: f64, z: f64) -> f64 {
        self(x, y, z)
    }
}

/// Dense vertex array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    vertices: Vec<Option<Vertex>>,
}

impl Geometry {
    pub fn from_positions(positions: &[[f64; 3]]) -> Self {
        Self {
            vertices: positions
                .iter()
                .map(|p| Some(Vertex::new(DVec3::from_array(*p))))
                .collect(),
        }
    }

    /// Number of vertex slots, invalidated ones included
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get a valid vertex by ID
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a mutable valid vertex by ID
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn position(&self, id: VertexId) -> Option<DVec3> {
        self.vertex(id).map(|v| v.position)
    }

    /// In range and not invalidated
    pub fn is_valid(&self, id: VertexId) -> bool {
        self.vertex(id).is_some()
    }

    /// Mark a vertex slot as invalid. Returns false if it already was.
    pub fn invalidate(&mut self, id: VertexId) -> bool {
        match self.vertices.get_mut(id.index()) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    /// Iterate over valid vertices
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VertexId::from_index(i), v)))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
        self.vertices.iter_mut().flatten()
    }

    // ========================================================================
    // Bounding box
    // ========================================================================

    /// Bounding box of all valid vertices
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut positions = self.iter().map(|(_, v)| v.position);
        let first = positions.next()?;
        let (min, max) = positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Aabb { min, max })
    }

    /// Recenter the model at the origin and scale it uniformly.
    ///
    /// The longest axis ends up with length `config.target_extent`. When the
    /// model has zero extent it is only translated. Returns the new box.
    pub fn legalize(&mut self, config: &LegalizeConfig) -> Option<Aabb> {
        let bbox = self.bounding_box()?;
        let center = bbox.center();
        let size = if config.target_extent > 0.0 {
            bbox.max_extent() / config.target_extent
        } else {
            0.0
        };

        for vertex in self.iter_mut() {
            vertex.position -= center;
            if size != 0.0 {
                vertex.position /= size;
            }
        }

        let legalized = self.bounding_box();
        tracing::debug!(
            "legalize: center {:?}, scale 1/{}, new box {:?}",
            center,
            size,
            legalized
        );
        legalized
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Evaluate a scalar field at every valid vertex
    pub fn apply_scalar_field(&mut self, field: &impl ScalarField) {
        for vertex in self.iter_mut() {
            let p = vertex.position;
            vertex.field = field.evaluate(p.x, p.y, p.z);
        }
    }

    /// Minimum and maximum scalar field value
    pub fn field_range(&self) -> Option<(f64, f64)> {
        let mut fields = self.iter().map(|(_, v)| v.field);
        let first = fields.next()?;
        Some(fields.fold((first, first), |(lo, hi), f| (lo.min(f), hi.max(f))))
    }

    pub fn reset_normals(&mut self) {
        for vertex in self.iter_mut() {
            vertex.normal = DVec3::ZERO;
        }
    }

    pub(crate) fn accumulate_normal(&mut self, id: VertexId, normal: DVec3) {
        if let Some(vertex) = self.vertex_mut(id) {
            vertex.normal += normal;
        }
    }

    /// Normalize accumulated normals, leaving near-zero ones untouched
    pub fn normalize_normals(&mut self) {
        for vertex in self.iter_mut() {
            let length = vertex.normal.length();
            if length > NORMAL_EPSILON {
                vertex.normal /= length;
            }
        }
    }

    /// Unnormalized normal of the triangle `(a, b, c)`
    pub(crate) fn triangle_normal(&self, [a, b, c]: [VertexId; 3]) -> Option<DVec3> {
        let p0 = self.position(a)?;
        let p1 = self.position(b)?;
        let p2 = self.position(c)?;
        Some((p1 - p0).cross(p2 - p0))
    }

    /// Snapshot for rendering; invalid slots become zeroed vertices
    pub fn to_gpu_vertices(&self) -> Vec<GpuVertex> {
        self.vertices
            .iter()
            .map(|v| v.as_ref().map(GpuVertex::from).unwrap_or_default())
            .collect()
    }

    /// Positions for export; invalid slots are written at the origin
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.vertices
            .iter()
            .map(|v| v.map(|v| v.position.to_array()).unwrap_or([0.0; 3]))
            .collect()
    }
}

/// Signed volume of the tetrahedron `(p0, p1, p2, p3)`
pub fn signed_tetra_volume(p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3) -> f64 {
    (p1 - p0).dot((p2 - p0).cross(p3 - p0)) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_geometry() -> Geometry {
        Geometry::from_positions(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 2.0, 1.0]])
    }

    #[test]
    fn test_bounding_box() {
        let geometry = create_test_geometry();
        let bbox = geometry.bounding_box().unwrap();
        assert_eq!(bbox.min, DVec3::ZERO);
        assert_eq!(bbox.max, DVec3::new(4.0, 2.0, 1.0));
        assert_eq!(bbox.max_extent(), 4.0);
    }

    #[test]
    fn test_bounding_box_skips_invalid() {
        let mut geometry = create_test_geometry();
        assert!(geometry.invalidate(VertexId(1)));
        assert!(!geometry.invalidate(VertexId(1)));
        let bbox = geometry.bounding_box().unwrap();
        assert_eq!(bbox.max, DVec3::new(0.0, 2.0, 1.0));
        assert!(Geometry::default().bounding_box().is_none());
    }

    #[test]
    fn test_legalize_centers_and_scales() {
        let mut geometry = create_test_geometry();
        let bbox = geometry.legalize(&LegalizeConfig::default()).unwrap();
        assert!(bbox.center().length() < 1e-12);
        assert!((bbox.max_extent() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_legalize_is_idempotent() {
        let mut geometry = create_test_geometry();
        geometry.legalize(&LegalizeConfig::default());
        let before = geometry.clone();
        geometry.legalize(&LegalizeConfig::default());

        for ((_, a), (_, b)) in before.iter().zip(geometry.iter()) {
            assert!((a.position - b.position).length() < 1e-12);
        }
    }

    #[test]
    fn test_legalize_single_point_only_translates() {
        let mut geometry = Geometry::from_positions(&[[3.0, -1.0, 2.0]]);
        let bbox = geometry.legalize(&LegalizeConfig::default()).unwrap();
        assert_eq!(bbox.min, DVec3::ZERO);
        assert_eq!(geometry.position(VertexId(0)), Some(DVec3::ZERO));
    }

    #[test]
    fn test_scalar_field() {
        let mut geometry = create_test_geometry();
        geometry.apply_scalar_field(&|x: f64, y: f64, z: f64| x + 10.0 * y + 100.0 * z);
        assert_eq!(geometry.vertex(VertexId(1)).unwrap().field, 4.0);
        assert_eq!(geometry.vertex(VertexId(2)).unwrap().field, 120.0);
        assert_eq!(geometry.field_range(), Some((0.0, 120.0)));
    }

    #[test]
    fn test_normalize_leaves_zero_normals() {
        let mut geometry = create_test_geometry();
        geometry.accumulate_normal(VertexId(0), DVec3::new(0.0, 0.0, 3.0));
        geometry.normalize_normals();
        assert_eq!(geometry.vertex(VertexId(0)).unwrap().normal, DVec3::Z);
        assert_eq!(geometry.vertex(VertexId(1)).unwrap().normal, DVec3::ZERO);
    }

    #[test]
    fn test_signed_tetra_volume() {
        let volume = signed_tetra_volume(DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z);
        assert!((volume - 1.0 / 6.0).abs() < 1e-12);
        let flipped = signed_tetra_volume(DVec3::ZERO, DVec3::Y, DVec3::X, DVec3::Z);
        assert!(flipped < 0.0);
    }
}
