//! Type definitions shared by the surface and volume meshes.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Type-safe vertex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Type-safe corner identifier
///
/// A corner is an (element, local slot) pair flattened to `element * k + slot`,
/// a half-edge for triangles (k = 3) and a half-face for tetrahedra (k = 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CornerId(pub u32);

/// Type-safe element (triangle or tetrahedron) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Dense connected component label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl CornerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl ElementId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl ComponentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A vertex record in the geometry store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: DVec3,
    /// Accumulated normal, zero until normals are computed
    pub normal: DVec3,
    /// Scalar field value
    pub field: f64,
}

impl Vertex {
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            normal: DVec3::ZERO,
            field: 0.0,
        }
    }
}

/// Vertex layout handed to rendering consumers (GPU-compatible with bytemuck)
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub field: f32,
    /// Padding to 32 bytes
    pub _padding: f32,
}

impl From<&Vertex> for GpuVertex {
    fn from(vertex: &Vertex) -> Self {
        Self {
            position: vertex.position.as_vec3().to_array(),
            normal: vertex.normal.as_vec3().to_array(),
            field: vertex.field as f32,
            _padding: 0.0,
        }
    }
}
