//! Compact half-edge / half-face mesh topology
//!
//! This crate provides array-based topology for triangle and tetrahedral meshes:
//! - [`surface::SurfaceMesh`] - Compact half-edge structure over triangles
//! - [`volume::VolumeMesh`] - Compact half-face structure over tetrahedra
//! - [`geometry`] - Vertex store, bounding box, legalization, scalar fields
//! - [`opposite`] - Opposite tables built by hashing canonical vertex keys
//! - [`components`] - Union-find connected component labeling
//! - [`traits`] - Capability traits for the staged topology levels
//! - [`exchange`] - Minimal vertex/index exchange with mesh loaders
//!
//! Both mesh kinds are built in cumulative levels: raw connectivity (L0),
//! opposites with orientation and components (L1), vertex and edge/face
//! indices (L2) and boundary extraction (L3). Queries use the highest level
//! available and fall back to linear scans.

pub mod components;
pub mod constants;
pub mod error;
pub mod exchange;
pub mod geometry;
pub mod opposite;
pub mod surface;
pub mod traits;
pub mod types;
pub mod validation;
pub mod volume;

#[cfg(test)]
pub(crate) mod fixtures;

pub use compact_mesh_config::{
    BuildConfig, BuildLevel, LegalizeConfig, NonManifoldPolicy, OrientationScope,
};
pub use components::ComponentLabels;
pub use error::{CheckError, MeshError, QueryError};
pub use exchange::{MeshData, MeshSink, MeshSource};
pub use geometry::{Aabb, Geometry, ScalarField};
pub use opposite::OppositeTable;
pub use surface::SurfaceMesh;
pub use traits::{CornerMesh, HasBoundary, HasOpposite, HasVertexIndex};
pub use types::{ComponentId, CornerId, ElementId, GpuVertex, Vertex, VertexId};
pub use volume::{HalfEdge, VolumeMesh};
