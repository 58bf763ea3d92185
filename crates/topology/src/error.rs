//! Error types for construction, queries and structural checks.

use compact_mesh_config::BuildLevel;

use crate::types::{ComponentId, CornerId, ElementId, VertexId};

/// Errors that can occur while building a mesh
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Index count {count} is not a multiple of {arity}")]
    IndexCount { count: usize, arity: usize },
    #[error("Element {element} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        element: usize,
        vertex: u32,
        vertex_count: usize,
    },
    #[error("Key {key} is shared by more than two corners (third sighting at {corner:?})")]
    NonManifold { key: String, corner: CornerId },
    #[error("{operation} needs level {required:?} to be built first")]
    MissingLevel {
        required: BuildLevel,
        operation: &'static str,
    },
    #[error("Mesh loader failed: {0}")]
    Loader(String),
}

/// Errors returned by topology queries for invalid arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid vertex {0:?}")]
    InvalidVertex(VertexId),
    #[error("Invalid corner {0:?}")]
    InvalidCorner(CornerId),
    #[error("Invalid element {0:?}")]
    InvalidElement(ElementId),
    #[error("Vertices {0:?} and {1:?} do not span an edge")]
    NotAnEdge(VertexId, VertexId),
    #[error("Vertices {0:?} do not span a face")]
    NotAFace([VertexId; 3]),
    #[error("Query needs level {0:?}")]
    MissingLevel(BuildLevel),
}

/// First structural violation found by `check()`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("Table {table} has {actual} entries, expected {expected}")]
    SizeMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Corner {corner:?} references invalid vertex {vertex:?}")]
    VertexOutOfRange { corner: CornerId, vertex: VertexId },
    #[error("Corner {corner:?} references invalidated vertex {vertex:?}")]
    InvalidatedVertex { corner: CornerId, vertex: VertexId },
    #[error("Corner {corner:?} has opposite {opposite:?} outside the corner range")]
    OppositeOutOfRange { corner: CornerId, opposite: CornerId },
    #[error("Opposite of {corner:?} is {opposite:?}, whose opposite is {back:?}")]
    BrokenInvolution {
        corner: CornerId,
        opposite: CornerId,
        back: Option<CornerId>,
    },
    #[error("Elements {first:?} and {second:?} are not consistently oriented")]
    InconsistentOrientation { first: ElementId, second: ElementId },
    #[error("Vertex {vertex:?} has component {component:?}, but there are {count} components")]
    ComponentOutOfRange {
        vertex: VertexId,
        component: ComponentId,
        count: usize,
    },
    #[error("Element {element:?} spans components {first:?} and {second:?}")]
    SplitComponent {
        element: ElementId,
        first: Option<ComponentId>,
        second: Option<ComponentId>,
    },
    #[error("Vertex {vertex:?} is used but has no representative corner")]
    MissingVertexCorner { vertex: VertexId },
    #[error("Vertex {vertex:?} maps to corner {corner:?}, which does not touch it")]
    VertexCornerMismatch { vertex: VertexId, corner: CornerId },
    #[error("Edge map entry ({a:?}, {b:?}) resolves to corner {corner:?} on another edge")]
    EdgeMapMismatch {
        a: VertexId,
        b: VertexId,
        corner: CornerId,
    },
    #[error("Face map entry {key:?} resolves to corner {corner:?} on another face")]
    FaceMapMismatch { key: [VertexId; 3], corner: CornerId },
    #[error("Free corner {corner:?} has no boundary element")]
    MissingBoundaryElement { corner: CornerId },
    #[error("Boundary element built from corner {corner:?}, which has an opposite")]
    StaleBoundaryElement { corner: CornerId },
    #[error("Boundary corner {corner:?} has opposite {opposite:?}, whose opposite is {back:?}")]
    BoundaryInvolution {
        corner: CornerId,
        opposite: CornerId,
        back: Option<CornerId>,
    },
    #[error("Boundary corners {first:?} and {second:?} are not consistently oriented")]
    BoundaryOrientation { first: CornerId, second: CornerId },
    #[error("Boundary corner {corner:?} references invalid vertex {vertex:?}")]
    BoundaryVertexOutOfRange { corner: CornerId, vertex: VertexId },
    #[error("Boundary vertex {vertex:?} has label {component:?}, but there are {count} boundary components")]
    BoundaryComponentOutOfRange {
        vertex: VertexId,
        component: ComponentId,
        count: usize,
    },
    #[error("Boundary segment {corner:?} is followed by {next:?}, which does not start at its end")]
    BrokenCurve { corner: CornerId, next: CornerId },
}
