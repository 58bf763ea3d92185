//! Minimal vertex-list / index-list exchange with mesh loaders and savers.

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Raw mesh arrays as produced by a loader
///
/// `indices` holds `k` vertex indices per element (3 for triangles,
/// 4 for tetrahedra). Element vertex order defines the initial winding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Validate arity and vertex range for elements of `arity` corners
    pub fn validate(&self, arity: usize) -> Result<(), MeshError> {
        if self.indices.len() % arity != 0 {
            return Err(MeshError::IndexCount {
                count: self.indices.len(),
                arity,
            });
        }
        let vertex_count = self.positions.len();
        if let Some((i, &vertex)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &v)| v as usize >= vertex_count)
        {
            return Err(MeshError::VertexOutOfRange {
                element: i / arity,
                vertex,
                vertex_count,
            });
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, MeshError> {
        serde_json::from_str(json).map_err(|e| MeshError::Loader(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, MeshError> {
        serde_json::to_string(self).map_err(|e| MeshError::Loader(e.to_string()))
    }
}

/// External mesh loader
pub trait MeshSource {
    fn load(&self) -> Result<MeshData, MeshError>;
}

/// External mesh saver
pub trait MeshSink {
    fn save(&mut self, data: &MeshData) -> Result<(), MeshError>;
}

impl MeshSource for MeshData {
    fn load(&self) -> Result<MeshData, MeshError> {
        Ok(self.clone())
    }
}

impl MeshSink for Vec<MeshData> {
    fn save(&mut self, data: &MeshData) -> Result<(), MeshError> {
        self.push(data.clone());
        Ok(())
    }
}
