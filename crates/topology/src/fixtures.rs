//! Small meshes shared by the unit tests.

use crate::exchange::MeshData;

/// Two triangles `(v0, v1, v2)` and `(v1, v0, v3)` sharing edge `v0-v1`
pub fn two_triangles() -> MeshData {
    MeshData::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.5, 1.0, 0.0],
            [0.5, -1.0, 0.0],
        ],
        vec![0, 1, 2, 1, 0, 3],
    )
}

/// Two triangles with no shared vertex
pub fn disjoint_triangles() -> MeshData {
    MeshData::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [5.0, 0.0, 0.0],
            [6.0, 0.0, 0.0],
            [5.0, 1.0, 0.0],
        ],
        vec![0, 1, 2, 3, 4, 5],
    )
}

/// Closed octahedron with outward winding
pub fn octahedron() -> MeshData {
    MeshData::new(
        vec![
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        vec![
            0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4, //
            2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5,
        ],
    )
}

/// Open fan of three triangles around vertex 0
pub fn open_fan() -> MeshData {
    MeshData::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
        ],
        vec![0, 1, 2, 0, 2, 3, 0, 3, 4],
    )
}

/// Unit tetrahedron as a single element
pub fn single_tetra() -> MeshData {
    MeshData::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        vec![0, 1, 2, 3],
    )
}

/// Two tetrahedra sharing the face `{1, 2, 3}`
pub fn two_tetras() -> MeshData {
    MeshData::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ],
        vec![0, 1, 2, 3, 1, 2, 3, 4],
    )
}

/// Tetrahedra around the axis from vertex 0 to vertex 1
///
/// With `count == 4` the ring around edge `0-1` is closed; fewer leaves it open.
pub fn axis_ring(count: usize) -> MeshData {
    let positions = vec![
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
    ];
    let mut indices = Vec::new();
    for i in 0..count.min(4) as u32 {
        // Alternate the input winding so orientation has work to do.
        let (p, q) = (2 + i, 2 + (i + 1) % 4);
        if i % 2 == 0 {
            indices.extend([0, 1, p, q]);
        } else {
            indices.extend([1, 0, p, q]);
        }
    }
    MeshData::new(positions, indices)
}
