/// Corners (half-edges) per triangle.
pub const TRIANGLE_CORNERS: usize = 3;

/// Corners (half-faces) per tetrahedron.
pub const TETRA_CORNERS: usize = 4;

/// Normals shorter than this are left unnormalized.
pub const NORMAL_EPSILON: f64 = f64::EPSILON;
