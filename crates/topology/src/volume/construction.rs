//! Construction and build stages for VolumeMesh.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use compact_mesh_config::{BuildConfig, BuildLevel, NonManifoldPolicy, OrientationScope};

use super::{HalfEdge, VolumeIndex, VolumeMesh, face_corners, next_face};
use crate::components::ComponentLabels;
use crate::constants::TETRA_CORNERS;
use crate::error::{MeshError, QueryError};
use crate::exchange::{MeshData, MeshSink, MeshSource};
use crate::geometry::{Geometry, signed_tetra_volume};
use crate::opposite::{Adjacency, OppositeTable, pair_by_key, sorted_pair, sorted_triple};
use crate::traits::{CornerMesh, HasOpposite};
use crate::types::{CornerId, ElementId, VertexId};

impl VolumeMesh {
    /// Build a volume mesh from loader arrays
    ///
    /// Validates the arrays, optionally legalizes the geometry, builds
    /// every level up to `config.level` and optionally computes normals on
    /// the boundary.
    pub fn from_data(data: &MeshData, config: &BuildConfig) -> Result<Self, MeshError> {
        data.validate(TETRA_CORNERS)?;

        let corners = data.indices.iter().map(|&i| Some(VertexId(i))).collect();
        let mut mesh = Self::from_raw(Geometry::from_positions(&data.positions), corners);

        if config.legalize.enabled {
            mesh.geometry.legalize(&config.legalize);
        }
        mesh.build_to(config.level, config)?;
        if config.compute_normals {
            mesh.compute_normals();
        }

        tracing::debug!(
            "VolumeMesh::from_data: {} vertices, {} tetrahedra, level {:?}",
            mesh.vertex_count(),
            mesh.tetra_count(),
            mesh.level()
        );
        Ok(mesh)
    }

    /// Load through an external mesh loader
    pub fn load(source: &impl MeshSource, config: &BuildConfig) -> Result<Self, MeshError> {
        Self::from_data(&source.load()?, config)
    }

    /// Create a level 0 mesh from raw components.
    pub fn from_raw(geometry: Geometry, corners: Vec<Option<VertexId>>) -> Self {
        Self {
            geometry,
            corners,
            adjacency: None,
            index: None,
            boundary: None,
        }
    }

    /// Export positions and the current tetrahedra, skipping cleared ones
    pub fn to_mesh_data(&self) -> MeshData {
        let indices = self
            .corners
            .chunks_exact(TETRA_CORNERS)
            .filter_map(tetra_vertices)
            .flat_map(|t| t.map(|v| v.0))
            .collect();
        MeshData::new(self.geometry.positions(), indices)
    }

    /// Export the boundary triangles (level 3) as a surface
    pub fn boundary_mesh_data(&self) -> Option<MeshData> {
        let boundary = self.boundary.as_ref()?;
        let indices = boundary.triangles().flat_map(|t| t.map(|v| v.0)).collect();
        Some(MeshData::new(self.geometry.positions(), indices))
    }

    pub fn save(&self, sink: &mut impl MeshSink) -> Result<(), MeshError> {
        sink.save(&self.to_mesh_data())
    }

    // ========================================================================
    // Build Stages
    // ========================================================================

    /// Build every missing level up to `level`
    pub fn build_to(&mut self, level: BuildLevel, config: &BuildConfig) -> Result<(), MeshError> {
        if level >= BuildLevel::Adjacency && self.adjacency.is_none() {
            self.build_adjacency(config)?;
        }
        if level >= BuildLevel::VertexIndex && self.index.is_none() {
            self.build_vertex_index()?;
        }
        if level >= BuildLevel::Boundary && self.boundary.is_none() {
            self.build_boundary()?;
        }
        Ok(())
    }

    /// Level 1: face opposites, orientation and connected components
    pub fn build_adjacency(&mut self, config: &BuildConfig) -> Result<(), MeshError> {
        let opposites = self.compute_opposites(config.non_manifold)?;
        self.adjacency = Some(Adjacency {
            opposites,
            components: ComponentLabels::default(),
            non_manifold: config.non_manifold,
        });
        self.index = None;
        self.boundary = None;

        let flipped = self.orient(config.orientation)?;
        let components = self.compute_components();
        let count = components.count();
        if let Some(adjacency) = self.adjacency.as_mut() {
            adjacency.components = components;
        }

        tracing::debug!(
            "build_adjacency: {} free half-faces, {} tetrahedra flipped, {} components",
            self.opposites().map_or(0, OppositeTable::free_count),
            flipped,
            count
        );
        Ok(())
    }

    /// Pair half-faces spanning the same vertex triple
    pub fn compute_opposites(&self, policy: NonManifoldPolicy) -> Result<OppositeTable, MeshError> {
        pair_by_key(
            self.corners.len(),
            |h| self.face_vertices(h).map(sorted_triple),
            policy,
        )
    }

    pub fn compute_components(&self) -> ComponentLabels {
        ComponentLabels::label(
            self.geometry.len(),
            |v| self.geometry.is_valid(v),
            self.corners.chunks_exact(TETRA_CORNERS).filter_map(tetra_vertices),
        )
    }

    /// Make the seed tetrahedron positive and propagate its orientation
    /// across shared faces.
    ///
    /// With `OrientationScope::SeedElement` only the component of
    /// the first intact tetrahedron is touched. Returns the number of flipped tetrahedra.
    pub fn orient(&mut self, scope: OrientationScope) -> Result<usize, MeshError> {
        let Some(adjacency) = self.adjacency.as_mut() else {
            return Err(MeshError::MissingLevel {
                required: BuildLevel::Adjacency,
                operation: "orient",
            });
        };
        let opposites = &mut adjacency.opposites;
        let corners = &mut self.corners;
        let geometry = &self.geometry;

        let tetra_count = corners.len() / TETRA_CORNERS;
        let mut visited = vec![false; tetra_count];
        let mut stack: Vec<CornerId> = Vec::new();
        let mut flipped = 0;
        let mut seeded = false;

        for seed in 0..tetra_count {
            if visited[seed] {
                continue;
            }
            let base = seed * TETRA_CORNERS;
            if tetra_vertices(&corners[base..base + TETRA_CORNERS]).is_none() {
                visited[seed] = true;
                continue;
            }
            if seeded && scope == OrientationScope::SeedElement {
                break;
            }
            seeded = true;
            if tetra_volume(geometry, corners, seed).is_some_and(|v| v < 0.0) {
                flip_tetra(corners, Some(&mut *opposites), seed);
                flipped += 1;
            }
            visited[seed] = true;
            stack.extend(tetra_corners(seed));

            while let Some(h) = stack.pop() {
                let Some(o) = opposites.get(h) else {
                    continue;
                };
                let t = o.index() / TETRA_CORNERS;
                if visited[t] {
                    continue;
                }
                if !faces_reversed(corners, h, o) {
                    flip_tetra(corners, Some(&mut *opposites), t);
                    flipped += 1;
                }
                visited[t] = true;
                stack.extend(tetra_corners(t));
            }
        }

        let unvisited = visited.iter().filter(|v| !**v).count();
        if unvisited > 0 {
            tracing::debug!(
                "orient: {} tetrahedra outside the seeded component keep their orientation",
                unvisited
            );
        }
        if flipped > 0 {
            self.index = None;
            self.boundary = None;
        }
        Ok(flipped)
    }

    /// Whether half-face `c` and its opposite `t` run their shared
    /// triangle in reverse
    pub fn orient_check(&self, c: CornerId, t: CornerId) -> bool {
        faces_reversed(&self.corners, c, t)
    }

    /// Flip one tetrahedron by swapping its corners 1 and 2
    ///
    /// The half-faces opposite those corners trade places, so their
    /// opposites are swapped and re-pointed. Level 2 and 3 tables are dropped.
    pub fn change_orientation(&mut self, element: ElementId) -> Result<(), QueryError> {
        self.require_element(element)?;
        let opposites = self.adjacency.as_mut().map(|a| &mut a.opposites);
        flip_tetra(&mut self.corners, opposites, element.index());
        self.index = None;
        self.boundary = None;
        Ok(())
    }

    /// Level 2: vertex half-faces, the edge map and the face map
    ///
    /// Every table prefers free half-faces, so boundary vertices, edges and
    /// faces are represented on the boundary.
    pub fn build_vertex_index(&mut self) -> Result<(), MeshError> {
        let opposites = self.opposites().ok_or(MeshError::MissingLevel {
            required: BuildLevel::Adjacency,
            operation: "build_vertex_index",
        })?;

        let mut vertex_corners: Vec<Option<CornerId>> = vec![None; self.geometry.len()];
        let mut edges: HashMap<(VertexId, VertexId), HalfEdge> =
            HashMap::with_capacity(self.corners.len() * 3 / 2);
        let mut faces: HashMap<[VertexId; 3], CornerId> =
            HashMap::with_capacity(self.corners.len() / 2 + 1);

        for i in 0..self.corners.len() {
            let h = CornerId::from_index(i);
            let Some(face) = self.face_vertices(h) else {
                continue;
            };
            let free = opposites.is_free(h);

            for v in face {
                if let Some(slot) = vertex_corners.get_mut(v.index()) {
                    if slot.is_none_or(|current| free && !opposites.is_free(current)) {
                        *slot = Some(h);
                    }
                }
            }

            match faces.entry(sorted_triple(face)) {
                Entry::Vacant(entry) => {
                    entry.insert(h);
                }
                Entry::Occupied(mut entry) => {
                    if free && !opposites.is_free(*entry.get()) {
                        entry.insert(h);
                    }
                }
            }

            for (origin, v) in face_corners(h).into_iter().zip(face) {
                let Some(he) = HalfEdge::new(h, origin) else {
                    continue;
                };
                let Some(w) = self.corner_vertex(he.destination()) else {
                    continue;
                };
                match edges.entry(sorted_pair(v, w)) {
                    Entry::Vacant(entry) => {
                        entry.insert(he);
                    }
                    Entry::Occupied(mut entry) => {
                        if free && !opposites.is_free(entry.get().face()) {
                            entry.insert(he);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "build_vertex_index: {} edges, {} faces",
            edges.len(),
            faces.len()
        );

        self.index = Some(VolumeIndex {
            vertex_corners,
            edges,
            faces,
        });
        self.boundary = None;
        Ok(())
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Recompute area-weighted vertex normals from the boundary triangles
    ///
    /// Uses the extracted boundary (level 3) or the free half-faces (level
    /// 1). Interior vertices end up with zero normals. Returns the number of
    /// triangles used.
    pub fn compute_normals(&mut self) -> usize {
        let triangles: Vec<[VertexId; 3]> = match (&self.boundary, self.opposites()) {
            (Some(boundary), _) => boundary.triangles().collect(),
            (None, Some(opposites)) => opposites
                .free_corners()
                .filter_map(|h| self.face_vertices(h))
                .collect(),
            (None, None) => {
                tracing::debug!("compute_normals: no adjacency, boundary unknown");
                return 0;
            }
        };

        self.geometry.reset_normals();
        for &triangle in &triangles {
            let Some(normal) = self.geometry.triangle_normal(triangle) else {
                continue;
            };
            for v in triangle {
                self.geometry.accumulate_normal(v, normal);
            }
        }
        self.geometry.normalize_normals();
        triangles.len()
    }

    /// Mark a vertex slot invalid. Returns false if it already was.
    pub fn invalidate_vertex(&mut self, vertex: VertexId) -> bool {
        self.geometry.invalidate(vertex)
    }

    /// Clear the corners of a tetrahedron and drop all derived tables
    pub fn invalidate_element(&mut self, element: ElementId) -> Result<(), QueryError> {
        if element.index() >= self.tetra_count() {
            tracing::warn!("VolumeMesh: invalid tetrahedron {:?}", element);
            return Err(QueryError::InvalidElement(element));
        }
        for c in tetra_corners(element.index()) {
            self.corners[c.index()] = None;
        }
        self.adjacency = None;
        self.index = None;
        self.boundary = None;
        Ok(())
    }
}

pub(super) fn tetra_vertices(corners: &[Option<VertexId>]) -> Option<[VertexId; 4]> {
    Some([corners[0]?, corners[1]?, corners[2]?, corners[3]?])
}

pub(super) fn tetra_corners(t: usize) -> impl Iterator<Item = CornerId> {
    let base = t * TETRA_CORNERS;
    (base..base + TETRA_CORNERS).map(CornerId::from_index)
}

fn tetra_volume(geometry: &Geometry, corners: &[Option<VertexId>], t: usize) -> Option<f64> {
    let base = t * TETRA_CORNERS;
    let [a, b, c, d] = tetra_vertices(corners.get(base..base + TETRA_CORNERS)?)?;
    Some(signed_tetra_volume(
        geometry.position(a)?,
        geometry.position(b)?,
        geometry.position(c)?,
        geometry.position(d)?,
    ))
}

/// Compare the windings of half-face `c` and its opposite `t`.
///
/// Picks a vertex shared by both faces, then checks that its neighbours on
/// `c` appear swapped on `t`.
fn faces_reversed(corners: &[Option<VertexId>], c: CornerId, t: CornerId) -> bool {
    let v = |x: CornerId| corners.get(x.index()).copied().flatten();
    let hc = next_face(c);
    let Some(shared) = v(hc) else {
        return false;
    };
    let base = t.index() / TETRA_CORNERS;
    let Some(ht) = tetra_corners(base).find(|&x| x != t && v(x) == Some(shared)) else {
        return false;
    };
    let (Some(on_c), Some(on_t)) = (HalfEdge::new(c, hc), HalfEdge::new(t, ht)) else {
        return false;
    };
    v(on_c.next().origin()) == v(on_t.prev().origin())
        && v(on_c.prev().origin()) == v(on_t.next().origin())
}

/// Swap corners 1 and 2 of tetrahedron `t` and move their opposites along
fn flip_tetra(corners: &mut [Option<VertexId>], opposites: Option<&mut OppositeTable>, t: usize) {
    let base = t * TETRA_CORNERS;
    corners.swap(base + 1, base + 2);
    if let Some(opposites) = opposites {
        opposites.swap_mates(CornerId::from_index(base + 1), CornerId::from_index(base + 2));
    }
}
