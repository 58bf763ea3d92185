//! Construction and build stages for SurfaceMesh.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use compact_mesh_config::{BuildConfig, BuildLevel, NonManifoldPolicy, OrientationScope};

use super::{SurfaceIndex, SurfaceMesh, next, prev};
use crate::components::ComponentLabels;
use crate::constants::TRIANGLE_CORNERS;
use crate::error::{MeshError, QueryError};
use crate::exchange::{MeshData, MeshSink, MeshSource};
use crate::geometry::Geometry;
use crate::opposite::{Adjacency, OppositeTable, pair_by_key, sorted_pair};
use crate::traits::{CornerMesh, HasOpposite};
use crate::types::{CornerId, ElementId, VertexId};

impl SurfaceMesh {
    /// Build a surface mesh from loader arrays
    ///
    /// Validates the arrays, optionally legalizes the geometry, builds
    /// every level up to `config.level` and optionally computes normals.
    pub fn from_data(data: &MeshData, config: &BuildConfig) -> Result<Self, MeshError> {
        data.validate(TRIANGLE_CORNERS)?;

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
            "SurfaceMesh::from_data: {} vertices, {} triangles, level {:?}",
            mesh.vertex_count(),
            mesh.triangle_count(),
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

    /// Export positions and the current (possibly re-oriented) triangles
    ///
    /// Triangles with an invalidated corner are skipped.
    pub fn to_mesh_data(&self) -> MeshData {
        let indices = self
            .corners
            .chunks_exact(TRIANGLE_CORNERS)
            .filter_map(triangle_vertices)
            .flat_map(|t| t.map(|v| v.0))
            .collect();
        MeshData::new(self.geometry.positions(), indices)
    }

    /// Hand the exported arrays to an external saver
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

    /// Level 1: opposites, orientation and connected components
    ///
    /// Drops level 2 and 3 tables, since orientation may rewrite corners.
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
            "build_adjacency: {} free half-edges, {} triangles flipped, {} components",
            self.opposites().map_or(0, OppositeTable::free_count),
            flipped,
            count
        );
        Ok(())
    }

    /// Pair half-edges that share an undirected edge
    pub fn compute_opposites(&self, policy: NonManifoldPolicy) -> Result<OppositeTable, MeshError> {
        pair_by_key(
            self.corners.len(),
            |c| {
                let (a, b) = self.corner_edge(c)?;
                Some(sorted_pair(a, b))
            },
            policy,
        )
    }

    /// Label vertices by the triangles connecting them
    pub fn compute_components(&self) -> ComponentLabels {
        ComponentLabels::label(
            self.geometry.len(),
            |v| self.geometry.is_valid(v),
            self.corners
                .chunks_exact(TRIANGLE_CORNERS)
                .filter_map(triangle_vertices),
        )
    }

    /// Propagate the winding of seed triangles across shared edges.
    ///
    /// With `OrientationScope::SeedElement` only the component of the first
    /// intact triangle is made consistent; triangles in other components keep
    /// their input winding. Returns the number of flipped triangles.
    pub fn orient(&mut self, scope: OrientationScope) -> Result<usize, MeshError> {
        let Some(adjacency) = self.adjacency.as_mut() else {
            return Err(MeshError::MissingLevel {
                required: BuildLevel::Adjacency,
                operation: "orient",
            });
        };
        let opposites = &mut adjacency.opposites;
        let corners = &mut self.corners;

        let triangle_count = corners.len() / TRIANGLE_CORNERS;
        let mut visited = vec![false; triangle_count];
        let mut stack: Vec<CornerId> = Vec::new();
        let mut flipped = 0;
        let mut seeded = false;

        for seed in 0..triangle_count {
            if visited[seed] {
                continue;
            }
            let base = seed * TRIANGLE_CORNERS;
            if triangle_vertices(&corners[base..base + TRIANGLE_CORNERS]).is_none() {
                visited[seed] = true;
                continue;
            }
            if seeded && scope == OrientationScope::SeedElement {
                break;
            }
            seeded = true;
            visited[seed] = true;
            stack.extend(triangle_corners(seed));

            while let Some(h) = stack.pop() {
                let Some(o) = opposites.get(h) else {
                    continue;
                };
                let t = o.index() / TRIANGLE_CORNERS;
                if visited[t] {
                    continue;
                }
                if !edges_reversed(corners, h, o) {
                    flip_triangle(corners, Some(&mut *opposites), t);
                    flipped += 1;
                }
                visited[t] = true;
                stack.extend(triangle_corners(t));
            }
        }

        let unvisited = visited.iter().filter(|v| !**v).count();
        if unvisited > 0 {
            tracing::debug!(
                "orient: {} triangles outside the seeded component keep their winding",
                unvisited
            );
        }
        if flipped > 0 {
            self.index = None;
            self.boundary = None;
        }
        Ok(flipped)
    }

    /// Whether the edges of `h` and its opposite `o` run in reverse
    pub fn orient_check(&self, h: CornerId, o: CornerId) -> bool {
        edges_reversed(&self.corners, h, o)
    }

    /// Flip the winding of one triangle
    ///
    /// Swaps its first two vertices and re-links the opposites of the two
    /// edges that trade places. Level 2 and 3 tables are dropped.
    pub fn change_orientation(&mut self, element: ElementId) -> Result<(), QueryError> {
        self.require_element(element)?;
        let opposites = self.adjacency.as_mut().map(|a| &mut a.opposites);
        flip_triangle(&mut self.corners, opposites, element.index());
        self.index = None;
        self.boundary = None;
        Ok(())
    }

    /// Level 2: vertex fan starts and the edge map
    pub fn build_vertex_index(&mut self) -> Result<(), MeshError> {
        let opposites = self.opposites().ok_or(MeshError::MissingLevel {
            required: BuildLevel::Adjacency,
            operation: "build_vertex_index",
        })?;

        let mut vertex_corners: Vec<Option<CornerId>> = vec![None; self.geometry.len()];
        let mut edges = HashMap::with_capacity(self.corners.len() / 2);

        for i in 0..self.corners.len() {
            let corner = CornerId::from_index(i);
            let Some((a, b)) = self.corner_edge(corner) else {
                continue;
            };

            // Prefer the corner whose incoming edge is free so the one-ring
            // walk starts at the rim.
            if let Some(slot) = vertex_corners.get_mut(a.index()) {
                let replace = match *slot {
                    None => true,
                    Some(current) => {
                        opposites.is_free(prev(corner)) && !opposites.is_free(prev(current))
                    }
                };
                if replace {
                    *slot = Some(corner);
                }
            }

            match edges.entry(sorted_pair(a, b)) {
                Entry::Vacant(entry) => {
                    entry.insert(corner);
                }
                Entry::Occupied(mut entry) => {
                    if opposites.is_free(corner) && !opposites.is_free(*entry.get()) {
                        entry.insert(corner);
                    }
                }
            }
        }

        let rim = vertex_corners
            .iter()
            .flatten()
            .filter(|c| opposites.is_free(prev(**c)))
            .count();
        tracing::debug!(
            "build_vertex_index: {} rim vertices, {} edges",
            rim,
            edges.len()
        );

        self.index = Some(SurfaceIndex {
            vertex_corners,
            edges,
        });
        self.boundary = None;
        Ok(())
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Recompute area-weighted vertex normals from all triangles
    pub fn compute_normals(&mut self) {
        self.geometry.reset_normals();
        for t in self.corners.chunks_exact(TRIANGLE_CORNERS) {
            let Some(triangle) = triangle_vertices(t) else {
                continue;
            };
            let Some(normal) = self.geometry.triangle_normal(triangle) else {
                continue;
            };
            for v in triangle {
                self.geometry.accumulate_normal(v, normal);
            }
        }
        self.geometry.normalize_normals();
    }

    /// Mark a vertex slot invalid. Returns false if it already was.
    pub fn invalidate_vertex(&mut self, vertex: VertexId) -> bool {
        self.geometry.invalidate(vertex)
    }

    /// Clear the corners of a triangle and drop all derived tables
    pub fn invalidate_element(&mut self, element: ElementId) -> Result<(), QueryError> {
        if element.index() >= self.triangle_count() {
            tracing::warn!("SurfaceMesh: invalid triangle {:?}", element);
            return Err(QueryError::InvalidElement(element));
        }
        for c in triangle_corners(element.index()) {
            self.corners[c.index()] = None;
        }
        self.adjacency = None;
        self.index = None;
        self.boundary = None;
        Ok(())
    }
}

/// Vertices of a corner chunk if none is cleared
pub(super) fn triangle_vertices(corners: &[Option<VertexId>]) -> Option<[VertexId; 3]> {
    Some([corners[0]?, corners[1]?, corners[2]?])
}

pub(super) fn triangle_corners(t: usize) -> impl Iterator<Item = CornerId> {
    let base = t * TRIANGLE_CORNERS;
    (base..base + TRIANGLE_CORNERS).map(CornerId::from_index)
}

fn edges_reversed(corners: &[Option<VertexId>], h: CornerId, o: CornerId) -> bool {
    let v = |c: CornerId| corners.get(c.index()).copied().flatten();
    v(h) == v(next(o)) && v(next(h)) == v(o)
}

/// Swap the first two vertices of triangle `t`.
///
/// Edge 0 keeps its vertex pair; the edges of corners 1 and 2 trade places,
/// so their opposites are swapped and re-pointed.
fn flip_triangle(corners: &mut [Option<VertexId>], opposites: Option<&mut OppositeTable>, t: usize) {
    let base = t * TRIANGLE_CORNERS;
    corners.swap(base, base + 1);
    if let Some(opposites) = opposites {
        opposites.swap_mates(CornerId::from_index(base + 1), CornerId::from_index(base + 2));
    }
}
