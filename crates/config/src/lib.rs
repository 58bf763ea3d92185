//! Shared configuration for compact mesh construction
//!
//! This crate is the single source of truth for how a mesh is built:
//! which topological level to reach, how non-manifold input is treated,
//! how far orientation is propagated and how geometry is normalised.

use serde::{Deserialize, Serialize};

/// Default extent divisor used when legalizing a model
///
/// The longest bounding-box axis ends up with this length.
pub const DEFAULT_TARGET_EXTENT: f64 = 1.5;

/// Legalize geometry by default
pub const DEFAULT_LEGALIZE: bool = true;

/// Compute vertex normals by default
pub const DEFAULT_COMPUTE_NORMALS: bool = true;

/// Topological level a mesh is built up to
///
/// Levels are cumulative: each one requires every level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildLevel {
    /// Level 0: corner to vertex table only, queries scan
    Raw = 0,
    /// Level 1: opposite table, orientation and connected components
    Adjacency = 1,
    /// Level 2: vertex to corner index and edge/face maps
    VertexIndex = 2,
    /// Level 3: boundary sub-mesh extraction
    #[default]
    Boundary = 3,
}

impl BuildLevel {
    /// All levels in build order
    pub const ALL: [BuildLevel; 4] = [
        BuildLevel::Raw,
        BuildLevel::Adjacency,
        BuildLevel::VertexIndex,
        BuildLevel::Boundary,
    ];

    /// Numeric level (0..=3)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The level this one is built on, if any
    pub fn prerequisite(self) -> Option<BuildLevel> {
        match self {
            BuildLevel::Raw => None,
            BuildLevel::Adjacency => Some(BuildLevel::Raw),
            BuildLevel::VertexIndex => Some(BuildLevel::Adjacency),
            BuildLevel::Boundary => Some(BuildLevel::VertexIndex),
        }
    }
}

/// What to do when more than two corners share one edge/face key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonManifoldPolicy {
    /// Link corners two at a time in visiting order and warn
    #[default]
    PairInOrder,
    /// Fail construction on the first over-shared key
    Reject,
}

/// Which elements `orient` uses as propagation seeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationScope {
    /// Seed from element 0 only; other components keep their input winding
    #[default]
    SeedElement,
    /// Seed every component that is still unvisited
    EveryComponent,
}

/// Geometry normalisation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegalizeConfig {
    /// Recenter and rescale positions after loading
    pub enabled: bool,
    /// Length of the longest bounding-box axis after legalizing
    pub target_extent: f64,
}

impl Default for LegalizeConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_LEGALIZE,
            target_extent: DEFAULT_TARGET_EXTENT,
        }
    }
}

/// Mesh build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Highest level to build
    pub level: BuildLevel,
    /// Handling of edges/faces shared by more than two corners
    pub non_manifold: NonManifoldPolicy,
    /// Orientation propagation seeds
    pub orientation: OrientationScope,
    /// Geometry normalisation
    pub legalize: LegalizeConfig,
    /// Compute vertex normals after building
    pub compute_normals: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            level: BuildLevel::default(),
            non_manifold: NonManifoldPolicy::default(),
            orientation: OrientationScope::default(),
            legalize: LegalizeConfig::default(),
            compute_normals: DEFAULT_COMPUTE_NORMALS,
        }
    }
}

impl BuildConfig {
    /// Create a config that builds up to the given level with defaults otherwise
    pub fn with_level(level: BuildLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Keep positions exactly as loaded
    pub fn without_legalize(mut self) -> Self {
        self.legalize.enabled = false;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this config as pretty JSON
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
