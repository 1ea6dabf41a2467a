//! Error types for the mesh kernel.

use thiserror::Error;

/// Errors raised when building meshes.
///
/// Geometric queries never fail: empty or degenerate results are reported
/// through `Option` or empty collections instead.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but the mesh has {count} vertices")]
    IndexOutOfRange {
        /// Offending triangle.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// Primitive parameters cannot produce a solid.
    #[error("invalid primitive: {0}")]
    InvalidPrimitive(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
