//! Error types for quadrille.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three vertices.
    #[error("face {face} has only {count} vertices")]
    FaceTooSmall {
        /// The face index.
        face: usize,
        /// The number of vertices in the face cycle.
        count: usize,
    },

    /// A face cycle visits the same vertex more than once.
    #[error("face {face} visits vertex {vertex} more than once")]
    DuplicateVertexInFace {
        /// The face index.
        face: usize,
        /// The repeated vertex index.
        vertex: usize,
    },

    /// An operation that requires an all-quad mesh was called on a mesh
    /// with non-quad faces.
    #[error("operation requires a quad mesh")]
    NotAQuadMesh,

    /// The requested edge does not exist in the mesh.
    #[error("edge ({u}, {v}) does not exist")]
    EdgeNotFound {
        /// First vertex of the edge.
        u: usize,
        /// Second vertex of the edge.
        v: usize,
    },

    /// An interior edge was required but the edge lies on the boundary.
    #[error("edge ({u}, {v}) is on the boundary")]
    BoundaryEdge {
        /// First vertex of the edge.
        u: usize,
        /// Second vertex of the edge.
        v: usize,
    },

    /// A traversal that requires regular vertices ran into a singularity.
    #[error("vertex {vertex} is singular")]
    SingularVertex {
        /// The singular vertex.
        vertex: usize,
    },

    /// Two consecutive path vertices are not connected by a mesh edge.
    #[error("path vertices {u} and {v} are not connected")]
    DisconnectedPath {
        /// First vertex of the missing edge.
        u: usize,
        /// Second vertex of the missing edge.
        v: usize,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
