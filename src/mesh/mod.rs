//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and related types
//! for representing and manipulating quad-dominant meshes.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which stores faces as vertex cycles
//! and adjacency as a map from directed vertex pairs to the face on their
//! left. This representation keeps adjacency queries cheap while iterating
//! edges and neighbors in a deterministic order.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`FaceId`] - Identifies a face
//! - [`StripId`] - Identifies a face strip
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`]
//! trait), allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! Meshes are typically constructed from face-vertex lists or from polyline
//! networks:
//!
//! ```
//! use quadrille::mesh::{build_from_quads, HalfEdgeMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//! ```

mod builder;
mod halfedge;
mod index;
mod weld;

pub use builder::{
    build_from_faces, build_from_lines, build_from_polylines, build_from_quads,
    to_keyed_vertices_and_faces, to_vertices_and_faces,
};
pub use halfedge::{Face, HalfEdgeMesh, Vertex};
pub use index::{FaceId, MeshIndex, StripId, VertexId};
pub use weld::{geometric_key, unweld_along_path, weld, GeometricKey, WeldOptions};
