//! # Quadrille
//!
//! Combinatorial topology for quad meshes.
//!
//! Quadrille provides a halfedge mesh kernel tuned for all-quad meshes and
//! the combinatorial machinery built on top of it: singularity detection,
//! straight polyedge walks, face strip indexing, strip-level edit
//! operations and polyline extraction.
//!
//! ## Features
//!
//! - **Halfedge kernel**: face-cycle storage with deterministic adjacency
//!   queries and type-safe vertex, face and strip indices
//! - **Singularities and polyedges**: regular-valence walks, whole-mesh
//!   edge covers and the singularity decomposition of a quad mesh into
//!   patches
//! - **Strips**: transversal edge groups, a rebuildable strip index and a
//!   two-colorable strip connectivity graph
//! - **Strip edits**: collapse, subdivide, merge and insert operations
//!   that keep a quad mesh all-quad
//!
//! ## Quick Start
//!
//! ```
//! use quadrille::prelude::*;
//! use quadrille::algo::singularity::singularities;
//! use nalgebra::Point3;
//!
//! // Two quads side by side.
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 4, 3], [1, 2, 5, 4]];
//! let mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//!
//! assert!(mesh.is_quad_mesh());
//! assert_eq!(mesh.num_edges(), 7);
//!
//! // The four corners are boundary vertices of degree two, so they are
//! // the singularities of this patch.
//! assert_eq!(singularities(&mesh).len(), 4);
//! ```
//!
//! ## Strips
//!
//! Every quad mesh decomposes into face strips, chains of quads glued
//! along opposite edges:
//!
//! ```
//! use quadrille::prelude::*;
//! use quadrille::algo::strips::StripIndex;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(2.0, 0.0, 0.0),
//! #     Point3::new(0.0, 1.0, 0.0),
//! #     Point3::new(1.0, 1.0, 0.0),
//! #     Point3::new(2.0, 1.0, 0.0),
//! # ];
//! # let faces = vec![[0, 1, 4, 3], [1, 2, 5, 4]];
//! # let mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//! let strips = StripIndex::build(&mesh).unwrap();
//!
//! // One strip runs through both faces, and each face is also crossed
//! // by its own one-face strip the other way.
//! assert_eq!(strips.num_strips(), 3);
//! for f in mesh.face_ids() {
//!     assert!(strips.face_strips(f).is_some());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use quadrille::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_faces, build_from_quads, to_vertices_and_faces, Face, FaceId, HalfEdgeMesh,
        MeshIndex, StripId, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_quad_grid() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        ];

        let faces = vec![[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]];

        let mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 9);
        assert_eq!(mesh.num_faces(), 4);
        // 12 edges: V - E + F = 9 - 12 + 4 = 1 for a disk.
        assert_eq!(mesh.num_edges(), 12);
        assert!(mesh.is_valid());
        assert!(mesh.is_quad_mesh());

        // The centre vertex is the only interior vertex.
        let interior: Vec<_> = mesh
            .vertex_ids()
            .filter(|&v| !mesh.is_vertex_on_boundary(v))
            .collect();
        assert_eq!(interior, vec![VertexId::new(4)]);
    }
}
