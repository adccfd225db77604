//! Strip-level editing operations for quad meshes.
//!
//! The operations in this module rewrite a quad mesh one face strip at a
//! time while keeping it a quad mesh:
//!
//! - [`face_strip_collapse`] removes a strip by contracting its rungs.
//! - [`face_strip_subdivide`] splits a strip lengthwise into two parallel
//!   strips.
//! - [`face_strips_merge`] fuses the two strips flanking a polyedge into
//!   one.
//! - [`face_strip_insert`] cuts the mesh open along a vertex path and
//!   fills the slit with a new strip.
//!
//! Every operation validates its arguments against the unmodified mesh
//! before writing anything, so a failed call leaves the mesh exactly as it
//! was.
//!
//! # Example
//!
//! ```
//! use quadrille::algo::edit::face_strip_subdivide;
//! use quadrille::mesh::{build_from_quads, HalfEdgeMesh};
//! use quadrille::nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
//!
//! let midpoints = face_strip_subdivide(&mut mesh, 0.into(), 1.into()).unwrap();
//! assert_eq!(midpoints.len(), 2);
//! assert_eq!(mesh.num_faces(), 2);
//! assert!(mesh.is_quad_mesh());
//! ```

mod collapse;
mod insert;
mod merge;
mod subdivide;

pub use collapse::face_strip_collapse;
pub use insert::{face_strip_insert, InsertOptions};
pub use merge::face_strips_merge;
pub use subdivide::face_strip_subdivide;
