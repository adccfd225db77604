//! Quad mesh topology algorithms.
//!
//! This module contains the combinatorial machinery of the crate:
//!
//! - **Singularities**: vertex regularity tests and singularity listing
//! - **Polyedges**: straight walks, edge covers, singularity polyedges and
//!   the boundary-split decomposition
//! - **Strips**: transversal edge groups, the strip index and the strip
//!   connectivity graph with its two-coloring
//! - **Edits**: strip-level collapse, subdivide, merge and insert
//! - **Polylines**: whole-mesh and dual polyline extraction

pub mod edit;
pub mod polyedge;
pub mod polyline;
pub mod singularity;
pub mod strips;
