//! Singular vertex detection.
//!
//! In a quad mesh a vertex is **regular** when its valency matches the
//! plain grid pattern: four neighbors for an interior vertex, three for a
//! boundary vertex. Everything else is a **singularity**, including the
//! corners of an open patch. Singularities organize the global structure
//! of a quad mesh; polyedges and strips start and stop at them.

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Whether a vertex breaks the regular quad grid pattern.
///
/// Interior vertices are regular at valency four, boundary vertices at
/// valency three. The corners of an open patch count as singular.
pub fn is_vertex_singular<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, vertex: VertexId<I>) -> bool {
    let regular = if mesh.is_vertex_on_boundary(vertex) {
        3
    } else {
        4
    };
    mesh.vertex_degree(vertex) != regular
}

/// All singular vertices, in ascending id order.
pub fn singularities<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<VertexId<I>> {
    mesh.vertex_ids()
        .filter(|&v| is_vertex_singular(mesh, v))
        .collect()
}

/// The index of a vertex, one quarter per missing or extra edge.
///
/// Regular vertices have index zero, a cone point like a cube corner has
/// index 1/4, a five-valent saddle -1/4. Isolated vertices count as zero.
/// Summed over a whole mesh the indices give its Euler characteristic.
pub fn vertex_index<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, vertex: VertexId<I>) -> f64 {
    let degree = mesh.vertex_degree(vertex);
    if degree == 0 {
        return 0.0;
    }
    let regular = if mesh.is_vertex_on_boundary(vertex) {
        3.0
    } else {
        4.0
    };
    (regular - degree as f64) / 4.0
}
