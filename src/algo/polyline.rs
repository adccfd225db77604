//! Whole-mesh polyline extraction for quad meshes.
//!
//! The functions here decompose a quad mesh into the maximal straight
//! polyedges of either the mesh itself or its combinatorial dual. The
//! underlying walk is the regular-valence walk of
//! [`polyedges`](crate::algo::polyedge::polyedges); this module adds the
//! quad-mesh gate and the dual view. Boundary loops are available from
//! [`boundary_polyedges`](crate::algo::polyedge::boundary_polyedges).

use std::collections::BTreeMap;

use crate::algo::polyedge::polyedges;
use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// Partition the edges of a quad mesh into maximal straight polyedges.
///
/// Interior polyedges run until they close, reach the boundary or hit a
/// singularity; boundary polyedges run along the boundary until they
/// close or hit a boundary singularity. Every edge is covered exactly
/// once.
///
/// # Errors
///
/// Returns [`MeshError::NotAQuadMesh`] if any face is not a quad.
pub fn quad_mesh_polyedges<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> Result<Vec<Vec<VertexId<I>>>> {
    if !mesh.is_quad_mesh() {
        return Err(MeshError::NotAQuadMesh);
    }
    Ok(polyedges(mesh))
}

/// Partition the edges of the combinatorial dual into straight polyedges.
///
/// The mesh is dualized with [`mesh_dual`] and the straight walk runs on
/// the dual, so each returned sequence is a chain of primal faces crossed
/// edge-to-opposite-edge. On a closed quad mesh these chains are the face
/// loops of the mesh.
///
/// # Errors
///
/// Returns [`MeshError::NotAQuadMesh`] if any face is not a quad.
pub fn quad_mesh_dual_polyedges<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> Result<Vec<Vec<FaceId<I>>>> {
    if !mesh.is_quad_mesh() {
        return Err(MeshError::NotAQuadMesh);
    }
    let (dual, dual_vertex) = mesh_dual(mesh)?;
    let primal_face: BTreeMap<VertexId<I>, FaceId<I>> =
        dual_vertex.into_iter().map(|(f, v)| (v, f)).collect();

    // Every dual vertex stems from exactly one primal face.
    Ok(polyedges(&dual)
        .into_iter()
        .map(|polyedge| polyedge.into_iter().map(|v| primal_face[&v]).collect())
        .collect())
}

/// Build the combinatorial dual of a mesh.
///
/// Every face becomes a dual vertex at the face centroid and every
/// interior vertex becomes a dual face from its counter-clockwise face
/// ring, so the dual of a mesh with boundary loses the faces along the
/// boundary. Also returns the map from primal faces to dual vertices.
///
/// # Errors
///
/// Fails only if a dual face cycle cannot be registered; dual faces with
/// fewer than three corners are silently dropped.
pub fn mesh_dual<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> Result<(HalfEdgeMesh<I>, BTreeMap<FaceId<I>, VertexId<I>>)> {
    let mut dual = HalfEdgeMesh::with_capacity(mesh.num_faces(), mesh.num_vertices());
    let mut dual_vertex: BTreeMap<FaceId<I>, VertexId<I>> = BTreeMap::new();

    for v in mesh.vertex_ids() {
        if mesh.is_vertex_on_boundary(v) {
            continue;
        }
        let ring = mesh.ordered_vertex_faces(v);
        let cycle: Vec<VertexId<I>> = ring
            .iter()
            .map(|&f| {
                *dual_vertex
                    .entry(f)
                    .or_insert_with(|| dual.add_vertex(mesh.face_centroid(f)))
            })
            .collect();
        match dual.add_face(&cycle) {
            Ok(_) => {}
            Err(MeshError::FaceTooSmall { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "dual has {} vertices and {} faces",
        dual.num_vertices(),
        dual.num_faces()
    );
    Ok((dual, dual_vertex))
}
