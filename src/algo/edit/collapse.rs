//! Face strip collapse.

use std::collections::BTreeSet;

use nalgebra::Point3;

use crate::algo::strips::dual_edge_groups;
use crate::error::{MeshError, Result};
use crate::mesh::{weld, FaceId, HalfEdgeMesh, MeshIndex, VertexId, WeldOptions};

/// Collapse the face strip crossed by the edge `(u, v)`.
///
/// Every edge in the strip's transversal group is contracted to a single
/// vertex and the faces of the strip are removed, so the two rails of the
/// strip fall onto each other. A contracted edge with exactly one endpoint
/// on the boundary keeps the interior endpoint's position; otherwise the
/// merged vertex sits at the edge midpoint. Boundary status is taken from
/// the mesh as it was before the collapse.
///
/// The surviving faces are welded and re-indexed, so vertex and face ids
/// are renumbered. Collapsing a strip that covers every face empties the
/// mesh.
///
/// # Errors
///
/// Returns [`MeshError::NotAQuadMesh`] if any face is not a quad, and
/// [`MeshError::EdgeNotFound`] if `(u, v)` is not an edge. A failed call
/// leaves the mesh unchanged.
pub fn face_strip_collapse<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    u: VertexId<I>,
    v: VertexId<I>,
) -> Result<()> {
    if !mesh.is_quad_mesh() {
        return Err(MeshError::NotAQuadMesh);
    }
    if !mesh.has_edge(u, v) {
        return Err(MeshError::EdgeNotFound {
            u: u.index(),
            v: v.index(),
        });
    }

    let (groups, _) = dual_edge_groups(mesh)?;
    let group = groups[&(u, v)];
    let contracted: Vec<(VertexId<I>, VertexId<I>)> = groups
        .iter()
        .filter(|&(&(a, b), &g)| g == group && a < b)
        .map(|(&edge, _)| edge)
        .collect();

    // Plan everything against the unmodified mesh.
    let mut strip_faces: BTreeSet<FaceId<I>> = BTreeSet::new();
    for &(a, b) in &contracted {
        if let Some(f) = mesh.halfedge_face(a, b) {
            strip_faces.insert(f);
        }
        if let Some(f) = mesh.halfedge_face(b, a) {
            strip_faces.insert(f);
        }
    }
    let merged_positions: Vec<Point3<f64>> = contracted
        .iter()
        .map(|&(a, b)| {
            match (mesh.is_vertex_on_boundary(a), mesh.is_vertex_on_boundary(b)) {
                (true, false) => *mesh.position(b),
                (false, true) => *mesh.position(a),
                _ => mesh.edge_midpoint(a, b),
            }
        })
        .collect();

    for &f in &strip_faces {
        mesh.delete_face(f);
    }
    for (&(a, b), position) in contracted.iter().zip(merged_positions) {
        let merged = mesh.add_vertex(position);
        for old in [a, b] {
            for f in mesh.vertex_faces(old) {
                let cycle: Vec<VertexId<I>> = mesh
                    .face_vertices(f)
                    .iter()
                    .map(|&w| if w == old { merged } else { w })
                    .collect();
                match mesh.replace_face(f, &cycle) {
                    Ok(()) => {}
                    Err(MeshError::FaceTooSmall { .. })
                    | Err(MeshError::DuplicateVertexInFace { .. }) => {
                        mesh.delete_face(f);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    let mut rebuilt = weld(mesh, &WeldOptions::default())?;
    rebuilt.cull_vertices();
    log::debug!(
        "collapsed strip of {} faces, {} faces remain",
        strip_faces.len(),
        rebuilt.num_faces()
    );
    *mesh = rebuilt;
    Ok(())
}
