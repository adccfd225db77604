//! Face strip merging.

use std::collections::BTreeSet;

use crate::algo::polyedge::polyedge;
use crate::algo::singularity::is_vertex_singular;
use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// Merge the two face strips flanking the polyedge through `(u, v)`.
///
/// For every edge of the polyedge the two adjacent faces are fused into a
/// single quad spanning both strips, so the polyedge vertices end up
/// isolated. They are left in the mesh; call
/// [`cull_vertices`](HalfEdgeMesh::cull_vertices) to drop them. Returns
/// the fused faces in polyedge order.
///
/// # Errors
///
/// Returns [`MeshError::NotAQuadMesh`] if any face is not a quad,
/// [`MeshError::EdgeNotFound`] if `(u, v)` is not an edge,
/// [`MeshError::BoundaryEdge`] if it lies on the boundary, and
/// [`MeshError::SingularVertex`] if the polyedge runs into a singularity.
/// A failed call leaves the mesh unchanged.
pub fn face_strips_merge<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    u: VertexId<I>,
    v: VertexId<I>,
) -> Result<Vec<FaceId<I>>> {
    if !mesh.is_quad_mesh() {
        return Err(MeshError::NotAQuadMesh);
    }
    if !mesh.has_edge(u, v) {
        return Err(MeshError::EdgeNotFound {
            u: u.index(),
            v: v.index(),
        });
    }
    if mesh.is_edge_on_boundary(u, v) {
        return Err(MeshError::BoundaryEdge {
            u: u.index(),
            v: v.index(),
        });
    }

    let route = polyedge(mesh, u, v)?;
    for &w in &route {
        if is_vertex_singular(mesh, w) {
            return Err(MeshError::SingularVertex { vertex: w.index() });
        }
    }

    // Plan the fused quads against the unmodified mesh.
    let mut planned: Vec<(FaceId<I>, FaceId<I>, [VertexId<I>; 4])> =
        Vec::with_capacity(route.len() - 1);
    let mut used: BTreeSet<FaceId<I>> = BTreeSet::new();
    for pair in route.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let left = interior_face(mesh, a, b)?;
        let right = interior_face(mesh, b, a)?;
        if !used.insert(left) || !used.insert(right) {
            return Err(MeshError::InvalidState(
                "face strips along the polyedge fold back onto themselves".into(),
            ));
        }
        let p = descendant(mesh, left, b)?;
        let q = descendant(mesh, left, p)?;
        let r = descendant(mesh, right, a)?;
        let s = descendant(mesh, right, r)?;
        if p == r || p == s || q == r || q == s {
            return Err(MeshError::InvalidState(format!(
                "fusing faces {} and {} would degenerate",
                left.index(),
                right.index()
            )));
        }
        planned.push((left, right, [p, q, r, s]));
    }

    let mut fused = Vec::with_capacity(planned.len());
    for (left, right, cycle) in planned {
        mesh.delete_face(left);
        mesh.delete_face(right);
        fused.push(mesh.add_face(&cycle)?);
    }

    log::debug!(
        "merged strips across {} polyedge edges into {} faces",
        route.len() - 1,
        fused.len()
    );
    Ok(fused)
}

fn interior_face<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    a: VertexId<I>,
    b: VertexId<I>,
) -> Result<FaceId<I>> {
    mesh.halfedge_face(a, b).ok_or(MeshError::BoundaryEdge {
        u: a.index(),
        v: b.index(),
    })
}

fn descendant<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    f: FaceId<I>,
    w: VertexId<I>,
) -> Result<VertexId<I>> {
    mesh.face_vertex_descendant(f, w).ok_or_else(|| {
        MeshError::InvalidState(format!(
            "vertex {} is not in face {}",
            w.index(),
            f.index()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn create_grid_mesh(nx: usize, ny: usize) -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::new();
        let mut ids = Vec::new();

        for j in 0..=ny {
            for i in 0..=nx {
                ids.push(mesh.add_vertex(Point3::new(i as f64, j as f64, 0.0)));
            }
        }

        for j in 0..ny {
            for i in 0..nx {
                let v00 = ids[j * (nx + 1) + i];
                let v10 = ids[j * (nx + 1) + i + 1];
                let v11 = ids[(j + 1) * (nx + 1) + i + 1];
                let v01 = ids[(j + 1) * (nx + 1) + i];
                mesh.add_face(&[v00, v10, v11, v01]).unwrap();
            }
        }

        mesh
    }

    // Four quads around a cylinder, open at the top and bottom.
    fn create_ring_mesh() -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::new();
        let bottom: Vec<_> = (0..4)
            .map(|i| mesh.add_vertex(Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        let top: Vec<_> = (0..4)
            .map(|i| mesh.add_vertex(Point3::new(i as f64, 1.0, 0.0)))
            .collect();
        for i in 0..4 {
            let j = (i + 1) % 4;
            mesh.add_face(&[bottom[i], bottom[j], top[j], top[i]]).unwrap();
        }
        mesh
    }

    fn ids(vertices: &[VertexId<u32>]) -> Vec<usize> {
        vertices.iter().map(|v| v.index()).collect()
    }

    #[test]
    fn test_merge_grid_strips() {
        let mut mesh = create_grid_mesh(2, 2);
        let fused = face_strips_merge(&mut mesh, VertexId::new(3), VertexId::new(4)).unwrap();

        assert_eq!(fused.len(), 2);
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.is_quad_mesh());
        assert!(mesh.is_valid());
        assert_eq!(ids(mesh.face_vertices(fused[0])), vec![1, 2, 8, 7]);
        assert_eq!(ids(mesh.face_vertices(fused[1])), vec![0, 1, 7, 6]);

        // The fused faces share the chord that replaced the polyedge.
        assert!(!mesh.is_edge_on_boundary(VertexId::new(1), VertexId::new(7)));

        // The polyedge vertices are isolated until culled.
        assert_eq!(mesh.vertex_degree(VertexId::new(3)), 0);
        assert_eq!(mesh.vertex_degree(VertexId::new(4)), 0);
        assert_eq!(mesh.vertex_degree(VertexId::new(5)), 0);
        assert_eq!(mesh.cull_vertices(), 3);
        assert_eq!(mesh.num_vertices(), 6);
    }

    #[test]
    fn test_merge_ring_rung() {
        let mut mesh = create_ring_mesh();
        let fused = face_strips_merge(&mut mesh, VertexId::new(0), VertexId::new(4)).unwrap();

        assert_eq!(fused.len(), 1);
        assert_eq!(mesh.num_faces(), 3);
        assert!(mesh.is_quad_mesh());
        assert!(mesh.is_valid());
        assert_eq!(ids(mesh.face_vertices(fused[0])), vec![1, 5, 7, 3]);
        assert_eq!(mesh.cull_vertices(), 2);
        assert_eq!(mesh.num_vertices(), 6);
    }

    #[test]
    fn test_merge_boundary_edge() {
        let mut mesh = create_grid_mesh(2, 2);
        let result = face_strips_merge(&mut mesh, VertexId::new(0), VertexId::new(1));
        assert!(matches!(
            result,
            Err(MeshError::BoundaryEdge { u: 0, v: 1 })
        ));
        assert_eq!(mesh.num_faces(), 4);
    }

    #[test]
    fn test_merge_missing_edge() {
        let mut mesh = create_grid_mesh(2, 2);
        let result = face_strips_merge(&mut mesh, VertexId::new(0), VertexId::new(4));
        assert!(matches!(
            result,
            Err(MeshError::EdgeNotFound { u: 0, v: 4 })
        ));
    }

    #[test]
    fn test_merge_through_singularity_is_a_no_op() {
        let mut mesh = create_grid_mesh(2, 2);
        // Removing a corner face turns the centre vertex into a boundary
        // vertex of degree four, which is singular.
        mesh.delete_face(crate::mesh::FaceId::new(3));

        let result = face_strips_merge(&mut mesh, VertexId::new(3), VertexId::new(4));
        assert!(matches!(
            result,
            Err(MeshError::SingularVertex { vertex: 4 })
        ));
        assert_eq!(mesh.num_faces(), 3);
        assert_eq!(mesh.num_vertices(), 9);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_merge_non_quad_mesh() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c]).unwrap();

        let result = face_strips_merge(&mut mesh, a, b);
        assert!(matches!(result, Err(MeshError::NotAQuadMesh)));
    }
}
