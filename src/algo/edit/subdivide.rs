//! Face strip subdivision.

use std::collections::BTreeSet;

use nalgebra::Point3;

use crate::algo::strips::collect_strip;
use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// Split the face strip through the edge `(u, v)` lengthwise.
///
/// A new vertex is inserted at the midpoint of every strip edge and each
/// strip face is replaced by two quads, one per rail, so the strip becomes
/// two parallel strips. The rest of the mesh is untouched and the result
/// is again a quad mesh. Returns the inserted midpoint vertices in strip
/// order.
///
/// # Errors
///
/// Returns [`MeshError::NotAQuadMesh`] if any face is not a quad,
/// [`MeshError::EdgeNotFound`] if `(u, v)` is not an edge, and
/// [`MeshError::InvalidState`] if the strip crosses one of its faces
/// twice. A failed call leaves the mesh unchanged.
pub fn face_strip_subdivide<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    u: VertexId<I>,
    v: VertexId<I>,
) -> Result<Vec<VertexId<I>>> {
    let edges = collect_strip(mesh, u, v)?;
    let closed = !mesh.is_edge_on_boundary(edges[0].0, edges[0].1);
    let count = if closed { edges.len() } else { edges.len() - 1 };

    let mut faces = Vec::with_capacity(count);
    let mut seen: BTreeSet<FaceId<I>> = BTreeSet::new();
    for &(a, b) in &edges[..count] {
        let face = mesh.halfedge_face(a, b).ok_or_else(|| {
            MeshError::InvalidState(format!(
                "strip edge ({}, {}) has no face",
                a.index(),
                b.index()
            ))
        })?;
        if !seen.insert(face) {
            return Err(MeshError::InvalidState(format!(
                "strip crosses face {} twice",
                face.index()
            )));
        }
        faces.push(face);
    }

    let midpoints: Vec<Point3<f64>> = edges
        .iter()
        .map(|&(a, b)| mesh.edge_midpoint(a, b))
        .collect();
    let inserted: Vec<VertexId<I>> = midpoints
        .into_iter()
        .map(|position| mesh.add_vertex(position))
        .collect();

    for (i, &face) in faces.iter().enumerate() {
        let j = (i + 1) % edges.len();
        let (ui, vi) = edges[i];
        let (uj, vj) = edges[j];
        mesh.replace_face(face, &[ui, inserted[i], inserted[j], uj])?;
        mesh.add_face(&[inserted[i], vi, vj, inserted[j]])?;
    }

    log::debug!("subdivided strip of {} faces", faces.len());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_subdivide_single_quad() {
        let mut mesh = create_grid_mesh(1, 1);
        let inserted =
            face_strip_subdivide(&mut mesh, VertexId::new(0), VertexId::new(1)).unwrap();

        assert_eq!(inserted.len(), 2);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_vertices(), 6);
        assert!(mesh.is_quad_mesh());
        assert!(mesh.is_valid());
        assert_eq!(*mesh.position(inserted[0]), Point3::new(0.5, 0.0, 0.0));
        assert_eq!(*mesh.position(inserted[1]), Point3::new(0.5, 1.0, 0.0));
    }

    #[test]
    fn test_subdivide_grid_strip() {
        let mut mesh = create_grid_mesh(2, 2);
        let inserted =
            face_strip_subdivide(&mut mesh, VertexId::new(1), VertexId::new(4)).unwrap();

        assert_eq!(inserted.len(), 3);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_vertices(), 12);
        assert!(mesh.is_quad_mesh());
        assert!(mesh.is_valid());

        // The midpoints form a new rail across the strip.
        assert!(mesh.has_edge(inserted[0], inserted[1]));
        assert!(mesh.has_edge(inserted[1], inserted[2]));
        assert_eq!(mesh.vertex_degree(inserted[1]), 4);
    }

    #[test]
    fn test_subdivide_closed_strip() {
        let mut mesh = create_ring_mesh();
        let inserted =
            face_strip_subdivide(&mut mesh, VertexId::new(0), VertexId::new(4)).unwrap();

        assert_eq!(inserted.len(), 4);
        assert_eq!(mesh.num_faces(), 8);
        assert_eq!(mesh.num_vertices(), 12);
        assert!(mesh.is_quad_mesh());
        assert!(mesh.is_valid());

        // The new rail closes around the ring and stays interior.
        for i in 0..4 {
            let j = (i + 1) % 4;
            assert!(mesh.has_edge(inserted[i], inserted[j]));
            assert!(!mesh.is_edge_on_boundary(inserted[i], inserted[j]));
        }
    }

    #[test]
    fn test_subdivide_missing_edge() {
        let mut mesh = create_grid_mesh(2, 2);
        let result = face_strip_subdivide(&mut mesh, VertexId::new(0), VertexId::new(4));
        assert!(matches!(
            result,
            Err(MeshError::EdgeNotFound { u: 0, v: 4 })
        ));
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_vertices(), 9);
    }

    #[test]
    fn test_subdivide_non_quad_mesh() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c]).unwrap();

        let result = face_strip_subdivide(&mut mesh, a, b);
        assert!(matches!(result, Err(MeshError::NotAQuadMesh)));
    }
}
