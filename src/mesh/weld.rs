//! Vertex welding and unwelding.
//!
//! Welding merges vertices that coincide geometrically, up to a fixed
//! decimal precision. Unwelding is the opposite move: it cuts a mesh open
//! along a path of vertices by duplicating them, leaving a slit bounded by
//! two copies of the path.
//!
//! - [`weld`]: merge coincident vertices into one
//! - [`unweld_along_path`]: cut the mesh open along a vertex path
//! - [`geometric_key`]: the rounded coordinate key behind [`weld`]

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Point3;

use crate::error::{MeshError, Result};

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, MeshIndex, VertexId};

/// Rounded coordinate key used to detect coincident points.
///
/// Two points share a key exactly when all three coordinates agree after
/// rounding to the chosen number of decimal digits.
pub type GeometricKey = (i64, i64, i64);

/// Compute the [`GeometricKey`] of a point at `precision` decimal digits.
pub fn geometric_key(point: &Point3<f64>, precision: u32) -> GeometricKey {
    let scale = 10f64.powi(precision as i32);
    (
        (point.x * scale).round() as i64,
        (point.y * scale).round() as i64,
        (point.z * scale).round() as i64,
    )
}

/// Options for vertex welding.
#[derive(Debug, Clone)]
pub struct WeldOptions {
    /// Number of decimal digits used when comparing coordinates.
    pub precision: u32,
}

impl Default for WeldOptions {
    fn default() -> Self {
        Self { precision: 6 }
    }
}

impl WeldOptions {
    /// Create options with the specified coordinate precision.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }
}

/// Merge all vertices that share a geometric key.
///
/// Builds a new mesh in which vertices with equal [`geometric_key`]s are
/// collapsed into one; the position of the first occurrence wins. Faces
/// whose cycle degenerates under the merge (fewer than three distinct
/// corners, or a corner visited twice) are dropped. Vertex and face ids
/// are not carried over to the welded mesh.
///
/// # Example
///
/// ```
/// use quadrille::mesh::{weld, HalfEdgeMesh, WeldOptions};
/// use nalgebra::Point3;
///
/// let mut mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
/// let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
/// let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
/// let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
/// mesh.add_face(&[a, b, c, d]).unwrap();
///
/// // A second quad carrying its own copies of the shared edge.
/// let e = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
/// let f = mesh.add_vertex(Point3::new(2.0, 0.0, 0.0));
/// let g = mesh.add_vertex(Point3::new(2.0, 1.0, 0.0));
/// let h = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
/// mesh.add_face(&[e, f, g, h]).unwrap();
///
/// let welded = weld(&mesh, &WeldOptions::default()).unwrap();
/// assert_eq!(welded.num_vertices(), 6);
/// assert_eq!(welded.num_edges(), 7);
/// ```
pub fn weld<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &WeldOptions,
) -> Result<HalfEdgeMesh<I>> {
    let mut welded = HalfEdgeMesh::with_capacity(mesh.num_vertices(), mesh.num_faces());
    let mut by_key: BTreeMap<GeometricKey, VertexId<I>> = BTreeMap::new();
    let mut remap: BTreeMap<VertexId<I>, VertexId<I>> = BTreeMap::new();

    for (v, vertex) in mesh.vertices() {
        let key = geometric_key(&vertex.position, options.precision);
        let target = match by_key.get(&key) {
            Some(&kept) => kept,
            None => {
                let kept = welded.add_vertex(vertex.position);
                by_key.insert(key, kept);
                kept
            }
        };
        remap.insert(v, target);
    }

    let mut dropped = 0usize;
    for (_, face) in mesh.faces() {
        let cycle: Vec<VertexId<I>> = face.vertices.iter().map(|v| remap[v]).collect();
        match welded.add_face(&cycle) {
            Ok(_) => {}
            Err(MeshError::FaceTooSmall { .. }) | Err(MeshError::DuplicateVertexInFace { .. }) => {
                dropped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "welded {} vertices down to {}, dropped {} degenerate faces",
        mesh.num_vertices(),
        welded.num_vertices(),
        dropped
    );
    Ok(welded)
}

/// Cut a mesh open along a path of vertices.
///
/// Every path vertex is duplicated, and the faces on the left of the path
/// (looking along the path direction) are rewritten to use the duplicate.
/// The path edges turn into boundary edges, one copy on each side of the
/// slit. A closed path repeats its first vertex at the end and cuts a
/// closed slit.
///
/// Returns one `(kept, duplicate)` pair per path vertex, in path order.
/// The kept vertex stays with the faces on the right of the path. For a
/// closed path the repeated final vertex does not get a pair of its own.
///
/// # Errors
///
/// Path edges must exist and must not lie on the boundary. An open path
/// must start and end on the boundary and stay off it in between; a
/// closed path must stay off the boundary entirely. A path that visits a
/// vertex twice is rejected.
pub fn unweld_along_path<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    path: &[VertexId<I>],
) -> Result<Vec<(VertexId<I>, VertexId<I>)>> {
    if path.len() < 2 {
        return Err(MeshError::invalid_param(
            "path",
            path.len(),
            "an unweld path needs at least one edge",
        ));
    }
    let closed = path.len() > 2 && path[0] == path[path.len() - 1];
    let route = if closed { &path[..path.len() - 1] } else { path };
    if closed && route.len() < 3 {
        return Err(MeshError::invalid_param(
            "path",
            path.len(),
            "a closed unweld path needs at least three vertices",
        ));
    }

    let mut seen = BTreeSet::new();
    for &v in route {
        if !seen.insert(v) {
            return Err(MeshError::InvalidState(format!(
                "unweld path visits vertex {} twice",
                v.index()
            )));
        }
    }

    let num_path_edges = if closed { route.len() } else { route.len() - 1 };
    for i in 0..num_path_edges {
        let u = route[i];
        let v = route[(i + 1) % route.len()];
        if !mesh.has_edge(u, v) {
            return Err(MeshError::DisconnectedPath {
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
    }

    for (i, &v) in route.iter().enumerate() {
        let endpoint = !closed && (i == 0 || i == route.len() - 1);
        if endpoint && !mesh.is_vertex_on_boundary(v) {
            return Err(MeshError::InvalidState(format!(
                "unweld path endpoint {} is not on the boundary",
                v.index()
            )));
        }
        if !endpoint && mesh.is_vertex_on_boundary(v) {
            return Err(MeshError::InvalidState(format!(
                "unweld path vertex {} lies on the boundary",
                v.index()
            )));
        }
    }

    // Plan the left-side faces of every path vertex against the unmodified
    // mesh, then apply all rewrites.
    let mut moves: Vec<(VertexId<I>, Vec<FaceId<I>>)> = Vec::with_capacity(route.len());
    for (i, &v) in route.iter().enumerate() {
        let prev = if closed {
            Some(route[(i + route.len() - 1) % route.len()])
        } else if i > 0 {
            Some(route[i - 1])
        } else {
            None
        };
        let next = if closed {
            Some(route[(i + 1) % route.len()])
        } else if i + 1 < route.len() {
            Some(route[i + 1])
        } else {
            None
        };

        let nbrs = mesh.ordered_vertex_neighbors(v);
        let fan_index = |w: VertexId<I>| {
            nbrs.iter().position(|&n| n == w).ok_or_else(|| {
                MeshError::InvalidState(format!(
                    "vertex {} has no single fan of neighbors",
                    v.index()
                ))
            })
        };

        // The left sector runs counter-clockwise from the outgoing path
        // edge to the incoming one, or to the boundary at an endpoint.
        let mut left = Vec::new();
        match (prev, next) {
            (Some(p), Some(n)) => {
                let s = fan_index(n)?;
                let t = fan_index(p)?;
                let mut j = s;
                while j != t {
                    if let Some(f) = mesh.halfedge_face(v, nbrs[j]) {
                        left.push(f);
                    }
                    j = (j + 1) % nbrs.len();
                }
            }
            (None, Some(n)) => {
                let s = fan_index(n)?;
                for &w in &nbrs[s..] {
                    if let Some(f) = mesh.halfedge_face(v, w) {
                        left.push(f);
                    }
                }
            }
            (Some(p), None) => {
                let t = fan_index(p)?;
                for &w in &nbrs[..t] {
                    if let Some(f) = mesh.halfedge_face(v, w) {
                        left.push(f);
                    }
                }
            }
            (None, None) => {}
        }
        moves.push((v, left));
    }

    let mut pairs = Vec::with_capacity(moves.len());
    for (v, faces) in moves {
        let position = *mesh.position(v);
        let duplicate = mesh.add_vertex(position);
        mesh.substitute_vertex_in_faces(v, duplicate, Some(&faces))?;
        pairs.push((v, duplicate));
    }

    log::debug!("unwelded {} vertices along a path", pairs.len());
    Ok(pairs)
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

    /// Two unit quads side by side, each with its own copies of the seam
    /// vertices at x = 1.
    fn create_split_quads() -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c, d]).unwrap();

        let e = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let f = mesh.add_vertex(Point3::new(2.0, 0.0, 0.0));
        let g = mesh.add_vertex(Point3::new(2.0, 1.0, 0.0));
        let h = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        mesh.add_face(&[e, f, g, h]).unwrap();

        mesh
    }

    #[test]
    fn test_geometric_key_rounding() {
        let p = Point3::new(0.1000000, -0.25, 2.0);
        let q = Point3::new(0.1000001, -0.25, 2.0);
        assert_eq!(geometric_key(&p, 6), (100000, -250000, 2000000));
        assert_eq!(geometric_key(&p, 6), geometric_key(&q, 6));
        assert_ne!(geometric_key(&p, 7), geometric_key(&q, 7));
    }

    #[test]
    fn test_weld_merges_coincident_vertices() {
        let mesh = create_split_quads();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_edges(), 8);

        let welded = weld(&mesh, &WeldOptions::default()).unwrap();
        assert_eq!(welded.num_vertices(), 6);
        assert_eq!(welded.num_faces(), 2);
        assert_eq!(welded.num_edges(), 7);
        assert!(welded.is_quad_mesh());
        assert!(welded.is_valid());

        // The seam is now a shared interior edge.
        let seam = (VertexId::new(1), VertexId::new(2));
        assert!(welded.has_edge(seam.0, seam.1));
        assert!(!welded.is_edge_on_boundary(seam.0, seam.1));
    }

    #[test]
    fn test_weld_collapses_quad_to_triangle() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let b2 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.5, 1.0, 0.0));
        mesh.add_face(&[a, b, b2, c]).unwrap();

        let welded = weld(&mesh, &WeldOptions::default()).unwrap();
        assert_eq!(welded.num_vertices(), 3);
        assert_eq!(welded.num_faces(), 1);
        let f = welded.face_ids().next().unwrap();
        assert_eq!(welded.face_degree(f), 3);
    }

    #[test]
    fn test_weld_drops_collapsed_face() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c, d]).unwrap();

        // A quad whose corners all weld to one point.
        let p0 = mesh.add_vertex(Point3::new(5.0, 5.0, 0.0));
        let p1 = mesh.add_vertex(Point3::new(5.0, 5.0, 0.0));
        let p2 = mesh.add_vertex(Point3::new(5.0, 5.0, 0.0));
        let p3 = mesh.add_vertex(Point3::new(5.0, 5.0, 0.0));
        mesh.add_face(&[p0, p1, p2, p3]).unwrap();

        let welded = weld(&mesh, &WeldOptions::default()).unwrap();
        assert_eq!(welded.num_vertices(), 5);
        assert_eq!(welded.num_faces(), 1);
        assert!(welded.is_valid());
    }

    #[test]
    fn test_weld_precision_control() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c, d]).unwrap();
        mesh.add_vertex(Point3::new(1e-5, 0.0, 0.0));

        let coarse = weld(&mesh, &WeldOptions::default().with_precision(4)).unwrap();
        assert_eq!(coarse.num_vertices(), 4);

        let fine = weld(&mesh, &WeldOptions::default()).unwrap();
        assert_eq!(fine.num_vertices(), 5);
    }

    #[test]
    fn test_unweld_opens_interior_path() {
        let mut mesh = create_grid_mesh(2, 2);
        let path: Vec<VertexId<u32>> = vec![VertexId::new(1), VertexId::new(4), VertexId::new(7)];

        let pairs = unweld_along_path(&mut mesh, &path).unwrap();
        assert_eq!(pairs.len(), 3);
        for (i, &(kept, duplicate)) in pairs.iter().enumerate() {
            assert_eq!(kept, path[i]);
            assert!(mesh.has_vertex(duplicate));
        }

        assert_eq!(mesh.num_vertices(), 12);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_edges(), 14);
        assert!(mesh.is_valid());

        // Both copies of the path now run along the boundary of the slit.
        assert!(mesh.is_edge_on_boundary(path[0], path[1]));
        assert!(mesh.is_edge_on_boundary(path[1], path[2]));
        assert!(mesh.has_edge(pairs[0].1, pairs[1].1));
        assert!(mesh.is_edge_on_boundary(pairs[0].1, pairs[1].1));
        assert!(mesh.is_edge_on_boundary(pairs[1].1, pairs[2].1));
        assert!(mesh.is_vertex_on_boundary(path[1]));
        assert!(mesh.is_vertex_on_boundary(pairs[1].1));
    }

    #[test]
    fn test_unweld_then_weld_restores() {
        let mut mesh = create_grid_mesh(2, 2);
        let path: Vec<VertexId<u32>> = vec![VertexId::new(1), VertexId::new(4), VertexId::new(7)];
        unweld_along_path(&mut mesh, &path).unwrap();

        let welded = weld(&mesh, &WeldOptions::default()).unwrap();
        assert_eq!(welded.num_vertices(), 9);
        assert_eq!(welded.num_faces(), 4);
        assert_eq!(welded.num_edges(), 12);
        assert!(welded.is_valid());
    }

    #[test]
    fn test_unweld_closed_loop() {
        let mut mesh = create_grid_mesh(4, 4);
        let ring = [6usize, 7, 8, 13, 18, 17, 16, 11];
        let mut path: Vec<VertexId<u32>> = ring.iter().map(|&i| VertexId::new(i)).collect();
        path.push(path[0]);

        let pairs = unweld_along_path(&mut mesh, &path).unwrap();
        assert_eq!(pairs.len(), 8);
        assert_eq!(mesh.num_vertices(), 33);
        assert_eq!(mesh.num_faces(), 16);
        assert!(mesh.is_valid());

        // Old ring and duplicate ring both border the cut.
        for i in 0..ring.len() {
            let u = VertexId::new(ring[i]);
            let v = VertexId::new(ring[(i + 1) % ring.len()]);
            assert!(mesh.is_edge_on_boundary(u, v));
            let du = pairs[i].1;
            let dv = pairs[(i + 1) % pairs.len()].1;
            assert!(mesh.is_edge_on_boundary(du, dv));
        }

        // The enclosed patch keeps its interior vertex.
        assert!(!mesh.is_vertex_on_boundary(VertexId::new(12)));
    }

    #[test]
    fn test_unweld_rejects_boundary_edge() {
        let mut mesh = create_grid_mesh(2, 2);
        let path: Vec<VertexId<u32>> = vec![VertexId::new(0), VertexId::new(1)];
        let result = unweld_along_path(&mut mesh, &path);
        assert!(matches!(
            result,
            Err(MeshError::BoundaryEdge { u: 0, v: 1 })
        ));
    }

    #[test]
    fn test_unweld_rejects_interior_endpoint() {
        let mut mesh = create_grid_mesh(2, 2);
        let path: Vec<VertexId<u32>> = vec![VertexId::new(4), VertexId::new(5)];
        let result = unweld_along_path(&mut mesh, &path);
        assert!(matches!(result, Err(MeshError::InvalidState(_))));
    }

    #[test]
    fn test_unweld_rejects_repeated_vertex() {
        let mut mesh = create_grid_mesh(2, 2);
        let path: Vec<VertexId<u32>> = vec![
            VertexId::new(1),
            VertexId::new(4),
            VertexId::new(3),
            VertexId::new(4),
        ];
        let result = unweld_along_path(&mut mesh, &path);
        assert!(matches!(result, Err(MeshError::InvalidState(_))));
    }
}
