//! Strip decomposition of quad meshes.
//!
//! A **strip** is a ladder of quads glued along opposite edges. Strips
//! partition the edge set of any quad mesh: every edge is crossed by
//! exactly one strip, and every quad face is crossed by exactly two.
//!
//! [`StripIndex`] snapshots the full decomposition and answers lookup
//! queries; it does not follow later mesh mutations (see the staleness
//! contract on the type). [`dual_edge_groups`] derives the same
//! partition as plain edge groups and [`StripConnectivity`] captures
//! which strips cross which.
//!
//! # Example
//!
//! ```
//! use quadrille::mesh::build_from_quads;
//! use quadrille::algo::strips::StripIndex;
//! use quadrille::nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = build_from_quads::<u32>(&vertices, &[[0, 1, 2, 3]]).unwrap();
//!
//! // A single quad is crossed by two strips of two edges each.
//! let strips = StripIndex::build(&mesh).unwrap();
//! assert_eq!(strips.num_strips(), 2);
//! for strip in strips.strip_ids() {
//!     assert_eq!(strips.strip_edges(strip).len(), 2);
//!     assert!(!strips.is_strip_closed(strip));
//! }
//! ```

mod connectivity;
mod groups;

pub use connectivity::{two_colorable_strips, StripConnectivity};
pub use groups::dual_edge_groups;

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, StripId, VertexId};

/// Collect the edges of the strip crossing the edge `(u0, v0)`.
///
/// The seed is oriented so a real face lies on its left, then the strip
/// is traced through opposite edges in both directions. Every returned
/// edge is directed consistently along the strip: its left face is the
/// next strip face, and only the final edge of an open strip faces the
/// boundary. A closed strip does not repeat its first edge.
///
/// # Errors
///
/// Returns [`MeshError::NotAQuadMesh`] if any face is not a quad, and
/// [`MeshError::EdgeNotFound`] if `(u0, v0)` is not an edge.
pub fn collect_strip<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u0: VertexId<I>,
    v0: VertexId<I>,
) -> Result<Vec<(VertexId<I>, VertexId<I>)>> {
    if !mesh.is_quad_mesh() {
        return Err(MeshError::NotAQuadMesh);
    }
    if !mesh.has_edge(u0, v0) {
        return Err(MeshError::EdgeNotFound {
            u: u0.index(),
            v: v0.index(),
        });
    }
    Ok(collect(mesh, u0, v0))
}

/// Collect a strip without validating the mesh. Seed edge must exist.
fn collect<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u0: VertexId<I>,
    v0: VertexId<I>,
) -> Vec<(VertexId<I>, VertexId<I>)> {
    let (u0, v0) = if mesh.halfedge_face(u0, v0).is_some() {
        (u0, v0)
    } else {
        (v0, u0)
    };

    let (edges, closed) = walk_forward(mesh, u0, v0);
    if closed || mesh.halfedge_face(v0, u0).is_none() {
        return edges;
    }

    // Open strip: walk the other way from the seed and glue the two
    // halves, flipping the backward edges into forward orientation.
    let (back, _) = walk_forward(mesh, v0, u0);
    let mut all: Vec<(VertexId<I>, VertexId<I>)> = back[1..]
        .iter()
        .rev()
        .map(|&(u, v)| (v, u))
        .collect();
    all.extend(edges);
    all
}

/// Walk a strip one way from `(u0, v0)`, which must have a real left
/// face. Stops at the boundary or when the strip closes on its seed.
fn walk_forward<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u0: VertexId<I>,
    v0: VertexId<I>,
) -> (Vec<(VertexId<I>, VertexId<I>)>, bool) {
    let mut edges = vec![(u0, v0)];
    let mut closed = false;

    for _ in 0..mesh.num_edges() {
        let (u, v) = edges[edges.len() - 1];
        let face = match mesh.halfedge_face(u, v) {
            Some(face) => face,
            None => break,
        };
        let w = match mesh.face_vertex_descendant(face, v) {
            Some(w) => w,
            None => break,
        };
        let x = match mesh.face_vertex_descendant(face, w) {
            Some(x) => x,
            None => break,
        };
        if (x, w) == edges[0] {
            closed = true;
            break;
        }
        edges.push((x, w));
    }

    (edges, closed)
}

#[derive(Debug, Clone)]
struct StripData<I: MeshIndex> {
    edges: Vec<(VertexId<I>, VertexId<I>)>,
    faces: Vec<FaceId<I>>,
    closed: bool,
}

/// A snapshot of the strip decomposition of a quad mesh.
///
/// Built once by [`StripIndex::build`]; strip ids are sequential in
/// discovery order. The index carries no automatic invalidation: after
/// the mesh is mutated its answers are stale until it is rebuilt or
/// patched through [`substitute_vertex_in_strips`] and
/// [`delete_face_in_strips`].
///
/// [`substitute_vertex_in_strips`]: StripIndex::substitute_vertex_in_strips
/// [`delete_face_in_strips`]: StripIndex::delete_face_in_strips
#[derive(Debug, Clone)]
pub struct StripIndex<I: MeshIndex = u32> {
    strips: Vec<StripData<I>>,
    edge_to_strip: BTreeMap<(VertexId<I>, VertexId<I>), StripId<I>>,
    face_to_strips: BTreeMap<FaceId<I>, (StripId<I>, StripId<I>)>,
}

impl<I: MeshIndex> StripIndex<I> {
    /// Partition all edges of the mesh into strips.
    ///
    /// Strips are collected from the smallest uncovered edge onward, so
    /// ids are deterministic for a given mesh.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EmptyMesh`] if the mesh has no faces and
    /// [`MeshError::NotAQuadMesh`] if any face is not a quad.
    pub fn build(mesh: &HalfEdgeMesh<I>) -> Result<Self> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if !mesh.is_quad_mesh() {
            return Err(MeshError::NotAQuadMesh);
        }

        let mut remaining: BTreeSet<(VertexId<I>, VertexId<I>)> = mesh.edges().collect();
        let mut strips = Vec::new();
        let mut edge_to_strip = BTreeMap::new();

        while let Some(&(u, v)) = remaining.iter().next() {
            let strip = StripId::new(strips.len());
            let edges = collect(mesh, u, v);

            for &(a, b) in &edges {
                let key = if a < b { (a, b) } else { (b, a) };
                remaining.remove(&key);
                edge_to_strip.insert((a, b), strip);
                edge_to_strip.insert((b, a), strip);
            }

            let faces: Vec<FaceId<I>> = edges
                .iter()
                .filter_map(|&(a, b)| mesh.halfedge_face(a, b))
                .collect();
            let closed = !mesh.is_edge_on_boundary(edges[0].0, edges[0].1);

            strips.push(StripData {
                edges,
                faces,
                closed,
            });
        }

        let mut face_to_strips = BTreeMap::new();
        for face in mesh.face_ids() {
            let halfedges = mesh.face_halfedges(face);
            let first = edge_to_strip[&halfedges[0]];
            let second = edge_to_strip[&halfedges[1]];
            face_to_strips.insert(face, (first, second));
        }

        log::debug!(
            "indexed {} strips over {} edges",
            strips.len(),
            mesh.num_edges()
        );

        Ok(Self {
            strips,
            edge_to_strip,
            face_to_strips,
        })
    }

    /// Number of strips in the partition.
    #[inline]
    pub fn num_strips(&self) -> usize {
        self.strips.len()
    }

    /// Iterate over all strip ids.
    pub fn strip_ids(&self) -> impl Iterator<Item = StripId<I>> + '_ {
        (0..self.strips.len()).map(StripId::new)
    }

    /// The directed edges of a strip, in strip order.
    ///
    /// Panics if the strip does not exist.
    #[inline]
    pub fn strip_edges(&self, strip: StripId<I>) -> &[(VertexId<I>, VertexId<I>)] {
        &self.strips[strip.index()].edges
    }

    /// The strip crossing an edge, in either direction.
    pub fn edge_strip(&self, u: VertexId<I>, v: VertexId<I>) -> Option<StripId<I>> {
        self.edge_to_strip.get(&(u, v)).copied()
    }

    /// The faces of a strip, in strip order.
    ///
    /// Panics if the strip does not exist.
    #[inline]
    pub fn strip_faces(&self, strip: StripId<I>) -> &[FaceId<I>] {
        &self.strips[strip.index()].faces
    }

    /// The two strips crossing a face, read from its first two halfedges.
    pub fn face_strips(&self, face: FaceId<I>) -> Option<(StripId<I>, StripId<I>)> {
        self.face_to_strips.get(&face).copied()
    }

    /// Whether a strip closes onto itself.
    ///
    /// Panics if the strip does not exist.
    #[inline]
    pub fn is_strip_closed(&self, strip: StripId<I>) -> bool {
        self.strips[strip.index()].closed
    }

    /// The polyline through the midpoints of a strip's edges.
    ///
    /// Closed strips repeat the first midpoint at the end.
    pub fn strip_edge_polyline(
        &self,
        mesh: &HalfEdgeMesh<I>,
        strip: StripId<I>,
    ) -> Vec<Point3<f64>> {
        let data = &self.strips[strip.index()];
        let mut polyline: Vec<Point3<f64>> = data
            .edges
            .iter()
            .map(|&(u, v)| mesh.edge_midpoint(u, v))
            .collect();
        if data.closed {
            if let Some(&first) = polyline.first() {
                polyline.push(first);
            }
        }
        polyline
    }

    /// The polyline through the centroids of a strip's faces.
    ///
    /// Closed strips repeat the first centroid at the end.
    pub fn strip_face_polyline(
        &self,
        mesh: &HalfEdgeMesh<I>,
        strip: StripId<I>,
    ) -> Vec<Point3<f64>> {
        let data = &self.strips[strip.index()];
        let mut polyline: Vec<Point3<f64>> = data
            .faces
            .iter()
            .map(|&face| mesh.face_centroid(face))
            .collect();
        if data.closed {
            if let Some(&first) = polyline.first() {
                polyline.push(first);
            }
        }
        polyline
    }

    /// The two rails of a strip as vertex chains.
    ///
    /// The first chain holds the start vertices of the strip's directed
    /// edges, the second the end vertices; closed strips wrap both.
    pub fn strip_contour_polyedges(
        &self,
        strip: StripId<I>,
    ) -> (Vec<VertexId<I>>, Vec<VertexId<I>>) {
        let data = &self.strips[strip.index()];
        let mut starts: Vec<VertexId<I>> = data.edges.iter().map(|&(u, _)| u).collect();
        let mut ends: Vec<VertexId<I>> = data.edges.iter().map(|&(_, v)| v).collect();
        if data.closed {
            if let Some(&first) = starts.first() {
                starts.push(first);
            }
            if let Some(&first) = ends.first() {
                ends.push(first);
            }
        }
        (starts, ends)
    }

    /// The two rails of a strip as coordinate polylines.
    pub fn strip_contour_polylines(
        &self,
        mesh: &HalfEdgeMesh<I>,
        strip: StripId<I>,
    ) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
        let (starts, ends) = self.strip_contour_polyedges(strip);
        (
            starts.iter().map(|&v| *mesh.position(v)).collect(),
            ends.iter().map(|&v| *mesh.position(v)).collect(),
        )
    }

    /// Rewrite a vertex in the recorded strip edges.
    ///
    /// Patches the index after the same substitution was applied to the
    /// mesh. With `strips` as `None` every strip is rewritten, otherwise
    /// only the listed ones.
    pub fn substitute_vertex_in_strips(
        &mut self,
        old: VertexId<I>,
        new: VertexId<I>,
        strips: Option<&[StripId<I>]>,
    ) {
        let targets: Vec<usize> = match strips {
            Some(list) => list.iter().map(|s| s.index()).collect(),
            None => (0..self.strips.len()).collect(),
        };

        for index in targets {
            let strip = StripId::new(index);
            for position in 0..self.strips[index].edges.len() {
                let (u, v) = self.strips[index].edges[position];
                if u != old && v != old {
                    continue;
                }
                self.edge_to_strip.remove(&(u, v));
                self.edge_to_strip.remove(&(v, u));
                let nu = if u == old { new } else { u };
                let nv = if v == old { new } else { v };
                self.strips[index].edges[position] = (nu, nv);
                self.edge_to_strip.insert((nu, nv), strip);
                self.edge_to_strip.insert((nv, nu), strip);
            }
        }
    }

    /// Drop a face and its left-facing edges from the index.
    ///
    /// Patches the index for a face about to be deleted; call it while
    /// the face is still in the mesh so its edges can be identified.
    pub fn delete_face_in_strips(&mut self, mesh: &HalfEdgeMesh<I>, face: FaceId<I>) {
        for index in 0..self.strips.len() {
            let mut dropped = Vec::new();
            self.strips[index].edges.retain(|&(u, v)| {
                if mesh.halfedge_face(u, v) == Some(face) {
                    dropped.push((u, v));
                    false
                } else {
                    true
                }
            });
            for (u, v) in dropped {
                self.edge_to_strip.remove(&(u, v));
                self.edge_to_strip.remove(&(v, u));
            }
            self.strips[index].faces.retain(|&f| f != face);
        }
        self.face_to_strips.remove(&face);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_single_quad() -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::new();
        let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let v3 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[v0, v1, v2, v3]).unwrap();
        mesh
    }

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

    fn create_cube_mesh() -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::new();
        let positions = [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 1.0),
            (0.0, 1.0, 1.0),
        ];
        let v: Vec<_> = positions
            .iter()
            .map(|&(x, y, z)| mesh.add_vertex(Point3::new(x, y, z)))
            .collect();
        let faces = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ];
        for face in &faces {
            let cycle = face.map(|i| v[i]);
            mesh.add_face(&cycle).unwrap();
        }
        mesh
    }

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

    fn edge_ids(edges: &[(VertexId<u32>, VertexId<u32>)]) -> Vec<(usize, usize)> {
        edges.iter().map(|&(u, v)| (u.index(), v.index())).collect()
    }

    #[test]
    fn test_collect_strip_open() {
        let mesh = create_grid_mesh(2, 2);
        let edges = collect_strip(&mesh, VertexId::new(1), VertexId::new(4)).unwrap();
        assert_eq!(edge_ids(&edges), vec![(2, 5), (1, 4), (0, 3)]);
    }

    #[test]
    fn test_collect_strip_closed() {
        let mesh = create_ring_mesh();
        let edges = collect_strip(&mesh, VertexId::new(0), VertexId::new(4)).unwrap();
        assert_eq!(edge_ids(&edges), vec![(0, 4), (3, 7), (2, 6), (1, 5)]);
    }

    #[test]
    fn test_collect_strip_missing_edge() {
        let mesh = create_single_quad();
        let result = collect_strip(&mesh, VertexId::new(0), VertexId::new(2));
        assert!(matches!(result, Err(MeshError::EdgeNotFound { u: 0, v: 2 })));
    }

    #[test]
    fn test_single_quad_has_two_strips() {
        let mesh = create_single_quad();
        let strips = StripIndex::build(&mesh).unwrap();

        assert_eq!(strips.num_strips(), 2);
        for strip in strips.strip_ids() {
            assert_eq!(strips.strip_edges(strip).len(), 2);
            assert_eq!(strips.strip_faces(strip).len(), 1);
            assert!(!strips.is_strip_closed(strip));
        }
        let pair = strips.face_strips(FaceId::new(0)).unwrap();
        assert_ne!(pair.0, pair.1);
    }

    #[test]
    fn test_grid_has_four_strips() {
        let mesh = create_grid_mesh(2, 2);
        let strips = StripIndex::build(&mesh).unwrap();

        assert_eq!(strips.num_strips(), 4);
        for strip in strips.strip_ids() {
            assert_eq!(strips.strip_edges(strip).len(), 3);
            assert_eq!(strips.strip_faces(strip).len(), 2);
            assert!(!strips.is_strip_closed(strip));
        }
    }

    #[test]
    fn test_cube_strips_are_closed() {
        let mesh = create_cube_mesh();
        let strips = StripIndex::build(&mesh).unwrap();

        assert_eq!(strips.num_strips(), 3);
        for strip in strips.strip_ids() {
            assert_eq!(strips.strip_edges(strip).len(), 4);
            assert_eq!(strips.strip_faces(strip).len(), 4);
            assert!(strips.is_strip_closed(strip));
        }
    }

    #[test]
    fn test_strips_partition_edges() {
        let mesh = create_grid_mesh(3, 2);
        let strips = StripIndex::build(&mesh).unwrap();

        let mut covered: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut total = 0;
        for strip in strips.strip_ids() {
            for &(u, v) in strips.strip_edges(strip) {
                let (u, v) = (u.index(), v.index());
                covered.insert((u.min(v), u.max(v)));
                total += 1;
            }
        }
        assert_eq!(covered.len(), mesh.num_edges());
        assert_eq!(total, mesh.num_edges());

        for (u, v) in mesh.edges() {
            assert!(strips.edge_strip(u, v).is_some());
            assert_eq!(strips.edge_strip(u, v), strips.edge_strip(v, u));
        }
    }

    #[test]
    fn test_face_strips_are_transversal() {
        let mesh = create_grid_mesh(2, 2);
        let strips = StripIndex::build(&mesh).unwrap();

        for face in mesh.face_ids() {
            let (first, second) = strips.face_strips(face).unwrap();
            assert_ne!(first, second);
        }
    }

    #[test]
    fn test_strip_edge_polyline_closed_wraps() {
        let mesh = create_ring_mesh();
        let strips = StripIndex::build(&mesh).unwrap();

        let ring = strips
            .strip_ids()
            .find(|&s| strips.is_strip_closed(s))
            .unwrap();
        let polyline = strips.strip_edge_polyline(&mesh, ring);
        assert_eq!(polyline.len(), 5);
        assert_eq!(polyline[0], polyline[4]);
        for point in &polyline {
            assert_eq!(point.y, 0.5);
        }

        let centroids = strips.strip_face_polyline(&mesh, ring);
        assert_eq!(centroids.len(), 5);
        assert_eq!(centroids[0], centroids[4]);
    }

    #[test]
    fn test_strip_contours_are_rails() {
        let mesh = create_grid_mesh(2, 2);
        let strips = StripIndex::build(&mesh).unwrap();

        let strip = strips.edge_strip(VertexId::new(1), VertexId::new(4)).unwrap();
        let (starts, ends) = strips.strip_contour_polyedges(strip);
        assert_eq!(starts.iter().map(|v| v.index()).collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(ends.iter().map(|v| v.index()).collect::<Vec<_>>(), vec![0, 1, 2]);

        let (left, right) = strips.strip_contour_polylines(&mesh, strip);
        assert_eq!(left.len(), 3);
        assert_eq!(right.len(), 3);
        assert_eq!(left[0], *mesh.position(VertexId::new(3)));
        assert_eq!(right[0], *mesh.position(VertexId::new(0)));
    }

    #[test]
    fn test_build_rejects_empty_and_non_quad() {
        let empty = HalfEdgeMesh::<u32>::new();
        assert!(matches!(StripIndex::build(&empty), Err(MeshError::EmptyMesh)));

        let mut tri = HalfEdgeMesh::<u32>::new();
        let a = tri.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = tri.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = tri.add_vertex(Point3::new(0.0, 1.0, 0.0));
        tri.add_face(&[a, b, c]).unwrap();
        assert!(matches!(StripIndex::build(&tri), Err(MeshError::NotAQuadMesh)));
    }

    #[test]
    fn test_substitute_vertex_in_strips() {
        let mesh = create_single_quad();
        let mut strips = StripIndex::build(&mesh).unwrap();

        let old = VertexId::new(1);
        let new = VertexId::new(9);
        let strip = strips.edge_strip(VertexId::new(0), old).unwrap();
        strips.substitute_vertex_in_strips(old, new, None);

        assert_eq!(strips.edge_strip(VertexId::new(0), old), None);
        assert_eq!(strips.edge_strip(VertexId::new(0), new), Some(strip));
        for s in strips.strip_ids() {
            for &(u, v) in strips.strip_edges(s) {
                assert_ne!(u, old);
                assert_ne!(v, old);
            }
        }
    }

    #[test]
    fn test_delete_face_in_strips() {
        let mesh = create_grid_mesh(2, 1);
        let mut strips = StripIndex::build(&mesh).unwrap();

        let face = FaceId::new(0);
        strips.delete_face_in_strips(&mesh, face);

        assert_eq!(strips.face_strips(face), None);
        for strip in strips.strip_ids() {
            assert!(!strips.strip_faces(strip).contains(&face));
            for &(u, v) in strips.strip_edges(strip) {
                assert_ne!(mesh.halfedge_face(u, v), Some(face));
            }
        }
    }
}
