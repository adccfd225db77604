//! Half-edge mesh data structure.
//!
//! This module provides a directed half-edge representation for polygonal
//! meshes, specialized for quad topology work. Instead of explicit twin/next
//! pointers, adjacency is stored as a map from directed vertex pairs `(u, v)`
//! to the face on the left of `u -> v`.
//!
//! # Structure
//!
//! - Each face stores its full vertex cycle in counter-clockwise order
//! - Each edge appears as two directed **halfedges** `(u, v)` and `(v, u)`
//! - A halfedge maps to `Some(face)` when a face lies on its left, and to
//!   `None` when it borders the outside of the mesh
//!
//! # Boundary Handling
//!
//! A boundary edge has exactly one `None` side. A vertex is on the boundary
//! when at least one of its outgoing halfedges has no face.
//!
//! # Determinism
//!
//! Halfedges are kept in a `BTreeMap`, so edge and neighbor iteration always
//! runs in ascending vertex order and algorithms built on this mesh produce
//! the same result on every run.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use crate::error::{MeshError, Result};

use super::index::{FaceId, MeshIndex, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A face in the half-edge mesh.
///
/// Faces store their full vertex cycle in counter-clockwise order. Quads are
/// stored inline; higher-degree faces spill to the heap.
#[derive(Debug, Clone)]
pub struct Face<I: MeshIndex = u32> {
    /// The vertex cycle of this face, counter-clockwise.
    pub vertices: SmallVec<[VertexId<I>; 4]>,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face from a vertex cycle.
    pub fn new(vertices: SmallVec<[VertexId<I>; 4]>) -> Self {
        Self { vertices }
    }

    /// The number of vertices in the face cycle.
    #[inline]
    pub fn degree(&self) -> usize {
        self.vertices.len()
    }
}

/// A half-edge mesh for quad topology processing.
///
/// Vertices and faces live in slot arrays where deletion leaves a hole, so
/// IDs stay stable across mutations and are never reused. The halfedge map
/// stores, for every directed pair `(u, v)`, the face on the left of
/// `u -> v`, or `None` when that side is open.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    /// All vertex slots in the mesh. Deleted vertices leave a `None` hole.
    pub(crate) vertices: Vec<Option<Vertex>>,

    /// All face slots in the mesh. Deleted faces leave a `None` hole.
    pub(crate) faces: Vec<Option<Face<I>>>,

    /// Directed halfedge map: `(u, v)` to the face on the left of `u -> v`.
    pub(crate) halfedge: BTreeMap<(VertexId<I>, VertexId<I>), Option<FaceId<I>>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            halfedge: BTreeMap::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            faces: Vec::with_capacity(num_faces),
            halfedge: BTreeMap::new(),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of live vertices.
    ///
    /// Deleted slots are not counted.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_some()).count()
    }

    /// Get the number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.iter().filter(|f| f.is_some()).count()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.halfedge.len() / 2
    }

    /// Get a vertex by ID.
    ///
    /// Panics if the vertex does not exist.
    #[inline]
    pub fn vertex(&self, v: VertexId<I>) -> &Vertex {
        self.vertices[v.index()].as_ref().expect("vertex does not exist")
    }

    /// Get a mutable vertex by ID.
    ///
    /// Panics if the vertex does not exist.
    #[inline]
    pub fn vertex_mut(&mut self, v: VertexId<I>) -> &mut Vertex {
        self.vertices[v.index()].as_mut().expect("vertex does not exist")
    }

    /// Get a face by ID.
    ///
    /// Panics if the face does not exist.
    #[inline]
    pub fn face(&self, f: FaceId<I>) -> &Face<I> {
        self.faces[f.index()].as_ref().expect("face does not exist")
    }

    /// Check if a vertex ID refers to a live vertex.
    #[inline]
    pub fn has_vertex(&self, v: VertexId<I>) -> bool {
        v.is_valid() && v.index() < self.vertices.len() && self.vertices[v.index()].is_some()
    }

    /// Check if a face ID refers to a live face.
    #[inline]
    pub fn has_face(&self, f: FaceId<I>) -> bool {
        f.is_valid() && f.index() < self.faces.len() && self.faces[f.index()].is_some()
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    /// Get the vertex cycle of a face, counter-clockwise.
    #[inline]
    pub fn face_vertices(&self, f: FaceId<I>) -> &[VertexId<I>] {
        &self.face(f).vertices
    }

    /// Get the number of vertices in a face cycle.
    #[inline]
    pub fn face_degree(&self, f: FaceId<I>) -> usize {
        self.face(f).degree()
    }

    // ==================== Topology Queries ====================

    /// Get the face on the left of the directed halfedge `u -> v`.
    ///
    /// Returns `None` both when the halfedge borders the outside of the mesh
    /// and when no edge connects `u` and `v`.
    #[inline]
    pub fn halfedge_face(&self, u: VertexId<I>, v: VertexId<I>) -> Option<FaceId<I>> {
        self.halfedge.get(&(u, v)).copied().flatten()
    }

    /// Get the faces on both sides of an edge.
    #[inline]
    pub fn edge_faces(
        &self,
        u: VertexId<I>,
        v: VertexId<I>,
    ) -> (Option<FaceId<I>>, Option<FaceId<I>>) {
        (self.halfedge_face(u, v), self.halfedge_face(v, u))
    }

    /// Check if an edge connects `u` and `v`.
    ///
    /// Halfedges are stored in pairs, so one direction is enough to check.
    #[inline]
    pub fn has_edge(&self, u: VertexId<I>, v: VertexId<I>) -> bool {
        self.halfedge.contains_key(&(u, v))
    }

    /// Check if a vertex is on the boundary.
    ///
    /// Isolated vertices are not considered boundary vertices.
    pub fn is_vertex_on_boundary(&self, v: VertexId<I>) -> bool {
        self.vertex_neighbors(v).any(|w| self.halfedge_face(v, w).is_none())
    }

    /// Check if an edge is on the boundary.
    pub fn is_edge_on_boundary(&self, u: VertexId<I>, v: VertexId<I>) -> bool {
        self.halfedge_face(u, v).is_none() || self.halfedge_face(v, u).is_none()
    }

    /// Get the vertex after `v` in the cycle of face `f`.
    ///
    /// Returns `None` if `v` is not part of the face.
    pub fn face_vertex_descendant(&self, f: FaceId<I>, v: VertexId<I>) -> Option<VertexId<I>> {
        let vs = self.face_vertices(f);
        let i = vs.iter().position(|&u| u == v)?;
        Some(vs[(i + 1) % vs.len()])
    }

    /// Get the vertex before `v` in the cycle of face `f`.
    ///
    /// Returns `None` if `v` is not part of the face.
    pub fn face_vertex_ancestor(&self, f: FaceId<I>, v: VertexId<I>) -> Option<VertexId<I>> {
        let vs = self.face_vertices(f);
        let i = vs.iter().position(|&u| u == v)?;
        Some(vs[(i + vs.len() - 1) % vs.len()])
    }

    /// Get the directed halfedges of a face, in cycle order.
    pub fn face_halfedges(&self, f: FaceId<I>) -> Vec<(VertexId<I>, VertexId<I>)> {
        let vs = self.face_vertices(f);
        (0..vs.len()).map(|i| (vs[i], vs[(i + 1) % vs.len()])).collect()
    }

    /// Get the number of edges incident to a vertex.
    #[inline]
    pub fn vertex_degree(&self, v: VertexId<I>) -> usize {
        self.vertex_neighbors(v).count()
    }

    /// Check if every face of the mesh is a quad.
    pub fn is_quad_mesh(&self) -> bool {
        self.faces().all(|(_, face)| face.degree() == 4)
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex IDs in ascending order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VertexId::new(i), v)))
    }

    /// Iterate over all live face IDs in ascending order.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_some())
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over all live faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|f| (FaceId::new(i), f)))
    }

    /// Iterate over all edges as canonical `(u, v)` pairs with `u < v`.
    ///
    /// Edges are visited in ascending order, so iteration is deterministic.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId<I>, VertexId<I>)> + '_ {
        self.halfedge.keys().filter(|(u, v)| u < v).copied()
    }

    /// Iterate over the neighbors of a vertex in ascending ID order.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.halfedge
            .range((v, VertexId::new(0))..=(v, VertexId::invalid()))
            .map(|(&(_, w), _)| w)
    }

    /// Get the neighbors of a vertex in counter-clockwise order.
    ///
    /// For boundary vertices the fan starts at one boundary neighbor and
    /// ends at the other. For interior vertices the starting neighbor is the
    /// one with the lowest ID.
    pub fn ordered_vertex_neighbors(&self, v: VertexId<I>) -> Vec<VertexId<I>> {
        let nbrs: Vec<VertexId<I>> = self.vertex_neighbors(v).collect();
        if nbrs.len() < 2 {
            return nbrs;
        }

        // On the boundary the fan must start at the neighbor whose halfedge
        // towards v has no face, otherwise the walk would stop early.
        let start = nbrs
            .iter()
            .copied()
            .find(|&w| self.halfedge_face(w, v).is_none())
            .unwrap_or(nbrs[0]);

        let mut ordered = vec![start];
        while ordered.len() < nbrs.len() {
            let cur = ordered[ordered.len() - 1];
            let f = match self.halfedge_face(v, cur) {
                Some(f) => f,
                None => break,
            };
            let next = match self.face_vertex_ancestor(f, v) {
                Some(w) => w,
                None => break,
            };
            if next == start {
                break;
            }
            ordered.push(next);
        }
        ordered
    }

    /// Get the faces incident to a vertex in ascending neighbor order.
    pub fn vertex_faces(&self, v: VertexId<I>) -> Vec<FaceId<I>> {
        self.vertex_neighbors(v)
            .filter_map(|w| self.halfedge_face(v, w))
            .collect()
    }

    /// Get the faces incident to a vertex in counter-clockwise order.
    pub fn ordered_vertex_faces(&self, v: VertexId<I>) -> Vec<FaceId<I>> {
        self.ordered_vertex_neighbors(v)
            .into_iter()
            .filter_map(|w| self.halfedge_face(v, w))
            .collect()
    }

    /// Get all boundary vertices in ascending ID order.
    pub fn boundary_vertices(&self) -> Vec<VertexId<I>> {
        self.vertex_ids()
            .filter(|&v| self.is_vertex_on_boundary(v))
            .collect()
    }

    // ==================== Geometry ====================

    /// Compute the length of an edge.
    pub fn edge_length(&self, u: VertexId<I>, v: VertexId<I>) -> f64 {
        (self.position(v) - self.position(u)).norm()
    }

    /// Compute the vector from `u` to `v`.
    pub fn edge_vector(&self, u: VertexId<I>, v: VertexId<I>) -> Vector3<f64> {
        self.position(v) - self.position(u)
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, u: VertexId<I>, v: VertexId<I>) -> Point3<f64> {
        self.edge_point(u, v, 0.5)
    }

    /// Compute a point along an edge at parameter `t`.
    ///
    /// `t = 0` is at `u`, `t = 1` is at `v`.
    pub fn edge_point(&self, u: VertexId<I>, v: VertexId<I>, t: f64) -> Point3<f64> {
        let p0 = self.position(u);
        let p1 = self.position(v);
        Point3::from(p0.coords + (p1.coords - p0.coords) * t)
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let vs = self.face_vertices(f);
        let mut sum = Vector3::zeros();
        for &v in vs {
            sum += self.position(v).coords;
        }
        Point3::from(sum / vs.len() as f64)
    }

    /// Compute the area of a face by fan triangulation.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let vs = self.face_vertices(f);
        let p0 = self.position(vs[0]).coords;
        let mut total = Vector3::zeros();
        for i in 1..vs.len() - 1 {
            let p1 = self.position(vs[i]).coords;
            let p2 = self.position(vs[i + 1]).coords;
            total += (p1 - p0).cross(&(p2 - p0));
        }
        0.5 * total.norm()
    }

    /// Check if a boundary vertex is a kink.
    ///
    /// A kink is a boundary vertex where the boundary direction turns by
    /// more than `threshold` radians. Returns `false` for interior vertices
    /// and for vertices without exactly two incident boundary edges.
    pub fn is_vertex_kink(&self, v: VertexId<I>, threshold: f64) -> bool {
        if !self.is_vertex_on_boundary(v) {
            return false;
        }
        let nbrs: Vec<VertexId<I>> = self
            .vertex_neighbors(v)
            .filter(|&w| self.is_edge_on_boundary(v, w))
            .collect();
        if nbrs.len() != 2 {
            return false;
        }
        let a = self.edge_vector(v, nbrs[0]);
        let b = self.edge_vector(v, nbrs[1]);
        PI - a.angle(&b) > threshold
    }

    /// Find all boundary vertices where the boundary turns by more than
    /// `threshold` radians, in ascending ID order.
    pub fn kinks(&self, threshold: f64) -> Vec<VertexId<I>> {
        self.vertex_ids()
            .filter(|&v| self.is_vertex_kink(v, threshold))
            .collect()
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Some(Vertex::new(position)));
        id
    }

    /// Add a new face from a vertex cycle and return its ID.
    ///
    /// Consecutive duplicate vertices are dropped, including across the
    /// cycle seam. The cleaned cycle must have at least three vertices and
    /// reference live vertices only; on error the mesh is left untouched.
    pub fn add_face(&mut self, vertices: &[VertexId<I>]) -> Result<FaceId<I>> {
        let id = FaceId::new(self.faces.len());
        let cycle = self.normalize_face_cycle(id.index(), vertices)?;
        self.register_face_cycle(id, &cycle);
        self.faces.push(Some(Face::new(cycle)));
        Ok(id)
    }

    /// Validate and clean a face cycle before it is registered.
    fn normalize_face_cycle(
        &self,
        face: usize,
        vertices: &[VertexId<I>],
    ) -> Result<SmallVec<[VertexId<I>; 4]>> {
        let mut cycle: SmallVec<[VertexId<I>; 4]> = SmallVec::with_capacity(vertices.len());
        for &v in vertices {
            if !self.has_vertex(v) {
                return Err(MeshError::InvalidVertexIndex {
                    face,
                    vertex: v.index(),
                });
            }
            if cycle.last() != Some(&v) {
                cycle.push(v);
            }
        }
        while cycle.len() > 1 && cycle.first() == cycle.last() {
            cycle.pop();
        }
        if cycle.len() < 3 {
            return Err(MeshError::FaceTooSmall {
                face,
                count: cycle.len(),
            });
        }
        // A repeated vertex would overwrite halfedge entries of the same face.
        for (i, &v) in cycle.iter().enumerate() {
            if cycle[i + 1..].contains(&v) {
                return Err(MeshError::DuplicateVertexInFace {
                    face,
                    vertex: v.index(),
                });
            }
        }
        Ok(cycle)
    }

    /// Write the halfedge entries of a face cycle.
    fn register_face_cycle(&mut self, f: FaceId<I>, cycle: &[VertexId<I>]) {
        for i in 0..cycle.len() {
            let u = cycle[i];
            let v = cycle[(i + 1) % cycle.len()];
            self.halfedge.insert((u, v), Some(f));
            self.halfedge.entry((v, u)).or_insert(None);
        }
    }

    /// Clear the halfedge entries of a face cycle.
    ///
    /// Halfedges whose opposite side is also open are removed entirely.
    fn unregister_face_cycle(&mut self, cycle: &[VertexId<I>]) {
        for i in 0..cycle.len() {
            let u = cycle[i];
            let v = cycle[(i + 1) % cycle.len()];
            let reverse_open = matches!(self.halfedge.get(&(v, u)), None | Some(None));
            if reverse_open {
                self.halfedge.remove(&(u, v));
                self.halfedge.remove(&(v, u));
            } else {
                self.halfedge.insert((u, v), None);
            }
        }
    }

    // ==================== Mutation ====================

    /// Delete a face from the mesh.
    ///
    /// The halfedges of the face become boundary halfedges; edges left with
    /// no face on either side are removed entirely. The face slot is never
    /// reused.
    ///
    /// Panics if the face does not exist.
    pub fn delete_face(&mut self, f: FaceId<I>) {
        let cycle = self.face(f).vertices.clone();
        self.unregister_face_cycle(&cycle);
        self.faces[f.index()] = None;
    }

    /// Replace the vertex cycle of an existing face, keeping its ID.
    ///
    /// On error the mesh is left untouched.
    ///
    /// Panics if the face does not exist.
    pub fn replace_face(&mut self, f: FaceId<I>, vertices: &[VertexId<I>]) -> Result<()> {
        let cycle = self.normalize_face_cycle(f.index(), vertices)?;
        let old = self.face(f).vertices.clone();
        self.unregister_face_cycle(&old);
        self.register_face_cycle(f, &cycle);
        self.faces[f.index()] = Some(Face::new(cycle));
        Ok(())
    }

    /// Replace all occurrences of `old` with `new` in the given faces.
    ///
    /// When `faces` is `None`, every face incident to `old` is rewritten.
    /// All replacement cycles are validated before any face is touched, so
    /// on error the mesh is left untouched.
    pub fn substitute_vertex_in_faces(
        &mut self,
        old: VertexId<I>,
        new: VertexId<I>,
        faces: Option<&[FaceId<I>]>,
    ) -> Result<()> {
        let targets: Vec<FaceId<I>> = match faces {
            Some(list) => list.to_vec(),
            None => self.vertex_faces(old),
        };

        let mut planned: Vec<(FaceId<I>, SmallVec<[VertexId<I>; 4]>)> =
            Vec::with_capacity(targets.len());
        for f in targets {
            let cycle: Vec<VertexId<I>> = self
                .face_vertices(f)
                .iter()
                .map(|&w| if w == old { new } else { w })
                .collect();
            planned.push((f, self.normalize_face_cycle(f.index(), &cycle)?));
        }

        for (f, cycle) in planned {
            let old_cycle = self.face(f).vertices.clone();
            self.unregister_face_cycle(&old_cycle);
            self.register_face_cycle(f, &cycle);
            self.faces[f.index()] = Some(Face::new(cycle));
        }
        Ok(())
    }

    /// Remove all isolated vertices and return how many were removed.
    ///
    /// Vertex slots are never reused.
    pub fn cull_vertices(&mut self) -> usize {
        let isolated: Vec<usize> = self
            .vertex_ids()
            .filter(|&v| self.vertex_degree(v) == 0)
            .map(|v| v.index())
            .collect();
        for &i in &isolated {
            self.vertices[i] = None;
        }
        isolated.len()
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        // Every face cycle must be registered in the halfedge map
        for (fid, face) in self.faces() {
            if face.degree() < 3 {
                return false;
            }
            let n = face.vertices.len();
            for i in 0..n {
                let u = face.vertices[i];
                let v = face.vertices[(i + 1) % n];
                if !self.has_vertex(u) {
                    return false;
                }
                if self.halfedge.get(&(u, v)) != Some(&Some(fid)) {
                    return false;
                }
            }
        }

        // Every halfedge must have live endpoints, its reverse, and at
        // least one real face between the pair
        for (&(u, v), &face) in &self.halfedge {
            if !self.has_vertex(u) || !self.has_vertex(v) {
                return false;
            }
            let reverse = match self.halfedge.get(&(v, u)) {
                Some(r) => *r,
                None => return false,
            };
            if face.is_none() && reverse.is_none() {
                return false;
            }
            if let Some(f) = face {
                if !self.has_face(f) {
                    return false;
                }
                match self.face_vertex_descendant(f, u) {
                    Some(w) if w == v => {}
                    _ => return false,
                }
            }
        }

        true
    }
}
