//! Mesh construction utilities.
//!
//! This module provides functions for building half-edge meshes from
//! face-vertex lists, from soups of line segments, and from networks of
//! polylines, plus the reverse conversions back to plain vertex and face
//! lists.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Point3;

use crate::error::{MeshError, Result};

use super::halfedge::HalfEdgeMesh;
use super::index::{MeshIndex, VertexId};
use super::weld::{geometric_key, GeometricKey, WeldOptions};

/// Build a half-edge mesh from vertices and faces of arbitrary degree.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of face cycles as vertex indices, counter-clockwise
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid.
///
/// # Example
/// ```
/// use quadrille::mesh::{build_from_faces, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.5, 2.0, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3], vec![3, 2, 4]];
///
/// let mesh: HalfEdgeMesh = build_from_faces(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 5);
/// assert_eq!(mesh.num_faces(), 2);
/// ```
pub fn build_from_faces<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex {
                    face: fi,
                    vertex: vi,
                });
            }
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    for face in faces {
        let cycle: Vec<VertexId<I>> = face.iter().map(|&vi| vertex_ids[vi]).collect();
        mesh.add_face(&cycle)?;
    }

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and quad faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of quad faces, each as [v0, v1, v2, v3] indices
///   (counter-clockwise)
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid.
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex {
                    face: fi,
                    vertex: vi,
                });
            }
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    for face in faces {
        let cycle = face.map(|vi| vertex_ids[vi]);
        mesh.add_face(&cycle)?;
    }

    Ok(mesh)
}

/// Build a half-edge mesh from a soup of line segments.
///
/// The segments are interpreted as a planar subdivision in the XY plane:
/// endpoints are merged by [`geometric_key`], the faces of the resulting
/// line network are traced, and the unbounded outer region is discarded.
/// Dangling chains of segments that do not border any face are dropped.
///
/// The input is expected to form a single connected, hole-free network
/// whose segments only meet at shared endpoints.
///
/// # Arguments
/// * `lines` - List of segments as endpoint pairs
/// * `options` - Welding options controlling endpoint merging
///
/// # Returns
/// A half-edge mesh, or an error if the network encloses no face.
pub fn build_from_lines<I: MeshIndex>(
    lines: &[(Point3<f64>, Point3<f64>)],
    options: &WeldOptions,
) -> Result<HalfEdgeMesh<I>> {
    if lines.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Merge endpoints into nodes.
    let mut node_ids: BTreeMap<GeometricKey, usize> = BTreeMap::new();
    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut adjacency: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for &(start, end) in lines {
        let a = node_id(&mut node_ids, &mut positions, &start, options.precision);
        let b = node_id(&mut node_ids, &mut positions, &end, options.precision);
        if a == b {
            continue;
        }
        adjacency.entry(a).or_default().insert(b);
        adjacency.entry(b).or_default().insert(a);
    }

    // Peel off dangling chains; they never border a face.
    let mut stack: Vec<usize> = adjacency
        .iter()
        .filter(|(_, nbrs)| nbrs.len() == 1)
        .map(|(&node, _)| node)
        .collect();
    while let Some(node) = stack.pop() {
        let lone = adjacency
            .get(&node)
            .filter(|nbrs| nbrs.len() == 1)
            .and_then(|nbrs| nbrs.iter().next().copied());
        let neighbor = match lone {
            Some(w) => w,
            None => continue,
        };
        adjacency.remove(&node);
        if let Some(nbrs) = adjacency.get_mut(&neighbor) {
            nbrs.remove(&node);
            if nbrs.len() == 1 {
                stack.push(neighbor);
            } else if nbrs.is_empty() {
                adjacency.remove(&neighbor);
            }
        }
    }

    // Counter-clockwise neighbor fans from the XY projection.
    let mut fans: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (&node, nbrs) in &adjacency {
        let origin = positions[node];
        let mut fan: Vec<usize> = nbrs.iter().copied().collect();
        fan.sort_by(|&a, &b| {
            let pa = positions[a] - origin;
            let pb = positions[b] - origin;
            pa.y.atan2(pa.x).total_cmp(&pb.y.atan2(pb.x))
        });
        fans.insert(node, fan);
    }

    // Trace the faces of the subdivision. Following the clockwise-previous
    // neighbor at every step walks interior faces counter-clockwise and the
    // outer face clockwise.
    let mut visited: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut cycles: Vec<Vec<usize>> = Vec::new();
    for (&node, fan) in &fans {
        for &first in fan {
            if visited.contains(&(node, first)) {
                continue;
            }
            let mut cycle = Vec::new();
            let mut u = node;
            let mut v = first;
            loop {
                visited.insert((u, v));
                cycle.push(u);
                let fan_v = &fans[&v];
                let i = match fan_v.iter().position(|&w| w == u) {
                    Some(i) => i,
                    None => {
                        cycle.clear();
                        break;
                    }
                };
                let w = fan_v[(i + fan_v.len() - 1) % fan_v.len()];
                u = v;
                v = w;
                if (u, v) == (node, first) {
                    break;
                }
            }
            if !cycle.is_empty() {
                cycles.push(cycle);
            }
        }
    }
    if cycles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // The outer face is the one traced clockwise around everything, which
    // makes its signed area the most negative.
    let mut outer = 0;
    let mut smallest = f64::INFINITY;
    for (i, cycle) in cycles.iter().enumerate() {
        let area = cycle_area_xy(cycle, &positions);
        if area < smallest {
            smallest = area;
            outer = i;
        }
    }
    cycles.remove(outer);
    if cycles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mut used: BTreeSet<usize> = BTreeSet::new();
    for cycle in &cycles {
        used.extend(cycle.iter().copied());
    }

    let mut mesh = HalfEdgeMesh::with_capacity(used.len(), cycles.len());
    let mut remap: BTreeMap<usize, VertexId<I>> = BTreeMap::new();
    for &node in &used {
        remap.insert(node, mesh.add_vertex(positions[node]));
    }

    let mut added = 0usize;
    for cycle in &cycles {
        let ids: Vec<VertexId<I>> = cycle.iter().map(|&node| remap[&node]).collect();
        match mesh.add_face(&ids) {
            Ok(_) => added += 1,
            Err(MeshError::FaceTooSmall { .. }) | Err(MeshError::DuplicateVertexInFace { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    if added == 0 {
        return Err(MeshError::EmptyMesh);
    }

    log::debug!(
        "built mesh from {} lines: {} vertices, {} faces",
        lines.len(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Build a coarse mesh from discretised boundary and feature polylines.
///
/// Each polyline becomes one edge of the result: a fine mesh is first
/// traced from all polyline segments with [`build_from_lines`], then only
/// the polyline extremities are kept as vertices. Faces bounded entirely
/// by boundary polyline points are considered outside the surface and are
/// dropped, so at least one feature polyline must run through the interior.
///
/// # Arguments
/// * `boundary_polylines` - Polylines along the outer boundary, as point
///   lists
/// * `feature_polylines` - Interior polylines subdividing the surface
/// * `options` - Welding options controlling point merging
///
/// # Returns
/// A half-edge mesh whose vertices are polyline extremities, or an error
/// if no face survives.
pub fn build_from_polylines<I: MeshIndex>(
    boundary_polylines: &[Vec<Point3<f64>>],
    feature_polylines: &[Vec<Point3<f64>>],
    options: &WeldOptions,
) -> Result<HalfEdgeMesh<I>> {
    let mut corner_ids: BTreeMap<GeometricKey, usize> = BTreeMap::new();
    let mut corners: Vec<Point3<f64>> = Vec::new();
    let mut lines: Vec<(Point3<f64>, Point3<f64>)> = Vec::new();

    for polyline in boundary_polylines.iter().chain(feature_polylines) {
        if polyline.len() < 2 {
            return Err(MeshError::invalid_param(
                "polyline",
                polyline.len(),
                "a polyline needs at least two points",
            ));
        }
        for point in [polyline[0], polyline[polyline.len() - 1]] {
            let key = geometric_key(&point, options.precision);
            if !corner_ids.contains_key(&key) {
                corner_ids.insert(key, corners.len());
                corners.push(point);
            }
        }
        for pair in polyline.windows(2) {
            lines.push((pair[0], pair[1]));
        }
    }

    let mut boundary_keys: BTreeSet<GeometricKey> = BTreeSet::new();
    for polyline in boundary_polylines {
        for point in polyline {
            boundary_keys.insert(geometric_key(point, options.precision));
        }
    }

    let fine: HalfEdgeMesh<I> = build_from_lines(&lines, options)?;

    // Keep faces that touch at least one non-boundary point, reduced to
    // their polyline extremities.
    let mut faces: Vec<Vec<usize>> = Vec::new();
    for (_, face) in fine.faces() {
        let touches_interior = face
            .vertices
            .iter()
            .any(|v| !boundary_keys.contains(&geometric_key(fine.position(*v), options.precision)));
        if !touches_interior {
            continue;
        }
        let cycle: Vec<usize> = face
            .vertices
            .iter()
            .filter_map(|v| {
                corner_ids
                    .get(&geometric_key(fine.position(*v), options.precision))
                    .copied()
            })
            .collect();
        faces.push(cycle);
    }

    let mut mesh = HalfEdgeMesh::with_capacity(corners.len(), faces.len());
    let vertex_ids: Vec<VertexId<I>> = corners.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    let mut added = 0usize;
    for cycle in &faces {
        let ids: Vec<VertexId<I>> = cycle.iter().map(|&ci| vertex_ids[ci]).collect();
        match mesh.add_face(&ids) {
            Ok(_) => added += 1,
            Err(MeshError::FaceTooSmall { .. }) | Err(MeshError::DuplicateVertexInFace { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    if added == 0 {
        return Err(MeshError::EmptyMesh);
    }

    Ok(mesh)
}

/// Convert a half-edge mesh back to compact vertex and face lists.
///
/// Live vertices are renumbered consecutively in ascending id order, so
/// the output is a valid input for [`build_from_faces`] even after
/// deletions left gaps in the id space.
pub fn to_vertices_and_faces<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let key_index: BTreeMap<VertexId<I>, usize> = mesh
        .vertex_ids()
        .enumerate()
        .map(|(i, v)| (v, i))
        .collect();

    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
    let faces: Vec<Vec<usize>> = mesh
        .faces()
        .map(|(_, face)| face.vertices.iter().map(|v| key_index[v]).collect())
        .collect();

    (vertices, faces)
}

/// Convert a half-edge mesh to vertex and face maps keyed by id.
///
/// Unlike [`to_vertices_and_faces`] this keeps the original ids, gaps and
/// all, which makes it the right form for diffing a mesh before and after
/// an edit.
pub fn to_keyed_vertices_and_faces<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> (BTreeMap<usize, Point3<f64>>, BTreeMap<usize, Vec<usize>>) {
    let vertices: BTreeMap<usize, Point3<f64>> = mesh
        .vertices()
        .map(|(v, vertex)| (v.index(), vertex.position))
        .collect();
    let faces: BTreeMap<usize, Vec<usize>> = mesh
        .faces()
        .map(|(f, face)| {
            let cycle: Vec<usize> = face.vertices.iter().map(|v| v.index()).collect();
            (f.index(), cycle)
        })
        .collect();

    (vertices, faces)
}

fn node_id(
    node_ids: &mut BTreeMap<GeometricKey, usize>,
    positions: &mut Vec<Point3<f64>>,
    point: &Point3<f64>,
    precision: u32,
) -> usize {
    let key = geometric_key(point, precision);
    match node_ids.get(&key) {
        Some(&id) => id,
        None => {
            let id = positions.len();
            node_ids.insert(key, id);
            positions.push(*point);
            id
        }
    }
}

/// Signed area of a node cycle projected to the XY plane.
fn cycle_area_xy(cycle: &[usize], positions: &[Point3<f64>]) -> f64 {
    let mut area = 0.0;
    for i in 0..cycle.len() {
        let p = positions[cycle[i]];
        let q = positions[cycle[(i + 1) % cycle.len()]];
        area += p.x * q.y - q.x * p.y;
    }
    area / 2.0
}
