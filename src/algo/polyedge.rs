//! Polyedge traversal.
//!
//! A **polyedge** is a chain of edges crossing straight through regular
//! vertices: at a four-valent interior vertex it continues along the
//! opposite edge, along the boundary it follows the boundary edges. The
//! walk stops at singularities, so polyedges connect the structural
//! points of a quad mesh.
//!
//! - [`polyedge`]: the full chain through one edge
//! - [`polyedges`]: a deterministic cover of all edges by polyedges
//! - [`singularity_polyedges`]: the chains connected to singularities
//! - [`singularity_polyedge_decomposition`]: a patch decomposition from
//!   singularity chains plus boundary splits
//! - [`boundary_polyedges`]: the boundary loops of the mesh

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

use super::singularity::{is_vertex_singular, singularities};

/// The vertex opposite to `u` across `v`.
///
/// At a regular interior vertex this is the vertex two steps away in the
/// ordered neighbor cycle of `v`; at a regular boundary vertex reached
/// along a boundary edge it is the next vertex along the boundary.
/// Returns `None` when `v` is singular, or when the edge `(u, v)` arrives
/// at the boundary from the interior.
pub fn vertex_opposite_vertex<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u: VertexId<I>,
    v: VertexId<I>,
) -> Option<VertexId<I>> {
    if is_vertex_singular(mesh, v) {
        return None;
    }
    if mesh.is_vertex_on_boundary(v) {
        if !mesh.is_edge_on_boundary(u, v) {
            return None;
        }
        return mesh
            .vertex_neighbors(v)
            .find(|&w| w != u && mesh.is_edge_on_boundary(v, w));
    }
    let nbrs = mesh.ordered_vertex_neighbors(v);
    let i = nbrs.iter().position(|&w| w == u)?;
    Some(nbrs[(i + 2) % nbrs.len()])
}

/// The polyedge through the edge `(u0, v0)`.
///
/// Walks across regular vertices in both directions until it hits a
/// singularity or leaves the mesh. A closed polyedge repeats its first
/// vertex at the end.
///
/// # Errors
///
/// Returns [`MeshError::EdgeNotFound`] if `(u0, v0)` is not an edge of
/// the mesh.
pub fn polyedge<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    u0: VertexId<I>,
    v0: VertexId<I>,
) -> Result<Vec<VertexId<I>>> {
    if !mesh.has_edge(u0, v0) {
        return Err(MeshError::EdgeNotFound {
            u: u0.index(),
            v: v0.index(),
        });
    }
    Ok(walk(mesh, u0, v0))
}

fn walk<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, u0: VertexId<I>, v0: VertexId<I>) -> Vec<VertexId<I>> {
    let mut polyedge = vec![u0, v0];
    while polyedge.len() <= mesh.num_vertices() {
        // A closed loop ends where it started.
        if polyedge[0] == polyedge[polyedge.len() - 1] {
            break;
        }

        let u = polyedge[polyedge.len() - 2];
        let v = polyedge[polyedge.len() - 1];
        let mut next = vertex_opposite_vertex(mesh, u, v);

        // First extremity reached: flip and grow the other way.
        if next.is_none() {
            polyedge.reverse();
            let u = polyedge[polyedge.len() - 2];
            let v = polyedge[polyedge.len() - 1];
            next = vertex_opposite_vertex(mesh, u, v);
        }

        match next {
            Some(w) => polyedge.push(w),
            None => break,
        }
    }
    polyedge
}

/// Cover all edges of the mesh by polyedges.
///
/// Repeatedly walks the polyedge through the smallest uncovered edge, so
/// the cover is deterministic. Every edge belongs to exactly one of the
/// returned polyedges.
pub fn polyedges<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<VertexId<I>>> {
    let mut remaining: BTreeSet<(VertexId<I>, VertexId<I>)> = mesh.edges().collect();
    let mut result = Vec::new();

    while let Some(&(u, v)) = remaining.iter().next() {
        let polyedge = walk(mesh, u, v);
        for pair in polyedge.windows(2) {
            let key = if pair[0] < pair[1] {
                (pair[0], pair[1])
            } else {
                (pair[1], pair[0])
            };
            remaining.remove(&key);
        }
        result.push(polyedge);
    }

    result
}

/// The polyedges of the mesh as coordinate polylines.
pub fn polylines<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<Point3<f64>>> {
    polyedges(mesh)
        .iter()
        .map(|polyedge| polyedge.iter().map(|&v| *mesh.position(v)).collect())
        .collect()
}

/// The boundary loops of the mesh as closed vertex cycles.
///
/// Each loop starts at its smallest vertex and repeats it at the end.
/// Loops are returned in ascending order of their starting vertex.
pub fn boundary_polyedges<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<VertexId<I>>> {
    let mut visited: BTreeSet<VertexId<I>> = BTreeSet::new();
    let mut loops = Vec::new();

    for start in mesh.boundary_vertices() {
        if visited.contains(&start) {
            continue;
        }
        let mut cycle = vec![start];
        visited.insert(start);
        let mut current = start;
        loop {
            let next = mesh
                .vertex_neighbors(current)
                .find(|&w| mesh.halfedge_face(current, w).is_none());
            let w = match next {
                Some(w) => w,
                None => break,
            };
            cycle.push(w);
            if w == start {
                break;
            }
            visited.insert(w);
            current = w;
        }
        if cycle.len() > 2 && cycle[0] == cycle[cycle.len() - 1] {
            loops.push(cycle);
        }
    }

    loops
}

/// The boundary loops of the mesh as closed coordinate polylines.
pub fn boundary_polylines<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<Point3<f64>>> {
    boundary_polyedges(mesh)
        .iter()
        .map(|cycle| cycle.iter().map(|&v| *mesh.position(v)).collect())
        .collect()
}

/// The polyedges connected to singularities or along the boundary.
///
/// Polyedges running between regular vertices only are dropped; the rest
/// are split wherever two of them share a vertex, so the result is a set
/// of chains meeting only at their extremities.
pub fn singularity_polyedges<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<VertexId<I>>> {
    let kept: Vec<Vec<VertexId<I>>> = polyedges(mesh)
        .into_iter()
        .filter(|pe| {
            is_vertex_singular(mesh, pe[0])
                || is_vertex_singular(mesh, pe[pe.len() - 1])
                || mesh.is_edge_on_boundary(pe[0], pe[1])
        })
        .collect();

    split_at_shared_vertices(kept)
}

/// The singularity polyedges as coordinate polylines.
pub fn singularity_polylines<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<Point3<f64>>> {
    singularity_polyedges(mesh)
        .iter()
        .map(|polyedge| polyedge.iter().map(|&v| *mesh.position(v)).collect())
        .collect()
}

/// Options for [`singularity_polyedge_decomposition`].
#[derive(Debug, Clone)]
pub struct DecompositionOptions {
    /// Minimum number of split vertices per boundary loop.
    pub min_boundary_splits: usize,
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        Self {
            min_boundary_splits: 3,
        }
    }
}

impl DecompositionOptions {
    /// Create options with the specified minimum number of boundary splits.
    pub fn with_min_boundary_splits(mut self, min_boundary_splits: usize) -> Self {
        self.min_boundary_splits = min_boundary_splits;
        self
    }
}

/// Decompose the mesh into quad patches bounded by singularity polyedges.
///
/// Starts from the interior polyedges hanging off singularities, then
/// tops up every boundary loop to at least `min_boundary_splits` split
/// vertices: a loop without any split gets them evenly spaced, a loop
/// with one gets the rest spaced from it, and a loop with several gets
/// its longest arcs bisected. Every new split launches a polyedge into
/// the interior. The boundary polyedges are added last and everything is
/// split at shared vertices.
pub fn singularity_polyedge_decomposition<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &DecompositionOptions,
) -> Vec<Vec<VertexId<I>>> {
    let all = polyedges(mesh);
    let mut collected: Vec<Vec<VertexId<I>>> = all
        .iter()
        .filter(|pe| {
            (is_vertex_singular(mesh, pe[0]) || is_vertex_singular(mesh, pe[pe.len() - 1]))
                && !mesh.is_edge_on_boundary(pe[0], pe[1])
        })
        .cloned()
        .collect();

    let mut all_splits: BTreeSet<VertexId<I>> = singularities(mesh).into_iter().collect();
    let k = options.min_boundary_splits;

    for boundary in boundary_polyedges(mesh) {
        let cycle = &boundary[..boundary.len() - 1];
        let n = cycle.len();
        if n == 0 {
            continue;
        }

        let existing: BTreeSet<usize> =
            (0..n).filter(|&i| all_splits.contains(&cycle[i])).collect();
        let mut positions = existing.clone();

        if existing.is_empty() {
            for j in 0..k {
                positions.insert(j * n / k);
            }
        } else if existing.len() == 1 {
            if let Some(&anchor) = existing.iter().next() {
                for j in 1..k {
                    positions.insert((anchor + n - j * n / k) % n);
                }
            }
        } else {
            // Bisect the longest arc between consecutive splits until the
            // loop carries enough of them.
            while positions.len() < k {
                let sorted: Vec<usize> = positions.iter().copied().collect();
                let mut best_start = 0;
                let mut best_len = 0;
                for (t, &s) in sorted.iter().enumerate() {
                    let e = sorted[(t + 1) % sorted.len()];
                    let len = (e + n - s) % n;
                    if len > best_len {
                        best_len = len;
                        best_start = s;
                    }
                }
                let mid = (best_start + best_len / 2) % n;
                if !positions.insert(mid) {
                    break;
                }
            }
        }

        for &idx in positions.difference(&existing) {
            let split = cycle[idx];
            let interior = mesh
                .vertex_neighbors(split)
                .find(|&w| !mesh.is_edge_on_boundary(split, w));
            if let Some(w) = interior {
                let new_polyedge = walk(mesh, split, w);
                all_splits.extend(new_polyedge.iter().copied());
                collected.push(new_polyedge);
            }
        }
    }

    collected.extend(
        all.into_iter()
            .filter(|pe| mesh.is_edge_on_boundary(pe[0], pe[1])),
    );

    log::debug!("decomposition collected {} polyedges", collected.len());
    split_at_shared_vertices(collected)
}

/// The decomposition polyedges as coordinate polylines.
pub fn singularity_polyline_decomposition<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &DecompositionOptions,
) -> Vec<Vec<Point3<f64>>> {
    singularity_polyedge_decomposition(mesh, options)
        .iter()
        .map(|polyedge| polyedge.iter().map(|&v| *mesh.position(v)).collect())
        .collect()
}

/// Split every polyedge at the vertices it shares with the others.
fn split_at_shared_vertices<I: MeshIndex>(polyedges: Vec<Vec<VertexId<I>>>) -> Vec<Vec<VertexId<I>>> {
    let mut counts: BTreeMap<VertexId<I>, usize> = BTreeMap::new();
    for polyedge in &polyedges {
        let unique: BTreeSet<VertexId<I>> = polyedge.iter().copied().collect();
        for v in unique {
            *counts.entry(v).or_insert(0) += 1;
        }
    }

    let mut result = Vec::new();
    for polyedge in polyedges {
        let indices: Vec<usize> = counts
            .iter()
            .filter(|&(_, &count)| count > 1)
            .filter_map(|(&v, _)| polyedge.iter().position(|&x| x == v))
            .collect();
        result.extend(split_list(&polyedge, indices));
    }
    result
}

/// Split a list at the given indices, with shared items on both sides.
///
/// A closed list has the same first and last element; splitting it wraps
/// around when neither end is a split index. A closed list with no split
/// index at all is returned whole.
fn split_list<T: Copy + PartialEq>(list: &[T], mut indices: Vec<usize>) -> Vec<Vec<T>> {
    let n = list.len();
    let closed = n > 1 && list[0] == list[n - 1];

    if closed {
        if let Some(pos) = indices.iter().position(|&i| i == n - 1) {
            indices.remove(pos);
            if !indices.contains(&0) {
                indices.push(0);
            }
        }
    }
    indices.sort_unstable();
    indices.dedup();

    if closed && indices.is_empty() {
        return vec![list.to_vec()];
    }

    let mut segments: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    for (index, &item) in list.iter().enumerate() {
        current.push(item);
        if (indices.contains(&index) && index != 0) || index == n - 1 {
            segments.push(current);
            current = vec![item];
        }
    }

    if closed && !indices.contains(&0) && segments.len() > 1 {
        let first = segments.remove(0);
        let last = segments.len() - 1;
        segments[last].extend_from_slice(&first[1..]);
    }

    segments
}
