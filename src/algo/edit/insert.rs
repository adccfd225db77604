//! Face strip insertion.

use std::collections::BTreeSet;

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{unweld_along_path, HalfEdgeMesh, MeshIndex, VertexId};

/// Options for [`face_strip_insert`].
#[derive(Debug, Clone)]
pub struct InsertOptions {
    /// How far the two sides of the slit move towards their targets,
    /// which sets the width of the inserted strip relative to its
    /// neighbouring faces.
    pub factor: f64,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self { factor: 0.33 }
    }
}

impl InsertOptions {
    /// Set the strip width factor.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }
}

/// Insert a new face strip along a path of vertices.
///
/// The mesh is cut open along the path, the two sides of the slit are
/// pushed apart, and the gap is filled with one quad per path edge. A
/// path that repeats its first vertex at the end inserts a closed strip.
/// Both copies of every path vertex are displaced: a copy that ends up
/// on the mesh boundary slides along its boundary edge, any other copy
/// moves towards the area-weighted centroid of its faces, in each case
/// by `options.factor` of the way.
///
/// Returns one `(kept, duplicate)` vertex pair per path vertex, in path
/// order.
///
/// # Errors
///
/// The path must satisfy the requirements of
/// [`unweld_along_path`]: its edges must exist and stay off the
/// boundary, an open path must start and end on the boundary, and no
/// vertex may repeat. A failed call leaves the mesh unchanged.
pub fn face_strip_insert<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    vertex_path: &[VertexId<I>],
    options: &InsertOptions,
) -> Result<Vec<(VertexId<I>, VertexId<I>)>> {
    if !options.factor.is_finite() {
        return Err(MeshError::invalid_param(
            "factor",
            options.factor,
            "must be finite",
        ));
    }
    let closed = vertex_path.len() > 2 && vertex_path.first() == vertex_path.last();

    let pairs = unweld_along_path(mesh, vertex_path)?;
    let duplicated: BTreeSet<VertexId<I>> = pairs
        .iter()
        .flat_map(|&(kept, duplicate)| [kept, duplicate])
        .collect();

    for &(kept, duplicate) in &pairs {
        for vertex in [kept, duplicate] {
            if let Some(target) = displacement_target(mesh, vertex, &duplicated, options.factor) {
                let position = *mesh.position(vertex);
                mesh.set_position(vertex, position + (target - position) * options.factor);
            }
        }
    }

    for pair in pairs.windows(2) {
        let (kept_a, dup_a) = pair[0];
        let (kept_b, dup_b) = pair[1];
        mesh.add_face(&[dup_a, kept_a, kept_b, dup_b])?;
    }
    if closed {
        if let (Some(&(kept_last, dup_last)), Some(&(kept_first, dup_first))) =
            (pairs.last(), pairs.first())
        {
            mesh.add_face(&[dup_last, kept_last, kept_first, dup_first])?;
        }
    }

    let strip_faces = if closed { pairs.len() } else { pairs.len() - 1 };
    log::debug!("inserted a strip of {} faces", strip_faces);
    Ok(pairs)
}

/// Where a slit vertex should move, or `None` if it has no faces left.
fn displacement_target<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    vertex: VertexId<I>,
    duplicated: &BTreeSet<VertexId<I>>,
    factor: f64,
) -> Option<Point3<f64>> {
    // A copy on the outer boundary slides along its first boundary edge
    // that does not belong to the slit.
    for nbr in mesh.vertex_neighbors(vertex) {
        if mesh.is_edge_on_boundary(vertex, nbr) && !duplicated.contains(&nbr) {
            return Some(mesh.edge_point(vertex, nbr, factor));
        }
    }

    let faces = mesh.vertex_faces(vertex);
    if faces.is_empty() {
        return None;
    }
    let areas: Vec<f64> = faces.iter().map(|&f| mesh.face_area(f)).collect();
    let total: f64 = areas.iter().sum();
    if total <= f64::EPSILON {
        let mut sum = Vector3::zeros();
        for &f in &faces {
            sum += mesh.face_centroid(f).coords;
        }
        return Some(Point3::from(sum / faces.len() as f64));
    }
    let mut sum = Vector3::zeros();
    for (&f, &area) in faces.iter().zip(&areas) {
        sum += mesh.face_centroid(f).coords * (area / total);
    }
    Some(Point3::from(sum))
}
