//! Grouping of opposite edges.

use std::collections::BTreeMap;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Group the edges of a quad mesh by face-opposite adjacency.
///
/// In every quad `(a, b, c, d)` the edge pairs `(a,b)/(c,d)` and
/// `(b,c)/(d,a)` are opposite. Edges related through a chain of such
/// pairs end up in the same group, so each group holds the edges crossed
/// by one strip. The map stores both directions of every edge; group
/// ids start at 1 and merged ids are vacated, so the second value is the
/// largest id ever assigned, not the group count.
///
/// # Errors
///
/// Returns [`MeshError::NotAQuadMesh`] if any face is not a quad.
pub fn dual_edge_groups<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> Result<(BTreeMap<(VertexId<I>, VertexId<I>), usize>, usize)> {
    if !mesh.is_quad_mesh() {
        return Err(MeshError::NotAQuadMesh);
    }

    let mut groups: BTreeMap<(VertexId<I>, VertexId<I>), usize> = BTreeMap::new();
    let mut max_group = 0;

    for face in mesh.face_ids() {
        let cycle = mesh.face_vertices(face);
        let (a, b, c, d) = (cycle[0], cycle[1], cycle[2], cycle[3]);

        for (u, v, w, x) in [(a, b, c, d), (b, c, d, a)] {
            match (groups.contains_key(&(u, v)), groups.contains_key(&(w, x))) {
                (true, true) => {
                    let kept = groups[&(u, v)];
                    let vacated = groups[&(w, x)];
                    if kept != vacated {
                        for group in groups.values_mut() {
                            if *group == vacated {
                                *group = kept;
                            }
                        }
                    }
                }
                (true, false) => {
                    let group = groups[&(u, v)];
                    groups.insert((w, x), group);
                    groups.insert((x, w), group);
                }
                (false, true) => {
                    let group = groups[&(w, x)];
                    groups.insert((u, v), group);
                    groups.insert((v, u), group);
                }
                (false, false) => {
                    max_group += 1;
                    groups.insert((u, v), max_group);
                    groups.insert((v, u), max_group);
                    groups.insert((w, x), max_group);
                    groups.insert((x, w), max_group);
                }
            }
        }
    }

    Ok((groups, max_group))
}
