//! Strip crossing graph.

use std::collections::{BTreeSet, VecDeque};

use nalgebra::Point3;

use crate::mesh::{HalfEdgeMesh, MeshIndex, StripId};

use super::StripIndex;

/// The graph of strip crossings.
///
/// One node per strip, positioned at the centroid of the strip's
/// edge-midpoint polyline, and one link per face, joining the two strips
/// that cross it. A strip crossing a face twice links to itself, which
/// makes the graph uncolorable.
#[derive(Debug, Clone)]
pub struct StripConnectivity<I: MeshIndex = u32> {
    positions: Vec<Point3<f64>>,
    neighbors: Vec<Vec<usize>>,
    links: Vec<(StripId<I>, StripId<I>)>,
    self_linked: bool,
}

impl<I: MeshIndex> StripConnectivity<I> {
    /// Build the crossing graph of a strip index.
    pub fn build(mesh: &HalfEdgeMesh<I>, strips: &StripIndex<I>) -> Self {
        let positions: Vec<Point3<f64>> = strips
            .strip_ids()
            .map(|strip| centroid(&strips.strip_edge_polyline(mesh, strip)))
            .collect();

        let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); strips.num_strips()];
        let mut links = Vec::new();
        let mut self_linked = false;

        for face in mesh.face_ids() {
            if let Some((first, second)) = strips.face_strips(face) {
                links.push((first, second));
                if first == second {
                    self_linked = true;
                } else {
                    adjacency[first.index()].insert(second.index());
                    adjacency[second.index()].insert(first.index());
                }
            }
        }

        let neighbors = adjacency
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();

        Self {
            positions,
            neighbors,
            links,
            self_linked,
        }
    }

    /// Number of strips in the graph.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.neighbors.len()
    }

    /// The node position of a strip.
    ///
    /// Panics if the strip does not exist.
    #[inline]
    pub fn position(&self, strip: StripId<I>) -> Point3<f64> {
        self.positions[strip.index()]
    }

    /// The strips crossing the given strip, ascending.
    ///
    /// Panics if the strip does not exist.
    #[inline]
    pub fn neighbors(&self, strip: StripId<I>) -> &[usize] {
        &self.neighbors[strip.index()]
    }

    /// One link per face: the two strips crossing it.
    #[inline]
    pub fn links(&self) -> &[(StripId<I>, StripId<I>)] {
        &self.links
    }

    /// Two-color the graph, one color per strip.
    ///
    /// Returns `None` when the graph is not bipartite, including the
    /// case of a strip crossing one of its own faces.
    pub fn two_color(&self) -> Option<Vec<u8>> {
        if self.self_linked {
            return None;
        }

        let mut colors: Vec<Option<u8>> = vec![None; self.neighbors.len()];
        for start in 0..self.neighbors.len() {
            if colors[start].is_some() {
                continue;
            }
            colors[start] = Some(0);
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                let color = colors[node].unwrap_or(0);
                for &nbr in &self.neighbors[node] {
                    match colors[nbr] {
                        None => {
                            colors[nbr] = Some(1 - color);
                            queue.push_back(nbr);
                        }
                        Some(c) if c == color => return None,
                        Some(_) => {}
                    }
                }
            }
        }

        colors.into_iter().collect()
    }
}

/// Split the strips into two non-crossing sets when possible.
///
/// Returns `None` when the strip crossing graph is not two-colorable.
pub fn two_colorable_strips<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    strips: &StripIndex<I>,
) -> Option<(Vec<StripId<I>>, Vec<StripId<I>>)> {
    let connectivity = StripConnectivity::build(mesh, strips);
    let colors = connectivity.two_color()?;

    let mut red = Vec::new();
    let mut blue = Vec::new();
    for (index, &color) in colors.iter().enumerate() {
        if color == 0 {
            red.push(StripId::new(index));
        } else {
            blue.push(StripId::new(index));
        }
    }
    Some((red, blue))
}

fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let mut sum = nalgebra::Vector3::zeros();
    for point in points {
        sum += point.coords;
    }
    Point3::from(sum / points.len() as f64)
}
