//! The plane sweep that derives both output regions.
//!
//! The sweep walks the input's vertical edges in ascending x order. An
//! opening edge inserts its y-range into the segment tree *before* the
//! queries run; a closing edge removes it *after*. In between, the tree is
//! queried over the edge's range and every resulting interval becomes one
//! output vertical edge.

use log::debug;

use crate::geom::{self, merge_intervals, Layer, Polygon, VerticalEdge};
use crate::tree::SegTree;

/// The vertical boundaries of the two derived regions.
#[derive(Clone, Debug, Default)]
pub struct SweepOutput {
    /// Boundary of the region covered by both layers, tagged polysilicon.
    pub intersection: Vec<VerticalEdge>,
    /// Boundary of the region covered by diffusion but not polysilicon,
    /// tagged diffusion.
    pub pure_diffusion: Vec<VerticalEdge>,
}

/// Runs the sweep over a set of input polygons.
pub fn sweep(polygons: &[Polygon]) -> SweepOutput {
    let mut tree = SegTree::build(polygons.iter().flat_map(|p| p.ys()));
    let edges = geom::vertical_edges(polygons);
    debug!(
        "sweeping {} vertical edges from {} polygons",
        edges.len(),
        polygons.len()
    );

    let mut out = SweepOutput::default();
    for edge in edges {
        let other = edge.layer.other();
        let (lo, hi) = (edge.lo(), edge.hi());
        let opening = edge.is_opening();

        if opening {
            tree.insert(lo, hi, edge.layer);
        }

        let mut inter = Vec::new();
        let mut pure = Vec::new();
        for frontier in tree.find(lo, hi) {
            // Intersection: the swept layer is present along [lo, hi] by
            // construction, so only the other layer's coverage matters.
            frontier
                .node
                .covered(other, frontier.status[other], &mut inter);
            match other {
                // A polysilicon edge matters wherever it cuts into (or
                // releases) active diffusion.
                Layer::Diffusion => frontier.node.covered(
                    Layer::Diffusion,
                    frontier.status[Layer::Diffusion],
                    &mut pure,
                ),
                // A diffusion edge contributes wherever polysilicon is
                // absent.
                Layer::Polysilicon => frontier.node.uncovered(
                    Layer::Polysilicon,
                    frontier.status[Layer::Polysilicon],
                    &mut pure,
                ),
            }
        }

        for (a, b) in merge_intervals(&inter) {
            let (y0, y1) = geom::oriented(a, b, opening);
            out.intersection.push(VerticalEdge {
                layer: Layer::Polysilicon,
                x: edge.x,
                y0,
                y1,
            });
        }

        // An opening polysilicon edge *closes* the pure-diffusion region it
        // touches (diffusion is being subtracted there), and vice versa; a
        // diffusion edge keeps its own polarity.
        let pure_opening = match edge.layer {
            Layer::Diffusion => opening,
            Layer::Polysilicon => !opening,
        };
        for (a, b) in merge_intervals(&pure) {
            let (y0, y1) = geom::oriented(a, b, pure_opening);
            out.pure_diffusion.push(VerticalEdge {
                layer: Layer::Diffusion,
                x: edge.x,
                y0,
                y1,
            });
        }

        if !opening {
            tree.remove(lo, hi, edge.layer);
        }
    }

    debug!(
        "sweep produced {} intersection and {} pure-diffusion edges",
        out.intersection.len(),
        out.pure_diffusion.len()
    );
    out
}
