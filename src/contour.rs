//! Reassembling closed rectilinear polygons from sweep output.
//!
//! The sweep emits vertical edges only. The horizontal boundary runs are
//! implied: at every y where vertical edges start or end, the endpoints
//! pair up in x order, each pair bridging the gap between two columns.
//! Chaining vertical and horizontal successors point-to-point then walks
//! out the closed polygons.

use std::collections::HashMap;

use crate::geom::{Point, Polygon, VerticalEdge};

/// One entry of the point-adjacency map: `point`'s successor along its
/// polygon boundary, plus a doubly linked overlay in insertion order.
///
/// The overlay keeps the next unvisited starting point at the list head
/// and makes removal of a visited entry O(1); insertion order also keeps
/// the extraction deterministic.
struct Entry {
    point: Point,
    succ: Point,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
struct Adjacency {
    entries: Vec<Entry>,
    index: HashMap<Point, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl Adjacency {
    fn insert(&mut self, point: Point, succ: Point) {
        let idx = self.entries.len();
        let dup = self.index.insert(point, idx);
        assert!(
            dup.is_none(),
            "adjacency map: two successors for {point:?}"
        );
        if let Some(tail) = self.tail {
            self.entries[tail].next = Some(idx);
        }
        self.entries.push(Entry {
            point,
            succ,
            prev: self.tail,
            next: None,
        });
        if self.head.is_none() {
            self.head = Some(idx);
        }
        self.tail = Some(idx);
    }

    /// Removes `point`'s entry and returns its successor.
    fn take(&mut self, point: &Point) -> Option<Point> {
        let idx = self.index.remove(point)?;
        let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
        match prev {
            Some(prev) => self.entries[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.entries[next].prev = prev,
            None => self.tail = prev,
        }
        Some(self.entries[idx].succ)
    }
}

/// Cancels equal-and-opposite edges sharing a column.
///
/// Coincident boundaries (a layer edge landing exactly on the other
/// layer's edge, or two regions touching along a line) produce an opening
/// and a closing edge over the same span at the same x. They enclose
/// nothing, and leaving them in would give some point two successors.
fn cancel_opposites(edges: &[VerticalEdge]) -> Vec<VerticalEdge> {
    let mut net: HashMap<(i64, i64, i64), i64> = HashMap::new();
    for e in edges {
        *net.entry((e.x, e.lo(), e.hi())).or_default() += if e.is_opening() { 1 } else { -1 };
    }
    let mut out = Vec::with_capacity(edges.len());
    for e in edges {
        let n = net.get_mut(&(e.x, e.lo(), e.hi())).unwrap();
        let sign = if e.is_opening() { 1 } else { -1 };
        if *n * sign > 0 {
            out.push(*e);
            *n -= sign;
        }
    }
    out
}

/// Stitches an unordered set of vertical edges (all on one layer) back
/// into closed polygons.
///
/// Panics if the edge set is not the boundary of a well-formed region:
/// every traversal must come back to its starting point with every point
/// holding exactly one successor.
pub fn reassemble(edges: &[VerticalEdge]) -> Vec<Polygon> {
    let edges = cancel_opposites(edges);
    let Some(first) = edges.first() else {
        return Vec::new();
    };
    let layer = first.layer;

    let mut adj = Adjacency::default();
    for e in &edges {
        adj.insert(e.start(), e.end());
    }

    // An edge's end (its "head") still needs an outgoing horizontal run;
    // its start already has the vertical one. Within each row, consecutive
    // endpoints in x order pair up, and the run goes head to tail.
    let mut endpoints: Vec<(Point, bool)> = Vec::with_capacity(edges.len() * 2);
    for e in &edges {
        endpoints.push((e.end(), true));
        endpoints.push((e.start(), false));
    }
    endpoints.sort_by_key(|&(p, _)| p);

    for row in endpoints.chunk_by(|a, b| a.0.y == b.0.y) {
        assert!(
            row.len() % 2 == 0,
            "unpaired boundary endpoint at y={}",
            row[0].0.y
        );
        for pair in row.chunks(2) {
            let ((p, p_is_head), (q, q_is_head)) = (pair[0], pair[1]);
            assert_ne!(
                p_is_head, q_is_head,
                "cannot bridge {p:?} and {q:?}: same polarity"
            );
            if p_is_head {
                adj.insert(p, q);
            } else {
                adj.insert(q, p);
            }
        }
    }

    // Extraction: start at the overlay head, follow successors, unlink as
    // we go, stop when the chain bites its tail. Repeat until drained.
    let mut polygons = Vec::new();
    while let Some(start_idx) = adj.head {
        let start = adj.entries[start_idx].point;
        let mut points = Vec::new();
        let mut p = start;
        loop {
            let succ = adj
                .take(&p)
                .unwrap_or_else(|| panic!("dangling successor at {p:?}"));
            points.push(p);
            if succ == start {
                break;
            }
            p = succ;
        }
        polygons.push(Polygon { layer, points });
    }
    polygons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Layer;

    fn edge(x: i64, y0: i64, y1: i64) -> VerticalEdge {
        VerticalEdge {
            layer: Layer::Diffusion,
            x,
            y0,
            y1,
        }
    }

    #[test]
    fn empty_set_no_polygons() {
        assert!(reassemble(&[]).is_empty());
    }

    #[test]
    fn single_rectangle() {
        let polys = reassemble(&[edge(0, 0, 10), edge(5, 10, 0)]);
        assert_eq!(polys.len(), 1);
        assert_eq!(
            polys[0].points,
            vec![
                Point::new(0, 0),
                Point::new(0, 10),
                Point::new(5, 10),
                Point::new(5, 0),
            ]
        );
    }

    #[test]
    fn two_separate_rectangles() {
        let polys = reassemble(&[
            edge(0, 0, 10),
            edge(5, 10, 0),
            edge(20, 0, 10),
            edge(25, 10, 0),
        ]);
        assert_eq!(polys.len(), 2);
        for p in &polys {
            assert_eq!(p.points.len(), 4);
        }
    }

    #[test]
    fn nested_loops_come_out_separately() {
        // An outer boundary with a hole: the inner loop runs the other way.
        let polys = reassemble(&[
            edge(0, 0, 20),
            edge(5, 15, 5),
            edge(15, 5, 15),
            edge(20, 20, 0),
        ]);
        assert_eq!(polys.len(), 2);
        assert_eq!(
            polys[0].points,
            vec![
                Point::new(0, 0),
                Point::new(0, 20),
                Point::new(20, 20),
                Point::new(20, 0),
            ]
        );
        assert_eq!(
            polys[1].points,
            vec![
                Point::new(5, 15),
                Point::new(5, 5),
                Point::new(15, 5),
                Point::new(15, 15),
            ]
        );
    }

    #[test]
    fn staircase_region() {
        // An L-shaped region: three vertical edges, six vertices.
        //
        //     +----+
        //     |    |
        //     |    +----+
        //     |         |
        //     +---------+
        let polys = reassemble(&[edge(0, 0, 10), edge(5, 10, 5), edge(9, 5, 0)]);
        assert_eq!(polys.len(), 1);
        assert_eq!(
            polys[0].points,
            vec![
                Point::new(0, 0),
                Point::new(0, 10),
                Point::new(5, 10),
                Point::new(5, 5),
                Point::new(9, 5),
                Point::new(9, 0),
            ]
        );
    }

    #[test]
    fn opposite_edges_cancel() {
        // A region that opens and closes at the same column encloses
        // nothing.
        assert!(reassemble(&[edge(3, 0, 10), edge(3, 10, 0)]).is_empty());
        // ...and cancellation fuses regions that touch along a column.
        let polys = reassemble(&[
            edge(0, 0, 10),
            edge(10, 10, 0),
            edge(10, 0, 10),
            edge(20, 10, 0),
        ]);
        assert_eq!(polys.len(), 1);
        assert_eq!(
            polys[0].points,
            vec![
                Point::new(0, 0),
                Point::new(0, 10),
                Point::new(20, 10),
                Point::new(20, 0),
            ]
        );
    }
}
