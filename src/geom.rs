//! Geometry primitives: points, polygons, vertical edges, intervals.
//!
//! Everything in this crate is integer-valued. The input format carries
//! integer coordinates and the sweep never divides, so all arithmetic here
//! is exact.

use serde::Serialize;

/// The two mask layers that take part in the arithmetic.
///
/// Layer names in a CIF file are opaque strings, but only these two mean
/// anything to the sweep. Their roles are symmetric except in the
/// pure-diffusion output, which subtracts polysilicon from diffusion.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize)]
pub enum Layer {
    /// The gate layer.
    Polysilicon,
    /// The active-area layer.
    Diffusion,
}

impl Layer {
    /// The layer that isn't `self`.
    pub fn other(self) -> Layer {
        match self {
            Layer::Polysilicon => Layer::Diffusion,
            Layer::Diffusion => Layer::Polysilicon,
        }
    }

    /// The layer's name as it appears in CIF `L` commands.
    pub fn name(self) -> &'static str {
        match self {
            Layer::Polysilicon => "polysilicon",
            Layer::Diffusion => "diffusion",
        }
    }

    /// Looks up a CIF layer name. Unknown names belong to layers we don't
    /// operate on.
    pub fn from_name(name: &str) -> Option<Layer> {
        match name {
            "polysilicon" => Some(Layer::Polysilicon),
            "diffusion" => Some(Layer::Diffusion),
            _ => None,
        }
    }
}

// Points are sorted by `y` and then by `x`: that's the order the contour
// reconstructor wants its endpoint rows in.
/// A point of the integer grid.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Point {
    /// Vertical position.
    pub y: i64,
    /// Horizontal position.
    pub x: i64,
}

impl Point {
    /// Creates a point from its `(x, y)` coordinates.
    pub fn new(x: i64, y: i64) -> Point {
        Point { x, y }
    }
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A closed rectilinear loop on one layer.
///
/// Consecutive points (including the wrap-around pair) differ in exactly
/// one coordinate. Input rectangles are normalized by [`normalize_rect`];
/// general rectilinear polygons appear on output.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Polygon {
    /// The layer the polygon lives on.
    pub layer: Layer,
    /// The vertex loop. The last point connects back to the first.
    pub points: Vec<Point>,
}

impl Polygon {
    /// The y-coordinate of every vertex, duplicates included.
    ///
    /// This is the multiset the segment tree is seeded from; the tree build
    /// dedupes and sorts.
    pub fn ys(&self) -> impl Iterator<Item = i64> + '_ {
        self.points.iter().map(|p| p.y)
    }

    /// The polygon's vertical edges, in vertex order.
    ///
    /// Orientation is carried in the `y0`/`y1` order: a counter-clockwise
    /// loop yields opening left edges and closing right edges.
    pub fn vertical_edges(&self) -> impl Iterator<Item = VerticalEdge> + '_ {
        cyclic_pairs(&self.points).filter_map(move |(p, q)| {
            (p.x == q.x && p.y != q.y).then_some(VerticalEdge {
                layer: self.layer,
                x: p.x,
                y0: p.y,
                y1: q.y,
            })
        })
    }
}

impl std::fmt::Debug for Polygon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:?}", self.layer, self.points)
    }
}

fn cyclic_pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    let wrap = xs.last().zip(xs.first());
    xs.windows(2).map(|pair| (&pair[0], &pair[1])).chain(wrap)
}

/// A vertical polygon boundary segment at a fixed x.
///
/// `y1 > y0` makes this an *opening* edge (the polygon interior lies ahead
/// of the sweep line as it crosses `x`); `y1 < y0` makes it *closing*. The
/// sign convention is load-bearing for reconstruction and is preserved from
/// input to output.
#[derive(Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerticalEdge {
    /// The layer the edge bounds.
    pub layer: Layer,
    /// The edge's column.
    pub x: i64,
    /// Where the edge starts, walking the polygon loop.
    pub y0: i64,
    /// Where the edge ends. Never equal to `y0`.
    pub y1: i64,
}

impl VerticalEdge {
    /// Does this edge open an interval of layer presence?
    pub fn is_opening(&self) -> bool {
        self.y1 > self.y0
    }

    /// The smaller y endpoint.
    pub fn lo(&self) -> i64 {
        self.y0.min(self.y1)
    }

    /// The larger y endpoint.
    pub fn hi(&self) -> i64 {
        self.y0.max(self.y1)
    }

    /// The point the edge starts at: `(x, y0)`.
    pub fn start(&self) -> Point {
        Point::new(self.x, self.y0)
    }

    /// The point the edge ends at: `(x, y1)`.
    pub fn end(&self) -> Point {
        Point::new(self.x, self.y1)
    }
}

impl std::fmt::Debug for VerticalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x={} {}..{}", self.x, self.y0, self.y1)
    }
}

/// Orders an interval's endpoints according to an edge polarity.
///
/// Every emission site goes through here instead of flipping coordinates ad
/// hoc, so the opening/closing convention has a single home.
pub fn oriented(lo: i64, hi: i64, opening: bool) -> (i64, i64) {
    if opening {
        (lo, hi)
    } else {
        (hi, lo)
    }
}

/// All vertical edges of a set of polygons, sorted ascending by x.
///
/// The sort is stable: edges sharing a column keep the order the polygons
/// (and their vertex loops) listed them in.
pub fn vertical_edges(polygons: &[Polygon]) -> Vec<VerticalEdge> {
    let mut edges: Vec<VerticalEdge> = polygons
        .iter()
        .flat_map(|p| p.vertical_edges())
        .collect();
    edges.sort_by_key(|e| e.x);
    edges
}

/// Collapses coincident boundaries of an ordered start/end sequence.
///
/// The input alternates `start, end, start, end, …` in increasing order,
/// as produced by the segment-tree queries; whenever an interval's end
/// equals the next interval's start, both boundaries vanish. This is not
/// general interval union: it relies on boundaries coinciding only at
/// exact touch points.
pub fn merge_intervals(intervals: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(intervals.len());
    for &(start, end) in intervals {
        match merged.last_mut() {
            Some(last) if last.1 == start => last.1 = end,
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Normalizes a four-corner rectangle to start at the left-bottom corner:
/// `(x_min, y_min) (x_min, y_max) (x_max, y_max) (x_max, y_min)`.
///
/// This is the orientation the sweep expects: the left edge opens, the
/// right edge closes.
pub fn normalize_rect(points: &[Point]) -> Vec<Point> {
    debug_assert_eq!(points.len(), 4, "normalize_rect wants a quadrilateral");
    let x_min = points.iter().map(|p| p.x).min().unwrap();
    let x_max = points.iter().map(|p| p.x).max().unwrap();
    let y_min = points.iter().map(|p| p.y).min().unwrap();
    let y_max = points.iter().map(|p| p.y).max().unwrap();
    vec![
        Point::new(x_min, y_min),
        Point::new(x_min, y_max),
        Point::new(x_max, y_max),
        Point::new(x_max, y_min),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(layer: Layer, x0: i64, y0: i64, x1: i64, y1: i64) -> Polygon {
        Polygon {
            layer,
            points: normalize_rect(&[
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ]),
        }
    }

    #[test]
    fn rect_vertical_edges() {
        let r = rect(Layer::Diffusion, 0, 0, 10, 5);
        let edges: Vec<_> = r.vertical_edges().collect();
        assert_eq!(edges.len(), 2);
        assert!(edges[0].is_opening());
        assert_eq!((edges[0].x, edges[0].y0, edges[0].y1), (0, 0, 5));
        assert!(!edges[1].is_opening());
        assert_eq!((edges[1].x, edges[1].y0, edges[1].y1), (10, 5, 0));
    }

    #[test]
    fn edges_sorted_by_x_stable() {
        let a = rect(Layer::Diffusion, 0, 0, 10, 10);
        let b = rect(Layer::Polysilicon, 10, 0, 20, 10);
        let edges = vertical_edges(&[a, b]);
        let xs: Vec<_> = edges.iter().map(|e| e.x).collect();
        assert_eq!(xs, vec![0, 10, 10, 20]);
        // The tie at x=10 keeps input order: diffusion's closing edge first.
        assert_eq!(edges[1].layer, Layer::Diffusion);
        assert!(!edges[1].is_opening());
        assert_eq!(edges[2].layer, Layer::Polysilicon);
        assert!(edges[2].is_opening());
    }

    #[test]
    fn merge_collapses_touching_boundaries() {
        assert_eq!(merge_intervals(&[]), vec![]);
        assert_eq!(merge_intervals(&[(0, 5)]), vec![(0, 5)]);
        assert_eq!(merge_intervals(&[(0, 5), (5, 9)]), vec![(0, 9)]);
        assert_eq!(merge_intervals(&[(0, 5), (6, 9)]), vec![(0, 5), (6, 9)]);
        assert_eq!(
            merge_intervals(&[(0, 2), (2, 4), (4, 8), (9, 10)]),
            vec![(0, 8), (9, 10)]
        );
    }

    #[test]
    fn normalize_rect_any_corner_order() {
        let scrambled = [
            Point::new(10, 5),
            Point::new(0, 5),
            Point::new(10, 0),
            Point::new(0, 0),
        ];
        assert_eq!(
            normalize_rect(&scrambled),
            vec![
                Point::new(0, 0),
                Point::new(0, 5),
                Point::new(10, 5),
                Point::new(10, 0),
            ]
        );
    }

    #[test]
    fn degenerate_pairs_are_skipped() {
        // A repeated vertex must not produce a zero-length vertical edge.
        let p = Polygon {
            layer: Layer::Diffusion,
            points: vec![
                Point::new(0, 0),
                Point::new(0, 0),
                Point::new(0, 5),
                Point::new(3, 5),
                Point::new(3, 0),
            ],
        };
        assert_eq!(p.vertical_edges().count(), 2);
    }
}
