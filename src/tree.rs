//! A segment tree over the layout's y-coordinates.
//!
//! The tree is built once, over the sorted unique y-values of every polygon
//! vertex, and then mutated by the sweep: inserting a segment marks a
//! y-range as covered by one layer, removing it un-marks it. Each node
//! tracks one [`Status`] per layer.
//!
//! Coverage is marked lazily. When a node's whole range is covered, the
//! node becomes `Full` and its children are *tombstoned* to `Empty`: the
//! ancestor's mark supersedes whatever they said, and the truth is
//! re-materialized into them the next time an update reaches down. Queries
//! therefore carry an "effective" status along the path: below a `Full`
//! ancestor, everything is full.

use std::io::{self, Write};

use crate::geom::Layer;

/// Coverage of a node's y-range by one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// No part of the range is covered.
    Empty,
    /// Some but not all of the range is covered. Never occurs on leaves.
    Partial,
    /// The whole range is covered.
    Full,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Empty => "empty",
            Status::Partial => "partial",
            Status::Full => "full",
        }
    }
}

/// The per-layer statuses of one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerStates([Status; 2]);

impl LayerStates {
    fn empty() -> LayerStates {
        LayerStates([Status::Empty; 2])
    }
}

impl std::ops::Index<Layer> for LayerStates {
    type Output = Status;

    fn index(&self, layer: Layer) -> &Status {
        &self.0[layer as usize]
    }
}

impl std::ops::IndexMut<Layer> for LayerStates {
    fn index_mut(&mut self, layer: Layer) -> &mut Status {
        &mut self.0[layer as usize]
    }
}

/// One node of the tree, covering the y-range `[lo, hi]`.
///
/// Internal nodes split at `mid`: the left child covers `[lo, mid]`, the
/// right child `[mid, hi]`. Leaves cover a single elementary segment
/// between two adjacent input y-values.
pub struct Node {
    lo: i64,
    hi: i64,
    mid: i64,
    status: LayerStates,
    children: Option<Box<(Node, Node)>>,
}

/// A node of the frontier returned by [`SegTree::find`], tagged with the
/// statuses that are in effect once ancestors' lazy marks are accounted
/// for.
pub struct FrontierNode<'a> {
    /// The frontier node itself.
    pub node: &'a Node,
    /// Effective per-layer statuses: `Full` whenever any ancestor (or the
    /// node itself) carries a `Full` mark.
    pub status: LayerStates,
}

/// The tree. Empty when the layout has fewer than two distinct y-values.
pub struct SegTree {
    root: Option<Node>,
}

impl SegTree {
    /// Builds a tree whose leaves are the elementary segments between
    /// adjacent values of `ys`. Duplicates are welcome; they're deduped
    /// here.
    pub fn build(ys: impl IntoIterator<Item = i64>) -> SegTree {
        let mut ys: Vec<i64> = ys.into_iter().collect();
        ys.sort_unstable();
        ys.dedup();
        if ys.len() < 2 {
            return SegTree { root: None };
        }
        SegTree {
            root: Some(Node::build(&ys)),
        }
    }

    /// Marks `[lo, hi]` as covered by `layer`.
    pub fn insert(&mut self, lo: i64, hi: i64, layer: Layer) {
        if let Some(root) = &mut self.root {
            root.insert(lo, hi, layer);
        }
    }

    /// Un-marks `[lo, hi]` for `layer`. The segment must have been
    /// inserted earlier.
    pub fn remove(&mut self, lo: i64, hi: i64, layer: Layer) {
        if let Some(root) = &mut self.root {
            root.remove(lo, hi, layer);
        }
    }

    /// Returns the frontier of `[lo, hi]`: the maximal set of nodes whose
    /// ranges together tile the query range, each tagged with its
    /// effective statuses.
    pub fn find(&self, lo: i64, hi: i64) -> Vec<FrontierNode<'_>> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.find(lo, hi, [false; 2], &mut out);
        }
        out
    }

    /// Writes an indented text rendering of the tree, one node per line.
    pub fn dump(&self, w: &mut impl Write) -> io::Result<()> {
        match &self.root {
            None => writeln!(w, "(empty tree)"),
            Some(root) => root.dump(w, 0),
        }
    }
}

impl Node {
    fn build(ys: &[i64]) -> Node {
        let m = (ys.len() - 1) / 2;
        let children = (ys.len() > 2)
            .then(|| Box::new((Node::build(&ys[..=m]), Node::build(&ys[m..]))));
        Node {
            lo: ys[0],
            hi: *ys.last().unwrap(),
            mid: ys[m],
            status: LayerStates::empty(),
            children,
        }
    }

    /// The y-range `(lo, hi)` this node covers.
    pub fn range(&self) -> (i64, i64) {
        (self.lo, self.hi)
    }

    /// Marks this node fully covered and tombstones its children: their
    /// stored status is superseded until the next update reaches them.
    fn mark_full(&mut self, layer: Layer) {
        self.status[layer] = Status::Full;
        if let Some(children) = &mut self.children {
            children.0.status[layer] = Status::Empty;
            children.1.status[layer] = Status::Empty;
        }
    }

    /// Recomputes this node's status from its children's.
    fn update(&mut self, layer: Layer) {
        let (a, b) = {
            let children = self.children.as_ref().expect("update on a leaf");
            (children.0.status[layer], children.1.status[layer])
        };
        match (a, b) {
            (Status::Full, Status::Full) => self.mark_full(layer),
            (Status::Empty, Status::Empty) => self.status[layer] = Status::Empty,
            _ => self.status[layer] = Status::Partial,
        }
    }

    fn insert(&mut self, lo: i64, hi: i64, layer: Layer) {
        if lo <= self.lo && self.hi <= hi {
            self.mark_full(layer);
            return;
        }
        let mid = self.mid;
        let children = self
            .children
            .as_mut()
            .expect("segment endpoints must align with tree leaves");
        if lo < mid {
            children.0.insert(lo, hi, layer);
        }
        if hi > mid {
            children.1.insert(lo, hi, layer);
        }
        self.update(layer);
    }

    fn remove(&mut self, lo: i64, hi: i64, layer: Layer) {
        if lo <= self.lo && self.hi <= hi {
            self.status[layer] = Status::Empty;
            return;
        }
        let mid = self.mid;
        let was = self.status[layer];
        let visit_left = lo < mid;
        let visit_right = hi > mid;
        let children = self
            .children
            .as_mut()
            .expect("segment endpoints must align with tree leaves");
        if visit_left {
            children.0.remove(lo, hi, layer);
        }
        if visit_right {
            children.1.remove(lo, hi, layer);
        }
        // A non-partial status here means the removed range sat under a
        // lazy full mark (a tombstone reads as empty); the half we didn't
        // descend into keeps its coverage, so materialize it there.
        if visit_left != visit_right && was != Status::Partial {
            let sibling = if visit_left { &mut children.1 } else { &mut children.0 };
            sibling.mark_full(layer);
        }
        self.update(layer);
    }

    fn find<'a>(
        &'a self,
        lo: i64,
        hi: i64,
        above_full: [bool; 2],
        out: &mut Vec<FrontierNode<'a>>,
    ) {
        if lo <= self.lo && self.hi <= hi {
            out.push(FrontierNode {
                node: self,
                status: self.effective(above_full),
            });
            return;
        }
        let above = [
            above_full[0] || self.status.0[0] == Status::Full,
            above_full[1] || self.status.0[1] == Status::Full,
        ];
        let children = self
            .children
            .as_ref()
            .expect("query endpoints must align with tree leaves");
        if lo < self.mid {
            children.0.find(lo, hi, above, out);
        }
        if hi > self.mid {
            children.1.find(lo, hi, above, out);
        }
    }

    fn effective(&self, above_full: [bool; 2]) -> LayerStates {
        let mut status = self.status;
        for (st, above) in status.0.iter_mut().zip(above_full) {
            if above {
                *st = Status::Full;
            }
        }
        status
    }

    /// Appends the maximal subranges of this node where `layer` is fully
    /// covered, in increasing order. `effective` is the caller's view of
    /// this node's status (see [`FrontierNode`]).
    pub fn covered(&self, layer: Layer, effective: Status, out: &mut Vec<(i64, i64)>) {
        match effective {
            Status::Full => out.push((self.lo, self.hi)),
            Status::Empty => {}
            Status::Partial => {
                let children = self.children.as_ref().expect("partial leaf");
                children.0.covered(layer, children.0.status[layer], out);
                children.1.covered(layer, children.1.status[layer], out);
            }
        }
    }

    /// Appends the maximal subranges of this node where `layer` is not
    /// covered at all, in increasing order.
    pub fn uncovered(&self, layer: Layer, effective: Status, out: &mut Vec<(i64, i64)>) {
        match effective {
            Status::Empty => out.push((self.lo, self.hi)),
            Status::Full => {}
            Status::Partial => {
                let children = self.children.as_ref().expect("partial leaf");
                children.0.uncovered(layer, children.0.status[layer], out);
                children.1.uncovered(layer, children.1.status[layer], out);
            }
        }
    }

    fn dump(&self, w: &mut impl Write, depth: usize) -> io::Result<()> {
        writeln!(
            w,
            "{:indent$}[{}, {}] mid={} poly={} diff={}",
            "",
            self.lo,
            self.hi,
            self.mid,
            self.status[Layer::Polysilicon].label(),
            self.status[Layer::Diffusion].label(),
            indent = depth * 2,
        )?;
        if let Some(children) = &self.children {
            children.0.dump(w, depth + 1)?;
            children.1.dump(w, depth + 1)?;
        }
        Ok(())
    }
}
