#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod cif;
pub mod contour;
pub mod geom;
pub mod sweep;
pub mod tree;

use std::io;
use std::path::PathBuf;

use serde::Serialize;

pub use geom::{Layer, Point, Polygon, VerticalEdge};

/// The ways a run can fail. All of them are fatal: there is no retry and
/// no partial output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    InputUnavailable {
        /// The file we tried to read.
        path: PathBuf,
        /// What the OS said.
        source: io::Error,
    },
    /// An output file could not be created or written.
    #[error("cannot write {}: {source}", path.display())]
    OutputUnavailable {
        /// The file we tried to write.
        path: PathBuf,
        /// What the OS said.
        source: io::Error,
    },
    /// The input was not CIF we understand: an odd or too-short `P`
    /// coordinate list, a non-integer coordinate, or a symbol definition
    /// without its rectangle.
    #[error("malformed CIF: {0}")]
    MalformedCif(String),
}

/// The polygons of both derived regions.
#[derive(Clone, Debug, Serialize)]
pub struct LayerOutputs {
    /// The region covered by both layers (the transistor gates), tagged
    /// polysilicon.
    pub intersection: Vec<Polygon>,
    /// The region covered by diffusion but not polysilicon, tagged
    /// diffusion.
    pub pure_diffusion: Vec<Polygon>,
}

/// Computes both derived regions for a set of input polygons.
///
/// This is the whole pipeline minus the CIF endpoints: sweep the polygons'
/// vertical edges through the segment tree, then stitch each output edge
/// set back into closed polygons.
pub fn layer_arithmetic(polygons: &[Polygon]) -> LayerOutputs {
    let out = sweep::sweep(polygons);
    LayerOutputs {
        intersection: contour::reassemble(&out.intersection),
        pure_diffusion: contour::reassemble(&out.pure_diffusion),
    }
}
