use std::fs::{self, File};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};

use layerops::{cif, tree::SegTree, Error, Polygon};

/// Layer arithmetic on CIF layouts: transistor gates and pure diffusion.
#[derive(Parser)]
#[command(version, about)]
#[command(group(
    ArgGroup::new("outputs").required(true).multiple(true).args(["inter", "pdiff"])
))]
struct Args {
    /// Input CIF file with polysilicon and diffusion polygons.
    #[arg(short, long)]
    input: PathBuf,

    /// Write the polysilicon/diffusion intersection to this CIF file.
    #[arg(long)]
    inter: Option<PathBuf>,

    /// Write the diffusion-minus-polysilicon region to this CIF file.
    #[arg(long)]
    pdiff: Option<PathBuf>,

    /// Dump a text rendering of the initial segment tree to this file.
    #[arg(long)]
    ps: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.input).map_err(|source| Error::InputUnavailable {
        path: args.input.clone(),
        source,
    })?;
    let polygons = cif::parse(&text)?;
    log::info!(
        "parsed {} polygons from {}",
        polygons.len(),
        args.input.display()
    );

    if let Some(path) = &args.ps {
        dump_tree(path, &polygons)?;
    }

    let outputs = layerops::layer_arithmetic(&polygons);
    log::info!(
        "{} intersection polygons, {} pure-diffusion polygons",
        outputs.intersection.len(),
        outputs.pure_diffusion.len()
    );

    if let Some(path) = &args.inter {
        write_cif(path, &outputs.intersection)?;
    }
    if let Some(path) = &args.pdiff {
        write_cif(path, &outputs.pure_diffusion)?;
    }
    Ok(())
}

fn dump_tree(path: &Path, polygons: &[Polygon]) -> Result<(), Error> {
    let tree = SegTree::build(polygons.iter().flat_map(|p| p.ys()));
    with_output(path, |w| tree.dump(w))
}

fn write_cif(path: &Path, polygons: &[Polygon]) -> Result<(), Error> {
    with_output(path, |w| cif::write(w, polygons))
}

fn with_output(
    path: &Path,
    f: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<(), Error> {
    let unavailable = |source| Error::OutputUnavailable {
        path: path.to_owned(),
        source,
    };
    let mut w = BufWriter::new(File::create(path).map_err(unavailable)?);
    f(&mut w).and_then(|()| w.flush()).map_err(unavailable)
}
