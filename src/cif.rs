//! Reading and writing the CIF subset this tool understands.
//!
//! Commands are separated by `;` and may span lines. The reader knows `L`
//! (layer selection), `P` (polygon), `DS n … DF` (a flat symbol definition
//! holding one rectangle) and `C n [T dx dy] [MX] [MY]` (symbol call with
//! translation and axis mirrors). Everything else is ignored, per the
//! format's convention that readers skip what they don't implement.

use std::collections::HashMap;
use std::io::{self, Write};

use log::debug;

use crate::geom::{normalize_rect, Layer, Point, Polygon};
use crate::Error;

/// A symbol captured from a `DS … DF` block: one rectangle on one layer.
struct Symbol {
    layer: String,
    rect: [Point; 4],
}

/// A `DS` block in progress: the symbol's number, the layer in effect
/// inside the block, and the first rectangle seen so far.
struct OpenSymbol {
    id: i64,
    layer: String,
    rect: Option<[Point; 4]>,
}

/// Parses CIF text into the polygons the sweep operates on.
///
/// Polygons on layers other than `polysilicon`/`diffusion` are validated
/// and then dropped; they never reach the sweep.
pub fn parse(text: &str) -> Result<Vec<Polygon>, Error> {
    let mut polygons = Vec::new();
    let mut symbols: HashMap<i64, Symbol> = HashMap::new();
    let mut layer = String::new();
    let mut symbol: Option<OpenSymbol> = None;

    for command in text.split(';') {
        let tokens: Vec<&str> = command.split_whitespace().collect();
        let Some(&keyword) = tokens.first() else {
            continue;
        };
        match keyword {
            "L" => {
                if let Some(&name) = tokens.get(1) {
                    match &mut symbol {
                        Some(open) => open.layer = name.to_string(),
                        None => layer = name.to_string(),
                    }
                }
            }
            "P" => {
                let coords = parse_coords(&tokens[1..])?;
                match &mut symbol {
                    Some(open) => {
                        if open.rect.is_none() {
                            if coords.len() != 8 {
                                return Err(Error::MalformedCif(format!(
                                    "symbol {} wants a rectangle (eight coordinates), got {}",
                                    open.id,
                                    coords.len()
                                )));
                            }
                            open.rect = Some([
                                Point::new(coords[0], coords[1]),
                                Point::new(coords[2], coords[3]),
                                Point::new(coords[4], coords[5]),
                                Point::new(coords[6], coords[7]),
                            ]);
                        }
                        // Further polygons in the same block are dropped.
                    }
                    None => {
                        if coords.len() % 2 != 0 {
                            return Err(Error::MalformedCif(format!(
                                "polygon with an odd coordinate count: {command:?}"
                            )));
                        }
                        if coords.len() < 6 {
                            return Err(Error::MalformedCif(format!(
                                "polygon with fewer than three vertices: {command:?}"
                            )));
                        }
                        let points = coords
                            .chunks_exact(2)
                            .map(|c| Point::new(c[0], c[1]))
                            .collect();
                        push_polygon(&mut polygons, &layer, points);
                    }
                }
            }
            "DS" => {
                let id = parse_symbol_id(&tokens)?;
                symbol = Some(OpenSymbol {
                    id,
                    layer: layer.clone(),
                    rect: None,
                });
            }
            "DF" => {
                if let Some(open) = symbol.take() {
                    let rect = open.rect.ok_or_else(|| {
                        Error::MalformedCif(format!("symbol {} has no polygon", open.id))
                    })?;
                    symbols.insert(
                        open.id,
                        Symbol {
                            layer: open.layer,
                            rect,
                        },
                    );
                }
            }
            "C" if symbol.is_none() => {
                let id = parse_symbol_id(&tokens)?;
                let Some(sym) = symbols.get(&id) else {
                    debug!("call to undefined symbol {id}, ignoring");
                    continue;
                };
                let mut points = sym.rect.to_vec();
                let mut args = tokens[2..].iter();
                while let Some(&op) = args.next() {
                    match op {
                        "T" => {
                            let dx = parse_offset(args.next(), id)?;
                            let dy = parse_offset(args.next(), id)?;
                            for p in &mut points {
                                p.x += dx;
                                p.y += dy;
                            }
                        }
                        "MX" => {
                            for p in &mut points {
                                p.x = -p.x;
                            }
                        }
                        "MY" => {
                            for p in &mut points {
                                p.y = -p.y;
                            }
                        }
                        // Unsupported transforms are skipped.
                        _ => {}
                    }
                }
                push_polygon(&mut polygons, &sym.layer, points);
            }
            "E" if symbol.is_none() => break,
            // Unrecognized commands are not errors; skip them.
            _ => {}
        }
    }
    Ok(polygons)
}

fn parse_coords(tokens: &[&str]) -> Result<Vec<i64>, Error> {
    tokens
        .iter()
        .map(|t| {
            t.parse::<i64>()
                .map_err(|_| Error::MalformedCif(format!("not an integer coordinate: {t:?}")))
        })
        .collect()
}

fn parse_symbol_id(tokens: &[&str]) -> Result<i64, Error> {
    tokens
        .get(1)
        .and_then(|t| t.parse::<i64>().ok())
        .ok_or_else(|| Error::MalformedCif(format!("{} without a symbol number", tokens[0])))
}

fn parse_offset(token: Option<&&str>, id: i64) -> Result<i64, Error> {
    token
        .and_then(|t| t.parse::<i64>().ok())
        .ok_or_else(|| Error::MalformedCif(format!("call to symbol {id}: bad translation")))
}

fn push_polygon(polygons: &mut Vec<Polygon>, layer: &str, mut points: Vec<Point>) {
    let Some(layer) = Layer::from_name(layer) else {
        debug!("dropping polygon on layer {layer:?}");
        return;
    };
    if points.len() == 4 {
        points = normalize_rect(&points);
    }
    polygons.push(Polygon { layer, points });
}

/// Writes polygons as CIF, with the fixed `4 1000` header and a single
/// `DS 1 … DF` wrapper. The `L` command is emitted only when the layer
/// changes.
pub fn write(w: &mut impl Write, polygons: &[Polygon]) -> io::Result<()> {
    writeln!(w, "4 1000;")?;
    writeln!(w, "DS 1;")?;
    let mut current: Option<Layer> = None;
    for polygon in polygons {
        if current != Some(polygon.layer) {
            writeln!(w, "L {};", polygon.layer.name())?;
            current = Some(polygon.layer);
        }
        write!(w, "P")?;
        for p in &polygon.points {
            write!(w, " {} {}", p.x, p.y)?;
        }
        writeln!(w, ";")?;
    }
    writeln!(w, "DF;")?;
    writeln!(w, "E")
}
