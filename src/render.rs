// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning a finished grid into a grayscale image.  The plain PGM
//! writer produces the text raster; binary PNM and PNG go through the
//! `image` encoders.

use crate::error::BuddhaError;
use crate::grid::Grid;
use crate::planes::normalize;
use image::png::PNGEncoder;
use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The brightest gray level written.
pub const MAX_GRAY: u32 = 255;

/// The gray level for a cell holding `value` when the busiest cell holds
/// `max`: `round(value / max * 255)`.  An empty histogram is black.
pub fn intensity(value: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    match normalize(0.0, f64::from(max), f64::from(value)) {
        Ok(level) => (level * f64::from(MAX_GRAY)).round().min(f64::from(MAX_GRAY)) as u8,
        Err(_) => 0,
    }
}

/// Every cell's gray level, row-major, top row first.
pub fn to_gray8(grid: &Grid) -> Vec<u8> {
    let max = grid.max_value();
    grid.cells().iter().map(|&v| intensity(v, max)).collect()
}

/// Write `grid` as a plain-text graymap: a `P2 width height 255` header
/// line, then one line of space-separated levels per row.
pub fn write_pgm<W: Write>(grid: &Grid, mut out: W) -> Result<(), BuddhaError> {
    let max = grid.max_value();
    writeln!(out, "P2 {} {} {}", grid.width(), grid.height(), MAX_GRAY)?;
    for row in grid.rows() {
        writeln!(out, "{}", row.iter().map(|&v| intensity(v, max)).join(" "))?;
    }
    out.flush()?;
    Ok(())
}

/// Output formats, chosen by file extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// Plain-text graymap (`.pgm`, `.txt`).
    PlainPgm,
    /// Binary graymap (`.pnm`).
    BinaryPnm,
    /// PNG (`.png`).
    Png,
}

impl Format {
    /// Work out the format from `path`'s extension.
    pub fn from_path(path: &Path) -> Result<Format, BuddhaError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pgm" | "txt" => Ok(Format::PlainPgm),
            "pnm" => Ok(Format::BinaryPnm),
            "png" => Ok(Format::Png),
            _ => Err(BuddhaError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Write `grid` to `path` in the format its extension names.
pub fn write_image<P: AsRef<Path>>(grid: &Grid, path: P) -> Result<(), BuddhaError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let output = BufWriter::new(File::create(path)?);
    let (width, height) = (grid.width() as u32, grid.height() as u32);
    match format {
        Format::PlainPgm => write_pgm(grid, output),
        Format::BinaryPnm => {
            let mut encoder = PNMEncoder::new(output)
                .with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary));
            encoder
                .encode(&to_gray8(grid)[..], width, height, ColorType::Gray(8))
                .map_err(|e| BuddhaError::Encode(e.to_string()))
        }
        Format::Png => PNGEncoder::new(output)
            .encode(&to_gray8(grid), width, height, ColorType::Gray(8))
            .map_err(|e| BuddhaError::Encode(e.to_string())),
    }
}
