//! PNG encoding for rendered figures.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when the image has ≤256 unique
//!   colors, which is common for heatmaps built from a sampled colormap.
//! - **RGBA PNG (color type 6)**: Fallback once antialiased text and the
//!   colorbar gradient push the image past 256 colors.
//!
//! Use `create_png_auto` for automatic mode selection, or `create_png` for
//! explicit RGBA encoding.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use forecast_common::{ForecastError, ForecastResult};
use rayon::prelude::*;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Images at least this many pixels are indexed on the rayon pool
const PARALLEL_THRESHOLD: usize = 4096;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

type Rgba = [u8; 4];

/// Create a PNG image with automatic format selection.
///
/// # Arguments
/// - `pixels`: RGBA pixel data (4 bytes per pixel)
/// - `width`: Image width in pixels
/// - `height`: Image height in pixels
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> ForecastResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    match index_colors(pixels) {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices),
        None => create_png(pixels, width, height),
    }
}

/// Create a PNG image from RGBA pixel data (color type 6).
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> ForecastResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat = deflate_scanlines(pixels, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[Rgba],
    indices: &[u8],
) -> ForecastResult<Vec<u8>> {
    if indices.len() != width * height {
        return Err(ForecastError::RenderError(format!(
            "{} palette indices for a {}x{} image",
            indices.len(),
            width,
            height
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|&[r, g, b, _]| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS only if any color has alpha < 255
    if palette.iter().any(|rgba| rgba[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|rgba| rgba[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn check_buffer(pixels: &[u8], width: usize, height: usize) -> ForecastResult<()> {
    if width == 0 || height == 0 {
        return Err(ForecastError::RenderError(format!(
            "cannot encode a {}x{} image",
            width, height
        )));
    }
    if pixels.len() != width * height * 4 {
        return Err(ForecastError::RenderError(format!(
            "{} bytes of RGBA data for a {}x{} image",
            pixels.len(),
            width,
            height
        )));
    }
    Ok(())
}

/// IHDR payload: 8-bit depth, no interlace.
fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.extend_from_slice(&[8, color_type, 0, 0, 0]);
    data
}

fn rgba(pixel: &[u8]) -> Rgba {
    [pixel[0], pixel[1], pixel[2], pixel[3]]
}

/// Map every pixel to a palette slot, or `None` past 256 distinct colors.
///
/// The palette is sorted so the same figure always encodes to the same bytes.
fn index_colors(pixels: &[u8]) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let parallel = pixels.len() / 4 >= PARALLEL_THRESHOLD;
    let colors = if parallel {
        distinct_colors_par(pixels)?
    } else {
        distinct_colors(pixels)?
    };

    let palette: Vec<Rgba> = colors.into_iter().collect();
    let slots: HashMap<Rgba, u8> = palette
        .iter()
        .enumerate()
        .map(|(slot, &color)| (color, slot as u8))
        .collect();
    let slot_of = |pixel: &[u8]| slots.get(&rgba(pixel)).copied().unwrap_or(0);

    let indices: Vec<u8> = if parallel {
        pixels.par_chunks_exact(4).map(slot_of).collect()
    } else {
        pixels.chunks_exact(4).map(slot_of).collect()
    };
    Some((palette, indices))
}

fn distinct_colors(pixels: &[u8]) -> Option<BTreeSet<Rgba>> {
    let mut seen = BTreeSet::new();
    for pixel in pixels.chunks_exact(4) {
        seen.insert(rgba(pixel));
        if seen.len() > MAX_PALETTE_SIZE {
            return None;
        }
    }
    Some(seen)
}

fn distinct_colors_par(pixels: &[u8]) -> Option<BTreeSet<Rgba>> {
    pixels
        .par_chunks_exact(4)
        .try_fold(BTreeSet::new, |mut seen, pixel| {
            seen.insert(rgba(pixel));
            (seen.len() <= MAX_PALETTE_SIZE).then_some(seen)
        })
        .try_reduce(BTreeSet::new, |mut left, right| {
            left.extend(right);
            (left.len() <= MAX_PALETTE_SIZE).then_some(left)
        })
}

/// Write a PNG chunk: length, type, data, CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter byte 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> ForecastResult<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed).map_err(compression_error)?;
    encoder.finish().map_err(compression_error)
}

fn compression_error(err: std::io::Error) -> ForecastError {
    ForecastError::RenderError(format!("IDAT compression failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_colors_simple() {
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 0, 0, 255, // red again
        ];

        let (palette, indices) = index_colors(&pixels).unwrap();
        assert_eq!(palette, vec![[0, 0, 255, 255], [0, 255, 0, 255], [255, 0, 0, 255]]);
        assert_eq!(indices, vec![2, 1, 0, 2]);
    }

    #[test]
    fn test_index_colors_with_transparency() {
        let pixels = [255, 0, 0, 255, 0, 0, 0, 0];

        let (palette, _) = index_colors(&pixels).unwrap();
        assert!(palette.iter().any(|rgba| rgba[3] == 0));
        assert!(palette.iter().any(|rgba| rgba[3] == 255));
    }

    #[test]
    fn test_large_image_indices_round_trip_through_palette() {
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128u32 {
            for x in 0..128u32 {
                let c = (((x / 8) + (y / 8)) % 50) as u8;
                pixels.extend_from_slice(&[c * 5, 100 + c, 200 - c * 2, 255]);
            }
        }

        let (palette, indices) = index_colors(&pixels).unwrap();
        // (x / 8 + y / 8) spans 0..=30
        assert_eq!(palette.len(), 31);
        assert_eq!(indices.len(), 128 * 128);
        for (i, pixel) in pixels.chunks_exact(4).enumerate() {
            assert_eq!(&palette[indices[i] as usize], pixel);
        }
        assert_eq!(distinct_colors(&pixels), distinct_colors_par(&pixels));
    }

    #[test]
    fn test_too_many_colors_falls_back_to_rgba() {
        let mut pixels = Vec::with_capacity(300 * 4);
        for i in 0..300u32 {
            pixels.extend_from_slice(&[(i % 256) as u8, (i / 2) as u8, (i / 3) as u8, 255]);
        }
        assert!(index_colors(&pixels).is_none());
        assert!(distinct_colors_par(&pixels).is_none());

        let png = create_png_auto(&pixels, 300, 1).unwrap();
        // IHDR color type byte
        assert_eq!(png[25], 6);
    }

    #[test]
    fn test_few_colors_use_indexed() {
        let pixels = [
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 255, 0, 255, 255, 0, 0, 255,
        ];
        let png = create_png_auto(&pixels, 2, 2).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(png[25], 3);
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        assert!(create_png(&[0u8; 12], 2, 2).is_err());
        assert!(create_png_auto(&[], 0, 0).is_err());
    }
}
