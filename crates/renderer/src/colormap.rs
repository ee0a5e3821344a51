//! Colormaps and heatmap rasterization for gridded snowfall fields.

/// Sampled viridis, low to high.
const VIRIDIS: &[&str] = &[
    "#440154", "#472d7b", "#3b528b", "#2c728e", "#21918c", "#28ae80", "#5ec962", "#addc30",
    "#fde725",
];

/// Sampled Blues, low to high.
const BLUES: &[&str] = &[
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// `#rrggbb` form, alpha dropped.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// A piecewise-linear colormap over evenly spaced stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: &'static str,
    stops: Vec<Color>,
}

impl Colormap {
    /// Build from `#rrggbb` stops; invalid entries are skipped.
    pub fn from_hex(name: &'static str, stops: &[&str]) -> Self {
        let stops = stops
            .iter()
            .filter_map(|hex| hex_to_rgb(hex))
            .map(|(r, g, b)| Color::opaque(r, g, b))
            .collect();
        Self { name, stops }
    }

    pub fn viridis() -> Self {
        Self::from_hex("viridis", VIRIDIS)
    }

    pub fn blues() -> Self {
        Self::from_hex("Blues", BLUES)
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn stops(&self) -> &[Color] {
        &self.stops
    }

    /// Color at normalized position `t` in `[0, 1]`.
    pub fn color_at(&self, t: f32) -> Color {
        match self.stops.len() {
            0 => Color::transparent(),
            1 => self.stops[0],
            n => {
                let pos = t.clamp(0.0, 1.0) * (n - 1) as f32;
                let low = (pos.floor() as usize).min(n - 2);
                interpolate_color(self.stops[low], self.stops[low + 1], pos - low as f32)
            }
        }
    }
}

/// Linear mapping from data values onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f32,
    pub max: f32,
}

impl ColorScale {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Scale over a data range; an all-missing field gets `[0, 1]`.
    pub fn from_range(range: Option<(f32, f32)>) -> Self {
        match range {
            Some((min, max)) => Self::new(min, max),
            None => Self::new(0.0, 1.0),
        }
    }

    /// Normalize a value; a degenerate scale maps everything to the middle.
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range > 0.0 {
            ((value - self.min) / range).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }
}

/// Render grid data as a heatmap.
///
/// # Arguments
/// - `data`: 2D grid of values (row-major order)
/// - `width`: Number of columns
/// - `height`: Number of rows
/// - `scale`: Value range mapped onto the colormap
/// - `colormap`: Colors for normalized values
///
/// # Returns
/// RGBA pixel data (4 bytes per pixel); `NaN` cells are fully transparent.
pub fn render_grid(
    data: &[f32],
    width: usize,
    height: usize,
    scale: &ColorScale,
    colormap: &Colormap,
) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];

    for (idx, &value) in data.iter().take(width * height).enumerate() {
        if value.is_nan() {
            continue;
        }
        let color = colormap.color_at(scale.normalize(value));

        let pixel_idx = idx * 4;
        pixels[pixel_idx] = color.r;
        pixels[pixel_idx + 1] = color.g;
        pixels[pixel_idx + 2] = color.b;
        pixels[pixel_idx + 3] = color.a;
    }

    pixels
}
