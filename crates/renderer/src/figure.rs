//! Figure composition: panels with titles, axes and colorbars.
//!
//! The static decorations (frame, text, colorbar gradient) are written as an
//! SVG document and rasterized with resvg; heatmap pixels are then copied
//! into each panel's plot area with nearest-neighbour sampling.

use std::sync::Arc;

use forecast_common::{ForecastError, ForecastResult, GeoGrid};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::colormap::{render_grid, ColorScale, Colormap};
use crate::png;

/// Height reserved above each plot for the title.
pub const TITLE_BAND: u32 = 44;
/// Width reserved left of each plot for latitude labels.
pub const AXIS_BAND_LEFT: u32 = 68;
/// Height reserved below each plot for longitude labels.
pub const AXIS_BAND_BOTTOM: u32 = 48;
pub const COLORBAR_GAP: u32 = 14;
pub const COLORBAR_WIDTH: u32 = 18;
/// Width reserved right of the colorbar for tick and units labels.
pub const COLORBAR_LABELS: u32 = 86;

/// Largest accepted panel edge in pixels.
pub const MAX_PANEL_EDGE: u32 = 4096;

const FIGURE_BACKGROUND: &str = "#ffffff";
/// Shown through cells with no data
const MISSING_BACKGROUND: &str = "#ececec";
const FONT_FAMILY: &str = "DejaVu Sans, Liberation Sans, Arial, sans-serif";

static FONT_DB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    debug!(faces = db.len(), "Loaded system fonts for figure text");
    Arc::new(db)
});

/// Pixel size of one plot panel; decorations are added around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureLayout {
    pub panel_width: u32,
    pub panel_height: u32,
}

impl Default for FigureLayout {
    fn default() -> Self {
        Self {
            panel_width: 520,
            panel_height: 400,
        }
    }
}

impl FigureLayout {
    pub fn new(panel_width: u32, panel_height: u32) -> Self {
        Self {
            panel_width,
            panel_height,
        }
    }

    /// Check that panels are non-empty and of reasonable size.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("panel_width", self.panel_width),
            ("panel_height", self.panel_height),
        ] {
            if value == 0 {
                return Err(format!("{} must be greater than zero", name));
            }
            if value > MAX_PANEL_EDGE {
                return Err(format!("{} must be at most {}", name, MAX_PANEL_EDGE));
            }
        }
        Ok(())
    }

    /// Width of one panel including its decorations.
    pub fn cell_width(&self) -> u32 {
        AXIS_BAND_LEFT + self.panel_width + COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_LABELS
    }

    /// Size of a figure with `panels` side-by-side panels.
    pub fn figure_size(&self, panels: usize) -> (u32, u32) {
        (
            self.cell_width() * panels as u32,
            TITLE_BAND + self.panel_height + AXIS_BAND_BOTTOM,
        )
    }
}

/// One heatmap panel.
#[derive(Debug, Clone)]
pub struct Panel<'a> {
    pub title: String,
    pub grid: &'a GeoGrid,
    pub colormap: Colormap,
    pub scale: ColorScale,
    /// Text beside the colorbar, usually units
    pub colorbar_label: Option<String>,
}

/// An encoded figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Plot-area rectangle of a panel, in figure pixels.
#[derive(Debug, Clone, Copy)]
struct PlotRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl PlotRect {
    fn for_panel(layout: &FigureLayout, index: usize) -> Self {
        Self {
            x: layout.cell_width() * index as u32 + AXIS_BAND_LEFT,
            y: TITLE_BAND,
            width: layout.panel_width,
            height: layout.panel_height,
        }
    }

    fn colorbar_x(&self) -> u32 {
        self.x + self.width + COLORBAR_GAP
    }
}

/// Compose panels side by side and encode the result as PNG.
pub fn render_figure(layout: &FigureLayout, panels: &[Panel<'_>]) -> ForecastResult<RenderedImage> {
    layout.validate().map_err(ForecastError::RenderError)?;
    if panels.is_empty() {
        return Err(ForecastError::RenderError("figure has no panels".to_string()));
    }

    let (width, height) = layout.figure_size(panels.len());
    let svg = build_svg(layout, panels);
    let mut pixmap = rasterize(&svg, width, height)?;

    for (index, panel) in panels.iter().enumerate() {
        blit_heatmap(&mut pixmap, PlotRect::for_panel(layout, index), panel);
    }

    // Background is opaque, so premultiplied and straight alpha agree
    let png = png::create_png_auto(pixmap.data(), width as usize, height as usize)?;

    Ok(RenderedImage { width, height, png })
}

fn build_svg(layout: &FigureLayout, panels: &[Panel<'_>]) -> String {
    let (width, height) = layout.figure_size(panels.len());
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = width,
        h = height,
        font = FONT_FAMILY
    );
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        width, height, FIGURE_BACKGROUND
    ));

    for (index, panel) in panels.iter().enumerate() {
        svg.push_str(&panel_svg(index, PlotRect::for_panel(layout, index), panel));
    }

    svg.push_str("</svg>");
    svg
}

fn panel_svg(index: usize, rect: PlotRect, panel: &Panel<'_>) -> String {
    let PlotRect {
        x,
        y,
        width: w,
        height: h,
    } = rect;
    let center_x = x + w / 2;
    let center_y = y + h / 2;
    let bbox = panel.grid.bbox();
    let mut svg = String::new();

    // Title
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="15" font-weight="bold">{}</text>"#,
        center_x,
        TITLE_BAND - 16,
        escape(&panel.title)
    ));

    // Plot area and frame
    svg.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
        x, y, w, h, MISSING_BACKGROUND
    ));
    svg.push_str(&format!(
        r##"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="#333333" stroke-width="1"/>"##,
        x as f32 - 0.5,
        y as f32 - 0.5,
        w + 1,
        h + 1
    ));

    // Longitude extent
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="start" font-size="11">{}</text>"#,
        x,
        y + h + 16,
        format_lon(bbox.min_x)
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{}</text>"#,
        x + w,
        y + h + 16,
        format_lon(bbox.max_x)
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="12">Longitude</text>"#,
        center_x,
        y + h + 38
    ));

    // Latitude extent
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{}</text>"#,
        x - 6,
        y + 10,
        format_lat(bbox.max_y)
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{}</text>"#,
        x - 6,
        y + h,
        format_lat(bbox.min_y)
    ));
    svg.push_str(&format!(
        r#"<text x="{lx}" y="{cy}" text-anchor="middle" font-size="12" transform="rotate(-90 {lx} {cy})">Latitude</text>"#,
        lx = x.saturating_sub(52),
        cy = center_y
    ));

    svg.push_str(&colorbar_svg(index, rect, panel));
    svg
}

fn colorbar_svg(index: usize, rect: PlotRect, panel: &Panel<'_>) -> String {
    let cb_x = rect.colorbar_x();
    let PlotRect { y, height: h, .. } = rect;
    let gradient_id = format!("colormap-{}", index);
    let stops = panel.colormap.stops();
    let mut svg = String::new();

    // Gradient runs bottom (min) to top (max)
    svg.push_str(&format!(
        r#"<defs><linearGradient id="{}" x1="0" y1="1" x2="0" y2="0">"#,
        gradient_id
    ));
    let last = stops.len().saturating_sub(1).max(1) as f32;
    for (i, color) in stops.iter().enumerate() {
        svg.push_str(&format!(
            r#"<stop offset="{:.4}" stop-color="{}"/>"#,
            i as f32 / last,
            color.to_hex()
        ));
    }
    svg.push_str("</linearGradient></defs>");

    svg.push_str(&format!(
        r##"<rect x="{}" y="{}" width="{}" height="{}" fill="url(#{})" stroke="#333333" stroke-width="1"/>"##,
        cb_x, y, COLORBAR_WIDTH, h, gradient_id
    ));

    let label_x = cb_x + COLORBAR_WIDTH + 6;
    let ticks = [
        (y + 10, panel.scale.max),
        (y + h / 2 + 4, (panel.scale.min + panel.scale.max) / 2.0),
        (y + h, panel.scale.min),
    ];
    for (tick_y, value) in ticks {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="start" font-size="11">{}</text>"#,
            label_x,
            tick_y,
            format_tick(value)
        ));
    }

    if let Some(label) = &panel.colorbar_label {
        let text_x = cb_x + COLORBAR_WIDTH + COLORBAR_LABELS - 12;
        let text_y = y + h / 2;
        svg.push_str(&format!(
            r#"<text x="{tx}" y="{ty}" text-anchor="middle" font-size="11" transform="rotate(90 {tx} {ty})">{label}</text>"#,
            tx = text_x,
            ty = text_y,
            label = escape(label)
        ));
    }

    svg
}

fn rasterize(svg: &str, width: u32, height: u32) -> ForecastResult<tiny_skia::Pixmap> {
    let opt = usvg::Options {
        fontdb: Arc::clone(&FONT_DB),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| ForecastError::RenderError(format!("figure SVG is invalid: {}", e)))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        ForecastError::RenderError(format!("cannot allocate a {}x{} canvas", width, height))
    })?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Copy heatmap pixels into the plot rectangle; missing cells keep the
/// background.
fn blit_heatmap(pixmap: &mut tiny_skia::Pixmap, rect: PlotRect, panel: &Panel<'_>) {
    let grid = panel.grid;
    let (cols, rows) = (grid.width(), grid.height());
    if grid.is_empty() {
        return;
    }

    let heat = render_grid(
        &grid.to_row_major(),
        cols,
        rows,
        &panel.scale,
        &panel.colormap,
    );

    let stride = pixmap.width() as usize * 4;
    let data = pixmap.data_mut();
    let (pw, ph) = (rect.width as usize, rect.height as usize);

    for py in 0..ph {
        let row = (py * rows / ph).min(rows - 1);
        let dst_row = (rect.y as usize + py) * stride;
        for px in 0..pw {
            let col = (px * cols / pw).min(cols - 1);
            let src = (row * cols + col) * 4;
            if heat[src + 3] == 0 {
                continue;
            }
            let dst = dst_row + (rect.x as usize + px) * 4;
            data[dst..dst + 4].copy_from_slice(&heat[src..src + 4]);
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_lat(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let hemisphere = if value < 0.0 { 'S' } else { 'N' };
    format!("{:.1}°{}", value.abs(), hemisphere)
}

fn format_lon(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let hemisphere = if value < 0.0 { 'W' } else { 'E' };
    format!("{:.1}°{}", value.abs(), hemisphere)
}

/// Compact tick label; precipitation rates need scientific notation.
pub fn format_tick(value: f32) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if !value.is_finite() {
        String::new()
    } else if !(0.01..10_000.0).contains(&magnitude) {
        format!("{:.2e}", value)
    } else if magnitude >= 10.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_layout_sizes() {
        let layout = FigureLayout::new(100, 80);
        let (w, h) = layout.figure_size(2);
        assert_eq!(w, 2 * layout.cell_width());
        assert_eq!(h, TITLE_BAND + 80 + AXIS_BAND_BOTTOM);
    }

    #[test]
    fn test_layout_validation() {
        assert!(FigureLayout::default().validate().is_ok());
        assert!(FigureLayout::new(0, 10).validate().is_err());
        assert!(FigureLayout::new(10, MAX_PANEL_EDGE + 1).validate().is_err());
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(100.0), "100");
        assert_eq!(format_tick(2.5), "2.50");
        assert_eq!(format_tick(1.5e-8), "1.50e-8");
    }

    #[test]
    fn test_format_coordinates() {
        assert_eq!(format_lat(-12.34), "12.3°S");
        assert_eq!(format_lat(37.0), "37.0°N");
        assert_eq!(format_lon(69.0), "69.0°E");
        assert_eq!(format_lon(-3.5), "3.5°W");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape("1. Mean 'Most Likely'"), "1. Mean 'Most Likely'");
    }

    #[test]
    fn test_svg_contains_titles_and_gradient() {
        let grid = GeoGrid::new(
            Array2::from_elem((2, 2), 1.0),
            vec![37.0, 36.0],
            vec![69.0, 70.0],
        )
        .unwrap();
        let panel = Panel {
            title: "Probability & more".to_string(),
            grid: &grid,
            colormap: Colormap::blues(),
            scale: ColorScale::new(0.0, 100.0),
            colorbar_label: Some("%".to_string()),
        };
        let svg = build_svg(&FigureLayout::new(50, 40), &[panel]);

        assert!(svg.contains("Probability &amp; more"));
        assert!(svg.contains(r#"id="colormap-0""#));
        assert!(svg.contains("#08306b"));
        assert!(svg.contains("Longitude"));
        assert!(svg.contains("37.0°N"));
    }

    #[test]
    fn test_blit_fills_plot_area() {
        let grid = GeoGrid::new(
            Array2::from_shape_vec((2, 1), vec![0.0, f32::NAN]).unwrap(),
            vec![1.0, 0.0],
            vec![0.0],
        )
        .unwrap();
        let panel = Panel {
            title: String::new(),
            grid: &grid,
            colormap: Colormap::viridis(),
            scale: ColorScale::new(0.0, 1.0),
            colorbar_label: None,
        };
        let mut pixmap = tiny_skia::Pixmap::new(8, 8).unwrap();
        let rect = PlotRect {
            x: 2,
            y: 2,
            width: 4,
            height: 4,
        };
        blit_heatmap(&mut pixmap, rect, &panel);

        let px = |x: usize, y: usize| {
            let i = (y * 8 + x) * 4;
            pixmap.data()[i..i + 4].to_vec()
        };
        // Top half is the first row, bottom half is missing
        assert_eq!(px(2, 2), vec![0x44, 0x01, 0x54, 255]);
        assert_eq!(px(5, 3), vec![0x44, 0x01, 0x54, 255]);
        assert_eq!(px(3, 5), vec![0, 0, 0, 0]);
        assert_eq!(px(0, 0), vec![0, 0, 0, 0]);
    }
}
