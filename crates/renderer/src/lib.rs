//! Figure rendering for the snowfall dashboard.
//!
//! - [`colormap`]: viridis and Blues colormaps, heatmap rasterization
//! - [`figure`]: panel layout, titles, axes and colorbars
//! - [`presenter`]: the comparison and daily figures
//! - [`png`]: indexed/RGBA PNG encoding

pub mod colormap;
pub mod figure;
pub mod png;
pub mod presenter;

pub use colormap::{Color, ColorScale, Colormap};
pub use figure::{FigureLayout, Panel, RenderedImage};
pub use presenter::{render_comparison, render_daily};
