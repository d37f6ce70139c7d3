//! UI modules for the CollabVis application.
//!
//! - Top bar: title, load status and the reveal button
//! - Central canvas: base map and data layers

mod canvas;
mod surfaces;
mod top_bar;

pub use canvas::{render_canvas, AppController};
pub use surfaces::{BaseMapCanvas, LayerCanvas};
pub use top_bar::render_top_bar;
