//! Map layers for institutions and collaborations.
//!
//! This module holds the layer registry, the timed transitions that animate
//! layer styles, the map projection, and the egui renderer that draws
//! layers and picks features under the pointer.

mod layer;
mod projection;
mod renderer;
mod transition;

pub use layer::{
    ArcLayer, Layer, LayerData, LayerId, LayerKind, LayerRegistry, PointLayer, ARC_LAYER_ID,
    BRUSHING_RADIUS_METERS, POINT_LAYER_ID, POINT_MIN_RADIUS_PIXELS, POINT_RADIUS_METERS,
};
pub use projection::MapProjection;
pub use renderer::{arc_polyline, pick, render_layers, Picked, PICK_TOLERANCE};
pub use transition::{ease_back_in_out, Easing, Lerp, Transition, TRANSITION_DURATION};
