//! Output sinks the view controller writes to.
//!
//! The interactive surface receives the full layer list on every render.
//! The base map only ever receives camera parameters.

use crate::geo::Layer;
use crate::state::ViewState;

/// A surface that draws a declarative list of layers.
pub trait RenderSurface {
    /// Replaces everything the surface draws with `layers`, in order.
    fn set_layers(&mut self, layers: &[Layer]);
}

/// The map underneath the layers.
pub trait BaseMap {
    /// Moves the map camera to exactly `view`, without animation.
    fn jump_to(&mut self, view: &ViewState);
}
