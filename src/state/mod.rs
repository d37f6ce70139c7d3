//! Application state management.
//!
//! Camera state and the view controller that owns it, along with the
//! reveal and brushing state driven by timer and pointer events.

mod controller;
mod view;

pub use controller::{
    BrushingChange, HoverTarget, LoadState, PointVisibility, PointerInfo, ViewController,
    DEFAULT_REVEAL_THRESHOLD,
};
pub use view::{ViewState, MAX_MERCATOR_LATITUDE};
