//! CollabVis - institutions and their collaborations on a map.
//!
//! The library holds everything below the window: the data tables and
//! their loader, the layer registry, the view controller and the egui
//! layer renderer. The `collab-vis` binary wires these into an eframe app.

pub mod config;
pub mod data;
pub mod geo;
pub mod state;
pub mod surface;

pub use config::Config;
pub use geo::{Layer, LayerRegistry};
pub use state::{ViewController, ViewState};
pub use surface::{BaseMap, RenderSurface};
