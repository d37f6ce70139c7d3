//! egui implementations of the controller's output sinks.

use collab_vis::geo::{Layer, MapProjection};
use collab_vis::state::{ViewState, MAX_MERCATOR_LATITUDE};
use collab_vis::{BaseMap, RenderSurface};
use eframe::egui::{Color32, Painter, Rect, Stroke};
use geo_types::Coord;

/// Background color for the map
const OCEAN_COLOR: Color32 = Color32::from_rgb(20, 20, 35);
/// Graticule line color
const GRATICULE_COLOR: Color32 = Color32::from_rgba_premultiplied(50, 60, 80, 120);
/// Degrees between graticule lines
const GRATICULE_STEP: f64 = 15.0;
/// Samples per graticule line, so meridians bend with the pitch and bearing
const GRATICULE_SAMPLES: usize = 48;

/// Holds the last layer list handed over by the controller.
#[derive(Default)]
pub struct LayerCanvas {
    layers: Vec<Layer>,
}

impl LayerCanvas {
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl RenderSurface for LayerCanvas {
    fn set_layers(&mut self, layers: &[Layer]) {
        self.layers = layers.to_vec();
    }
}

/// Plain vector base map: background plus a lat/lng graticule.
#[derive(Default)]
pub struct BaseMapCanvas {
    view: ViewState,
}

impl BaseMapCanvas {
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Paints the base map into `rect` using the camera last jumped to.
    pub fn paint(&self, painter: &Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, OCEAN_COLOR);

        let projection = MapProjection::new(self.view, rect);
        let stroke = Stroke::new(1.0, GRATICULE_COLOR);

        let mut lng = -180.0;
        while lng <= 180.0 {
            let line: Vec<_> = (0..=GRATICULE_SAMPLES)
                .map(|i| {
                    let t = i as f64 / GRATICULE_SAMPLES as f64;
                    let lat = -MAX_MERCATOR_LATITUDE + t * 2.0 * MAX_MERCATOR_LATITUDE;
                    projection.geo_to_screen(Coord { x: lng, y: lat })
                })
                .collect();
            painter.line(line, stroke);
            lng += GRATICULE_STEP;
        }

        let mut lat = -75.0;
        while lat <= 75.0 {
            let line: Vec<_> = (0..=GRATICULE_SAMPLES)
                .map(|i| {
                    let t = i as f64 / GRATICULE_SAMPLES as f64;
                    projection.geo_to_screen(Coord {
                        x: -180.0 + t * 360.0,
                        y: lat,
                    })
                })
                .collect();
            painter.line(line, stroke);
            lat += GRATICULE_STEP;
        }
    }
}

impl BaseMap for BaseMapCanvas {
    fn jump_to(&mut self, view: &ViewState) {
        self.view = *view;
    }
}
