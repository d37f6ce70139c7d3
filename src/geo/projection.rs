//! Map projection and coordinate transformation.
//!
//! Handles converting between geographic coordinates (lon/lat) and screen
//! coordinates for a camera `ViewState`. Positions go through Web Mercator,
//! are rotated by the bearing and foreshortened vertically by the pitch.

use eframe::egui::{Pos2, Rect};
use geo_types::Coord;
use std::f64::consts::PI;

use crate::state::{ViewState, MAX_MERCATOR_LATITUDE};

/// Width in pixels of the whole world at zoom 0.
const TILE_SIZE: f64 = 512.0;
/// Equatorial circumference of the Earth.
const EARTH_CIRCUMFERENCE_METERS: f64 = 40_075_016.686;

/// Map projection for converting geographic to screen coordinates.
#[derive(Debug, Clone)]
pub struct MapProjection {
    /// Camera the projection is built for
    pub view: ViewState,
    /// Screen rectangle for the canvas
    pub screen_rect: Rect,
}

impl MapProjection {
    pub fn new(view: ViewState, screen_rect: Rect) -> Self {
        Self { view, screen_rect }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.view.zoom)
    }

    /// Web Mercator position in world pixels.
    fn to_world(&self, coord: Coord<f64>) -> (f64, f64) {
        let size = self.world_size();
        let lat = coord
            .y
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();
        let x = (coord.x + 180.0) / 360.0 * size;
        let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0 * size;
        (x, y)
    }

    fn from_world(&self, x: f64, y: f64) -> Coord<f64> {
        let size = self.world_size();
        let lng = x / size * 360.0 - 180.0;
        let lat = (2.0 * (PI * (1.0 - 2.0 * y / size)).exp().atan() - PI / 2.0).to_degrees();
        Coord { x: lng, y: lat }
    }

    fn pitch_scale(&self) -> f64 {
        self.view.pitch.to_radians().cos()
    }

    /// Converts geographic coordinates (lon, lat) to screen position.
    pub fn geo_to_screen(&self, coord: Coord<f64>) -> Pos2 {
        let (cx, cy) = self.to_world(self.view.center());
        let (x, y) = self.to_world(coord);
        let (dx, dy) = (x - cx, y - cy);

        // Rotate the map against the bearing so the bearing points up.
        let (sin, cos) = self.view.bearing.to_radians().sin_cos();
        let rx = dx * cos + dy * sin;
        let ry = (-dx * sin + dy * cos) * self.pitch_scale();

        let center = self.screen_rect.center();
        Pos2::new(center.x + rx as f32, center.y + ry as f32)
    }

    /// Converts screen position to geographic coordinates (lon, lat).
    ///
    /// The result is not range-checked; positions off the world edge give
    /// longitudes outside [-180, 180].
    pub fn screen_to_geo(&self, pos: Pos2) -> Coord<f64> {
        let center = self.screen_rect.center();
        let rx = (pos.x - center.x) as f64;
        let ry = (pos.y - center.y) as f64 / self.pitch_scale();

        let (sin, cos) = self.view.bearing.to_radians().sin_cos();
        let dx = rx * cos - ry * sin;
        let dy = rx * sin + ry * cos;

        let (cx, cy) = self.to_world(self.view.center());
        self.from_world(cx + dx, cy + dy)
    }

    /// Screen size of a distance in meters at the given latitude.
    pub fn meters_to_pixels(&self, meters: f64, latitude: f64) -> f32 {
        let meters_per_pixel =
            EARTH_CIRCUMFERENCE_METERS * latitude.to_radians().cos() / self.world_size();
        if meters_per_pixel <= 0.0 {
            return 0.0;
        }
        (meters / meters_per_pixel) as f32
    }

    /// Checks if a screen position falls on the canvas (with margin).
    pub fn is_visible(&self, pos: Pos2, margin: f32) -> bool {
        self.screen_rect.expand(margin).contains(pos)
    }
}
