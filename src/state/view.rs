//! Camera state shared by the layer canvas and the base map.

use geo_types::Coord;

/// Latitude limit of the Web Mercator projection.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// Camera parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Center longitude in degrees
    pub longitude: f64,
    /// Center latitude in degrees
    pub latitude: f64,
    /// Web Mercator zoom level (each step doubles the scale)
    pub zoom: f64,
    /// Map rotation in degrees, clockwise from north
    pub bearing: f64,
    /// Tilt away from straight down, in degrees
    pub pitch: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        // Heathrow, looking out over Europe
        Self {
            longitude: 0.45,
            latitude: 51.47,
            zoom: 3.0,
            bearing: 0.0,
            pitch: 30.0,
        }
    }
}

impl ViewState {
    pub const MIN_ZOOM: f64 = 0.0;
    pub const MAX_ZOOM: f64 = 20.0;
    pub const MAX_PITCH: f64 = 60.0;

    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }

    /// Brings every parameter into its valid range: longitude wrapped into
    /// [-180, 180), latitude within the Mercator limit, bearing in
    /// (-180, 180], zoom and pitch clamped.
    pub fn clamped(self) -> Self {
        let bearing = wrap_degrees(self.bearing);
        Self {
            longitude: wrap_degrees(self.longitude),
            latitude: self
                .latitude
                .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE),
            zoom: self.zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM),
            bearing: if bearing == -180.0 { 180.0 } else { bearing },
            pitch: self.pitch.clamp(0.0, Self::MAX_PITCH),
        }
    }

    pub fn with_center(self, center: Coord<f64>) -> Self {
        Self {
            longitude: center.x,
            latitude: center.y,
            ..self
        }
    }

    pub fn with_zoom(self, zoom: f64) -> Self {
        Self { zoom, ..self }
    }

    pub fn rotated(self, bearing_delta: f64, pitch_delta: f64) -> Self {
        Self {
            bearing: self.bearing + bearing_delta,
            pitch: self.pitch + pitch_delta,
            ..self
        }
    }
}

/// Wraps an angle into [-180, 180). In-range values are returned as-is.
fn wrap_degrees(degrees: f64) -> f64 {
    if (-180.0..180.0).contains(&degrees) {
        degrees
    } else {
        (degrees + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_wraps_and_limits() {
        let view = ViewState {
            longitude: 190.0,
            latitude: 89.0,
            zoom: 25.0,
            bearing: -190.0,
            pitch: 75.0,
        }
        .clamped();

        assert!((view.longitude - -170.0).abs() < 1e-9);
        assert_eq!(view.latitude, MAX_MERCATOR_LATITUDE);
        assert_eq!(view.zoom, ViewState::MAX_ZOOM);
        assert!((view.bearing - 170.0).abs() < 1e-9);
        assert_eq!(view.pitch, ViewState::MAX_PITCH);
    }

    #[test]
    fn test_default_is_already_clamped() {
        assert_eq!(ViewState::default().clamped(), ViewState::default());
    }
}
