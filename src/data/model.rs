//! Record types shared by the tables, the layers and the renderer.

use geo_types::Coord;
use std::fmt;

use super::RowError;

/// Mean Earth radius, used for great-circle distances.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A validated geographic position in degrees.
///
/// Longitude is within [-180, 180] and latitude within [-90, 90]; both are
/// finite. Construction is the only place this is checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat(Coord<f64>);

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Result<Self, RowError> {
        let in_range = lng.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lng)
            && (-90.0..=90.0).contains(&lat);
        if !in_range {
            return Err(RowError::OutOfRange { lng, lat });
        }
        Ok(Self(Coord { x: lng, y: lat }))
    }

    pub fn lng(&self) -> f64 {
        self.0.x
    }

    pub fn lat(&self) -> f64 {
        self.0.y
    }

    pub fn coord(&self) -> Coord<f64> {
        self.0
    }

    /// Great-circle (haversine) distance in meters.
    pub fn distance_meters(&self, other: &LngLat) -> f64 {
        let (lat1, lat2) = (self.lat().to_radians(), other.lat().to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng() - self.lng()).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

impl TryFrom<Coord<f64>> for LngLat {
    type Error = RowError;

    fn try_from(coord: Coord<f64>) -> Result<Self, Self::Error> {
        Self::new(coord.x, coord.y)
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lng(), self.lat())
    }
}

/// An institution: a named point on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub position: LngLat,
}

/// A collaboration between two institutions, drawn as an arc.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub source: LngLat,
    pub target: LngLat,
    /// Number of shared works, when the table carries it.
    pub count: Option<u32>,
}
