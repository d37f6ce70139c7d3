//! Layer rendering and picking.
//!
//! Draws the registry's layers onto an egui painter and answers which
//! feature lies under the pointer. Both use the same arc polylines.

use super::{
    ArcLayer, Layer, LayerData, Lerp, MapProjection, PointLayer, POINT_MIN_RADIUS_PIXELS,
};
use crate::data::{LngLat, Relationship};
use eframe::egui::{Painter, Pos2, Stroke};
use web_time::Instant;

/// Line segments per arc.
const ARC_SEGMENTS: usize = 24;
/// How close (in pixels) the pointer must be to count as over a feature.
pub const PICK_TOLERANCE: f32 = 4.0;

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Picked {
    /// Index into the arc layer's relationships
    Relationship(usize),
    /// Index into the point layer's entities
    Entity(usize),
}

/// Renders all layers in registry order (back to front).
pub fn render_layers(
    painter: &Painter,
    layers: &[Layer],
    projection: &MapProjection,
    pointer: Option<LngLat>,
    now: Instant,
) {
    for layer in layers {
        match layer.data() {
            LayerData::Point(points) => render_points(painter, points, projection, now),
            LayerData::Arc(arcs) => render_arcs(painter, arcs, projection, pointer),
        }
    }
}

fn render_points(painter: &Painter, points: &PointLayer, projection: &MapProjection, now: Instant) {
    let radius = points.radius_at(now);
    if radius <= 0.0 {
        return;
    }
    let fill = points.fill_at(now);
    if fill.a() == 0 {
        return;
    }

    for entity in points.entities.iter() {
        let pos = projection.geo_to_screen(entity.position.coord());
        let pixels = projection
            .meters_to_pixels(radius as f64, entity.position.lat())
            .max(POINT_MIN_RADIUS_PIXELS);
        if !projection.is_visible(pos, pixels) {
            continue;
        }
        painter.circle_filled(pos, pixels, fill);
    }
}

fn render_arcs(
    painter: &Painter,
    arcs: &ArcLayer,
    projection: &MapProjection,
    pointer: Option<LngLat>,
) {
    for (_, relationship) in arcs.brushed(pointer) {
        let points = arc_polyline(projection, relationship, arcs.height);
        if !points.iter().any(|p| projection.is_visible(*p, 0.0)) {
            continue;
        }
        for (i, segment) in points.windows(2).enumerate() {
            let t = i as f32 / ARC_SEGMENTS as f32;
            let color = arcs.source_color.lerp(arcs.target_color, t);
            painter.line_segment([segment[0], segment[1]], Stroke::new(arcs.width, color));
        }
    }
}

/// Screen-space polyline of an arc, lifted toward the top of the screen by
/// `height` times the distance between its endpoints.
pub fn arc_polyline(
    projection: &MapProjection,
    relationship: &Relationship,
    height: f32,
) -> Vec<Pos2> {
    let from = projection.geo_to_screen(relationship.source.coord());
    let to = projection.geo_to_screen(relationship.target.coord());
    let lift = from.distance(to) * height;
    let control = from.lerp(to, 0.5) - eframe::egui::vec2(0.0, lift);

    (0..=ARC_SEGMENTS)
        .map(|s| {
            let t = s as f32 / ARC_SEGMENTS as f32;
            quadratic_bezier(from, control, to, t)
        })
        .collect()
}

fn quadratic_bezier(p0: Pos2, p1: Pos2, p2: Pos2, t: f32) -> Pos2 {
    let u = 1.0 - t;
    let x = u * u * p0.x + 2.0 * u * t * p1.x + t * t * p2.x;
    let y = u * u * p0.y + 2.0 * u * t * p1.y + t * t * p2.y;
    Pos2::new(x, y)
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Finds the feature under `pos`, topmost layer first.
///
/// Hidden points are skipped. Arcs are hit-tested against the whole layer,
/// not the brushed subset, so an arc that brushing filters out of the
/// drawing still counts as under the pointer.
pub fn pick(
    layers: &[Layer],
    projection: &MapProjection,
    pos: Pos2,
    now: Instant,
) -> Option<Picked> {
    layers.iter().rev().find_map(|layer| match layer.data() {
        LayerData::Point(points) => pick_entity(points, projection, pos, now),
        LayerData::Arc(arcs) => pick_relationship(arcs, projection, pos),
    })
}

fn pick_entity(
    points: &PointLayer,
    projection: &MapProjection,
    pos: Pos2,
    now: Instant,
) -> Option<Picked> {
    let radius = points.radius_at(now);
    if radius <= 0.0 {
        return None;
    }
    points
        .entities
        .iter()
        .position(|entity| {
            let center = projection.geo_to_screen(entity.position.coord());
            let pixels = projection
                .meters_to_pixels(radius as f64, entity.position.lat())
                .max(POINT_MIN_RADIUS_PIXELS);
            center.distance(pos) <= pixels
        })
        .map(Picked::Entity)
}

fn pick_relationship(arcs: &ArcLayer, projection: &MapProjection, pos: Pos2) -> Option<Picked> {
    let tolerance = PICK_TOLERANCE + arcs.width / 2.0;
    arcs.relationships
        .iter()
        .position(|relationship| {
            arc_polyline(projection, relationship, arcs.height)
                .windows(2)
                .any(|s| distance_to_segment(pos, s[0], s[1]) <= tolerance)
        })
        .map(Picked::Relationship)
}
