//! Map layers and the registry that owns them.
//!
//! Two kinds of layer exist: a point layer for institutions and an arc
//! layer for collaborations. A layer's id and kind are fixed when it is
//! created; its visual parameters change in place. The registry keeps
//! layers in insertion order, which is also draw order.

use eframe::egui::Color32;
use std::fmt;
use std::sync::Arc;
use web_time::Instant;

use super::transition::{Easing, Transition, TRANSITION_DURATION};
use crate::data::{Entity, LngLat, Relationship};

/// Id of the institution point layer.
pub const POINT_LAYER_ID: &str = "institutions";
/// Id of the collaboration arc layer.
pub const ARC_LAYER_ID: &str = "collaborations";

/// Point radius when the institution layer is shown.
pub const POINT_RADIUS_METERS: f32 = 50_000.0;
/// Points never shrink below this on screen while they have any radius.
pub const POINT_MIN_RADIUS_PIXELS: f32 = 1.0;
/// Arcs further than this from the pointer are hidden while brushing.
pub const BRUSHING_RADIUS_METERS: f64 = 40_000.0;

const DOT_COLOR: Color32 = Color32::from_rgb(0, 255, 255);
const ARC_WIDTH: f32 = 2.0;
const ARC_HEIGHT: f32 = 0.5;

/// Stable name of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Point,
    Arc,
}

/// Institutions drawn as filled circles sized in meters.
#[derive(Debug, Clone)]
pub struct PointLayer {
    pub entities: Arc<[Entity]>,
    visible: bool,
    radius: Transition<f32>,
    fill: Transition<Color32>,
}

impl PointLayer {
    fn new(entities: Arc<[Entity]>, visible: bool) -> Self {
        Self {
            entities,
            visible,
            radius: Transition::settled(
                Self::radius_for(visible),
                TRANSITION_DURATION,
                Easing::BackInOut,
            ),
            fill: Transition::settled(Self::fill_for(visible), TRANSITION_DURATION, Easing::Linear),
        }
    }

    fn radius_for(visible: bool) -> f32 {
        if visible {
            POINT_RADIUS_METERS
        } else {
            0.0
        }
    }

    fn fill_for(visible: bool) -> Color32 {
        if visible {
            DOT_COLOR
        } else {
            Color32::TRANSPARENT
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Retargets radius and fill. Returns false if already at this target.
    fn set_visible(&mut self, visible: bool, now: Instant) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        self.radius.retarget(Self::radius_for(visible), now);
        self.fill.retarget(Self::fill_for(visible), now);
        true
    }

    /// Radius in meters at `now`. The easing overshoot never goes negative.
    pub fn radius_at(&self, now: Instant) -> f32 {
        self.radius.value_at(now).max(0.0)
    }

    pub fn target_radius(&self) -> f32 {
        self.radius.target()
    }

    pub fn fill_at(&self, now: Instant) -> Color32 {
        self.fill.value_at(now)
    }

    pub fn transition_started(&self) -> Option<Instant> {
        self.radius.started()
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.radius.is_running(now) || self.fill.is_running(now)
    }
}

/// Collaborations drawn as arcs between two positions.
#[derive(Debug, Clone)]
pub struct ArcLayer {
    pub relationships: Arc<[Relationship]>,
    pub source_color: Color32,
    pub target_color: Color32,
    pub width: f32,
    /// Arc height relative to the distance between its endpoints.
    pub height: f32,
    pub brushing_radius: f64,
    brushing_enabled: bool,
}

impl ArcLayer {
    fn new(relationships: Arc<[Relationship]>, brushing_enabled: bool) -> Self {
        let color = Color32::from_rgba_unmultiplied(247, 38, 113, 40);
        Self {
            relationships,
            source_color: color,
            target_color: color,
            width: ARC_WIDTH,
            height: ARC_HEIGHT,
            brushing_radius: BRUSHING_RADIUS_METERS,
            brushing_enabled,
        }
    }

    pub fn brushing_enabled(&self) -> bool {
        self.brushing_enabled
    }

    /// Relationships to draw for the given pointer position.
    ///
    /// While brushing is on and the pointer is over the map, only arcs with
    /// an endpoint within the brushing radius of the pointer are kept.
    pub fn brushed(
        &self,
        pointer: Option<LngLat>,
    ) -> impl Iterator<Item = (usize, &Relationship)> + '_ {
        let brush = pointer.filter(|_| self.brushing_enabled);
        let radius = self.brushing_radius;
        self.relationships
            .iter()
            .enumerate()
            .filter(move |(_, rel)| match brush {
                None => true,
                Some(center) => {
                    center.distance_meters(&rel.source) <= radius
                        || center.distance_meters(&rel.target) <= radius
                }
            })
    }
}

/// Layer payload by kind.
#[derive(Debug, Clone)]
pub enum LayerData {
    Point(PointLayer),
    Arc(ArcLayer),
}

/// A named visual mapping from records to geometry.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    data: LayerData,
}

impl Layer {
    pub fn id(&self) -> &LayerId {
        &self.id
    }

    pub fn kind(&self) -> LayerKind {
        match self.data {
            LayerData::Point(_) => LayerKind::Point,
            LayerData::Arc(_) => LayerKind::Arc,
        }
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub fn as_point(&self) -> Option<&PointLayer> {
        match &self.data {
            LayerData::Point(points) => Some(points),
            LayerData::Arc(_) => None,
        }
    }

    pub fn as_arc(&self) -> Option<&ArcLayer> {
        match &self.data {
            LayerData::Arc(arcs) => Some(arcs),
            LayerData::Point(_) => None,
        }
    }

    /// Number of records this layer maps.
    pub fn record_count(&self) -> usize {
        match &self.data {
            LayerData::Point(points) => points.entities.len(),
            LayerData::Arc(arcs) => arcs.relationships.len(),
        }
    }
}

/// Ordered set of layers handed to the render surface.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the institution layer. Nothing is added for an empty table.
    ///
    /// `initial_visible` sets where the radius and fill rest; no transition
    /// runs until the visibility changes.
    pub fn create_point_layer(
        &mut self,
        entities: impl Into<Arc<[Entity]>>,
        initial_visible: bool,
    ) -> Option<&Layer> {
        let entities: Arc<[Entity]> = entities.into();
        if entities.is_empty() {
            log::debug!("No institutions to show, skipping {} layer", POINT_LAYER_ID);
            return None;
        }

        Some(self.insert(Layer {
            id: LayerId::new(POINT_LAYER_ID),
            data: LayerData::Point(PointLayer::new(entities, initial_visible)),
        }))
    }

    /// Creates the collaboration layer. Nothing is added for an empty table.
    pub fn create_arc_layer(
        &mut self,
        relationships: impl Into<Arc<[Relationship]>>,
        brushing_enabled: bool,
    ) -> Option<&Layer> {
        let relationships: Arc<[Relationship]> = relationships.into();
        if relationships.is_empty() {
            log::debug!("No collaborations to show, skipping {} layer", ARC_LAYER_ID);
            return None;
        }

        Some(self.insert(Layer {
            id: LayerId::new(ARC_LAYER_ID),
            data: LayerData::Arc(ArcLayer::new(relationships, brushing_enabled)),
        }))
    }

    /// Adds a layer, replacing one with the same id in its existing slot.
    fn insert(&mut self, layer: Layer) -> &Layer {
        let index = match self.layers.iter().position(|l| l.id == layer.id) {
            Some(index) => {
                self.layers[index] = layer;
                index
            }
            None => {
                self.layers.push(layer);
                self.layers.len() - 1
            }
        };
        &self.layers[index]
    }

    /// Shows or hides a point layer, (re)starting its transition.
    ///
    /// Returns false without touching anything for unknown ids, arc layers,
    /// or a layer already at that visibility.
    pub fn set_visible(&mut self, id: &str, visible: bool, now: Instant) -> bool {
        match self.get_mut(id).map(|l| &mut l.data) {
            Some(LayerData::Point(points)) => points.set_visible(visible, now),
            Some(LayerData::Arc(_)) => {
                log::debug!("Layer {} has no visibility transition", id);
                false
            }
            None => {
                log::debug!("set_visible: no layer named {}", id);
                false
            }
        }
    }

    /// Turns brushing on an arc layer on or off.
    ///
    /// Returns false for unknown ids, point layers, or no change.
    pub fn set_brushing(&mut self, id: &str, enabled: bool) -> bool {
        match self.get_mut(id).map(|l| &mut l.data) {
            Some(LayerData::Arc(arcs)) => {
                let changed = arcs.brushing_enabled != enabled;
                arcs.brushing_enabled = enabled;
                changed
            }
            Some(LayerData::Point(_)) => {
                log::debug!("Layer {} does not support brushing", id);
                false
            }
            None => {
                log::debug!("set_brushing: no layer named {}", id);
                false
            }
        }
    }

    /// Current layers in insertion order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id.as_str() == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }
}
