//! View controller: camera, reveal timing, hover brushing and rendering.
//!
//! Every event (data load, timer tick, hover, camera move) arrives as a
//! separate call on the UI thread. Layer changes made here are always
//! followed by an explicit `render()`.
//!
//! ## Institution reveal
//!
//! ```text
//! Hidden ──(timer past threshold | reveal button)──▶ Visible
//! ```
//!
//! There is no way back. The timer is one-shot: it is armed when data
//! loads and retired the first time either trigger fires.
//!
//! ## Arc brushing
//!
//! ```text
//! Off ◀──(hover leaves arcs)── On
//!  └────(hover enters arc)────▶
//! ```

use web_time::{Duration, Instant};

use crate::data::{Entity, LngLat, LoadError, Relationship};
use crate::geo::{LayerRegistry, Picked, ARC_LAYER_ID, POINT_LAYER_ID};
use crate::surface::{BaseMap, RenderSurface};

use super::ViewState;

/// Delay between data load and the institution reveal.
pub const DEFAULT_REVEAL_THRESHOLD: Duration = Duration::from_millis(200);

/// Progress of the data load as seen by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Loaded { entities: usize, relationships: usize },
    Failed(String),
}

/// Institution layer visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointVisibility {
    Hidden,
    Visible,
}

/// A brushing state change issued by hover handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushingChange {
    Enabled,
    Disabled,
}

/// The feature under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Relationship(usize),
    Entity(usize),
    Nothing,
}

impl From<Option<Picked>> for HoverTarget {
    fn from(picked: Option<Picked>) -> Self {
        match picked {
            Some(Picked::Relationship(index)) => HoverTarget::Relationship(index),
            Some(Picked::Entity(index)) => HoverTarget::Entity(index),
            None => HoverTarget::Nothing,
        }
    }
}

/// A hover event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInfo {
    /// Geographic position under the pointer, if it is over the map
    pub position: Option<LngLat>,
    pub target: HoverTarget,
}

impl PointerInfo {
    /// The pointer has left the map.
    pub fn outside() -> Self {
        Self {
            position: None,
            target: HoverTarget::Nothing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealTimer {
    Idle,
    Armed(Instant),
    Retired,
}

/// Owns camera and interaction state and drives the layer registry.
pub struct ViewController<S, B> {
    registry: LayerRegistry,
    view_state: ViewState,
    surface: S,
    base_map: B,
    load_state: LoadState,
    points: PointVisibility,
    brushing: bool,
    pointer: Option<LngLat>,
    reveal_threshold: Duration,
    timer: RevealTimer,
    brushing_history: Vec<BrushingChange>,
}

impl<S: RenderSurface, B: BaseMap> ViewController<S, B> {
    /// Creates a controller and moves the base map to the initial camera.
    pub fn new(surface: S, base_map: B, view_state: ViewState) -> Self {
        let mut controller = Self {
            registry: LayerRegistry::new(),
            view_state: view_state.clamped(),
            surface,
            base_map,
            load_state: LoadState::Pending,
            points: PointVisibility::Hidden,
            brushing: false,
            pointer: None,
            reveal_threshold: DEFAULT_REVEAL_THRESHOLD,
            timer: RevealTimer::Idle,
            brushing_history: Vec::new(),
        };
        controller.base_map.jump_to(&controller.view_state);
        controller
    }

    pub fn with_reveal_threshold(mut self, threshold: Duration) -> Self {
        self.reveal_threshold = threshold;
        self
    }

    /// Builds the layers from freshly loaded tables and arms the reveal
    /// timer at `now`.
    ///
    /// Institutions start hidden unless they were already revealed; arcs
    /// start with brushing off.
    pub fn on_data_loaded(
        &mut self,
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        now: Instant,
    ) {
        let counts = (entities.len(), relationships.len());
        let show_points = self.points == PointVisibility::Visible;

        self.registry.clear();
        self.registry.create_point_layer(entities, show_points);
        self.registry.create_arc_layer(relationships, false);
        self.brushing = false;

        self.load_state = LoadState::Loaded {
            entities: counts.0,
            relationships: counts.1,
        };
        self.timer = if show_points {
            RevealTimer::Retired
        } else {
            RevealTimer::Armed(now)
        };
        log::info!(
            "Built {} layer(s) from {} institutions and {} collaborations",
            self.registry.len(),
            counts.0,
            counts.1
        );

        self.render();
    }

    /// Records a failed load. No layers are kept.
    pub fn on_load_failed(&mut self, error: &LoadError) {
        log::error!("Not showing any layers: {}", error);
        self.load_state = LoadState::Failed(error.to_string());
        self.registry.clear();
        self.brushing = false;
        self.timer = RevealTimer::Idle;
        self.render();
    }

    /// Timer callback with the time elapsed since data load.
    ///
    /// Reveals the institutions the first time `elapsed` exceeds the
    /// threshold, then retires the timer. Returns true only on that call.
    pub fn on_elapsed(&mut self, elapsed: Duration) -> bool {
        let RevealTimer::Armed(armed_at) = self.timer else {
            return false;
        };
        if elapsed <= self.reveal_threshold {
            return false;
        }

        self.timer = RevealTimer::Retired;
        log::debug!("Reveal timer fired after {:?}", elapsed);
        self.reveal(armed_at + elapsed)
    }

    /// Feeds the timer from a clock reading.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.timer {
            RevealTimer::Armed(armed_at) => self.on_elapsed(now.saturating_duration_since(armed_at)),
            RevealTimer::Idle | RevealTimer::Retired => false,
        }
    }

    /// Manual reveal. Same one-way transition as the timer, which is
    /// retired if still armed.
    pub fn reveal_points(&mut self, now: Instant) -> bool {
        if let RevealTimer::Armed(_) = self.timer {
            self.timer = RevealTimer::Retired;
        }
        self.reveal(now)
    }

    fn reveal(&mut self, now: Instant) -> bool {
        if self.points == PointVisibility::Visible {
            return false;
        }
        self.points = PointVisibility::Visible;
        self.registry.set_visible(POINT_LAYER_ID, true, now);
        log::info!("Showing institutions");
        self.render();
        true
    }

    /// Hover callback. Brushing follows whether the pointer is over an arc;
    /// nothing is issued when the state would not change. Without an arc
    /// layer brushing stays off.
    pub fn on_hover(&mut self, pointer: PointerInfo) -> Option<BrushingChange> {
        self.pointer = pointer.position;

        let want = matches!(pointer.target, HoverTarget::Relationship(_))
            && self.registry.get(ARC_LAYER_ID).is_some();
        if want == self.brushing {
            return None;
        }

        self.brushing = want;
        self.registry.set_brushing(ARC_LAYER_ID, want);
        let change = if want {
            BrushingChange::Enabled
        } else {
            BrushingChange::Disabled
        };
        log::debug!("Brushing {:?}", change);
        self.brushing_history.push(change);
        self.render();
        Some(change)
    }

    /// Camera callback. The base map is moved to exactly the same camera.
    pub fn on_camera_change(&mut self, view: ViewState) {
        self.view_state = view.clamped();
        self.base_map.jump_to(&self.view_state);
    }

    /// Hands the current layers to the render surface.
    pub fn render(&mut self) {
        self.surface.set_layers(self.registry.layers());
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn points_visible(&self) -> bool {
        self.points == PointVisibility::Visible
    }

    pub fn brushing(&self) -> bool {
        self.brushing
    }

    pub fn pointer(&self) -> Option<LngLat> {
        self.pointer
    }

    /// True while the reveal timer is waiting to fire.
    pub fn timer_armed(&self) -> bool {
        matches!(self.timer, RevealTimer::Armed(_))
    }

    /// Every brushing change issued so far, oldest first.
    pub fn brushing_history(&self) -> &[BrushingChange] {
        &self.brushing_history
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn base_map(&self) -> &B {
        &self.base_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{
        arc_polyline, pick, Layer, LayerKind, MapProjection, POINT_RADIUS_METERS,
        TRANSITION_DURATION,
    };
    use eframe::egui::{Pos2, Rect, Vec2};

    #[derive(Default)]
    struct RecordingSurface {
        renders: Vec<Vec<Layer>>,
    }

    impl RenderSurface for RecordingSurface {
        fn set_layers(&mut self, layers: &[Layer]) {
            self.renders.push(layers.to_vec());
        }
    }

    #[derive(Default)]
    struct RecordingMap {
        view: Option<ViewState>,
        jumps: usize,
    }

    impl BaseMap for RecordingMap {
        fn jump_to(&mut self, view: &ViewState) {
            self.view = Some(*view);
            self.jumps += 1;
        }
    }

    type TestController = ViewController<RecordingSurface, RecordingMap>;

    fn controller() -> TestController {
        ViewController::new(
            RecordingSurface::default(),
            RecordingMap::default(),
            ViewState::default(),
        )
    }

    fn entity(id: &str, lng: f64, lat: f64) -> Entity {
        Entity {
            id: id.to_string(),
            name: String::new(),
            position: LngLat::new(lng, lat).unwrap(),
        }
    }

    fn relationship() -> Relationship {
        Relationship {
            source: LngLat::new(0.45, 51.47).unwrap(),
            target: LngLat::new(-73.9, 40.7).unwrap(),
            count: Some(2),
        }
    }

    fn over_arc() -> PointerInfo {
        PointerInfo {
            position: Some(LngLat::new(-30.0, 50.0).unwrap()),
            target: HoverTarget::Relationship(0),
        }
    }

    fn over_nothing() -> PointerInfo {
        PointerInfo {
            position: Some(LngLat::new(100.0, -30.0).unwrap()),
            target: HoverTarget::Nothing,
        }
    }

    #[test]
    fn test_data_loaded_builds_hidden_points_and_unbrushed_arcs() {
        let t0 = Instant::now();
        let mut c = controller();

        c.on_data_loaded(vec![entity("1", 0.45, 51.47)], vec![relationship()], t0);

        let layers = c.surface().renders.last().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].kind(), LayerKind::Point);
        assert!(!layers[0].as_point().unwrap().visible());
        assert!(!layers[1].as_arc().unwrap().brushing_enabled());
        assert_eq!(
            c.load_state(),
            &LoadState::Loaded {
                entities: 1,
                relationships: 1
            }
        );
        assert!(c.timer_armed());
    }

    #[test]
    fn test_single_entity_no_relationships() {
        let mut c = controller();

        c.on_data_loaded(vec![entity("1", 0.45, 51.47)], Vec::new(), Instant::now());

        let layers = c.registry().layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].kind(), LayerKind::Point);
        assert_eq!(layers[0].record_count(), 1);
    }

    #[test]
    fn test_elapsed_reveals_exactly_once() {
        let t0 = Instant::now();
        let mut c = controller();
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], Vec::new(), t0);

        assert!(!c.on_elapsed(Duration::from_millis(100)));
        assert!(!c.on_elapsed(DEFAULT_REVEAL_THRESHOLD));
        assert!(!c.points_visible());

        let fired: Vec<bool> = (1..=10)
            .map(|i| c.on_elapsed(DEFAULT_REVEAL_THRESHOLD + Duration::from_millis(i * 16)))
            .collect();
        assert_eq!(fired.iter().filter(|f| **f).count(), 1);
        assert!(fired[0]);
        assert!(c.points_visible());
        assert!(!c.timer_armed());

        // Transition started at the moment the timer fired.
        let points = c.registry().get(POINT_LAYER_ID).and_then(Layer::as_point).unwrap();
        let fired_at = t0 + DEFAULT_REVEAL_THRESHOLD + Duration::from_millis(16);
        assert_eq!(points.transition_started(), Some(fired_at));
        assert_eq!(
            points.radius_at(fired_at + TRANSITION_DURATION),
            POINT_RADIUS_METERS
        );
    }

    #[test]
    fn test_tick_before_load_does_nothing() {
        let mut c = controller();
        assert!(!c.tick(Instant::now() + Duration::from_secs(5)));
        assert!(!c.points_visible());
    }

    #[test]
    fn test_tick_uses_time_since_load() {
        let t0 = Instant::now();
        let mut c = controller().with_reveal_threshold(Duration::from_millis(500));
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], Vec::new(), t0);

        assert!(!c.tick(t0 + Duration::from_millis(300)));
        assert!(c.tick(t0 + Duration::from_millis(600)));
        assert!(!c.tick(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn test_manual_reveal_retires_timer() {
        let t0 = Instant::now();
        let mut c = controller();
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], Vec::new(), t0);
        let renders_before = c.surface().renders.len();

        assert!(c.reveal_points(t0 + Duration::from_millis(50)));
        assert!(!c.reveal_points(t0 + Duration::from_millis(60)));
        assert!(!c.on_elapsed(Duration::from_secs(1)));

        assert!(c.points_visible());
        assert_eq!(c.surface().renders.len(), renders_before + 1);
        let points = c.registry().get(POINT_LAYER_ID).and_then(Layer::as_point).unwrap();
        assert_eq!(
            points.transition_started(),
            Some(t0 + Duration::from_millis(50))
        );
    }

    #[test]
    fn test_reload_after_reveal_keeps_points_visible() {
        let t0 = Instant::now();
        let mut c = controller();
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], Vec::new(), t0);
        c.reveal_points(t0);

        c.on_data_loaded(vec![entity("2", 1.0, 1.0)], Vec::new(), t0);

        let points = c.registry().get(POINT_LAYER_ID).and_then(Layer::as_point).unwrap();
        assert!(points.visible());
        assert!(!c.timer_armed());
    }

    #[test]
    fn test_hover_never_repeats_a_brushing_change() {
        let mut c = controller();
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], vec![relationship()], Instant::now());

        assert_eq!(c.on_hover(over_arc()), Some(BrushingChange::Enabled));
        assert_eq!(c.on_hover(over_arc()), None);
        assert_eq!(c.on_hover(over_nothing()), Some(BrushingChange::Disabled));
        assert_eq!(c.on_hover(over_nothing()), None);
        assert_eq!(c.on_hover(PointerInfo::outside()), None);
        assert_eq!(c.on_hover(over_arc()), Some(BrushingChange::Enabled));

        let history = c.brushing_history();
        assert_eq!(
            history,
            &[
                BrushingChange::Enabled,
                BrushingChange::Disabled,
                BrushingChange::Enabled
            ]
        );
        assert!(history.windows(2).all(|w| w[0] != w[1]));

        let arcs = c.registry().get(ARC_LAYER_ID).and_then(Layer::as_arc).unwrap();
        assert!(arcs.brushing_enabled());
    }

    #[test]
    fn test_hover_without_arc_layer_never_brushes() {
        let mut c = controller();
        assert_eq!(c.on_hover(over_arc()), None);

        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], Vec::new(), Instant::now());
        assert_eq!(c.on_hover(over_arc()), None);

        assert!(!c.brushing());
        assert!(c.brushing_history().is_empty());
    }

    #[test]
    fn test_load_failure_turns_brushing_off() {
        let mut c = controller();
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], vec![relationship()], Instant::now());
        c.on_hover(over_arc());
        assert!(c.brushing());

        c.on_load_failed(&LoadError::MissingColumn("lng"));

        assert!(!c.brushing());
        assert_eq!(c.on_hover(over_arc()), None);
    }

    #[test]
    fn test_pointer_resting_on_arc_keeps_brushing_on() {
        let view = ViewState {
            longitude: 0.0,
            latitude: 0.0,
            zoom: 4.0,
            bearing: 0.0,
            pitch: 0.0,
        };
        let arc = Relationship {
            source: LngLat::new(-5.0, 0.0).unwrap(),
            target: LngLat::new(5.0, 0.0).unwrap(),
            count: None,
        };
        let t0 = Instant::now();
        let mut c = ViewController::new(
            RecordingSurface::default(),
            RecordingMap::default(),
            view,
        );
        c.on_data_loaded(vec![entity("1", -5.0, 0.0)], vec![arc.clone()], t0);

        let projection = MapProjection::new(
            *c.view_state(),
            Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        );
        let line = arc_polyline(&projection, &arc, 0.5);
        let apex = line[line.len() / 2];
        let position = LngLat::try_from(projection.screen_to_geo(apex)).ok();

        let brushing: Vec<bool> = (0..6)
            .map(|_| {
                let layers = c.surface().renders.last().unwrap().clone();
                let picked = pick(&layers, &projection, apex, t0);
                c.on_hover(PointerInfo {
                    position,
                    target: picked.into(),
                });
                c.brushing()
            })
            .collect();

        assert_eq!(brushing, vec![true; 6]);
        assert_eq!(c.brushing_history(), &[BrushingChange::Enabled]);
    }

    #[test]
    fn test_hover_over_entity_disables_brushing() {
        let mut c = controller();
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], vec![relationship()], Instant::now());
        c.on_hover(over_arc());

        let change = c.on_hover(PointerInfo {
            position: Some(LngLat::new(0.0, 0.0).unwrap()),
            target: HoverTarget::Entity(0),
        });

        assert_eq!(change, Some(BrushingChange::Disabled));
        assert_eq!(c.pointer(), Some(LngLat::new(0.0, 0.0).unwrap()));
    }

    #[test]
    fn test_camera_change_keeps_base_map_in_sync() {
        let mut c = controller();
        let views = [
            ViewState {
                longitude: -73.9,
                latitude: 40.7,
                zoom: 5.5,
                bearing: 12.0,
                pitch: 45.0,
            },
            ViewState {
                longitude: 200.0,
                latitude: 88.0,
                zoom: -1.0,
                bearing: 400.0,
                pitch: 90.0,
            },
        ];

        for view in views {
            c.on_camera_change(view);
            assert_eq!(c.base_map().view.as_ref(), Some(c.view_state()));
        }
        assert_eq!(c.base_map().jumps, 3);
    }

    #[test]
    fn test_load_failure_leaves_no_layers() {
        let mut c = controller();
        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], Vec::new(), Instant::now());

        c.on_load_failed(&LoadError::MissingColumn("lng"));

        assert!(c.registry().is_empty());
        assert!(c.surface().renders.last().unwrap().is_empty());
        assert!(matches!(c.load_state(), LoadState::Failed(_)));
        assert!(!c.tick(Instant::now() + Duration::from_secs(1)));
    }

    #[test]
    fn test_unparsable_relationship_is_dropped_before_layers() {
        let csv = "instA_coords,instB_coords\n\
                   \"[0.45, 51.47]\",\"[-73.9, 40.7]\"\n\
                   \"[2.35, 48.85]\",\"not a pair\"\n";
        let (relationships, report) = crate::data::read_relationships(csv.as_bytes()).unwrap();
        let mut c = controller();

        c.on_data_loaded(vec![entity("1", 0.0, 0.0)], relationships, Instant::now());

        assert_eq!(report.dropped, 1);
        let arcs = c.registry().get(ARC_LAYER_ID).unwrap();
        assert_eq!(arcs.record_count(), report.total() - 1);
    }
}
