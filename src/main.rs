#![warn(clippy::all)]

//! CollabVis - An interactive map of research collaborations.
//!
//! Institutions are drawn as dots and collaborations as arcs between them.
//! Hovering an arc brushes the arc layer down to the collaborations near
//! the pointer.

mod ui;

use collab_vis::data::{LoadChannel, LoadResult};
use collab_vis::geo::POINT_LAYER_ID;
use collab_vis::{Config, ViewController, ViewState};
use eframe::egui;
use ui::{AppController, BaseMapCanvas, LayerCanvas};
use web_time::{Duration, Instant};

/// Poll interval for the background load
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> eframe::Result<()> {
    let dotenv = dotenvy::dotenv();
    env_logger::init();

    match dotenv {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => log::warn!("Failed to read .env: {}", e),
    }

    let config = Config::from_env();
    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "CollabVis",
        native_options,
        Box::new(|_cc| Ok(Box::new(CollabVisApp::new(config)))),
    )
}

/// Main application state and logic.
pub struct CollabVisApp {
    /// Camera, layers and interaction state
    controller: AppController,

    /// Channel for the background table load
    load_channel: LoadChannel,

    /// Status text shown while nothing has loaded yet
    status_message: String,
}

impl CollabVisApp {
    pub fn new(config: Config) -> Self {
        let controller = ViewController::new(
            LayerCanvas::default(),
            BaseMapCanvas::default(),
            ViewState::default(),
        )
        .with_reveal_threshold(config.reveal_threshold);

        let status_message = format!(
            "Loading {} and {}...",
            config.institutions, config.collaborations
        );
        let mut load_channel = LoadChannel::new();
        load_channel.load(config.institutions, config.collaborations);

        Self {
            controller,
            load_channel,
            status_message,
        }
    }

    fn is_animating(&self, now: Instant) -> bool {
        self.controller
            .registry()
            .get(POINT_LAYER_ID)
            .and_then(|layer| layer.as_point())
            .is_some_and(|points| points.is_animating(now))
    }
}

impl eframe::App for CollabVisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for a completed load
        if let Some(result) = self.load_channel.try_recv() {
            match result {
                LoadResult::Loaded(data) => {
                    self.controller.on_data_loaded(
                        data.entities,
                        data.relationships,
                        Instant::now(),
                    );
                }
                LoadResult::Failed(e) => {
                    self.controller.on_load_failed(&e);
                }
            }
        }

        self.controller.tick(Instant::now());

        // Top panel must be rendered before CentralPanel
        ui::render_top_bar(ctx, &mut self.controller, &self.status_message);
        let now = Instant::now();
        ui::render_canvas(ctx, &mut self.controller, now);

        if self.controller.timer_armed() || self.is_animating(now) {
            ctx.request_repaint();
        } else if self.load_channel.is_loading() {
            ctx.request_repaint_after(LOAD_POLL_INTERVAL);
        }
    }
}
