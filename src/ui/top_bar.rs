//! Top bar UI: app title, load status and the institution reveal button.

use super::AppController;
use collab_vis::state::LoadState;
use eframe::egui::{self, Color32, RichText};
use web_time::Instant;

pub fn render_top_bar(ctx: &egui::Context, controller: &mut AppController, status: &str) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                // App title
                ui.label(
                    RichText::new("CollabVis")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                let loaded = matches!(controller.load_state(), LoadState::Loaded { .. });
                let button = egui::Button::new("Show institutions");
                if ui
                    .add_enabled(loaded && !controller.points_visible(), button)
                    .clicked()
                {
                    controller.reveal_points(Instant::now());
                }

                ui.separator();

                let (text, color) = match controller.load_state() {
                    LoadState::Pending => (status.to_string(), Color32::GRAY),
                    LoadState::Loaded {
                        entities,
                        relationships,
                    } => (
                        format!(
                            "{} institutions, {} collaborations",
                            entities, relationships
                        ),
                        Color32::GRAY,
                    ),
                    LoadState::Failed(error) => (
                        format!("Load failed: {}", error),
                        Color32::from_rgb(230, 90, 90),
                    ),
                };
                ui.label(RichText::new(text).size(13.0).color(color));

                if controller.brushing() {
                    ui.separator();
                    ui.label(
                        RichText::new("Brushing")
                            .size(13.0)
                            .color(Color32::from_rgb(247, 38, 113)),
                    );
                }
            });
        });
}
