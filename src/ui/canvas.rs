//! Central canvas UI: base map, layers and pointer interaction.

use super::{BaseMapCanvas, LayerCanvas};
use collab_vis::data::LngLat;
use collab_vis::geo::{
    pick, render_layers, MapProjection, Picked, ARC_LAYER_ID, POINT_LAYER_ID,
};
use collab_vis::state::{PointerInfo, ViewState};
use collab_vis::ViewController;
use eframe::egui::{self, Color32, PointerButton, Rect, RichText, Sense, Vec2};
use web_time::Instant;

pub type AppController = ViewController<LayerCanvas, BaseMapCanvas>;

/// Zoom levels per scroll pixel
const SCROLL_ZOOM_RATE: f64 = 0.002;
/// Degrees of bearing/pitch per dragged pixel
const ROTATE_RATE: f64 = 0.3;

pub fn render_canvas(ctx: &egui::Context, controller: &mut AppController, now: Instant) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let available_size = ui.available_size();
            let (response, painter) =
                ui.allocate_painter(available_size, Sense::click_and_drag());
            let rect = response.rect;

            // Camera first so hover and drawing use this frame's view
            handle_canvas_interaction(&response, rect, controller);

            // The base map has been jumped to the controller's camera
            let projection = MapProjection::new(*controller.base_map().view(), rect);
            let picked = handle_hover(&response, &projection, controller, now);

            controller.base_map().paint(&painter, rect);
            render_layers(
                &painter,
                controller.surface().layers(),
                &projection,
                controller.pointer(),
                now,
            );

            draw_overlay_info(ui, rect, controller, picked);
        });
}

fn handle_canvas_interaction(
    response: &egui::Response,
    rect: Rect,
    controller: &mut AppController,
) {
    let view = *controller.view_state();
    let projection = MapProjection::new(view, rect);

    // Handle dragging for panning
    if response.dragged_by(PointerButton::Primary) {
        let delta = response.drag_delta();
        if delta != Vec2::ZERO {
            let center = projection.screen_to_geo(rect.center() - delta);
            controller.on_camera_change(view.with_center(center));
        }
    }

    // Secondary drag rotates and tilts
    if response.dragged_by(PointerButton::Secondary) {
        let delta = response.drag_delta();
        if delta != Vec2::ZERO {
            controller.on_camera_change(view.rotated(
                delta.x as f64 * ROTATE_RATE,
                -delta.y as f64 * ROTATE_RATE,
            ));
        }
    }

    // Handle scroll for zooming relative to cursor position
    if response.hovered() {
        let scroll_delta = response.ctx.input(|i| i.raw_scroll_delta);
        if scroll_delta.y != 0.0 {
            let view = *controller.view_state();
            let zoomed = view
                .with_zoom(view.zoom + scroll_delta.y as f64 * SCROLL_ZOOM_RATE)
                .clamped();

            // Keep the point under the cursor stationary
            let zoomed = match response.hover_pos() {
                Some(cursor) => {
                    let before = MapProjection::new(view, rect).screen_to_geo(cursor);
                    let after = MapProjection::new(zoomed, rect).screen_to_geo(cursor);
                    zoomed.with_center(geo_types::Coord {
                        x: zoomed.longitude + before.x - after.x,
                        y: zoomed.latitude + before.y - after.y,
                    })
                }
                None => zoomed,
            };
            controller.on_camera_change(zoomed);
        }
    }

    // Reset view on double-click
    if response.double_clicked() {
        controller.on_camera_change(ViewState::default());
    }
}

fn handle_hover(
    response: &egui::Response,
    projection: &MapProjection,
    controller: &mut AppController,
    now: Instant,
) -> Option<Picked> {
    let Some(pos) = response.hover_pos() else {
        controller.on_hover(PointerInfo::outside());
        return None;
    };

    let position = LngLat::try_from(projection.screen_to_geo(pos)).ok();
    let picked = pick(controller.surface().layers(), projection, pos, now);
    controller.on_hover(PointerInfo {
        position,
        target: picked.into(),
    });
    picked
}

fn draw_overlay_info(
    ui: &mut egui::Ui,
    rect: Rect,
    controller: &AppController,
    picked: Option<Picked>,
) {
    let overlay_pos = rect.left_top() + Vec2::new(10.0, 10.0);
    let overlay_rect = Rect::from_min_size(overlay_pos, Vec2::new(260.0, 90.0));
    let view = controller.view_state();
    let text_color = Color32::from_rgb(200, 200, 220);

    ui.scope_builder(egui::UiBuilder::new().max_rect(overlay_rect), |ui| {
        ui.vertical(|ui| {
            ui.label(
                RichText::new(format!("{:.2}, {:.2}", view.longitude, view.latitude))
                    .monospace()
                    .size(12.0)
                    .color(text_color),
            );
            ui.label(
                RichText::new(format!(
                    "Zoom {:.1}  Bearing {:.0}  Pitch {:.0}",
                    view.zoom, view.bearing, view.pitch
                ))
                .monospace()
                .size(12.0)
                .color(text_color),
            );
            if let Some(text) = picked.and_then(|p| describe_picked(controller, p)) {
                ui.label(RichText::new(text).size(12.0).color(Color32::WHITE));
            }
        });
    });
}

fn describe_picked(controller: &AppController, picked: Picked) -> Option<String> {
    let registry = controller.registry();
    match picked {
        Picked::Entity(index) => {
            let entity = registry
                .get(POINT_LAYER_ID)?
                .as_point()?
                .entities
                .get(index)?;
            let name = if entity.name.is_empty() {
                &entity.id
            } else {
                &entity.name
            };
            Some(format!("{} ({})", name, entity.position))
        }
        Picked::Relationship(index) => {
            let rel = registry
                .get(ARC_LAYER_ID)?
                .as_arc()?
                .relationships
                .get(index)?;
            Some(match rel.count {
                Some(count) => format!(
                    "{} → {}: {} collaborations",
                    rel.source, rel.target, count
                ),
                None => format!("{} → {}", rel.source, rel.target),
            })
        }
    }
}
