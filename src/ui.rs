use egui::Context;
use crate::controller::HudReadout;

/// Build the complete UI for the browser build and return egui output
pub fn build_ui(
    egui_ctx: &Context,
    hud: &HudReadout,
    canvas_width: u32,
    canvas_height: u32,
    now: f64,
) -> egui::FullOutput {
    let mut raw_input = egui::RawInput::default();
    raw_input.time = Some(now / 1000.0);
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::new(0.0, 0.0),
        egui::vec2(canvas_width as f32, canvas_height as f32),
    ));

    egui_ctx.run(raw_input, |ctx| draw_hud(ctx, hud))
}

/// Timing board (top left) and controls legend (bottom left)
pub fn draw_hud(ctx: &Context, hud: &HudReadout) {
    draw_timing_board(ctx, hud);
    draw_controls(ctx, hud.fps);
}

fn draw_timing_board(ctx: &Context, hud: &HudReadout) {
    egui::Area::new(egui::Id::new("timing_board"))
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .show(ctx, |ui| {
            egui::Frame::NONE
                .fill(egui::Color32::from_black_alpha(160))
                .inner_margin(8.0)
                .corner_radius(4.0)
                .show(ui, |ui| {
                    let big = |text: String| egui::RichText::new(text).size(18.0).color(egui::Color32::WHITE);
                    ui.label(big(format!("Speed: {} m/s", hud.speed)));
                    ui.label(big(format!("Time: {}", hud.lap_time)));
                    ui.label(big(format!("Lap: {}", hud.lap)));
                    if let Some(last) = &hud.last_lap {
                        ui.label(egui::RichText::new(format!("Last: {last}")).small().color(egui::Color32::LIGHT_GRAY));
                    }
                    if let Some(best) = &hud.best_lap {
                        ui.label(egui::RichText::new(format!("Best: {best}")).small().color(egui::Color32::GOLD));
                    }
                    if hud.off_track {
                        ui.label(egui::RichText::new("OFF TRACK").strong().color(egui::Color32::from_rgb(255, 90, 60)));
                    }
                });
        });
}

fn draw_controls(ctx: &Context, fps: Option<u32>) {
    egui::Area::new(egui::Id::new("controls"))
        .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
        .show(ctx, |ui| {
            let small = |text: &str| egui::RichText::new(text.to_string()).small().color(egui::Color32::WHITE);
            let fps = fps.map_or_else(|| "-".to_string(), |f| f.to_string());
            ui.label(small(&format!("FPS: {fps}")));
            ui.label(small("W / Up - Throttle"));
            ui.label(small("S / Down - Brake, reverse"));
            ui.label(small("A D / Left Right - Steer"));
            ui.label(small("R - Reset to start"));
        });
}
