use eframe::egui;

use crate::state::AppState;
use crate::ui::{image, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RustySunApp {
    pub state: AppState,
}

impl eframe::App for RustySunApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Keyboard navigation ----
        let (back, forward) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        if back {
            self.state.step(-1);
        }
        if forward {
            self.state.step(1);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation ----
        egui::SidePanel::left("sequence_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: header cards ----
        egui::SidePanel::right("header_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::header_panel(ui, &self.state);
            });

        // ---- Bottom panel: light curve ----
        if self.state.sequence.is_some() {
            egui::TopBottomPanel::bottom("light_curve")
                .default_height(200.0)
                .resizable(true)
                .show(ctx, |ui| {
                    plot::light_curve(ui, &self.state);
                });
        }

        // ---- Central panel: frame image ----
        egui::CentralPanel::default().show(ctx, |ui| {
            image::frame_view(ui, &mut self.state);
        });
    }
}
