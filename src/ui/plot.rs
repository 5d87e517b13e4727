use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points, VLine};

use crate::color::generate_palette;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Light curve (bottom panel)
// ---------------------------------------------------------------------------

/// Plot the mean of each stacked frame, one colour per map type.
pub fn light_curve(ui: &mut Ui, state: &AppState) {
    let Some(sequence) = &state.sequence else {
        return;
    };
    if state.means.is_empty() {
        ui.label("Light curve needs maps of a single shape.");
        return;
    }

    let types = sequence.type_names();
    let palette = generate_palette(types.len());

    Plot::new("light_curve")
        .legend(Legend::default())
        .x_axis_label("Frame")
        .y_axis_label("Mean intensity")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let all: PlotPoints = state
                .means
                .iter()
                .enumerate()
                .filter(|(_, m)| m.is_finite())
                .map(|(i, &m)| [i as f64, m])
                .collect();
            plot_ui.line(Line::new(all).color(Color32::GRAY).width(1.0));

            for (name, color) in types.iter().zip(palette) {
                let points: PlotPoints = sequence
                    .iter()
                    .zip(&state.means)
                    .enumerate()
                    .filter(|(_, (map, m))| map.type_name() == *name && m.is_finite())
                    .map(|(i, (_, &m))| [i as f64, m])
                    .collect();
                plot_ui.points(Points::new(points).name(name).color(color).radius(3.0));
            }

            plot_ui.vline(VLine::new(state.current as f64).color(Color32::LIGHT_BLUE));
        });
}
