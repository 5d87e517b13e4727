use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::Colormap;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – frame navigation and display settings
// ---------------------------------------------------------------------------

/// Render the left navigation panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Sequence");
    ui.separator();

    let Some(sequence) = &state.sequence else {
        ui.label("No maps loaded.");
        return;
    };
    ui.label(sequence.to_string());
    let masked = sequence.at_least_one_map_has_mask();
    let same_shape = sequence.all_maps_same_shape();
    let n = sequence.len();

    ui.label(format!(
        "Shapes: {}",
        if same_shape { "uniform" } else { "mixed" }
    ));
    if masked {
        ui.label("Contains masked maps");
    }
    ui.separator();

    if n > 1 {
        let mut current = state.current;
        ui.add(egui::Slider::new(&mut current, 0..=n - 1).text("frame"));
        state.current = current;
        ui.horizontal(|ui: &mut Ui| {
            if ui.button("◀").clicked() {
                state.step(-1);
            }
            if ui.button("▶").clicked() {
                state.step(1);
            }
        });
        ui.separator();
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Display");
            egui::ComboBox::from_id_salt("colormap")
                .selected_text(state.colormap.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for cmap in Colormap::ALL {
                        ui.selectable_value(&mut state.colormap, cmap, cmap.label());
                    }
                });
            ui.checkbox(&mut state.log_scale, "Log scale");
            ui.separator();

            let Some(map) = state.current_map() else {
                return;
            };
            ui.strong(map.type_name());
            let (rows, cols) = map.shape();
            egui::Grid::new("map_summary").striped(true).show(ui, |ui: &mut Ui| {
                let mut row = |key: &str, value: String| {
                    ui.label(key);
                    ui.label(value);
                    ui.end_row();
                };
                row("Date", map.date().map(|d| d.to_string()).unwrap_or_default());
                row("Observatory", map.observatory().unwrap_or_default().to_string());
                row("Instrument", map.instrument().unwrap_or_default().to_string());
                row(
                    "Wavelength",
                    map.wavelength().map(|w| w.to_string()).unwrap_or_default(),
                );
                row("Shape", format!("{rows} × {cols}"));
                row("Mask", if map.has_mask() { "yes" } else { "no" }.to_string());
            });
        });
}

// ---------------------------------------------------------------------------
// Right side panel – header of the current map
// ---------------------------------------------------------------------------

pub fn header_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Header");
    ui.separator();

    let Some(sequence) = &state.sequence else {
        return;
    };
    let headers = sequence.all_meta();
    let Some(meta) = headers.get(state.current) else {
        return;
    };

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Key");
            });
            header.col(|ui| {
                ui.strong("Value");
            });
        })
        .body(|mut body| {
            for (key, value) in meta.iter() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.monospace(key);
                    });
                    row.col(|ui| {
                        ui.label(value.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(sequence) = &state.sequence {
            ui.label(format!("frame {} of {}", state.current + 1, sequence.len()));
        }

        ui.separator();

        if ui
            .selectable_label(state.sort_by_date, "Sort by date")
            .clicked()
        {
            state.sort_by_date = !state.sort_by_date;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open solar maps")
        .add_filter("Supported files", &["parquet", "pq", "json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_files();

    if let Some(paths) = files {
        state.open_paths(&paths);
    }
}
