use eframe::egui::{self, Color32, ColorImage, TextureOptions, Ui};
use ndarray::Array2;

use crate::color::{Colormap, MASKED_COLOR};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Frame image (central panel)
// ---------------------------------------------------------------------------

/// Render the current frame, re-uploading the texture only when it changed.
pub fn frame_view(ui: &mut Ui, state: &mut AppState) {
    if state.sequence.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open map files to view a sequence  (File → Open…)");
        });
        return;
    }

    let key = state.frame_key();
    let stale = state.texture.as_ref().map_or(true, |(k, _)| *k != key);
    if stale {
        state.texture = state.current_frame().map(|pixels| {
            let image = to_color_image(&pixels, key.colormap, key.log_scale);
            let handle = ui
                .ctx()
                .load_texture("current_frame", image, TextureOptions::NEAREST);
            (key, handle)
        });
    }

    let Some((_, texture)) = &state.texture else {
        ui.label("Nothing to show for this frame.");
        return;
    };
    let size = texture.size_vec2();
    let scale = (ui.available_width() / size.x)
        .min(ui.available_height() / size.y)
        .max(0.01);
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.add(egui::Image::from_texture(texture).fit_to_exact_size(size * scale));
    });
}

/// Map pixel values to colours. Row 0 is drawn at the bottom.
pub fn to_color_image(pixels: &Array2<f64>, colormap: Colormap, log_scale: bool) -> ColorImage {
    let (rows, cols) = pixels.dim();
    let scaled = pixels.mapv(|v| scale_value(v, log_scale));

    let (lo, hi) = scaled
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut image = ColorImage::new([cols, rows], Color32::TRANSPARENT);
    for ((r, c), &v) in scaled.indexed_iter() {
        let y = rows - 1 - r;
        image.pixels[y * cols + c] = if pixels[[r, c]].is_nan() {
            MASKED_COLOR
        } else {
            colormap.color_for((v - lo) / span)
        };
    }
    image
}

fn scale_value(v: f64, log_scale: bool) -> f64 {
    if !log_scale || v.is_nan() {
        return v;
    }
    v.max(1.0).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn image_is_flipped_and_masks_are_marked() {
        let pixels = array![[0.0, f64::NAN], [10.0, 10.0]];
        let image = to_color_image(&pixels, Colormap::Gray, false);
        assert_eq!(image.size, [2, 2]);
        // Bottom row of the image is pixel row 0.
        assert_eq!(image.pixels[2], Color32::BLACK);
        assert_eq!(image.pixels[3], MASKED_COLOR);
        assert_eq!(image.pixels[0], Color32::WHITE);
    }

    #[test]
    fn flat_frame_does_not_divide_by_zero() {
        let pixels = Array2::from_elem((3, 3), 5.0);
        let image = to_color_image(&pixels, Colormap::Gray, true);
        assert!(image.pixels.iter().all(|&c| c == Color32::BLACK));
    }
}
