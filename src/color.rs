use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Intensity colour maps: normalised pixel value → Color32
// ---------------------------------------------------------------------------

/// Colour maps for image intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    Gray,
    /// Gold ramp in the style of the 171 Å coronal images.
    #[default]
    Solar,
    /// Black → red → yellow → white.
    Heat,
}

impl Colormap {
    pub const ALL: [Colormap; 3] = [Colormap::Gray, Colormap::Solar, Colormap::Heat];

    pub fn label(self) -> &'static str {
        match self {
            Colormap::Gray => "Gray",
            Colormap::Solar => "Solar",
            Colormap::Heat => "Heat",
        }
    }

    /// Colour of a value already scaled to `[0, 1]`; out-of-range values clamp.
    pub fn color_for(self, t: f64) -> Color32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) as f32 } else { 0.0 };
        match self {
            Colormap::Gray => Color32::from_gray((t * 255.0) as u8),
            Colormap::Solar => hsl_to_color32(Hsl::new(30.0 + 25.0 * t, 0.85, 0.95 * t)),
            Colormap::Heat => hsl_to_color32(Hsl::new(60.0 * t, 1.0, t)),
        }
    }
}

/// Colour drawn for masked (invalid) pixels.
pub const MASKED_COLOR: Color32 = Color32::from_rgb(40, 80, 160);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_length() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(3);
        assert_eq!(colors.len(), 3);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn colormaps_run_dark_to_bright() {
        for cmap in Colormap::ALL {
            let dark = cmap.color_for(0.0);
            let bright = cmap.color_for(1.0);
            assert_eq!(dark, Color32::BLACK, "{}", cmap.label());
            let sum = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
            assert!(sum(bright) > sum(dark), "{}", cmap.label());
        }
        assert_eq!(Colormap::Gray.color_for(f64::NAN), Color32::BLACK);
        assert_eq!(Colormap::Gray.color_for(7.0), Color32::WHITE);
    }
}
