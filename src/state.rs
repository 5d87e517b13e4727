use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::TextureHandle;
use ndarray::Array2;

use rusty_sun::map::loader::load_sequence;
use rusty_sun::map::sequence::{frame, frame_means};
use rusty_sun::map::{GenericMap, MapError, MapSequence, SequenceOptions, SortBy, StackedArray};

use crate::color::Colormap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Settings a cached frame texture was rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameKey {
    pub index: usize,
    pub colormap: Colormap,
    pub log_scale: bool,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded sequence (None until the user opens files).
    pub sequence: Option<MapSequence>,

    /// Stacked cube, when all maps share one shape.
    pub stack: Option<StackedArray>,

    /// Mean of the valid pixels per frame (empty without a stack).
    pub means: Vec<f64>,

    /// Frame shown in the image view.
    pub current: usize,

    pub colormap: Colormap,
    pub log_scale: bool,

    /// Sort opened maps by observation date.
    pub sort_by_date: bool,

    /// Rendered texture of the current frame.
    pub texture: Option<(FrameKey, TextureHandle)>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sequence: None,
            stack: None,
            means: Vec::new(),
            current: 0,
            colormap: Colormap::default(),
            log_scale: true,
            sort_by_date: true,
            texture: None,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Load map files into a new sequence, reporting failures in the status line.
    pub fn open_paths(&mut self, paths: &[PathBuf]) {
        self.loading = true;
        let options = SequenceOptions {
            sort_by: self.sort_by_date.then_some(SortBy::Date),
            derotate: false,
        };
        match load_sequence(paths, options) {
            Ok(sequence) => {
                log::info!("Loaded {sequence}");
                self.set_sequence(sequence);
            }
            Err(e) => {
                log::error!("Failed to load maps: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.loading = false;
            }
        }
    }

    /// Ingest a sequence and stack it when the shapes allow.
    pub fn set_sequence(&mut self, sequence: MapSequence) {
        self.status_message = None;
        self.stack = match sequence.as_array() {
            Ok(stack) => Some(stack),
            Err(e @ MapError::ShapeMismatch { .. }) => {
                log::warn!("Showing maps one by one: {e}");
                self.status_message = Some(format!("Not stacked: {e}"));
                None
            }
            Err(e) => {
                log::warn!("Cannot stack sequence: {e}");
                None
            }
        };
        self.means = self.stack.as_ref().map(frame_means).unwrap_or_default();
        self.current = 0;
        self.texture = None;
        self.sequence = Some(sequence);
        self.loading = false;
    }

    pub fn len(&self) -> usize {
        self.sequence.as_ref().map_or(0, MapSequence::len)
    }

    pub fn current_map(&self) -> Option<&Arc<GenericMap>> {
        self.sequence.as_ref()?.get(self.current)
    }

    /// Move the current frame by `delta`, clamped to the sequence.
    pub fn step(&mut self, delta: isize) {
        let last = self.len().saturating_sub(1);
        self.current = self.current.saturating_add_signed(delta).min(last);
    }

    /// Pixels of the current frame with masked pixels as `NaN`.
    pub fn current_frame(&self) -> Option<Array2<f64>> {
        if let Some(stack) = &self.stack {
            return (self.current < stack.shape().2).then(|| frame(stack, self.current));
        }
        let map = self.current_map()?;
        let mut pixels = map.data().clone();
        if let Some(mask) = map.mask() {
            pixels.zip_mut_with(mask, |v, &bad| {
                if bad {
                    *v = f64::NAN;
                }
            });
        }
        Some(pixels)
    }

    pub fn frame_key(&self) -> FrameKey {
        FrameKey {
            index: self.current,
            colormap: self.colormap,
            log_scale: self.log_scale,
        }
    }
}
