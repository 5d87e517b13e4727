/// Map layer: observations, their headers, sequences and loading.
///
/// Architecture:
/// ```text
///  .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<GenericMap>
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ GenericMap   │  MapData (plain | masked) + Arc<MetaDict>
///   └─────────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ MapSequence  │  shape / mask checks → StackedArray (rows, cols, N)
///   └─────────────┘
/// ```

pub mod loader;
pub mod meta;
pub mod observation;
pub mod sequence;

pub use meta::{MetaDict, MetaValue};
pub use observation::{GenericMap, MapData, MapSource, SuperpixelMethod};
pub use sequence::{MapSequence, SequenceOptions, SortBy, StackedArray};

/// Errors raised by map construction and sequence operations.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("not all maps have the same shape: map {index} is {found:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("cannot stack an empty map sequence")]
    EmptySequence,

    #[error("{0} is not implemented")]
    Unsupported(&'static str),

    #[error("mask shape {mask:?} does not match data shape {data:?}")]
    MaskShape {
        data: (usize, usize),
        mask: (usize, usize),
    },

    #[error("superpixel dimensions {dims:?} do not evenly divide map shape {shape:?}")]
    InvalidSuperpixel {
        dims: (usize, usize),
        shape: (usize, usize),
    },
}
