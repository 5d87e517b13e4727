use std::fmt;
use std::ops::{Index, Range};
use std::sync::Arc;

use ndarray::{Array2, Array3, Axis};

use super::meta::MetaDict;
use super::observation::GenericMap;
use super::MapError;

// ---------------------------------------------------------------------------
// Construction options
// ---------------------------------------------------------------------------

/// Ordering applied once, when the sequence is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Observation date; undated maps keep their order after the dated ones.
    Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceOptions {
    pub sort_by: Option<SortBy>,
    /// Reserved for differential-rotation alignment. Always rejected.
    pub derotate: bool,
}

// ---------------------------------------------------------------------------
// StackedArray – result of MapSequence::as_array
// ---------------------------------------------------------------------------

/// A `(rows, cols, N)` stack of map images.
#[derive(Debug, Clone, PartialEq)]
pub enum StackedArray {
    Plain(Array3<f64>),
    Masked { data: Array3<f64>, mask: Array3<bool> },
}

impl StackedArray {
    pub fn data(&self) -> &Array3<f64> {
        match self {
            StackedArray::Plain(data) | StackedArray::Masked { data, .. } => data,
        }
    }

    pub fn mask(&self) -> Option<&Array3<bool>> {
        match self {
            StackedArray::Plain(_) => None,
            StackedArray::Masked { mask, .. } => Some(mask),
        }
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, StackedArray::Masked { .. })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.data().dim()
    }
}

// ---------------------------------------------------------------------------
// MapSequence
// ---------------------------------------------------------------------------

/// An ordered collection of maps.
///
/// Maps may differ in shape; only [`MapSequence::as_array`] requires them
/// to agree. Membership is fixed at construction.
#[derive(Clone, Default)]
pub struct MapSequence {
    maps: Vec<Arc<GenericMap>>,
}

impl MapSequence {
    /// Build a sequence in the given order.
    pub fn new<I, M>(maps: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Arc<GenericMap>>,
    {
        Self {
            maps: maps.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a sequence, optionally sorting it.
    ///
    /// Fails with [`MapError::Unsupported`] whenever `derotate` is set.
    pub fn with_options<I, M>(maps: I, options: SequenceOptions) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = M>,
        M: Into<Arc<GenericMap>>,
    {
        if options.derotate {
            return Err(MapError::Unsupported("derotation of a map sequence"));
        }
        let mut sequence = Self::new(maps);
        if let Some(SortBy::Date) = options.sort_by {
            sequence.maps.sort_by_cached_key(|m| {
                let date = m.date();
                (date.is_none(), date)
            });
        }
        Ok(sequence)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<GenericMap>> {
        self.maps.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<GenericMap>> {
        self.maps.iter()
    }

    pub fn maps(&self) -> &[Arc<GenericMap>] {
        &self.maps
    }

    /// A new sequence sharing the maps in `range`.
    ///
    /// # Panics
    /// If `range` is out of bounds, like slice indexing.
    pub fn slice(&self, range: Range<usize>) -> MapSequence {
        Self {
            maps: self.maps[range].to_vec(),
        }
    }

    /// True when every map has the same `(rows, cols)`.
    pub fn all_maps_same_shape(&self) -> bool {
        self.first_shape_mismatch().is_none()
    }

    /// True when any map carries a mask, whatever its contents.
    pub fn at_least_one_map_has_mask(&self) -> bool {
        self.maps.iter().any(|m| m.has_mask())
    }

    /// Stack the images along a new trailing axis: `(rows, cols, N)`.
    ///
    /// When any map has a mask the result is [`StackedArray::Masked`];
    /// maps without one contribute an all-`false` slice.
    pub fn as_array(&self) -> Result<StackedArray, MapError> {
        if let Some((index, expected, found)) = self.first_shape_mismatch() {
            return Err(MapError::ShapeMismatch {
                index,
                expected,
                found,
            });
        }
        let Some(first) = self.maps.first() else {
            return Err(MapError::EmptySequence);
        };
        let (rows, cols) = first.shape();
        let n = self.maps.len();

        let mut data = Array3::zeros((rows, cols, n));
        for (i, map) in self.maps.iter().enumerate() {
            data.index_axis_mut(Axis(2), i).assign(map.data());
        }

        if !self.at_least_one_map_has_mask() {
            return Ok(StackedArray::Plain(data));
        }

        let mut mask = Array3::from_elem((rows, cols, n), false);
        for (i, map) in self.maps.iter().enumerate() {
            if let Some(m) = map.mask() {
                mask.index_axis_mut(Axis(2), i).assign(m);
            }
        }
        log::debug!(
            "stacked {n} maps of {rows}x{cols} with {} masked",
            self.maps.iter().filter(|m| m.has_mask()).count()
        );
        Ok(StackedArray::Masked { data, mask })
    }

    /// Every map's header, in order. These are the maps' own `Arc`s.
    pub fn all_meta(&self) -> Vec<Arc<MetaDict>> {
        self.maps.iter().map(|m| Arc::clone(m.meta())).collect()
    }

    /// Distinct map type names in the order first encountered.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for map in &self.maps {
            let name = map.type_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn first_shape_mismatch(&self) -> Option<(usize, (usize, usize), (usize, usize))> {
        let expected = self.maps.first()?.shape();
        self.maps
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, m)| m.shape() != expected)
            .map(|(i, m)| (i, expected, m.shape()))
    }
}

impl Index<usize> for MapSequence {
    type Output = GenericMap;

    fn index(&self, index: usize) -> &GenericMap {
        &self.maps[index]
    }
}

impl<'a> IntoIterator for &'a MapSequence {
    type Item = &'a Arc<GenericMap>;
    type IntoIter = std::slice::Iter<'a, Arc<GenericMap>>;

    fn into_iter(self) -> Self::IntoIter {
        self.maps.iter()
    }
}

impl From<Vec<GenericMap>> for MapSequence {
    fn from(maps: Vec<GenericMap>) -> Self {
        Self::new(maps)
    }
}

impl fmt::Display for MapSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapSequence of {} elements", self.maps.len())?;
        if !self.maps.is_empty() {
            write!(f, ", with maps from {}", self.type_names().join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Debug for MapSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Mean of the valid pixels of each frame, in sequence order.
///
/// Frames with no valid pixel yield `NaN`.
pub fn frame_means(stack: &StackedArray) -> Vec<f64> {
    let data = stack.data();
    (0..data.len_of(Axis(2)))
        .map(|i| {
            let frame = data.index_axis(Axis(2), i);
            let (sum, count) = match stack.mask() {
                None => (frame.sum(), frame.len()),
                Some(mask) => {
                    let invalid = mask.index_axis(Axis(2), i);
                    frame
                        .iter()
                        .zip(invalid.iter())
                        .filter(|(_, &bad)| !bad)
                        .fold((0.0, 0usize), |(s, c), (&v, _)| (s + v, c + 1))
                }
            };
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect()
}

/// One frame of a stack as a 2-D array, with masked pixels set to `NaN`.
pub fn frame(stack: &StackedArray, index: usize) -> Array2<f64> {
    let mut out = stack.data().index_axis(Axis(2), index).to_owned();
    if let Some(mask) = stack.mask() {
        out.zip_mut_with(&mask.index_axis(Axis(2), index), |v, &bad| {
            if bad {
                *v = f64::NAN;
            }
        });
    }
    out
}
