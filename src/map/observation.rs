use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use ndarray::{s, Array2};

use super::meta::MetaDict;
use super::MapError;
use crate::time::parse_time;

// ---------------------------------------------------------------------------
// MapData – the image, with or without a validity mask
// ---------------------------------------------------------------------------

/// Image payload of a map. A `Masked` image always carries a mask of the
/// same shape, `true` marking an invalid pixel. An all-`false` mask still
/// counts as a mask: presence is what distinguishes the variants.
#[derive(Debug, Clone, PartialEq)]
pub enum MapData {
    Plain(Array2<f64>),
    Masked { data: Array2<f64>, mask: Array2<bool> },
}

impl MapData {
    /// Pair `data` with `mask`, checking that the shapes agree.
    pub fn masked(data: Array2<f64>, mask: Array2<bool>) -> Result<Self, MapError> {
        if data.dim() != mask.dim() {
            return Err(MapError::MaskShape {
                data: data.dim(),
                mask: mask.dim(),
            });
        }
        Ok(MapData::Masked { data, mask })
    }

    pub fn data(&self) -> &Array2<f64> {
        match self {
            MapData::Plain(data) | MapData::Masked { data, .. } => data,
        }
    }

    pub fn mask(&self) -> Option<&Array2<bool>> {
        match self {
            MapData::Plain(_) => None,
            MapData::Masked { mask, .. } => Some(mask),
        }
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, MapData::Masked { .. })
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data().dim()
    }
}

// ---------------------------------------------------------------------------
// MapSource – the concrete map type
// ---------------------------------------------------------------------------

/// Instrument-specific map type, detected from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSource {
    Aia,
    Hmi,
    Eit,
    Euvi,
    Lasco,
    Sot,
    Xrt,
    Generic,
}

impl MapSource {
    /// Pick the map type the way the instrument headers identify themselves.
    pub fn detect(meta: &MetaDict) -> Self {
        let instrume = meta.get_str("instrume").unwrap_or("");
        let detector = meta.get_str("detector").unwrap_or("");

        if instrume.starts_with("AIA") {
            MapSource::Aia
        } else if instrume.starts_with("HMI") {
            MapSource::Hmi
        } else if instrume == "EIT" {
            MapSource::Eit
        } else if detector == "EUVI" {
            MapSource::Euvi
        } else if instrume == "LASCO" {
            MapSource::Lasco
        } else if instrume == "SOT" {
            MapSource::Sot
        } else if instrume == "XRT" {
            MapSource::Xrt
        } else {
            MapSource::Generic
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            MapSource::Aia => "AIAMap",
            MapSource::Hmi => "HMIMap",
            MapSource::Eit => "EITMap",
            MapSource::Euvi => "EUVIMap",
            MapSource::Lasco => "LASCOMap",
            MapSource::Sot => "SOTMap",
            MapSource::Xrt => "XRTMap",
            MapSource::Generic => "GenericMap",
        }
    }
}

impl fmt::Display for MapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// ---------------------------------------------------------------------------
// GenericMap – one observation
// ---------------------------------------------------------------------------

/// How [`GenericMap::superpixel`] combines the pixels of a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuperpixelMethod {
    #[default]
    Sum,
    Mean,
}

/// A single 2-D observation with its header.
///
/// There is no mutating API: the shape is fixed once built, and the header
/// is shared so sequences can hand the same `Arc` back to callers.
#[derive(Debug, Clone)]
pub struct GenericMap {
    data: MapData,
    meta: Arc<MetaDict>,
    source: MapSource,
}

impl GenericMap {
    pub fn new(data: Array2<f64>, meta: MetaDict) -> Self {
        Self::from_parts(MapData::Plain(data), meta)
    }

    pub fn with_mask(
        data: Array2<f64>,
        mask: Array2<bool>,
        meta: MetaDict,
    ) -> Result<Self, MapError> {
        Ok(Self::from_parts(MapData::masked(data, mask)?, meta))
    }

    pub fn from_parts(data: MapData, meta: impl Into<Arc<MetaDict>>) -> Self {
        let meta = meta.into();
        let source = MapSource::detect(&meta);
        Self { data, meta, source }
    }

    pub fn data(&self) -> &Array2<f64> {
        self.data.data()
    }

    pub fn map_data(&self) -> &MapData {
        &self.data
    }

    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.data.mask()
    }

    pub fn has_mask(&self) -> bool {
        self.data.is_masked()
    }

    pub fn meta(&self) -> &Arc<MetaDict> {
        &self.meta
    }

    pub fn source(&self) -> MapSource {
        self.source
    }

    pub fn type_name(&self) -> &'static str {
        self.source.type_name()
    }

    /// `(rows, cols)` of the image.
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Observation time from `date-obs` (or the SOHO-style `date_obs`).
    pub fn date(&self) -> Option<NaiveDateTime> {
        self.meta
            .get_str("date-obs")
            .or_else(|| self.meta.get_str("date_obs"))
            .and_then(|s| parse_time(s).ok())
    }

    pub fn instrument(&self) -> Option<&str> {
        self.meta.get_str("instrume")
    }

    pub fn observatory(&self) -> Option<&str> {
        self.meta.get_str("telescop")
    }

    /// Wavelength in the header's own unit (`waveunit`), usually Ångström.
    pub fn wavelength(&self) -> Option<f64> {
        self.meta.get_f64("wavelnth")
    }

    /// Bin the image into `dims = (rows, cols)` superpixels.
    ///
    /// Both factors must divide the shape exactly. A binned pixel is masked
    /// when any of its source pixels was masked. The pixel-scale cards
    /// (`naxis*`, `cdelt*`, `crpix*`) of the returned map are rescaled.
    pub fn superpixel(
        &self,
        dims: (usize, usize),
        method: SuperpixelMethod,
    ) -> Result<GenericMap, MapError> {
        let (rows, cols) = self.shape();
        let (dr, dc) = dims;
        if dr == 0 || dc == 0 || rows % dr != 0 || cols % dc != 0 {
            return Err(MapError::InvalidSuperpixel {
                dims,
                shape: (rows, cols),
            });
        }
        let (new_rows, new_cols) = (rows / dr, cols / dc);
        let area = (dr * dc) as f64;

        let source = self.data();
        let binned = Array2::from_shape_fn((new_rows, new_cols), |(r, c)| {
            let total = source
                .slice(s![r * dr..(r + 1) * dr, c * dc..(c + 1) * dc])
                .sum();
            match method {
                SuperpixelMethod::Sum => total,
                SuperpixelMethod::Mean => total / area,
            }
        });

        let data = match self.mask() {
            None => MapData::Plain(binned),
            Some(mask) => {
                let binned_mask = Array2::from_shape_fn((new_rows, new_cols), |(r, c)| {
                    mask.slice(s![r * dr..(r + 1) * dr, c * dc..(c + 1) * dc])
                        .iter()
                        .any(|&invalid| invalid)
                });
                MapData::Masked {
                    data: binned,
                    mask: binned_mask,
                }
            }
        };

        let mut meta = (*self.meta).clone();
        meta.insert("naxis1", new_cols as i64);
        meta.insert("naxis2", new_rows as i64);
        for (axis, factor) in [("1", dc), ("2", dr)] {
            let cdelt = format!("cdelt{axis}");
            if let Some(v) = meta.get_f64(&cdelt) {
                meta.insert(&cdelt, v * factor as f64);
            }
            let crpix = format!("crpix{axis}");
            if let Some(v) = meta.get_f64(&crpix) {
                meta.insert(&crpix, (v - 0.5) / factor as f64 + 0.5);
            }
        }

        log::debug!(
            "superpixel {:?} on {}: {:?} -> {:?}",
            dims,
            self.type_name(),
            (rows, cols),
            (new_rows, new_cols)
        );
        Ok(GenericMap::from_parts(data, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(pairs: &[(&str, &str)]) -> MetaDict {
        pairs.iter().copied().collect()
    }

    #[test]
    fn detects_map_type_from_header() {
        let cases = [
            (header(&[("instrume", "AIA_3")]), "AIAMap"),
            (header(&[("instrume", "HMI_FRONT2")]), "HMIMap"),
            (header(&[("INSTRUME", "EIT")]), "EITMap"),
            (header(&[("detector", "EUVI")]), "EUVIMap"),
            (header(&[("instrume", "LASCO")]), "LASCOMap"),
            (header(&[("instrume", "SOT")]), "SOTMap"),
            (header(&[("instrume", "XRT")]), "XRTMap"),
            (header(&[("instrume", "SWAP")]), "GenericMap"),
            (MetaDict::new(), "GenericMap"),
        ];
        for (meta, expected) in cases {
            assert_eq!(MapSource::detect(&meta).type_name(), expected);
        }
    }

    #[test]
    fn mask_must_match_data_shape() {
        let err = GenericMap::with_mask(
            Array2::zeros((4, 4)),
            Array2::from_elem((4, 3), false),
            MetaDict::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::MaskShape {
                data: (4, 4),
                mask: (4, 3)
            }
        ));
    }

    #[test]
    fn all_false_mask_still_counts_as_masked() {
        let map = GenericMap::with_mask(
            Array2::zeros((2, 2)),
            Array2::from_elem((2, 2), false),
            MetaDict::new(),
        )
        .unwrap();
        assert!(map.has_mask());
        assert!(!GenericMap::new(Array2::zeros((2, 2)), MetaDict::new()).has_mask());
    }

    #[test]
    fn date_is_read_from_either_card() {
        let aia = GenericMap::new(
            Array2::zeros((1, 1)),
            header(&[("date-obs", "2011-06-07T06:33:02.770")]),
        );
        let eit = GenericMap::new(
            Array2::zeros((1, 1)),
            header(&[("date_obs", "2004-03-01T02:00:10.642")]),
        );
        assert_eq!(aia.date().unwrap().to_string(), "2011-06-07 06:33:02.770");
        assert_eq!(eit.date().unwrap().to_string(), "2004-03-01 02:00:10.642");
    }

    #[test]
    fn superpixel_sums_blocks_and_rescales_header() {
        let data = Array2::from_shape_fn((4, 6), |(r, c)| (r * 6 + c) as f64);
        let mut meta = MetaDict::new();
        meta.insert("cdelt1", 0.6);
        meta.insert("cdelt2", 0.6);
        meta.insert("crpix1", 3.5);
        meta.insert("crpix2", 2.5);
        let map = GenericMap::new(data, meta);

        let binned = map.superpixel((2, 3), SuperpixelMethod::Sum).unwrap();
        assert_eq!(binned.shape(), (2, 2));
        // rows 0..2, cols 0..3: 0+1+2+6+7+8
        assert_eq!(binned.data()[[0, 0]], 24.0);
        assert_eq!(binned.meta().get_f64("naxis1"), Some(2.0));
        assert_eq!(binned.meta().get_f64("naxis2"), Some(2.0));
        assert!((binned.meta().get_f64("cdelt1").unwrap() - 1.8).abs() < 1e-12);
        assert!((binned.meta().get_f64("cdelt2").unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(binned.meta().get_f64("crpix1"), Some(1.5));
        assert_eq!(binned.meta().get_f64("crpix2"), Some(1.5));

        let mean = map.superpixel((2, 3), SuperpixelMethod::Mean).unwrap();
        assert_eq!(mean.data()[[0, 0]], 4.0);
    }

    #[test]
    fn superpixel_propagates_any_masked_pixel() {
        let mut mask = Array2::from_elem((4, 4), false);
        mask[[3, 0]] = true;
        let map = GenericMap::with_mask(Array2::ones((4, 4)), mask, MetaDict::new()).unwrap();
        let binned = map.superpixel((2, 2), SuperpixelMethod::Sum).unwrap();
        let binned_mask = binned.mask().unwrap();
        assert!(binned_mask[[1, 0]]);
        assert_eq!(binned_mask.iter().filter(|&&m| m).count(), 1);
    }

    #[test]
    fn superpixel_rejects_uneven_factors() {
        let map = GenericMap::new(Array2::zeros((5, 4)), MetaDict::new());
        assert!(matches!(
            map.superpixel((2, 2), SuperpixelMethod::Sum),
            Err(MapError::InvalidSuperpixel { .. })
        ));
        assert!(map.superpixel((0, 2), SuperpixelMethod::Sum).is_err());
    }
}
