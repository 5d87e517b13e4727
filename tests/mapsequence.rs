use std::sync::Arc;

use ndarray::{s, Array2, Array3};

use rusty_sun::map::{
    GenericMap, MapError, MapSequence, MetaDict, SequenceOptions, StackedArray, SuperpixelMethod,
};

const SIDE: usize = 128;

fn header(instrume: &str, date: &str) -> MetaDict {
    let mut meta = MetaDict::new();
    meta.insert("instrume", instrume);
    meta.insert("date-obs", date);
    meta.insert("naxis1", SIDE as i64);
    meta.insert("naxis2", SIDE as i64);
    meta.insert("cdelt1", 2.4);
    meta.insert("cdelt2", 2.4);
    meta
}

fn image(seed: f64) -> Array2<f64> {
    Array2::from_shape_fn((SIDE, SIDE), |(r, c)| seed + (r * SIDE + c) as f64)
}

fn aia(seed: f64) -> GenericMap {
    GenericMap::new(image(seed), header("AIA_3", "2011-06-07T06:33:02"))
}

fn eit(seed: f64) -> GenericMap {
    GenericMap::new(image(seed), header("EIT", "2011-06-07T06:30:00"))
}

fn corner_mask() -> Array2<bool> {
    let mut mask = Array2::from_elem((SIDE, SIDE), false);
    mask.slice_mut(s![0..2, 0..3]).fill(true);
    mask
}

fn masked_aia(seed: f64) -> GenericMap {
    GenericMap::with_mask(image(seed), corner_mask(), header("AIA_3", "2011-06-07T06:33:02"))
        .unwrap()
}

#[test]
fn same_shape_maps_stack_along_the_last_axis() {
    let seq = MapSequence::new(vec![aia(0.0), aia(1.0)]);
    assert!(seq.all_maps_same_shape());

    let stack = seq.as_array().unwrap();
    assert_eq!(stack.shape(), (SIDE, SIDE, 2));
    assert_eq!(stack.data()[[5, 7, 1]], seq[1].data()[[5, 7]]);
    assert_eq!(stack.data()[[5, 7, 0]], seq[0].data()[[5, 7]]);
}

#[test]
fn unmasked_sequence_gives_a_plain_stack() {
    let seq = MapSequence::new(vec![aia(0.0), eit(1.0)]);
    assert!(!seq.at_least_one_map_has_mask());
    let stack = seq.as_array().unwrap();
    assert!(matches!(stack, StackedArray::Plain(_)));
    assert!(stack.mask().is_none());
}

#[test]
fn fully_masked_sequence_stacks_every_mask() {
    let seq = MapSequence::new(vec![masked_aia(0.0), masked_aia(1.0), masked_aia(2.0)]);
    let stack = seq.as_array().unwrap();
    let mask: &Array3<bool> = stack.mask().unwrap();
    assert_eq!(mask.dim(), (SIDE, SIDE, 3));
    for i in 0..3 {
        assert_eq!(mask.slice(s![.., .., i]), corner_mask());
    }
}

#[test]
fn partly_masked_sequence_fills_missing_masks_with_false() {
    let seq = MapSequence::new(vec![masked_aia(0.0), masked_aia(1.0), aia(2.0)]);
    assert!(seq.at_least_one_map_has_mask());

    let mask = seq.as_array().unwrap().mask().unwrap().clone();
    assert_eq!(mask.dim(), (SIDE, SIDE, 3));
    for i in 0..2 {
        let slice = mask.slice(s![.., .., i]);
        assert!(slice.slice(s![0..2, 0..3]).iter().all(|&m| m));
        assert_eq!(slice.iter().filter(|&&m| m).count(), 6);
    }
    assert!(mask.slice(s![.., .., 2]).iter().all(|&m| !m));
}

#[test]
fn an_all_false_mask_still_makes_a_masked_stack() {
    let clear = GenericMap::with_mask(
        image(0.0),
        Array2::from_elem((SIDE, SIDE), false),
        header("AIA_3", "2011-06-07T06:33:02"),
    )
    .unwrap();
    let seq = MapSequence::new(vec![clear, aia(1.0)]);
    assert!(seq.at_least_one_map_has_mask());

    let stack = seq.as_array().unwrap();
    assert!(stack.is_masked());
    let mask = stack.mask().unwrap();
    assert_eq!(mask.dim(), (SIDE, SIDE, 2));
    assert!(mask.iter().all(|&m| !m));
}

#[test]
fn mixed_dates_sort_with_undated_maps_last() {
    let undated = GenericMap::new(image(0.0), MetaDict::new());
    let options = SequenceOptions {
        sort_by: Some(rusty_sun::map::SortBy::Date),
        ..Default::default()
    };
    let seq = MapSequence::with_options(vec![undated, aia(1.0), eit(2.0)], options).unwrap();
    let dates: Vec<bool> = seq.iter().map(|m| m.date().is_some()).collect();
    assert_eq!(dates, [true, true, false]);
    assert_eq!(seq[0].type_name(), "EITMap");
    assert_eq!(seq.as_array().unwrap().data()[[0, 0, 2]], 0.0);
}

#[test]
fn superpixel_breaks_shape_agreement() {
    let small = aia(0.0)
        .superpixel((4, 4), SuperpixelMethod::Sum)
        .unwrap();
    assert_eq!(small.shape(), (SIDE / 4, SIDE / 4));

    let seq = MapSequence::new(vec![aia(0.0), small]);
    assert!(!seq.all_maps_same_shape());
    match seq.as_array() {
        Err(MapError::ShapeMismatch { index, expected, found }) => {
            assert_eq!(index, 1);
            assert_eq!(expected, (SIDE, SIDE));
            assert_eq!(found, (SIDE / 4, SIDE / 4));
        }
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
}

#[test]
fn all_meta_hands_back_the_maps_own_headers() {
    let seq = MapSequence::new(vec![aia(0.0), eit(1.0)]);
    let metas = seq.all_meta();
    assert_eq!(metas.len(), 2);
    for (meta, map) in metas.iter().zip(&seq) {
        assert_eq!(**meta, **map.meta());
        assert!(Arc::ptr_eq(meta, map.meta()));
    }
}

#[test]
fn display_lists_map_types() {
    let same = MapSequence::new(vec![aia(0.0), aia(1.0)]);
    assert_eq!(same.to_string(), "MapSequence of 2 elements, with maps from AIAMap");

    let mixed = MapSequence::new(vec![aia(0.0), eit(1.0)]);
    assert_eq!(
        mixed.to_string(),
        "MapSequence of 2 elements, with maps from AIAMap, EITMap"
    );
    assert_eq!(format!("{mixed:?}"), mixed.to_string());
}

#[test]
fn derotation_is_refused() {
    let options = SequenceOptions {
        derotate: true,
        ..Default::default()
    };
    let result = MapSequence::with_options(vec![aia(0.0), aia(1.0)], options);
    assert!(matches!(result, Err(MapError::Unsupported(_))));
}

#[test]
fn date_sort_orders_by_observation_time() {
    let options = SequenceOptions {
        sort_by: Some(rusty_sun::map::SortBy::Date),
        ..Default::default()
    };
    let seq = MapSequence::with_options(vec![aia(0.0), eit(1.0)], options).unwrap();
    assert_eq!(seq[0].type_name(), "EITMap");
    assert_eq!(seq[1].type_name(), "AIAMap");
}
