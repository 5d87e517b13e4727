use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, BooleanBuilder, Float32Array, Float64Array,
    Float64Builder, Int32Array, Int64Array, Int64Builder, LargeListArray, ListArray,
    ListBuilder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde_json::Value as JsonValue;

use super::meta::{MetaDict, MetaValue};
use super::observation::{GenericMap, MapData};
use super::sequence::{MapSequence, SequenceOptions};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every map stored in a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per map: `data` list (row-major), `rows`, `cols`,
///   optional `mask` list; every other column is a header card
/// * `.json`    – `{ "meta": {...}, "data": [[...]], "mask": [[...]] }`
///   or an array of such objects
pub fn load_file(path: &Path) -> Result<Vec<GenericMap>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load maps from several files, in path order, into one sequence.
pub fn load_sequence(paths: &[PathBuf], options: SequenceOptions) -> Result<MapSequence> {
    let mut maps = Vec::new();
    for path in paths {
        let loaded = load_file(path).with_context(|| format!("loading {}", path.display()))?;
        log::info!("Loaded {} map(s) from {}", loaded.len(), path.display());
        maps.extend(loaded);
    }
    Ok(MapSequence::with_options(maps, options)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// {
///   "meta": { "instrume": "AIA_3", "date-obs": "2011-06-07T06:33:02.77", ... },
///   "data": [[0.5, 1.0, ...], ...],
///   "mask": [[false, true, ...], ...]
/// }
/// ```
///
/// `mask` is optional; a top-level array holds several maps.
fn load_json(path: &Path) -> Result<Vec<GenericMap>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    match &root {
        JsonValue::Array(records) => records
            .iter()
            .enumerate()
            .map(|(i, rec)| json_to_map(rec).with_context(|| format!("Map {i}")))
            .collect(),
        JsonValue::Object(_) => Ok(vec![json_to_map(&root)?]),
        _ => bail!("Expected a JSON object or array of objects"),
    }
}

fn json_to_map(rec: &JsonValue) -> Result<GenericMap> {
    let obj = rec.as_object().context("map record is not a JSON object")?;

    let mut meta = MetaDict::new();
    if let Some(header) = obj.get("meta") {
        let header = header.as_object().context("'meta' is not a JSON object")?;
        for (key, val) in header {
            meta.insert(key, json_to_meta(val));
        }
    }

    let data = json_grid(obj.get("data"), "data", |v| v.as_f64())?;
    let map = match obj.get("mask") {
        None | Some(JsonValue::Null) => GenericMap::new(data, meta),
        Some(mask) => {
            let mask = json_grid(Some(mask), "mask", |v| v.as_bool())?;
            GenericMap::with_mask(data, mask, meta)?
        }
    };
    Ok(map)
}

/// Parse a JSON array of equal-length rows into a 2-D array.
fn json_grid<T: Clone>(
    val: Option<&JsonValue>,
    name: &str,
    cell: impl Fn(&JsonValue) -> Option<T>,
) -> Result<Array2<T>> {
    let rows = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("missing or invalid '{name}' array"))?;

    let n_cols = match rows.first() {
        Some(first) => first
            .as_array()
            .with_context(|| format!("{name}[0] is not an array"))?
            .len(),
        None => 0,
    };

    let mut flat = Vec::with_capacity(rows.len() * n_cols);
    for (r, row) in rows.iter().enumerate() {
        let row = row
            .as_array()
            .with_context(|| format!("{name}[{r}] is not an array"))?;
        if row.len() != n_cols {
            bail!("{name}[{r}] has {} values, expected {n_cols}", row.len());
        }
        for (c, v) in row.iter().enumerate() {
            flat.push(cell(v).with_context(|| format!("{name}[{r}][{c}]: unexpected value {v}"))?);
        }
    }

    Array2::from_shape_vec((rows.len(), n_cols), flat)
        .with_context(|| format!("reshaping '{name}'"))
}

fn json_to_meta(val: &JsonValue) -> MetaValue {
    match val {
        JsonValue::String(s) => MetaValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetaValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetaValue::Float(f)
            } else {
                MetaValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetaValue::Bool(*b),
        JsonValue::Null => MetaValue::Null,
        other => MetaValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

const DATA_COLUMN: &str = "data";
const MASK_COLUMN: &str = "mask";
const ROWS_COLUMN: &str = "rows";
const COLS_COLUMN: &str = "cols";

/// Load a Parquet file with one map per row.
///
/// Expected schema:
/// - `data`: List<Float64> or LargeList<Float64> – row-major pixel values
/// - `rows`, `cols`: Int64 or Int32 – image shape
/// - `mask`: optional List<Boolean> – `true` marks an invalid pixel
/// - Any other columns are header cards (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<Vec<GenericMap>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut maps = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let data_idx = column(DATA_COLUMN)?;
        let rows_idx = column(ROWS_COLUMN)?;
        let cols_idx = column(COLS_COLUMN)?;
        let mask_idx = schema.index_of(MASK_COLUMN).ok();

        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                *i != data_idx && *i != rows_idx && *i != cols_idx && Some(*i) != mask_idx
            })
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let rows = extract_dim(batch.column(rows_idx), row)
                .with_context(|| format!("Row {row}: failed to read '{ROWS_COLUMN}'"))?;
            let cols = extract_dim(batch.column(cols_idx), row)
                .with_context(|| format!("Row {row}: failed to read '{COLS_COLUMN}'"))?;

            let values = extract_f64_list(batch.column(data_idx), row)
                .with_context(|| format!("Row {row}: failed to read '{DATA_COLUMN}'"))?;
            let data = Array2::from_shape_vec((rows, cols), values)
                .with_context(|| format!("Row {row}: data does not fit {rows}x{cols}"))?;

            let mask = match mask_idx {
                Some(idx) if !batch.column(idx).is_null(row) => {
                    let flags = extract_bool_list(batch.column(idx), row)
                        .with_context(|| format!("Row {row}: failed to read '{MASK_COLUMN}'"))?;
                    Some(
                        Array2::from_shape_vec((rows, cols), flags).with_context(|| {
                            format!("Row {row}: mask does not fit {rows}x{cols}")
                        })?,
                    )
                }
                _ => None,
            };

            // A null cell is a card this map does not have.
            let mut meta = MetaDict::new();
            for (col_idx, col_name) in &meta_cols {
                match extract_metadata_value(batch.column(*col_idx), row) {
                    MetaValue::Null => {}
                    value => {
                        meta.insert(col_name, value);
                    }
                }
            }

            let map_data = match mask {
                Some(mask) => MapData::masked(data, mask)?,
                None => MapData::Plain(data),
            };
            maps.push(GenericMap::from_parts(map_data, meta));
        }
    }

    Ok(maps)
}

// -- Parquet / Arrow helpers --

fn list_values(col: &ArrayRef, row: usize) -> Result<ArrayRef> {
    if col.is_null(row) {
        bail!("null value in list column");
    }
    match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            Ok(list_arr.value(row))
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            Ok(list_arr.value(row))
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    }
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &ArrayRef, row: usize) -> Result<Vec<f64>> {
    let values_array = list_values(col, row)?;

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr
            .iter()
            .map(|v| v.map(f64::from).unwrap_or(f64::NAN))
            .collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

fn extract_bool_list(col: &ArrayRef, row: usize) -> Result<Vec<bool>> {
    let values_array = list_values(col, row)?;
    let flags = values_array
        .as_any()
        .downcast_ref::<BooleanArray>()
        .with_context(|| {
            format!(
                "List inner type is {:?}, expected Boolean",
                values_array.data_type()
            )
        })?;
    // A null flag is treated as invalid.
    Ok(flags.iter().map(|v| v.unwrap_or(true)).collect())
}

fn extract_dim(col: &ArrayRef, row: usize) -> Result<usize> {
    let value = match extract_metadata_value(col, row) {
        MetaValue::Integer(i) => i,
        other => bail!("expected an integer, got {other}"),
    };
    usize::try_from(value).with_context(|| format!("negative dimension {value}"))
}

/// Extract a single header value from an Arrow column at a given row.
fn extract_metadata_value(col: &ArrayRef, row: usize) -> MetaValue {
    if col.is_null(row) {
        return MetaValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => MetaValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => MetaValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|arr| MetaValue::Integer(i64::from(arr.value(row))))
            .unwrap_or(MetaValue::Null),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|arr| MetaValue::Integer(arr.value(row)))
            .unwrap_or(MetaValue::Null),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|arr| MetaValue::Float(f64::from(arr.value(row))))
            .unwrap_or(MetaValue::Null),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|arr| MetaValue::Float(arr.value(row)))
            .unwrap_or(MetaValue::Null),
        DataType::Boolean => MetaValue::Bool(col.as_boolean().value(row)),
        other => MetaValue::String(format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

/// Write a sequence to Parquet in the layout [`load_file`] reads.
///
/// Every header key becomes one column, null for maps without that card.
/// Cards holding `MetaValue::Null` are not stored.
pub fn save_parquet(path: &Path, sequence: &MapSequence) -> Result<()> {
    let mut data_builder = ListBuilder::new(Float64Builder::new());
    let mut mask_builder = ListBuilder::new(BooleanBuilder::new());
    let mut rows_builder = Int64Builder::new();
    let mut cols_builder = Int64Builder::new();

    for map in sequence {
        let (rows, cols) = map.shape();
        rows_builder.append_value(rows as i64);
        cols_builder.append_value(cols as i64);

        // Iterating an Array2 walks it in logical (row-major) order.
        data_builder.values().append_slice(&map.data().iter().copied().collect::<Vec<_>>());
        data_builder.append(true);

        match map.mask() {
            Some(mask) => {
                mask_builder.values().append_slice(&mask.iter().copied().collect::<Vec<_>>());
                mask_builder.append(true);
            }
            None => mask_builder.append(false),
        }
    }

    let mut columns: Vec<(String, ArrayRef)> = vec![
        (DATA_COLUMN.to_string(), Arc::new(data_builder.finish())),
        (ROWS_COLUMN.to_string(), Arc::new(rows_builder.finish())),
        (COLS_COLUMN.to_string(), Arc::new(cols_builder.finish())),
    ];
    if sequence.at_least_one_map_has_mask() {
        columns.push((MASK_COLUMN.to_string(), Arc::new(mask_builder.finish())));
    }

    let all_meta = sequence.all_meta();
    for key in header_keys(&all_meta) {
        let values: Vec<Option<&MetaValue>> = all_meta
            .iter()
            .map(|m| m.get(&key).filter(|v| **v != MetaValue::Null))
            .collect();
        columns.push((key, header_column(&values)));
    }

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, arr)| Field::new(name, arr.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, arr)| arr).collect(),
    )
    .context("assembling record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    log::info!("Wrote {} map(s) to {}", sequence.len(), path.display());
    Ok(())
}

/// Union of header keys in first-seen order, minus the reserved columns.
fn header_keys(all_meta: &[Arc<MetaDict>]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for meta in all_meta {
        for key in meta.keys() {
            let reserved = [DATA_COLUMN, MASK_COLUMN, ROWS_COLUMN, COLS_COLUMN].contains(&key);
            if !reserved && !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}

/// Arrow column for one header key. Integers give an Int64 column, mixed
/// integers and floats a Float64 column, flags a Boolean column; any other
/// mix is stored as text so no card is lost.
fn header_column(values: &[Option<&MetaValue>]) -> ArrayRef {
    let present: Vec<&MetaValue> = values.iter().flatten().copied().collect();
    let all = |pred: fn(&MetaValue) -> bool| {
        !present.is_empty() && present.iter().all(|v| pred(v))
    };

    if all(|v| matches!(v, MetaValue::Integer(_))) {
        let mut b = Int64Builder::new();
        for v in values {
            match v {
                Some(MetaValue::Integer(i)) => b.append_value(*i),
                _ => b.append_null(),
            }
        }
        Arc::new(b.finish())
    } else if all(|v| matches!(v, MetaValue::Integer(_) | MetaValue::Float(_))) {
        let mut b = Float64Builder::new();
        for v in values {
            b.append_option(v.and_then(|v| v.as_f64()));
        }
        Arc::new(b.finish())
    } else if all(|v| matches!(v, MetaValue::Bool(_))) {
        let mut b = BooleanBuilder::new();
        for v in values {
            match v {
                Some(MetaValue::Bool(flag)) => b.append_value(*flag),
                _ => b.append_null(),
            }
        }
        Arc::new(b.finish())
    } else {
        let mut b = StringBuilder::new();
        for v in values {
            b.append_option(v.map(|v| v.to_string()));
        }
        Arc::new(b.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_single_json_map() {
        let file = write_temp(
            ".json",
            r#"{
                "meta": {"INSTRUME": "AIA_3", "WAVELNTH": 171, "exptime": 2.0},
                "data": [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]
            }"#,
        );
        let maps = load_file(file.path()).unwrap();
        assert_eq!(maps.len(), 1);
        let map = &maps[0];
        assert_eq!(map.shape(), (2, 3));
        assert_eq!(map.data()[[1, 0]], 4.0);
        assert_eq!(map.type_name(), "AIAMap");
        assert_eq!(map.wavelength(), Some(171.0));
        assert!(!map.has_mask());
    }

    #[test]
    fn loads_json_array_with_masks() {
        let file = write_temp(
            ".json",
            r#"[
                {"meta": {"instrume": "EIT"}, "data": [[1, 2], [3, 4]], "mask": [[true, false], [false, false]]},
                {"meta": {"instrume": "EIT"}, "data": [[5, 6], [7, 8]], "mask": null}
            ]"#,
        );
        let maps = load_file(file.path()).unwrap();
        assert_eq!(maps.len(), 2);
        assert!(maps[0].mask().unwrap()[[0, 0]]);
        assert!(!maps[1].has_mask());
    }

    #[test]
    fn rejects_ragged_json_rows() {
        let file = write_temp(".json", r#"{"meta": {}, "data": [[1.0, 2.0], [3.0]]}"#);
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("data[1] has 1 values, expected 2"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = write_temp(".fits", "");
        assert!(load_file(file.path()).is_err());
    }

    #[test]
    fn parquet_round_trip_keeps_masks_and_header() {
        let mut aia_meta = MetaDict::new();
        aia_meta.insert("instrume", "AIA_3");
        aia_meta.insert("wavelnth", 171i64);
        aia_meta.insert("exptime", 2.0);
        let data = Array2::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as f64);
        let mut mask = Array2::from_elem((3, 4), false);
        mask[[0, 1]] = true;

        let mut eit_meta = MetaDict::new();
        eit_meta.insert("instrume", "EIT");
        eit_meta.insert("exptime", 12i64);

        let sequence = MapSequence::new([
            GenericMap::with_mask(data.clone(), mask.clone(), aia_meta).unwrap(),
            GenericMap::new(data.clone(), eit_meta),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seq.parquet");
        save_parquet(&path, &sequence).unwrap();
        let maps = load_file(&path).unwrap();

        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].data(), &data);
        assert_eq!(maps[0].mask(), Some(&mask));
        assert!(!maps[1].has_mask());
        assert_eq!(maps[0].type_name(), "AIAMap");
        assert_eq!(maps[1].type_name(), "EITMap");
        assert_eq!(maps[0].meta().get("wavelnth"), Some(&MetaValue::Integer(171)));
        assert!(!maps[1].meta().contains_key("wavelnth"));
        // mixed integer / float column widens to float
        assert_eq!(maps[1].meta().get_f64("exptime"), Some(12.0));
    }

    #[test]
    fn parquet_round_trip_keeps_mixed_and_partial_cards() {
        let mut first = MetaDict::new();
        first.insert("instrume", "AIA_3");
        first.insert("obs_mode", 3i64);
        first.insert("flat", true);
        let mut second = MetaDict::new();
        second.insert("instrume", "AIA_3");
        second.insert("obs_mode", "SCIENCE");
        second.insert("quality", 0i64);

        let data = Array2::from_elem((2, 2), 1.0);
        let sequence = MapSequence::new([
            GenericMap::new(data.clone(), first),
            GenericMap::new(data, second),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.parquet");
        save_parquet(&path, &sequence).unwrap();
        let maps = load_file(&path).unwrap();

        // A key of mixed types is kept as text.
        assert_eq!(maps[0].meta().get_str("obs_mode"), Some("3"));
        assert_eq!(maps[1].meta().get_str("obs_mode"), Some("SCIENCE"));
        // Keys stay with the maps that had them.
        assert_eq!(maps[0].meta().get("flat"), Some(&MetaValue::Bool(true)));
        assert!(!maps[1].meta().contains_key("flat"));
        assert!(!maps[0].meta().contains_key("quality"));
        assert_eq!(maps[1].meta().get("quality"), Some(&MetaValue::Integer(0)));
        let keys: Vec<&str> = maps[1].meta().keys().collect();
        assert_eq!(keys, ["instrume", "obs_mode", "quality"]);
    }

    #[test]
    fn load_sequence_concatenates_files_in_order() {
        let first = write_temp(".json", r#"{"meta": {"instrume": "EIT"}, "data": [[1.0]]}"#);
        let second = write_temp(".json", r#"{"meta": {"instrume": "AIA_3"}, "data": [[2.0]]}"#);
        let seq = load_sequence(
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            SequenceOptions::default(),
        )
        .unwrap();
        assert_eq!(
            seq.to_string(),
            "MapSequence of 2 elements, with maps from EITMap, AIAMap"
        );
    }
}
