use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use arrow::array::AsArray;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{Diagnostic, LoadError};
use super::metrics::DerivedMetric;
use super::model::{columns, ColumnType, Dataset, Field, Record, Schema, Value};

/// Cell spellings read as missing values.
const NULL_TOKENS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a player table from a file and compute the derived metrics.
/// Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-separated with a header row (also used when the
///   path has no extension)
/// * `.json`    – `[{ "Player": "...", "Gls": 3, ... }, ...]`
/// * `.parquet` – flat columns of strings / integers / floats
///
/// Missing expected columns are not an error: they are recorded as
/// [`Diagnostic`]s on the returned dataset and the metrics depending on
/// them are left out of the schema.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "" | "csv" | "txt" => {
            let file = open(path)?;
            load_csv_reader(file, path)?
        }
        "json" => derive_metrics(read_json(path)?),
        "parquet" | "pq" => derive_metrics(read_parquet(path)?),
        other => {
            return Err(LoadError::UnsupportedFormat {
                extension: other.to_string(),
            })
        }
    };

    log::info!(
        "Loaded {} rows from {} with columns {:?}; derived {:?}",
        dataset.len(),
        path.display(),
        dataset.schema().names().collect::<Vec<_>>(),
        dataset.metrics()
    );
    Ok(dataset)
}

/// Parse CSV text from any reader. `origin` is only used in error messages.
pub fn load_csv_reader<R: Read>(reader: R, origin: &Path) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(origin, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::schema(origin, "missing header row"));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(origin, e))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Ok(derive_metrics(typed_table(headers, rows)))
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    if !err.is_io_error() {
        return LoadError::schema(path, err);
    }
    match err.into_kind() {
        csv::ErrorKind::Io(source) => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => LoadError::schema(path, format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Text cells → typed columns (CSV and JSON)
// ---------------------------------------------------------------------------

fn is_null_token(cell: &str) -> bool {
    NULL_TOKENS.contains(&cell.trim())
}

/// Integer if every non-null cell parses as one, Float if every non-null
/// cell is numeric, Text otherwise. A column with no values is Float.
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut dtype = ColumnType::Integer;
    let mut seen = false;
    for cell in cells {
        if is_null_token(cell) {
            continue;
        }
        seen = true;
        let cell = cell.trim();
        if dtype == ColumnType::Integer && cell.parse::<i64>().is_ok() {
            continue;
        }
        if cell.parse::<f64>().is_ok() {
            dtype = ColumnType::Float;
            continue;
        }
        return ColumnType::Text;
    }
    if seen {
        dtype
    } else {
        ColumnType::Float
    }
}

fn parse_cell(cell: &str, dtype: ColumnType) -> Value {
    if is_null_token(cell) {
        return Value::Null;
    }
    match dtype {
        ColumnType::Integer => cell.trim().parse().map(Value::Integer).unwrap_or(Value::Null),
        ColumnType::Float => cell.trim().parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnType::Text => Value::Text(cell.to_string()),
    }
}

fn typed_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Dataset {
    let fields: Vec<Field> = headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let cells = rows.iter().map(|r| r.get(i).map(String::as_str).unwrap_or(""));
            let dtype = infer_column_type(cells);
            log::debug!("column '{name}' inferred as {dtype:?}");
            Field::new(name, dtype)
        })
        .collect();

    let records = rows
        .iter()
        .map(|row| {
            let values = fields
                .iter()
                .enumerate()
                .map(|(i, f)| parse_cell(row.get(i).map(String::as_str).unwrap_or(""), f.dtype))
                .collect();
            Record::new(values)
        })
        .collect();

    Dataset::new(Schema::new(fields), records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Player": "A", "Comp": "L1", "MP": 10, "Gls": 5 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys in first-seen order; a key missing from a
/// record reads as null.
fn read_json(path: &Path) -> Result<Dataset, LoadError> {
    let mut text = String::new();
    open(path)?
        .read_to_string(&mut text)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| LoadError::schema(path, e))?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::schema(path, "expected a top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::schema(path, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        return Err(LoadError::schema(path, "no columns found"));
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| match obj.get(h) {
                    None | Some(JsonValue::Null) => String::new(),
                    Some(JsonValue::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    Ok(typed_table(headers, rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table. Integer columns stay integers, floating and
/// decimal columns become floats, everything else is rendered as text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)
        .map_err(|e| LoadError::schema(path, e))?;

    let fields: Vec<Field> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| Field::new(f.name().clone(), arrow_column_type(f.data_type())))
        .collect();

    let reader = builder.build().map_err(|e| LoadError::schema(path, e))?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::schema(path, e))?;

        let mut batch_columns: Vec<Vec<Value>> = Vec::with_capacity(fields.len());
        for (col_idx, field) in fields.iter().enumerate() {
            let values = arrow_column_values(batch.column(col_idx), field.dtype)
                .map_err(|e| LoadError::schema(path, format!("column '{}': {e}", field.name)))?;
            batch_columns.push(values);
        }

        for row in 0..batch.num_rows() {
            let values = batch_columns
                .iter_mut()
                .map(|col| std::mem::replace(&mut col[row], Value::Null))
                .collect();
            records.push(Record::new(values));
        }
    }

    Ok(Dataset::new(Schema::new(fields), records))
}

// -- Parquet / Arrow helpers --

fn arrow_column_type(data_type: &DataType) -> ColumnType {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnType::Integer,
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => ColumnType::Float,
        _ => ColumnType::Text,
    }
}

/// Cast an Arrow column to the storage type of `dtype` and read every cell.
fn arrow_column_values(
    col: &arrow::array::ArrayRef,
    dtype: ColumnType,
) -> Result<Vec<Value>, arrow::error::ArrowError> {
    let values = match dtype {
        ColumnType::Integer => {
            let casted = cast(col, &DataType::Int64)?;
            casted
                .as_primitive::<Int64Type>()
                .iter()
                .map(|v| v.map(Value::Integer).unwrap_or(Value::Null))
                .collect()
        }
        ColumnType::Float => {
            let casted = cast(col, &DataType::Float64)?;
            casted
                .as_primitive::<Float64Type>()
                .iter()
                // NaN is a missing value, as the "NaN" token is in text input
                .map(|v| match v {
                    Some(x) if !x.is_nan() => Value::Float(x),
                    _ => Value::Null,
                })
                .collect()
        }
        ColumnType::Text => {
            let casted = cast(col, &DataType::Utf8)?;
            casted
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(|s| Value::Text(s.to_string())).unwrap_or(Value::Null))
                .collect()
        }
    };
    Ok(values)
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// Check for the expected input columns and compute every derived metric
/// whose source columns are all present. A derived column that already
/// exists in the source is recomputed.
pub fn derive_metrics(table: Dataset) -> Dataset {
    let mut diagnostics = Vec::new();
    for column in columns::REQUIRED {
        if !table.has_column(column) {
            log::warn!("expected column '{column}' is missing");
            diagnostics.push(Diagnostic::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let mut metrics = BTreeSet::new();
    let mut derived = table;
    for metric in DerivedMetric::ALL {
        let missing: Vec<String> = metric
            .sources()
            .iter()
            .filter(|c| !derived.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            log::warn!("skipping {metric}: missing {}", missing.join(", "));
            diagnostics.push(Diagnostic::MetricSkipped { metric, missing });
            continue;
        }

        let values = derived
            .records()
            .iter()
            .map(|r| {
                let numerator = derived.value(r, metric.numerator()).as_f64();
                let denominator = derived.value(r, metric.denominator()).as_f64();
                Value::Float(metric.compute(numerator, denominator))
            })
            .collect();
        derived = derived.with_column(Field::new(metric.column(), ColumnType::Float), values);
        metrics.insert(metric);
    }

    derived.with_derivation(metrics, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Dataset, LoadError> {
        load_csv_reader(text.as_bytes(), Path::new("<test>"))
    }

    #[test]
    fn infers_column_types() {
        let ds = parse("Player,MP,Score\nA,10,1.5\nB,,2\n").unwrap();
        let schema = ds.schema();
        assert_eq!(schema.field("Player").unwrap().dtype, ColumnType::Text);
        assert_eq!(schema.field("MP").unwrap().dtype, ColumnType::Integer);
        assert_eq!(schema.field("Score").unwrap().dtype, ColumnType::Float);
        assert!(ds.value(&ds.records()[1], "MP").is_null());
        assert_eq!(ds.value(&ds.records()[1], "Score"), &Value::Float(2.0));
    }

    #[test]
    fn derives_only_computable_metrics() {
        let ds = parse("Player,Gls,MP\nA,4,8\nB,1,0\n").unwrap();
        assert!(ds.has_metric(DerivedMetric::GoalsPerMatch));
        assert!(!ds.has_metric(DerivedMetric::GoalsPer90));
        assert!(!ds.has_column("goals_per_90"));
        assert!(!ds.has_column("assists_per_match"));
        assert_eq!(ds.numbers("goals_per_match"), vec![0.5, 0.0]);
        assert!(ds.diagnostics().contains(&Diagnostic::MetricSkipped {
            metric: DerivedMetric::GoalsPer90,
            missing: vec!["Min".to_string()],
        }));
        assert!(ds.diagnostics().contains(&Diagnostic::MissingColumn {
            column: "Ast".to_string()
        }));
    }

    #[test]
    fn missing_numerator_yields_zero() {
        let ds = parse("Gls,Ast,MP,Min\n,NA,5,450\n").unwrap();
        for metric in DerivedMetric::ALL {
            let v = ds.numbers(metric.column());
            assert_eq!(v.len(), 1, "{metric}");
            assert!(v[0].is_finite(), "{metric}");
        }
        assert_eq!(ds.numbers("goals_per_match"), vec![0.0]);
        assert_eq!(ds.numbers("minutes_per_match"), vec![90.0]);
    }

    #[test]
    fn existing_derived_column_is_recomputed() {
        let ds = parse("Gls,MP,goals_per_match\n3,0,inf\n").unwrap();
        assert_eq!(ds.numbers("goals_per_match"), vec![0.0]);
        assert_eq!(ds.schema().names().filter(|n| *n == "goals_per_match").count(), 1);
    }

    #[test]
    fn empty_input_is_a_schema_error() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, LoadError::Schema { .. }));
        assert!(!err.is_data_source());
    }

    #[test]
    fn ragged_rows_are_a_schema_error() {
        let err = parse("Player,Gls\nA,1\nB,2,3\n").unwrap_err();
        assert!(matches!(err, LoadError::Schema { .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.is_data_source());
    }
}
