use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{self, Dataset, Record, Value};
use super::schema::{ColumnKind, Schema};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
    Parquet,
}

fn format_of(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => Ok(Format::Csv),
        "json" => Ok(Format::Json),
        "parquet" | "pq" => Ok(Format::Parquet),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load a dataset typed by `schema`.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one record per line
/// * `.json`    – `[{ "column": value, ... }, ...]` (`df.to_json(orient='records')`)
/// * `.parquet` – flat columns of strings / ints / floats
///
/// Required schema columns must be present. Optional ones that are missing
/// are dropped from the dataset's schema; extra file columns are ignored.
pub fn load_file(path: &Path, schema: &Schema) -> Result<Dataset> {
    let dataset = match format_of(path)? {
        Format::Csv => load_csv(path, schema),
        Format::Json => load_json(path, schema),
        Format::Parquet => load_parquet(path, schema),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "{}: {} records, columns {:?}",
        path.display(),
        dataset.len(),
        dataset
            .schema()
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
    );
    Ok(dataset)
}

/// Column names present in the file, without reading the records.
pub fn peek_columns(path: &Path) -> Result<Vec<String>> {
    match format_of(path)? {
        Format::Csv => {
            let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
            Ok(reader
                .headers()
                .context("reading CSV headers")?
                .iter()
                .map(|h| h.to_string())
                .collect())
        }
        Format::Json => {
            Ok(json_columns(&read_json_records(path)?))
        }
        Format::Parquet => {
            let file = std::fs::File::open(path).context("opening parquet file")?;
            let builder = ParquetRecordBatchReaderBuilder::try_new(file)
                .context("reading parquet metadata")?;
            Ok(builder
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect())
        }
    }
}

/// Match schema columns against the file's column names.
///
/// Returns the effective schema and, for each of its columns, the position in
/// the file.
fn resolve_columns(schema: &Schema, file_columns: &[String]) -> Result<(Schema, Vec<usize>)> {
    let mut positions = Vec::new();
    for col in schema.columns() {
        match file_columns.iter().position(|h| *h == col.name) {
            Some(pos) => positions.push(pos),
            None if col.required => bail!("missing '{}' column", col.name),
            None => log::debug!("optional column '{}' not present, skipping", col.name),
        }
    }
    let effective = schema.retain(|c| file_columns.contains(&c.name));
    for name in file_columns {
        if !schema.contains(name) {
            log::debug!("column '{name}' is not in the schema, ignoring");
        }
    }
    Ok((effective, positions))
}

/// Type one text cell according to its column kind. `row` is 1-based.
fn parse_cell(kind: ColumnKind, raw: &str, row: usize, col: &str) -> Result<Value> {
    parse_text(kind, raw).with_context(|| format!("Row {row}, {col}"))
}

fn parse_text(kind: ColumnKind, raw: &str) -> Result<Value> {
    if model::is_missing(raw) {
        return Ok(Value::Null);
    }
    match kind {
        ColumnKind::Numeric => {
            let t = raw.trim();
            if let Ok(i) = t.parse::<i64>() {
                return Ok(Value::Integer(i));
            }
            t.parse::<f64>()
                .map(Value::number)
                .with_context(|| format!("'{raw}' is not a number"))
        }
        ColumnKind::Categorical | ColumnKind::Text => Ok(Value::String(raw.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, schema: &Schema) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let (schema, positions) = resolve_columns(schema, &headers).context("CSV header")?;

    let mut records = Vec::new();
    for (row_no, result) in (1..).zip(reader.records()) {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let values = schema
            .columns()
            .iter()
            .zip(&positions)
            .map(|(col, &pos)| parse_cell(col.kind, record.get(pos).unwrap_or(""), row_no, &col.name))
            .collect::<Result<Vec<_>>>()?;
        records.push(Record::new(values));
    }

    Ok(Dataset::new(schema, records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout (records-oriented):
///
/// ```json
/// [
///   { "gender": "female", "test preparation course": "none", "score": 72 },
///   ...
/// ]
/// ```
fn read_json_records(path: &Path) -> Result<Vec<JsonValue>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    match root {
        JsonValue::Array(records) => Ok(records),
        _ => bail!("Expected top-level JSON array"),
    }
}

/// Union of keys over all records, in first-seen order. A record may omit
/// keys.
fn json_columns(rows: &[JsonValue]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for obj in rows.iter().filter_map(JsonValue::as_object) {
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn load_json(path: &Path, schema: &Schema) -> Result<Dataset> {
    let rows = read_json_records(path)?;

    let file_columns = json_columns(&rows);
    let (schema, _) = if rows.is_empty() {
        (schema.clone(), Vec::new())
    } else {
        resolve_columns(schema, &file_columns)?
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, rec) in (1..).zip(&rows) {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let values = schema
            .columns()
            .iter()
            .map(|col| json_to_value(col.kind, obj.get(&col.name), i, &col.name))
            .collect::<Result<Vec<_>>>()?;
        records.push(Record::new(values));
    }

    Ok(Dataset::new(schema, records))
}

fn json_to_value(kind: ColumnKind, val: Option<&JsonValue>, row: usize, col: &str) -> Result<Value> {
    let Some(val) = val else {
        return Ok(Value::Null);
    };
    match (kind, val) {
        (_, JsonValue::Null) => Ok(Value::Null),
        (ColumnKind::Numeric, JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else {
                n.as_f64()
                    .map(Value::number)
                    .with_context(|| format!("Row {row}, {col}: {n} is out of range"))
            }
        }
        (ColumnKind::Numeric, JsonValue::String(s)) => parse_cell(kind, s, row, col),
        (ColumnKind::Numeric, other) => bail!("Row {row}, {col}: {other} is not a number"),
        (_, JsonValue::String(s)) => parse_cell(kind, s, row, col),
        (_, other) => Ok(Value::String(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per schema column.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, schema: &Schema) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let file_columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let (schema, positions) = resolve_columns(schema, &file_columns)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut row_base = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let n_rows = batch.num_rows();

        for row in 0..n_rows {
            let values = schema
                .columns()
                .iter()
                .zip(&positions)
                .map(|(col, &pos)| {
                    extract_value(batch.column(pos), row, col.kind)
                        .with_context(|| format!("Row {}, {}", row_base + row + 1, col.name))
                })
                .collect::<Result<Vec<_>>>()?;
            records.push(Record::new(values));
        }
        row_base += n_rows;
    }

    Ok(Dataset::new(schema, records))
}

/// Extract a single cell from an Arrow column at a given row.
/// Errors carry no location; the caller adds row and column.
fn extract_value(col: &Arc<dyn Array>, row: usize, kind: ColumnKind) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = col.as_string_opt::<i32>().context("expected StringArray")?;
            return parse_text(kind, s.value(row));
        }
        DataType::LargeUtf8 => {
            let s = col.as_string_opt::<i64>().context("expected LargeStringArray")?;
            return parse_text(kind, s.value(row));
        }
        DataType::Int32 => {
            let arr = col.as_primitive_opt::<Int32Type>().context("expected Int32Array")?;
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_primitive_opt::<Int64Type>().context("expected Int64Array")?;
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_primitive_opt::<Float32Type>().context("expected Float32Array")?;
            Value::number(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_primitive_opt::<Float64Type>().context("expected Float64Array")?;
            Value::number(arr.value(row))
        }
        other => bail!("unsupported column type {other:?}"),
    };

    // Numbers stored in a categorical column become labels, e.g. Year_of_Study.
    Ok(match kind {
        ColumnKind::Numeric => value,
        ColumnKind::Categorical | ColumnKind::Text => Value::String(value.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ColumnDef;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create fixture");
        file.write_all(contents.as_bytes()).expect("write fixture");
        path
    }

    #[test]
    fn csv_types_cells_by_schema() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_file(
            &dir,
            "Students.csv",
            "gender,parental level of education,test preparation course,score,extra\n\
             female,bachelor's degree,none,72,x\n\
             male,some college,completed,,y\n\
             female,high school,none,66.5,z\n",
        );
        let ds = load_file(&path, &Schema::scores()).expect("load");
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.schema().len(), 4, "optional columns and extras are dropped");
        assert_eq!(ds.value(0, "score"), Some(&Value::Integer(72)));
        assert_eq!(ds.value(1, "score"), Some(&Value::Null));
        assert_eq!(ds.value(2, "score"), Some(&Value::Float(66.5)));
        assert_eq!(ds.value(0, "gender"), Some(&Value::from("female")));
        assert_eq!(ds.value(0, "extra"), None);
    }

    #[test]
    fn csv_missing_required_column_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_file(&dir, "s.csv", "gender,score\nfemale,10\n");
        let err = load_file(&path, &Schema::scores()).unwrap_err();
        assert!(format!("{err:#}").contains("parental level of education"));
    }

    #[test]
    fn csv_non_numeric_cell_fails_with_location() {
        let dir = tempfile::tempdir().expect("temp dir");
        let schema = Schema::new(vec![ColumnDef::required("score", ColumnKind::Numeric)]);
        let path = write_file(&dir, "s.csv", "score\n10\nabc\n");
        let err = load_file(&path, &schema).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Row 2, score"), "{msg}");
        assert!(msg.contains("abc"), "{msg}");
    }

    #[test]
    fn json_records_load_with_missing_keys_as_null() {
        let dir = tempfile::tempdir().expect("temp dir");
        let schema = Schema::new(vec![
            ColumnDef::required("Stream", ColumnKind::Categorical),
            ColumnDef::required("Daily_Usage_Hours", ColumnKind::Numeric),
        ]);
        let path = write_file(
            &dir,
            "ai.json",
            r#"[{"Stream": "CS", "Daily_Usage_Hours": 2.5},
                {"Stream": "EE"}]"#,
        );
        let ds = load_file(&path, &schema).expect("load");
        assert_eq!(ds.value(0, "Daily_Usage_Hours"), Some(&Value::Float(2.5)));
        assert_eq!(ds.value(1, "Daily_Usage_Hours"), Some(&Value::Null));
    }

    #[test]
    fn csv_not_a_number_cells_load_as_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let schema = Schema::new(vec![ColumnDef::required("score", ColumnKind::Numeric)]);
        let path = write_file(&dir, "s.csv", "score\n10\nNaN\n20\ninf\nNA\n");
        let ds = load_file(&path, &schema).expect("load");
        assert_eq!(ds.value(1, "score"), Some(&Value::Null));
        assert_eq!(ds.value(3, "score"), Some(&Value::Null));
        assert_eq!(ds.value(4, "score"), Some(&Value::Null));

        let view = crate::data::filter::View::all(&ds);
        let values = crate::stats::numeric_values(&view, "score");
        assert_eq!(values, vec![10.0, 20.0]);
        assert_eq!(crate::stats::mean(&values), Some(15.0));
    }

    #[test]
    fn json_columns_are_the_union_of_record_keys() {
        let dir = tempfile::tempdir().expect("temp dir");
        let schema = Schema::new(vec![
            ColumnDef::required("Stream", ColumnKind::Categorical),
            ColumnDef::required("Daily_Usage_Hours", ColumnKind::Numeric),
        ]);
        let path = write_file(
            &dir,
            "ai.json",
            r#"[{"Stream": "CS"},
                {"Stream": "EE", "Daily_Usage_Hours": 3}]"#,
        );
        let ds = load_file(&path, &schema).expect("load");
        assert_eq!(ds.schema().len(), 2);
        assert_eq!(ds.value(0, "Daily_Usage_Hours"), Some(&Value::Null));
        assert_eq!(ds.value(1, "Daily_Usage_Hours"), Some(&Value::Integer(3)));
    }

    #[test]
    fn peek_reads_csv_header_only() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_file(&dir, "ai.csv", "Stream,Year_of_Study\nCS,1\n");
        assert_eq!(peek_columns(&path).expect("peek"), vec!["Stream", "Year_of_Study"]);
    }

    #[test]
    fn unsupported_extension_and_missing_file() {
        let err = load_file(Path::new("data.xlsx"), &Schema::scores()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
        assert!(load_file(Path::new("/nonexistent/Students.csv"), &Schema::scores()).is_err());
    }
}
