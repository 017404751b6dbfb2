use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{
    CellValue, CompanySize, ExperienceLevel, Region, SalaryDataset, SalaryRecord,
    DECLARED_COLUMNS, REGION_COLUMN,
};

/// Declared columns kept verbatim as text, never type-guessed.
const TEXT_COLUMNS: [&str; 6] = [
    "experience_level",
    "employment_type",
    "job_title",
    "employee_residence",
    "company_location",
    "company_size",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("data file not found: {0}")]
    NotFound(PathBuf),
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("reading Arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },
    #[error("row {row}, column '{column}': invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("data file contains no records: {0}")]
    Empty(PathBuf),
}

impl LoadError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// The source is missing, unreadable or holds nothing, as opposed to
    /// being malformed.
    pub fn is_unavailable(&self) -> bool {
        match self {
            LoadError::NotFound(_) | LoadError::Io { .. } | LoadError::Empty(_) => true,
            LoadError::Csv(e) => e.is_io_error(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a salary dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-delimited with a header row (the canonical source)
/// * `.json`    – `[{ "work_year": 2023, "experience_level": "SE", ... }, ...]`
/// * `.parquet` – same column names as the CSV
pub fn load_file(path: &Path) -> Result<SalaryDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    if dataset.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    log::info!(
        "Loaded {} salary records from {} ({} pass-through columns)",
        dataset.len(),
        path.display(),
        dataset.extra_columns.len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Cached loader
// ---------------------------------------------------------------------------

/// Owns the single loaded dataset for a session.
///
/// The first successful [`get`](Self::get) reads the file; later calls hand
/// out the same shared table until [`invalidate`](Self::invalidate) or
/// [`reload`](Self::reload). Failed loads are not cached.
#[derive(Debug)]
pub struct DatasetLoader {
    path: PathBuf,
    cached: Option<Arc<SalaryDataset>>,
}

impl DatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    pub fn get(&mut self) -> Result<Arc<SalaryDataset>, LoadError> {
        if let Some(ds) = &self.cached {
            return Ok(Arc::clone(ds));
        }
        let ds = Arc::new(load_file(&self.path)?);
        self.cached = Some(Arc::clone(&ds));
        Ok(ds)
    }

    /// Drop the cached table; the next `get` re-reads the file.
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            log::debug!("Invalidated cached dataset for {}", self.path.display());
        }
    }

    /// Point the loader at a different file, dropping any cached table.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.invalidate();
    }

    pub fn reload(&mut self) -> Result<Arc<SalaryDataset>, LoadError> {
        self.invalidate();
        self.get()
    }
}

// ---------------------------------------------------------------------------
// Row conversion shared by every format
// ---------------------------------------------------------------------------

/// One source row before interpretation: column_name → cell.
type RawRow = BTreeMap<String, CellValue>;

fn check_columns(mut present: impl FnMut(&str) -> bool) -> Result<(), LoadError> {
    match DECLARED_COLUMNS.iter().find(|c| !present(c)) {
        Some(col) => Err(LoadError::MissingColumn {
            column: col.to_string(),
        }),
        None => Ok(()),
    }
}

/// Columns that are neither declared nor derived, in source order.
fn extra_columns<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    headers
        .into_iter()
        .filter(|h| !DECLARED_COLUMNS.contains(h) && *h != REGION_COLUMN)
        .map(str::to_string)
        .collect()
}

fn invalid(row: usize, column: &str, value: &CellValue) -> LoadError {
    LoadError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_field(),
    }
}

fn take<'r>(row: &'r RawRow, column: &str) -> Result<&'r CellValue, LoadError> {
    row.get(column).ok_or_else(|| LoadError::MissingColumn {
        column: column.to_string(),
    })
}

fn text(row: &RawRow, column: &str) -> Result<String, LoadError> {
    Ok(take(row, column)?.to_field())
}

fn integer(row: &RawRow, row_no: usize, column: &str) -> Result<i32, LoadError> {
    let cell = take(row, column)?;
    let value = match cell {
        CellValue::Integer(i) => i32::try_from(*i).ok(),
        CellValue::Float(f) if f.fract() == 0.0 => Some(*f as i32),
        _ => None,
    };
    value.ok_or_else(|| invalid(row_no, column, cell))
}

fn salary(row: &RawRow, row_no: usize) -> Result<f64, LoadError> {
    let cell = take(row, "salary_in_usd")?;
    match cell.as_f64() {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(invalid(row_no, "salary_in_usd", cell)),
    }
}

fn record_from_row(
    mut row: RawRow,
    row_no: usize,
    extra_columns: &[String],
) -> Result<SalaryRecord, LoadError> {
    let experience_raw = text(&row, "experience_level")?;
    let size_raw = text(&row, "company_size")?;
    let experience_level = ExperienceLevel::parse(&experience_raw);
    let company_size = CompanySize::parse(&size_raw);
    if experience_level.is_none() || company_size.is_none() {
        log::warn!(
            "Row {row_no}: unmapped codes (experience '{experience_raw}', size '{size_raw}')"
        );
    }

    let company_location = text(&row, "company_location")?;
    let extra = extra_columns
        .iter()
        .map(|col| {
            let value = row.remove(col).unwrap_or(CellValue::Null);
            (col.clone(), value)
        })
        .collect();

    Ok(SalaryRecord {
        work_year: integer(&row, row_no, "work_year")?,
        experience_level,
        employment_type: text(&row, "employment_type")?,
        job_title: text(&row, "job_title")?,
        salary_in_usd: salary(&row, row_no)?,
        employee_residence: text(&row, "employee_residence")?,
        remote_ratio: integer(&row, row_no, "remote_ratio")?,
        region: Region::from_location(&company_location),
        company_location,
        company_size,
        extra,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// The declared columns must all be present; anything else passes through.
fn load_csv(path: &Path) -> Result<SalaryDataset, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::from_io(path, e))?;
    read_csv(file)
}

/// Parse CSV from any reader. Shared with tests and the export round-trip.
pub fn read_csv<R: io::Read>(input: R) -> Result<SalaryDataset, LoadError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Ok(SalaryDataset::from_records(Vec::new(), Vec::new()));
    }

    check_columns(|c| headers.iter().any(|h| h == c))?;
    let extras = extra_columns(headers.iter().map(String::as_str));

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(col, raw)| {
                let cell = if TEXT_COLUMNS.contains(&col.as_str()) {
                    CellValue::String(raw.to_string())
                } else {
                    CellValue::guess(raw)
                };
                (col.clone(), cell)
            })
            .collect();
        records.push(record_from_row(row, row_no, &extras)?);
    }

    Ok(SalaryDataset::from_records(records, extras))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "work_year": 2023, "experience_level": "SE", "job_title": "Data Scientist", ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SalaryDataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e))?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let Some(rows) = root.as_array() else {
        return Err(LoadError::InvalidValue {
            row: 0,
            column: "<root>".into(),
            value: "expected a top-level JSON array".into(),
        });
    };

    // Pass-through columns: first-seen order across all objects.
    let mut extras: Vec<String> = Vec::new();
    for obj in rows.iter().filter_map(JsonValue::as_object) {
        for key in obj.keys() {
            if !DECLARED_COLUMNS.contains(&key.as_str())
                && key != REGION_COLUMN
                && !extras.contains(key)
            {
                extras.push(key.clone());
            }
        }
    }

    let mut records = Vec::with_capacity(rows.len());
    for (i, rec) in rows.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| LoadError::InvalidValue {
            row: i,
            column: "<row>".into(),
            value: rec.to_string(),
        })?;
        let row: RawRow = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_cell(val)))
            .collect();
        records.push(record_from_row(row, i, &extras)?);
    }

    Ok(SalaryDataset::from_records(records, extras))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding the salary table.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<SalaryDataset, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::from_io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let field_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    check_columns(|c| field_names.iter().any(|f| f == c))?;
    let extras = extra_columns(field_names.iter().map(String::as_str));

    let reader = builder.build()?;
    let mut records = Vec::new();
    let mut row_no = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let columns: Vec<(String, usize)> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().clone(), i))
            .collect();

        for row in 0..batch.num_rows() {
            let raw: RawRow = columns
                .iter()
                .map(|(name, idx)| (name.clone(), extract_cell(batch.column(*idx), row)))
                .collect();
            records.push(record_from_row(raw, row_no, &extras)?);
            row_no += 1;
        }
    }

    Ok(SalaryDataset::from_records(records, extras))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| CellValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| CellValue::String(s.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(i64::from(a.value(row)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::float(f64::from(a.value(row)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        other => Some(CellValue::String(format!("{other:?}"))),
    };
    cell.unwrap_or(CellValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "work_year,experience_level,employment_type,job_title,salary,salary_currency,salary_in_usd,employee_residence,remote_ratio,company_location,company_size";

    fn parse(body: &str) -> Result<SalaryDataset, LoadError> {
        read_csv(format!("{HEADER}\n{body}").as_bytes())
    }

    #[test]
    fn maps_codes_and_derives_region() {
        let ds = parse(
            "2023,SE,FT,Data Scientist,80000,EUR,85847,FR,100,FR,L\n\
             2023,EN,FT,ML Engineer,90000,USD,90000,US,0,US,S\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        let a = &ds.records[0];
        assert_eq!(a.experience_level, Some(ExperienceLevel::Senior));
        assert_eq!(a.company_size, Some(CompanySize::Large));
        assert_eq!(a.region, Region::RestOfWorld);
        assert_eq!(ds.records[1].region, Region::Usa);
        assert_eq!(ds.extra_columns, vec!["salary", "salary_currency"]);
        assert_eq!(a.extra["salary_currency"], CellValue::String("EUR".into()));
        assert!(ds.numeric_columns.contains(&"salary".to_string()));
        assert!(!ds.numeric_columns.contains(&"salary_currency".to_string()));
    }

    #[test]
    fn unmapped_codes_become_empty_labels() {
        let ds = parse("2022,ZZ,FT,Analyst,50000,USD,50000,US,50,US,X\n").unwrap();
        assert_eq!(ds.records[0].experience_level, None);
        assert_eq!(ds.records[0].company_size, None);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = read_csv("work_year,job_title\n2023,Analyst\n".as_bytes()).unwrap_err();
        assert!(
            matches!(err, LoadError::MissingColumn { ref column } if column == "experience_level")
        );
    }

    #[test]
    fn negative_salary_is_rejected() {
        let err = parse("2023,SE,FT,Analyst,1,USD,-5,US,0,US,M\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { row: 0, ref column, .. } if column == "salary_in_usd"
        ));
    }

    #[test]
    fn cache_serves_same_table_until_invalidated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ds.csv");
        std::fs::write(&path, format!("{HEADER}\n2023,MI,FT,Analyst,1,USD,60000,US,0,US,M\n"))
            .unwrap();

        let mut loader = DatasetLoader::new(&path);
        let first = loader.get().unwrap();
        let second = loader.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        loader.invalidate();
        assert!(!loader.is_cached());
        let third = loader.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn unreadable_source_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let folder = dir.path().join("folder.json");
        std::fs::create_dir(&folder).unwrap();

        let err = load_file(&folder).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "{err:?}");
        assert!(err.is_unavailable());
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut loader = DatasetLoader::new("definitely/not/here.csv");
        assert!(matches!(loader.get(), Err(LoadError::NotFound(_))));
        assert!(!loader.is_cached());
    }
}
