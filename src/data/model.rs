use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single pass-through cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell for columns the dashboard does not interpret
/// (`salary`, `salary_currency`, index columns written by Pandas, ...).
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

/// Text cells read as missing values, as Pandas does by default.
const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl CellValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text written to a delimited file. Unlike `Display`, floats keep full
    /// precision and nulls become an empty field.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            // `{:?}` keeps the decimal point, so `1.0` reloads as a float.
            CellValue::Float(v) => format!("{v:?}"),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }

    /// A float cell. NaN and infinities count as missing.
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Float(v)
        } else {
            CellValue::Null
        }
    }

    /// Parse a raw text cell, guessing the narrowest type.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Categorical labels
// ---------------------------------------------------------------------------

/// Seniority of the position. Source files carry two-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Executive,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EN" => Some(ExperienceLevel::Entry),
            "MI" => Some(ExperienceLevel::Mid),
            "SE" => Some(ExperienceLevel::Senior),
            "EX" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }

    /// Accepts either a source code or a display label.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_code(raw).or_else(|| Self::ALL.into_iter().find(|l| l.label() == raw))
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Executive => "Executive",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Headcount bucket of the employer. Source files carry one-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompanySize {
    Small,
    Medium,
    Large,
}

impl CompanySize {
    pub const ALL: [CompanySize; 3] = [CompanySize::Small, CompanySize::Medium, CompanySize::Large];

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(CompanySize::Small),
            "M" => Some(CompanySize::Medium),
            "L" => Some(CompanySize::Large),
            _ => None,
        }
    }

    /// Accepts either a source code or a display label.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_code(raw).or_else(|| Self::ALL.into_iter().find(|s| s.label() == raw))
    }

    pub fn label(self) -> &'static str {
        match self {
            CompanySize::Small => "Small",
            CompanySize::Medium => "Medium",
            CompanySize::Large => "Large",
        }
    }
}

impl fmt::Display for CompanySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived grouping: is the company located in the United States?
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Usa,
    RestOfWorld,
}

impl Region {
    pub fn from_location(company_location: &str) -> Self {
        if company_location == "US" {
            Region::Usa
        } else {
            Region::RestOfWorld
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Region::Usa => "USA",
            Region::RestOfWorld => "Rest of World",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label of an optional category; unmapped codes render as an empty label.
pub fn label_or_empty<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// SalaryRecord – one row of the source table
// ---------------------------------------------------------------------------

/// Column names the loader interprets, in export order.
pub const DECLARED_COLUMNS: [&str; 9] = [
    "work_year",
    "experience_level",
    "employment_type",
    "job_title",
    "salary_in_usd",
    "employee_residence",
    "remote_ratio",
    "company_location",
    "company_size",
];

/// Name of the derived US / rest-of-world column.
pub const REGION_COLUMN: &str = "is_us";

/// A single job-salary observation.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRecord {
    pub work_year: i32,
    /// `None` when the source code had no known label.
    pub experience_level: Option<ExperienceLevel>,
    pub employment_type: String,
    pub job_title: String,
    pub salary_in_usd: f64,
    pub employee_residence: String,
    pub remote_ratio: i32,
    pub company_location: String,
    /// `None` when the source code had no known label.
    pub company_size: Option<CompanySize>,
    pub region: Region,
    /// Columns not listed in [`DECLARED_COLUMNS`]: column_name → value.
    pub extra: BTreeMap<String, CellValue>,
}

impl SalaryRecord {
    /// Value of a numeric column by name, core or pass-through.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "work_year" => Some(f64::from(self.work_year)),
            "salary_in_usd" => Some(self.salary_in_usd),
            "remote_ratio" => Some(f64::from(self.remote_ratio)),
            other => self
                .extra
                .get(other)
                .and_then(CellValue::as_f64)
                .filter(|v| v.is_finite()),
        }
    }
}

// ---------------------------------------------------------------------------
// SalaryDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryDataset {
    /// All records (rows), in file order.
    pub records: Vec<SalaryRecord>,
    /// Pass-through column names, in the order they appeared in the source.
    pub extra_columns: Vec<String>,
    /// Numeric columns usable for correlation and descriptive statistics.
    pub numeric_columns: Vec<String>,
    /// Sorted set of distinct job titles.
    pub job_titles: BTreeSet<String>,
}

impl SalaryDataset {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<SalaryRecord>, extra_columns: Vec<String>) -> Self {
        let job_titles = records.iter().map(|r| r.job_title.clone()).collect();

        let mut numeric_columns: Vec<String> = ["work_year", "salary_in_usd", "remote_ratio"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        for col in &extra_columns {
            let mut seen_number = false;
            let all_numeric = records.iter().all(|r| match r.extra.get(col) {
                None | Some(CellValue::Null) => true,
                Some(v) => {
                    let numeric = v.as_f64().is_some();
                    seen_number |= numeric;
                    numeric
                }
            });
            if all_numeric && seen_number {
                numeric_columns.push(col.clone());
            }
        }

        SalaryDataset {
            records,
            extra_columns,
            numeric_columns,
            job_titles,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(min, max)` of `salary_in_usd`, the bounds of the salary range control.
    pub fn salary_bounds(&self) -> Option<(f64, f64)> {
        self.records.iter().map(|r| r.salary_in_usd).fold(None, |acc, s| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })
    }
}
