/// End-to-end tests for the load → filter → aggregate → export pipeline.
///
/// Every test writes a real file into a `TempDir`, loads it through the
/// public loader and drives the same functions the dashboard calls.
use std::fs;
use std::path::{Path, PathBuf};

use salary_lens::analysis::aggregate::{self, AggregateError};
use salary_lens::config::DashboardConfig;
use salary_lens::data::filter::{FilterCriteria, FilteredView};
use salary_lens::data::loader::{load_file, LoadError};
use salary_lens::data::model::{CompanySize, ExperienceLevel, Region, SalaryDataset};
use salary_lens::export;
use salary_lens::report::{render, ViewRequest};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

const HEADER: &str = "work_year,experience_level,employment_type,job_title,salary,salary_currency,salary_in_usd,employee_residence,remote_ratio,company_location,company_size";

/// Eight rows across three countries, every level and size represented.
const ROWS: &str = "\
2023,SE,FT,Data Scientist,150000,USD,150000,US,100,US,L
2023,MI,FT,Data Scientist,90000,EUR,97000,FR,50,FR,M
2022,EN,FT,Data Analyst,45000,EUR,48500,FR,0,FR,S
2023,EX,FT,Data Science Manager,240000,USD,240000,US,100,US,L
2021,MI,CT,Data Engineer,110000,USD,110000,US,0,US,M
2022,SE,FT,Data Scientist,130000,USD,130000,US,0,US,M
2023,SE,FT,Data Engineer,70000,GBP,86000,GB,100,GB,L
2022,XX,FT,Data Analyst,60000,USD,60000,US,0,US,Q
";

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn load_sample(dir: &TempDir) -> SalaryDataset {
    let path = write_file(dir, "ds_salaries.csv", &format!("{HEADER}\n{ROWS}"));
    load_file(&path).unwrap()
}

fn salaries(view: &FilteredView<'_>) -> Vec<f64> {
    view.records().map(|r| r.salary_in_usd).collect()
}

// ── Loading ──────────────────────────────────────────────────────────────────

#[test]
fn loading_twice_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "ds.csv", &format!("{HEADER}\n{ROWS}"));
    let a = load_file(&path).unwrap();
    let b = load_file(&path).unwrap();
    assert_eq!(a.len(), 8);
    assert_eq!(a, b);
}

#[test]
fn location_drives_region() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(
        &tmp,
        "ds.csv",
        &format!(
            "{HEADER}\n\
             2023,SE,FT,A,1,USD,1,US,0,US,M\n\
             2023,SE,FT,A,1,USD,1,US,0,US,M\n\
             2023,SE,FT,A,1,EUR,1,FR,0,FR,M\n"
        ),
    );
    let ds = load_file(&path).unwrap();
    let regions: Vec<&str> = ds.records.iter().map(|r| r.region.label()).collect();
    assert_eq!(regions, ["USA", "USA", "Rest of World"]);
}

#[test]
fn load_errors_are_distinguished() {
    let tmp = TempDir::new().unwrap();

    let missing = load_file(&tmp.path().join("absent.csv")).unwrap_err();
    assert!(matches!(missing, LoadError::NotFound(_)));
    assert!(missing.is_unavailable());

    let header_only = write_file(&tmp, "empty.csv", &format!("{HEADER}\n"));
    let empty = load_file(&header_only).unwrap_err();
    assert!(matches!(empty, LoadError::Empty(_)));

    let zero_bytes = write_file(&tmp, "zero.csv", "");
    assert!(load_file(&zero_bytes).unwrap_err().is_unavailable());

    let bad = write_file(
        &tmp,
        "bad.csv",
        &format!("{HEADER}\n2023,SE,FT,A,1,USD,lots,US,0,US,M\n"),
    );
    let parse = load_file(&bad).unwrap_err();
    assert!(matches!(parse, LoadError::InvalidValue { .. }));
    assert!(!parse.is_unavailable());

    let txt = write_file(&tmp, "ds.txt", "whatever");
    assert!(matches!(load_file(&txt), Err(LoadError::UnsupportedFormat(_))));
}

#[test]
fn json_records_load_like_csv() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(
        &tmp,
        "ds.json",
        r#"[
            {"work_year": 2023, "experience_level": "SE", "employment_type": "FT",
             "job_title": "Data Scientist", "salary_in_usd": 150000, "employee_residence": "US",
             "remote_ratio": 100, "company_location": "US", "company_size": "L", "salary_currency": "USD"},
            {"work_year": 2022, "experience_level": "EN", "employment_type": "FT",
             "job_title": "Data Analyst", "salary_in_usd": 48500.5, "employee_residence": "FR",
             "remote_ratio": 0, "company_location": "FR", "company_size": "S", "salary_currency": "EUR"}
        ]"#,
    );
    let ds = load_file(&path).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records[1].salary_in_usd, 48_500.5);
    assert_eq!(ds.records[1].experience_level, Some(ExperienceLevel::Entry));
    assert_eq!(ds.records[1].region, Region::RestOfWorld);
    assert_eq!(ds.extra_columns, vec!["salary_currency"]);
}

#[test]
fn parquet_table_loads() {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    let text = |v: [&str; 2]| -> ArrayRef { Arc::new(StringArray::from(v.to_vec())) };
    let int = |v: [i64; 2]| -> ArrayRef { Arc::new(Int64Array::from(v.to_vec())) };
    let columns = [
        ("work_year", DataType::Int64, int([2022, 2023])),
        ("experience_level", DataType::Utf8, text(["MI", "SE"])),
        ("employment_type", DataType::Utf8, text(["FT", "FT"])),
        ("job_title", DataType::Utf8, text(["Data Engineer", "Data Scientist"])),
        ("salary_in_usd", DataType::Int64, int([100_000, 140_000])),
        ("employee_residence", DataType::Utf8, text(["DE", "US"])),
        ("remote_ratio", DataType::Int64, int([50, 0])),
        ("company_location", DataType::Utf8, text(["DE", "US"])),
        ("company_size", DataType::Utf8, text(["M", "L"])),
    ];
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, ty, _)| Field::new(*name, ty.clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.iter().map(|(_, _, arr)| arr.clone()).collect(),
    )
    .unwrap();

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ds.parquet");
    let mut writer = ArrowWriter::try_new(fs::File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load_file(&path).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records[0].company_size, Some(CompanySize::Medium));
    assert_eq!(ds.records[1].salary_in_usd, 140_000.0);
    assert_eq!(ds.records[1].region, Region::Usa);
}

#[test]
fn bundled_dataset_loads_and_renders() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/ds_salaries.csv");
    let ds = load_file(&path).unwrap();
    assert!(!ds.is_empty());

    let config = DashboardConfig::default();
    let request = ViewRequest::initial(&ds, &config);
    let view = render(&ds, &request);
    assert_eq!(view.visible_count(), ds.len());
    assert!(view.summary.is_ok());
    assert!(view.correlation.is_ok());
}

// ── Filtering ────────────────────────────────────────────────────────────────

#[test]
fn filtered_view_satisfies_every_predicate() {
    let tmp = TempDir::new().unwrap();
    let ds = load_sample(&tmp);

    let mut criteria = FilterCriteria::all(&ds);
    criteria.salary_min = 50_000.0;
    criteria.salary_max = 150_000.0;
    criteria.experience_levels = [ExperienceLevel::Mid, ExperienceLevel::Senior].into();
    criteria.company_sizes = [CompanySize::Medium, CompanySize::Large].into();

    let view = FilteredView::new(&ds, &criteria);
    assert_eq!(view.indices(), &[0, 1, 4, 5, 6]);
    for r in view.records() {
        assert!(criteria.experience_levels.contains(&r.experience_level.unwrap()));
        assert!(criteria.company_sizes.contains(&r.company_size.unwrap()));
        assert!((criteria.salary_min..=criteria.salary_max).contains(&r.salary_in_usd));
    }
    assert!(view.indices().windows(2).all(|w| w[0] < w[1]));

    let again = view.refine(&criteria);
    assert_eq!(again.indices(), view.indices());
}

#[test]
fn unmapped_codes_are_excluded_by_any_criteria() {
    let tmp = TempDir::new().unwrap();
    let ds = load_sample(&tmp);
    let view = FilteredView::new(&ds, &FilterCriteria::all(&ds));
    assert_eq!(view.len(), 7);
    assert!(!view.indices().contains(&7));
}

#[test]
fn salary_range_example() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(
        &tmp,
        "ds.csv",
        &format!(
            "{HEADER}\n\
             2023,SE,FT,A,1,USD,50000,US,0,US,M\n\
             2023,SE,FT,A,1,USD,80000,US,0,US,M\n\
             2023,SE,FT,A,1,USD,120000,US,0,US,M\n\
             2023,SE,FT,A,1,USD,200000,US,0,US,M\n"
        ),
    );
    let ds = load_file(&path).unwrap();
    let mut criteria = FilterCriteria::all(&ds);
    criteria.salary_min = 60_000.0;
    criteria.salary_max = 150_000.0;
    let view = FilteredView::new(&ds, &criteria);

    assert_eq!(salaries(&view), vec![80_000.0, 120_000.0]);
    let summary = aggregate::salary_summary(&view).unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.mean, 100_000.0);
    assert_eq!(summary.median, 100_000.0);
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[test]
fn empty_selection_renders_no_sections() {
    let tmp = TempDir::new().unwrap();
    let ds = load_sample(&tmp);
    let mut request = ViewRequest::initial(&ds, &DashboardConfig::default());
    request.criteria.salary_min = 1_000_000.0;
    request.criteria.salary_max = 2_000_000.0;

    let view = render(&ds, &request);
    assert_eq!(view.visible_count(), 0);
    assert_eq!(view.summary, Err(AggregateError::EmptySubset));
    assert_eq!(view.sections_with_data(), 0);
    assert_eq!(view.total_records, 8);
}

#[test]
fn full_selection_renders_every_section() {
    let tmp = TempDir::new().unwrap();
    let ds = load_sample(&tmp);
    let request = ViewRequest::initial(&ds, &DashboardConfig::default());
    assert_eq!(request.job_title.as_deref(), Some("Data Scientist"));

    let view = render(&ds, &request);
    assert_eq!(view.visible_count(), 7);
    assert_eq!(view.sections_with_data(), 8);

    let deviation = view.deviation.unwrap().unwrap();
    assert_eq!(deviation.median_salary, 130_000.0);
    let fr = deviation
        .locations
        .iter()
        .find(|l| l.company_location == "FR")
        .unwrap();
    let diff = fr.diff_percent.clone().unwrap();
    assert!((diff - (97_000.0 - 130_000.0) / 130_000.0 * 100.0).abs() < 1e-9);
}

#[test]
fn zero_median_title_is_degenerate_everywhere() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(
        &tmp,
        "ds.csv",
        &format!(
            "{HEADER}\n\
             2023,EN,FT,Volunteer,0,USD,0,US,0,US,S\n\
             2023,EN,FT,Volunteer,0,EUR,0,FR,0,FR,S\n\
             2023,EN,FT,Volunteer,10,EUR,10,DE,0,DE,S\n"
        ),
    );
    let ds = load_file(&path).unwrap();
    let view = FilteredView::everything(&ds);
    let dev = aggregate::location_deviation(&view, "Volunteer").unwrap();
    assert_eq!(dev.locations.len(), 3);
    assert!(dev
        .locations
        .iter()
        .all(|l| l.diff_percent.as_ref().is_err_and(|e| e.is_degenerate())));
}

// ── Export ───────────────────────────────────────────────────────────────────

#[test]
fn export_round_trips_through_loader() {
    let tmp = TempDir::new().unwrap();
    let ds = load_sample(&tmp);
    let mut criteria = FilterCriteria::all(&ds);
    criteria.company_sizes.remove(&CompanySize::Small);
    let view = FilteredView::new(&ds, &criteria);

    let out = tmp.path().join(export::EXPORT_FILE_NAME);
    let written = export::export_to_path(&view, &out).unwrap();
    assert_eq!(written, view.len());

    let reloaded = load_file(&out).unwrap();
    assert_eq!(reloaded.len(), view.len());
    assert_eq!(reloaded.extra_columns, ds.extra_columns);
    for (a, b) in reloaded.records.iter().zip(view.records()) {
        assert_eq!(a, b);
    }

    let text = fs::read_to_string(&out).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.ends_with(",is_us"));
}

#[test]
fn missing_markers_in_pass_through_column_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(
        &tmp,
        "bonus.csv",
        "work_year,experience_level,employment_type,job_title,salary_in_usd,employee_residence,remote_ratio,company_location,company_size,bonus\n\
         2023,SE,FT,Data Scientist,100000,US,0,US,L,1\n\
         2023,MI,FT,Data Scientist,80000,US,0,US,M,NaN\n\
         2022,EN,FT,Data Analyst,50000,FR,50,FR,S,3\n",
    );
    let ds = load_file(&path).unwrap();
    assert!(ds.numeric_columns.contains(&"bonus".to_string()));

    let view = FilteredView::everything(&ds);
    let bonus = aggregate::describe(&view)
        .unwrap()
        .into_iter()
        .find(|c| c.column == "bonus")
        .unwrap();
    assert_eq!(bonus.count, 2);
    assert_eq!(bonus.mean, 2.0);
    assert!(bonus.std.is_some_and(f64::is_finite));

    let matrix = aggregate::correlation_matrix(&view).unwrap();
    for value in matrix.values.iter().flatten().flatten() {
        assert!(value.is_finite());
    }
    let r = matrix.get("bonus", "salary_in_usd").unwrap();
    assert!((r + 1.0).abs() < 1e-9, "r = {r}");
}

#[test]
fn whole_float_pass_through_survives_export() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(
        &tmp,
        "bonus.csv",
        "work_year,experience_level,employment_type,job_title,salary_in_usd,employee_residence,remote_ratio,company_location,company_size,bonus\n\
         2023,SE,FT,Data Scientist,100000,US,0,US,L,1.0\n\
         2023,MI,FT,Data Engineer,80000,GB,100,GB,M,2.5\n",
    );
    let ds = load_file(&path).unwrap();
    let view = FilteredView::everything(&ds);
    let out = tmp.path().join(export::EXPORT_FILE_NAME);
    export::export_to_path(&view, &out).unwrap();

    let reloaded = load_file(&out).unwrap();
    assert_eq!(reloaded.records, ds.records);
    let report = render(&ds, &ViewRequest::initial(&ds, &DashboardConfig::default()));
    assert_eq!(report.visible_count(), 2);
}
