//! Write a synthetic salary table to `data/ds_salaries.csv` and
//! `data/ds_salaries.parquet`, with the same columns as the public
//! data-science salaries dataset.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One generated row, as it would appear in the source file.
struct Row {
    work_year: i64,
    experience_level: &'static str,
    employment_type: &'static str,
    job_title: &'static str,
    salary_in_usd: i64,
    employee_residence: &'static str,
    remote_ratio: i64,
    company_location: &'static str,
    company_size: &'static str,
}

fn generate(rng: &mut SimpleRng, n: usize) -> Vec<Row> {
    // (code, salary multiplier)
    let levels = [("EN", 0.6), ("MI", 0.85), ("SE", 1.15), ("EX", 1.6)];
    let sizes = [("S", 0.85), ("M", 1.0), ("L", 1.1)];
    let locations = [
        ("US", 1.0),
        ("US", 1.0),
        ("US", 1.0),
        ("GB", 0.7),
        ("FR", 0.6),
        ("DE", 0.68),
        ("CA", 0.8),
        ("IN", 0.3),
    ];
    let titles = [
        ("Data Scientist", 1.0),
        ("Data Engineer", 1.0),
        ("Data Analyst", 0.7),
        ("Machine Learning Engineer", 1.15),
        ("Research Scientist", 1.2),
        ("Analytics Engineer", 0.95),
        ("Data Architect", 1.2),
        ("Applied Scientist", 1.25),
        ("Data Science Manager", 1.3),
        ("ML Ops Engineer", 1.05),
        ("BI Developer", 0.75),
        ("Computer Vision Engineer", 1.1),
    ];
    let employment = ["FT", "FT", "FT", "FT", "CT", "PT", "FL"];
    let remote = [0, 0, 50, 100, 100];
    let years: [i64; 7] = [2020, 2021, 2022, 2022, 2023, 2023, 2023];

    (0..n)
        .map(|_| {
            let &(level, lm) = rng.pick(&levels);
            let &(size, sm) = rng.pick(&sizes);
            let &(location, cm) = rng.pick(&locations);
            let &(title, tm) = rng.pick(&titles);
            let &year = rng.pick(&years);
            let growth = 1.0 + 0.04 * (year - 2020) as f64;
            let noise = rng.gauss(0.0, 0.2).exp();
            let salary = 120_000.0 * lm * sm * cm * tm * growth * noise;
            Row {
                work_year: year,
                experience_level: level,
                employment_type: *rng.pick(&employment),
                job_title: title,
                salary_in_usd: salary.round().max(5_000.0) as i64,
                employee_residence: location,
                remote_ratio: *rng.pick(&remote),
                company_location: location,
                company_size: size,
            }
        })
        .collect()
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record([
        "work_year",
        "experience_level",
        "employment_type",
        "job_title",
        "salary_in_usd",
        "employee_residence",
        "remote_ratio",
        "company_location",
        "company_size",
    ])?;
    for r in rows {
        writer.write_record([
            r.work_year.to_string(),
            r.experience_level.to_string(),
            r.employment_type.to_string(),
            r.job_title.to_string(),
            r.salary_in_usd.to_string(),
            r.employee_residence.to_string(),
            r.remote_ratio.to_string(),
            r.company_location.to_string(),
            r.company_size.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let text = |f: fn(&Row) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&Row) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("work_year", DataType::Int64, false),
        Field::new("experience_level", DataType::Utf8, false),
        Field::new("employment_type", DataType::Utf8, false),
        Field::new("job_title", DataType::Utf8, false),
        Field::new("salary_in_usd", DataType::Int64, false),
        Field::new("employee_residence", DataType::Utf8, false),
        Field::new("remote_ratio", DataType::Int64, false),
        Field::new("company_location", DataType::Utf8, false),
        Field::new("company_size", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            int(|r| r.work_year),
            text(|r| r.experience_level),
            text(|r| r.employment_type),
            text(|r| r.job_title),
            int(|r| r.salary_in_usd),
            text(|r| r.employee_residence),
            int(|r| r.remote_ratio),
            text(|r| r.company_location),
            text(|r| r.company_size),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng, 1_500);

    std::fs::create_dir_all("data").context("creating data directory")?;
    write_csv(&rows, Path::new("data/ds_salaries.csv"))?;
    write_parquet(&rows, Path::new("data/ds_salaries.parquet"))?;

    log::info!("Wrote {} salary records to data/", rows.len());
    println!("Wrote {} salary records to data/ds_salaries.{{csv,parquet}}", rows.len());
    Ok(())
}
