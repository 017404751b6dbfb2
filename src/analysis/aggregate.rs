use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::stats::{self, FiveNumber};
use crate::data::filter::FilteredView;
use crate::data::model::{label_or_empty, CompanySize, ExperienceLevel, SalaryRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an aggregation produced no figure. Never fatal: each variant is
/// shown as a placeholder in place of the chart.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    #[error("no records match the current filters")]
    EmptySubset,
    #[error("need at least two numeric columns, found {found}")]
    TooFewNumericColumns { found: usize },
    #[error("need at least two records, found {found}")]
    TooFewRows { found: usize },
    #[error("median salary for '{job_title}' is zero")]
    ZeroMedian { job_title: String },
    #[error("no records for job title '{0}'")]
    UnknownJobTitle(String),
}

impl AggregateError {
    /// Degenerate input as opposed to an empty selection.
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, AggregateError::EmptySubset)
    }
}

pub type AggResult<T> = Result<T, AggregateError>;

fn non_empty(view: &FilteredView<'_>) -> AggResult<()> {
    if view.is_empty() {
        Err(AggregateError::EmptySubset)
    } else {
        Ok(())
    }
}

/// Bucket salaries by an ordered key.
fn salaries_by<'a, K: Ord>(
    records: impl Iterator<Item = &'a SalaryRecord>,
    mut key: impl FnMut(&SalaryRecord) -> Option<K>,
) -> BTreeMap<K, Vec<f64>> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for r in records {
        if let Some(k) = key(r) {
            groups.entry(k).or_default().push(r.salary_in_usd);
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Headline figures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalarySummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

pub fn record_count(view: &FilteredView<'_>) -> usize {
    view.len()
}

pub fn salary_summary(view: &FilteredView<'_>) -> AggResult<SalarySummary> {
    let salaries: Vec<f64> = view.records().map(|r| r.salary_in_usd).collect();
    let spread = stats::five_number(&salaries).ok_or(AggregateError::EmptySubset)?;
    let mean = stats::mean(&salaries).ok_or(AggregateError::EmptySubset)?;
    Ok(SalarySummary {
        count: salaries.len(),
        mean,
        median: spread.median,
        min: spread.min,
        max: spread.max,
    })
}

// ---------------------------------------------------------------------------
// Median by (experience level, company size)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMedian {
    pub experience_level: ExperienceLevel,
    pub company_size: CompanySize,
    pub median: f64,
    pub count: usize,
}

pub fn group_medians(view: &FilteredView<'_>) -> AggResult<Vec<GroupMedian>> {
    non_empty(view)?;
    let groups = salaries_by(view.records(), |r| {
        Some((r.experience_level?, r.company_size?))
    });
    Ok(groups
        .into_iter()
        .filter_map(|((experience_level, company_size), salaries)| {
            Some(GroupMedian {
                experience_level,
                company_size,
                median: stats::median(&salaries)?,
                count: salaries.len(),
            })
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Correlation between numeric columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` is `None` when the pair has too few observations or a
    /// column is constant.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pearson correlation over every numeric column of the dataset.
pub fn correlation_matrix(view: &FilteredView<'_>) -> AggResult<CorrelationMatrix> {
    correlation_over(view, &view.dataset().numeric_columns)
}

/// Pearson correlation over the named columns, using pairwise-complete rows.
pub fn correlation_over(
    view: &FilteredView<'_>,
    columns: &[String],
) -> AggResult<CorrelationMatrix> {
    non_empty(view)?;
    if columns.len() < 2 {
        return Err(AggregateError::TooFewNumericColumns {
            found: columns.len(),
        });
    }
    if view.len() < 2 {
        return Err(AggregateError::TooFewRows { found: view.len() });
    }

    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| view.records().map(|r| r.numeric(c)).collect())
        .collect();

    let values = (0..columns.len())
        .map(|i| {
            (0..columns.len())
                .map(|j| {
                    let (xs, ys): (Vec<f64>, Vec<f64>) = data[i]
                        .iter()
                        .zip(&data[j])
                        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                        .unzip();
                    stats::pearson(&xs, &ys)
                })
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

// ---------------------------------------------------------------------------
// Most frequent job titles and their salary evolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCount {
    pub job_title: String,
    pub count: usize,
}

/// The `n` most frequent job titles, ties broken alphabetically.
pub fn top_job_titles(view: &FilteredView<'_>, n: usize) -> AggResult<Vec<TitleCount>> {
    non_empty(view)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in view.records() {
        *counts.entry(r.job_title.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<TitleCount> = counts
        .into_iter()
        .map(|(t, count)| TitleCount {
            job_title: t.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.job_title.cmp(&b.job_title)));
    ranked.truncate(n);
    Ok(ranked)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearMean {
    pub work_year: i32,
    pub mean_salary: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleTrend {
    pub job_title: String,
    /// Ascending by year.
    pub points: Vec<YearMean>,
}

/// Mean salary per year for each of the `n` most frequent titles, in rank order.
pub fn title_trends(view: &FilteredView<'_>, n: usize) -> AggResult<Vec<TitleTrend>> {
    let top = top_job_titles(view, n)?;
    let mut by_title_year = salaries_by(view.records(), |r| {
        top.iter()
            .any(|t| t.job_title == r.job_title)
            .then(|| (r.job_title.clone(), r.work_year))
    });

    Ok(top
        .into_iter()
        .map(|t| {
            let keys: Vec<(String, i32)> = by_title_year
                .range((t.job_title.clone(), i32::MIN)..=(t.job_title.clone(), i32::MAX))
                .map(|(k, _)| k.clone())
                .collect();
            let points = keys
                .into_iter()
                .filter_map(|key| {
                    let salaries = by_title_year.remove(&key)?;
                    Some(YearMean {
                        work_year: key.1,
                        mean_salary: stats::mean(&salaries)?,
                    })
                })
                .collect();
            TitleTrend {
                job_title: t.job_title,
                points,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Per-location deviation from a title's median
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDeviation {
    pub company_location: String,
    pub mean_salary: f64,
    pub count: usize,
    /// `(location_mean − median) / median × 100`; degenerate when the median is zero.
    pub diff_percent: AggResult<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleDeviation {
    pub job_title: String,
    pub median_salary: f64,
    /// Sorted by location code.
    pub locations: Vec<LocationDeviation>,
}

pub fn location_deviation(view: &FilteredView<'_>, job_title: &str) -> AggResult<TitleDeviation> {
    non_empty(view)?;
    let title_view = view.retain_where(|r| r.job_title == job_title);
    let salaries: Vec<f64> = title_view.records().map(|r| r.salary_in_usd).collect();
    let median_salary = stats::median(&salaries)
        .ok_or_else(|| AggregateError::UnknownJobTitle(job_title.to_string()))?;

    if median_salary == 0.0 {
        log::warn!("Median salary for '{job_title}' is zero; deviations are undefined");
    }

    let locations = salaries_by(title_view.records(), |r| Some(r.company_location.clone()))
        .into_iter()
        .filter_map(|(company_location, salaries)| {
            let mean_salary = stats::mean(&salaries)?;
            let diff_percent = if median_salary == 0.0 {
                Err(AggregateError::ZeroMedian {
                    job_title: job_title.to_string(),
                })
            } else {
                Ok((mean_salary - median_salary) / median_salary * 100.0)
            };
            Some(LocationDeviation {
                company_location,
                mean_salary,
                count: salaries.len(),
                diff_percent,
            })
        })
        .collect();

    Ok(TitleDeviation {
        job_title: job_title.to_string(),
        median_salary,
        locations,
    })
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Absent with fewer than two values.
    pub std: Option<f64>,
    pub spread: FiveNumber,
}

/// `count / mean / std / min / quartiles / max` per numeric column.
pub fn describe(view: &FilteredView<'_>) -> AggResult<Vec<ColumnSummary>> {
    non_empty(view)?;
    Ok(view
        .dataset()
        .numeric_columns
        .iter()
        .filter_map(|col| {
            let values: Vec<f64> = view.records().filter_map(|r| r.numeric(col)).collect();
            Some(ColumnSummary {
                column: col.clone(),
                count: values.len(),
                mean: stats::mean(&values)?,
                std: stats::std_dev(&values),
                spread: stats::five_number(&values)?,
            })
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Mean salary by a selectable category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    ExperienceLevel,
    EmploymentType,
    JobTitle,
    CompanyLocation,
    CompanySize,
    Region,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::ExperienceLevel,
        Category::EmploymentType,
        Category::JobTitle,
        Category::CompanyLocation,
        Category::CompanySize,
        Category::Region,
    ];

    /// Source column name.
    pub fn column(self) -> &'static str {
        match self {
            Category::ExperienceLevel => "experience_level",
            Category::EmploymentType => "employment_type",
            Category::JobTitle => "job_title",
            Category::CompanyLocation => "company_location",
            Category::CompanySize => "company_size",
            Category::Region => "is_us",
        }
    }

    pub fn key(self, r: &SalaryRecord) -> String {
        match self {
            Category::ExperienceLevel => label_or_empty(r.experience_level),
            Category::EmploymentType => r.employment_type.clone(),
            Category::JobTitle => r.job_title.clone(),
            Category::CompanyLocation => r.company_location.clone(),
            Category::CompanySize => label_or_empty(r.company_size),
            Category::Region => r.region.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMean {
    pub label: String,
    pub mean_salary: f64,
    pub count: usize,
}

/// Mean salary per category value, highest first.
pub fn mean_by_category(
    view: &FilteredView<'_>,
    category: Category,
) -> AggResult<Vec<CategoryMean>> {
    non_empty(view)?;
    let mut means: Vec<CategoryMean> = salaries_by(view.records(), |r| Some(category.key(r)))
        .into_iter()
        .filter_map(|(label, salaries)| {
            Some(CategoryMean {
                label,
                mean_salary: stats::mean(&salaries)?,
                count: salaries.len(),
            })
        })
        .collect();
    means.sort_by(|a, b| b.mean_salary.total_cmp(&a.mean_salary));
    Ok(means)
}

// ---------------------------------------------------------------------------
// Salary distribution inside one country
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionGroup {
    pub job_title: String,
    pub experience_level: Option<ExperienceLevel>,
    pub spread: FiveNumber,
    pub count: usize,
}

/// Box statistics of salary per (job title, experience level) for records
/// whose company is in `location`.
pub fn salary_distribution(
    view: &FilteredView<'_>,
    location: &str,
) -> AggResult<Vec<DistributionGroup>> {
    let local = view.retain_where(|r| r.company_location == location);
    non_empty(&local)?;
    Ok(
        salaries_by(local.records(), |r| Some((r.job_title.clone(), r.experience_level)))
            .into_iter()
            .filter_map(|((job_title, experience_level), salaries)| {
                Some(DistributionGroup {
                    job_title,
                    experience_level,
                    spread: stats::five_number(&salaries)?,
                    count: salaries.len(),
                })
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Remote work impact by country
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteImpact {
    pub company_location: String,
    pub remote_ratio: i32,
    pub mean_salary: f64,
    pub count: usize,
}

/// Mean salary per remote ratio within the `top_locations` busiest countries.
pub fn remote_impact(
    view: &FilteredView<'_>,
    top_locations: usize,
) -> AggResult<Vec<RemoteImpact>> {
    non_empty(view)?;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in view.records() {
        *counts.entry(r.company_location.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(top_locations);

    Ok(salaries_by(view.records(), |r| {
        ranked
            .iter()
            .any(|(loc, _)| *loc == r.company_location)
            .then(|| (r.company_location.clone(), r.remote_ratio))
    })
    .into_iter()
    .filter_map(|((company_location, remote_ratio), salaries)| {
        Some(RemoteImpact {
            company_location,
            remote_ratio,
            mean_salary: stats::mean(&salaries)?,
            count: salaries.len(),
        })
    })
    .collect())
}
