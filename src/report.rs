//! Pure view-model construction: `render(dataset, request) → DashboardView`.
//!
//! Every section is computed independently so one degenerate aggregation
//! never hides the others. The UI only reads the result.

use crate::analysis::aggregate::{
    self, AggResult, Category, CategoryMean, ColumnSummary, CorrelationMatrix, DistributionGroup,
    GroupMedian, RemoteImpact, SalarySummary, TitleCount, TitleDeviation, TitleTrend,
};
use crate::config::DashboardConfig;
use crate::data::filter::{FilterCriteria, FilteredView};
use crate::data::model::SalaryDataset;

/// Everything besides the filter the dashboard lets the user pick.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub criteria: FilterCriteria,
    pub category: Category,
    /// Title for the per-location deviation section; `None` skips it.
    pub job_title: Option<String>,
    pub distribution_location: String,
    pub top_titles: usize,
    pub top_locations: usize,
}

impl ViewRequest {
    /// Defaults for a freshly loaded dataset: no filter, most common title.
    pub fn initial(dataset: &SalaryDataset, config: &DashboardConfig) -> Self {
        let view = FilteredView::everything(dataset);
        let job_title = aggregate::top_job_titles(&view, 1)
            .ok()
            .and_then(|t| t.into_iter().next())
            .map(|t| t.job_title);
        Self {
            criteria: FilterCriteria::all(dataset),
            category: Category::ExperienceLevel,
            job_title,
            distribution_location: config.distribution_location.clone(),
            top_titles: config.top_titles,
            top_locations: config.top_locations,
        }
    }
}

/// Computed contents of every dashboard section.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub total_records: usize,
    pub record_count: usize,
    pub visible_indices: Vec<usize>,
    pub summary: AggResult<SalarySummary>,
    pub describe: AggResult<Vec<ColumnSummary>>,
    pub distribution: AggResult<Vec<DistributionGroup>>,
    pub category_means: AggResult<Vec<CategoryMean>>,
    pub correlation: AggResult<CorrelationMatrix>,
    pub top_titles: AggResult<Vec<TitleCount>>,
    pub title_trends: AggResult<Vec<TitleTrend>>,
    pub group_medians: AggResult<Vec<GroupMedian>>,
    pub remote_impact: AggResult<Vec<RemoteImpact>>,
    pub deviation: Option<AggResult<TitleDeviation>>,
}

impl DashboardView {
    pub fn visible_count(&self) -> usize {
        self.record_count
    }

    /// Number of chart sections that have data to draw.
    pub fn sections_with_data(&self) -> usize {
        [
            self.describe.is_ok(),
            self.distribution.is_ok(),
            self.category_means.is_ok(),
            self.correlation.is_ok(),
            self.title_trends.is_ok(),
            self.group_medians.is_ok(),
            self.remote_impact.is_ok(),
            matches!(self.deviation, Some(Ok(_))),
        ]
        .into_iter()
        .filter(|ok| *ok)
        .count()
    }
}

pub fn render(dataset: &SalaryDataset, request: &ViewRequest) -> DashboardView {
    let view = FilteredView::new(dataset, &request.criteria);
    DashboardView {
        total_records: dataset.len(),
        record_count: aggregate::record_count(&view),
        visible_indices: view.indices().to_vec(),
        summary: aggregate::salary_summary(&view),
        describe: aggregate::describe(&view),
        distribution: aggregate::salary_distribution(&view, &request.distribution_location),
        category_means: aggregate::mean_by_category(&view, request.category),
        correlation: aggregate::correlation_matrix(&view),
        top_titles: aggregate::top_job_titles(&view, request.top_titles),
        title_trends: aggregate::title_trends(&view, request.top_titles),
        group_medians: aggregate::group_medians(&view),
        remote_impact: aggregate::remote_impact(&view, request.top_locations),
        deviation: request
            .job_title
            .as_deref()
            .map(|title| aggregate::location_deviation(&view, title)),
    }
}

/// Currency display rounded to whole dollars: `$1,234,567`.
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_is_grouped_and_rounded() {
        assert_eq!(format_usd(100_000.0), "$100,000");
        assert_eq!(format_usd(999.6), "$1,000");
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(-1_234_567.2), "-$1,234,567");
    }
}
