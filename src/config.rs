use std::path::PathBuf;

use crate::export::EXPORT_FILE_NAME;

/// Relative path of the salary table read at startup.
pub const DEFAULT_DATASET_PATH: &str = "data/ds_salaries.csv";

/// Startup settings for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub dataset_path: PathBuf,
    /// Suggested name in the save dialog.
    pub export_file_name: String,
    /// How many of the most frequent job titles the trend chart follows.
    pub top_titles: usize,
    /// How many of the busiest countries the remote-work chart compares.
    pub top_locations: usize,
    /// Country code whose salary distribution is shown as box plots.
    pub distribution_location: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            export_file_name: EXPORT_FILE_NAME.to_string(),
            top_titles: 10,
            top_locations: 10,
            distribution_location: "FR".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Defaults, with the first positional argument overriding the dataset path.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = args.into_iter().nth(1) {
            config.dataset_path = PathBuf::from(path);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_argument_overrides_path() {
        let config =
            DashboardConfig::from_args(["salary-lens".to_string(), "other.csv".to_string()]);
        assert_eq!(config.dataset_path, PathBuf::from("other.csv"));
        assert_eq!(config.top_titles, 10);

        let config = DashboardConfig::from_args(["salary-lens".to_string()]);
        assert_eq!(config.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
    }
}
