use std::path::{Path, PathBuf};
use std::sync::Arc;

use salary_lens::analysis::aggregate::Category;
use salary_lens::config::DashboardConfig;
use salary_lens::data::filter::FilteredView;
use salary_lens::data::loader::{DatasetLoader, LoadError};
use salary_lens::data::model::{CompanySize, ExperienceLevel, SalaryDataset};
use salary_lens::export::{self, ExportError};
use salary_lens::report::{self, DashboardView, ViewRequest};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Owns the memoized dataset.
    pub loader: DatasetLoader,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<SalaryDataset>>,

    /// Current widget selections.
    pub request: Option<ViewRequest>,

    /// Sections computed for `request` (cached until the request changes).
    pub view: Option<DashboardView>,

    /// Series colours per experience level, shared by several charts.
    pub level_colors: ColorMap,

    /// Whether the data preview table is shown.
    pub show_preview: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            loader: DatasetLoader::new(config.dataset_path.clone()),
            config,
            dataset: None,
            request: None,
            view: None,
            level_colors: ColorMap::new(ExperienceLevel::ALL.iter().map(|l| l.label())),
            show_preview: false,
            status_message: None,
        }
    }

    /// Fetch the dataset through the loader cache.
    pub fn load(&mut self) {
        let result = self.loader.get();
        self.apply_load(result);
    }

    /// Force a re-read of the current file.
    pub fn reload(&mut self) {
        let result = self.loader.reload();
        self.apply_load(result);
    }

    /// Switch to another file and load it.
    pub fn open_path(&mut self, path: PathBuf) {
        self.loader.set_path(path);
        self.load();
    }

    fn apply_load(&mut self, result: Result<Arc<SalaryDataset>, LoadError>) {
        match result {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e}", self.loader.path().display());
                self.status_message = Some(describe_load_error(&e, self.loader.path()));
                self.dataset = None;
                self.request = None;
                self.view = None;
            }
        }
    }

    /// Ingest a newly loaded dataset, reset selections and compute sections.
    pub fn set_dataset(&mut self, dataset: Arc<SalaryDataset>) {
        self.request = Some(ViewRequest::initial(&dataset, &self.config));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.rerender();
    }

    /// Recompute every section for the current request.
    pub fn rerender(&mut self) {
        self.view = match (&self.dataset, &self.request) {
            (Some(ds), Some(req)) => Some(report::render(ds, req)),
            _ => None,
        };
    }

    /// Replace the request, recomputing only when something changed.
    pub fn update_request(&mut self, request: ViewRequest) {
        if self.request.as_ref() != Some(&request) {
            self.request = Some(request);
            self.rerender();
        }
    }

    fn edit_request(&mut self, edit: impl FnOnce(&mut ViewRequest)) {
        if let Some(mut req) = self.request.clone() {
            edit(&mut req);
            self.update_request(req);
        }
    }

    pub fn set_salary_range(&mut self, min: f64, max: f64) {
        self.edit_request(|r| {
            r.criteria.salary_min = min.min(max);
            r.criteria.salary_max = max.max(min);
        });
    }

    /// Toggle a single experience level in the filter.
    pub fn toggle_experience(&mut self, level: ExperienceLevel) {
        self.edit_request(|r| {
            let set = &mut r.criteria.experience_levels;
            if !set.remove(&level) {
                set.insert(level);
            }
        });
    }

    /// Toggle a single company size in the filter.
    pub fn toggle_company_size(&mut self, size: CompanySize) {
        self.edit_request(|r| {
            let set = &mut r.criteria.company_sizes;
            if !set.remove(&size) {
                set.insert(size);
            }
        });
    }

    pub fn set_category(&mut self, category: Category) {
        self.edit_request(|r| r.category = category);
    }

    pub fn set_job_title(&mut self, job_title: String) {
        self.edit_request(|r| r.job_title = Some(job_title));
    }

    /// Write the current selection to `path`.
    pub fn export_to(&mut self, path: &Path) -> Result<usize, ExportError> {
        let (Some(ds), Some(req)) = (&self.dataset, &self.request) else {
            return Ok(0);
        };
        let view = FilteredView::new(ds, &req.criteria);
        let result = export::export_to_path(&view, path);
        self.status_message = match &result {
            Ok(rows) => Some(format!("Exported {rows} rows to {}", path.display())),
            Err(e) => Some(format!("Export failed: {e}")),
        };
        result
    }
}

/// User-facing message per failure kind.
fn describe_load_error(err: &LoadError, path: &Path) -> String {
    match err {
        LoadError::NotFound(_) => format!(
            "Data unavailable: {} was not found. Use File → Open… to pick a dataset.",
            path.display()
        ),
        LoadError::Empty(_) => format!("Data unavailable: {} has no records.", path.display()),
        e if e.is_unavailable() => {
            format!("Data unavailable: could not read {}: {e}", path.display())
        }
        other => format!("Could not parse {}: {other}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "work_year,experience_level,employment_type,job_title,salary_in_usd,employee_residence,remote_ratio,company_location,company_size\n\
        2023,EN,FT,Data Analyst,50000,US,0,US,S\n\
        2023,MI,FT,Data Scientist,80000,FR,50,FR,M\n\
        2023,SE,FT,Data Scientist,120000,US,100,US,L\n\
        2022,EX,FT,Director,200000,US,100,US,L\n";

    fn loaded_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ds.csv");
        std::fs::write(&path, CSV).unwrap();
        let config = DashboardConfig {
            dataset_path: path,
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load();
        (dir, state)
    }

    #[test]
    fn load_populates_view() {
        let (_dir, state) = loaded_state();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.total_records, 4);
        assert_eq!(view.visible_count(), 4);
        assert_eq!(
            state.request.as_ref().unwrap().job_title.as_deref(),
            Some("Data Scientist")
        );
    }

    #[test]
    fn filter_changes_rerender() {
        let (_dir, mut state) = loaded_state();
        state.set_salary_range(60_000.0, 150_000.0);
        assert_eq!(state.view.as_ref().unwrap().visible_indices, vec![1, 2]);

        state.toggle_company_size(CompanySize::Large);
        assert_eq!(state.view.as_ref().unwrap().visible_indices, vec![1]);
        state.toggle_company_size(CompanySize::Large);
        assert_eq!(state.view.as_ref().unwrap().visible_count(), 2);
    }

    #[test]
    fn missing_file_shows_message() {
        let config = DashboardConfig {
            dataset_path: PathBuf::from("no/such/file.csv"),
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load();
        assert!(state.view.is_none());
        assert!(state.status_message.unwrap().starts_with("Data unavailable"));
    }

    #[test]
    fn unreadable_file_is_unavailable_not_malformed() {
        let dir = tempfile::TempDir::new().unwrap();
        let folder = dir.path().join("folder.json");
        std::fs::create_dir(&folder).unwrap();
        let config = DashboardConfig {
            dataset_path: folder,
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load();
        let message = state.status_message.unwrap();
        assert!(message.starts_with("Data unavailable: could not read"), "{message}");
    }

    #[test]
    fn export_writes_selection() {
        let (dir, mut state) = loaded_state();
        state.toggle_experience(ExperienceLevel::Executive);
        let out = dir.path().join("out.csv");
        assert_eq!(state.export_to(&out).unwrap(), 3);
    }
}
