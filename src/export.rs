//! Delimited export of a filtered view.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::data::filter::FilteredView;
use crate::data::model::{label_or_empty, DECLARED_COLUMNS, REGION_COLUMN};

/// File name offered when saving the current selection.
pub const EXPORT_FILE_NAME: &str = "filtered_salaries.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("writing export: {0}")]
    Io(#[from] io::Error),
    #[error("encoding CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Header written for a view: declared columns, pass-through columns, then `is_us`.
pub fn export_header(view: &FilteredView<'_>) -> Vec<String> {
    DECLARED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(view.dataset().extra_columns.iter().cloned())
        .chain(std::iter::once(REGION_COLUMN.to_string()))
        .collect()
}

/// Write the view as UTF-8 CSV with display labels for categorical codes.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(view: &FilteredView<'_>, out: W) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(export_header(view))?;

    let extras = &view.dataset().extra_columns;
    let mut rows = 0;
    for r in view.records() {
        let mut fields = vec![
            r.work_year.to_string(),
            label_or_empty(r.experience_level),
            r.employment_type.clone(),
            r.job_title.clone(),
            r.salary_in_usd.to_string(),
            r.employee_residence.clone(),
            r.remote_ratio.to_string(),
            r.company_location.clone(),
            label_or_empty(r.company_size),
        ];
        fields.extend(
            extras
                .iter()
                .map(|c| r.extra.get(c).map(|v| v.to_field()).unwrap_or_default()),
        );
        fields.push(r.region.label().to_string());
        writer.write_record(&fields)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

pub fn export_to_path(view: &FilteredView<'_>, path: &Path) -> Result<usize, ExportError> {
    let file = File::create(path)?;
    let rows = write_csv(view, io::BufWriter::new(file))?;
    log::info!("Exported {rows} records to {}", path.display());
    Ok(rows)
}
