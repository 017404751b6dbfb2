use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use salary_lens::analysis::aggregate::Category;
use salary_lens::data::model::{CompanySize, ExperienceLevel};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let (Some(dataset), Some(request)) = (state.dataset.clone(), state.request.clone()) else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Salary range ----
            ui.strong("Salary (USD)");
            let (lo, hi) = dataset.salary_bounds().unwrap_or((0.0, 0.0));
            let mut min = request.criteria.salary_min;
            let mut max = request.criteria.salary_max;
            let min_changed = ui
                .add(egui::Slider::new(&mut min, lo..=hi).text("min"))
                .changed();
            let max_changed = ui
                .add(egui::Slider::new(&mut max, lo..=hi).text("max"))
                .changed();
            if min_changed || max_changed {
                state.set_salary_range(min, max);
            }
            ui.separator();

            // ---- Experience level ----
            let levels = &request.criteria.experience_levels;
            egui::CollapsingHeader::new(
                RichText::new(format!(
                    "Experience level  ({}/{})",
                    levels.len(),
                    ExperienceLevel::ALL.len()
                ))
                .strong(),
            )
            .id_salt("experience_level")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for level in ExperienceLevel::ALL {
                    let mut checked = levels.contains(&level);
                    let text = RichText::new(level.label())
                        .color(state.level_colors.color_for(level.label()));
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_experience(level);
                    }
                }
            });

            // ---- Company size ----
            let sizes = &request.criteria.company_sizes;
            egui::CollapsingHeader::new(
                RichText::new(format!(
                    "Company size  ({}/{})",
                    sizes.len(),
                    CompanySize::ALL.len()
                ))
                .strong(),
            )
            .id_salt("company_size")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for size in CompanySize::ALL {
                    let mut checked = sizes.contains(&size);
                    if ui.checkbox(&mut checked, size.label()).changed() {
                        state.toggle_company_size(size);
                    }
                }
            });
            ui.separator();

            // ---- Mean salary grouping ----
            ui.strong("Average salary by");
            egui::ComboBox::from_id_salt("category")
                .selected_text(request.category.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for category in Category::ALL {
                        if ui
                            .selectable_label(request.category == category, category.to_string())
                            .clicked()
                        {
                            state.set_category(category);
                        }
                    }
                });

            // ---- Job title for the location comparison ----
            ui.strong("Job title");
            let current = request.job_title.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("job_title")
                .selected_text(&current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for title in &dataset.job_titles {
                        if ui.selectable_label(current == *title, title).clicked() {
                            state.set_job_title(title.clone());
                        }
                    }
                });
            ui.separator();

            ui.checkbox(&mut state.show_preview, "Show data preview");
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            let can_export = state.view.as_ref().is_some_and(|v| v.visible_count() > 0);
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(view) = &state.view {
            ui.label(format!(
                "{} records loaded, {} visible",
                view.total_records,
                view.visible_count()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open salary data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(state.config.export_file_name.clone())
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_to(&path) {
            log::error!("Export to {} failed: {e}", path.display());
        }
    }
}
