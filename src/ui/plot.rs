use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, PlotUi};

use salary_lens::analysis::aggregate::{AggResult, AggregateError, TitleDeviation};
use salary_lens::data::model::{label_or_empty, CompanySize, ExperienceLevel, SalaryDataset};
use salary_lens::report::{format_usd, DashboardView};

use crate::color::{self, ColorMap};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;
const PREVIEW_ROWS: usize = 200;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render every dashboard section in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(view)) = (&state.dataset, &state.view) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            let msg = state
                .status_message
                .as_deref()
                .unwrap_or("Open a file to explore salaries  (File → Open…)");
            ui.heading(msg);
        });
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Data-science salaries");
            ui.add_space(4.0);

            headline(ui, view);

            if state.show_preview {
                section(ui, "Data preview", |ui| preview_table(ui, dataset, view));
            }
            section(ui, "General statistics", |ui| describe_grid(ui, view));
            section(ui, "Salary distribution by role and experience", |ui| {
                distribution_plot(ui, view, &state.level_colors)
            });
            section(ui, "Average salary by category", |ui| category_plot(ui, view));
            section(ui, "Correlation between numeric columns", |ui| {
                correlation_grid(ui, view)
            });
            section(ui, "Salary evolution of the most common roles", |ui| {
                trend_plot(ui, view)
            });
            section(ui, "Median salary by experience and company size", |ui| {
                group_median_plot(ui, view)
            });
            section(ui, "Remote work impact by country", |ui| remote_plot(ui, view));
            if let Some(deviation) = &view.deviation {
                section(ui, "Salary gap to the role median by country", |ui| {
                    deviation_plot(ui, deviation)
                });
            }
        });
}

fn section(ui: &mut Ui, title: &str, body: impl FnOnce(&mut Ui)) {
    ui.add_space(8.0);
    ui.separator();
    ui.strong(title);
    body(ui);
}

fn placeholder(ui: &mut Ui, err: &AggregateError) {
    let color = if err.is_degenerate() {
        Color32::from_rgb(200, 140, 0)
    } else {
        Color32::GRAY
    };
    ui.label(RichText::new(format!("No data: {err}")).italics().color(color));
}

/// Draw `body` with the section's data, or a placeholder on failure.
fn with_data<T>(ui: &mut Ui, section: &AggResult<T>, body: impl FnOnce(&mut Ui, &T)) {
    match section {
        Ok(data) => body(ui, data),
        Err(e) => placeholder(ui, e),
    }
}

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

fn headline(ui: &mut Ui, view: &DashboardView) {
    ui.horizontal(|ui: &mut Ui| match &view.summary {
        Ok(s) => {
            metric(ui, "Records", view.visible_count().to_string());
            metric(ui, "Mean salary", format_usd(s.mean));
            metric(ui, "Median salary", format_usd(s.median));
            metric(ui, "Range", format!("{} – {}", format_usd(s.min), format_usd(s.max)));
        }
        Err(e) => {
            metric(ui, "Records", view.visible_count().to_string());
            placeholder(ui, e);
        }
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(label).small());
            ui.label(RichText::new(value).heading());
        });
    });
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn preview_table(ui: &mut Ui, dataset: &SalaryDataset, view: &DashboardView) {
    let headers = [
        "work_year",
        "experience_level",
        "employment_type",
        "job_title",
        "salary_in_usd",
        "remote_ratio",
        "company_location",
        "company_size",
        "is_us",
    ];
    let rows: Vec<usize> = view.visible_indices.iter().copied().take(PREVIEW_ROWS).collect();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(300.0)
        .columns(Column::auto(), headers.len())
        .header(20.0, |mut header| {
            for name in headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let r = &dataset.records[rows[row.index()]];
                let cells = [
                    r.work_year.to_string(),
                    label_or_empty(r.experience_level),
                    r.employment_type.clone(),
                    r.job_title.clone(),
                    format_usd(r.salary_in_usd),
                    r.remote_ratio.to_string(),
                    r.company_location.clone(),
                    label_or_empty(r.company_size),
                    r.region.label().to_string(),
                ];
                for cell in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}

fn describe_grid(ui: &mut Ui, view: &DashboardView) {
    with_data(ui, &view.describe, |ui, columns| {
        egui::Grid::new("describe").striped(true).show(ui, |ui: &mut Ui| {
            for head in ["", "count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
                ui.strong(head);
            }
            ui.end_row();
            for c in columns {
                ui.label(&c.column);
                ui.label(c.count.to_string());
                ui.label(format!("{:.2}", c.mean));
                ui.label(c.std.map(|s| format!("{s:.2}")).unwrap_or_else(|| "–".into()));
                for v in [c.spread.min, c.spread.q1, c.spread.median, c.spread.q3, c.spread.max] {
                    ui.label(format!("{v:.2}"));
                }
                ui.end_row();
            }
        });
    });
}

fn correlation_grid(ui: &mut Ui, view: &DashboardView) {
    with_data(ui, &view.correlation, |ui, matrix| {
        egui::Grid::new("correlation").show(ui, |ui: &mut Ui| {
            ui.label("");
            for col in &matrix.columns {
                ui.strong(col);
            }
            ui.end_row();
            for (col, row) in matrix.columns.iter().zip(&matrix.values) {
                ui.strong(col);
                for cell in row {
                    match cell {
                        Some(r) => {
                            ui.label(
                                RichText::new(format!("{r:+.2}"))
                                    .color(Color32::BLACK)
                                    .background_color(color::diverging(*r)),
                            );
                        }
                        None => {
                            ui.label("–");
                        }
                    }
                }
                ui.end_row();
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn show_plot(ui: &mut Ui, id: &str, y_label: &str, add: impl FnOnce(&mut PlotUi)) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .y_axis_label(y_label)
        .show(ui, add);
}

fn distribution_plot(ui: &mut Ui, view: &DashboardView, level_colors: &ColorMap) {
    with_data(ui, &view.distribution, |ui, groups| {
        let mut titles: Vec<&str> = groups.iter().map(|g| g.job_title.as_str()).collect();
        titles.dedup();
        let levels: Vec<Option<ExperienceLevel>> = ExperienceLevel::ALL
            .into_iter()
            .map(Some)
            .chain(std::iter::once(None))
            .collect();
        let slot = 0.8 / levels.len() as f64;

        show_plot(ui, "distribution", "salary_in_usd", |plot_ui| {
            for (li, level) in levels.iter().enumerate() {
                let name = label_or_empty(*level);
                let boxes: Vec<BoxElem> = groups
                    .iter()
                    .filter(|g| g.experience_level == *level)
                    .filter_map(|g| {
                        let x = titles.iter().position(|t| *t == g.job_title)? as f64;
                        let s = g.spread;
                        Some(
                            BoxElem::new(
                                x - 0.4 + slot * (li as f64 + 0.5),
                                BoxSpread::new(s.min, s.q1, s.median, s.q3, s.max),
                            )
                            .name(format!("{} · {name}", g.job_title))
                            .box_width(slot * 0.9),
                        )
                    })
                    .collect();
                if !boxes.is_empty() {
                    plot_ui.box_plot(
                        BoxPlot::new(boxes)
                            .name(&name)
                            .color(level_colors.color_for(&name)),
                    );
                }
            }
        });
    });
}

fn category_plot(ui: &mut Ui, view: &DashboardView) {
    with_data(ui, &view.category_means, |ui, means| {
        let bars: Vec<Bar> = means
            .iter()
            .enumerate()
            .map(|(i, m)| {
                Bar::new(i as f64, m.mean_salary)
                    .name(format!("{} ({})", m.label, format_usd(m.mean_salary)))
                    .width(0.7)
            })
            .collect();
        show_plot(ui, "category_means", "mean salary_in_usd", |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("mean salary"));
        });
    });
}

fn trend_plot(ui: &mut Ui, view: &DashboardView) {
    with_data(ui, &view.title_trends, |ui, trends| {
        let colors = ColorMap::new(trends.iter().map(|t| t.job_title.clone()));
        show_plot(ui, "title_trends", "mean salary_in_usd", |plot_ui| {
            for trend in trends {
                let points: PlotPoints = trend
                    .points
                    .iter()
                    .map(|p| [f64::from(p.work_year), p.mean_salary])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&trend.job_title)
                        .color(colors.color_for(&trend.job_title))
                        .width(2.0),
                );
            }
        });
    });
}

fn group_median_plot(ui: &mut Ui, view: &DashboardView) {
    with_data(ui, &view.group_medians, |ui, medians| {
        let sizes = ColorMap::new(CompanySize::ALL.iter().map(|s| s.label()));
        let slot = 0.8 / CompanySize::ALL.len() as f64;
        show_plot(ui, "group_medians", "median salary_in_usd", |plot_ui| {
            for (si, size) in CompanySize::ALL.into_iter().enumerate() {
                let bars: Vec<Bar> = medians
                    .iter()
                    .filter(|m| m.company_size == size)
                    .map(|m| {
                        let x = ExperienceLevel::ALL
                            .iter()
                            .position(|l| *l == m.experience_level)
                            .unwrap_or(0) as f64;
                        Bar::new(x - 0.4 + slot * (si as f64 + 0.5), m.median)
                            .name(format!("{} · {}", m.experience_level, size))
                            .width(slot * 0.9)
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(size.label())
                        .color(sizes.color_for(size.label())),
                );
            }
        });
    });
}

fn remote_plot(ui: &mut Ui, view: &DashboardView) {
    with_data(ui, &view.remote_impact, |ui, impact| {
        let mut locations: Vec<&str> = impact.iter().map(|i| i.company_location.as_str()).collect();
        locations.dedup();
        let mut ratios: Vec<i32> = impact.iter().map(|i| i.remote_ratio).collect();
        ratios.sort_unstable();
        ratios.dedup();
        let colors = ColorMap::new(ratios.iter().map(|r| format!("{r}% remote")));
        let slot = 0.8 / ratios.len().max(1) as f64;

        show_plot(ui, "remote_impact", "mean salary_in_usd", |plot_ui| {
            for (ri, ratio) in ratios.iter().enumerate() {
                let name = format!("{ratio}% remote");
                let bars: Vec<Bar> = impact
                    .iter()
                    .filter(|i| i.remote_ratio == *ratio)
                    .filter_map(|i| {
                        let x = locations.iter().position(|l| *l == i.company_location)? as f64;
                        Some(
                            Bar::new(x - 0.4 + slot * (ri as f64 + 0.5), i.mean_salary)
                                .name(format!("{} · {name}", i.company_location))
                                .width(slot * 0.9),
                        )
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(&name)
                        .color(colors.color_for(&name)),
                );
            }
        });
    });
}

fn deviation_plot(ui: &mut Ui, deviation: &AggResult<TitleDeviation>) {
    with_data(ui, deviation, |ui, dev| {
        ui.label(format!(
            "{}: median {}",
            dev.job_title,
            format_usd(dev.median_salary)
        ));
        if let Some(Err(e)) = dev.locations.first().map(|l| &l.diff_percent) {
            placeholder(ui, e);
            return;
        }
        let bars: Vec<Bar> = dev
            .locations
            .iter()
            .enumerate()
            .filter_map(|(i, l)| {
                let diff = *l.diff_percent.as_ref().ok()?;
                let fill = if diff < 0.0 {
                    Color32::from_rgb(200, 80, 80)
                } else {
                    Color32::from_rgb(80, 160, 90)
                };
                Some(
                    Bar::new(i as f64, diff)
                        .name(format!("{} ({:+.1}%)", l.company_location, diff))
                        .fill(fill)
                        .width(0.7),
                )
            })
            .collect();
        show_plot(ui, "deviation", "% vs median", |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("difference %"));
        });
    });
}
