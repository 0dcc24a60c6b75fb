use eframe::egui::{self, Frame, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::dashboard::{Chart, Section};
use crate::data::filter::View;
use crate::state::{AppState, Session};
use crate::stats;

use super::{painted, plot};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the dashboard for the current selection.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    // Split the borrow: charts read the session while the selectors write.
    let AppState {
        session,
        visible_indices,
        scatter_x,
        category_column,
        ..
    } = state;

    let Some(session) = session.as_ref() else {
        painted::empty_canvas(ui);
        return;
    };
    let view = View::from_indices(&session.dataset, visible_indices.as_slice());
    let variant = session.variant;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new(variant.title()).size(26.0).strong());
            ui.add_space(8.0);

            metrics(ui, session, &view);
            ui.add_space(8.0);

            ui.collapsing("📄 Ringkasan Statistik", |ui: &mut Ui| describe_table(ui, &view));
            ui.separator();

            for (id, section) in variant.sections().iter().enumerate() {
                ui.add_space(12.0);
                ui.heading(section.title);
                let selected = render_chart(ui, id, session, &view, section, scatter_x, category_column);
                insight(ui, section, selected.as_deref());
            }

            ui.separator();
            ui.heading("✅ Kesimpulan");
            for line in variant.conclusions() {
                ui.label(format!("• {line}"));
            }
            ui.add_space(12.0);
            ui.label(RichText::new(variant.footer()).small().weak());
        });
}

// ---------------------------------------------------------------------------
// Header widgets
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(24.0).strong());
    });
}

fn metrics(ui: &mut Ui, session: &Session, view: &View<'_>) {
    let schema = view.schema();
    let (headline_label, headline_column) = session.variant.headline();
    let headline = stats::mean(&stats::numeric_values(view, headline_column))
        .map_or_else(|| "–".to_string(), |m| format!("{m:.2}"));

    ui.columns(4, |cols| {
        metric(&mut cols[0], session.variant.count_label(), view.len().to_string());
        metric(&mut cols[1], "Kolom Numerik", schema.numeric_columns().len().to_string());
        metric(&mut cols[2], "Kolom Kategori", schema.categorical_columns().len().to_string());
        metric(&mut cols[3], headline_label, headline);
    });
}

/// count/mean/std/min/quartiles/max of every numeric column.
fn describe_table(ui: &mut Ui, view: &View<'_>) {
    let columns = view.schema().numeric_columns();
    let rows: Vec<(&str, Option<stats::Describe>)> = columns
        .iter()
        .map(|&c| (c, stats::describe(&stats::numeric_values(view, c))))
        .collect();

    const HEADERS: [&str; 9] = ["", "count", "mean", "std", "min", "25%", "50%", "75%", "max"];
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(140.0))
        .columns(Column::auto().at_least(60.0), HEADERS.len() - 1)
        .header(20.0, |mut header| {
            for h in HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(h);
                });
            }
        })
        .body(|mut body| {
            for (name, summary) in &rows {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(*name);
                    });
                    let cells: Vec<String> = match summary {
                        Some(d) => vec![
                            d.count.to_string(),
                            format!("{:.2}", d.mean),
                            d.std.map_or_else(|| "–".to_string(), |s| format!("{s:.2}")),
                            format!("{:.2}", d.min),
                            format!("{:.2}", d.q1),
                            format!("{:.2}", d.median),
                            format!("{:.2}", d.q3),
                            format!("{:.2}", d.max),
                        ],
                        None => {
                            let mut cells = vec!["–".to_string(); HEADERS.len() - 1];
                            cells[0] = "0".to_string();
                            cells
                        }
                    };
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Draw the section's chart. Returns the user-selected column the caption
/// refers to, if the chart has one.
fn render_chart(
    ui: &mut Ui,
    id: usize,
    session: &Session,
    view: &View<'_>,
    section: &Section,
    scatter_x: &mut Option<String>,
    category_column: &mut Option<String>,
) -> Option<String> {
    match section.chart {
        Chart::Histogram { column, bins, color_by, marginal_box } => {
            plot::histogram(ui, id, session, view, column, bins, color_by, marginal_box);
            None
        }
        Chart::Pie { column } => {
            painted::pie(ui, session, view, column);
            None
        }
        Chart::CountBar { column } => {
            plot::count_bar(ui, id, session, view, column);
            None
        }
        Chart::BoxPlot { category, value, color_by } => {
            plot::box_plot(ui, id, session, view, category, value, color_by);
            None
        }
        Chart::Violin { category, value } => {
            plot::violin(ui, id, session, view, category, value);
            None
        }
        Chart::Scatter { y, color_by } => {
            let options = view.schema().numeric_columns();
            column_picker(ui, ("scatter_x", id), "Pilih variabel X untuk scatter plot:", &options, scatter_x);
            let x = scatter_x.clone()?;
            plot::scatter(ui, id, session, view, &x, y, color_by);
            Some(x)
        }
        Chart::Heatmap => {
            painted::heatmap(ui, view);
            None
        }
        Chart::CountPlot => {
            let options = view.schema().categorical_columns();
            column_picker(ui, ("category", id), "Pilih kolom kategori:", &options, category_column);
            let column = category_column.clone()?;
            plot::count_bar(ui, id, session, view, &column);
            Some(column)
        }
        Chart::WordCloud { column: Some(column) } => {
            painted::word_cloud(ui, view, column);
            Some(column.to_string())
        }
        Chart::WordCloud { column: None } => {
            let column = category_column.clone()?;
            ui.label(RichText::new(format!("Kolom: {column}")).weak());
            painted::word_cloud(ui, view, &column);
            Some(column)
        }
    }
}

/// Combo box over `options` writing the choice into `selected`.
fn column_picker(
    ui: &mut Ui,
    id: impl std::hash::Hash,
    label: &str,
    options: &[&str],
    selected: &mut Option<String>,
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(selected.as_deref().unwrap_or("–"))
            .show_ui(ui, |ui: &mut Ui| {
                for &option in options {
                    ui.selectable_value(selected, Some(option.to_string()), option);
                }
            });
    });
}

fn insight(ui: &mut Ui, section: &Section, selected: Option<&str>) {
    Frame::group(ui.style())
        .fill(ui.visuals().faint_bg_color)
        .show(ui, |ui: &mut Ui| {
            ui.set_width(ui.available_width());
            ui.label(section.insight_for(selected).into_owned());
        });
}
