use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, Points,
    Polygon,
};

use crate::data::filter::{FilterSpec, View};
use crate::data::model::Value;
use crate::state::Session;
use crate::stats::{self, BinEdges};

use super::no_data;

pub const CHART_HEIGHT: f32 = 320.0;

const DEFAULT_COLOR: Color32 = Color32::from_rgb(0x63, 0x6e, 0xfa);

/// Colour of `value` in `column`, falling back to the default series colour.
fn color_of(session: &Session, column: Option<&str>, value: &Value) -> Color32 {
    column
        .and_then(|c| session.color_map(c))
        .map(|cm| cm.color_for(value))
        .unwrap_or(DEFAULT_COLOR)
}

fn group_label(value: &Value, fallback: &str) -> String {
    if value.is_null() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Axis formatter putting category names under integer x positions.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Histogram of a numeric column, stacked by `color_by` groups. With
/// `marginal_box`, each group also gets a horizontal box in a strip above
/// the tallest bar.
#[allow(clippy::too_many_arguments)]
pub fn histogram(
    ui: &mut Ui,
    id: usize,
    session: &Session,
    view: &View<'_>,
    column: &str,
    bins: usize,
    color_by: Option<&str>,
    marginal_box: bool,
) {
    let values = stats::numeric_values(view, column);
    let Some(edges) = BinEdges::covering(&values, bins) else {
        no_data(ui);
        return;
    };
    let peak = edges.count(&values).into_iter().max().unwrap_or(0).max(1) as f64;

    let groups: Vec<(Value, Vec<f64>)> = match color_by {
        Some(group) => stats::grouped_values(view, group, column),
        None => vec![(Value::Null, values)],
    };

    let mut charts: Vec<BarChart> = Vec::new();
    let mut boxes: Vec<BoxPlot> = Vec::new();
    for (row, (group, vals)) in groups.into_iter().enumerate() {
        let name = group_label(&group, column);
        let color = color_of(session, color_by, &group);
        if marginal_box {
            // Rows stack upward from just above the tallest bar.
            let y = peak * (1.1 + 0.12 * row as f64);
            if let Some(elem) = box_elem(y, peak * 0.08, &vals, &name, color) {
                boxes.push(BoxPlot::new(vec![elem]).name(&name).color(color).horizontal());
            }
        }
        let bars: Vec<Bar> = edges
            .count(&vals)
            .into_iter()
            .enumerate()
            .map(|(i, n)| Bar::new(edges.center(i), n as f64).width(edges.width()))
            .collect();
        let mut chart = BarChart::new(bars).name(name).color(color);
        if !charts.is_empty() {
            let below: Vec<&BarChart> = charts.iter().collect();
            chart = chart.stack_on(&below);
        }
        charts.push(chart);
    }

    Plot::new(("histogram", id))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label(column)
        .y_axis_label("count")
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
            for series in boxes {
                plot_ui.box_plot(series);
            }
        });
}

// ---------------------------------------------------------------------------
// Count bars
// ---------------------------------------------------------------------------

/// One bar per category, most frequent first.
pub fn count_bar(ui: &mut Ui, id: usize, session: &Session, view: &View<'_>, column: &str) {
    let counts = stats::value_counts(view, column);
    if counts.is_empty() {
        no_data(ui);
        return;
    }

    let labels: Vec<String> = counts.iter().map(|(v, _)| v.to_string()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (value, n))| {
            Bar::new(i as f64, *n as f64)
                .name(value.to_string())
                .fill(color_of(session, Some(column), value))
                .width(0.7)
        })
        .collect();

    Plot::new(("count_bar", id))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(category_axis(labels))
        .x_axis_label(column)
        .y_axis_label("count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(column));
        });
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

/// Categories of `category` present in the view, in value order.
fn present_categories(view: &View<'_>, category: &str) -> Vec<Value> {
    view.column(category)
        .filter(|v| !v.is_null())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn box_elem(x: f64, width: f64, values: &[f64], name: &str, color: Color32) -> Option<BoxElem> {
    let b = stats::box_stats(values)?;
    Some(
        BoxElem::new(
            x,
            BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
        )
        .name(name)
        .box_width(width)
        .whisker_width(width * 0.5)
        .fill(color.linear_multiply(0.35))
        .stroke(Stroke::new(1.5, color)),
    )
}

/// Numeric `value` per `category`; with `color_by`, boxes of each colour
/// group sit side by side.
pub fn box_plot(
    ui: &mut Ui,
    id: usize,
    session: &Session,
    view: &View<'_>,
    category: &str,
    value: &str,
    color_by: Option<&str>,
) {
    let categories = present_categories(view, category);
    if categories.is_empty() {
        no_data(ui);
        return;
    }
    let slot = |cat: &Value| categories.iter().position(|c| c == cat).unwrap_or(0) as f64;

    // (group, colour, per-category values)
    let groups: Vec<(Value, Color32, Vec<(Value, Vec<f64>)>)> = match color_by {
        Some(col) => present_categories(view, col)
            .into_iter()
            .map(|g| {
                let mut spec = FilterSpec::new();
                spec.insert(col.to_string(), BTreeSet::from([g.clone()]));
                let sub = view.select(&spec);
                let color = color_of(session, Some(col), &g);
                (g, color, stats::grouped_values(&sub, category, value))
            })
            .collect(),
        None => vec![(
            Value::Null,
            DEFAULT_COLOR,
            stats::grouped_values(view, category, value),
        )],
    };

    let k = groups.len().max(1) as f64;
    let width = 0.8 / k;
    let mut plots = Vec::new();
    let mut outliers = Vec::new();
    for (j, (group, color, per_category)) in groups.iter().enumerate() {
        let offset = (j as f64 - (k - 1.0) / 2.0) * width;
        let mut elems = Vec::new();
        for (cat, vals) in per_category {
            let x = slot(cat) + offset;
            if let Some(elem) = box_elem(x, width * 0.8, vals, &cat.to_string(), *color) {
                elems.push(elem);
            }
            if let Some(b) = stats::box_stats(vals) {
                outliers.extend(b.outliers.iter().map(|&y| ([x, y], *color)));
            }
        }
        let series = BoxPlot::new(elems)
            .name(group_label(group, value))
            .color(*color);
        plots.push(series);
    }

    let labels = categories.iter().map(|c| c.to_string()).collect();
    Plot::new(("box_plot", id))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(category_axis(labels))
        .x_axis_label(category)
        .y_axis_label(value)
        .show(ui, |plot_ui| {
            for series in plots {
                plot_ui.box_plot(series);
            }
            for ([x, y], color) in outliers {
                plot_ui.points(Points::new(vec![[x, y]]).radius(2.5).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Violin
// ---------------------------------------------------------------------------

const VIOLIN_POINTS: usize = 64;

/// Mirrored density of `value` per `category`, with a narrow box inside.
pub fn violin(ui: &mut Ui, id: usize, session: &Session, view: &View<'_>, category: &str, value: &str) {
    let groups = stats::grouped_values(view, category, value);
    if groups.is_empty() {
        no_data(ui);
        return;
    }

    let labels: Vec<String> = groups.iter().map(|(c, _)| c.to_string()).collect();
    Plot::new(("violin", id))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(category_axis(labels))
        .x_axis_label(category)
        .y_axis_label(value)
        .show(ui, |plot_ui| {
            for (i, (cat, vals)) in groups.iter().enumerate() {
                let x = i as f64;
                let color = color_of(session, Some(category), cat);
                let curve = stats::kde(vals, VIOLIN_POINTS);
                let peak = curve.iter().map(|(_, d)| *d).fold(0.0, f64::max);
                if peak > 0.0 {
                    let scale = 0.4 / peak;
                    let outline: Vec<[f64; 2]> = curve
                        .iter()
                        .map(|&(y, d)| [x - d * scale, y])
                        .chain(curve.iter().rev().map(|&(y, d)| [x + d * scale, y]))
                        .collect();
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(outline))
                            .name(cat.to_string())
                            .fill_color(color.linear_multiply(0.3))
                            .stroke(Stroke::new(1.0, color)),
                    );
                }
                if let Some(elem) = box_elem(x, 0.06, vals, &cat.to_string(), color) {
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).color(color));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter with trendlines
// ---------------------------------------------------------------------------

/// `x` against `y`, one OLS trendline per colour group.
pub fn scatter(
    ui: &mut Ui,
    id: usize,
    session: &Session,
    view: &View<'_>,
    x: &str,
    y: &str,
    color_by: Option<&str>,
) {
    let groups = stats::paired_values(view, x, y, color_by);
    if groups.is_empty() {
        no_data(ui);
        return;
    }

    Plot::new(("scatter", id))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_label(x)
        .y_axis_label(y)
        .show(ui, |plot_ui| {
            for (group, pairs) in &groups {
                let color = color_of(session, color_by, group);
                let name = group_label(group, y);
                let points: PlotPoints = pairs.iter().map(|&(px, py)| [px, py]).collect();
                plot_ui.points(Points::new(points).radius(2.5).color(color).name(&name));

                let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
                if let Some(fit) = stats::linear_fit(&xs, &ys) {
                    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
                    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let line: PlotPoints = vec![[lo, fit.at(lo)], [hi, fit.at(hi)]].into();
                    plot_ui.line(Line::new(line).color(color).width(2.0).name(&name));
                }
            }
        });
}
