use std::f32::consts::TAU;

use eframe::egui::{Align2, Color32, FontId, Mesh, Pos2, Rect, RichText, Sense, Stroke, Ui, Vec2, pos2, vec2};

use crate::color::{self, coolwarm, generate_palette};
use crate::data::filter::View;
use crate::state::Session;
use crate::stats;
use crate::wordcloud::{self, WordCloudError};

use super::no_data;
use super::plot::CHART_HEIGHT;

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

/// Segments per full turn when tessellating pie slices.
const PIE_SEGMENTS: f32 = 180.0;

/// Share of each category, with percentages on the slices and a legend.
pub fn pie(ui: &mut Ui, session: &Session, view: &View<'_>, column: &str) {
    let counts = stats::value_counts(view, column);
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        no_data(ui);
        return;
    }

    let size = vec2(ui.available_width(), CHART_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    let radius = (rect.height() / 2.0 - 10.0).max(10.0);
    let center = pos2(rect.left() + radius + 20.0, rect.center().y);

    let mut start = -TAU / 4.0;
    for (value, n) in &counts {
        let sweep = TAU * *n as f32 / total as f32;
        let fill = session
            .color_map(column)
            .map(|cm| cm.color_for(value))
            .unwrap_or(Color32::GRAY);

        let mut mesh = Mesh::default();
        mesh.colored_vertex(center, fill);
        let steps = ((sweep / TAU) * PIE_SEGMENTS).ceil().max(1.0) as u32;
        for s in 0..=steps {
            let angle = start + sweep * s as f32 / steps as f32;
            mesh.colored_vertex(center + radius * Vec2::angled(angle), fill);
            if s > 0 {
                mesh.add_triangle(0, s, s + 1);
            }
        }
        painter.add(mesh);

        let mid = start + sweep / 2.0;
        let share = 100.0 * *n as f32 / total as f32;
        if share >= 3.0 {
            painter.text(
                center + radius * 0.65 * Vec2::angled(mid),
                Align2::CENTER_CENTER,
                format!("{share:.1}%"),
                FontId::proportional(13.0),
                color::text_on(fill),
            );
        }
        start += sweep;
    }
    painter.circle_stroke(center, radius, Stroke::new(1.0, ui.visuals().window_stroke.color));

    // Legend
    let mut y = rect.top() + 10.0;
    let x = center.x + radius + 30.0;
    for (value, n) in &counts {
        let fill = session
            .color_map(column)
            .map(|cm| cm.color_for(value))
            .unwrap_or(Color32::GRAY);
        painter.rect_filled(Rect::from_min_size(pos2(x, y), vec2(12.0, 12.0)), 2.0, fill);
        painter.text(
            pos2(x + 18.0, y + 6.0),
            Align2::LEFT_CENTER,
            format!("{value} ({n})"),
            FontId::proportional(13.0),
            ui.visuals().text_color(),
        );
        y += 18.0;
    }
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

const LABEL_MARGIN: f32 = 140.0;

/// Annotated Pearson correlation grid of every numeric column.
pub fn heatmap(ui: &mut Ui, view: &View<'_>) {
    let columns = view.schema().numeric_columns();
    if columns.is_empty() || view.is_empty() {
        no_data(ui);
        return;
    }
    let matrix = stats::correlation_matrix(view, &columns);
    let k = matrix.columns.len();

    let cell = ((ui.available_width() - LABEL_MARGIN) / k as f32).clamp(24.0, 80.0);
    let size = vec2(LABEL_MARGIN + cell * k as f32, LABEL_MARGIN * 0.5 + cell * k as f32);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min + vec2(LABEL_MARGIN, 0.0);
    let text_color = ui.visuals().text_color();
    let font = FontId::proportional(12.0);

    for (row, name) in matrix.columns.iter().enumerate() {
        let y = origin.y + cell * row as f32;
        painter.text(
            pos2(origin.x - 6.0, y + cell / 2.0),
            Align2::RIGHT_CENTER,
            name,
            font.clone(),
            text_color,
        );
        for col in 0..k {
            let r = Rect::from_min_size(pos2(origin.x + cell * col as f32, y), vec2(cell, cell));
            let (fill, label) = match matrix.values[row][col] {
                Some(v) => (coolwarm(v), format!("{v:.2}")),
                None => (Color32::LIGHT_GRAY, "–".to_string()),
            };
            painter.rect_filled(r.shrink(0.5), 0.0, fill);
            painter.text(r.center(), Align2::CENTER_CENTER, label, font.clone(), color::text_on(fill));
        }
    }

    // Column labels under the grid, staggered so long names stay readable.
    let bottom = origin.y + cell * k as f32;
    for (col, name) in matrix.columns.iter().enumerate() {
        let stagger = if col % 2 == 0 { 8.0 } else { 24.0 };
        painter.text(
            pos2(origin.x + cell * (col as f32 + 0.5), bottom + stagger),
            Align2::CENTER_CENTER,
            name,
            font.clone(),
            text_color,
        );
    }
}

// ---------------------------------------------------------------------------
// Word cloud
// ---------------------------------------------------------------------------

/// Word cloud of `column`, or a notice when the view has no text for it.
pub fn word_cloud(ui: &mut Ui, view: &View<'_>, column: &str) {
    let text = wordcloud::build_text(view, column);
    let words = match wordcloud::word_frequencies(&text) {
        Ok(words) => words,
        Err(WordCloudError::EmptyText) => {
            log::debug!("word cloud for '{column}' skipped: no text");
            ui.label(
                RichText::new(format!(
                    "⚠️ Tidak ada teks pada kolom '{column}' untuk dibuat WordCloud."
                ))
                .color(ui.visuals().warn_fg_color),
            );
            return;
        }
    };

    let width = ui.available_width().min(800.0);
    let height = width / 2.0;
    let placed = {
        let ctx = ui.ctx().clone();
        wordcloud::layout(&words, width, height, |word, size| {
            let galley = ctx.fonts(|f| {
                f.layout_no_wrap(word.to_owned(), FontId::proportional(size), Color32::WHITE)
            });
            (galley.size().x, galley.size().y)
        })
    };

    let (response, painter) = ui.allocate_painter(vec2(width, height), Sense::hover());
    let origin: Pos2 = response.rect.min;
    painter.rect_filled(response.rect, 0.0, Color32::WHITE);

    let palette = generate_palette(placed.len().clamp(1, 12));
    for (i, word) in placed.iter().enumerate() {
        let (cx, cy) = word.rect.center();
        painter.text(
            origin + vec2(cx, cy),
            Align2::CENTER_CENTER,
            &word.text,
            FontId::proportional(word.font_size),
            palette[i % palette.len()],
        );
    }
    response.on_hover_text(format!("{} kata", placed.len()));
}

/// Placeholder heading while no file is loaded.
pub fn empty_canvas(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Buka file data untuk melihat dashboard  (File → Open…)");
    });
}
