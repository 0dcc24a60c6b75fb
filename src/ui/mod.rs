//! Rendering: panels around the dashboard, and the charts inside it.
//!
//! `plot` draws through egui_plot; `painted` draws directly on a painter for
//! the charts egui_plot has no primitive for.

pub mod dashboard;
pub mod painted;
pub mod panels;
pub mod plot;

use eframe::egui::{RichText, Ui};

/// Notice shown in place of a chart whose selection is empty.
pub fn no_data(ui: &mut Ui) {
    ui.label(
        RichText::new("Tidak ada data yang cocok dengan filter.")
            .italics()
            .color(ui.visuals().weak_text_color()),
    );
}
