use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ThesisSearchApp {
    pub state: AppState,
}

impl ThesisSearchApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ThesisSearchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Every frame reads through the cache; this only fetches once the
        // ttl has run out.
        self.state.refresh();

        // ---- Top panel: menu + status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: search + filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: overview charts ----
        if self.state.show_overview {
            egui::TopBottomPanel::bottom("overview")
                .resizable(true)
                .default_height(280.0)
                .show(ctx, |ui| {
                    plot::overview_charts(ui, &self.state);
                });
        }

        // ---- Central panel: results ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::results_table(ui, &self.state);
        });
    }
}

/// Add a font with CJK glyphs as fallback for every family; the built-in
/// fonts have no Chinese coverage.
pub fn install_font(ctx: &egui::Context, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".to_owned(), Arc::new(egui::FontData::from_owned(bytes)));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }
    ctx.set_fonts(fonts);
    log::info!("Installed font {}", path.display());
    Ok(())
}
