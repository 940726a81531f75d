use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Results grid (central panel)
// ---------------------------------------------------------------------------

/// Render the records passing the current filters, all columns in sheet order.
pub fn results_table(ui: &mut Ui, state: &AppState) {
    if state.table.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("尚未載入資料  (檔案 → 重新讀取)");
        });
        return;
    }

    ui.label(format!("搜尋結果: {} 筆", state.visible_indices.len()));
    if state.visible_indices.is_empty() {
        ui.colored_label(egui::Color32::YELLOW, "沒有符合的搜尋結果");
        return;
    }

    let table = &state.table;
    let columns = &table.columns;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(TableColumn::auto().at_least(60.0).clip(true), columns.len())
            .header(22.0, |mut header| {
                for name in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(20.0, state.visible_indices.len(), |mut row| {
                    let record = &table.records[state.visible_indices[row.index()]];
                    for name in columns {
                        row.col(|ui: &mut Ui| {
                            ui.label(record.get(name).to_string());
                        });
                    }
                });
            });
    });
}
