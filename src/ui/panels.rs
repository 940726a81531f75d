use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::{CellValue, Column};
use crate::state::{AppState, SearchMode, CATEGORY_FILTERS};

// ---------------------------------------------------------------------------
// Left side panel – search and filter widgets
// ---------------------------------------------------------------------------

/// Render the left search / filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("搜尋功能");
    ui.separator();

    if state.table.is_empty() {
        ui.label("沒有可搜尋的資料。");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            search_section(ui, state);
            ui.separator();
            egui::CollapsingHeader::new(RichText::new("進階篩選").strong())
                .id_salt("advanced_filters")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for column in CATEGORY_FILTERS {
                        category_filter(ui, state, column);
                    }
                    year_filter(ui, state);
                });
        });
}

fn search_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("選擇搜尋方式:");
    let mut mode = state.selections.mode;
    ui.horizontal(|ui: &mut Ui| {
        for m in SearchMode::ALL {
            ui.radio_value(&mut mode, m, m.column().header());
        }
    });
    state.set_search_mode(mode);

    let column = mode.column();
    if !state.search_available() {
        ui.label(RichText::new(format!("資料中沒有「{column}」欄位")).weak());
        return;
    }

    ui.label(format!("輸入{column}關鍵字:"));
    let mut query = state.selections.query.clone();
    if ui.text_edit_singleline(&mut query).changed() {
        state.set_query(query);
    }

    ui.label(format!("或選擇{column}:"));
    let selected_text = state
        .selections
        .exact
        .as_ref()
        .map(CellValue::to_string)
        .unwrap_or_default();
    let mut picked: Option<Option<CellValue>> = None;
    egui::ComboBox::from_id_salt("exact_pick")
        .selected_text(selected_text)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(state.selections.exact.is_none(), "（不指定）")
                .clicked()
            {
                picked = Some(None);
            }
            for value in &state.search_values {
                let is_current = state.selections.exact.as_ref() == Some(value);
                if ui.selectable_label(is_current, value.to_string()).clicked() {
                    picked = Some(Some(value.clone()));
                }
            }
        });
    if let Some(value) = picked {
        state.set_exact(value);
    }
}

/// Multi-select for one categorical column. Hidden when the sheet lacks it.
fn category_filter(ui: &mut Ui, state: &mut AppState, column: Column) {
    let Some(options) = state.options.get(&column) else {
        return;
    };
    let chosen = state.selections.chosen.get(&column).cloned().unwrap_or_default();

    // Keep chosen values listed even after an earlier filter removed them,
    // so they can still be unticked.
    let mut values = options.clone();
    values.extend(chosen.iter().cloned());

    let header_text = format!("{column}  ({}/{})", chosen.len(), options.len());
    let mut toggled: Vec<CellValue> = Vec::new();
    let mut clear = false;

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(column.header())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("清除").clicked() {
                clear = true;
            }
            for value in &values {
                let mut checked = chosen.contains(value);
                let mut text = RichText::new(value.to_string());
                if !options.contains(value) {
                    text = text.weak();
                }
                if ui.checkbox(&mut checked, text).changed() {
                    toggled.push(value.clone());
                }
            }
        });

    if clear {
        state.clear_choices(column);
    }
    for value in &toggled {
        state.toggle_choice(column, value);
    }
}

fn year_filter(ui: &mut Ui, state: &mut AppState) {
    if !state.caps.has(Column::PubYear) {
        return;
    }

    let (min, max) = state.year_bounds;
    let mut enabled = state.selections.year_range.is_some();
    let (mut lo, mut hi) = state.selections.year_range.unwrap_or((min, max));
    let (range_min, range_max) = (min.min(lo), max.max(hi));

    let mut changed = ui
        .checkbox(&mut enabled, format!("限制{}範圍", Column::PubYear))
        .changed();
    if enabled {
        changed |= ui
            .add(egui::Slider::new(&mut lo, range_min..=range_max).text("起"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut hi, range_min..=range_max).text("迄"))
            .changed();
    }

    if changed {
        state.set_year_range(enabled.then_some((lo, hi)));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("檔案", |ui: &mut Ui| {
            if ui.button("開啟 CSV 快照…").clicked() {
                open_snapshot_dialog(state);
                ui.close_menu();
            }
            if ui.button("重新讀取").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        let source = state.source_description();
        if state.table.is_empty() {
            ui.label(RichText::new("無法獲取資料，請檢查連接和權限設定。").color(Color32::RED))
                .on_hover_text(source);
        } else {
            ui.label(format!(
                "已成功讀取 {} 筆資料，符合條件 {} 筆",
                state.table.len(),
                state.visible_indices.len()
            ))
            .on_hover_text(source);
        }

        ui.separator();

        ui.checkbox(&mut state.show_overview, "顯示資料概覽");

        if let Some(msg) = &state.fetch_error {
            ui.separator();
            ui.label(RichText::new(format!("讀取數據時發生錯誤: {msg}")).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_snapshot_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("開啟論文資料 CSV")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_snapshot(path);
    }
}
