use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::category_colours;
use crate::data::model::{CellValue, Column};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Overview charts (bottom panel)
// ---------------------------------------------------------------------------

/// Render the per-department and per-year charts side by side. A chart whose
/// column is missing from the sheet is left out.
pub fn overview_charts(ui: &mut Ui, state: &AppState) {
    ui.columns(2, |cols| {
        if let Some(counts) = &state.summary.by_department {
            cols[0].strong(format!("各{}論文數量分布", Column::Department));
            department_chart(&mut cols[0], counts);
        }
        if let Some(counts) = &state.summary.by_pub_year {
            cols[1].strong(format!("{}份分布", Column::PubYear));
            year_chart(&mut cols[1], counts);
        }
    });
}

fn department_chart(ui: &mut Ui, counts: &[(CellValue, usize)]) {
    let labels: Vec<String> = counts.iter().map(|(dept, _)| dept.to_string()).collect();
    let colours = category_colours(counts.iter().map(|(dept, _)| dept));
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (dept, n))| {
            let mut bar = Bar::new(i as f64, *n as f64).name(dept.to_string()).width(0.7);
            if let Some(&colour) = colours.get(dept) {
                bar = bar.fill(colour);
            }
            bar
        })
        .collect();

    Plot::new("department_chart")
        .y_axis_label("論文數量")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(Column::Department.header()));
        });
}

fn year_chart(ui: &mut Ui, counts: &[(f64, usize)]) {
    let series: Vec<[f64; 2]> = counts.iter().map(|&(year, n)| [year, n as f64]).collect();

    Plot::new("year_chart")
        .legend(Legend::default())
        .x_axis_label(Column::PubYear.header())
        .y_axis_label("論文數量")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(series.clone()))
                    .name("論文數量")
                    .color(Color32::LIGHT_BLUE)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(series))
                    .radius(3.0)
                    .color(Color32::LIGHT_BLUE),
            );
        });
}
