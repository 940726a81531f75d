use eframe::egui;

use maritime_thesis_search::app::ThesisSearchApp;
use maritime_thesis_search::config::AppConfig;
use maritime_thesis_search::data::cache::DEFAULT_TTL;
use maritime_thesis_search::data::fetcher::{TableFetcher, Unavailable};
use maritime_thesis_search::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    // A broken config still opens the window; the fetch error explains why
    // there is nothing to show.
    let (fetcher, ttl, font_path): (Box<dyn TableFetcher>, _, _) =
        match AppConfig::load().and_then(|c| Ok((c.fetcher()?, c.ttl(), c.font_path))) {
            Ok(parts) => parts,
            Err(e) => {
                log::error!("No usable configuration: {e:#}");
                let reason = format!("{e:#}");
                (Box::new(Unavailable { reason }), DEFAULT_TTL, None)
            }
        };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "海事論文查詢系統",
        options,
        Box::new(move |cc| {
            if let Some(path) = &font_path {
                if let Err(e) = maritime_thesis_search::app::install_font(&cc.egui_ctx, path) {
                    log::warn!("Falling back to built-in fonts: {e:#}");
                }
            }
            let state = AppState::new(fetcher, ttl);
            Ok(Box::new(ThesisSearchApp::new(state)))
        }),
    )
}
