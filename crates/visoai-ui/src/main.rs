#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod backend;
mod context;
mod helpers;
mod modules;
mod theme;

fn main() -> eframe::Result {
    helpers::log::init_logging();

    // Probing and preview decoding need the linked libraries; without them
    // loads fail individually and are reported as notices.
    if let Err(e) = ffmpeg_the_third::init() {
        log::error!("[app] FFmpeg init failed: {e}");
    }

    let native_options = eframe::NativeOptions {
        centered: true,
        viewport: egui::ViewportBuilder::default()
            .with_title("VisoAI Editor")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([900.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "VisoAI Editor",
        native_options,
        Box::new(|cc| Ok(Box::new(app::VisoAiApp::new(cc)?))),
    )
}
