use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

use abusewatch::api::ApiClient;
use abusewatch::config;
use abusewatch::ui::app::AppUI;
use abusewatch::ui::controller::{DashController, DashEvent};
use abusewatch::{LogCollector, LogLine};
use eframe::egui;

#[tokio::main]
async fn main() -> abusewatch::Result<()> {
    // Logging first: everything below logs through the collector.
    let (log_ui_tx, mut log_ui_rx) = mpsc::channel::<LogLine>(1024);
    let log_collector = LogCollector::new(log_ui_tx, log::LevelFilter::Info);
    if let Err(e) = log_collector.install() {
        eprintln!("[Main] WARNING: Failed to install log collector: {}", e);
    }
    log::info!("AbuseWatch logging initialized");

    let app_config = config::load_effective_config();
    log::info!(
        "[Main] Backend {} (stats poll {}ms, blocklist poll {}ms)",
        app_config.base_url,
        app_config.stats_poll_ms,
        app_config.blocklist_poll_ms
    );

    let (events_tx, events_rx) = mpsc::channel::<DashEvent>(65536);

    // Forward collector lines into the dashboard event stream so the UI
    // log feed sees them without a second logger.
    let log_events_tx = events_tx.clone();
    tokio::spawn(async move {
        while let Some(line) = log_ui_rx.recv().await {
            let _ = log_events_tx.send(DashEvent::Log(line)).await;
        }
        eprintln!("[Main] Log drain task: shutting down (log_ui_rx closed)");
    });

    let api = Arc::new(ApiClient::new(&app_config));
    let mut controller = DashController::new(api, app_config, events_tx);
    controller.start_pollers();
    let controller = Arc::new(RwLock::new(controller));

    let app_ui = AppUI::new(controller.clone(), Some(events_rx));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "AbuseWatch",
        options,
        Box::new(move |_cc| Box::new(app_ui)),
    );

    // The controller's Drop stops both pollers; the explicit stop here
    // just makes shutdown deterministic before the runtime goes away.
    controller.write().await.stop_pollers();
    log::info!("[Main] Application shutting down");

    result.map_err(|e| e.into())
}
