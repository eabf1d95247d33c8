mod app;
mod constants;
mod desktop_manager;
mod error;
mod geometry;
mod image_loader;
mod media_surface;
mod paths;
mod profile;
mod profile_store;
mod resize_affordance;
mod save_scheduler;
mod widget;

use app::{DesktopApp, NativeDialogs};
use constants::{APP_NAME, FALLBACK_SCREEN_SIZE};
use desktop_manager::{Bootstrap, DesktopManager};
use image_loader::ImageDecoder;
use paths::AppPaths;
use profile_store::ProfileStore;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let paths = AppPaths::resolve();
    if let Err(err) = paths.ensure_dirs_exist() {
        log::warn!(
            "Could not create data directory {}: {err}",
            paths.data.display()
        );
    }

    let store = ProfileStore::new(paths.profiles);
    let mut manager = DesktopManager::new(store, Box::new(ImageDecoder), FALLBACK_SCREEN_SIZE);
    let mut dialogs = NativeDialogs::default();

    if manager.try_load_default_profile(&mut dialogs) == Bootstrap::Cancelled {
        log::info!("No media selected, exiting");
        return Ok(());
    }

    // The root window only drives the event loop; widgets live in their own viewports.
    // It stays mapped because some platforms stop redrawing hidden windows.
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_decorations(false)
            .with_transparent(true)
            .with_taskbar(false)
            .with_mouse_passthrough(true)
            .with_position([-10.0, -10.0])
            .with_inner_size([1.0, 1.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(|_cc| Ok(Box::new(DesktopApp::new(manager, dialogs)))),
    )
}
