//! Orrery demo
//!
//! Opens a window and renders the planet, sun, reference cube, particles and
//! skybox until Escape is pressed or the window is closed.
//!
//! Controls: WASD to fly, mouse to look, scroll to zoom.

use orrery_engine::foundation::logging;
use orrery_engine::prelude::*;

const CONFIG_PATH: &str = "resources/config/orrery.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    if let Err(e) = run() {
        log::error!("Fatal: {e}");
        return Err(e.into());
    }
    log::info!("Orrery shut down cleanly");
    Ok(())
}

fn run() -> Result<(), AppError> {
    let config = OrreryConfig::load_or_default(CONFIG_PATH)?;
    log::info!("Loaded configuration from {CONFIG_PATH}");

    let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
    let mut backend = VulkanBackend::new(&mut window, &config.renderer, &config.assets)?;

    let assets = SceneAssets::load(&config.assets)?;
    log::info!(
        "Loaded planet mesh with {} vertices and {} indices",
        assets.planet_mesh.vertices.len(),
        assets.planet_mesh.indices.len()
    );
    let resources = SceneResources::upload(&mut backend, &assets)?;
    drop(assets);

    let renderer = SceneRenderer::new(config.scene.layout.clone(), config.scene.lighting.clone(), resources);
    let mut app = AppContext::new(&config);
    let mut timer = Timer::new();

    log::info!("Entering main loop");
    while !app.close_requested() && !window.should_close() {
        for event in window.poll_events() {
            app.handle_event(event);
        }

        timer.update();
        app.advance(timer.delta_time());

        if app.take_resized() {
            recreate_swapchain(&mut window, &mut backend)?;
        }

        match renderer.render_frame(&mut backend, &app.frame_view()) {
            Ok(()) => {}
            Err(RenderError::SwapchainOutOfDate) => app.mark_resized(),
            Err(e) => return Err(e.into()),
        }

        if timer.frame_count() % 600 == 0 {
            log::debug!("Average FPS: {:.1}", timer.average_fps());
        }
    }

    window.set_should_close(true);
    log::info!(
        "Rendered {} frames over {:.1}s",
        timer.frame_count(),
        timer.total_time()
    );
    Ok(())
}

/// Rebuild the swapchain, blocking while the window is minimized
fn recreate_swapchain(window: &mut Window, backend: &mut VulkanBackend) -> Result<(), AppError> {
    let (mut width, mut height) = window.framebuffer_size();
    while width == 0 || height == 0 {
        if window.should_close() {
            return Ok(());
        }
        window.wait_events();
        (width, height) = window.framebuffer_size();
    }

    log::debug!("Recreating swapchain at {width}x{height}");
    backend.recreate_swapchain(window)?;
    Ok(())
}
