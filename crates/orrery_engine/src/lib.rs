//! # Orrery Engine
//!
//! A small Vulkan scene: a spinning textured planet lit by a point light, a
//! sun, a reference cube, a cubemap skybox and a pool of CPU-simulated
//! particles, viewed through a free-fly camera.
//!
//! ## Layout
//!
//! - **app**: per-session state ([`app::AppContext`]) and application errors
//! - **assets**: image, cubemap and OBJ loading
//! - **config**: TOML/RON configuration
//! - **foundation**: math, timing and logging
//! - **input**: backend-neutral input events
//! - **particles**: the fixed-size particle pool
//! - **render**: camera, scene orchestration, and the backends behind
//!   [`render::RenderBackend`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orrery_engine::prelude::*;
//!
//! let config = OrreryConfig::default();
//! let mut app = AppContext::new(&config);
//! let mut backend = RecordingBackend::new(800, 600);
//!
//! let assets = SceneAssets::load(&config.assets)?;
//! let resources = SceneResources::upload(&mut backend, &assets)?;
//! let renderer = SceneRenderer::new(config.scene.layout.clone(), config.scene.lighting.clone(), resources);
//!
//! app.advance(1.0 / 60.0);
//! renderer.render_frame(&mut backend, &app.frame_view())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod app;
pub mod assets;
pub mod config;
pub mod foundation;
pub mod input;
pub mod particles;
pub mod render;

pub use app::{AppContext, AppError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        app::{AppContext, AppError},
        assets::{AssetError, CubemapImages, ImageData, ObjLoader},
        config::{Config, OrreryConfig},
        foundation::{
            math::{Mat4, Vec3, Vec4},
            time::Timer,
        },
        input::{InputEvent, KeyCode},
        particles::{Particle, ParticlePool},
        render::{
            vulkan::{VulkanBackend, Window},
            FlyCamera, FrameView, PipelineState, RecordingBackend, RenderBackend, RenderError, SceneAssets,
            SceneRenderer, SceneResources,
        },
    };
}
