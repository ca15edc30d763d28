//! # Scene renderer
//!
//! Issues one frame of the demo as a fixed sequence of passes:
//!
//! 1. clear and per-frame lighting
//! 2. reference cube
//! 3. particles, one point per particle, under a fixed side view
//! 4. textured planet spinning around the Y axis
//! 5. sun
//! 6. skybox at the far plane
//!
//! Each pass hands the backend a complete [`PipelineState`]. The skybox is the
//! only pass using `LessOrEqual`, and because the next frame's first pass names
//! `Less` again, no depth state leaks between frames.

use serde::{Deserialize, Serialize};

use crate::assets::{AssetError, CubemapImages, ImageData, ObjLoader};
use crate::config::AssetConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::particles::Particle;
use crate::render::backend::{
    BackendResult, ClearValues, DrawCall, LightingUniforms, MeshId, RenderBackend, TextureId,
};
use crate::render::camera::{FlyCamera, FAR_PLANE, NEAR_PLANE};
use crate::render::mesh::Mesh;
use crate::render::pipeline_state::{PipelineState, TextureBinding};

/// Placement constants for the scene objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLayout {
    /// Eye of the fixed view the particles are drawn from, looking at the origin
    pub particle_view_eye: [f32; 3],
    /// Field of view of the particle projection in degrees
    pub particle_fov: f32,
    /// Uniform scale applied to every particle
    pub particle_scale: f32,
    /// Planet offset from the spin axis
    pub planet_offset: [f32; 3],
    /// Planet uniform scale
    pub planet_scale: f32,
    /// Planet spin in radians per second
    pub planet_spin_rate: f32,
    /// Planet tint
    pub planet_color: [f32; 3],
    /// Sun position
    pub sun_position: [f32; 3],
    /// Sun uniform scale
    pub sun_scale: f32,
    /// Sun tint
    pub sun_color: [f32; 3],
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            particle_view_eye: [3.0, -3.0, 3.0],
            particle_fov: 45.0,
            particle_scale: 5.0,
            planet_offset: [0.01, 3.5, -2.0],
            planet_scale: 0.1,
            planet_spin_rate: 0.5,
            planet_color: [1.0, 1.0, 1.0],
            sun_position: [0.0, 3.5, -1.0],
            sun_scale: 0.2,
            sun_color: [1.0, 1.1, 1.0],
        }
    }
}

/// Light, clear color and reference cube color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingParams {
    /// Point light position
    pub light_position: [f32; 3],
    /// Light color
    pub light_color: [f32; 3],
    /// Color of the reference cube
    pub object_color: [f32; 3],
    /// Framebuffer clear color
    pub clear_color: [f32; 4],
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            light_position: [1.2, 1.0, -8.0],
            light_color: [1.0, 1.0, 1.0],
            object_color: [1.0, 0.5, 0.31],
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

/// Decoded scene assets, ready for upload
#[derive(Debug, Clone)]
pub struct SceneAssets {
    /// Mesh shared by planet and sun
    pub planet_mesh: Mesh,
    /// Planet diffuse texture
    pub planet_texture: ImageData,
    /// Skybox faces
    pub skybox: CubemapImages,
}

impl SceneAssets {
    /// Load every asset named in the configuration
    pub fn load(config: &AssetConfig) -> Result<Self, AssetError> {
        let planet_mesh = ObjLoader::load_obj(&config.planet_mesh)?;
        let planet_texture = ImageData::from_file(&config.planet_texture)?;
        let skybox = CubemapImages::from_directory(&config.skybox_directory, &config.skybox_extension)?;

        Ok(Self {
            planet_mesh,
            planet_texture,
            skybox,
        })
    }
}

/// Backend handles for everything the scene draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneResources {
    /// Reference cube
    pub cube: MeshId,
    /// Single point used for every particle
    pub particle: MeshId,
    /// Planet and sun mesh
    pub planet: MeshId,
    /// Skybox cube
    pub skybox: MeshId,
    /// Planet diffuse texture
    pub planet_texture: TextureId,
    /// Skybox cube texture
    pub skybox_texture: TextureId,
}

impl SceneResources {
    /// Upload the built-in meshes and the loaded assets
    pub fn upload<B: RenderBackend + ?Sized>(backend: &mut B, assets: &SceneAssets) -> BackendResult<Self> {
        let resources = Self {
            cube: backend.upload_mesh(&Mesh::cube())?,
            particle: backend.upload_mesh(&Mesh::point())?,
            planet: backend.upload_mesh(&assets.planet_mesh)?,
            skybox: backend.upload_mesh(&Mesh::skybox())?,
            planet_texture: backend.upload_texture(&assets.planet_texture)?,
            skybox_texture: backend.upload_cubemap(&assets.skybox)?,
        };
        log::info!("Uploaded scene resources");
        Ok(resources)
    }
}

/// Per-frame inputs to the scene renderer
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Camera to render from
    pub camera: &'a FlyCamera,
    /// Particles to draw
    pub particles: &'a [Particle],
    /// Seconds since startup, drives the planet spin
    pub elapsed: f32,
}

/// Draws the demo scene through a [`RenderBackend`]
#[derive(Debug, Clone)]
pub struct SceneRenderer {
    layout: SceneLayout,
    lighting: LightingParams,
    resources: SceneResources,
}

impl SceneRenderer {
    /// Create a renderer for already uploaded resources
    pub fn new(layout: SceneLayout, lighting: LightingParams, resources: SceneResources) -> Self {
        Self {
            layout,
            lighting,
            resources,
        }
    }

    /// Backend handles in use
    pub fn resources(&self) -> &SceneResources {
        &self.resources
    }

    /// Render one frame
    ///
    /// # Errors
    /// Backend errors are returned unchanged, including
    /// [`RenderError::SwapchainOutOfDate`](crate::render::RenderError::SwapchainOutOfDate)
    /// from `end_frame`.
    pub fn render_frame<B: RenderBackend + ?Sized>(&self, backend: &mut B, frame: &FrameView<'_>) -> BackendResult<()> {
        let aspect = aspect_ratio(backend.extent());
        let camera = frame.camera;
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(aspect);

        backend.begin_frame(ClearValues {
            color: self.lighting.clear_color,
            depth: 1.0,
        })?;
        backend.set_lighting(&LightingUniforms {
            light_position: Vec3::from(self.lighting.light_position),
            view_position: camera.position(),
            light_color: Vec3::from(self.lighting.light_color),
        })?;

        // Reference cube
        backend.draw(
            &PipelineState::lit(TextureBinding::None),
            &DrawCall {
                mesh: self.resources.cube,
                model: Mat4::identity(),
                view,
                projection,
                object_color: opaque(self.lighting.object_color),
            },
        )?;

        self.draw_particles(backend, frame.particles, aspect)?;

        // Planet
        backend.draw(
            &PipelineState::lit(TextureBinding::Diffuse(self.resources.planet_texture)),
            &DrawCall {
                mesh: self.resources.planet,
                model: self.planet_model(frame.elapsed),
                view,
                projection,
                object_color: opaque(self.layout.planet_color),
            },
        )?;

        // Sun
        backend.draw(
            &PipelineState::lit(TextureBinding::None),
            &DrawCall {
                mesh: self.resources.planet,
                model: self.sun_model(),
                view,
                projection,
                object_color: opaque(self.layout.sun_color),
            },
        )?;

        // Skybox last, after the depth buffer holds the scene
        backend.draw(
            &PipelineState::skybox(self.resources.skybox_texture),
            &DrawCall {
                mesh: self.resources.skybox,
                model: Mat4::identity(),
                view: camera.rotation_only_view(),
                projection,
                object_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            },
        )?;

        backend.end_frame()
    }

    /// Planet transform at `elapsed` seconds: spin, then offset, then scale
    pub fn planet_model(&self, elapsed: f32) -> Mat4 {
        Mat4::rotation_y(elapsed * self.layout.planet_spin_rate)
            * Mat4::new_translation(&Vec3::from(self.layout.planet_offset))
            * Mat4::new_scaling(self.layout.planet_scale)
    }

    /// Sun transform
    pub fn sun_model(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::from(self.layout.sun_position)) * Mat4::new_scaling(self.layout.sun_scale)
    }

    /// Fixed view the particles are drawn with
    pub fn particle_view(&self) -> Mat4 {
        Mat4::look_at(Vec3::from(self.layout.particle_view_eye), Vec3::zeros(), Vec3::y())
    }

    fn draw_particles<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        particles: &[Particle],
        aspect: f32,
    ) -> BackendResult<()> {
        let state = PipelineState::particles();
        let view = self.particle_view();
        let projection = Mat4::perspective(utils::deg_to_rad(self.layout.particle_fov), aspect, NEAR_PLANE, FAR_PLANE);
        let scale = Mat4::new_scaling(self.layout.particle_scale);

        for particle in particles {
            backend.draw(
                &state,
                &DrawCall {
                    mesh: self.resources.particle,
                    model: Mat4::new_translation(&particle.position) * scale,
                    view,
                    projection,
                    object_color: particle.color,
                },
            )?;
        }
        Ok(())
    }
}

/// Width over height, or 1 for a degenerate (minimized) framebuffer
pub fn aspect_ratio((width, height): (u32, u32)) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

fn opaque([r, g, b]: [f32; 3]) -> Vec4 {
    Vec4::new(r, g, b, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use crate::particles::ParticlePool;
    use crate::render::backend::RenderError;
    use crate::render::pipeline_state::{BlendMode, DepthCompare, ShaderProgram};
    use crate::render::recording::{RecordedCommand, RecordingBackend};
    use approx::assert_relative_eq;

    fn test_assets() -> SceneAssets {
        SceneAssets {
            planet_mesh: Mesh::cube(),
            planet_texture: ImageData::solid_color(2, 2, [255, 255, 255, 255]),
            skybox: CubemapImages::from_faces(std::array::from_fn(|_| ImageData::solid_color(4, 4, [0, 0, 255, 255])))
                .unwrap(),
        }
    }

    fn setup(width: u32, height: u32) -> (RecordingBackend, SceneRenderer) {
        let mut backend = RecordingBackend::new(width, height);
        let resources = SceneResources::upload(&mut backend, &test_assets()).unwrap();
        let renderer = SceneRenderer::new(SceneLayout::default(), LightingParams::default(), resources);
        (backend, renderer)
    }

    fn pool(count: usize) -> ParticlePool {
        ParticlePool::seeded(count, Vec3::new(-0.19, 0.90, 0.0), 7)
    }

    #[test]
    fn test_pass_order() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::default();
        let particles = pool(3);
        let frame = FrameView {
            camera: &camera,
            particles: particles.particles(),
            elapsed: 0.0,
        };

        renderer.render_frame(&mut backend, &frame).unwrap();

        let commands = backend.commands();
        assert_eq!(commands.len(), 2 + 1 + 3 + 3 + 1);
        assert_eq!(
            commands[0],
            RecordedCommand::BeginFrame(ClearValues {
                color: [0.1, 0.1, 0.1, 1.0],
                depth: 1.0,
            })
        );
        assert!(matches!(commands[1], RecordedCommand::SetLighting(_)));
        assert_eq!(commands.last(), Some(&RecordedCommand::EndFrame));

        let res = *renderer.resources();
        let draws: Vec<_> = backend.draws().map(|(state, call)| (state.program, call.mesh)).collect();
        assert_eq!(
            draws,
            vec![
                (ShaderProgram::Lit, res.cube),
                (ShaderProgram::Particle, res.particle),
                (ShaderProgram::Particle, res.particle),
                (ShaderProgram::Particle, res.particle),
                (ShaderProgram::Lit, res.planet),
                (ShaderProgram::Lit, res.planet),
                (ShaderProgram::Skybox, res.skybox),
            ]
        );
    }

    #[test]
    fn test_pass_states() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::default();
        let particles = pool(1);
        let frame = FrameView {
            camera: &camera,
            particles: particles.particles(),
            elapsed: 0.0,
        };
        renderer.render_frame(&mut backend, &frame).unwrap();

        let res = *renderer.resources();
        let states: Vec<PipelineState> = backend.draws().map(|(state, _)| *state).collect();
        assert_eq!(
            states,
            vec![
                PipelineState::lit(TextureBinding::None),
                PipelineState::particles(),
                PipelineState::lit(TextureBinding::Diffuse(res.planet_texture)),
                PipelineState::lit(TextureBinding::None),
                PipelineState::skybox(res.skybox_texture),
            ]
        );
        assert_eq!(states[1].blend, BlendMode::AlphaBlend);
        assert!(states.iter().filter(|s| s.program != ShaderProgram::Particle).all(|s| s.blend == BlendMode::Opaque));
        assert_eq!(states[4].depth, DepthCompare::LessOrEqual);
    }

    #[test]
    fn test_depth_state_resets_each_frame() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::default();
        let frame = FrameView {
            camera: &camera,
            particles: &[],
            elapsed: 0.0,
        };

        renderer.render_frame(&mut backend, &frame).unwrap();
        renderer.render_frame(&mut backend, &frame).unwrap();

        let depths: Vec<DepthCompare> = backend.draws().map(|(state, _)| state.depth).collect();
        assert_eq!(depths.len(), 8);
        assert_eq!(depths[3], DepthCompare::LessOrEqual);
        assert_eq!(depths[4], DepthCompare::Less);

        // A later frame on its own starts from Less again
        backend.clear_commands();
        renderer.render_frame(&mut backend, &frame).unwrap();
        assert!(matches!(backend.commands().first(), Some(RecordedCommand::BeginFrame(_))));
        let (first, _) = backend.draws().next().unwrap();
        assert_eq!(first.depth, DepthCompare::Less);
    }

    #[test]
    fn test_lighting_uses_camera_position() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::at(Vec3::new(2.0, 3.0, 4.0));
        let frame = FrameView {
            camera: &camera,
            particles: &[],
            elapsed: 0.0,
        };
        renderer.render_frame(&mut backend, &frame).unwrap();

        assert_eq!(
            backend.commands()[1],
            RecordedCommand::SetLighting(LightingUniforms {
                light_position: Vec3::new(1.2, 1.0, -8.0),
                view_position: Vec3::new(2.0, 3.0, 4.0),
                light_color: Vec3::new(1.0, 1.0, 1.0),
            })
        );
    }

    #[test]
    fn test_object_transforms_and_colors() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::default();
        let frame = FrameView {
            camera: &camera,
            particles: &[],
            elapsed: 0.0,
        };
        renderer.render_frame(&mut backend, &frame).unwrap();

        let calls: Vec<DrawCall> = backend.draws().map(|(_, call)| call.clone()).collect();
        let (cube, planet, sun) = (&calls[0], &calls[1], &calls[2]);

        assert_eq!(cube.model, Mat4::identity());
        assert_relative_eq!(cube.object_color, Vec4::new(1.0, 0.5, 0.31, 1.0));
        assert_relative_eq!(cube.view, camera.view_matrix());
        assert_relative_eq!(cube.projection, camera.projection_matrix(800.0 / 600.0));

        let planet_origin = planet.model.transform_point(&Point3::origin());
        assert_relative_eq!(planet_origin.coords, Vec3::new(0.01, 3.5, -2.0), epsilon = 1e-6);
        assert_relative_eq!(planet.model[(0, 0)], 0.1, epsilon = 1e-6);

        assert_relative_eq!(
            sun.model,
            Mat4::new_translation(&Vec3::new(0.0, 3.5, -1.0)) * Mat4::new_scaling(0.2)
        );
        assert_relative_eq!(sun.object_color, Vec4::new(1.0, 1.1, 1.0, 1.0));
    }

    #[test]
    fn test_planet_spins_around_y() {
        let (_, renderer) = setup(800, 600);

        // Half a turn takes 2 * PI seconds at 0.5 rad/s
        let model = renderer.planet_model(std::f32::consts::TAU);
        let origin = model.transform_point(&Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(-0.01, 3.5, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_particle_draw_parameters() {
        let (mut backend, renderer) = setup(1000, 500);
        let camera = FlyCamera::default();
        let mut particles = pool(1);
        particles.particles_mut()[0].position = Vec3::new(1.0, 2.0, 3.0);
        let frame = FrameView {
            camera: &camera,
            particles: particles.particles(),
            elapsed: 0.0,
        };
        renderer.render_frame(&mut backend, &frame).unwrap();

        let (_, call) = backend.draws().nth(1).unwrap();
        assert_relative_eq!(
            call.model,
            Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)) * Mat4::new_scaling(5.0)
        );
        assert_relative_eq!(
            call.view,
            Mat4::look_at(Vec3::new(3.0, -3.0, 3.0), Vec3::zeros(), Vec3::y())
        );
        assert_relative_eq!(
            call.projection,
            Mat4::perspective(utils::deg_to_rad(45.0), 2.0, 0.1, 100.0)
        );
        assert_eq!(call.object_color, Vec4::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_skybox_view_has_no_translation() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::at(Vec3::new(50.0, -20.0, 7.0));
        let frame = FrameView {
            camera: &camera,
            particles: &[],
            elapsed: 0.0,
        };
        renderer.render_frame(&mut backend, &frame).unwrap();

        let (state, call) = backend.draws().last().unwrap();
        assert_eq!(state.program, ShaderProgram::Skybox);
        assert_eq!(call.model, Mat4::identity());
        assert_relative_eq!(call.view, camera.rotation_only_view());
        assert_eq!(call.view[(0, 3)], 0.0);
        assert_eq!(call.view[(1, 3)], 0.0);
        assert_eq!(call.view[(2, 3)], 0.0);
    }

    #[test]
    fn test_zero_height_uses_unit_aspect() {
        assert_eq!(aspect_ratio((800, 0)), 1.0);
        assert_relative_eq!(aspect_ratio((800, 600)), 4.0 / 3.0);

        let (mut backend, renderer) = setup(640, 0);
        let camera = FlyCamera::default();
        let frame = FrameView {
            camera: &camera,
            particles: &[],
            elapsed: 0.0,
        };
        renderer.render_frame(&mut backend, &frame).unwrap();

        let (_, cube) = backend.draws().next().unwrap();
        assert_relative_eq!(cube.projection, camera.projection_matrix(1.0));
    }

    #[test]
    fn test_aspect_follows_resize() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::default();
        let frame = FrameView {
            camera: &camera,
            particles: &[],
            elapsed: 0.0,
        };
        backend.set_extent(1200, 600);
        renderer.render_frame(&mut backend, &frame).unwrap();

        let (_, cube) = backend.draws().next().unwrap();
        assert_relative_eq!(cube.projection, camera.projection_matrix(2.0));
    }

    #[test]
    fn test_backend_errors_propagate() {
        let (mut backend, renderer) = setup(800, 600);
        let camera = FlyCamera::default();
        let frame = FrameView {
            camera: &camera,
            particles: &[],
            elapsed: 0.0,
        };
        backend.fail_presents(1);

        let result = renderer.render_frame(&mut backend, &frame);
        assert!(matches!(result, Err(RenderError::SwapchainOutOfDate)));
    }
}
