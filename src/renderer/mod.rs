//! Frame Renderer
//!
//! [`Renderer::draw_frame`] turns the current document state into draw calls:
//!
//! 1. clear, update world transforms, resolve camera and lights, update skins
//! 2. optional environment background
//! 3. flatten reachable primitives into drawables
//! 4. draw opaque drawables, then blended ones sorted back to front
//!
//! A failing drawable is logged and skipped; it never aborts the frame.
//! The renderer keeps its per-frame lists between frames to reuse their
//! allocations, nothing else.

pub mod background;
pub mod draw;
pub mod drawable;
pub mod lights;
pub mod statistics;

pub use draw::{DrawContext, draw_primitive, front_face_for};
pub use drawable::Drawable;
pub use statistics::SceneStatistics;

use log::{debug, warn};

use crate::camera::{ActiveCamera, CameraState, UserCamera, resolve_camera};
use crate::gpu::GraphicsContext;
use crate::ibl::Environment;
use crate::scene::{Gltf, LightUniform};
use crate::settings::RenderingParameters;
use crate::shader::ShaderCache;

/// Everything the host chooses for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Scene to render; `None` uses the document's default scene.
    pub scene: Option<usize>,
    pub camera: ActiveCamera,
    pub user_camera: &'a UserCamera,
    /// Active material variant.
    pub variant: Option<usize>,
    pub params: &'a RenderingParameters,
    pub environment: Option<&'a Environment>,
    pub width: u32,
    pub height: u32,
}

/// Outcome of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Primitive draws issued (the background is not counted).
    pub draws: usize,
    /// Drawables skipped because of a resource or shader failure.
    pub skipped: usize,
    pub opaque: usize,
    pub blended: usize,
}

/// Per-frame draw orchestrator.
#[derive(Default)]
pub struct Renderer {
    drawables: Vec<Drawable>,
    opaque: Vec<Drawable>,
    blended: Vec<Drawable>,
    lights: Vec<LightUniform>,
    camera: Option<CameraState>,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera resolved by the last frame.
    #[must_use]
    pub fn last_camera(&self) -> Option<&CameraState> {
        self.camera.as_ref()
    }

    /// Draws one frame into the default framebuffer.
    pub fn draw_frame(
        &mut self,
        gl: &mut impl GraphicsContext,
        cache: &mut ShaderCache,
        gltf: &mut Gltf,
        input: &FrameInput<'_>,
    ) -> FrameReport {
        let params = input.params;
        gl.bind_framebuffer(None);
        gl.set_viewport(0, 0, input.width, input.height);
        gl.set_depth_test(true);
        gl.set_depth_write(true);
        gl.clear(params.clear_color());

        self.drawables.clear();
        self.opaque.clear();
        self.blended.clear();
        self.lights.clear();

        let Some(scene) = gltf.active_scene(input.scene).cloned() else {
            debug!("document has no scene; nothing to draw");
            return FrameReport::default();
        };
        gltf.update_world_transforms(&scene);
        let reachable = gltf.reachable_nodes(&scene);

        let aspect = input.width.max(1) as f32 / input.height.max(1) as f32;
        let camera = resolve_camera(input.camera, input.user_camera, gltf, &reachable, aspect);
        self.camera = Some(camera);

        lights::collect_lights(gltf, &reachable, &mut self.lights);
        gltf.update_skins(&reachable);
        let gltf: &Gltf = gltf;

        if let (true, Some(environment)) = (params.environment_background, input.environment) {
            if let Err(err) =
                background::draw_background(gl, cache, environment, &camera, params)
            {
                warn!("environment background skipped: {err}");
            }
        }

        drawable::flatten(gltf, &reachable, input.variant, &mut self.drawables);
        drawable::partition(gltf, &self.drawables, &mut self.opaque, &mut self.blended);
        drawable::sort_back_to_front(gltf, camera.position, &mut self.blended);

        let ctx = DrawContext {
            camera: &camera,
            params,
            lights: &self.lights,
            environment: input.environment,
        };
        let mut report = FrameReport::default();
        for (drawable, blended) in self
            .opaque
            .iter()
            .map(|d| (d, false))
            .chain(self.blended.iter().map(|d| (d, true)))
        {
            match draw_primitive(gl, cache, gltf, drawable, &ctx) {
                Ok(()) => {
                    report.draws += 1;
                    if blended {
                        report.blended += 1;
                    } else {
                        report.opaque += 1;
                    }
                }
                Err(err) => {
                    warn!(
                        "skipping primitive {} of mesh {} on node {}: {err}",
                        drawable.primitive, drawable.mesh, drawable.node
                    );
                    report.skipped += 1;
                }
            }
        }

        gl.set_blend(None);
        gl.set_depth_write(true);
        report
    }
}
