//! Shared builders for the integration tests.

#![allow(dead_code)]

use glam::{Mat4, Quat, Vec3, Vec4};
use glint::gpu::{GpuCommand, GpuTexture, ImageData, RecordedUniform, SamplerState};
use glint::ibl::{Environment, IblSampler, IblSettings, PanoramaImage};
use glint::renderer::FrameInput;
use glint::scene::{
    Accessor, ElementType, LocalTransform, Material, Mesh, Node, Primitive, Scene, Texture,
};
use glint::{ActiveCamera, Gltf, RecordingContext, RenderingParameters, ShaderCache, UserCamera};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn translation(offset: Vec3) -> LocalTransform {
    LocalTransform::Trs {
        translation: offset,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    }
}

/// Builds documents with one scene whose roots are the added nodes.
pub struct SceneBuilder {
    pub gltf: Gltf,
    triangle: usize,
}

impl SceneBuilder {
    pub fn new() -> Self {
        let mut gltf = Gltf::new();
        gltf.accessors.push(
            Accessor::from_f32(
                ElementType::Vec3,
                &[-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0],
            )
            .unwrap(),
        );
        gltf.scenes.push(Scene::default());
        gltf.scene = Some(0);
        Self { gltf, triangle: 0 }
    }

    pub fn triangle_accessor(&self) -> usize {
        self.triangle
    }

    pub fn accessor(&mut self, accessor: Accessor) -> usize {
        self.gltf.accessors.push(accessor);
        self.gltf.accessors.len() - 1
    }

    pub fn material(&mut self, material: Material) -> usize {
        self.gltf.materials.push(material);
        self.gltf.materials.len() - 1
    }

    /// A material whose base color identifies it in the command log.
    pub fn tagged_material(&mut self, tag: f32, material: Material) -> usize {
        let mut material = material;
        material.factors.base_color = Vec4::new(tag, 0.0, 0.0, 1.0);
        self.material(material)
    }

    /// Creates a 1x1 texture on `gl` and registers it as loaded.
    pub fn loaded_texture(&mut self, gl: &mut RecordingContext) -> usize {
        let texture = GpuTexture::from_image(
            gl,
            "test texture",
            &ImageData::rgba8(1, 1, vec![255; 4]),
            SamplerState::default(),
        )
        .unwrap();
        self.gltf
            .textures
            .push(Texture::loaded(texture.id(), SamplerState::default()));
        self.gltf.textures.len() - 1
    }

    /// A texture whose image has not arrived yet.
    pub fn pending_texture(&mut self) -> usize {
        self.gltf.textures.push(Texture::new(SamplerState::default()));
        self.gltf.textures.len() - 1
    }

    pub fn mesh(&mut self, primitives: Vec<Primitive>) -> usize {
        self.gltf.meshes.push(Mesh::new(primitives));
        self.gltf.meshes.len() - 1
    }

    /// Adds a root node.
    pub fn root(&mut self, node: Node) -> usize {
        self.gltf.nodes.push(node);
        let index = self.gltf.nodes.len() - 1;
        self.gltf.scenes[0].nodes.push(index);
        index
    }

    /// Adds a root node drawing one triangle with `material` at `offset`.
    pub fn triangle_node(&mut self, material: usize, offset: Vec3) -> usize {
        let mesh = self.mesh(vec![Primitive::new(self.triangle).with_material(material)]);
        self.root(Node::new().with_mesh(mesh).with_transform(translation(offset)))
    }

    pub fn build(mut self) -> Gltf {
        self.gltf.prepare();
        self.gltf
    }
}

pub fn frame_input<'a>(
    user_camera: &'a UserCamera,
    params: &'a RenderingParameters,
    environment: Option<&'a Environment>,
) -> FrameInput<'a> {
    FrameInput {
        scene: None,
        camera: ActiveCamera::User,
        user_camera,
        variant: None,
        params,
        environment,
        width: 640,
        height: 480,
    }
}

/// Small settings so a full precomputation stays cheap.
pub fn tiny_ibl_settings() -> IblSettings {
    IblSettings {
        cubemap_size: 16,
        texture_size: 8,
        lut_resolution: 4,
        ..IblSettings::default()
    }
}

pub fn tiny_panorama() -> PanoramaImage {
    PanoramaImage::new(4, 2, vec![1.0; 4 * 2 * 3]).unwrap()
}

pub fn environment(gl: &mut RecordingContext, cache: &mut ShaderCache) -> Environment {
    IblSampler::new(tiny_ibl_settings())
        .process(gl, cache, &tiny_panorama(), None, (640, 480))
        .unwrap()
}

/// What each recorded draw was issued with, read back from the uniform
/// writes that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedDraw {
    pub model: Mat4,
    pub base_color: Vec4,
    pub call: glint::gpu::DrawCall,
}

impl IssuedDraw {
    pub fn translation(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }

    pub fn tag(&self) -> f32 {
        self.base_color.x
    }
}

pub fn issued_draws(gl: &RecordingContext) -> Vec<IssuedDraw> {
    let mut model = Mat4::IDENTITY;
    let mut base_color = Vec4::ONE;
    let mut draws = Vec::new();
    for command in gl.commands() {
        match command {
            GpuCommand::SetUniform {
                name,
                value: RecordedUniform::Mat4(m),
            } if name == "u_ModelMatrix" => model = *m,
            GpuCommand::SetUniform {
                name,
                value: RecordedUniform::Vec4(v),
            } if name == "u_BaseColorFactor" => base_color = *v,
            GpuCommand::Draw(call) => draws.push(IssuedDraw {
                model,
                base_color,
                call: call.clone(),
            }),
            _ => {}
        }
    }
    draws
}
