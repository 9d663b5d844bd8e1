//! Frame Renderer Integration Tests
//!
//! Tests for:
//! - Draw order: opaque before blended, blended back to front
//! - Failure isolation: one bad drawable never affects the others
//! - Per-draw state: winding, culling, attribute cleanup, texture units
//! - Skinning, morphing, lights and material variants reaching the shaders

mod common;

use common::{SceneBuilder, frame_input, init_logging, issued_draws};
use glam::{Mat4, Vec3};
use glint::gpu::{BlendMode, Capabilities, Face, FrontFace, GpuCommand, ImageData, RecordedUniform, SamplerState};
use glint::scene::{
    Accessor, AlphaMode, ElementType, Light, LightType, MaterialMapping, Material, MorphTarget,
    Node, Primitive, Semantic, Skin, TextureRole,
};
use glint::{
    ActiveCamera, RecordingContext, Renderer, RenderingParameters, ShaderCache, UserCamera,
};

fn blended() -> Material {
    Material::new().with_alpha_mode(AlphaMode::Blend)
}

fn uniform_writes<'a>(gl: &'a RecordingContext, name: &'a str) -> impl Iterator<Item = &'a RecordedUniform> {
    gl.commands().iter().filter_map(move |command| match command {
        GpuCommand::SetUniform { name: n, value } if n == name => Some(value),
        _ => None,
    })
}

// ============================================================================
// Draw Order
// ============================================================================

#[test]
fn frame_draws_opaque_then_blended() {
    init_logging();
    let mut builder = SceneBuilder::new();
    let first = builder.tagged_material(1.0, Material::new());
    let second = builder.tagged_material(2.0, Material::new().with_alpha_mode(AlphaMode::Mask));
    let glass = builder.tagged_material(3.0, blended());
    builder.triangle_node(glass, Vec3::new(0.0, 0.0, -1.0));
    builder.triangle_node(first, Vec3::ZERO);
    builder.triangle_node(second, Vec3::new(1.0, 0.0, 0.0));
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let report = Renderer::new().draw_frame(
        &mut gl,
        &mut cache,
        &mut gltf,
        &frame_input(&camera, &params, None),
    );

    assert_eq!(report.draws, 3);
    assert_eq!((report.opaque, report.blended, report.skipped), (2, 1, 0));

    let draws = issued_draws(&gl);
    let tags: Vec<f32> = draws.iter().map(common::IssuedDraw::tag).collect();
    assert_eq!(tags, vec![1.0, 2.0, 3.0]);
    assert_eq!(draws[0].call.blend, None);
    assert_eq!(draws[1].call.blend, None);
    assert_eq!(draws[2].call.blend, Some(BlendMode::Alpha));
}

#[test]
fn blended_drawables_sorted_back_to_front() {
    let mut builder = SceneBuilder::new();
    for (tag, z) in [(1.0, -1.0), (2.0, -5.0), (3.0, -3.0)] {
        let material = builder.tagged_material(tag, blended());
        builder.triangle_node(material, Vec3::new(0.0, 0.0, z));
    }
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    let draws = issued_draws(&gl);
    let tags: Vec<f32> = draws.iter().map(common::IssuedDraw::tag).collect();
    assert_eq!(tags, vec![2.0, 3.0, 1.0]);

    let distances: Vec<f32> = draws
        .iter()
        .map(|d| d.translation().distance(camera.position()))
        .collect();
    assert!(distances.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn swapping_blended_positions_reverses_order() {
    let mut builder = SceneBuilder::new();
    let near_material = builder.tagged_material(1.0, blended());
    let far_material = builder.tagged_material(2.0, blended());
    let a = builder.triangle_node(near_material, Vec3::new(0.0, 0.0, -1.0));
    let b = builder.triangle_node(far_material, Vec3::new(0.0, 0.0, -5.0));
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let mut renderer = Renderer::new();

    renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    let before: Vec<f32> = issued_draws(&gl).iter().map(common::IssuedDraw::tag).collect();
    assert_eq!(before, vec![2.0, 1.0]);

    let transform_a = gltf.nodes[a].transform;
    gltf.nodes[a].transform = gltf.nodes[b].transform;
    gltf.nodes[b].transform = transform_a;

    gl.clear_commands();
    renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    let after: Vec<f32> = issued_draws(&gl).iter().map(common::IssuedDraw::tag).collect();
    assert_eq!(after, vec![1.0, 2.0]);
}

// ============================================================================
// Failure Isolation
// ============================================================================

#[test]
fn out_of_range_texture_skips_only_that_drawable() {
    init_logging();
    let mut builder = SceneBuilder::new();
    let good = builder.tagged_material(1.0, Material::new());
    let broken = builder.tagged_material(2.0, Material::new().with_texture(TextureRole::BaseColor, 99, 0));
    let also_good = builder.tagged_material(3.0, Material::new());
    builder.triangle_node(good, Vec3::ZERO);
    builder.triangle_node(broken, Vec3::ZERO);
    builder.triangle_node(also_good, Vec3::ZERO);
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let report = Renderer::new().draw_frame(
        &mut gl,
        &mut cache,
        &mut gltf,
        &frame_input(&camera, &params, None),
    );

    assert_eq!(report.draws, 2);
    assert_eq!(report.skipped, 1);
    let tags: Vec<f32> = issued_draws(&gl).iter().map(common::IssuedDraw::tag).collect();
    assert_eq!(tags, vec![1.0, 3.0]);
}

#[test]
fn pending_texture_is_drawn_once_filled() {
    let mut builder = SceneBuilder::new();
    let texture = builder.pending_texture();
    let material = builder.material(Material::new().with_texture(TextureRole::BaseColor, texture, 0));
    builder.triangle_node(material, Vec3::ZERO);
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let mut renderer = Renderer::new();

    let report = renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    assert_eq!((report.draws, report.skipped), (0, 1));

    let loader_cell = gltf.textures[texture].cell().clone();
    loader_cell
        .fill(&mut gl, &ImageData::rgba8(1, 1, vec![255; 4]), SamplerState::default())
        .unwrap();

    gl.clear_commands();
    let report = renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    assert_eq!((report.draws, report.skipped), (1, 0));

    let draw = &issued_draws(&gl)[0];
    let texture_id = gltf.textures[texture].gpu_texture().unwrap();
    assert!(draw.call.textures.values().any(|&bound| bound == texture_id));
}

#[test]
fn compile_failure_skips_draw_and_is_not_retried() {
    init_logging();
    let mut builder = SceneBuilder::new();
    let material = builder.material(Material::new());
    builder.triangle_node(material, Vec3::ZERO);
    let normals = builder.accessor(Accessor::from_f32(ElementType::Vec3, &[0.0, 0.0, 1.0].repeat(3)).unwrap());
    let mesh = builder.mesh(vec![
        Primitive::new(builder.triangle_accessor())
            .with_attribute(Semantic::Normal, normals)
            .with_material(material),
    ]);
    builder.root(Node::new().with_mesh(mesh));
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    gl.fail_compile_when("#define HAS_NORMAL_VEC3");
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let mut renderer = Renderer::new();

    let report = renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    assert_eq!((report.draws, report.skipped), (1, 1));

    let compiles = gl.compile_count();
    let report = renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    assert_eq!((report.draws, report.skipped), (1, 1));
    assert_eq!(gl.compile_count(), compiles);
}

// ============================================================================
// Per-draw State
// ============================================================================

#[test]
fn mirrored_node_draws_clockwise() {
    let mut builder = SceneBuilder::new();
    let material = builder.material(Material::new());
    let mirrored = builder.triangle_node(material, Vec3::ZERO);
    builder.triangle_node(material, Vec3::ZERO);
    builder.gltf.nodes[mirrored].transform =
        glint::scene::LocalTransform::Matrix(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)));
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    let faces: Vec<FrontFace> = issued_draws(&gl).iter().map(|d| d.call.front_face).collect();
    assert_eq!(faces, vec![FrontFace::Cw, FrontFace::Ccw]);
}

#[test]
fn double_sided_disables_culling() {
    let mut builder = SceneBuilder::new();
    let single = builder.material(Material::new());
    let mut double = Material::new();
    double.double_sided = true;
    let double = builder.material(double);
    builder.triangle_node(single, Vec3::ZERO);
    builder.triangle_node(double, Vec3::ZERO);
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    let culls: Vec<Option<Face>> = issued_draws(&gl).iter().map(|d| d.call.cull_face).collect();
    assert_eq!(culls, vec![Some(Face::Back), None]);
}

#[test]
fn attributes_disabled_after_every_draw() {
    let mut builder = SceneBuilder::new();
    let material = builder.material(Material::new());
    let broken = builder.material(Material::new().with_texture(TextureRole::Emissive, 42, 0));
    builder.triangle_node(material, Vec3::ZERO);
    builder.triangle_node(broken, Vec3::ZERO);
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    let draws = issued_draws(&gl);
    assert_eq!(draws.len(), 1);
    assert!(!draws[0].call.enabled_attributes.is_empty());
    assert!(!draws[0].call.indexed);
    assert_eq!(draws[0].call.count, 3);
    assert!(gl.enabled_attributes().is_empty());
}

#[test]
fn indexed_primitive_uses_element_draw() {
    let mut builder = SceneBuilder::new();
    let indices = builder.accessor(Accessor::from_u16(ElementType::Scalar, &[0, 1, 2]).unwrap());
    let material = builder.material(Material::new());
    let mesh = builder.mesh(vec![
        Primitive::new(builder.triangle_accessor())
            .with_indices(indices)
            .with_material(material),
    ]);
    builder.root(Node::new().with_mesh(mesh));
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    let draws = issued_draws(&gl);
    assert!(draws[0].call.indexed);
    assert_eq!(draws[0].call.count, 3);
}

#[test]
fn material_textures_use_units_before_environment() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let environment = common::environment(&mut gl, &mut cache);
    gl.clear_commands();

    let mut builder = SceneBuilder::new();
    let base = builder.loaded_texture(&mut gl);
    let normal = builder.loaded_texture(&mut gl);
    let material = builder.material(
        Material::new()
            .with_texture(TextureRole::BaseColor, base, 0)
            .with_texture(TextureRole::Normal, normal, 0),
    );
    builder.triangle_node(material, Vec3::ZERO);
    let mut gltf = builder.build();

    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(
        &mut gl,
        &mut cache,
        &mut gltf,
        &frame_input(&camera, &params, Some(&environment)),
    );

    let call = &issued_draws(&gl)[0].call;
    assert_eq!(call.textures.get(&0), gltf.textures[base].gpu_texture().as_ref());
    assert_eq!(call.textures.get(&1), gltf.textures[normal].gpu_texture().as_ref());
    for (offset, texture) in environment.textures().into_iter().enumerate() {
        assert_eq!(call.textures.get(&(2 + offset as u32)), Some(&texture));
    }
}

#[test]
fn material_over_fragment_unit_limit_is_skipped() {
    init_logging();
    // two material textures + five environment units + the punctual LUT fit exactly
    let mut gl = RecordingContext::with_capabilities(Capabilities {
        max_texture_units: 8,
        ..Capabilities::default()
    });
    let mut cache = ShaderCache::new();
    let environment = common::environment(&mut gl, &mut cache);

    let mut builder = SceneBuilder::new();
    let textures: Vec<usize> = (0..3).map(|_| builder.loaded_texture(&mut gl)).collect();
    let fits = builder.tagged_material(
        1.0,
        Material::new()
            .with_texture(TextureRole::BaseColor, textures[0], 0)
            .with_texture(TextureRole::Normal, textures[1], 0),
    );
    let too_many = builder.tagged_material(
        2.0,
        Material::new()
            .with_texture(TextureRole::BaseColor, textures[0], 0)
            .with_texture(TextureRole::Normal, textures[1], 0)
            .with_texture(TextureRole::Emissive, textures[2], 0),
    );
    builder.triangle_node(fits, Vec3::ZERO);
    builder.triangle_node(too_many, Vec3::X);
    let mut gltf = builder.build();
    gl.clear_commands();

    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let report = Renderer::new().draw_frame(
        &mut gl,
        &mut cache,
        &mut gltf,
        &frame_input(&camera, &params, Some(&environment)),
    );

    assert_eq!(report.draws, 1);
    assert_eq!(report.skipped, 1);
    let draws = issued_draws(&gl);
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].tag(), 1.0);
}

// ============================================================================
// IBL Binding
// ============================================================================

fn environment_bound(use_ibl: bool) -> bool {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let environment = common::environment(&mut gl, &mut cache);
    gl.clear_commands();

    let mut builder = SceneBuilder::new();
    let opaque = builder.material(Material::new());
    let glass = builder.material(blended());
    builder.triangle_node(opaque, Vec3::ZERO);
    builder.triangle_node(opaque, Vec3::X);
    builder.triangle_node(glass, Vec3::Y);
    let mut gltf = builder.build();

    let camera = UserCamera::new();
    let params = RenderingParameters {
        use_ibl,
        ..Default::default()
    };
    let report = Renderer::new().draw_frame(
        &mut gl,
        &mut cache,
        &mut gltf,
        &frame_input(&camera, &params, Some(&environment)),
    );
    assert_eq!(report.draws, 3);

    let env_textures = environment.textures();
    let draws = issued_draws(&gl);
    let bound: Vec<bool> = draws
        .iter()
        .map(|d| env_textures.iter().all(|t| d.call.textures.values().any(|b| b == t)))
        .collect();
    assert!(bound.iter().all(|&b| b == bound[0]));
    bound[0]
}

#[test]
fn environment_textures_bound_only_with_ibl() {
    assert!(environment_bound(true));
    assert!(!environment_bound(false));
}

#[test]
fn background_drawn_first_when_enabled() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let environment = common::environment(&mut gl, &mut cache);
    gl.clear_commands();

    let mut builder = SceneBuilder::new();
    let material = builder.material(Material::new());
    builder.triangle_node(material, Vec3::ZERO);
    let mut gltf = builder.build();

    let camera = UserCamera::new();
    let params = RenderingParameters {
        environment_background: true,
        ..Default::default()
    };
    let report = Renderer::new().draw_frame(
        &mut gl,
        &mut cache,
        &mut gltf,
        &frame_input(&camera, &params, Some(&environment)),
    );

    assert_eq!(report.draws, 1);
    let draws = issued_draws(&gl);
    assert_eq!(draws.len(), 2);
    assert!(draws[0].call.enabled_attributes.is_empty());
    assert_eq!(draws[0].call.textures.get(&0), Some(&environment.ggx.id()));
    assert_eq!(gl.depth_state(), (true, true));
}

// ============================================================================
// Skinning, Morphing, Lights, Variants
// ============================================================================

fn skinned_scene() -> glint::Gltf {
    let mut builder = SceneBuilder::new();
    let joints = builder.accessor(Accessor::from_u16(ElementType::Vec4, &[0, 1, 0, 0].repeat(3)).unwrap());
    let weights =
        builder.accessor(Accessor::from_f32(ElementType::Vec4, &[0.5, 0.5, 0.0, 0.0].repeat(3)).unwrap());
    let material = builder.material(Material::new());
    let mesh = builder.mesh(vec![
        Primitive::new(builder.triangle_accessor())
            .with_attribute(Semantic::Joints(0), joints)
            .with_attribute(Semantic::Weights(0), weights)
            .with_material(material),
    ]);
    let joint_a = builder.root(Node::new().with_transform(common::translation(Vec3::X)));
    let joint_b = builder.root(Node::new().with_transform(common::translation(Vec3::Y)));
    builder.gltf.skins.push(Skin::new(vec![joint_a, joint_b], None));
    builder.root(Node::new().with_mesh(mesh).with_skin(0));
    builder.build()
}

#[test]
fn skinning_uploads_joint_matrices() {
    let mut gltf = skinned_scene();
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    assert!(gl.shader_sources().any(|source| source.contains("#define JOINT_COUNT 2")));
    let Some(RecordedUniform::Mat4Array(matrices)) = uniform_writes(&gl, "u_jointMatrix").last() else {
        panic!("joint matrices were not uploaded");
    };
    assert_eq!(matrices.len(), 2);
    assert_eq!(matrices[0], Mat4::from_translation(Vec3::X));
    assert_eq!(matrices[1], Mat4::from_translation(Vec3::Y));
}

#[test]
fn skinning_disabled_leaves_joints_out() {
    let mut gltf = skinned_scene();
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters {
        skinning: false,
        ..Default::default()
    };
    let report =
        Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    assert_eq!(report.draws, 1);
    assert!(!gl.shader_sources().any(|source| source.contains("#define USE_SKINNING")));
    assert_eq!(uniform_writes(&gl, "u_jointMatrix").count(), 0);
}

#[test]
fn morph_weights_follow_node_override() {
    let mut builder = SceneBuilder::new();
    let offsets = builder.accessor(Accessor::from_f32(ElementType::Vec3, &[0.0; 9]).unwrap());
    let material = builder.material(Material::new());
    let mut primitive = Primitive::new(builder.triangle_accessor()).with_material(material);
    primitive.targets = vec![
        MorphTarget {
            position: Some(offsets),
            ..Default::default()
        };
        2
    ];
    let mesh = builder.mesh(vec![primitive]);
    builder.gltf.meshes[mesh].weights = vec![0.1, 0.2];
    let mut node = Node::new().with_mesh(mesh);
    node.weights = Some(vec![0.7, 0.3]);
    builder.root(node);
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    assert!(gl.shader_sources().any(|source| source.contains("#define WEIGHT_COUNT 2")));
    assert_eq!(
        uniform_writes(&gl, "u_morphWeights").last(),
        Some(&RecordedUniform::FloatArray(vec![0.7, 0.3]))
    );
}

#[test]
fn reachable_lights_reach_the_fragment_shader() {
    let mut builder = SceneBuilder::new();
    let material = builder.material(Material::new());
    builder.triangle_node(material, Vec3::ZERO);
    let mut light = Light::new(LightType::Spot);
    light.color = Vec3::new(1.0, 0.5, 0.25);
    builder.gltf.lights.push(light);
    builder.root(Node::new().with_light(0));
    builder.root(Node::new().with_light(5));
    builder.gltf.nodes.push(Node::new().with_light(0));
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    assert!(gl.shader_sources().any(|source| source.contains("#define LIGHT_COUNT 1")));
    assert_eq!(
        uniform_writes(&gl, "u_Lights[0].color").last(),
        Some(&RecordedUniform::Vec3(Vec3::new(1.0, 0.5, 0.25)))
    );
    assert_eq!(
        uniform_writes(&gl, "u_Lights[0].type").last(),
        Some(&RecordedUniform::Int(2))
    );
}

#[test]
fn material_variant_selects_mapped_material() {
    let mut builder = SceneBuilder::new();
    let default_material = builder.tagged_material(1.0, Material::new());
    let variant_material = builder.tagged_material(2.0, Material::new());
    let mut primitive = Primitive::new(builder.triangle_accessor()).with_material(default_material);
    primitive.mappings.push(MaterialMapping {
        material: variant_material,
        variants: vec![1],
    });
    let mesh = builder.mesh(vec![primitive]);
    builder.root(Node::new().with_mesh(mesh));
    builder.gltf.variants = vec!["day".into(), "night".into()];
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let mut renderer = Renderer::new();

    for (variant, expected) in [(None, 1.0), (Some(0), 1.0), (Some(1), 2.0)] {
        gl.clear_commands();
        let input = glint::FrameInput {
            variant,
            ..frame_input(&camera, &params, None)
        };
        renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &input);
        assert_eq!(issued_draws(&gl)[0].tag(), expected);
    }
}

// ============================================================================
// Camera & Frame Setup
// ============================================================================

#[test]
fn out_of_range_scene_camera_uses_user_camera() {
    let mut gltf = SceneBuilder::new().build();
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let input = glint::FrameInput {
        camera: ActiveCamera::Scene(4),
        ..frame_input(&camera, &params, None)
    };
    let mut renderer = Renderer::new();
    renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &input);

    assert_eq!(renderer.last_camera(), Some(&camera.state(640.0 / 480.0)));
}

#[test]
fn frame_clears_and_sets_viewport() {
    let mut gltf = SceneBuilder::new().build();
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters {
        clear_color: [0.0, 0.0, 1.0, 1.0],
        ..Default::default()
    };
    let report =
        Renderer::new().draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));

    assert_eq!(report, glint::FrameReport::default());
    assert_eq!(gl.viewport(), (0, 0, 640, 480));
    assert!(gl
        .commands()
        .contains(&GpuCommand::Clear(glam::Vec4::new(0.0, 0.0, 1.0, 1.0))));
}

#[test]
fn second_frame_compiles_nothing() {
    let mut builder = SceneBuilder::new();
    let material = builder.material(Material::new());
    builder.triangle_node(material, Vec3::ZERO);
    builder.triangle_node(material, Vec3::X);
    let mut gltf = builder.build();

    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let camera = UserCamera::new();
    let params = RenderingParameters::default();
    let mut renderer = Renderer::new();

    renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    assert_eq!(gl.compile_count(), 2);
    assert_eq!(gl.link_count(), 1);

    renderer.draw_frame(&mut gl, &mut cache, &mut gltf, &frame_input(&camera, &params, None));
    assert_eq!(gl.compile_count(), 2);
    assert_eq!(gl.link_count(), 1);
}
