//! Drawing a single primitive.
//!
//! Everything that can fail without touching GL state (material, textures,
//! program) is resolved first; once attributes are enabled they are always
//! disabled again before returning.

use glam::Mat4;
use smallvec::SmallVec;

use super::drawable::Drawable;
use crate::camera::CameraState;
use crate::errors::{GlintError, Result};
use crate::gpu::{
    BlendMode, BufferTarget, Face, FrontFace, GraphicsContext, IndexType, SlotPlan, TextureId,
    UniformValue,
};
use crate::ibl::Environment;
use crate::scene::{AlphaMode, Gltf, LightUniform, MAX_MORPH_TARGETS, Semantic, TextureRole};
use crate::settings::RenderingParameters;
use crate::shader::{
    CompiledProgram, DefineKey, DefineValue, GlobalFeatures, PrimitiveFeatures, ShaderCache,
    ShaderDefines, names,
};

/// Frame-wide inputs shared by every draw.
pub struct DrawContext<'a> {
    pub camera: &'a CameraState,
    pub params: &'a RenderingParameters,
    pub lights: &'a [LightUniform],
    pub environment: Option<&'a Environment>,
}

impl DrawContext<'_> {
    fn ibl(&self) -> bool {
        self.params.use_ibl && self.environment.is_some()
    }
}

/// Winding that keeps front faces front-facing under `model`.
#[must_use]
pub fn front_face_for(model: &Mat4) -> FrontFace {
    if model.determinant() < 0.0 {
        FrontFace::Cw
    } else {
        FrontFace::Ccw
    }
}

type BoundTextures = SmallVec<[(TextureRole, u32, TextureId); 8]>;

pub fn draw_primitive(
    gl: &mut impl GraphicsContext,
    cache: &mut ShaderCache,
    gltf: &Gltf,
    drawable: &Drawable,
    ctx: &DrawContext<'_>,
) -> Result<()> {
    let node = &gltf.nodes[drawable.node];
    let mesh = &gltf.meshes[drawable.mesh];
    let primitive = &mesh.primitives[drawable.primitive];
    let material = gltf
        .materials
        .get(drawable.material)
        .ok_or_else(|| GlintError::missing("material", drawable.material))?;

    let mut textures = BoundTextures::new();
    for &(role, texture_ref) in &material.textures {
        let texture = gltf
            .textures
            .get(texture_ref.texture)
            .ok_or_else(|| GlintError::missing("texture", texture_ref.texture))?;
        let id = texture
            .gpu_texture()
            .ok_or_else(|| GlintError::missing("texture data", texture_ref.texture))?;
        textures.push((role, texture_ref.tex_coord, id));
    }

    let params = ctx.params;
    let skin = node.skin.and_then(|index| gltf.skins.get(index));
    let features = primitive.features();
    let skinning = params.skinning && skin.is_some() && features.intersects(PrimitiveFeatures::SKINNING);
    let weight_count = primitive.targets.len().min(MAX_MORPH_TARGETS);
    let morphing =
        params.morphing && weight_count > 0 && features.intersects(PrimitiveFeatures::MORPHING);

    let mut primitive_flags = features;
    if !skinning {
        primitive_flags.remove(PrimitiveFeatures::SKINNING);
    }
    if !morphing {
        primitive_flags.remove(PrimitiveFeatures::MORPHING);
    }

    let mut vertex_defines = ShaderDefines::new();
    vertex_defines.insert_primitive(primitive_flags);
    if let (true, Some(skin)) = (skinning, skin) {
        vertex_defines
            .insert_global(GlobalFeatures::USE_SKINNING)
            .set(DefineKey::JointCount, DefineValue::Int(skin.joint_count() as u32));
    }
    if morphing {
        vertex_defines
            .insert_global(GlobalFeatures::USE_MORPHING)
            .set(DefineKey::WeightCount, DefineValue::Int(weight_count as u32));
    }

    let mut fragment_defines = material.defines();
    fragment_defines.insert_primitive(primitive_flags);
    if params.use_punctual {
        fragment_defines
            .insert_global(GlobalFeatures::USE_PUNCTUAL)
            .set(DefineKey::LightCount, DefineValue::Int(ctx.lights.len() as u32));
    }
    if ctx.ibl() {
        fragment_defines.insert_global(GlobalFeatures::USE_IBL);
    }
    params.apply_to_defines(&mut fragment_defines);

    let max_units = gl.capabilities().max_texture_units;
    let plan = SlotPlan::new(textures.len() as u32, ctx.ibl(), params.use_punctual, max_units)
        .ok_or_else(|| {
            GlintError::InvalidResource(format!(
                "material {} needs more than {max_units} texture units",
                drawable.material
            ))
        })?;

    let program = cache.program_for(
        gl,
        names::PRIMITIVE_VERT,
        &vertex_defines,
        material.shader_identifier(),
        &fragment_defines,
    )?;
    program.bind(gl);

    let model = node.world_matrix();
    program.set_uniform(gl, "u_ViewProjectionMatrix", UniformValue::Mat4(ctx.camera.view_projection));
    program.set_uniform(gl, "u_ModelMatrix", UniformValue::Mat4(model));
    program.set_uniform(gl, "u_NormalMatrix", UniformValue::Mat4(node.normal_matrix()));
    program.set_uniform(gl, "u_Exposure", UniformValue::Float(params.exposure));
    program.set_uniform(gl, "u_Camera", UniformValue::Vec3(ctx.camera.position));
    material.write_uniforms(gl, program);

    if params.use_punctual {
        super::lights::write_lights(gl, program, ctx.lights);
    }
    if let (true, Some(skin)) = (skinning, skin) {
        program.set_uniform(gl, "u_jointMatrix", UniformValue::Mat4Array(skin.joint_matrices()));
        program.set_uniform(
            gl,
            "u_jointNormalMatrix",
            UniformValue::Mat4Array(skin.joint_normal_matrices()),
        );
    }
    if morphing {
        let mut weights = [0.0f32; MAX_MORPH_TARGETS];
        let source = node.weights.as_deref().unwrap_or(&mesh.weights);
        for (slot, weight) in weights.iter_mut().zip(source) {
            *slot = *weight;
        }
        program.set_uniform(gl, "u_morphWeights", UniformValue::FloatArray(&weights[..weight_count]));
    }

    gl.set_front_face(front_face_for(&model));
    gl.set_cull_face((!material.double_sided).then_some(Face::Back));
    let blended = material.alpha_mode == AlphaMode::Blend;
    gl.set_blend(blended.then_some(BlendMode::Alpha));
    gl.set_depth_write(!blended);

    let mut enabled: SmallVec<[u32; 16]> = SmallVec::new();
    let result = bind_and_draw(
        gl,
        gltf,
        drawable,
        ctx,
        program,
        &plan,
        &textures,
        (skinning, morphing.then_some(weight_count)),
        &mut enabled,
    );
    for location in enabled {
        gl.disable_vertex_attribute(location);
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn bind_and_draw(
    gl: &mut impl GraphicsContext,
    gltf: &Gltf,
    drawable: &Drawable,
    ctx: &DrawContext<'_>,
    program: &CompiledProgram,
    plan: &SlotPlan,
    textures: &BoundTextures,
    (skinning, morph_targets): (bool, Option<usize>),
    enabled: &mut SmallVec<[u32; 16]>,
) -> Result<()> {
    let primitive = &gltf.meshes[drawable.mesh].primitives[drawable.primitive];

    for &(semantic, accessor) in &primitive.attributes {
        if !skinning && matches!(semantic, Semantic::Joints(_) | Semantic::Weights(_)) {
            continue;
        }
        bind_attribute(gl, gltf, program, &semantic.attribute_name(), accessor, enabled)?;
    }
    if let Some(count) = morph_targets {
        for (i, target) in primitive.targets.iter().take(count).enumerate() {
            let kinds = [
                ("position", target.position),
                ("normal", target.normal),
                ("tangent", target.tangent),
            ];
            for (kind, accessor) in kinds {
                if let Some(accessor) = accessor {
                    let name = format!("a_target_{kind}{i}");
                    bind_attribute(gl, gltf, program, &name, accessor, enabled)?;
                }
            }
        }
    }

    for (unit, (role, tex_coord, texture)) in plan.material.clone().zip(textures) {
        gl.bind_texture(unit, *texture);
        program.set_uniform(gl, role.sampler_uniform(), UniformValue::Int(unit as i32));
        program.set_uniform(gl, role.uv_set_uniform(), UniformValue::Int(*tex_coord as i32));
    }
    if let (Some(units), Some(environment)) = (plan.environment.clone(), ctx.environment) {
        for ((unit, texture), uniform) in units
            .zip(environment.textures())
            .zip(Environment::SAMPLER_UNIFORMS)
        {
            gl.bind_texture(unit, texture);
            program.set_uniform(gl, uniform, UniformValue::Int(unit as i32));
        }
        program.set_uniform(gl, "u_MipCount", UniformValue::Int(environment.mip_count as i32));
        program.set_uniform(
            gl,
            "u_EnvRotation",
            UniformValue::Mat3(Environment::rotation(ctx.params.environment_rotation_degrees)),
        );
    }
    if let Some(unit) = plan.punctual_lut {
        if let Some(lut) = ctx.environment.and_then(|env| env.sheen_e_lut.as_ref()) {
            gl.bind_texture(unit, lut.id());
            program.set_uniform(gl, "u_SheenELUT", UniformValue::Int(unit as i32));
        }
    }

    match primitive.indices {
        Some(index) => {
            let accessor = gltf
                .accessors
                .get(index)
                .ok_or_else(|| GlintError::missing("index accessor", index))?;
            let index_type = IndexType::from_component_type(accessor.component_type).ok_or_else(|| {
                GlintError::InvalidResource(format!(
                    "unsupported index component type {:?}",
                    accessor.component_type
                ))
            })?;
            let buffer = accessor.gpu_buffer(gl, BufferTarget::Index)?;
            gl.draw_elements(primitive.mode, buffer, index_type, accessor.count as u32, 0);
        }
        None => {
            let count = primitive.element_count(&gltf.accessors);
            gl.draw_arrays(primitive.mode, 0, count as u32);
        }
    }
    Ok(())
}

/// Enables `name` if the program declares it.
fn bind_attribute(
    gl: &mut impl GraphicsContext,
    gltf: &Gltf,
    program: &CompiledProgram,
    name: &str,
    accessor_index: usize,
    enabled: &mut SmallVec<[u32; 16]>,
) -> Result<()> {
    let Some(location) = program.attribute_location(gl, name) else {
        return Ok(());
    };
    let accessor = gltf
        .accessors
        .get(accessor_index)
        .ok_or_else(|| GlintError::missing("accessor", accessor_index))?;
    let buffer = accessor.gpu_buffer(gl, BufferTarget::Vertex)?;
    gl.enable_vertex_attribute(location, buffer, &accessor.vertex_layout());
    enabled.push(location);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_winding_follows_determinant() {
        assert_eq!(front_face_for(&Mat4::IDENTITY), FrontFace::Ccw);
        let mirrored = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        assert_eq!(front_face_for(&mirrored), FrontFace::Cw);
        let double_mirrored = Mat4::from_scale(Vec3::new(-1.0, -1.0, 1.0));
        assert_eq!(front_face_for(&double_mirrored), FrontFace::Ccw);
    }
}
