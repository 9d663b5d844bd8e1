use crate::camera::CameraState;
use crate::errors::Result;
use crate::gpu::{GraphicsContext, Topology, UniformValue};
use crate::ibl::Environment;
use crate::settings::RenderingParameters;
use crate::shader::{ShaderCache, ShaderDefines, names};

/// Draws the specular cubemap behind everything with a full-screen triangle.
/// Leaves depth testing and depth writes enabled.
pub fn draw_background(
    gl: &mut impl GraphicsContext,
    cache: &mut ShaderCache,
    environment: &Environment,
    camera: &CameraState,
    params: &RenderingParameters,
) -> Result<()> {
    let vertex_defines = ShaderDefines::new();
    let mut fragment_defines = ShaderDefines::new();
    params.apply_to_defines(&mut fragment_defines);

    let program = cache.program_for(
        gl,
        names::FULLSCREEN_VERT,
        &vertex_defines,
        names::BACKGROUND_FRAG,
        &fragment_defines,
    )?;
    program.bind(gl);

    let max_level = environment.mip_count.saturating_sub(1) as f32;
    program.set_uniform(
        gl,
        "u_InverseViewProjectionMatrix",
        UniformValue::Mat4(camera.inverse_view_rotation_projection()),
    );
    program.set_uniform(
        gl,
        "u_EnvRotation",
        UniformValue::Mat3(Environment::rotation(params.environment_rotation_degrees)),
    );
    program.set_uniform(
        gl,
        "u_MipLevel",
        UniformValue::Float(params.background_blur.clamp(0.0, max_level)),
    );
    program.set_uniform(gl, "u_Exposure", UniformValue::Float(params.exposure));
    gl.bind_texture(0, environment.ggx.id());
    program.set_uniform(gl, "u_GGXEnvSampler", UniformValue::Int(0));

    gl.set_depth_test(false);
    gl.set_depth_write(false);
    gl.set_cull_face(None);
    gl.set_blend(None);
    gl.draw_arrays(Topology::Triangles, 0, 3);
    gl.set_depth_test(true);
    gl.set_depth_write(true);
    Ok(())
}
