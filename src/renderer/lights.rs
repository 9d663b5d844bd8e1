use log::warn;

use crate::gpu::{GraphicsContext, UniformValue};
use crate::scene::{Gltf, LightUniform};
use crate::shader::CompiledProgram;

/// Collects the lights placed by reachable nodes, in traversal order.
/// References to missing lights are dropped.
pub fn collect_lights(gltf: &Gltf, reachable: &[usize], out: &mut Vec<LightUniform>) {
    for &index in reachable {
        let node = &gltf.nodes[index];
        let Some(light_index) = node.light else {
            continue;
        };
        match gltf.lights.get(light_index) {
            Some(light) => out.push(light.to_uniform(node.world_matrix())),
            None => warn!("node {index} references missing light {light_index}"),
        }
    }
}

/// Writes `u_Lights[i].*` for every light.
pub fn write_lights(gl: &mut impl GraphicsContext, program: &CompiledProgram, lights: &[LightUniform]) {
    for (i, light) in lights.iter().enumerate() {
        let field = |name: &str| format!("u_Lights[{i}].{name}");
        program.set_uniform(gl, &field("direction"), UniformValue::Vec3(light.direction));
        program.set_uniform(gl, &field("range"), UniformValue::Float(light.range));
        program.set_uniform(gl, &field("color"), UniformValue::Vec3(light.color));
        program.set_uniform(gl, &field("intensity"), UniformValue::Float(light.intensity));
        program.set_uniform(gl, &field("position"), UniformValue::Vec3(light.position));
        program.set_uniform(gl, &field("innerConeCos"), UniformValue::Float(light.inner_cone_cos));
        program.set_uniform(gl, &field("outerConeCos"), UniformValue::Float(light.outer_cone_cos));
        program.set_uniform(gl, &field("type"), UniformValue::Int(light.kind));
    }
}
