//! IBL Precomputation Integration Tests
//!
//! Tests for:
//! - Pass structure: face / mip iteration, filter uniforms per level
//! - Resource lifetime: scratch textures and framebuffer released
//! - Capability fallback: RGBA8 targets without float color buffers
//! - Failure: shader errors leave no textures behind

mod common;

use common::{init_logging, tiny_ibl_settings, tiny_panorama};
use glint::gpu::{
    Capabilities, GpuCommand, ImageData, RecordedUniform, TextureFormat, TextureKind, TextureTarget,
};
use glint::ibl::{IblSampler, mip_count, mip_roughness};
use glint::{RecordingContext, ShaderCache};

fn float_writes(gl: &RecordingContext, name: &str) -> Vec<f32> {
    gl.commands()
        .iter()
        .filter_map(|command| match command {
            GpuCommand::SetUniform {
                name: n,
                value: RecordedUniform::Float(v),
            } if n == name => Some(*v),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Pass Structure
// ============================================================================

#[test]
fn draws_every_face_of_every_level() {
    init_logging();
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let settings = tiny_ibl_settings();
    let levels = mip_count(settings.texture_size);

    let environment = IblSampler::new(settings)
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();

    let draws = gl.draw_calls().count() as u32;
    // panorama + lambertian + ggx chain + charlie chain + two LUTs
    assert_eq!(draws, 6 + 6 + 6 * levels * 2 + 2);
    assert_eq!(environment.mip_count, levels);
    assert_eq!(environment.ggx.mip_levels(), levels);
    assert_eq!(environment.lambertian.mip_levels(), 1);
    assert_eq!(environment.ggx.kind(), TextureKind::Cube);
    assert_eq!(environment.ggx_lut.kind(), TextureKind::D2);
}

#[test]
fn filter_roughness_spans_zero_to_one() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let settings = tiny_ibl_settings();
    let levels = mip_count(settings.texture_size);

    IblSampler::new(settings)
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();

    // lambertian, then ggx and charlie chains, then the LUT reset
    let roughness = float_writes(&gl, "u_roughness");
    let ggx = &roughness[1..=levels as usize];
    assert_eq!(ggx.first(), Some(&0.0));
    assert_eq!(ggx.last(), Some(&1.0));
    for (mip, value) in ggx.iter().enumerate() {
        assert_eq!(*value, mip_roughness(mip as u32, levels));
    }
}

#[test]
fn filter_viewports_halve_per_mip() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let settings = tiny_ibl_settings();
    let size = settings.texture_size;

    let environment = IblSampler::new(settings)
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();

    let mut last_attached = None;
    let mut ggx_sizes = Vec::new();
    for command in gl.commands() {
        match command {
            GpuCommand::AttachColorTarget {
                texture,
                target: TextureTarget::CubeFace(0),
                level,
            } => last_attached = Some((*texture, *level)),
            GpuCommand::Viewport { width, .. } => {
                if let Some((texture, level)) = last_attached.take() {
                    if texture == environment.ggx.id() {
                        ggx_sizes.push((level, *width));
                    }
                }
            }
            _ => {}
        }
    }
    assert!(!ggx_sizes.is_empty());
    for (level, width) in ggx_sizes {
        assert_eq!(width, (size >> level).max(1));
    }
}

// ============================================================================
// Resource Lifetime
// ============================================================================

#[test]
fn scratch_resources_released() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();

    let environment = IblSampler::new(tiny_ibl_settings())
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();

    assert_eq!(gl.live_texture_count(), 5);
    assert_eq!(gl.live_framebuffer_count(), 0);
    assert_eq!(gl.current_framebuffer(), None);
    assert_eq!(gl.viewport(), (0, 0, 320, 200));
    for texture in environment.textures() {
        assert!(gl.texture_alive(texture));
    }

    environment.destroy(&mut gl);
    assert_eq!(gl.live_texture_count(), 0);
}

#[test]
fn sheen_lut_uploaded_when_supplied() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let sheen = ImageData::rgba8(2, 2, vec![128; 16]);

    let environment = IblSampler::new(tiny_ibl_settings())
        .process(&mut gl, &mut cache, &tiny_panorama(), Some(&sheen), (320, 200))
        .unwrap();

    let lut = environment.sheen_e_lut.as_ref().unwrap();
    assert_eq!(lut.size(), (2, 2));
    assert_eq!(gl.live_texture_count(), 6);
}

#[test]
fn programs_shared_through_cache() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    let sampler = IblSampler::new(tiny_ibl_settings());

    let first = sampler
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();
    let compiles = gl.compile_count();
    assert_eq!(compiles, 3);

    let second = sampler
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();
    assert_eq!(gl.compile_count(), compiles);
    assert_eq!(cache.program_count(), 2);

    first.destroy(&mut gl);
    second.destroy(&mut gl);
}

// ============================================================================
// Capability Fallback & Failure
// ============================================================================

#[test]
fn rgba8_targets_without_float_color_buffers() {
    init_logging();
    let mut gl = RecordingContext::with_capabilities(Capabilities {
        float_color_buffer: false,
        ..Capabilities::default()
    });
    let mut cache = ShaderCache::new();

    let environment = IblSampler::new(tiny_ibl_settings())
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();

    assert_eq!(environment.ggx.format(), TextureFormat::Rgba8);
    assert_eq!(environment.ggx_lut.format(), TextureFormat::Rgba8);
}

#[test]
fn float_targets_by_default() {
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();

    let environment = IblSampler::new(tiny_ibl_settings())
        .process(&mut gl, &mut cache, &tiny_panorama(), None, (320, 200))
        .unwrap();

    assert_eq!(environment.lambertian.format(), TextureFormat::Rgba16F);
}

#[test]
fn shader_failure_leaves_nothing_behind() {
    init_logging();
    let mut gl = RecordingContext::new();
    gl.fail_compile_when("u_isGeneratingLUT");
    let mut cache = ShaderCache::new();

    let result = IblSampler::new(tiny_ibl_settings()).process(
        &mut gl,
        &mut cache,
        &tiny_panorama(),
        None,
        (320, 200),
    );

    assert!(result.is_err());
    assert_eq!(gl.live_texture_count(), 0);
    assert_eq!(gl.live_framebuffer_count(), 0);
    assert_eq!(gl.draw_calls().count(), 0);
}

#[test]
fn late_failure_releases_framebuffer_and_textures() {
    init_logging();
    let mut gl = RecordingContext::new();
    let mut cache = ShaderCache::new();
    // uploaded after every target exists
    let truncated_sheen = ImageData::rgba8(2, 2, vec![0; 3]);

    let result = IblSampler::new(tiny_ibl_settings()).process(
        &mut gl,
        &mut cache,
        &tiny_panorama(),
        Some(&truncated_sheen),
        (320, 200),
    );

    assert!(result.is_err());
    assert_eq!(gl.live_texture_count(), 0);
    assert_eq!(gl.live_framebuffer_count(), 0);
    assert_eq!(gl.current_framebuffer(), None);
    assert_eq!(gl.viewport(), (0, 0, 320, 200));
}
