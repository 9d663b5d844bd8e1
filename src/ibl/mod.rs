//! Image Based Lighting
//!
//! Turns an equirectangular panorama into the prefiltered cubemaps and LUTs
//! the PBR shader samples:
//!
//! 1. panorama → base cubemap (one full-screen pass per face), mipmapped
//! 2. Lambertian irradiance (one level)
//! 3. GGX and Charlie chains, roughness `mip / (levels - 1)` per level
//! 4. GGX and Charlie BRDF LUTs
//!
//! Everything runs synchronously through the shared [`ShaderCache`] and is
//! not cancellable. Scratch resources are released before returning.

pub mod environment;
pub mod panorama;

pub use environment::Environment;
pub use panorama::PanoramaImage;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::gpu::{
    FramebufferId, GpuTexture, GraphicsContext, ImageData, SamplerState, TextureDescriptor,
    TextureFormat, TextureKind, TextureTarget, Topology, UniformValue, WrapMode,
};
use crate::shader::{CompiledProgram, ShaderCache, ShaderDefines, VariantHandle, names};

/// Fixed parameters of the precomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IblSettings {
    /// Edge length of the intermediate cubemap the panorama is projected to.
    pub cubemap_size: u32,
    /// Edge length of the filtered cubemaps.
    pub texture_size: u32,
    pub lut_resolution: u32,
    pub ggx_sample_count: u32,
    pub lambertian_sample_count: u32,
    pub sheen_sample_count: u32,
    pub lut_sample_count: u32,
    pub lod_bias: f32,
}

impl Default for IblSettings {
    fn default() -> Self {
        Self {
            cubemap_size: 1024,
            texture_size: 256,
            lut_resolution: 1024,
            ggx_sample_count: 1024,
            lambertian_sample_count: 2048,
            sheen_sample_count: 64,
            lut_sample_count: 512,
            lod_bias: 0.0,
        }
    }
}

/// Microfacet distribution selected in the filter shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Distribution {
    Lambertian = 0,
    Ggx = 1,
    Charlie = 2,
}

/// Length of a full mip chain for a `size` texture: `floor(log2(size)) + 1`.
#[must_use]
pub fn mip_count(size: u32) -> u32 {
    size.max(1).ilog2() + 1
}

/// Roughness prefiltered into `mip` of a chain with `levels` levels.
#[must_use]
pub fn mip_roughness(mip: u32, levels: u32) -> f32 {
    if levels <= 1 {
        0.0
    } else {
        mip as f32 / (levels - 1) as f32
    }
}

const CUBE_FACES: u32 = 6;

/// One filter pass over the six faces of a target level.
#[derive(Debug, Clone, Copy)]
struct FilterPass {
    distribution: Distribution,
    roughness: f32,
    sample_count: u32,
    mip: u32,
}

/// Shader handles used by the sampler; resolved before any resource is made
/// so that a shader failure leaves nothing behind.
struct Programs {
    vertex: VariantHandle,
    panorama: VariantHandle,
    filter: VariantHandle,
}

#[derive(Debug, Clone, Default)]
pub struct IblSampler {
    settings: IblSettings,
}

impl IblSampler {
    #[must_use]
    pub fn new(settings: IblSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &IblSettings {
        &self.settings
    }

    /// Precomputes an [`Environment`] from `panorama`.
    ///
    /// `sheen_e` is the decoded sheen albedo LUT, if the host has one.
    /// On return the default framebuffer is bound and the viewport is
    /// `(0, 0, viewport.0, viewport.1)`.
    pub fn process(
        &self,
        gl: &mut impl GraphicsContext,
        cache: &mut ShaderCache,
        panorama: &PanoramaImage,
        sheen_e: Option<&ImageData>,
        viewport: (u32, u32),
    ) -> Result<Environment> {
        let programs = Self::prepare_programs(gl, cache)?;

        let caps = gl.capabilities().clone();
        let (source_format, target_format) = if !caps.float_color_buffer {
            info!("float color buffers unavailable; IBL targets use RGBA8");
            (TextureFormat::Rgba8, TextureFormat::Rgba8)
        } else if caps.float_texture_linear {
            (TextureFormat::Rgba32F, TextureFormat::Rgba16F)
        } else {
            (TextureFormat::Rgba16F, TextureFormat::Rgba16F)
        };

        let framebuffer = gl.create_framebuffer()?;
        let mut allocated = Vec::new();
        let result = self.run(
            gl,
            cache,
            &programs,
            framebuffer,
            panorama,
            sheen_e,
            source_format,
            target_format,
            &mut allocated,
        );
        if result.is_err() {
            for texture in &allocated {
                texture.destroy(gl);
            }
        }

        gl.bind_framebuffer(None);
        gl.delete_framebuffer(framebuffer);
        gl.set_viewport(0, 0, viewport.0, viewport.1);
        gl.set_depth_test(true);
        gl.set_depth_write(true);
        result
    }

    fn prepare_programs(
        gl: &mut impl GraphicsContext,
        cache: &mut ShaderCache,
    ) -> Result<Programs> {
        let defines = ShaderDefines::new();
        let programs = Programs {
            vertex: cache.select_shader(gl, names::FULLSCREEN_VERT, &defines)?,
            panorama: cache.select_shader(gl, names::PANORAMA_TO_CUBEMAP_FRAG, &defines)?,
            filter: cache.select_shader(gl, names::IBL_FILTERING_FRAG, &defines)?,
        };
        cache.get_shader_program(gl, programs.panorama, programs.vertex)?;
        cache.get_shader_program(gl, programs.filter, programs.vertex)?;
        Ok(programs)
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        gl: &mut impl GraphicsContext,
        cache: &mut ShaderCache,
        programs: &Programs,
        framebuffer: FramebufferId,
        panorama: &PanoramaImage,
        sheen_e: Option<&ImageData>,
        source_format: TextureFormat,
        target_format: TextureFormat,
        allocated: &mut Vec<GpuTexture>,
    ) -> Result<Environment> {
        let s = &self.settings;
        let panorama_sampler = SamplerState {
            wrap_s: WrapMode::Repeat,
            ..SamplerState::CLAMP_LINEAR
        };
        let source = GpuTexture::from_image(
            gl,
            "ibl panorama",
            &panorama.to_image(source_format),
            panorama_sampler,
        )?;
        allocated.push(source.clone());

        let cubemap_levels = mip_count(s.cubemap_size);
        let base = Self::cube(gl, allocated, "ibl base cubemap", target_format, s.cubemap_size, cubemap_levels)?;
        let levels = mip_count(s.texture_size);
        let lambertian = Self::cube(gl, allocated, "ibl lambertian", target_format, s.texture_size, 1)?;
        let ggx = Self::cube(gl, allocated, "ibl ggx", target_format, s.texture_size, levels)?;
        let charlie = Self::cube(gl, allocated, "ibl charlie", target_format, s.texture_size, levels)?;
        let ggx_lut = Self::lut(gl, allocated, "ibl ggx lut", target_format, s.lut_resolution)?;
        let charlie_lut = Self::lut(gl, allocated, "ibl charlie lut", target_format, s.lut_resolution)?;
        let sheen_e_lut = match sheen_e {
            Some(image) => {
                let lut = GpuTexture::from_image(gl, "sheen E lut", image, SamplerState::CLAMP_LINEAR)?;
                allocated.push(lut.clone());
                Some(lut)
            }
            None => None,
        };

        gl.bind_framebuffer(Some(framebuffer));
        gl.set_depth_test(false);
        gl.set_depth_write(false);
        gl.set_cull_face(None);
        gl.set_blend(None);

        let program = cache.get_shader_program(gl, programs.panorama, programs.vertex)?;
        Self::panorama_to_cubemap(gl, program, framebuffer, &source, &base);
        gl.generate_mipmaps(base.id());

        let program = cache.get_shader_program(gl, programs.filter, programs.vertex)?;
        program.bind(gl);
        gl.bind_texture(0, base.id());
        program.set_uniform(gl, "u_cubemapTexture", UniformValue::Int(0));
        program.set_uniform(gl, "u_width", UniformValue::Int(s.cubemap_size as i32));
        program.set_uniform(gl, "u_lodBias", UniformValue::Float(s.lod_bias));
        program.set_uniform(gl, "u_isGeneratingLUT", UniformValue::Int(0));

        Self::filter(
            gl,
            program,
            framebuffer,
            &lambertian,
            FilterPass {
                distribution: Distribution::Lambertian,
                roughness: 0.0,
                sample_count: s.lambertian_sample_count,
                mip: 0,
            },
        );
        for (target, distribution, sample_count) in [
            (&ggx, Distribution::Ggx, s.ggx_sample_count),
            (&charlie, Distribution::Charlie, s.sheen_sample_count),
        ] {
            for mip in 0..levels {
                Self::filter(
                    gl,
                    program,
                    framebuffer,
                    target,
                    FilterPass {
                        distribution,
                        roughness: mip_roughness(mip, levels),
                        sample_count,
                        mip,
                    },
                );
            }
        }

        program.set_uniform(gl, "u_isGeneratingLUT", UniformValue::Int(1));
        for (target, distribution) in [(&ggx_lut, Distribution::Ggx), (&charlie_lut, Distribution::Charlie)] {
            gl.attach_color_target(framebuffer, target.id(), TextureTarget::D2, 0);
            gl.set_viewport(0, 0, s.lut_resolution, s.lut_resolution);
            program.set_uniform(gl, "u_distribution", UniformValue::Int(distribution as i32));
            program.set_uniform(gl, "u_sampleCount", UniformValue::Int(s.lut_sample_count as i32));
            program.set_uniform(gl, "u_roughness", UniformValue::Float(0.0));
            program.set_uniform(gl, "u_currentFace", UniformValue::Int(0));
            gl.draw_arrays(Topology::Triangles, 0, 3);
        }

        source.destroy(gl);
        base.destroy(gl);

        info!(
            "IBL precomputation finished: {}px, {levels} mip levels, {target_format:?}",
            s.texture_size
        );
        Ok(Environment {
            lambertian,
            ggx,
            charlie,
            ggx_lut,
            charlie_lut,
            sheen_e_lut,
            mip_count: levels,
        })
    }

    fn cube(
        gl: &mut impl GraphicsContext,
        allocated: &mut Vec<GpuTexture>,
        label: &'static str,
        format: TextureFormat,
        size: u32,
        mip_levels: u32,
    ) -> Result<GpuTexture> {
        let sampler = if mip_levels > 1 {
            SamplerState::CLAMP_TRILINEAR
        } else {
            SamplerState::CLAMP_LINEAR
        };
        let texture = GpuTexture::new(
            gl,
            &TextureDescriptor {
                label,
                kind: TextureKind::Cube,
                format,
                width: size,
                height: size,
                mip_levels,
                sampler,
            },
        )?;
        allocated.push(texture.clone());
        Ok(texture)
    }

    fn lut(
        gl: &mut impl GraphicsContext,
        allocated: &mut Vec<GpuTexture>,
        label: &'static str,
        format: TextureFormat,
        size: u32,
    ) -> Result<GpuTexture> {
        let texture = GpuTexture::new(
            gl,
            &TextureDescriptor {
                label,
                kind: TextureKind::D2,
                format,
                width: size,
                height: size,
                mip_levels: 1,
                sampler: SamplerState::CLAMP_LINEAR,
            },
        )?;
        allocated.push(texture.clone());
        Ok(texture)
    }

    fn panorama_to_cubemap(
        gl: &mut impl GraphicsContext,
        program: &CompiledProgram,
        framebuffer: FramebufferId,
        panorama: &GpuTexture,
        cubemap: &GpuTexture,
    ) {
        let (size, _) = cubemap.size();
        program.bind(gl);
        gl.bind_texture(0, panorama.id());
        program.set_uniform(gl, "u_panorama", UniformValue::Int(0));
        for face in 0..CUBE_FACES {
            gl.attach_color_target(framebuffer, cubemap.id(), TextureTarget::CubeFace(face), 0);
            gl.set_viewport(0, 0, size, size);
            program.set_uniform(gl, "u_currentFace", UniformValue::Int(face as i32));
            gl.draw_arrays(Topology::Triangles, 0, 3);
        }
    }

    fn filter(
        gl: &mut impl GraphicsContext,
        program: &CompiledProgram,
        framebuffer: FramebufferId,
        target: &GpuTexture,
        pass: FilterPass,
    ) {
        let size = (target.size().0 >> pass.mip).max(1);
        debug!(
            "IBL filter {:?} mip {} roughness {:.3} at {size}px",
            pass.distribution, pass.mip, pass.roughness
        );
        program.set_uniform(gl, "u_roughness", UniformValue::Float(pass.roughness));
        program.set_uniform(gl, "u_sampleCount", UniformValue::Int(pass.sample_count as i32));
        program.set_uniform(gl, "u_distribution", UniformValue::Int(pass.distribution as i32));
        for face in 0..CUBE_FACES {
            gl.attach_color_target(framebuffer, target.id(), TextureTarget::CubeFace(face), pass.mip);
            gl.set_viewport(0, 0, size, size);
            program.set_uniform(gl, "u_currentFace", UniformValue::Int(face as i32));
            gl.draw_arrays(Topology::Triangles, 0, 3);
        }
    }
}
