//! Shader Permutation Cache
//!
//! Two levels, both keyed by [`VariantHandle`]:
//!
//! 1. **Stages**: `xxh3_128(base identifier, canonical defines)` → compiled
//!    shader object (or the recorded failure).
//! 2. **Programs**: `(fragment handle, vertex handle)` → linked
//!    [`CompiledProgram`] (or the recorded failure).
//!
//! N fragment variants × M vertex variants never cost more than N + M
//! compiles. Failures are cached as well and never retried.

use std::cell::RefCell;

use log::{debug, error};
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use super::ShaderDefines;
use super::source::{assemble_source, embedded_source, stage_for};
use crate::errors::{GlintError, Result};
use crate::gpu::{GraphicsContext, ProgramId, ShaderId, UniformLocation, UniformValue};

/// Content hash of one shader stage variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantHandle(u128);

impl VariantHandle {
    #[inline]
    #[must_use]
    pub fn raw(self) -> u128 {
        self.0
    }
}

/// (base identifier, canonical define set) of one stage variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderVariantKey {
    base: String,
    handle: VariantHandle,
}

impl ShaderVariantKey {
    #[must_use]
    pub fn new(base: &str, defines: &ShaderDefines) -> Self {
        let mut text = String::with_capacity(base.len() + 32 * defines.len());
        text.push_str(base);
        text.push('\0');
        defines.write_lines(&mut text);
        Self {
            base: base.to_string(),
            handle: VariantHandle(xxh3_128(text.as_bytes())),
        }
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[inline]
    #[must_use]
    pub fn handle(&self) -> VariantHandle {
        self.handle
    }
}

/// A linked program with lazily memoized uniform and attribute locations.
///
/// Owned by the [`ShaderCache`]; callers borrow it for the duration of one
/// draw. Lookups that miss (the name was optimized out or never declared) are
/// memoized too.
#[derive(Debug)]
pub struct CompiledProgram {
    program: ProgramId,
    uniforms: RefCell<FxHashMap<String, Option<UniformLocation>>>,
    attributes: RefCell<FxHashMap<String, Option<u32>>>,
}

impl CompiledProgram {
    fn new(program: ProgramId) -> Self {
        Self {
            program,
            uniforms: RefCell::default(),
            attributes: RefCell::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.program
    }

    pub fn bind(&self, gl: &mut impl GraphicsContext) {
        gl.use_program(self.program);
    }

    pub fn uniform_location(
        &self,
        gl: &mut impl GraphicsContext,
        name: &str,
    ) -> Option<UniformLocation> {
        if let Some(&cached) = self.uniforms.borrow().get(name) {
            return cached;
        }
        let location = gl.uniform_location(self.program, name);
        self.uniforms.borrow_mut().insert(name.to_string(), location);
        location
    }

    pub fn attribute_location(&self, gl: &mut impl GraphicsContext, name: &str) -> Option<u32> {
        if let Some(&cached) = self.attributes.borrow().get(name) {
            return cached;
        }
        let location = gl.attribute_location(self.program, name);
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), location);
        location
    }

    /// Writes `value` if the program declares `name`. Returns whether it did.
    pub fn set_uniform(
        &self,
        gl: &mut impl GraphicsContext,
        name: &str,
        value: UniformValue<'_>,
    ) -> bool {
        match self.uniform_location(gl, name) {
            Some(location) => {
                gl.set_uniform(location, value);
                true
            }
            None => false,
        }
    }
}

enum StageEntry {
    Compiled(ShaderId),
    Failed(GlintError),
}

enum ProgramEntry {
    Linked(CompiledProgram),
    Failed(GlintError),
}

/// Compiles, links and owns every shader variant.
pub struct ShaderCache {
    /// Sources registered at runtime; shadow embedded files of the same name.
    sources: FxHashMap<String, String>,
    stages: FxHashMap<VariantHandle, StageEntry>,
    programs: FxHashMap<VariantHandle, FxHashMap<VariantHandle, ProgramEntry>>,
    compile_count: usize,
    link_count: usize,
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: FxHashMap::default(),
            stages: FxHashMap::default(),
            programs: FxHashMap::default(),
            compile_count: 0,
            link_count: 0,
        }
    }

    /// Registers (or overrides) the raw source of a base identifier.
    ///
    /// Variants already compiled from the previous source stay cached.
    /// Variants that failed only because `name` had no source are forgotten,
    /// so the next selection compiles them.
    pub fn insert_source(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        self.stages.retain(|_, entry| {
            !matches!(entry, StageEntry::Failed(GlintError::ShaderSourceNotFound(missing)) if *missing == name)
        });
        self.sources.insert(name, source.into());
    }

    fn raw_source(&self, name: &str) -> Option<String> {
        self.sources
            .get(name)
            .cloned()
            .or_else(|| embedded_source(name).map(|s| s.into_owned()))
    }

    /// Returns the handle of the `(base, defines)` variant, compiling it on
    /// first request.
    pub fn select_shader(
        &mut self,
        gl: &mut impl GraphicsContext,
        base: &str,
        defines: &ShaderDefines,
    ) -> Result<VariantHandle> {
        let handle = ShaderVariantKey::new(base, defines).handle();

        if let Some(entry) = self.stages.get(&handle) {
            return match entry {
                StageEntry::Compiled(_) => Ok(handle),
                StageEntry::Failed(err) => Err(err.clone()),
            };
        }

        let entry = match self.compile_stage(gl, base, defines) {
            Ok(shader) => StageEntry::Compiled(shader),
            Err(err) => {
                error!("{err}");
                StageEntry::Failed(err)
            }
        };
        let result = match &entry {
            StageEntry::Compiled(_) => Ok(handle),
            StageEntry::Failed(err) => Err(err.clone()),
        };
        self.stages.insert(handle, entry);
        result
    }

    fn compile_stage(
        &mut self,
        gl: &mut impl GraphicsContext,
        base: &str,
        defines: &ShaderDefines,
    ) -> Result<ShaderId> {
        let body = self
            .raw_source(base)
            .ok_or_else(|| GlintError::ShaderSourceNotFound(base.to_string()))?;
        let stage = stage_for(base).ok_or_else(|| {
            GlintError::InvalidResource(format!("cannot infer shader stage of `{base}`"))
        })?;

        let capabilities = gl.capabilities();
        let mut capability_defines = Vec::new();
        if capabilities.shader_texture_lod {
            capability_defines.push("USE_TEX_LOD");
        }
        let source = assemble_source(capabilities.glsl_version, defines, &capability_defines, &body);

        self.compile_count += 1;
        debug!("compiling `{base}` with {} defines", defines.len());
        gl.create_shader(stage, &source)
            .map_err(|err| GlintError::ShaderCompile {
                name: base.to_string(),
                log: match err {
                    GlintError::Gpu(log) => log,
                    other => other.to_string(),
                },
            })
    }

    /// Returns the program linking `fragment` and `vertex`, linking it on first
    /// request.
    pub fn get_shader_program(
        &mut self,
        gl: &mut impl GraphicsContext,
        fragment: VariantHandle,
        vertex: VariantHandle,
    ) -> Result<&CompiledProgram> {
        let cached = self
            .programs
            .get(&fragment)
            .is_some_and(|by_vertex| by_vertex.contains_key(&vertex));

        if !cached {
            let (fs, vs) = match (self.stages.get(&fragment), self.stages.get(&vertex)) {
                (Some(StageEntry::Compiled(fs)), Some(StageEntry::Compiled(vs))) => (*fs, *vs),
                (Some(StageEntry::Failed(err)), _) | (_, Some(StageEntry::Failed(err))) => {
                    return Err(err.clone());
                }
                _ => {
                    return Err(GlintError::InvalidResource(
                        "program requested for a stage that was never selected".to_string(),
                    ));
                }
            };

            self.link_count += 1;
            let entry = match gl.create_program(vs, fs) {
                Ok(program) => ProgramEntry::Linked(CompiledProgram::new(program)),
                Err(err) => {
                    let err = GlintError::ShaderLink(match err {
                        GlintError::Gpu(log) => log,
                        other => other.to_string(),
                    });
                    error!("{err}");
                    ProgramEntry::Failed(err)
                }
            };
            self.programs.entry(fragment).or_default().insert(vertex, entry);
        }

        match self.programs.get(&fragment).and_then(|by_vertex| by_vertex.get(&vertex)) {
            Some(ProgramEntry::Linked(program)) => Ok(program),
            Some(ProgramEntry::Failed(err)) => Err(err.clone()),
            None => Err(GlintError::InvalidResource("program cache entry vanished".to_string())),
        }
    }

    /// Convenience: selects both stages and links them.
    pub fn program_for(
        &mut self,
        gl: &mut impl GraphicsContext,
        vertex_base: &str,
        vertex_defines: &ShaderDefines,
        fragment_base: &str,
        fragment_defines: &ShaderDefines,
    ) -> Result<&CompiledProgram> {
        let vertex = self.select_shader(gl, vertex_base, vertex_defines)?;
        let fragment = self.select_shader(gl, fragment_base, fragment_defines)?;
        self.get_shader_program(gl, fragment, vertex)
    }

    /// Number of compiled (successful) stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages
            .values()
            .filter(|entry| matches!(entry, StageEntry::Compiled(_)))
            .count()
    }

    /// Number of linked (successful) programs.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.programs
            .values()
            .flat_map(FxHashMap::values)
            .filter(|entry| matches!(entry, ProgramEntry::Linked(_)))
            .count()
    }

    /// Compile attempts so far, failed ones included.
    #[inline]
    #[must_use]
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Link attempts so far, failed ones included.
    #[inline]
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Releases every program and stage. Safe to call more than once.
    pub fn destroy(&mut self, gl: &mut impl GraphicsContext) {
        for (_, by_vertex) in self.programs.drain() {
            for (_, entry) in by_vertex {
                if let ProgramEntry::Linked(program) = entry {
                    gl.delete_program(program.id());
                }
            }
        }
        for (_, entry) in self.stages.drain() {
            if let StageEntry::Compiled(shader) = entry {
                gl.delete_shader(shader);
            }
        }
    }
}
