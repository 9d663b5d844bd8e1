//! Raw GLSL sources and variant source assembly.

use std::borrow::Cow;
use std::path::Path;

use rust_embed::RustEmbed;

use super::ShaderDefines;
use crate::gpu::ShaderStage;

#[derive(RustEmbed)]
#[folder = "src/shader/shaders"]
struct ShaderAssets;

/// Looks up an embedded GLSL file by base identifier, e.g. `"pbr.frag"`.
#[must_use]
pub fn embedded_source(name: &str) -> Option<Cow<'static, str>> {
    let file = ShaderAssets::get(name)?;
    match file.data {
        Cow::Borrowed(bytes) => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
        Cow::Owned(bytes) => String::from_utf8(bytes).ok().map(Cow::Owned),
    }
}

/// Names of every embedded source.
pub fn embedded_names() -> impl Iterator<Item = Cow<'static, str>> {
    ShaderAssets::iter()
}

/// Derives the stage from the identifier's extension (`.vert` / `.frag`).
#[must_use]
pub fn stage_for(name: &str) -> Option<ShaderStage> {
    match Path::new(name).extension()?.to_str()? {
        "vert" => Some(ShaderStage::Vertex),
        "frag" => Some(ShaderStage::Fragment),
        _ => None,
    }
}

/// Builds the final text of one variant:
///
/// ```text
/// #version ...
/// #define NAME VALUE        (one per define, canonical order)
/// #define CAPABILITY 1      (one per capability define)
/// <body>
/// ```
#[must_use]
pub fn assemble_source(
    version: &str,
    defines: &ShaderDefines,
    capability_defines: &[&str],
    body: &str,
) -> String {
    let mut source = String::with_capacity(version.len() + body.len() + 64 * (defines.len() + 1));
    source.push_str(version);
    source.push('\n');
    defines.write_lines(&mut source);
    for name in capability_defines {
        source.push_str("#define ");
        source.push_str(name);
        source.push_str(" 1\n");
    }
    source.push_str(body);
    source
}
