#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! glTF renderer over OpenGL ES 3 / WebGL 2 with on-demand shader variants
//! and image based lighting precomputation.

pub mod camera;
pub mod errors;
pub mod gpu;
pub mod ibl;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod shader;

pub use camera::{ActiveCamera, CameraState, UserCamera};
pub use errors::{GlintError, Result};
pub use gpu::{GlowContext, GraphicsContext};
#[cfg(feature = "recording")]
pub use gpu::RecordingContext;
pub use ibl::{Environment, IblSampler, IblSettings, PanoramaImage};
pub use renderer::{FrameInput, FrameReport, Renderer, SceneStatistics};
pub use scene::Gltf;
pub use settings::{DebugOutput, RenderingParameters, ToneMap};
pub use shader::{ShaderCache, ShaderDefines};
