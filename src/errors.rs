//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! The main error type [`GlintError`] covers:
//! - Shader compilation and linking failures (cached per variant)
//! - Scene entities referencing out-of-range or not-yet-loaded resources
//! - Backend resource creation failures
//!
//! None of these abort a frame. The draw orchestrator turns them into
//! "skip this drawable" and the IBL sampler reports them to its caller.
//!
//! ```rust,ignore
//! use glint::errors::{GlintError, Result};
//!
//! fn prepare() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the renderer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlintError {
    // ========================================================================
    // Shader Errors
    // ========================================================================
    /// A shader stage failed to compile. `log` is the driver's info log.
    #[error("Shader compile error in `{name}`: {log}")]
    ShaderCompile {
        /// Base identifier of the failing stage
        name: String,
        /// Diagnostic text reported by the backend
        log: String,
    },

    /// Two compiled stages failed to link.
    #[error("Shader link error: {0}")]
    ShaderLink(String),

    /// No raw source is registered for the base identifier.
    #[error("Shader source not found: {0}")]
    ShaderSourceNotFound(String),

    // ========================================================================
    // Scene Resource Errors
    // ========================================================================
    /// An entity references an index outside of its collection.
    #[error("Missing resource: {context} (index: {index})")]
    MissingResource {
        /// Description of what was being accessed
        context: &'static str,
        /// The invalid index
        index: usize,
    },

    /// A resource exists but its data is unusable (wrong shape, empty).
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The graphics backend failed to create an object.
    #[error("GPU error: {0}")]
    Gpu(String),
}

impl GlintError {
    /// Shorthand for [`GlintError::MissingResource`].
    #[must_use]
    pub fn missing(context: &'static str, index: usize) -> Self {
        Self::MissingResource { context, index }
    }
}

/// Alias for `Result<T, GlintError>`.
pub type Result<T> = std::result::Result<T, GlintError>;
