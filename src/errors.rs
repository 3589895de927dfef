//! Error Types
//!
//! This module defines the error types surfaced by the pipeline.
//!
//! # Overview
//!
//! Per-frame rendering never fails: capacity exhaustion, missing backend
//! features, invalid culling state and degenerate post-processing parameters
//! all degrade locally (see [`CameraOutcome`](crate::renderer::pipeline::CameraOutcome)).
//! [`PrismError`] therefore only covers construction and configuration:
//! - Host program and texture creation at pipeline construction
//! - Settings validation
//! - JSON configuration parsing
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism::errors::{PrismError, Result};
//!
//! fn load(json: &str) -> Result<PipelineSettings> {
//!     PipelineSettings::from_json(json)
//! }
//! ```

use thiserror::Error;

/// The main error type for the Prism pipeline.
#[derive(Error, Debug)]
pub enum PrismError {
    // ========================================================================
    // Host Resource Errors
    // ========================================================================
    /// The host failed to create a GPU program the pipeline owns.
    #[error("Failed to create program '{0}'")]
    ProgramCreateFailed(&'static str),

    /// The host failed to create a texture the pipeline owns.
    #[error("Failed to create texture '{0}'")]
    TextureCreateFailed(&'static str),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A settings field is outside of its supported range.
    #[error("Invalid setting `{field}`: {reason}")]
    InvalidSetting {
        /// Dotted path of the offending field
        field: &'static str,
        /// Human-readable explanation
        reason: String,
    },

    /// The configuration document was not valid JSON for [`PipelineSettings`](crate::PipelineSettings).
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The configuration document declares a version this build does not understand.
    #[error("Unsupported settings version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Version this build writes
        expected: u32,
    },
}

/// Alias for `Result<T, PrismError>`.
pub type Result<T> = std::result::Result<T, PrismError>;
