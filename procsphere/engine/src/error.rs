//! Error types for configuration, dispatch and generation.

use crate::color::GradientError;

/// Rejected configuration. Raised before anything is dispatched.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Resolution outside the supported lattice range.
    #[error("resolution {got} outside supported range [{min}, {max}]")]
    ResolutionOutOfRange {
        /// Requested resolution
        got: u32,
        /// Smallest supported resolution
        min: u32,
        /// Largest supported resolution
        max: u32,
    },
    /// Octave count of a noise layer outside `[1, MAX_OCTAVES]`.
    #[error("noise layer {layer}: octave count {got} outside [1, {max}]")]
    OctavesOutOfRange {
        /// Index in the configured layer list
        layer: usize,
        /// Requested octave count
        got: u32,
        /// Largest supported octave count
        max: u32,
    },
    /// A noise-layer parameter is NaN or infinite.
    #[error("noise layer {layer}: {field} must be finite")]
    NonFinite {
        /// Index in the configured layer list
        layer: usize,
        /// Offending parameter name
        field: &'static str,
    },
    /// Rigid filters need a strictly positive weight multiplier.
    #[error("noise layer {layer}: rigid weight multiplier must be > 0 (got {got})")]
    WeightMultiplier {
        /// Index in the configured layer list
        layer: usize,
        /// Configured multiplier
        got: f32,
    },
    /// Radius must be finite and strictly positive.
    #[error("radius must be finite and > 0 (got {0})")]
    Radius(f32),
    /// An animation parameter is NaN or infinite.
    #[error("animation {0} must be finite")]
    Animation(&'static str),
    /// Gradient definition is malformed.
    #[error(transparent)]
    Gradient(#[from] GradientError),
}

/// Failure of a compute backend. Fatal to the current generation pass.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// No compute adapter could be found.
    #[error("no suitable compute adapter")]
    NoAdapter,
    /// Adapter found but the logical device could not be created.
    #[error("device creation failed: {0}")]
    DeviceCreation(String),
    /// Shader module or pipeline failed validation.
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),
    /// Readback buffer could not be mapped.
    #[error("buffer mapping failed: {0}")]
    BufferMapping(String),
    /// Input and output buffers disagree on length.
    #[error("{what}: expected {expected} elements, got {got}")]
    SizeMismatch {
        /// Buffer being checked
        what: &'static str,
        /// Required length
        expected: usize,
        /// Provided length
        got: usize,
    },
    /// The CPU worker pool could not be built.
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

/// Any failure of a generation pass.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SphereError {
    /// Configuration rejected before dispatch
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Compute backend failed mid-pass
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
