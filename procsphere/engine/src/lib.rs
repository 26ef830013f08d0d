//! Procedural cube-sphere engine: noise displacement, gradient coloring and
//! compute dispatch on CPU (rayon) or GPU (wgpu).
#![deny(missing_docs)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::dbg_macro, clippy::large_enum_variant)]

pub mod animation;
pub mod backend;
pub mod batch;
pub mod color;
pub mod config;
pub mod error;
pub mod gpu;
pub mod gpu_backend;
pub mod kernels;
pub mod mesh;
pub mod noise;
pub mod sphere;

pub use animation::{OffsetAnimator, OffsetDriver};
pub use backend::{ComputeBackend, CpuBackend, Displacement, Projection};
pub use batch::{CompiledNoiseEntry, NoiseBatch};
pub use color::{
    Gradient, GradientColorMapper, GradientError, GradientLut, GradientStop, NoiseRange,
    RangePolicy, Rgba8,
};
pub use config::{
    ColorSettings, MaskMode, NoiseFilter, NoiseLayer, RigidNoiseParams, ShapeSettings,
    SimpleNoiseParams, SphereConfig, MAX_OCTAVES,
};
pub use error::{ConfigError, DispatchError, SphereError};
pub use gpu_backend::GpuBackend;
pub use mesh::{IndexFormat, MeshBuffers, MeshSink};
pub use sphere::ProceduralSphere;

/// Returns the engine version string from Cargo metadata.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver_like() {
        assert!(version().split('.').count() >= 3);
    }
}
