//! Sphere configuration: resolution, radius, noise layers, gradient and animation.
//!
//! Everything here is plain data. Hosts build it in code or deserialize a
//! preset; [`SphereConfig::validate`] runs before any dispatch.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sphere_geo::{Resolution, MAX_RESOLUTION, MIN_RESOLUTION};

use crate::animation::OffsetDriver;
use crate::color::{Gradient, RangePolicy};
use crate::error::ConfigError;

/// Upper bound on octaves per layer, shared with the WGSL kernel.
pub const MAX_OCTAVES: u32 = 8;

/// How a layer's contribution is scaled by the first layer's value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskMode {
    /// Contribution is added unscaled.
    #[default]
    None,
    /// Scaled by the first layer's value.
    Mask,
    /// Scaled by `max(0, 1 - first)`.
    ReverseMask,
}

impl MaskMode {
    /// Integer tag stored in [`crate::batch::CompiledNoiseEntry::mask_mode`].
    #[must_use]
    pub fn as_gpu(self) -> i32 {
        match self {
            MaskMode::None => 0,
            MaskMode::Mask => 1,
            MaskMode::ReverseMask => -1,
        }
    }

    /// Inverse of [`MaskMode::as_gpu`]; unknown tags read as `None`.
    #[must_use]
    pub fn from_gpu(tag: i32) -> Self {
        match tag {
            1 => MaskMode::Mask,
            -1 => MaskMode::ReverseMask,
            _ => MaskMode::None,
        }
    }
}

/// Fractal parameters shared by both filter kinds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleNoiseParams {
    /// Final multiplier on the layer value
    pub strength: f32,
    /// Octave count in `[1, MAX_OCTAVES]`
    pub num_layers: u32,
    /// Frequency of the first octave
    pub first_layer_roughness: f32,
    /// Frequency multiplier between octaves
    pub roughness: f32,
    /// Amplitude multiplier between octaves
    pub persistence: f32,
    /// Values below this are clipped to zero before `strength`
    pub min_value: f32,
    /// Base offset into noise space; the per-frame offset is added on top
    pub offset: Vec3,
}

impl Default for SimpleNoiseParams {
    fn default() -> Self {
        Self {
            strength: 1.0,
            num_layers: 1,
            first_layer_roughness: 1.0,
            roughness: 2.0,
            persistence: 0.5,
            min_value: 0.0,
            offset: Vec3::ZERO,
        }
    }
}

/// Extra parameters of the ridged filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidNoiseParams {
    /// Feedback from one octave's value into the next octave's weight; must be > 0
    pub weight_multiplier: f32,
}

impl Default for RigidNoiseParams {
    fn default() -> Self {
        Self { weight_multiplier: 0.8 }
    }
}

/// Filter applied to the raw simplex octaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum NoiseFilter {
    /// Sum of `(n + 1) / 2` octaves: rolling terrain.
    #[default]
    Simple,
    /// Sum of weighted `(1 - |n|)^2` octaves: sharp ridges.
    Rigid(RigidNoiseParams),
}

impl NoiseFilter {
    /// Weight multiplier as the kernel sees it: zero selects the simple filter.
    #[must_use]
    pub fn weight_multiplier(&self) -> f32 {
        match self {
            NoiseFilter::Simple => 0.0,
            NoiseFilter::Rigid(p) => p.weight_multiplier,
        }
    }
}

/// One entry in the layered noise stack.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayer {
    /// Disabled layers are skipped at compile time
    pub enabled: bool,
    /// Masking by the first layer
    pub mask_mode: MaskMode,
    /// Fractal parameters
    pub simple: SimpleNoiseParams,
    /// Filter kind
    pub filter: NoiseFilter,
}

impl Default for NoiseLayer {
    fn default() -> Self {
        Self {
            enabled: true,
            mask_mode: MaskMode::None,
            simple: SimpleNoiseParams::default(),
            filter: NoiseFilter::Simple,
        }
    }
}

impl NoiseLayer {
    /// Check one layer; `index` is its position in the configured list.
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let s = &self.simple;
        if !(1..=MAX_OCTAVES).contains(&s.num_layers) {
            return Err(ConfigError::OctavesOutOfRange {
                layer: index,
                got: s.num_layers,
                max: MAX_OCTAVES,
            });
        }
        let scalars = [
            ("strength", s.strength),
            ("first_layer_roughness", s.first_layer_roughness),
            ("roughness", s.roughness),
            ("persistence", s.persistence),
            ("min_value", s.min_value),
            ("offset", s.offset.x),
            ("offset", s.offset.y),
            ("offset", s.offset.z),
        ];
        if let Some(&(field, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite { layer: index, field });
        }
        if let NoiseFilter::Rigid(r) = self.filter {
            if !r.weight_multiplier.is_finite() {
                return Err(ConfigError::NonFinite { layer: index, field: "weight_multiplier" });
            }
            if r.weight_multiplier <= 0.0 {
                return Err(ConfigError::WeightMultiplier {
                    layer: index,
                    got: r.weight_multiplier,
                });
            }
        }
        Ok(())
    }
}

/// Radius, animation speed and the noise stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeSettings {
    /// Radius of the undisplaced sphere
    pub radius: f32,
    /// Units of noise-space offset per second under [`OffsetDriver::Velocity`]
    pub offset_velocity: f32,
    /// Ordered layers; the first enabled one is the mask source
    pub noise_layers: Vec<NoiseLayer>,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        Self { radius: 1.0, offset_velocity: 1.0, noise_layers: Vec::new() }
    }
}

/// Gradient and range behaviour of the color mapper.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Color ramp sampled into the lookup table
    pub gradient: Gradient,
    /// Whether the noise range persists across passes
    pub range_policy: RangePolicy,
}

/// Full configuration of one procedural sphere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    /// Subdivisions per cube edge, `[2, 99]`
    pub resolution: u32,
    /// Radius, animation speed and noise stack
    pub shape: ShapeSettings,
    /// Gradient and range policy
    pub color: ColorSettings,
    /// Rebuild normals from the displaced surface instead of keeping sphere normals
    pub recalculate_normals: bool,
    /// Source of the per-frame noise offset
    pub offset_driver: OffsetDriver,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            resolution: 16,
            shape: ShapeSettings::default(),
            color: ColorSettings::default(),
            recalculate_normals: true,
            offset_driver: OffsetDriver::Fixed,
        }
    }
}

impl SphereConfig {
    /// Validate everything and return the checked resolution.
    pub fn validate(&self) -> Result<Resolution, ConfigError> {
        let resolution = Resolution::new(self.resolution).ok_or(
            ConfigError::ResolutionOutOfRange {
                got: self.resolution,
                min: MIN_RESOLUTION,
                max: MAX_RESOLUTION,
            },
        )?;
        self.shape.validate()?;
        self.color.gradient.validate()?;
        self.offset_driver.validate()?;
        Ok(resolution)
    }
}

impl ShapeSettings {
    /// Radius, velocity and every layer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ConfigError::Radius(self.radius));
        }
        if !self.offset_velocity.is_finite() {
            return Err(ConfigError::Animation("offset_velocity"));
        }
        for (i, layer) in self.noise_layers.iter().enumerate() {
            layer.validate(i)?;
        }
        Ok(())
    }
}
