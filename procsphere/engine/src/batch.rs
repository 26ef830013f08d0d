//! Flattening of the enabled noise layers into a device-ready batch.

use glam::Vec3;

use crate::config::NoiseLayer;

/// One enabled layer as the displacement kernel reads it.
///
/// Layout matches `NoiseEntry` in `shaders/noise_displace.wgsl`: a `vec3`
/// offset followed by nine scalars, 48 bytes with no padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompiledNoiseEntry {
    /// Base offset plus frame offset
    pub offset: [f32; 3],
    /// Kept equal to `roughness`
    pub frequency: f32,
    /// Frequency of the first octave
    pub first_layer_roughness: f32,
    /// Frequency multiplier between octaves
    pub roughness: f32,
    /// Amplitude multiplier between octaves
    pub persistence: f32,
    /// Final multiplier
    pub strength: f32,
    /// Clip level
    pub min_value: f32,
    /// Zero for the simple filter, > 0 for ridged
    pub weight_multiplier: f32,
    /// Octave count
    pub num_layers: u32,
    /// 0 none, 1 mask, -1 reverse mask
    pub mask_mode: i32,
}

impl CompiledNoiseEntry {
    /// Flatten one layer, shifting its offset by `frame_offset`.
    #[must_use]
    pub fn from_layer(layer: &NoiseLayer, frame_offset: Vec3) -> Self {
        let s = &layer.simple;
        Self {
            offset: (s.offset + frame_offset).to_array(),
            frequency: s.roughness,
            first_layer_roughness: s.first_layer_roughness,
            roughness: s.roughness,
            persistence: s.persistence,
            strength: s.strength,
            min_value: s.min_value,
            weight_multiplier: layer.filter.weight_multiplier(),
            num_layers: s.num_layers,
            mask_mode: layer.mask_mode.as_gpu(),
        }
    }
}

/// Enabled layers in configuration order. Rebuilt every pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoiseBatch {
    entries: Vec<CompiledNoiseEntry>,
}

impl NoiseBatch {
    /// Keep the enabled layers, in order, with `frame_offset` applied.
    #[must_use]
    pub fn compile(layers: &[NoiseLayer], frame_offset: Vec3) -> Self {
        let entries: Vec<_> = layers
            .iter()
            .filter(|l| l.enabled)
            .map(|l| CompiledNoiseEntry::from_layer(l, frame_offset))
            .collect();
        log::trace!("[batch] compiled {} of {} layers", entries.len(), layers.len());
        Self { entries }
    }

    /// Compiled entries.
    #[must_use]
    pub fn entries(&self) -> &[CompiledNoiseEntry] {
        &self.entries
    }

    /// Number of enabled layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no layer is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }
}
