use glam::Vec3;
use sphere_engine::{
    CompiledNoiseEntry, MaskMode, NoiseBatch, NoiseFilter, NoiseLayer, RigidNoiseParams,
    SimpleNoiseParams,
};

fn layer(enabled: bool, filter: NoiseFilter, strength: f32) -> NoiseLayer {
    NoiseLayer {
        enabled,
        mask_mode: MaskMode::None,
        simple: SimpleNoiseParams { strength, ..SimpleNoiseParams::default() },
        filter,
    }
}

#[test]
fn disabled_layers_are_skipped_and_order_kept() {
    let layers = [
        layer(false, NoiseFilter::Simple, 9.0),
        layer(true, NoiseFilter::Simple, 1.0),
        layer(true, NoiseFilter::Rigid(RigidNoiseParams { weight_multiplier: 0.8 }), 2.0),
    ];
    let batch = NoiseBatch::compile(&layers, Vec3::ZERO);
    assert_eq!(batch.len(), 2);
    let e = batch.entries();
    assert_eq!(e[0].weight_multiplier, 0.0);
    assert_eq!(e[0].strength, 1.0);
    assert_eq!(e[1].weight_multiplier, 0.8);
    assert_eq!(e[1].strength, 2.0);
}

#[test]
fn rigid_default_weight_is_point_eight() {
    let l = layer(true, NoiseFilter::Rigid(RigidNoiseParams::default()), 1.0);
    let batch = NoiseBatch::compile(&[l], Vec3::ZERO);
    assert_eq!(batch.entries()[0].weight_multiplier, 0.8);
}

#[test]
fn frame_offset_is_added_to_base_offset() {
    let mut l = layer(true, NoiseFilter::Simple, 1.0);
    l.simple.offset = Vec3::new(1.0, 2.0, 3.0);
    let batch = NoiseBatch::compile(&[l], Vec3::new(0.5, 0.0, -1.0));
    assert_eq!(batch.entries()[0].offset, [1.5, 2.0, 2.0]);
    // Configuration is not touched.
    assert_eq!(l.simple.offset, Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn entry_fields_follow_layer() {
    let l = NoiseLayer {
        enabled: true,
        mask_mode: MaskMode::ReverseMask,
        simple: SimpleNoiseParams {
            strength: 0.3,
            num_layers: 5,
            first_layer_roughness: 1.5,
            roughness: 2.2,
            persistence: 0.4,
            min_value: 0.9,
            offset: Vec3::ZERO,
        },
        filter: NoiseFilter::Simple,
    };
    let batch = NoiseBatch::compile(&[l], Vec3::ZERO);
    let expected = CompiledNoiseEntry {
        offset: [0.0; 3],
        frequency: 2.2,
        first_layer_roughness: 1.5,
        roughness: 2.2,
        persistence: 0.4,
        strength: 0.3,
        min_value: 0.9,
        weight_multiplier: 0.0,
        num_layers: 5,
        mask_mode: -1,
    };
    assert_eq!(batch.entries(), &[expected]);
}

#[test]
fn empty_and_all_disabled_batches() {
    assert!(NoiseBatch::compile(&[], Vec3::ZERO).is_empty());
    let off = [layer(false, NoiseFilter::Simple, 1.0); 4];
    let batch = NoiseBatch::compile(&off, Vec3::ONE);
    assert!(batch.is_empty());
    assert!(batch.as_bytes().is_empty());
}
