//! CPU/GPU parity. Skipped when no compute adapter is available.

use glam::Vec3;
use sphere_engine::gpu::persistent;
use sphere_engine::{
    ComputeBackend, CpuBackend, GpuBackend, MaskMode, NoiseBatch, NoiseFilter, NoiseLayer,
    ProceduralSphere, RigidNoiseParams, SimpleNoiseParams, SphereConfig,
};
use sphere_geo::{build_topology, Resolution};

fn gpu() -> Option<GpuBackend> {
    let _ = env_logger::builder().is_test(true).try_init();
    if persistent().is_err() {
        eprintln!("Skipping GPU test: no GPU available");
        return None;
    }
    Some(GpuBackend::persistent().unwrap_or_else(|e| panic!("pipelines: {e}")))
}

fn layers() -> Vec<NoiseLayer> {
    vec![
        NoiseLayer {
            simple: SimpleNoiseParams {
                strength: 0.3,
                num_layers: 6,
                first_layer_roughness: 1.3,
                roughness: 2.1,
                persistence: 0.5,
                min_value: 0.7,
                offset: Vec3::new(1.0, 2.0, 3.0),
            },
            ..NoiseLayer::default()
        },
        NoiseLayer {
            mask_mode: MaskMode::ReverseMask,
            filter: NoiseFilter::Rigid(RigidNoiseParams { weight_multiplier: 0.9 }),
            simple: SimpleNoiseParams { strength: 0.5, num_layers: 4, ..SimpleNoiseParams::default() },
            ..NoiseLayer::default()
        },
    ]
}

#[test]
fn projection_matches_cpu() {
    let Some(gpu) = gpu() else { return };
    let cube = build_topology(Resolution::new(33).unwrap()).vertices;
    let a = CpuBackend::serial().project_all(&cube, 33, 1.5).unwrap();
    let b = gpu.project_all(&cube, 33, 1.5).unwrap();
    let mut max_abs = 0.0f32;
    for (p, q) in a.positions.iter().zip(&b.positions) {
        max_abs = max_abs.max((*p - *q).abs().max_element());
    }
    for (p, q) in a.normals.iter().zip(&b.normals) {
        max_abs = max_abs.max((*p - *q).abs().max_element());
    }
    assert!(max_abs < 1e-5, "max abs diff {max_abs}");
}

#[test]
fn displacement_matches_cpu() {
    let Some(gpu) = gpu() else { return };
    let cube = build_topology(Resolution::new(20).unwrap()).vertices;
    let base = CpuBackend::serial().project_all(&cube, 20, 1.0).unwrap();
    let batch = NoiseBatch::compile(&layers(), Vec3::new(0.0, 0.0, 0.25));
    let a = CpuBackend::serial().displace_all(&base.positions, &batch, 1.0).unwrap();
    let b = gpu.displace_all(&base.positions, &batch, 1.0).unwrap();
    let mut max_noise = 0.0f32;
    for (x, y) in a.noise.iter().zip(&b.noise) {
        max_noise = max_noise.max((x - y).abs());
    }
    assert!(max_noise < 1e-3, "max noise diff {max_noise}");
    for (p, q) in a.positions.iter().zip(&b.positions) {
        assert!((*p - *q).length() < 2e-3);
    }
}

#[test]
fn empty_batch_dispatches() {
    let Some(gpu) = gpu() else { return };
    let points = vec![Vec3::X, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 0.0, -3.0)];
    let out = gpu.displace_all(&points, &NoiseBatch::default(), 1.0).unwrap();
    assert_eq!(out.noise, vec![0.0; 3]);
    for p in &out.positions {
        assert!((p.length() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn sphere_runs_on_gpu() {
    let Some(gpu) = gpu() else { return };
    let mut cfg = SphereConfig { resolution: 16, ..SphereConfig::default() };
    cfg.shape.noise_layers = layers();
    let on_gpu = ProceduralSphere::new(cfg.clone(), gpu).unwrap();
    let on_cpu = ProceduralSphere::new(cfg, CpuBackend::parallel()).unwrap();
    assert_eq!(on_gpu.mesh().triangles, on_cpu.mesh().triangles);
    for (x, y) in on_gpu.mesh().noise_values.iter().zip(&on_cpu.mesh().noise_values) {
        assert!((x - y).abs() < 1e-3);
    }
}
