use glam::Vec3;
use sphere_engine::kernels::displace_vertex;
use sphere_engine::noise::{evaluate_elevation, evaluate_entry};
use sphere_engine::{
    CompiledNoiseEntry, ComputeBackend, CpuBackend, DispatchError, MaskMode, NoiseBatch,
    NoiseFilter, NoiseLayer, RigidNoiseParams, SimpleNoiseParams,
};
use sphere_geo::{build_topology, Resolution};

fn lattice(r: u32) -> Vec<Vec3> {
    build_topology(Resolution::new(r).unwrap()).vertices
}

fn rough_layers() -> Vec<NoiseLayer> {
    vec![
        NoiseLayer {
            simple: SimpleNoiseParams {
                strength: 0.2,
                num_layers: 5,
                first_layer_roughness: 1.1,
                roughness: 2.3,
                persistence: 0.5,
                min_value: 0.9,
                offset: Vec3::new(0.3, -1.2, 4.0),
            },
            ..NoiseLayer::default()
        },
        NoiseLayer {
            mask_mode: MaskMode::Mask,
            simple: SimpleNoiseParams {
                strength: 1.5,
                num_layers: 4,
                first_layer_roughness: 2.0,
                roughness: 2.0,
                persistence: 0.6,
                min_value: 0.3,
                offset: Vec3::ZERO,
            },
            filter: NoiseFilter::Rigid(RigidNoiseParams::default()),
            ..NoiseLayer::default()
        },
    ]
}

#[test]
fn projection_lands_on_radius() {
    let cube = lattice(9);
    for radius in [0.5_f32, 1.0, 13.0] {
        let out = CpuBackend::serial().project_all(&cube, 9, radius).unwrap();
        for (p, n) in out.positions.iter().zip(&out.normals) {
            assert!((p.length() - radius).abs() < 1e-4 * radius, "{p:?}");
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!((*p - *n * radius).length() < 1e-4 * radius);
        }
    }
}

#[test]
fn parallel_matches_serial_bit_for_bit() {
    let cube = lattice(40);
    let serial = CpuBackend::serial();
    let parallel = CpuBackend::parallel();
    let pool = CpuBackend::with_threads(3).unwrap();

    let a = serial.project_all(&cube, 40, 2.0).unwrap();
    let b = parallel.project_all(&cube, 40, 2.0).unwrap();
    let c = pool.project_all(&cube, 40, 2.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);

    let batch = NoiseBatch::compile(&rough_layers(), Vec3::new(0.0, 0.0, 0.7));
    let da = serial.displace_all(&a.positions, &batch, 2.0).unwrap();
    let db = parallel.displace_all(&a.positions, &batch, 2.0).unwrap();
    let dc = pool.displace_all(&a.positions, &batch, 2.0).unwrap();
    assert_eq!(da, db);
    assert_eq!(da, dc);
}

#[test]
fn zero_layers_keep_the_sphere() {
    let cube = lattice(6);
    let cpu = CpuBackend::parallel();
    let base = cpu.project_all(&cube, 6, 3.0).unwrap();
    let out = cpu.displace_all(&base.positions, &NoiseBatch::default(), 3.0).unwrap();
    assert!(out.noise.iter().all(|&v| v == 0.0));
    for (a, b) in out.positions.iter().zip(&base.positions) {
        assert!((*a - *b).length() < 1e-5);
    }
}

#[test]
fn displacement_is_radial() {
    let batch = NoiseBatch::compile(&rough_layers(), Vec3::ZERO);
    let p = Vec3::new(0.3, -2.0, 1.1);
    let (q, elevation) = displace_vertex(p, batch.entries(), 4.0);
    assert!(elevation >= 0.0);
    assert!((q.length() - 4.0 * (1.0 + elevation)).abs() < 1e-4);
    assert!(q.normalize().dot(p.normalize()) > 0.99999);
}

#[test]
fn mask_modes_scale_by_first_layer() {
    let first = CompiledNoiseEntry {
        strength: 1.0,
        num_layers: 3,
        first_layer_roughness: 1.0,
        roughness: 2.0,
        persistence: 0.5,
        ..CompiledNoiseEntry::default()
    };
    let second = CompiledNoiseEntry { offset: [5.0, 1.0, -2.0], ..first };
    let unit = Vec3::new(0.48, 0.6, 0.64);
    let f = evaluate_entry(&first, unit);
    let s = evaluate_entry(&second, unit);
    assert!(f > 0.0 && s > 0.0);

    let none = evaluate_elevation(&[first, second], unit);
    assert!((none - (f + s)).abs() < 1e-6);

    let masked = CompiledNoiseEntry { mask_mode: MaskMode::Mask.as_gpu(), ..second };
    let m = evaluate_elevation(&[first, masked], unit);
    assert!((m - (f + s * f)).abs() < 1e-6);

    let reverse = CompiledNoiseEntry { mask_mode: MaskMode::ReverseMask.as_gpu(), ..second };
    let r = evaluate_elevation(&[first, reverse], unit);
    assert!((r - (f + s * (1.0 - f).max(0.0))).abs() < 1e-6);
}

#[test]
fn masked_layer_vanishes_under_silent_first_layer() {
    let silent = CompiledNoiseEntry { num_layers: 2, strength: 0.0, ..CompiledNoiseEntry::default() };
    let loud = CompiledNoiseEntry {
        strength: 2.0,
        num_layers: 2,
        first_layer_roughness: 1.0,
        roughness: 2.0,
        persistence: 0.5,
        mask_mode: MaskMode::Mask.as_gpu(),
        ..CompiledNoiseEntry::default()
    };
    assert_eq!(evaluate_elevation(&[silent, loud], Vec3::Z), 0.0);
}

#[test]
fn min_value_clips_to_zero() {
    let e = CompiledNoiseEntry {
        strength: 1.0,
        num_layers: 8,
        first_layer_roughness: 1.0,
        roughness: 2.0,
        persistence: 0.5,
        min_value: 10.0,
        ..CompiledNoiseEntry::default()
    };
    for p in [Vec3::X, Vec3::Y, Vec3::new(0.6, 0.0, 0.8)] {
        assert_eq!(evaluate_entry(&e, p), 0.0);
        let rigid = CompiledNoiseEntry { weight_multiplier: 0.8, ..e };
        assert_eq!(evaluate_entry(&rigid, p), 0.0);
    }
}

#[test]
fn rigid_filter_is_non_negative() {
    let e = CompiledNoiseEntry {
        strength: 1.0,
        num_layers: 6,
        first_layer_roughness: 1.7,
        roughness: 2.1,
        persistence: 0.55,
        weight_multiplier: 0.8,
        ..CompiledNoiseEntry::default()
    };
    let cube = lattice(8);
    let base = CpuBackend::serial().project_all(&cube, 8, 1.0).unwrap();
    let values: Vec<f32> = base.positions.iter().map(|&p| evaluate_entry(&e, p)).collect();
    assert!(values.iter().all(|&v| v >= 0.0 && v.is_finite()));
    assert!(values.iter().any(|&v| v > 0.0));
}

#[test]
fn size_mismatch_is_reported() {
    let cube = lattice(2);
    let mut pos = vec![Vec3::ZERO; cube.len()];
    let mut nrm = vec![Vec3::ZERO; cube.len() - 1];
    let err = CpuBackend::serial().project(&cube, 2, 1.0, &mut pos, &mut nrm).unwrap_err();
    assert_eq!(
        err,
        DispatchError::SizeMismatch { what: "normals", expected: cube.len(), got: cube.len() - 1 }
    );

    let mut noise = vec![0.0; 3];
    let err = CpuBackend::parallel()
        .displace(&cube, &NoiseBatch::default(), 1.0, &mut pos, &mut noise)
        .unwrap_err();
    assert!(matches!(err, DispatchError::SizeMismatch { what: "noise", .. }));
}

#[test]
fn backend_names() {
    assert_eq!(CpuBackend::serial().name(), "cpu-serial");
    assert_eq!(CpuBackend::parallel().name(), "cpu-rayon");
    let boxed: Box<dyn ComputeBackend> = Box::new(CpuBackend::serial());
    assert_eq!(boxed.name(), "cpu-serial");
}
