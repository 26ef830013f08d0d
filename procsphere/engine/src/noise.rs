//! 3D simplex noise and the layered noise filters.
//!
//! `simplex3` is the Gustavson/McEwan formulation (mod-289 permutation
//! polynomial, no lookup tables). `shaders/noise_displace.wgsl` carries the
//! same code; keep the two in step so CPU and GPU agree to rounding.

use glam::{Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};

use crate::batch::CompiledNoiseEntry;
use crate::config::{MaskMode, MAX_OCTAVES};

#[inline]
fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + 1.0) * x)
}

#[inline]
fn taylor_inv_sqrt(r: Vec4) -> Vec4 {
    1.792_842_9 - 0.853_734_7 * r
}

/// GLSL `step`: 1 where `edge <= x`.
#[inline]
fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(edge.cmple(x), Vec3::ONE, Vec3::ZERO)
}

#[inline]
fn step4(edge: Vec4, x: Vec4) -> Vec4 {
    Vec4::select(edge.cmple(x), Vec4::ONE, Vec4::ZERO)
}

/// Simplex noise at `v`, roughly in `[-1, 1]`.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn simplex3(v: Vec3) -> f32 {
    const C: [f32; 2] = [1.0 / 6.0, 1.0 / 3.0];
    const D: Vec4 = Vec4::new(0.0, 0.5, 1.0, 2.0);

    // First corner
    let mut i = (v + v.dot(Vec3::splat(C[1]))).floor();
    let x0 = v - i + i.dot(Vec3::splat(C[0]));

    // Other corners
    let g = step3(x0.yzx(), x0);
    let l = 1.0 - g;
    let i1 = g.min(l.zxy());
    let i2 = g.max(l.zxy());

    let x1 = x0 - i1 + C[0];
    let x2 = x0 - i2 + C[1];
    let x3 = x0 - D.y;

    // Permutations
    i = mod289_3(i);
    let p = permute(
        permute(
            permute(i.z + Vec4::new(0.0, i1.z, i2.z, 1.0)) + i.y + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + i.x
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients: 7x7 points over a square, mapped onto an octahedron.
    let n_ = 0.142_857_15_f32;
    let ns = n_ * D.wyz() - D.xzx();

    let j = p - 49.0 * (p * ns.z * ns.z).floor();

    let x_ = (j * ns.z).floor();
    let y_ = (j - 7.0 * x_).floor();

    let x = x_ * ns.x + ns.y;
    let y = y_ * ns.x + ns.y;
    let h = 1.0 - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + 1.0;
    let s1 = b1.floor() * 2.0 + 1.0;
    let sh = -step4(h, Vec4::ZERO);

    let a0 = b0.xzyw() + s0.xzyw() * sh.xxyy();
    let a1 = b1.xzyw() + s1.xzyw() * sh.zzww();

    let mut p0 = Vec3::new(a0.x, a0.y, h.x);
    let mut p1 = Vec3::new(a0.z, a0.w, h.y);
    let mut p2 = Vec3::new(a1.x, a1.y, h.z);
    let mut p3 = Vec3::new(a1.z, a1.w, h.w);

    // Normalise gradients
    let norm = taylor_inv_sqrt(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    // Mix final noise value
    let m = (0.6 - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3))).max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

/// Value of one compiled layer at unit direction `unit`.
///
/// A positive `weight_multiplier` selects the ridged filter.
#[must_use]
pub fn evaluate_entry(entry: &CompiledNoiseEntry, unit: Vec3) -> f32 {
    let offset = Vec3::from(entry.offset);
    let octaves = entry.num_layers.min(MAX_OCTAVES);
    let mut frequency = entry.first_layer_roughness;
    let mut amplitude = 1.0_f32;
    let mut sum = 0.0_f32;
    if entry.weight_multiplier > 0.0 {
        let mut weight = 1.0_f32;
        for _ in 0..octaves {
            let mut v = 1.0 - simplex3(unit * frequency + offset).abs();
            v *= v;
            v *= weight;
            weight = (v * entry.weight_multiplier).clamp(0.0, 1.0);
            sum += v * amplitude;
            frequency *= entry.roughness;
            amplitude *= entry.persistence;
        }
    } else {
        for _ in 0..octaves {
            let n = simplex3(unit * frequency + offset);
            sum += (n + 1.0) * 0.5 * amplitude;
            frequency *= entry.roughness;
            amplitude *= entry.persistence;
        }
    }
    (sum - entry.min_value).max(0.0) * entry.strength
}

/// Accumulated elevation of all entries at `unit`. The first entry seeds
/// the sum and masks the rest; an empty slice yields 0.
#[must_use]
pub fn evaluate_elevation(entries: &[CompiledNoiseEntry], unit: Vec3) -> f32 {
    let Some((first, rest)) = entries.split_first() else {
        return 0.0;
    };
    let first_value = evaluate_entry(first, unit);
    let mut elevation = first_value;
    for e in rest {
        let mask = match MaskMode::from_gpu(e.mask_mode) {
            MaskMode::None => 1.0,
            MaskMode::Mask => first_value,
            MaskMode::ReverseMask => (1.0 - first_value).max(0.0),
        };
        elevation += evaluate_entry(e, unit) * mask;
    }
    elevation
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn simplex_is_bounded_and_deterministic() {
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for i in 0..2000 {
            let t = i as f32 * 0.137;
            let p = Vec3::new(t.sin() * 7.3, t * 0.71, (t * 1.3).cos() * 3.1);
            let n = simplex3(p);
            assert!(n.is_finite());
            assert!((-1.1..=1.1).contains(&n), "{n} at {p:?}");
            assert_eq!(n, simplex3(p));
            lo = lo.min(n);
            hi = hi.max(n);
        }
        // Not a constant function.
        assert!(hi - lo > 0.5);
    }

    #[test]
    fn empty_batch_is_flat() {
        assert_eq!(evaluate_elevation(&[], Vec3::X), 0.0);
    }

    #[test]
    fn zero_strength_entry_contributes_nothing() {
        let e = CompiledNoiseEntry { strength: 0.0, num_layers: 4, ..CompiledNoiseEntry::zeroed() };
        assert_eq!(evaluate_entry(&e, Vec3::Y), 0.0);
    }
}
