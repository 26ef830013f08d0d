//! Gradient lookup table and noise-to-color mapping.
//!
//! - [`Gradient`]: continuous ramp with linear-light interpolation
//! - [`GradientLut`]: 256 samples of a ramp, rebuilt only on request
//! - [`GradientColorMapper`]: min-max normalizes noise values into the LUT
//!
//! Text format for gradients: lines of `t  #RRGGBB` or `t  #RRGGBBAA`
//! with `t` in `[0, 1]`; blank lines and `#` comments are ignored.

use serde::{Deserialize, Serialize};

/// LUT length.
pub const LUT_SIZE: usize = 256;
/// LUT index used when the noise range is degenerate or a value is not finite.
pub const DEGENERATE_INDEX: u8 = 128;

/// 8-bit sRGB color with straight alpha.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable, Serialize,
    Deserialize,
)]
pub struct Rgba8 {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Build from components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Malformed gradient definition.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GradientError {
    /// No stops at all.
    #[error("gradient has no stops")]
    Empty,
    /// Stop position outside `[0, 1]` or not finite.
    #[error("gradient stop {index}: t = {t} outside [0, 1]")]
    OutOfRange {
        /// Stop index
        index: usize,
        /// Offending position
        t: f32,
    },
    /// Stop positions must strictly increase.
    #[error("gradient stop {index}: positions must be strictly increasing")]
    NotIncreasing {
        /// First stop out of order
        index: usize,
    },
    /// Text definition could not be parsed.
    #[error("gradient line {line}: {reason}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        reason: String,
    },
}

/// One color stop along `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position in `[0, 1]`
    pub t: f32,
    /// sRGB color at this position
    pub color: Rgba8,
}

/// Continuous color ramp: strictly increasing stops, clamped at both ends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Ordered stops
    pub stops: Vec<GradientStop>,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            stops: vec![
                GradientStop { t: 0.0, color: Rgba8::BLACK },
                GradientStop { t: 1.0, color: Rgba8::WHITE },
            ],
        }
    }
}

impl Gradient {
    /// Parse the text format described in the module docs.
    pub fn parse(src: &str) -> Result<Self, GradientError> {
        let mut stops = Vec::new();
        for (lineno, raw) in src.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |reason: String| GradientError::Parse { line: lineno + 1, reason };
            let mut toks = line.split_whitespace();
            let t_str = toks.next().ok_or_else(|| err("missing position".into()))?;
            let t: f32 = t_str.parse().map_err(|_| err(format!("bad position '{t_str}'")))?;
            let col = toks.next().ok_or_else(|| err("missing color".into()))?;
            let color = parse_hex(col).map_err(err)?;
            // Anything after the color must be a comment.
            if let Some(rest) = toks.next() {
                if !rest.starts_with('#') {
                    return Err(err(format!("unexpected token '{rest}'")));
                }
            }
            stops.push(GradientStop { t, color });
        }
        let g = Self { stops };
        g.validate()?;
        Ok(g)
    }

    /// Non-empty, positions in `[0, 1]` and strictly increasing.
    pub fn validate(&self) -> Result<(), GradientError> {
        if self.stops.is_empty() {
            return Err(GradientError::Empty);
        }
        for (index, s) in self.stops.iter().enumerate() {
            if !(0.0..=1.0).contains(&s.t) {
                return Err(GradientError::OutOfRange { index, t: s.t });
            }
        }
        for (i, pair) in self.stops.windows(2).enumerate() {
            if pair[1].t.partial_cmp(&pair[0].t) != Some(std::cmp::Ordering::Greater) {
                return Err(GradientError::NotIncreasing { index: i + 1 });
            }
        }
        Ok(())
    }

    /// Sample at `t` (clamped). RGB is blended in linear light, alpha linearly.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> Rgba8 {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Rgba8::BLACK,
        };
        if !(t > first.t) {
            return first.color;
        }
        if t >= last.t {
            return last.color;
        }
        let i = self.stops.partition_point(|s| s.t <= t).saturating_sub(1);
        let (a, b) = (self.stops[i], self.stops[(i + 1).min(self.stops.len() - 1)]);
        let w = if b.t > a.t { (t - a.t) / (b.t - a.t) } else { 0.0 };
        let mix = |x: u8, y: u8| {
            let lx = srgb_to_linear(x);
            linear_to_srgb_u8(lx + w * (srgb_to_linear(y) - lx))
        };
        let alpha = f32::from(a.color.a) + w * (f32::from(b.color.a) - f32::from(a.color.a));
        Rgba8 {
            r: mix(a.color.r, b.color.r),
            g: mix(a.color.g, b.color.g),
            b: mix(a.color.b, b.color.b),
            a: unit_to_u8(alpha / 255.0),
        }
    }
}

#[inline]
fn parse_hex(tok: &str) -> Result<Rgba8, String> {
    let hex = tok.strip_prefix('#').ok_or_else(|| "expected #RRGGBB or #RRGGBBAA".to_string())?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(format!("expected 6 or 8 hex digits, got '{hex}'"));
    }
    let byte = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("bad hex '{}'", &hex[i..i + 2]))
    };
    let a = if hex.len() == 8 { byte(6)? } else { 255 };
    Ok(Rgba8 { r: byte(0)?, g: byte(2)?, b: byte(4)?, a })
}

#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let x = f32::from(c) / 255.0;
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb_u8(c: f32) -> u8 {
    let y = if c <= 0.003_130_8 { 12.92 * c } else { 1.055 * c.powf(1.0 / 2.4) - 0.055 };
    unit_to_u8(y)
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_u8(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0 + 0.5).floor() as u8
}

/// 256 colors sampled from a ramp at `i / 255`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradientLut([Rgba8; LUT_SIZE]);

impl GradientLut {
    /// Sample `f` at `i / 255` for every entry.
    #[allow(clippy::cast_precision_loss)]
    pub fn build(f: impl Fn(f32) -> Rgba8) -> Self {
        let mut lut = [Rgba8::default(); LUT_SIZE];
        for (i, c) in lut.iter_mut().enumerate() {
            *c = f(i as f32 / (LUT_SIZE - 1) as f32);
        }
        Self(lut)
    }

    /// Sample a [`Gradient`].
    #[must_use]
    pub fn from_gradient(gradient: &Gradient) -> Self {
        Self::build(|t| gradient.evaluate(t))
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: u8) -> Rgba8 {
        self.0[usize::from(index)]
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[Rgba8; LUT_SIZE] {
        &self.0
    }
}

/// Whether the observed noise range survives between passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePolicy {
    /// Widen the range monotonically across passes until `reset_range`.
    #[default]
    Accumulate,
    /// Start every pass from an empty range.
    ResetEachPass,
}

/// Running min/max of finite noise values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseRange {
    /// Smallest value seen
    pub min: f32,
    /// Largest value seen
    pub max: f32,
}

impl Default for NoiseRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl NoiseRange {
    /// Nothing observed yet.
    pub const EMPTY: Self = Self { min: f32::INFINITY, max: f32::NEG_INFINITY };

    /// Fold one value in. Non-finite values are ignored.
    pub fn include(&mut self, v: f32) {
        if !v.is_finite() {
            return;
        }
        // Both bounds are checked independently: the first value sets both.
        if v < self.min {
            self.min = v;
        }
        if v > self.max {
            self.max = v;
        }
    }

    /// True when normalization is impossible: empty, zero-width or infinite.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min) || !(self.max - self.min).is_finite()
    }

    /// LUT index for `v`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn index_of(&self, v: f32) -> u8 {
        if self.is_degenerate() || !v.is_finite() {
            return DEGENERATE_INDEX;
        }
        let t = (v - self.min) / (self.max - self.min);
        (t * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

/// Maps noise scalars to colors through a [`GradientLut`].
#[derive(Clone, Debug)]
pub struct GradientColorMapper {
    lut: GradientLut,
    range: NoiseRange,
    policy: RangePolicy,
}

impl GradientColorMapper {
    /// Build the LUT from `gradient`; the range starts empty.
    #[must_use]
    pub fn new(gradient: &Gradient, policy: RangePolicy) -> Self {
        Self { lut: GradientLut::from_gradient(gradient), range: NoiseRange::EMPTY, policy }
    }

    /// Resample the LUT after a gradient edit. The range is left alone.
    pub fn rebuild(&mut self, gradient: &Gradient) {
        self.lut = GradientLut::from_gradient(gradient);
        log::debug!("[color] rebuilt LUT from {} stops", gradient.stops.len());
    }

    /// Resample the LUT from an arbitrary ramp function.
    pub fn rebuild_with(&mut self, f: impl Fn(f32) -> Rgba8) {
        self.lut = GradientLut::build(f);
    }

    /// Current LUT.
    #[must_use]
    pub fn lut(&self) -> &GradientLut {
        &self.lut
    }

    /// Range used by the most recent mapping.
    #[must_use]
    pub fn range(&self) -> NoiseRange {
        self.range
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    /// Change the policy; takes effect on the next pass.
    pub fn set_policy(&mut self, policy: RangePolicy) {
        self.policy = policy;
    }

    /// Forget the observed range.
    pub fn reset_range(&mut self) {
        self.range = NoiseRange::EMPTY;
    }

    /// Range the next pass over `noise` would use, without committing it.
    #[must_use]
    pub fn preview_range(&self, noise: &[f32]) -> NoiseRange {
        let mut range = match self.policy {
            RangePolicy::Accumulate => self.range,
            RangePolicy::ResetEachPass => NoiseRange::EMPTY,
        };
        for &v in noise {
            range.include(v);
        }
        range
    }

    /// Fold `noise` into the range, then map every value to a color.
    pub fn map_colors(&mut self, noise: &[f32]) -> Vec<Rgba8> {
        let mut out = Vec::with_capacity(noise.len());
        self.map_colors_into(noise, &mut out);
        out
    }

    /// Like [`GradientColorMapper::map_colors`] but reuses `out`.
    pub fn map_colors_into(&mut self, noise: &[f32], out: &mut Vec<Rgba8>) {
        self.range = self.preview_range(noise);
        if self.range.is_degenerate() {
            log::debug!(
                "[color] degenerate noise range [{}, {}]; using midpoint color",
                self.range.min,
                self.range.max
            );
        }
        let range = self.range;
        out.clear();
        out.extend(noise.iter().map(|&v| self.lut.get(range.index_of(v))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_with_and_without_alpha() {
        assert_eq!(parse_hex("#102030"), Ok(Rgba8::new(0x10, 0x20, 0x30, 255)));
        assert_eq!(parse_hex("#10203040"), Ok(Rgba8::new(0x10, 0x20, 0x30, 0x40)));
        assert!(parse_hex("102030").is_err());
        assert!(parse_hex("#1020").is_err());
        assert!(parse_hex("#zz2030").is_err());
    }

    #[test]
    fn index_rounds_and_clamps() {
        let r = NoiseRange { min: 0.0, max: 1.0 };
        assert_eq!(r.index_of(0.0), 0);
        assert_eq!(r.index_of(1.0), 255);
        assert_eq!(r.index_of(0.5), 128);
        assert_eq!(r.index_of(-3.0), 0);
        assert_eq!(r.index_of(7.0), 255);
        assert_eq!(r.index_of(f32::NAN), DEGENERATE_INDEX);
    }

    #[test]
    fn first_value_sets_both_bounds() {
        let mut r = NoiseRange::EMPTY;
        r.include(3.0);
        assert_eq!(r, NoiseRange { min: 3.0, max: 3.0 });
        assert!(r.is_degenerate());
        r.include(f32::INFINITY);
        assert_eq!(r.max, 3.0);
    }
}
