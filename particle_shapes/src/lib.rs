//! # particle_shapes
//!
//! Fixed-size point clouds for five parametric shape archetypes.  Every
//! cloud holds exactly `count` points; clouds are generated once and never
//! mutated afterwards.
//!
//! | Archetype | Placement |
//! |---|---|
//! | Heart    | parametric heart surface, scaled by 0.15 |
//! | Flower   | 4-petal rose curve in spherical coordinates |
//! | Saturn   | 60% tilted ring (r ∈ [3, 5]), 40% sphere shell (r = 1.5) |
//! | Firework | uniform-volume ball, r = 4 |
//! | Sphere   | uniform sphere shell, r = 3 |
//!
//! Every point gets independent per-axis jitter in `[-0.05, 0.05]` unless
//! the generator is configured otherwise.
//!
//! ## Quick start
//!
//! ```rust
//! use particle_shapes::{generate, ShapeArchetype};
//!
//! let heart = generate(ShapeArchetype::Heart, 4000);
//! assert_eq!(heart.len(), 4000);
//! ```

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use rand::Rng;

/// One particle position.
pub type ParticlePosition = Vec3;

/// Default number of particles in a field.
pub const DEFAULT_PARTICLE_COUNT: usize = 4000;

/// Default per-axis jitter half-width.
pub const DEFAULT_JITTER: f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// ShapeArchetype
// ════════════════════════════════════════════════════════════════════════════

/// The closed set of target shapes a particle field can morph toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeArchetype {
    Heart,
    Flower,
    Saturn,
    Firework,
    Sphere,
}

impl ShapeArchetype {
    /// All archetypes, in selector order.
    pub const ALL: [ShapeArchetype; 5] = [
        ShapeArchetype::Heart,
        ShapeArchetype::Flower,
        ShapeArchetype::Saturn,
        ShapeArchetype::Firework,
        ShapeArchetype::Sphere,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeArchetype::Heart    => "Heart",
            ShapeArchetype::Flower   => "Flower",
            ShapeArchetype::Saturn   => "Saturn",
            ShapeArchetype::Firework => "Firework",
            ShapeArchetype::Sphere   => "Sphere",
        }
    }

    /// Short label for selector buttons.
    pub fn label(self) -> &'static str {
        match self {
            ShapeArchetype::Heart    => "HEART",
            ShapeArchetype::Flower   => "FLOWER",
            ShapeArchetype::Saturn   => "SATURN",
            ShapeArchetype::Firework => "FIREWORK",
            ShapeArchetype::Sphere   => "ORB",
        }
    }

    /// Position in [`ShapeArchetype::ALL`].
    pub fn index(self) -> usize {
        match self {
            ShapeArchetype::Heart    => 0,
            ShapeArchetype::Flower   => 1,
            ShapeArchetype::Saturn   => 2,
            ShapeArchetype::Firework => 3,
            ShapeArchetype::Sphere   => 4,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Next archetype in selector order, wrapping.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous archetype in selector order, wrapping.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ShapeArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no archetype.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shape `{0}` (expected heart, flower, saturn, firework or sphere)")]
pub struct UnknownArchetype(pub String);

impl FromStr for ShapeArchetype {
    type Err = UnknownArchetype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownArchetype(wanted.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TargetBuffer
// ════════════════════════════════════════════════════════════════════════════

/// Immutable point cloud for one archetype.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetBuffer {
    points: Box<[Vec3]>,
}

/// Distance-from-origin summary of a point cloud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusStats {
    pub min:  f32,
    pub mean: f32,
    pub max:  f32,
}

impl TargetBuffer {
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn as_slice(&self) -> &[Vec3] { &self.points }

    pub fn radius_stats(&self) -> RadiusStats {
        radius_stats(&self.points)
    }
}

impl From<Vec<Vec3>> for TargetBuffer {
    fn from(points: Vec<Vec3>) -> Self {
        TargetBuffer { points: points.into_boxed_slice() }
    }
}

/// Min / mean / max distance from the origin.  All zero for an empty slice.
pub fn radius_stats(points: &[Vec3]) -> RadiusStats {
    if points.is_empty() {
        return RadiusStats { min: 0.0, mean: 0.0, max: 0.0 };
    }
    let mut min = f32::INFINITY;
    let mut max = 0.0_f32;
    let mut sum = 0.0_f64;
    for p in points {
        let r = p.length();
        min = min.min(r);
        max = max.max(r);
        sum += r as f64;
    }
    RadiusStats { min, mean: (sum / points.len() as f64) as f32, max }
}

// ════════════════════════════════════════════════════════════════════════════
// Sampling
// ════════════════════════════════════════════════════════════════════════════

/// Spherical → Cartesian, y-up: `polar` is measured from +Y, `azimuth`
/// sweeps from +Z toward +X.
pub fn from_spherical(radius: f32, polar: f32, azimuth: f32) -> Vec3 {
    let s = polar.sin() * radius;
    Vec3::new(s * azimuth.sin(), polar.cos() * radius, s * azimuth.cos())
}

/// Polar angle for uniform sphere-surface sampling.
fn uniform_polar<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random_range(-1.0_f32..=1.0).acos()
}

fn sample_heart<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let phi   = rng.random::<f32>() * TAU;
    let theta = rng.random::<f32>() * PI;
    let x = 16.0 * theta.sin().powi(3);
    let y = 13.0 * theta.cos()
        - 5.0 * (2.0 * theta).cos()
        - 2.0 * (3.0 * theta).cos()
        - (4.0 * theta).cos();
    let z = 4.0 * theta.cos() * phi.sin() * theta.sin();
    Vec3::new(x, y, z) * 0.15
}

fn sample_saturn<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    if rng.random::<f32>() > 0.4 {
        // Ring, tilted
        let angle  = rng.random::<f32>() * TAU;
        let radius = 3.0 + rng.random::<f32>() * 2.0;
        let ring = Vec3::new(
            angle.cos() * radius,
            (rng.random::<f32>() - 0.5) * 0.1,
            angle.sin() * radius,
        );
        Quat::from_axis_angle(Vec3::new(1.0, 0.0, 1.0).normalize(), PI / 6.0) * ring
    } else {
        // Planet body
        let polar   = uniform_polar(rng);
        let azimuth = rng.random::<f32>() * TAU;
        from_spherical(1.5, polar, azimuth)
    }
}

fn sample_flower<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    const PETALS: f32 = 4.0;
    let theta = rng.random::<f32>() * TAU;
    let phi   = rng.random::<f32>() * PI;
    let r = 2.0 + (PETALS * theta).cos() * phi.sin();
    from_spherical(r, phi, theta)
}

fn sample_firework<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let u = rng.random::<f32>();
    let v = rng.random::<f32>();
    let azimuth = TAU * u;
    let polar   = (2.0 * v - 1.0).acos();
    // cube root keeps the density uniform through the volume
    let r = rng.random::<f32>().cbrt() * 4.0;
    from_spherical(r, polar, azimuth)
}

fn sample_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let polar   = uniform_polar(rng);
    let azimuth = rng.random::<f32>() * TAU;
    from_spherical(3.0, polar, azimuth)
}

/// Draw one point of `archetype` before jitter is applied.
pub fn sample_point<R: Rng + ?Sized>(archetype: ShapeArchetype, rng: &mut R) -> Vec3 {
    match archetype {
        ShapeArchetype::Heart    => sample_heart(rng),
        ShapeArchetype::Flower   => sample_flower(rng),
        ShapeArchetype::Saturn   => sample_saturn(rng),
        ShapeArchetype::Firework => sample_firework(rng),
        ShapeArchetype::Sphere   => sample_sphere(rng),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShapeGenerator — builder
// ════════════════════════════════════════════════════════════════════════════

/// Builds target buffers of a fixed size.
///
/// ```rust
/// use particle_shapes::{ShapeGenerator, ShapeArchetype};
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let pure = ShapeGenerator::new(500)
///     .jitter(0.0)
///     .generate(ShapeArchetype::Sphere, &mut rng);
/// assert!(pure.as_slice().iter().all(|p| (p.length() - 3.0).abs() < 1e-4));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ShapeGenerator {
    count:  usize,
    jitter: f32,
}

impl ShapeGenerator {
    pub fn new(count: usize) -> Self {
        ShapeGenerator { count, jitter: DEFAULT_JITTER }
    }

    /// Per-axis jitter half-width.  `0.0` gives the pure distribution.
    pub fn jitter(mut self, half_width: f32) -> Self {
        self.jitter = half_width.abs();
        self
    }

    pub fn count(&self) -> usize { self.count }

    pub fn generate<R: Rng + ?Sized>(&self, archetype: ShapeArchetype, rng: &mut R) -> TargetBuffer {
        let mut points = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let mut p = sample_point(archetype, rng);
            if self.jitter > 0.0 {
                p.x += (rng.random::<f32>() - 0.5) * 2.0 * self.jitter;
                p.y += (rng.random::<f32>() - 0.5) * 2.0 * self.jitter;
                p.z += (rng.random::<f32>() - 0.5) * 2.0 * self.jitter;
            }
            points.push(p);
        }
        TargetBuffer::from(points)
    }

    /// Generate one buffer for every archetype.
    pub fn library<R: Rng + ?Sized>(&self, rng: &mut R) -> ShapeLibrary {
        ShapeLibrary {
            count:   self.count,
            targets: ShapeArchetype::ALL.map(|a| self.generate(a, rng)),
        }
    }
}

/// Generate `count` jittered points for `archetype` with the thread RNG.
pub fn generate(archetype: ShapeArchetype, count: usize) -> TargetBuffer {
    ShapeGenerator::new(count).generate(archetype, &mut rand::rng())
}

// ════════════════════════════════════════════════════════════════════════════
// ShapeLibrary — one precomputed target per archetype
// ════════════════════════════════════════════════════════════════════════════

/// All five target buffers, each of the same length.
#[derive(Clone, Debug)]
pub struct ShapeLibrary {
    count:   usize,
    targets: [TargetBuffer; 5],
}

impl ShapeLibrary {
    /// Generate every archetype with default jitter and the thread RNG.
    pub fn new(count: usize) -> Self {
        ShapeGenerator::new(count).library(&mut rand::rng())
    }

    /// Assemble a library from prebuilt buffers, in [`ShapeArchetype::ALL`]
    /// order.  Returns `None` if the lengths differ.
    pub fn from_targets(targets: [TargetBuffer; 5]) -> Option<Self> {
        let count = targets[0].len();
        if targets.iter().any(|t| t.len() != count) {
            return None;
        }
        Some(ShapeLibrary { count, targets })
    }

    pub fn count(&self) -> usize { self.count }

    pub fn target(&self, archetype: ShapeArchetype) -> &TargetBuffer {
        &self.targets[archetype.index()]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng { StdRng::seed_from_u64(0x5eed) }

    #[test]
    fn every_archetype_has_exact_count() {
        let mut rng = rng();
        let gen = ShapeGenerator::new(4000);
        for a in ShapeArchetype::ALL {
            assert_eq!(gen.generate(a, &mut rng).len(), 4000, "{}", a);
        }
    }

    #[test]
    fn repeated_generation_keeps_count() {
        for _ in 0..5 {
            for a in ShapeArchetype::ALL {
                assert_eq!(generate(a, 257).len(), 257);
            }
        }
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(generate(ShapeArchetype::Heart, 0).is_empty());
    }

    #[test]
    fn sphere_radius_within_jitter() {
        let mut rng = rng();
        let buf = ShapeGenerator::new(3000).generate(ShapeArchetype::Sphere, &mut rng);
        // worst case: full jitter on all three axes
        let bound = 3.0_f32.sqrt() * DEFAULT_JITTER + 1e-4;
        for p in buf.as_slice() {
            assert!((p.length() - 3.0).abs() <= bound, "radius {}", p.length());
        }
    }

    #[test]
    fn sphere_pre_jitter_is_on_shell() {
        let mut rng = rng();
        for _ in 0..2000 {
            let p = sample_point(ShapeArchetype::Sphere, &mut rng);
            assert!((p.length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn firework_radius_cubed_is_uniform() {
        let mut rng = rng();
        let n = 20_000;
        let mut buckets = [0usize; 4];
        let mut sum = 0.0_f64;
        for _ in 0..n {
            let r3 = sample_point(ShapeArchetype::Firework, &mut rng).length().powi(3);
            assert!(r3 <= 64.0 + 1e-3);
            sum += r3 as f64;
            buckets[((r3 / 16.0) as usize).min(3)] += 1;
        }
        let mean = sum / n as f64;
        assert!((mean - 32.0).abs() < 1.0, "mean r^3 = {}", mean);
        for (i, &b) in buckets.iter().enumerate() {
            let frac = b as f64 / n as f64;
            assert!((frac - 0.25).abs() < 0.02, "quartile {} holds {:.3}", i, frac);
        }
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let jittered = ShapeGenerator::new(1000).generate(ShapeArchetype::Heart, &mut a);
        // replay the same stream: sample, then three jitter draws per point
        for p in jittered.as_slice() {
            let base = sample_point(ShapeArchetype::Heart, &mut b);
            for _ in 0..3 { let _: f32 = b.random(); }
            let d = *p - base;
            assert!(d.abs().max_element() <= DEFAULT_JITTER + 1e-6);
        }
    }

    #[test]
    fn heart_fits_scaled_curve() {
        let mut rng = rng();
        let buf = ShapeGenerator::new(2000).jitter(0.0).generate(ShapeArchetype::Heart, &mut rng);
        for p in buf.as_slice() {
            assert!(p.x >= -1e-4 && p.x <= 16.0 * 0.15 + 1e-4);
            assert!(p.z.abs() <= 4.0 * 0.15);
        }
    }

    #[test]
    fn saturn_mixes_ring_and_body() {
        let mut rng = rng();
        let n = 10_000;
        let mut ring = 0;
        for _ in 0..n {
            let r = sample_point(ShapeArchetype::Saturn, &mut rng).length();
            if (r - 1.5).abs() < 1e-3 {
                continue;
            }
            // ring radius plus thin vertical band
            assert!(r >= 3.0 - 1e-3 && r <= 5.0 + 0.05 + 1e-3, "r = {}", r);
            ring += 1;
        }
        let frac = ring as f64 / n as f64;
        assert!((frac - 0.6).abs() < 0.03, "ring fraction {:.3}", frac);
    }

    #[test]
    fn flower_radius_between_one_and_three() {
        let mut rng = rng();
        for _ in 0..5000 {
            let r = sample_point(ShapeArchetype::Flower, &mut rng).length();
            assert!((1.0 - 1e-4..=3.0 + 1e-4).contains(&r));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let gen = ShapeGenerator::new(64);
        let a = gen.generate(ShapeArchetype::Saturn, &mut StdRng::seed_from_u64(3));
        let b = gen.generate(ShapeArchetype::Saturn, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn library_has_every_archetype() {
        let lib = ShapeGenerator::new(300).library(&mut rng());
        assert_eq!(lib.count(), 300);
        for a in ShapeArchetype::ALL {
            assert_eq!(lib.target(a).len(), 300);
        }
    }

    #[test]
    fn library_rejects_mismatched_lengths() {
        let mut rng = rng();
        let gen = ShapeGenerator::new(10);
        let mut targets = ShapeArchetype::ALL.map(|a| gen.generate(a, &mut rng));
        targets[2] = ShapeGenerator::new(11).generate(ShapeArchetype::Saturn, &mut rng);
        assert!(ShapeLibrary::from_targets(targets).is_none());
    }

    #[test]
    fn archetype_cycle_and_parse() {
        assert_eq!(ShapeArchetype::Sphere.next(), ShapeArchetype::Heart);
        assert_eq!(ShapeArchetype::Heart.prev(), ShapeArchetype::Sphere);
        assert_eq!("saturn".parse::<ShapeArchetype>(), Ok(ShapeArchetype::Saturn));
        assert!("cube".parse::<ShapeArchetype>().is_err());
        for a in ShapeArchetype::ALL {
            assert_eq!(ShapeArchetype::from_index(a.index()), Some(a));
        }
    }

    #[test]
    fn spherical_axes() {
        let up = from_spherical(2.0, 0.0, 0.0);
        assert!((up - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
        let front = from_spherical(1.0, PI / 2.0, 0.0);
        assert!((front - Vec3::Z).length() < 1e-6);
    }
}
