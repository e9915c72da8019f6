use nannou::geom::*;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::terrain::NoiseConfig;
use crate::util::Heightmap;

/// A scalar height field, sampled in batches.
pub trait HeightSampler {
    /// Sample the height at each point. Returns exactly one value per point, in order; callers
    /// check the count in debug builds.
    fn sample(&self, points: &[Vec2]) -> Vec<f32>;
}

impl<F> HeightSampler for F
where
    F: Fn(&[Vec2]) -> Vec<f32>,
{
    fn sample(&self, points: &[Vec2]) -> Vec<f32> {
        self(points)
    }
}

/// Fractal Perlin noise in roughly \[-1, 1\].
#[derive(Clone)]
pub struct NoiseSampler {
    fbm: Fbm<Perlin>,
    offset: Vec2,
    frequency: f32,
}

impl NoiseSampler {
    pub fn new(config: &NoiseConfig, seed: u64) -> Self {
        // Fold the high bits in so seeds that differ only there still differ.
        let seed = (seed ^ (seed >> 32)) as u32;

        Self {
            fbm: Fbm::new(seed).set_octaves(config.octaves),
            offset: Vec2::new(config.offset[0], config.offset[1]),
            frequency: config.frequency,
        }
    }

    fn get(&self, p: Vec2) -> f32 {
        let q = (p + self.offset) * self.frequency;
        (self.fbm.get([q.x as f64, q.y as f64]) as f32).clamp(-1.0, 1.0)
    }
}

impl HeightSampler for NoiseSampler {
    fn sample(&self, points: &[Vec2]) -> Vec<f32> {
        points.iter().map(|p| self.get(*p)).collect()
    }
}

/// Sample [sampler] at the center of every pixel of a `width` x `height` heightmap covering
/// [extent].
pub fn sample_heightmap(
    sampler: &impl HeightSampler,
    extent: Rect,
    width: usize,
    height: usize,
) -> Heightmap {
    let mut points = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            points.push(pixel_center(extent, width, height, x, y));
        }
    }

    let values = sampler.sample(&points);

    debug_assert_eq!(values.len(), points.len(), "one height per pixel");

    Heightmap::from_fn(width, height, |x, y| values[y * width + x])
}

/// World position of the center of pixel `(x, y)`.
pub fn pixel_center(extent: Rect, width: usize, height: usize, x: usize, y: usize) -> Vec2 {
    let u = (x as f32 + 0.5) / width as f32;
    let v = (y as f32 + 0.5) / height as f32;
    Vec2::new(extent.x.lerp(u), extent.y.lerp(v))
}
