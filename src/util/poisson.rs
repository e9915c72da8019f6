use nannou::geom::*;
use nannou::math::map_range;

use nannou::rand::Rng;

use std::f32::consts::{PI, SQRT_2};

const PI2: f32 = PI * 2.0;

/// Candidates tried around an active sample before it is retired.
const ATTEMPTS: u32 = 30;

/// Generate random samples within [extent] in a Poisson disk distribution, with minimum [radius]
/// separation. The output depends only on the state of [rand].
pub fn poisson<R: Rng>(rand: &mut R, extent: Rect, radius: f32) -> Vec<Vec2> {
    let cell_size = radius / SQRT_2;

    let cols = (extent.w() / cell_size).ceil().max(1.0) as usize;
    let rows = (extent.h() / cell_size).ceil().max(1.0) as usize;

    let mut sampler = PoissonDiskSampler {
        cell_size,
        extent,
        radius,
        active: vec![],
        points: vec![],
        grid: SampleGrid::new(cols, rows),
    };

    sampler.generate_samples(rand);
    sampler.points
}

struct PoissonDiskSampler {
    /// The range of values to generate samples in.
    extent: Rect,
    /// The min allowed radius between samples.
    radius: f32,
    /// The size of each grid cell; small enough that a cell holds at most one sample.
    cell_size: f32,
    /// Indices of the samples that may still spawn neighbors.
    active: Vec<usize>,
    /// The sampled points.
    points: Vec<Vec2>,
    grid: SampleGrid,
}

struct SampleGrid {
    rows: usize,
    cols: usize,
    grid: Vec<Option<usize>>,
}

impl SampleGrid {
    fn new(cols: usize, rows: usize) -> Self {
        SampleGrid {
            cols,
            rows,
            grid: vec![None; rows * cols],
        }
    }

    fn get(&self, cell: (usize, usize)) -> Option<usize> {
        self.grid[cell.0 + cell.1 * self.cols]
    }

    fn set(&mut self, cell: (usize, usize), value: usize) {
        self.grid[cell.0 + cell.1 * self.cols] = Some(value);
    }
}

impl PoissonDiskSampler {
    fn generate_samples<R: Rng>(&mut self, rand: &mut R) {
        let init = vec2(
            self.extent.x.lerp(rand.gen()),
            self.extent.y.lerp(rand.gen()),
        );

        self.add_sample(init);

        while !self.active.is_empty() {
            let slot = rand.gen_range(0..self.active.len());
            let near = self.points[self.active[slot]];

            match self.generate_sample(rand, near) {
                Some(sample) => self.add_sample(sample),
                None => {
                    self.active.swap_remove(slot);
                }
            }
        }
    }

    fn add_sample(&mut self, sample: Vec2) {
        let index = self.points.len();

        self.points.push(sample);
        self.active.push(index);
        self.grid.set(self.cell(sample), index);
    }

    /// Look for an unoccupied spot at distance [radius] around [near].
    fn generate_sample<R: Rng>(&self, rand: &mut R, near: Vec2) -> Option<Vec2> {
        // Starting from a random angle, circle around the input point looking for an adequate
        // nearby point.
        // https://observablehq.com/@techsparx/an-improvement-on-bridsons-algorithm-for-poisson-disc-samp/2

        let seed: f32 = rand.gen_range(0.0..PI2);
        let r = self.radius + 0.0001;

        for i in 0..ATTEMPTS {
            let t = seed + map_range(i, 0, ATTEMPTS, 0.0, PI2);
            let point = near + vec2(t.cos(), t.sin()) * r;

            if !self.extent.contains(point) {
                continue;
            }

            if !self.near_point_in_grid(point) {
                return Some(point);
            }
        }

        None
    }

    /// Returns true if point [p] is within [radius] of an existing sample.
    fn near_point_in_grid(&self, p: Vec2) -> bool {
        let (cx, cy) = self.cell(p);

        let span = 2; // number of neighbor cells to check

        let x_min = (cx as i32 - span).max(0) as usize;
        let y_min = (cy as i32 - span).max(0) as usize;
        let x_max = (cx as i32 + span + 1).min(self.grid.cols as i32) as usize;
        let y_max = (cy as i32 + span + 1).min(self.grid.rows as i32) as usize;

        let radius_sq = self.radius * self.radius;

        (y_min..y_max).any(|y| {
            (x_min..x_max).any(|x| match self.grid.get((x, y)) {
                Some(i) => self.points[i].distance_squared(p) < radius_sq,
                None => false,
            })
        })
    }

    fn cell(&self, p: Vec2) -> (usize, usize) {
        let cx = ((p.x - self.extent.x.start) / self.cell_size) as usize;
        let cy = ((p.y - self.extent.y.start) / self.cell_size) as usize;
        (cx.min(self.grid.cols - 1), cy.min(self.grid.rows - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nannou::rand::rngs::SmallRng;
    use nannou::rand::SeedableRng;

    #[test]
    fn samples_are_separated_and_inside_extent() {
        let extent = Rect::from_wh(vec2(120.0, 80.0));
        let radius = 10.0;

        let mut rand = SmallRng::seed_from_u64(7);
        let points = poisson(&mut rand, extent, radius);

        assert!(points.len() > 20);

        for (i, a) in points.iter().enumerate() {
            assert!(extent.contains(*a));
            for b in points.iter().skip(i + 1) {
                assert!(a.distance(*b) >= radius);
            }
        }
    }

    #[test]
    fn same_seed_gives_same_samples() {
        let extent = Rect::from_wh(vec2(60.0, 60.0));

        let a = poisson(&mut SmallRng::seed_from_u64(3), extent, 6.0);
        let b = poisson(&mut SmallRng::seed_from_u64(3), extent, 6.0);

        assert_eq!(a, b);
    }
}
