use crate::util::Grid;

/// Stand-in for infinity in the lower envelope. Finite so that parabola intersections never
/// evaluate `inf - inf`.
const FAR: f64 = 1e20;

/// The Euclidean distance transform of a feature mask.
#[derive(Debug, Clone)]
pub struct DistanceField {
    /// Distance from each pixel to the nearest feature pixel.
    pub distance: Grid<f32>,
    /// Flat index of the nearest feature pixel of each pixel.
    pub nearest: Grid<usize>,
}

/// Exact Euclidean distance transform of [features], computed with the separable lower
/// envelope method of Felzenszwalb and Huttenlocher [0]. Returns None when the mask has no
/// feature pixels, since no pixel has a nearest feature.
///
/// [0] https://cs.brown.edu/people/pfelzens/papers/dt-final.pdf
pub fn distance_transform(features: &Grid<bool>) -> Option<DistanceField> {
    if !features.iter().any(|f| *f) {
        return None;
    }

    let (width, height) = features.shape();

    // Pass one runs down each column and records the squared distance to the nearest feature
    // in that column, along with its row.

    let mut column_dist = vec![FAR; width * height];
    let mut column_row = vec![0usize; width * height];

    let mut f = vec![0.0; height];

    for x in 0..width {
        for (y, v) in f.iter_mut().enumerate() {
            *v = if *features.get(x, y) { 0.0 } else { FAR };
        }

        let (d, arg) = lower_envelope(&f);

        for y in 0..height {
            column_dist[y * width + x] = d[y];
            column_row[y * width + x] = arg[y];
        }
    }

    // Pass two runs along each row over the column distances; the argmin column combined with
    // that column's argmin row is the nearest feature pixel.

    let mut distance = Grid::new_with(width, height, 0.0f32);
    let mut nearest = Grid::new_with(width, height, 0usize);

    for y in 0..height {
        let row = &column_dist[y * width..(y + 1) * width];
        let (d, arg) = lower_envelope(row);

        for x in 0..width {
            let nx = arg[x];
            let ny = column_row[y * width + nx];

            distance.set(x, y, d[x].sqrt() as f32);
            nearest.set(x, y, ny * width + nx);
        }
    }

    Some(DistanceField { distance, nearest })
}

/// One dimensional squared distance transform of the sampled function [f]. Returns the
/// transformed values and, for each position, the position whose parabola is lowest there.
fn lower_envelope(f: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let n = f.len();

    let mut d = vec![0.0; n];
    let mut arg = vec![0; n];

    if n == 0 {
        return (d, arg);
    }

    // v holds the positions of the parabolas in the envelope, z the boundaries between them.
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0;

    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let intersect = |q: usize, p: usize| -> f64 {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    for q in 1..n {
        let mut s = intersect(q, v[k]);

        while s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }

        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;

    for q in 0..n {
        while z[k + 1] < q as f64 {
            k += 1;
        }

        let p = v[k];
        let dq = q as f64 - p as f64;

        d[q] = dq * dq + f[p];
        arg[q] = p;
    }

    (d, arg)
}
