use nannou::geom::Rect;
use nannou::math::map_range;

pub mod distance;
pub use distance::*;

pub mod grid;
pub use grid::*;

pub mod path;
pub use path::*;

pub mod poisson;
pub use poisson::*;

pub mod voronoi;
pub use voronoi::*;

pub mod priority_index;
pub use priority_index::*;

pub fn saturate(n: f32) -> f32 {
    n.clamp(0.0, 1.0)
}

pub fn expand_rect(rect: Rect, margin: f32) -> Rect {
    Rect::from_xy_wh(rect.xy(), rect.wh() + 2.0 * margin)
}

pub fn lerp(val: f32, min: f32, max: f32) -> f32 {
    map_range(val, 0.0, 1.0, min, max)
}

/// Returns the min and max values of an f32 slice.
pub fn minmax(arr: &[f32]) -> Option<(f32, f32)> {
    if arr.is_empty() {
        return None;
    }

    let mut min = arr[0];
    let mut max = arr[0];

    for e in arr.iter() {
        min = e.min(min);
        max = e.max(max);
    }

    Some((min, max))
}

/// Polynomial smooth minimum of [a] and [b]. [k] is the width of the blend region; a negative
/// [k] turns the blend into a smooth maximum.
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    let h = ((b - a + k) / (2.0 * k)).clamp(0.0, 1.0);
    a * h + b * (1.0 - h) - k * h * (1.0 - h)
}

pub fn smooth_max(a: f32, b: f32, k: f32) -> f32 {
    smooth_min(a, b, -k)
}
