use nannou::geom::{Rect, Vec2};

use crate::error::TerrainError;
use crate::terrain::{CarveParams, StreamOrder};
use crate::util::{distance_transform, lerp, saturate, smooth_max, Grid, Heightmap, PathSmoother};

/// Largest distance to width ratio fed into the channel profile. Anything further out is
/// already flat, and the clamp keeps the square finite.
const MAX_WIDTH_RATIO: f32 = 64.0;

/// The sampled path of one river edge.
#[derive(Debug, Clone)]
pub struct RiverPolyline {
    pub upstream: usize,
    pub downstream: usize,
    /// The sampled points, from the upstream end to the downstream end.
    pub points: Vec<Vec2>,
    /// The river width at each sampled point.
    pub widths: Vec<f32>,
}

/// The river network drawn onto the heightmap grid.
#[derive(Debug, Clone)]
pub struct RiverRaster {
    pub polylines: Vec<RiverPolyline>,
    /// True for pixels crossed by a river centerline.
    pub centerline: Grid<bool>,
    /// The widest river width stamped onto each centerline pixel.
    pub width: Grid<f32>,
    /// Distance from each pixel to the nearest centerline pixel; infinite without rivers.
    pub distance: Grid<f32>,
    /// The scaled width of the nearest centerline pixel; zero without rivers.
    pub nearest_width: Grid<f32>,
    /// The number of centerline pixels.
    pub stamped: usize,
}

impl RiverRaster {
    /// Draw each `(upstream, downstream)` edge of the network onto a grid of [shape] covering
    /// [extent]. Node positions are indexed by cell id.
    pub fn new(
        edges: &[(usize, usize)],
        order: &StreamOrder,
        positions: &[Vec2],
        smoother: &impl PathSmoother,
        extent: Rect,
        shape: (usize, usize),
        params: &CarveParams,
    ) -> Self {
        let polylines = generate_polylines(edges, order, positions, smoother);

        let (width, height) = shape;

        let mut centerline = Grid::new_with(width, height, false);
        let mut stamp_width = Grid::new_with(width, height, 0.0f32);
        let mut stamped = 0;

        for polyline in polylines.iter() {
            for (p, w) in polyline.points.iter().zip(polyline.widths.iter()) {
                let Some((x, y)) = world_to_pixel(*p, extent, shape) else {
                    continue;
                };

                if !*centerline.get(x, y) {
                    centerline.set(x, y, true);
                    stamped += 1;
                }

                // confluences keep the widest river
                let current = stamp_width.get_mut(x, y);
                *current = current.max(*w);
            }
        }

        let (distance, nearest_width) = match distance_transform(&centerline) {
            Some(field) => {
                let nearest_width = field
                    .nearest
                    .map(|i| stamp_width.as_slice()[*i] * params.width_scale);
                (field.distance, nearest_width)
            }
            None => (
                Grid::new_with(width, height, f32::INFINITY),
                Grid::new_with(width, height, 0.0),
            ),
        };

        tracing::debug!(
            target: "rivers::raster",
            polylines = polylines.len(),
            stamped,
            width,
            height,
            "raster.stamped"
        );

        Self {
            polylines,
            centerline,
            width: stamp_width,
            distance,
            nearest_width,
            stamped,
        }
    }

    /// True if no river touches the grid.
    pub fn is_empty(&self) -> bool {
        self.stamped == 0
    }

    /// The blend weight of the original height at each pixel: zero on a river bed, rising to
    /// one away from any river.
    pub fn mask(&self, softness: f32) -> Grid<f32> {
        let mut mask = Grid::new_with(self.distance.width, self.distance.height, 1.0f32);

        let distance = self.distance.as_slice();
        let nearest_width = self.nearest_width.as_slice();

        for (i, m) in mask.as_mut_slice().iter_mut().enumerate() {
            *m = river_mask(distance[i], nearest_width[i], softness);
        }

        mask
    }

    /// Carve the rivers into [heightmap], pulling river beds toward the depth floor. Returns a
    /// new heightmap; without rivers it is an exact copy of the input.
    pub fn carve(
        &self,
        heightmap: &Heightmap,
        params: &CarveParams,
    ) -> Result<Heightmap, TerrainError> {
        if heightmap.shape() != self.distance.shape() {
            return Err(TerrainError::ShapeMismatch {
                expected: self.distance.shape(),
                found: heightmap.as_slice().len(),
            });
        }

        if self.is_empty() {
            return Ok(heightmap.clone());
        }

        let mask = self.mask(params.softness);
        let floor = params.depth_floor;

        let carved = heightmap
            .as_slice()
            .iter()
            .zip(mask.iter())
            .map(|(h, m)| h * m + floor * (1.0 - m))
            .collect();

        Heightmap::from_vec(heightmap.width, heightmap.height, carved)
    }
}

/// The channel profile at [distance] from a river of [width]: 0 on the centerline, easing to 1
/// at about one width out. [softness] widens the easing.
pub fn river_mask(distance: f32, width: f32, softness: f32) -> f32 {
    if !(width > 0.0) || !distance.is_finite() {
        return 1.0;
    }

    let ratio = (distance.max(0.0) / width).min(MAX_WIDTH_RATIO);

    saturate(1.0 - smooth_max(0.0, 1.0 - ratio * ratio, softness))
}

/// Smooth each edge and tag its samples with a width interpolated between the squared stream
/// orders of its two ends.
fn generate_polylines(
    edges: &[(usize, usize)],
    order: &StreamOrder,
    positions: &[Vec2],
    smoother: &impl PathSmoother,
) -> Vec<RiverPolyline> {
    let paths = smoother.smooth_edges(edges, positions);

    let order_width = |cell: usize| {
        let o = order.get(cell).unwrap_or(1) as f32;
        o * o
    };

    edges
        .iter()
        .zip(paths)
        .map(|((up, down), points)| {
            let w_up = order_width(*up);
            let w_down = order_width(*down);

            let last = points.len().saturating_sub(1).max(1) as f32;
            let widths = (0..points.len())
                .map(|i| lerp(i as f32 / last, w_up, w_down))
                .collect();

            RiverPolyline {
                upstream: *up,
                downstream: *down,
                points,
                widths,
            }
        })
        .collect()
}

/// The pixel containing world point [p], if it lies on the grid.
fn world_to_pixel(p: Vec2, extent: Rect, shape: (usize, usize)) -> Option<(usize, usize)> {
    let (width, height) = shape;

    let x = ((p.x - extent.x.start) / extent.w() * width as f32 - 0.5).round();
    let y = ((p.y - extent.y.start) / extent.h() * height as f32 - 0.5).round();

    if !(x >= 0.0 && y >= 0.0 && x < width as f32 && y < height as f32) {
        return None;
    }

    Some((x as usize, y as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::drainage::{generate_stream_order, DrainageForest, FlowAssignment};
    use crate::util::CatmullRom;

    fn extent(width: f32, height: f32) -> Rect {
        Rect::from_xy_wh(Vec2::new(width * 0.5, height * 0.5), Vec2::new(width, height))
    }

    fn single_edge_order() -> StreamOrder {
        let mut flow = FlowAssignment::new(2);
        flow.claim(1, 0);
        generate_stream_order(&DrainageForest::new(&flow))
    }

    #[test]
    fn mask_stays_within_unit_range() {
        for k in [0.01, 0.25, 1.0, 4.0] {
            for w in [0.5, 1.0, 3.0, 12.0] {
                for i in 0..200 {
                    let m = river_mask(i as f32 * 0.1, w, k);
                    assert!((0.0..=1.0).contains(&m), "d={} w={w} k={k}", i as f32 * 0.1);
                }
            }
        }

        assert_eq!(river_mask(f32::INFINITY, 3.0, 0.25), 1.0);
        assert_eq!(river_mask(1.0, 0.0, 0.25), 1.0);
        assert_eq!(river_mask(0.0, 3.0, 0.25), 0.0);
    }

    #[test]
    fn pixel_mapping_rounds_to_nearest_center() {
        let extent = extent(10.0, 5.0);

        assert_eq!(world_to_pixel(Vec2::new(0.5, 0.5), extent, (10, 5)), Some((0, 0)));
        assert_eq!(world_to_pixel(Vec2::new(9.4, 4.9), extent, (10, 5)), Some((9, 4)));
        assert_eq!(world_to_pixel(Vec2::new(10.2, 1.0), extent, (10, 5)), None);
        assert_eq!(world_to_pixel(Vec2::new(-0.2, 1.0), extent, (10, 5)), None);
    }

    #[test]
    fn straight_river_is_stamped_with_interpolated_width() {
        // a two cell network: 1 drains into 0 along the row y = 2.5
        let positions = vec![Vec2::new(1.5, 2.5), Vec2::new(8.5, 2.5)];
        let order = single_edge_order();

        let raster = RiverRaster::new(
            &[(1, 0)],
            &order,
            &positions,
            &CatmullRom::new(8),
            extent(10.0, 5.0),
            (10, 5),
            &CarveParams::default(),
        );

        assert!(!raster.is_empty());
        assert_eq!(raster.polylines[0].points.len(), 8);

        for x in 1..=8 {
            assert!(*raster.centerline.get(x, 2), "x={x}");
            assert_eq!(*raster.distance.get(x, 2), 0.0);
        }

        assert!(!*raster.centerline.get(0, 2));
        assert!(!*raster.centerline.get(4, 0));
        assert_eq!(*raster.distance.get(4, 0), 2.0);

        // both ends have order 1, so every stamped width is 1 and the scaled width is 3
        assert_eq!(*raster.width.get(5, 2), 1.0);
        assert_eq!(*raster.nearest_width.get(4, 0), 3.0);
    }

    #[test]
    fn carving_pulls_centerline_to_the_floor_and_leaves_far_pixels() {
        let positions = vec![Vec2::new(0.5, 0.5), Vec2::new(0.5, 19.5)];
        let order = single_edge_order();

        let params = CarveParams {
            depth_floor: -1.0,
            ..CarveParams::default()
        };

        let raster = RiverRaster::new(
            &[(1, 0)],
            &order,
            &positions,
            &CatmullRom::new(40),
            extent(20.0, 20.0),
            (20, 20),
            &params,
        );

        let heightmap = Heightmap::new_with(20, 20, 0.5);
        let carved = raster.carve(&heightmap, &params).unwrap();

        // the input is untouched
        assert!(heightmap.iter().all(|h| *h == 0.5));

        assert_eq!(*carved.get(0, 10), -1.0);
        assert!(*carved.get(2, 10) < 0.5);

        // channel width is 3; beyond sqrt(1 + k) widths the blend is exact
        for x in 4..20 {
            assert_eq!(*carved.get(x, 10), 0.5, "x={x}");
        }
    }

    #[test]
    fn empty_network_returns_the_input() {
        let raster = RiverRaster::new(
            &[],
            &StreamOrder::default(),
            &[],
            &CatmullRom::new(4),
            extent(6.0, 4.0),
            (6, 4),
            &CarveParams::default(),
        );

        let heightmap = Heightmap::from_fn(6, 4, |x, y| x as f32 * 0.1 - y as f32);
        let carved = raster.carve(&heightmap, &CarveParams::default()).unwrap();

        assert!(raster.is_empty());
        assert_eq!(carved, heightmap);
    }

    #[test]
    fn carving_a_mismatched_heightmap_fails() {
        let raster = RiverRaster::new(
            &[],
            &StreamOrder::default(),
            &[],
            &CatmullRom::new(4),
            extent(6.0, 4.0),
            (6, 4),
            &CarveParams::default(),
        );

        let heightmap = Heightmap::new_with(4, 6, 0.0);

        assert!(matches!(
            raster.carve(&heightmap, &CarveParams::default()),
            Err(TerrainError::ShapeMismatch { .. })
        ));
    }
}
