use nannou::geom::*;
use nannou::math::map_range;
use nannou::rand::rngs::SmallRng;
use nannou::rand::SeedableRng;

pub mod drainage;
pub mod terrain_cells;
pub mod terrain_config;
pub mod terrain_graph;
pub mod terrain_noise;
pub mod terrain_raster;

pub use drainage::*;
pub use terrain_cells::{Cell, TerrainCells};
pub use terrain_config::{CarveParams, FlowParams, NoiseConfig, TerrainConfig};
pub use terrain_graph::TerrainGraph;
pub use terrain_noise::{pixel_center, sample_heightmap, HeightSampler, NoiseSampler};
pub use terrain_raster::{river_mask, RiverPolyline, RiverRaster};

use crate::error::TerrainError;
use crate::util::{expand_rect, minmax, poisson, CatmullRom, Heightmap, PathSmoother, Voronoi};

/// A generated terrain patch with its drainage network carved in.
#[derive(Debug, Clone)]
pub struct Terrain {
    pub config: TerrainConfig,
    /// Extent of the patch in world coordinates.
    pub extent: Rect,
    /// The classified cells of the patch.
    pub cells: TerrainCells,
    /// The adjacency between the cells.
    pub graph: TerrainGraph,
    /// The downstream cell of each land cell.
    pub flow: FlowAssignment,
    /// The drainage network viewed upstream.
    pub forest: DrainageForest,
    pub order: StreamOrder,
    /// The rivers drawn onto the heightmap grid.
    pub raster: RiverRaster,
    /// The heightmap before carving.
    pub heightmap: Heightmap,
    /// The heightmap with the rivers carved in.
    pub carved: Heightmap,
}

impl Terrain {
    /// The centroids along the course of the river starting at [cell], down to its mouth.
    /// Empty if [cell] is not a cell of the terrain.
    pub fn river_from(&self, cell: usize) -> Vec<Vec2> {
        if cell >= self.cells.len() {
            return vec![];
        }

        traverse_flow_graph(&self.flow, cell)
            .map(|c| self.cells.cells[c].centroid)
            .collect()
    }
}

/// Generate a terrain patch from [config], using fractal noise for the height field and
/// Catmull-Rom splines for the river paths.
pub fn generate_terrain(config: &TerrainConfig) -> Result<Terrain, TerrainError> {
    config.validate()?;

    let extent = patch_extent(config);
    let sampler = NoiseSampler::new(&config.noise, config.seed);
    let heightmap = sample_heightmap(
        &sampler,
        extent,
        config.width as usize,
        config.height as usize,
    );

    let smoother = CatmullRom::new(config.carve.resolution);

    carve_terrain(config, heightmap, &sampler, &smoother)
}

/// Generate the drainage network of the patch described by [config] and carve it into
/// [heightmap], which must cover the patch at `config.width` x `config.height` pixels.
pub fn carve_terrain(
    config: &TerrainConfig,
    heightmap: Heightmap,
    sampler: &impl HeightSampler,
    smoother: &impl PathSmoother,
) -> Result<Terrain, TerrainError> {
    config.validate()?;

    let shape = (config.width as usize, config.height as usize);

    if heightmap.shape() != shape {
        return Err(TerrainError::ShapeMismatch {
            expected: shape,
            found: heightmap.as_slice().len(),
        });
    }

    let mut rand = SmallRng::seed_from_u64(config.seed);

    let extent = patch_extent(config);
    let points = generate_points(&mut rand, extent, config.radius);

    let partition = Voronoi::new(&points).partition();

    let mut cells = TerrainCells::new(&partition, extent, sampler, config.ocean_threshold);
    let graph = TerrainGraph::new(&partition.ridges, &cells.cell_of_sample, cells.len());
    cells.classify_shores(&graph);

    let cost = RadialCost::for_extent(extent);
    let flow = generate_flow(&cells, &graph, &cost, &config.flow);

    let forest = DrainageForest::new(&flow);
    let order = generate_stream_order(&forest);

    let raster = RiverRaster::new(
        &forest.edges(),
        &order,
        &cells.centroids(),
        smoother,
        extent,
        shape,
        &config.carve,
    );

    let carved = raster.carve(&heightmap, &config.carve)?;

    let (min, max) = minmax(carved.as_slice()).unwrap_or((0.0, 0.0));

    tracing::info!(
        target: "rivers::terrain",
        seed = config.seed,
        points = points.len(),
        cells = cells.len(),
        boundary = cells.boundary.len(),
        routed = flow.len(),
        max_order = order.max().unwrap_or(0),
        river_pixels = raster.stamped,
        min_height = min,
        max_height = max,
        "terrain.generated"
    );

    Ok(Terrain {
        config: *config,
        extent,
        cells,
        graph,
        flow,
        forest,
        order,
        raster,
        heightmap,
        carved,
    })
}

/// The patch covers `[0, width] x [0, height]` so world units line up with heightmap pixels.
pub fn patch_extent(config: &TerrainConfig) -> Rect {
    let size = Vec2::new(config.width as f32, config.height as f32);
    Rect::from_xy_wh(size * 0.5, size)
}

/// Fill the extent with randomly sampled points, roughly separated by [radius] distance.
fn generate_points(rand: &mut SmallRng, extent: Rect, radius: f32) -> Vec<Vec2> {
    let mut points = poisson(rand, extent, radius);

    // Surround the samples with two rings of boundary points so the cells along the edge of
    // the extent close up inside it, using the technique in [0]. The ring cells themselves
    // reach outside the extent and are dropped during classification.
    //
    // [0] https://www.redblobgames.com/x/2314-poisson-with-boundary/

    points.append(&mut generate_boundary_points(extent, radius));

    points
}

fn generate_boundary_points(extent: Rect, distance: f32) -> Vec<Vec2> {
    let inner_extent = expand_rect(extent, distance);

    let mut points = vec![];

    for c in inner_extent.corners().iter() {
        points.push(Vec2::from_slice(c));
    }

    let min_x = inner_extent.x.start;
    let max_x = inner_extent.x.end;

    let min_y = inner_extent.y.start;
    let max_y = inner_extent.y.end;

    let nx = ((inner_extent.w() / distance) as i32).max(2);
    let ny = ((inner_extent.h() / distance) as i32).max(2);

    // Inner ring, evenly spaced along each side between the corners.

    for i in 1..nx {
        let x = map_range(i, 0, nx, min_x, max_x);
        points.push(Vec2::new(x, min_y));
        points.push(Vec2::new(x, max_y));
    }

    for i in 1..ny {
        let y = map_range(i, 0, ny, min_y, max_y);
        points.push(Vec2::new(min_x, y));
        points.push(Vec2::new(max_x, y));
    }

    // Outer ring, one step further out and offset by half a step so the triangles between the
    // rings alternate evenly.

    for i in 0..=nx {
        let x = map_range(i, 0, nx, min_x - distance * 0.5, max_x + distance * 0.5);
        points.push(Vec2::new(x, min_y - distance));
        points.push(Vec2::new(x, max_y + distance));
    }

    for i in 1..ny {
        let y = map_range(i, 0, ny, min_y - distance * 0.5, max_y + distance * 0.5);
        points.push(Vec2::new(min_x - distance, y));
        points.push(Vec2::new(max_x + distance, y));
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_extent_starts_at_the_origin() {
        let config = TerrainConfig {
            width: 40,
            height: 30,
            ..TerrainConfig::default()
        };

        let extent = patch_extent(&config);

        assert_eq!(extent.x.start, 0.0);
        assert_eq!(extent.y.start, 0.0);
        assert_eq!(extent.x.end, 40.0);
        assert_eq!(extent.y.end, 30.0);
    }

    #[test]
    fn boundary_points_lie_outside_the_extent() {
        let extent = Rect::from_xy_wh(Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0));
        let points = generate_boundary_points(extent, 10.0);

        assert!(!points.is_empty());
        assert!(points.iter().all(|p| !extent.contains(*p)));
    }

    #[test]
    fn mismatched_heightmap_is_rejected() {
        let config = TerrainConfig {
            width: 32,
            height: 32,
            ..TerrainConfig::default()
        };

        let heightmap = Heightmap::new_with(16, 16, 0.0);
        let sampler = |points: &[Vec2]| vec![0.0f32; points.len()];

        let result = carve_terrain(&config, heightmap, &sampler, &CatmullRom::new(4));

        assert!(matches!(result, Err(TerrainError::ShapeMismatch { .. })));
    }
}
