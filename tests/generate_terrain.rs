use nannou::geom::Vec2;

use rivers::terrain::{patch_extent, sample_heightmap, traverse_flow_graph};
use rivers::util::CatmullRom;
use rivers::{carve_terrain, generate_terrain, Terrain, TerrainConfig};

fn config() -> TerrainConfig {
    TerrainConfig {
        width: 96,
        height: 96,
        seed: 7,
        radius: 5.0,
        ..TerrainConfig::default()
    }
}

/// A round island in the middle of the patch, sinking below sea level toward the corners.
fn island(config: &TerrainConfig) -> impl Fn(&[Vec2]) -> Vec<f32> {
    let center = Vec2::new(config.width as f32, config.height as f32) * 0.5;
    let radius = config.width.min(config.height) as f32 * 0.4;

    move |points: &[Vec2]| -> Vec<f32> {
        points
            .iter()
            .map(|p| 1.0 - p.distance(center) / radius)
            .collect()
    }
}

fn carve_island(config: &TerrainConfig) -> Terrain {
    let sampler = island(config);
    let heightmap = sample_heightmap(
        &sampler,
        patch_extent(config),
        config.width as usize,
        config.height as usize,
    );

    carve_terrain(
        config,
        heightmap,
        &sampler,
        &CatmullRom::new(config.carve.resolution),
    )
    .unwrap()
}

#[test]
fn island_drains_into_the_surrounding_ocean() {
    let terrain = carve_island(&config());

    assert!(!terrain.cells.boundary.is_empty());
    assert!(!terrain.flow.is_empty());
    assert!(!terrain.raster.is_empty());
    assert!(terrain.order.max() >= Some(1));

    assert_eq!(terrain.carved.shape(), (96, 96));
    assert_ne!(terrain.carved, terrain.heightmap);
}

#[test]
fn every_route_ends_at_a_boundary_cell() {
    let terrain = carve_island(&config());
    let num_cells = terrain.cells.len();

    for (up, _) in terrain.flow.edges() {
        assert!(!terrain.cells.is_ocean(up), "ocean cell {up} was routed");

        let course: Vec<usize> = traverse_flow_graph(&terrain.flow, up)
            .take(num_cells + 1)
            .collect();

        assert!(course.len() <= num_cells, "cycle through cell {up}");

        let mouth = course[course.len() - 1];
        assert!(terrain.cells.boundary.contains(&mouth), "cell {up} ends at {mouth}");
    }

    for b in terrain.cells.boundary.iter() {
        assert_eq!(terrain.flow.parent(*b), None);
    }
}

#[test]
fn river_course_runs_from_its_source_to_the_sea() {
    let terrain = carve_island(&config());

    let source = terrain
        .forest
        .nodes()
        .find(|c| terrain.forest.children(*c).is_empty())
        .unwrap();

    let course = terrain.river_from(source);
    let centroid = |c: usize| terrain.cells.cells[c].centroid;

    assert!(course.len() >= 2);
    assert_eq!(course[0], centroid(source));

    let mouth = course[course.len() - 1];
    assert!(terrain.cells.boundary.iter().any(|b| centroid(*b) == mouth));

    assert!(terrain.river_from(terrain.cells.len()).is_empty());
}

#[test]
fn no_route_runs_along_the_coast() {
    let terrain = carve_island(&config());

    for (up, down) in terrain.flow.edges() {
        assert!(terrain.graph.contains(up, down));
        assert!(!(terrain.cells.is_coastal(up) && terrain.cells.is_coastal(down)));
    }
}

#[test]
fn stream_order_never_decreases_downstream() {
    let terrain = carve_island(&config());

    for cell in terrain.forest.nodes() {
        let order = terrain.order.get(cell).unwrap();
        let children = terrain.forest.children(cell);

        if children.is_empty() {
            assert_eq!(order, 1);
            continue;
        }

        let child_orders: Vec<u32> = children
            .iter()
            .map(|c| terrain.order.get(*c).unwrap())
            .collect();
        let max = *child_orders.iter().max().unwrap();
        let count = child_orders.iter().filter(|o| **o == max).count();

        let expected = if count > 1 { max + 1 } else { max };
        assert_eq!(order, expected, "cell {cell}");
    }
}

#[test]
fn pixels_far_from_rivers_keep_their_height() {
    let config = config();
    let terrain = carve_island(&config);

    let softness = config.carve.softness;
    let mask = terrain.raster.mask(softness);

    assert!(mask.iter().all(|m| (0.0..=1.0).contains(m)));

    let reach = (1.0 + softness).sqrt() * 1.01;
    let distance = terrain.raster.distance.as_slice();
    let width = terrain.raster.nearest_width.as_slice();

    let mut far = 0;

    for (i, (h, c)) in terrain
        .heightmap
        .iter()
        .zip(terrain.carved.iter())
        .enumerate()
    {
        if distance[i] >= width[i] * reach {
            assert_eq!(h, c, "pixel {i}");
            far += 1;
        }
    }

    assert!(far > 0);
}

#[test]
fn land_without_ocean_is_left_untouched() {
    let config = config();
    let sampler = |points: &[Vec2]| vec![1.0f32; points.len()];
    let heightmap = sample_heightmap(&island(&config), patch_extent(&config), 96, 96);

    let terrain = carve_terrain(&config, heightmap, &sampler, &CatmullRom::new(8)).unwrap();

    assert!(terrain.cells.boundary.is_empty());
    assert!(terrain.flow.is_empty());
    assert!(terrain.raster.is_empty());
    assert_eq!(terrain.carved, terrain.heightmap);
}

#[test]
fn generation_is_deterministic() {
    let config = TerrainConfig {
        width: 64,
        height: 48,
        seed: 3,
        radius: 6.0,
        ..TerrainConfig::default()
    };

    let a = generate_terrain(&config).unwrap();
    let b = generate_terrain(&config).unwrap();

    assert_eq!(a.carved.shape(), (64, 48));
    assert_eq!(a.flow, b.flow);
    assert_eq!(a.order, b.order);
    assert_eq!(a.carved, b.carved);

    let c = carve_island(&config);
    let d = carve_island(&config);

    assert_eq!(c.flow, d.flow);
    assert_eq!(c.carved, d.carved);
}
