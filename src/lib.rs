//! River network synthesis over a procedurally generated terrain patch.
//!
//! The patch is partitioned into Voronoi cells, classified into ocean and land, and drained
//! from the shoreline inward. The resulting drainage forest is ranked by Strahler order and
//! carved into a heightmap through a distance field around the smoothed river paths.

pub mod error;
pub mod terrain;
pub mod util;

pub use error::TerrainError;
pub use terrain::{carve_terrain, generate_terrain, Terrain, TerrainConfig};
