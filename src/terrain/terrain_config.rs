use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// Everything needed to generate one terrain patch. Two runs with equal configs produce equal
/// terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Width of the patch, in world units and heightmap pixels.
    pub width: u32,
    /// Height of the patch, in world units and heightmap pixels.
    pub height: u32,
    pub seed: u64,
    /// Minimum separation of the cell center samples.
    pub radius: f32,
    /// Cells whose centroid height falls below this value are ocean.
    pub ocean_threshold: f32,
    pub noise: NoiseConfig,
    pub flow: FlowParams,
    pub carve: CarveParams,
}

/// Parameters of the fractal noise height field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Offset added to world coordinates before sampling.
    pub offset: [f32; 2],
    /// Noise frequency per world unit.
    pub frequency: f32,
    pub octaves: usize,
}

/// Parameters of the drainage routing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    /// Trades distance-driven routing (1.0) against breadth-driven routing (0.0).
    pub alpha: f32,
    /// Scale of the hop count term of the routing weight.
    pub depth_normalization: f32,
}

/// Parameters of the river carving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveParams {
    /// Points sampled along each river edge.
    pub resolution: usize,
    /// Multiplier from stream order width to channel width in pixels.
    pub width_scale: f32,
    /// Softness of the channel falloff.
    pub softness: f32,
    /// The height river beds are pulled toward.
    pub depth_floor: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            seed: 0,
            radius: 8.0,
            ocean_threshold: 0.0,
            noise: NoiseConfig::default(),
            flow: FlowParams::default(),
            carve: CarveParams::default(),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            frequency: 0.01,
            octaves: 4,
        }
    }
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            alpha: 0.99,
            depth_normalization: 100.0,
        }
    }
}

impl Default for CarveParams {
    fn default() -> Self {
        Self {
            resolution: 16,
            width_scale: 3.0,
            softness: 0.25,
            depth_floor: -0.1,
        }
    }
}

impl TerrainConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TerrainError> {
        let config: TerrainConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, TerrainError> {
        let contents = fs::read_to_string(path).map_err(|source| TerrainError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        TerrainConfig::from_json_str(&contents)
    }

    /// Reject configs the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let invalid = |msg: &str| Err(TerrainError::InvalidConfig(msg.to_string()));

        if self.width == 0 || self.height == 0 {
            return invalid("width and height must be positive");
        }

        if !(self.radius.is_finite() && self.radius > 0.0) {
            return invalid("radius must be positive");
        }

        if !self.ocean_threshold.is_finite() {
            return invalid("ocean_threshold must be finite");
        }

        let noise = &self.noise;

        if !(noise.offset.iter().all(|o| o.is_finite()) && noise.frequency.is_finite()) {
            return invalid("noise offset and frequency must be finite");
        }

        if noise.octaves == 0 {
            return invalid("noise octaves must be at least 1");
        }

        if !(0.0..=1.0).contains(&self.flow.alpha) {
            return invalid("flow alpha must be within [0, 1]");
        }

        if !(self.flow.depth_normalization.is_finite() && self.flow.depth_normalization > 0.0) {
            return invalid("flow depth_normalization must be positive");
        }

        let carve = &self.carve;

        if carve.resolution < 2 {
            return invalid("carve resolution must be at least 2");
        }

        if !(carve.width_scale.is_finite() && carve.width_scale > 0.0) {
            return invalid("carve width_scale must be positive");
        }

        if !(carve.softness.is_finite() && carve.softness > 0.0) {
            return invalid("carve softness must be positive");
        }

        if !carve.depth_floor.is_finite() {
            return invalid("carve depth_floor must be finite");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = TerrainConfig::from_json_str(
            r#"{ "width": 64, "seed": 9, "flow": { "alpha": 0.5 } }"#,
        )
        .unwrap();

        assert_eq!(config.width, 64);
        assert_eq!(config.height, TerrainConfig::default().height);
        assert_eq!(config.seed, 9);
        assert_eq!(config.flow.alpha, 0.5);
        assert_eq!(config.flow.depth_normalization, 100.0);
        assert_eq!(config.carve, CarveParams::default());
    }

    #[test]
    fn out_of_range_alpha_is_rejected() {
        let err = TerrainConfig::from_json_str(r#"{ "flow": { "alpha": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = TerrainConfig::from_json_str("{ width: ").unwrap_err();
        assert!(matches!(err, TerrainError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = TerrainConfig::from_file(Path::new("/nonexistent/terrain.json")).unwrap_err();
        assert!(matches!(err, TerrainError::Read { .. }));
    }

    #[test]
    fn low_resolution_is_rejected() {
        let mut config = TerrainConfig::default();
        config.carve.resolution = 1;
        assert!(config.validate().is_err());
    }
}
