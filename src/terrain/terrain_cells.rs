use nannou::geom::*;

use crate::terrain::terrain_noise::HeightSampler;
use crate::terrain::TerrainGraph;
use crate::util::{polygon_centroid, Partition};

#[derive(Debug, Clone)]
pub struct Cell {
    /// The cell id, which is also its index in [TerrainCells::cells].
    pub id: usize,
    /// The index of the sample point the cell was built around.
    pub sample: usize,
    /// The points composing the cell polygon.
    pub polygon: Vec<Vec2>,
    pub centroid: Vec2,
    pub is_ocean: bool,
    /// True for land cells with at least one ocean neighbor.
    pub is_coastal: bool,
}

/// The classified cells of the terrain.
#[derive(Debug, Clone, Default)]
pub struct TerrainCells {
    pub cells: Vec<Cell>,
    /// The cell id of each sample point, if its cell was retained.
    pub cell_of_sample: Vec<Option<usize>>,
    /// The ocean cells with at least one land neighbor, ascending.
    pub boundary: Vec<usize>,
    /// The land cells with at least one ocean neighbor, ascending.
    pub coastal: Vec<usize>,
}

impl TerrainCells {
    /// Retain the partition cells that lie fully within [extent] and classify each as ocean or
    /// land by sampling [sampler] at its centroid. Shores are not classified until
    /// [TerrainCells::classify_shores] is called with the neighbor graph.
    pub fn new(
        partition: &Partition,
        extent: Rect,
        sampler: &impl HeightSampler,
        ocean_threshold: f32,
    ) -> Self {
        let mut cells = vec![];
        let mut cell_of_sample = vec![None; partition.polygons.len()];

        for (sample, poly) in partition.polygons.iter().enumerate() {
            let Some(polygon) = poly else {
                continue;
            };

            if polygon.len() < 3 || !polygon.iter().all(|p| extent.contains(*p)) {
                continue;
            }

            let id = cells.len();

            cell_of_sample[sample] = Some(id);

            cells.push(Cell {
                id,
                sample,
                polygon: polygon.clone(),
                centroid: polygon_centroid(polygon),
                is_ocean: false,
                is_coastal: false,
            });
        }

        let centroids: Vec<Vec2> = cells.iter().map(|c| c.centroid).collect();
        let heights = sampler.sample(&centroids);

        debug_assert_eq!(heights.len(), centroids.len(), "one height per centroid");

        for (cell, h) in cells.iter_mut().zip(heights.iter()) {
            cell.is_ocean = *h < ocean_threshold;
        }

        let dropped = partition.polygons.len() - cells.len();
        let ocean = cells.iter().filter(|c| c.is_ocean).count();

        tracing::debug!(
            target: "rivers::cells",
            retained = cells.len(),
            dropped,
            ocean,
            "cells.classified"
        );

        Self {
            cells,
            cell_of_sample,
            boundary: vec![],
            coastal: vec![],
        }
    }

    /// Build a classification from prepared cells, whose ids must equal their index. Shores are
    /// derived from [graph].
    pub fn from_cells(cells: Vec<Cell>, graph: &TerrainGraph) -> Self {
        debug_assert!(cells.iter().enumerate().all(|(i, c)| c.id == i));

        let cell_of_sample = {
            let samples = cells.iter().map(|c| c.sample + 1).max().unwrap_or(0);
            let mut lookup = vec![None; samples];
            for c in cells.iter() {
                lookup[c.sample] = Some(c.id);
            }
            lookup
        };

        let mut result = Self {
            cells,
            cell_of_sample,
            boundary: vec![],
            coastal: vec![],
        };

        result.classify_shores(graph);
        result
    }

    /// Derive the boundary (ocean side) and coastal (land side) cells of every shoreline.
    pub fn classify_shores(&mut self, graph: &TerrainGraph) {
        let mut boundary = vec![];
        let mut coastal = vec![];

        for i in 0..self.cells.len() {
            let is_ocean = self.cells[i].is_ocean;
            let across_shore = graph
                .neighbors(i)
                .iter()
                .any(|n| self.cells[*n].is_ocean != is_ocean);

            self.cells[i].is_coastal = !is_ocean && across_shore;

            if across_shore {
                if is_ocean {
                    boundary.push(i);
                } else {
                    coastal.push(i);
                }
            }
        }

        tracing::debug!(
            target: "rivers::cells",
            boundary = boundary.len(),
            coastal = coastal.len(),
            "cells.shores"
        );

        self.boundary = boundary;
        self.coastal = coastal;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_ocean(&self, cell: usize) -> bool {
        self.cells[cell].is_ocean
    }

    pub fn is_coastal(&self, cell: usize) -> bool {
        self.cells[cell].is_coastal
    }

    /// The centroid of every cell, indexed by cell id.
    pub fn centroids(&self) -> Vec<Vec2> {
        self.cells.iter().map(|c| c.centroid).collect()
    }
}
