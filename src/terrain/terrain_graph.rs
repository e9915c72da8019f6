/// Undirected adjacency between terrain cells.
#[derive(Debug, Clone, Default)]
pub struct TerrainGraph {
    /// The neighbors of each cell, ascending and without duplicates.
    neighbors: Vec<Vec<usize>>,
}

impl TerrainGraph {
    /// Build the cell adjacency from partition [ridges], given as pairs of sample indices.
    /// Ridges touching a sample without a cell in [cell_of_sample] are skipped.
    pub fn new(
        ridges: &[(usize, usize)],
        cell_of_sample: &[Option<usize>],
        num_cells: usize,
    ) -> Self {
        let lookup = |sample: usize| cell_of_sample.get(sample).cloned().flatten();

        let edges: Vec<(usize, usize)> = ridges
            .iter()
            .filter_map(|(a, b)| Some((lookup(*a)?, lookup(*b)?)))
            .collect();

        let graph = Self::from_edges(num_cells, &edges);

        tracing::debug!(
            target: "rivers::graph",
            ridges = ridges.len(),
            cells = num_cells,
            edges = graph.num_edges(),
            "graph.built"
        );

        graph
    }

    /// Build the adjacency directly from pairs of cell ids. Self loops and repeated edges are
    /// ignored.
    pub fn from_edges(num_cells: usize, edges: &[(usize, usize)]) -> Self {
        let mut neighbors = vec![vec![]; num_cells];

        for (a, b) in edges.iter().cloned() {
            if a == b || a >= num_cells || b >= num_cells {
                continue;
            }

            neighbors[a].push(b);
            neighbors[b].push(a);
        }

        for n in neighbors.iter_mut() {
            n.sort_unstable();
            n.dedup();
        }

        Self { neighbors }
    }

    /// The cells sharing an edge with [cell], ascending.
    pub fn neighbors(&self, cell: usize) -> &[usize] {
        &self.neighbors[cell]
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.neighbors
            .get(a)
            .map_or(false, |n| n.binary_search(&b).is_ok())
    }

    pub fn num_cells(&self) -> usize {
        self.neighbors.len()
    }

    pub fn num_edges(&self) -> usize {
        self.neighbors.iter().map(|n| n.len()).sum::<usize>() / 2
    }
}
