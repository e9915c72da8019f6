use nannou::geom::*;

use crate::terrain::{FlowParams, TerrainCells, TerrainGraph};
use crate::util::PriorityQueue;

/// The downstream cell of a cell, if it has one.
pub type Flow = Option<usize>;

/// Which cell each land cell drains into. Boundary cells are roots and have no parent;
/// unreachable land has no parent either.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowAssignment {
    parent: Vec<Flow>,
    /// The cells in the order the router settled them.
    pub visit_order: Vec<usize>,
}

impl FlowAssignment {
    pub fn new(num_cells: usize) -> Self {
        Self {
            parent: vec![None; num_cells],
            visit_order: vec![],
        }
    }

    /// Record that [cell] drains into [parent], unless [cell] has already been claimed. Returns
    /// true if the claim took effect.
    pub fn claim(&mut self, cell: usize, parent: usize) -> bool {
        match self.parent[cell] {
            Some(_) => false,
            None => {
                self.parent[cell] = Some(parent);
                true
            }
        }
    }

    pub fn parent(&self, cell: usize) -> Flow {
        self.parent[cell]
    }

    /// The parent of every cell, indexed by cell id.
    pub fn parents(&self) -> &[Flow] {
        &self.parent
    }

    /// The number of claimed cells.
    pub fn len(&self) -> usize {
        self.parent.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.iter().all(|p| p.is_none())
    }

    /// Every `(upstream, downstream)` pair, ascending by upstream cell.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.parent
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p)))
            .collect()
    }
}

/// The cost of stepping between two cell centroids during routing.
pub trait DistanceCost {
    fn cost(&self, from: Vec2, to: Vec2) -> f32;
}

impl<F> DistanceCost for F
where
    F: Fn(Vec2, Vec2) -> f32,
{
    fn cost(&self, from: Vec2, to: Vec2) -> f32 {
        self(from, to)
    }
}

/// Charges for the distance of the destination from [origin], in units of [scale]. With the
/// origin at the patch center this favors settling the interior before the patch edges.
#[derive(Debug, Clone, Copy)]
pub struct RadialCost {
    pub origin: Vec2,
    pub scale: f32,
}

impl RadialCost {
    /// A cost centered on [extent], normalized so its corners cost 1.
    pub fn for_extent(extent: Rect) -> Self {
        Self {
            origin: extent.xy(),
            scale: (extent.wh().length() * 0.5).max(f32::EPSILON),
        }
    }
}

impl DistanceCost for RadialCost {
    fn cost(&self, _from: Vec2, to: Vec2) -> f32 {
        to.distance(self.origin) / self.scale
    }
}

/// Route drainage over the land cells, growing outward from every boundary cell at once.
pub fn generate_flow(
    cells: &TerrainCells,
    graph: &TerrainGraph,
    cost: &impl DistanceCost,
    params: &FlowParams,
) -> FlowAssignment {
    // A frontier expansion in the manner of Dijkstra, seeded with all boundary cells at
    // priority zero. A cell's parent is claimed by the first cell to push it, not by the cell
    // with the cheapest path; the priorities only steer the order in which the frontier grows.
    // Water cannot step between two coastal cells, so each river reaches the sea through its
    // own mouth instead of wandering along the shoreline.

    let num_cells = cells.len();

    let mut flow = FlowAssignment::new(num_cells);

    if cells.boundary.is_empty() {
        tracing::debug!(target: "rivers::flow", "flow.no_boundary");
        return flow;
    }

    let alpha = params.alpha;
    let normalization = params.depth_normalization;

    let mut open = PriorityQueue::new();
    let mut visited = vec![false; num_cells];
    let mut depth = vec![0u32; num_cells];

    for b in cells.boundary.iter().cloned() {
        open.push(b, 0.0);
    }

    while let Some((current, priority)) = open.pop_with_score() {
        if visited[current] {
            continue;
        }

        visited[current] = true;
        flow.visit_order.push(current);

        let current_coastal = cells.is_coastal(current);
        let from = cells.cells[current].centroid;

        for neighbor in graph.neighbors(current).iter().cloned() {
            if visited[neighbor] || cells.is_ocean(neighbor) {
                continue;
            }

            if current_coastal && cells.is_coastal(neighbor) {
                continue;
            }

            depth[neighbor] = depth[current] + 1;

            let to = cells.cells[neighbor].centroid;
            let weight = alpha * cost.cost(from, to)
                - (1.0 - alpha) * depth[neighbor] as f32 / normalization;

            open.push(neighbor, priority + weight);
            flow.claim(neighbor, current);
        }
    }

    tracing::debug!(
        target: "rivers::flow",
        boundary = cells.boundary.len(),
        visited = flow.visit_order.len(),
        routed = flow.len(),
        "flow.routed"
    );

    flow
}

/// Iterate through the flow graph from a cell to its root.
pub fn traverse_flow_graph(flow: &FlowAssignment, start: usize) -> FlowGraphIterator {
    FlowGraphIterator {
        flow,
        curr: Some(start),
    }
}

pub struct FlowGraphIterator<'a> {
    flow: &'a FlowAssignment,
    curr: Flow,
}

impl Iterator for FlowGraphIterator<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let curr = self.curr;

        if let Some(i) = curr {
            self.curr = self.flow.parent(i);
        }

        curr
    }
}
