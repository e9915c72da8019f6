use std::collections::BTreeMap;

use nannou::glam::*;

/// Turns the edges of a drainage network into smooth, densely sampled paths.
pub trait PathSmoother {
    /// For each `(upstream, downstream)` edge, return the sampled path from the upstream node
    /// position to the downstream node position. [positions] is indexed by node id.
    fn smooth_edges(&self, edges: &[(usize, usize)], positions: &[Vec2]) -> Vec<Vec<Vec2>>;
}

/// Samples each edge as a uniform Catmull-Rom segment. The outer control points come from the
/// neighboring edges of the network, so consecutive edges of a river share a tangent where they
/// meet and the river bends smoothly through each node.
#[derive(Debug, Clone, Copy)]
pub struct CatmullRom {
    /// Points sampled per edge, including both endpoints.
    pub resolution: usize,
}

impl CatmullRom {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution: resolution.max(2),
        }
    }
}

impl PathSmoother for CatmullRom {
    fn smooth_edges(&self, edges: &[(usize, usize)], positions: &[Vec2]) -> Vec<Vec<Vec2>> {
        // Index the network so each edge can look one node further upstream and downstream.
        // When a node has several upstream edges the lowest id is used, which keeps the output
        // independent of edge order.

        let mut downstream_of = BTreeMap::new();
        let mut upstream_of = BTreeMap::new();

        for (up, down) in edges.iter().cloned() {
            downstream_of.insert(up, down);
            upstream_of
                .entry(down)
                .and_modify(|u: &mut usize| *u = (*u).min(up))
                .or_insert(up);
        }

        let resolution = self.resolution.max(2);

        edges
            .iter()
            .map(|(up, down)| {
                let p1 = positions[*up];
                let p2 = positions[*down];

                // Missing neighbors are mirrored through the endpoint, which degrades the segment
                // to a straight line at that end.
                let p0 = match upstream_of.get(up) {
                    Some(u) => positions[*u],
                    None => p1 * 2.0 - p2,
                };
                let p3 = match downstream_of.get(down) {
                    Some(d) => positions[*d],
                    None => p2 * 2.0 - p1,
                };

                (0..resolution)
                    .map(|i| {
                        let t = i as f32 / (resolution - 1) as f32;
                        catmull_rom(p0, p1, p2, p3, t)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Evaluate the uniform Catmull-Rom segment between [p1] and [p2] at [t] in \[0, 1\].
pub fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    if t <= 0.0 {
        return p1;
    }

    if t >= 1.0 {
        return p2;
    }

    let t2 = t * t;
    let t3 = t2 * t;

    let a = p1 * 2.0;
    let b = p2 - p0;
    let c = p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3;
    let d = p1 * 3.0 - p0 - p2 * 3.0 + p3;

    (a + b * t + c * t2 + d * t3) * 0.5
}
