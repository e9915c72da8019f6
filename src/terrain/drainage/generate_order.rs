use crate::terrain::drainage::FlowAssignment;

/// The drainage network viewed upstream: the cells draining directly into each cell.
#[derive(Debug, Clone, Default)]
pub struct DrainageForest {
    /// The upstream cells of each cell, ascending.
    children: Vec<Vec<usize>>,
    /// True for cells that drain somewhere or are drained into.
    in_forest: Vec<bool>,
}

impl DrainageForest {
    pub fn new(flow: &FlowAssignment) -> Self {
        let num_cells = flow.parents().len();

        let mut children = vec![vec![]; num_cells];
        let mut in_forest = vec![false; num_cells];

        // edges() is ascending by upstream cell, so each child list comes out sorted
        for (up, down) in flow.edges() {
            children[down].push(up);
            in_forest[up] = true;
            in_forest[down] = true;
        }

        Self {
            children,
            in_forest,
        }
    }

    pub fn children(&self, cell: usize) -> &[usize] {
        &self.children[cell]
    }

    pub fn contains(&self, cell: usize) -> bool {
        self.in_forest.get(cell).cloned().unwrap_or(false)
    }

    /// The cells that take part in the network, ascending.
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.in_forest
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i)
    }

    /// Every `(upstream, downstream)` edge, grouped by downstream cell.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = vec![];

        for (down, ups) in self.children.iter().enumerate() {
            for up in ups.iter() {
                edges.push((*up, down));
            }
        }

        edges
    }

    pub fn num_cells(&self) -> usize {
        self.children.len()
    }
}

/// The Strahler order of each cell in the drainage network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOrder {
    order: Vec<Option<u32>>,
}

impl StreamOrder {
    pub fn get(&self, cell: usize) -> Option<u32> {
        self.order.get(cell).cloned().flatten()
    }

    /// The highest order in the network.
    pub fn max(&self) -> Option<u32> {
        self.order.iter().flatten().max().cloned()
    }

    /// The order of each cell, indexed by cell id.
    pub fn as_slice(&self) -> &[Option<u32>] {
        &self.order
    }
}

/// Compute the Strahler order of every cell in the [forest]. A source has order 1; a cell
/// takes the highest order among its upstream cells, plus one if that order arrives through
/// more than one of them.
pub fn generate_stream_order(forest: &DrainageForest) -> StreamOrder {
    let num_cells = forest.num_cells();

    let mut order: Vec<Option<u32>> = vec![None; num_cells];

    // Post-order traversal with an explicit stack; river chains can be far longer than the
    // call stack allows. Each cell is pushed once to expand its children and is resolved when
    // it comes back to the top with every child resolved.

    let mut stack = vec![];

    for root in forest.nodes() {
        if order[root].is_some() {
            continue;
        }

        stack.push((root, false));

        while let Some((cell, expanded)) = stack.pop() {
            if !expanded {
                stack.push((cell, true));

                for child in forest.children(cell).iter().rev() {
                    if order[*child].is_none() {
                        stack.push((*child, false));
                    }
                }

                continue;
            }

            order[cell] = Some(strahler(forest.children(cell), &order));
        }
    }

    let max = order.iter().flatten().max().cloned().unwrap_or(0);

    tracing::debug!(
        target: "rivers::order",
        nodes = order.iter().flatten().count(),
        max_order = max,
        "order.computed"
    );

    StreamOrder { order }
}

fn strahler(children: &[usize], order: &[Option<u32>]) -> u32 {
    let mut max = 0;
    let mut count = 0;

    for o in children.iter().filter_map(|c| order[*c]) {
        if o > max {
            max = o;
            count = 1;
        } else if o == max {
            count += 1;
        }
    }

    match (max, count) {
        (0, _) => 1,
        (m, c) if c > 1 => m + 1,
        (m, _) => m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_from_parents(parents: &[Option<usize>]) -> FlowAssignment {
        let mut flow = FlowAssignment::new(parents.len());
        for (cell, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                flow.claim(cell, *p);
            }
        }
        flow
    }

    #[test]
    fn forest_groups_children_by_parent() {
        let flow = flow_from_parents(&[None, Some(0), Some(0), Some(1), None]);
        let forest = DrainageForest::new(&flow);

        assert_eq!(forest.children(0), &[1, 2]);
        assert_eq!(forest.children(1), &[3]);
        assert!(forest.children(3).is_empty());
        assert_eq!(forest.nodes().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(!forest.contains(4));
        assert_eq!(forest.edges(), vec![(1, 0), (2, 0), (3, 1)]);
    }

    #[test]
    fn confluence_of_equal_orders_increments() {
        //     0
        //    / \
        //   1   2
        //  / \   \
        // 3   4   5
        let flow = flow_from_parents(&[None, Some(0), Some(0), Some(1), Some(1), Some(2)]);
        let order = generate_stream_order(&DrainageForest::new(&flow));

        assert_eq!(order.get(3), Some(1));
        assert_eq!(order.get(4), Some(1));
        assert_eq!(order.get(5), Some(1));
        assert_eq!(order.get(2), Some(1));
        assert_eq!(order.get(1), Some(2));
        assert_eq!(order.get(0), Some(2));
        assert_eq!(order.max(), Some(2));
    }

    #[test]
    fn two_order_two_branches_make_order_three() {
        let flow = flow_from_parents(&[
            None,
            Some(0),
            Some(0),
            Some(1),
            Some(1),
            Some(2),
            Some(2),
        ]);
        let order = generate_stream_order(&DrainageForest::new(&flow));

        assert_eq!(order.get(1), Some(2));
        assert_eq!(order.get(2), Some(2));
        assert_eq!(order.get(0), Some(3));
    }

    #[test]
    fn cells_outside_the_network_have_no_order() {
        let flow = flow_from_parents(&[None, Some(0), None]);
        let order = generate_stream_order(&DrainageForest::new(&flow));

        assert_eq!(order.get(0), Some(1));
        assert_eq!(order.get(1), Some(1));
        assert_eq!(order.get(2), None);
        assert_eq!(order.get(99), None);
    }

    #[test]
    fn long_chain_does_not_overflow_the_stack() {
        let n: usize = 200_000;
        let parents: Vec<Option<usize>> = (0..n).map(|i| i.checked_sub(1)).collect();

        let order = generate_stream_order(&DrainageForest::new(&flow_from_parents(&parents)));

        assert!(order.as_slice().iter().all(|o| *o == Some(1)));
    }
}
