use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

/// A min-priority queue. Entries with equal scores pop in ascending value order, so the pop
/// sequence depends only on the pushed entries and never on insertion order.
pub struct PriorityQueue<T> {
    heap: BinaryHeap<PriorityQueueEntry<T>>,
}

impl<T> PriorityQueue<T>
where
    T: Ord,
{
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, value: T, score: f32) {
        self.heap.push(PriorityQueueEntry {
            score: OrderedFloat(score),
            value,
        });
    }

    /// Pop the lowest scoring value.
    pub fn pop(&mut self) -> Option<T> {
        self.pop_with_score().map(|(value, _)| value)
    }

    /// Pop the lowest scoring value along with its score.
    pub fn pop_with_score(&mut self) -> Option<(T, f32)> {
        self.heap.pop().map(|n| (n.value, n.score.into_inner()))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct PriorityQueueEntry<T> {
    score: OrderedFloat<f32>,
    value: T,
}

impl<T> Ord for PriorityQueueEntry<T>
where
    T: Ord,
{
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both keys to pop the smallest entry first.
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.value.cmp(&self.value))
    }
}

impl<T> PartialOrd for PriorityQueueEntry<T>
where
    T: Ord,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
