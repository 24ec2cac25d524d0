//! Binary heap.
//!
//! The classic array-backed implicit tree, extended with an `id -> index`
//! map so elements can be addressed and have their keys decreased in place.
//!
//! See <https://en.wikipedia.org/wiki/Binary_heap>

use crate::traits::{ElementId, Heap, HeapError, HeapFactory};
use rustc_hash::FxHashMap;
use std::fmt;

/// A binary min-heap that keeps track of its elements by id, allowing
/// lookup by id and decreasing keys.
///
/// Every internal move goes through [`BinaryHeap::swap_slots`], which
/// rewrites the index map before control returns, so the map and the array
/// never disagree.
pub struct BinaryHeap<K> {
    /// The implicit tree: `elements[i]`'s parent is `elements[(i - 1) / 2]`.
    elements: Vec<(K, ElementId)>,

    /// Maps each stored id to its current index in `elements`.
    index: FxHashMap<ElementId, usize>,
}

impl<K: Ord + 'static> BinaryHeap<K> {
    /// A named constructor for this backend.
    pub fn factory() -> HeapFactory<K> {
        HeapFactory::new("Binary Heap", || Box::new(BinaryHeap::new()))
    }
}

impl<K: Ord> BinaryHeap<K> {
    /// Swaps two occupied slots and updates the index map for both ids.
    fn swap_slots(&mut self, a: usize, b: usize) {
        self.elements.swap(a, b);
        self.index.insert(self.elements[a].1, a);
        self.index.insert(self.elements[b].1, b);
    }

    /// Moves the element at `pos` upwards until its parent is not larger.
    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.elements[pos].0 < self.elements[parent].0 {
                self.swap_slots(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    /// Moves the element at `pos` downwards until no child is smaller.
    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let mut child = pos * 2 + 1;
            if child >= self.elements.len() {
                break;
            }
            // Prefer the right child only if it is strictly smaller.
            if child + 1 < self.elements.len()
                && self.elements[child + 1].0 < self.elements[child].0
            {
                child += 1;
            }
            if self.elements[child].0 < self.elements[pos].0 {
                self.swap_slots(pos, child);
                pos = child;
            } else {
                break;
            }
        }
    }
}

impl<K: Ord> Heap<K> for BinaryHeap<K> {
    fn new() -> Self {
        BinaryHeap {
            elements: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn push(&mut self, key: K, id: ElementId) {
        assert!(
            !self.index.contains_key(&id),
            "duplicate heap id {id}"
        );
        let pos = self.elements.len();
        self.elements.push((key, id));
        self.index.insert(id, pos);
        self.sift_up(pos);
    }

    fn peek(&self) -> Option<(&K, ElementId)> {
        self.elements.first().map(|(key, id)| (key, *id))
    }

    fn pop(&mut self) -> Option<(K, ElementId)> {
        if self.elements.is_empty() {
            return None;
        }
        self.index.remove(&self.elements[0].1);
        let last = self.elements.pop()?;
        if self.elements.is_empty() {
            return Some(last);
        }

        // Move the last element to the head of the heap and sift down.
        let min = std::mem::replace(&mut self.elements[0], last);
        self.index.insert(self.elements[0].1, 0);
        self.sift_down(0);
        Some(min)
    }

    fn decrease_key(&mut self, id: ElementId, new_key: K) -> Result<(), HeapError> {
        let &pos = self.index.get(&id).ok_or(HeapError::UnknownId)?;
        if self.elements[pos].0 < new_key {
            return Err(HeapError::KeyNotDecreased);
        }
        self.elements[pos].0 = new_key;
        self.sift_up(pos);
        Ok(())
    }

    fn get(&self, id: ElementId) -> Option<&K> {
        self.index.get(&id).map(|&pos| &self.elements[pos].0)
    }

    fn validate(&self) {
        for pos in 1..self.elements.len() {
            let parent = (pos - 1) / 2;
            assert!(
                !(self.elements[pos].0 < self.elements[parent].0),
                "heap order violated at index {pos}"
            );
        }
        for (pos, element) in self.elements.iter().enumerate() {
            assert_eq!(self.index.get(&element.1), Some(&pos));
        }
        assert_eq!(self.index.len(), self.elements.len());
    }
}

impl<K: Ord> Default for BinaryHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the implicit tree, one node per line, indented by depth.
impl<K: Ord + fmt::Debug> fmt::Debug for BinaryHeap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BinaryHeap({})", self.elements.len())?;
        if self.elements.is_empty() {
            return Ok(());
        }
        let mut stack = vec![(0usize, 1usize)];
        while let Some((pos, level)) = stack.pop() {
            for _ in 0..level {
                write!(f, "| ")?;
            }
            let (key, id) = &self.elements[pos];
            writeln!(f, "{key:?} [id:{id}]")?;

            let left = pos * 2 + 1;
            let right = pos * 2 + 2;
            if right < self.elements.len() {
                stack.push((right, level + 1));
            }
            if left < self.elements.len() {
                stack.push((left, level + 1));
            }
        }
        Ok(())
    }
}
