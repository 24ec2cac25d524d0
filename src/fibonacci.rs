//! Fibonacci heap.
//!
//! A collection of heap-ordered trees whose roots form a circular
//! doubly-linked list with a pointer to the minimum root. Each node tracks
//! its child count (degree) and a mark bit recording whether it has lost a
//! child since it last became a child itself; `decrease_key` cuts violating
//! nodes to the root list and cascades cuts up through marked ancestors.
//!
//! See <https://en.wikipedia.org/wiki/Fibonacci_heap>

use crate::traits::{ElementId, Heap, HeapError, HeapFactory};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::fmt;

new_key_type! {
    struct NodeKey;
}

struct Node<K> {
    key: K,
    id: ElementId,
    /// Number of children.
    degree: u32,
    /// Whether a child has been cut from this node.
    marked: bool,
    parent: Option<NodeKey>,
    /// One child; the rest are reached through the child's sibling ring.
    child: Option<NodeKey>,
    /// Circular doubly-linked sibling ring; self-referential when alone.
    left: NodeKey,
    right: NodeKey,
}

/// A Fibonacci min-heap addressable by element id.
pub struct FibonacciHeap<K> {
    nodes: SlotMap<NodeKey, Node<K>>,

    /// The root holding the minimum key; entry point into the root ring.
    min_root: Option<NodeKey>,

    /// Maps each stored id to its node.
    index: FxHashMap<ElementId, NodeKey>,
}

impl<K: Ord + 'static> FibonacciHeap<K> {
    /// A named constructor for this backend.
    pub fn factory() -> HeapFactory<K> {
        HeapFactory::new("Fibonacci Heap", || Box::new(FibonacciHeap::new()))
    }
}

impl<K: Ord> FibonacciHeap<K> {
    /// Splices a detached singleton into the root ring (next to the min
    /// root). Does not update the min pointer.
    fn add_to_root_ring(&mut self, node: NodeKey) {
        match self.min_root {
            None => self.min_root = Some(node),
            Some(min) => {
                let right = self.nodes[min].right;
                self.nodes[node].left = min;
                self.nodes[node].right = right;
                self.nodes[min].right = node;
                self.nodes[right].left = node;
            }
        }
    }

    /// Adds a detached singleton as a child of `parent`, growing its degree.
    fn add_child(&mut self, parent: NodeKey, node: NodeKey) {
        debug_assert_eq!(self.nodes[node].left, node);
        debug_assert_eq!(self.nodes[node].right, node);
        if let Some(first) = self.nodes[parent].child {
            let left = self.nodes[first].left;
            self.nodes[node].left = left;
            self.nodes[node].right = first;
            self.nodes[left].right = node;
            self.nodes[first].left = node;
        }
        self.nodes[parent].child = Some(node);
        self.nodes[node].parent = Some(parent);
        self.nodes[parent].degree += 1;
    }

    /// Cuts a node out of its sibling ring (and away from its parent,
    /// lowering the parent's degree), leaving it a detached singleton.
    fn cut(&mut self, node: NodeKey) {
        if let Some(parent) = self.nodes[node].parent.take() {
            if self.nodes[parent].child == Some(node) {
                let right = self.nodes[node].right;
                self.nodes[parent].child = if right == node { None } else { Some(right) };
            }
            self.nodes[parent].degree -= 1;
        }
        let left = self.nodes[node].left;
        let right = self.nodes[node].right;
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        self.nodes[node].left = node;
        self.nodes[node].right = node;
    }

    /// Buckets a detached root by degree, repeatedly linking equal-degree
    /// roots (the larger-keyed becomes a child) until its slot is free.
    fn merge_root(&mut self, by_degree: &mut Vec<Option<NodeKey>>, mut root: NodeKey) {
        loop {
            let degree = self.nodes[root].degree as usize;
            if by_degree.len() < degree + 1 {
                by_degree.resize(degree + 1, None);
            }
            match by_degree[degree].take() {
                None => {
                    by_degree[degree] = Some(root);
                    return;
                }
                Some(other) => {
                    root = if self.nodes[root].key < self.nodes[other].key {
                        self.add_child(root, other);
                        root
                    } else {
                        self.add_child(other, root);
                        other
                    };
                }
            }
        }
    }
}

impl<K: Ord> Heap<K> for FibonacciHeap<K> {
    fn new() -> Self {
        FibonacciHeap {
            nodes: SlotMap::with_key(),
            min_root: None,
            index: FxHashMap::default(),
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn push(&mut self, key: K, id: ElementId) {
        assert!(
            !self.index.contains_key(&id),
            "duplicate heap id {id}"
        );
        let node = self.nodes.insert_with_key(|k| Node {
            key,
            id,
            degree: 0,
            marked: false,
            parent: None,
            child: None,
            left: k,
            right: k,
        });
        self.index.insert(id, node);

        self.add_to_root_ring(node);
        if let Some(min) = self.min_root {
            if min != node && self.nodes[node].key < self.nodes[min].key {
                self.min_root = Some(node);
            }
        }
    }

    fn peek(&self) -> Option<(&K, ElementId)> {
        let min = self.min_root?;
        let node = &self.nodes[min];
        Some((&node.key, node.id))
    }

    fn pop(&mut self) -> Option<(K, ElementId)> {
        let min = self.min_root?;

        // Gather the other roots and the children of the min root.
        let mut promoted = Vec::new();
        let mut current = self.nodes[min].right;
        while current != min {
            promoted.push(current);
            current = self.nodes[current].right;
        }
        if let Some(first) = self.nodes[min].child.take() {
            let mut c = first;
            loop {
                promoted.push(c);
                c = self.nodes[c].right;
                if c == first {
                    break;
                }
            }
        }

        // Consolidate: bucket by degree, linking equal-degree roots until
        // at most one root per degree remains.
        let mut by_degree: Vec<Option<NodeKey>> = Vec::new();
        for node in promoted {
            self.nodes[node].parent = None;
            self.nodes[node].left = node;
            self.nodes[node].right = node;
            self.merge_root(&mut by_degree, node);
        }

        // Rebuild the root ring and find the new minimum.
        self.min_root = None;
        for slot in by_degree {
            if let Some(root) = slot {
                self.add_to_root_ring(root);
                if let Some(min) = self.min_root {
                    if root != min && self.nodes[root].key < self.nodes[min].key {
                        self.min_root = Some(root);
                    }
                }
            }
        }

        let node = self.nodes.remove(min)?;
        self.index.remove(&node.id);
        Some((node.key, node.id))
    }

    fn decrease_key(&mut self, id: ElementId, new_key: K) -> Result<(), HeapError> {
        let &node = self.index.get(&id).ok_or(HeapError::UnknownId)?;
        if self.nodes[node].key < new_key {
            return Err(HeapError::KeyNotDecreased);
        }
        self.nodes[node].key = new_key;

        // Cut if the node now undercuts its parent.
        let violated_parent = match self.nodes[node].parent {
            Some(p) if self.nodes[node].key < self.nodes[p].key => Some(p),
            _ => None,
        };
        if let Some(parent) = violated_parent {
            // Move the node to the root ring, clearing its mark.
            self.cut(node);
            self.nodes[node].marked = false;
            self.add_to_root_ring(node);

            // Cascade: a marked ancestor has already lost a child, so cut
            // it too and keep climbing; an unmarked one is marked and ends
            // the walk. Roots absorb cuts without being marked.
            let mut current = Some(parent);
            while let Some(p) = current {
                let grandparent = self.nodes[p].parent;
                if grandparent.is_none() {
                    break;
                }
                if !self.nodes[p].marked {
                    self.nodes[p].marked = true;
                    break;
                }
                self.nodes[p].marked = false;
                self.cut(p);
                self.add_to_root_ring(p);
                current = grandparent;
            }
        }

        // The node is a root now if it was not already; retarget the min
        // pointer once it is reachable from the ring.
        if let Some(min) = self.min_root {
            if self.nodes[node].key < self.nodes[min].key {
                self.min_root = Some(node);
            }
        }
        Ok(())
    }

    fn get(&self, id: ElementId) -> Option<&K> {
        self.index.get(&id).map(|&node| &self.nodes[node].key)
    }

    fn validate(&self) {
        let min = match self.min_root {
            Some(min) => min,
            None => {
                assert!(self.index.is_empty());
                assert!(self.nodes.is_empty());
                return;
            }
        };

        let mut seen = 0usize;
        let mut root = min;
        loop {
            assert!(self.nodes[root].parent.is_none(), "root has a parent");
            assert!(
                !(self.nodes[root].key < self.nodes[min].key),
                "min pointer is not the minimum root"
            );

            let mut stack = vec![root];
            while let Some(n) = stack.pop() {
                seen += 1;
                let node = &self.nodes[n];
                assert_eq!(self.index.get(&node.id), Some(&n), "id index out of sync");

                if let Some(first) = node.child {
                    let mut count = 0;
                    let mut c = first;
                    loop {
                        let child = &self.nodes[c];
                        assert_eq!(child.parent, Some(n));
                        assert_eq!(self.nodes[child.right].left, c);
                        assert_eq!(self.nodes[child.left].right, c);
                        assert!(
                            !(child.key < node.key),
                            "heap order violated under id {}",
                            node.id
                        );
                        stack.push(c);
                        count += 1;
                        c = child.right;
                        if c == first {
                            break;
                        }
                    }
                    assert_eq!(node.degree, count, "degree does not match child count");
                } else {
                    assert_eq!(node.degree, 0);
                }
            }

            assert_eq!(self.nodes[self.nodes[root].right].left, root);
            root = self.nodes[root].right;
            if root == min {
                break;
            }
        }

        assert_eq!(seen, self.index.len(), "some ids are missing from the forest");
        assert_eq!(self.nodes.len(), self.index.len());
    }
}

impl<K: Ord> Default for FibonacciHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders one tree per root, starting at the min root.
impl<K: Ord + fmt::Debug> fmt::Debug for FibonacciHeap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FibonacciHeap({})", self.len())?;
        let Some(min) = self.min_root else {
            return Ok(());
        };
        let mut root = min;
        loop {
            writeln!(f, "Deg({})", self.nodes[root].degree)?;
            let mut stack = vec![(root, 1usize)];
            while let Some((n, level)) = stack.pop() {
                for _ in 0..level {
                    write!(f, "| ")?;
                }
                let node = &self.nodes[n];
                writeln!(
                    f,
                    "{:?} [id:{}][deg:{}][marked:{}]",
                    node.key, node.id, node.degree, node.marked
                )?;

                let mut children = Vec::new();
                if let Some(first) = node.child {
                    let mut c = first;
                    loop {
                        children.push(c);
                        c = self.nodes[c].right;
                        if c == first {
                            break;
                        }
                    }
                }
                for &c in children.iter().rev() {
                    stack.push((c, level + 1));
                }
            }
            root = self.nodes[root].right;
            if root == min {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_in_order() {
        let mut heap = FibonacciHeap::new();
        let keys = [3, 1, 4, 1, 5, 9, 2, 6];
        for (id, &key) in keys.iter().enumerate() {
            heap.push(key, id);
            heap.validate();
        }

        let mut popped = Vec::new();
        while let Some((key, _)) = heap.pop() {
            heap.validate();
            popped.push(key);
        }
        assert_eq!(popped, vec![1, 1, 2, 3, 4, 5, 6, 9]);
    }

    #[test]
    fn consolidation_leaves_unique_degrees() {
        let mut heap = FibonacciHeap::new();
        for id in 0..32usize {
            heap.push(id as i32, id);
        }
        heap.pop();
        heap.validate();

        // After consolidation every root degree is distinct.
        let min = heap.min_root.unwrap();
        let mut degrees = Vec::new();
        let mut root = min;
        loop {
            degrees.push(heap.nodes[root].degree);
            root = heap.nodes[root].right;
            if root == min {
                break;
            }
        }
        let mut unique = degrees.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), degrees.len());
    }

    #[test]
    fn cascading_cut_promotes_marked_ancestors() {
        let mut heap = FibonacciHeap::new();
        for id in 0..16usize {
            heap.push((id + 100) as i32, id);
        }
        // Force consolidation into larger trees.
        heap.push(0, 100);
        assert_eq!(heap.pop(), Some((0, 100)));

        // Repeated decreases deep in a tree trigger cuts and cascades.
        for id in (8..16usize).rev() {
            heap.decrease_key(id, -(id as i32)).unwrap();
            heap.validate();
        }
        assert_eq!(heap.peek(), Some((&-15, 15)));
    }

    #[test]
    fn decrease_key_updates_min() {
        let mut heap = FibonacciHeap::new();
        heap.push(100, 0);
        heap.push(200, 1);
        heap.push(300, 2);
        heap.decrease_key(2, 50).unwrap();
        assert_eq!(heap.pop(), Some((50, 2)));
        heap.validate();
    }
}
