//! Binomial heap.
//!
//! A forest of binomial trees linked as a singly-linked root list in
//! strictly ascending dimension. A tree of dimension k holds exactly 2^k
//! nodes; the children of a dimension-k node form a sibling chain of
//! dimensions k-1, k-2, ..., 0.
//!
//! Nodes live in a slotmap arena and reference each other by key, so
//! dropping the heap frees everything without touching the tree shape.
//!
//! See <https://en.wikipedia.org/wiki/Binomial_heap>

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
    dimension: u32,
    parent: Option<NodeKey>,
    /// Highest-dimension child (dimension - 1).
    child: Option<NodeKey>,
    /// Next sibling. Siblings have descending dimensions, except the root
    /// list which ascends.
    next: Option<NodeKey>,
}

/// A binomial min-heap addressable by element id.
pub struct BinomialHeap<K> {
    nodes: SlotMap<NodeKey, Node<K>>,

    /// Head of the root list (lowest dimension first).
    root: Option<NodeKey>,

    /// Maps each stored id to its node.
    index: FxHashMap<ElementId, NodeKey>,
}

impl<K: Ord + 'static> BinomialHeap<K> {
    /// A named constructor for this backend.
    pub fn factory() -> HeapFactory<K> {
        HeapFactory::new("Binomial Heap", || Box::new(BinomialHeap::new()))
    }
}

impl<K: Ord> BinomialHeap<K> {
    /// Links two detached trees of equal dimension: the larger-keyed root
    /// becomes the highest child of the smaller, whose dimension grows.
    fn merge_trees(&mut self, a: NodeKey, b: NodeKey) -> NodeKey {
        debug_assert_eq!(self.nodes[a].dimension, self.nodes[b].dimension);
        let (a, b) = if self.nodes[b].key < self.nodes[a].key {
            (b, a)
        } else {
            (a, b)
        };

        let first_child = self.nodes[a].child;
        {
            let node_b = &mut self.nodes[b];
            node_b.next = first_child;
            node_b.parent = Some(a);
        }
        let node_a = &mut self.nodes[a];
        node_a.child = Some(b);
        node_a.dimension += 1;
        a
    }

    /// Appends a detached tree to the merged root list under construction.
    fn append_root(&mut self, head: &mut Option<NodeKey>, tail: &mut Option<NodeKey>, node: NodeKey) {
        match *tail {
            Some(t) => self.nodes[t].next = Some(node),
            None => *head = Some(node),
        }
        *tail = Some(node);
    }

    /// Merges two root lists (each strictly ascending in dimension) into
    /// one, carrying a linked pair upwards whenever dimensions collide,
    /// like a base-2 adder.
    fn merge_lists(&mut self, mut a: Option<NodeKey>, mut b: Option<NodeKey>) -> Option<NodeKey> {
        let mut head: Option<NodeKey> = None;
        let mut tail: Option<NodeKey> = None;
        let mut carry: Option<NodeKey> = None;

        while a.is_some() || b.is_some() || carry.is_some() {
            let mut dim = u32::MAX;
            for k in [carry, a, b].into_iter().flatten() {
                dim = dim.min(self.nodes[k].dimension);
            }

            let mut picked: Vec<NodeKey> = Vec::with_capacity(3);
            if let Some(k) = carry {
                if self.nodes[k].dimension == dim {
                    carry = None;
                    picked.push(k);
                }
            }
            if let Some(k) = a {
                if self.nodes[k].dimension == dim {
                    a = self.nodes[k].next.take();
                    picked.push(k);
                }
            }
            if let Some(k) = b {
                if self.nodes[k].dimension == dim {
                    b = self.nodes[k].next.take();
                    picked.push(k);
                }
            }

            match picked[..] {
                [single] => self.append_root(&mut head, &mut tail, single),
                [x, y] => carry = Some(self.merge_trees(x, y)),
                [keep, x, y] => {
                    self.append_root(&mut head, &mut tail, keep);
                    carry = Some(self.merge_trees(x, y));
                }
                _ => unreachable!("between one and three trees per dimension"),
            }
        }
        head
    }

    /// Returns the minimum root and its predecessor in the root list.
    fn min_root(&self) -> Option<(NodeKey, Option<NodeKey>)> {
        let first = self.root?;
        let mut min = first;
        let mut min_prev = None;
        let mut prev = first;
        let mut current = self.nodes[first].next;
        while let Some(c) = current {
            if self.nodes[c].key < self.nodes[min].key {
                min = c;
                min_prev = Some(prev);
            }
            prev = c;
            current = self.nodes[c].next;
        }
        Some((min, min_prev))
    }
}

impl<K: Ord> Heap<K> for BinomialHeap<K> {
    fn new() -> Self {
        BinomialHeap {
            nodes: SlotMap::with_key(),
            root: None,
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
        let node = self.nodes.insert(Node {
            key,
            id,
            dimension: 0,
            parent: None,
            child: None,
            next: None,
        });
        self.index.insert(id, node);

        let roots = self.root.take();
        self.root = self.merge_lists(roots, Some(node));
    }

    fn peek(&self) -> Option<(&K, ElementId)> {
        let (min, _) = self.min_root()?;
        let node = &self.nodes[min];
        Some((&node.key, node.id))
    }

    fn pop(&mut self) -> Option<(K, ElementId)> {
        let (min, prev) = self.min_root()?;

        // Unlink the min root from the root list.
        let after = self.nodes[min].next.take();
        match prev {
            Some(p) => self.nodes[p].next = after,
            None => self.root = after,
        }

        // Reverse the children into an ascending-dimension list.
        let mut children: Option<NodeKey> = None;
        let mut child = self.nodes[min].child.take();
        while let Some(c) = child {
            let next = self.nodes[c].next;
            self.nodes[c].parent = None;
            self.nodes[c].next = children;
            children = Some(c);
            child = next;
        }

        let roots = self.root.take();
        self.root = self.merge_lists(roots, children);

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

        // Sift the (key, id) payload upwards, keeping the index current.
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            if !(self.nodes[current].key < self.nodes[parent].key) {
                break;
            }
            if let Some([c, p]) = self.nodes.get_disjoint_mut([current, parent]) {
                std::mem::swap(&mut c.key, &mut p.key);
                std::mem::swap(&mut c.id, &mut p.id);
            }
            self.index.insert(self.nodes[current].id, current);
            self.index.insert(self.nodes[parent].id, parent);
            current = parent;
        }
        Ok(())
    }

    fn get(&self, id: ElementId) -> Option<&K> {
        self.index.get(&id).map(|&node| &self.nodes[node].key)
    }

    fn validate(&self) {
        let mut seen = 0usize;
        let mut prev_dimension: Option<u32> = None;

        let mut root = self.root;
        while let Some(r) = root {
            assert!(self.nodes[r].parent.is_none(), "root has a parent");
            let dim = self.nodes[r].dimension;
            if let Some(prev) = prev_dimension {
                assert!(dim > prev, "root list dimensions must ascend strictly");
            }
            prev_dimension = Some(dim);

            // Walk the whole tree under this root.
            let mut stack = vec![r];
            while let Some(n) = stack.pop() {
                seen += 1;
                let node = &self.nodes[n];
                assert_eq!(self.index.get(&node.id), Some(&n), "id index out of sync");

                // Children chain has dimensions dim-1, dim-2, ..., 0.
                let mut expected = node.dimension;
                let mut child = node.child;
                while let Some(c) = child {
                    assert!(expected > 0, "too many children");
                    expected -= 1;
                    let child_node = &self.nodes[c];
                    assert_eq!(child_node.dimension, expected);
                    assert_eq!(child_node.parent, Some(n));
                    assert!(
                        !(child_node.key < node.key),
                        "heap order violated under id {}",
                        node.id
                    );
                    stack.push(c);
                    child = child_node.next;
                }
                assert_eq!(expected, 0, "missing children");
            }

            root = self.nodes[r].next;
        }

        assert_eq!(seen, self.index.len(), "some ids are missing from the forest");
        assert_eq!(self.nodes.len(), self.index.len());
    }
}

impl<K: Ord> Default for BinomialHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders one tree per root, nodes indented by depth.
impl<K: Ord + fmt::Debug> fmt::Debug for BinomialHeap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BinomialHeap({})", self.len())?;
        let mut root = self.root;
        while let Some(r) = root {
            writeln!(f, "Tree #{}", self.nodes[r].dimension)?;
            let mut stack = vec![(r, 1usize)];
            while let Some((n, level)) = stack.pop() {
                for _ in 0..level {
                    write!(f, "| ")?;
                }
                let node = &self.nodes[n];
                writeln!(f, "{:?} [id:{}][dim:{}]", node.key, node.id, node.dimension)?;

                let mut children = Vec::new();
                let mut child = node.child;
                while let Some(c) = child {
                    children.push(c);
                    child = self.nodes[c].next;
                }
                for &c in children.iter().rev() {
                    stack.push((c, level + 1));
                }
            }
            root = self.nodes[r].next;
        }
        Ok(())
    }
}
