//! Pairing heap.
//!
//! A single heap-ordered multiway tree whose root holds the minimum.
//! Children of a node form a singly-linked sibling chain; each node's
//! `prev` pointer references its previous sibling, or its parent when it is
//! the first child, which makes detaching any node O(1).
//!
//! See <https://en.wikipedia.org/wiki/Pairing_heap>

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
    /// First child in the child list.
    child: Option<NodeKey>,
    /// Next sibling in the parent's child list.
    next: Option<NodeKey>,
    /// Previous sibling, or the parent when this is a first child.
    /// None for the root.
    prev: Option<NodeKey>,
}

/// A pairing min-heap addressable by element id.
pub struct PairingHeap<K> {
    nodes: SlotMap<NodeKey, Node<K>>,
    root: Option<NodeKey>,
    index: FxHashMap<ElementId, NodeKey>,
}

impl<K: Ord + 'static> PairingHeap<K> {
    /// A named constructor for this backend.
    pub fn factory() -> HeapFactory<K> {
        HeapFactory::new("Pairing Heap", || Box::new(PairingHeap::new()))
    }
}

impl<K: Ord> PairingHeap<K> {
    /// Prepends a detached node to `parent`'s child list.
    fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        let first = self.nodes[parent].child;
        if let Some(f) = first {
            self.nodes[f].prev = Some(child);
        }
        {
            let node = &mut self.nodes[child];
            node.prev = Some(parent);
            node.next = first;
        }
        self.nodes[parent].child = Some(child);
    }

    /// Two-way meld of two detached trees; the larger-keyed root becomes a
    /// child of the smaller. Ties go to `b`.
    fn merge(&mut self, a: NodeKey, b: NodeKey) -> NodeKey {
        if self.nodes[a].key < self.nodes[b].key {
            self.add_child(a, b);
            a
        } else {
            self.add_child(b, a);
            b
        }
    }

    /// Splices a non-root node out of its parent's child list.
    fn detach(&mut self, node: NodeKey) {
        let prev = self.nodes[node].prev.take();
        let next = self.nodes[node].next.take();
        if let Some(p) = prev {
            if self.nodes[p].child == Some(node) {
                // First child: prev is the parent.
                self.nodes[p].child = next;
            } else {
                self.nodes[p].next = next;
            }
        }
        if let Some(n) = next {
            self.nodes[n].prev = prev;
        }
    }
}

impl<K: Ord> Heap<K> for PairingHeap<K> {
    fn new() -> Self {
        PairingHeap {
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
            child: None,
            next: None,
            prev: None,
        });
        self.index.insert(id, node);

        self.root = Some(match self.root {
            None => node,
            Some(root) => self.merge(root, node),
        });
    }

    fn peek(&self) -> Option<(&K, ElementId)> {
        let root = self.root?;
        let node = &self.nodes[root];
        Some((&node.key, node.id))
    }

    fn pop(&mut self) -> Option<(K, ElementId)> {
        let min = self.root.take()?;

        // Collect the root's children left to right.
        let mut children = Vec::new();
        let mut child = self.nodes[min].child.take();
        while let Some(c) = child {
            let next = self.nodes[c].next.take();
            self.nodes[c].prev = None;
            children.push(c);
            child = next;
        }

        // First pass: pair up consecutive siblings left to right.
        let mut merged = Vec::with_capacity(children.len() / 2 + 1);
        let mut i = 0;
        while i + 1 < children.len() {
            merged.push(self.merge(children[i], children[i + 1]));
            i += 2;
        }
        if i < children.len() {
            merged.push(children[i]);
        }

        // Second pass: meld the pairs right to left into the final tree.
        let mut root: Option<NodeKey> = None;
        for &tree in merged.iter().rev() {
            root = Some(match root {
                None => tree,
                Some(r) => self.merge(tree, r),
            });
        }
        self.root = root;

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

        if self.root == Some(node) {
            return Ok(());
        }
        self.detach(node);
        if let Some(root) = self.root {
            self.root = Some(self.merge(root, node));
        } else {
            self.root = Some(node);
        }
        Ok(())
    }

    fn get(&self, id: ElementId) -> Option<&K> {
        self.index.get(&id).map(|&node| &self.nodes[node].key)
    }

    fn validate(&self) {
        let mut seen = 0usize;
        if let Some(root) = self.root {
            assert!(self.nodes[root].prev.is_none(), "root has a prev link");
            assert!(self.nodes[root].next.is_none(), "root has a sibling");

            let mut stack = vec![root];
            while let Some(n) = stack.pop() {
                seen += 1;
                let node = &self.nodes[n];
                assert_eq!(self.index.get(&node.id), Some(&n), "id index out of sync");

                // Walk the child chain: the first child links back to the
                // parent, later children to their previous sibling.
                let mut expected_prev = n;
                let mut child = node.child;
                while let Some(c) = child {
                    let child_node = &self.nodes[c];
                    assert_eq!(child_node.prev, Some(expected_prev));
                    assert!(
                        !(child_node.key < node.key),
                        "heap order violated under id {}",
                        node.id
                    );
                    stack.push(c);
                    expected_prev = c;
                    child = child_node.next;
                }
            }
        }
        assert_eq!(seen, self.index.len(), "some ids are missing from the tree");
        assert_eq!(self.nodes.len(), self.index.len());
    }
}

impl<K: Ord> Default for PairingHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the tree, nodes indented by depth.
impl<K: Ord + fmt::Debug> fmt::Debug for PairingHeap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PairingHeap({})", self.len())?;
        let Some(root) = self.root else {
            return Ok(());
        };
        let mut stack = vec![(root, 1usize)];
        while let Some((n, level)) = stack.pop() {
            for _ in 0..level {
                write!(f, "| ")?;
            }
            let node = &self.nodes[n];
            writeln!(f, "{:?} [id:{}]", node.key, node.id)?;

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
        Ok(())
    }
}
