//! Thin heap.
//!
//! A forest of rank-labeled trees. A node is *thick* when its highest-rank
//! child has rank exactly one less than its own (leaves of rank 0 are
//! thick); otherwise it is *thin* — its rank exceeds that child-implied
//! rank by one. `decrease_key` cuts a subtree to the root list, first
//! walking the left-sibling chain to repair the ranks the cut disturbs;
//! `pop` consolidates roots by rank.
//!
//! See Kaplan & Tarjan, "Thin heaps, thick heaps" (ACM TALG 2008).

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
    rank: u32,
    /// Highest-rank child.
    child: Option<NodeKey>,
    /// Previous sibling, or the parent when this is a first child.
    /// None exactly for root nodes.
    left: Option<NodeKey>,
    /// Next sibling; for roots, the next root in the root list.
    right: Option<NodeKey>,
}

/// A thin min-heap addressable by element id.
pub struct ThinHeap<K> {
    nodes: SlotMap<NodeKey, Node<K>>,

    /// The minimum root; points at one of the nodes in the root list.
    min_root: Option<NodeKey>,

    /// Head of the singly-linked root list.
    root: Option<NodeKey>,

    /// Maps each stored id to its node.
    index: FxHashMap<ElementId, NodeKey>,
}

impl<K: Ord + 'static> ThinHeap<K> {
    /// A named constructor for this backend.
    pub fn factory() -> HeapFactory<K> {
        HeapFactory::new("Thin Heap", || Box::new(ThinHeap::new()))
    }
}

impl<K: Ord> ThinHeap<K> {
    fn is_root(&self, node: NodeKey) -> bool {
        self.nodes[node].left.is_none()
    }

    /// A node is thick when its highest-rank child is exactly one rank
    /// below it.
    fn is_thick(&self, node: NodeKey) -> bool {
        match self.nodes[node].child {
            Some(child) => self.nodes[child].rank + 1 == self.nodes[node].rank,
            None => self.nodes[node].rank == 0,
        }
    }

    /// Drops the node's rank to match its children, making it thick.
    fn make_thick(&mut self, node: NodeKey) {
        self.nodes[node].rank = match self.nodes[node].child {
            Some(child) => self.nodes[child].rank + 1,
            None => 0,
        };
    }

    /// Adds a detached node as the new highest-rank child, growing the
    /// parent's rank.
    fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        if let Some(first) = self.nodes[parent].child {
            self.nodes[first].left = Some(child);
        }
        self.nodes[child].left = Some(parent);
        self.nodes[child].right = self.nodes[parent].child;
        self.nodes[parent].child = Some(child);
        self.nodes[parent].rank += 1;
    }

    /// Inserts a detached node into the sibling list right after `node`.
    fn insert_after(&mut self, node: NodeKey, inserted: NodeKey) {
        self.nodes[inserted].left = Some(node);
        self.nodes[inserted].right = self.nodes[node].right;
        if let Some(right) = self.nodes[node].right {
            self.nodes[right].left = Some(inserted);
        }
        self.nodes[node].right = Some(inserted);
    }

    /// Detaches the first child of a thick node without lowering the
    /// node's rank (the caller re-homes the child immediately).
    fn detach_first_child(&mut self, parent: NodeKey) -> Option<NodeKey> {
        let child = self.nodes[parent].child?;
        let next = self.nodes[child].right.take();
        if let Some(n) = next {
            self.nodes[n].left = Some(parent);
        }
        self.nodes[parent].child = next;
        self.nodes[child].left = None;
        Some(child)
    }

    /// Cuts a non-root node from its siblings and parent.
    fn cut(&mut self, node: NodeKey) {
        let left = self.nodes[node].left.take();
        let right = self.nodes[node].right.take();
        if let Some(l) = left {
            if self.nodes[l].child == Some(node) {
                self.nodes[l].child = right;
            } else {
                self.nodes[l].right = right;
            }
        }
        if let Some(r) = right {
            self.nodes[r].left = left;
        }
    }

    /// Cuts a non-root subtree and prepends it to the root list, repairing
    /// sibling and ancestor ranks first.
    fn cut_and_move_to_root(&mut self, tree: NodeKey) {
        debug_assert!(!self.is_root(tree));

        self.lower_rank(tree);

        self.cut(tree);
        self.make_thick(tree);
        self.nodes[tree].right = self.root;
        self.root = Some(tree);
    }

    /// Repairs ranks along the left-sibling chain after `tree` is cut out.
    fn lower_rank(&mut self, tree: NodeKey) {
        let mut tree = tree;
        let mut rank = self.nodes[tree].rank;
        let mut left = match self.nodes[tree].left {
            Some(l) => l,
            None => return,
        };

        // Iterate through the left siblings until reaching the parent.
        while self.nodes[left].child != Some(tree) {
            // A thick sibling can donate its first child as the new right
            // sibling, absorbing the hole.
            if self.is_thick(left) {
                if let Some(first) = self.detach_first_child(left) {
                    self.insert_after(left, first);
                }
                return;
            }

            // A thin sibling drops its rank, becoming thick; the hole moves
            // one position left.
            self.nodes[left].rank = rank;
            tree = left;
            left = match self.nodes[left].left {
                Some(l) => l,
                None => return,
            };
            rank += 1;
        }

        // `left` is the parent. A root just takes the lowered rank.
        if self.is_root(left) {
            self.nodes[left].rank = rank;
            return;
        }

        // A parent that was thick merely becomes thin; nothing to update.
        if self.nodes[left].rank == rank + 1 {
            return;
        }

        // The parent was already thin: cut it too and drop its rank.
        self.cut_and_move_to_root(left);
        self.nodes[left].rank = rank;
    }

    /// Merges a detached tree into the rank buckets, linking equal-rank
    /// trees (ties go to the bucket occupant) until its slot is free.
    fn merge_root(&mut self, by_rank: &mut Vec<Option<NodeKey>>, root: NodeKey) {
        let mut root = root;
        let mut rank = self.nodes[root].rank as usize;
        loop {
            if by_rank.len() <= rank {
                by_rank.resize(rank + 1, None);
            }
            match by_rank[rank].take() {
                None => {
                    by_rank[rank] = Some(root);
                    return;
                }
                Some(other) => {
                    // The merged root has a higher rank.
                    root = if self.nodes[root].key < self.nodes[other].key {
                        self.add_child(root, other);
                        root
                    } else {
                        self.add_child(other, root);
                        other
                    };
                    rank += 1;
                }
            }
        }
    }
}

impl<K: Ord> Heap<K> for ThinHeap<K> {
    fn new() -> Self {
        ThinHeap {
            nodes: SlotMap::with_key(),
            min_root: None,
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
            rank: 0,
            child: None,
            left: None,
            right: None,
        });
        self.index.insert(id, node);

        if self
            .min_root
            .map_or(true, |m| self.nodes[node].key < self.nodes[m].key)
        {
            self.min_root = Some(node);
        }
        self.nodes[node].right = self.root;
        self.root = Some(node);
    }

    fn peek(&self) -> Option<(&K, ElementId)> {
        let min = self.min_root?;
        let node = &self.nodes[min];
        Some((&node.key, node.id))
    }

    fn pop(&mut self) -> Option<(K, ElementId)> {
        let min = self.min_root?;

        // Merge every root except the min into the rank buckets.
        let mut by_rank: Vec<Option<NodeKey>> = Vec::new();
        let mut tree = self.root;
        while let Some(t) = tree {
            let next = self.nodes[t].right.take();
            if t != min {
                self.merge_root(&mut by_rank, t);
            }
            tree = next;
        }

        // The min root's children become roots: clean them up, thick-ify,
        // and merge them in as well.
        let mut child = self.nodes[min].child.take();
        while let Some(c) = child {
            let next = self.nodes[c].right.take();
            self.nodes[c].left = None;
            self.make_thick(c);
            self.merge_root(&mut by_rank, c);
            child = next;
        }

        // Relink the surviving roots, tracking the new minimum.
        self.min_root = None;
        self.root = None;
        for slot in by_rank {
            if let Some(t) = slot {
                if self
                    .min_root
                    .map_or(true, |m| self.nodes[t].key < self.nodes[m].key)
                {
                    self.min_root = Some(t);
                }
                self.nodes[t].right = self.root;
                self.root = Some(t);
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

        if !self.is_root(node) {
            self.cut_and_move_to_root(node);
        }
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
        let mut seen = 0usize;
        let min = self.min_root;

        let mut root = self.root;
        while let Some(r) = root {
            assert!(self.is_root(r), "root list node has a left link");
            if let Some(m) = min {
                assert!(
                    !(self.nodes[r].key < self.nodes[m].key),
                    "min pointer is not the minimum root"
                );
            }

            let mut stack = vec![r];
            while let Some(n) = stack.pop() {
                seen += 1;
                let node = &self.nodes[n];
                assert_eq!(self.index.get(&node.id), Some(&n), "id index out of sync");

                if let Some(first) = node.child {
                    assert_eq!(self.nodes[first].left, Some(n));
                    let first_rank = self.nodes[first].rank as i64;
                    let rank = node.rank as i64;
                    assert!(
                        first_rank == rank - 1 || first_rank == rank - 2,
                        "node is neither thick nor thin"
                    );

                    // Sibling ranks step down by exactly one.
                    let mut expected = first_rank;
                    let mut child = Some(first);
                    while let Some(c) = child {
                        let child_node = &self.nodes[c];
                        assert!(child_node.left.is_some(), "child looks like a root");
                        assert_eq!(child_node.rank as i64, expected);
                        assert!(
                            !(child_node.key < node.key),
                            "heap order violated under id {}",
                            node.id
                        );
                        if let Some(right) = child_node.right {
                            assert_eq!(self.nodes[right].left, Some(c));
                        }
                        stack.push(c);
                        expected -= 1;
                        child = child_node.right;
                    }
                    assert_eq!(expected, -1, "child ranks do not run down to zero");
                } else {
                    assert!(node.rank <= 1, "childless node with rank > 1");
                }
            }

            root = self.nodes[r].right;
        }

        assert_eq!(seen, self.index.len(), "some ids are missing from the forest");
        assert_eq!(self.nodes.len(), self.index.len());
    }
}

impl<K: Ord> Default for ThinHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders one tree per root; the min root is flagged.
impl<K: Ord + fmt::Debug> fmt::Debug for ThinHeap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ThinHeap({})", self.len())?;
        let mut root = self.root;
        while let Some(r) = root {
            if Some(r) == self.min_root {
                write!(f, "Min ")?;
            }
            writeln!(f, "Tree #{}", self.nodes[r].rank)?;
            let mut stack = vec![(r, 1usize)];
            while let Some((n, level)) = stack.pop() {
                for _ in 0..level {
                    write!(f, "| ")?;
                }
                let node = &self.nodes[n];
                writeln!(f, "{:?} [id:{}][rank:{}]", node.key, node.id, node.rank)?;

                let mut children = Vec::new();
                let mut child = node.child;
                while let Some(c) = child {
                    children.push(c);
                    child = self.nodes[c].right;
                }
                for &c in children.iter().rev() {
                    stack.push((c, level + 1));
                }
            }
            root = self.nodes[r].right;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_in_order() {
        let mut heap = ThinHeap::new();
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
    fn decrease_deep_node_repairs_ranks() {
        let mut heap = ThinHeap::new();
        for id in 0..64usize {
            heap.push(id as i32, id);
        }
        // Consolidate into larger trees so cuts have siblings to repair.
        assert_eq!(heap.pop(), Some((0, 0)));
        heap.validate();

        for id in (32..64usize).rev() {
            heap.decrease_key(id, -(id as i32)).unwrap();
            heap.validate();
        }
        assert_eq!(heap.peek(), Some((&-63, 63)));

        let mut last = i32::MIN;
        while let Some((key, _)) = heap.pop() {
            heap.validate();
            assert!(key >= last);
            last = key;
        }
    }

    #[test]
    fn pop_consolidates_by_rank() {
        let mut heap = ThinHeap::new();
        for id in 0..17usize {
            heap.push(100 - id as i32, id);
        }
        assert_eq!(heap.pop(), Some((84, 16)));
        heap.validate();

        // All remaining roots have distinct ranks after consolidation.
        let mut ranks = Vec::new();
        let mut root = heap.root;
        while let Some(r) = root {
            ranks.push(heap.nodes[r].rank);
            root = heap.nodes[r].right;
        }
        let mut unique = ranks.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), ranks.len());
    }

    #[test]
    fn single_element_round_trip() {
        let mut heap = ThinHeap::new();
        heap.push(5, 3);
        assert_eq!(heap.get(3), Some(&5));
        assert_eq!(heap.pop(), Some((5, 3)));
        assert!(heap.is_empty());
        assert_eq!(heap.get(3), None);
        heap.validate();
    }
}
