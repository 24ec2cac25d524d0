//! 2-3 heap.
//!
//! Takaoka's 2-3 heap keeps one root *trunk* per dimension. A trunk holds a
//! primary node and optionally a secondary partner of the same dimension;
//! a node of dimension k carries one child trunk at each dimension
//! 0..k-1, linked among themselves in a cyclic sibling list. Insertion
//! cascades trunk merges upward like a base-2 counter; removing an inner
//! subtree triggers a case analysis that rebalances the surrounding trunks
//! before the subtree is reinserted as a root.
//!
//! Takaoka, T. "Theory of 2-3 Heaps", COCOON 1999.

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
    /// True for the second node of a trunk. Secondaries sit outside the
    /// sibling lists; their subtree hangs off them like any other node.
    secondary: bool,
    /// The other node of this trunk, in both directions.
    partner: Option<NodeKey>,
    /// The node whose child list contains this trunk. None for root trunks
    /// (both members).
    parent: Option<NodeKey>,
    /// Highest-dimension child trunk primary.
    child: Option<NodeKey>,
    /// Cyclic sibling list; self-referential when alone.
    left: NodeKey,
    right: NodeKey,
}

/// A 2-3 min-heap addressable by element id.
pub struct TwoThreeHeap<K> {
    nodes: SlotMap<NodeKey, Node<K>>,

    /// Root trunk primary per dimension; at most one per slot.
    roots: Vec<Option<NodeKey>>,

    /// Maps each stored id to its node.
    index: FxHashMap<ElementId, NodeKey>,
}

impl<K: Ord + 'static> TwoThreeHeap<K> {
    /// A named constructor for this backend.
    pub fn factory() -> HeapFactory<K> {
        HeapFactory::new("2-3 Heap", || Box::new(TwoThreeHeap::new()))
    }
}

impl<K: Ord> TwoThreeHeap<K> {
    fn has_siblings(&self, node: NodeKey) -> bool {
        self.nodes[node].right != node
    }

    /// Attaches a detached node as the secondary partner of `primary`.
    fn attach_partner(&mut self, primary: NodeKey, partner: NodeKey) {
        debug_assert!(!self.nodes[primary].secondary);
        self.nodes[partner].partner = Some(primary);
        self.nodes[primary].partner = Some(partner);
        self.nodes[partner].parent = self.nodes[primary].parent;
        self.nodes[partner].secondary = true;
    }

    /// Detaches a secondary node from its trunk so it can be reinserted
    /// elsewhere.
    fn detach_from_trunk(&mut self, secondary: NodeKey) {
        debug_assert!(self.nodes[secondary].secondary);
        self.nodes[secondary].secondary = false;
        if let Some(primary) = self.nodes[secondary].partner.take() {
            self.nodes[primary].partner = None;
        }
        self.nodes[secondary].parent = None;
    }

    /// Adds a child trunk of the parent's current dimension, raising the
    /// parent's dimension by one. The child's partner comes along.
    fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        debug_assert!(!self.nodes[child].secondary);
        debug_assert_eq!(self.nodes[child].dimension, self.nodes[parent].dimension);

        self.nodes[parent].dimension += 1;
        self.nodes[child].parent = Some(parent);
        if let Some(partner) = self.nodes[child].partner {
            self.nodes[partner].parent = Some(parent);
        }

        if let Some(first) = self.nodes[parent].child {
            let tail = self.nodes[first].left;
            self.nodes[child].right = first;
            self.nodes[child].left = tail;
            self.nodes[tail].right = child;
            self.nodes[first].left = child;
        }
        self.nodes[parent].child = Some(child);
    }

    /// Detaches this node (the head child trunk) from its parent, lowering
    /// the parent's dimension.
    fn detach_from_parent(&mut self, node: NodeKey) {
        debug_assert!(!self.nodes[node].secondary);
        let parent = self.nodes[node].parent;

        if !self.has_siblings(node) {
            if let Some(p) = parent {
                self.nodes[p].child = None;
            }
        } else {
            let left = self.nodes[node].left;
            let right = self.nodes[node].right;
            if let Some(p) = parent {
                self.nodes[p].child = Some(right);
            }
            self.nodes[left].right = right;
            self.nodes[right].left = left;
            self.nodes[node].left = node;
            self.nodes[node].right = node;
        }

        if let Some(p) = parent {
            self.nodes[p].dimension -= 1;
        }
        self.nodes[node].parent = None;
        if let Some(partner) = self.nodes[node].partner {
            self.nodes[partner].parent = None;
        }
    }

    /// Replaces `old` with `new` in the parent's child list; `new` brings
    /// its partner, `old` keeps its own subtree and partner.
    fn replace_child(&mut self, parent: NodeKey, old: NodeKey, new: NodeKey) {
        if self.has_siblings(old) {
            let left = self.nodes[old].left;
            let right = self.nodes[old].right;
            self.nodes[new].left = left;
            self.nodes[new].right = right;
            self.nodes[left].right = new;
            self.nodes[right].left = new;
            self.nodes[old].left = old;
            self.nodes[old].right = old;
        }

        self.nodes[new].parent = Some(parent);
        if let Some(partner) = self.nodes[new].partner {
            self.nodes[partner].parent = Some(parent);
        }

        self.nodes[old].parent = None;
        if let Some(partner) = self.nodes[old].partner {
            self.nodes[partner].parent = None;
        }

        if self.nodes[parent].child == Some(old) {
            self.nodes[parent].child = Some(new);
        }
    }

    /// Swaps the roles within a trunk: the secondary becomes primary and
    /// takes over the primary's position (sibling list links, the parent's
    /// child pointer or the root slot).
    fn swap_partner(&mut self, primary: NodeKey) {
        debug_assert!(!self.nodes[primary].secondary);
        let partner = match self.nodes[primary].partner {
            Some(p) => p,
            None => return,
        };

        if self.has_siblings(primary) {
            let left = self.nodes[primary].left;
            let right = self.nodes[primary].right;
            self.nodes[partner].left = left;
            self.nodes[partner].right = right;
            self.nodes[left].right = partner;
            self.nodes[right].left = partner;
            self.nodes[primary].left = primary;
            self.nodes[primary].right = primary;
        }

        match self.nodes[primary].parent {
            Some(parent) => {
                if self.nodes[parent].child == Some(primary) {
                    self.nodes[parent].child = Some(partner);
                }
            }
            None => {
                let dim = self.nodes[primary].dimension as usize;
                if dim < self.roots.len() && self.roots[dim] == Some(primary) {
                    self.roots[dim] = Some(partner);
                }
            }
        }

        self.nodes[partner].secondary = false;
        self.nodes[primary].secondary = true;
    }

    /// Moves the partner node down to be the child of this node.
    fn switch_partner_to_child(&mut self, node: NodeKey) {
        if let Some(partner) = self.nodes[node].partner {
            self.detach_from_trunk(partner);
            self.add_child(node, partner);
        }
    }

    /// Moves the highest child up to be the partner of this node.
    fn switch_child_to_partner(&mut self, node: NodeKey) {
        debug_assert!(self.nodes[node].partner.is_none());
        if let Some(child) = self.nodes[node].child {
            self.detach_from_parent(child);
            self.attach_partner(node, child);
        }
    }

    /// Pairs two detached trees of equal dimension into a trunk, or
    /// returns `b` (the larger-keyed) as a trunk with `a`.
    fn make_trunk(&mut self, a: NodeKey, b: Option<NodeKey>) -> NodeKey {
        let b = match b {
            Some(b) => b,
            None => {
                debug_assert!(self.nodes[a].partner.is_none());
                return a;
            }
        };
        if self.nodes[b].key < self.nodes[a].key {
            self.attach_partner(b, a);
            b
        } else {
            self.attach_partner(a, b);
            a
        }
    }

    /// Merges two detached trees of dimension d. Returns
    /// `(same_dimension, carry)`: a d-dimension trunk, a (d+1)-dimension
    /// carry, or one of each, depending on which inputs had partners.
    fn merge_trees(&mut self, a: NodeKey, b: NodeKey) -> (Option<NodeKey>, Option<NodeKey>) {
        debug_assert!(!self.has_siblings(a));
        debug_assert!(!self.has_siblings(b));
        debug_assert_eq!(self.nodes[a].dimension, self.nodes[b].dimension);

        let (a, b) = if self.nodes[b].key < self.nodes[a].key {
            (b, a)
        } else {
            (a, b)
        };

        self.nodes[a].parent = None;
        let a_partner = self.nodes[a].partner;
        let b_partner = self.nodes[b].partner;

        match (a_partner, b_partner) {
            // Pair two lone trees into one trunk.
            (None, None) => {
                self.attach_partner(a, b);
                (Some(a), None)
            }
            // A lone tree swallows a full trunk as its child: carry.
            (None, Some(_)) => {
                self.add_child(a, b);
                (None, Some(a))
            }
            // Full trunk + lone tree: the partner and the lone tree form
            // the child trunk of the carry.
            (Some(ap), None) => {
                self.detach_from_trunk(ap);
                if self.nodes[ap].key < self.nodes[b].key {
                    self.attach_partner(ap, b);
                    self.add_child(a, ap);
                } else {
                    self.attach_partner(b, ap);
                    self.add_child(a, b);
                }
                (None, Some(a))
            }
            // Two full trunks: carry plus a leftover same-dimension tree.
            (Some(ap), Some(_)) => {
                self.detach_from_trunk(ap);
                self.add_child(a, b);
                (Some(ap), Some(a))
            }
        }
    }

    /// Stores a detached tree in its dimension's root slot.
    fn set_root(&mut self, root: NodeKey) {
        let dim = self.nodes[root].dimension as usize;
        if self.roots.len() <= dim {
            self.roots.resize(dim + 1, None);
        }
        self.roots[dim] = Some(root);
        self.nodes[root].parent = None;
        if let Some(partner) = self.nodes[root].partner {
            self.nodes[partner].parent = None;
        }
    }

    fn clear_root(&mut self, dim: u32) {
        let dim = dim as usize;
        if dim < self.roots.len() {
            self.roots[dim] = None;
        }
    }

    /// Inserts a detached tree into the root structure, cascading merges
    /// upward like a base-2 counter when dimensions collide.
    fn insert_root(&mut self, tree: NodeKey) {
        let mut tree = tree;
        loop {
            debug_assert!(self.nodes[tree].parent.is_none());
            debug_assert!(!self.has_siblings(tree));

            let dim = self.nodes[tree].dimension as usize;
            if self.roots.len() <= dim {
                self.roots.resize(dim + 1, None);
            }
            let root = match self.roots[dim].take() {
                None => {
                    self.set_root(tree);
                    return;
                }
                Some(root) => root,
            };

            let (same, carry) = self.merge_trees(root, tree);
            if let Some(s) = same {
                self.set_root(s);
            }
            match carry {
                Some(c) => tree = c,
                None => return,
            }
        }
    }

    /// The root with the minimum key, scanning every dimension slot.
    fn min_root(&self) -> Option<NodeKey> {
        let mut min: Option<NodeKey> = None;
        for root in self.roots.iter().flatten() {
            let smaller = match min {
                None => true,
                Some(m) => self.nodes[*root].key < self.nodes[m].key,
            };
            if smaller {
                min = Some(*root);
            }
        }
        min
    }

    /// Removes a subtree from the heap, rebalancing the surrounding trunks
    /// so that every non-root keeps a correct trunk at every lower
    /// dimension. The subtree comes out detached, ready for
    /// [`TwoThreeHeap::insert_root`].
    fn remove_tree(&mut self, tree: NodeKey) {
        let dim = self.nodes[tree].dimension;

        // The trunk has two nodes: take this one out of the trunk.
        if let Some(partner) = self.nodes[tree].partner {
            if self.nodes[partner].secondary {
                self.swap_partner(tree);
            }
            self.detach_from_trunk(tree);
            return;
        }

        let parent = match self.nodes[tree].parent {
            Some(p) => p,
            None => {
                // A lone root: clear the slot.
                self.clear_root(dim);
                self.detach_from_parent(tree);
                return;
            }
        };

        // The parent's own trunk has a partner at this dimension: reorder
        // the trunk nodes to fill the hole.
        if let Some(pp) = self.nodes[parent].partner {
            if self.nodes[pp].dimension == dim {
                if let Some(pp_child) = self.nodes[pp].child {
                    if self.nodes[pp_child].partner.is_some() {
                        self.detach_from_parent(tree);
                        debug_assert_eq!(self.nodes[parent].dimension, dim);

                        // Convert the pp_child trunk into parent and child.
                        self.detach_from_parent(pp_child);
                        self.switch_partner_to_child(pp_child);

                        // Convert the [parent, pp] trunk the same way.
                        if self.nodes[parent].secondary {
                            self.switch_partner_to_child(pp);
                            self.attach_partner(pp, pp_child);
                        } else {
                            self.switch_partner_to_child(parent);
                            self.attach_partner(parent, pp_child);
                        }
                        return;
                    }

                    // Make pp the primary of a rebuilt trunk.
                    if self.nodes[pp].secondary {
                        self.detach_from_trunk(pp);
                        self.switch_child_to_partner(pp);
                        self.replace_child(parent, tree, pp);
                    } else {
                        self.detach_from_parent(tree);
                        self.detach_from_trunk(parent);
                        self.attach_partner(pp_child, parent);
                        if self.nodes[parent].key < self.nodes[pp_child].key {
                            self.swap_partner(pp_child);
                        }
                    }
                    return;
                }
            }
        }

        let left = self.nodes[tree].left;

        // The left sibling is one dimension up: extract a replacement
        // child from it (or its partner).
        if self.nodes[left].dimension == dim + 1 {
            let lp = self.nodes[left].partner;

            if let Some(left_child) = self.nodes[left].child {
                if self.nodes[left_child].partner.is_some() {
                    // Convert the left_child trunk into parent and child,
                    // pair it with lp, and shift `left` into the hole.
                    self.detach_from_parent(left_child);
                    self.switch_partner_to_child(left_child);

                    if let Some(lp) = lp {
                        self.detach_from_trunk(lp);
                    }
                    let trunk = self.make_trunk(left_child, lp);
                    self.replace_child(parent, left, trunk);
                    self.replace_child(parent, tree, left);
                    return;
                }
            }

            if let Some(lp) = lp {
                if let Some(lp_child) = self.nodes[lp].child {
                    if self.nodes[lp_child].partner.is_some() {
                        // Promote lp_child's partner into its child list,
                        // move lp_child up as left's partner, and put lp
                        // into the hole.
                        self.detach_from_parent(lp_child);
                        self.switch_partner_to_child(lp_child);

                        self.detach_from_trunk(lp);
                        self.attach_partner(left, lp_child);
                        self.replace_child(parent, tree, lp);
                        return;
                    }
                }

                self.detach_from_trunk(lp);
                self.switch_child_to_partner(lp);
                self.replace_child(parent, tree, lp);
                return;
            }

            // No partner to borrow from: shrink `left` into a trunk of its
            // own child and move it into the hole.
            self.remove_tree(left);
            self.switch_child_to_partner(left);
            self.replace_child(parent, tree, left);
            return;
        }

        // Fallback: pull the parent out, detach, and reinsert the parent
        // as a root.
        debug_assert!(self.nodes[tree].partner.is_none());
        self.remove_tree(parent);
        self.detach_from_parent(tree);
        self.insert_root(parent);
    }

    fn validate_node(&self, n: NodeKey, seen: &mut usize) {
        *seen += 1;
        let node = &self.nodes[n];
        assert_eq!(self.index.get(&node.id), Some(&n), "id index out of sync");

        if node.partner.is_none() {
            assert!(!node.secondary, "secondary without a partner");
        }
        if node.secondary {
            assert_eq!(node.right, n, "secondary inside a sibling list");
            assert_eq!(node.left, n, "secondary inside a sibling list");
        }

        if !node.secondary {
            if let Some(partner) = node.partner {
                let partner_node = &self.nodes[partner];
                assert!(
                    !(partner_node.key < node.key),
                    "trunk order violated at id {}",
                    node.id
                );
                assert_eq!(partner_node.partner, Some(n));
                assert_eq!(partner_node.parent, node.parent);
                assert_eq!(partner_node.dimension, node.dimension);
                assert!(partner_node.secondary);
                self.validate_node(partner, seen);
            }
        }

        if node.dimension > 0 {
            let first = match node.child {
                Some(c) => c,
                None => panic!("missing child trunk at id {}", node.id),
            };
            let mut c = first;
            let mut child_dim = node.dimension as i64 - 1;
            loop {
                assert!(child_dim >= 0, "too many child trunks at id {}", node.id);

                let child_node = &self.nodes[c];
                assert!(
                    !(child_node.key < node.key),
                    "heap order violated under id {}",
                    node.id
                );
                assert!(!child_node.secondary);
                assert_eq!(child_node.dimension as i64, child_dim);
                assert_eq!(self.nodes[child_node.right].left, c);
                assert_eq!(child_node.parent, Some(n));
                self.validate_node(c, seen);

                c = child_node.right;
                child_dim -= 1;
                if c == first {
                    break;
                }
            }
            assert_eq!(child_dim, -1, "missing child trunks at id {}", node.id);
        }
    }
}

impl<K: Ord> Heap<K> for TwoThreeHeap<K> {
    fn new() -> Self {
        TwoThreeHeap {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
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
            dimension: 0,
            secondary: false,
            partner: None,
            parent: None,
            child: None,
            left: k,
            right: k,
        });
        self.index.insert(id, node);
        self.insert_root(node);
    }

    fn peek(&self) -> Option<(&K, ElementId)> {
        let min = self.min_root()?;
        let node = &self.nodes[min];
        Some((&node.key, node.id))
    }

    fn pop(&mut self) -> Option<(K, ElementId)> {
        let min = self.min_root()?;

        // The partner, if any, takes over this dimension's slot.
        if let Some(partner) = self.nodes[min].partner {
            self.detach_from_trunk(partner);
            self.set_root(partner);
        } else {
            self.clear_root(self.nodes[min].dimension);
        }

        // Reinsert every child as a fresh root; the base-2 cascade keeps
        // one trunk per dimension.
        while let Some(child) = self.nodes[min].child {
            self.detach_from_parent(child);
            self.insert_root(child);
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

        // Reparent only when the node undercuts its parent; otherwise the
        // trunk may merely need its members swapped.
        let needs_reparent = match self.nodes[node].parent {
            Some(parent) => self.nodes[node].key < self.nodes[parent].key,
            None => false,
        };

        if !needs_reparent {
            if self.nodes[node].secondary {
                if let Some(primary) = self.nodes[node].partner {
                    if self.nodes[node].key < self.nodes[primary].key {
                        self.swap_partner(primary);
                    }
                }
            }
            return Ok(());
        }

        self.remove_tree(node);

        debug_assert!(self.nodes[node].parent.is_none());
        debug_assert!(!self.has_siblings(node));

        self.insert_root(node);
        Ok(())
    }

    fn get(&self, id: ElementId) -> Option<&K> {
        self.index.get(&id).map(|&node| &self.nodes[node].key)
    }

    fn validate(&self) {
        let mut seen = 0usize;
        for (dim, slot) in self.roots.iter().enumerate() {
            if let Some(root) = *slot {
                let node = &self.nodes[root];
                assert!(node.parent.is_none(), "root with a parent");
                assert!(!node.secondary, "root slot holds a secondary");
                assert_eq!(node.dimension as usize, dim, "root in the wrong slot");
                assert!(!self.has_siblings(root), "root with siblings");
                self.validate_node(root, &mut seen);
            }
        }
        assert_eq!(seen, self.index.len(), "some ids are missing from the forest");
        assert_eq!(self.nodes.len(), self.index.len());
    }
}

impl<K: Ord> Default for TwoThreeHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders one tree per root dimension; trunk secondaries print at the
/// same level as their primary, tagged `[2nd]`.
impl<K: Ord + fmt::Debug> fmt::Debug for TwoThreeHeap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TwoThreeHeap({})", self.len())?;
        for slot in self.roots.iter().flatten() {
            writeln!(f, "Tree #{}", self.nodes[*slot].dimension)?;
            let mut stack = vec![(*slot, 1usize)];
            while let Some((n, level)) = stack.pop() {
                for _ in 0..level {
                    write!(f, "| ")?;
                }
                let node = &self.nodes[n];
                write!(f, "{:?} [id:{}][dim:{}]", node.key, node.id, node.dimension)?;
                if node.secondary {
                    write!(f, "[2nd]")?;
                }
                writeln!(f)?;

                // The partner renders at the same level, right below.
                let mut children = Vec::new();
                if let Some(first) = node.child {
                    let mut c = first;
                    loop {
                        children.push((c, level + 1));
                        c = self.nodes[c].right;
                        if c == first {
                            break;
                        }
                    }
                }
                for &entry in children.iter().rev() {
                    stack.push(entry);
                }
                if !node.secondary {
                    if let Some(partner) = node.partner {
                        stack.push((partner, level));
                    }
                }
            }
        }
        Ok(())
    }
}
