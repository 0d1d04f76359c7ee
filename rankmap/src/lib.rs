//! # rankmap
//!
//! A persistent (immutable) ordered map with per-node weights and O(log N)
//! rank queries.
//!
//! Every mutating operation returns a *new* map that shares all unchanged
//! subtrees with its input, so a reference to a map is a stable snapshot:
//! traversals and lookups on it are never affected by later mutations, and no
//! locking is needed to read one. Only the O(log N) spine touched by a
//! mutation is recreated.
//!
//! Each entry carries a caller-chosen `u64` **node weight**; every node
//! caches the weight sum of its subtree. That turns "how much weight sits
//! strictly left (or right) of this key" into an O(log N) descent, and lets
//! in-order traversal hand the visitor running weight totals for free.
//!
//! Balance is maintained with the four standard AVL rotations.
//!
//! ## Example
//!
//! ```rust
//! use rankmap::WeightedAvlMap;
//!
//! let v0: WeightedAvlMap<u64, &str> = WeightedAvlMap::new();
//! let v1 = v0.put(10, 1, "ten");
//! let v2 = v1.put(20, 1, "twenty");
//!
//! // v1 is a snapshot: it never saw key 20.
//! assert_eq!(v1.get(&20), None);
//! assert_eq!(v2.get(&20), Some(&"twenty"));
//! assert_eq!(v2.left_weight(&20), Some(1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

use std::cmp::Ordering;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

#[cfg(test)]
mod proptests;

type Link<K, V> = Option<Arc<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    node_weight: u64,
    /// Height of the subtree rooted here. An AVL tree of u8::MAX levels
    /// would need more nodes than fit in memory.
    height: u8,
    /// node_weight + weight of both child subtrees.
    total_weight: u64,
    left: Link<K, V>,
    right: Link<K, V>,
}

#[inline]
fn height_of<K, V>(link: &Link<K, V>) -> u8 {
    link.as_ref().map_or(0, |n| n.height)
}

#[inline]
fn weight_of<K, V>(link: &Link<K, V>) -> u64 {
    link.as_ref().map_or(0, |n| n.total_weight)
}

#[inline]
fn same_node<K, V>(a: &Link<K, V>, b: &Link<K, V>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

impl<K: Ord, V> Node<K, V> {
    /// Plain constructor: computes the caches, performs no rebalancing.
    fn new(key: K, value: V, node_weight: u64, left: Link<K, V>, right: Link<K, V>) -> Self {
        debug_assert!(left.as_ref().map_or(true, |l| l.key < key));
        debug_assert!(right.as_ref().map_or(true, |r| r.key > key));
        let height = height_of(&left).max(height_of(&right)) + 1;
        let total_weight = node_weight + weight_of(&left) + weight_of(&right);
        Node {
            key,
            value,
            node_weight,
            height,
            total_weight,
            left,
            right,
        }
    }

    /// Left height minus right height.
    #[inline]
    fn balance(&self) -> i16 {
        i16::from(height_of(&self.left)) - i16::from(height_of(&self.right))
    }
}

impl<K: Ord + Clone, V: Clone> Node<K, V> {
    #[inline]
    fn leaf(key: K, node_weight: u64, value: V) -> Arc<Self> {
        Arc::new(Node::new(key, value, node_weight, None, None))
    }

    /// The only way nodes with children are created: construct, then
    /// rebalance. Everything downstream of this sees an AVL-valid subtree.
    fn build(key: K, value: V, node_weight: u64, left: Link<K, V>, right: Link<K, V>) -> Arc<Self> {
        let node = Self::rebalance(Node::new(key, value, node_weight, left, right));
        debug_assert!((-1..=1).contains(&node.balance()));
        node
    }

    fn rebalance(node: Self) -> Arc<Self> {
        let balance = node.balance();
        if (-1..=1).contains(&balance) {
            return Arc::new(node);
        }
        if balance > 1 {
            let heavy = node.left.as_deref().expect("left-heavy node without a left child");
            if heavy.balance() < 0 {
                Self::rotate_left_right(node)
            } else {
                Self::rotate_right(node)
            }
        } else {
            let heavy = node.right.as_deref().expect("right-heavy node without a right child");
            if heavy.balance() > 0 {
                Self::rotate_right_left(node)
            } else {
                Self::rotate_left(node)
            }
        }
    }

    /// LL case: the left child becomes the new subtree root.
    fn rotate_right(node: Self) -> Arc<Self> {
        let Node {
            key,
            value,
            node_weight,
            left,
            right,
            ..
        } = node;
        let pivot = left.expect("rotation without a left child");
        let lowered = Self::build(key, value, node_weight, pivot.right.clone(), right);
        Self::build(
            pivot.key.clone(),
            pivot.value.clone(),
            pivot.node_weight,
            pivot.left.clone(),
            Some(lowered),
        )
    }

    /// RR case: the right child becomes the new subtree root.
    fn rotate_left(node: Self) -> Arc<Self> {
        let Node {
            key,
            value,
            node_weight,
            left,
            right,
            ..
        } = node;
        let pivot = right.expect("rotation without a right child");
        let lowered = Self::build(key, value, node_weight, left, pivot.left.clone());
        Self::build(
            pivot.key.clone(),
            pivot.value.clone(),
            pivot.node_weight,
            Some(lowered),
            pivot.right.clone(),
        )
    }

    /// LR case: the left child's right child becomes the new subtree root.
    fn rotate_left_right(node: Self) -> Arc<Self> {
        let Node {
            key,
            value,
            node_weight,
            left,
            right,
            ..
        } = node;
        let child = left.expect("double rotation without a left child");
        let pivot = child.right.clone().expect("left-right rotation without a grandchild");
        let low = Self::build(
            child.key.clone(),
            child.value.clone(),
            child.node_weight,
            child.left.clone(),
            pivot.left.clone(),
        );
        let high = Self::build(key, value, node_weight, pivot.right.clone(), right);
        Self::build(
            pivot.key.clone(),
            pivot.value.clone(),
            pivot.node_weight,
            Some(low),
            Some(high),
        )
    }

    /// RL case: the right child's left child becomes the new subtree root.
    fn rotate_right_left(node: Self) -> Arc<Self> {
        let Node {
            key,
            value,
            node_weight,
            left,
            right,
            ..
        } = node;
        let child = right.expect("double rotation without a right child");
        let pivot = child.left.clone().expect("right-left rotation without a grandchild");
        let low = Self::build(key, value, node_weight, left, pivot.left.clone());
        let high = Self::build(
            child.key.clone(),
            child.value.clone(),
            child.node_weight,
            pivot.right.clone(),
            child.right.clone(),
        );
        Self::build(
            pivot.key.clone(),
            pivot.value.clone(),
            pivot.node_weight,
            Some(low),
            Some(high),
        )
    }

    /// Copy-on-write: reuses `node` itself when both children are unchanged.
    fn with_children(node: &Arc<Self>, left: Link<K, V>, right: Link<K, V>) -> Arc<Self> {
        if same_node(&node.left, &left) && same_node(&node.right, &right) {
            return Arc::clone(node);
        }
        Self::build(
            node.key.clone(),
            node.value.clone(),
            node.node_weight,
            left,
            right,
        )
    }

    /// Inserts `key` below `node`. The caller guarantees `key` is absent, so
    /// equal keys route right and never match.
    fn put(node: &Arc<Self>, key: K, node_weight: u64, value: V) -> Arc<Self> {
        if key < node.key {
            let left = match &node.left {
                None => Self::leaf(key, node_weight, value),
                Some(l) => Self::put(l, key, node_weight, value),
            };
            Self::with_children(node, Some(left), node.right.clone())
        } else {
            let right = match &node.right {
                None => Self::leaf(key, node_weight, value),
                Some(r) => Self::put(r, key, node_weight, value),
            };
            Self::with_children(node, node.left.clone(), Some(right))
        }
    }

    /// Removes `key` from the subtree. Returns the (possibly empty) new
    /// subtree; if `key` is absent the original node is returned by
    /// reference so the caller can detect the no-op.
    fn remove(node: &Arc<Self>, key: &K) -> Link<K, V> {
        match key.cmp(&node.key) {
            Ordering::Less => match &node.left {
                None => Some(Arc::clone(node)),
                Some(l) => Some(Self::with_children(node, Self::remove(l, key), node.right.clone())),
            },
            Ordering::Greater => match &node.right {
                None => Some(Arc::clone(node)),
                Some(r) => Some(Self::with_children(node, node.left.clone(), Self::remove(r, key))),
            },
            Ordering::Equal => match (&node.left, &node.right) {
                (None, right) => right.clone(),
                (left, None) => left.clone(),
                (Some(left), Some(right)) => {
                    // Re-root at the in-order neighbour taken from the taller
                    // child so the replacement cannot worsen the imbalance.
                    // Ties go right.
                    Some(if right.height >= left.height {
                        let (successor, rest) = Self::extract_min(right);
                        Self::build(
                            successor.key.clone(),
                            successor.value.clone(),
                            successor.node_weight,
                            node.left.clone(),
                            rest,
                        )
                    } else {
                        let (predecessor, rest) = Self::extract_max(left);
                        Self::build(
                            predecessor.key.clone(),
                            predecessor.value.clone(),
                            predecessor.node_weight,
                            rest,
                            node.right.clone(),
                        )
                    })
                }
            },
        }
    }

    /// Detaches the leftmost node, returning it together with the rebalanced
    /// remainder of the subtree.
    fn extract_min(node: &Arc<Self>) -> (Arc<Self>, Link<K, V>) {
        match &node.left {
            None => (Arc::clone(node), node.right.clone()),
            Some(l) => {
                let (min, rest) = Self::extract_min(l);
                (min, Some(Self::with_children(node, rest, node.right.clone())))
            }
        }
    }

    /// Detaches the rightmost node, returning it together with the rebalanced
    /// remainder of the subtree.
    fn extract_max(node: &Arc<Self>) -> (Arc<Self>, Link<K, V>) {
        match &node.right {
            None => (Arc::clone(node), node.left.clone()),
            Some(r) => {
                let (max, rest) = Self::extract_max(r);
                (max, Some(Self::with_children(node, node.left.clone(), rest)))
            }
        }
    }
}

impl<K, V> Node<K, V> {
    /// In-order walk. `outside_left`/`outside_right` are the weight totals of
    /// everything outside this subtree on each side, so the visitor always
    /// sees whole-tree accumulators.
    fn walk<F>(&self, outside_left: u64, outside_right: u64, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V, u64, u64, u64) -> ControlFlow<()>,
    {
        if let Some(left) = &self.left {
            left.walk(
                outside_left,
                outside_right + self.node_weight + weight_of(&self.right),
                visit,
            )?;
        }
        visit(
            &self.key,
            &self.value,
            outside_left + weight_of(&self.left),
            self.node_weight,
            outside_right + weight_of(&self.right),
        )?;
        if let Some(right) = &self.right {
            right.walk(
                outside_left + self.node_weight + weight_of(&self.left),
                outside_right,
                visit,
            )?;
        }
        ControlFlow::Continue(())
    }

    /// Reverse in-order walk; the visitor tuple means the same as in `walk`.
    fn walk_reverse<F>(&self, outside_left: u64, outside_right: u64, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V, u64, u64, u64) -> ControlFlow<()>,
    {
        if let Some(right) = &self.right {
            right.walk_reverse(
                outside_left + self.node_weight + weight_of(&self.left),
                outside_right,
                visit,
            )?;
        }
        visit(
            &self.key,
            &self.value,
            outside_left + weight_of(&self.left),
            self.node_weight,
            outside_right + weight_of(&self.right),
        )?;
        if let Some(left) = &self.left {
            left.walk_reverse(
                outside_left,
                outside_right + self.node_weight + weight_of(&self.right),
                visit,
            )?;
        }
        ControlFlow::Continue(())
    }
}

/// A persistent ordered map whose entries carry weights, supporting O(log N)
/// "total weight left/right of this key" queries.
///
/// Cloning is O(1) (a root pointer copy) and the clone is a snapshot:
/// mutations of either copy never affect the other. Mutating operations
/// require `K: Clone` and `V: Clone` to recreate the O(log N) path they
/// touch; for cheap snapshots, make `V` itself cheap to clone (unit, `u64`,
/// or another `WeightedAvlMap`).
pub struct WeightedAvlMap<K, V> {
    root: Link<K, V>,
}

impl<K, V> WeightedAvlMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Whether the map has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The sum of all node weights, 0 for an empty map. O(1).
    #[inline]
    pub fn total_weight(&self) -> u64 {
        weight_of(&self.root)
    }

    /// Visits every entry in ascending key order.
    ///
    /// The visitor receives `(key, value, left_weight, node_weight,
    /// right_weight)`, where the left/right weights are totals over the
    /// *whole map*, not the current subtree. Returning
    /// [`ControlFlow::Break`] stops the traversal; the same value is
    /// returned to the caller so it can tell a completed walk from a stopped
    /// one.
    pub fn for_each<F>(&self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V, u64, u64, u64) -> ControlFlow<()>,
    {
        match &self.root {
            None => ControlFlow::Continue(()),
            Some(root) => root.walk(0, 0, &mut visit),
        }
    }

    /// Visits every entry in descending key order; the visitor tuple is the
    /// same as in [`WeightedAvlMap::for_each`].
    pub fn for_each_reverse<F>(&self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V, u64, u64, u64) -> ControlFlow<()>,
    {
        match &self.root {
            None => ControlFlow::Continue(()),
            Some(root) => root.walk_reverse(0, 0, &mut visit),
        }
    }
}

impl<K: Ord, V> WeightedAvlMap<K, V> {
    /// Looks up the value bound to `key`. O(log N).
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match key.cmp(&node.key) {
                Ordering::Equal => return Some(&node.value),
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
            }
        }
        None
    }

    /// Total node weight of all keys strictly less than `key`, or `None` if
    /// `key` is absent. O(log N).
    pub fn left_weight(&self, key: &K) -> Option<u64> {
        let mut accumulated = 0u64;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match key.cmp(&node.key) {
                Ordering::Equal => return Some(accumulated + weight_of(&node.left)),
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => {
                    accumulated += weight_of(&node.left) + node.node_weight;
                    current = node.right.as_deref();
                }
            }
        }
        None
    }

    /// Total node weight of all keys strictly greater than `key`, or `None`
    /// if `key` is absent. O(log N).
    pub fn right_weight(&self, key: &K) -> Option<u64> {
        let mut accumulated = 0u64;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match key.cmp(&node.key) {
                Ordering::Equal => return Some(accumulated + weight_of(&node.right)),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Less => {
                    accumulated += weight_of(&node.right) + node.node_weight;
                    current = node.left.as_deref();
                }
            }
        }
        None
    }

    /// The stored node weight at `key`, or `None` if absent. O(log N).
    pub fn node_weight(&self, key: &K) -> Option<u64> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match key.cmp(&node.key) {
                Ordering::Equal => return Some(node.node_weight),
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
            }
        }
        None
    }
}

impl<K: Ord + Clone, V: Clone> WeightedAvlMap<K, V> {
    /// Returns a new map in which `key` is bound to `value` with the given
    /// node weight.
    ///
    /// An existing binding is removed first and then the new one inserted:
    /// replace semantics, the previous value and weight are discarded. The
    /// returned map shares every untouched node with `self`. O(log N).
    pub fn put(&self, key: K, node_weight: u64, value: V) -> Self {
        let cleared = self.remove(&key);
        let root = match &cleared.root {
            None => Node::leaf(key, node_weight, value),
            Some(root) => Node::put(root, key, node_weight, value),
        };
        Self { root: Some(root) }
    }

    /// Returns a new map without the `key` entry. Removing an absent key is
    /// a no-op that returns a map sharing the same root. O(log N).
    pub fn remove(&self, key: &K) -> Self {
        let Some(root) = &self.root else {
            return self.clone();
        };
        let new_root = Node::remove(root, key);
        if same_node(&self.root, &new_root) {
            self.clone()
        } else {
            Self { root: new_root }
        }
    }
}

impl<K, V> Clone for WeightedAvlMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for WeightedAvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for WeightedAvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        let _ = self.for_each(|key, value, _, _, _| {
            map.entry(key, value);
            ControlFlow::Continue(())
        });
        map.finish()
    }
}

#[cfg(test)]
impl<K: Ord, V> WeightedAvlMap<K, V> {
    /// Recomputes every cached field from scratch and checks the AVL and BST
    /// invariants. Test-only; panics on the first violation.
    pub(crate) fn assert_invariants(&self) {
        fn check<K: Ord, V>(node: &Node<K, V>) -> (u8, u64) {
            let (left_height, left_weight) = match &node.left {
                None => (0, 0),
                Some(l) => {
                    assert!(l.key < node.key, "left child key not less than parent");
                    check(l)
                }
            };
            let (right_height, right_weight) = match &node.right {
                None => (0, 0),
                Some(r) => {
                    assert!(r.key > node.key, "right child key not greater than parent");
                    check(r)
                }
            };
            let balance = i16::from(left_height) - i16::from(right_height);
            assert!((-1..=1).contains(&balance), "balance factor {balance} out of range");
            let height = left_height.max(right_height) + 1;
            assert_eq!(node.height, height, "cached height mismatch");
            let total = node.node_weight + left_weight + right_weight;
            assert_eq!(node.total_weight, total, "cached subtree weight mismatch");
            (height, total)
        }
        if let Some(root) = &self.root {
            check(root);
        }
    }
}
