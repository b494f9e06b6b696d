use std::cmp::Ordering;
use std::fmt;
use std::iter::FromIterator;

use crate::error::NotFound;

type Link<T> = Option<Box<Node<T>>>;

/// Single element of the tree. Children are exclusively owned, there are no
/// parent pointers.
struct Node<T> {
    key: T,
    left: Link<T>,
    right: Link<T>,
}

impl<T> Node<T> {
    fn new(key: T) -> Node<T> {
        Node {
            key,
            left: None,
            right: None,
        }
    }
}

/// An ordered set of unique keys backed by an unbalanced binary search tree.
///
/// For every node, all keys in the left subtree compare strictly less than
/// the node's key and all keys in the right subtree strictly greater, so no
/// duplicate key is ever stored. The tree is deliberately not rebalanced:
/// operations are O(height), worst case O(n).
///
/// Duplicate insertion is a normal outcome reported through the returned
/// bool. A remove of an absent key fails with [`NotFound`] so callers can
/// count failed removals separately from successful ones.
pub struct BstSet<T: Ord> {
    root: Link<T>,
    len: usize,
}

impl<T: Ord> BstSet<T> {
    pub fn new() -> BstSet<T> {
        BstSet { root: None, len: 0 }
    }

    /// Number of keys currently stored. Maintained on successful
    /// insert/remove, never recomputed by walking the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree in nodes, 0 for the empty tree. Unbounded: no
    /// balancing is performed.
    pub fn height(&self) -> usize {
        fn walk<T>(link: &Link<T>) -> usize {
            match link {
                None => 0,
                Some(node) => 1 + walk(&node.left).max(walk(&node.right)),
            }
        }
        walk(&self.root)
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Adds `key` to the set. Returns true if a new node was placed, false
    /// if the key was already present; the tree is only mutated on success.
    pub fn insert(&mut self, key: T) -> bool {
        if Self::insert_at(&mut self.root, key) {
            self.len += 1;
            true
        } else {
            false
        }
    }

    fn insert_at(link: &mut Link<T>, key: T) -> bool {
        match link {
            None => {
                *link = Some(Box::new(Node::new(key)));
                true
            }
            Some(node) => match key.cmp(&node.key) {
                Ordering::Less => Self::insert_at(&mut node.left, key),
                Ordering::Greater => Self::insert_at(&mut node.right, key),
                Ordering::Equal => false,
            },
        }
    }

    /// Removes `key` from the set. Fails with [`NotFound`] and leaves the
    /// tree untouched when the key is absent.
    pub fn remove(&mut self, key: &T) -> Result<(), NotFound> {
        Self::remove_at(&mut self.root, key)?;
        self.len -= 1;
        Ok(())
    }

    fn remove_at(link: &mut Link<T>, key: &T) -> Result<(), NotFound> {
        let node = match link {
            None => return Err(NotFound),
            Some(node) => node,
        };
        match key.cmp(&node.key) {
            Ordering::Less => Self::remove_at(&mut node.left, key),
            Ordering::Greater => Self::remove_at(&mut node.right, key),
            Ordering::Equal => {
                match (node.left.take(), node.right.take()) {
                    (None, None) => *link = None,
                    (Some(child), None) | (None, Some(child)) => *link = Some(child),
                    (Some(left), Some(right)) => {
                        // Two children: the in-order successor (minimum of
                        // the right subtree) takes this node's place.
                        let (succ, rest) = Self::detach_min(right);
                        node.key = succ;
                        node.left = Some(left);
                        node.right = rest;
                    }
                }
                Ok(())
            }
        }
    }

    // Detaches the minimum key of a subtree, returning it together with what
    // remains of the subtree. The minimum has no left child, so unlinking it
    // never cascades.
    fn detach_min(mut node: Box<Node<T>>) -> (T, Link<T>) {
        match node.left.take() {
            None => {
                let unboxed = *node;
                (unboxed.key, unboxed.right)
            }
            Some(left) => {
                let (min, rest) = Self::detach_min(left);
                node.left = rest;
                (min, Some(node))
            }
        }
    }

    /// Pure membership test, same descent as insert, no mutation.
    pub fn contains(&self, key: &T) -> bool {
        let mut cur = &self.root;
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = &node.left,
                Ordering::Greater => cur = &node.right,
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// In-order iterator over the stored keys, ascending.
    pub fn iter(&self) -> Iter<T> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(&self.root);
        iter
    }
}

impl<T: Ord> Default for BstSet<T> {
    fn default() -> Self {
        BstSet::new()
    }
}

impl<T: Ord> FromIterator<T> for BstSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = BstSet::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord> Extend<T> for BstSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for BstSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T> Iter<'a, T> {
    fn push_left_spine(&mut self, mut link: &'a Link<T>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = &node.left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.stack.pop()?;
        self.push_left_spine(&node.right);
        Some(&node.key)
    }
}

impl<'a, T: Ord> IntoIterator for &'a BstSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(set: &BstSet<i32>) -> Vec<i32> {
        set.iter().copied().collect()
    }

    fn in_order_strictly_increasing(set: &BstSet<i32>) -> bool {
        keys(set).windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn empty_set_behaves() {
        let mut set: BstSet<i32> = BstSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.height(), 0);
        assert!(!set.contains(&7));
        assert_eq!(set.remove(&7), Err(NotFound));
        assert!(set.is_empty());
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let mut set = BstSet::new();
        assert!(set.insert(42));
        assert!(!set.insert(42));
        assert_eq!(set.len(), 1);
        assert_eq!(keys(&set), vec![42]);
    }

    #[test]
    fn contains_tracks_membership() {
        let mut set = BstSet::new();
        for k in [50, 25, 75, 10, 30, 60, 90] {
            set.insert(k);
        }
        for k in [50, 25, 75, 10, 30, 60, 90] {
            assert!(set.contains(&k));
        }
        assert!(!set.contains(&51));
        set.remove(&30).unwrap();
        assert!(!set.contains(&30));
        assert!(set.contains(&25));
    }

    #[test]
    fn remove_miss_leaves_set_unchanged() {
        let mut set: BstSet<i32> = [5, 3, 8].iter().copied().collect();
        assert_eq!(set.remove(&99), Err(NotFound));
        assert_eq!(set.len(), 3);
        assert_eq!(keys(&set), vec![3, 5, 8]);
    }

    #[test]
    fn remove_leaf() {
        let mut set: BstSet<i32> = [50, 25, 75].iter().copied().collect();
        set.remove(&25).unwrap();
        assert_eq!(keys(&set), vec![50, 75]);
        assert!(in_order_strictly_increasing(&set));
    }

    #[test]
    fn remove_node_with_one_child() {
        // 25 has a single right child 30 that must be spliced up.
        let mut set: BstSet<i32> = [50, 25, 75, 30].iter().copied().collect();
        set.remove(&25).unwrap();
        assert_eq!(keys(&set), vec![30, 50, 75]);
        assert!(in_order_strictly_increasing(&set));
    }

    #[test]
    fn remove_node_with_two_children() {
        // 25's subtrees are each a single node.
        let mut set: BstSet<i32> = [50, 25, 75, 10, 30].iter().copied().collect();
        set.remove(&25).unwrap();
        assert_eq!(keys(&set), vec![10, 30, 50, 75]);
        assert!(in_order_strictly_increasing(&set));
    }

    #[test]
    fn remove_root_with_two_children() {
        let mut set: BstSet<i32> = [50, 25, 75, 60, 90].iter().copied().collect();
        set.remove(&50).unwrap();
        // In-order successor 60 replaces the root.
        assert_eq!(keys(&set), vec![25, 60, 75, 90]);
        assert!(in_order_strictly_increasing(&set));
    }

    #[test]
    fn remove_root_until_empty() {
        let mut set: BstSet<i32> = [2, 1, 3].iter().copied().collect();
        set.remove(&2).unwrap();
        set.remove(&3).unwrap();
        set.remove(&1).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.remove(&1), Err(NotFound));
    }

    #[test]
    fn insert_then_remove_round_trip() {
        let mut set: BstSet<i32> = [50, 25, 75].iter().copied().collect();
        let before = keys(&set);
        assert!(set.insert(60));
        set.remove(&60).unwrap();
        assert!(!set.contains(&60));
        assert_eq!(keys(&set), before);
    }

    #[test]
    fn end_to_end_scenario() {
        let mut set = BstSet::new();
        assert!(set.insert(5));
        assert!(set.insert(3));
        assert!(set.insert(8));
        assert!(!set.insert(3));
        assert_eq!(set.len(), 3);

        set.remove(&3).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(keys(&set), vec![5, 8]);

        assert_eq!(set.remove(&99), Err(NotFound));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn degenerate_chain_has_full_height() {
        let set: BstSet<u32> = (1..=100).collect();
        assert_eq!(set.len(), 100);
        assert_eq!(set.height(), 100);
        assert!(in_order_strictly_increasing(
            &set.iter().map(|&k| k as i32).collect()
        ));
    }

    #[test]
    fn randomized_against_reference() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};
        use std::collections::BTreeSet;

        let mut rng = SmallRng::seed_from_u64(7);
        let mut set = BstSet::new();
        let mut reference = BTreeSet::new();
        for _ in 0..5_000 {
            let key = rng.gen_range(0..=300);
            if rng.gen_bool(0.5) {
                assert_eq!(set.insert(key), reference.insert(key));
            } else {
                assert_eq!(set.remove(&key).is_ok(), reference.remove(&key));
            }
            assert_eq!(set.len(), reference.len());
        }
        let ours: Vec<i32> = set.iter().copied().collect();
        let theirs: Vec<i32> = reference.iter().copied().collect();
        assert_eq!(ours, theirs);
    }
}
