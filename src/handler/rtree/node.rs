use crate::geometry::BoundingSphere;
use crate::object_id::ObjectId;

/// One R-tree node: either a leaf holding object entries, or an internal
/// node holding child nodes. A tagged enum is the natural Rust shape for a
/// node that is either-one-or-the-other, rather than a single struct with a
/// `leaf` flag gating which child array is meaningful.
pub(crate) enum RTreeNode {
    Leaf { entries: Vec<(ObjectId, BoundingSphere)>, bounds: BoundingSphere },
    Internal { children: Vec<RTreeNode>, bounds: BoundingSphere },
}

impl RTreeNode {
    pub(crate) fn empty_leaf() -> Self {
        RTreeNode::Leaf { entries: Vec::new(), bounds: BoundingSphere::default() }
    }

    pub(crate) fn bounds(&self) -> BoundingSphere {
        match self {
            RTreeNode::Leaf { bounds, .. } => *bounds,
            RTreeNode::Internal { bounds, .. } => *bounds,
        }
    }

    fn set_bounds(&mut self, new_bounds: BoundingSphere) {
        match self {
            RTreeNode::Leaf { bounds, .. } => *bounds = new_bounds,
            RTreeNode::Internal { bounds, .. } => *bounds = new_bounds,
        }
    }

    fn recompute_bounds(&mut self) {
        let new_bounds = match self {
            RTreeNode::Leaf { entries, .. } => {
                entries.iter().fold(BoundingSphere::default(), |acc, (_, b)| acc.merge(b))
            }
            RTreeNode::Internal { children, .. } => {
                children.iter().fold(BoundingSphere::default(), |acc, c| acc.merge(&c.bounds()))
            }
        };
        self.set_bounds(new_bounds);
    }

    fn is_leaf(&self) -> bool {
        matches!(self, RTreeNode::Leaf { .. })
    }

    fn len(&self) -> usize {
        match self {
            RTreeNode::Leaf { entries, .. } => entries.len(),
            RTreeNode::Internal { children, .. } => children.len(),
        }
    }
}

/// The volume increase `bounds.merge(addition)` would cause over `bounds`
/// alone. Ported from `RTree_child_split_info`'s growth computation, used
/// by both `ChooseLeaf`'s descent and `PickNext`'s tie-break.
fn volume_increase(bounds: &BoundingSphere, addition: &BoundingSphere) -> f64 {
    bounds.merge(addition).volume() - bounds.volume()
}

/// Guttman's `ChooseLeaf`: descends the tree, at each internal node picking
/// the child whose bounds would grow least to accommodate `new_bounds`,
/// breaking ties by smaller resulting volume.
fn choose_leaf_path<'a>(mut node: &'a mut RTreeNode, new_bounds: &BoundingSphere) -> &'a mut RTreeNode {
    loop {
        match node {
            RTreeNode::Leaf { .. } => return node,
            RTreeNode::Internal { children, .. } => {
                let best = children
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, volume_increase(&c.bounds(), new_bounds), c.bounds().merge(new_bounds).volume()))
                    .min_by(|a, b| {
                        a.1.partial_cmp(&b.1).unwrap().then(a.2.partial_cmp(&b.2).unwrap())
                    })
                    .map(|(i, _, _)| i)
                    .expect("internal node always has at least one child");
                node = &mut children[best];
            }
        }
    }
}

/// Guttman's quadratic `PickSeeds`: finds the pair of entries that would
/// waste the most space if placed in the same group, to use as the two
/// new nodes' initial members.
fn quadratic_pick_seeds<T>(entries: &[T], bounds_of: impl Fn(&T) -> BoundingSphere) -> (usize, usize) {
    let mut best = (0, 1, f64::NEG_INFINITY);
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let bi = bounds_of(&entries[i]);
            let bj = bounds_of(&entries[j]);
            let merged = bi.merge(&bj);
            let waste = merged.volume() - bi.volume() - bj.volume();
            if waste > best.2 {
                best = (i, j, waste);
            }
        }
    }
    (best.0, best.1)
}

/// Guttman's quadratic `PickNext`: of the remaining entries, picks the one
/// with the largest difference in volume-increase cost between the two
/// groups (maximizing the preference for one group over the other).
fn pick_next<T>(
    remaining: &[T],
    group_a: &BoundingSphere,
    group_b: &BoundingSphere,
    bounds_of: impl Fn(&T) -> BoundingSphere,
) -> (usize, bool) {
    let mut best = (0, false, f64::NEG_INFINITY);
    for (idx, entry) in remaining.iter().enumerate() {
        let b = bounds_of(entry);
        let d_a = volume_increase(group_a, &b);
        let d_b = volume_increase(group_b, &b);
        let preference = (d_a - d_b).abs();
        if preference > best.2 {
            best = (idx, d_a < d_b, preference);
        }
    }
    (best.0, best.1)
}

/// Splits a set of entries (leaf objects, or child nodes) into two groups
/// using Guttman's quadratic-split algorithm, returning `(group_a, group_b)`.
/// Generic over the entry type so the same algorithm serves both leaf
/// splits (entries are `(ObjectId, BoundingSphere)`) and internal splits
/// (entries are `RTreeNode`).
fn quadratic_split<T>(mut entries: Vec<T>, bounds_of: impl Fn(&T) -> BoundingSphere) -> (Vec<T>, Vec<T>) {
    let (seed_a, seed_b) = quadratic_pick_seeds(&entries, &bounds_of);
    debug_assert!(seed_a < seed_b);

    let entry_b = entries.remove(seed_b);
    let entry_a = entries.remove(seed_a);

    let mut bounds_a = bounds_of(&entry_a);
    let mut bounds_b = bounds_of(&entry_b);
    let mut group_a = vec![entry_a];
    let mut group_b = vec![entry_b];

    // Guttman's "if all but one entry has been assigned, assign the rest to
    // whichever group would otherwise fall below the minimum fill" is
    // omitted here: this tree has no minimum fill requirement, only a
    // maximum capacity, so every remaining entry goes through ordinary
    // `pick_next` selection instead.
    while !entries.is_empty() {
        let (idx, goes_to_b) = pick_next(&entries, &bounds_a, &bounds_b, &bounds_of);
        let entry = entries.remove(idx);
        if goes_to_b {
            bounds_b = bounds_b.merge(&bounds_of(&entry));
            group_b.push(entry);
        } else {
            bounds_a = bounds_a.merge(&bounds_of(&entry));
            group_a.push(entry);
        }
    }

    (group_a, group_b)
}

/// Inserts `(id, bounds)` into the subtree rooted at `node`, splitting
/// nodes that exceed `capacity` entries. Returns `Some(sibling)` if `node`
/// itself had to split, in which case the caller is responsible for adding
/// the sibling as a new child (or, at the true root, wrapping both into a
/// fresh root) — this recursive return-the-sibling approach avoids needing
/// parent pointers or an explicit upward walk to propagate a split.
pub(crate) fn insert_object(
    node: &mut RTreeNode,
    id: ObjectId,
    bounds: BoundingSphere,
    capacity: usize,
) -> Option<RTreeNode> {
    match node {
        RTreeNode::Leaf { entries, .. } => {
            entries.push((id, bounds));
            node.recompute_bounds();
            if node.len() <= capacity {
                return None;
            }

            let RTreeNode::Leaf { entries, .. } = std::mem::replace(node, RTreeNode::empty_leaf()) else {
                unreachable!()
            };
            let (group_a, group_b) = quadratic_split(entries, |(_, b)| *b);
            *node = RTreeNode::Leaf { entries: group_a, bounds: BoundingSphere::default() };
            node.recompute_bounds();
            let mut sibling = RTreeNode::Leaf { entries: group_b, bounds: BoundingSphere::default() };
            sibling.recompute_bounds();
            log::trace!(
                "rtree leaf split: {} entries remained, {} moved to sibling",
                node.len(),
                sibling.len()
            );
            Some(sibling)
        }
        RTreeNode::Internal { .. } => {
            let chosen = choose_leaf_path(node, &bounds);
            let split_sibling = insert_object(chosen, id, bounds, capacity);

            let RTreeNode::Internal { children, .. } = node else { unreachable!() };
            if let Some(sibling) = split_sibling {
                children.push(sibling);
            }
            node.recompute_bounds();

            if node.len() <= capacity {
                return None;
            }

            let RTreeNode::Internal { children, .. } = std::mem::replace(node, RTreeNode::empty_leaf())
            else {
                unreachable!()
            };
            let (group_a, group_b) = quadratic_split(children, RTreeNode::bounds);
            *node = RTreeNode::Internal { children: group_a, bounds: BoundingSphere::default() };
            node.recompute_bounds();
            let mut sibling = RTreeNode::Internal { children: group_b, bounds: BoundingSphere::default() };
            sibling.recompute_bounds();
            log::trace!(
                "rtree internal split: {} children remained, {} moved to sibling",
                node.len(),
                sibling.len()
            );
            Some(sibling)
        }
    }
}

/// Builds a fresh tree from scratch by inserting every `(id, bounds)` pair
/// in order, wrapping a root split into a new root as needed. Used once per
/// tick by `RTreeHandler` (the chosen maintenance strategy; see
/// `DESIGN.md`).
pub(crate) fn build_tree(entries: impl Iterator<Item = (ObjectId, BoundingSphere)>, capacity: usize) -> RTreeNode {
    let mut root = RTreeNode::empty_leaf();
    for (id, bounds) in entries {
        if let Some(sibling) = insert_object(&mut root, id, bounds, capacity) {
            let old_root = std::mem::replace(&mut root, RTreeNode::empty_leaf());
            root = RTreeNode::Internal { children: vec![old_root, sibling], bounds: BoundingSphere::default() };
            root.recompute_bounds();
        }
    }
    root
}

/// A single R-tree bounds-invariant violation: some node's bounds fail to
/// contain a child's (or an object's) bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsViolation {
    pub object: Option<ObjectId>,
    pub message: String,
}

/// Whether `outer` contains `inner`, within an epsilon scaled to `outer`'s
/// radius — floating-point bound recomputation during splits can leave a
/// containing sphere a few ULPs short of exact containment.
fn contains_within_epsilon(outer: &BoundingSphere, inner: &BoundingSphere) -> bool {
    let epsilon = outer.radius() * 1e-9;
    let center_dist = (outer.center() - inner.center()).norm();
    outer.radius() + epsilon >= center_dist + inner.radius()
}

/// Checks that every node's bounds contain its children's (or objects')
/// bounds, collecting every violation found rather than stopping at the
/// first. Diagnostic only — never called on the tick hot path.
pub(crate) fn verify_bounds(node: &RTreeNode) -> Vec<BoundsViolation> {
    let mut violations = Vec::new();
    verify_bounds_into(node, &mut violations);
    violations
}

fn verify_bounds_into(node: &RTreeNode, violations: &mut Vec<BoundsViolation>) {
    match node {
        RTreeNode::Leaf { entries, bounds } => {
            for (id, b) in entries {
                if !contains_within_epsilon(bounds, b) {
                    violations.push(BoundsViolation {
                        object: Some(*id),
                        message: format!("leaf bounds do not contain object {id:?}"),
                    });
                }
            }
        }
        RTreeNode::Internal { children, bounds } => {
            for child in children {
                if !contains_within_epsilon(bounds, &child.bounds()) {
                    violations.push(BoundsViolation {
                        object: None,
                        message: "internal node bounds do not contain a child".to_string(),
                    });
                }
                verify_bounds_into(child, violations);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn sphere(x: f64, r: f64) -> BoundingSphere {
        BoundingSphere::new(Point3::new(x, 0.0, 0.0), r)
    }

    #[test]
    fn inserting_within_capacity_does_not_split() {
        let mut root = RTreeNode::empty_leaf();
        for i in 0..4u128 {
            let sibling = insert_object(&mut root, ObjectId::from(i), sphere(i as f64, 0.5), 4);
            assert!(sibling.is_none());
        }
        assert!(root.is_leaf());
        assert_eq!(root.len(), 4);
    }

    #[test]
    fn exceeding_capacity_splits_the_leaf() {
        let mut root = RTreeNode::empty_leaf();
        let mut last_sibling = None;
        for i in 0..5u128 {
            last_sibling = insert_object(&mut root, ObjectId::from(i), sphere(i as f64, 0.5), 4);
        }
        assert!(last_sibling.is_some());
    }

    #[test]
    fn built_tree_bounds_contain_every_object() {
        let entries: Vec<_> = (0..50u128).map(|i| (ObjectId::from(i), sphere(i as f64, 0.5))).collect();
        let tree = build_tree(entries.into_iter(), 4);
        assert!(verify_bounds(&tree).is_empty());
    }
}
