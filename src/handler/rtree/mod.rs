mod node;

use super::satisfies_constraints;
use super::QueryHandler;
use crate::object::Object;
use crate::object_id::ObjectId;
use crate::query::Query;
use crate::query_cache::QueryCache;
use crate::time::Time;
use node::RTreeNode;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, Weak};

pub use node::BoundsViolation;

/// Node fan-out used when no explicit capacity is given via
/// [`RTreeHandler::new`].
const DEFAULT_CAPACITY: usize = 4;

struct RegisteredQuery {
    query: Weak<crate::query::Shared>,
    cache: QueryCache,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<ObjectId, Weak<crate::object::Shared>>,
    queries: Vec<RegisteredQuery>,
}

/// A `QueryHandler` backed by an R-tree spatial index over object bounds.
///
/// The tree is rebuilt from scratch at the start of every `tick` (the
/// "full rebuild" maintenance strategy chosen among the ones a dynamic
/// index under object motion allows — see `DESIGN.md`), using
/// quadratic-split insertion for each object. Query evaluation then prunes
/// the freshly built tree: a query only descends into a node whose bounds
/// could possibly satisfy its constraints.
pub struct RTreeHandler {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Default for RTreeHandler {
    fn default() -> Self {
        RTreeHandler { capacity: DEFAULT_CAPACITY, inner: Mutex::new(Inner::default()) }
    }
}

impl RTreeHandler {
    /// Builds a handler with the given node fan-out `M`, the fixed capacity
    /// chosen at handler construction. Use `RTreeHandler::default()` for the
    /// commonly-used default of 4.
    pub fn new(node_capacity: u8) -> Self {
        let capacity = node_capacity as usize;
        assert!(capacity >= 2, "RTreeHandler capacity must be at least 2");
        RTreeHandler { capacity, inner: Mutex::new(Inner::default()) }
    }

    pub fn object_count(&self) -> usize {
        self.inner.lock().unwrap().objects.len()
    }

    /// Rebuilds the tree from the live object set's world bounds at time
    /// `t` and checks every node's bounds against its children's, returning
    /// every violation found. Diagnostic only; never called automatically,
    /// and never panics.
    pub fn verify_bounds(&self, t: Time) -> Vec<BoundsViolation> {
        let inner = self.inner.lock().unwrap();
        let entries: Vec<_> = inner
            .objects
            .values()
            .filter_map(|w| w.upgrade())
            .map(|shared| {
                let obj = Object::from_shared(shared);
                (obj.id(), obj.world_bounds(t))
            })
            .collect();
        let tree = node::build_tree(entries.into_iter(), self.capacity);
        let violations = node::verify_bounds(&tree);
        for violation in &violations {
            log::warn!("rtree bounds invariant violated: {}", violation.message);
        }
        violations
    }
}

impl QueryHandler for RTreeHandler {
    fn register_object(&self, object: &Object) {
        let mut inner = self.inner.lock().unwrap();
        inner.objects.insert(object.id(), object.downgrade());
    }

    fn register_query(&self, query: &Query) {
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(RegisteredQuery { query: query.downgrade(), cache: QueryCache::new() });
    }

    fn tick(&self, t: Time) {
        let mut inner = self.inner.lock().unwrap();

        inner.objects.retain(|_, weak| weak.upgrade().is_some());
        let live_objects: Vec<Object> =
            inner.objects.values().filter_map(|w| w.upgrade().map(Object::from_shared)).collect();

        let entries = live_objects.iter().map(|o| (o.id(), o.world_bounds(t)));
        let tree = node::build_tree(entries, self.capacity);

        for violation in node::verify_bounds(&tree) {
            log::warn!("rtree bounds invariant violated after rebuild: {}", violation.message);
        }

        let query_count = inner.queries.len();
        inner.queries.retain_mut(|registered| {
            let Some(query_shared) = registered.query.upgrade() else {
                return false;
            };
            let query = Query::from_shared(query_shared);

            let query_pos = query.position().position(t);
            let query_radius = query.max_radius();
            let query_angle = query.min_solid_angle();

            let mut matching = BTreeSet::new();
            let mut visited = 0usize;
            let mut pruned = 0usize;
            let mut stack = vec![&tree];
            while let Some(current) = stack.pop() {
                match current {
                    RTreeNode::Leaf { entries, .. } => {
                        for (id, bounds) in entries {
                            visited += 1;
                            if satisfies_constraints(query_pos, query_radius, query_angle, *bounds) {
                                matching.insert(*id);
                            }
                        }
                    }
                    RTreeNode::Internal { children, .. } => {
                        for child in children {
                            visited += 1;
                            if satisfies_constraints(query_pos, query_radius, query_angle, child.bounds()) {
                                stack.push(child);
                            } else {
                                pruned += 1;
                            }
                        }
                    }
                }
            }
            log::trace!("rtree query visited {visited} nodes, pruned {pruned}");

            let mut events = Vec::new();
            registered.cache.exchange(matching, Some(&mut events));
            if !events.is_empty() {
                query.push_events(events);
            }
            true
        });

        log::trace!("rtree tick: {} objects, {query_count} queries", live_objects.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingSphere, SolidAngle};
    use crate::motion::MotionVector;
    use crate::query::QueryEvent;
    use nalgebra::Point3;

    #[test]
    fn matches_equivalent_brute_force_result() {
        use super::super::brute_force::BruteForceHandler;

        let rtree = RTreeHandler::new(4);
        let brute = BruteForceHandler::new();

        let mut objects = Vec::new();
        for i in 0..40i64 {
            let obj = Object::new(
                ObjectId::from(i as u128),
                MotionVector::stationary(Time::from_seconds(0.0), Point3::new(i as f64, 0.0, 0.0)),
                BoundingSphere::new(Point3::origin(), 0.4),
            );
            rtree.register_object(&obj);
            brute.register_object(&obj);
            objects.push(obj);
        }

        let rtree_query = Query::new(
            MotionVector::stationary(Time::from_seconds(0.0), Point3::new(20.0, 0.0, 0.0)),
            SolidAngle::MIN,
        )
        .with_max_radius(5.0);
        let brute_query = Query::new(
            MotionVector::stationary(Time::from_seconds(0.0), Point3::new(20.0, 0.0, 0.0)),
            SolidAngle::MIN,
        )
        .with_max_radius(5.0);
        rtree.register_query(&rtree_query);
        brute.register_query(&brute_query);

        rtree.tick(Time::from_seconds(1.0));
        brute.tick(Time::from_seconds(1.0));

        let mut rtree_events: Vec<QueryEvent> = rtree_query.pop_all();
        let mut brute_events: Vec<QueryEvent> = brute_query.pop_all();
        rtree_events.sort_by_key(event_sort_key);
        brute_events.sort_by_key(event_sort_key);
        assert_eq!(rtree_events, brute_events);
    }

    fn event_sort_key(event: &QueryEvent) -> (u8, [u8; 16]) {
        match event {
            QueryEvent::Added(id) => (0, id.bytes()),
            QueryEvent::Removed(id) => (1, id.bytes()),
        }
    }

    #[test]
    fn verify_bounds_finds_no_violations_in_a_freshly_built_tree() {
        let handler = RTreeHandler::new(4);
        let mut objects = Vec::new();
        for i in 0..20i64 {
            let obj = Object::new(
                ObjectId::from(i as u128),
                MotionVector::stationary(Time::from_seconds(0.0), Point3::new(i as f64, 0.0, 0.0)),
                BoundingSphere::new(Point3::origin(), 0.4),
            );
            handler.register_object(&obj);
            objects.push(obj);
        }
        assert!(handler.verify_bounds(Time::from_seconds(0.0)).is_empty());
    }

    #[test]
    fn split_tree_still_finds_all_matches() {
        let handler = RTreeHandler::new(4);
        let mut objects = Vec::new();
        for i in 0..10i64 {
            let obj = Object::new(
                ObjectId::from(i as u128),
                MotionVector::stationary(Time::from_seconds(0.0), Point3::new(i as f64, 0.0, 0.0)),
                BoundingSphere::new(Point3::origin(), 0.4),
            );
            handler.register_object(&obj);
            objects.push(obj);
        }

        let query = Query::new(
            MotionVector::stationary(Time::from_seconds(0.0), Point3::new(0.0, 0.0, 0.0)),
            SolidAngle::MIN,
        );
        handler.register_query(&query);
        handler.tick(Time::from_seconds(1.0));

        let events = query.pop_all();
        assert_eq!(events.len(), 10);
    }
}
