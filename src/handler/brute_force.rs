use super::satisfies_constraints;
use super::QueryHandler;
use crate::object::Object;
use crate::object_id::ObjectId;
use crate::query::Query;
use crate::query_cache::QueryCache;
use crate::time::Time;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, Weak};

struct RegisteredQuery {
    query: Weak<crate::query::Shared>,
    cache: QueryCache,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<ObjectId, Weak<crate::object::Shared>>,
    queries: Vec<RegisteredQuery>,
}

/// The reference `QueryHandler`: every tick, tests every registered object
/// against every registered query. O(objects * queries) per tick; correct
/// but not scalable, and used as the ground truth the R-tree handler's
/// results are checked against.
#[derive(Default)]
pub struct BruteForceHandler {
    inner: Mutex<Inner>,
}

impl BruteForceHandler {
    pub fn new() -> Self {
        BruteForceHandler::default()
    }

    pub fn object_count(&self) -> usize {
        self.inner.lock().unwrap().objects.len()
    }
}

impl QueryHandler for BruteForceHandler {
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
        let query_count = inner.queries.len();
        log::trace!("brute force tick: {} objects, {query_count} queries", live_objects.len());

        inner.queries.retain_mut(|registered| {
            let Some(query_shared) = registered.query.upgrade() else {
                return false;
            };
            let query = Query::from_shared(query_shared);

            let query_pos = query.position().position(t);
            let query_radius = query.max_radius();
            let query_angle = query.min_solid_angle();

            let mut matching = BTreeSet::new();
            for object in &live_objects {
                let bounds = object.world_bounds(t);
                if satisfies_constraints(query_pos, query_radius, query_angle, bounds) {
                    matching.insert(object.id());
                }
            }

            let mut events = Vec::new();
            registered.cache.exchange(matching, Some(&mut events));
            if !events.is_empty() {
                query.push_events(events);
            }
            true
        });
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
    fn object_entering_range_produces_added_event() {
        let handler = BruteForceHandler::new();

        let obj = Object::new(
            ObjectId::from(1u128),
            MotionVector::stationary(Time::from_seconds(0.0), Point3::new(5.0, 0.0, 0.0)),
            BoundingSphere::new(Point3::origin(), 1.0),
        );
        handler.register_object(&obj);

        let query = Query::new(
            MotionVector::stationary(Time::from_seconds(0.0), Point3::origin()),
            SolidAngle::MIN,
        );
        handler.register_query(&query);

        handler.tick(Time::from_seconds(1.0));
        assert_eq!(query.pop_all(), vec![QueryEvent::Added(ObjectId::from(1u128))]);
    }

    #[test]
    fn dropped_object_is_pruned_on_next_tick() {
        let handler = BruteForceHandler::new();
        let obj = Object::new(
            ObjectId::from(1u128),
            MotionVector::stationary(Time::from_seconds(0.0), Point3::origin()),
            BoundingSphere::new(Point3::origin(), 1.0),
        );
        handler.register_object(&obj);
        assert_eq!(handler.object_count(), 1);
        drop(obj);
        handler.tick(Time::from_seconds(1.0));
        assert_eq!(handler.object_count(), 0);
    }
}
