use crate::motion::MotionVector;
use crate::object_id::ObjectId;
use crate::query::Query;

/// Receives notifications about an [`crate::object::Object`]'s mutations.
/// All methods have empty default implementations, since most listeners
/// (including both bundled `QueryHandler`s) only care about one or two of
/// the three events.
pub trait ObjectChangeListener: Send + Sync {
    fn position_updated(&self, _id: ObjectId, _old: MotionVector, _new: MotionVector) {}
    fn bounds_updated(
        &self,
        _id: ObjectId,
        _old: crate::geometry::BoundingSphere,
        _new: crate::geometry::BoundingSphere,
    ) {
    }
    fn deleted(&self, _id: ObjectId) {}
}

/// Receives notifications about a [`crate::query::Query`]'s mutations.
pub trait QueryChangeListener: Send + Sync {
    fn position_updated(&self, _old: MotionVector, _new: MotionVector) {}
    fn deleted(&self) {}
}

/// Notified exactly once per empty-to-non-empty transition of a [`Query`]'s
/// event queue.
pub trait QueryEventListener: Send + Sync {
    fn query_has_events(&self, query: &Query);
}

/// A listener that records every call it receives, for tests.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingObjectListener {
        pub position_updates: Mutex<Vec<(MotionVector, MotionVector)>>,
        pub bounds_updates: Mutex<Vec<(crate::geometry::BoundingSphere, crate::geometry::BoundingSphere)>>,
        pub deletions: Mutex<Vec<ObjectId>>,
    }

    impl ObjectChangeListener for RecordingObjectListener {
        fn position_updated(&self, _id: ObjectId, old: MotionVector, new: MotionVector) {
            self.position_updates.lock().unwrap().push((old, new));
        }
        fn bounds_updated(
            &self,
            _id: ObjectId,
            old: crate::geometry::BoundingSphere,
            new: crate::geometry::BoundingSphere,
        ) {
            self.bounds_updates.lock().unwrap().push((old, new));
        }
        fn deleted(&self, id: ObjectId) {
            self.deletions.lock().unwrap().push(id);
        }
    }

    #[derive(Default)]
    pub struct CountingEventListener {
        pub calls: Mutex<usize>,
    }

    impl QueryEventListener for CountingEventListener {
        fn query_has_events(&self, _query: &Query) {
            *self.calls.lock().unwrap() += 1;
        }
    }
}
