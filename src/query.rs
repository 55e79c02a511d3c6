use crate::listener::QueryChangeListener;
use crate::listener::QueryEventListener;
use crate::motion::MotionVector;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::object_id::ObjectId;

/// An event delivered through a [`Query`]'s event queue: an object entering
/// or leaving the query's result set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    Added(ObjectId),
    Removed(ObjectId),
}

struct EventQueue {
    events: Mutex<VecDeque<QueryEvent>>,
    /// Set while the queue is non-empty and the consumer hasn't been told
    /// yet. Cleared by `pop_all`, so the next empty-to-non-empty transition
    /// fires `query_has_events` again.
    notified: Mutex<bool>,
}

impl EventQueue {
    fn new() -> Self {
        EventQueue { events: Mutex::new(VecDeque::new()), notified: Mutex::new(false) }
    }
}

pub(crate) struct Shared {
    position: Mutex<MotionVector>,
    min_solid_angle: Mutex<crate::geometry::SolidAngle>,
    max_radius: Mutex<f64>,
    queue: EventQueue,
    change_listeners: Mutex<Vec<Arc<dyn QueryChangeListener>>>,
    event_listener: RwLock<Option<Arc<dyn QueryEventListener>>>,
}

/// A standing proximity query: a moving point with an angular resolution
/// threshold and an optional hard radius cutoff.
///
/// `Query` is a cheap, cloneable handle (an `Arc` around the shared state).
/// `QueryHandler`s register only a [`Weak`] reference, so a query's
/// registration is dropped automatically once the last `Query` handle goes
/// out of scope.
#[derive(Clone)]
pub struct Query {
    shared: Arc<Shared>,
}

impl Query {
    /// A `max_radius` value meaning "no radius cutoff".
    pub const INFINITE_RADIUS: f64 = f64::INFINITY;

    pub fn new(position: MotionVector, min_solid_angle: crate::geometry::SolidAngle) -> Self {
        Query {
            shared: Arc::new(Shared {
                position: Mutex::new(position),
                min_solid_angle: Mutex::new(min_solid_angle),
                max_radius: Mutex::new(Query::INFINITE_RADIUS),
                queue: EventQueue::new(),
                change_listeners: Mutex::new(Vec::new()),
                event_listener: RwLock::new(None),
            }),
        }
    }

    pub fn with_max_radius(self, max_radius: f64) -> Self {
        *self.shared.max_radius.lock().unwrap() = max_radius;
        self
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Query { shared }
    }

    pub fn position(&self) -> MotionVector {
        *self.shared.position.lock().unwrap()
    }

    pub fn min_solid_angle(&self) -> crate::geometry::SolidAngle {
        *self.shared.min_solid_angle.lock().unwrap()
    }

    pub fn max_radius(&self) -> f64 {
        *self.shared.max_radius.lock().unwrap()
    }

    pub fn set_position(&self, new: MotionVector) {
        let old = {
            let mut guard = self.shared.position.lock().unwrap();
            let old = *guard;
            guard.update(new);
            old
        };
        for listener in self.shared.change_listeners.lock().unwrap().iter() {
            listener.position_updated(old, new);
        }
    }

    pub fn set_min_solid_angle(&self, min_solid_angle: crate::geometry::SolidAngle) {
        *self.shared.min_solid_angle.lock().unwrap() = min_solid_angle;
    }

    pub fn set_max_radius(&self, max_radius: f64) {
        *self.shared.max_radius.lock().unwrap() = max_radius;
    }

    pub fn add_change_listener(&self, listener: Arc<dyn QueryChangeListener>) {
        self.shared.change_listeners.lock().unwrap().push(listener);
    }

    pub fn set_event_listener(&self, listener: Arc<dyn QueryEventListener>) {
        *self.shared.event_listener.write().unwrap() = Some(listener);
    }

    /// Appends a single event to the queue, firing `query_has_events` if
    /// the queue transitioned from empty to non-empty.
    pub fn push_event(&self, event: QueryEvent) {
        self.push_events(std::iter::once(event));
    }

    /// Appends a batch of events as a single unit, firing `query_has_events`
    /// at most once for the batch.
    pub fn push_events(&self, events: impl IntoIterator<Item = QueryEvent>) {
        let became_non_empty = {
            let mut queue = self.shared.queue.events.lock().unwrap();
            let was_empty = queue.is_empty();
            let before = queue.len();
            queue.extend(events);
            was_empty && queue.len() > before
        };
        if !became_non_empty {
            return;
        }

        let should_notify = {
            let mut notified = self.shared.queue.notified.lock().unwrap();
            let should = !*notified;
            *notified = true;
            should
        };
        if should_notify {
            if let Some(listener) = self.shared.event_listener.read().unwrap().as_ref() {
                listener.query_has_events(self);
            }
        }
    }

    /// Drains and returns all currently-queued events, re-arming the
    /// empty-to-non-empty notification trigger.
    pub fn pop_all(&self) -> Vec<QueryEvent> {
        let mut queue = self.shared.queue.events.lock().unwrap();
        let drained: Vec<QueryEvent> = queue.drain(..).collect();
        drop(queue);
        *self.shared.queue.notified.lock().unwrap() = false;
        drained
    }

    pub fn has_events(&self) -> bool {
        !self.shared.queue.events.lock().unwrap().is_empty()
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        for listener in self.change_listeners.lock().unwrap().iter() {
            listener.deleted();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::test_support::CountingEventListener;
    use crate::time::Time;
    use nalgebra::{Point3, Vector3};
    use std::sync::Arc;

    fn sample_query() -> Query {
        Query::new(
            MotionVector::stationary(Time::from_seconds(0.0), Point3::origin()),
            crate::geometry::SolidAngle::MIN,
        )
    }

    #[test]
    fn push_then_pop_returns_events_in_order() {
        let q = sample_query();
        q.push_event(QueryEvent::Added(ObjectId::from(1u128)));
        q.push_event(QueryEvent::Added(ObjectId::from(2u128)));
        assert_eq!(
            q.pop_all(),
            vec![QueryEvent::Added(ObjectId::from(1u128)), QueryEvent::Added(ObjectId::from(2u128))]
        );
        assert!(q.pop_all().is_empty());
    }

    #[test]
    fn notification_fires_once_per_empty_to_nonempty_transition() {
        let q = sample_query();
        let listener = Arc::new(CountingEventListener::default());
        q.set_event_listener(listener.clone());

        q.push_event(QueryEvent::Added(ObjectId::from(1u128)));
        q.push_event(QueryEvent::Added(ObjectId::from(2u128)));
        assert_eq!(*listener.calls.lock().unwrap(), 1);

        q.pop_all();
        q.push_event(QueryEvent::Added(ObjectId::from(3u128)));
        assert_eq!(*listener.calls.lock().unwrap(), 2);
    }

    #[test]
    fn max_radius_defaults_to_infinite() {
        let q = sample_query();
        assert_eq!(q.max_radius(), Query::INFINITE_RADIUS);
    }
}
