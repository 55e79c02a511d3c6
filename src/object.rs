use crate::geometry::BoundingSphere;
use crate::listener::ObjectChangeListener;
use crate::motion::MotionVector;
use crate::object_id::ObjectId;
use crate::time::Time;
use std::sync::{Arc, Mutex, Weak};

pub(crate) struct Shared {
    id: ObjectId,
    position: Mutex<MotionVector>,
    local_bounds: Mutex<BoundingSphere>,
    listeners: Mutex<Vec<Arc<dyn ObjectChangeListener>>>,
}

/// A moving, bounded entity participating in proximity queries.
///
/// Like [`crate::query::Query`], `Object` is a cheap `Arc` handle.
/// `QueryHandler`s hold only a [`Weak`] reference; an object's registration
/// is dropped the moment the last `Object` handle is dropped, without any
/// handler needing to be told explicitly.
#[derive(Clone)]
pub struct Object {
    shared: Arc<Shared>,
}

impl Object {
    pub fn new(id: ObjectId, position: MotionVector, local_bounds: BoundingSphere) -> Self {
        Object {
            shared: Arc::new(Shared {
                id,
                position: Mutex::new(position),
                local_bounds: Mutex::new(local_bounds),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.shared.id
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Object { shared }
    }

    pub fn position(&self) -> MotionVector {
        *self.shared.position.lock().unwrap()
    }

    pub fn local_bounds(&self) -> BoundingSphere {
        *self.shared.local_bounds.lock().unwrap()
    }

    /// The object's bounding sphere in world space at time `t`: the local
    /// bounds translated by the interpolated position.
    pub fn world_bounds(&self, t: Time) -> BoundingSphere {
        let local = self.local_bounds();
        BoundingSphere::new(local.center() + self.position().position(t).coords, local.radius())
    }

    pub fn set_position(&self, new: MotionVector) {
        let old = {
            let mut guard = self.shared.position.lock().unwrap();
            let old = *guard;
            guard.update(new);
            old
        };
        for listener in self.shared.listeners.lock().unwrap().iter() {
            listener.position_updated(self.shared.id, old, new);
        }
    }

    pub fn set_local_bounds(&self, bounds: BoundingSphere) {
        let old = {
            let mut guard = self.shared.local_bounds.lock().unwrap();
            let old = *guard;
            *guard = bounds;
            old
        };
        for listener in self.shared.listeners.lock().unwrap().iter() {
            listener.bounds_updated(self.shared.id, old, bounds);
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ObjectChangeListener>) {
        self.shared.listeners.lock().unwrap().push(listener);
    }

    /// Removes a previously added listener, identified by `Arc` pointer
    /// equality. No-op if `listener` was never added.
    pub fn remove_listener(&self, listener: &Arc<dyn ObjectChangeListener>) {
        self.shared.listeners.lock().unwrap().retain(|l| !Arc::ptr_eq(l, listener));
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener.deleted(self.id);
        }
    }
}
