use crate::time::Time;
use nalgebra::{Point3, Vector3};

/// A linearly interpolated position: `p0 + v * (t - t0)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MotionVector {
    t0: Time,
    p0: Point3<f64>,
    v: Vector3<f64>,
}

impl MotionVector {
    pub fn new(t0: Time, p0: Point3<f64>, v: Vector3<f64>) -> Self {
        MotionVector { t0, p0, v }
    }

    /// A motion vector for a stationary point.
    pub fn stationary(t0: Time, p0: Point3<f64>) -> Self {
        MotionVector::new(t0, p0, Vector3::zeros())
    }

    pub fn update_time(&self) -> Time {
        self.t0
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.v
    }

    /// The position at time `t`.
    pub fn position(&self, t: Time) -> Point3<f64> {
        self.p0 + self.v * (t - self.t0).seconds()
    }

    /// Replaces this motion vector with `new`.
    ///
    /// `new`'s update time must be strictly greater than this motion
    /// vector's — a programmer error otherwise, so this panics rather than
    /// returning a `Result`.
    pub fn update(&mut self, new: MotionVector) {
        assert!(
            new.t0.seconds() > self.t0.seconds(),
            "MotionVector::update requires a strictly greater timestamp"
        );
        *self = new;
    }
}
