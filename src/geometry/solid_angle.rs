use nalgebra::Vector3;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

const MIN_VAL: f64 = 0.0;
const MAX_VAL: f64 = 4.0 * std::f64::consts::PI;

/// A solid angle, saturating to the range `[0, 4*pi]` steradians.
///
/// A clamped scalar with the usual arithmetic operators, plus the
/// `from_center_radius` approximation used by the query predicate.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct SolidAngle(f64);

impl SolidAngle {
    pub const MIN: SolidAngle = SolidAngle(MIN_VAL);
    pub const MAX: SolidAngle = SolidAngle(MAX_VAL);

    pub fn new(steradians: f64) -> Self {
        SolidAngle(steradians).clamped()
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    fn clamped(self) -> Self {
        SolidAngle(self.0.clamp(MIN_VAL, MAX_VAL))
    }

    /// The cone half-angle (in radians) of a circular region subtending this
    /// solid angle: `acos(1 - sa / 2*pi)`.
    pub fn radius(&self) -> f64 {
        (1.0 - self.0 / (2.0 * std::f64::consts::PI)).acos()
    }

    /// The solid angle subtended by a circular region of the given
    /// half-angle (in radians): `2*pi * (1 - cos(radius))`.
    pub fn from_radius(radius: f64) -> Self {
        SolidAngle::new(2.0 * std::f64::consts::PI * (1.0 - radius.cos()))
    }

    /// Approximates the solid angle subtended by a sphere of the given
    /// `radius`, whose center lies at `to_center` relative to the viewer.
    ///
    /// This is an approximation, not the more precise
    /// `2*pi*(1 - cos(atan(r/d)))`: it constructs a boundary sample point
    /// orthogonal to `to_center`, and measures the angle between the ray to
    /// that boundary point and the ray to the center. It must be kept
    /// exactly as-is for result parity with existing tests and callers.
    ///
    /// Degrades when `to_center` is parallel to `(1, 1, 1)`, in which case
    /// the cross product used to find an orthogonal direction vanishes; this
    /// caveat is carried over unresolved.
    pub fn from_center_radius(to_center: Vector3<f64>, radius: f64) -> Self {
        let ortho_to_obj = to_center.cross(&Vector3::new(1.0, 1.0, 1.0)).normalize();
        let to_bound = to_center + ortho_to_obj * radius;
        let norm_to_center = to_center.normalize();
        let norm_to_bound = to_bound.normalize();
        SolidAngle::new(2.0 * std::f64::consts::PI * (1.0 - norm_to_center.dot(&norm_to_bound)))
    }
}

impl Default for SolidAngle {
    fn default() -> Self {
        SolidAngle::MIN
    }
}

impl Add for SolidAngle {
    type Output = SolidAngle;
    fn add(self, rhs: SolidAngle) -> SolidAngle {
        SolidAngle::new(self.0 + rhs.0)
    }
}

impl AddAssign for SolidAngle {
    fn add_assign(&mut self, rhs: SolidAngle) {
        *self = *self + rhs;
    }
}

impl Sub for SolidAngle {
    type Output = SolidAngle;
    fn sub(self, rhs: SolidAngle) -> SolidAngle {
        SolidAngle::new(self.0 - rhs.0)
    }
}

impl SubAssign for SolidAngle {
    fn sub_assign(&mut self, rhs: SolidAngle) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for SolidAngle {
    type Output = SolidAngle;
    fn mul(self, rhs: f64) -> SolidAngle {
        assert!(rhs >= 0.0);
        SolidAngle::new(self.0 * rhs)
    }
}

impl MulAssign<f64> for SolidAngle {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl Div<f64> for SolidAngle {
    type Output = SolidAngle;
    fn div(self, rhs: f64) -> SolidAngle {
        assert!(rhs > 0.0);
        SolidAngle::new(self.0 / rhs)
    }
}

impl DivAssign<f64> for SolidAngle {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}
