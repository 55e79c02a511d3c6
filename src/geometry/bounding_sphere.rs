use nalgebra::Point3;

/// A bounding sphere: a center and a radius.
///
/// A sphere with `radius <= 0` is *degenerate* and acts as an identity
/// element for [`BoundingSphere::merge`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingSphere {
    center: Point3<f64>,
    radius: f64,
}

impl BoundingSphere {
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        BoundingSphere { center, radius }
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn degenerate(&self) -> bool {
        self.radius <= 0.0
    }

    /// The smallest sphere enclosing both `self` and `other`.
    pub fn merge(&self, other: &BoundingSphere) -> BoundingSphere {
        if other.degenerate() {
            return *self;
        }
        if self.degenerate() {
            return *other;
        }

        let diff = other.center - self.center;
        let center_dist = diff.norm();

        if center_dist + self.radius <= other.radius {
            return *other;
        }
        if center_dist + other.radius <= self.radius {
            return *self;
        }

        let new_radius = (self.radius + center_dist + other.radius) * 0.5;
        let ratio = (new_radius - self.radius) / center_dist;
        let new_center = self.center + diff * ratio;
        BoundingSphere::new(new_center, new_radius)
    }

    /// Whether `self` fully encloses `other`.
    pub fn contains(&self, other: &BoundingSphere) -> bool {
        let center_dist = (self.center - other.center).norm();
        self.radius >= center_dist + other.radius
    }

    pub fn volume(&self) -> f64 {
        if self.degenerate() {
            return 0.0;
        }
        (4.0 / 3.0) * std::f64::consts::PI * self.radius.powi(3)
    }
}

impl Default for BoundingSphere {
    /// The degenerate sphere at the origin, the identity element of [`BoundingSphere::merge`].
    fn default() -> Self {
        BoundingSphere::new(Point3::origin(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(x: f64, y: f64, z: f64, r: f64) -> BoundingSphere {
        BoundingSphere::new(Point3::new(x, y, z), r)
    }

    #[test]
    fn merge_with_degenerate_returns_other() {
        let a = BoundingSphere::default();
        let b = sphere(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a.merge(&b), b);
        assert_eq!(b.merge(&a), b);
    }

    #[test]
    fn merge_self_is_self() {
        let a = sphere(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a.merge(&a), a);
    }

    #[test]
    fn merge_contains_both_inputs() {
        let a = sphere(0.0, 0.0, 0.0, 1.0);
        let b = sphere(10.0, 0.0, 0.0, 2.0);
        let m = a.merge(&b);
        assert!(m.contains(&a));
        assert!(m.contains(&b));
    }

    #[test]
    fn merge_is_commutative_up_to_tolerance() {
        let a = sphere(0.0, 0.0, 0.0, 1.0);
        let b = sphere(5.0, -3.0, 2.0, 2.5);
        let ab = a.merge(&b);
        let ba = b.merge(&a);
        assert!((ab.center() - ba.center()).norm() < 1e-9);
        assert!((ab.radius() - ba.radius()).abs() < 1e-9);
    }

    #[test]
    fn merge_of_nested_spheres_returns_container() {
        let outer = sphere(0.0, 0.0, 0.0, 10.0);
        let inner = sphere(1.0, 0.0, 0.0, 1.0);
        assert_eq!(outer.merge(&inner), outer);
    }

    #[test]
    fn contains_implies_merge_is_self() {
        let outer = sphere(0.0, 0.0, 0.0, 10.0);
        let inner = sphere(1.0, 0.0, 0.0, 1.0);
        assert!(outer.contains(&inner));
        assert_eq!(outer.merge(&inner), outer);
    }

    #[test]
    fn volume_of_degenerate_is_zero() {
        assert_eq!(BoundingSphere::default().volume(), 0.0);
    }

    #[test]
    fn volume_matches_formula() {
        let s = sphere(0.0, 0.0, 0.0, 2.0);
        let expected = (4.0 / 3.0) * std::f64::consts::PI * 8.0;
        assert!((s.volume() - expected).abs() < 1e-9);
    }
}
