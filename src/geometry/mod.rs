pub mod bounding_sphere;
pub mod solid_angle;

pub use bounding_sphere::BoundingSphere;
pub use solid_angle::SolidAngle;
