//! Static geometry: the parametric curve, the tube swept along it, star
//! spheres and the random scatter used to place them.

mod curve;
mod geometry;
mod scatter;
mod sphere;
mod tube;

pub use curve::{evaluate, Curve};
pub use geometry::{Geometry, Material};
pub use scatter::random_point_in_cube;
pub use sphere::build_sphere_mesh;
pub use tube::build_tube_mesh;
