//! Planes, windings and bounding boxes.

pub mod aabb;
pub mod plane;
pub mod winding;

pub use aabb::Aabb3;
pub use plane::{Plane, PlaneStore, PlaneType};
pub use winding::Winding;
