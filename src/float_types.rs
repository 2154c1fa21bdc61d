//! Scalar type selection and the epsilon family the compiler is tuned around.

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Two normals describe the same orientation when every component agrees
/// within this bound.
pub const NORMAL_EPSILON: Real = 1e-6;

/// Two plane distances are considered equal within this bound.
pub const DIST_EPSILON: Real = 1e-4;

// if a brush just barely pokes onto the other side,
// let it slide by without chopping
pub const PLANESIDE_EPSILON: Real = 0.001;

/// The head node volume is the entity bounds grown by this many units.
pub const SIDESPACE: Real = 24.0;

/// Windings with fewer than three edges longer than this get crunched out
/// of existence by vertex snapping.
pub const TINY_EDGE_LENGTH: Real = 0.2;

/// How far a vertex must clear a split plane before the brush counts as
/// actually crossing it.
pub const SPLIT_SLOP: Real = 0.1;
