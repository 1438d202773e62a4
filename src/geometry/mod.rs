//! 2D geometry kernel
//!
//! This module is organized into submodules:
//! - `vector`: `Vector` and `UnitVector`, the algebra everything else is built on
//! - `line`: infinite `Line2D` and finite `Segment`
//! - `bezier`: quadratic and cubic Bezier segments with arc length
//! - `bbox`: axis-aligned bounding boxes

pub mod bbox;
pub mod bezier;
pub mod line;
pub mod vector;

pub use bbox::BoundingBox;
pub use bezier::{
    BezierCurve, CubicBezier, INTERPOLATION_PRECISION, LINE_INTERPOLATION_STEP, QuadraticBezier,
};
pub use line::{Line2D, Segment};
pub use vector::{UnitVector, Vector};

/// Tolerance for parallel / orthogonal tests on cross and dot products.
pub const EPSILON: f64 = 1e-7;
