//! 2D vectors backed by `glam::DVec2`.
//!
//! Angles are in degrees, counter-clockwise from the positive x axis.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use glam::{DVec2, dvec2};

use super::EPSILON;
use crate::errors::GeometryError;

/// A 2D vector, used both for positions and displacements.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[repr(transparent)]
pub struct Vector(DVec2);

impl Vector {
    pub const ZERO: Vector = Vector(DVec2::ZERO);

    #[inline]
    pub const fn new(x: f64, y: f64) -> Vector {
        Vector(dvec2(x, y))
    }

    /// Vector of the given length pointing at `angle` degrees.
    pub fn from_polar(angle: f64, length: f64) -> Vector {
        UnitVector::from_angle(angle) * length
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn dot(self, other: Vector) -> f64 {
        self.0.dot(other.0)
    }

    /// Scalar 2D cross product, signed so that (1, 0) × (0, 1) = 1.
    #[inline]
    pub fn cross(self, other: Vector) -> f64 {
        self.0.perp_dot(other.0)
    }

    #[inline]
    pub fn magnitude(self) -> f64 {
        self.0.length()
    }

    #[inline]
    pub fn magnitude_square(self) -> f64 {
        self.0.length_squared()
    }

    pub fn is_zero(self) -> bool {
        self.0 == DVec2::ZERO
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Normalize in place. The zero vector has no direction and is rejected.
    pub fn normalize(&mut self) -> Result<(), GeometryError> {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Err(GeometryError::ZeroVectorOrientation);
        }
        self.0 /= magnitude;
        Ok(())
    }

    /// Return the unit vector pointing the same way, leaving `self` untouched.
    pub fn to_normalized(self) -> Result<UnitVector, GeometryError> {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Err(GeometryError::ZeroVectorOrientation);
        }
        Ok(UnitVector(self.0 / magnitude))
    }

    /// Rotate counter-clockwise by `angle` degrees.
    pub fn rotate(self, angle: f64) -> Vector {
        Vector(DVec2::from_angle(angle.to_radians()).rotate(self.0))
    }

    /// Counter-clockwise quarter turn, exact.
    #[inline]
    pub fn rotate_90(self) -> Vector {
        Vector(self.0.perp())
    }

    #[inline]
    pub fn rotate_180(self) -> Vector {
        Vector(-self.0)
    }

    #[inline]
    pub fn rotate_270(self) -> Vector {
        Vector(dvec2(self.0.y, -self.0.x))
    }

    /// Rotate by `turns` quarter turns (negative turns rotate clockwise).
    pub fn rotate_quarter_turns(self, turns: i32) -> Vector {
        match turns.rem_euclid(4) {
            0 => self,
            1 => self.rotate_90(),
            2 => self.rotate_180(),
            _ => self.rotate_270(),
        }
    }

    /// Signed angle from the positive x axis, in (-180, 180] degrees.
    pub fn orientation(self) -> Result<f64, GeometryError> {
        if self.is_zero() {
            return Err(GeometryError::ZeroVectorOrientation);
        }
        Ok(self.0.y.atan2(self.0.x).to_degrees())
    }

    /// Signed angle to rotate `self` onto `other`, in (-180, 180] degrees.
    pub fn angle_to(self, other: Vector) -> Result<f64, GeometryError> {
        if self.is_zero() || other.is_zero() {
            return Err(GeometryError::ZeroVectorOrientation);
        }
        Ok(self.cross(other).atan2(self.dot(other)).to_degrees())
    }

    pub fn is_parallel(self, other: Vector) -> bool {
        self.cross(other).abs() < EPSILON
    }

    pub fn is_orthogonal(self, other: Vector) -> bool {
        self.dot(other).abs() < EPSILON
    }

    pub fn distance(self, other: Vector) -> f64 {
        self.0.distance(other.0)
    }

    pub fn lerp(self, other: Vector, t: f64) -> Vector {
        Vector(self.0.lerp(other.0, t))
    }

    pub fn midpoint(self, other: Vector) -> Vector {
        self.lerp(other, 0.5)
    }

    pub(crate) fn min(self, other: Vector) -> Vector {
        Vector(self.0.min(other.0))
    }

    pub(crate) fn max(self, other: Vector) -> Vector {
        Vector(self.0.max(other.0))
    }
}

impl From<(f64, f64)> for Vector {
    fn from((x, y): (f64, f64)) -> Vector {
        Vector::new(x, y)
    }
}

impl From<DVec2> for Vector {
    fn from(v: DVec2) -> Vector {
        Vector(v)
    }
}

impl From<Vector> for DVec2 {
    fn from(v: Vector) -> DVec2 {
        v.0
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector { Vector(self.0 + rhs.0) }
}
impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector { Vector(self.0 - rhs.0) }
}
impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector { Vector(self.0 * rhs) }
}
impl Mul<Vector> for f64 {
    type Output = Vector;
    fn mul(self, rhs: Vector) -> Vector { Vector(rhs.0 * self) }
}
impl Div<f64> for Vector {
    type Output = Vector;
    fn div(self, rhs: f64) -> Vector { Vector(self.0 / rhs) }
}
impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector { Vector(-self.0) }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0.x, self.0.y)
    }
}

/// A vector of magnitude one. Only obtainable through normalization or from an angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitVector(DVec2);

impl UnitVector {
    pub const X: UnitVector = UnitVector(DVec2::X);
    pub const Y: UnitVector = UnitVector(DVec2::Y);

    /// Unit vector pointing at `angle` degrees.
    pub fn from_angle(angle: f64) -> UnitVector {
        UnitVector(DVec2::from_angle(angle.to_radians()))
    }

    pub fn x(self) -> f64 {
        self.0.x
    }

    pub fn y(self) -> f64 {
        self.0.y
    }

    pub fn to_vector(self) -> Vector {
        Vector(self.0)
    }

    pub fn rotate(self, angle: f64) -> UnitVector {
        UnitVector(DVec2::from_angle(angle.to_radians()).rotate(self.0))
    }

    /// Left-hand normal.
    pub fn rotate_90(self) -> UnitVector {
        UnitVector(self.0.perp())
    }

    pub fn orientation(self) -> f64 {
        self.0.y.atan2(self.0.x).to_degrees()
    }
}

impl Mul<f64> for UnitVector {
    type Output = Vector;
    fn mul(self, length: f64) -> Vector {
        Vector(self.0 * length)
    }
}

impl From<UnitVector> for Vector {
    fn from(u: UnitVector) -> Vector {
        u.to_vector()
    }
}
