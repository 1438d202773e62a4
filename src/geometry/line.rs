//! Infinite lines in point + direction form, and finite segments.

use super::bbox::BoundingBox;
use super::vector::{UnitVector, Vector};
use crate::errors::GeometryError;

/// An infinite line through `point`, parametrised as `point + s * direction`.
///
/// The direction is not required to be a unit vector, so abscissae are in
/// units of `direction`'s magnitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line2D {
    pub point: Vector,
    pub direction: Vector,
}

impl Line2D {
    pub fn new(point: Vector, direction: Vector) -> Self {
        Line2D { point, direction }
    }

    /// Line through `p0` (abscissa 0) and `p1` (abscissa 1).
    pub fn from_two_points(p0: Vector, p1: Vector) -> Self {
        Line2D::new(p0, p1 - p0)
    }

    pub fn point_at(&self, s: f64) -> Vector {
        self.point + self.direction * s
    }

    /// Tolerances are relative to the direction magnitudes, so short lines
    /// compare like long ones. A zero direction is parallel to everything.
    pub fn is_parallel(&self, other: &Line2D) -> bool {
        self.direction.cross(other.direction).abs() <= self.tolerance(other)
    }

    pub fn is_orthogonal(&self, other: &Line2D) -> bool {
        self.direction.dot(other.direction).abs() <= self.tolerance(other)
    }

    fn tolerance(&self, other: &Line2D) -> f64 {
        super::EPSILON * self.direction.magnitude() * other.direction.magnitude()
    }

    /// Abscissae `(s1, s2)` of the intersection on `self` and `other`.
    ///
    /// Solves `p1 + s1 d1 = p2 + s2 d2` with cross products; `None` when the
    /// directions are parallel.
    pub fn intersection_abscissae(&self, other: &Line2D) -> Option<(f64, f64)> {
        if self.is_parallel(other) {
            return None;
        }
        let denominator = self.direction.cross(other.direction);
        let delta = other.point - self.point;
        let s1 = delta.cross(other.direction) / denominator;
        let s2 = delta.cross(self.direction) / denominator;
        Some((s1, s2))
    }

    pub fn intersection(&self, other: &Line2D) -> Option<Vector> {
        self.intersection_abscissae(other)
            .map(|(s1, _)| self.point_at(s1))
    }

    /// Signed parametric position of the perpendicular projection of `point`.
    pub fn projected_abscissa(&self, point: Vector) -> f64 {
        (point - self.point).dot(self.direction) / self.direction.magnitude_square()
    }

    pub fn projection(&self, point: Vector) -> Vector {
        self.point_at(self.projected_abscissa(point))
    }

    pub fn distance_to_line(&self, point: Vector) -> f64 {
        self.direction.cross(point - self.point).abs() / self.direction.magnitude()
    }

    /// Parallel line shifted by `offset` along the left-hand normal.
    pub fn shifted_parallel_line(&self, offset: f64) -> Result<Line2D, GeometryError> {
        let normal = self.direction.rotate_90().to_normalized()?;
        Ok(Line2D::new(self.point + normal * offset, self.direction))
    }

    /// Perpendicular line crossing this one at abscissa `s`.
    pub fn orthogonal_line_at(&self, s: f64) -> Line2D {
        Line2D::new(self.point_at(s), self.direction.rotate_90())
    }
}

/// A straight segment between two finite endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub p0: Vector,
    pub p1: Vector,
}

impl Segment {
    pub fn new(p0: Vector, p1: Vector) -> Self {
        Segment { p0, p1 }
    }

    pub fn vector(&self) -> Vector {
        self.p1 - self.p0
    }

    pub fn length(&self) -> f64 {
        self.vector().magnitude()
    }

    pub fn direction(&self) -> Result<UnitVector, GeometryError> {
        self.vector().to_normalized()
    }

    /// Orientation of `p0 -> p1` in [0, 360) degrees.
    pub fn angle(&self) -> Result<f64, GeometryError> {
        self.vector().orientation().map(|a| {
            let a = a.rem_euclid(360.0);
            // rem_euclid rounds tiny negative angles up to 360.0
            if a >= 360.0 { 0.0 } else { a }
        })
    }

    pub fn point_at(&self, t: f64) -> Vector {
        self.p0.lerp(self.p1, t)
    }

    pub fn midpoint(&self) -> Vector {
        self.p0.midpoint(self.p1)
    }

    pub fn to_line(&self) -> Line2D {
        Line2D::from_two_points(self.p0, self.p1)
    }

    /// Intersection of the two segments, if it lies within both.
    pub fn intersection(&self, other: &Segment) -> Option<Vector> {
        let (s1, s2) = self.to_line().intersection_abscissae(&other.to_line())?;
        let within = |s: f64| (0.0..=1.0).contains(&s);
        (within(s1) && within(s2)).then(|| self.point_at(s1))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points([self.p0, self.p1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector, b: Vector, tolerance: f64) {
        assert!(a.distance(b) < tolerance, "expected {b}, got {a}");
    }

    #[test]
    fn intersection_round_trips_through_projection() {
        let cases = [
            ((0.0, 0.0), (10.0, 5.0), (0.0, 8.0), (7.0, -3.0)),
            ((-4.0, 2.0), (3.0, 2.5), (1.0, -6.0), (1.5, 9.0)),
            ((100.0, 100.0), (101.0, 103.0), (0.0, 0.0), (50.0, 1.0)),
        ];
        for (a, b, c, d) in cases {
            let l1 = Line2D::from_two_points(a.into(), b.into());
            let l2 = Line2D::from_two_points(c.into(), d.into());
            let x = l1.intersection(&l2).expect("lines are not parallel");
            assert_close(l1.point_at(l1.projected_abscissa(x)), x, 1e-6);
            assert_close(l2.point_at(l2.projected_abscissa(x)), x, 1e-6);
            assert!(l1.distance_to_line(x) < 1e-6);
            assert!(l2.distance_to_line(x) < 1e-6);
        }
    }

    #[test]
    fn intersection_of_axes() {
        let horizontal = Line2D::new(Vector::new(0.0, 3.0), Vector::new(1.0, 0.0));
        let vertical = Line2D::new(Vector::new(2.0, 0.0), Vector::new(0.0, 1.0));
        assert_eq!(horizontal.intersection(&vertical), Some(Vector::new(2.0, 3.0)));
        assert!(horizontal.is_orthogonal(&vertical));
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let l1 = Line2D::from_two_points(Vector::new(0.0, 0.0), Vector::new(1.0, 1.0));
        let l2 = Line2D::from_two_points(Vector::new(0.0, 1.0), Vector::new(2.0, 3.0));
        assert!(l1.is_parallel(&l2));
        assert_eq!(l1.intersection(&l2), None);
    }

    #[test]
    fn short_lines_keep_their_orientation() {
        let l1 = Line2D::from_two_points(Vector::new(0.0, 0.0), Vector::new(2e-4, 0.0));
        let l2 = Line2D::from_two_points(Vector::new(1e-4, -1e-4), Vector::new(1e-4, 1e-4));
        assert!(!l1.is_parallel(&l2));
        assert!(l1.is_orthogonal(&l2));
        assert_close(l1.intersection(&l2).unwrap(), Vector::new(1e-4, 0.0), 1e-12);

        let l3 = Line2D::from_two_points(Vector::new(0.0, 1e-4), Vector::new(2e-4, 1e-4));
        assert!(l1.is_parallel(&l3));
        assert!(!l1.is_orthogonal(&l3));
    }

    #[test]
    fn degenerate_lines_do_not_intersect() {
        let point = Line2D::new(Vector::new(1.0, 1.0), Vector::ZERO);
        let line = Line2D::new(Vector::new(0.0, 0.0), Vector::new(1.0, 0.0));
        assert_eq!(point.intersection(&line), None);
    }

    #[test]
    fn distance_and_projection() {
        let line = Line2D::new(Vector::new(0.0, 0.0), Vector::new(2.0, 0.0));
        let p = Vector::new(3.0, -4.0);
        assert_eq!(line.distance_to_line(p), 4.0);
        assert_eq!(line.projected_abscissa(p), 1.5);
        assert_eq!(line.projection(p), Vector::new(3.0, 0.0));
    }

    #[test]
    fn shifted_parallel_line_moves_along_left_normal() {
        let line = Line2D::new(Vector::new(1.0, 1.0), Vector::new(4.0, 0.0));
        let shifted = line.shifted_parallel_line(2.0).unwrap();
        assert!(shifted.is_parallel(&line));
        assert_close(shifted.point, Vector::new(1.0, 3.0), 1e-12);
        assert!((line.distance_to_line(shifted.point_at(7.0)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn shifting_a_degenerate_line_fails() {
        let line = Line2D::new(Vector::new(1.0, 1.0), Vector::ZERO);
        assert_eq!(
            line.shifted_parallel_line(1.0),
            Err(GeometryError::ZeroVectorOrientation)
        );
    }

    #[test]
    fn orthogonal_line_at_abscissa() {
        let line = Line2D::new(Vector::new(0.0, 0.0), Vector::new(3.0, 4.0));
        let ortho = line.orthogonal_line_at(2.0);
        assert_eq!(ortho.point, Vector::new(6.0, 8.0));
        assert!(ortho.is_orthogonal(&line));
        assert_close(ortho.intersection(&line).unwrap(), Vector::new(6.0, 8.0), 1e-9);
    }

    #[test]
    fn segment_measures() {
        let s = Segment::new(Vector::new(0.0, 0.0), Vector::new(0.0, -5.0));
        assert_eq!(s.length(), 5.0);
        assert_eq!(s.midpoint(), Vector::new(0.0, -2.5));
        assert!((s.angle().unwrap() - 270.0).abs() < 1e-12);
    }

    #[test]
    fn segment_intersection_is_bounded() {
        let a = Segment::new(Vector::new(0.0, 0.0), Vector::new(4.0, 4.0));
        let b = Segment::new(Vector::new(0.0, 4.0), Vector::new(4.0, 0.0));
        let c = Segment::new(Vector::new(5.0, 0.0), Vector::new(9.0, -4.0));
        assert_close(a.intersection(&b).unwrap(), Vector::new(2.0, 2.0), 1e-12);
        assert_eq!(a.intersection(&c), None);
    }
}
