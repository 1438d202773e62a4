//! Quadratic and cubic Bezier segments.
//!
//! Quadratic segments have an exact closed-form arc length. Cubic segments do
//! not; their length is obtained by adaptive subdivision into pieces that are
//! each close enough to their mid-point quadratic approximation, and summing
//! the exact lengths of those quadratics.
//!
//! Both kinds also provide a brute-force [`BezierCurve::line_interpolation_length`]
//! so the two methods can be cross-checked.

use super::bbox::BoundingBox;
use super::vector::Vector;

/// Maximum distance allowed between a cubic piece and its quadratic approximation.
pub const INTERPOLATION_PRECISION: f64 = 1e-3;

/// Arc step used when flattening a curve into a polyline to measure it.
pub const LINE_INTERPOLATION_STEP: f64 = 0.05;

/// Weights and abscissae on [-1, 1].
const GAUSS_LEGENDRE_5: [(f64, f64); 5] = [
    (0.5688888888888889, 0.0000000000000000),
    (0.4786286704993665, -0.5384693101056831),
    (0.4786286704993665, 0.5384693101056831),
    (0.2369268850561891, -0.9061798459386640),
    (0.2369268850561891, 0.9061798459386640),
];

/// Behaviour shared by the Bezier segment types.
pub trait BezierCurve {
    fn start(&self) -> Vector;
    fn end(&self) -> Vector;
    fn point_at(&self, t: f64) -> Vector;
    /// First derivative with respect to `t`.
    fn tangent_at(&self, t: f64) -> Vector;
    fn control_polygon_length(&self) -> f64;

    /// Length of the polyline through samples spaced roughly
    /// [`LINE_INTERPOLATION_STEP`] apart along the control polygon.
    fn line_interpolation_length(&self) -> f64 {
        let steps = (self.control_polygon_length() / LINE_INTERPOLATION_STEP)
            .ceil()
            .max(1.0) as usize;
        let mut previous = self.start();
        let mut length = 0.0;
        for i in 1..=steps {
            let point = self.point_at(i as f64 / steps as f64);
            length += point.distance(previous);
            previous = point;
        }
        length
    }
}

// ============================================================================
// Quadratic
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadraticBezier {
    pub p0: Vector,
    pub p1: Vector,
    pub p2: Vector,
}

impl QuadraticBezier {
    pub fn new(p0: Vector, p1: Vector, p2: Vector) -> Self {
        QuadraticBezier { p0, p1, p2 }
    }

    /// De Casteljau split into `[0, t]` and `[t, 1]`.
    pub fn split_at(&self, t: f64) -> (QuadraticBezier, QuadraticBezier) {
        let a = self.p0.lerp(self.p1, t);
        let b = self.p1.lerp(self.p2, t);
        let mid = a.lerp(b, t);
        (
            QuadraticBezier::new(self.p0, a, mid),
            QuadraticBezier::new(mid, b, self.p2),
        )
    }

    /// Exact arc length.
    ///
    /// With `A0 = P1 - P0` and `A1 = P0 - 2 P1 + P2` the squared speed is
    /// `c t² + b t + a` where `c = 4 A1·A1`, `b = 8 A0·A1`, `a = 4 A0·A0`, whose
    /// square root has a closed-form integral.
    pub fn length(&self) -> f64 {
        let a0 = self.p1 - self.p0;
        let a1 = self.p0 - self.p1 * 2.0 + self.p2;
        if a1.is_zero() {
            return 2.0 * a0.magnitude();
        }
        if a1.magnitude_square() <= 1e-6 * a0.magnitude_square() {
            // Nearly straight: the closed form cancels catastrophically here.
            return GAUSS_LEGENDRE_5
                .iter()
                .map(|&(w, x)| w * ((a0 + a1 * (0.5 * x + 0.5)) * 2.0).magnitude())
                .sum::<f64>()
                * 0.5;
        }

        let c = 4.0 * a1.dot(a1);
        let b = 8.0 * a0.dot(a1);
        let a = 4.0 * a0.dot(a0);
        let q = 4.0 * a * c - b * b;

        if q.abs() <= 1e-12 * (4.0 * a * c + b * b) {
            // Collinear control points: speed is sqrt(c) |t - t0|.
            let t0 = -b / (2.0 * c);
            let primitive = |t: f64| (t - t0) * (t - t0).abs() / 2.0;
            return c.sqrt() * (primitive(1.0) - primitive(0.0));
        }

        let two_c_b = 2.0 * c + b;
        let sum_cba = c + b + a;
        let l0 = (0.25 / c) * (two_c_b * sum_cba.sqrt() - b * a.sqrt());
        let l1 = (q / (8.0 * c.powf(1.5)))
            * ((2.0 * (c * sum_cba).sqrt() + two_c_b).ln() - (2.0 * (c * a).sqrt() + b).ln());
        l0 + l1
    }

    /// Exact bounds, including the extremum where the derivative vanishes.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::from_points([self.p0, self.p2]);
        let denominator = self.p0 - self.p1 * 2.0 + self.p2;
        let numerator = self.p0 - self.p1;
        for (n, d) in [(numerator.x(), denominator.x()), (numerator.y(), denominator.y())] {
            if d != 0.0 {
                let t = n / d;
                if t > 0.0 && t < 1.0 {
                    bbox.expand_point(self.point_at(t));
                }
            }
        }
        bbox
    }
}

impl BezierCurve for QuadraticBezier {
    fn start(&self) -> Vector {
        self.p0
    }

    fn end(&self) -> Vector {
        self.p2
    }

    fn point_at(&self, t: f64) -> Vector {
        let u = 1.0 - t;
        self.p0 * (u * u) + self.p1 * (2.0 * t * u) + self.p2 * (t * t)
    }

    fn tangent_at(&self, t: f64) -> Vector {
        ((self.p1 - self.p0) * (1.0 - t) + (self.p2 - self.p1) * t) * 2.0
    }

    fn control_polygon_length(&self) -> f64 {
        self.p0.distance(self.p1) + self.p1.distance(self.p2)
    }
}

// ============================================================================
// Cubic
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub p0: Vector,
    pub p1: Vector,
    pub p2: Vector,
    pub p3: Vector,
}

impl CubicBezier {
    pub fn new(p0: Vector, p1: Vector, p2: Vector, p3: Vector) -> Self {
        CubicBezier { p0, p1, p2, p3 }
    }

    pub fn control_points(&self) -> [Vector; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }

    /// De Casteljau split into `[0, t]` and `[t, 1]`.
    pub fn split_at(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let a = self.p0.lerp(self.p1, t);
        let b = self.p1.lerp(self.p2, t);
        let c = self.p2.lerp(self.p3, t);
        let ab = a.lerp(b, t);
        let bc = b.lerp(c, t);
        let mid = ab.lerp(bc, t);
        (
            CubicBezier::new(self.p0, a, ab, mid),
            CubicBezier::new(mid, bc, c, self.p3),
        )
    }

    /// Quadratic sharing the end points, with the control point at the mean of
    /// the 0th- and 1st-order approximations.
    pub fn mid_point_quadratic_approximation(&self) -> QuadraticBezier {
        let control = ((self.p1 + self.p2) * 3.0 - self.p0 - self.p3) / 4.0;
        QuadraticBezier::new(self.p0, control, self.p3)
    }

    /// Distance between the control points of the 0th-order (`(3 P1 - P0) / 2`)
    /// and 1st-order (`(3 P2 - P3) / 2`) quadratic approximations.
    fn approximation_spread(&self) -> f64 {
        let q0 = (self.p1 * 3.0 - self.p0) / 2.0;
        let q1 = (self.p2 * 3.0 - self.p3) / 2.0;
        q0.distance(q1)
    }

    /// Largest parameter for which the piece `[0, t]` stays within
    /// [`INTERPOLATION_PRECISION`] of its mid-point quadratic approximation.
    ///
    /// The approximation error is bounded by `√3/18 · d · t³`.
    pub fn t_max(&self) -> f64 {
        let spread = self.approximation_spread();
        if spread == 0.0 {
            return f64::INFINITY;
        }
        (18.0 / 3f64.sqrt() * INTERPOLATION_PRECISION / spread).cbrt()
    }

    /// Adaptive mid-point quadratic approximation of the arc length.
    pub fn length(&self) -> f64 {
        let mut remaining = *self;
        let mut length = 0.0;
        loop {
            let t = remaining.t_max();
            // NaN (non-finite control points) also ends the walk.
            if !(t < 1.0) {
                return length + remaining.mid_point_quadratic_approximation().length();
            }
            let (head, tail) = remaining.split_at(t);
            length += head.mid_point_quadratic_approximation().length();
            remaining = tail;
        }
    }

    /// Exact bounds from the roots of the derivative.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::from_points([self.p0, self.p3]);
        let a = -self.p0 + self.p1 * 3.0 - self.p2 * 3.0 + self.p3;
        let b = (self.p0 - self.p1 * 2.0 + self.p2) * 2.0;
        let c = self.p1 - self.p0;
        for (a, b, c) in [(a.x(), b.x(), c.x()), (a.y(), b.y(), c.y())] {
            for t in unit_interval_roots(a, b, c).into_iter().flatten() {
                bbox.expand_point(self.point_at(t));
            }
        }
        bbox
    }
}

impl BezierCurve for CubicBezier {
    fn start(&self) -> Vector {
        self.p0
    }

    fn end(&self) -> Vector {
        self.p3
    }

    fn point_at(&self, t: f64) -> Vector {
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    fn tangent_at(&self, t: f64) -> Vector {
        let u = 1.0 - t;
        ((self.p1 - self.p0) * (u * u)
            + (self.p2 - self.p1) * (2.0 * u * t)
            + (self.p3 - self.p2) * (t * t))
            * 3.0
    }

    fn control_polygon_length(&self) -> f64 {
        self.p0.distance(self.p1) + self.p1.distance(self.p2) + self.p2.distance(self.p3)
    }
}

/// Roots of `a t² + b t + c` strictly inside (0, 1).
fn unit_interval_roots(a: f64, b: f64, c: f64) -> [Option<f64>; 2] {
    let inside = |t: f64| (t > 0.0 && t < 1.0).then_some(t);
    if a.abs() < 1e-12 {
        if b == 0.0 {
            return [None, None];
        }
        return [inside(-c / b), None];
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return [None, None];
    }
    let root = discriminant.sqrt();
    [inside((-b + root) / (2.0 * a)), inside((-b - root) / (2.0 * a))]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vector {
        Vector::new(x, y)
    }

    fn assert_close(a: Vector, b: Vector, tolerance: f64) {
        assert!(a.distance(b) < tolerance, "expected {b}, got {a}");
    }

    // ==================== Quadratic tests ====================

    #[test]
    fn quadratic_length_matches_line_interpolation() {
        let q = QuadraticBezier::new(v(0.0, 0.0), v(5.0, 5.0), v(10.0, 0.0));
        let exact = q.length();
        let interpolated = q.line_interpolation_length();
        assert!((exact - interpolated).abs() < 1e-4, "{exact} vs {interpolated}");
    }

    #[test]
    fn quadratic_halves_sum_to_whole() {
        let q = QuadraticBezier::new(v(0.0, 0.0), v(5.0, 5.0), v(10.0, 0.0));
        let (left, right) = q.split_at(0.5);
        assert_eq!(left.p2, right.p0);
        assert_close(left.p2, q.point_at(0.5), 1e-12);
        assert!((left.length() + right.length() - q.length()).abs() < 1e-4);
    }

    #[test]
    fn quadratic_with_zero_second_difference_is_straight() {
        let q = QuadraticBezier::new(v(0.0, 0.0), v(3.0, 4.0), v(6.0, 8.0));
        assert_eq!(q.length(), 10.0);
    }

    #[test]
    fn quadratic_nearly_straight_is_stable() {
        // Rounding noise from trigonometry leaves a tiny second difference.
        let q = QuadraticBezier::new(v(0.0, 0.0), v(5.0, 2.755e-16), v(10.0, 0.0));
        assert!((q.length() - 10.0).abs() < 1e-9, "{}", q.length());

        let q = QuadraticBezier::new(v(0.0, 0.0), v(5.0, 0.001), v(10.0, 0.0));
        assert!((q.length() - q.line_interpolation_length()).abs() < 1e-6);
    }

    #[test]
    fn quadratic_collinear_turnaround() {
        // Goes out to x = 5 and comes back to x = 5 -> 5 + ... travelled distance.
        let q = QuadraticBezier::new(v(0.0, 0.0), v(10.0, 0.0), v(5.0, 0.0));
        let exact = q.length();
        assert!(exact.is_finite());
        assert!((exact - q.line_interpolation_length()).abs() < 1e-6);
        assert!((exact - 25.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn quadratic_tangent_at_ends() {
        let q = QuadraticBezier::new(v(0.0, 0.0), v(5.0, 5.0), v(10.0, 0.0));
        assert_eq!(q.tangent_at(0.0), v(10.0, 10.0));
        assert_eq!(q.tangent_at(1.0), v(10.0, -10.0));
    }

    #[test]
    fn quadratic_bounding_box_includes_apex() {
        let q = QuadraticBezier::new(v(0.0, 0.0), v(5.0, 5.0), v(10.0, 0.0));
        let bbox = q.bounding_box();
        assert_eq!(bbox.min, v(0.0, 0.0));
        assert_close(bbox.max, v(10.0, 2.5), 1e-12);
    }

    // ==================== Cubic tests ====================

    fn cubic_cases() -> [CubicBezier; 2] {
        let (p0, p1, p2, p3) = (v(0.0, 0.0), v(3.0, 5.0), v(6.0, 5.0), v(10.0, 0.0));
        [
            CubicBezier::new(p0, p1, p2, p3),
            // Self-intersecting control polygon.
            CubicBezier::new(p0, p2, p1, p3),
        ]
    }

    #[test]
    fn cubic_mid_point_approximation_is_close() {
        for curve in cubic_cases() {
            let approx = curve.mid_point_quadratic_approximation().length();
            let reference = curve.line_interpolation_length();
            assert!((approx - reference).abs() < 1.0, "{approx} vs {reference}");
        }
    }

    #[test]
    fn cubic_adaptive_length_matches_line_interpolation() {
        for curve in cubic_cases() {
            let adaptive = curve.length();
            let reference = curve.line_interpolation_length();
            assert!((adaptive - reference).abs() < 1e-3, "{adaptive} vs {reference}");
        }
    }

    #[test]
    fn cubic_split_is_exact() {
        let curve = cubic_cases()[0];
        let (left, right) = curve.split_at(0.3);
        assert_close(left.p3, curve.point_at(0.3), 1e-12);
        assert_close(left.point_at(0.5), curve.point_at(0.15), 1e-12);
        assert_close(right.point_at(0.5), curve.point_at(0.65), 1e-12);
        assert!((left.length() + right.length() - curve.length()).abs() < 1e-3);
    }

    #[test]
    fn cubic_that_is_a_quadratic_needs_no_subdivision() {
        // Degree-elevated quadratic: (0,0) (5,5) (10,0).
        let q = QuadraticBezier::new(v(0.0, 0.0), v(5.0, 5.0), v(10.0, 0.0));
        let c = CubicBezier::new(
            q.p0,
            q.p0 + (q.p1 - q.p0) * (2.0 / 3.0),
            q.p2 + (q.p1 - q.p2) * (2.0 / 3.0),
            q.p2,
        );
        assert!(c.t_max() > 1.0);
        assert!((c.length() - q.length()).abs() < 1e-9);
    }

    #[test]
    fn cubic_tangent_at_ends_follows_control_polygon() {
        let curve = cubic_cases()[0];
        assert_eq!(curve.tangent_at(0.0), v(9.0, 15.0));
        assert_eq!(curve.tangent_at(1.0), v(12.0, -15.0));
    }

    #[test]
    fn cubic_bounding_box() {
        let curve = cubic_cases()[0];
        let bbox = curve.bounding_box();
        assert_eq!(bbox.min, v(0.0, 0.0));
        assert!((bbox.max.x() - 10.0).abs() < 1e-12);
        // Apex lies below the control points.
        assert!(bbox.max.y() > 3.7 && bbox.max.y() < 5.0);
        for i in 0..=20 {
            assert!(bbox.contains(curve.point_at(i as f64 / 20.0)));
        }
    }
}
