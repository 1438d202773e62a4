//! Construction rules
//!
//! Each rule is a small struct holding node references and formulas, built
//! with a pure `new`. [`Construction`] wraps them all and dispatches through
//! [`Construct`].

use enum_dispatch::enum_dispatch;

use crate::errors::{EvalError, GeometryError};
use crate::expr::Expression;
use crate::geometry::{CubicBezier, Line2D, Segment, Vector};
use crate::types::{ConstructionKind, NodeId, NodeRef};

use super::node::Geometry;
use super::scope::{Fault, Scope};

/// A referenced point after resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPoint {
    pub id: NodeId,
    pub name: Option<String>,
    pub position: Vector,
}

/// Which scalar of a node's geometry a published symbol carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    SegmentLength,
    /// Orientation in degrees, in [0, 360).
    SegmentAngle,
    CurveLength,
}

impl Quantity {
    pub fn measure(self, geometry: &Geometry) -> Option<f64> {
        match (self, geometry) {
            (Quantity::SegmentLength, Geometry::Line(s)) => Some(s.length()),
            (Quantity::SegmentAngle, Geometry::Line(s)) => s.angle().ok(),
            (Quantity::CurveLength, Geometry::Curve(c)) => Some(c.length()),
            _ => None,
        }
    }
}

/// A symbol a construction publishes once evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Published {
    pub name: String,
    pub quantity: Quantity,
}

#[enum_dispatch]
pub trait Construct {
    fn kind(&self) -> ConstructionKind;

    /// Referenced nodes, in the order `construct` receives them.
    fn references(&self) -> Vec<(&'static str, &NodeRef)>;

    /// Formula parameters by name.
    fn expressions(&self) -> Vec<(&'static str, &Expression)>;

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)>;

    /// Whether `CurrentLength` is bound to the distance between the first
    /// two references while this construction evaluates.
    fn measures_segment(&self) -> bool {
        false
    }

    /// Compute the geometry from resolved reference positions.
    fn construct(&mut self, points: &[ResolvedPoint], scope: &mut Scope<'_>)
    -> Result<Geometry, Fault>;

    /// Symbols published under the names of the referenced points.
    fn publishes(&self, _endpoints: &[Option<&str>]) -> Vec<Published> {
        Vec::new()
    }
}

#[enum_dispatch(Construct)]
#[derive(Clone, Debug, PartialEq)]
pub enum Construction {
    SinglePoint,
    AlongLinePoint,
    EndLinePoint,
    LineIntersectionPoint,
    NormalPoint,
    AxisIntersectionPoint,
    Line,
    Curve,
}

/// Position of the `i`th reference.
fn point(points: &[ResolvedPoint], i: usize) -> Result<Vector, Fault> {
    points.get(i).map(|p| p.position).ok_or_else(|| {
        Fault::from(EvalError::UnresolvedExpression {
            missing: vec![format!("reference {}", i + 1)],
        })
    })
}

// ============================================================================
// Points
// ============================================================================

/// A free point at `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SinglePoint {
    pub x: Expression,
    pub y: Expression,
}

impl SinglePoint {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        SinglePoint {
            x: Expression::new(x),
            y: Expression::new(y),
        }
    }

    pub fn at(x: f64, y: f64) -> Self {
        SinglePoint {
            x: Expression::constant(x),
            y: Expression::constant(y),
        }
    }
}

impl Construct for SinglePoint {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::SinglePoint
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        Vec::new()
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        vec![("x", &self.x), ("y", &self.y)]
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        vec![("x", &mut self.x), ("y", &mut self.y)]
    }

    fn construct(&mut self, _: &[ResolvedPoint], scope: &mut Scope<'_>) -> Result<Geometry, Fault> {
        let x = scope.evaluate("x", &mut self.x)?;
        let y = scope.evaluate("y", &mut self.y)?;
        Ok(Geometry::Point(Vector::new(x, y)))
    }
}

/// The point `length` along the line from `first` towards `second`.
#[derive(Clone, Debug, PartialEq)]
pub struct AlongLinePoint {
    pub first: NodeRef,
    pub second: NodeRef,
    pub length: Expression,
}

impl AlongLinePoint {
    pub fn new(first: impl Into<NodeRef>, second: impl Into<NodeRef>, length: impl Into<String>) -> Self {
        AlongLinePoint {
            first: first.into(),
            second: second.into(),
            length: Expression::new(length),
        }
    }
}

impl Construct for AlongLinePoint {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::AlongLine
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("first", &self.first), ("second", &self.second)]
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        vec![("length", &self.length)]
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        vec![("length", &mut self.length)]
    }

    fn measures_segment(&self) -> bool {
        true
    }

    fn construct(&mut self, points: &[ResolvedPoint], scope: &mut Scope<'_>) -> Result<Geometry, Fault> {
        let a = point(points, 0)?;
        let b = point(points, 1)?;
        let length = scope.evaluate("length", &mut self.length)?;
        let direction = (b - a).to_normalized()?;
        Ok(Geometry::Point(a + direction * length))
    }
}

/// The point at `length` from `base` in the direction `angle`.
#[derive(Clone, Debug, PartialEq)]
pub struct EndLinePoint {
    pub base: NodeRef,
    pub angle: Expression,
    pub length: Expression,
}

impl EndLinePoint {
    pub fn new(base: impl Into<NodeRef>, angle: impl Into<String>, length: impl Into<String>) -> Self {
        EndLinePoint {
            base: base.into(),
            angle: Expression::new(angle),
            length: Expression::new(length),
        }
    }
}

impl Construct for EndLinePoint {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::EndOfLine
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("base", &self.base)]
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        vec![("angle", &self.angle), ("length", &self.length)]
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        vec![("angle", &mut self.angle), ("length", &mut self.length)]
    }

    fn construct(&mut self, points: &[ResolvedPoint], scope: &mut Scope<'_>) -> Result<Geometry, Fault> {
        let base = point(points, 0)?;
        let angle = scope.evaluate("angle", &mut self.angle)?;
        let length = scope.evaluate("length", &mut self.length)?;
        Ok(Geometry::Point(base + Vector::from_polar(angle, length)))
    }
}

/// Where the line through the first pair of points crosses the line through the second.
#[derive(Clone, Debug, PartialEq)]
pub struct LineIntersectionPoint {
    pub line1_first: NodeRef,
    pub line1_second: NodeRef,
    pub line2_first: NodeRef,
    pub line2_second: NodeRef,
}

impl LineIntersectionPoint {
    pub fn new(
        line1_first: impl Into<NodeRef>,
        line1_second: impl Into<NodeRef>,
        line2_first: impl Into<NodeRef>,
        line2_second: impl Into<NodeRef>,
    ) -> Self {
        LineIntersectionPoint {
            line1_first: line1_first.into(),
            line1_second: line1_second.into(),
            line2_first: line2_first.into(),
            line2_second: line2_second.into(),
        }
    }
}

impl Construct for LineIntersectionPoint {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::LineIntersection
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![
            ("line1_first", &self.line1_first),
            ("line1_second", &self.line1_second),
            ("line2_first", &self.line2_first),
            ("line2_second", &self.line2_second),
        ]
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        Vec::new()
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        Vec::new()
    }

    fn construct(&mut self, points: &[ResolvedPoint], _: &mut Scope<'_>) -> Result<Geometry, Fault> {
        let l1 = Line2D::from_two_points(point(points, 0)?, point(points, 1)?);
        let l2 = Line2D::from_two_points(point(points, 2)?, point(points, 3)?);
        l1.intersection(&l2)
            .map(Geometry::Point)
            .ok_or_else(|| GeometryError::ParallelLines.into())
    }
}

/// The point `length` away from `first`, perpendicular to the line towards
/// `second`, turned a further `angle` degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalPoint {
    pub first: NodeRef,
    pub second: NodeRef,
    pub angle: Expression,
    pub length: Expression,
}

impl NormalPoint {
    pub fn new(first: impl Into<NodeRef>, second: impl Into<NodeRef>, length: impl Into<String>) -> Self {
        NormalPoint {
            first: first.into(),
            second: second.into(),
            angle: Expression::new("0"),
            length: Expression::new(length),
        }
    }

    pub fn with_angle(mut self, angle: impl Into<String>) -> Self {
        self.angle = Expression::new(angle);
        self
    }
}

impl Construct for NormalPoint {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::NormalOffset
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("first", &self.first), ("second", &self.second)]
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        vec![("angle", &self.angle), ("length", &self.length)]
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        vec![("angle", &mut self.angle), ("length", &mut self.length)]
    }

    fn measures_segment(&self) -> bool {
        true
    }

    fn construct(&mut self, points: &[ResolvedPoint], scope: &mut Scope<'_>) -> Result<Geometry, Fault> {
        let a = point(points, 0)?;
        let b = point(points, 1)?;
        let angle = scope.evaluate("angle", &mut self.angle)?;
        let length = scope.evaluate("length", &mut self.length)?;
        let normal = (b - a).to_normalized()?.rotate(90.0 + angle);
        Ok(Geometry::Point(a + normal * length))
    }
}

/// The point with the x of `first` and the y of `second`.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisIntersectionPoint {
    pub first: NodeRef,
    pub second: NodeRef,
}

impl AxisIntersectionPoint {
    pub fn new(first: impl Into<NodeRef>, second: impl Into<NodeRef>) -> Self {
        AxisIntersectionPoint {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl Construct for AxisIntersectionPoint {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::AxisIntersection
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("first", &self.first), ("second", &self.second)]
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        Vec::new()
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        Vec::new()
    }

    fn construct(&mut self, points: &[ResolvedPoint], _: &mut Scope<'_>) -> Result<Geometry, Fault> {
        let a = point(points, 0)?;
        let b = point(points, 1)?;
        Ok(Geometry::Point(Vector::new(a.x(), b.y())))
    }
}

// ============================================================================
// Lines and curves
// ============================================================================

/// A straight segment between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub first: NodeRef,
    pub second: NodeRef,
}

impl Line {
    pub fn new(first: impl Into<NodeRef>, second: impl Into<NodeRef>) -> Self {
        Line {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl Construct for Line {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::Line
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("first", &self.first), ("second", &self.second)]
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        Vec::new()
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        Vec::new()
    }

    fn construct(&mut self, points: &[ResolvedPoint], _: &mut Scope<'_>) -> Result<Geometry, Fault> {
        Ok(Geometry::Line(Segment::new(point(points, 0)?, point(points, 1)?)))
    }

    fn publishes(&self, endpoints: &[Option<&str>]) -> Vec<Published> {
        match endpoints {
            [Some(a), Some(b)] => vec![
                Published {
                    name: format!("Line_{a}_{b}"),
                    quantity: Quantity::SegmentLength,
                },
                Published {
                    name: format!("AngleLine_{a}_{b}"),
                    quantity: Quantity::SegmentAngle,
                },
            ],
            _ => Vec::new(),
        }
    }
}

/// A cubic Bezier between two points, each end steered by an angle and a length.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub first: NodeRef,
    pub second: NodeRef,
    pub angle1: Expression,
    pub length1: Expression,
    pub angle2: Expression,
    pub length2: Expression,
}

impl Curve {
    pub fn new(
        first: impl Into<NodeRef>,
        second: impl Into<NodeRef>,
        (angle1, length1): (impl Into<String>, impl Into<String>),
        (angle2, length2): (impl Into<String>, impl Into<String>),
    ) -> Self {
        Curve {
            first: first.into(),
            second: second.into(),
            angle1: Expression::new(angle1),
            length1: Expression::new(length1),
            angle2: Expression::new(angle2),
            length2: Expression::new(length2),
        }
    }
}

impl Construct for Curve {
    fn kind(&self) -> ConstructionKind {
        ConstructionKind::Curve
    }

    fn references(&self) -> Vec<(&'static str, &NodeRef)> {
        vec![("first", &self.first), ("second", &self.second)]
    }

    fn expressions(&self) -> Vec<(&'static str, &Expression)> {
        vec![
            ("angle1", &self.angle1),
            ("length1", &self.length1),
            ("angle2", &self.angle2),
            ("length2", &self.length2),
        ]
    }

    fn expressions_mut(&mut self) -> Vec<(&'static str, &mut Expression)> {
        vec![
            ("angle1", &mut self.angle1),
            ("length1", &mut self.length1),
            ("angle2", &mut self.angle2),
            ("length2", &mut self.length2),
        ]
    }

    fn construct(&mut self, points: &[ResolvedPoint], scope: &mut Scope<'_>) -> Result<Geometry, Fault> {
        let p1 = point(points, 0)?;
        let p2 = point(points, 1)?;
        let angle1 = scope.evaluate("angle1", &mut self.angle1)?;
        let length1 = scope.evaluate("length1", &mut self.length1)?;
        let angle2 = scope.evaluate("angle2", &mut self.angle2)?;
        let length2 = scope.evaluate("length2", &mut self.length2)?;
        Ok(Geometry::Curve(CubicBezier::new(
            p1,
            p1 + Vector::from_polar(angle1, length1),
            p2 + Vector::from_polar(angle2, length2),
            p2,
        )))
    }

    fn publishes(&self, endpoints: &[Option<&str>]) -> Vec<Published> {
        match endpoints {
            [Some(a), Some(b)] => vec![Published {
                name: format!("Spl_{a}_{b}"),
                quantity: Quantity::CurveLength,
            }],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;

    fn resolved(points: &[(f64, f64)]) -> Vec<ResolvedPoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| ResolvedPoint {
                id: NodeId(i as u32 + 1),
                name: None,
                position: Vector::new(x, y),
            })
            .collect()
    }

    fn construct(c: &mut Construction, points: &[(f64, f64)]) -> Result<Geometry, Fault> {
        let table = SymbolTable::new();
        let mut scope = Scope::new(&table);
        c.construct(&resolved(points), &mut scope)
    }

    fn point_of(g: Result<Geometry, Fault>) -> Vector {
        match g {
            Ok(Geometry::Point(p)) => p,
            other => panic!("expected a point, got {other:?}"),
        }
    }

    fn close(a: Vector, b: Vector) -> bool {
        a.distance(b) < 1e-9
    }

    // ==================== Point tests ====================

    #[test]
    fn along_line_walks_towards_second_point() {
        let mut c = Construction::from(AlongLinePoint::new("A", "B", "4"));
        let p = point_of(construct(&mut c, &[(0.0, 0.0), (10.0, 0.0)]));
        assert!(close(p, Vector::new(4.0, 0.0)));
    }

    #[test]
    fn along_line_with_coincident_points_fails() {
        let mut c = Construction::from(AlongLinePoint::new("A", "B", "4"));
        let fault = construct(&mut c, &[(1.0, 1.0), (1.0, 1.0)]).unwrap_err();
        assert_eq!(fault.error, EvalError::ZeroVectorOrientation);
    }

    #[test]
    fn end_line_uses_counter_clockwise_degrees() {
        let mut east = Construction::from(EndLinePoint::new("A", "0", "10"));
        let mut north = Construction::from(EndLinePoint::new("A", "90", "10"));
        assert!(close(point_of(construct(&mut east, &[(0.0, 0.0)])), Vector::new(10.0, 0.0)));
        assert!(close(point_of(construct(&mut north, &[(0.0, 0.0)])), Vector::new(0.0, 10.0)));
    }

    #[test]
    fn line_intersection() {
        let mut c = Construction::from(LineIntersectionPoint::new("A", "B", "C", "D"));
        let p = point_of(construct(
            &mut c,
            &[(0.0, 0.0), (2.0, 2.0), (0.0, 2.0), (2.0, 0.0)],
        ));
        assert!(close(p, Vector::new(1.0, 1.0)));
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let mut c = Construction::from(LineIntersectionPoint::new("A", "B", "C", "D"));
        let fault = construct(&mut c, &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]).unwrap_err();
        assert_eq!(fault.error, EvalError::ParallelLines);
    }

    #[test]
    fn normal_point_turns_left_of_the_line() {
        let mut c = Construction::from(NormalPoint::new("A", "B", "3"));
        let p = point_of(construct(&mut c, &[(0.0, 0.0), (5.0, 0.0)]));
        assert!(close(p, Vector::new(0.0, 3.0)));

        let mut turned = Construction::from(NormalPoint::new("A", "B", "3").with_angle("90"));
        let p = point_of(construct(&mut turned, &[(0.0, 0.0), (5.0, 0.0)]));
        assert!(close(p, Vector::new(-3.0, 0.0)));
    }

    #[test]
    fn axis_intersection_mixes_coordinates() {
        let mut c = Construction::from(AxisIntersectionPoint::new("A", "B"));
        let p = point_of(construct(&mut c, &[(3.0, 7.0), (-1.0, 2.0)]));
        assert!(close(p, Vector::new(3.0, 2.0)));
    }

    #[test]
    fn unresolved_formula_names_its_parameter() {
        let mut c = Construction::from(SinglePoint::new("0", "front_length"));
        let fault = construct(&mut c, &[]).unwrap_err();
        assert_eq!(fault.parameter, Some("y"));
        assert_eq!(
            fault.error,
            EvalError::UnresolvedExpression {
                missing: vec!["front_length".into()]
            }
        );
    }

    // ==================== Line and curve tests ====================

    #[test]
    fn curve_control_points_follow_angles() {
        let mut c = Construction::from(Curve::new("A", "B", ("0", "2"), ("90", "3")));
        match construct(&mut c, &[(0.0, 0.0), (10.0, 0.0)]) {
            Ok(Geometry::Curve(curve)) => {
                let [p0, p1, p2, p3] = curve.control_points();
                assert!(close(p0, Vector::new(0.0, 0.0)));
                assert!(close(p1, Vector::new(2.0, 0.0)));
                assert!(close(p2, Vector::new(10.0, 3.0)));
                assert!(close(p3, Vector::new(10.0, 0.0)));
            }
            other => panic!("expected a curve, got {other:?}"),
        }
    }

    #[test]
    fn published_symbols_need_named_endpoints() {
        let line = Construction::from(Line::new("A", "B"));
        let names: Vec<_> = line
            .publishes(&[Some("A"), Some("B")])
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Line_A_B", "AngleLine_A_B"]);
        assert!(line.publishes(&[Some("A"), None]).is_empty());

        let curve = Construction::from(Curve::new("A", "B", ("0", "1"), ("180", "1")));
        assert_eq!(curve.publishes(&[Some("A"), Some("B")])[0].name, "Spl_A_B");
    }

    #[test]
    fn segment_angle_is_normalized() {
        let g = Geometry::Line(Segment::new(Vector::new(0.0, 0.0), Vector::new(0.0, -1.0)));
        let angle = Quantity::SegmentAngle.measure(&g).unwrap();
        assert!((angle - 270.0).abs() < 1e-9);
        assert_eq!(Quantity::CurveLength.measure(&g), None);
    }
}
