//! Parametric garment-pattern drafting.
//!
//! Body measurements and construction steps go in; points, lines and cubic
//! curves come out. Formulas in the steps may reference measurements, the
//! lengths and angles of earlier lines, and `CurrentLength` while a point is
//! being measured along a segment.

use pest_derive::Parser;

pub mod ast;
pub mod calc;
pub mod errors;
pub mod expr;
pub mod geometry;
mod log;
pub mod parse;
pub mod symbols;
pub mod types;

pub use calc::{
    AlongLinePoint, AxisIntersectionPoint, CalculationDescriptor, CalculationGraph,
    CalculationNode, Construct, Construction, Curve, EndLinePoint, EvaluationOrder, Geometry,
    GraphOptions, Line, LineIntersectionPoint, Measurement, MeasurementDescriptor, NormalPoint,
    SinglePoint,
};
pub use errors::{ArithmeticError, DraftError, EvalError, GeometryError, NodeError, SyntaxError};
pub use expr::{Evaluation, Expression, ParsedExpression};
pub use symbols::{CURRENT_LENGTH, SymbolTable};
pub use types::{ConstructionKind, Dependency, DependencyEdge, LineStyle, NodeId, NodeRef, Presentation};

#[derive(Parser)]
#[grammar = "formula.pest"]
pub struct FormulaParser;
