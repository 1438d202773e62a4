//! Error types with rich diagnostics using miette
//!
//! Formula errors carry the (rewritten) formula text and a span so miette can
//! point at the offending character.

use std::fmt;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::types::{ConstructionKind, NodeId, NodeRef};

// ============================================================================
// Expression Errors
// ============================================================================

/// A formula that does not match the grammar, or calls an unknown function.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("syntax error in `{formula}`: {message}")]
#[diagnostic(code(seamline::expr::syntax))]
pub struct SyntaxError {
    /// The formula as written, before custom names were rewritten.
    pub formula: String,
    pub message: String,
    /// The formula the parser actually saw.
    #[source_code]
    pub parsed_text: String,
    #[label("{message}")]
    pub span: SourceSpan,
}

/// Errors that make a formula's value undefined.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ArithmeticError {
    #[error("division by zero")]
    #[diagnostic(code(seamline::expr::division_by_zero))]
    DivisionByZero,

    #[error("invalid numeric literal `{literal}`")]
    #[diagnostic(code(seamline::expr::invalid_literal))]
    InvalidLiteral { literal: String },

    #[error("{function}({argument}) is undefined")]
    #[diagnostic(code(seamline::expr::domain))]
    Domain { function: &'static str, argument: f64 },

    #[error("result is not a finite number")]
    #[diagnostic(code(seamline::expr::non_finite))]
    NonFinite,
}

// ============================================================================
// Geometry Errors
// ============================================================================

#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("the zero vector has no orientation")]
    #[diagnostic(
        code(seamline::geometry::zero_vector),
        help("the two points defining this direction coincide")
    )]
    ZeroVectorOrientation,

    #[error("lines are parallel")]
    #[diagnostic(code(seamline::geometry::parallel_lines))]
    ParallelLines,
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Why a single calculation (or measurement) could not be evaluated.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown reference {reference}")]
    #[diagnostic(
        code(seamline::calc::unknown_reference),
        help("references must name a calculation that is evaluated before this one")
    )]
    UnknownReference { reference: NodeRef },

    #[error("{reference} is not a point")]
    #[diagnostic(code(seamline::calc::not_a_point))]
    NotAPoint { reference: NodeRef },

    #[error("lines are parallel")]
    #[diagnostic(code(seamline::calc::parallel_lines))]
    ParallelLines,

    #[error("the zero vector has no orientation")]
    #[diagnostic(code(seamline::calc::zero_vector))]
    ZeroVectorOrientation,

    #[error("unresolved expression: {} never became available", .missing.join(", "))]
    #[diagnostic(
        code(seamline::calc::unresolved),
        help("check for misspelled names or circular definitions")
    )]
    UnresolvedExpression { missing: Vec<String> },

    #[error("symbol `{name}` is already published by another owner")]
    #[diagnostic(code(seamline::calc::duplicate_symbol))]
    DuplicateSymbol { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),
}

impl From<GeometryError> for EvalError {
    fn from(e: GeometryError) -> Self {
        match e {
            GeometryError::ZeroVectorOrientation => EvalError::ZeroVectorOrientation,
            GeometryError::ParallelLines => EvalError::ParallelLines,
        }
    }
}

/// An evaluation failure pinned to the node, construction and parameter that caused it.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{kind} {node}{}: {source}", parameter_suffix(.parameter))]
#[diagnostic(code(seamline::calc::node))]
pub struct NodeError {
    pub node: NodeId,
    pub kind: ConstructionKind,
    /// Parameter whose formula or reference failed, when the failure is local to one.
    pub parameter: Option<&'static str>,
    #[source]
    #[diagnostic_source]
    pub source: EvalError,
}

fn parameter_suffix(parameter: &Option<&'static str>) -> String {
    parameter.map(|p| format!(" ({p})")).unwrap_or_default()
}

// ============================================================================
// Graph Errors
// ============================================================================

/// Which formula a [`DraftError::InvalidFormula`] belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaOwner {
    Measurement(String),
    Parameter {
        node: NodeId,
        kind: ConstructionKind,
        parameter: &'static str,
    },
}

impl fmt::Display for FormulaOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaOwner::Measurement(name) => write!(f, "measurement `{name}`"),
            FormulaOwner::Parameter {
                node,
                kind,
                parameter,
            } => write!(f, "`{parameter}` of {kind} {node}"),
        }
    }
}

/// Errors surfaced by [`crate::CalculationGraph`].
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum DraftError {
    #[error("calculation id {id} is already in use")]
    #[diagnostic(code(seamline::graph::duplicate_id))]
    DuplicateId { id: NodeId },

    #[error("no calculation ids left to assign")]
    #[diagnostic(
        code(seamline::graph::ids_exhausted),
        help("give the calculation an explicit unused id")
    )]
    IdsExhausted,

    #[error("calculation name `{name}` is already in use")]
    #[diagnostic(code(seamline::graph::duplicate_name))]
    DuplicateName { name: String },

    #[error("measurement `{name}` is defined twice")]
    #[diagnostic(code(seamline::graph::duplicate_measurement))]
    DuplicateMeasurement { name: String },

    #[error("invalid formula for {owner}")]
    #[diagnostic(code(seamline::graph::invalid_formula))]
    InvalidFormula {
        owner: FormulaOwner,
        #[source]
        #[diagnostic_source]
        source: SyntaxError,
    },

    #[error("measurement `{name}`: {source}")]
    #[diagnostic(code(seamline::graph::measurement))]
    Measurement {
        name: String,
        #[source]
        #[diagnostic_source]
        source: EvalError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Node(#[from] NodeError),
}

impl DraftError {
    /// The node a failure is attached to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            DraftError::DuplicateId { id } => Some(*id),
            DraftError::InvalidFormula {
                owner: FormulaOwner::Parameter { node, .. },
                ..
            } => Some(*node),
            DraftError::Node(e) => Some(e.node),
            _ => None,
        }
    }
}
