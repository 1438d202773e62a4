//! Identifiers and small value types shared across the crate.

use std::fmt;

use crate::geometry::Vector;

/// Stable identifier of a calculation node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The following id, or `None` past `u32::MAX`.
    pub fn next(self) -> Option<NodeId> {
        self.0.checked_add(1).map(NodeId)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a descriptor points at an earlier calculation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Id(NodeId),
    Name(String),
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        NodeRef::Id(id)
    }
}

impl From<u32> for NodeRef {
    fn from(id: u32) -> Self {
        NodeRef::Id(NodeId(id))
    }
}

impl From<&str> for NodeRef {
    fn from(name: &str) -> Self {
        NodeRef::Name(name.to_string())
    }
}

impl From<String> for NodeRef {
    fn from(name: String) -> Self {
        NodeRef::Name(name)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Id(id) => write!(f, "{id}"),
            NodeRef::Name(name) => write!(f, "`{name}`"),
        }
    }
}

/// The construction rule a node follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstructionKind {
    SinglePoint,
    AlongLine,
    EndOfLine,
    LineIntersection,
    NormalOffset,
    AxisIntersection,
    Line,
    Curve,
}

impl ConstructionKind {
    pub fn is_point(self) -> bool {
        !matches!(self, ConstructionKind::Line | ConstructionKind::Curve)
    }
}

impl fmt::Display for ConstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstructionKind::SinglePoint => "single point",
            ConstructionKind::AlongLine => "along-line point",
            ConstructionKind::EndOfLine => "end-of-line point",
            ConstructionKind::LineIntersection => "line-intersection point",
            ConstructionKind::NormalOffset => "normal point",
            ConstructionKind::AxisIntersection => "axis-intersection point",
            ConstructionKind::Line => "line",
            ConstructionKind::Curve => "curve",
        };
        f.write_str(s)
    }
}

/// Something a node consumed while it was evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dependency {
    Node(NodeId),
    /// Canonical symbol name of a measurement.
    Measurement(String),
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Node(id) => write!(f, "{id}"),
            Dependency::Measurement(name) => write!(f, "measurement `{name}`"),
        }
    }
}

/// A recorded `from -> to` edge of the calculation graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub from: NodeId,
    pub to: Dependency,
}

/// Stroke style carried for renderers. Names follow the pattern file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineStyle {
    None,
    #[default]
    Hair,
    DashLine,
    DotLine,
    DashDotLine,
    DashDotDotLine,
}

impl LineStyle {
    pub fn from_name(name: &str) -> Option<LineStyle> {
        Some(match name {
            "none" => LineStyle::None,
            "hair" => LineStyle::Hair,
            "dashLine" => LineStyle::DashLine,
            "dotLine" => LineStyle::DotLine,
            "dashDotLine" => LineStyle::DashDotLine,
            "dashDotDotLine" => LineStyle::DashDotDotLine,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            LineStyle::None => "none",
            LineStyle::Hair => "hair",
            LineStyle::DashLine => "dashLine",
            LineStyle::DotLine => "dotLine",
            LineStyle::DashDotLine => "dashDotLine",
            LineStyle::DashDotDotLine => "dashDotDotLine",
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Presentation metadata stored for renderers; never interpreted by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    pub line_style: LineStyle,
    pub line_color: String,
    /// Offset of the name label from the point it annotates.
    pub label_offset: Vector,
}

impl Default for Presentation {
    fn default() -> Self {
        Presentation {
            line_style: LineStyle::default(),
            line_color: "black".to_string(),
            label_offset: Vector::ZERO,
        }
    }
}
