//! Calculation nodes and the descriptors they are created from.

use std::collections::BTreeSet;

use crate::geometry::{BoundingBox, CubicBezier, Segment, Vector};
use crate::types::{ConstructionKind, Dependency, NodeId, Presentation};

use super::construction::{Construct, Construction};

/// Computed output of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    Point(Vector),
    Line(Segment),
    Curve(CubicBezier),
}

impl Geometry {
    pub fn as_point(&self) -> Option<Vector> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Geometry::Point(p) => BoundingBox::from_points([*p]),
            Geometry::Line(s) => s.bounding_box(),
            Geometry::Curve(c) => c.bounding_box(),
        }
    }
}

/// Everything needed to add one calculation to a graph.
#[derive(Clone, Debug, PartialEq)]
pub struct CalculationDescriptor {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub construction: Construction,
    pub presentation: Presentation,
}

impl CalculationDescriptor {
    pub fn new(construction: impl Into<Construction>) -> Self {
        CalculationDescriptor {
            id: None,
            name: None,
            construction: construction.into(),
            presentation: Presentation::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }
}

/// One construction step inside a graph.
#[derive(Clone, Debug)]
pub struct CalculationNode {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) construction: Construction,
    pub(crate) presentation: Presentation,
    pub(crate) geometry: Option<Geometry>,
    pub(crate) dependencies: BTreeSet<Dependency>,
}

impl CalculationNode {
    pub(crate) fn new(id: NodeId, descriptor: CalculationDescriptor) -> Self {
        CalculationNode {
            id,
            name: descriptor.name,
            construction: descriptor.construction,
            presentation: descriptor.presentation,
            geometry: None,
            dependencies: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> ConstructionKind {
        self.construction.kind()
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// `None` until the node has been evaluated in the current pass.
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn position(&self) -> Option<Vector> {
        self.geometry.as_ref().and_then(Geometry::as_point)
    }

    /// Nodes and measurements read during the last evaluation.
    pub fn dependencies(&self) -> &BTreeSet<Dependency> {
        &self.dependencies
    }

    /// `#id`, or `name (#id)` for named nodes.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} ({})", self.id),
            None => self.id.to_string(),
        }
    }

    /// Forget everything computed by the previous pass.
    pub(crate) fn reset(&mut self) {
        self.geometry = None;
        self.dependencies.clear();
        for (_, expression) in self.construction.expressions_mut() {
            expression.invalidate();
        }
    }
}
