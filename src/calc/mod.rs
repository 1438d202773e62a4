//! Calculation graph
//!
//! This module is organized into submodules:
//! - `construction`: the construction rules and their dispatch
//! - `node`: nodes, descriptors and computed geometry
//! - `measurement`: measurement descriptors and their resolution
//! - `order`: declaration and topological evaluation order
//! - `scope`: the symbol view a construction evaluates against

pub mod construction;
pub mod measurement;
pub mod node;
pub mod order;
pub mod scope;

use std::collections::{BTreeSet, HashMap};

use crate::errors::{DraftError, EvalError, FormulaOwner, NodeError};
use crate::geometry::BoundingBox;
use crate::log::{debug, warn};
use crate::parse::canonical_name;
use crate::symbols::{CURRENT_LENGTH, SymbolOwner, SymbolTable};
use crate::types::{Dependency, DependencyEdge, NodeId, NodeRef};

pub use construction::{
    AlongLinePoint, AxisIntersectionPoint, Construct, Construction, Curve, EndLinePoint, Line,
    LineIntersectionPoint, NormalPoint, Published, Quantity, ResolvedPoint, SinglePoint,
};
pub use measurement::{Measurement, MeasurementDescriptor};
pub use node::{CalculationDescriptor, CalculationNode, Geometry};
pub use scope::{Fault, Scope};

/// How a pass orders its nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EvaluationOrder {
    /// Insertion order; referring to a later node is an error.
    Declaration,
    /// Dependency order, falling back to insertion order among independent nodes.
    #[default]
    Topological,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GraphOptions {
    pub order: EvaluationOrder,
}

/// Measurements plus an ordered list of construction steps.
#[derive(Clone, Debug)]
pub struct CalculationGraph {
    options: GraphOptions,
    symbols: SymbolTable,
    measurements: Vec<Measurement>,
    nodes: Vec<CalculationNode>,
    index: HashMap<NodeId, usize>,
    names: HashMap<String, NodeId>,
    /// `None` once every id has been handed out.
    next_id: Option<NodeId>,
    /// Evaluation order of the last pass, followed by nodes it never reached.
    order: Vec<usize>,
    edges: Vec<DependencyEdge>,
}

impl Default for CalculationGraph {
    fn default() -> Self {
        CalculationGraph::with_options(GraphOptions::default())
    }
}

impl CalculationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GraphOptions) -> Self {
        CalculationGraph {
            options,
            symbols: SymbolTable::new(),
            measurements: Vec::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
            names: HashMap::new(),
            next_id: Some(NodeId(1)),
            order: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    // ========================================================================
    // Building
    // ========================================================================

    pub fn add_measurement(&mut self, descriptor: MeasurementDescriptor) -> Result<(), DraftError> {
        let name = descriptor.display_name();
        let canonical = canonical_name(&name);
        if self
            .measurements
            .iter()
            .any(|m| m.canonical_name() == canonical)
        {
            return Err(DraftError::DuplicateMeasurement { name });
        }
        self.measurements.push(Measurement::new(descriptor)?);
        Ok(())
    }

    /// Store a node without evaluating it.
    pub fn add(&mut self, mut descriptor: CalculationDescriptor) -> Result<NodeId, DraftError> {
        let id = match descriptor.id {
            Some(id) if self.index.contains_key(&id) => return Err(DraftError::DuplicateId { id }),
            Some(id) => id,
            None => self.next_id.ok_or(DraftError::IdsExhausted)?,
        };
        if let Some(name) = &descriptor.name {
            if self.names.contains_key(name) {
                return Err(DraftError::DuplicateName { name: name.clone() });
            }
        }

        let kind = descriptor.construction.kind();
        for (parameter, expression) in descriptor.construction.expressions_mut() {
            expression
                .parse()
                .map_err(|source| DraftError::InvalidFormula {
                    owner: FormulaOwner::Parameter {
                        node: id,
                        kind,
                        parameter,
                    },
                    source,
                })?;
        }

        if let Some(name) = &descriptor.name {
            self.names.insert(name.clone(), id);
        }
        self.next_id = match (self.next_id, id.next()) {
            (Some(current), Some(following)) => Some(current.max(following)),
            _ => None,
        };
        self.index.insert(id, self.nodes.len());
        self.order.push(self.nodes.len());
        self.nodes.push(CalculationNode::new(id, descriptor));
        Ok(id)
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Run a full pass.
    ///
    /// Stops at the first failing node; everything evaluated before it keeps
    /// its geometry.
    pub fn evaluate_all(&mut self) -> Result<(), DraftError> {
        debug!(
            nodes = self.nodes.len(),
            measurements = self.measurements.len(),
            order = ?self.options.order,
            "starting evaluation pass"
        );
        self.symbols.clear();
        self.edges.clear();
        for m in &mut self.measurements {
            m.invalidate();
        }
        for node in &mut self.nodes {
            node.reset();
        }

        if let Err(e) = measurement::resolve(&mut self.measurements, &mut self.symbols) {
            warn!(error = %e, "measurements could not be resolved");
            return Err(e);
        }

        let plan = match self.options.order {
            EvaluationOrder::Declaration => order::declaration(self.nodes.len()),
            EvaluationOrder::Topological => order::topological(&self.predecessors()),
        };
        self.order = plan.order.iter().chain(&plan.blocked).copied().collect();
        debug!(order = ?self.order, blocked = plan.blocked.len(), "planned evaluation order");

        for &idx in &plan.order {
            if let Err(e) = self.evaluate_node(idx) {
                warn!(error = %e, "evaluation pass stopped");
                return Err(e.into());
            }
        }

        if let Some(&first) = plan.blocked.first() {
            let node = &self.nodes[first];
            let e = NodeError {
                node: node.id,
                kind: node.kind(),
                parameter: None,
                source: EvalError::UnresolvedExpression {
                    missing: plan.blocked.iter().map(|&i| self.nodes[i].label()).collect(),
                },
            };
            warn!(error = %e, "circular calculations");
            return Err(e.into());
        }
        Ok(())
    }

    /// For each node, the nodes it has to wait for.
    fn predecessors(&self) -> Vec<BTreeSet<usize>> {
        let mut publishers: HashMap<String, usize> = HashMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            for published in node.construction.publishes(&self.endpoint_names(node)) {
                publishers.insert(published.name, idx);
            }
        }

        self.nodes
            .iter()
            .map(|node| {
                let mut preds: BTreeSet<usize> = node
                    .construction
                    .references()
                    .into_iter()
                    .filter_map(|(_, r)| self.lookup(r))
                    .collect();
                let symbols = node
                    .construction
                    .expressions()
                    .into_iter()
                    .filter_map(|(_, e)| e.dependencies())
                    .flatten();
                for symbol in symbols {
                    if let Some(&idx) = publishers.get(symbol) {
                        preds.insert(idx);
                    }
                }
                preds
            })
            .collect()
    }

    /// Names of the points a node references, as far as they are known statically.
    fn endpoint_names<'a>(&'a self, node: &'a CalculationNode) -> Vec<Option<&'a str>> {
        node.construction
            .references()
            .into_iter()
            .map(|(_, r)| match r {
                NodeRef::Name(name) => Some(name.as_str()),
                NodeRef::Id(id) => self.node(*id).and_then(CalculationNode::display_name),
            })
            .collect()
    }

    fn lookup(&self, reference: &NodeRef) -> Option<usize> {
        match reference {
            NodeRef::Id(id) => self.index.get(id).copied(),
            NodeRef::Name(name) => self.names.get(name).and_then(|id| self.index.get(id).copied()),
        }
    }

    fn evaluate_node(&mut self, idx: usize) -> Result<(), NodeError> {
        let node = &self.nodes[idx];
        let (id, kind) = (node.id, node.kind());
        let fail = |parameter: Option<&'static str>, source: EvalError| NodeError {
            node: id,
            kind,
            parameter,
            source,
        };

        let mut points = Vec::new();
        for (parameter, reference) in node.construction.references() {
            let target = self
                .lookup(reference)
                .map(|t| &self.nodes[t])
                .filter(|t| t.geometry.is_some())
                .ok_or_else(|| {
                    fail(
                        Some(parameter),
                        EvalError::UnknownReference {
                            reference: reference.clone(),
                        },
                    )
                })?;
            let position = target.position().ok_or_else(|| {
                fail(
                    Some(parameter),
                    EvalError::NotAPoint {
                        reference: reference.clone(),
                    },
                )
            })?;
            points.push(ResolvedPoint {
                id: target.id,
                name: target.name.clone(),
                position,
            });
        }
        let current_length = match (node.construction.measures_segment(), points.as_slice()) {
            (true, [a, b, ..]) => Some(a.position.distance(b.position)),
            _ => None,
        };

        let CalculationGraph {
            nodes,
            symbols,
            edges,
            ..
        } = self;
        let node = &mut nodes[idx];

        let outcome = match current_length {
            Some(length) => {
                let bound = symbols.bind_transient(CURRENT_LENGTH, length);
                let mut scope = Scope::new(&bound);
                node.construction
                    .construct(&points, &mut scope)
                    .map(|g| (g, scope.into_used()))
            }
            None => {
                let mut scope = Scope::new(symbols);
                node.construction
                    .construct(&points, &mut scope)
                    .map(|g| (g, scope.into_used()))
            }
        };
        let (geometry, used) = outcome.map_err(|f| fail(f.parameter, f.error))?;

        let endpoints: Vec<Option<&str>> = points.iter().map(|p| p.name.as_deref()).collect();
        for published in node.construction.publishes(&endpoints) {
            if let Some(value) = published.quantity.measure(&geometry) {
                symbols
                    .publish(published.name.clone(), value, SymbolOwner::Node(id))
                    .map_err(|e| fail(None, e))?;
                debug!(node = %id, symbol = %published.name, value, "published");
            }
        }

        let mut dependencies: BTreeSet<Dependency> =
            points.iter().map(|p| Dependency::Node(p.id)).collect();
        dependencies.extend(used);
        dependencies.remove(&Dependency::Node(id));
        edges.extend(dependencies.iter().map(|to| DependencyEdge {
            from: id,
            to: to.clone(),
        }));

        debug!(node = %id, kind = %kind, name = ?node.name, "evaluated");
        node.geometry = Some(geometry);
        node.dependencies = dependencies;
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn node(&self, id: NodeId) -> Option<&CalculationNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_by_name(&self, name: &str) -> Option<&CalculationNode> {
        self.names.get(name).and_then(|&id| self.node(id))
    }

    /// Nodes in the evaluation order of the last pass, insertion order before any pass.
    pub fn nodes(&self) -> impl Iterator<Item = &CalculationNode> {
        self.order.iter().map(|&i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// What `id` read during the last pass.
    pub fn dependencies(&self, id: NodeId) -> Option<&BTreeSet<Dependency>> {
        self.node(id).map(CalculationNode::dependencies)
    }

    /// Every edge recorded in the last pass, in evaluation order.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Look a measurement up by display or canonical name.
    pub fn measurement(&self, name: &str) -> Option<&Measurement> {
        let canonical = canonical_name(name);
        self.measurements
            .iter()
            .find(|m| m.canonical_name() == canonical)
    }

    pub fn measurements(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements.iter()
    }

    /// Union of the bounding boxes of every evaluated node.
    pub fn bounding_box(&self) -> BoundingBox {
        self.nodes
            .iter()
            .filter_map(CalculationNode::geometry)
            .fold(BoundingBox::new(), |bbox, g| bbox.union(&g.bounding_box()))
    }
}
