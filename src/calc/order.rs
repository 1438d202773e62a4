//! Evaluation order of a pass.

use std::collections::BTreeSet;

/// The order nodes are evaluated in, as indices into the node arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub order: Vec<usize>,
    /// Nodes that could not be ordered: on a cycle, or downstream of one.
    pub blocked: Vec<usize>,
}

/// Insertion order.
pub fn declaration(len: usize) -> Plan {
    Plan {
        order: (0..len).collect(),
        blocked: Vec::new(),
    }
}

/// Kahn's algorithm over `predecessors[i]`, the nodes `i` must wait for.
///
/// Among the nodes that are ready, the one inserted first goes first, so a
/// graph that is already in dependency order keeps its insertion order.
pub fn topological(predecessors: &[BTreeSet<usize>]) -> Plan {
    let len = predecessors.len();
    let mut waiting: Vec<usize> = predecessors.iter().map(BTreeSet::len).collect();
    let mut successors = vec![Vec::new(); len];
    for (node, preds) in predecessors.iter().enumerate() {
        for &p in preds {
            if p < len {
                successors[p].push(node);
            } else {
                waiting[node] -= 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..len).filter(|&i| waiting[i] == 0).collect();
    let mut order = Vec::with_capacity(len);
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &successors[node] {
            waiting[next] -= 1;
            if waiting[next] == 0 {
                ready.insert(next);
            }
        }
    }

    let blocked = (0..len).filter(|&i| waiting[i] > 0).collect();
    Plan { order, blocked }
}
