//! Circuit description: declared nodes and two-terminal branches.

use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};

use crate::error::InputError;

/// Identifier conventionally used for the reference (ground) node.
pub const GROUND: &str = "0";

/// Component type of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Resistor,
    Inductor,
    Capacitor,
    VoltageSource,
    CurrentSource,
}

impl BranchKind {
    /// Single-letter netlist symbol (R, L, C, V, I).
    pub fn symbol(self) -> char {
        match self {
            BranchKind::Resistor => 'R',
            BranchKind::Inductor => 'L',
            BranchKind::Capacitor => 'C',
            BranchKind::VoltageSource => 'V',
            BranchKind::CurrentSource => 'I',
        }
    }

    /// Parse a netlist symbol, case-insensitive.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(BranchKind::Resistor),
            'L' => Some(BranchKind::Inductor),
            'C' => Some(BranchKind::Capacitor),
            'V' => Some(BranchKind::VoltageSource),
            'I' => Some(BranchKind::CurrentSource),
            _ => None,
        }
    }

    /// Spanning-tree selection weight.
    ///
    /// Voltage sources are pulled into the tree, current sources pushed
    /// into the co-tree, everything else is neutral.
    pub fn tree_weight(self) -> u32 {
        match self {
            BranchKind::VoltageSource => 0,
            BranchKind::CurrentSource => 100,
            _ => 1,
        }
    }

    /// Unit of the branch value.
    pub fn unit(self) -> &'static str {
        match self {
            BranchKind::Resistor => "Ohm",
            BranchKind::Inductor => "H",
            BranchKind::Capacitor => "F",
            BranchKind::VoltageSource => "V",
            BranchKind::CurrentSource => "A",
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for BranchKind {
    type Err = InputError;

    /// Accepts the netlist letter or the full component name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "r" | "resistor" => BranchKind::Resistor,
            "l" | "inductor" => BranchKind::Inductor,
            "c" | "capacitor" => BranchKind::Capacitor,
            "v" | "voltage" | "voltagesource" | "voltage_source" => BranchKind::VoltageSource,
            "i" | "current" | "currentsource" | "current_source" => BranchKind::CurrentSource,
            _ => return Err(InputError::UnknownComponent(s.to_string())),
        };
        Ok(kind)
    }
}

/// A two-terminal element. Positive current flows from `from` to `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    id: String,
    from: String,
    to: String,
    kind: BranchKind,
    value: f64,
}

impl Branch {
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        kind: BranchKind,
        value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            kind,
            value,
        }
    }

    pub fn resistor(id: &str, from: &str, to: &str, ohms: f64) -> Self {
        Self::new(id, from, to, BranchKind::Resistor, ohms)
    }

    pub fn inductor(id: &str, from: &str, to: &str, henries: f64) -> Self {
        Self::new(id, from, to, BranchKind::Inductor, henries)
    }

    pub fn capacitor(id: &str, from: &str, to: &str, farads: f64) -> Self {
        Self::new(id, from, to, BranchKind::Capacitor, farads)
    }

    pub fn voltage_source(id: &str, from: &str, to: &str, volts: f64) -> Self {
        Self::new(id, from, to, BranchKind::VoltageSource, volts)
    }

    pub fn current_source(id: &str, from: &str, to: &str, amps: f64) -> Self {
        Self::new(id, from, to, BranchKind::CurrentSource, amps)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn kind(&self) -> BranchKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}: {} -> {}, {} {})",
            self.id,
            self.kind,
            self.from,
            self.to,
            crate::units::format_value(self.value),
            self.kind.unit()
        )
    }
}

/// How the reference node is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReferenceNode {
    /// Node `"0"` if declared, otherwise the last declared node.
    #[default]
    Auto,
    /// An explicitly named node.
    Named(String),
}

/// A validated circuit: declared nodes plus branches with unique ids whose
/// endpoints are all declared.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    nodes: IndexSet<String>,
    branches: IndexMap<String, Branch>,
}

impl Circuit {
    /// Validate and build a circuit.
    ///
    /// Node order and branch order are kept as given; every later stage
    /// depends on them for deterministic output.
    pub fn new<I, S>(nodes: I, branches: Vec<Branch>) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut node_set = IndexSet::new();
        for node in nodes {
            let node = node.into();
            if !node_set.insert(node.clone()) {
                return Err(InputError::DuplicateNode(node));
            }
        }
        if node_set.is_empty() {
            return Err(InputError::NoNodes);
        }

        let mut branch_map = IndexMap::with_capacity(branches.len());
        for branch in branches {
            for endpoint in [&branch.from, &branch.to] {
                if !node_set.contains(endpoint) {
                    return Err(InputError::UnknownNode {
                        branch: branch.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
            if branch.from == branch.to {
                return Err(InputError::SelfLoop(branch.id.clone()));
            }
            let unusable = !branch.value.is_finite()
                || (branch.kind == BranchKind::Capacitor && branch.value == 0.0);
            if unusable {
                return Err(InputError::InvalidValue {
                    branch: branch.id.clone(),
                    value: branch.value,
                });
            }
            if branch_map.contains_key(&branch.id) {
                return Err(InputError::DuplicateBranch(branch.id.clone()));
            }
            branch_map.insert(branch.id.clone(), branch);
        }

        Ok(Self {
            nodes: node_set,
            branches: branch_map,
        })
    }

    /// Skip validation; lets tests feed later stages inputs `new` rejects.
    #[cfg(test)]
    pub(crate) fn from_parts_unchecked<const N: usize>(
        nodes: [&str; N],
        branches: Vec<Branch>,
    ) -> Self {
        Self {
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            branches: branches.into_iter().map(|b| (b.id.clone(), b)).collect(),
        }
    }

    /// Declared nodes in input order.
    pub fn nodes(&self) -> &IndexSet<String> {
        &self.nodes
    }

    /// Branches in input order.
    pub fn branches(&self) -> impl ExactSizeIterator<Item = &Branch> {
        self.branches.values()
    }

    /// Branch at an input position.
    pub fn branch(&self, index: usize) -> Option<&Branch> {
        self.branches.get_index(index).map(|(_, b)| b)
    }

    /// Look up a branch by id.
    pub fn branch_by_id(&self, id: &str) -> Option<&Branch> {
        self.branches.get(id)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    /// Resolve the reference node to an index into [`Circuit::nodes`].
    pub fn reference_index(&self, policy: &ReferenceNode) -> Result<usize, InputError> {
        match policy {
            ReferenceNode::Named(name) => self
                .nodes
                .get_index_of(name)
                .ok_or_else(|| InputError::UnknownReference(name.clone())),
            ReferenceNode::Auto => match self.nodes.get_index_of(GROUND) {
                Some(idx) => Ok(idx),
                None => {
                    let idx = self.nodes.len() - 1;
                    log::warn!(
                        "no node named '{}', using last declared node '{}' as reference",
                        GROUND,
                        self.nodes[idx]
                    );
                    Ok(idx)
                }
            },
        }
    }
}
