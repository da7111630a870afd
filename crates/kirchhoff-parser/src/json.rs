//! JSON circuit descriptions.
//!
//! ```json
//! {
//!   "nodes": ["0", "1", "2"],
//!   "branches": [
//!     {"id": "V1", "from": "1", "to": "0", "type": "V", "value": 10},
//!     {"id": "R1", "from": "1", "to": "2", "type": "R", "value": "5k"}
//!   ]
//! }
//! ```
//!
//! Identifiers may be strings or integers. `type` is a component letter or
//! full name in any case; `value` is a number or a string with an SI suffix.

use serde::Deserialize;

use kirchhoff_core::units::parse_value;
use kirchhoff_core::{Branch, BranchKind, Circuit, InputError};

/// A string or integer identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Ident {
    Text(String),
    Integer(i64),
}

impl Ident {
    fn into_string(self) -> String {
        match self {
            Ident::Text(s) => s,
            Ident::Integer(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Value {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawCircuit {
    nodes: Option<Vec<Ident>>,
    branches: Option<Vec<RawBranch>>,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    id: Option<Ident>,
    from: Option<Ident>,
    to: Option<Ident>,
    #[serde(rename = "type")]
    kind: Option<String>,
    value: Option<Value>,
}

fn required<T>(field: Option<T>, index: usize, name: &str) -> Result<T, InputError> {
    field.ok_or_else(|| InputError::MissingField(format!("branches[{index}].{name}")))
}

impl RawBranch {
    fn into_branch(self, index: usize) -> Result<Branch, InputError> {
        let id = required(self.id, index, "id")?.into_string();
        let from = required(self.from, index, "from")?.into_string();
        let to = required(self.to, index, "to")?.into_string();
        let kind: BranchKind = required(self.kind, index, "type")?.parse()?;
        let value = match required(self.value, index, "value")? {
            Value::Number(v) => v,
            Value::Text(text) => parse_value(&text).ok_or_else(|| {
                InputError::MalformedInput(format!("branch {id}: invalid value '{text}'"))
            })?,
        };
        Ok(Branch::new(id, from, to, kind, value))
    }
}

/// Parse a JSON circuit description.
pub fn parse_json(text: &str) -> Result<Circuit, InputError> {
    let raw: RawCircuit = serde_json::from_str(text)
        .map_err(|e| InputError::MalformedInput(format!("invalid JSON input: {e}")))?;

    let nodes = raw
        .nodes
        .ok_or_else(|| InputError::MissingField("nodes".to_string()))?;
    let branches = raw
        .branches
        .ok_or_else(|| InputError::MissingField("branches".to_string()))?
        .into_iter()
        .enumerate()
        .map(|(index, branch)| branch.into_branch(index))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "parsed JSON circuit: {} nodes, {} branches",
        nodes.len(),
        branches.len()
    );

    Circuit::new(nodes.into_iter().map(Ident::into_string), branches)
}

/// Serialize a circuit in the same JSON shape [`parse_json`] reads.
pub fn to_json(circuit: &Circuit) -> serde_json::Value {
    let branches: Vec<serde_json::Value> = circuit
        .branches()
        .map(|b| {
            serde_json::json!({
                "id": b.id(),
                "from": b.from(),
                "to": b.to(),
                "type": b.kind().symbol().to_string(),
                "value": b.value(),
            })
        })
        .collect();
    serde_json::json!({
        "nodes": circuit.nodes().iter().collect::<Vec<_>>(),
        "branches": branches,
    })
}
