//! Circuit readers for Kirchhoff.
//!
//! Two input formats produce the same validated [`Circuit`]:
//! JSON (`{"nodes": [...], "branches": [...]}`) and a SPICE-like netlist.
//!
//! # Example
//!
//! ```
//! use kirchhoff_parser::parse_netlist;
//!
//! let circuit = parse_netlist("
//! V1 1 0 10
//! R1 1 2 5
//! C1 2 0 0.1
//! .end
//! ").unwrap();
//!
//! assert_eq!(circuit.num_branches(), 3);
//! ```

use std::str::FromStr;

use kirchhoff_core::{Branch, Circuit, InputError};

pub mod json;
pub mod netlist;

pub use json::{parse_json, to_json};
pub use netlist::parse_netlist;

/// Input format of a circuit description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Netlist,
}

impl InputFormat {
    /// JSON when the first non-blank character is `{`, netlist otherwise.
    pub fn detect(text: &str) -> Self {
        if text.trim_start().starts_with('{') {
            InputFormat::Json
        } else {
            InputFormat::Netlist
        }
    }
}

impl FromStr for InputFormat {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "netlist" | "spice" | "cir" => Ok(InputFormat::Netlist),
            other => Err(InputError::MalformedInput(format!(
                "unknown input format '{other}'"
            ))),
        }
    }
}

/// Parse `text` in the given format, or detect it when `None`.
pub fn parse_circuit(text: &str, format: Option<InputFormat>) -> Result<Circuit, InputError> {
    match format.unwrap_or_else(|| InputFormat::detect(text)) {
        InputFormat::Json => parse_json(text),
        InputFormat::Netlist => parse_netlist(text),
    }
}

/// Series RC driven by a 10 V step: the circuit used when no input is given.
pub fn demo_circuit() -> Result<Circuit, InputError> {
    Circuit::new(
        ["0", "1", "2"],
        vec![
            Branch::voltage_source("V1", "1", "0", 10.0),
            Branch::resistor("R1", "1", "2", 5.0),
            Branch::capacitor("C1", "2", "0", 0.1),
        ],
    )
}
