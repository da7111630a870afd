//! SPICE-like netlists.
//!
//! ```text
//! Series RC step response
//! * source, then the RC pair
//! V1 1 0 DC 10
//! R1 1 2 5
//! C1 2 0 100m
//! .end
//! ```
//!
//! The first letter of an element name selects its type (R, L, C, V, I).
//! Nodes are declared in order of first appearance. Lines starting with `*`
//! are comments, `;` starts an inline comment, and parsing stops at `.end`.
//! A first line that is not an element is taken as the title.

use indexmap::IndexSet;

use kirchhoff_core::units::parse_value;
use kirchhoff_core::{Branch, BranchKind, Circuit, InputError};

/// Parse a netlist into a circuit.
pub fn parse_netlist(text: &str) -> Result<Circuit, InputError> {
    let mut nodes: IndexSet<String> = IndexSet::new();
    let mut branches = Vec::new();
    let mut seen_content = false;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split(';').next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        let first_content = !seen_content;
        seen_content = true;

        if let Some(command) = line.strip_prefix('.') {
            if command.eq_ignore_ascii_case("end") {
                break;
            }
            log::warn!("line {line_no}: ignoring control line '{line}'");
            continue;
        }

        match parse_element(line, line_no) {
            Ok(branch) => {
                nodes.insert(branch.from().to_string());
                nodes.insert(branch.to().to_string());
                branches.push(branch);
            }
            Err(_) if first_content => {
                log::debug!("title: {line}");
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "parsed netlist: {} nodes, {} branches",
        nodes.len(),
        branches.len()
    );

    Circuit::new(nodes, branches)
}

/// `NAME NODE+ NODE- [DC] VALUE`
fn parse_element(line: &str, line_no: usize) -> Result<Branch, InputError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let name = tokens[0];
    let kind = name
        .chars()
        .next()
        .and_then(BranchKind::from_symbol)
        .ok_or_else(|| InputError::UnknownComponent(name.to_string()))?;

    let value_token = match tokens.as_slice() {
        [_, _, _, value] => *value,
        [_, _, _, dc, value]
            if dc.eq_ignore_ascii_case("dc")
                && matches!(kind, BranchKind::VoltageSource | BranchKind::CurrentSource) =>
        {
            *value
        }
        _ => {
            return Err(InputError::MalformedInput(format!(
                "line {line_no}: expected '{name} NODE NODE VALUE', got '{line}'"
            )));
        }
    };

    let value = parse_value(value_token).ok_or_else(|| {
        InputError::MalformedInput(format!(
            "line {line_no}: invalid value '{value_token}' for {name}"
        ))
    })?;

    Ok(Branch::new(name, tokens[1], tokens[2], kind, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_title_and_comments() {
        let circuit = parse_netlist(
            "Series RC\n\
             * step source\n\
             V1 1 0 DC 10\n\
             R1 1 2 5 ; series resistor\n\
             C1 2 0 100m\n\
             .end\n\
             R9 5 6 1\n",
        )
        .unwrap();
        assert_eq!(circuit.num_branches(), 3);
        let nodes: Vec<&str> = circuit.nodes().iter().map(String::as_str).collect();
        assert_eq!(nodes, vec!["1", "0", "2"]);
        assert!((circuit.branch_by_id("C1").unwrap().value() - 0.1).abs() < 1e-15);
        assert_eq!(
            circuit.branch_by_id("V1").unwrap().kind(),
            BranchKind::VoltageSource
        );
    }

    #[test]
    fn test_element_letters_case_insensitive() {
        let circuit = parse_netlist("v1 a 0 1\nl1 a b 1m\ni1 0 b 2\nr1 b 0 1k\n").unwrap();
        let kinds: Vec<BranchKind> = circuit.branches().map(|b| b.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                BranchKind::VoltageSource,
                BranchKind::Inductor,
                BranchKind::CurrentSource,
                BranchKind::Resistor
            ]
        );
    }

    #[test]
    fn test_control_lines_ignored() {
        let circuit = parse_netlist("R1 1 0 1\n.tran 1m 10m\n").unwrap();
        assert_eq!(circuit.num_branches(), 1);
    }

    #[test]
    fn test_bad_lines_rejected() {
        let err = parse_netlist("R1 1 0 1\nR2 1 0\n").unwrap_err();
        assert!(matches!(err, InputError::MalformedInput(ref m) if m.contains("line 2")));

        let err = parse_netlist("R1 1 0 1\nR2 1 0 abc\n").unwrap_err();
        assert!(matches!(err, InputError::MalformedInput(ref m) if m.contains("invalid value")));

        let err = parse_netlist("R1 1 0 1\nQ1 1 0 1\n").unwrap_err();
        assert_eq!(err, InputError::UnknownComponent("Q1".to_string()));

        let err = parse_netlist("R1 1 0 1\nR1 1 0 2\n").unwrap_err();
        assert_eq!(err, InputError::DuplicateBranch("R1".to_string()));
    }

    #[test]
    fn test_dc_keyword_only_for_sources() {
        assert!(parse_netlist("V1 1 0 dc 5\nR1 1 0 1\n").is_ok());
        assert!(parse_netlist("R0 1 0 1\nR1 1 0 DC 5\n").is_err());
    }

    #[test]
    fn test_empty_netlist_has_no_nodes() {
        assert_eq!(parse_netlist("* nothing\n").unwrap_err(), InputError::NoNodes);
    }
}
