//! Step responses of small circuits against their analytic solutions.

use kirchhoff_core::{
    Branch, Circuit, CircuitGraph, FundamentalMatrices, ReferenceNode, SampleWindow, Solution,
    TimeDomainConverter, build_equations, select_tree,
};
use kirchhoff_solver::{BareissSolver, PartialFractionConverter};

fn solve(circuit: &Circuit) -> Solution {
    let graph = CircuitGraph::build(circuit).unwrap();
    let tree = select_tree(&graph, circuit).unwrap();
    let ordered = tree.ordered_branches(circuit);
    let reference = circuit.reference_index(&ReferenceNode::Auto).unwrap();
    let (t, l) = (tree.num_twigs(), tree.num_links());
    let m = FundamentalMatrices::build(circuit, &ordered, reference, t, l).unwrap();
    let system = build_equations(&ordered, &m.cut_set, &m.tie_set, t, l).unwrap();
    BareissSolver::new().solve_system(&system).unwrap()
}

fn samples(solution: &Solution, name: &str, times: &[f64]) -> Vec<f64> {
    PartialFractionConverter::new()
        .convert(&solution[name], times)
        .unwrap()
        .samples
        .unwrap()
}

#[test]
fn rc_capacitor_charges_to_source_voltage() {
    let circuit = Circuit::new(
        ["0", "1", "2"],
        vec![
            Branch::voltage_source("V1", "1", "0", 10.0),
            Branch::resistor("R1", "1", "2", 5.0),
            Branch::capacitor("C1", "2", "0", 0.1),
        ],
    )
    .unwrap();
    let solution = solve(&circuit);
    let times = SampleWindow::default().times();

    let response = PartialFractionConverter::new()
        .convert(&solution["V_C1"], &times)
        .unwrap();
    assert_eq!(response.expression, "10 - 10*exp(-2*t)");

    let v = response.samples.unwrap();
    for (t, v) in times.iter().zip(&v) {
        let expected = 10.0 * (1.0 - (-2.0 * t).exp());
        assert!((v - expected).abs() < 1e-8, "t = {t}: {v} vs {expected}");
    }

    let i = samples(&solution, "I_R1", &times);
    assert!((i[0] - 2.0).abs() < 1e-8);
    assert!(i[99].abs() < 1e-6);
}

#[test]
fn rl_current_rises_to_ohmic_limit() {
    let circuit = Circuit::new(
        ["0", "1", "2"],
        vec![
            Branch::voltage_source("V1", "1", "0", 12.0),
            Branch::resistor("R1", "1", "2", 4.0),
            Branch::inductor("L1", "2", "0", 2.0),
        ],
    )
    .unwrap();
    let solution = solve(&circuit);
    let times = [0.0, 0.25, 0.5, 1.0, 4.0];
    let i = samples(&solution, "I_L1", &times);
    for (t, i) in times.iter().zip(&i) {
        let expected = 3.0 * (1.0 - (-2.0 * t).exp());
        assert!((i - expected).abs() < 1e-8, "t = {t}");
    }
}

#[test]
fn lc_tank_oscillates() {
    // 1 A step into L = 1 in parallel with C = 1: V = sin(t)
    let circuit = Circuit::new(
        ["0", "1"],
        vec![
            Branch::current_source("I1", "0", "1", 1.0),
            Branch::inductor("L1", "1", "0", 1.0),
            Branch::capacitor("C1", "1", "0", 1.0),
        ],
    )
    .unwrap();
    let solution = solve(&circuit);
    let times = [0.0, 0.5, 1.0, 2.0, 3.0];
    let v = samples(&solution, "V_C1", &times);
    for (t, v) in times.iter().zip(&v) {
        assert!((v - t.sin()).abs() < 1e-8, "t = {t}");
    }
}

#[test]
fn source_voltage_is_a_step() {
    let circuit = Circuit::new(
        ["0", "1"],
        vec![
            Branch::voltage_source("V1", "1", "0", 5.0),
            Branch::resistor("R1", "1", "0", 1.0),
        ],
    )
    .unwrap();
    let solution = solve(&circuit);
    let response = PartialFractionConverter::new()
        .convert(&solution["V_V1"], &[0.0, 1.0])
        .unwrap();
    assert_eq!(response.expression, "5");
    assert_eq!(response.samples.unwrap().len(), 2);
}
