use log::info;

use crate::{
    lp_solvers::{LpSolver, ModelBuilder, ModelReady, ModelSolved, ObjSense, SolutionTrait},
    max_flow::{check_endpoints, FlowSolution, MaxFlowError},
    network::FlowNetwork,
};

/// Adds one integer variable per edge plus a balance row for every inner vertex.
///
/// The objective is the net flow leaving `source`; with every other non-sink vertex
/// balanced this equals the net flow entering `sink`.
pub fn build_max_flow_model<B: ModelBuilder>(
    model: &mut B,
    network: &FlowNetwork,
    source: usize,
    sink: usize,
) -> Vec<B::Variable> {
    let edge_vars: Vec<_> = network
        .edges()
        .iter()
        .enumerate()
        .map(|(idx, edge)| {
            let obj = (edge.from == source) as i32 - (edge.to == source) as i32;
            model.add_variable(
                &format!("x_{}_{}_{}", idx, edge.from, edge.to),
                true,
                obj as f64,
                0.0,
                edge.capacity as f64,
            )
        })
        .collect();

    for vertex in network.active_vertices() {
        if vertex == source || vertex == sink {
            continue;
        }

        let mut vars = vec![];
        let mut coeffs = vec![];
        for (idx, edge) in network.edges().iter().enumerate() {
            // Self loops cancel out
            if edge.from == edge.to {
                continue;
            }
            if edge.to == vertex {
                vars.push(edge_vars[idx].clone());
                coeffs.push(1.0);
            } else if edge.from == vertex {
                vars.push(edge_vars[idx].clone());
                coeffs.push(-1.0);
            }
        }

        if !vars.is_empty() {
            model.add_constraint(
                &format!("balance_{}", vertex),
                &vars,
                &coeffs,
                Some(0.0),
                Some(0.0),
            );
        }
    }

    edge_vars
}

pub fn solve_max_flow_lp<Solver: LpSolver>(
    network: &FlowNetwork,
    source: usize,
    sink: usize,
    verbose: bool,
) -> Result<FlowSolution, MaxFlowError> {
    check_endpoints(network, source, sink)?;

    if source == sink {
        return Ok(FlowSolution::empty(network));
    }

    let mut model = Solver::create_new_model("max_flow", verbose, ObjSense::Maximize);
    let edge_vars = build_max_flow_model(&mut model, network, source, sink);

    let solved = model.solve();
    if !solved.is_optimal() {
        return Err(MaxFlowError::NotOptimal);
    }

    let Some(solution) = solved.get_solutions(1).into_iter().next() else {
        return Err(MaxFlowError::NotOptimal);
    };

    let edge_flows = solution
        .get_values(&edge_vars)
        .into_iter()
        .map(|x| x.round().max(0.0) as u64)
        .collect();
    let value = solution.get_objective_value().round().max(0.0) as u64;

    info!("LP max flow for nodes {} -> {}: {}", source, sink, value);

    Ok(FlowSolution {
        value,
        edge_flows,
        augmentations: 0,
        min_cut: None,
    })
}
