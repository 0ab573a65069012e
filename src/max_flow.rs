use std::collections::{BTreeMap, VecDeque};

use log::{debug, info};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::network::FlowNetwork;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaxFlowError {
    #[error("vertex {vertex} is not in the network (vertices: {vertices})")]
    InvalidEndpoint { vertex: usize, vertices: usize },
    #[error("edge {edge} has negative capacity {capacity}")]
    NegativeCapacity { edge: usize, capacity: i64 },
    #[error("edge {edge} ({from} -> {to}) references a vertex outside 0..{vertices}")]
    InvalidEdge {
        edge: usize,
        from: usize,
        to: usize,
        vertices: usize,
    },
    #[error("total capacity does not fit in 64 bits")]
    CapacityOverflow,
    #[error("the solver did not prove optimality")]
    NotOptimal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowViolation {
    #[error("expected {expected} edge flows, found {found}")]
    WrongLength { expected: usize, found: usize },
    #[error("edge {edge} carries {flow} but has capacity {capacity}")]
    CapacityExceeded { edge: usize, flow: u64, capacity: u64 },
    #[error("vertex {vertex} receives {inflow} but sends {outflow}")]
    NotConserved {
        vertex: usize,
        inflow: u64,
        outflow: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowSolution {
    pub value: u64,
    /// Flow per input edge, indexed like `FlowNetwork::edges`.
    pub edge_flows: Vec<u64>,
    pub augmentations: usize,
    /// Input edges crossing from the source side to the sink side.
    pub min_cut: Option<Vec<usize>>,
}

impl FlowSolution {
    pub(crate) fn empty(network: &FlowNetwork) -> Self {
        Self {
            value: 0,
            edge_flows: vec![0; network.edge_count()],
            augmentations: 0,
            min_cut: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ResidualArc {
    from: usize,
    to: usize,
    residual: u64,
    partner: usize,
}

// Arcs 0..edge_count mirror the input edges, synthesized reverse arcs follow.
// Vertices are remapped to the ones touched by an edge plus the two terminals.
struct ResidualNetwork {
    arcs: Vec<ResidualArc>,
    adj_list: Vec<Vec<usize>>,
    local_ids: FxHashMap<usize, usize>,
}

impl ResidualNetwork {
    fn new(network: &FlowNetwork, source: usize, sink: usize) -> Self {
        let edges = network.edges();

        let mut local_ids = FxHashMap::default();
        for vertex in [source, sink]
            .into_iter()
            .chain(edges.iter().flat_map(|e| [e.from, e.to]))
        {
            let next = local_ids.len();
            local_ids.entry(vertex).or_insert(next);
        }

        let mut arcs: Vec<_> = edges
            .iter()
            .map(|e| ResidualArc {
                from: local_ids[&e.from],
                to: local_ids[&e.to],
                residual: e.capacity,
                partner: usize::MAX,
            })
            .collect();

        // Anti-parallel input edges become each other's partner, first come first served
        let mut unpaired: FxHashMap<(usize, usize), VecDeque<usize>> = FxHashMap::default();
        for (idx, edge) in edges.iter().enumerate() {
            if edge.from == edge.to {
                continue;
            }
            if let Some(partner) = unpaired
                .get_mut(&(edge.to, edge.from))
                .and_then(|waiting| waiting.pop_front())
            {
                arcs[idx].partner = partner;
                arcs[partner].partner = idx;
            } else {
                unpaired.entry((edge.from, edge.to)).or_default().push_back(idx);
            }
        }

        for idx in 0..edges.len() {
            if arcs[idx].partner == usize::MAX {
                let synthesized = arcs.len();
                arcs.push(ResidualArc {
                    from: arcs[idx].to,
                    to: arcs[idx].from,
                    residual: 0,
                    partner: idx,
                });
                arcs[idx].partner = synthesized;
            }
        }

        let mut adj_list = vec![vec![]; local_ids.len()];
        for (idx, arc) in arcs.iter().enumerate() {
            adj_list[arc.from].push(idx);
        }

        Self {
            arcs,
            adj_list,
            local_ids,
        }
    }

    fn local(&self, vertex: usize) -> usize {
        self.local_ids[&vertex]
    }

    /// Predecessor arc of every vertex reached from `source`, stopping once `sink` is reached.
    fn bfs(&self, source: usize, sink: usize) -> Vec<Option<usize>> {
        let mut pred = vec![None; self.adj_list.len()];
        let mut visited = vec![false; self.adj_list.len()];
        let mut queue = VecDeque::from([source]);
        visited[source] = true;

        while let Some(node) = queue.pop_front() {
            if node == sink {
                break;
            }
            for &arc_idx in &self.adj_list[node] {
                let arc = &self.arcs[arc_idx];
                if arc.residual == 0 || arc.to == node || visited[arc.to] {
                    continue;
                }
                visited[arc.to] = true;
                pred[arc.to] = Some(arc_idx);
                queue.push_back(arc.to);
            }
        }

        pred
    }

    fn augmenting_path(&self, source: usize, sink: usize) -> Option<Vec<usize>> {
        let pred = self.bfs(source, sink);
        let mut path = vec![];
        let mut node = sink;
        while node != source {
            let arc_idx = pred[node]?;
            path.push(arc_idx);
            node = self.arcs[arc_idx].from;
        }
        // Path is reversed
        path.reverse();
        Some(path)
    }

    fn push(&mut self, path: &[usize], amount: u64) {
        for &arc_idx in path {
            let partner = self.arcs[arc_idx].partner;
            self.arcs[arc_idx].residual -= amount;
            self.arcs[partner].residual += amount;
        }
    }

    fn reachable_from(&self, source: usize) -> Vec<bool> {
        let mut visited = vec![false; self.adj_list.len()];
        let mut stack = vec![source];
        while let Some(node) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            for &arc_idx in &self.adj_list[node] {
                let arc = &self.arcs[arc_idx];
                if arc.residual > 0 && !visited[arc.to] {
                    stack.push(arc.to);
                }
            }
        }
        visited
    }

    fn edge_flows(&self, network: &FlowNetwork) -> Vec<u64> {
        // Residuals of a pair always sum to their capacities, so the net transfer
        // shows up on one side only
        network
            .edges()
            .iter()
            .zip(&self.arcs)
            .map(|(edge, arc)| edge.capacity.saturating_sub(arc.residual))
            .collect()
    }
}

fn check_endpoint(network: &FlowNetwork, vertex: usize) -> Result<(), MaxFlowError> {
    if network.is_vertex(vertex) {
        Ok(())
    } else {
        Err(MaxFlowError::InvalidEndpoint {
            vertex,
            vertices: network.vertex_count(),
        })
    }
}

pub(crate) fn check_endpoints(
    network: &FlowNetwork,
    source: usize,
    sink: usize,
) -> Result<(), MaxFlowError> {
    check_endpoint(network, source)?;
    check_endpoint(network, sink)
}

/// Edmonds-Karp: repeatedly augments along a shortest path of the residual network.
///
/// With `limit` set, stops as soon as the accumulated flow reaches it; the returned
/// value is then only a lower bound and no min cut is computed.
pub fn compute_max_flow_directed(
    network: &FlowNetwork,
    source: usize,
    sink: usize,
    compute_min_cut: bool,
    limit: Option<u64>,
) -> Result<FlowSolution, MaxFlowError> {
    check_endpoints(network, source, sink)?;

    if source == sink {
        return Ok(FlowSolution::empty(network));
    }

    let mut residual = ResidualNetwork::new(network, source, sink);
    let (local_source, local_sink) = (residual.local(source), residual.local(sink));
    let mut tot_flow = 0u64;
    let mut augmentations = 0;

    loop {
        if let Some(limit) = limit {
            if tot_flow >= limit {
                info!("Flow limit {} reached for {} -> {}", limit, source, sink);
                return Ok(FlowSolution {
                    value: tot_flow,
                    edge_flows: residual.edge_flows(network),
                    augmentations,
                    min_cut: None,
                });
            }
        }

        let Some(path) = residual.augmenting_path(local_source, local_sink) else {
            break;
        };

        let bottleneck = path
            .iter()
            .map(|&arc_idx| residual.arcs[arc_idx].residual)
            .min()
            .unwrap_or(0);

        residual.push(&path, bottleneck);
        tot_flow += bottleneck;
        augmentations += 1;

        debug!(
            "Augmenting path of {} arcs with bottleneck {}, total {}",
            path.len(),
            bottleneck,
            tot_flow
        );
    }

    let min_cut = if compute_min_cut {
        let reachable = residual.reachable_from(local_source);
        Some(
            network
                .edges()
                .iter()
                .enumerate()
                .filter(|(_, e)| {
                    reachable[residual.local(e.from)] && !reachable[residual.local(e.to)]
                })
                .map(|(idx, _)| idx)
                .collect(),
        )
    } else {
        None
    };

    info!(
        "Max flow for nodes {} -> {}: {} ({} augmentations)",
        source, sink, tot_flow, augmentations
    );

    Ok(FlowSolution {
        value: tot_flow,
        edge_flows: residual.edge_flows(network),
        augmentations,
        min_cut,
    })
}

pub fn compute_max_flow(
    network: &FlowNetwork,
    source: usize,
    sink: usize,
) -> Result<u64, MaxFlowError> {
    compute_max_flow_directed(network, source, sink, false, None).map(|sol| sol.value)
}

pub fn max_flow_from_edges(
    vertices: usize,
    edges: &[(usize, usize, i64)],
    source: usize,
    sink: usize,
) -> Result<u64, MaxFlowError> {
    let network = FlowNetwork::new(vertices, edges.iter().copied())?;
    compute_max_flow(&network, source, sink)
}

/// Checks capacity bounds and conservation, returning the net flow leaving `source`.
pub fn check_flow(
    network: &FlowNetwork,
    source: usize,
    sink: usize,
    flows: &[u64],
) -> Result<i128, FlowViolation> {
    if flows.len() != network.edge_count() {
        return Err(FlowViolation::WrongLength {
            expected: network.edge_count(),
            found: flows.len(),
        });
    }

    // (inflow, outflow) of every vertex touched by an edge, in vertex order
    let mut balance: BTreeMap<usize, (u64, u64)> = BTreeMap::new();

    for (edge, (e, &flow)) in network.edges().iter().zip(flows).enumerate() {
        if flow > e.capacity {
            return Err(FlowViolation::CapacityExceeded {
                edge,
                flow,
                capacity: e.capacity,
            });
        }
        balance.entry(e.from).or_default().1 += flow;
        balance.entry(e.to).or_default().0 += flow;
    }

    for (&vertex, &(inflow, outflow)) in &balance {
        if vertex != source && vertex != sink && inflow != outflow {
            return Err(FlowViolation::NotConserved {
                vertex,
                inflow,
                outflow,
            });
        }
    }

    if source == sink {
        return Ok(0);
    }
    let (inflow, outflow) = balance.get(&source).copied().unwrap_or_default();
    Ok(outflow as i128 - inflow as i128)
}
