use crate::max_flow::MaxFlowError;

/// A directed edge with its declared capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowEdge {
    pub from: usize,
    pub to: usize,
    pub capacity: u64,
}

/// Static flow network: dense vertex ids `0..vertices`, edges kept in input order.
#[derive(Clone, Debug)]
pub struct FlowNetwork {
    vertices: usize,
    edges: Vec<FlowEdge>,
}

impl FlowNetwork {
    pub fn new(
        vertices: usize,
        edges: impl IntoIterator<Item = (usize, usize, i64)>,
    ) -> Result<Self, MaxFlowError> {
        let mut flow_edges = vec![];
        let mut total: u64 = 0;

        for (edge, (from, to, capacity)) in edges.into_iter().enumerate() {
            if from >= vertices || to >= vertices {
                return Err(MaxFlowError::InvalidEdge {
                    edge,
                    from,
                    to,
                    vertices,
                });
            }
            if capacity < 0 {
                return Err(MaxFlowError::NegativeCapacity { edge, capacity });
            }
            let capacity = capacity as u64;
            total = total
                .checked_add(capacity)
                .ok_or(MaxFlowError::CapacityOverflow)?;
            flow_edges.push(FlowEdge { from, to, capacity });
        }

        Ok(Self {
            vertices,
            edges: flow_edges,
        })
    }

    /// Every edge with capacity 1.
    pub fn with_unit_capacities(
        vertices: usize,
        edges: &[(usize, usize)],
    ) -> Result<Self, MaxFlowError> {
        Self::new(vertices, edges.iter().map(|&(u, v)| (u, v, 1)))
    }

    /*
       1
      / \
     0 - 3
      \ /
       2
    */
    pub fn diamond_with_chord() -> Self {
        let edges = [
            (0, 1),
            (1, 0),
            (0, 2),
            (2, 0),
            (1, 3),
            (3, 1),
            (2, 3),
            (3, 2),
            (0, 3),
            (3, 0),
        ];
        Self {
            vertices: 4,
            edges: edges
                .into_iter()
                .map(|(from, to)| FlowEdge {
                    from,
                    to,
                    capacity: 1,
                })
                .collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn is_vertex(&self, vertex: usize) -> bool {
        vertex < self.vertices
    }

    /// Sorted endpoints of all edges. Isolated vertices are left out.
    pub fn active_vertices(&self) -> Vec<usize> {
        let mut vertices: Vec<_> = self.edges.iter().flat_map(|e| [e.from, e.to]).collect();
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }

    /// Same vertices, every edge flipped. Edge indices are preserved.
    pub fn reversed(&self) -> Self {
        Self {
            vertices: self.vertices,
            edges: self
                .edges
                .iter()
                .map(|e| FlowEdge {
                    from: e.to,
                    to: e.from,
                    capacity: e.capacity,
                })
                .collect(),
        }
    }

    pub fn out_capacity(&self, vertex: usize) -> u64 {
        self.edges
            .iter()
            .filter(|e| e.from == vertex && e.to != vertex)
            .map(|e| e.capacity)
            .sum()
    }

    pub fn in_capacity(&self, vertex: usize) -> u64 {
        self.edges
            .iter()
            .filter(|e| e.to == vertex && e.from != vertex)
            .map(|e| e.capacity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_capacity() {
        let err = FlowNetwork::new(3, [(0, 1, 2), (1, 2, -1)]).unwrap_err();
        assert_eq!(
            err,
            MaxFlowError::NegativeCapacity {
                edge: 1,
                capacity: -1
            }
        );
    }

    #[test]
    fn rejects_out_of_range_edge() {
        let err = FlowNetwork::new(2, [(0, 2, 1)]).unwrap_err();
        assert!(matches!(err, MaxFlowError::InvalidEdge { edge: 0, to: 2, .. }));
    }

    #[test]
    fn rejects_capacity_sum_overflow() {
        let err =
            FlowNetwork::new(2, [(0, 1, i64::MAX), (0, 1, i64::MAX), (1, 0, 2)]).unwrap_err();
        assert_eq!(err, MaxFlowError::CapacityOverflow);
    }

    #[test]
    fn diamond_capacities() {
        let network = FlowNetwork::diamond_with_chord();
        assert_eq!(network.vertex_count(), 4);
        assert_eq!(network.edge_count(), 10);
        assert_eq!(network.out_capacity(0), 3);
        assert_eq!(network.in_capacity(3), 3);
        assert_eq!(network.out_capacity(1), 2);
    }

    #[test]
    fn reversal_keeps_indices() {
        let network = FlowNetwork::new(3, [(0, 1, 4), (1, 2, 7)]).unwrap();
        let reversed = network.reversed();
        assert_eq!(
            reversed.edges()[1],
            FlowEdge {
                from: 2,
                to: 1,
                capacity: 7
            }
        );
        assert_eq!(reversed.out_capacity(2), 7);
    }

    #[test]
    fn active_vertices_skip_isolated_ones() {
        let network = FlowNetwork::new(usize::MAX, [(9, 2, 1), (2, 9, 1), (5, 5, 0)]).unwrap();
        assert_eq!(network.active_vertices(), vec![2, 5, 9]);
        assert!(FlowNetwork::new(10, []).unwrap().active_vertices().is_empty());
    }

    #[test]
    fn self_loops_do_not_count_as_capacity() {
        let network = FlowNetwork::new(2, [(0, 0, 5), (0, 1, 1)]).unwrap();
        assert_eq!(network.out_capacity(0), 1);
    }
}
