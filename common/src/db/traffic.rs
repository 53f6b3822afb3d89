use crate::db::indices::{ClusterBlockId, TrafficFlowId};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct TrafficFlow {
    pub name: String,
    pub source_router_block: ClusterBlockId,
    pub sink_router_block: ClusterBlockId,
    pub bandwidth: f64,
    /// `f64::INFINITY` when the flow has no latency constraint.
    pub max_latency: f64,
    pub priority: f64,
}

impl TrafficFlow {
    pub fn is_latency_constrained(&self) -> bool {
        self.max_latency.is_finite()
    }
}

/// Static set of traffic flows between logical router blocks.
pub struct NocTrafficFlows {
    flows: Vec<TrafficFlow>,
    flows_by_router_block: HashMap<ClusterBlockId, Vec<TrafficFlowId>>,
    router_blocks: Vec<ClusterBlockId>,
}

impl NocTrafficFlows {
    pub fn new() -> Self {
        Self {
            flows: Vec::new(),
            flows_by_router_block: HashMap::new(),
            router_blocks: Vec::new(),
        }
    }

    pub fn num_flows(&self) -> usize {
        self.flows.len()
    }

    /// Marks a block as a logical NoC router even if no flow references it yet.
    pub fn register_router_block(&mut self, block: ClusterBlockId) {
        if !self.flows_by_router_block.contains_key(&block) {
            self.flows_by_router_block.insert(block, Vec::new());
            self.router_blocks.push(block);
        }
    }

    pub fn add_traffic_flow(
        &mut self,
        name: String,
        source_router_block: ClusterBlockId,
        sink_router_block: ClusterBlockId,
        bandwidth: f64,
        max_latency: f64,
        priority: f64,
    ) -> TrafficFlowId {
        let id = TrafficFlowId::new(self.flows.len());
        self.flows.push(TrafficFlow {
            name,
            source_router_block,
            sink_router_block,
            bandwidth,
            max_latency,
            priority,
        });

        self.register_router_block(source_router_block);
        self.register_router_block(sink_router_block);
        self.associate(source_router_block, id);
        if sink_router_block != source_router_block {
            self.associate(sink_router_block, id);
        }
        id
    }

    fn associate(&mut self, block: ClusterBlockId, flow: TrafficFlowId) {
        if let Some(list) = self.flows_by_router_block.get_mut(&block) {
            list.push(flow);
        }
    }

    #[inline]
    pub fn flow(&self, id: TrafficFlowId) -> &TrafficFlow {
        &self.flows[id.index()]
    }

    pub fn flows(&self) -> &[TrafficFlow] {
        &self.flows
    }

    pub fn flow_ids(&self) -> impl Iterator<Item = TrafficFlowId> + use<> {
        TrafficFlowId::range(self.flows.len())
    }

    /// Flows whose source or sink is `block`, in insertion order. Empty for
    /// blocks that are not NoC routers.
    pub fn flows_associated_to_router_block(&self, block: ClusterBlockId) -> &[TrafficFlowId] {
        self.flows_by_router_block
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_router_block(&self, block: ClusterBlockId) -> bool {
        self.flows_by_router_block.contains_key(&block)
    }

    pub fn router_blocks(&self) -> &[ClusterBlockId] {
        &self.router_blocks
    }
}

impl Default for NocTrafficFlows {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flows_are_associated_with_both_endpoints() {
        let mut flows = NocTrafficFlows::new();
        let a = ClusterBlockId::new(0);
        let b = ClusterBlockId::new(1);
        let c = ClusterBlockId::new(2);

        let f0 = flows.add_traffic_flow("f0".into(), a, b, 1.0, f64::INFINITY, 1.0);
        let f1 = flows.add_traffic_flow("f1".into(), b, c, 2.0, 1e-8, 2.0);

        assert_eq!(flows.flows_associated_to_router_block(a), &[f0]);
        assert_eq!(flows.flows_associated_to_router_block(b), &[f0, f1]);
        assert_eq!(flows.flows_associated_to_router_block(c), &[f1]);
        assert_eq!(flows.router_blocks(), &[a, b, c]);
        assert!(!flows.flow(f0).is_latency_constrained());
        assert!(flows.flow(f1).is_latency_constrained());
    }

    #[test]
    fn self_loop_flow_is_listed_once() {
        let mut flows = NocTrafficFlows::new();
        let a = ClusterBlockId::new(3);
        let f = flows.add_traffic_flow("loop".into(), a, a, 1.0, f64::INFINITY, 1.0);
        assert_eq!(flows.flows_associated_to_router_block(a), &[f]);
    }

    #[test]
    fn unknown_block_is_not_a_router() {
        let mut flows = NocTrafficFlows::new();
        flows.register_router_block(ClusterBlockId::new(5));
        assert!(flows.is_router_block(ClusterBlockId::new(5)));
        assert!(!flows.is_router_block(ClusterBlockId::new(6)));
        assert!(
            flows
                .flows_associated_to_router_block(ClusterBlockId::new(6))
                .is_empty()
        );
    }
}
