//! Incremental NoC cost tracking for the placer.
//!
//! Traffic flows are routed once up front. Afterwards only flows touching a
//! moved router block are re-routed, and their cost change is reported back
//! to the annealer. Rejected moves are undone by re-routing the same flows
//! against the restored placement.

pub mod audit;
pub mod context;
pub mod cost;
pub mod normalization;
pub mod routes;
pub mod usage;

pub use context::NocPlacementContext;
pub use cost::{
    calculate_traffic_flow_aggregate_bandwidth_cost, calculate_traffic_flow_latency_cost,
    traffic_flow_latency,
};
pub use normalization::{
    MAX_INV_NOC_AGGREGATE_BANDWIDTH_COST, MAX_INV_NOC_LATENCY_COST,
    update_noc_normalization_factors,
};
pub use routes::RouteStore;
pub use usage::{LinkUsageUpdate, update_traffic_flow_link_usage};

/// NoC-wide totals of the two cost terms.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NocCostTerms {
    pub aggregate_bandwidth: f64,
    pub latency: f64,
}

/// Cost change caused by one placement move.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NocMoveDelta {
    pub aggregate_bandwidth: f64,
    pub latency: f64,
    /// Number of distinct traffic flows re-routed by the move.
    pub affected_traffic_flows: usize,
}

impl NocMoveDelta {
    pub fn is_noop(&self) -> bool {
        self.affected_traffic_flows == 0
    }
}
