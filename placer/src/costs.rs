use crate::noc::NocMoveDelta;
use noc_common::util::config::{NocConfig, PlacementMode};

/// Running cost state of the placer. The NoC terms are maintained through
/// [`crate::noc::NocPlacementContext`]; the wirelength and timing terms belong
/// to the rest of the placer.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacerCosts {
    pub cost: f64,
    pub bb_cost: f64,
    pub timing_cost: f64,
    pub noc_aggregate_bandwidth_cost: f64,
    pub noc_latency_cost: f64,

    pub bb_cost_norm: f64,
    pub timing_cost_norm: f64,
    pub noc_aggregate_bandwidth_cost_norm: f64,
    pub noc_latency_cost_norm: f64,
}

impl Default for PlacerCosts {
    fn default() -> Self {
        Self {
            cost: 0.0,
            bb_cost: 0.0,
            timing_cost: 0.0,
            noc_aggregate_bandwidth_cost: 0.0,
            noc_latency_cost: 0.0,
            bb_cost_norm: 1.0,
            timing_cost_norm: 1.0,
            noc_aggregate_bandwidth_cost_norm: 1.0,
            noc_latency_cost_norm: 1.0,
        }
    }
}

impl PlacerCosts {
    /// Both NoC terms scaled by their normalization factors.
    pub fn normalized_noc_cost(&self) -> f64 {
        self.noc_aggregate_bandwidth_cost * self.noc_aggregate_bandwidth_cost_norm
            + self.noc_latency_cost * self.noc_latency_cost_norm
    }

    pub fn total_cost(&self, noc_opts: &NocConfig) -> f64 {
        match noc_opts.mode {
            PlacementMode::NocOnly => self.normalized_noc_cost(),
            PlacementMode::Combined => {
                self.bb_cost * self.bb_cost_norm
                    + self.timing_cost * self.timing_cost_norm
                    + noc_opts.placement_weighting * self.normalized_noc_cost()
            }
        }
    }

    /// Contribution of a move's NoC delta to the change in total cost.
    pub fn noc_delta_cost(&self, delta: &NocMoveDelta, noc_opts: &NocConfig) -> f64 {
        let normalized = delta.aggregate_bandwidth * self.noc_aggregate_bandwidth_cost_norm
            + delta.latency * self.noc_latency_cost_norm;
        match noc_opts.mode {
            PlacementMode::NocOnly => normalized,
            PlacementMode::Combined => noc_opts.placement_weighting * normalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_mode_weights_noc_terms() {
        let costs = PlacerCosts {
            bb_cost: 10.0,
            bb_cost_norm: 0.1,
            noc_aggregate_bandwidth_cost: 4.0,
            noc_aggregate_bandwidth_cost_norm: 0.25,
            noc_latency_cost: 2e-9,
            noc_latency_cost_norm: 5e8,
            ..PlacerCosts::default()
        };
        let mut opts = NocConfig {
            placement_weighting: 0.5,
            ..NocConfig::default()
        };

        opts.mode = PlacementMode::Combined;
        assert!((costs.total_cost(&opts) - (1.0 + 0.5 * 2.0)).abs() < 1e-12);

        opts.mode = PlacementMode::NocOnly;
        assert!((costs.total_cost(&opts) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn delta_cost_uses_current_normalization() {
        let costs = PlacerCosts {
            noc_aggregate_bandwidth_cost_norm: 0.5,
            noc_latency_cost_norm: 1e9,
            ..PlacerCosts::default()
        };
        let delta = NocMoveDelta {
            aggregate_bandwidth: -2.0,
            latency: 1e-9,
            affected_traffic_flows: 1,
        };
        let opts = NocConfig {
            placement_weighting: 2.0,
            mode: PlacementMode::Combined,
            ..NocConfig::default()
        };
        assert!((costs.noc_delta_cost(&delta, &opts) - 0.0).abs() < 1e-12);
    }
}
