use crate::costs::PlacerCosts;
use noc_common::util::config::NocConfig;

/// Upper bound on the inverse of the aggregate bandwidth cost.
pub const MAX_INV_NOC_AGGREGATE_BANDWIDTH_COST: f64 = 1.0;
/// Latency costs sit around the nanosecond scale, so their inverse is allowed
/// to grow much larger.
pub const MAX_INV_NOC_LATENCY_COST: f64 = 1.0e12;

/// Refreshes both NoC normalization factors from the current costs and
/// recomputes the placer's total cost with them.
pub fn update_noc_normalization_factors(costs: &mut PlacerCosts, noc_opts: &NocConfig) {
    costs.noc_aggregate_bandwidth_cost_norm =
        (1.0 / costs.noc_aggregate_bandwidth_cost).min(MAX_INV_NOC_AGGREGATE_BANDWIDTH_COST);
    costs.noc_latency_cost_norm = (1.0 / costs.noc_latency_cost).min(MAX_INV_NOC_LATENCY_COST);

    costs.cost = costs.total_cost(noc_opts);

    log::debug!(
        "NoC normalization factors: aggregate bandwidth {:e}, latency {:e}",
        costs.noc_aggregate_bandwidth_cost_norm,
        costs.noc_latency_cost_norm
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use noc_common::util::config::PlacementMode;

    fn with_costs(aggregate_bandwidth: f64, latency: f64) -> PlacerCosts {
        PlacerCosts {
            noc_aggregate_bandwidth_cost: aggregate_bandwidth,
            noc_latency_cost: latency,
            ..PlacerCosts::default()
        }
    }

    #[test]
    fn zero_costs_clamp_to_the_maxima() {
        let mut costs = with_costs(0.0, 0.0);
        update_noc_normalization_factors(&mut costs, &NocConfig::default());
        assert_eq!(costs.noc_aggregate_bandwidth_cost_norm, MAX_INV_NOC_AGGREGATE_BANDWIDTH_COST);
        assert_eq!(costs.noc_latency_cost_norm, MAX_INV_NOC_LATENCY_COST);
    }

    #[test]
    fn tiny_costs_never_exceed_the_maxima() {
        let mut costs = with_costs(1e-6, 1e-20);
        update_noc_normalization_factors(&mut costs, &NocConfig::default());
        assert!(costs.noc_aggregate_bandwidth_cost_norm <= MAX_INV_NOC_AGGREGATE_BANDWIDTH_COST);
        assert!(costs.noc_latency_cost_norm <= MAX_INV_NOC_LATENCY_COST);
    }

    #[test]
    fn large_costs_use_the_reciprocal() {
        let mut costs = with_costs(400.0, 2e-9);
        let opts = NocConfig {
            mode: PlacementMode::NocOnly,
            ..NocConfig::default()
        };
        update_noc_normalization_factors(&mut costs, &opts);
        assert_eq!(costs.noc_aggregate_bandwidth_cost_norm, 1.0 / 400.0);
        assert!((costs.noc_latency_cost_norm - 5e8).abs() < 1e-3);
        // Each normalized term contributes one.
        assert!((costs.cost - 2.0).abs() < 1e-12);
    }
}
