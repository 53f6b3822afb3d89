use super::NocPlacementContext;
use crate::costs::PlacerCosts;
use noc_common::db::placement::BlockLocations;
use noc_common::error::NocError;
use noc_common::util::check::{check_link_usage, check_routes};

/// Absolute drift a cost term may always show, whatever its relative error.
/// Covers rounding residue left on a total that should be zero.
pub const AGGREGATE_BANDWIDTH_DRIFT_FLOOR: f64 = 1e-6;
pub const LATENCY_DRIFT_FLOOR: f64 = 1e-24;

impl NocPlacementContext {
    /// Audits the incrementally tracked NoC state against a recomputation
    /// from scratch: every route must connect its flow's routers, every link
    /// usage must match the routes crossing it, and both cost terms must lie
    /// within `error_tolerance` (relative) of the recomputed values or within
    /// a small absolute floor of them.
    pub fn check_noc_placement_costs(
        &self,
        costs: &PlacerCosts,
        error_tolerance: f64,
        locs: &BlockLocations,
    ) -> Result<(), NocError> {
        self.ensure_routed()?;

        let routes = self.routes().as_slice();
        check_routes(self.noc(), self.traffic_flows(), routes, locs)?;
        check_link_usage(self.noc(), self.traffic_flows(), routes, error_tolerance)?;

        let recomputed = self.recompute_noc_costs();
        check_cost_term(
            "aggregate bandwidth",
            costs.noc_aggregate_bandwidth_cost,
            recomputed.aggregate_bandwidth,
            error_tolerance,
            AGGREGATE_BANDWIDTH_DRIFT_FLOOR,
        )?;
        check_cost_term(
            "latency",
            costs.noc_latency_cost,
            recomputed.latency,
            error_tolerance,
            LATENCY_DRIFT_FLOOR,
        )?;

        log::info!(
            "\x1b[32mPASS\x1b[0m: NoC costs match recomputation ({} flows, {} links)",
            self.traffic_flows().num_flows(),
            self.noc().num_links()
        );
        Ok(())
    }
}

fn check_cost_term(
    term: &'static str,
    tracked: f64,
    recomputed: f64,
    tolerance: f64,
    floor: f64,
) -> Result<(), NocError> {
    let allowed = (tolerance * tracked.abs().max(recomputed.abs())).max(floor);
    if (recomputed - tracked).abs() > allowed {
        let e = NocError::CostDrift {
            term,
            tracked,
            recomputed,
            tolerance,
        };
        log::error!("\x1b[31mFAIL\x1b[0m: {}", e);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BW: f64 = AGGREGATE_BANDWIDTH_DRIFT_FLOOR;
    const LAT: f64 = LATENCY_DRIFT_FLOOR;

    #[test]
    fn drift_is_relative_to_the_cost() {
        assert!(check_cost_term("latency", 1e-9, 1.005e-9, 0.01, LAT).is_ok());
        assert!(check_cost_term("latency", 1e-9, 1.02e-9, 0.01, LAT).is_err());
        assert!(check_cost_term("aggregate bandwidth", 0.0, 0.0, 0.01, BW).is_ok());
        assert!(check_cost_term("aggregate bandwidth", 0.0, 1e-3, 0.01, BW).is_err());
    }

    #[test]
    fn rounding_residue_on_a_zero_cost_passes() {
        assert!(check_cost_term("aggregate bandwidth", 0.0, 3e-9, 0.01, BW).is_ok());
        assert!(check_cost_term("aggregate bandwidth", 4e-9, 0.0, 0.0, BW).is_ok());
        assert!(check_cost_term("latency", 0.0, 1e-27, 0.01, LAT).is_ok());
        assert!(check_cost_term("latency", 0.0, 1e-21, 0.01, LAT).is_err());
    }
}
