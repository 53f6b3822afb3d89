use super::cost::{calculate_traffic_flow_aggregate_bandwidth_cost, calculate_traffic_flow_latency_cost};
use super::routes::{self, RouteStore, route_traffic_flow};
use super::usage::{LinkUsageUpdate, update_traffic_flow_link_usage};
use super::{NocCostTerms, NocMoveDelta};
use crate::costs::PlacerCosts;
use crate::moves::BlocksToBeMoved;
use noc_common::db::indices::{ClusterBlockId, NocLinkId, TrafficFlowId};
use noc_common::db::noc::NocStorage;
use noc_common::db::placement::BlockLocations;
use noc_common::db::traffic::NocTrafficFlows;
use noc_common::error::NocError;
use noc_common::util::config::NocConfig;
use noc_common::util::profiler::ScopedTimer;
use noc_router::NocRouting;
use std::collections::HashSet;

/// Placement-time NoC state: the topology with its link usages, the traffic
/// flows, their current routes and the per-flow cost caches.
///
/// Block locations stay with the placer and are passed into every call that
/// needs them. Calls must follow `initial_noc_placement`, then any number of
/// `find_affected_noc_routers_and_update_noc_costs` each followed by either
/// `commit_noc_costs` or `revert_noc_traffic_flow_routes`, then `free`.
pub struct NocPlacementContext {
    noc: NocStorage,
    traffic_flows: NocTrafficFlows,
    router: Box<dyn NocRouting>,
    opts: NocConfig,
    routes: RouteStore,

    flow_aggregate_bandwidth_cost: Vec<f64>,
    flow_latency_cost: Vec<f64>,
    proposed_aggregate_bandwidth_cost: Vec<f64>,
    proposed_latency_cost: Vec<f64>,

    // Flows re-routed by the move in flight, in processing order. The set
    // mirrors the list and only exists for deduplication.
    affected_traffic_flows: Vec<TrafficFlowId>,
    updated_traffic_flows: HashSet<TrafficFlowId>,

    routed: bool,
}

impl NocPlacementContext {
    /// Allocates the route store and cost caches for every traffic flow.
    pub fn new(
        noc: NocStorage,
        traffic_flows: NocTrafficFlows,
        router: Box<dyn NocRouting>,
        opts: NocConfig,
    ) -> Self {
        let n = traffic_flows.num_flows();
        let num_links = noc.num_links();
        Self {
            noc,
            traffic_flows,
            router,
            opts,
            routes: RouteStore::new(n, num_links),
            flow_aggregate_bandwidth_cost: vec![0.0; n],
            flow_latency_cost: vec![0.0; n],
            proposed_aggregate_bandwidth_cost: vec![0.0; n],
            proposed_latency_cost: vec![0.0; n],
            affected_traffic_flows: Vec::new(),
            updated_traffic_flows: HashSet::new(),
            routed: false,
        }
    }

    /// Releases the placement structures and hands back the topology with
    /// its final link usages.
    pub fn free(self) -> NocStorage {
        self.noc
    }

    pub fn noc(&self) -> &NocStorage {
        &self.noc
    }

    pub fn traffic_flows(&self) -> &NocTrafficFlows {
        &self.traffic_flows
    }

    pub fn routes(&self) -> &RouteStore {
        &self.routes
    }

    pub fn routing_algorithm(&self) -> &'static str {
        self.router.name()
    }

    pub fn opts(&self) -> &NocConfig {
        &self.opts
    }

    pub fn is_initialized(&self) -> bool {
        self.routed
    }

    /// Flows re-routed by the move currently being evaluated.
    pub fn affected_traffic_flows(&self) -> &[TrafficFlowId] {
        &self.affected_traffic_flows
    }

    pub(super) fn ensure_routed(&self) -> Result<(), NocError> {
        if self.routed {
            Ok(())
        } else {
            Err(NocError::NotInitialized)
        }
    }

    /// Routes every traffic flow for the current placement and charges each
    /// route to its links. On failure all routes and usages are cleared again.
    pub fn initial_noc_placement(&mut self, locs: &BlockLocations) -> Result<(), NocError> {
        if self.routed {
            return Err(NocError::AlreadyInitialized);
        }
        let mut timer = ScopedTimer::new("Initial NoC routing");

        for flow_id in self.traffic_flows.flow_ids() {
            let bandwidth = self.traffic_flows.flow(flow_id).bandwidth;
            if let Some(e) = self.get_traffic_flow_route(flow_id, locs).err() {
                self.noc.reset_link_usage();
                self.routes =
                    RouteStore::new(self.traffic_flows.num_flows(), self.noc.num_links());
                return Err(e);
            }
            update_traffic_flow_link_usage(
                self.routes.route(flow_id),
                &mut self.noc,
                LinkUsageUpdate::Increment,
                bandwidth,
            );
        }
        self.routed = true;
        timer.record_work(self.traffic_flows.num_flows(), "flows");

        let aggregate_bandwidth = self.comp_noc_aggregate_bandwidth_cost();
        let latency = self.comp_noc_latency_cost();
        log::info!(
            "Routed {} traffic flows with {}: aggregate bandwidth cost {:e}, latency cost {:e}",
            self.traffic_flows.num_flows(),
            self.router.name(),
            aggregate_bandwidth,
            latency
        );
        Ok(())
    }

    /// Routes one flow for the current placement and stores the route. Link
    /// usages are left untouched.
    pub fn get_traffic_flow_route(
        &mut self,
        traffic_flow_id: TrafficFlowId,
        locs: &BlockLocations,
    ) -> Result<&[NocLinkId], NocError> {
        let route = route_traffic_flow(
            traffic_flow_id,
            &self.traffic_flows,
            &self.noc,
            self.router.as_ref(),
            locs,
        )?;
        self.routes.replace(traffic_flow_id, route);
        Ok(self.routes.route(traffic_flow_id))
    }

    /// Moves one flow's bandwidth from its stored route to a freshly computed
    /// one.
    pub fn re_route_traffic_flow(
        &mut self,
        traffic_flow_id: TrafficFlowId,
        locs: &BlockLocations,
    ) -> Result<(), NocError> {
        routes::re_route_traffic_flow(
            traffic_flow_id,
            &self.traffic_flows,
            &mut self.noc,
            &mut self.routes,
            self.router.as_ref(),
            locs,
        )
    }

    /// Re-routes every flow that starts or ends at `moved_block`, skipping
    /// flows already re-routed by the current move. Returns how many flows
    /// were newly re-routed.
    pub fn re_route_associated_traffic_flows(
        &mut self,
        moved_block: ClusterBlockId,
        locs: &BlockLocations,
    ) -> Result<usize, NocError> {
        let mut num_rerouted = 0;
        for &flow_id in self.traffic_flows.flows_associated_to_router_block(moved_block) {
            if !self.updated_traffic_flows.insert(flow_id) {
                continue;
            }
            routes::re_route_traffic_flow(
                flow_id,
                &self.traffic_flows,
                &mut self.noc,
                &mut self.routes,
                self.router.as_ref(),
                locs,
            )?;
            self.affected_traffic_flows.push(flow_id);
            num_rerouted += 1;
        }
        Ok(num_rerouted)
    }

    fn re_route_moved_router_flows(
        &mut self,
        blocks_affected: &BlocksToBeMoved,
        locs: &BlockLocations,
    ) -> Result<usize, NocError> {
        self.clear_transaction();
        let mut num_rerouted = 0;
        for moved in blocks_affected.iter() {
            if self.traffic_flows.is_router_block(moved.block) {
                num_rerouted += self.re_route_associated_traffic_flows(moved.block, locs)?;
            }
        }
        Ok(num_rerouted)
    }

    fn clear_transaction(&mut self) {
        self.affected_traffic_flows.clear();
        self.updated_traffic_flows.clear();
    }

    /// Re-routes the flows touched by a proposed move against the candidate
    /// placement in `locs` and returns the resulting cost change.
    ///
    /// Routes and link usages are updated in place. If the move is rejected
    /// the caller restores the old locations and calls
    /// [`Self::revert_noc_traffic_flow_routes`]; the same applies when this
    /// call returns an error.
    pub fn find_affected_noc_routers_and_update_noc_costs(
        &mut self,
        blocks_affected: &BlocksToBeMoved,
        locs: &BlockLocations,
    ) -> Result<NocMoveDelta, NocError> {
        self.ensure_routed()?;
        let num_rerouted = self.re_route_moved_router_flows(blocks_affected, locs)?;

        let mut delta = NocMoveDelta {
            affected_traffic_flows: num_rerouted,
            ..NocMoveDelta::default()
        };
        for &flow_id in &self.affected_traffic_flows {
            let flow = self.traffic_flows.flow(flow_id);
            let route = self.routes.route(flow_id);
            let i = flow_id.index();

            self.proposed_aggregate_bandwidth_cost[i] =
                calculate_traffic_flow_aggregate_bandwidth_cost(route, flow);
            self.proposed_latency_cost[i] =
                calculate_traffic_flow_latency_cost(route, &self.noc, flow, &self.opts);

            delta.aggregate_bandwidth +=
                self.proposed_aggregate_bandwidth_cost[i] - self.flow_aggregate_bandwidth_cost[i];
            delta.latency += self.proposed_latency_cost[i] - self.flow_latency_cost[i];
        }

        if !delta.is_noop() {
            log::debug!(
                "Move re-routed {} traffic flows: aggregate bandwidth {:+e}, latency {:+e}",
                delta.affected_traffic_flows,
                delta.aggregate_bandwidth,
                delta.latency
            );
        }
        Ok(delta)
    }

    /// Accepts the move evaluated last: the proposed per-flow costs of the
    /// first `delta.affected_traffic_flows` affected flows become current and
    /// the deltas are folded into the placer's NoC cost terms. The placer's
    /// total cost is left to the caller.
    pub fn commit_noc_costs(&mut self, delta: &NocMoveDelta, costs: &mut PlacerCosts) {
        for &flow_id in self
            .affected_traffic_flows
            .iter()
            .take(delta.affected_traffic_flows)
        {
            let i = flow_id.index();
            self.flow_aggregate_bandwidth_cost[i] = self.proposed_aggregate_bandwidth_cost[i];
            self.flow_latency_cost[i] = self.proposed_latency_cost[i];
        }
        costs.noc_aggregate_bandwidth_cost += delta.aggregate_bandwidth;
        costs.noc_latency_cost += delta.latency;
        self.clear_transaction();
    }

    /// Undoes the route changes of a rejected move. The block locations in
    /// `locs` must already be restored; the flows are then re-routed against
    /// them, which regenerates the routes and usages from before the move.
    pub fn revert_noc_traffic_flow_routes(
        &mut self,
        blocks_affected: &BlocksToBeMoved,
        locs: &BlockLocations,
    ) -> Result<usize, NocError> {
        self.ensure_routed()?;
        let num_rerouted = self.re_route_moved_router_flows(blocks_affected, locs)?;
        self.clear_transaction();
        Ok(num_rerouted)
    }

    /// Sums the aggregate bandwidth cost of every stored route and makes the
    /// per-flow values the current ones.
    pub fn comp_noc_aggregate_bandwidth_cost(&mut self) -> f64 {
        let mut total = 0.0;
        for flow_id in self.traffic_flows.flow_ids() {
            let cost = calculate_traffic_flow_aggregate_bandwidth_cost(
                self.routes.route(flow_id),
                self.traffic_flows.flow(flow_id),
            );
            self.flow_aggregate_bandwidth_cost[flow_id.index()] = cost;
            total += cost;
        }
        total
    }

    /// Sums the latency cost of every stored route and makes the per-flow
    /// values the current ones.
    pub fn comp_noc_latency_cost(&mut self) -> f64 {
        let mut total = 0.0;
        for flow_id in self.traffic_flows.flow_ids() {
            let cost = calculate_traffic_flow_latency_cost(
                self.routes.route(flow_id),
                &self.noc,
                self.traffic_flows.flow(flow_id),
                &self.opts,
            );
            self.flow_latency_cost[flow_id.index()] = cost;
            total += cost;
        }
        total
    }

    /// Loads the placer's NoC cost terms from the current routes.
    pub fn initialize_noc_costs(&mut self, costs: &mut PlacerCosts) -> Result<(), NocError> {
        self.ensure_routed()?;
        costs.noc_aggregate_bandwidth_cost = self.comp_noc_aggregate_bandwidth_cost();
        costs.noc_latency_cost = self.comp_noc_latency_cost();
        Ok(())
    }

    /// Both NoC-wide cost terms recomputed from the stored routes, without
    /// routing and without touching the per-flow caches.
    pub fn recompute_noc_costs(&self) -> NocCostTerms {
        let mut terms = NocCostTerms::default();
        for flow_id in self.traffic_flows.flow_ids() {
            let route = self.routes.route(flow_id);
            let flow = self.traffic_flows.flow(flow_id);
            terms.aggregate_bandwidth += calculate_traffic_flow_aggregate_bandwidth_cost(route, flow);
            terms.latency += calculate_traffic_flow_latency_cost(route, &self.noc, flow, &self.opts);
        }
        terms
    }
}
