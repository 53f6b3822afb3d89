use super::usage::{LinkUsageUpdate, update_traffic_flow_link_usage};
use noc_common::db::indices::{NocLinkId, TrafficFlowId};
use noc_common::db::noc::NocStorage;
use noc_common::db::placement::BlockLocations;
use noc_common::db::traffic::NocTrafficFlows;
use noc_common::error::NocError;
use noc_common::util::check::placed_router;
use noc_router::NocRouting;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::mem;

/// Current route of every traffic flow, indexed by flow id. Routes are only
/// ever replaced as a whole.
///
/// Alongside the routes the store keeps, per link, the flows whose route
/// crosses it and how many times. The map is ordered by flow id so a link's
/// usage can be summed in the same order initial routing charged it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteStore {
    routes: Vec<Vec<NocLinkId>>,
    link_flows: Vec<BTreeMap<TrafficFlowId, u32>>,
}

impl RouteStore {
    pub fn new(num_traffic_flows: usize, num_links: usize) -> Self {
        Self {
            routes: vec![Vec::new(); num_traffic_flows],
            link_flows: vec![BTreeMap::new(); num_links],
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[inline]
    pub fn route(&self, flow: TrafficFlowId) -> &[NocLinkId] {
        &self.routes[flow.index()]
    }

    /// Stores `route` for `flow` and returns the route it replaced.
    pub fn replace(&mut self, flow: TrafficFlowId, route: Vec<NocLinkId>) -> Vec<NocLinkId> {
        let old = mem::replace(&mut self.routes[flow.index()], route);
        unindex_route(&mut self.link_flows, flow, &old);
        index_route(&mut self.link_flows, flow, &self.routes[flow.index()]);
        old
    }

    pub fn take(&mut self, flow: TrafficFlowId) -> Vec<NocLinkId> {
        self.replace(flow, Vec::new())
    }

    pub fn as_slice(&self) -> &[Vec<NocLinkId>] {
        &self.routes
    }

    /// Flows crossing `link` in ascending id order, with their multiplicity.
    pub fn flows_on_link(
        &self,
        link: NocLinkId,
    ) -> impl Iterator<Item = (TrafficFlowId, u32)> + '_ {
        self.link_flows[link.index()].iter().map(|(&f, &n)| (f, n))
    }

    /// Usage of `link` summed from zero over the flows crossing it, lowest
    /// flow id first. Initial routing charges links in exactly this order, so
    /// the result is independent of how many moves came before.
    pub fn settled_link_usage(&self, link: NocLinkId, traffic_flows: &NocTrafficFlows) -> f64 {
        let mut usage = 0.0;
        for (flow, times) in self.flows_on_link(link) {
            let bandwidth = traffic_flows.flow(flow).bandwidth;
            for _ in 0..times {
                usage += bandwidth;
            }
        }
        usage
    }
}

fn index_route(
    link_flows: &mut [BTreeMap<TrafficFlowId, u32>],
    flow: TrafficFlowId,
    route: &[NocLinkId],
) {
    for link in route {
        *link_flows[link.index()].entry(flow).or_insert(0) += 1;
    }
}

fn unindex_route(
    link_flows: &mut [BTreeMap<TrafficFlowId, u32>],
    flow: TrafficFlowId,
    route: &[NocLinkId],
) {
    for link in route {
        if let Entry::Occupied(mut entry) = link_flows[link.index()].entry(flow) {
            *entry.get_mut() -= 1;
            if *entry.get() == 0 {
                entry.remove();
            }
        }
    }
}

/// Overwrites the usage of each link in `links` with its settled value.
fn settle_link_usage(
    links: &[NocLinkId],
    noc: &mut NocStorage,
    traffic_flows: &NocTrafficFlows,
    routes: &RouteStore,
) {
    for &link in links {
        noc.link_mut(link).bandwidth_usage = routes.settled_link_usage(link, traffic_flows);
    }
}

/// Routes one traffic flow between the routers currently hosting its source
/// and sink blocks.
pub fn route_traffic_flow(
    traffic_flow_id: TrafficFlowId,
    traffic_flows: &NocTrafficFlows,
    noc: &NocStorage,
    router: &dyn NocRouting,
    locs: &BlockLocations,
) -> Result<Vec<NocLinkId>, NocError> {
    let flow = traffic_flows.flow(traffic_flow_id);
    let src = placed_router(noc, locs, flow.source_router_block)?;
    let sink = placed_router(noc, locs, flow.sink_router_block)?;
    router.route_flow(src, sink, noc)
}

/// Removes a flow's route from the link usages, routes it again for the
/// current placement and charges the new route. If routing fails the old
/// route and its usage are put back before the error is returned.
///
/// Decrementing and incrementing leaves rounding residue behind, so every
/// link the old or new route touches is then settled. A flow routed back
/// onto its old links therefore restores their usage bit for bit.
pub fn re_route_traffic_flow(
    traffic_flow_id: TrafficFlowId,
    traffic_flows: &NocTrafficFlows,
    noc: &mut NocStorage,
    routes: &mut RouteStore,
    router: &dyn NocRouting,
    locs: &BlockLocations,
) -> Result<(), NocError> {
    let bandwidth = traffic_flows.flow(traffic_flow_id).bandwidth;
    let old_route = routes.take(traffic_flow_id);
    update_traffic_flow_link_usage(&old_route, noc, LinkUsageUpdate::Decrement, bandwidth);

    match route_traffic_flow(traffic_flow_id, traffic_flows, noc, router, locs) {
        Ok(new_route) => {
            update_traffic_flow_link_usage(&new_route, noc, LinkUsageUpdate::Increment, bandwidth);
            routes.replace(traffic_flow_id, new_route);
            settle_link_usage(&old_route, noc, traffic_flows, routes);
            settle_link_usage(routes.route(traffic_flow_id), noc, traffic_flows, routes);
            Ok(())
        }
        Err(e) => {
            update_traffic_flow_link_usage(&old_route, noc, LinkUsageUpdate::Increment, bandwidth);
            routes.replace(traffic_flow_id, old_route);
            settle_link_usage(routes.route(traffic_flow_id), noc, traffic_flows, routes);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noc_common::db::indices::ClusterBlockId;
    use noc_common::geom::coord::GridCoord;
    use noc_router::BfsRouting;

    fn fixture() -> (NocStorage, NocTrafficFlows, BlockLocations) {
        let mut noc = NocStorage::new();
        let r0 = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let r1 = noc.add_router(1, GridCoord::new(1, 0, 0), 0.0).unwrap();
        let r2 = noc.add_router(2, GridCoord::new(2, 0, 0), 0.0).unwrap();
        noc.add_bidirectional_link(r0, r1, 8.0, 1e-9);
        noc.add_bidirectional_link(r1, r2, 8.0, 1e-9);

        let mut flows = NocTrafficFlows::new();
        flows.add_traffic_flow(
            "f".into(),
            ClusterBlockId::new(0),
            ClusterBlockId::new(1),
            2.0,
            f64::INFINITY,
            1.0,
        );
        let mut locs = BlockLocations::new(2);
        locs.set(ClusterBlockId::new(0), GridCoord::new(0, 0, 0));
        locs.set(ClusterBlockId::new(1), GridCoord::new(1, 0, 0));
        (noc, flows, locs)
    }

    #[test]
    fn re_route_moves_usage_to_the_new_route() {
        let (mut noc, flows, mut locs) = fixture();
        let flow = TrafficFlowId::new(0);
        let mut routes = RouteStore::new(1, noc.num_links());

        re_route_traffic_flow(flow, &flows, &mut noc, &mut routes, &BfsRouting, &locs).unwrap();
        assert_eq!(routes.route(flow).len(), 1);
        assert_eq!(noc.links[0].bandwidth_usage, 2.0);

        locs.set(ClusterBlockId::new(1), GridCoord::new(2, 0, 0));
        re_route_traffic_flow(flow, &flows, &mut noc, &mut routes, &BfsRouting, &locs).unwrap();
        assert_eq!(routes.route(flow).len(), 2);
        let total: f64 = noc.links.iter().map(|l| l.bandwidth_usage).sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn failed_re_route_keeps_the_old_route() {
        let (mut noc, flows, mut locs) = fixture();
        let flow = TrafficFlowId::new(0);
        let mut routes = RouteStore::new(1, noc.num_links());
        re_route_traffic_flow(flow, &flows, &mut noc, &mut routes, &BfsRouting, &locs).unwrap();
        let before_routes = routes.clone();
        let before_usage: Vec<f64> = noc.links.iter().map(|l| l.bandwidth_usage).collect();

        locs.set(ClusterBlockId::new(1), GridCoord::new(9, 9, 0));
        let err = re_route_traffic_flow(flow, &flows, &mut noc, &mut routes, &BfsRouting, &locs)
            .unwrap_err();
        assert!(matches!(err, NocError::NoRouterAtLocation { .. }));
        assert_eq!(routes, before_routes);
        let after_usage: Vec<f64> = noc.links.iter().map(|l| l.bandwidth_usage).collect();
        assert_eq!(after_usage, before_usage);
    }

    #[test]
    fn link_index_follows_route_replacement() {
        let (mut noc, flows, mut locs) = fixture();
        let flow = TrafficFlowId::new(0);
        let mut routes = RouteStore::new(1, noc.num_links());

        locs.set(ClusterBlockId::new(1), GridCoord::new(2, 0, 0));
        re_route_traffic_flow(flow, &flows, &mut noc, &mut routes, &BfsRouting, &locs).unwrap();
        let far = routes.route(flow).to_vec();
        for &link in &far {
            assert_eq!(routes.flows_on_link(link).collect::<Vec<_>>(), vec![(flow, 1)]);
            assert_eq!(routes.settled_link_usage(link, &flows), 2.0);
        }

        locs.set(ClusterBlockId::new(1), GridCoord::new(1, 0, 0));
        re_route_traffic_flow(flow, &flows, &mut noc, &mut routes, &BfsRouting, &locs).unwrap();
        let near = routes.route(flow)[0];
        for &link in &far {
            let expected = if link == near { 2.0 } else { 0.0 };
            assert_eq!(routes.flows_on_link(link).count(), (link == near) as usize);
            assert_eq!(noc.link(link).bandwidth_usage, expected);
        }
    }
}
