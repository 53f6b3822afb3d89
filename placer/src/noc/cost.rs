use noc_common::db::indices::NocLinkId;
use noc_common::db::noc::NocStorage;
use noc_common::db::traffic::TrafficFlow;
use noc_common::util::config::NocConfig;

/// Number of links in the route times the flow bandwidth, scaled by priority.
pub fn calculate_traffic_flow_aggregate_bandwidth_cost(
    traffic_flow_route: &[NocLinkId],
    traffic_flow_info: &TrafficFlow,
) -> f64 {
    traffic_flow_route.len() as f64 * traffic_flow_info.bandwidth * traffic_flow_info.priority
}

/// Latency of a route: every link traversed plus every router visited,
/// including the source router. An empty route has no latency.
pub fn traffic_flow_latency(traffic_flow_route: &[NocLinkId], noc: &NocStorage) -> f64 {
    let Some(&first) = traffic_flow_route.first() else {
        return 0.0;
    };
    let mut latency = noc.router(noc.link(first).source).latency;
    for &link_id in traffic_flow_route {
        let link = noc.link(link_id);
        latency += link.latency + noc.router(link.sink).latency;
    }
    latency
}

/// Weighted sum of the route latency and its overrun of the flow's latency
/// constraint, scaled by priority.
pub fn calculate_traffic_flow_latency_cost(
    traffic_flow_route: &[NocLinkId],
    noc: &NocStorage,
    traffic_flow_info: &TrafficFlow,
    noc_opts: &NocConfig,
) -> f64 {
    let latency = traffic_flow_latency(traffic_flow_route, noc);
    let latency_overrun = (latency - traffic_flow_info.max_latency).max(0.0);

    (noc_opts.latency_constraints_weighting * latency_overrun
        + noc_opts.latency_weighting * latency)
        * traffic_flow_info.priority
}
