use crate::db::indices::{ClusterBlockId, NocLinkId, NocRouterId, TrafficFlowId};
use crate::db::noc::NocStorage;
use crate::db::placement::BlockLocations;
use crate::db::traffic::NocTrafficFlows;
use crate::error::NocError;
use rayon::prelude::*;

/// Resolves the hard router currently hosting a logical router block.
pub fn placed_router(
    noc: &NocStorage,
    locs: &BlockLocations,
    block: ClusterBlockId,
) -> Result<NocRouterId, NocError> {
    let loc = locs.loc(block)?;
    noc.router_at_location(loc)
        .ok_or(NocError::NoRouterAtLocation { block, loc })
}

/// Verifies that every stored route is a contiguous chain of links from the
/// router hosting the flow's source block to the router hosting its sink block.
pub fn check_routes(
    noc: &NocStorage,
    flows: &NocTrafficFlows,
    routes: &[Vec<NocLinkId>],
    locs: &BlockLocations,
) -> Result<(), NocError> {
    if routes.len() != flows.num_flows() {
        return Err(NocError::InvalidRoute {
            flow: TrafficFlowId::new(routes.len().min(flows.num_flows())),
            reason: format!(
                "{} routes stored for {} traffic flows",
                routes.len(),
                flows.num_flows()
            ),
        });
    }

    let failure = routes
        .par_iter()
        .enumerate()
        .find_map_first(|(i, route)| {
            check_single_route(noc, flows, TrafficFlowId::new(i), route, locs).err()
        });

    match failure {
        Some(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: {}", e);
            Err(e)
        }
        None => Ok(()),
    }
}

fn check_single_route(
    noc: &NocStorage,
    flows: &NocTrafficFlows,
    flow_id: TrafficFlowId,
    route: &[NocLinkId],
    locs: &BlockLocations,
) -> Result<(), NocError> {
    let flow = flows.flow(flow_id);
    let src = placed_router(noc, locs, flow.source_router_block)?;
    let sink = placed_router(noc, locs, flow.sink_router_block)?;

    let invalid = |reason: String| NocError::InvalidRoute {
        flow: flow_id,
        reason,
    };

    if let Some(&bad) = route.iter().find(|l| l.index() >= noc.num_links()) {
        return Err(invalid(format!("link {} does not exist", bad)));
    }

    let Some((&first, &last)) = route.first().zip(route.last()) else {
        if src == sink {
            return Ok(());
        }
        return Err(invalid(format!(
            "empty route between distinct routers {} and {}",
            src, sink
        )));
    };

    if noc.link(first).source != src {
        return Err(invalid(format!(
            "starts at router {} instead of {}",
            noc.link(first).source,
            src
        )));
    }
    for pair in route.windows(2) {
        if noc.link(pair[0]).sink != noc.link(pair[1]).source {
            return Err(invalid(format!(
                "link {} does not continue from link {}",
                pair[1], pair[0]
            )));
        }
    }
    if noc.link(last).sink != sink {
        return Err(invalid(format!(
            "ends at router {} instead of {}",
            noc.link(last).sink,
            sink
        )));
    }
    Ok(())
}

/// Link usage implied by the stored routes, each link summed from zero in
/// ascending flow order.
pub fn expected_link_usage(
    noc: &NocStorage,
    flows: &NocTrafficFlows,
    routes: &[Vec<NocLinkId>],
) -> Vec<f64> {
    let mut usage = vec![0.0; noc.num_links()];
    for (flow, route) in flows.flows().iter().zip(routes) {
        for &link in route {
            usage[link.index()] += flow.bandwidth;
        }
    }
    usage
}

/// Compares every link's tracked usage with the sum of the demands of the
/// flows routed over it. Differences are measured relative to the link's own
/// expected usage, so a link no flow crosses must read exactly zero.
pub fn check_link_usage(
    noc: &NocStorage,
    flows: &NocTrafficFlows,
    routes: &[Vec<NocLinkId>],
    error_tolerance: f64,
) -> Result<(), NocError> {
    let expected = expected_link_usage(noc, flows, routes);

    let mismatch = noc
        .links
        .par_iter()
        .zip(expected.par_iter())
        .enumerate()
        .find_map_first(|(i, (link, &want))| {
            if (link.bandwidth_usage - want).abs() > error_tolerance * want.abs() {
                Some(NocError::LinkUsageMismatch {
                    link: NocLinkId::new(i),
                    tracked: link.bandwidth_usage,
                    expected: want,
                })
            } else {
                None
            }
        });

    match mismatch {
        Some(e) => {
            log::error!("\x1b[31mFAIL\x1b[0m: {}", e);
            Err(e)
        }
        None => Ok(()),
    }
}
