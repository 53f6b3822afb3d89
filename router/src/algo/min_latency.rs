use super::reconstruct_route;
use crate::NocRouting;
use noc_common::db::indices::{NocLinkId, NocRouterId};
use noc_common::db::noc::NocStorage;
use noc_common::error::NocError;
use priority_queue::PriorityQueue;
use std::cmp::Ordering;

#[derive(Copy, Clone, Debug)]
struct Candidate {
    latency: f64,
    router: NocRouterId,
}

// Lower latency ranks higher; equal latencies fall back to the lower router
// index so that pops are totally ordered.
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .latency
            .total_cmp(&self.latency)
            .then_with(|| other.router.cmp(&self.router))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Dijkstra over link latency plus the latency of each router entered.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinLatencyRouting;

impl NocRouting for MinLatencyRouting {
    fn name(&self) -> &'static str {
        "min_latency_routing"
    }

    fn route_flow(
        &self,
        src: NocRouterId,
        sink: NocRouterId,
        noc: &NocStorage,
    ) -> Result<Vec<NocLinkId>, NocError> {
        if src == sink {
            return Ok(Vec::new());
        }

        let n = noc.num_routers();
        let mut best = vec![f64::INFINITY; n];
        let mut settled = vec![false; n];
        let mut parent_link: Vec<Option<NocLinkId>> = vec![None; n];
        let mut queue = PriorityQueue::new();

        best[src.index()] = 0.0;
        queue.push(
            src,
            Candidate {
                latency: 0.0,
                router: src,
            },
        );

        while let Some((curr, candidate)) = queue.pop() {
            if curr == sink {
                return Ok(reconstruct_route(noc, &parent_link, src, sink));
            }
            settled[curr.index()] = true;

            for &link in noc.outgoing_links(curr) {
                let l = noc.link(link);
                let next = l.sink;
                if settled[next.index()] {
                    continue;
                }
                let tentative = candidate.latency + l.latency + noc.router(next).latency;
                if tentative < best[next.index()] {
                    best[next.index()] = tentative;
                    parent_link[next.index()] = Some(link);
                    queue.push(
                        next,
                        Candidate {
                            latency: tentative,
                            router: next,
                        },
                    );
                }
            }
        }

        Err(NocError::RoutingFailed {
            algorithm: self.name(),
            src,
            sink,
            reason: "sink router is unreachable".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noc_common::geom::coord::GridCoord;

    #[test]
    fn prefers_lower_latency_over_fewer_hops() {
        let mut noc = NocStorage::new();
        let a = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let b = noc.add_router(1, GridCoord::new(1, 0, 0), 0.0).unwrap();
        let c = noc.add_router(2, GridCoord::new(2, 0, 0), 0.0).unwrap();
        let slow = noc.add_link(a, c, 1.0, 10e-9);
        let ab = noc.add_link(a, b, 1.0, 1e-9);
        let bc = noc.add_link(b, c, 1.0, 1e-9);

        let route = MinLatencyRouting.route_flow(a, c, &noc).unwrap();
        assert_eq!(route, vec![ab, bc]);
        assert!(!route.contains(&slow));
    }

    #[test]
    fn router_latency_counts_against_a_path() {
        let mut noc = NocStorage::new();
        let a = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let b = noc.add_router(1, GridCoord::new(1, 0, 0), 50e-9).unwrap();
        let c = noc.add_router(2, GridCoord::new(2, 0, 0), 0.0).unwrap();
        let direct = noc.add_link(a, c, 1.0, 10e-9);
        noc.add_link(a, b, 1.0, 1e-9);
        noc.add_link(b, c, 1.0, 1e-9);

        let route = MinLatencyRouting.route_flow(a, c, &noc).unwrap();
        assert_eq!(route, vec![direct]);
    }

    #[test]
    fn unreachable_sink_fails() {
        let mut noc = NocStorage::new();
        let a = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let b = noc.add_router(1, GridCoord::new(1, 0, 0), 0.0).unwrap();
        noc.add_link(b, a, 1.0, 1e-9);
        assert!(MinLatencyRouting.route_flow(a, b, &noc).is_err());
    }
}
