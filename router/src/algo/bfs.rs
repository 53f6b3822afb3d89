use super::reconstruct_route;
use crate::NocRouting;
use noc_common::db::indices::{NocLinkId, NocRouterId};
use noc_common::db::noc::NocStorage;
use noc_common::error::NocError;
use std::collections::VecDeque;

/// Fewest-hops routing. Outgoing links are explored in insertion order, so
/// among equally short routes the first one discovered always wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct BfsRouting;

impl NocRouting for BfsRouting {
    fn name(&self) -> &'static str {
        "bfs_routing"
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
        let mut visited = vec![false; n];
        let mut parent_link: Vec<Option<NocLinkId>> = vec![None; n];
        let mut queue = VecDeque::new();

        visited[src.index()] = true;
        queue.push_back(src);

        while let Some(curr) = queue.pop_front() {
            if curr == sink {
                return Ok(reconstruct_route(noc, &parent_link, src, sink));
            }
            for &link in noc.outgoing_links(curr) {
                let next = noc.link(link).sink;
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    parent_link[next.index()] = Some(link);
                    queue.push_back(next);
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

    // Diamond: r0 -> r1 -> r3 and r0 -> r2 -> r3, plus a dead-end r4.
    fn diamond() -> (NocStorage, [NocRouterId; 5]) {
        let mut noc = NocStorage::new();
        let r: Vec<NocRouterId> = (0..5)
            .map(|i| {
                noc.add_router(i, GridCoord::new(i as u32, 0, 0), 0.0)
                    .unwrap()
            })
            .collect();
        noc.add_link(r[0], r[1], 1.0, 1e-9);
        noc.add_link(r[0], r[2], 1.0, 1e-9);
        noc.add_link(r[1], r[3], 1.0, 1e-9);
        noc.add_link(r[2], r[3], 1.0, 1e-9);
        (noc, [r[0], r[1], r[2], r[3], r[4]])
    }

    #[test]
    fn finds_shortest_route_with_first_link_tie_break() {
        let (noc, r) = diamond();
        let route = BfsRouting.route_flow(r[0], r[3], &noc).unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(noc.link(route[0]).sink, r[1]);
        assert_eq!(noc.link(route[1]).sink, r[3]);
    }

    #[test]
    fn same_router_yields_empty_route() {
        let (noc, r) = diamond();
        assert!(BfsRouting.route_flow(r[2], r[2], &noc).unwrap().is_empty());
    }

    #[test]
    fn unreachable_sink_fails() {
        let (noc, r) = diamond();
        let err = BfsRouting.route_flow(r[0], r[4], &noc).unwrap_err();
        assert!(matches!(err, NocError::RoutingFailed { .. }));
    }

    #[test]
    fn repeated_calls_give_identical_routes() {
        let (noc, r) = diamond();
        let a = BfsRouting.route_flow(r[0], r[3], &noc).unwrap();
        let b = BfsRouting.route_flow(r[0], r[3], &noc).unwrap();
        assert_eq!(a, b);
    }
}
