use crate::NocRouting;
use noc_common::db::indices::{NocLinkId, NocRouterId};
use noc_common::db::noc::NocStorage;
use noc_common::error::NocError;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RouteDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Dimension-ordered routing for mesh topologies: travel along X until the
/// column matches the sink, then along Y.
#[derive(Clone, Copy, Debug, Default)]
pub struct XyRouting;

impl XyRouting {
    fn next_direction(noc: &NocStorage, curr: NocRouterId, sink: NocRouterId) -> RouteDirection {
        let c = noc.router(curr).loc;
        let s = noc.router(sink).loc;
        match c.x.cmp(&s.x) {
            Ordering::Less => RouteDirection::Right,
            Ordering::Greater => RouteDirection::Left,
            Ordering::Equal => {
                if c.y < s.y {
                    RouteDirection::Up
                } else {
                    RouteDirection::Down
                }
            }
        }
    }

    /// Picks the outgoing link that moves one router in `direction`, keeping
    /// the other coordinate fixed. The nearest such router wins.
    fn find_link(
        noc: &NocStorage,
        curr: NocRouterId,
        direction: RouteDirection,
    ) -> Option<NocLinkId> {
        let c = noc.router(curr).loc;
        noc.outgoing_links(curr)
            .iter()
            .copied()
            .filter(|&l| {
                let n = noc.router(noc.link(l).sink).loc;
                match direction {
                    RouteDirection::Right => n.y == c.y && n.x > c.x,
                    RouteDirection::Left => n.y == c.y && n.x < c.x,
                    RouteDirection::Up => n.x == c.x && n.y > c.y,
                    RouteDirection::Down => n.x == c.x && n.y < c.y,
                }
            })
            .min_by_key(|&l| noc.router(noc.link(l).sink).loc.manhattan_distance(&c))
    }
}

impl NocRouting for XyRouting {
    fn name(&self) -> &'static str {
        "xy_routing"
    }

    fn route_flow(
        &self,
        src: NocRouterId,
        sink: NocRouterId,
        noc: &NocStorage,
    ) -> Result<Vec<NocLinkId>, NocError> {
        let mut route = Vec::new();
        let mut visited = vec![false; noc.num_routers()];
        let mut curr = src;
        visited[curr.index()] = true;

        while curr != sink {
            let direction = Self::next_direction(noc, curr, sink);
            let Some(link) = Self::find_link(noc, curr, direction) else {
                return Err(NocError::RoutingFailed {
                    algorithm: self.name(),
                    src,
                    sink,
                    reason: format!("router {} has no link heading {:?}", curr, direction),
                });
            };
            route.push(link);
            curr = noc.link(link).sink;
            if visited[curr.index()] {
                return Err(NocError::RoutingFailed {
                    algorithm: self.name(),
                    src,
                    sink,
                    reason: format!("route revisits router {}", curr),
                });
            }
            visited[curr.index()] = true;
        }
        Ok(route)
    }
}
