pub mod bfs;
pub mod min_latency;
pub mod xy;

use noc_common::db::indices::{NocLinkId, NocRouterId};
use noc_common::db::noc::NocStorage;

/// Walks the parent-link chain back from `sink` and returns the links in
/// source-to-sink order.
pub(crate) fn reconstruct_route(
    noc: &NocStorage,
    parent_link: &[Option<NocLinkId>],
    src: NocRouterId,
    sink: NocRouterId,
) -> Vec<NocLinkId> {
    let mut route = Vec::new();
    let mut curr = sink;
    while curr != src {
        match parent_link[curr.index()] {
            Some(link) => {
                route.push(link);
                curr = noc.link(link).source;
            }
            None => break,
        }
    }
    route.reverse();
    route
}
