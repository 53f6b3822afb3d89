use noc_common::db::indices::NocLinkId;
use noc_common::db::noc::NocStorage;

/// Direction in which the links of a traffic flow route are updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkUsageUpdate {
    /// The route was just added; its links now carry the flow.
    Increment,
    /// The route is being removed; its links no longer carry the flow.
    Decrement,
}

/// Adds or removes `traffic_flow_bandwidth` on every link of a route.
pub fn update_traffic_flow_link_usage(
    traffic_flow_route: &[NocLinkId],
    noc: &mut NocStorage,
    how_to_update_links: LinkUsageUpdate,
    traffic_flow_bandwidth: f64,
) {
    let signed_bandwidth = match how_to_update_links {
        LinkUsageUpdate::Increment => traffic_flow_bandwidth,
        LinkUsageUpdate::Decrement => -traffic_flow_bandwidth,
    };
    for &link in traffic_flow_route {
        noc.link_mut(link).bandwidth_usage += signed_bandwidth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noc_common::geom::coord::GridCoord;

    #[test]
    fn increment_then_decrement_restores_usage() {
        let mut noc = NocStorage::new();
        let a = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let b = noc.add_router(1, GridCoord::new(1, 0, 0), 0.0).unwrap();
        let (ab, ba) = noc.add_bidirectional_link(a, b, 8.0, 1e-9);
        noc.link_mut(ab).bandwidth_usage = 1.5;

        update_traffic_flow_link_usage(&[ab], &mut noc, LinkUsageUpdate::Increment, 2.0);
        assert_eq!(noc.link(ab).bandwidth_usage, 3.5);
        assert_eq!(noc.link(ba).bandwidth_usage, 0.0);

        update_traffic_flow_link_usage(&[ab], &mut noc, LinkUsageUpdate::Decrement, 2.0);
        assert_eq!(noc.link(ab).bandwidth_usage, 1.5);
    }

    #[test]
    fn repeated_link_is_charged_per_traversal() {
        let mut noc = NocStorage::new();
        let a = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let b = noc.add_router(1, GridCoord::new(1, 0, 0), 0.0).unwrap();
        let ab = noc.add_link(a, b, 8.0, 1e-9);

        update_traffic_flow_link_usage(&[ab, ab], &mut noc, LinkUsageUpdate::Increment, 1.0);
        assert_eq!(noc.link(ab).bandwidth_usage, 2.0);
    }
}
