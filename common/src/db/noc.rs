use crate::db::indices::*;
use crate::error::NocError;
use crate::geom::coord::GridCoord;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct NocRouter {
    pub user_id: i32,
    /// Grid tile of the hard router. Logical router blocks are mapped to
    /// routers through this location.
    pub loc: GridCoord,
    pub latency: f64,
}

#[derive(Clone, Debug)]
pub struct NocLink {
    pub source: NocRouterId,
    pub sink: NocRouterId,
    /// Capacity of the link.
    pub bandwidth: f64,
    pub latency: f64,
    /// Sum of the bandwidths of every traffic flow currently routed over this link.
    pub bandwidth_usage: f64,
}

impl NocLink {
    pub fn is_congested(&self) -> bool {
        self.bandwidth_usage > self.bandwidth
    }

    pub fn utilization(&self) -> f64 {
        if self.bandwidth > 0.0 {
            self.bandwidth_usage / self.bandwidth
        } else {
            0.0
        }
    }
}

/// Routers and links of the on-chip network.
pub struct NocStorage {
    pub routers: Vec<NocRouter>,
    pub links: Vec<NocLink>,

    outgoing_links: Vec<Vec<NocLinkId>>,
    loc_to_router: HashMap<GridCoord, NocRouterId>,
    user_id_map: HashMap<i32, NocRouterId>,
}

impl NocStorage {
    pub fn new() -> Self {
        Self {
            routers: Vec::with_capacity(64),
            links: Vec::with_capacity(256),
            outgoing_links: Vec::with_capacity(64),
            loc_to_router: HashMap::new(),
            user_id_map: HashMap::new(),
        }
    }

    pub fn num_routers(&self) -> usize {
        self.routers.len()
    }
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn add_router(
        &mut self,
        user_id: i32,
        loc: GridCoord,
        latency: f64,
    ) -> Result<NocRouterId, NocError> {
        if self.loc_to_router.contains_key(&loc) {
            return Err(NocError::DuplicateRouterLocation(loc));
        }
        let id = NocRouterId::new(self.routers.len());
        self.routers.push(NocRouter {
            user_id,
            loc,
            latency,
        });
        self.outgoing_links.push(Vec::new());
        self.loc_to_router.insert(loc, id);
        self.user_id_map.insert(user_id, id);
        Ok(id)
    }

    /// Adds a directed link. Outgoing links of a router keep insertion order,
    /// which routing algorithms rely on for deterministic tie-breaking.
    pub fn add_link(
        &mut self,
        source: NocRouterId,
        sink: NocRouterId,
        bandwidth: f64,
        latency: f64,
    ) -> NocLinkId {
        let id = NocLinkId::new(self.links.len());
        self.links.push(NocLink {
            source,
            sink,
            bandwidth,
            latency,
            bandwidth_usage: 0.0,
        });
        self.outgoing_links[source.index()].push(id);
        id
    }

    pub fn add_bidirectional_link(
        &mut self,
        a: NocRouterId,
        b: NocRouterId,
        bandwidth: f64,
        latency: f64,
    ) -> (NocLinkId, NocLinkId) {
        (
            self.add_link(a, b, bandwidth, latency),
            self.add_link(b, a, bandwidth, latency),
        )
    }

    #[inline]
    pub fn router(&self, id: NocRouterId) -> &NocRouter {
        &self.routers[id.index()]
    }

    #[inline]
    pub fn link(&self, id: NocLinkId) -> &NocLink {
        &self.links[id.index()]
    }

    #[inline]
    pub fn link_mut(&mut self, id: NocLinkId) -> &mut NocLink {
        &mut self.links[id.index()]
    }

    pub fn outgoing_links(&self, router: NocRouterId) -> &[NocLinkId] {
        &self.outgoing_links[router.index()]
    }

    pub fn router_at_location(&self, loc: GridCoord) -> Option<NocRouterId> {
        self.loc_to_router.get(&loc).copied()
    }

    pub fn router_by_user_id(&self, user_id: i32) -> Option<NocRouterId> {
        self.user_id_map.get(&user_id).copied()
    }

    pub fn find_link(&self, source: NocRouterId, sink: NocRouterId) -> Option<NocLinkId> {
        self.outgoing_links(source)
            .iter()
            .copied()
            .find(|&l| self.links[l.index()].sink == sink)
    }

    pub fn reset_link_usage(&mut self) {
        for link in &mut self.links {
            link.bandwidth_usage = 0.0;
        }
    }

    pub fn num_congested_links(&self) -> usize {
        self.links.iter().filter(|l| l.is_congested()).count()
    }
}

impl Default for NocStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_indexed_by_source_router() {
        let mut noc = NocStorage::new();
        let r0 = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let r1 = noc.add_router(1, GridCoord::new(4, 0, 0), 0.0).unwrap();
        let r2 = noc.add_router(2, GridCoord::new(8, 0, 0), 0.0).unwrap();

        let (l01, l10) = noc.add_bidirectional_link(r0, r1, 10.0, 1e-9);
        let l12 = noc.add_link(r1, r2, 10.0, 1e-9);

        assert_eq!(noc.outgoing_links(r0), &[l01]);
        assert_eq!(noc.outgoing_links(r1), &[l10, l12]);
        assert!(noc.outgoing_links(r2).is_empty());
        assert_eq!(noc.find_link(r1, r2), Some(l12));
        assert_eq!(noc.find_link(r2, r1), None);
        assert_eq!(noc.router_at_location(GridCoord::new(4, 0, 0)), Some(r1));
        assert_eq!(noc.router_by_user_id(2), Some(r2));
    }

    #[test]
    fn duplicate_router_location_is_rejected() {
        let mut noc = NocStorage::new();
        noc.add_router(0, GridCoord::new(1, 1, 0), 0.0).unwrap();
        let err = noc.add_router(1, GridCoord::new(1, 1, 0), 0.0).unwrap_err();
        assert_eq!(err, NocError::DuplicateRouterLocation(GridCoord::new(1, 1, 0)));
    }

    #[test]
    fn congestion_follows_usage_over_capacity() {
        let mut noc = NocStorage::new();
        let r0 = noc.add_router(0, GridCoord::new(0, 0, 0), 0.0).unwrap();
        let r1 = noc.add_router(1, GridCoord::new(1, 0, 0), 0.0).unwrap();
        let l = noc.add_link(r0, r1, 4.0, 1e-9);

        noc.link_mut(l).bandwidth_usage = 2.0;
        assert!(!noc.link(l).is_congested());
        assert_eq!(noc.link(l).utilization(), 0.5);

        noc.link_mut(l).bandwidth_usage = 6.0;
        assert!(noc.link(l).is_congested());
        assert_eq!(noc.num_congested_links(), 1);

        noc.reset_link_usage();
        assert_eq!(noc.link(l).bandwidth_usage, 0.0);
    }
}
