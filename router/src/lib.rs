pub mod algo;
pub mod creator;

pub use algo::bfs::BfsRouting;
pub use algo::min_latency::MinLatencyRouting;
pub use algo::xy::XyRouting;
pub use creator::{ROUTING_ALGORITHMS, create_routing_algorithm};

use noc_common::db::indices::{NocLinkId, NocRouterId};
use noc_common::db::noc::NocStorage;
use noc_common::error::NocError;

/// Packet routing algorithm used to route traffic flows through the NoC.
///
/// Implementations must be deterministic: routing the same pair of routers
/// over the same topology always yields the same route. Reverting a rejected
/// placement move relies on this to regenerate the previous routes.
pub trait NocRouting: Sync + Send {
    fn name(&self) -> &'static str;

    /// Returns the ordered links leading from `src` to `sink`. An empty route
    /// is returned when both endpoints are the same router.
    fn route_flow(
        &self,
        src: NocRouterId,
        sink: NocRouterId,
        noc: &NocStorage,
    ) -> Result<Vec<NocLinkId>, NocError>;
}
