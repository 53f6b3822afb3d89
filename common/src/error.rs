use crate::db::indices::{ClusterBlockId, NocLinkId, NocRouterId, TrafficFlowId};
use crate::geom::coord::GridCoord;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NocError {
    #[error("{algorithm}: no route from router {src} to router {sink}: {reason}")]
    RoutingFailed {
        algorithm: &'static str,
        src: NocRouterId,
        sink: NocRouterId,
        reason: String,
    },

    #[error("cluster block {0} has not been placed")]
    UnplacedBlock(ClusterBlockId),

    #[error("router block {block} is placed at {loc}, which holds no NoC router")]
    NoRouterAtLocation { block: ClusterBlockId, loc: GridCoord },

    #[error("unknown NoC routing algorithm '{0}'")]
    UnknownRoutingAlgorithm(String),

    #[error("a NoC router already exists at {0}")]
    DuplicateRouterLocation(GridCoord),

    #[error(
        "NoC {term} cost drifted: tracked {tracked:e}, recomputed {recomputed:e} (tolerance {tolerance})"
    )]
    CostDrift {
        term: &'static str,
        tracked: f64,
        recomputed: f64,
        tolerance: f64,
    },

    #[error("link {link} bandwidth usage is {tracked:e} but its routed flows demand {expected:e}")]
    LinkUsageMismatch {
        link: NocLinkId,
        tracked: f64,
        expected: f64,
    },

    #[error("traffic flow {flow} has an invalid route: {reason}")]
    InvalidRoute { flow: TrafficFlowId, reason: String },

    #[error("NoC traffic flows have not been routed yet; call initial_noc_placement first")]
    NotInitialized,

    #[error("NoC traffic flows were already routed by initial_noc_placement")]
    AlreadyInitialized,
}
