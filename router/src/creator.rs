use crate::NocRouting;
use crate::algo::bfs::BfsRouting;
use crate::algo::min_latency::MinLatencyRouting;
use crate::algo::xy::XyRouting;
use noc_common::error::NocError;

pub const ROUTING_ALGORITHMS: [&str; 3] = ["bfs_routing", "xy_routing", "min_latency_routing"];

/// Instantiates the routing algorithm selected by name for the whole
/// placement run.
pub fn create_routing_algorithm(name: &str) -> Result<Box<dyn NocRouting>, NocError> {
    let router: Box<dyn NocRouting> = match name {
        "bfs_routing" => Box::new(BfsRouting),
        "xy_routing" => Box::new(XyRouting),
        "min_latency_routing" => Box::new(MinLatencyRouting),
        _ => return Err(NocError::UnknownRoutingAlgorithm(name.to_string())),
    };
    log::info!("Using NoC routing algorithm '{}'", router.name());
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_algorithm_can_be_created() {
        for name in ROUTING_ALGORITHMS {
            let router = create_routing_algorithm(name).unwrap();
            assert_eq!(router.name(), name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = create_routing_algorithm("west_first").err().unwrap();
        assert_eq!(err, NocError::UnknownRoutingAlgorithm("west_first".into()));
    }
}
