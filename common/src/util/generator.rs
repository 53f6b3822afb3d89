use crate::db::indices::{ClusterBlockId, NocRouterId};
use crate::db::noc::NocStorage;
use crate::db::placement::BlockLocations;
use crate::db::traffic::NocTrafficFlows;
use crate::error::NocError;
use crate::geom::coord::GridCoord;
use crate::util::config::{TopologyConfig, TrafficConfig};
use rand::prelude::*;
use rand::rngs::StdRng;

pub struct NocBenchmark {
    pub noc: NocStorage,
    pub traffic_flows: NocTrafficFlows,
    pub block_locs: BlockLocations,
    pub router_blocks: Vec<ClusterBlockId>,
    pub logic_blocks: Vec<ClusterBlockId>,
    /// Extent of the placement grid in tiles.
    pub grid_width: u32,
    pub grid_height: u32,
}

/// Builds a 2D mesh: one router every `router_spacing` tiles, with a pair of
/// opposing links between horizontal and vertical neighbours.
pub fn build_mesh_topology(config: &TopologyConfig) -> Result<NocStorage, NocError> {
    let mut noc = NocStorage::new();
    let w = config.mesh_width;
    let h = config.mesh_height;
    let spacing = config.router_spacing.max(1);

    for y in 0..h {
        for x in 0..w {
            let user_id = (y * w + x) as i32;
            noc.add_router(
                user_id,
                GridCoord::new(x * spacing, y * spacing, 0),
                config.router_latency,
            )?;
        }
    }

    for y in 0..h {
        for x in 0..w {
            let here = router_id(&noc, x, y, w);
            if x + 1 < w {
                let right = router_id(&noc, x + 1, y, w);
                noc.add_bidirectional_link(here, right, config.link_bandwidth, config.link_latency);
            }
            if y + 1 < h {
                let up = router_id(&noc, x, y + 1, w);
                noc.add_bidirectional_link(here, up, config.link_bandwidth, config.link_latency);
            }
        }
    }

    log::info!(
        "Built {}x{} mesh NoC: {} routers, {} links",
        w,
        h,
        noc.num_routers(),
        noc.num_links()
    );
    Ok(noc)
}

fn router_id(noc: &NocStorage, x: u32, y: u32, w: u32) -> NocRouterId {
    let id = NocRouterId::new((y * w + x) as usize);
    debug_assert_eq!(noc.router(id).user_id, (y * w + x) as i32);
    id
}

/// Generates a mesh NoC, one logical router block per hard router, a set of
/// logic blocks on non-router tiles and seeded random traffic flows between
/// router blocks.
pub fn generate_benchmark(
    topology: &TopologyConfig,
    traffic: &TrafficConfig,
) -> Result<NocBenchmark, NocError> {
    let noc = build_mesh_topology(topology)?;
    let mut rng = StdRng::seed_from_u64(traffic.seed);

    let spacing = topology.router_spacing.max(1);
    let grid_width = (topology.mesh_width.max(1) - 1) * spacing + 1;
    let grid_height = (topology.mesh_height.max(1) - 1) * spacing + 1;

    let num_routers = noc.num_routers();
    let free_tiles = logic_tile_count(&noc, grid_width, grid_height);
    let num_logic = if free_tiles > 0 {
        traffic.num_logic_blocks
    } else {
        if traffic.num_logic_blocks > 0 {
            log::warn!(
                "{}x{} grid has no tiles free of routers. Skipping logic blocks.",
                grid_width,
                grid_height
            );
        }
        0
    };

    let mut block_locs = BlockLocations::new(num_routers + num_logic);
    let mut traffic_flows = NocTrafficFlows::new();

    let router_blocks: Vec<ClusterBlockId> = ClusterBlockId::range(num_routers).collect();
    for (i, &block) in router_blocks.iter().enumerate() {
        block_locs.set(block, noc.routers[i].loc);
        traffic_flows.register_router_block(block);
    }

    let mut logic_blocks = Vec::with_capacity(num_logic);
    for i in 0..num_logic {
        let Some(loc) = random_logic_tile(&mut rng, &noc, grid_width, grid_height) else {
            break;
        };
        let block = ClusterBlockId::new(num_routers + i);
        block_locs.set(block, loc);
        logic_blocks.push(block);
    }

    if num_routers >= 2 {
        let priorities = [1.0, 1.0, 2.0, 4.0];
        for i in 0..traffic.num_flows {
            let src = router_blocks[rng.gen_range(0..router_blocks.len())];
            let mut sink = src;
            while sink == src {
                sink = router_blocks[rng.gen_range(0..router_blocks.len())];
            }
            let bandwidth = if traffic.max_bandwidth > traffic.min_bandwidth {
                rng.gen_range(traffic.min_bandwidth..traffic.max_bandwidth)
            } else {
                traffic.min_bandwidth
            };
            let max_latency = if rng.gen_bool(traffic.constrained_fraction.clamp(0.0, 1.0)) {
                traffic.max_latency
            } else {
                f64::INFINITY
            };
            let priority = priorities[rng.gen_range(0..priorities.len())];
            traffic_flows.add_traffic_flow(
                format!("flow{}", i),
                src,
                sink,
                bandwidth,
                max_latency,
                priority,
            );
        }
    } else if traffic.num_flows > 0 {
        log::warn!("Mesh has fewer than two routers. No traffic flows generated.");
    }

    log::info!(
        "Generated NoC benchmark: {} router blocks, {} logic blocks, {} traffic flows",
        router_blocks.len(),
        logic_blocks.len(),
        traffic_flows.num_flows()
    );

    Ok(NocBenchmark {
        noc,
        traffic_flows,
        block_locs,
        router_blocks,
        logic_blocks,
        grid_width,
        grid_height,
    })
}

/// Number of tiles on the `grid_width` x `grid_height` grid without a router.
pub fn logic_tile_count(noc: &NocStorage, grid_width: u32, grid_height: u32) -> usize {
    let on_grid = noc
        .routers
        .iter()
        .filter(|r| r.loc.x < grid_width && r.loc.y < grid_height && r.loc.z == 0)
        .count();
    (grid_width as usize * grid_height as usize).saturating_sub(on_grid)
}

/// Picks a tile that holds no hard router, or `None` when every tile does.
pub fn random_logic_tile<R: Rng>(
    rng: &mut R,
    noc: &NocStorage,
    grid_width: u32,
    grid_height: u32,
) -> Option<GridCoord> {
    if logic_tile_count(noc, grid_width, grid_height) == 0 {
        return None;
    }
    loop {
        let loc = GridCoord::new(
            rng.gen_range(0..grid_width.max(1)),
            rng.gen_range(0..grid_height.max(1)),
            0,
        );
        if noc.router_at_location(loc).is_none() {
            return Some(loc);
        }
    }
}
