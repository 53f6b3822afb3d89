use clap::{Parser, Subcommand};
use noc_common::db::indices::ClusterBlockId;
use noc_common::db::noc::NocStorage;
use noc_common::db::placement::BlockLocations;
use noc_common::error::NocError;
use noc_common::util::config::Config;
use noc_common::util::generator::{self, NocBenchmark};
use noc_common::util::logger;
use noc_common::util::profiler::ScopedTimer;
use noc_placer::costs::PlacerCosts;
use noc_placer::moves::BlocksToBeMoved;
use noc_placer::noc::{NocPlacementContext, traffic_flow_latency, update_noc_normalization_factors};
use noc_router::create_routing_algorithm;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route every traffic flow once and report costs and link usage.
    Route,
    /// Anneal router and logic block locations with incremental NoC costs.
    Place,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();
    let config = load_config(&args.config)?;

    let result = match args.command.unwrap_or(Commands::Place) {
        Commands::Route => run_routing(&config),
        Commands::Place => run_placement(&config),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            path
        );
        return Ok(Config::default());
    }
    log::info!("Loading configuration from {:?}", path);
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
    toml::from_str(&config_str).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
}

/// Generates the benchmark and routes it. The returned costs are loaded and
/// normalized.
fn setup(
    config: &Config,
) -> anyhow::Result<(NocPlacementContext, PlacerCosts, NocBenchmarkLayout)> {
    let NocBenchmark {
        noc,
        traffic_flows,
        block_locs,
        router_blocks,
        logic_blocks,
        grid_width,
        grid_height,
    } = generator::generate_benchmark(&config.topology, &config.traffic)?;

    let router = create_routing_algorithm(&config.noc.routing_algorithm)?;
    let mut ctx = NocPlacementContext::new(noc, traffic_flows, router, config.noc.clone());
    ctx.initial_noc_placement(&block_locs)?;

    let mut costs = PlacerCosts::default();
    ctx.initialize_noc_costs(&mut costs)?;
    update_noc_normalization_factors(&mut costs, &config.noc);

    Ok((
        ctx,
        costs,
        NocBenchmarkLayout {
            block_locs,
            router_blocks,
            logic_blocks,
            grid_width,
            grid_height,
        },
    ))
}

/// The placer-owned part of a generated benchmark.
struct NocBenchmarkLayout {
    block_locs: BlockLocations,
    router_blocks: Vec<ClusterBlockId>,
    logic_blocks: Vec<ClusterBlockId>,
    grid_width: u32,
    grid_height: u32,
}

fn run_routing(config: &Config) -> anyhow::Result<()> {
    let (ctx, costs, layout) = setup(config)?;
    ctx.check_noc_placement_costs(&costs, config.placement.error_tolerance, &layout.block_locs)?;

    log::info!(
        "NoC costs: aggregate bandwidth {:e} (norm {:e}), latency {:e} (norm {:e})",
        costs.noc_aggregate_bandwidth_cost,
        costs.noc_aggregate_bandwidth_cost_norm,
        costs.noc_latency_cost,
        costs.noc_latency_cost_norm
    );

    if let Some(path) = &config.placement.report_file {
        prepare_output_dir(path)?;
        log::info!("Writing NoC report to {}", path);
        save_report(&ctx, path)?;
    }

    report_link_usage(&ctx.free());
    Ok(())
}

fn run_placement(config: &Config) -> anyhow::Result<()> {
    let (mut ctx, mut costs, mut layout) = setup(config)?;
    let opts = &config.placement;
    ctx.check_noc_placement_costs(&costs, opts.error_tolerance, &layout.block_locs)?;

    let initial_cost = costs.cost;
    let mut rng = StdRng::seed_from_u64(config.traffic.seed);
    let mut temperature = opts.initial_temperature;
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    log::info!(
        "Starting NoC placement: {} moves, initial cost {:.4}",
        opts.moves,
        initial_cost
    );
    {
        let mut timer = ScopedTimer::new("NoC placement");

        for i in 0..opts.moves {
            let Some(moves) = propose_move(&mut rng, config, &layout, ctx.noc())? else {
                log::warn!("Nothing to move. Stopping placement.");
                break;
            };

            moves.apply(&mut layout.block_locs);
            let delta = ctx.find_affected_noc_routers_and_update_noc_costs(&moves, &layout.block_locs)?;
            let delta_cost = costs.noc_delta_cost(&delta, &config.noc);

            let accept = delta_cost <= 0.0
                || rng.gen_range(0.0..1.0) < (-delta_cost / temperature).exp();
            if accept {
                ctx.commit_noc_costs(&delta, &mut costs);
                costs.cost = costs.total_cost(&config.noc);
                accepted += 1;
            } else {
                moves.revert(&mut layout.block_locs);
                ctx.revert_noc_traffic_flow_routes(&moves, &layout.block_locs)?;
                rejected += 1;
            }

            if opts.moves_per_temperature > 0 && (i + 1) % opts.moves_per_temperature == 0 {
                temperature *= opts.cooling_rate;
                update_noc_normalization_factors(&mut costs, &config.noc);
                log::debug!(
                    "Move {}: T = {:.3e}, cost = {:.4}",
                    i + 1,
                    temperature,
                    costs.cost
                );
            }

            if opts.audit_interval > 0 && (i + 1) % opts.audit_interval == 0 {
                ctx.check_noc_placement_costs(&costs, opts.error_tolerance, &layout.block_locs)?;
            }
        }
        timer.record_work(accepted + rejected, "moves");
    }

    ctx.check_noc_placement_costs(&costs, opts.error_tolerance, &layout.block_locs)?;
    log::info!(
        "NoC placement done: {} accepted, {} rejected, cost {:.4} -> {:.4}",
        accepted,
        rejected,
        initial_cost,
        costs.cost
    );
    log::info!(
        "NoC costs: aggregate bandwidth {:e}, latency {:e}",
        costs.noc_aggregate_bandwidth_cost,
        costs.noc_latency_cost
    );

    if let Some(path) = &opts.report_file {
        prepare_output_dir(path)?;
        log::info!("Writing NoC report to {}", path);
        save_report(&ctx, path)?;
    }

    report_link_usage(&ctx.free());
    Ok(())
}

/// Swaps two router blocks with probability `router_move_fraction`,
/// otherwise moves a logic block to a random non-router tile.
fn propose_move(
    rng: &mut StdRng,
    config: &Config,
    layout: &NocBenchmarkLayout,
    noc: &NocStorage,
) -> Result<Option<BlocksToBeMoved>, NocError> {
    let routers = &layout.router_blocks;
    let logic = &layout.logic_blocks;
    let can_swap_routers = routers.len() >= 2;

    if can_swap_routers
        && (logic.is_empty()
            || rng.gen_bool(config.placement.router_move_fraction.clamp(0.0, 1.0)))
    {
        let a = rng.gen_range(0..routers.len());
        let b = (a + rng.gen_range(1..routers.len())) % routers.len();
        return BlocksToBeMoved::swap(routers[a], routers[b], &layout.block_locs).map(Some);
    }

    let Some(&blk) = logic.choose(rng) else {
        return Ok(None);
    };
    let Some(to) = generator::random_logic_tile(rng, noc, layout.grid_width, layout.grid_height)
    else {
        return Ok(None);
    };
    BlocksToBeMoved::relocate(blk, to, &layout.block_locs).map(Some)
}

fn report_link_usage(noc: &NocStorage) {
    let max_utilization = noc
        .links
        .iter()
        .map(|l| l.utilization())
        .fold(0.0, f64::max);
    log::info!(
        "Link usage: peak utilization {:.1}%, {} of {} links congested",
        max_utilization * 100.0,
        noc.num_congested_links(),
        noc.num_links()
    );
    for (i, link) in noc.links.iter().enumerate() {
        if link.is_congested() {
            log::warn!(
                "Link {} ({} -> {}) is congested: {:e} of {:e}",
                i,
                noc.router(link.source).loc,
                noc.router(link.sink).loc,
                link.bandwidth_usage,
                link.bandwidth
            );
        }
    }
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn save_report(ctx: &NocPlacementContext, filename: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut file = std::io::BufWriter::new(std::fs::File::create(filename)?);
    let noc = ctx.noc();
    let flows = ctx.traffic_flows();

    writeln!(file, "ROUTING {} ;", ctx.routing_algorithm())?;

    writeln!(file, "FLOWS {} ;", flows.num_flows())?;
    for flow_id in flows.flow_ids() {
        let flow = flows.flow(flow_id);
        let route = ctx.routes().route(flow_id);
        let latency = traffic_flow_latency(route, noc);
        write!(
            file,
            "- {} {} {} BW {:e} PRIORITY {} HOPS {} LATENCY {:e}",
            flow.name,
            flow.source_router_block,
            flow.sink_router_block,
            flow.bandwidth,
            flow.priority,
            route.len(),
            latency
        )?;
        if flow.is_latency_constrained() {
            write!(file, " MAX_LATENCY {:e}", flow.max_latency)?;
        }
        writeln!(file, " ;")?;
        for &link in route {
            let l = noc.link(link);
            writeln!(
                file,
                "  + LINK {} ( {} ) ( {} )",
                link,
                noc.router(l.source).loc,
                noc.router(l.sink).loc
            )?;
        }
    }
    writeln!(file, "END FLOWS")?;

    writeln!(file, "LINKS {} ;", noc.num_links())?;
    for (i, link) in noc.links.iter().enumerate() {
        writeln!(
            file,
            "- {} ( {} ) ( {} ) USAGE {:e} CAPACITY {:e} ;",
            i,
            noc.router(link.source).loc,
            noc.router(link.sink).loc,
            link.bandwidth_usage,
            link.bandwidth
        )?;
    }
    writeln!(file, "END LINKS")?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use noc_common::util::config::PlacementMode;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [noc]
            routing_algorithm = "xy_routing"
            mode = "noc_only"

            [topology]
            mesh_width = 3

            [placement]
            moves = 200
            report_file = "output/noc.rpt"
            "#,
        )
        .unwrap();

        assert_eq!(config.noc.routing_algorithm, "xy_routing");
        assert_eq!(config.noc.mode, PlacementMode::NocOnly);
        assert_eq!(config.noc.latency_weighting, 0.02);
        assert_eq!(config.topology.mesh_width, 3);
        assert_eq!(config.topology.mesh_height, 4);
        assert_eq!(config.traffic.num_flows, 24);
        assert_eq!(config.placement.moves, 200);
        assert_eq!(config.placement.report_file.as_deref(), Some("output/noc.rpt"));
    }

    #[test]
    fn small_placement_run_passes_its_audits() {
        let mut config = Config::default();
        config.topology.mesh_width = 3;
        config.topology.mesh_height = 3;
        config.traffic.num_flows = 8;
        config.traffic.num_logic_blocks = 4;
        config.placement.moves = 300;
        config.placement.audit_interval = 50;
        assert!(run_placement(&config).is_ok());
    }
}
