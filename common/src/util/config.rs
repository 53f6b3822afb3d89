use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub noc: NocConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
}

/// How the NoC cost terms are blended into the placer's total cost.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Only the normalized NoC terms contribute to the placement cost.
    NocOnly,
    /// NoC terms are weighted and added to the wirelength and timing terms.
    #[default]
    Combined,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NocConfig {
    #[serde(default = "default_routing_algorithm")]
    pub routing_algorithm: String,
    #[serde(default = "default_placement_weighting")]
    pub placement_weighting: f64,
    #[serde(default = "default_latency_weighting")]
    pub latency_weighting: f64,
    #[serde(default = "default_latency_constraints_weighting")]
    pub latency_constraints_weighting: f64,
    #[serde(default)]
    pub mode: PlacementMode,
}

impl Default for NocConfig {
    fn default() -> Self {
        Self {
            routing_algorithm: default_routing_algorithm(),
            placement_weighting: default_placement_weighting(),
            latency_weighting: default_latency_weighting(),
            latency_constraints_weighting: default_latency_constraints_weighting(),
            mode: PlacementMode::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TopologyConfig {
    #[serde(default = "default_mesh_dimension")]
    pub mesh_width: u32,
    #[serde(default = "default_mesh_dimension")]
    pub mesh_height: u32,
    #[serde(default = "default_router_spacing")]
    pub router_spacing: u32,
    #[serde(default = "default_link_bandwidth")]
    pub link_bandwidth: f64,
    #[serde(default = "default_link_latency")]
    pub link_latency: f64,
    #[serde(default = "default_router_latency")]
    pub router_latency: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            mesh_width: default_mesh_dimension(),
            mesh_height: default_mesh_dimension(),
            router_spacing: default_router_spacing(),
            link_bandwidth: default_link_bandwidth(),
            link_latency: default_link_latency(),
            router_latency: default_router_latency(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrafficConfig {
    #[serde(default = "default_num_flows")]
    pub num_flows: usize,
    #[serde(default = "default_min_flow_bandwidth")]
    pub min_bandwidth: f64,
    #[serde(default = "default_max_flow_bandwidth")]
    pub max_bandwidth: f64,
    #[serde(default = "default_constrained_fraction")]
    pub constrained_fraction: f64,
    #[serde(default = "default_max_latency")]
    pub max_latency: f64,
    #[serde(default = "default_num_logic_blocks")]
    pub num_logic_blocks: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            num_flows: default_num_flows(),
            min_bandwidth: default_min_flow_bandwidth(),
            max_bandwidth: default_max_flow_bandwidth(),
            constrained_fraction: default_constrained_fraction(),
            max_latency: default_max_latency(),
            num_logic_blocks: default_num_logic_blocks(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlacementConfig {
    #[serde(default = "default_moves")]
    pub moves: usize,
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    #[serde(default = "default_moves_per_temperature")]
    pub moves_per_temperature: usize,
    #[serde(default = "default_router_move_fraction")]
    pub router_move_fraction: f64,
    #[serde(default = "default_audit_interval")]
    pub audit_interval: usize,
    #[serde(default = "default_error_tolerance")]
    pub error_tolerance: f64,
    #[serde(default)]
    pub report_file: Option<String>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            moves: default_moves(),
            initial_temperature: default_initial_temperature(),
            cooling_rate: default_cooling_rate(),
            moves_per_temperature: default_moves_per_temperature(),
            router_move_fraction: default_router_move_fraction(),
            audit_interval: default_audit_interval(),
            error_tolerance: default_error_tolerance(),
            report_file: None,
        }
    }
}

fn default_routing_algorithm() -> String {
    "bfs_routing".to_string()
}

fn default_placement_weighting() -> f64 {
    0.6
}

fn default_latency_weighting() -> f64 {
    0.02
}

fn default_latency_constraints_weighting() -> f64 {
    0.6
}

fn default_mesh_dimension() -> u32 {
    4
}

fn default_router_spacing() -> u32 {
    4
}

fn default_link_bandwidth() -> f64 {
    1.0e9
}

fn default_link_latency() -> f64 {
    1.0e-9
}

fn default_router_latency() -> f64 {
    1.0e-9
}

fn default_num_flows() -> usize {
    24
}

fn default_min_flow_bandwidth() -> f64 {
    1.0e6
}

fn default_max_flow_bandwidth() -> f64 {
    2.0e8
}

fn default_constrained_fraction() -> f64 {
    0.25
}

fn default_max_latency() -> f64 {
    6.0e-9
}

fn default_num_logic_blocks() -> usize {
    32
}

fn default_seed() -> u64 {
    1
}

fn default_moves() -> usize {
    5000
}

fn default_initial_temperature() -> f64 {
    0.05
}

fn default_cooling_rate() -> f64 {
    0.95
}

fn default_moves_per_temperature() -> usize {
    100
}

fn default_router_move_fraction() -> f64 {
    0.8
}

fn default_audit_interval() -> usize {
    500
}

fn default_error_tolerance() -> f64 {
    0.01
}
