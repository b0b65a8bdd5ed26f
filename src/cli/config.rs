use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::session::{DEFAULT_HELPER_SCRIPT, DEFAULT_NODE_BINARY};
use crate::explorer::config::ExplorerConfig;

pub const DEFAULT_CONFIG_FILE: &str = "surface-explorer.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "surface-explorer",
    version,
    about = "Depth-first explorer that maps every input field of a UI and the clicks that reach it"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: surface-explorer.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore a live UI through the browser helper
    Explore {
        /// Navigate the initial view here before exploring
        #[arg(long)]
        url: Option<String>,

        /// Node.js binary used to run the helper
        #[arg(long)]
        node: Option<String>,

        /// Path of the browser helper script
        #[arg(long)]
        script: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Explore a synthetic UI described in a YAML fixture
    Fixture {
        /// Path to the fixture YAML file
        #[arg(long)]
        app: String,

        #[command(flatten)]
        run: RunArgs,
    },
}

/// Flags shared by every exploring subcommand. Unset flags fall back to the
/// config file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Maximum recursion depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Pause after each action, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Stop clicking past this depth when a state shows no new input
    #[arg(long)]
    pub secondary_cutoff: Option<usize>,

    /// Fill each discovered input with the probe value
    #[arg(long)]
    pub probe_inputs: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    pub format: OutputFormat,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write a JSONL audit trail of every state and action to this file
    #[arg(long)]
    pub trace: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One record per discovered input
    #[default]
    Jsonl,
    /// The full report, pretty-printed
    Json,
    /// Human-readable summary
    Console,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `surface-explorer.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub explore: ExplorerConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

/// How to start the browser helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_node")]
    pub node: String,

    #[serde(default = "default_script")]
    pub script: String,

    pub start_url: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            script: default_script(),
            start_url: None,
        }
    }
}

fn default_node() -> String { DEFAULT_NODE_BINARY.to_string() }
fn default_script() -> String { DEFAULT_HELPER_SCRIPT.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config file, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, serde_yaml::Error> {
    // An empty file deserializes as unit, not as an empty mapping
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(content)
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// CLI flags override the config file, which overrides defaults.
pub fn build_explorer_config(base: &ExplorerConfig, args: &RunArgs) -> ExplorerConfig {
    let mut config = base.clone();
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(settle_ms) = args.settle_ms {
        config.settle_delay_ms = settle_ms;
    }
    if let Some(cutoff) = args.secondary_cutoff {
        config.secondary_depth_no_input_cutoff = Some(cutoff);
    }
    if args.probe_inputs {
        config.probe_inputs = true;
    }
    config
}

/// Resolve the helper launch settings: CLI > config file > defaults.
pub fn build_driver_config(
    base: &DriverConfig,
    url: Option<&str>,
    node: Option<&str>,
    script: Option<&str>,
) -> DriverConfig {
    DriverConfig {
        node: node.map(str::to_string).unwrap_or_else(|| base.node.clone()),
        script: script.map(str::to_string).unwrap_or_else(|| base.script.clone()),
        start_url: url.map(str::to_string).or_else(|| base.start_url.clone()),
    }
}

/// Default log filter for a `-v` count; `RUST_LOG` still wins.
pub fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
