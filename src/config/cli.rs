use crate::domain::model::CutMethod;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "turf-engine")]
#[command(about = "Cut geocoded voter lists into canvassing turfs and walk routes")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "turf-config.toml")]
    pub config: String,

    /// Voter CSV, overriding source.voters_csv from the config
    #[arg(long)]
    pub voters: Option<String>,

    /// Directory for JSON results, overriding output.path
    #[arg(long)]
    pub output: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Auto-cut a list into turfs by geography or precinct
    Cut {
        #[arg(long)]
        list: String,

        #[arg(long)]
        doors_per_turf: Option<usize>,

        #[arg(long, value_enum)]
        method: Option<CutMethod>,

        /// Also compute a walk route for every created turf
        #[arg(long)]
        routes: bool,
    },
    /// Create one turf from a GeoJSON polygon file
    Draw {
        #[arg(long)]
        list: String,

        #[arg(long)]
        polygon: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        route: bool,
    },
}

impl CliConfig {
    pub fn list_id(&self) -> &str {
        match &self.command {
            Command::Cut { list, .. } | Command::Draw { list, .. } => list,
        }
    }
}
