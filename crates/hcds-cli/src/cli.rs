use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "hcds",
    about = "Resolve, manage and lifecycle-test Cloud Healthcare datasets",
    version
)]
pub struct Cli {
    /// Provider config file (YAML). Environment variables override its values.
    #[arg(long, env = "HCDS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Default project, overriding config file and environment.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Use the in-memory driver instead of the Healthcare API.
    /// State does not outlive the process.
    #[arg(long, global = true)]
    pub local: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a dataset id into its short key and resource path.
    Resolve {
        /// `{project}/{location}/{name}` or `{location}/{name}`.
        id: String,
    },

    /// Print the HCL resource block for a dataset, or for every dataset in a manifest.
    Render {
        #[arg(long, required_unless_present = "manifest")]
        name: Option<String>,
        #[arg(long, required_unless_present = "manifest")]
        location: Option<String>,
        #[arg(long)]
        time_zone: Option<String>,
        /// Resource name in the generated block.
        #[arg(long, default_value = "dataset")]
        resource: String,
        /// Dataset manifest (YAML). Resource names are derived from dataset names.
        #[arg(long, conflicts_with_all = ["name", "location", "time_zone"])]
        manifest: Option<PathBuf>,
    },

    /// Create a dataset.
    Create {
        id: String,
        #[arg(long)]
        time_zone: Option<String>,
    },

    /// Show a dataset.
    Get { id: String },

    /// Change a dataset's time zone.
    Update {
        id: String,
        #[arg(long)]
        time_zone: String,
    },

    /// Delete a dataset.
    Delete { id: String },

    /// Run the create / import / update / import / destroy lifecycle on a new dataset.
    Lifecycle {
        /// Defaults to the configured region, else `us-central1`.
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value = "America/New_York")]
        time_zone: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
