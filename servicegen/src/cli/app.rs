use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "servicegen",
    version,
    about = "Servicegen - Scaffold, validate, and deploy service trees",
    long_about = "Servicegen materializes a deployable service tree (configuration, entry-point \
code, CI definitions, documentation) from a small set of inputs, validates the generated \
deployment configuration against the service's capability manifest, and recovers from \
deploy-time binding errors."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a service tree from a context file
    #[command(about = "Generate a full service tree from a context file")]
    Create(CreateArgs),

    /// Validate descriptor/manifest consistency
    #[command(about = "Validate the deployment descriptor against the capability manifest")]
    Validate(ValidateArgs),

    /// Deploy with binding-error recovery
    #[command(about = "Deploy a service through the binding-error recovery loop")]
    Deploy(DeployArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Context file (JSON, nested or flattened shape)
    pub context: PathBuf,

    /// Output directory; overrides the context's servicePath
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Templates directory overriding the embedded defaults
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Report intended writes without touching disk
    #[arg(long)]
    pub dry_run: bool,

    /// Leave existing files untouched
    #[arg(long)]
    pub no_overwrite: bool,

    /// Collect all generator failures instead of stopping at the first
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Service directory holding the descriptor and manifest
    #[arg(default_value = ".")]
    pub service_dir: PathBuf,

    /// Capability manifest path (default: <service_dir>/capabilities.json)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Deployment descriptor path (default: <service_dir>/wrangler.toml)
    #[arg(long)]
    pub descriptor: Option<PathBuf>,

    /// Rewrite the descriptor toward the manifest's declared state
    #[arg(long)]
    pub fix: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeployArgs {
    /// Service directory to deploy from
    #[arg(default_value = ".")]
    pub service_dir: PathBuf,

    /// Target environment passed to the deploy tool
    #[arg(short, long)]
    pub env: Option<String>,

    /// Restore descriptor backups if the deploy ultimately fails
    #[arg(long)]
    pub rollback_on_failure: bool,
}
