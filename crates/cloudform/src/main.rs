use clap::{Parser, Subcommand};
use cloudform::commands::{self, Context};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudform")]
#[command(about = "Declarative Linode infrastructure from KDL manifests", long_about = None)]
struct Cli {
    /// Manifest to use instead of discovery
    #[arg(short, long, global = true, env = "CLOUDFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes needed to match the manifest
    Plan,
    /// Create, update, replace and delete resources to match the manifest
    Apply,
    /// Update state from the remote API
    Refresh,
    /// Delete every resource in state
    Destroy,
    /// Adopt an existing remote object
    Import {
        /// Resource type (e.g., linode_domain)
        resource_type: String,
        /// Local name for the resource
        name: String,
        /// Remote identity (e.g., 1234 or 1234:56)
        id: String,
    },
    /// Show a remote object without managing it
    Lookup {
        /// Resource type (e.g., linode_user)
        resource_type: String,
        /// Remote identity (e.g., a username or an address)
        id: String,
    },
    /// Inspect or edit the state file
    #[command(subcommand)]
    State(StateCommands),
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum StateCommands {
    /// List managed resources
    List,
    /// Show the recorded attributes of a resource
    Show {
        /// Resource key (<type>.<name>)
        key: String,
    },
    /// Forget a resource without deleting it remotely
    Rm {
        /// Resource key (<type>.<name>)
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::new(cli.config)?;

    let ok = match cli.command {
        Commands::Plan => commands::plan::handle(&ctx).await?,
        Commands::Apply => commands::apply::handle(&ctx).await?,
        Commands::Refresh => commands::refresh::handle(&ctx).await?,
        Commands::Destroy => commands::destroy::handle(&ctx).await?,
        Commands::Import {
            resource_type,
            name,
            id,
        } => commands::import::handle(&ctx, &resource_type, &name, &id).await?,
        Commands::Lookup { resource_type, id } => {
            commands::lookup::handle(&ctx, &resource_type, &id).await?
        }
        Commands::State(StateCommands::List) => commands::state::list(&ctx).await?,
        Commands::State(StateCommands::Show { key }) => commands::state::show(&ctx, &key).await?,
        Commands::State(StateCommands::Rm { key }) => commands::state::rm(&ctx, &key).await?,
        Commands::Version => {
            println!("cloudform {}", env!("CARGO_PKG_VERSION"));
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
