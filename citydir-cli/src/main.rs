/*!
citydir - HTTP server and command-line tools for the city directory.

`citydir serve` loads the snapshot, serves the `/cities` API and saves the
snapshot again on shutdown. The other subcommands inspect a snapshot offline.
*/

mod commands;
mod http;
mod serve;

use citydir_core::config::{DEFAULT_LISTEN_ADDR, DEFAULT_SNAPSHOT_PATH, DEFAULT_TIMEOUT_SECS};
use citydir_core::observability::init_observability;
use citydir_core::{CityId, CityQuery, DirectoryConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "citydir")]
#[command(about = "City directory server and snapshot tools")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CITYDIR_LOG_JSON")]
    json_logs: bool,

    /// Snapshot file loaded on start and saved on stop
    #[arg(short, long, global = true, env = "CITYDIR_SNAPSHOT", default_value = DEFAULT_SNAPSHOT_PATH)]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "CITYDIR_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
        listen: String,

        /// Per-request timeout in seconds
        #[arg(long, env = "CITYDIR_REQUEST_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
        request_timeout: u64,

        /// Seconds to wait for in-flight requests after a stop signal
        #[arg(long, env = "CITYDIR_SHUTDOWN_GRACE", default_value_t = DEFAULT_TIMEOUT_SECS)]
        shutdown_grace: u64,
    },
    /// List cities in the snapshot
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show a single city
    Show {
        /// City id
        id: CityId,
    },
    /// Check that the snapshot can be loaded
    Verify,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Exact region name
    #[arg(long)]
    region: Option<String>,

    /// Exact district name
    #[arg(long)]
    district: Option<String>,

    /// Population range, e.g. 1000-50000
    #[arg(long)]
    population: Option<String>,

    /// Foundation year range, e.g. 1500-1700
    #[arg(long)]
    foundation: Option<String>,
}

impl From<FilterArgs> for CityQuery {
    fn from(args: FilterArgs) -> Self {
        CityQuery {
            region: args.region,
            district: args.district,
            population: args.population,
            foundation: args.foundation,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_observability(cli.json_logs, cli.verbose)?;

    let mut config = DirectoryConfig::with_snapshot_path(cli.snapshot);

    match cli.command {
        Commands::Serve {
            listen,
            request_timeout,
            shutdown_grace,
        } => {
            config.listen_addr = listen;
            config.request_timeout_secs = request_timeout;
            config.shutdown_grace_secs = shutdown_grace;
            config.validate()?;
            serve::run(config).await?
        }
        Commands::List { filters } => commands::list_cities(&config, &filters.into())?,
        Commands::Show { id } => commands::show_city(&config, id)?,
        Commands::Verify => commands::verify_snapshot(&config)?,
    }

    Ok(())
}
