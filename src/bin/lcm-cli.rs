use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agent_discovery::config::DirectoryCoordinates;
use agent_discovery::directory::{DirectoryClient, HttpDirectory};
use agent_discovery::discovery::{DependencyChecker, EndpointResolver};
use agent_discovery::registration::RegistrationAction;
use agent_discovery::DiscoveryContext;

#[derive(Parser)]
#[command(name = "lcm-cli")]
#[command(about = "Talk to a lifecycle manager directly", long_about = None)]
struct Cli {
    /// Lifecycle manager host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Lifecycle manager port
    #[arg(short, long)]
    port: u16,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List responsive instances of a service type
    Find { service_type: String },
    /// Report which of the given service types are discoverable
    Check {
        #[arg(required = true)]
        service_types: Vec<String>,
    },
    /// POST a payload to /register
    Register(PayloadArgs),
    /// POST a payload to /unregister
    Unregister(PayloadArgs),
    /// POST a payload to /stopping
    Stopping(PayloadArgs),
}

#[derive(clap::Args)]
struct PayloadArgs {
    /// JSON file holding the registration payload
    #[arg(short, long, conflicts_with = "data")]
    file: Option<PathBuf>,

    /// Inline JSON registration payload
    #[arg(short, long)]
    data: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let coords = DirectoryCoordinates::new(cli.host, cli.port);
    let directory = Arc::new(HttpDirectory::new(Duration::from_secs(cli.timeout))?);

    match cli.command {
        Commands::Find { service_type } => {
            let records = directory.query(&coords, &service_type).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Check { service_types } => {
            let context = Arc::new(DiscoveryContext::new());
            context.set_discover_coordinates(coords);
            let checker = DependencyChecker::new(EndpointResolver::new(directory, context));
            let report = checker.check_all(&service_types).await;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "found": report.found,
                "missing": report.missing,
            }))?);
            if !report.is_satisfied() {
                std::process::exit(1);
            }
        }
        Commands::Register(args) => post(&*directory, &coords, RegistrationAction::Register, args).await?,
        Commands::Unregister(args) => post(&*directory, &coords, RegistrationAction::Unregister, args).await?,
        Commands::Stopping(args) => post(&*directory, &coords, RegistrationAction::Stopping, args).await?,
    }

    Ok(())
}

async fn post(
    directory: &dyn DirectoryClient,
    coords: &DirectoryCoordinates,
    action: RegistrationAction,
    args: PayloadArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload: Value = match (args.file, args.data) {
        (Some(path), _) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        (None, Some(data)) => serde_json::from_str(&data)?,
        (None, None) => Value::Object(Default::default()),
    };
    let result = directory.post_action(coords, action.path(), &payload).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
