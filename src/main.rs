//! connection-registry: record destinations for the container engine service
//!
//! ## Usage
//!
//! ```bash
//! connection-registry connection add laptop server.fubar.com
//! connection-registry connection add --identity ~/.ssh/dev_rsa testing ssh://root@server.fubar.com:2222
//! connection-registry connection add --identity ~/.ssh/dev_rsa --port 22 production root@server.fubar.com
//! connection-registry connection add debug tcp://localhost:8080
//! connection-registry context create remote --docker host=tcp://myserver:2376
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use connection_registry::{
    add_connection, create_context, default_registry_path, AddContext, OfflineSshSetup, OsProbe,
    ResolveOptions, TomlStore,
};

#[derive(Parser, Debug)]
#[command(name = "connection-registry")]
#[command(about = "Record destinations for the container engine service")]
struct Cli {
    /// Path to the connection registry file
    #[arg(long, env = "CONTAINERS_CONNECTIONS_CONF")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage remote connections
    #[command(subcommand)]
    Connection(ConnectionCommands),

    /// Docker-compatible context commands
    #[command(subcommand)]
    Context(ContextCommands),
}

#[derive(Debug, Subcommand)]
enum ConnectionCommands {
    /// Record destination for the service
    ///
    /// DESTINATION is one of:
    ///   [user@]hostname (will default to ssh)
    ///   ssh://[user@]hostname[:port][/path]
    ///   tcp://hostname:port (not secured)
    ///   unix://path (absolute path required)
    Add(AddArgs),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// SSH port number for destination
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to SSH identity file
    #[arg(long)]
    identity: Option<String>,

    /// Path to the service socket on the remote host
    /// (default '/run/podman/podman.sock' or '/run/user/{uid}/podman/podman.sock')
    #[arg(long)]
    socket_path: Option<String>,

    /// Set connection to be default
    #[arg(short, long)]
    default: bool,

    /// Connection name
    name: String,

    /// Destination of the service
    destination: String,
}

#[derive(Debug, Subcommand)]
enum ContextCommands {
    /// Record destination for the service
    Create(CreateArgs),
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Endpoint, e.g. host=tcp://myserver:2376
    #[arg(long, default_value = "")]
    docker: String,

    /// Ignored. Just for script compatibility
    #[arg(long)]
    #[allow(dead_code)]
    description: Option<String>,

    /// Ignored. Just for script compatibility
    #[arg(long)]
    #[allow(dead_code)]
    from: Option<String>,

    /// Ignored. Just for script compatibility
    #[arg(long)]
    #[allow(dead_code)]
    kubernetes: Option<String>,

    /// Ignored. Just for script compatibility
    #[arg(long)]
    #[allow(dead_code)]
    default_stack_orchestrator: Option<String>,

    /// Context name
    name: String,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("connection_registry=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_registry_path);
    debug!(path = %config_path.display(), "Using connection registry");
    let store = TomlStore::new(config_path);

    match cli.command {
        Commands::Connection(ConnectionCommands::Add(args)) => {
            let options = ResolveOptions {
                port: args.port,
                identity: args.identity,
                socket_path: args.socket_path,
                make_default: args.default,
            };
            let ssh = OfflineSshSetup::from_env();
            let ctx = AddContext {
                probe: &OsProbe,
                ssh: &ssh,
                store: &store,
            };
            add_connection(&args.name, &args.destination, &options, &ctx)?;
        }
        Commands::Context(ContextCommands::Create(args)) => {
            create_context(&args.name, &args.docker, &store)?;
        }
    }

    Ok(())
}
