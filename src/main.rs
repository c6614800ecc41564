//! rgw-provision: prepare and remove Ceph object-storage gateways
//!
//! Run before starting a gateway instance:
//! - `prepare --name rgw.<id>` creates its library directory and keyring
//! - `pools create` creates any missing gateway pools
//!
//! and after retiring one:
//! - `remove --name rgw.<id>` revokes its identity and deletes its directory

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use rgw_provision::binary::{ServiceBinary, GATEWAY_SERVICE};
use rgw_provision::runner::{build_runner, RunnerBackend};
use rgw_provision::{
    CephCli, Config, PoolReconciler, ProvisionState, ProvisioningController, Removal, Revocation,
};

#[derive(Parser)]
#[command(name = "rgw-provision")]
#[command(about = "Provision and remove Ceph object-storage gateway instances")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "rgw-provision.toml", env = "RGW_PROVISION_CONFIG")]
    config: PathBuf,

    /// Cluster name (overrides config file)
    #[arg(long, env = "RGW_PROVISION_CLUSTER")]
    cluster: Option<String>,

    /// Library root (overrides config file)
    #[arg(long, env = "RGW_PROVISION_LIB_ROOT")]
    lib_root: Option<PathBuf>,

    /// Command runner backend (overrides config file)
    #[arg(long, value_enum)]
    runner: Option<RunnerBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the gateway's library directory and keyring
    Prepare {
        /// Gateway name, must start with `rgw.`
        #[arg(short, long)]
        name: String,
    },

    /// Revoke the gateway identity and delete its library directory
    Remove {
        /// Gateway name, must start with `rgw.`
        #[arg(short, long)]
        name: String,
    },

    /// Show what is provisioned on disk for a gateway
    Status {
        /// Gateway name, must start with `rgw.`
        #[arg(short, long)]
        name: String,
    },

    /// Gateway pool operations
    #[command(subcommand)]
    Pools(PoolCommands),
}

#[derive(Debug, Subcommand)]
enum PoolCommands {
    /// List required pools missing from the cluster
    Missing,

    /// Create every missing required pool
    Create,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rgw_provision=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(cluster) = cli.cluster {
        config.cluster.name = cluster;
    }
    if let Some(lib_root) = cli.lib_root {
        config.paths.lib_root = lib_root;
    }
    if let Some(backend) = cli.runner {
        config.runner.backend = backend;
    }

    info!(
        cluster = %config.cluster.name,
        lib_root = %config.paths.lib_root.display(),
        backend = ?config.runner.backend,
        "rgw-provision starting"
    );

    let runner = build_runner(config.runner.backend, &config.runner.host_agent);

    let controller_for = |name: String| {
        ProvisioningController::new(name, config.cluster.name.clone(), runner.clone())
            .with_paths(config.keyring_paths())
            .with_binary(ServiceBinary::new(config.paths.service_bin.clone()))
    };

    let cluster_connection = || {
        CephCli::new(runner.clone(), config.cluster.name.clone())
            .with_credentials(config.cluster.admin_name.clone(), config.cluster.admin_keyring.clone())
    };

    match cli.command {
        Commands::Prepare { name } => {
            let controller = controller_for(name);
            controller.prepare()?;
            let lib = controller.library_paths()?;
            println!("{}", lib.keyring_path.display());
        }
        Commands::Remove { name } => {
            let controller = controller_for(name);
            match controller.remove()? {
                Removal::AlreadyAbsent => println!("{}: not provisioned", controller.name()),
                Removal::Removed { revocation } => match revocation {
                    Revocation::Revoked => println!("{}: removed", controller.name()),
                    Revocation::NotAttempted => {
                        println!("{}: removed (no keyring to revoke)", controller.name())
                    }
                    Revocation::Failed { error } => println!(
                        "{}: removed, registry entry may remain: {}",
                        controller.name(),
                        error
                    ),
                },
            }
        }
        Commands::Status { name } => {
            let controller = controller_for(name);
            let state = match controller.status()? {
                ProvisionState::Absent => "absent",
                ProvisionState::DirectoryOnly => "directory-only",
                ProvisionState::Provisioned => "provisioned",
            };
            let lib = controller.library_paths()?;
            println!("{}: {}", controller.name(), state);
            println!("  library: {}", lib.library_dir.display());
            println!("  service: {}@{}", GATEWAY_SERVICE, controller.name());
        }
        Commands::Pools(PoolCommands::Missing) => {
            let missing = PoolReconciler::new().missing_pools(cluster_connection())?;
            for pool in missing {
                println!("{}", pool);
            }
        }
        Commands::Pools(PoolCommands::Create) => {
            let report = PoolReconciler::new().reconcile(cluster_connection())?;
            for result in &report.results {
                match &result.error {
                    None => println!("created {}", result.pool_name),
                    Some(e) => println!("failed  {}: {}", result.pool_name, e),
                }
            }
            if !report.all_succeeded() {
                error!(failed = report.failed().count(), "Some pools could not be created");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
