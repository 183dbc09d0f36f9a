//! Definitions of CLI arguments and commands for deploy scripts

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy, print_manifest},
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_RPC_URL},
    errors::ScriptError,
};

/// Deploy the prize pool contracts
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Path to the deployments file, keyed by chain id
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The available commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy every contract missing from the deployments file
    Deploy(DeployArgs),
    /// Print the recorded deployments of a network
    Manifest(ManifestArgs),
}

impl Command {
    /// Run the command
    pub async fn run(
        self,
        priv_key: Option<&str>,
        rpc_url: &str,
        deployments_path: &Path,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, priv_key, rpc_url, deployments_path).await,
            Command::Manifest(args) => print_manifest(args, deployments_path),
        }
    }
}

/// Deploy the prize pool contracts, reusing everything already recorded
#[derive(Args)]
pub struct DeployArgs {
    /// Directory holding the compiled contract artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Address administering the deployed contracts, defaults to the deployer
    #[arg(long)]
    pub admin: Option<Address>,

    /// Address of an existing RNG service
    #[arg(long)]
    pub rng: Option<Address>,

    /// Address of an existing comptroller
    #[arg(long)]
    pub comptroller: Option<Address>,

    /// Address of an existing reserve registry, reused instead of deploying one
    #[arg(long)]
    pub reserve_registry: Option<Address>,

    /// Deploy production artifacts even on test networks
    #[arg(long, env = "DISABLE_HARNESS")]
    pub disable_harness: bool,

    /// File holding the pre-signed ERC-1820 registry deployment, in hex
    #[arg(long)]
    pub erc1820_tx: Option<PathBuf>,

    /// Where to write the manifest of the run
    #[arg(short, long)]
    pub manifest_out: Option<PathBuf>,

    /// Simulate the run without sending any transaction
    #[arg(long)]
    pub dry_run: bool,

    /// Chain id of the network. Checked against the node, or simulated in a dry run
    #[arg(long)]
    pub chain_id: Option<u64>,

    /// Deployer address for a dry run without a private key
    #[arg(long)]
    pub deployer: Option<Address>,

    /// Deployer nonce a dry run starts from, instead of the one inferred from
    /// the recorded deployments
    #[arg(long, requires = "dry_run")]
    pub nonce: Option<u64>,
}

/// Print the recorded deployments of a network as a manifest
#[derive(Args)]
pub struct ManifestArgs {
    /// Chain id of the network
    #[arg(short, long)]
    pub chain_id: u64,

    /// Write the manifest to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}
