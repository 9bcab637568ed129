use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Where the devbox snapshotter keeps its metadata store by default.
pub const DEFAULT_STORE_PATH: &str =
    "/var/lib/containerd/io.containerd.snapshotter.v1.devbox/metadata.db";

#[derive(Parser, Debug)]
#[command(
    name = "metaview",
    version,
    about = "Inspect snapshotter metadata stores: buckets, snapshots, devbox storage mappings"
)]
pub struct Cli {
    /// Path to the metadata store file
    #[arg(short = 'p', long, global = true, default_value = DEFAULT_STORE_PATH)]
    pub db_path: PathBuf,
    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "table")]
    pub output: Output,
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// List all top-level buckets with their key counts
    Buckets,
    /// Inspect snapshot records
    Snapshots {
        #[command(subcommand)]
        cmd: SnapshotsCmd,
    },
    /// Inspect devbox storage mappings
    Devbox {
        #[command(subcommand)]
        cmd: DevboxCmd,
    },
}

#[derive(Subcommand, Debug)]
pub enum SnapshotsCmd {
    /// List all snapshots
    List,
    /// Show one snapshot in full, by key
    Get { key: String },
    /// Filter snapshots by content id and/or mount path (linear scan)
    Search {
        /// Match this content id exactly
        #[arg(long)]
        content_id: Option<String>,
        /// Match this mount path exactly
        #[arg(long)]
        path: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DevboxCmd {
    /// List all storage mappings
    List,
    /// Show one storage mapping in full, by content id
    Get { content_id: String },
    /// Map logical volume names to their mount paths
    LvmMap,
}
