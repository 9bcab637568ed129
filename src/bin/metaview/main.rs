use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod cmd_buckets;
mod cmd_devbox;
mod cmd_snapshots;
mod render;

fn init_logger(verbose: bool) {
    // Level comes from RUST_LOG; --verbose only changes the default.
    let default = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let cli = cli::Cli::parse();
    init_logger(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: cli::Cli) -> Result<()> {
    let path = cli.db_path.as_path();
    let output = cli.output;
    match cli.cmd {
        cli::Cmd::Buckets => cmd_buckets::exec(path, output),

        cli::Cmd::Snapshots { cmd } => match cmd {
            cli::SnapshotsCmd::List => cmd_snapshots::list(path, output),
            cli::SnapshotsCmd::Get { key } => cmd_snapshots::get(path, output, &key),
            cli::SnapshotsCmd::Search { content_id, path: mount } => cmd_snapshots::search(
                path,
                output,
                content_id.as_deref().unwrap_or(""),
                mount.as_deref().unwrap_or(""),
            ),
        },

        cli::Cmd::Devbox { cmd } => match cmd {
            cli::DevboxCmd::List => cmd_devbox::list(path, output),
            cli::DevboxCmd::Get { content_id } => cmd_devbox::get(path, output, &content_id),
            cli::DevboxCmd::LvmMap => cmd_devbox::lvm_map(path, output),
        },
    }
}
