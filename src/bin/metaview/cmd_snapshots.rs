use std::path::Path;

use anyhow::{Context, Result};
use metaview::{MetaReader, SnapshotRecord};

use crate::cli::Output;
use crate::render;

pub fn list(path: &Path, output: Output) -> Result<()> {
    let reader = MetaReader::open(path).context("create store reader")?;
    let snapshots = reader.list_snapshots().context("list snapshots")?;
    print_many(&snapshots, output)
}

pub fn get(path: &Path, output: Output, key: &str) -> Result<()> {
    let reader = MetaReader::open(path).context("create store reader")?;
    let snapshot = reader
        .get_snapshot(key)
        .with_context(|| format!("get snapshot {key}"))?;

    match output {
        Output::Json => render::print_json(&snapshot),
        Output::Table => {
            print_detail(&snapshot);
            Ok(())
        }
    }
}

pub fn search(path: &Path, output: Output, content_id: &str, mount: &str) -> Result<()> {
    let reader = MetaReader::open(path).context("create store reader")?;
    let snapshots = reader
        .search_snapshots(content_id, mount)
        .context("search snapshots")?;
    print_many(&snapshots, output)
}

fn print_many(snapshots: &[SnapshotRecord], output: Output) -> Result<()> {
    match output {
        Output::Json => render::print_json(&snapshots),
        Output::Table => {
            let rows: Vec<Vec<String>> = snapshots
                .iter()
                .map(|s| {
                    vec![
                        s.id.to_string(),
                        render::truncate(&s.key, 12),
                        s.kind.to_string(),
                        render::dash_if_empty(&s.parent),
                        render::truncate(&render::dash_if_empty(&s.content_id), 12),
                        render::truncate(&render::dash_if_empty(&s.path), 20),
                        s.inodes.to_string(),
                        s.size.to_string(),
                        render::format_ts(s.created_at),
                    ]
                })
                .collect();
            render::print_table(
                &[
                    "ID",
                    "KEY",
                    "KIND",
                    "PARENT",
                    "CONTENT_ID",
                    "PATH",
                    "INODES",
                    "SIZE",
                    "CREATED",
                ],
                &rows,
            );
            Ok(())
        }
    }
}

fn print_detail(s: &SnapshotRecord) {
    println!("Snapshot Information:");
    println!("====================");
    println!("ID:        {}", s.id);
    println!("Key:       {}", s.key);
    println!("Kind:      {}", s.kind);
    println!("Parent:    {}", render::dash_if_empty(&s.parent));
    println!("Created:   {}", render::format_ts(s.created_at));
    println!("Updated:   {}", render::format_ts(s.updated_at));
    println!("Inodes:    {}", s.inodes);
    println!("Size:      {} bytes", s.size);

    if !s.content_id.is_empty() {
        println!("ContentID: {}", s.content_id);
    }
    if !s.path.is_empty() {
        println!("Path:      {}", s.path);
    }
    if !s.labels.is_empty() {
        println!();
        println!("Labels:");
        for (k, v) in &s.labels {
            println!("  {k}: {v}");
        }
    }
}
