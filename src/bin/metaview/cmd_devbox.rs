use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use metaview::{MetaReader, StorageMappingRecord};

use crate::cli::Output;
use crate::render;

// The core leaves an absent status empty; the placeholder is ours.
const STATUS_PLACEHOLDER: &str = "unknown";

pub fn list(path: &Path, output: Output) -> Result<()> {
    let reader = MetaReader::open(path).context("create store reader")?;
    let storage = reader.list_devbox_storage().context("list devbox storage")?;

    match output {
        Output::Json => render::print_json(&storage),
        Output::Table => {
            let rows: Vec<Vec<String>> = storage
                .iter()
                .map(|m| {
                    vec![
                        render::truncate(&m.content_id, 12),
                        render::dash_if_empty(&m.lv_name),
                        render::truncate(&render::dash_if_empty(&m.path), 30),
                        status_or_placeholder(m),
                        render::dash_if_empty(&m.snapshot_key),
                    ]
                })
                .collect();
            render::print_table(
                &["CONTENT_ID", "LV_NAME", "PATH", "STATUS", "SNAPSHOT_KEY"],
                &rows,
            );
            Ok(())
        }
    }
}

pub fn get(path: &Path, output: Output, content_id: &str) -> Result<()> {
    let reader = MetaReader::open(path).context("create store reader")?;
    let mapping = reader
        .get_devbox_storage(content_id)
        .with_context(|| format!("get devbox storage {content_id}"))?;

    match output {
        Output::Json => render::print_json(&mapping),
        Output::Table => {
            println!("Devbox Storage Information:");
            println!("===========================");
            println!("ContentID: {}", mapping.content_id);
            println!("LV Name:   {}", render::dash_if_empty(&mapping.lv_name));
            println!("Path:      {}", render::dash_if_empty(&mapping.path));
            println!("Status:    {}", status_or_placeholder(&mapping));
            if !mapping.snapshot_key.is_empty() {
                println!("Snapshot:  {}", mapping.snapshot_key);
            }
            Ok(())
        }
    }
}

pub fn lvm_map(path: &Path, output: Output) -> Result<()> {
    let reader = MetaReader::open(path).context("create store reader")?;
    let storage = reader.list_devbox_storage().context("list devbox storage")?;

    // lv_name -> mount path; entries without a volume name cannot be mapped
    let mapped: Vec<&StorageMappingRecord> =
        storage.iter().filter(|m| !m.lv_name.is_empty()).collect();

    match output {
        Output::Json => {
            let map: BTreeMap<&str, &str> = mapped
                .iter()
                .map(|m| (m.lv_name.as_str(), m.path.as_str()))
                .collect();
            render::print_json(&map)
        }
        Output::Table => {
            let mut rows: Vec<Vec<String>> = mapped
                .iter()
                .map(|m| {
                    vec![
                        m.lv_name.clone(),
                        render::dash_if_empty(&m.path),
                        render::truncate(&m.content_id, 12),
                    ]
                })
                .collect();
            rows.sort();
            render::print_table(&["LV_NAME", "PATH", "CONTENT_ID"], &rows);
            Ok(())
        }
    }
}

fn status_or_placeholder(m: &StorageMappingRecord) -> String {
    if m.status.is_empty() {
        STATUS_PLACEHOLDER.to_string()
    } else {
        m.status.clone()
    }
}
