use std::path::Path;

use anyhow::{Context, Result};
use metaview::MetaReader;

use crate::cli::Output;
use crate::render;

pub fn exec(path: &Path, output: Output) -> Result<()> {
    let reader = MetaReader::open(path).context("create store reader")?;
    let buckets = reader.list_buckets().context("list buckets")?;

    match output {
        Output::Json => render::print_json(&buckets),
        Output::Table => {
            let rows: Vec<Vec<String>> = buckets
                .iter()
                .map(|b| vec![b.name.clone(), b.key_count.to_string()])
                .collect();
            render::print_table(&["NAME", "KEYS"], &rows);
            Ok(())
        }
    }
}
