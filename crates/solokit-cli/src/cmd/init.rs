use anyhow::Context;
use solokit_core::{config::SolokitConfig, paths, repository::WorkItemRepository};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing solokit in: {}", root.display());

    let created = WorkItemRepository::new(root)
        .init()
        .context("failed to create work item store")?;
    report(created, paths::WORK_ITEMS_FILE);

    let created = SolokitConfig::write_default(root).context("failed to write config.json")?;
    report(created, paths::CONFIG_FILE);

    Ok(())
}

fn report(created: bool, file: &str) {
    if created {
        println!("  created: {file}");
    } else {
        println!("  exists:  {file}");
    }
}
