use crate::output::print_json;
use anyhow::Context;
use solokit_core::{
    config::SolokitConfig,
    git::{GitBranchStatusResolver, SystemRunner},
    repository::WorkItemRepository,
};
use std::path::Path;

/// Classify the item's branch right now without persisting the result.
pub fn run(root: &Path, item_id: &str, json: bool) -> anyhow::Result<()> {
    let config = SolokitConfig::load(root).context("failed to load .session/config.json")?;
    let item = WorkItemRepository::new(root).get(item_id)?;
    let git = item
        .git
        .as_ref()
        .with_context(|| format!("'{item_id}' has no branch yet; start a session first"))?;

    let runner = SystemRunner::new(root, config.git_workflow.command_timeout());
    let resolver = GitBranchStatusResolver::new(runner, &config.git_workflow);
    let live = resolver.resolve(&git.branch, &git.parent_branch);

    if json {
        print_json(&serde_json::json!({
            "item_id": item.id,
            "branch": git.branch,
            "parent_branch": git.parent_branch,
            "stored": git.status,
            "live": live,
        }))?;
    } else {
        println!("{} on branch '{}' (from {})", item.id, git.branch, git.parent_branch);
        println!("  stored: {}", git.status);
        println!("  live:   {live}");
    }
    Ok(())
}
