use crate::output::print_json;
use anyhow::Context;
use solokit_core::{
    config::SolokitConfig,
    git::{GitBranchStatusResolver, SystemRunner},
    repository::WorkItemRepository,
    session,
};
use std::path::Path;

pub fn start(
    root: &Path,
    item_id: &str,
    parent_branch: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let config = SolokitConfig::load(root).context("failed to load .session/config.json")?;
    let runner = SystemRunner::new(root, config.git_workflow.command_timeout());
    let resolver = GitBranchStatusResolver::new(runner, &config.git_workflow);
    let repo = WorkItemRepository::new(root);

    let started = session::start_session(&repo, &resolver, item_id, parent_branch)?;

    if json {
        print_json(&started)?;
        return Ok(());
    }
    for t in &started.finalized {
        println!("Finalized '{}': {} -> {}", t.item_id, t.from, t.to);
    }
    let verb = if started.resumed { "Resumed" } else { "Started" };
    println!(
        "{verb} session {} on '{}': {}",
        started.session_num, started.item.id, started.item.title
    );
    if let Some(git) = &started.item.git {
        println!("  branch: {} (from {})", git.branch, git.parent_branch);
    }
    Ok(())
}

pub fn end(root: &Path, item_id: Option<&str>, complete: bool, json: bool) -> anyhow::Result<()> {
    let repo = WorkItemRepository::new(root);
    let ended = session::end_session(&repo, item_id, complete)?;

    if json {
        print_json(&ended)?;
    } else {
        println!("Ended session {} on '{}'", ended.session_num, ended.item.id);
        for change in ended.changes.iter().skip(1) {
            println!("  {change}");
        }
    }
    Ok(())
}
