use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use solokit_core::{
    queue::{self, ListFilter},
    repository::{Metadata, WorkItemRepository},
    types::{Priority, WorkItemStatus, WorkItemType},
    updater::{UpdateRequest, WorkItemUpdater},
    validator,
    work_item::{parse_id_list, NewWorkItem, WorkItem},
    SolokitError,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum WorkSubcommand {
    /// Create a work item
    Add {
        id: String,
        /// feature, bug, refactor, security, integration_test, deployment
        #[arg(long = "type", short = 't')]
        item_type: WorkItemType,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Comma-separated ids (e.g. feat_a,bug_b)
        #[arg(long)]
        dependencies: Option<String>,
        /// Take the urgent flag (cleared from any other item)
        #[arg(long)]
        urgent: bool,
        #[arg(long)]
        milestone: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List work items, urgent first then by priority
    List {
        #[arg(long)]
        status: Option<WorkItemStatus>,
        #[arg(long = "type")]
        item_type: Option<WorkItemType>,
        #[arg(long)]
        milestone: Option<String>,
        /// Only the urgent item
        #[arg(long)]
        urgent: bool,
    },
    /// Show full details for a single work item
    Show { id: String },
    /// Change fields on a work item
    Update {
        id: String,
        #[arg(long)]
        status: Option<WorkItemStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Comma-separated ids to add
        #[arg(long)]
        add_dependency: Option<String>,
        /// Comma-separated ids to remove
        #[arg(long)]
        remove_dependency: Option<String>,
        #[arg(long, conflicts_with = "clear_urgent")]
        set_urgent: bool,
        #[arg(long)]
        clear_urgent: bool,
        /// Empty string clears the milestone
        #[arg(long)]
        milestone: Option<String>,
        /// Empty string clears the description
        #[arg(long)]
        description: Option<String>,
    },
    /// Show the next item ready to start
    Next,
    /// Check the whole store for broken invariants
    Validate,
}

pub fn run(root: &Path, subcmd: WorkSubcommand, json: bool) -> anyhow::Result<()> {
    let repo = WorkItemRepository::new(root);
    match subcmd {
        WorkSubcommand::Add {
            id,
            item_type,
            title,
            priority,
            dependencies,
            urgent,
            milestone,
            description,
        } => {
            let mut new = NewWorkItem::new(id, item_type, title)
                .priority(priority)
                .dependencies(parse_id_list(dependencies.as_deref().unwrap_or("")))
                .urgent(urgent);
            new.milestone = milestone.filter(|m| !m.trim().is_empty());
            new.description = description.filter(|d| !d.trim().is_empty());
            add(&repo, new, json)
        }
        WorkSubcommand::List {
            status,
            item_type,
            milestone,
            urgent,
        } => {
            let filter = ListFilter {
                status,
                item_type,
                milestone,
                urgent,
            };
            list(&repo, &filter, json)
        }
        WorkSubcommand::Show { id } => show(&repo, &id, json),
        WorkSubcommand::Update {
            id,
            status,
            priority,
            add_dependency,
            remove_dependency,
            set_urgent,
            clear_urgent,
            milestone,
            description,
        } => {
            let request = UpdateRequest {
                status,
                priority,
                add_dependency,
                remove_dependency,
                set_urgent,
                clear_urgent,
                milestone,
                description,
            };
            update(&repo, &id, &request, json)
        }
        WorkSubcommand::Next => next(&repo, json),
        WorkSubcommand::Validate => validate(&repo, json),
    }
}

fn add(repo: &WorkItemRepository, new: NewWorkItem, json: bool) -> anyhow::Result<()> {
    let item = repo.add_work_item(new)?;

    if json {
        print_json(&item)?;
    } else {
        println!("Created {} '{}': {}", item.item_type, item.id, item.title);
        if item.urgent {
            println!("  marked urgent");
        }
    }
    Ok(())
}

fn list(repo: &WorkItemRepository, filter: &ListFilter, json: bool) -> anyhow::Result<()> {
    let items = repo.load()?;
    let listed = queue::list(&items, filter);

    if json {
        print_json(&listed)?;
        return Ok(());
    }
    if listed.is_empty() {
        println!("No work items.");
        return Ok(());
    }
    let rows = listed
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                i.item_type.to_string(),
                i.status.to_string(),
                i.priority.to_string(),
                if i.urgent { "yes".into() } else { String::new() },
                i.title.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "TYPE", "STATUS", "PRIORITY", "URGENT", "TITLE"], rows);
    Ok(())
}

fn show(repo: &WorkItemRepository, id: &str, json: bool) -> anyhow::Result<()> {
    let items = repo.load()?;
    let item = items
        .get(id)
        .ok_or_else(|| SolokitError::WorkItemNotFound(id.to_string()))?;
    let blocked_by = queue::blocked_by(&items, id);

    if json {
        print_json(&serde_json::json!({
            "item": item,
            "blocked_by": blocked_by,
        }))?;
    } else {
        print_item(item);
        if !blocked_by.is_empty() {
            println!("Blocked by:   {}", blocked_by.join(", "));
        }
    }
    Ok(())
}

fn print_item(item: &WorkItem) {
    println!("{} [{}]", item.id, item.item_type);
    println!("Title:        {}", item.title);
    println!("Status:       {}", item.status);
    println!("Priority:     {}", item.priority);
    if item.urgent {
        println!("Urgent:       yes");
    }
    if let Some(m) = &item.milestone {
        println!("Milestone:    {m}");
    }
    if !item.dependencies.is_empty() {
        println!("Dependencies: {}", item.dependencies.join(", "));
    }
    if let Some(git) = &item.git {
        println!(
            "Branch:       {} (from {}, {})",
            git.branch, git.parent_branch, git.status
        );
    }
    if !item.sessions.is_empty() {
        println!("Sessions:     {}", item.sessions.len());
    }
    if let Some(d) = &item.description {
        println!();
        println!("{d}");
    }
}

fn update(
    repo: &WorkItemRepository,
    id: &str,
    request: &UpdateRequest,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = WorkItemUpdater::new(repo).update(id, request)?;

    if json {
        print_json(&outcome)?;
    } else {
        println!("Updated '{id}':");
        for change in &outcome.changes {
            println!("  {change}");
        }
        for other in &outcome.urgent_cleared_from {
            println!("  urgent flag removed from '{other}'");
        }
    }
    Ok(())
}

fn next(repo: &WorkItemRepository, json: bool) -> anyhow::Result<()> {
    let items = repo.load()?;
    let next = queue::next_available(&items);

    if json {
        print_json(&next)?;
        return Ok(());
    }
    match next {
        Some(item) => {
            println!("Next: {} ({}, {})", item.id, item.priority, item.title);
            println!("Start it with: sk start {}", item.id);
        }
        None => println!("No work item is ready to start."),
    }
    Ok(())
}

fn validate(repo: &WorkItemRepository, json: bool) -> anyhow::Result<()> {
    let items = repo.load().context("failed to load work items")?;
    let problems = validator::validate_collection(&items);

    if json {
        print_json(&serde_json::json!({
            "valid": problems.is_empty(),
            "problems": problems,
            "metadata": Metadata::compute(&items),
        }))?;
    } else if problems.is_empty() {
        println!("OK: {} work items, no problems found.", items.len());
    } else {
        for p in &problems {
            println!("  - {p}");
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SolokitError::validation(format!("{} problem(s) found", problems.len())).into())
    }
}
