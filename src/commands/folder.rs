//! Folder commands.

use std::collections::HashMap;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use studyhub_core::result::AppResult;
use studyhub_core::types::CategoryId;

use super::{CommandContext, resolve_folder};
use crate::output;

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name
    pub name: String,
    /// Parent folder (id or path; omit for root)
    #[arg(short, long)]
    pub parent: Option<String>,
}

/// Arguments for `mv-folder`
#[derive(Debug, Args)]
pub struct MvFolderArgs {
    /// Folder to move (id or path)
    pub folder: String,
    /// Destination folder (id or path; omit for root)
    #[arg(short, long)]
    pub to: Option<String>,
}

/// Arguments for `rename-folder`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Folder to rename (id or path)
    pub folder: String,
    /// New name
    pub name: String,
}

/// Arguments for `rm-folder`
#[derive(Debug, Args)]
pub struct RmFolderArgs {
    /// Folder to delete (id or path)
    pub folder: String,
}

/// Folder tree display row
#[derive(Debug, Serialize, Tabled)]
struct TreeRow {
    /// Indented name
    #[tabled(rename = "Folder")]
    name: String,
    /// Materials directly inside
    #[tabled(rename = "Files")]
    files: u64,
    /// Folder ID
    #[tabled(rename = "ID")]
    id: String,
}

/// `tree`
pub async fn tree(ctx: &CommandContext<'_>) -> AppResult<()> {
    let services = &ctx.workspace.services;
    let tree = services.categories.tree().await?;
    let mut counts: HashMap<CategoryId, u64> = HashMap::new();
    for material in services.materials.list().await? {
        if let Some(id) = material.category_id {
            *counts.entry(id).or_default() += 1;
        }
    }

    match ctx.format {
        output::OutputFormat::Json => {
            let nested = tree.nested(&counts);
            output::print_item(&nested, "", ctx.format);
        }
        output::OutputFormat::Table => {
            let rows: Vec<TreeRow> = tree
                .flatten(None)
                .into_iter()
                .map(|node| TreeRow {
                    name: format!("{}{}", "  ".repeat(node.level), node.name),
                    files: counts.get(&node.id).copied().unwrap_or_default(),
                    id: node.id.to_string(),
                })
                .collect();
            output::print_list(&rows, ctx.format);
        }
    }
    Ok(())
}

/// `mkdir`
pub async fn mkdir(ctx: &CommandContext<'_>, args: &MkdirArgs) -> AppResult<()> {
    let categories = &ctx.workspace.services.categories;
    let parent = resolve_folder(&categories.tree().await?, args.parent.as_deref())?;
    let created = categories.create(&args.name, parent).await?;
    output::print_item(
        &created,
        &format!("Created folder '{}' ({})", created.name, created.id),
        ctx.format,
    );
    Ok(())
}

/// `mv-folder`
pub async fn mv(ctx: &CommandContext<'_>, args: &MvFolderArgs) -> AppResult<()> {
    let categories = &ctx.workspace.services.categories;
    let tree = categories.tree().await?;
    let Some(id) = resolve_folder(&tree, Some(&args.folder))? else {
        output::print_warning("The root folder cannot be moved.");
        return Ok(());
    };
    let target = resolve_folder(&tree, args.to.as_deref())?;

    if categories.move_to(id, target).await? {
        let place = studyhub_explorer::dnd::place_name(&tree, target);
        output::print_success(&format!("Moved folder to {place}"));
    } else {
        output::print_warning("Folder is already there.");
    }
    Ok(())
}

/// `rename-folder`
pub async fn rename(ctx: &CommandContext<'_>, args: &RenameArgs) -> AppResult<()> {
    let categories = &ctx.workspace.services.categories;
    let Some(id) = resolve_folder(&categories.tree().await?, Some(&args.folder))? else {
        output::print_warning("The root folder cannot be renamed.");
        return Ok(());
    };
    categories.rename(id, &args.name).await?;
    output::print_success(&format!("Renamed folder to '{}'", args.name.trim()));
    Ok(())
}

/// `rm-folder`
pub async fn rm(ctx: &CommandContext<'_>, args: &RmFolderArgs) -> AppResult<()> {
    let categories = &ctx.workspace.services.categories;
    let Some(id) = resolve_folder(&categories.tree().await?, Some(&args.folder))? else {
        output::print_warning("The root folder cannot be deleted.");
        return Ok(());
    };
    if !ctx.confirm(&format!("Delete folder '{}'?", args.folder))? {
        println!("Cancelled.");
        return Ok(());
    }
    categories.delete(id).await?;
    output::print_success("Folder deleted.");
    Ok(())
}
