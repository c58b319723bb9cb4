//! Trash commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use studyhub_core::result::AppResult;

use super::material::print_report;
use super::{CommandContext, parse_materials};
use crate::output;

/// Material id arguments
#[derive(Debug, Args)]
pub struct IdsArgs {
    /// Material ids
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Trash display row
#[derive(Debug, Serialize, Tabled)]
struct TrashRow {
    /// Material ID
    #[tabled(rename = "ID")]
    id: String,
    /// Title
    #[tabled(rename = "Title")]
    title: String,
    /// Size
    #[tabled(rename = "Size")]
    size: String,
    /// Deletion time
    #[tabled(rename = "Deleted")]
    deleted_at: String,
}

/// `rm`
pub async fn rm(ctx: &CommandContext<'_>, args: &IdsArgs) -> AppResult<()> {
    let ids = parse_materials(&args.ids)?;
    if !ctx.confirm(&format!("Move {} item(s) to the trash?", ids.len()))? {
        println!("Cancelled.");
        return Ok(());
    }
    let report = ctx.workspace.services.batch.soft_delete(&ids).await?;
    print_report(&report, "Moved to trash");
    Ok(())
}

/// `trash`
pub async fn list(ctx: &CommandContext<'_>) -> AppResult<()> {
    let trashed = ctx.workspace.services.materials.list_trash().await?;
    let rows: Vec<TrashRow> = trashed
        .iter()
        .map(|m| TrashRow {
            id: m.id.to_string(),
            title: m.title.clone(),
            size: output::human_size(m.file_size),
            deleted_at: m
                .deleted_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        })
        .collect();
    output::print_list(&rows, ctx.format);
    Ok(())
}

/// `restore`
pub async fn restore(ctx: &CommandContext<'_>, args: &IdsArgs) -> AppResult<()> {
    let materials = &ctx.workspace.services.materials;
    let mut restored = 0;
    for id in parse_materials(&args.ids)? {
        match materials.restore(id).await {
            Ok(()) => restored += 1,
            Err(e) => output::print_error(&format!("{id}: {e}")),
        }
    }
    output::print_success(&format!("Restored {restored} of {} items", args.ids.len()));
    Ok(())
}

/// `purge`
pub async fn purge(ctx: &CommandContext<'_>, args: &IdsArgs) -> AppResult<()> {
    let ids = parse_materials(&args.ids)?;
    if !ctx.confirm(&format!(
        "Permanently delete {} item(s)? This cannot be undone.",
        ids.len()
    ))? {
        println!("Cancelled.");
        return Ok(());
    }
    let report = ctx.workspace.services.batch.purge(&ids).await?;
    print_report(&report, "Deleted permanently");
    Ok(())
}

/// `empty-trash`
pub async fn empty(ctx: &CommandContext<'_>) -> AppResult<()> {
    if !ctx.confirm("Permanently delete everything in the trash?")? {
        println!("Cancelled.");
        return Ok(());
    }
    let purged = ctx.workspace.services.materials.empty_trash().await?;
    output::print_success(&format!("Deleted {purged} items permanently"));
    Ok(())
}
