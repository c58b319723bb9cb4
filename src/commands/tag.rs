//! Tag commands.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_entity::tag::TagPatch;
use studyhub_service::TagEditMode;

use super::material::{print_report, tag_ids};
use super::{CommandContext, parse_materials};
use crate::output;

/// Arguments for tag commands
#[derive(Debug, Args)]
pub struct TagArgs {
    /// Tag subcommand
    #[command(subcommand)]
    pub command: TagCommand,
}

/// Tag subcommands
#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// List tags
    List,
    /// Create a tag
    Create {
        /// Tag name
        name: String,
        /// Color, e.g. #22c55e
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename or recolor a tag
    Edit {
        /// Tag name
        name: String,
        /// New name
        #[arg(long)]
        rename: Option<String>,
        /// New color
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a tag
    Delete {
        /// Tag name
        name: String,
    },
    /// Change the tags of materials
    Apply {
        /// How to combine with existing tags
        #[arg(value_enum)]
        mode: ModeArg,
        /// Tag names, comma-separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        tags: Vec<String>,
        /// Material ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Tag edit mode argument
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Add the tags
    Add,
    /// Remove the tags
    Remove,
    /// Replace all tags
    Replace,
}

impl From<ModeArg> for TagEditMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Add => Self::Add,
            ModeArg::Remove => Self::Remove,
            ModeArg::Replace => Self::Replace,
        }
    }
}

/// Tag display row
#[derive(Debug, Serialize, Tabled)]
struct TagRow {
    /// Tag ID
    #[tabled(rename = "ID")]
    id: String,
    /// Name
    #[tabled(rename = "Name")]
    name: String,
    /// Color
    #[tabled(rename = "Color")]
    color: String,
}

/// Execute tag commands
pub async fn execute(ctx: &CommandContext<'_>, args: &TagArgs) -> AppResult<()> {
    let services = &ctx.workspace.services;
    match &args.command {
        TagCommand::List => {
            let rows: Vec<TagRow> = services
                .tags
                .list()
                .await?
                .into_iter()
                .map(|t| TagRow {
                    id: t.id.to_string(),
                    name: t.name,
                    color: t.color,
                })
                .collect();
            output::print_list(&rows, ctx.format);
        }
        TagCommand::Create { name, color } => {
            let tag = services.tags.create(name, color.as_deref()).await?;
            output::print_item(&tag, &format!("Created tag '{}'", tag.name), ctx.format);
        }
        TagCommand::Edit {
            name,
            rename,
            color,
        } => {
            let tag = find(ctx, name).await?;
            let patch = TagPatch {
                name: rename.clone(),
                color: color.clone(),
            };
            services.tags.update(tag.id, patch).await?;
            output::print_success(&format!("Updated tag '{}'", rename.as_deref().unwrap_or(name)));
        }
        TagCommand::Delete { name } => {
            let tag = find(ctx, name).await?;
            if !ctx.confirm(&format!("Delete tag '{}' from every material?", tag.name))? {
                println!("Cancelled.");
                return Ok(());
            }
            services.tags.delete(tag.id).await?;
            output::print_success(&format!("Deleted tag '{}'", tag.name));
        }
        TagCommand::Apply { mode, tags, ids } => {
            let create = !matches!(mode, ModeArg::Remove);
            let tag_ids = tag_ids(services, tags, create).await?;
            let ids = parse_materials(ids)?;
            let report = services
                .batch
                .edit_tags(&ids, (*mode).into(), &tag_ids)
                .await?;
            print_report(&report, "Tags updated");
        }
    }
    Ok(())
}

async fn find(ctx: &CommandContext<'_>, name: &str) -> AppResult<studyhub_entity::tag::Tag> {
    ctx.workspace
        .services
        .tags
        .find_by_name(name)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Tag '{name}' not found")))
}
