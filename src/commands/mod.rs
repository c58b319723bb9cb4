//! CLI command definitions and dispatch.

pub mod folder;
pub mod material;
pub mod tag;
pub mod trash;

use clap::{Parser, Subcommand};

use studyhub_core::config::AppConfig;
use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::types::{CategoryId, MaterialId};
use studyhub_entity::category::CategoryTree;

use crate::output::OutputFormat;
use crate::workspace::Workspace;

/// StudyHub: organize study materials in folders and tags
#[derive(Debug, Parser)]
#[command(name = "studyhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Local account email
    #[arg(long, env = "STUDYHUB_USER", default_value = "student@localhost")]
    pub user: String,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the folder tree
    Tree,
    /// List a folder
    Ls(material::LsArgs),
    /// Search materials
    Search(material::SearchArgs),
    /// Upload a file
    Upload(material::UploadArgs),
    /// Create a folder
    Mkdir(folder::MkdirArgs),
    /// Move materials into a folder
    Mv(material::MvArgs),
    /// Move a folder
    MvFolder(folder::MvFolderArgs),
    /// Rename a folder
    RenameFolder(folder::RenameArgs),
    /// Delete a folder
    RmFolder(folder::RmFolderArgs),
    /// Copy a material or folder
    Cp(material::CpArgs),
    /// Download materials into a directory
    Download(material::DownloadArgs),
    /// Move materials to the trash
    Rm(trash::IdsArgs),
    /// List the trash
    Trash,
    /// Restore materials from the trash
    Restore(trash::IdsArgs),
    /// Permanently delete materials
    Purge(trash::IdsArgs),
    /// Permanently delete everything in the trash
    EmptyTrash,
    /// Tag management
    Tag(tag::TagArgs),
}

impl Cli {
    /// Execute the CLI command against the local workspace
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let workspace = Workspace::open(config, &self.user).await?;
        let ctx = CommandContext {
            workspace: &workspace,
            config,
            format: self.format,
            yes: self.yes,
        };

        let result = match &self.command {
            Commands::Tree => folder::tree(&ctx).await,
            Commands::Ls(args) => material::ls(&ctx, args).await,
            Commands::Search(args) => material::search(&ctx, args).await,
            Commands::Upload(args) => material::upload(&ctx, args).await,
            Commands::Mkdir(args) => folder::mkdir(&ctx, args).await,
            Commands::Mv(args) => material::mv(&ctx, args).await,
            Commands::MvFolder(args) => folder::mv(&ctx, args).await,
            Commands::RenameFolder(args) => folder::rename(&ctx, args).await,
            Commands::RmFolder(args) => folder::rm(&ctx, args).await,
            Commands::Cp(args) => material::cp(&ctx, args).await,
            Commands::Download(args) => material::download(&ctx, args).await,
            Commands::Rm(args) => trash::rm(&ctx, args).await,
            Commands::Trash => trash::list(&ctx).await,
            Commands::Restore(args) => trash::restore(&ctx, args).await,
            Commands::Purge(args) => trash::purge(&ctx, args).await,
            Commands::EmptyTrash => trash::empty(&ctx).await,
            Commands::Tag(args) => tag::execute(&ctx, args).await,
        };

        // Saved even after a failure: earlier steps may have persisted.
        workspace.save().await?;
        result
    }
}

/// Everything a command needs.
pub struct CommandContext<'a> {
    /// The opened workspace.
    pub workspace: &'a Workspace,
    /// Loaded configuration.
    pub config: &'a AppConfig,
    /// Output format.
    pub format: OutputFormat,
    /// Whether prompts are skipped.
    pub yes: bool,
}

impl CommandContext<'_> {
    /// Ask before a destructive action unless `--yes` was given.
    pub fn confirm(&self, prompt: &str) -> AppResult<bool> {
        if self.yes {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))
    }
}

/// Parse material ids from arguments.
pub fn parse_materials(ids: &[String]) -> AppResult<Vec<MaterialId>> {
    ids.iter()
        .map(|s| {
            s.trim()
                .trim_start_matches("material-")
                .parse()
                .map_err(|_| AppError::validation(format!("Invalid material id: '{s}'")))
        })
        .collect()
}

/// Resolve a folder reference: a folder id, or a `/`-separated path of
/// folder names. `None`, `""` and `"/"` name the root.
pub fn resolve_folder(tree: &CategoryTree, reference: Option<&str>) -> AppResult<Option<CategoryId>> {
    let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty() && *r != "/") else {
        return Ok(None);
    };
    if let Ok(id) = reference.trim_start_matches("folder-").parse::<CategoryId>() {
        return if tree.contains(&id) {
            Ok(Some(id))
        } else {
            Err(AppError::not_found(format!("Folder {id} not found")))
        };
    }

    let mut current = None;
    for segment in reference.split('/').filter(|s| !s.is_empty()) {
        let next = tree
            .children_of(current)
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(segment))
            .ok_or_else(|| AppError::not_found(format!("Folder '{reference}' not found")))?;
        current = Some(next.id);
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use studyhub_core::types::UserId;
    use studyhub_entity::category::Category;

    use super::*;

    fn category(name: &str, parent: Option<CategoryId>) -> Category {
        Category {
            id: CategoryId::new(),
            user_id: UserId::new(),
            name: name.to_string(),
            parent_id: parent,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_folder_by_path_and_id() {
        let math = category("Math", None);
        let algebra = category("Algebra", Some(math.id));
        let tree = CategoryTree::build(&[math.clone(), algebra.clone()]);

        assert_eq!(resolve_folder(&tree, None).expect("root"), None);
        assert_eq!(resolve_folder(&tree, Some("/")).expect("root"), None);
        assert_eq!(resolve_folder(&tree, Some("math/ALGEBRA")).expect("path"), Some(algebra.id));
        assert_eq!(
            resolve_folder(&tree, Some(&math.id.to_string())).expect("id"),
            Some(math.id)
        );
        assert!(resolve_folder(&tree, Some("Physics")).is_err());
        assert!(resolve_folder(&tree, Some(&CategoryId::new().to_string())).is_err());
    }

    #[test]
    fn test_parse_materials_accepts_markers() {
        let id = MaterialId::new();
        let parsed = parse_materials(&[format!("material-{id}"), id.to_string()]).expect("parse");
        assert_eq!(parsed, vec![id, id]);
        assert!(parse_materials(&["nope".to_string()]).is_err());
    }
}
