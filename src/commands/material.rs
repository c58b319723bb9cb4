//! Material commands: listing, search, upload, move, copy, download.

use std::path::Path;

use bytes::Bytes;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::types::{SortDirection, TagId};
use studyhub_entity::material::Material;
use studyhub_explorer::ExplorerViewModel;
use studyhub_explorer::dnd::place_name;
use studyhub_service::{
    BatchReport, CategoryScope, DirectorySink, MaterialFilter, MaterialSort, MaterialSortField,
    Services, UploadMaterial,
};

use super::{CommandContext, parse_materials, resolve_folder};
use crate::output;

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Folder (id or path; omit for root)
    pub folder: Option<String>,
    /// Sort field
    #[arg(short, long, value_enum, default_value = "created")]
    pub sort: SortArg,
    /// Ascending order
    #[arg(long)]
    pub asc: bool,
}

/// Arguments for `search`
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Text to find in titles and file names
    pub query: Option<String>,
    /// Restrict to a folder (id or path; "/" for root)
    #[arg(long)]
    pub folder: Option<String>,
    /// Only materials carrying any of these tags
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,
    /// File type, e.g. pdf
    #[arg(long = "type")]
    pub file_type: Option<String>,
    /// Sort field
    #[arg(short, long, value_enum, default_value = "created")]
    pub sort: SortArg,
    /// Ascending order
    #[arg(long)]
    pub asc: bool,
}

/// Sort field argument
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SortArg {
    /// By title
    Title,
    /// By upload time
    Created,
    /// By size
    Size,
}

impl SortArg {
    fn sort(self, asc: bool) -> MaterialSort {
        MaterialSort {
            field: match self {
                Self::Title => MaterialSortField::Title,
                Self::Created => MaterialSortField::Created,
                Self::Size => MaterialSortField::Size,
            },
            direction: if asc {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            },
        }
    }
}

/// Arguments for `upload`
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Local file to upload
    pub path: String,
    /// Title (defaults to the file name without extension)
    #[arg(long)]
    pub title: Option<String>,
    /// Target folder (id or path; omit for root)
    #[arg(short = 'F', long)]
    pub folder: Option<String>,
    /// Tag names; missing tags are created
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,
}

/// Arguments for `mv`
#[derive(Debug, Args)]
pub struct MvArgs {
    /// Material ids
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Destination folder (id or path; omit for root)
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for `cp`
#[derive(Debug, Args)]
pub struct CpArgs {
    /// Material id, or a folder with `--folder`
    pub source: String,
    /// Treat the source as a folder and copy its whole subtree
    #[arg(long)]
    pub folder: bool,
    /// Destination folder (id or path; omit for root)
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for `download`
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Material ids
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Directory to write into
    #[arg(short, long, default_value = ".")]
    pub dir: String,
}

/// Material display row
#[derive(Debug, Serialize, Tabled)]
pub struct MaterialRow {
    /// Material ID
    #[tabled(rename = "ID")]
    pub id: String,
    /// Title
    #[tabled(rename = "Title")]
    pub title: String,
    /// File name
    #[tabled(rename = "File")]
    pub file_name: String,
    /// Size
    #[tabled(rename = "Size")]
    pub size: String,
    /// Tags
    #[tabled(rename = "Tags")]
    pub tags: String,
    /// Upload date
    #[tabled(rename = "Uploaded")]
    pub created_at: String,
}

impl From<&Material> for MaterialRow {
    fn from(m: &Material) -> Self {
        Self {
            id: m.id.to_string(),
            title: m.title.clone(),
            file_name: m.file_name.clone(),
            size: output::human_size(m.file_size),
            tags: m
                .tags
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            created_at: m.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Folder listing row
#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    /// Folder or file
    #[tabled(rename = "")]
    kind: &'static str,
    /// Name
    #[tabled(rename = "Name")]
    name: String,
    /// Size
    #[tabled(rename = "Size")]
    size: String,
    /// Tags
    #[tabled(rename = "Tags")]
    tags: String,
    /// ID
    #[tabled(rename = "ID")]
    id: String,
}

/// `ls`
pub async fn ls(ctx: &CommandContext<'_>, args: &LsArgs) -> AppResult<()> {
    let services = &ctx.workspace.services;
    let folder = resolve_folder(&services.categories.tree().await?, args.folder.as_deref())?;

    let mut explorer = ExplorerViewModel::new(
        services.clone(),
        std::sync::Arc::new(studyhub_service::TracingNotifier),
        &ctx.config.explorer,
    );
    explorer.navigate(folder);
    explorer.set_sort(args.sort.sort(args.asc));
    let listing = explorer.listing().await?;

    if ctx.format == output::OutputFormat::Json {
        output::print_item(&listing, "", ctx.format);
        return Ok(());
    }

    let path: Vec<String> = explorer
        .breadcrumb()
        .await?
        .into_iter()
        .map(|crumb| crumb.name)
        .collect();
    println!("{}", path.join(" / "));

    let mut rows: Vec<EntryRow> = listing
        .folders
        .iter()
        .map(|c| EntryRow {
            kind: "dir",
            name: c.name.clone(),
            size: String::new(),
            tags: String::new(),
            id: c.id.to_string(),
        })
        .collect();
    rows.extend(listing.materials.iter().map(|m| {
        let row = MaterialRow::from(m);
        EntryRow {
            kind: "file",
            name: row.title,
            size: row.size,
            tags: row.tags,
            id: row.id,
        }
    }));
    output::print_list(&rows, ctx.format);
    Ok(())
}

/// `search`
pub async fn search(ctx: &CommandContext<'_>, args: &SearchArgs) -> AppResult<()> {
    let services = &ctx.workspace.services;
    let category = match args.folder.as_deref() {
        None => CategoryScope::Any,
        Some(reference) => {
            CategoryScope::folder(resolve_folder(&services.categories.tree().await?, Some(reference))?)
        }
    };
    let filter = MaterialFilter {
        query: args.query.clone(),
        category,
        tag_ids: tag_ids(services, &args.tags, false).await?,
        file_type: args.file_type.clone(),
    };
    let results = services
        .materials
        .search(&filter, args.sort.sort(args.asc))
        .await?;
    let rows: Vec<MaterialRow> = results.iter().map(MaterialRow::from).collect();
    output::print_list(&rows, ctx.format);
    Ok(())
}

/// `upload`
pub async fn upload(ctx: &CommandContext<'_>, args: &UploadArgs) -> AppResult<()> {
    let services = &ctx.workspace.services;
    let path = Path::new(&args.path);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::validation(format!("Invalid file path '{}'", args.path)))?
        .to_string();
    let title = args.title.clone().unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&file_name)
            .to_string()
    });
    let data = tokio::fs::read(path).await?;
    let category_id = resolve_folder(&services.categories.tree().await?, args.folder.as_deref())?;

    let material = services
        .materials
        .upload(UploadMaterial {
            title,
            file_name,
            mime_type: None,
            category_id,
            tag_ids: tag_ids(services, &args.tags, true).await?,
            data: Bytes::from(data),
        })
        .await?;
    output::print_item(
        &material,
        &format!(
            "Uploaded '{}' ({}, {})",
            material.title,
            output::human_size(material.file_size),
            material.id
        ),
        ctx.format,
    );
    Ok(())
}

/// `mv`
pub async fn mv(ctx: &CommandContext<'_>, args: &MvArgs) -> AppResult<()> {
    let services = &ctx.workspace.services;
    let ids = parse_materials(&args.ids)?;
    let tree = services.categories.tree().await?;
    let target = resolve_folder(&tree, args.to.as_deref())?;
    let place = place_name(&tree, target);

    if let [id] = ids.as_slice() {
        if services.materials.move_to_category(*id, target).await? {
            output::print_success(&format!("Moved to {place}"));
        } else {
            output::print_warning(&format!("Already in {place}"));
        }
        return Ok(());
    }

    let report = services.batch.move_to(&ids, target).await?;
    print_report(&report, &format!("Moved to {place}"));
    Ok(())
}

/// `cp`
pub async fn cp(ctx: &CommandContext<'_>, args: &CpArgs) -> AppResult<()> {
    let services = &ctx.workspace.services;
    let tree = services.categories.tree().await?;
    let target = resolve_folder(&tree, args.to.as_deref())?;
    let place = place_name(&tree, target);

    if args.folder {
        let Some(source) = resolve_folder(&tree, Some(&args.source))? else {
            output::print_warning("The root folder cannot be copied.");
            return Ok(());
        };
        let copy = services.transfer.copy_category(source, target).await?;
        output::print_item(&copy, &format!("Copied folder '{}' to {place}", copy.name), ctx.format);
    } else {
        let id = parse_materials(std::slice::from_ref(&args.source))?
            .pop()
            .ok_or_else(|| AppError::validation("No material given"))?;
        let copy = services.transfer.copy_material(id, target).await?;
        output::print_item(&copy, &format!("Copied '{}' to {place}", copy.title), ctx.format);
    }
    Ok(())
}

/// `download`
pub async fn download(ctx: &CommandContext<'_>, args: &DownloadArgs) -> AppResult<()> {
    let ids = parse_materials(&args.ids)?;
    let sink = DirectorySink::new(&args.dir);
    let report = ctx.workspace.services.batch.download(&ids, &sink).await?;
    print_report(&report, &format!("Downloaded into {}", args.dir));
    Ok(())
}

/// Resolve tag names to ids, optionally creating missing tags.
pub async fn tag_ids(services: &Services, names: &[String], create: bool) -> AppResult<Vec<TagId>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let tag = match services.tags.find_by_name(name).await? {
            Some(tag) => tag,
            None if create => services.tags.create(name, None).await?,
            None => return Err(AppError::not_found(format!("Tag '{name}' not found"))),
        };
        if !ids.contains(&tag.id) {
            ids.push(tag.id);
        }
    }
    Ok(ids)
}

/// Print the outcome of a batch.
pub fn print_report(report: &BatchReport, success: &str) {
    let done = report.succeeded.len();
    if report.is_success() {
        output::print_success(&format!("{success}: {done} of {} items", report.requested));
    } else {
        output::print_warning(&format!(
            "{done} succeeded, {} failed",
            report.failed.len()
        ));
        for (id, message) in &report.failed {
            output::print_error(&format!("{id}: {message}"));
        }
    }
    for id in &report.missing {
        output::print_warning(&format!("{id}: not found"));
    }
}
