//! `files` verbs.

use std::io::Write;

use transctl_core::{FileChanges, FilePriority};

use super::{emit, parse_flag, render_options, select_ids, select_one};
use crate::cli::{FileSelectArgs, FilesCommand, GetArgs};
use crate::client::{AppContext, CliResult};
use crate::output::{FILE_COLUMNS, render};

pub(crate) async fn handle(ctx: &AppContext, command: FilesCommand, out: &mut dyn Write) -> CliResult<()> {
    match command {
        FilesCommand::Get(args) => handle_get(ctx, args, out).await,
        FilesCommand::SetPriority(args) => {
            let priority = parse_flag::<FilePriority>("priority", &args.priority)?;
            apply(ctx, args.files, None, Some(priority)).await
        }
        FilesCommand::SetWanted(args) => apply(ctx, args, Some(true), None).await,
        FilesCommand::SetUnwanted(args) => apply(ctx, args, Some(false), None).await,
        FilesCommand::Rename(args) => {
            let hash = select_one(ctx, &args.select, "files rename").await?;
            ctx.provider()
                .await?
                .files_rename(&hash, &args.path, &args.name)
                .await?;
            Ok(())
        }
    }
}

async fn handle_get(ctx: &AppContext, args: GetArgs, out: &mut dyn Write) -> CliResult<()> {
    let options = render_options(ctx, &args.output, &[], true)?;
    let files = match select_ids(ctx, &args.select).await? {
        Some(ids) => ctx.provider().await?.files_get(&ids).await?,
        None => Vec::new(),
    };
    emit(out, &render(&files, FILE_COLUMNS, &options)?)
}

async fn apply(
    ctx: &AppContext,
    args: FileSelectArgs,
    wanted: Option<bool>,
    priority: Option<FilePriority>,
) -> CliResult<()> {
    let Some(ids) = select_ids(ctx, &args.select).await? else {
        return Ok(());
    };
    let changes = FileChanges {
        indices: args.files,
        priority,
        wanted,
    };
    ctx.provider().await?.files_set(&ids, &changes).await?;
    Ok(())
}
