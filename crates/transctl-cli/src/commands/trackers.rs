//! `trackers` verbs.

use std::io::Write;

use super::{emit, render_options, select_ids, select_one};
use crate::cli::{GetArgs, TrackersCommand};
use crate::client::{AppContext, CliResult};
use crate::output::{TRACKER_COLUMNS, render};

pub(crate) async fn handle(ctx: &AppContext, command: TrackersCommand, out: &mut dyn Write) -> CliResult<()> {
    match command {
        TrackersCommand::Get(args) => handle_get(ctx, args, out).await,
        TrackersCommand::Add(args) => {
            let Some(ids) = select_ids(ctx, &args.select).await? else {
                return Ok(());
            };
            ctx.provider().await?.trackers_add(&ids, &args.urls).await?;
            Ok(())
        }
        TrackersCommand::Replace(args) => {
            let hash = select_one(ctx, &args.select, "trackers replace").await?;
            ctx.provider()
                .await?
                .trackers_replace(&hash, args.id, &args.url)
                .await?;
            Ok(())
        }
        TrackersCommand::Remove(args) => {
            let hash = select_one(ctx, &args.select, "trackers remove").await?;
            ctx.provider()
                .await?
                .trackers_remove(&hash, &args.ids)
                .await?;
            Ok(())
        }
    }
}

async fn handle_get(ctx: &AppContext, args: GetArgs, out: &mut dyn Write) -> CliResult<()> {
    let options = render_options(ctx, &args.output, &[], true)?;
    let trackers = match select_ids(ctx, &args.select).await? {
        Some(ids) => ctx.provider().await?.trackers_get(&ids).await?,
        None => Vec::new(),
    };
    emit(out, &render(&trackers, TRACKER_COLUMNS, &options)?)
}
