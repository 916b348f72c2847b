//! Torrent-level verbs.

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use tracing::{debug, info};
use transctl_core::{
    AddTorrent, Limit, Mode, Priority, QueueMove, Torrent, TorrentChanges, TorrentIds,
    TorrentSource,
};

use super::{emit, emit_line, parse_flag, render_options, select_ids, selector};
use crate::cli::{
    AddArgs, GetArgs, MoveArgs, QueueCommand, RemoveArgs, SelectArgs, SetArgs, StartArgs,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{TORRENT_COLUMNS, TORRENT_RENAMES, render};

/// Verbs that take nothing but a selection.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    Stop,
    Verify,
    Reannounce,
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    ["magnet:", "http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

async fn read_source(source: &str) -> CliResult<TorrentSource> {
    if is_remote(source) {
        return Ok(TorrentSource::Url(source.to_string()));
    }
    let path = Path::new(source);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {source}"))
        .map_err(CliError::failure)?;
    let name = path
        .file_name()
        .map_or_else(|| source.to_string(), |name| name.to_string_lossy().into_owned());
    Ok(TorrentSource::File { name, bytes })
}

pub(crate) async fn handle_add(ctx: &AppContext, args: AddArgs, out: &mut dyn Write) -> CliResult<()> {
    let bandwidth_priority = args
        .bandwidth_priority
        .as_deref()
        .map(|raw| parse_flag::<Priority>("bandwidth-priority", raw))
        .transpose()?;

    let mut requests = Vec::with_capacity(args.sources.len());
    for source in &args.sources {
        let mut request = AddTorrent::new(read_source(source).await?);
        request.download_dir.clone_from(&args.download_dir);
        request.paused = args.paused;
        request.labels.clone_from(&args.labels);
        request.peer_limit = args.peer_limit;
        request.bandwidth_priority = bandwidth_priority;
        requests.push((source, request));
    }

    let provider = ctx.provider().await?;
    for (source, request) in requests {
        let local = matches!(request.source, TorrentSource::File { .. });
        let added = provider.add(request).await?;
        info!(source = %source, hash = %added.hash_string, duplicate = added.duplicate, "torrent added");
        emit_line(out, &added)?;
        if args.rm && local {
            tokio::fs::remove_file(source)
                .await
                .with_context(|| format!("failed to remove {source}"))
                .map_err(CliError::failure)?;
        }
    }
    Ok(())
}

pub(crate) async fn handle_get(ctx: &AppContext, args: GetArgs, out: &mut dyn Write) -> CliResult<()> {
    let options = render_options(ctx, &args.output, TORRENT_RENAMES, true)?;
    let selector = selector(ctx, &args.select, &options.renames)?;
    let fields = options.wire_fields::<Torrent>(TORRENT_COLUMNS)?;

    let provider = ctx.provider().await?;
    let selected = selector.select(provider).await?;
    let torrents = if selected.is_empty() {
        Vec::new()
    } else {
        let ids = TorrentIds::hashes(selected.iter().map(|torrent| torrent.hash().to_string()));
        debug!(count = selected.len(), ?fields, "fetching output columns");
        provider.get(&ids, &fields).await?
    };
    emit(out, &render(&torrents, TORRENT_COLUMNS, &options)?)
}

fn limit_changes(raw: Option<i64>) -> (Option<Limit>, Option<bool>) {
    match raw {
        None => (None, None),
        Some(value) if value < 0 => (None, Some(false)),
        Some(value) => (Some(Limit(value)), Some(true)),
    }
}

pub(crate) fn changes(args: &SetArgs) -> CliResult<TorrentChanges> {
    let mode = |flag: &str, raw: Option<&str>| {
        raw.map(|raw| parse_flag::<Mode>(flag, raw)).transpose()
    };
    let (download_limit, download_limited) = limit_changes(args.download_limit);
    let (upload_limit, upload_limited) = limit_changes(args.upload_limit);
    let changes = TorrentChanges {
        bandwidth_priority: args
            .bandwidth_priority
            .as_deref()
            .map(|raw| parse_flag::<Priority>("bandwidth-priority", raw))
            .transpose()?,
        download_limit,
        download_limited,
        upload_limit,
        upload_limited,
        honors_session_limits: args.honor_session_limits,
        seed_ratio_limit: args.seed_ratio_limit,
        seed_ratio_mode: mode("seed-ratio-mode", args.seed_ratio_mode.as_deref())?,
        seed_idle_limit: args.seed_idle_limit,
        seed_idle_mode: mode("seed-idle-mode", args.seed_idle_mode.as_deref())?,
        peer_limit: args.peer_limit,
        queue_position: args.queue_position,
        labels: args.labels.as_deref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect()
        }),
    };
    if changes.is_empty() {
        return Err(CliError::validation("set requires at least one setting to change"));
    }
    Ok(changes)
}

pub(crate) async fn handle_set(ctx: &AppContext, args: SetArgs) -> CliResult<()> {
    let changes = changes(&args)?;
    let Some(ids) = select_ids(ctx, &args.select).await? else {
        return Ok(());
    };
    ctx.provider().await?.set(&ids, &changes).await?;
    Ok(())
}

pub(crate) async fn handle_start(ctx: &AppContext, args: StartArgs) -> CliResult<()> {
    let Some(ids) = select_ids(ctx, &args.select).await? else {
        return Ok(());
    };
    ctx.provider().await?.start(&ids, args.now).await?;
    Ok(())
}

pub(crate) async fn handle_action(ctx: &AppContext, args: SelectArgs, action: Action) -> CliResult<()> {
    let Some(ids) = select_ids(ctx, &args).await? else {
        return Ok(());
    };
    let provider = ctx.provider().await?;
    match action {
        Action::Stop => provider.stop(&ids).await?,
        Action::Verify => provider.verify(&ids).await?,
        Action::Reannounce => provider.reannounce(&ids).await?,
    }
    Ok(())
}

pub(crate) async fn handle_move(ctx: &AppContext, args: MoveArgs) -> CliResult<()> {
    let Some(ids) = select_ids(ctx, &args.select).await? else {
        return Ok(());
    };
    ctx.provider()
        .await?
        .move_location(&ids, &args.dest, !args.no_move)
        .await?;
    Ok(())
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: RemoveArgs) -> CliResult<()> {
    let Some(ids) = select_ids(ctx, &args.select).await? else {
        return Ok(());
    };
    ctx.provider()
        .await?
        .remove(&ids, args.delete_local_data)
        .await?;
    Ok(())
}

pub(crate) async fn handle_queue(ctx: &AppContext, command: QueueCommand) -> CliResult<()> {
    let (args, direction) = match command {
        QueueCommand::Top(args) => (args, QueueMove::Top),
        QueueCommand::Bottom(args) => (args, QueueMove::Bottom),
        QueueCommand::Up(args) => (args, QueueMove::Up),
        QueueCommand::Down(args) => (args, QueueMove::Down),
    };
    let Some(ids) = select_ids(ctx, &args).await? else {
        return Ok(());
    };
    ctx.provider().await?.queue_move(&ids, direction).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_sources_are_detected() {
        assert!(is_remote("magnet:?xt=urn:btih:abc"));
        assert!(is_remote("HTTPS://example.org/a.torrent"));
        assert!(!is_remote("./debian.torrent"));
    }

    #[test]
    fn negative_limits_clear_the_limit() -> CliResult<()> {
        let args = SetArgs {
            download_limit: Some(-1),
            upload_limit: Some(250),
            labels: Some("linux, iso,".into()),
            seed_ratio_mode: Some("unlimited".into()),
            ..SetArgs::default()
        };
        let changes = changes(&args)?;
        assert_eq!(changes.download_limit, None);
        assert_eq!(changes.download_limited, Some(false));
        assert_eq!(changes.upload_limit, Some(Limit(250)));
        assert_eq!(changes.upload_limited, Some(true));
        assert_eq!(changes.labels, Some(vec!["linux".to_string(), "iso".to_string()]));
        assert_eq!(changes.seed_ratio_mode, Some(Mode::Unlimited));
        Ok(())
    }

    #[test]
    fn empty_changes_are_rejected() {
        let err = changes(&SetArgs::default()).expect_err("nothing to change");
        assert!(matches!(err, CliError::Validation(_)));
    }
}
