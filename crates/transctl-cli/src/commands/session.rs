//! Daemon-wide verbs.

use std::io::Write;

use transctl_core::{ByteUnit, FreeSpace};

use super::{byte_format, emit, emit_line, render_options};
use crate::cli::{FreeSpaceArgs, StatsArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{FREE_SPACE_COLUMNS, STATS_COLUMNS, render};

pub(crate) async fn handle_stats(ctx: &AppContext, args: StatsArgs, out: &mut dyn Write) -> CliResult<()> {
    let mut options = render_options(ctx, &args.output, &[], true)?;
    options.totals = false;
    let stats = ctx.provider().await?.stats().await?;
    emit(out, &render(&[stats], STATS_COLUMNS, &options)?)
}

pub(crate) async fn handle_shutdown(ctx: &AppContext) -> CliResult<()> {
    ctx.provider().await?.shutdown().await?;
    Ok(())
}

/// Without `--output`, one `path<TAB>size` line per directory; sizes are raw
/// unless `--human` or `--si` is given.
pub(crate) async fn handle_free_space(
    ctx: &AppContext,
    args: FreeSpaceArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let paths = if args.paths.is_empty() {
        ctx.settings()?.list("free-space")
    } else {
        args.paths.clone()
    };
    if paths.is_empty() {
        return Err(CliError::validation(
            "free-space requires a path or a free-space list in the active context",
        ));
    }

    let provider = ctx.provider().await?;
    let mut spaces: Vec<FreeSpace> = Vec::with_capacity(paths.len());
    for path in &paths {
        spaces.push(provider.free_space(path).await?);
    }

    if args.output.output.is_none() {
        let bytes = byte_format(&args.output, false);
        for space in &spaces {
            emit_line(out, format!("{}\t{}", space.path, space.size_bytes.render(bytes)))?;
        }
        return Ok(());
    }
    let options = render_options(ctx, &args.output, &[], false)?;
    emit(out, &render(&spaces, FREE_SPACE_COLUMNS, &options)?)
}

pub(crate) async fn handle_blocklist_update(ctx: &AppContext, out: &mut dyn Write) -> CliResult<()> {
    let rules = ctx.provider().await?.blocklist_update().await?;
    emit_line(out, rules)
}

pub(crate) async fn handle_port_test(ctx: &AppContext, out: &mut dyn Write) -> CliResult<()> {
    let open = ctx.provider().await?.port_test().await?;
    emit_line(out, if open { "open" } else { "closed" })
}
