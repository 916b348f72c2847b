//! Verb handlers.
//!
//! Layout:
//! - `torrents.rs`: add, get, set, start/stop, move, remove, verify, reannounce, queue
//! - `files.rs` / `peers.rs` / `trackers.rs`: per-torrent sub-entities
//! - `session.rs`: stats, shutdown, free-space, blocklist-update, port-test
//! - `config.rs`: local and remote key/value settings

pub(crate) mod config;
pub(crate) mod files;
pub(crate) mod peers;
pub(crate) mod session;
pub(crate) mod torrents;
pub(crate) mod trackers;

use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::debug;
use transctl_core::{ByteFormat, Torrent, TorrentIds};
use transctl_select::Selector;

use crate::cli::{OutputArgs, SelectArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{Format, RenderOptions, SortOrder};

/// Selection from flags, the context `match` expression, and column renames.
///
/// The flag combination is checked here so it fails before any network I/O.
pub(crate) fn selector(
    ctx: &AppContext,
    args: &SelectArgs,
    renames: &BTreeMap<String, String>,
) -> CliResult<Selector> {
    let settings = ctx.settings()?;
    let selector = Selector::new()
        .with_list(args.list)
        .with_recent(args.recent)
        .with_filter(args.filter.clone())
        .with_identifiers(args.torrents.clone())
        .with_default_match(settings.lookup("match").map(str::to_string))
        .with_renames(renames);
    selector.validate()?;
    Ok(selector)
}

/// Select torrents and return them as a hash list.
pub(crate) async fn select_torrents(ctx: &AppContext, args: &SelectArgs) -> CliResult<Vec<Torrent>> {
    let renames = ctx.settings()?.renames(None)?;
    let selector = selector(ctx, args, &renames)?;
    let provider = ctx.provider().await?;
    Ok(selector.select(provider).await?)
}

/// Hash-addressed ids of the selection; `None` when nothing matched.
pub(crate) async fn select_ids(ctx: &AppContext, args: &SelectArgs) -> CliResult<Option<TorrentIds>> {
    let torrents = select_torrents(ctx, args).await?;
    if torrents.is_empty() {
        debug!("no torrents matched");
        return Ok(None);
    }
    Ok(Some(TorrentIds::hashes(
        torrents.iter().map(|torrent| torrent.hash().to_string()),
    )))
}

/// Exactly one selected torrent's hash, for verbs that address a single torrent.
pub(crate) async fn select_one(ctx: &AppContext, args: &SelectArgs, verb: &str) -> CliResult<String> {
    let torrents = select_torrents(ctx, args).await?;
    match torrents.as_slice() {
        [torrent] => Ok(torrent.hash().to_string()),
        other => Err(CliError::validation(format!(
            "{verb} requires exactly one torrent, {} matched",
            other.len()
        ))),
    }
}

/// Byte rendering for `--human`/`--si` over a verb default.
pub(crate) const fn byte_format(args: &OutputArgs, default_human: bool) -> ByteFormat {
    ByteFormat {
        human: args.human || args.si || default_human,
        iec: !args.si,
        precision: if args.si { 3 } else { 2 },
    }
}

/// Rendering options from flags and the active context.
///
/// `defaults` are display renames applied before the user's `--column-name`.
pub(crate) fn render_options(
    ctx: &AppContext,
    args: &OutputArgs,
    defaults: &[(&str, &str)],
    default_human: bool,
) -> CliResult<RenderOptions> {
    let settings = ctx.settings()?;
    let format = settings
        .resolve_value(args.output.as_deref(), "output")
        .map(|raw| raw.parse::<Format>())
        .transpose()?
        .unwrap_or_default();
    let mut renames: BTreeMap<String, String> = defaults
        .iter()
        .map(|(wire, display)| ((*wire).to_string(), (*display).to_string()))
        .collect();
    renames.extend(settings.renames(args.column_name.as_deref())?);
    let sort_order = args
        .sort_order
        .as_deref()
        .map(SortOrder::from_str)
        .transpose()?;
    Ok(RenderOptions {
        format,
        sort_by: args.sort_by.clone(),
        sort_order,
        renames,
        bytes: byte_format(args, default_human),
        headers: !args.no_headers,
        totals: !args.no_totals,
    })
}

pub(crate) fn emit(out: &mut dyn Write, text: &str) -> CliResult<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

pub(crate) fn emit_line(out: &mut dyn Write, line: impl std::fmt::Display) -> CliResult<()> {
    emit(out, &format!("{line}\n"))
}

/// Parse an enum flag, reporting the daemon-agnostic label error.
pub(crate) fn parse_flag<T: FromStr<Err = String>>(flag: &str, raw: &str) -> CliResult<T> {
    raw.parse()
        .map_err(|err: String| CliError::validation(format!("--{flag}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_uses_three_significant_digits() {
        let si = OutputArgs {
            si: true,
            ..OutputArgs::default()
        };
        assert_eq!(
            byte_format(&si, false),
            ByteFormat {
                human: true,
                iec: false,
                precision: 3
            }
        );
        assert_eq!(byte_format(&OutputArgs::default(), true), ByteFormat::HUMAN);
        assert!(!byte_format(&OutputArgs::default(), false).human);
    }

    #[test]
    fn enum_flags_report_the_flag_name() {
        let err = parse_flag::<transctl_core::Priority>("bandwidth-priority", "urgent")
            .expect_err("not a priority");
        assert_eq!(
            err.display_message(),
            "--bandwidth-priority: unknown Priority 'urgent'"
        );
    }
}
