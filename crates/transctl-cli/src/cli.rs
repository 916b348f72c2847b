//! Command-line surface and dispatch.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use transctl_config::{CONFIG_ENV, CONTEXT_ENV, URL_ENV};
use transctl_telemetry::{LogFormat, LoggingConfig, init_logging};

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::{config, files, peers, session, torrents, trackers};

/// Parse the process arguments, run the command against stdout, and return
/// the exit code.
pub async fn run() -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(std::env::args_os(), &mut out).await
}

/// Run one invocation with explicit arguments, writing results to `out`.
///
/// Errors are reported on standard error prefixed with `error: `.
pub async fn run_with<I, T>(args: I, out: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                return match write!(out, "{}", err.render()) {
                    Ok(()) => 0,
                    Err(_) => 1,
                };
            }
            eprint!("{}", err.render());
            return 1;
        }
    };

    match execute(cli, out).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli, out: &mut dyn Write) -> CliResult<()> {
    let mut logging = LoggingConfig::from_verbosity(cli.globals.verbose);
    if let Some(format) = &cli.globals.log_format {
        logging.format = format
            .parse::<LogFormat>()
            .map_err(|err| CliError::validation(err.to_string()))?;
    }
    init_logging(&logging).map_err(CliError::failure)?;

    let ctx = AppContext::load(cli.globals).await?;
    dispatch(&ctx, cli.command, out).await
}

async fn dispatch(ctx: &AppContext, command: Command, out: &mut dyn Write) -> CliResult<()> {
    match command {
        Command::Config(args) => config::handle(ctx, args, out).await,
        Command::Add(args) => torrents::handle_add(ctx, args, out).await,
        Command::Get(args) => torrents::handle_get(ctx, args, out).await,
        Command::Set(args) => torrents::handle_set(ctx, args).await,
        Command::Start(args) => torrents::handle_start(ctx, args).await,
        Command::Stop(args) => torrents::handle_action(ctx, args, torrents::Action::Stop).await,
        Command::Verify(args) => torrents::handle_action(ctx, args, torrents::Action::Verify).await,
        Command::Reannounce(args) => {
            torrents::handle_action(ctx, args, torrents::Action::Reannounce).await
        }
        Command::Move(args) => torrents::handle_move(ctx, args).await,
        Command::Remove(args) => torrents::handle_remove(ctx, args).await,
        Command::Queue(queue) => torrents::handle_queue(ctx, queue).await,
        Command::Peers(PeersCommand::Get(args)) => peers::handle_get(ctx, args, out).await,
        Command::Files(command) => files::handle(ctx, command, out).await,
        Command::Trackers(command) => trackers::handle(ctx, command, out).await,
        Command::Stats(args) => session::handle_stats(ctx, args, out).await,
        Command::Shutdown => session::handle_shutdown(ctx).await,
        Command::FreeSpace(args) => session::handle_free_space(ctx, args, out).await,
        Command::BlocklistUpdate => session::handle_blocklist_update(ctx, out).await,
        Command::PortTest => session::handle_port_test(ctx, out).await,
    }
}

#[derive(Parser)]
#[command(
    name = "transctl",
    version,
    about = "Control Transmission and qBittorrent daemons"
)]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Flags accepted by every verb.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct GlobalArgs {
    /// Config file path.
    #[arg(long, global = true, env = CONFIG_ENV, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// Active context name.
    #[arg(long, global = true, env = CONTEXT_ENV)]
    pub(crate) context: Option<String>,
    /// Daemon URL.
    #[arg(long, global = true, env = URL_ENV)]
    pub(crate) url: Option<String>,
    /// Daemon `host[:port]`, overriding the URL host.
    #[arg(long, global = true)]
    pub(crate) host: Option<String>,
    /// URL scheme, overriding the URL scheme.
    #[arg(long, global = true)]
    pub(crate) proto: Option<String>,
    /// RPC path, overriding the URL path.
    #[arg(long, global = true)]
    pub(crate) rpc_path: Option<String>,
    /// Credentials as `user[:password]`; prompts when the password is missing.
    #[arg(long, global = true)]
    pub(crate) user: Option<String>,
    /// Do not consult the netrc file.
    #[arg(long, global = true)]
    pub(crate) no_netrc: bool,
    /// Alternate netrc file.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) netrc_file: Option<PathBuf>,
    /// Per-request timeout (`25`, `25s`, `500ms`, `2m`).
    #[arg(long, global = true)]
    pub(crate) timeout: Option<String>,
    /// Increase log verbosity.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub(crate) verbose: u8,
    /// Log format: `pretty` or `json`.
    #[arg(long, global = true)]
    pub(crate) log_format: Option<String>,
}

/// Torrent selection flags.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct SelectArgs {
    /// Every torrent.
    #[arg(short, long)]
    pub(crate) list: bool,
    /// Recently active torrents.
    #[arg(long)]
    pub(crate) recent: bool,
    /// Filter expression evaluated per torrent.
    #[arg(short, long)]
    pub(crate) filter: Option<String>,
    /// Ids, name globs, or hash prefixes.
    #[arg(value_name = "TORRENT")]
    pub(crate) torrents: Vec<String>,
}

/// Rendering flags.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct OutputArgs {
    /// `table`, `wide`, `all`, `table=COL,...`, `json`, `yaml` or `flat`.
    #[arg(short, long)]
    pub(crate) output: Option<String>,
    /// Human-readable sizes with 1024-based units.
    #[arg(long)]
    pub(crate) human: bool,
    /// Human-readable sizes with 1000-based units.
    #[arg(long)]
    pub(crate) si: bool,
    /// Omit the header row.
    #[arg(long)]
    pub(crate) no_headers: bool,
    /// Omit the totals row.
    #[arg(long)]
    pub(crate) no_totals: bool,
    /// Column renames as `wire=Display,...`.
    #[arg(long)]
    pub(crate) column_name: Option<String>,
    /// Column to sort by.
    #[arg(long)]
    pub(crate) sort_by: Option<String>,
    /// `asc` or `desc`.
    #[arg(long)]
    pub(crate) sort_order: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Read or change local or daemon settings.
    Config(ConfigArgs),
    /// Add torrents from files, URLs, or magnet links.
    Add(AddArgs),
    /// Show torrents.
    Get(GetArgs),
    /// Change per-torrent settings.
    Set(SetArgs),
    /// Start torrents.
    Start(StartArgs),
    /// Stop torrents.
    Stop(SelectArgs),
    /// Move torrent data.
    Move(MoveArgs),
    /// Remove torrents.
    Remove(RemoveArgs),
    /// Re-check torrent data.
    Verify(SelectArgs),
    /// Ask trackers for more peers.
    Reannounce(SelectArgs),
    /// Reorder the download queue.
    #[command(subcommand)]
    Queue(QueueCommand),
    /// Inspect peers.
    #[command(subcommand)]
    Peers(PeersCommand),
    /// Inspect and change files.
    #[command(subcommand)]
    Files(FilesCommand),
    /// Inspect and change trackers.
    #[command(subcommand)]
    Trackers(TrackersCommand),
    /// Session transfer statistics.
    Stats(StatsArgs),
    /// Stop the daemon.
    Shutdown,
    /// Free space in download directories.
    FreeSpace(FreeSpaceArgs),
    /// Refresh the peer blocklist.
    BlocklistUpdate,
    /// Check whether the peer port is reachable.
    PortTest,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConfigArgs {
    /// Operate on the daemon's settings.
    #[arg(long)]
    pub(crate) remote: bool,
    /// Remove the key.
    #[arg(long)]
    pub(crate) unset: bool,
    /// List every key.
    #[arg(long)]
    pub(crate) list: bool,
    /// `KEY [VALUE]`.
    #[arg(value_name = "KEY")]
    pub(crate) args: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct AddArgs {
    /// Torrent files, URLs, or magnet links.
    #[arg(required = true)]
    pub(crate) sources: Vec<String>,
    #[arg(long)]
    pub(crate) download_dir: Option<String>,
    /// Add without starting.
    #[arg(long)]
    pub(crate) paused: bool,
    /// Comma-separated labels.
    #[arg(long, value_delimiter = ',')]
    pub(crate) labels: Vec<String>,
    #[arg(long)]
    pub(crate) peer_limit: Option<i64>,
    /// `low`, `normal` or `high`.
    #[arg(long)]
    pub(crate) bandwidth_priority: Option<String>,
    /// Delete local torrent files once added.
    #[arg(long)]
    pub(crate) rm: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct GetArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct SetArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// `low`, `normal` or `high`.
    #[arg(long)]
    pub(crate) bandwidth_priority: Option<String>,
    /// kB/s; negative removes the limit.
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) download_limit: Option<i64>,
    /// kB/s; negative removes the limit.
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) upload_limit: Option<i64>,
    #[arg(long)]
    pub(crate) honor_session_limits: Option<bool>,
    #[arg(long)]
    pub(crate) seed_ratio_limit: Option<f64>,
    /// `global`, `single` or `unlimited`.
    #[arg(long)]
    pub(crate) seed_ratio_mode: Option<String>,
    /// Minutes.
    #[arg(long)]
    pub(crate) seed_idle_limit: Option<i64>,
    /// `global`, `single` or `unlimited`.
    #[arg(long)]
    pub(crate) seed_idle_mode: Option<String>,
    #[arg(long)]
    pub(crate) peer_limit: Option<i64>,
    #[arg(long)]
    pub(crate) queue_position: Option<i64>,
    /// Replacement labels, comma-separated; empty clears them.
    #[arg(long)]
    pub(crate) labels: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct StartArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// Bypass the queue.
    #[arg(long)]
    pub(crate) now: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct MoveArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// New location.
    #[arg(long, required = true, value_name = "PATH")]
    pub(crate) dest: String,
    /// Point at the new location without moving data.
    #[arg(long)]
    pub(crate) no_move: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct RemoveArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// Also delete downloaded data.
    #[arg(long)]
    pub(crate) delete_local_data: bool,
}

#[derive(Subcommand)]
pub(crate) enum QueueCommand {
    /// Move to the front of the queue.
    Top(SelectArgs),
    /// Move to the back of the queue.
    Bottom(SelectArgs),
    /// Move one position forward.
    Up(SelectArgs),
    /// Move one position back.
    Down(SelectArgs),
}

#[derive(Subcommand)]
pub(crate) enum PeersCommand {
    /// List connected peers.
    Get(GetArgs),
}

#[derive(Subcommand)]
pub(crate) enum FilesCommand {
    /// List files.
    Get(GetArgs),
    /// Change download priority.
    SetPriority(FilePriorityArgs),
    /// Select files for download.
    SetWanted(FileSelectArgs),
    /// Skip files.
    SetUnwanted(FileSelectArgs),
    /// Rename a file or directory inside one torrent.
    Rename(FileRenameArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FileSelectArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// File indices; every file when omitted.
    #[arg(long = "file", value_delimiter = ',')]
    pub(crate) files: Vec<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FilePriorityArgs {
    #[command(flatten)]
    pub(crate) files: FileSelectArgs,
    /// `low`, `normal` or `high`.
    #[arg(long, required = true)]
    pub(crate) priority: String,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FileRenameArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// Current path inside the torrent.
    #[arg(long, required = true)]
    pub(crate) path: String,
    /// New final path component.
    #[arg(long, required = true)]
    pub(crate) name: String,
}

#[derive(Subcommand)]
pub(crate) enum TrackersCommand {
    /// List trackers.
    Get(GetArgs),
    /// Add announce URLs.
    Add(TrackerAddArgs),
    /// Replace one tracker's announce URL.
    Replace(TrackerReplaceArgs),
    /// Remove trackers by id.
    Remove(TrackerRemoveArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct TrackerAddArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// Announce URLs.
    #[arg(long = "announce", required = true, value_name = "URL")]
    pub(crate) urls: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct TrackerReplaceArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    /// Tracker id as listed by `trackers get`.
    #[arg(long, required = true)]
    pub(crate) id: i64,
    /// Replacement announce URL.
    #[arg(long = "announce", required = true, value_name = "URL")]
    pub(crate) url: String,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct TrackerRemoveArgs {
    #[command(flatten)]
    pub(crate) select: SelectArgs,
    #[arg(long = "id", required = true, value_delimiter = ',')]
    pub(crate) ids: Vec<i64>,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct StatsArgs {
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FreeSpaceArgs {
    /// Directories to query; the context's `free-space` list when omitted.
    pub(crate) paths: Vec<String>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn globals_work_after_the_verb() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "transctl", "get", "--list", "--url", "http://nas:9091/", "-vv", "-o", "json",
        ])?;
        assert_eq!(cli.globals.url.as_deref(), Some("http://nas:9091/"));
        assert_eq!(cli.globals.verbose, 2);
        let Command::Get(args) = cli.command else {
            panic!("get parsed");
        };
        assert!(args.select.list);
        assert_eq!(args.output.output.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn negative_limits_parse() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["transctl", "set", "3", "--download-limit", "-1"])?;
        let Command::Set(args) = cli.command else {
            panic!("set parsed");
        };
        assert_eq!(args.download_limit, Some(-1));
        assert_eq!(args.select.torrents, vec!["3".to_string()]);
        Ok(())
    }
}
