//! `peers get`.

use std::io::Write;

use super::{emit, render_options, select_ids};
use crate::cli::GetArgs;
use crate::client::{AppContext, CliResult};
use crate::output::{PEER_COLUMNS, render};

pub(crate) async fn handle_get(ctx: &AppContext, args: GetArgs, out: &mut dyn Write) -> CliResult<()> {
    let options = render_options(ctx, &args.output, &[], true)?;
    let peers = match select_ids(ctx, &args.select).await? {
        Some(ids) => ctx.provider().await?.peers_get(&ids).await?,
        None => Vec::new(),
    };
    emit(out, &render(&peers, PEER_COLUMNS, &options)?)
}
