//! `config`: key/value access to the local file or the daemon's settings.

use std::io::Write;

use anyhow::anyhow;
use transctl_config::LocalConfig;
use transctl_core::ConfigStore;

use super::emit_line;
use crate::cli::ConfigArgs;
use crate::client::{AppContext, CliError, CliResult};

pub(crate) async fn handle(ctx: &AppContext, args: ConfigArgs, out: &mut dyn Write) -> CliResult<()> {
    validate(&args)?;
    if args.remote {
        let mut store = ctx.provider().await?.remote_config().await?;
        apply(store.as_mut(), &args, out).await
    } else {
        let mut store = LocalConfig::open(ctx.config.path()).await?;
        apply(&mut store, &args, out).await
    }
}

fn validate(args: &ConfigArgs) -> CliResult<()> {
    match (args.unset, args.list, args.args.len()) {
        (true, false, 1) | (false, false, 0..=2) | (false, true, 0) => Ok(()),
        (true, _, _) => Err(CliError::validation("config --unset takes exactly one KEY")),
        (false, true, _) => Err(CliError::validation("config --list takes no arguments")),
        (false, false, _) => Err(CliError::validation("config takes at most KEY and VALUE")),
    }
}

async fn apply(store: &mut dyn ConfigStore, args: &ConfigArgs, out: &mut dyn Write) -> CliResult<()> {
    match args.args.as_slice() {
        [key] if args.unset => {
            store.unset(key).await.map_err(CliError::failure)?;
            store.write().await.map_err(CliError::failure)
        }
        [] => {
            for (key, value) in store.keys().await.map_err(CliError::failure)? {
                emit_line(out, format!("{key}={value}"))?;
            }
            Ok(())
        }
        [key] => match store.get(key).await.map_err(CliError::failure)? {
            Some(value) => emit_line(out, value),
            None => Err(CliError::failure(anyhow!("{key} is not set"))),
        },
        [key, value] => {
            store.set(key, value).await.map_err(CliError::failure)?;
            store.write().await.map_err(CliError::failure)
        }
        _ => Err(CliError::validation("config takes at most KEY and VALUE")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(unset: bool, list: bool, values: &[&str]) -> ConfigArgs {
        ConfigArgs {
            remote: false,
            unset,
            list,
            args: values.iter().map(|value| (*value).to_string()).collect(),
        }
    }

    #[test]
    fn argument_shapes_are_checked() {
        assert!(validate(&args(false, false, &[])).is_ok());
        assert!(validate(&args(false, true, &[])).is_ok());
        assert!(validate(&args(false, false, &["a", "b"])).is_ok());
        assert!(validate(&args(true, false, &["a"])).is_ok());
        assert!(validate(&args(true, false, &[])).is_err());
        assert!(validate(&args(true, true, &["a"])).is_err());
        assert!(validate(&args(false, true, &["a"])).is_err());
        assert!(validate(&args(false, false, &["a", "b", "c"])).is_err());
    }

    #[tokio::test]
    async fn local_store_round_trips_through_the_file() -> CliResult<()> {
        let dir = tempfile::tempdir().map_err(CliError::failure)?;
        let path = dir.path().join("config.ini");
        let mut store = LocalConfig::open(&path).await?;
        let mut out = Vec::new();
        apply(&mut store, &args(false, false, &["default.human", "true"]), &mut out).await?;

        let mut reopened = LocalConfig::open(&path).await?;
        apply(&mut reopened, &args(false, false, &["default.human"]), &mut out).await?;
        assert_eq!(String::from_utf8_lossy(&out), "true\n");

        let err = apply(&mut reopened, &args(false, false, &["default.missing"]), &mut out)
            .await
            .expect_err("unset key");
        assert_eq!(err.display_message(), "default.missing is not set");
        Ok(())
    }
}
