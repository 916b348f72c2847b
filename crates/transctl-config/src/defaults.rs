//! Names and defaults shared by the CLI and the store.

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "TRANSCONFIG";
/// Environment variable overriding the active context.
pub const CONTEXT_ENV: &str = "TRANSCONTEXT";
/// Environment variable supplying the daemon URL.
pub const URL_ENV: &str = "TRANSURL";

/// Directory under the platform config dir.
pub const APP_DIR: &str = "transctl";
/// File name of the local store.
pub const CONFIG_FILE: &str = "config.ini";

/// Contents written when the file does not exist yet.
pub const DEFAULT_CONFIG: &str = "[default]\n\toutput = table\n";

/// Section holding fallback values.
pub const DEFAULT_SECTION: &str = "default";
/// Section name for named contexts.
pub const CONTEXT_SECTION: &str = "context";
/// Key in `[default]` naming the active context.
pub const CONTEXT_KEY: &str = "context";
