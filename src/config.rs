//! Runtime configuration.
//!
//! Parsed once in `main` from command-line flags, falling back to environment
//! variables and then to built-in defaults, and handed to the pieces that need
//! it. Nothing reads configuration from ambient state.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_ADMIN_PASSWORD: &str = "1234";
pub const DEFAULT_ARTICLES_DIR: &str = "articulos";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Settings for the bitacora server.
#[derive(Debug, Clone, Parser)]
#[command(name = "bitacora", version, about = "Small file-backed blog server")]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "BITACORA_ADDR", default_value = DEFAULT_ADDR, value_name = "HOST:PORT")]
    pub addr: SocketAddr,

    /// Shared secret required by the create and edit forms.
    #[arg(
        long = "admin-password",
        env = "BITACORA_ADMIN_PASSWORD",
        default_value = DEFAULT_ADMIN_PASSWORD,
        hide_env_values = true,
        hide_default_value = true
    )]
    pub admin_password: String,

    /// Directory holding one JSON record per article. Created if missing.
    #[arg(long = "articles-dir", env = "BITACORA_ARTICLES_DIR", default_value = DEFAULT_ARTICLES_DIR, value_name = "PATH")]
    pub articles_dir: PathBuf,

    /// Log filter directives, e.g. `info` or `bitacora=debug,hyper=warn`.
    #[arg(long = "log", env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER, value_name = "FILTER")]
    pub log_filter: String,
}
