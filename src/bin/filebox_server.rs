//!
//! filebox server binary
//! ---------------------
//! Command-line entry point for serving a filebox directory over HTTP.
//! Supports configuration via a JSON file, environment variables and CLI flags.

use anyhow::Result;
use std::env;

use filebox::config::FileboxConfig;

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("filebox Server\n\nUSAGE:\n  filebox_server [--config PATH] [--base-dir PATH] [--mount PREFIX] [--http-port N] [--login-url URL] [--role NAME]...\n\nOPTIONS:\n  --config PATH       JSON config file (env: FILEBOX_CONFIG)\n  --base-dir PATH     Directory to serve (env: FILEBOX_BASE_DIR, default filebox)\n  --mount PREFIX      URL prefix (env: FILEBOX_MOUNT, default /downloads)\n  --http-port N       HTTP port (env: FILEBOX_HTTP_PORT, default 7878)\n  --login-url URL     Enable trusted-header auth and redirect denied users here (env: FILEBOX_LOGIN_URL)\n  --role NAME         Register a role matched against the x-remote-roles header (with header auth); repeatable\n");
        return Ok(());
    }

    let cfg = FileboxConfig::load(&args, |k| env::var(k).ok())?;
    tracing::info!(
        "Using http_port={}, base_dir={}, mount={}",
        cfg.http_port, cfg.base_dir, cfg.mount_to
    );
    filebox::server::run(cfg).await
}
