//! keahlian-server binary.
//!
//! Loads [`ServerConfig`] from `config.toml` (or `--config`) and the
//! environment, opens the SQLite member store and serves the upload API.
//!
//! Add accounts as `[[users]]` entries; `--hash-password` prints the
//! `password_hash` value for one:
//!
//! ```sh
//! cargo run -p keahlian-server -- --hash-password
//! ```

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
  sync::Arc,
};

use anyhow::{Context as _, anyhow};
use clap::Parser;
use keahlian_server::{ServerConfig, auth::hash_password};
use keahlian_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Keahlian member upload server")]
struct Cli {
  /// TOML configuration file; `KEAHLIAN_*` variables override it.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Read a password from stdin, print its argon2 hash and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    print!("Password: ");
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\n', '\r']);
    println!("{}", hash_password(password).map_err(|e| anyhow!("argon2 error: {e}"))?);
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
  if server_cfg.users.is_empty() {
    tracing::warn!("no users configured; every API request will be rejected");
  }

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open member store at {}", store_path.display()))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(
    store = %store_path.display(),
    users = server_cfg.users.len(),
    "serving member uploads on http://{address}"
  );

  let app = keahlian_server::router(Arc::new(store), &server_cfg);
  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
