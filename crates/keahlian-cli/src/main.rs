//! `keahlian`: command-line client for the Keahlian member upload server.
//!
//! # Usage
//!
//! ```sh
//! keahlian --url http://localhost:8080 --user clerk --password secret process ahli.xlsx
//! keahlian import --session <SESSION_ID> --exclude 2,7
//! keahlian --config ~/.config/keahlian/config.toml pending
//! keahlian approve <MEMBER_ID>
//! ```

mod client;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use keahlian_core::{
  import::ImportResult,
  member::{MemberStatus, PersistedMember},
  upload::{ImportRequest, ProcessResponse},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "keahlian", about = "Upload and review branch member files")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the keahlian server (default: http://localhost:8080).
  #[arg(long, env = "KEAHLIAN_URL", global = true)]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "KEAHLIAN_USER", global = true)]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "KEAHLIAN_PASSWORD", global = true, hide_env_values = true)]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Upload a CSV or Excel file, report duplicates and stage it for import.
  Process {
    file: PathBuf,

    /// Print the full server response as JSON.
    #[arg(long)]
    json: bool,
  },
  /// Import a staged upload.
  Import {
    /// Session id printed by `process`.
    #[arg(long)]
    session: Uuid,

    /// Source rows to skip, e.g. `--exclude 2,7`.
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<u32>,
  },
  /// List members awaiting review.
  Pending,
  /// Approve a pending member.
  Approve { id: Uuid },
  /// Reject a pending member.
  Reject { id: Uuid },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

/// CLI flags override the config file, which overrides defaults.
fn resolve_config(args: &Args, file_cfg: ConfigFile) -> ApiConfig {
  fn pick(flag: &Option<String>, file: String) -> Option<String> {
    flag.clone().or_else(|| (!file.is_empty()).then_some(file))
  }

  ApiConfig {
    base_url: pick(&args.url, file_cfg.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
    username: pick(&args.user, file_cfg.username).unwrap_or_default(),
    password: pick(&args.password, file_cfg.password).unwrap_or_default(),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let api_config = resolve_config(&args, file_cfg);
  tracing::debug!(url = %api_config.base_url, user = %api_config.username, "connecting");
  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::Process { file, json } => {
      let data = tokio::fs::read(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
      let processed = client.process(&file_name(&file), data).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
      } else {
        print_process(&processed);
      }
    }
    Command::Import { session, exclude } => {
      let request = ImportRequest {
        session_id: Some(session),
        excluded_rows: exclude,
        ..ImportRequest::default()
      };
      print_import(&client.import(&request).await?);
    }
    Command::Pending => {
      print_members(&client.list_members(Some(MemberStatus::Pending)).await?);
    }
    Command::Approve { id } => {
      let member = client.review(id, MemberStatus::Approved).await?;
      println!("{} ({}) is now {}", member.record.name, member.member_id, member.status);
    }
    Command::Reject { id } => {
      let member = client.review(id, MemberStatus::Rejected).await?;
      println!("{} ({}) is now {}", member.record.name, member.member_id, member.status);
    }
  }

  Ok(())
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_process(p: &ProcessResponse) {
  println!("{}: {} rows, {} valid", p.filename, p.total_records, p.valid_records);

  for e in &p.errors {
    println!("  row {:>4}  invalid: {}", e.row, e.reason);
  }

  if p.duplicates.is_empty() {
    println!("no duplicates found");
  } else {
    println!("{} possible duplicates:", p.duplicates_count);
    for d in &p.duplicates {
      let mut seen = Vec::new();
      for m in &d.database_duplicates {
        seen.push(format!("member {} ({}, {})", m.name, m.status, fields(&m.matched_on)));
      }
      for m in &d.import_duplicates {
        seen.push(format!("row {} ({})", m.row, fields(&m.matched_on)));
      }
      println!("  row {:>4}  {}  ~ {}", d.row, d.name, seen.join("; "));
    }
  }

  println!();
  println!("session: {}", p.session_id);
  println!("import with: keahlian import --session {} [--exclude ROWS]", p.session_id);
}

fn fields(matched_on: &[keahlian_core::duplicate::MatchField]) -> String {
  matched_on
    .iter()
    .map(|f| format!("{f:?}").to_lowercase())
    .collect::<Vec<_>>()
    .join("+")
}

fn print_import(r: &ImportResult) {
  println!(
    "imported {} of {} processed rows ({} failed)",
    r.successful, r.total_processed, r.failed
  );
  for e in &r.errors {
    println!("  row {:>4}  {}", e.row, e.error);
  }
}

fn print_members(members: &[PersistedMember]) {
  if members.is_empty() {
    println!("no members");
    return;
  }
  for m in members {
    println!(
      "{}  {:<30} {:<12} {:<11} {}",
      m.member_id, m.record.name, m.record.ic_no, m.record.phone, m.uploaded_by
    );
  }
}
