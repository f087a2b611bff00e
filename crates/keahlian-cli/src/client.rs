//! Async HTTP client wrapping the keahlian JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use keahlian_core::{
  import::ImportResult,
  member::{MemberStatus, PersistedMember},
  upload::{ImportRequest, ProcessResponse},
};
use reqwest::{
  Client, Response,
  multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Connection settings for the keahlian API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the keahlian JSON REST API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(120))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Decode a success body, or turn the server's `{"error": ...}` body into
  /// an error naming `what`.
  async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
      return resp.json().await.with_context(|| format!("deserialising {what}"));
    }
    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_owned))
      .unwrap_or_default();
    Err(anyhow!("{what} → {status} {message}"))
  }

  // ── Upload ────────────────────────────────────────────────────────────────

  /// `POST /api/members/upload/process`
  pub async fn process(&self, filename: &str, data: Vec<u8>) -> Result<ProcessResponse> {
    let form = Form::new().part("file", Part::bytes(data).file_name(filename.to_owned()));
    let resp = self
      .auth(self.client.post(self.url("/members/upload/process")))
      .multipart(form)
      .send()
      .await
      .context("POST /members/upload/process failed")?;
    Self::decode(resp, "process").await
  }

  /// `POST /api/members/upload/import`
  pub async fn import(&self, request: &ImportRequest) -> Result<ImportResult> {
    let resp = self
      .auth(self.client.post(self.url("/members/upload/import")))
      .json(request)
      .send()
      .await
      .context("POST /members/upload/import failed")?;
    Self::decode(resp, "import").await
  }

  // ── Members ───────────────────────────────────────────────────────────────

  /// `GET /api/members[?status=<status>]`
  pub async fn list_members(&self, status: Option<MemberStatus>) -> Result<Vec<PersistedMember>> {
    let mut req = self.auth(self.client.get(self.url("/members")));
    if let Some(status) = status {
      req = req.query(&[("status", status.to_string())]);
    }
    let resp = req.send().await.context("GET /members failed")?;
    Self::decode(resp, "members").await
  }

  /// `POST /api/members/<id>/approve` or `/reject`
  pub async fn review(&self, id: Uuid, decision: MemberStatus) -> Result<PersistedMember> {
    let action = match decision {
      MemberStatus::Approved => "approve",
      MemberStatus::Rejected => "reject",
      MemberStatus::Pending => return Err(anyhow!("a member cannot be moved back to pending")),
    };
    let resp = self
      .auth(self.client.post(self.url(&format!("/members/{id}/{action}"))))
      .send()
      .await
      .with_context(|| format!("POST /members/{id}/{action} failed"))?;
    Self::decode(resp, action).await
  }
}
