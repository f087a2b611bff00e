//! JSON REST API for Keahlian member uploads and review.
//!
//! Exposes an axum [`Router`] backed by any
//! [`keahlian_core::store::MemberStore`]. Authentication is the caller's
//! responsibility: the embedding server must attach a
//! [`CallerIdentity`] extension to every request it lets through.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", keahlian_api::api_router(store.clone(), settings))
//! ```

pub mod error;
pub mod identity;
pub mod members;
pub mod session;
pub mod settings;
pub mod upload;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use keahlian_core::store::MemberStore;

pub use error::ApiError;
pub use identity::CallerIdentity;
pub use session::StagingStore;
pub use settings::ImportSettings;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub sessions: Arc<StagingStore>,
  pub settings: Arc<ImportSettings>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      sessions: Arc::clone(&self.sessions),
      settings: Arc::clone(&self.settings),
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, settings: ImportSettings) -> Router<()>
where
  S: MemberStore + 'static,
{
  let body_limit = settings.max_upload_bytes;
  let state = ApiState {
    store,
    sessions: Arc::new(StagingStore::new(settings.session_ttl())),
    settings: Arc::new(settings),
  };

  Router::new()
    // Upload
    .route("/members/upload/process", post(upload::process::<S>))
    .route("/members/upload/import", post(upload::import::<S>))
    // Members
    .route("/members", get(members::list::<S>))
    .route("/members/{id}", get(members::get_one::<S>))
    .route("/members/{id}/approve", post(members::approve::<S>))
    .route("/members/{id}/reject", post(members::reject::<S>))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}

// ─── Router tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use keahlian_core::{
    import::ImportResult,
    member::{MemberStatus, PersistedMember},
    upload::ProcessResponse,
  };
  use keahlian_store_sqlite::SqliteStore;
  use serde::de::DeserializeOwned;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  const BOUNDARY: &str = "keahlian-test-boundary";

  const ALI_BOB: &str = "Nama,No IC,Telefon\n\
                         Ali,123456789012,0123456789\n\
                         Ali,123456789012,\n\
                         Bob,999999999999,\n";

  async fn app_with(settings: ImportSettings) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store), settings)
  }

  async fn app() -> Router { app_with(ImportSettings::default()).await }

  fn with_caller(mut req: Request<Body>, caller: Option<&str>) -> Request<Body> {
    if let Some(caller) = caller {
      req.extensions_mut().insert(CallerIdentity(caller.to_string()));
    }
    req
  }

  fn upload_request(filename: &str, contents: &str, caller: Option<&str>) -> Request<Body> {
    let body = format!(
      "--{BOUNDARY}\r\n\
       Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
       Content-Type: text/csv\r\n\r\n\
       {contents}\r\n\
       --{BOUNDARY}--\r\n"
    );
    let req = Request::builder()
      .method("POST")
      .uri("/members/upload/process")
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(body))
      .unwrap();
    with_caller(req, caller)
  }

  fn json_request(method: &str, uri: &str, body: Value, caller: Option<&str>) -> Request<Body> {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    with_caller(req, caller)
  }

  fn empty_request(method: &str, uri: &str, caller: Option<&str>) -> Request<Body> {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .body(Body::empty())
      .unwrap();
    with_caller(req, caller)
  }

  async fn read_json<T: DeserializeOwned>(resp: Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn process(app: &Router, contents: &str) -> ProcessResponse {
    let resp = app
      .clone()
      .oneshot(upload_request("ahli.csv", contents, Some("admin")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    read_json(resp).await
  }

  async fn import(app: &Router, body: Value) -> Response {
    app
      .clone()
      .oneshot(json_request("POST", "/members/upload/import", body, Some("admin")))
      .await
      .unwrap()
  }

  async fn members(app: &Router, query: &str) -> Vec<PersistedMember> {
    let resp = app
      .clone()
      .oneshot(empty_request("GET", &format!("/members{query}"), Some("admin")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    read_json(resp).await
  }

  // ── Process ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn process_flags_batch_duplicates() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;

    assert_eq!(processed.filename, "ahli.csv");
    assert_eq!(processed.total_records, 3);
    assert_eq!(processed.valid_records, 3);
    assert_eq!(processed.duplicates_count, 2);
    let flagged: Vec<u32> = processed.duplicates.iter().map(|d| d.row).collect();
    assert_eq!(flagged, vec![1, 2]);
    assert_eq!(processed.all_data.len(), 3);
    assert_eq!(processed.sample_data.len(), 3);
    assert_eq!(processed.checksum, upload::batch_checksum(&processed.all_data).unwrap());
  }

  #[tokio::test]
  async fn process_does_not_write_members() {
    let app = app().await;
    process(&app, ALI_BOB).await;
    assert!(members(&app, "").await.is_empty());
  }

  #[tokio::test]
  async fn sample_is_a_prefix_of_configured_size() {
    let app = app_with(ImportSettings {
      sample_size: 2,
      ..ImportSettings::default()
    })
    .await;
    let processed = process(&app, ALI_BOB).await;
    assert_eq!(processed.sample_data, processed.all_data[..2].to_vec());
  }

  #[tokio::test]
  async fn process_without_identity_is_unauthorized() {
    let resp = app()
      .await
      .oneshot(upload_request("ahli.csv", ALI_BOB, None))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn process_without_name_column_is_unprocessable() {
    let resp = app()
      .await
      .oneshot(upload_request("ahli.csv", "IC,Phone\n123456789012,0123456789\n", Some("admin")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = read_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("name"));
  }

  #[tokio::test]
  async fn process_rejects_unknown_extension() {
    let resp = app()
      .await
      .oneshot(upload_request("ahli.pdf", ALI_BOB, Some("admin")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  // ── Import ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn import_by_session_skips_excluded_rows() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;

    let resp = import(
      &app,
      json!({ "session_id": processed.session_id, "excluded_rows": [2] }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result: ImportResult = read_json(resp).await;
    assert_eq!(result.successful, 2);
    assert_eq!(result.failed, 0);
    assert_eq!(result.total_processed, 2);

    let pending = members(&app, "?status=pending").await;
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|m| m.uploaded_by == "admin"));
    assert!(pending.iter().all(|m| m.source_file == "ahli.csv"));

    // The session is spent.
    let again = import(&app, json!({ "session_id": processed.session_id })).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn overlapping_imports_commit_a_session_once() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;
    let body = json!({ "session_id": processed.session_id });

    let (first, second) = tokio::join!(import(&app, body.clone()), import(&app, body));
    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);

    assert_eq!(members(&app, "").await.len(), 3);
  }

  #[tokio::test]
  async fn excluding_every_row_processes_nothing() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;

    let resp = import(
      &app,
      json!({
        "all_data": processed.all_data,
        "filename": processed.filename,
        "excluded_rows": [1, 2, 3],
      }),
    )
    .await;
    let result: ImportResult = read_json(resp).await;
    assert_eq!(result, ImportResult::default());
  }

  #[tokio::test]
  async fn short_ic_fails_only_its_own_row() {
    let app = app().await;
    let processed = process(&app, "Name,IC\nAli,850312145671\nShort,12345\nBob,900101015544\n").await;
    assert_eq!(processed.valid_records, 3);

    let resp = import(&app, json!({ "session_id": processed.session_id })).await;
    let result: ImportResult = read_json(resp).await;
    assert_eq!(result.successful, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.errors[0].row, 2);
    assert!(result.errors[0].error.contains("12 digits"));
  }

  #[tokio::test]
  async fn tampered_batch_is_rejected_before_any_write() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;

    let mut tampered = processed.all_data.clone();
    tampered[2].name = "Mallory".into();

    let resp = import(
      &app,
      json!({
        "all_data": tampered,
        "filename": "ahli.csv",
        "checksum": processed.checksum,
      }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(members(&app, "").await.is_empty());
  }

  #[tokio::test]
  async fn round_tripped_batch_with_checksum_imports() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;

    let resp = import(
      &app,
      json!({
        "all_data": processed.all_data,
        "filename": "ahli.csv",
        "checksum": processed.checksum,
      }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result: ImportResult = read_json(resp).await;
    assert_eq!(result.successful, 3);
  }

  #[tokio::test]
  async fn unknown_session_is_not_found() {
    let app = app().await;
    let resp = import(&app, json!({ "session_id": Uuid::new_v4() })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn session_belongs_to_its_uploader() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;

    let resp = app
      .clone()
      .oneshot(json_request(
        "POST",
        "/members/upload/import",
        json!({ "session_id": processed.session_id }),
        Some("someone-else"),
      ))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn import_without_batch_is_bad_request() {
    let app = app().await;
    let resp = import(&app, json!({ "excluded_rows": [] })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn import_without_identity_is_unauthorized() {
    let app = app().await;
    let processed = process(&app, ALI_BOB).await;
    let resp = app
      .clone()
      .oneshot(json_request(
        "POST",
        "/members/upload/import",
        json!({ "all_data": processed.all_data, "filename": "ahli.csv" }),
        None,
      ))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(members(&app, "").await.is_empty());
  }

  // ── Review ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn approve_then_reapprove_conflicts() {
    let app = app().await;
    let processed = process(&app, "Name\nAli\n").await;
    import(&app, json!({ "session_id": processed.session_id })).await;

    let id = members(&app, "").await[0].member_id;

    let resp = app
      .clone()
      .oneshot(empty_request("POST", &format!("/members/{id}/approve"), Some("reviewer")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let approved: PersistedMember = read_json(resp).await;
    assert_eq!(approved.status, MemberStatus::Approved);
    assert_eq!(approved.reviewed_by.as_deref(), Some("reviewer"));

    let resp = app
      .clone()
      .oneshot(empty_request("POST", &format!("/members/{id}/reject"), Some("reviewer")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    assert!(members(&app, "?status=pending").await.is_empty());
    assert_eq!(members(&app, "?status=approved").await.len(), 1);
  }

  #[tokio::test]
  async fn overlapping_reviews_leave_one_decision() {
    let app = app().await;
    let processed = process(&app, "Name\nAli\n").await;
    import(&app, json!({ "session_id": processed.session_id })).await;
    let id = members(&app, "").await[0].member_id;

    let (approve, reject) = tokio::join!(
      app
        .clone()
        .oneshot(empty_request("POST", &format!("/members/{id}/approve"), Some("r1"))),
      app
        .clone()
        .oneshot(empty_request("POST", &format!("/members/{id}/reject"), Some("r2"))),
    );
    let (approve, reject) = (approve.unwrap(), reject.unwrap());

    let mut statuses = [approve.status(), reject.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let winner = if approve.status() == StatusCode::OK { approve } else { reject };
    let decided: PersistedMember = read_json(winner).await;
    let stored = members(&app, "").await;
    assert_eq!(stored[0].status, decided.status);
    assert_eq!(stored[0].reviewed_by, decided.reviewed_by);
  }

  #[tokio::test]
  async fn reject_records_decision() {
    let app = app().await;
    let processed = process(&app, "Name\nAli\n").await;
    import(&app, json!({ "session_id": processed.session_id })).await;
    let id = members(&app, "").await[0].member_id;

    let resp = app
      .clone()
      .oneshot(empty_request("POST", &format!("/members/{id}/reject"), Some("reviewer")))
      .await
      .unwrap();
    let rejected: PersistedMember = read_json(resp).await;
    assert_eq!(rejected.status, MemberStatus::Rejected);
  }

  #[tokio::test]
  async fn unknown_member_is_not_found() {
    let app = app().await;
    let id = Uuid::new_v4();

    let resp = app
      .clone()
      .oneshot(empty_request("GET", &format!("/members/{id}"), Some("admin")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
      .oneshot(empty_request("POST", &format!("/members/{id}/approve"), Some("admin")))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
