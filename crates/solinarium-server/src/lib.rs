//! HTTP server assembly for Solinarium.
//!
//! Wraps the JSON API from `solinarium-api` with a health check and request
//! tracing, and defines the runtime configuration the binary reads.

pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, http::HeaderName, routing::get};
use serde::Deserialize;
use solinarium_core::store::{FriendStore, NotificationStore};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered under
/// `SOLINARIUM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Trusted header carrying the authenticated user id.
  #[serde(default = "default_identity_header")]
  pub identity_header: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 5080 }

fn default_store_path() -> PathBuf { PathBuf::from("solinarium.db") }

fn default_identity_header() -> String { solinarium_api::DEFAULT_IDENTITY_HEADER.to_owned() }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            default_host(),
      port:            default_port(),
      store_path:      default_store_path(),
      identity_header: default_identity_header(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/health` plus the API under `/api`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Result<Router, Error>
where
  S: FriendStore + NotificationStore + 'static,
{
  let header = HeaderName::from_bytes(config.identity_header.as_bytes())
    .map_err(|_| Error::InvalidIdentityHeader(config.identity_header.clone()))?;

  Ok(
    Router::new()
      .route("/health", get(health))
      .nest("/api", solinarium_api::api_router(store, header))
      .layer(TraceLayer::new_for_http()),
  )
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use solinarium_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn app(config: &ServerConfig) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(store), config).unwrap()
  }

  #[tokio::test]
  async fn health_is_ok() {
    let app = app(&ServerConfig::default()).await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_is_nested_and_honours_configured_header() {
    let config = ServerConfig {
      identity_header: "x-remote-user".to_owned(),
      ..ServerConfig::default()
    };
    let app = app(&config).await;

    let req = Request::builder()
      .method("POST")
      .uri("/api/friend-requests")
      .header("x-remote-user", "alice")
      .header("content-type", "application/json")
      .body(Body::from(r#"{"friendId":"bob"}"#))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // The default header is not consulted once another is configured.
    let req = Request::builder()
      .uri("/api/friend-requests")
      .header(solinarium_api::DEFAULT_IDENTITY_HEADER, "bob")
      .body(Body::empty())
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
      .uri("/api/friend-requests")
      .header("x-remote-user", "bob")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let incoming: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(incoming[0]["initiator"], "alice");
  }

  #[test]
  fn rejects_malformed_header_name() {
    let config = ServerConfig {
      identity_header: "not a header".to_owned(),
      ..ServerConfig::default()
    };
    let store = Arc::new(solinarium_core::memory::MemoryStore::new());
    assert!(matches!(router(store, &config), Err(Error::InvalidIdentityHeader(_))));
  }
}
