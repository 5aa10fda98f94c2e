//! Error type for router construction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid identity header name {0:?}")]
  InvalidIdentityHeader(String),
}
