//! Core types and trait definitions for the Solinarium friend relationship
//! engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::FriendStore`] and [`store::NotificationStore`];
//! [`service::FriendService`] layers caller authorization and the
//! notification side channel on top of them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod memory;
pub mod notification;
pub mod relationship;
pub mod service;
pub mod store;

pub use error::{Error, Result};
