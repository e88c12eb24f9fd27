//! Core types, storage contracts and reviewer assignment services for
//! reviewd.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Backends implement the traits in [`store`]; transports call the services
//! in [`service`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod context;
pub mod error;
pub mod policy;
pub mod pull_request;
pub mod service;
pub mod store;
pub mod team;
pub mod user;

pub use config::ServiceConfig;
pub use context::Context;
pub use error::{Error, Result};
