//! Backend access for the inspection map.
//!
//! [`QueryApi`] is the fetch contract the session orchestrates against and
//! [`InstallationApi`] covers the per-installation and per-area endpoints.
//! [`HttpQueryApi`] implements both over the REST backend.

pub mod api;
pub mod client;
pub mod config;
pub mod error;

pub use api::{InstallationApi, QueryApi};
pub use client::HttpQueryApi;
pub use config::ClientConfig;
pub use error::{ApiError, Result};
