//! Hosting REST API adapter.
//!
//! [`HostingApi`] is the transport seam used by the deploy pipeline;
//! [`HttpHostingClient`] implements it over `reqwest` with a caller-supplied
//! bearer token. Credential acquisition and refresh stay with the caller.

pub mod api;
pub mod client;
pub mod config;
pub mod error;

pub use api::{ApiFuture, HostingApi};
pub use client::HttpHostingClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::ApiError;
