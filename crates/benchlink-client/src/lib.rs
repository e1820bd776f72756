//! Typed HTTP client for the TestBench play server API
//!
//! Provides the [`RemoteJobClient`] for submitting server-side jobs (report
//! generation, result import), polling their status, and exchanging artifacts,
//! plus the wire types shared by the rest of the workspace.
//!
//! All operations require an explicit [`Session`]; there is no ambient
//! connection state. Callers construct a session from an already-obtained
//! token and pass the client by reference.

mod api;
mod client;
mod error;
mod session;
pub mod types;

pub use api::JobApi;
pub use client::RemoteJobClient;
pub use error::ClientError;
pub use session::Session;
